//! The INSERT statement builder.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::catalog::SchemaCatalog;
use crate::client::GenericClient;
use crate::error::{StmtError, StmtResult};
use crate::fields::{upsert, FieldValue, Map, Record};
use crate::params::ParamList;
use crate::projection::Returning;
use crate::value::Value;

use super::{fetch_json_one, map_from_document};

/// A single-use INSERT builder.
///
/// Fields whose value is nil are left out of the statement so the column's
/// DEFAULT applies; when nothing remains the statement degrades to
/// `INSERT INTO rel DEFAULT VALUES`.
#[derive(Clone, Debug)]
pub struct InsertStmt {
    catalog: Arc<SchemaCatalog>,
    target: String,
    fields: Vec<FieldValue>,
    returning: Returning,
}

impl InsertStmt {
    pub(crate) fn new(catalog: Arc<SchemaCatalog>, target: &str) -> Self {
        Self {
            catalog,
            target: target.to_string(),
            fields: Vec::new(),
            returning: Returning::default(),
        }
    }

    /// Take the row to insert from a record; repeat calls merge, the later
    /// value winning per column.
    pub fn values(mut self, record: &impl Record) -> Self {
        for field in record.field_values() {
            upsert(&mut self.fields, field);
        }
        self
    }

    /// Override a single column.
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        upsert(&mut self.fields, FieldValue::new(column, value));
        self
    }

    /// Request a RETURNING clause; names may be canonical or external.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning.set(columns);
        self
    }

    /// Render the statement and its bound parameters.
    pub fn build(&self) -> StmtResult<(String, ParamList)> {
        self.build_with(false)
    }

    fn build_with(&self, json_returning: bool) -> StmtResult<(String, ParamList)> {
        if self.target.is_empty() {
            return Err(StmtError::TargetRequired);
        }
        let mut params = ParamList::new();
        let resolved = self.catalog.resolve_fields(&self.target, self.fields.clone())?;

        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        for field in resolved {
            if field.value.is_null() {
                continue;
            }
            columns.push(self.catalog.quote(&field.column));
            placeholders.push(params.bind(field.value));
        }

        let mut sql = if columns.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES",
                self.catalog.quote_relation(&self.target)
            )
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.catalog.quote_relation(&self.target),
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        if json_returning {
            sql.push_str(&self.returning.build_json(&self.catalog, &self.target)?);
        } else {
            sql.push_str(&self.returning.build_plain(&self.catalog, &self.target)?);
        }
        debug!(sql = %sql, params = params.len(), "built insert");
        Ok((sql, params))
    }

    /// Run the statement and return the affected-row count.
    ///
    /// Zero affected rows surfaces as [`StmtError::NotFound`].
    pub async fn execute(&self, client: &impl GenericClient) -> StmtResult<u64> {
        let (sql, params) = self.build()?;
        let affected = client.execute(&sql, &params.as_refs()).await?;
        if affected == 0 {
            return Err(StmtError::not_found("insert affected no rows"));
        }
        Ok(affected)
    }

    /// Run the statement and return one JSON object document.
    ///
    /// With a RETURNING clause the document carries the returned columns
    /// keyed by external name; without one it reports the affected-row
    /// count as `{"rowsAffected": n}`.
    pub async fn one_json(&self, client: &impl GenericClient) -> StmtResult<String> {
        if self.returning.is_empty() {
            let affected = self.execute(client).await?;
            return Ok(format!("{{\"rowsAffected\": {affected}}}"));
        }
        let (sql, params) = self.build_with(true)?;
        fetch_json_one(client, &sql, &params).await
    }

    /// Run the statement and decode the JSON document into `T`.
    pub async fn one<T: DeserializeOwned>(&self, client: &impl GenericClient) -> StmtResult<T> {
        let json = self.one_json(client).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Run the statement and return the document as a generic map.
    pub async fn one_map(&self, client: &impl GenericClient) -> StmtResult<Map> {
        let json = self.one_json(client).await?;
        map_from_document(&json)
    }
}
