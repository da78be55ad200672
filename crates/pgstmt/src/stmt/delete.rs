//! The DELETE statement builder.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::catalog::SchemaCatalog;
use crate::client::GenericClient;
use crate::error::{StmtError, StmtResult};
use crate::fields::{FieldValue, Map, Record};
use crate::params::ParamList;
use crate::predicate::WhereClause;
use crate::projection::Returning;
use crate::value::Value;

use super::{fetch_json_one, map_from_document};

/// A single-use DELETE builder.
///
/// With no predicate source the statement deletes the whole relation; that
/// follows from the predicate rules, not an oversight.
#[derive(Clone, Debug)]
pub struct DeleteStmt {
    catalog: Arc<SchemaCatalog>,
    target: String,
    predicate: WhereClause,
    returning: Returning,
}

impl DeleteStmt {
    pub(crate) fn new(catalog: Arc<SchemaCatalog>, target: &str) -> Self {
        Self {
            catalog,
            target: target.to_string(),
            predicate: WhereClause::default(),
            returning: Returning::default(),
        }
    }

    /// Exact-match predicate from a record (nil fields render `IS NULL`).
    pub fn where_values(mut self, record: &impl Record) -> Self {
        self.predicate.add_values(record.field_values());
        self
    }

    /// Exact-match predicate on a single column.
    pub fn where_value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate.add_value(FieldValue::new(column, value));
        self
    }

    /// Raw predicate template; each `?` marker binds one argument in order.
    pub fn where_template(mut self, sql: &str, args: Vec<Value>) -> Self {
        self.predicate.set_template(sql, args);
        self
    }

    /// Soft filter from a record.
    pub fn filter(mut self, record: &impl Record) -> Self {
        self.predicate.add_filters(record.field_values());
        self
    }

    /// Soft filter on a single column.
    pub fn filter_value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate.add_filter(FieldValue::new(column, value));
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
        let mut sql = format!("DELETE FROM {}", self.catalog.quote_relation(&self.target));
        sql.push_str(&self.predicate.build(&self.catalog, &self.target, &mut params)?);

        if json_returning {
            sql.push_str(&self.returning.build_json(&self.catalog, &self.target)?);
        } else {
            sql.push_str(&self.returning.build_plain(&self.catalog, &self.target)?);
        }
        debug!(sql = %sql, params = params.len(), "built delete");
        Ok((sql, params))
    }

    /// Run the statement and return the affected-row count.
    ///
    /// Zero affected rows surfaces as [`StmtError::NotFound`].
    pub async fn execute(&self, client: &impl GenericClient) -> StmtResult<u64> {
        let (sql, params) = self.build()?;
        let affected = client.execute(&sql, &params.as_refs()).await?;
        if affected == 0 {
            return Err(StmtError::not_found("delete affected no rows"));
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
