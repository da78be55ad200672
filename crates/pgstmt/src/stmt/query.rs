//! The SELECT statement builder.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_postgres::types::FromSqlOwned;
use tracing::{debug, warn};

use crate::catalog::SchemaCatalog;
use crate::client::GenericClient;
use crate::error::{StmtError, StmtResult};
use crate::fields::{FieldValue, Map, Record};
use crate::params::ParamList;
use crate::predicate::WhereClause;
use crate::projection::select_list;
use crate::value::Value;

use super::{fetch_json_one, json_column, map_from_document};

/// A single-use SELECT builder.
///
/// Configure the projection and predicate, then either [`build`] the SQL or
/// run one of the execution shapes. Every JSON shape keys the result by
/// external (lowerCamelCase) column names.
///
/// [`build`]: QueryStmt::build
#[derive(Clone, Debug)]
pub struct QueryStmt {
    catalog: Arc<SchemaCatalog>,
    target: String,
    columns: Vec<String>,
    distinct: bool,
    predicate: WhereClause,
    order_by: Option<String>,
    limit: u64,
    offset: u64,
}

impl QueryStmt {
    pub(crate) fn new(catalog: Arc<SchemaCatalog>, target: &str) -> Self {
        Self {
            catalog,
            target: target.to_string(),
            columns: Vec::new(),
            distinct: false,
            predicate: WhereClause::default(),
            order_by: None,
            limit: 0,
            offset: 0,
        }
    }

    /// Restrict the SELECT list; names may be canonical or external.
    /// Names that resolve to nothing are dropped with a warning, and a
    /// subset that loses every name falls back to the full column list.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
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

    /// `ILIKE 'v%'` predicate on a single column.
    pub fn where_starts_with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate
            .add_value(FieldValue::new(column, value).starts_with());
        self
    }

    /// `ILIKE '%v'` predicate on a single column.
    pub fn where_ends_with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate
            .add_value(FieldValue::new(column, value).ends_with());
        self
    }

    /// `ILIKE '%v%'` predicate on a single column.
    pub fn where_contains(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate
            .add_value(FieldValue::new(column, value).contains());
        self
    }

    /// Raw predicate template; each `?` marker binds one argument in order.
    pub fn where_template(mut self, sql: &str, args: Vec<Value>) -> Self {
        self.predicate.set_template(sql, args);
        self
    }

    /// Soft filter from a record (nil fields are skipped, textual fields
    /// default to a prefix pattern).
    pub fn filter(mut self, record: &impl Record) -> Self {
        self.predicate.add_filters(record.field_values());
        self
    }

    /// Soft filter on a single column.
    pub fn filter_value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate.add_filter(FieldValue::new(column, value));
        self
    }

    /// Comma-separated `column [DESC]` tokens, any casing of `DESC`.
    pub fn order_by(mut self, spec: &str) -> Self {
        let spec = spec.trim();
        if !spec.is_empty() {
            self.order_by = Some(spec.to_string());
        }
        self
    }

    /// Applied only when greater than zero.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Applied only when greater than zero.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Render the statement and its bound parameters.
    pub fn build(&self) -> StmtResult<(String, ParamList)> {
        let mut params = ParamList::new();
        let mut sql = format!(
            "SELECT{}",
            select_list(&self.catalog, self.target()?, &self.columns, self.distinct)?
        );
        sql.push_str(&self.build_from(&mut params)?);
        if let Some(order) = &self.order_by {
            sql.push_str(&self.render_order_by(order)?);
        }
        self.push_paging(&mut sql);
        debug!(sql = %sql, params = params.len(), "built query");
        Ok((sql, params))
    }

    fn target(&self) -> StmtResult<&str> {
        if self.target.is_empty() {
            return Err(StmtError::TargetRequired);
        }
        Ok(&self.target)
    }

    /// ` FROM rel[ WHERE ...]`, shared by the full build, exists and count.
    fn build_from(&self, params: &mut ParamList) -> StmtResult<String> {
        let target = self.target()?;
        // Predicate sources that never resolve fields (pk plan, raw
        // template) would otherwise let an unknown relation through.
        self.catalog.relation(target)?;
        let mut sql = format!(" FROM {}", self.catalog.quote_relation(target));
        sql.push_str(&self.predicate.build(&self.catalog, target, params)?);
        Ok(sql)
    }

    fn push_paging(&self, sql: &mut String) {
        if self.limit > 0 {
            sql.push_str(&format!(" LIMIT {}", self.limit));
        }
        if self.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", self.offset));
        }
    }

    fn render_order_by(&self, spec: &str) -> StmtResult<String> {
        let relation = self.catalog.relation(&self.target)?;
        let mut terms = Vec::new();
        for item in spec.split(',') {
            let mut tokens = item.split_whitespace();
            let Some(name) = tokens.next() else { continue };
            let descending = match tokens.next() {
                Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
                Some(dir) => {
                    warn!(relation = %self.target, token = dir, "unrecognized sort direction dropped");
                    false
                }
                None => false,
            };
            let column = match relation.column(name) {
                Some(col) => self.catalog.quote(&col.name),
                None => self.catalog.quote(name),
            };
            if descending {
                terms.push(format!("{column} DESC"));
            } else {
                terms.push(column);
            }
        }
        if terms.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" ORDER BY {}", terms.join(", ")))
    }

    /// All matching rows as one JSON array document; `[]` when none match.
    pub async fn all_json(&self, client: &impl GenericClient) -> StmtResult<String> {
        let (sql, params) = self.build()?;
        let wrapped =
            format!("SELECT COALESCE(json_agg(t), '[]'::json)::text AS json FROM ({sql}) t");
        let row = client.query_one(&wrapped, &params.as_refs()).await?;
        json_column(&row)
    }

    /// The first matching row as one JSON object document.
    pub async fn one_json(&self, client: &impl GenericClient) -> StmtResult<String> {
        let (sql, params) = self.build()?;
        let wrapped = format!("SELECT row_to_json(t)::text AS json FROM ({sql}) t");
        fetch_json_one(client, &wrapped, &params).await
    }

    /// All matching rows decoded into `T` via the JSON document.
    pub async fn all<T: DeserializeOwned>(&self, client: &impl GenericClient) -> StmtResult<Vec<T>> {
        let json = self.all_json(client).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// The first matching row decoded into `T` via the JSON document.
    pub async fn one<T: DeserializeOwned>(&self, client: &impl GenericClient) -> StmtResult<T> {
        let json = self.one_json(client).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// All matching rows as generic maps keyed by external column name.
    pub async fn all_map(&self, client: &impl GenericClient) -> StmtResult<Vec<Map>> {
        let json = self.all_json(client).await?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        let serde_json::Value::Array(items) = value else {
            return Err(StmtError::decode("json", "expected a JSON array"));
        };
        items
            .into_iter()
            .map(|item| {
                crate::fields::map_from_json(item)
                    .ok_or_else(|| StmtError::decode("json", "expected a JSON object"))
            })
            .collect()
    }

    /// The first matching row as a generic map keyed by external column name.
    pub async fn one_map(&self, client: &impl GenericClient) -> StmtResult<Map> {
        let json = self.one_json(client).await?;
        map_from_document(&json)
    }

    /// The first column of the first matching row.
    pub async fn scalar<T: FromSqlOwned>(&self, client: &impl GenericClient) -> StmtResult<T> {
        let (sql, params) = self.build()?;
        let row = client.query_one(&sql, &params.as_refs()).await?;
        row.try_get(0)
            .map_err(|err| StmtError::decode("0", err.to_string()))
    }

    /// `SELECT EXISTS (SELECT 1 FROM ...)` over the configured predicate.
    /// A configured limit or offset narrows the window the check answers
    /// for (an offset past the last match yields false); ordering cannot
    /// change the answer and is left out.
    pub async fn exists(&self, client: &impl GenericClient) -> StmtResult<bool> {
        let mut params = ParamList::new();
        let mut from = self.build_from(&mut params)?;
        self.push_paging(&mut from);
        let sql = format!("SELECT EXISTS (SELECT 1{from})");
        let row = client.query_one(&sql, &params.as_refs()).await?;
        row.try_get(0)
            .map_err(|err| StmtError::decode("exists", err.to_string()))
    }

    /// `SELECT count(*) FROM ...` over the configured predicate; ordering
    /// and paging do not apply.
    pub async fn count(&self, client: &impl GenericClient) -> StmtResult<i64> {
        let mut params = ParamList::new();
        let from = self.build_from(&mut params)?;
        let sql = format!("SELECT count(*){from}");
        let row = client.query_one(&sql, &params.as_refs()).await?;
        row.try_get(0)
            .map_err(|err| StmtError::decode("count", err.to_string()))
    }
}
