//! Statement builders: the session entry point plus the four statement
//! kinds it hands out.
//!
//! A [`Builder`] wraps the loaded [`SchemaCatalog`] behind an `Arc`; every
//! statement it creates is single-use and independently configurable, so
//! one builder can serve concurrent callers. `build()` on each statement is
//! pure and each execution method performs exactly one driver round trip.

mod delete;
mod insert;
mod query;
mod update;

pub use delete::DeleteStmt;
pub use insert::InsertStmt;
pub use query::QueryStmt;
pub use update::UpdateStmt;

use std::sync::Arc;

use tokio_postgres::Row;

use crate::catalog::SchemaCatalog;
use crate::client::GenericClient;
use crate::error::{StmtError, StmtResult};
use crate::fields::{map_from_json, Map};
use crate::params::ParamList;

/// Statement factory bound to a loaded catalog.
#[derive(Clone, Debug)]
pub struct Builder {
    catalog: Arc<SchemaCatalog>,
}

impl Builder {
    /// Introspect the connected database and build a ready-to-use factory.
    pub async fn load(client: &impl GenericClient) -> StmtResult<Self> {
        let catalog = SchemaCatalog::load(client).await?;
        Ok(Self::new(Arc::new(catalog)))
    }

    /// Wrap an already-loaded catalog.
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Start a SELECT against `target` (`relation` or `schema.relation`).
    pub fn query(&self, target: &str) -> QueryStmt {
        QueryStmt::new(self.catalog.clone(), target)
    }

    /// Start an INSERT against `target`.
    pub fn insert(&self, target: &str) -> InsertStmt {
        InsertStmt::new(self.catalog.clone(), target)
    }

    /// Start an UPDATE against `target`.
    pub fn update(&self, target: &str) -> UpdateStmt {
        UpdateStmt::new(self.catalog.clone(), target)
    }

    /// Start a DELETE against `target`.
    pub fn delete(&self, target: &str) -> DeleteStmt {
        DeleteStmt::new(self.catalog.clone(), target)
    }
}

/// Pull the JSON document text out of a single-column result row.
fn json_column(row: &Row) -> StmtResult<String> {
    row.try_get::<_, String>(0)
        .map_err(|err| StmtError::decode("json", err.to_string()))
}

/// Fetch exactly one JSON document; zero rows surfaces as `NotFound`.
async fn fetch_json_one(
    client: &impl GenericClient,
    sql: &str,
    params: &ParamList,
) -> StmtResult<String> {
    let row = client.query_one(sql, &params.as_refs()).await?;
    json_column(&row)
}

/// Decode a JSON object document into a generic [`Map`].
fn map_from_document(json: &str) -> StmtResult<Map> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    map_from_json(value).ok_or_else(|| StmtError::decode("json", "expected a JSON object"))
}

#[cfg(test)]
mod tests;
