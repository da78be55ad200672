//! SELECT-list and RETURNING builders.
//!
//! Both resolve requested external-facing names to canonical columns. The
//! RETURNING builder emits either a plain column list or one
//! `json_build_object` document expression, never both in one statement.

use tracing::warn;

use crate::catalog::SchemaCatalog;
use crate::error::StmtResult;
use crate::quote::single_quote;

/// Render the SELECT list, including the leading space (and ` DISTINCT`).
///
/// With no explicit subset every catalog column is selected, aliased to its
/// external name whenever the casing differs, so JSON-shaped results carry
/// external keys.
pub(crate) fn select_list(
    catalog: &SchemaCatalog,
    target: &str,
    columns: &[String],
    distinct: bool,
) -> StmtResult<String> {
    let relation = catalog.relation(target)?;

    let requested: Vec<&str> = columns.iter().map(String::as_str).collect();
    let cols = if requested.is_empty() {
        relation.columns().iter().collect()
    } else {
        let resolved = catalog.resolve(target, &requested)?;
        if resolved.is_empty() {
            // Nothing survived resolution; fall back to the full list
            // rather than emitting a SELECT without columns.
            warn!(relation = target, "no requested columns resolved, selecting all");
            relation.columns().iter().collect()
        } else {
            resolved
        }
    };

    let mut rendered = Vec::with_capacity(cols.len());
    for col in cols {
        let external = col.external_name();
        if external == col.name {
            rendered.push(catalog.quote(&col.name));
        } else {
            rendered.push(format!(
                "{} AS {}",
                catalog.quote(&col.name),
                catalog.quote(&external)
            ));
        }
    }

    let distinct = if distinct { " DISTINCT" } else { "" };
    Ok(format!("{} {}", distinct, rendered.join(", ")))
}

/// RETURNING configuration for the mutation builders.
#[derive(Clone, Debug, Default)]
pub(crate) struct Returning {
    columns: Vec<String>,
}

impl Returning {
    pub fn set(&mut self, columns: &[&str]) {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// ` RETURNING col, "Col2"`, or `""` when nothing was requested.
    pub fn build_plain(&self, catalog: &SchemaCatalog, target: &str) -> StmtResult<String> {
        if self.columns.is_empty() {
            return Ok(String::new());
        }
        let requested: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let resolved = catalog.resolve(target, &requested)?;
        if resolved.is_empty() {
            return Ok(String::new());
        }
        let cols: Vec<String> = resolved.iter().map(|c| catalog.quote(&c.name)).collect();
        Ok(format!(" RETURNING {}", cols.join(", ")))
    }

    /// ` RETURNING json_build_object('extName', col, ...)::text`: the
    /// single-document shape, with external names as keys.
    pub fn build_json(&self, catalog: &SchemaCatalog, target: &str) -> StmtResult<String> {
        if self.columns.is_empty() {
            return Ok(String::new());
        }
        let requested: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let resolved = catalog.resolve(target, &requested)?;
        if resolved.is_empty() {
            return Ok(String::new());
        }
        let pairs: Vec<String> = resolved
            .iter()
            .map(|c| {
                format!(
                    "{}, {}",
                    single_quote(&c.external_name()),
                    catalog.quote(&c.name)
                )
            })
            .collect();
        Ok(format!(
            " RETURNING json_build_object({})::text",
            pairs.join(", ")
        ))
    }
}
