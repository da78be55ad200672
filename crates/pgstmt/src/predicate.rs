//! The WHERE-clause builder.
//!
//! A statement draws its predicate from exactly one of four sources, picked
//! by strict precedence with the first non-empty source winning:
//!
//! 1. the primary-key override list (fields routed out of an UPDATE SET
//!    list),
//! 2. a raw template with `?` markers,
//! 3. the exact-match value set (nil renders as `IS NULL`),
//! 4. the soft filter value set (nil is skipped, textual fields default to
//!    a prefix pattern).
//!
//! Sources are never combined. When none yields an expression, no WHERE
//! clause is emitted and the statement applies to the whole relation.
//! That is intentional, not a bug.

use crate::catalog::SchemaCatalog;
use crate::error::{StmtError, StmtResult};
use crate::fields::{upsert, FieldValue, MatchMode};
use crate::params::ParamList;
use crate::value::Value;

#[derive(Clone, Debug, Default)]
pub(crate) struct WhereClause {
    /// Source 1: resolved fields routed here by the update builder.
    pk_plan: Vec<FieldValue>,
    /// Source 2: raw parameterized template.
    template: Option<String>,
    template_args: Vec<Value>,
    /// Source 3: exact-match value set (unresolved until build).
    values: Vec<FieldValue>,
    /// Source 4: soft filter value set (unresolved until build).
    filter: Vec<FieldValue>,
}

impl WhereClause {
    pub fn set_template(&mut self, sql: &str, args: Vec<Value>) {
        if sql.is_empty() {
            return;
        }
        self.template = Some(sql.to_string());
        self.template_args = args;
    }

    pub fn add_values(&mut self, fields: Vec<FieldValue>) {
        for field in fields {
            upsert(&mut self.values, field);
        }
    }

    pub fn add_value(&mut self, field: FieldValue) {
        upsert(&mut self.values, field);
    }

    pub fn add_filters(&mut self, fields: Vec<FieldValue>) {
        for field in fields {
            upsert(&mut self.filter, field);
        }
    }

    pub fn add_filter(&mut self, field: FieldValue) {
        upsert(&mut self.filter, field);
    }

    /// Attach a resolved primary-key override list (source 1).
    pub fn with_pk_plan(mut self, plan: Vec<FieldValue>) -> Self {
        self.pk_plan = plan;
        self
    }

    /// Render the clause, including the leading ` WHERE `, or `""`.
    pub fn build(
        &self,
        catalog: &SchemaCatalog,
        target: &str,
        params: &mut ParamList,
    ) -> StmtResult<String> {
        // Source 1: primary-key overrides.
        if !self.pk_plan.is_empty() {
            let mut exprs = Vec::with_capacity(self.pk_plan.len());
            for field in &self.pk_plan {
                let col = catalog.quote(&field.column);
                if field.value.is_null() {
                    exprs.push(format!("{col} IS NULL"));
                } else if field.textual {
                    exprs.push(format!("{col} ILIKE {}", params.bind(field.value.clone())));
                } else {
                    exprs.push(format!("{col} = {}", params.bind(field.value.clone())));
                }
            }
            return Ok(format!(" WHERE {}", exprs.join(" AND ")));
        }

        // Source 2: raw template with `?` markers.
        if let Some(template) = &self.template {
            let markers = template.matches('?').count();
            if markers != self.template_args.len() {
                return Err(StmtError::TemplateArity {
                    markers,
                    args: self.template_args.len(),
                });
            }
            let mut out = String::with_capacity(template.len());
            let mut args = self.template_args.iter();
            for ch in template.chars() {
                if ch == '?' {
                    // Counts match, so the iterator cannot run dry.
                    let arg = args.next().cloned().unwrap_or(Value::Null);
                    out.push_str(&params.bind(arg));
                } else {
                    out.push(ch);
                }
            }
            return Ok(format!(" WHERE {out}"));
        }

        // Source 3: exact-match value set.
        let resolved = catalog.resolve_fields(target, self.values.clone())?;
        let mut exprs = Vec::with_capacity(resolved.len());
        for field in resolved {
            let col = catalog.quote(&field.column);
            if field.value.is_null() {
                exprs.push(format!("{col} IS NULL"));
                continue;
            }
            let expr = match field.match_mode {
                MatchMode::Exact => format!("{col} = {}", params.bind(field.value)),
                MatchMode::StartsWith => {
                    format!("{col} ILIKE {}", params.bind_starts_with(field.value))
                }
                MatchMode::EndsWith => {
                    format!("{col} ILIKE {}", params.bind_ends_with(field.value))
                }
                MatchMode::Contains => {
                    format!("{col} ILIKE {}", params.bind_contains(field.value))
                }
            };
            exprs.push(expr);
        }
        if !exprs.is_empty() {
            return Ok(format!(" WHERE {}", exprs.join(" AND ")));
        }

        // Source 4: soft filter. Nil skipped, textual defaults to prefix.
        let resolved = catalog.resolve_fields(target, self.filter.clone())?;
        let mut exprs = Vec::with_capacity(resolved.len());
        for field in resolved {
            if field.value.is_null() {
                continue;
            }
            let col = catalog.quote(&field.column);
            if field.textual {
                let placeholder = match field.match_mode {
                    MatchMode::EndsWith => params.bind_ends_with(field.value),
                    MatchMode::Contains => params.bind_contains(field.value),
                    MatchMode::Exact | MatchMode::StartsWith => {
                        params.bind_starts_with(field.value)
                    }
                };
                exprs.push(format!("{col} ILIKE {placeholder}"));
            } else {
                exprs.push(format!("{col} = {}", params.bind(field.value)));
            }
        }
        if !exprs.is_empty() {
            return Ok(format!(" WHERE {}", exprs.join(" AND ")));
        }

        Ok(String::new())
    }
}
