//! The positional parameter binder.

use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Ordered bound values for a single statement build.
///
/// Placeholders are 1-based and allocated in append order, so the numbering
/// always matches the order the expressions were written into the SQL text.
/// A binder belongs to exactly one statement build and is never shared.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    values: Vec<Value>,
}

impl ParamList {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value and return its `$n` placeholder.
    pub fn bind(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    /// Bind a textual value as a prefix pattern (`value%`).
    pub fn bind_starts_with(&mut self, value: Value) -> String {
        self.bind(Self::wrap(value, "", "%"))
    }

    /// Bind a textual value as a suffix pattern (`%value`).
    pub fn bind_ends_with(&mut self, value: Value) -> String {
        self.bind(Self::wrap(value, "%", ""))
    }

    /// Bind a textual value as a substring pattern (`%value%`).
    pub fn bind_contains(&mut self, value: Value) -> String {
        self.bind(Self::wrap(value, "%", "%"))
    }

    fn wrap(value: Value, prefix: &str, suffix: &str) -> Value {
        match value {
            Value::Text(s) => Value::Text(format!("{prefix}{s}{suffix}")),
            other => other,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The bound values in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Parameter references for the driver call.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }
}
