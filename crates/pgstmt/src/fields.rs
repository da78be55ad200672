//! Field extraction from records and key-value maps.
//!
//! Callers hand the builders either a record type implementing [`Record`]
//! (usually via `#[derive(Record)]`) or a [`Map`] of field name to value.
//! Either way the input becomes a list of [`FieldValue`]s which the catalog
//! then resolves to canonical columns.

use crate::value::Value;
use std::collections::BTreeMap;

/// Pattern-match mode requested for a textual field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    #[default]
    Exact,
    StartsWith,
    EndsWith,
    Contains,
}

/// One extracted field: a column reference, its value, and its role flags.
///
/// Before catalog resolution `column` holds the name exactly as the caller
/// supplied it (canonical or external casing); resolution rewrites it to the
/// canonical column name and fills `external` and `textual`.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldValue {
    pub column: String,
    pub external: String,
    pub value: Value,
    pub primary_key: bool,
    pub match_mode: MatchMode,
    pub textual: bool,
}

impl FieldValue {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        Self {
            external: column.clone(),
            column,
            value: value.into(),
            primary_key: false,
            match_mode: MatchMode::Exact,
            textual: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn starts_with(mut self) -> Self {
        self.match_mode = MatchMode::StartsWith;
        self
    }

    pub fn ends_with(mut self) -> Self {
        self.match_mode = MatchMode::EndsWith;
        self
    }

    pub fn contains(mut self) -> Self {
        self.match_mode = MatchMode::Contains;
        self
    }
}

/// Adapter capability: a record type declares its field name/role list.
///
/// Implement via `#[derive(Record)]`; the derive reads `#[sql(...)]` field
/// attributes (`column = "..."`, `pk`, `starts_with`, `ends_with`,
/// `contains`, `skip`) so extraction stays statically checked instead of
/// relying on runtime introspection.
pub trait Record {
    /// The record's fields in declaration order.
    fn field_values(&self) -> Vec<FieldValue>;

    /// Declared field names, without values.
    fn field_names(&self) -> Vec<String> {
        self.field_values().into_iter().map(|f| f.column).collect()
    }
}

/// Generic key-value input for the builders.
pub type Map = BTreeMap<String, Value>;

impl Record for Map {
    fn field_values(&self) -> Vec<FieldValue> {
        self.iter()
            .map(|(name, value)| FieldValue::new(name.clone(), value.clone()))
            .collect()
    }
}

/// Insert or replace a field in a list, keyed by column name.
pub(crate) fn upsert(list: &mut Vec<FieldValue>, field: FieldValue) {
    if let Some(existing) = list.iter_mut().find(|f| f.column == field.column) {
        *existing = field;
    } else {
        list.push(field);
    }
}

/// Convert a JSON object into a [`Map`]; returns `None` for non-objects.
pub fn map_from_json(value: serde_json::Value) -> Option<Map> {
    match value {
        serde_json::Value::Object(entries) => Some(
            entries
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect(),
        ),
        _ => None,
    }
}
