//! The schema catalog: one-time introspection of relation/column metadata.
//!
//! The catalog is loaded once per database session, is read-only afterwards,
//! and is the only component shared across concurrent callers (behind an
//! `Arc`). Every builder resolves caller-supplied field names through it,
//! in canonical or external (lowerCamelCase) casing, before any SQL is
//! generated, so statements are never produced against unknown structure.

use crate::client::GenericClient;
use crate::error::{StmtError, StmtResult};
use crate::fields::FieldValue;
use heck::ToLowerCamelCase;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Column metadata as stored in the database catalog.
#[derive(Clone, Debug)]
pub struct ColumnSchema {
    pub schema: String,
    pub relation: String,
    pub name: String,
    /// Ordinal position within the relation; determines generated column order.
    pub ordinal: i16,
    pub type_oid: i64,
    /// Formatted type name, e.g. `integer`, `character varying(50)`.
    pub data_type: String,
    pub not_null: bool,
    pub is_generated: bool,
    pub is_primary_key: bool,
    pub is_readonly: bool,
    pub default_expr: Option<String>,
}

impl ColumnSchema {
    /// The case-converted name exposed to API callers.
    pub fn external_name(&self) -> String {
        self.name.to_lower_camel_case()
    }

    /// Whether values of this column are text-like (pattern matching applies).
    pub fn is_textual(&self) -> bool {
        let dt = self.data_type.as_str();
        dt.starts_with("text")
            || dt.starts_with("character")
            || dt.starts_with("citext")
            || dt.starts_with("name")
    }
}

/// One relation's ordered columns plus its two precomputed name tables.
#[derive(Clone, Debug)]
pub struct Relation {
    columns: Vec<ColumnSchema>,
    by_name: HashMap<String, usize>,
    by_external: HashMap<String, usize>,
}

impl Relation {
    fn new(columns: Vec<ColumnSchema>) -> Self {
        let mut by_name = HashMap::with_capacity(columns.len());
        let mut by_external = HashMap::with_capacity(columns.len());
        for (idx, col) in columns.iter().enumerate() {
            by_name.insert(col.name.clone(), idx);
            by_external.insert(col.external_name(), idx);
        }
        Self {
            columns,
            by_name,
            by_external,
        }
    }

    /// Columns in catalog ordinal order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// O(1) lookup: canonical name first, then the external form.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name
            .get(name)
            .or_else(|| self.by_external.get(name))
            .copied()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.position(name).map(|idx| &self.columns[idx])
    }
}

/// The loaded database catalog: schema → relation → columns, plus the
/// reserved-keyword list used for identifier quoting.
#[derive(Clone, Debug, Default)]
pub struct SchemaCatalog {
    schemas: HashMap<String, HashMap<String, Relation>>,
    keywords: Vec<String>,
}

const COLUMNS_SQL: &str = r#"
SELECT
  n.nspname::text                                 AS schema_name,
  c.relname::text                                 AS relation_name,
  a.attname::text                                 AS column_name,
  a.attnum                                        AS ordinal,
  a.atttypid::int8                                AS type_oid,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
  a.attnotnull                                    AS not_null,
  (a.attidentity <> '' OR a.attgenerated <> ''
    OR COALESCE(pg_get_expr(ad.adbin, ad.adrelid) ~ 'nextval', false)) AS is_generated,
  COALESCE(a.attnum = ANY (ct.conkey), false)     AS is_primary_key,
  (a.attidentity <> '' OR a.attgenerated <> ''
    OR COALESCE(pg_get_expr(ad.adbin, ad.adrelid) ~ 'nextval', false)
    OR (c.relkind IN ('v', 'f')
        AND NOT pg_column_is_updatable(c.oid::regclass, a.attnum, false))) AS is_readonly,
  pg_get_expr(ad.adbin, ad.adrelid)               AS default_expr
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
LEFT JOIN pg_catalog.pg_constraint ct ON ct.conrelid = c.oid AND ct.contype = 'p'
WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f')
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname NOT LIKE 'pg_%'
  AND n.nspname <> 'information_schema'
ORDER BY n.nspname, c.relname, a.attnum
"#;

const KEYWORDS_SQL: &str =
    "SELECT word FROM pg_get_keywords() WHERE catcode <> 'U' ORDER BY 1";

impl SchemaCatalog {
    /// Load column metadata and the reserved-keyword list in one pass.
    ///
    /// Called once per session before any statement is built; everything
    /// after this is in-memory lookup.
    pub async fn load(client: &impl GenericClient) -> StmtResult<Self> {
        let rows = client.query(COLUMNS_SQL, &[]).await?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(ColumnSchema {
                schema: row.try_get("schema_name")?,
                relation: row.try_get("relation_name")?,
                name: row.try_get("column_name")?,
                ordinal: row.try_get("ordinal")?,
                type_oid: row.try_get("type_oid")?,
                data_type: row.try_get("data_type")?,
                not_null: row.try_get("not_null")?,
                is_generated: row.try_get("is_generated")?,
                is_primary_key: row.try_get("is_primary_key")?,
                is_readonly: row.try_get("is_readonly")?,
                default_expr: row.try_get("default_expr")?,
            });
        }

        let rows = client.query(KEYWORDS_SQL, &[]).await?;
        let mut keywords = Vec::with_capacity(rows.len());
        for row in &rows {
            keywords.push(row.try_get::<_, String>("word")?);
        }

        Ok(Self::from_columns(columns, keywords))
    }

    /// Assemble a catalog from already-known metadata.
    ///
    /// Column order within a relation follows the input order, which must be
    /// ordinal order (as the introspection query guarantees). This is also
    /// the entry point for independent in-memory catalogs in tests.
    pub fn from_columns(columns: Vec<ColumnSchema>, mut keywords: Vec<String>) -> Self {
        let mut grouped: HashMap<String, HashMap<String, Vec<ColumnSchema>>> = HashMap::new();
        for col in columns {
            grouped
                .entry(col.schema.clone())
                .or_default()
                .entry(col.relation.clone())
                .or_default()
                .push(col);
        }

        let schemas = grouped
            .into_iter()
            .map(|(schema, relations)| {
                let relations = relations
                    .into_iter()
                    .map(|(name, cols)| (name, Relation::new(cols)))
                    .collect();
                (schema, relations)
            })
            .collect();

        keywords.sort();
        keywords.dedup();

        Self { schemas, keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub(crate) fn is_keyword(&self, word: &str) -> bool {
        self.keywords.binary_search_by(|k| k.as_str().cmp(word)).is_ok()
    }

    /// Look up a relation by `relation` or `schema.relation` target.
    pub fn relation(&self, target: &str) -> StmtResult<&Relation> {
        let (schema, relation) = split_target(target)?;
        let by_name = self
            .schemas
            .get(schema)
            .ok_or_else(|| StmtError::UnknownSchema(schema.to_string()))?;
        by_name
            .get(relation)
            .ok_or_else(|| StmtError::UnknownRelation(target.to_string()))
    }

    /// Resolve caller-supplied names to catalog columns, in request order.
    ///
    /// Unmatched names are warned about and dropped; extraneous input keys
    /// are tolerated on purpose.
    pub fn resolve<'a>(&'a self, target: &str, names: &[&str]) -> StmtResult<Vec<&'a ColumnSchema>> {
        let relation = self.relation(target)?;
        let mut resolved = Vec::with_capacity(names.len());
        for &name in names {
            match relation.column(name) {
                Some(col) => resolved.push(col),
                None => warn!(relation = target, field = name, "unresolved field name dropped"),
            }
        }
        Ok(resolved)
    }

    /// Resolve extracted fields against a relation.
    ///
    /// Output is ordered by catalog ordinal position (never input order);
    /// each surviving field gets its canonical column name, external name,
    /// textual flag, and the catalog's primary-key flag merged in. On
    /// duplicate references to one column the later field wins.
    pub fn resolve_fields(
        &self,
        target: &str,
        fields: Vec<FieldValue>,
    ) -> StmtResult<Vec<FieldValue>> {
        let relation = self.relation(target)?;
        let mut by_pos: BTreeMap<usize, FieldValue> = BTreeMap::new();
        for mut field in fields {
            match relation.position(&field.column) {
                Some(idx) => {
                    let col = &relation.columns[idx];
                    field.column = col.name.clone();
                    field.external = col.external_name();
                    field.textual = col.is_textual();
                    field.primary_key |= col.is_primary_key;
                    by_pos.insert(idx, field);
                }
                None => {
                    warn!(relation = target, field = %field.column, "unresolved field name dropped")
                }
            }
        }
        Ok(by_pos.into_values().collect())
    }

    /// A relation's columns, in ordinal order.
    pub fn columns(&self, target: &str) -> StmtResult<&[ColumnSchema]> {
        Ok(self.relation(target)?.columns())
    }

    /// Canonical column names of a relation, in ordinal order.
    pub fn column_names(&self, target: &str) -> StmtResult<Vec<String>> {
        Ok(self
            .relation(target)?
            .columns()
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    /// External-facing column names of a relation, in ordinal order.
    pub fn external_column_names(&self, target: &str) -> StmtResult<Vec<String>> {
        Ok(self
            .relation(target)?
            .columns()
            .iter()
            .map(|c| c.external_name())
            .collect())
    }

    /// Primary-key column names of a relation.
    pub fn primary_key(&self, target: &str) -> StmtResult<Vec<String>> {
        Ok(self
            .relation(target)?
            .columns()
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect())
    }
}

/// Split a target into `(schema, relation)`, defaulting to `public`.
fn split_target(target: &str) -> StmtResult<(&str, &str)> {
    let mut parts = target.split('.');
    let first = parts.next().unwrap_or_default();
    match (parts.next(), parts.next()) {
        (None, _) => Ok(("public", first)),
        (Some(second), None) => Ok((first, second)),
        _ => Err(StmtError::InvalidTarget(target.to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::catalog;
    use super::*;
    use crate::value::Value;

    #[test]
    fn relation_lookup_defaults_to_public() {
        let cat = catalog();
        assert_eq!(cat.relation("person").unwrap().columns().len(), 4);
        assert_eq!(cat.relation("public.person").unwrap().columns().len(), 4);
        assert_eq!(cat.relation("test.Test2").unwrap().columns().len(), 4);
    }

    #[test]
    fn unknown_structure_is_an_error() {
        let cat = catalog();
        assert!(matches!(
            cat.relation("nope"),
            Err(StmtError::UnknownRelation(_))
        ));
        assert!(matches!(
            cat.relation("missing.person"),
            Err(StmtError::UnknownSchema(_))
        ));
        assert!(matches!(
            cat.relation("a.b.c"),
            Err(StmtError::InvalidTarget(_))
        ));
    }

    #[test]
    fn resolve_accepts_any_casing_variant() {
        let cat = catalog();
        for name in ["b_B", "bB"] {
            let cols = cat.resolve("person", &[name]).unwrap();
            assert_eq!(cols.len(), 1);
            assert_eq!(cols[0].name, "b_B");
        }
        for name in ["cc_cc", "ccCc"] {
            let cols = cat.resolve("person", &[name]).unwrap();
            assert_eq!(cols[0].name, "cc_cc");
        }
        // Test2's uppercase canonical names map to plain lowercase externals.
        let cols = cat.resolve("test.Test2", &["x"]).unwrap();
        assert_eq!(cols[0].name, "X");
    }

    #[test]
    fn resolve_drops_unknown_names() {
        let cat = catalog();
        let cols = cat.resolve("person", &["a_a", "no_such"]).unwrap();
        assert_eq!(cols.len(), 1);
    }

    #[test]
    fn resolve_fields_orders_by_catalog_position() {
        let cat = catalog();
        let fields = vec![
            FieldValue::new("ccCc", Value::Null),
            FieldValue::new("aA", "a"),
            FieldValue::new("id", 7i64),
        ];
        let resolved = cat.resolve_fields("person", fields).unwrap();
        let names: Vec<&str> = resolved.iter().map(|f| f.column.as_str()).collect();
        assert_eq!(names, ["id", "a_a", "cc_cc"]);
        assert!(resolved[0].primary_key);
        assert!(resolved[1].textual);
        assert_eq!(resolved[1].external, "aA");
    }

    #[test]
    fn resolve_fields_later_duplicate_wins() {
        let cat = catalog();
        let fields = vec![
            FieldValue::new("a_a", "first"),
            FieldValue::new("aA", "second"),
        ];
        let resolved = cat.resolve_fields("person", fields).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value, Value::Text("second".to_string()));
    }

    #[test]
    fn convenience_accessors() {
        let cat = catalog();
        assert_eq!(cat.primary_key("person").unwrap(), ["id"]);
        assert_eq!(
            cat.external_column_names("person").unwrap(),
            ["id", "aA", "bB", "ccCc"]
        );
        assert_eq!(
            cat.column_names("test.Test2").unwrap(),
            ["Id", "X", "Y", "Z"]
        );
    }
}
