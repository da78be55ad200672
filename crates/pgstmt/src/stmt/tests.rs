use std::sync::{Arc, Mutex};

use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

use super::Builder;
use crate::catalog::fixtures::catalog;
use crate::client::GenericClient;
use crate::error::{StmtError, StmtResult};
use crate::fields::Map;
use crate::value::Value;

fn builder() -> Builder {
    Builder::new(Arc::new(catalog()))
}

fn map(entries: &[(&str, Value)]) -> Map {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Captures every statement the builders would send, without a database.
///
/// Row-returning calls report zero rows, so execution methods surface the
/// `NotFound` path while the test inspects the recorded SQL. `execute`
/// reports the configured affected-row count.
#[derive(Default)]
struct RecordingClient {
    sent: Mutex<Vec<String>>,
    affected: u64,
}

impl RecordingClient {
    fn with_affected(affected: u64) -> Self {
        Self {
            affected,
            ..Self::default()
        }
    }

    fn record(&self, sql: &str) {
        self.sent.lock().unwrap().push(sql.to_string());
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl GenericClient for RecordingClient {
    async fn query(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> StmtResult<Vec<Row>> {
        self.record(sql);
        Ok(Vec::new())
    }

    async fn query_opt(
        &self,
        sql: &str,
        _params: &[&(dyn ToSql + Sync)],
    ) -> StmtResult<Option<Row>> {
        self.record(sql);
        Ok(None)
    }

    async fn query_one(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> StmtResult<Row> {
        self.record(sql);
        Err(StmtError::not_found("expected one row, got none"))
    }

    async fn execute(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> StmtResult<u64> {
        self.record(sql);
        Ok(self.affected)
    }
}

#[test]
fn query_without_predicate_has_no_where() {
    let (sql, params) = builder().query("person").build().unwrap();
    assert_eq!(
        sql,
        "SELECT id, a_a AS \"aA\", \"b_B\" AS \"bB\", cc_cc AS \"ccCc\" FROM person"
    );
    assert!(params.is_empty());
}

#[test]
fn query_order_limit_offset() {
    let (sql, params) = builder()
        .query("person")
        .columns(&["id"])
        .order_by("aA DeSc, id")
        .limit(10)
        .offset(20)
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT id FROM person ORDER BY a_a DESC, id LIMIT 10 OFFSET 20");
    assert!(params.is_empty());
}

#[test]
fn query_zero_limit_and_offset_are_omitted() {
    let (sql, _) = builder()
        .query("person")
        .columns(&["id"])
        .limit(0)
        .offset(0)
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT id FROM person");
}

#[test]
fn query_single_value_predicate() {
    let (sql, params) = builder()
        .query("person")
        .columns(&["id"])
        .where_value("aA", "a")
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT id FROM person WHERE a_a = $1");
    assert_eq!(params.values(), &[Value::Text("a".to_string())]);
}

#[test]
fn query_template_predicate() {
    let (sql, params) = builder()
        .query("person")
        .columns(&["id"])
        .where_template("id = ? OR id = ?", vec![1.into(), 2.into()])
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT id FROM person WHERE id = $1 OR id = $2");
    assert_eq!(params.values(), &[Value::Int(1), Value::Int(2)]);
}

#[test]
fn query_soft_filter_skips_nil_and_defaults_to_prefix() {
    let (sql, params) = builder()
        .query("person")
        .columns(&["id"])
        .filter(&map(&[("a_a", Value::from("a")), ("b_B", Value::Null)]))
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT id FROM person WHERE a_a ILIKE $1");
    assert_eq!(params.values(), &[Value::Text("a%".to_string())]);
}

#[test]
fn query_quotes_mixed_case_relation_and_columns() {
    let (sql, _) = builder()
        .query("test.Test2")
        .columns(&["x"])
        .where_value("y", 3)
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT \"X\" AS x FROM test.\"Test2\" WHERE \"Y\" = $1");
}

#[test]
fn query_distinct() {
    let (sql, _) = builder()
        .query("person")
        .columns(&["aA"])
        .distinct()
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT DISTINCT a_a AS \"aA\" FROM person");
}

#[test]
fn insert_skips_nil_fields() {
    let row = map(&[
        ("a_a", Value::from("a")),
        ("b_B", Value::from(1)),
        ("cc_cc", Value::Null),
    ]);
    let (sql, params) = builder().insert("person").values(&row).build().unwrap();
    assert_eq!(sql, "INSERT INTO person (a_a, \"b_B\") VALUES ($1, $2)");
    assert_eq!(
        params.values(),
        &[Value::Text("a".to_string()), Value::Int(1)]
    );
}

#[test]
fn insert_all_nil_degrades_to_default_values() {
    let row = map(&[("a_a", Value::Null), ("b_B", Value::Null)]);
    let (sql, params) = builder().insert("person").values(&row).build().unwrap();
    assert_eq!(sql, "INSERT INTO person DEFAULT VALUES");
    assert!(params.is_empty());
}

#[test]
fn insert_value_overrides_record_field() {
    let row = map(&[("a_a", Value::from("a"))]);
    let (sql, params) = builder()
        .insert("person")
        .values(&row)
        .value("a_a", "b")
        .build()
        .unwrap();
    assert_eq!(sql, "INSERT INTO person (a_a) VALUES ($1)");
    assert_eq!(params.values(), &[Value::Text("b".to_string())]);
}

#[test]
fn insert_returning_resolves_external_names() {
    let (sql, _) = builder()
        .insert("person")
        .value("a_a", "a")
        .returning(&["id", "bB"])
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO person (a_a) VALUES ($1) RETURNING id, \"b_B\""
    );
}

#[test]
fn update_routes_primary_key_into_where() {
    let row = map(&[("id", Value::from(22)), ("a_a", Value::from("a"))]);
    let (sql, params) = builder()
        .update("person")
        .set_where_pk(&row)
        .build()
        .unwrap();
    assert_eq!(sql, "UPDATE person SET a_a = $1 WHERE id = $2");
    assert_eq!(
        params.values(),
        &[Value::Text("a".to_string()), Value::Int(22)]
    );
}

#[test]
fn update_nil_field_sets_null() {
    let (sql, params) = builder()
        .update("person")
        .set_value("a_a", Value::Null)
        .where_value("id", 1)
        .build()
        .unwrap();
    assert_eq!(sql, "UPDATE person SET a_a = NULL WHERE id = $1");
    assert_eq!(params.values(), &[Value::Int(1)]);
}

#[test]
fn update_without_set_values_is_an_error() {
    let err = builder()
        .update("person")
        .where_value("id", 1)
        .build()
        .unwrap_err();
    assert!(matches!(err, StmtError::EmptySet));

    // Routing can drain the SET list entirely.
    let row = map(&[("id", Value::from(22))]);
    let err = builder()
        .update("person")
        .set_where_pk(&row)
        .build()
        .unwrap_err();
    assert!(matches!(err, StmtError::EmptySet));
}

#[test]
fn delete_with_exact_predicate_and_returning() {
    let (sql, params) = builder()
        .delete("person")
        .where_value("id", 7)
        .returning(&["id"])
        .build()
        .unwrap();
    assert_eq!(sql, "DELETE FROM person WHERE id = $1 RETURNING id");
    assert_eq!(params.values(), &[Value::Int(7)]);
}

#[test]
fn delete_without_predicate_targets_whole_relation() {
    let (sql, params) = builder().delete("test1").build().unwrap();
    assert_eq!(sql, "DELETE FROM test1");
    assert!(params.is_empty());
}

#[test]
fn empty_target_is_required_everywhere() {
    let b = builder();
    assert!(matches!(
        b.query("").build(),
        Err(StmtError::TargetRequired)
    ));
    assert!(matches!(
        b.insert("").build(),
        Err(StmtError::TargetRequired)
    ));
    assert!(matches!(
        b.update("").set_value("a", 1).build(),
        Err(StmtError::TargetRequired)
    ));
    assert!(matches!(
        b.delete("").build(),
        Err(StmtError::TargetRequired)
    ));
}

#[test]
fn unknown_relation_is_recoverable() {
    assert!(matches!(
        builder().query("missing").build(),
        Err(StmtError::UnknownRelation(_))
    ));
}

#[test]
fn template_arity_mismatch_is_an_error() {
    let err = builder()
        .query("person")
        .where_template("id = ? AND a_a = ?", vec![1.into()])
        .build()
        .unwrap_err();
    assert!(matches!(err, StmtError::TemplateArity { markers: 2, args: 1 }));
}

#[tokio::test]
async fn all_json_wraps_rows_in_a_json_agg_document() {
    let client = RecordingClient::default();
    let err = builder()
        .query("person")
        .columns(&["id"])
        .all_json(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        client.sent(),
        ["SELECT COALESCE(json_agg(t), '[]'::json)::text AS json FROM (SELECT id FROM person) t"]
    );
}

#[tokio::test]
async fn one_json_wraps_the_statement_in_row_to_json() {
    let client = RecordingClient::default();
    let err = builder()
        .query("person")
        .columns(&["id"])
        .where_value("id", 1)
        .one_json(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        client.sent(),
        ["SELECT row_to_json(t)::text AS json FROM (SELECT id FROM person WHERE id = $1) t"]
    );
}

#[tokio::test]
async fn exists_keeps_the_configured_paging_window() {
    let client = RecordingClient::default();
    let err = builder()
        .query("person")
        .where_value("id", 1)
        .order_by("aA DESC")
        .limit(5)
        .offset(100)
        .exists(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        client.sent(),
        ["SELECT EXISTS (SELECT 1 FROM person WHERE id = $1 LIMIT 5 OFFSET 100)"]
    );
}

#[tokio::test]
async fn count_drops_ordering_and_paging() {
    let client = RecordingClient::default();
    let err = builder()
        .query("person")
        .where_value("aA", "x")
        .order_by("id DESC")
        .limit(5)
        .offset(100)
        .count(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(client.sent(), ["SELECT count(*) FROM person WHERE a_a = $1"]);
}

#[tokio::test]
async fn exists_and_count_reject_unknown_relations_before_the_client() {
    let client = RecordingClient::default();
    let stmt = builder()
        .query("missing")
        .where_template("id = ?", vec![1.into()]);
    assert!(matches!(
        stmt.exists(&client).await,
        Err(StmtError::UnknownRelation(_))
    ));
    assert!(matches!(
        stmt.count(&client).await,
        Err(StmtError::UnknownRelation(_))
    ));
    assert!(client.sent().is_empty());
}

#[tokio::test]
async fn insert_one_json_without_returning_reports_rows_affected() {
    let client = RecordingClient::with_affected(3);
    let json = builder()
        .insert("person")
        .value("a_a", "x")
        .one_json(&client)
        .await
        .unwrap();
    assert_eq!(json, "{\"rowsAffected\": 3}");
    assert_eq!(client.sent(), ["INSERT INTO person (a_a) VALUES ($1)"]);
}

#[tokio::test]
async fn insert_one_json_with_returning_builds_a_json_document() {
    let client = RecordingClient::default();
    let err = builder()
        .insert("person")
        .value("a_a", "x")
        .returning(&["id"])
        .one_json(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        client.sent(),
        ["INSERT INTO person (a_a) VALUES ($1) RETURNING json_build_object('id', id)::text"]
    );
}

#[tokio::test]
async fn update_one_json_without_returning_reports_rows_affected() {
    let client = RecordingClient::with_affected(1);
    let json = builder()
        .update("person")
        .set_value("a_a", "x")
        .where_value("id", 7)
        .one_json(&client)
        .await
        .unwrap();
    assert_eq!(json, "{\"rowsAffected\": 1}");
    assert_eq!(client.sent(), ["UPDATE person SET a_a = $1 WHERE id = $2"]);
}

#[tokio::test]
async fn execute_with_zero_affected_rows_is_not_found() {
    let client = RecordingClient::default();
    let err = builder()
        .delete("person")
        .where_value("id", 7)
        .execute(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(client.sent(), ["DELETE FROM person WHERE id = $1"]);
}
