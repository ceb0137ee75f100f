use std::sync::{Arc, Mutex, PoisonError};

use chrono::{TimeZone, Utc};
use quarry_core::{
    ColumnDescriptor, DeleteOptions, Entity, Error, ExecutionError, RelationalType, Row,
    SaveListener, SaveOptions, SaveOutcome, SchemaRegistry, TableSchema, TypeCoercionError, Value,
};
use quarry_dialect_bigquery::{TableGateway, TimestampBehavior};
use quarry_testkit::{users_result_schema, users_table_fixture};

#[path = "support/warehouse_fixture.rs"]
mod warehouse_fixture;

use warehouse_fixture::WarehouseFixture;

#[derive(Debug, Default)]
struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }
}

impl SaveListener for RecordingListener {
    fn before_save(&self, _entity: &mut Entity, options: &SaveOptions) -> quarry_core::Result<()> {
        self.record(format!("before_save atomic={}", options.atomic));
        Ok(())
    }

    fn after_save(&self, _entity: &Entity, _options: &SaveOptions) {
        self.record("after_save");
    }

    fn save_error(&self, _entity: &Entity, _options: &SaveOptions, error: &Error) {
        self.record(format!("save_error: {error}"));
    }
}

/// Stamps a field, then refuses the save.
#[derive(Debug)]
struct TenantGuard;

impl SaveListener for TenantGuard {
    fn before_save(&self, entity: &mut Entity, _options: &SaveOptions) -> quarry_core::Result<()> {
        entity.set("tenant", "unknown");
        Err(Error::MissingPrimaryKey {
            table: "users".to_string(),
            column: "tenant".to_string(),
        })
    }
}

fn fixed_clock_timestamps() -> TimestampBehavior {
    TimestampBehavior::new().with_clock(Arc::new(|| {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9)
            .single()
            .expect("valid fixed instant")
    }))
}

fn stored_user(id: &str, name: &str) -> Entity {
    Entity::hydrated(Row::new().with("id", id).with("name", name), "Users")
}

#[test]
fn new_entity_is_streamed_and_marked_persisted() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();
    let mut entity = Entity::from_row(Row::new().with("id", "1").with("name", "A"));

    let outcome = gateway
        .save(&mut entity, SaveOptions::default())
        .expect("insert should succeed");

    assert_eq!(outcome, SaveOutcome::Saved);
    let inserts = fixture.warehouse.inserts();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].0.qualified(), "`p.d.users`");
    assert_eq!(inserts[0].1, vec![Row::new().with("id", "1").with("name", "A")]);
    assert!(fixture.warehouse.executed_sql().is_empty());

    assert!(!entity.is_new());
    assert!(!entity.is_dirty());
    assert_eq!(entity.source(), Some("Users"));
}

#[test]
fn existing_entity_update_targets_dataset_table_with_inlined_literals() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();
    let mut entity = stored_user("1", "A");
    entity.set("name", "B");

    let outcome = gateway
        .save(&mut entity, SaveOptions::default())
        .expect("update should succeed");

    assert_eq!(outcome, SaveOutcome::Saved);
    assert_eq!(
        fixture.warehouse.executed_sql(),
        vec!["UPDATE `d.users` SET `name` = 'B' WHERE id = '1'"]
    );
    assert!(fixture.warehouse.inserts().is_empty());
    assert!(!entity.is_dirty());
}

#[test]
fn update_escapes_quotes_in_values() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();
    let mut entity = stored_user("1", "A");
    entity.set("name", "O'Brien");

    gateway
        .save(&mut entity, SaveOptions::default())
        .expect("update should succeed");

    assert_eq!(
        fixture.warehouse.executed_sql(),
        vec![r"UPDATE `d.users` SET `name` = 'O\'Brien' WHERE id = '1'"]
    );
}

#[test]
fn clean_and_invalid_entities_make_no_remote_call() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();

    let mut clean = stored_user("1", "A");
    assert_eq!(
        gateway
            .save(&mut clean, SaveOptions::default())
            .expect("clean save"),
        SaveOutcome::Unchanged
    );

    let mut invalid = Entity::from_row(Row::new().with("id", "2"));
    invalid.set_error("name", "required");
    assert_eq!(
        gateway
            .save(&mut invalid, SaveOptions::default())
            .expect("invalid save"),
        SaveOutcome::Invalid
    );
    assert!(invalid.is_new());

    assert_eq!(fixture.warehouse.call_count(), 0);
    assert!(!fixture.connection.is_connected());
}

#[test]
fn failed_update_leaves_entity_dirty_and_notifies_listeners() {
    let fixture = WarehouseFixture::new();
    let listener = Arc::new(RecordingListener::default());
    let gateway = fixture.users_gateway().with_listener(listener.clone());
    fixture.warehouse.set_fail_on_sql(Some("UPDATE"));

    let mut entity = stored_user("1", "A");
    entity.set("name", "B");
    let error = gateway
        .save(
            &mut entity,
            SaveOptions {
                atomic: true,
                ..SaveOptions::default()
            },
        )
        .expect_err("failing job must fail the save");

    let Error::RolledBack { table, source } = &error else {
        panic!("expected rolled back error, got {error:?}");
    };
    assert_eq!(table, "users");
    assert!(matches!(
        source.as_ref(),
        Error::Execute(ExecutionError::JobFailed { .. })
    ));
    assert!(error.to_string().contains("remote writes are not undone"));

    assert!(entity.is_dirty());
    assert!(entity.is_field_dirty("name"));

    let events = listener.events();
    assert_eq!(events[0], "before_save atomic=false");
    assert!(events[1].starts_with("save_error: query job failed"));
    assert_eq!(events.len(), 2);
}

#[test]
fn failed_update_restores_fields_stamped_by_listeners() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture
        .users_gateway()
        .with_listener(Arc::new(fixed_clock_timestamps()));
    fixture.warehouse.set_fail_on_sql(Some("UPDATE"));

    let mut entity = stored_user("1", "A");
    entity.set("name", "B");
    let before = entity.clone();

    let error = gateway
        .save(&mut entity, SaveOptions::default())
        .expect_err("failing job must fail the save");

    assert!(matches!(error, Error::RolledBack { .. }));
    let executed = fixture.warehouse.executed_sql();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].contains("`modified` = '2024-05-06T07:08:09.000000Z'"));
    assert_eq!(entity, before);
    assert_eq!(entity.get("modified"), None);
    assert_eq!(entity.dirty_fields().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn listener_refusal_fails_the_save_without_a_remote_call() {
    let fixture = WarehouseFixture::new();
    let recorder = Arc::new(RecordingListener::default());
    let gateway = fixture
        .users_gateway()
        .with_listener(recorder.clone())
        .with_listener(Arc::new(TenantGuard));

    let mut entity = Entity::from_row(Row::new().with("id", "1").with("name", "A"));
    let before = entity.clone();

    let error = gateway
        .save(&mut entity, SaveOptions::default())
        .expect_err("listener refusal must fail the save");

    assert!(matches!(
        error,
        Error::MissingPrimaryKey { ref column, .. } if column == "tenant"
    ));
    assert_eq!(fixture.warehouse.call_count(), 0);
    assert_eq!(entity, before);

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], "before_save atomic=false");
    assert!(events[1].starts_with("save_error: entity for table `users`"));
}

#[test]
fn ignored_save_options_do_not_change_the_update() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();

    let mut entity = stored_user("1", "A");
    entity.set("name", "B");
    let outcome = gateway
        .save(
            &mut entity,
            SaveOptions {
                associated: false,
                check_rules: false,
                check_existing: false,
                ..SaveOptions::default()
            },
        )
        .expect("update should succeed");

    assert_eq!(outcome, SaveOutcome::Saved);
    assert_eq!(
        fixture.warehouse.executed_sql(),
        vec!["UPDATE `d.users` SET `name` = 'B' WHERE id = '1'"]
    );

    let mut invalid = stored_user("2", "C");
    invalid.set("name", "");
    invalid.set_error("name", "required");
    assert_eq!(
        gateway
            .save(
                &mut invalid,
                SaveOptions {
                    associated: false,
                    ..SaveOptions::default()
                },
            )
            .expect("invalid entities are not errors"),
        SaveOutcome::Invalid
    );
    assert_eq!(fixture.warehouse.call_count(), 1);
}

#[test]
fn incomplete_update_job_is_a_failure() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();
    fixture.warehouse.set_incomplete(true);

    let mut entity = stored_user("1", "A");
    entity.set("name", "B");
    let error = gateway
        .save(&mut entity, SaveOptions::default())
        .expect_err("incomplete job must fail the save");

    let Error::RolledBack { source, .. } = error else {
        panic!("expected rolled back error");
    };
    assert!(matches!(
        *source,
        Error::Execute(ExecutionError::Incomplete { ref job_id, .. }) if job_id == "job-0"
    ));
    assert!(entity.is_dirty());
}

#[test]
fn rejected_insert_rows_fail_the_save() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();
    fixture.warehouse.set_insert_rejection(Some("invalid"));

    let mut entity = Entity::from_row(Row::new().with("id", "1").with("name", "A"));
    let error = gateway
        .save(&mut entity, SaveOptions::default())
        .expect_err("rejected row must fail the save");

    let Error::RolledBack { source, .. } = error else {
        panic!("expected rolled back error");
    };
    let Error::Execute(ExecutionError::InsertFailed { table, failed_rows }) = *source else {
        panic!("expected insert failure");
    };
    assert_eq!(table, "p.d.users");
    assert_eq!(failed_rows.len(), 1);
    assert!(entity.is_new());
}

#[test]
fn coercion_error_aborts_before_any_remote_call() {
    let fixture = WarehouseFixture::new();
    let listener = Arc::new(RecordingListener::default());
    let schema = TableSchema::new("events")
        .column(ColumnDescriptor::new("id", RelationalType::String))
        .column(ColumnDescriptor::new("hits", RelationalType::Integer))
        .column(ColumnDescriptor::new("seen_at", RelationalType::DateTime))
        .primary_key(["id"]);
    let gateway = TableGateway::new(
        Arc::clone(&fixture.connection),
        Arc::new(SchemaRegistry::new()),
        schema,
    )
    .with_listener(listener.clone());

    let mut entity = Entity::from_row(
        Row::new()
            .with("id", "1")
            .with("hits", "many")
            .with("seen_at", "2024-01-01"),
    );
    let before = entity.clone();
    let error = gateway
        .save(&mut entity, SaveOptions::default())
        .expect_err("non-numeric integer must fail");

    assert!(matches!(
        error,
        Error::Coerce(TypeCoercionError::InvalidNumber { ref column, .. }) if column == "hits"
    ));
    assert_eq!(fixture.warehouse.call_count(), 0);
    assert_eq!(listener.events().len(), 2);
    assert_eq!(entity, before);
}

#[test]
fn coerced_values_reach_the_insert_row() {
    let fixture = WarehouseFixture::new();
    let schema = TableSchema::new("events")
        .column(ColumnDescriptor::new("id", RelationalType::String))
        .column(ColumnDescriptor::new("hits", RelationalType::Integer))
        .column(ColumnDescriptor::new("active", RelationalType::Boolean))
        .column(ColumnDescriptor::new("seen_at", RelationalType::DateTime))
        .primary_key(["id"]);
    let gateway = TableGateway::new(
        Arc::clone(&fixture.connection),
        Arc::new(SchemaRegistry::new()),
        schema,
    );

    let mut entity = Entity::from_row(
        Row::new()
            .with("id", 7_i64)
            .with("hits", "42")
            .with("active", 1_i64)
            .with("seen_at", "2024-01-02 03:04:05"),
    );
    gateway
        .save(&mut entity, SaveOptions::default())
        .expect("insert should succeed");

    let inserts = fixture.warehouse.inserts();
    let row = &inserts[0].1[0];
    assert_eq!(row.get("id"), Some(&Value::from("7")));
    assert_eq!(row.get("hits"), Some(&Value::Int(42)));
    assert_eq!(row.get("active"), Some(&Value::Bool(true)));
    assert_eq!(row.get("seen_at"), Some(&Value::from("2024-01-02T03:04:05")));
}

#[test]
fn save_reads_the_schema_registered_at_save_time() {
    let fixture = WarehouseFixture::new();
    let registry = Arc::new(SchemaRegistry::new());
    let gateway = TableGateway::new(
        Arc::clone(&fixture.connection),
        Arc::clone(&registry),
        users_table_fixture(),
    );
    registry.register(
        users_table_fixture().column(ColumnDescriptor::new("age", RelationalType::Integer)),
    );

    let mut entity = Entity::from_row(Row::new().with("id", "1").with("age", "41"));
    gateway
        .save(&mut entity, SaveOptions::default())
        .expect("insert should succeed");
    assert_eq!(
        fixture.warehouse.inserts()[0].1[0].get("age"),
        Some(&Value::Int(41))
    );

    registry.invalidate("users");
    assert_eq!(gateway.schema().columns().len(), 2);
}

#[test]
fn update_without_key_value_is_rejected() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();
    let mut entity = Entity::hydrated(Row::new().with("id", Value::Null), "Users");
    entity.set("name", "B");

    let error = gateway
        .save(&mut entity, SaveOptions::default())
        .expect_err("null key must fail");

    assert!(matches!(
        error,
        Error::MissingPrimaryKey { ref column, .. } if column == "id"
    ));
    assert_eq!(fixture.warehouse.call_count(), 0);
}

#[test]
fn timestamp_behavior_stamps_rows_before_insert() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture
        .users_gateway()
        .with_listener(Arc::new(fixed_clock_timestamps()));

    let mut entity = Entity::from_row(Row::new().with("id", "1").with("name", "A"));
    gateway
        .save(&mut entity, SaveOptions::default())
        .expect("insert should succeed");

    let row = &fixture.warehouse.inserts()[0].1[0];
    assert_eq!(
        row.get("created"),
        Some(&Value::from("2024-05-06T07:08:09.000000Z"))
    );
    assert_eq!(row.get("modified"), row.get("created"));
}

#[test]
fn delete_qualifies_table_and_reports_job_completion() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();

    let deleted = gateway
        .delete(&stored_user("1", "A"), DeleteOptions::default())
        .expect("delete should succeed");

    assert!(deleted);
    assert_eq!(
        fixture.warehouse.executed_sql(),
        vec!["DELETE FROM `p.d.users` WHERE id = '1'"]
    );

    fixture.warehouse.set_incomplete(true);
    let deleted = gateway
        .delete(&stored_user("2", "B"), DeleteOptions::default())
        .expect("incomplete delete is not an error");
    assert!(!deleted);
}

#[test]
fn delete_without_key_is_rejected_before_any_job() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();

    let error = gateway
        .delete(
            &Entity::from_row(Row::new().with("name", "A")),
            DeleteOptions::default(),
        )
        .expect_err("missing key must fail");

    assert!(matches!(error, Error::MissingPrimaryKey { .. }));
    assert_eq!(fixture.warehouse.call_count(), 0);
}

#[test]
fn get_hydrates_a_clean_entity_from_the_first_row() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();
    fixture.warehouse.push_result(
        users_result_schema(),
        vec![Row::new().with("id", "1").with("name", "A")],
    );

    let entity = gateway
        .get(&[Value::from("1")])
        .expect("get should succeed")
        .expect("row should be found");

    assert_eq!(
        fixture.warehouse.executed_sql(),
        vec!["SELECT id, name FROM `p.d.users` WHERE id = '1' LIMIT 1"]
    );
    assert_eq!(entity.get("name"), Some(&Value::from("A")));
    assert!(!entity.is_new());
    assert!(!entity.is_dirty());
    assert_eq!(entity.source(), Some("Users"));

    let missing = gateway.get(&[Value::from("2")]).expect("get should succeed");
    assert!(missing.is_none());
}

#[test]
fn find_entities_translates_builder_queries() {
    let fixture = WarehouseFixture::new();
    let gateway = fixture.users_gateway();
    fixture.warehouse.push_result(
        users_result_schema(),
        vec![
            Row::new().with("id", "1").with("name", "A"),
            Row::new().with("id", "2").with("name", "B"),
        ],
    );

    let query = gateway
        .query()
        .where_eq("name", "A", quarry_core::BindingType::String)
        .order_by("id", quarry_core::SortOrder::Desc);
    let entities = gateway.find_entities(&query).expect("find should succeed");

    assert_eq!(entities.len(), 2);
    assert_eq!(
        fixture.warehouse.executed_sql(),
        vec!["SELECT id, name FROM `p.d.users` WHERE name = 'A' ORDER BY id DESC"]
    );
}
