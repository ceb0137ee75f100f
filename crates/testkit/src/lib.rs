use quarry_core::{ColumnDescriptor, FieldSchema, RelationalType, TableSchema};

mod fake_warehouse;
mod yaml_runner;

pub use fake_warehouse::{FakeClientFactory, FakeError, FakeWarehouse, MemoryResults};
pub use yaml_runner::{
    BindingSpec, TestResult, TranslationCase, load_translation_cases_from_path,
    load_translation_cases_from_str, run_translation_case,
};

/// `users(id STRING, name STRING)` keyed by `id`.
pub fn users_table_fixture() -> TableSchema {
    TableSchema::new("users")
        .column(ColumnDescriptor::new("id", RelationalType::String).with_warehouse_type("STRING"))
        .column(ColumnDescriptor::new("name", RelationalType::String).with_warehouse_type("STRING"))
        .primary_key(["id"])
}

pub fn users_result_schema() -> Vec<FieldSchema> {
    vec![
        FieldSchema::new("id", "STRING"),
        FieldSchema::new("name", "STRING"),
    ]
}
