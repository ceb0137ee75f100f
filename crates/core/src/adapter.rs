use crate::{ColumnDescriptor, Result, Row, Statement, TableSchema};

pub trait Datasource {
    fn connect(&self) -> Result<bool>;

    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    fn enabled(&self) -> bool;

    fn config_name(&self) -> &str;

    fn last_insert_id(&self) -> Option<String> {
        None
    }
}

/// Transaction, savepoint and foreign-key capabilities.
///
/// Defaults describe a backend with none of them: every call reports `false`
/// or returns empty SQL.
pub trait Transactable {
    fn start_transaction(&self) -> bool {
        false
    }

    fn commit_transaction(&self) -> bool {
        false
    }

    fn rollback_transaction(&self) -> bool {
        false
    }

    fn supports_savepoints(&self) -> bool {
        false
    }

    fn supports_dynamic_constraints(&self) -> bool {
        false
    }

    fn savepoint_sql(&self, _name: &str) -> String {
        String::new()
    }

    fn release_savepoint_sql(&self, _name: &str) -> String {
        String::new()
    }

    fn rollback_savepoint_sql(&self, _name: &str) -> String {
        String::new()
    }

    fn disable_foreign_key_sql(&self) -> String {
        String::new()
    }

    fn enable_foreign_key_sql(&self) -> String {
        String::new()
    }
}

pub trait SchemaDescribable {
    fn schema_dialect(&self) -> Box<dyn SchemaDialect>;
}

pub trait Executable {
    fn execute(&self, sql: &str) -> Result<Box<dyn Statement>>;
}

/// DDL and catalog SQL for one backend.
pub trait SchemaDialect: Send + Sync {
    fn list_tables_sql(&self) -> Vec<String>;

    fn describe_column_sql(&self, table: &str) -> Vec<String>;

    fn describe_index_sql(&self, table: &str) -> Vec<String>;

    fn describe_foreign_key_sql(&self, table: &str) -> Vec<String>;

    fn convert_column_description(&self, row: &Row) -> Result<ColumnDescriptor>;

    fn create_table_sql(&self, schema: &TableSchema) -> Vec<String>;

    fn column_sql(&self, column: &ColumnDescriptor) -> String;

    fn constraint_sql(&self, schema: &TableSchema, name: &str) -> String;

    fn index_sql(&self, schema: &TableSchema, name: &str) -> String;

    fn add_constraint_sql(&self, schema: &TableSchema) -> Vec<String>;

    fn drop_constraint_sql(&self, schema: &TableSchema) -> Vec<String>;

    fn truncate_table_sql(&self, schema: &TableSchema) -> Vec<String>;
}
