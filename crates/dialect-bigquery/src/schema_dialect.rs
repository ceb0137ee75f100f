use quarry_core::{ColumnDescriptor, Result, Row, SchemaDialect, TableSchema, Value};

use crate::schema_mapper::{to_relational_type, to_warehouse_type};

/// DDL support for the warehouse. Catalog introspection, constraints and
/// indexes do not exist there, so those hooks return empty SQL.
#[derive(Debug, Default, Clone, Copy)]
pub struct BigQuerySchemaDialect;

impl SchemaDialect for BigQuerySchemaDialect {
    fn list_tables_sql(&self) -> Vec<String> {
        Vec::new()
    }

    fn describe_column_sql(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    fn describe_index_sql(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    fn describe_foreign_key_sql(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    /// Reads a `{name, type}` catalog row. Every column is nullable.
    fn convert_column_description(&self, row: &Row) -> Result<ColumnDescriptor> {
        let name = row.get("name").map(Value::to_text).unwrap_or_default();
        let warehouse_type = row.get("type").map(Value::to_text).unwrap_or_default();

        Ok(ColumnDescriptor::new(name, to_relational_type(&warehouse_type))
            .with_warehouse_type(warehouse_type))
    }

    fn create_table_sql(&self, schema: &TableSchema) -> Vec<String> {
        let columns = schema
            .columns()
            .iter()
            .map(|column| self.column_sql(column))
            .collect::<Vec<_>>();

        vec![format!(
            "CREATE TABLE `{}` ({})",
            schema.name(),
            columns.join(", ")
        )]
    }

    fn column_sql(&self, column: &ColumnDescriptor) -> String {
        let warehouse_type = column
            .warehouse_type
            .clone()
            .unwrap_or_else(|| to_warehouse_type(column.relational_type).to_string());
        if column.nullable {
            format!("`{}` {warehouse_type}", column.name)
        } else {
            format!("`{}` {warehouse_type} NOT NULL", column.name)
        }
    }

    fn constraint_sql(&self, _schema: &TableSchema, _name: &str) -> String {
        String::new()
    }

    fn index_sql(&self, _schema: &TableSchema, _name: &str) -> String {
        String::new()
    }

    fn add_constraint_sql(&self, _schema: &TableSchema) -> Vec<String> {
        Vec::new()
    }

    fn drop_constraint_sql(&self, _schema: &TableSchema) -> Vec<String> {
        Vec::new()
    }

    fn truncate_table_sql(&self, _schema: &TableSchema) -> Vec<String> {
        Vec::new()
    }
}
