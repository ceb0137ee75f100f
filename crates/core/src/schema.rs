use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

/// Column types in the vocabulary the ORM layer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Timestamp,
}

impl RelationalType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
        }
    }

    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Timestamp)
    }
}

impl fmt::Display for RelationalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Native warehouse type name, when known (result schemas always carry one).
    pub warehouse_type: Option<String>,
    pub relational_type: RelationalType,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, relational_type: RelationalType) -> Self {
        Self {
            name: name.into(),
            warehouse_type: None,
            relational_type,
            nullable: true,
        }
    }

    #[must_use]
    pub fn with_warehouse_type(mut self, warehouse_type: impl Into<String>) -> Self {
        self.warehouse_type = Some(warehouse_type.into());
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Statically declared shape of one warehouse table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDescriptor>,
    primary_key: Vec<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.add_column(column);
        self
    }

    #[must_use]
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_column(&mut self, column: ColumnDescriptor) {
        if let Some(existing) = self
            .columns
            .iter_mut()
            .find(|existing| existing.name == column.name)
        {
            *existing = column;
        } else {
            self.columns.push(column);
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Declared key columns; defaults to `id` when none were declared.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&str> {
        if self.primary_key.is_empty() {
            return vec!["id"];
        }
        self.primary_key.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key_columns().contains(&column)
    }

    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    #[must_use]
    pub fn relational_type(&self, column: &str) -> Option<RelationalType> {
        self.find_column(column).map(|column| column.relational_type)
    }
}

/// Process-wide cache of table schemas, keyed by table name.
///
/// Registration replaces the previous entry, so callers holding an older
/// `Arc<TableSchema>` keep a consistent snapshot while new lookups see the
/// replacement.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, schema: TableSchema) -> Arc<TableSchema> {
        let schema = Arc::new(schema);
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(schema.name().to_string(), Arc::clone(&schema));
        schema
    }

    /// Returns the cached schema, building and caching it on first use.
    pub fn get_or_register(
        &self,
        table: &str,
        build: impl FnOnce() -> TableSchema,
    ) -> Arc<TableSchema> {
        if let Some(schema) = self.get(table) {
            return schema;
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            tables
                .entry(table.to_string())
                .or_insert_with(|| Arc::new(build())),
        )
    }

    #[must_use]
    pub fn get(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
    }

    pub fn invalidate(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(table)
    }
}
