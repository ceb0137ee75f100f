use std::sync::Arc;

use quarry_core::{
    BindingType, DeleteOptions, Dialect, Entity, Error, FetchMode, QualifiedTableRef, Result, Row,
    SaveListener, SaveOptions, SaveOutcome, SchemaRegistry, SelectQuery, Statement, TableSchema,
    Value, ValueBinder,
};
use tracing::{debug, warn};

use crate::{BigQueryConnection, ResultCursor, schema_mapper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SavePhase {
    New,
    Validating,
    Executing,
    Committed,
    Failed,
}

/// Why a save stopped after validation.
enum SaveFailure {
    /// Refused locally; nothing reached the warehouse.
    Rejected(Error),
    /// The insert or update job failed.
    Remote(Error),
}

/// Phase tracker for one `save` call.
struct SaveRun<'a> {
    table: &'a str,
    phase: SavePhase,
}

impl<'a> SaveRun<'a> {
    fn start(table: &'a str) -> Self {
        debug!(table, phase = ?SavePhase::New, "save started");
        Self {
            table,
            phase: SavePhase::New,
        }
    }

    fn advance(&mut self, next: SavePhase) {
        debug!(table = self.table, from = ?self.phase, to = ?next, "save phase");
        self.phase = next;
    }
}

/// CRUD entry point for one warehouse table.
///
/// Writes never run inside a transaction: a failed save reports the failure
/// but cannot undo whatever the warehouse already applied.
pub struct TableGateway {
    connection: Arc<BigQueryConnection>,
    registry: Arc<SchemaRegistry>,
    declared: Arc<TableSchema>,
    alias: String,
    listeners: Vec<Arc<dyn SaveListener>>,
}

impl std::fmt::Debug for TableGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableGateway")
            .field("table", &self.declared.name())
            .field("alias", &self.alias)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl TableGateway {
    /// Registers `schema` in `registry`; later registrations for the same
    /// table replace it for subsequent saves.
    pub fn new(
        connection: Arc<BigQueryConnection>,
        registry: Arc<SchemaRegistry>,
        schema: TableSchema,
    ) -> Self {
        let alias = schema.name().to_string();
        let declared = registry.register(schema);
        Self {
            connection,
            registry,
            declared,
            alias,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn SaveListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn SaveListener>) {
        self.listeners.push(listener);
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.declared.name()
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn connection(&self) -> &Arc<BigQueryConnection> {
        &self.connection
    }

    /// Current schema for this table. An invalidated entry is re-registered
    /// from the schema declared at construction.
    #[must_use]
    pub fn schema(&self) -> Arc<TableSchema> {
        self.registry
            .get_or_register(self.table(), || TableSchema::clone(&self.declared))
    }

    pub fn table_ref(&self) -> Result<QualifiedTableRef> {
        self.connection.table_ref(self.table())
    }

    pub fn save(&self, entity: &mut Entity, options: SaveOptions) -> Result<SaveOutcome> {
        let options = SaveOptions {
            atomic: false,
            ..options
        };
        let mut run = SaveRun::start(self.table());
        run.advance(SavePhase::Validating);

        if entity.has_errors() {
            debug!(table = self.table(), "entity has validation errors; save skipped");
            return Ok(SaveOutcome::Invalid);
        }
        if !entity.is_new() && !entity.is_dirty() {
            debug!(table = self.table(), "entity is clean; save skipped");
            return Ok(SaveOutcome::Unchanged);
        }

        let snapshot = entity.clone();
        match self.write(entity, &options, &mut run) {
            Ok(()) => {
                run.advance(SavePhase::Committed);
                for listener in &self.listeners {
                    listener.after_save(entity, &options);
                }
                if options.clean_on_success {
                    entity.clean();
                    entity.set_new(false);
                    entity.set_source(self.alias.clone());
                }
                Ok(SaveOutcome::Saved)
            }
            Err(failure) => {
                run.advance(SavePhase::Failed);
                *entity = snapshot;
                let (error, remote) = match failure {
                    SaveFailure::Rejected(error) => (error, false),
                    SaveFailure::Remote(error) => (error, true),
                };
                warn!(error = %error, table = self.table(), remote, "save failed");
                self.notify_save_error(entity, &options, &error);
                if remote {
                    Err(Error::rolled_back(self.table(), error))
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Listener hooks, coercion and the remote write. The caller restores the
    /// entity when this fails.
    fn write(
        &self,
        entity: &mut Entity,
        options: &SaveOptions,
        run: &mut SaveRun<'_>,
    ) -> std::result::Result<(), SaveFailure> {
        for listener in &self.listeners {
            listener
                .before_save(entity, options)
                .map_err(SaveFailure::Rejected)?;
        }

        let schema = self.schema();
        let table_ref = self.table_ref().map_err(SaveFailure::Rejected)?;
        let row = schema_mapper::coerce_row(&schema, entity.fields())
            .map_err(|error| SaveFailure::Rejected(error.into()))?;
        let keys = if entity.is_new() {
            None
        } else {
            Some(key_values(&schema, &row).map_err(SaveFailure::Rejected)?)
        };

        run.advance(SavePhase::Executing);
        match keys {
            None => self.insert(&table_ref, row),
            Some(keys) => self.update(&table_ref, &schema, &row, &keys),
        }
        .map_err(SaveFailure::Remote)
    }

    /// Deletes the row matching the entity's primary key. Returns whether
    /// the delete job completed.
    pub fn delete(&self, entity: &Entity, options: DeleteOptions) -> Result<bool> {
        debug!(
            table = self.table(),
            atomic = options.atomic,
            "delete requested; transactions are unsupported"
        );
        let schema = self.schema();
        let table_ref = self.table_ref()?;
        let keys = key_values(&schema, entity.fields())?
            .into_iter()
            .map(|(column, value)| {
                let coerced = match schema.relational_type(&column) {
                    Some(ty) => schema_mapper::coerce(&column, &value, ty)?,
                    None => value,
                };
                Ok::<_, Error>((column, coerced))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut binder = ValueBinder::new();
        let predicate = key_predicate(&schema, &keys, &mut binder);
        let sql = format!("DELETE FROM {} WHERE {predicate}", self.table());
        let sql = self
            .connection
            .dialect()
            .prepare(&sql, &table_ref, binder.bindings());

        let results = self.connection.job_client()?.execute(&sql)?;
        Ok(results.is_complete())
    }

    /// Query builder preloaded with this table and its declared columns.
    #[must_use]
    pub fn query(&self) -> SelectQuery {
        let schema = self.schema();
        SelectQuery::from(self.table()).select(
            schema
                .columns()
                .iter()
                .map(|column| column.name.clone()),
        )
    }

    pub fn find(&self, query: &SelectQuery) -> Result<ResultCursor> {
        let mut binder = ValueBinder::new();
        let sql = query.to_sql(&mut binder);
        let table_ref = self.connection.table_ref(query.table())?;
        let sql = self
            .connection
            .dialect()
            .prepare(&sql, &table_ref, binder.bindings());

        let results = self.connection.job_client()?.execute(&sql)?;
        Ok(ResultCursor::new(results))
    }

    /// Runs `query` and hydrates every row as a clean, persisted entity.
    pub fn find_entities(&self, query: &SelectQuery) -> Result<Vec<Entity>> {
        let mut cursor = self.find(query)?;
        cursor
            .fetch_all(FetchMode::Assoc)?
            .into_iter()
            .filter_map(|row| row.into_row())
            .map(|row| Ok(Entity::hydrated(row, self.alias.clone())))
            .collect()
    }

    /// Looks up one entity by primary key values, in key column order.
    pub fn get(&self, key: &[Value]) -> Result<Option<Entity>> {
        let schema = self.schema();
        let columns = schema.primary_key_columns();
        let mut query = self.query();
        for (index, column) in columns.iter().enumerate() {
            let Some(value) = key.get(index) else {
                return Err(Error::MissingPrimaryKey {
                    table: self.table().to_string(),
                    column: (*column).to_string(),
                });
            };
            query = query.where_eq(*column, value.clone(), binding_type(&schema, column, value));
        }

        Ok(self.find_entities(&query.limit(1))?.into_iter().next())
    }

    fn insert(&self, table_ref: &QualifiedTableRef, row: Row) -> Result<()> {
        self.connection.job_client()?.insert_rows(table_ref, vec![row])
    }

    fn update(
        &self,
        table_ref: &QualifiedTableRef,
        schema: &TableSchema,
        row: &Row,
        keys: &[(String, Value)],
    ) -> Result<()> {
        let mut binder = ValueBinder::new();
        let assignments = row
            .iter()
            .filter(|(column, _)| !schema.is_primary_key(column))
            .map(|(column, value)| {
                let placeholder =
                    binder.placeholder(value.clone(), binding_type(schema, column, value));
                format!("`{column}` = {placeholder}")
            })
            .collect::<Vec<_>>();
        if assignments.is_empty() {
            debug!(table = self.table(), "no non-key columns to update");
            return Ok(());
        }

        let predicate = key_predicate(schema, keys, &mut binder);
        let sql = format!(
            "UPDATE {} SET {} WHERE {predicate}",
            table_ref.dataset_qualified(),
            assignments.join(", ")
        );
        let sql = self
            .connection
            .dialect()
            .prepare(&sql, table_ref, binder.bindings());

        self.connection.job_client()?.execute_complete(&sql)?;
        Ok(())
    }

    fn notify_save_error(&self, entity: &Entity, options: &SaveOptions, error: &Error) {
        for listener in &self.listeners {
            listener.save_error(entity, options, error);
        }
    }
}

/// Primary key columns paired with their values; null or absent keys fail.
fn key_values(schema: &TableSchema, row: &Row) -> Result<Vec<(String, Value)>> {
    schema
        .primary_key_columns()
        .into_iter()
        .map(|column| match row.get(column) {
            Some(value) if !value.is_null() => Ok((column.to_string(), value.clone())),
            _ => Err(Error::MissingPrimaryKey {
                table: schema.name().to_string(),
                column: column.to_string(),
            }),
        })
        .collect()
}

fn key_predicate(schema: &TableSchema, keys: &[(String, Value)], binder: &mut ValueBinder) -> String {
    keys.iter()
        .map(|(column, value)| {
            let placeholder =
                binder.placeholder(value.clone(), binding_type(schema, column, value));
            format!("{column} = {placeholder}")
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Declared column type when known, otherwise inferred from the value.
fn binding_type(schema: &TableSchema, column: &str, value: &Value) -> BindingType {
    if let Some(ty) = schema.relational_type(column) {
        return BindingType::from(ty);
    }
    match value {
        Value::Bool(_) => BindingType::Boolean,
        Value::Int(_) => BindingType::Integer,
        Value::Float(_) => BindingType::Float,
        _ => BindingType::String,
    }
}
