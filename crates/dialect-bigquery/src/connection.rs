use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use quarry_core::{
    ClientFactory, ConnectionConfig, ConnectionError, Datasource, Executable, ExecutionError,
    QualifiedTableRef, Result, SchemaDescribable, SchemaDialect, Statement, Transactable,
    WarehouseClient,
};
use tracing::{debug, info, warn};

use crate::{BigQueryDialect, BigQuerySchemaDialect, JobClient, JobOptions, ResultCursor};

const CLIENT_SLOT: &str = "warehouse client";

type ClientSlot = Option<Arc<dyn WarehouseClient>>;

/// Datasource facade over one warehouse project and dataset.
///
/// The RPC client is created by the injected factory on `connect` (or on
/// first use) and shared by every job issued through this connection.
pub struct BigQueryConnection {
    config: ConnectionConfig,
    factory: Arc<dyn ClientFactory>,
    client: Mutex<ClientSlot>,
    dialect: BigQueryDialect,
}

impl fmt::Debug for BigQueryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigQueryConnection")
            .field("name", &self.config.name)
            .field("project_id", &self.config.project_id)
            .field("data_set", &self.config.data_set)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl BigQueryConnection {
    pub fn new(config: ConnectionConfig, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            config,
            factory,
            client: Mutex::new(None),
            dialect: BigQueryDialect::default(),
        }
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: BigQueryDialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[must_use]
    pub fn dialect(&self) -> &BigQueryDialect {
        &self.dialect
    }

    pub fn connect(&self) -> Result<bool> {
        let mut slot = self.lock_client()?;
        self.ensure_client(&mut slot)?;
        Ok(true)
    }

    pub fn disconnect(&self) {
        let mut slot = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            info!(name = %self.config.name, "disconnected from warehouse");
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.client
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        true
    }

    #[must_use]
    pub fn config_name(&self) -> &str {
        &self.config.name
    }

    /// Shared client, connecting first when needed.
    pub fn client(&self) -> Result<Arc<dyn WarehouseClient>> {
        let mut slot = self.lock_client()?;
        self.ensure_client(&mut slot)
    }

    pub fn job_client(&self) -> Result<JobClient> {
        Ok(JobClient::new(
            self.client()?,
            JobOptions::from_config(&self.config),
        ))
    }

    pub fn table_ref(&self, table: &str) -> Result<QualifiedTableRef> {
        self.config.table_ref(table)
    }

    #[must_use]
    pub fn quote_identifier(&self, identifier: &str) -> String {
        identifier.to_string()
    }

    /// Runs already-final warehouse SQL; no translation or inlining happens.
    pub fn execute(&self, sql: &str) -> Result<ResultCursor> {
        let results = self.job_client()?.execute(sql)?;
        Ok(ResultCursor::new(results))
    }

    fn lock_client(&self) -> Result<MutexGuard<'_, ClientSlot>> {
        self.client
            .lock()
            .map_err(|_| ExecutionError::PoisonedState { what: CLIENT_SLOT }.into())
    }

    fn ensure_client(&self, slot: &mut ClientSlot) -> Result<Arc<dyn WarehouseClient>> {
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let options = self.config.client_options();
        debug!(
            name = %self.config.name,
            project_id = %options.project_id,
            retries = options.retries,
            "creating warehouse client"
        );
        let client = self.factory.create(&options).map_err(|source| {
            warn!(error = ?source, name = %self.config.name, "warehouse connection failed");
            ConnectionError::Missing {
                name: self.config.name.clone(),
                reason: source.to_string(),
                source,
            }
        })?;

        info!(
            name = %self.config.name,
            project_id = %self.config.project_id,
            data_set = %self.config.data_set,
            "connected to warehouse"
        );
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }
}

impl Drop for BigQueryConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Datasource for BigQueryConnection {
    fn connect(&self) -> Result<bool> {
        Self::connect(self)
    }

    fn disconnect(&self) {
        Self::disconnect(self);
    }

    fn is_connected(&self) -> bool {
        Self::is_connected(self)
    }

    fn enabled(&self) -> bool {
        Self::enabled(self)
    }

    fn config_name(&self) -> &str {
        Self::config_name(self)
    }
}

impl Transactable for BigQueryConnection {}

impl SchemaDescribable for BigQueryConnection {
    fn schema_dialect(&self) -> Box<dyn SchemaDialect> {
        Box::new(BigQuerySchemaDialect)
    }
}

impl Executable for BigQueryConnection {
    fn execute(&self, sql: &str) -> Result<Box<dyn Statement>> {
        Ok(Box::new(Self::execute(self, sql)?))
    }
}
