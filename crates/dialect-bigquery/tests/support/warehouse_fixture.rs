use std::sync::Arc;

use quarry_core::{ConnectionConfig, SchemaRegistry};
use quarry_dialect_bigquery::{BigQueryConnection, TableGateway};
use quarry_testkit::{FakeClientFactory, FakeWarehouse, users_table_fixture};

#[allow(dead_code)]
pub struct WarehouseFixture {
    pub warehouse: Arc<FakeWarehouse>,
    pub factory: Arc<FakeClientFactory>,
    pub connection: Arc<BigQueryConnection>,
}

#[allow(dead_code)]
impl WarehouseFixture {
    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::new("p", "d"))
    }

    pub fn with_config(config: ConnectionConfig) -> Self {
        let warehouse = Arc::new(FakeWarehouse::new());
        let factory = Arc::new(FakeClientFactory::new(Arc::clone(&warehouse)));
        let connection = Arc::new(BigQueryConnection::new(config, factory.clone()));
        Self {
            warehouse,
            factory,
            connection,
        }
    }

    pub fn users_gateway(&self) -> TableGateway {
        TableGateway::new(
            Arc::clone(&self.connection),
            Arc::new(SchemaRegistry::new()),
            users_table_fixture(),
        )
        .with_alias("Users")
    }
}
