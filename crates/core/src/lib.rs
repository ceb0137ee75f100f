mod adapter;
mod binding;
mod client;
mod config;
mod dialect;
mod entity;
mod error;
mod events;
mod ident;
mod query;
mod schema;
mod statement;
mod value;

pub use adapter::{Datasource, Executable, SchemaDescribable, SchemaDialect, Transactable};
pub use binding::{Binding, BindingType, ValueBinder};
pub use client::{
    ClientFactory, ClientOptions, ClientResult, FieldMode, FieldSchema, InsertResponse, JobHandle,
    QueryJob, QueryResults, ResultPage, WarehouseClient,
};
pub use config::{
    ConnectionConfig, DEFAULT_CONFIG_NAME, DEFAULT_MAXIMUM_BYTES_BILLED, DEFAULT_RETRIES,
};
pub use dialect::Dialect;
pub use entity::{DeleteOptions, Entity, SaveOptions, SaveOutcome};
pub use error::{
    BoxError, ConfigError, ConnectionError, Error, ExecutionError, FailedRow, Result,
    TypeCoercionError,
};
pub use events::SaveListener;
pub use ident::QualifiedTableRef;
pub use query::{Comparison, JoinKind, SelectQuery, SortOrder};
pub use schema::{ColumnDescriptor, RelationalType, SchemaRegistry, TableSchema};
pub use statement::{FetchMode, FetchedRow, Statement};
pub use value::{DATE_FORMAT, DATETIME_FORMAT, Row, Value};
