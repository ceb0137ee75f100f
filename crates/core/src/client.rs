//! Boundary to the warehouse RPC client library.
//!
//! The adapter never talks to the network itself. A `ClientFactory` turns
//! connection options into a `WarehouseClient`, and every query or streaming
//! insert goes through that trait object.

use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use crate::{BoxError, FailedRow, QualifiedTableRef, Row};

pub type ClientResult<T> = std::result::Result<T, BoxError>;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub project_id: String,
    pub key_file: Option<serde_json::Value>,
    pub key_file_path: Option<PathBuf>,
    pub request_timeout: Option<Duration>,
    pub retries: u32,
    pub location: Option<String>,
}

/// One query job as submitted to the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryJob {
    pub sql: String,
    pub project_id: String,
    pub location: Option<String>,
    pub maximum_bytes_billed: Option<u64>,
    pub timeout: Option<Duration>,
    pub use_legacy_sql: bool,
}

impl QueryJob {
    pub fn new(sql: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            project_id: project_id.into(),
            location: None,
            maximum_bytes_billed: None,
            timeout: None,
            use_legacy_sql: false,
        }
    }
}

/// Reference to a submitted job. Consumed by `await_completion`.
#[derive(Debug, PartialEq, Eq)]
pub struct JobHandle {
    job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }

    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

/// Column entry of a result set's embedded schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: String,
    pub mode: FieldMode,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode: FieldMode::Nullable,
        }
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: FieldMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultPage {
    pub rows: Vec<Row>,
    pub next_page_token: Option<String>,
}

/// Completed (or timed-out) job result, readable page by page.
pub trait QueryResults: Send + Sync {
    fn job_id(&self) -> &str;

    fn is_complete(&self) -> bool;

    fn schema(&self) -> &[FieldSchema];

    /// Total row count reported by the service, when it reports one.
    fn total_rows(&self) -> Option<u64> {
        None
    }

    /// Fetches one page; `None` requests the first page.
    fn page(&self, page_token: Option<&str>) -> ClientResult<ResultPage>;
}

impl fmt::Debug for dyn QueryResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResults")
            .field("job_id", &self.job_id())
            .field("is_complete", &self.is_complete())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InsertResponse {
    pub failed_rows: Vec<FailedRow>,
}

impl InsertResponse {
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.failed_rows.is_empty()
    }
}

pub trait WarehouseClient: Send + Sync {
    fn submit(&self, job: QueryJob) -> ClientResult<JobHandle>;

    /// Blocks until the job finishes or the client's own wait budget runs out.
    fn await_completion(&self, handle: JobHandle) -> ClientResult<Arc<dyn QueryResults>>;

    fn insert_rows(&self, table: &QualifiedTableRef, rows: Vec<Row>)
    -> ClientResult<InsertResponse>;
}

pub trait ClientFactory: Send + Sync {
    fn create(&self, options: &ClientOptions) -> ClientResult<Arc<dyn WarehouseClient>>;
}
