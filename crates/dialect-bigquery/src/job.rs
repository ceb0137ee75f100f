use std::{sync::Arc, time::Duration};

use quarry_core::{
    ConnectionConfig, ExecutionError, QualifiedTableRef, QueryJob, QueryResults, Result, Row,
    WarehouseClient,
};
use tracing::{debug, warn};

pub type QueryHandle = Arc<dyn QueryResults>;

/// Per-job settings applied to every submitted query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOptions {
    pub project_id: String,
    pub location: Option<String>,
    pub maximum_bytes_billed: Option<u64>,
    pub timeout: Option<Duration>,
}

impl JobOptions {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: None,
            maximum_bytes_billed: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            location: config.location().map(str::to_string),
            maximum_bytes_billed: (config.maximum_bytes_billed > 0)
                .then_some(config.maximum_bytes_billed),
            timeout: config.request_timeout(),
        }
    }

    fn job(&self, sql: &str) -> QueryJob {
        QueryJob {
            sql: sql.to_string(),
            project_id: self.project_id.clone(),
            location: self.location.clone(),
            maximum_bytes_billed: self.maximum_bytes_billed,
            timeout: self.timeout,
            use_legacy_sql: false,
        }
    }
}

/// Submits final warehouse SQL as blocking query jobs.
///
/// One call is one round trip. Retries and request timeouts are the
/// client's business; failures here are reported once, with the client
/// error kept as the source.
#[derive(Clone)]
pub struct JobClient {
    client: Arc<dyn WarehouseClient>,
    options: JobOptions,
}

impl std::fmt::Debug for JobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl JobClient {
    pub fn new(client: Arc<dyn WarehouseClient>, options: JobOptions) -> Self {
        Self { client, options }
    }

    #[must_use]
    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Runs `sql` and waits for the job. The returned handle may still
    /// report an incomplete job when the client's wait budget ran out.
    pub fn execute(&self, sql: &str) -> Result<QueryHandle> {
        let job = self.options.job(sql);
        debug!(
            sql,
            maximum_bytes_billed = ?job.maximum_bytes_billed,
            location = ?job.location,
            "submitting query job"
        );

        let handle = self.client.submit(job).map_err(|source| {
            warn!(error = ?source, sql, "query job submission failed");
            ExecutionError::job_failed(sql, source)
        })?;
        let job_id = handle.job_id().to_string();

        let results = self.client.await_completion(handle).map_err(|source| {
            warn!(error = ?source, job_id = %job_id, sql, "query job failed");
            ExecutionError::job_failed(sql, source)
        })?;

        debug!(job_id = %job_id, complete = results.is_complete(), "query job finished");
        Ok(results)
    }

    /// Like `execute`, but an incomplete job is an error.
    pub fn execute_complete(&self, sql: &str) -> Result<QueryHandle> {
        let results = self.execute(sql)?;
        if !self.is_complete(&results) {
            warn!(job_id = results.job_id(), sql, "query job did not complete");
            return Err(ExecutionError::Incomplete {
                job_id: results.job_id().to_string(),
                sql: sql.to_string(),
            }
            .into());
        }
        Ok(results)
    }

    #[must_use]
    pub fn is_complete(&self, results: &QueryHandle) -> bool {
        results.is_complete()
    }

    /// Streams `rows` into `table`. Any rejected row fails the whole call.
    pub fn insert_rows(&self, table: &QualifiedTableRef, rows: Vec<Row>) -> Result<()> {
        let row_count = rows.len();
        debug!(table = %table, rows = row_count, "inserting rows");

        let response = self.client.insert_rows(table, rows).map_err(|source| {
            warn!(error = ?source, table = %table, "insert request failed");
            ExecutionError::job_failed(format!("insertAll {table}"), source)
        })?;

        if !response.is_successful() {
            warn!(
                table = %table,
                failed = response.failed_rows.len(),
                "insert rejected rows"
            );
            return Err(ExecutionError::InsertFailed {
                table: table.to_string(),
                failed_rows: response.failed_rows,
            }
            .into());
        }

        Ok(())
    }
}
