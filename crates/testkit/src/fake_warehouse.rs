use std::{
    collections::{HashMap, VecDeque},
    error::Error as StdError,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use quarry_core::{
    ClientFactory, ClientOptions, ClientResult, FailedRow, FieldSchema, InsertResponse, JobHandle,
    QualifiedTableRef, QueryJob, QueryResults, ResultPage, Row, WarehouseClient,
};

/// In-memory result set served page by page.
#[derive(Debug)]
pub struct MemoryResults {
    job_id: String,
    schema: Vec<FieldSchema>,
    rows: Vec<Row>,
    page_size: usize,
    complete: bool,
    report_total_rows: bool,
    failing_page: Option<usize>,
    pages_fetched: AtomicUsize,
}

impl MemoryResults {
    pub fn new(job_id: impl Into<String>, schema: Vec<FieldSchema>, rows: Vec<Row>) -> Self {
        Self {
            job_id: job_id.into(),
            schema,
            rows,
            page_size: usize::MAX,
            complete: true,
            report_total_rows: true,
            failing_page: None,
            pages_fetched: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    /// When disabled, `total_rows` reports `None` and callers must count pages.
    #[must_use]
    pub fn with_total_rows(mut self, report: bool) -> Self {
        self.report_total_rows = report;
        self
    }

    /// Makes the page starting at `page_index` fail to load.
    #[must_use]
    pub fn with_failing_page(mut self, page_index: usize) -> Self {
        self.failing_page = Some(page_index);
        self
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched.load(Ordering::SeqCst)
    }
}

impl QueryResults for MemoryResults {
    fn job_id(&self) -> &str {
        &self.job_id
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn schema(&self) -> &[FieldSchema] {
        &self.schema
    }

    fn total_rows(&self) -> Option<u64> {
        self.report_total_rows
            .then(|| u64::try_from(self.rows.len()).unwrap_or(u64::MAX))
    }

    fn page(&self, page_token: Option<&str>) -> ClientResult<ResultPage> {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);

        let start = match page_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| FakeError::new(format!("invalid page token `{token}`")))?,
        };
        let page_index = start / self.page_size;
        if self.failing_page == Some(page_index) {
            return Err(FakeError::new(format!("page {page_index} unavailable")).into());
        }

        let end = start.saturating_add(self.page_size).min(self.rows.len());
        let rows = self.rows.get(start..end).unwrap_or_default().to_vec();
        let next_page_token = (end < self.rows.len()).then(|| end.to_string());

        Ok(ResultPage {
            rows,
            next_page_token,
        })
    }
}

/// Recording warehouse client with scripted results and failure injection.
#[derive(Debug, Default)]
pub struct FakeWarehouse {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    jobs: Vec<QueryJob>,
    inserts: Vec<(QualifiedTableRef, Vec<Row>)>,
    scripted: VecDeque<(Vec<FieldSchema>, Vec<Row>)>,
    pending: HashMap<String, Arc<MemoryResults>>,
    last_results: Option<Arc<MemoryResults>>,
    next_job: usize,
    page_size: Option<usize>,
    hide_total_rows: bool,
    incomplete: bool,
    fail_on_sql: Option<String>,
    insert_rejection: Option<String>,
    insert_transport_error: Option<String>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result returned by the next submitted job.
    pub fn push_result(&self, schema: Vec<FieldSchema>, rows: Vec<Row>) {
        self.state_guard().scripted.push_back((schema, rows));
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.state_guard().page_size = Some(page_size);
    }

    pub fn set_hide_total_rows(&self, hide: bool) {
        self.state_guard().hide_total_rows = hide;
    }

    /// Every following job reports `is_complete() == false`.
    pub fn set_incomplete(&self, incomplete: bool) {
        self.state_guard().incomplete = incomplete;
    }

    /// Submitting SQL that contains `needle` fails.
    pub fn set_fail_on_sql(&self, needle: Option<&str>) {
        self.state_guard().fail_on_sql = needle.map(str::to_string);
    }

    /// Every inserted row is rejected with `reason`.
    pub fn set_insert_rejection(&self, reason: Option<&str>) {
        self.state_guard().insert_rejection = reason.map(str::to_string);
    }

    pub fn set_insert_transport_error(&self, message: Option<&str>) {
        self.state_guard().insert_transport_error = message.map(str::to_string);
    }

    pub fn jobs(&self) -> Vec<QueryJob> {
        self.state_guard().jobs.clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.state_guard()
            .jobs
            .iter()
            .map(|job| job.sql.clone())
            .collect()
    }

    pub fn inserts(&self) -> Vec<(QualifiedTableRef, Vec<Row>)> {
        self.state_guard().inserts.clone()
    }

    /// Number of remote calls made so far (submits and inserts).
    pub fn call_count(&self) -> usize {
        let state = self.state_guard();
        state.jobs.len() + state.inserts.len()
    }

    pub fn last_results(&self) -> Option<Arc<MemoryResults>> {
        self.state_guard().last_results.clone()
    }

    fn state_guard(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WarehouseClient for FakeWarehouse {
    fn submit(&self, job: QueryJob) -> ClientResult<JobHandle> {
        let mut state = self.state_guard();
        let fails = state
            .fail_on_sql
            .as_deref()
            .is_some_and(|needle| job.sql.contains(needle));
        state.jobs.push(job);
        if fails {
            return Err(FakeError::new("injected job failure").into());
        }

        let job_id = format!("job-{}", state.next_job);
        state.next_job += 1;

        let (schema, rows) = state.scripted.pop_front().unwrap_or_default();
        let mut results = MemoryResults::new(job_id.clone(), schema, rows)
            .with_complete(!state.incomplete)
            .with_total_rows(!state.hide_total_rows);
        if let Some(page_size) = state.page_size {
            results = results.with_page_size(page_size);
        }
        state.pending.insert(job_id.clone(), Arc::new(results));

        Ok(JobHandle::new(job_id))
    }

    fn await_completion(&self, handle: JobHandle) -> ClientResult<Arc<dyn QueryResults>> {
        let mut state = self.state_guard();
        let results = state
            .pending
            .remove(handle.job_id())
            .ok_or_else(|| FakeError::new(format!("unknown job `{}`", handle.job_id())))?;
        state.last_results = Some(Arc::clone(&results));
        Ok(results)
    }

    fn insert_rows(
        &self,
        table: &QualifiedTableRef,
        rows: Vec<Row>,
    ) -> ClientResult<InsertResponse> {
        let mut state = self.state_guard();
        if let Some(message) = state.insert_transport_error.clone() {
            return Err(FakeError::new(message).into());
        }

        let failed_rows = match &state.insert_rejection {
            Some(reason) => (0..rows.len())
                .map(|index| FailedRow {
                    index,
                    reason: reason.clone(),
                })
                .collect(),
            None => Vec::new(),
        };
        state.inserts.push((table.clone(), rows));

        Ok(InsertResponse { failed_rows })
    }
}

/// Client factory handing out one shared `FakeWarehouse`.
#[derive(Debug)]
pub struct FakeClientFactory {
    warehouse: Arc<FakeWarehouse>,
    fail_with: Mutex<Option<String>>,
    created: Mutex<Vec<ClientOptions>>,
}

impl FakeClientFactory {
    pub fn new(warehouse: Arc<FakeWarehouse>) -> Self {
        Self {
            warehouse,
            fail_with: Mutex::new(None),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        let factory = Self::new(Arc::new(FakeWarehouse::new()));
        *factory
            .fail_with
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.into());
        factory
    }

    pub fn warehouse(&self) -> Arc<FakeWarehouse> {
        Arc::clone(&self.warehouse)
    }

    pub fn set_failure(&self, message: Option<&str>) {
        *self.fail_with.lock().unwrap_or_else(PoisonError::into_inner) =
            message.map(str::to_string);
    }

    /// Options passed to every successful `create` call.
    pub fn created(&self) -> Vec<ClientOptions> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ClientFactory for FakeClientFactory {
    fn create(&self, options: &ClientOptions) -> ClientResult<Arc<dyn WarehouseClient>> {
        if let Some(message) = self
            .fail_with
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(FakeError::new(message).into());
        }

        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(options.clone());
        let client: Arc<dyn WarehouseClient> = self.warehouse();
        Ok(client)
    }
}

#[derive(Debug)]
pub struct FakeError(String);

impl FakeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for FakeError {}
