use std::collections::VecDeque;

use quarry_core::{
    ColumnDescriptor, ExecutionError, FetchMode, FetchedRow, Result, Row, Statement, Value,
};

use crate::{job::QueryHandle, schema_mapper::describe_field};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageState {
    Start,
    Token(String),
    End,
}

/// Forward-only statement over a completed query job.
///
/// Pages are pulled lazily as rows are fetched. Once exhausted the cursor
/// keeps returning `None`; it cannot be rewound.
#[derive(Debug)]
pub struct ResultCursor {
    results: QueryHandle,
    columns: Vec<ColumnDescriptor>,
    buffer: VecDeque<Row>,
    next_page: PageState,
    position: u64,
}

impl ResultCursor {
    pub fn new(results: QueryHandle) -> Self {
        let columns = results.schema().iter().map(describe_field).collect();
        Self {
            results,
            columns,
            buffer: VecDeque::new(),
            next_page: PageState::Start,
            position: 0,
        }
    }

    #[must_use]
    pub fn job_id(&self) -> &str {
        self.results.job_id()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.results.is_complete()
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Rows handed out so far.
    #[must_use]
    pub const fn rows_fetched(&self) -> u64 {
        self.position
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                self.position += 1;
                return Ok(Some(normalize_row(row)));
            }

            let token = match &self.next_page {
                PageState::End => return Ok(None),
                PageState::Start => None,
                PageState::Token(token) => Some(token.clone()),
            };
            let page = self
                .results
                .page(token.as_deref())
                .map_err(|source| ExecutionError::fetch_failed(self.results.job_id(), source))?;

            self.next_page = match page.next_page_token {
                Some(token) => PageState::Token(token),
                None => PageState::End,
            };
            self.buffer.extend(page.rows);
        }
    }

    fn count_rows(&self) -> Result<u64> {
        let mut count = 0_u64;
        let mut token: Option<String> = None;
        loop {
            let page = self
                .results
                .page(token.as_deref())
                .map_err(|source| ExecutionError::fetch_failed(self.results.job_id(), source))?;
            count += page.rows.len() as u64;
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => return Ok(count),
            }
        }
    }
}

fn normalize_row(row: Row) -> Row {
    row.into_iter()
        .map(|(column, value)| (column, normalize_value(value)))
        .collect()
}

/// Date and time values leave the cursor as fixed-format strings.
fn normalize_value(value: Value) -> Value {
    if value.is_temporal() {
        Value::String(value.to_text())
    } else {
        value
    }
}

impl Statement for ResultCursor {
    fn fetch(&mut self, mode: FetchMode) -> Result<Option<FetchedRow>> {
        Ok(self.next_row()?.map(|row| match mode {
            FetchMode::Assoc => FetchedRow::Assoc(row),
            FetchMode::Num => FetchedRow::Num(row.into_values()),
        }))
    }

    fn fetch_all(&mut self, mode: FetchMode) -> Result<Vec<FetchedRow>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch(mode)? {
            rows.push(row);
        }
        Ok(rows)
    }

    fn fetch_column(&mut self, index: usize) -> Result<Option<Value>> {
        Ok(self
            .next_row()?
            .and_then(|row| row.get_index(index).cloned()))
    }

    /// Uses the reported total when available; otherwise counts with a
    /// separate pass over the pages. The cursor position is unaffected.
    fn row_count(&self) -> Result<u64> {
        match self.results.total_rows() {
            Some(total) => Ok(total),
            None => self.count_rows(),
        }
    }

    fn column_count(&self) -> usize {
        self.results.schema().len()
    }
}

impl Iterator for ResultCursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
