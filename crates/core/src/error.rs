use std::{error::Error as StdError, fmt, path::PathBuf};

use thiserror::Error;

use crate::RelationalType;

pub type BoxError = Box<dyn StdError + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Execute(#[from] ExecutionError),
    #[error(transparent)]
    Coerce(#[from] TypeCoercionError),
    #[error(
        "save failed for table `{table}` and was rolled back locally; remote writes are not undone: {source}"
    )]
    RolledBack {
        table: String,
        #[source]
        source: Box<Error>,
    },
    #[error("entity for table `{table}` has no value for primary key column `{column}`")]
    MissingPrimaryKey { table: String, column: String },
}

impl Error {
    /// Wraps a failure raised while a save was executing.
    #[must_use]
    pub fn rolled_back(table: impl Into<String>, source: Error) -> Self {
        Self::RolledBack {
            table: table.into(),
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("qualified table reference requires a non-empty {component}")]
    EmptyTableComponent { component: &'static str },
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("missing connection `{name}`: {reason}")]
    Missing {
        name: String,
        reason: String,
        #[source]
        source: BoxError,
    },
    #[error("datasource `{name}` is not connected")]
    NotConnected { name: String },
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("query job failed: {sql}")]
    JobFailed {
        sql: String,
        #[source]
        source: BoxError,
    },
    #[error("query job `{job_id}` did not complete: {sql}")]
    Incomplete { job_id: String, sql: String },
    #[error("failed to fetch results of job `{job_id}`")]
    FetchFailed {
        job_id: String,
        #[source]
        source: BoxError,
    },
    #[error("insert into `{table}` failed for {} row(s): {}", .failed_rows.len(), render_failed_rows(.failed_rows))]
    InsertFailed {
        table: String,
        failed_rows: Vec<FailedRow>,
    },
    #[error("{what} state was poisoned")]
    PoisonedState { what: &'static str },
}

impl ExecutionError {
    pub fn job_failed<E>(sql: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::JobFailed {
            sql: sql.into(),
            source: source.into(),
        }
    }

    pub fn fetch_failed<E>(job_id: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::FetchFailed {
            job_id: job_id.into(),
            source: source.into(),
        }
    }
}

/// One row rejected by a streaming insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRow {
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for FailedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row[{}]: {}", self.index, self.reason)
    }
}

fn render_failed_rows(rows: &[FailedRow]) -> String {
    rows.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum TypeCoercionError {
    #[error("column `{column}`: cannot parse `{value}` as a date/time value")]
    UnparsableDateTime {
        column: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("column `{column}`: `{value}` is not a valid {target} value")]
    InvalidNumber {
        column: String,
        value: String,
        target: RelationalType,
    },
    #[error("column `{column}`: {value} cannot be coerced to {target}")]
    Unsupported {
        column: String,
        value: String,
        target: RelationalType,
    },
}
