use std::{io, path::PathBuf};

use miette::Report;

const PREPARE_CONTEXT: &str = "while preparing warehouse SQL";
const FILE_READ_CONTEXT: &str = "while reading SQL file";
const STDIN_READ_CONTEXT: &str = "while reading SQL from stdin";

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    MissingSqlInput,
    ReadFile {
        path: PathBuf,
        source: io::Error,
    },
    ReadStdin(io::Error),
    Core(quarry_core::Error),
}

impl CliError {
    /// Usage errors exit with 2, like clap's own argument errors.
    pub(crate) const fn exit_code(&self) -> u8 {
        match self {
            Self::MissingSqlInput => 2,
            Self::ReadFile { .. } | Self::ReadStdin(_) | Self::Core(_) => 1,
        }
    }
}

impl From<quarry_core::Error> for CliError {
    fn from(value: quarry_core::Error) -> Self {
        Self::Core(value)
    }
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::MissingSqlInput => format!("[usage] {}", missing_sql_message()),
        CliError::ReadFile { path, source } => {
            let context = format!("{FILE_READ_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[io] {report}")
        }
        CliError::ReadStdin(source) => {
            let report = report_with_context(source, STDIN_READ_CONTEXT);
            format!("[io] {report}")
        }
        CliError::Core(source) => {
            let category = core_category(&source);
            let report = report_with_context(source, PREPARE_CONTEXT);
            format!("[{category}] {report}")
        }
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let anyhow_error = anyhow::Error::new(source).context(context.into());
    miette::miette!("{anyhow_error:#}")
}

fn core_category(error: &quarry_core::Error) -> &'static str {
    match error {
        quarry_core::Error::Config(_) => "config",
        quarry_core::Error::Connection(_) => "connection",
        quarry_core::Error::Execute(_) => "execute",
        quarry_core::Error::Coerce(_) => "coerce",
        quarry_core::Error::RolledBack { .. } | quarry_core::Error::MissingPrimaryKey { .. } => {
            "save"
        }
    }
}

fn missing_sql_message() -> &'static str {
    "missing SQL input: pass --file <PATH> or pipe SQL via stdin"
}
