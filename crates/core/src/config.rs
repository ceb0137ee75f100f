use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::{ClientOptions, ConfigError, QualifiedTableRef, Result};

pub const DEFAULT_CONFIG_NAME: &str = "bigquery";
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_MAXIMUM_BYTES_BILLED: u64 = 1_000_000;

/// Connection settings for one warehouse datasource.
///
/// Keys are camelCase (`projectId`, `dataSet`, `keyFilePath`, ...). Keys the
/// adapter does not understand, such as `className` or `driver`, are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub name: String,
    pub project_id: String,
    pub data_set: String,
    /// Inline service-account credentials.
    pub key_file: Option<serde_json::Value>,
    pub key_file_path: Option<PathBuf>,
    /// Seconds; `0` leaves the client's own default in place.
    pub request_timeout: u64,
    pub retries: u32,
    pub location: String,
    pub maximum_bytes_billed: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CONFIG_NAME.to_string(),
            project_id: String::new(),
            data_set: String::new(),
            key_file: None,
            key_file_path: None,
            request_timeout: 0,
            retries: DEFAULT_RETRIES,
            location: String::new(),
            maximum_bytes_billed: DEFAULT_MAXIMUM_BYTES_BILLED,
        }
    }
}

impl ConnectionConfig {
    pub fn new(project_id: impl Into<String>, data_set: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            data_set: data_set.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Self::parse(source, "connection config")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, &format!("connection config `{}`", path.display()))
    }

    fn parse(source: &str, origin: &str) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|source| {
            ConfigError::Parse {
                origin: origin.to_string(),
                source,
            }
            .into()
        })
    }

    /// Qualifies `table` with this datasource's project and dataset.
    pub fn table_ref(&self, table: impl Into<String>) -> Result<QualifiedTableRef> {
        QualifiedTableRef::new(self.project_id.clone(), self.data_set.clone(), table)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout > 0).then(|| Duration::from_secs(self.request_timeout))
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        (!self.location.is_empty()).then_some(self.location.as_str())
    }

    /// Options handed to the client factory on connect.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            project_id: self.project_id.clone(),
            key_file: self.key_file.clone(),
            key_file_path: self.key_file_path.clone(),
            request_timeout: self.request_timeout(),
            retries: self.retries,
            location: self.location().map(str::to_string),
        }
    }
}
