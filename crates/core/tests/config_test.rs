use std::{fs, time::Duration};

use quarry_core::{ConfigError, ConnectionConfig, Error};

#[test]
fn defaults_match_driver_base_config() {
    let config = ConnectionConfig::from_yaml_str("projectId: p\ndataSet: d\n")
        .expect("minimal config should parse");

    assert_eq!(config.name, "bigquery");
    assert_eq!(config.project_id, "p");
    assert_eq!(config.data_set, "d");
    assert_eq!(config.key_file, None);
    assert_eq!(config.key_file_path, None);
    assert_eq!(config.request_timeout, 0);
    assert_eq!(config.retries, 3);
    assert_eq!(config.location, "");
    assert_eq!(config.maximum_bytes_billed, 1_000_000);
}

#[test]
fn unknown_keys_are_tolerated() {
    let config = ConnectionConfig::from_yaml_str(
        "className: Connection\ndriver: BigQuery\nprojectId: p\ndataSet: d\nlocation: EU\n",
    )
    .expect("driver keys should be ignored");

    assert_eq!(config.location(), Some("EU"));
}

#[test]
fn client_options_drop_zero_timeout_and_empty_location() {
    let config = ConnectionConfig::new("p", "d");
    let options = config.client_options();

    assert_eq!(options.project_id, "p");
    assert_eq!(options.request_timeout, None);
    assert_eq!(options.location, None);
    assert_eq!(options.retries, 3);
}

#[test]
fn client_options_carry_credentials_and_timeout() {
    let config = ConnectionConfig::from_yaml_str(
        r#"
projectId: p
dataSet: d
requestTimeout: 30
retries: 5
keyFile:
  type: service_account
  client_email: svc@p.iam.example
keyFilePath: /etc/quarry/key.json
"#,
    )
    .expect("full config should parse");

    let options = config.client_options();
    assert_eq!(options.request_timeout, Some(Duration::from_secs(30)));
    assert_eq!(options.retries, 5);
    assert_eq!(
        options
            .key_file
            .as_ref()
            .and_then(|key| key.get("type"))
            .and_then(serde_json::Value::as_str),
        Some("service_account")
    );
    assert_eq!(
        options.key_file_path.as_deref(),
        Some(std::path::Path::new("/etc/quarry/key.json"))
    );
}

#[test]
fn table_ref_uses_project_and_dataset() {
    let config = ConnectionConfig::new("p", "d");
    let table = config.table_ref("users").expect("valid table ref");

    assert_eq!(table.qualified(), "`p.d.users`");
}

#[test]
fn table_ref_rejects_missing_dataset() {
    let config = ConnectionConfig::new("p", "");
    let error = config.table_ref("users").expect_err("dataset is required");

    assert!(matches!(
        error,
        Error::Config(ConfigError::EmptyTableComponent {
            component: "dataset"
        })
    ));
}

#[test]
fn from_path_reads_yaml_file() {
    let dir = std::env::temp_dir().join(format!("quarry-config-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("datasource.yml");
    fs::write(&path, "projectId: p\ndataSet: d\nmaximumBytesBilled: 42\n").expect("write config");

    let config = ConnectionConfig::from_path(&path).expect("config file should load");
    assert_eq!(config.maximum_bytes_billed, 42);

    fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn missing_file_reports_read_error_with_path() {
    let error = ConnectionConfig::from_path("/nonexistent/quarry.yml").expect_err("missing file");

    match error {
        Error::Config(ConfigError::Read { path, .. }) => {
            assert!(path.ends_with("quarry.yml"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_yaml_reports_parse_error() {
    let error = ConnectionConfig::from_yaml_str("retries: [not a number").expect_err("bad yaml");

    assert!(matches!(error, Error::Config(ConfigError::Parse { .. })));
    assert!(error.to_string().contains("connection config"));
}
