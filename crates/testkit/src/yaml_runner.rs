use std::{collections::BTreeMap, fs, path::Path};

use quarry_core::{Binding, BindingType, ConfigError, Dialect, QualifiedTableRef, Result, Value};
use serde::Deserialize;

const DEFAULT_PROJECT: &str = "p";
const DEFAULT_DATASET: &str = "d";

/// One translation scenario: generic SQL in, warehouse SQL out.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationCase {
    pub sql: String,
    pub table: String,
    pub project: String,
    pub dataset: String,
    pub bindings: BTreeMap<String, BindingSpec>,
    pub expected: Option<String>,
    pub error: Option<String>,
    /// `None` resolves to `true`: translating the output again must not change it.
    pub idempotent: Option<bool>,
}

impl Default for TranslationCase {
    fn default() -> Self {
        Self {
            sql: String::new(),
            table: String::new(),
            project: DEFAULT_PROJECT.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            bindings: BTreeMap::new(),
            expected: None,
            error: None,
            idempotent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingSpec {
    #[serde(default)]
    pub value: serde_yaml::Value,
    #[serde(rename = "type", default = "default_binding_type")]
    pub ty: String,
}

fn default_binding_type() -> String {
    BindingType::String.as_str().to_string()
}

impl BindingSpec {
    pub fn to_binding(&self, placeholder: &str) -> Binding {
        Binding::new(
            placeholder,
            yaml_to_value(&self.value),
            BindingType::parse(&self.ty),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

pub fn load_translation_cases_from_str(yaml: &str) -> Result<BTreeMap<String, TranslationCase>> {
    serde_yaml::from_str(yaml).map_err(|source| {
        ConfigError::Parse {
            origin: "translation cases".to_string(),
            source,
        }
        .into()
    })
}

pub fn load_translation_cases_from_path(
    path: impl AsRef<Path>,
) -> Result<BTreeMap<String, TranslationCase>> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_translation_cases_from_str(&yaml)
}

pub fn run_translation_case(dialect: &dyn Dialect, case: &TranslationCase) -> TestResult {
    if case.expected.is_none() && case.error.is_none() {
        return TestResult::Skipped("case declares neither `expected` nor `error`".to_string());
    }

    match evaluate_expected_error(case, run_translation_flow(dialect, case)) {
        Ok(()) => TestResult::Passed,
        Err(message) => TestResult::Failed(message),
    }
}

fn run_translation_flow(
    dialect: &dyn Dialect,
    case: &TranslationCase,
) -> std::result::Result<(), String> {
    let table = QualifiedTableRef::new(&case.project, &case.dataset, &case.table)
        .map_err(|error| error.to_string())?;

    let translated = dialect.translate(&case.sql, &table);
    if case.idempotent.unwrap_or(true) {
        let again = dialect.translate(&translated, &table);
        if again != translated {
            return Err(format!(
                "translation is not idempotent; first pass:\n{translated}\nsecond pass:\n{again}"
            ));
        }
    }

    let bindings = case
        .bindings
        .iter()
        .map(|(placeholder, spec)| spec.to_binding(placeholder))
        .collect::<Vec<_>>();
    let actual = dialect.inline(&translated, &bindings);

    let Some(expected) = case.expected.as_deref() else {
        return Ok(());
    };
    if normalize_sql(expected) == normalize_sql(&actual) {
        return Ok(());
    }

    Err(format!(
        "translated SQL mismatch; expected:\n{}\nactual:\n{}",
        expected.trim(),
        actual.trim()
    ))
}

fn evaluate_expected_error(
    case: &TranslationCase,
    execution_result: std::result::Result<(), String>,
) -> std::result::Result<(), String> {
    let Some(expected_error) = case.error.as_deref() else {
        return execution_result;
    };

    match execution_result {
        Ok(()) => Err(format!(
            "expected error: {expected_error}, but got no error"
        )),
        Err(actual_error) if actual_error == expected_error => Ok(()),
        Err(actual_error) => Err(format!(
            "expected error: {expected_error}, but got: {actual_error}"
        )),
    }
}

fn normalize_sql(sql: &str) -> &str {
    sql.trim()
}

fn yaml_to_value(value: &serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(flag) => Value::Bool(*flag),
        serde_yaml::Value::Number(number) => number
            .as_i64()
            .map(Value::Int)
            .or_else(|| number.as_f64().map(Value::Float))
            .unwrap_or_else(|| Value::String(number.to_string())),
        serde_yaml::Value::String(text) => Value::String(text.clone()),
        other => Value::String(serde_yaml::to_string(other).unwrap_or_default()),
    }
}
