use crate::{Result, Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Column name to value.
    #[default]
    Assoc,
    /// Values in column order.
    Num,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchedRow {
    Assoc(Row),
    Num(Vec<Value>),
}

impl FetchedRow {
    #[must_use]
    pub fn into_row(self) -> Option<Row> {
        match self {
            Self::Assoc(row) => Some(row),
            Self::Num(_) => None,
        }
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Assoc(row) => row.into_values(),
            Self::Num(values) => values,
        }
    }
}

/// Forward-only result of an executed query.
///
/// Binding and error-reporting hooks exist so the host can drive every
/// backend the same way; warehouse statements ignore bindings (values are
/// inlined before execution) and surface failures as `Err` instead.
pub trait Statement {
    fn fetch(&mut self, mode: FetchMode) -> Result<Option<FetchedRow>>;

    fn fetch_all(&mut self, mode: FetchMode) -> Result<Vec<FetchedRow>>;

    fn fetch_column(&mut self, index: usize) -> Result<Option<Value>>;

    fn row_count(&self) -> Result<u64>;

    fn column_count(&self) -> usize;

    fn execute(&mut self) -> bool {
        true
    }

    fn bind_value(&mut self, _placeholder: &str, _value: Value) {}

    fn error_code(&self) -> Option<String> {
        None
    }

    fn error_info(&self) -> Vec<String> {
        Vec::new()
    }

    fn close_cursor(&mut self) {}

    fn last_insert_id(&self) -> Option<String> {
        None
    }
}
