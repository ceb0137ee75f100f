use std::fmt;

use crate::{RelationalType, Value};

const PLACEHOLDER_PREFIX: &str = "c";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingType {
    String,
    Boolean,
    Integer,
    Float,
    Other(String),
}

impl BindingType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Other(name) => name,
        }
    }

    /// Parses the type names the query builder emits; unknown names become `Other`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "boolean" | "bool" => Self::Boolean,
            "integer" | "int" => Self::Integer,
            "float" => Self::Float,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RelationalType> for BindingType {
    fn from(value: RelationalType) -> Self {
        match value {
            RelationalType::Integer => Self::Integer,
            RelationalType::Float => Self::Float,
            RelationalType::Boolean => Self::Boolean,
            RelationalType::String | RelationalType::Text => Self::String,
            RelationalType::Date | RelationalType::DateTime | RelationalType::Timestamp => {
                Self::Other(value.as_str().to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Placeholder name without the leading colon.
    pub placeholder: String,
    pub value: Value,
    pub ty: BindingType,
}

impl Binding {
    pub fn new(placeholder: impl Into<String>, value: impl Into<Value>, ty: BindingType) -> Self {
        Self {
            placeholder: placeholder.into(),
            value: value.into(),
            ty,
        }
    }
}

/// Hands out `:c0`, `:c1`, ... placeholders while collecting their bindings.
#[derive(Debug, Default)]
pub struct ValueBinder {
    bindings: Vec<Binding>,
}

impl ValueBinder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Registers `value` and returns the placeholder token to splice into SQL.
    pub fn placeholder(&mut self, value: impl Into<Value>, ty: BindingType) -> String {
        let name = format!("{PLACEHOLDER_PREFIX}{}", self.bindings.len());
        let token = format!(":{name}");
        self.bindings.push(Binding::new(name, value, ty));
        token
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    #[must_use]
    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }
}
