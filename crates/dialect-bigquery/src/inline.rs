use std::collections::HashMap;

use quarry_core::{Binding, BindingType, Value};

use crate::lexer::tokenize;

/// Replaces `:name` placeholders outside literals, comments and quoted
/// identifiers with warehouse literals. Unknown placeholders stay verbatim.
pub fn inline(sql: &str, bindings: &[Binding]) -> String {
    if bindings.is_empty() {
        return sql.to_string();
    }

    let mut by_placeholder: HashMap<&str, &Binding> = HashMap::with_capacity(bindings.len());
    for binding in bindings {
        by_placeholder
            .entry(binding.placeholder.trim_start_matches(':'))
            .or_insert(binding);
    }

    let mut output = String::with_capacity(sql.len());
    for token in tokenize(sql) {
        match token
            .placeholder_name()
            .and_then(|name| by_placeholder.get(name))
        {
            Some(binding) => output.push_str(&render_literal(&binding.value, &binding.ty)),
            None => output.push_str(token.text),
        }
    }
    output
}

/// Warehouse literal for `value` bound as `ty`.
#[must_use]
pub fn render_literal(value: &Value, ty: &BindingType) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }

    match ty {
        BindingType::Boolean => {
            if value.is_truthy() {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        BindingType::Integer | BindingType::Float => render_numeric(value),
        BindingType::String | BindingType::Other(_) => quote_string(&value.to_text()),
    }
}

fn render_numeric(value: &Value) -> String {
    match value {
        Value::Int(number) => number.to_string(),
        Value::Float(number) => render_float(*number),
        Value::Bool(flag) => i64::from(*flag).to_string(),
        Value::String(text) => match numeric_literal(text) {
            Some(literal) => literal.to_string(),
            None => quote_string(text),
        },
        other => quote_string(&other.to_text()),
    }
}

fn render_float(number: f64) -> String {
    if number.is_nan() {
        "CAST('NaN' AS FLOAT64)".to_string()
    } else if number.is_infinite() && number > 0.0 {
        "CAST('inf' AS FLOAT64)".to_string()
    } else if number.is_infinite() {
        "CAST('-inf' AS FLOAT64)".to_string()
    } else {
        number.to_string()
    }
}

/// Returns the trimmed text when it is a plain decimal numeral.
fn numeric_literal(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let plain = !trimmed.is_empty()
        && trimmed
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if !plain {
        return None;
    }

    if trimmed.parse::<i64>().is_ok() {
        return Some(trimmed);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .map(|_| trimmed)
}

/// Single-quoted literal with backslash escaping.
#[must_use]
pub fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\0' => quoted.push_str("\\x00"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}
