use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use quarry_core::{
    ColumnDescriptor, FieldMode, FieldSchema, RelationalType, Row, TableSchema,
    TypeCoercionError, Value,
};

/// Outbound format for DATETIME and TIMESTAMP columns.
pub const WAREHOUSE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const WAREHOUSE_DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_INPUT_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];
const DATE_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
// 2^63, exact in f64. `i64::MAX as f64` rounds up to this value.
const I64_EXCLUSIVE_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Maps a warehouse column type name to the relational vocabulary.
#[must_use]
pub fn to_relational_type(warehouse_type: &str) -> RelationalType {
    match warehouse_type.trim().to_ascii_uppercase().as_str() {
        "STRING" => RelationalType::String,
        "INT64" | "INTEGER" => RelationalType::Integer,
        "FLOAT64" | "FLOAT" => RelationalType::Float,
        "BOOL" | "BOOLEAN" => RelationalType::Boolean,
        "DATE" => RelationalType::Date,
        "DATETIME" => RelationalType::DateTime,
        "TIMESTAMP" => RelationalType::Timestamp,
        _ => RelationalType::Text,
    }
}

#[must_use]
pub const fn to_warehouse_type(relational_type: RelationalType) -> &'static str {
    match relational_type {
        RelationalType::String | RelationalType::Text => "STRING",
        RelationalType::Integer => "INT64",
        RelationalType::Float => "FLOAT64",
        RelationalType::Boolean => "BOOL",
        RelationalType::Date => "DATE",
        RelationalType::DateTime => "DATETIME",
        RelationalType::Timestamp => "TIMESTAMP",
    }
}

#[must_use]
pub fn describe_field(field: &FieldSchema) -> ColumnDescriptor {
    let descriptor = ColumnDescriptor::new(&field.name, to_relational_type(&field.field_type))
        .with_warehouse_type(&field.field_type);
    match field.mode {
        FieldMode::Required => descriptor.not_null(),
        FieldMode::Nullable | FieldMode::Repeated => descriptor,
    }
}

/// Coerces an outbound value to the shape the warehouse expects for `ty`.
pub fn coerce(
    column: &str,
    value: &Value,
    ty: RelationalType,
) -> Result<Value, TypeCoercionError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match ty {
        RelationalType::String | RelationalType::Text => Ok(Value::String(value.to_text())),
        RelationalType::Boolean if !value.is_temporal() => Ok(Value::Bool(value.is_truthy())),
        RelationalType::Integer => coerce_integer(column, value),
        RelationalType::Float => coerce_float(column, value),
        RelationalType::DateTime | RelationalType::Timestamp => coerce_datetime(column, value, ty)
            .map(|datetime| Value::String(datetime.format(WAREHOUSE_DATETIME_FORMAT).to_string())),
        RelationalType::Date => coerce_date(column, value)
            .map(|date| Value::String(date.format(WAREHOUSE_DATE_FORMAT).to_string())),
        RelationalType::Boolean => Err(unsupported(column, value, ty)),
    }
}

/// Coerces every column of `row` declared in `schema`; undeclared columns pass through.
pub fn coerce_row(schema: &TableSchema, row: &Row) -> Result<Row, TypeCoercionError> {
    row.iter()
        .map(|(column, value)| {
            let coerced = match schema.relational_type(column) {
                Some(ty) => coerce(column, value, ty)?,
                None => value.clone(),
            };
            Ok::<_, TypeCoercionError>((column.to_string(), coerced))
        })
        .collect()
}

fn coerce_integer(column: &str, value: &Value) -> Result<Value, TypeCoercionError> {
    match value {
        Value::Int(number) => Ok(Value::Int(*number)),
        Value::Bool(flag) => Ok(Value::Int(i64::from(*flag))),
        Value::Float(number) => truncate_to_i64(*number).map(Value::Int).ok_or_else(|| {
            invalid_number(column, &number.to_string(), RelationalType::Integer)
        }),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| parse_finite_float(trimmed).and_then(truncate_to_i64))
                .map(Value::Int)
                .ok_or_else(|| invalid_number(column, text, RelationalType::Integer))
        }
        other => Err(unsupported(column, other, RelationalType::Integer)),
    }
}

/// Drops the fraction; `None` for non-finite values and anything outside `i64`.
fn truncate_to_i64(number: f64) -> Option<i64> {
    let truncated = number.trunc();
    (truncated >= -I64_EXCLUSIVE_BOUND && truncated < I64_EXCLUSIVE_BOUND)
        .then_some(truncated as i64)
}

fn coerce_float(column: &str, value: &Value) -> Result<Value, TypeCoercionError> {
    match value {
        Value::Float(number) => Ok(Value::Float(*number)),
        Value::Int(number) => Ok(Value::Float(*number as f64)),
        Value::Bool(flag) => Ok(Value::Float(if *flag { 1.0 } else { 0.0 })),
        Value::String(text) => parse_finite_float(text.trim())
            .map(Value::Float)
            .ok_or_else(|| invalid_number(column, text, RelationalType::Float)),
        other => Err(unsupported(column, other, RelationalType::Float)),
    }
}

fn coerce_datetime(
    column: &str,
    value: &Value,
    ty: RelationalType,
) -> Result<NaiveDateTime, TypeCoercionError> {
    match value {
        Value::DateTime(datetime) => Ok(*datetime),
        Value::Timestamp(timestamp) => Ok(timestamp.naive_utc()),
        Value::Date(date) => Ok(date.and_time(NaiveTime::MIN)),
        Value::Int(seconds) => DateTime::from_timestamp(*seconds, 0)
            .map(|timestamp| timestamp.naive_utc())
            .ok_or_else(|| unsupported(column, value, ty)),
        Value::String(text) => {
            parse_datetime(text).map_err(|source| TypeCoercionError::UnparsableDateTime {
                column: column.to_string(),
                value: text.clone(),
                source,
            })
        }
        other => Err(unsupported(column, other, ty)),
    }
}

fn coerce_date(column: &str, value: &Value) -> Result<NaiveDate, TypeCoercionError> {
    match value {
        Value::Date(date) => Ok(*date),
        Value::String(text) => {
            parse_datetime(text)
                .map(|datetime| datetime.date())
                .map_err(|source| TypeCoercionError::UnparsableDateTime {
                    column: column.to_string(),
                    value: text.clone(),
                    source,
                })
        }
        other => coerce_datetime(column, other, RelationalType::Date).map(|datetime| datetime.date()),
    }
}

/// Best-effort parse of free-form date/time text. RFC 3339 and RFC 2822
/// inputs carrying an offset are converted to UTC.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();

    let mut last_error = match DateTime::parse_from_rfc3339(raw) {
        Ok(datetime) => return Ok(datetime.naive_utc()),
        Err(error) => error,
    };
    if let Ok(datetime) = DateTime::parse_from_rfc2822(raw) {
        return Ok(datetime.naive_utc());
    }
    for format in DATETIME_INPUT_FORMATS {
        match NaiveDateTime::parse_from_str(raw, format) {
            Ok(datetime) => return Ok(datetime),
            Err(error) => last_error = error,
        }
    }
    for format in DATE_INPUT_FORMATS {
        match NaiveDate::parse_from_str(raw, format) {
            Ok(date) => return Ok(date.and_time(NaiveTime::MIN)),
            Err(error) => last_error = error,
        }
    }

    Err(last_error)
}

fn parse_finite_float(text: &str) -> Option<f64> {
    let numeric = !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if !numeric {
        return None;
    }
    text.parse::<f64>().ok().filter(|number| number.is_finite())
}

fn invalid_number(column: &str, value: &str, target: RelationalType) -> TypeCoercionError {
    TypeCoercionError::InvalidNumber {
        column: column.to_string(),
        value: value.to_string(),
        target,
    }
}

fn unsupported(column: &str, value: &Value, target: RelationalType) -> TypeCoercionError {
    TypeCoercionError::Unsupported {
        column: column.to_string(),
        value: format!("{value:?}"),
        target,
    }
}
