// ABOUTME: Converts PostgreSQL result rows into column-name keyed records
// ABOUTME: Maps common column types to JSON values for callers and templates

use crate::error::DataError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::Row;
use uuid::Uuid;

/// One result row: column name → value
///
/// Column names come verbatim from the result metadata and keep their
/// result order. When a join yields the same name twice (e.g. `userroleid`
/// from both `users` and `userroles`) the later column's value overwrites
/// the earlier one in the earlier position.
pub type Record = serde_json::Map<String, JsonValue>;

/// Convert a float to JSON, keeping non-finite values as strings
fn float_to_json(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(value.to_string()))
}

fn bytes_to_json(bytes: &[u8]) -> JsonValue {
    JsonValue::String(base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        bytes,
    ))
}

/// Numerics are rendered as strings so no digits are lost to `f64`
fn decimal_to_json(value: Decimal) -> JsonValue {
    JsonValue::String(value.to_string())
}

fn timestamp_to_json(value: NaiveDateTime) -> JsonValue {
    JsonValue::String(value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn timestamptz_to_json(value: DateTime<Utc>) -> JsonValue {
    JsonValue::String(value.to_rfc3339())
}

fn is_text_type(ty: &Type) -> bool {
    *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
        || *ty == Type::UNKNOWN
}

/// Read a nullable column, mapping the non-null value to JSON
fn read<'a, T, F>(row: &'a Row, idx: usize, to_json: F) -> Result<Option<JsonValue>, DataError>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> JsonValue,
{
    let value = row
        .try_get::<_, Option<T>>(idx)
        .map_err(|e| DataError::query("Failed to read result column", e))?;
    Ok(value.map(to_json))
}

/// Read a single column of a row as a JSON value
///
/// Type mapping:
/// - `bool` → boolean
/// - `int2`, `int4`, `int8`, `oid` → integer
/// - `float4`, `float8` → number (NaN/Infinity as strings)
/// - `numeric` → decimal string
/// - `text`, `varchar`, `bpchar`, `name` → string
/// - `date`, `time` → ISO 8601 string
/// - `timestamp` → ISO 8601 string without offset
/// - `timestamptz` → RFC 3339 string in UTC
/// - `uuid` → hyphenated string
/// - `json`, `jsonb` → the embedded JSON value
/// - `bytea` → base64 string
/// - NULL of any type → null
///
/// # Errors
///
/// Any other type is rejected with [`DataError::UnsupportedColumn`] rather
/// than silently becoming null.
pub fn column_value(row: &Row, idx: usize) -> Result<JsonValue, DataError> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    let value = if *ty == Type::BOOL {
        read(row, idx, JsonValue::Bool)?
    } else if *ty == Type::INT2 {
        read(row, idx, |v: i16| JsonValue::from(v))?
    } else if *ty == Type::INT4 {
        read(row, idx, |v: i32| JsonValue::from(v))?
    } else if *ty == Type::INT8 {
        read(row, idx, |v: i64| JsonValue::from(v))?
    } else if *ty == Type::OID {
        read(row, idx, |v: u32| JsonValue::from(v))?
    } else if *ty == Type::FLOAT4 {
        read(row, idx, |v: f32| float_to_json(f64::from(v)))?
    } else if *ty == Type::FLOAT8 {
        read(row, idx, float_to_json)?
    } else if *ty == Type::NUMERIC {
        read(row, idx, decimal_to_json)?
    } else if is_text_type(ty) {
        read(row, idx, JsonValue::String)?
    } else if *ty == Type::DATE {
        read(row, idx, |v: NaiveDate| JsonValue::String(v.to_string()))?
    } else if *ty == Type::TIME {
        read(row, idx, |v: NaiveTime| JsonValue::String(v.to_string()))?
    } else if *ty == Type::TIMESTAMP {
        read(row, idx, timestamp_to_json)?
    } else if *ty == Type::TIMESTAMPTZ {
        read(row, idx, timestamptz_to_json)?
    } else if *ty == Type::UUID {
        read(row, idx, |v: Uuid| JsonValue::String(v.to_string()))?
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        read(row, idx, |v: JsonValue| v)?
    } else if *ty == Type::BYTEA {
        read(row, idx, |v: Vec<u8>| bytes_to_json(&v))?
    } else {
        tracing::warn!(
            "Column '{}' has unsupported type '{}'",
            column.name(),
            ty.name()
        );
        return Err(DataError::UnsupportedColumn {
            column: column.name().to_string(),
            type_name: ty.name().to_string(),
        });
    };

    Ok(value.unwrap_or(JsonValue::Null))
}

/// Convert one row into a [`Record`]
pub fn materialize_row(row: &Row) -> Result<Record, DataError> {
    let mut record = Record::new();

    for (idx, column) in row.columns().iter().enumerate() {
        // Last duplicate column name wins
        record.insert(column.name().to_string(), column_value(row, idx)?);
    }

    Ok(record)
}

/// Convert every row, preserving row order
///
/// A statement without result columns yields no rows and therefore an empty
/// vector.
pub fn materialize_all(rows: &[Row]) -> Result<Vec<Record>, DataError> {
    rows.iter().map(materialize_row).collect()
}

/// Convert at most one row
pub fn materialize_one(row: Option<&Row>) -> Result<Option<Record>, DataError> {
    row.map(materialize_row).transpose()
}
