//! Conversion of admin console rows into JSON.
//!
//! The admin console only speaks the simple query protocol, so every value
//! arrives as text. Values are read as text and then typed by the column's
//! reported Postgres type.

use serde_json::{Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo};

use sidecar_core::{QueryError, Row};

pub(crate) fn row_to_json(row: &PgRow) -> Result<Row, QueryError> {
    let mut out = Row::new();
    for column in row.columns() {
        let text: Option<String> = row
            .try_get_unchecked(column.ordinal())
            .map_err(|e| QueryError::Decode {
                column: column.name().to_string(),
                message: e.to_string(),
            })?;
        out.insert(
            column.name().to_string(),
            text_to_json(column.type_info().name(), text.as_deref()),
        );
    }
    Ok(out)
}

pub(crate) fn text_to_json(type_name: &str, text: Option<&str>) -> Value {
    let Some(text) = text else {
        return Value::Null;
    };
    match type_name {
        "INT2" | "INT4" | "INT8" | "OID" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(text)),
        "FLOAT4" | "FLOAT8" | "NUMERIC" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(text)),
        "BOOL" => match text {
            "t" | "true" => Value::Bool(true),
            "f" | "false" => Value::Bool(false),
            _ => Value::from(text),
        },
        _ => Value::from(text),
    }
}
