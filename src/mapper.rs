//! Converts a decoded row, keyed by aliased column names, into a typed
//! entity.

use crate::entity::{EntityRecord, FieldValue};
use crate::error::AppError;
use crate::schema::{EntitySchema, FieldKind};
use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Row-to-entity converter with per-field type coercion.
pub struct RowMapper<'a> {
    schema: &'a EntitySchema,
}

impl<'a> RowMapper<'a> {
    pub fn new(schema: &'a EntitySchema) -> Self {
        Self { schema }
    }

    /// Extract every schema field from `row` under `prefix`. The first value
    /// that does not fit its field's kind fails the whole row; columns
    /// outside the schema are never consulted.
    pub fn to_entity(
        &self,
        row: &Map<String, Value>,
        prefix: &str,
    ) -> Result<EntityRecord, AppError> {
        let mut record = EntityRecord::new();
        for field in self.schema.fields() {
            let key = format!("{prefix}_{}", field.column);
            let cell = row.get(&key).ok_or(AppError::Conversion {
                column: key.clone(),
                expected: "a present column",
            })?;
            match field.kind {
                FieldKind::Identity => record.id = coerce_identity(cell, &key)?,
                FieldKind::Text => record.set(field.name.clone(), coerce_text(cell, &key)?),
                FieldKind::Date => record.set(field.name.clone(), coerce_date(cell, &key)?),
            }
        }
        Ok(record)
    }
}

fn coerce_identity(value: &Value, column: &str) -> Result<Option<i64>, AppError> {
    let fail = || AppError::Conversion {
        column: column.to_string(),
        expected: "an integer identity",
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_i64().map(Some).ok_or_else(fail),
        Value::String(s) => s.parse::<i64>().map(Some).map_err(|_| fail()),
        _ => Err(fail()),
    }
}

fn coerce_text(value: &Value, column: &str) -> Result<FieldValue, AppError> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::String(s) => Ok(FieldValue::Text(s.clone())),
        Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
        _ => Err(AppError::Conversion {
            column: column.to_string(),
            expected: "a text value",
        }),
    }
}

fn coerce_date(value: &Value, column: &str) -> Result<FieldValue, AppError> {
    let fail = || AppError::Conversion {
        column: column.to_string(),
        expected: "a date value",
    };
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(FieldValue::Date)
            .map_err(|_| fail()),
        _ => Err(fail()),
    }
}
