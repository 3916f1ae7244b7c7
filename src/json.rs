//! JSON body codec: typed entity records <-> API JSON shapes.
//!
//! Bodies use the declared (camelCase) field names. Unknown keys are
//! ignored; a wrong-typed field value is a bad request.

use crate::entity::{EntityRecord, FieldValue, MergePatch};
use crate::error::AppError;
use crate::schema::{EntitySchema, FieldDef, FieldKind};
use chrono::NaiveDate;
use serde_json::{Map, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn record_to_json(schema: &EntitySchema, record: &EntityRecord) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "id".to_string(),
        match record.id {
            Some(id) => Value::Number(id.into()),
            None => Value::Null,
        },
    );
    for field in schema.data_fields() {
        obj.insert(field.name.clone(), field_value_to_json(record.value(&field.name)));
    }
    Value::Object(obj)
}

fn field_value_to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Text(s) => Value::String(s),
        FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
    }
}

/// Decode a full entity body. Fields absent from the body read as `Null`,
/// so a replace overwrites every column.
pub fn record_from_json(schema: &EntitySchema, body: &Value) -> Result<EntityRecord, AppError> {
    let obj = as_object(body)?;
    let mut record = EntityRecord::new();
    record.id = id_from_json(obj)?;
    for field in schema.data_fields() {
        let value = match obj.get(&field.name) {
            None | Some(Value::Null) => FieldValue::Null,
            Some(v) => coerce_body_value(field, v)?,
        };
        record.set(field.name.clone(), value);
    }
    Ok(record)
}

/// Decode a merge-patch body: only fields present and non-null are kept.
pub fn patch_from_json(schema: &EntitySchema, body: &Value) -> Result<MergePatch, AppError> {
    let obj = as_object(body)?;
    let mut patch = MergePatch::new();
    patch.id = id_from_json(obj)?;
    for field in schema.data_fields() {
        match obj.get(&field.name) {
            None | Some(Value::Null) => {}
            Some(v) => patch.set(field.name.clone(), coerce_body_value(field, v)?),
        }
    }
    Ok(patch)
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, AppError> {
    body.as_object()
        .ok_or_else(|| AppError::BadRequest("body must be a JSON object".into()))
}

fn id_from_json(obj: &Map<String, Value>) -> Result<Option<i64>, AppError> {
    match obj.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::BadRequest("id must be an integer".into())),
        Some(_) => Err(AppError::BadRequest("id must be an integer".into())),
    }
}

fn coerce_body_value(field: &FieldDef, value: &Value) -> Result<FieldValue, AppError> {
    match field.kind {
        FieldKind::Text => value
            .as_str()
            .map(|s| FieldValue::Text(s.to_string()))
            .ok_or_else(|| AppError::BadRequest(format!("field '{}' must be a string", field.name))),
        FieldKind::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
            .map(FieldValue::Date)
            .ok_or_else(|| {
                AppError::BadRequest(format!("field '{}' must be a YYYY-MM-DD date", field.name))
            }),
        FieldKind::Identity => Err(AppError::BadRequest(format!(
            "field '{}' cannot be set from a body",
            field.name
        ))),
    }
}
