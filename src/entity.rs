//! Typed entity values: records, field values, merge patches.

use chrono::NaiveDate;
use std::collections::HashMap;

/// A single typed field value. `Null` covers both SQL NULL and an absent
/// body field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One entity value: an optional identity plus field values keyed by API
/// field name.
///
/// The identity is `None` until the store assigns one; it is only ever set
/// from store output, never from client input on create.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityRecord {
    pub id: Option<i64>,
    values: HashMap<String, FieldValue>,
}

impl EntityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            values: HashMap::new(),
        }
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.values.insert(field.into(), value);
    }

    /// Fluent setter for a text field.
    pub fn text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, FieldValue::Text(value.into()));
        self
    }

    /// Fluent setter for a date field.
    pub fn date(mut self, field: impl Into<String>, value: NaiveDate) -> Self {
        self.set(field, FieldValue::Date(value));
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Value for a field, treating unset as SQL NULL.
    pub fn value(&self, field: &str) -> FieldValue {
        self.values.get(field).cloned().unwrap_or(FieldValue::Null)
    }
}

/// Partial-update document: the fields that were present and non-null in a
/// PATCH body, plus the body-supplied identity for the precondition check.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergePatch {
    pub id: Option<i64>,
    values: HashMap<String, FieldValue>,
}

impl MergePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            values: HashMap::new(),
        }
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.values.insert(field.into(), value);
    }

    pub fn text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, FieldValue::Text(value.into()));
        self
    }

    pub fn date(mut self, field: impl Into<String>, value: NaiveDate) -> Self {
        self.set(field, FieldValue::Date(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlay this patch onto a stored record: every patched field replaces
    /// the stored value, everything else is untouched. A merge-patch cannot
    /// clear a field — `null` and omitted are equivalent.
    pub fn apply_to(&self, stored: &EntityRecord) -> EntityRecord {
        let mut merged = stored.clone();
        for (field, value) in &self.values {
            if !value.is_null() {
                merged.set(field.clone(), value.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_address() -> EntityRecord {
        EntityRecord::with_id(1)
            .text("street", "A")
            .text("city", "B")
            .text("provinceOrState", "C")
            .text("country", "D")
    }

    #[test]
    fn patch_overlays_only_present_fields() {
        let patch = MergePatch::with_id(1).text("street", "Z");
        let merged = patch.apply_to(&stored_address());
        assert_eq!(merged.value("street"), FieldValue::Text("Z".into()));
        assert_eq!(merged.value("city"), FieldValue::Text("B".into()));
        assert_eq!(merged.value("provinceOrState"), FieldValue::Text("C".into()));
        assert_eq!(merged.value("country"), FieldValue::Text("D".into()));
        assert_eq!(merged.id, Some(1));
    }

    #[test]
    fn patch_null_does_not_clear() {
        let mut patch = MergePatch::with_id(1);
        patch.set("street", FieldValue::Null);
        let merged = patch.apply_to(&stored_address());
        assert_eq!(merged.value("street"), FieldValue::Text("A".into()));
    }

    #[test]
    fn unset_field_reads_as_null() {
        let record = EntityRecord::new();
        assert_eq!(record.value("street"), FieldValue::Null);
        assert!(record.get("street").is_none());
    }
}
