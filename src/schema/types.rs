//! Declared entity schemas: field kinds, field definitions, and the
//! validating builder.

use crate::case::to_snake_case;
use crate::error::SchemaError;

/// Name (and column) of the identity field every schema carries.
pub const ID_FIELD: &str = "id";

/// Semantic type of a schema field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Store-assigned integer identity. Exactly one per schema, always `id`.
    Identity,
    Text,
    Date,
}

/// One declared field: API name, backing column, semantic kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub column: String,
    pub kind: FieldKind,
}

/// Static description of one entity kind: table name, URL path segment, and
/// the ordered field list (identity first).
///
/// The schema drives both the SQL projection and the row mapper, so the two
/// always agree on the column set.
#[derive(Clone, Debug)]
pub struct EntitySchema {
    name: String,
    table: String,
    path_segment: String,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    pub fn builder(name: &str, path_segment: &str) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            name: name.to_string(),
            table: None,
            path_segment: path_segment.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn path_segment(&self) -> &str {
        &self.path_segment
    }

    /// All fields in declaration order, identity first.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declared fields without the identity column.
    pub fn data_fields(&self) -> &[FieldDef] {
        &self.fields[1..]
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Builder for [`EntitySchema`]. Identifiers are validated at `build()`;
/// the table name defaults to the snake_cased entity name.
pub struct EntitySchemaBuilder {
    name: String,
    table: Option<String>,
    path_segment: String,
    fields: Vec<(String, FieldKind)>,
}

impl EntitySchemaBuilder {
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn text(self, name: &str) -> Self {
        self.field(name, FieldKind::Text)
    }

    pub fn date(self, name: &str) -> Self {
        self.field(name, FieldKind::Date)
    }

    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push((name.to_string(), kind));
        self
    }

    pub fn build(self) -> Result<EntitySchema, SchemaError> {
        let table = self
            .table
            .unwrap_or_else(|| to_snake_case(&self.name));
        check_identifier(&self.name, "entity")?;
        check_identifier(&table, "table")?;
        check_identifier(&self.path_segment, "path segment")?;
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields(self.name));
        }

        let mut fields = vec![FieldDef {
            name: ID_FIELD.to_string(),
            column: ID_FIELD.to_string(),
            kind: FieldKind::Identity,
        }];
        for (name, kind) in self.fields {
            if name == ID_FIELD {
                return Err(SchemaError::ReservedField(name));
            }
            check_identifier(&name, "field")?;
            let column = to_snake_case(&name);
            if fields.iter().any(|f| f.name == name) {
                return Err(SchemaError::DuplicateField(name));
            }
            if fields.iter().any(|f| f.column == column) {
                return Err(SchemaError::DuplicateColumn(column));
            }
            fields.push(FieldDef { name, column, kind });
        }

        Ok(EntitySchema {
            name: self.name,
            table,
            path_segment: self.path_segment,
            fields,
        })
    }
}

fn check_identifier(ident: &str, kind: &'static str) -> Result<(), SchemaError> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier {
            kind,
            ident: ident.to_string(),
        })
    }
}

fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_identity_first_and_snake_case_columns() {
        let schema = EntitySchema::builder("address", "addresses")
            .text("street")
            .text("provinceOrState")
            .build()
            .unwrap();
        assert_eq!(schema.table(), "address");
        let columns: Vec<_> = schema.fields().iter().map(|f| f.column.as_str()).collect();
        assert_eq!(columns, vec!["id", "street", "province_or_state"]);
        assert_eq!(schema.fields()[0].kind, FieldKind::Identity);
        assert_eq!(schema.data_fields().len(), 2);
    }

    #[test]
    fn rejects_reserved_and_duplicate_fields() {
        let err = EntitySchema::builder("phone", "phones")
            .text("id")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::ReservedField(_)));

        let err = EntitySchema::builder("phone", "phones")
            .text("phone")
            .text("phone")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(_)));
    }

    #[test]
    fn rejects_invalid_identifiers_and_empty_schemas() {
        let err = EntitySchema::builder("address; drop", "addresses")
            .text("street")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIdentifier { kind: "entity", .. }));

        let err = EntitySchema::builder("address", "addresses")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::NoFields(_)));
    }
}
