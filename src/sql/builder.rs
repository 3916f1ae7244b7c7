//! Builds the aliased SELECT projection and the parameterized write
//! statements from a declared schema.
//!
//! Reads are assembled as parameterless statements: the single supported
//! filter is rendered inline as a literal. Writes bind values as `$n`
//! parameters. Identical inputs always yield identical statement text.

use crate::page::{Pageable, SortDirection};
use crate::schema::{EntitySchema, FieldKind};

/// Column alias prefix used for all entity queries.
pub const ENTITY_ALIAS: &str = "e";

/// Quote an identifier for PostgreSQL (safe: identifiers come from validated
/// schemas).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Literal value for the single-equality filter, rendered inline.
#[derive(Clone, Debug)]
pub enum Literal {
    Int(i64),
    Text(String),
}

impl Literal {
    fn render(&self) -> String {
        match self {
            Literal::Int(n) => n.to_string(),
            Literal::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// A single `column = literal` condition. The builder performs no validation
/// of the column; callers supply equality conditions on known columns only.
#[derive(Clone, Debug)]
pub struct ColumnEq {
    pub column: String,
    pub value: Literal,
}

impl ColumnEq {
    /// Equality on the identity column.
    pub fn id(id: i64) -> Self {
        Self {
            column: "id".to_string(),
            value: Literal::Int(id),
        }
    }
}

/// Aliased projection: one entry per schema field in declaration order,
/// identity first. Each column is exposed as `<alias>_<column>` so
/// projections from several tables could be combined without collisions.
pub fn projection(schema: &EntitySchema, alias: &str) -> Vec<String> {
    schema
        .fields()
        .iter()
        .map(|f| {
            format!(
                "{alias}.{} AS {}",
                quoted(&f.column),
                quoted(&format!("{alias}_{}", f.column))
            )
        })
        .collect()
}

/// Projection for a RETURNING clause: same aliases, no table qualifier.
fn returning_projection(schema: &EntitySchema, alias: &str) -> String {
    schema
        .fields()
        .iter()
        .map(|f| {
            format!(
                "{} AS {}",
                quoted(&f.column),
                quoted(&format!("{alias}_{}", f.column))
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT over the aliased projection: unfiltered and unordered unless a
/// filter or pageable is supplied.
pub fn select(
    schema: &EntitySchema,
    alias: &str,
    filter: Option<&ColumnEq>,
    pageable: Option<&Pageable>,
) -> String {
    let mut sql = format!(
        "SELECT {} FROM {} {alias}",
        projection(schema, alias).join(", "),
        quoted(schema.table())
    );
    if let Some(f) = filter {
        sql.push_str(&format!(
            " WHERE {alias}.{} = {}",
            quoted(&f.column),
            f.value.render()
        ));
    }
    if let Some(p) = pageable {
        if let Some(sort) = &p.sort {
            if let Some(field) = schema.field(&sort.field) {
                let direction = match sort.direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                sql.push_str(&format!(
                    " ORDER BY {alias}.{} {direction}",
                    quoted(&field.column)
                ));
            }
        }
        if let Some(limit) = p.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = p.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }
    sql
}

/// Cast suffix so a TEXT-typed NULL binds cleanly into a typed column.
fn placeholder(index: usize, kind: FieldKind) -> String {
    match kind {
        FieldKind::Date => format!("${index}::date"),
        _ => format!("${index}"),
    }
}

/// INSERT for a fresh record: every data column bound in schema order, the
/// identity left to the store, the new row returned under the aliased
/// projection.
pub fn insert(schema: &EntitySchema, alias: &str) -> String {
    let columns: Vec<String> = schema
        .data_fields()
        .iter()
        .map(|f| quoted(&f.column))
        .collect();
    let placeholders: Vec<String> = schema
        .data_fields()
        .iter()
        .enumerate()
        .map(|(i, f)| placeholder(i + 1, f.kind))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(schema.table()),
        columns.join(", "),
        placeholders.join(", "),
        returning_projection(schema, alias)
    )
}

/// UPDATE keyed on the identity: sets every data column, returns the row.
pub fn update(schema: &EntitySchema, alias: &str) -> String {
    let sets: Vec<String> = schema
        .data_fields()
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = {}", quoted(&f.column), placeholder(i + 1, f.kind)))
        .collect();
    let id_param = schema.data_fields().len() + 1;
    format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(schema.table()),
        sets.join(", "),
        quoted("id"),
        id_param,
        returning_projection(schema, alias)
    )
}

/// Presence check without a row fetch.
pub fn exists(schema: &EntitySchema) -> String {
    format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1) AS {}",
        quoted(schema.table()),
        quoted("id"),
        quoted("present")
    )
}

pub fn delete(schema: &EntitySchema) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        quoted(schema.table()),
        quoted("id")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Sort;

    fn address_schema() -> EntitySchema {
        EntitySchema::builder("address", "addresses")
            .text("street")
            .text("city")
            .text("provinceOrState")
            .text("country")
            .build()
            .unwrap()
    }

    fn student_schema() -> EntitySchema {
        EntitySchema::builder("student", "students")
            .text("name")
            .text("email")
            .date("birthday")
            .build()
            .unwrap()
    }

    #[test]
    fn test_projection_is_ordered_and_aliased() {
        let columns = projection(&address_schema(), ENTITY_ALIAS);
        assert_eq!(
            columns,
            vec![
                "e.\"id\" AS \"e_id\"",
                "e.\"street\" AS \"e_street\"",
                "e.\"city\" AS \"e_city\"",
                "e.\"province_or_state\" AS \"e_province_or_state\"",
                "e.\"country\" AS \"e_country\"",
            ]
        );
    }

    #[test]
    fn test_unfiltered_select() {
        let sql = select(&address_schema(), ENTITY_ALIAS, None, None);
        assert_eq!(
            sql,
            "SELECT e.\"id\" AS \"e_id\", e.\"street\" AS \"e_street\", e.\"city\" AS \"e_city\", \
             e.\"province_or_state\" AS \"e_province_or_state\", e.\"country\" AS \"e_country\" \
             FROM \"address\" e"
        );
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn test_select_with_id_filter() {
        let sql = select(&address_schema(), ENTITY_ALIAS, Some(&ColumnEq::id(42)), None);
        assert!(sql.ends_with("FROM \"address\" e WHERE e.\"id\" = 42"));
    }

    #[test]
    fn test_text_literal_is_escaped() {
        let filter = ColumnEq {
            column: "city".into(),
            value: Literal::Text("O'Hare".into()),
        };
        let sql = select(&address_schema(), ENTITY_ALIAS, Some(&filter), None);
        assert!(sql.ends_with("WHERE e.\"city\" = 'O''Hare'"));
    }

    #[test]
    fn test_select_with_paging() {
        let pageable = Pageable {
            sort: Some(Sort {
                field: "city".into(),
                direction: SortDirection::Desc,
            }),
            limit: Some(20),
            offset: Some(40),
        };
        let sql = select(&address_schema(), ENTITY_ALIAS, None, Some(&pageable));
        assert!(sql.ends_with("ORDER BY e.\"city\" DESC LIMIT 20 OFFSET 40"));
    }

    #[test]
    fn test_select_is_deterministic() {
        let schema = student_schema();
        assert_eq!(
            select(&schema, ENTITY_ALIAS, None, None),
            select(&schema, ENTITY_ALIAS, None, None)
        );
    }

    #[test]
    fn test_insert_statement() {
        let sql = insert(&student_schema(), ENTITY_ALIAS);
        assert_eq!(
            sql,
            "INSERT INTO \"student\" (\"name\", \"email\", \"birthday\") \
             VALUES ($1, $2, $3::date) \
             RETURNING \"id\" AS \"e_id\", \"name\" AS \"e_name\", \"email\" AS \"e_email\", \
             \"birthday\" AS \"e_birthday\""
        );
    }

    #[test]
    fn test_update_statement() {
        let sql = update(&student_schema(), ENTITY_ALIAS);
        assert_eq!(
            sql,
            "UPDATE \"student\" SET \"name\" = $1, \"email\" = $2, \"birthday\" = $3::date \
             WHERE \"id\" = $4 \
             RETURNING \"id\" AS \"e_id\", \"name\" AS \"e_name\", \"email\" AS \"e_email\", \
             \"birthday\" AS \"e_birthday\""
        );
    }

    #[test]
    fn test_exists_and_delete_statements() {
        let schema = address_schema();
        assert_eq!(
            exists(&schema),
            "SELECT EXISTS(SELECT 1 FROM \"address\" WHERE \"id\" = $1) AS \"present\""
        );
        assert_eq!(delete(&schema), "DELETE FROM \"address\" WHERE \"id\" = $1");
    }
}
