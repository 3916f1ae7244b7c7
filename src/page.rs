//! Listing page parameters: sort, limit, offset.

use crate::error::AppError;
use crate::schema::EntitySchema;
use serde::Deserialize;

/// Upper bound for an explicit listing limit.
pub const MAX_LIMIT: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Paging for unfiltered listings. Never applied to the lookup-by-id path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pageable {
    pub sort: Option<Sort>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Raw listing query params, extractable with `Query`.
/// Sort syntax: `sort=city,desc`; a bare `sort=city` is ascending.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageQuery {
    /// Resolve the raw params against a schema. Returns `None` when no
    /// paging was requested. An unknown sort field or direction is rejected
    /// rather than silently ignored.
    pub fn into_pageable(self, schema: &EntitySchema) -> Result<Option<Pageable>, AppError> {
        if self.sort.is_none() && self.limit.is_none() && self.offset.is_none() {
            return Ok(None);
        }
        let sort = match self.sort {
            None => None,
            Some(raw) => {
                let (field, direction) = match raw.split_once(',') {
                    None => (raw.as_str(), SortDirection::Asc),
                    Some((f, d)) if d.eq_ignore_ascii_case("asc") => (f, SortDirection::Asc),
                    Some((f, d)) if d.eq_ignore_ascii_case("desc") => (f, SortDirection::Desc),
                    Some((_, d)) => {
                        return Err(AppError::BadRequest(format!(
                            "invalid sort direction '{d}'"
                        )))
                    }
                };
                if schema.field(field).is_none() {
                    return Err(AppError::BadRequest(format!("unknown sort field '{field}'")));
                }
                Some(Sort {
                    field: field.to_string(),
                    direction,
                })
            }
        };
        Ok(Some(Pageable {
            sort,
            limit: self.limit.map(|n| n.min(MAX_LIMIT)),
            offset: self.offset,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntitySchema;

    fn schema() -> EntitySchema {
        EntitySchema::builder("address", "addresses")
            .text("city")
            .build()
            .unwrap()
    }

    #[test]
    fn no_params_means_no_pageable() {
        let pageable = PageQuery::default().into_pageable(&schema()).unwrap();
        assert!(pageable.is_none());
    }

    #[test]
    fn parses_sort_and_caps_limit() {
        let query = PageQuery {
            sort: Some("city,desc".into()),
            limit: Some(5000),
            offset: Some(10),
        };
        let pageable = query.into_pageable(&schema()).unwrap().unwrap();
        assert_eq!(
            pageable.sort,
            Some(Sort {
                field: "city".into(),
                direction: SortDirection::Desc,
            })
        );
        assert_eq!(pageable.limit, Some(MAX_LIMIT));
        assert_eq!(pageable.offset, Some(10));
    }

    #[test]
    fn rejects_unknown_sort_field() {
        let query = PageQuery {
            sort: Some("bogus".into()),
            ..Default::default()
        };
        assert!(matches!(
            query.into_pageable(&schema()),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_unknown_sort_direction() {
        let query = PageQuery {
            sort: Some("city,sideways".into()),
            ..Default::default()
        };
        assert!(matches!(
            query.into_pageable(&schema()),
            Err(AppError::BadRequest(_))
        ));
    }
}
