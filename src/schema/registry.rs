//! Entity registry: lookup table from URL path segments to schemas.

use crate::error::SchemaError;
use crate::schema::EntitySchema;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Arc<EntitySchema>>,
    by_path: HashMap<String, Arc<EntitySchema>>,
}

impl EntityRegistry {
    pub fn new(schemas: Vec<EntitySchema>) -> Result<Self, SchemaError> {
        let mut entities = Vec::with_capacity(schemas.len());
        let mut by_path = HashMap::with_capacity(schemas.len());
        for schema in schemas {
            let schema = Arc::new(schema);
            let segment = schema.path_segment().to_string();
            if by_path.insert(segment.clone(), schema.clone()).is_some() {
                return Err(SchemaError::DuplicatePathSegment(segment));
            }
            entities.push(schema);
        }
        Ok(Self { entities, by_path })
    }

    pub fn schema_for_path(&self, segment: &str) -> Option<&Arc<EntitySchema>> {
        self.by_path.get(segment)
    }

    pub fn entities(&self) -> &[Arc<EntitySchema>] {
        &self.entities
    }
}
