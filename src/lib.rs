//! Blueprint SDK: schema-declared reactive CRUD REST backend library.

pub mod case;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod json;
pub mod mapper;
pub mod page;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use entity::{EntityRecord, FieldValue, MergePatch};
pub use error::{AppError, SchemaError};
pub use mapper::RowMapper;
pub use page::{PageQuery, Pageable, Sort, SortDirection};
pub use repository::{EntityRepository, EntityStream};
pub use routes::{common_routes, common_routes_with_ready, entity_routes};
pub use schema::{EntityRegistry, EntitySchema, FieldDef, FieldKind};
pub use service::CrudResource;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_entity_tables, PgRepository};
