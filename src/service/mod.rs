//! CrudResource: the generic CRUD state machine over a repository.

mod resource;
pub use resource::CrudResource;
