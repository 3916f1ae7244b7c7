//! Entity CRUD routes. Paths are parameterized so the handlers resolve the
//! entity by segment; an unregistered segment is a 404, and a method with no
//! route (e.g. PUT on the collection path) is a 405.

use crate::handlers::entity::{create, delete as delete_handler, list, partial_update, read, replace};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:path_segment", get(list).post(create))
        .route(
            "/:path_segment/:id",
            get(read)
                .put(replace)
                .patch(partial_update)
                .delete(delete_handler),
        )
        .with_state(state)
}
