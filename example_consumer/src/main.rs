//! Example consumer: declares the three entity shapes and serves them over
//! HTTP with blueprint-sdk.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use axum::Router;
use blueprint_sdk::{
    common_routes_with_ready, ensure_database_exists, ensure_entity_tables, entity_routes,
    AppState, EntityRegistry, EntitySchema,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blueprint_sdk=info")),
        )
        .init();

    let registry = EntityRegistry::new(vec![
        EntitySchema::builder("address", "addresses")
            .text("street")
            .text("city")
            .text("provinceOrState")
            .text("country")
            .build()?,
        EntitySchema::builder("phone", "phones").text("phone").build()?,
        EntitySchema::builder("student", "students")
            .text("name")
            .text("email")
            .date("birthday")
            .build()?,
    ])?;

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/blueprint".into());
    ensure_database_exists(&database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    ensure_entity_tables(&pool, &registry).await?;

    let state = AppState {
        pool,
        registry: Arc::new(registry),
    };
    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api", entity_routes(state))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
