//! Entity CRUD handlers: create, read, replace, partial update, delete,
//! list (buffered JSON or streamed NDJSON).

use crate::error::AppError;
use crate::json::{patch_from_json, record_from_json, record_to_json};
use crate::page::PageQuery;
use crate::service::CrudResource;
use crate::state::AppState;
use crate::store::PgRepository;
use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde_json::Value;

const NDJSON: &str = "application/x-ndjson";
const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

fn resource(state: &AppState, segment: &str) -> Result<CrudResource<PgRepository>, AppError> {
    let schema = state
        .registry
        .schema_for_path(segment)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("no entity at '{segment}'")))?;
    Ok(CrudResource::new(
        schema.clone(),
        PgRepository::new(state.pool.clone(), schema),
    ))
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{raw}'")))
}

fn wants_ndjson(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains(NDJSON))
        .unwrap_or(false)
}

pub async fn list(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(params): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let resource = resource(&state, &segment)?;
    let pageable = params.into_pageable(resource.schema())?;

    if wants_ndjson(&headers) {
        let schema = resource.schema().clone();
        let lines = resource.get_all_streaming(pageable.as_ref()).map(move |item| {
            item.map(|record| {
                let mut line = record_to_json(&schema, &record).to_string();
                line.push('\n');
                Bytes::from(line)
            })
        });
        return Ok((
            [(header::CONTENT_TYPE, NDJSON)],
            Body::from_stream(lines),
        )
            .into_response());
    }

    let records = resource.get_all(pageable.as_ref()).await?;
    let body: Vec<Value> = records
        .iter()
        .map(|record| record_to_json(resource.schema(), record))
        .collect();
    Ok(Json(body).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let resource = resource(&state, &segment)?;
    let candidate = record_from_json(resource.schema(), &body)?;
    let created = resource.create(candidate).await?;
    let id = created.id.ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/{segment}/{id}"))],
        Json(record_to_json(resource.schema(), &created)),
    )
        .into_response())
}

pub async fn read(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let resource = resource(&state, &segment)?;
    let record = resource.get_one(parse_id(&id)?).await?;
    Ok(Json(record_to_json(resource.schema(), &record)).into_response())
}

pub async fn replace(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let resource = resource(&state, &segment)?;
    let candidate = record_from_json(resource.schema(), &body)?;
    let updated = resource.replace(parse_id(&id)?, candidate).await?;
    Ok(Json(record_to_json(resource.schema(), &updated)).into_response())
}

pub async fn partial_update(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("application/json") && !content_type.starts_with(MERGE_PATCH_JSON)
    {
        return Err(AppError::UnsupportedMediaType(content_type.to_string()));
    }

    let resource = resource(&state, &segment)?;
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed JSON body: {e}")))?;
    let patch = patch_from_json(resource.schema(), &value)?;
    let merged = resource.partial_update(parse_id(&id)?, patch).await?;
    Ok(Json(record_to_json(resource.schema(), &merged)).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let resource = resource(&state, &segment)?;
    resource.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
