use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::admin::require_admin;
use crate::errors::AppError;
use crate::models::Service;
use crate::services::service_catalog::{self, ServiceInput};
use crate::state::AppState;

// POST /api/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ServiceInput>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    let service = service_catalog::create_service(&conn, &req)?;
    Ok((StatusCode::CREATED, Json(service)))
}

// GET /api/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Service>, AppError> {
    let conn = state.conn();
    Ok(Json(service_catalog::get_service(&conn, id)?))
}

// GET /api/services/business/:business_id
pub async fn list_for_business(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<i64>,
) -> Result<Json<Vec<Service>>, AppError> {
    let conn = state.conn();
    Ok(Json(service_catalog::list_for_business(&conn, business_id)?))
}

// PUT /api/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<ServiceInput>,
) -> Result<Json<Service>, AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    Ok(Json(service_catalog::update_service(&conn, id, &req)?))
}

// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    service_catalog::delete_service(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
