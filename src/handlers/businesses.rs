use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::admin::require_admin;
use crate::errors::AppError;
use crate::models::Business;
use crate::services::businesses::{self, BusinessInput};
use crate::state::AppState;

// GET /api/businesses
pub async fn list_businesses(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Business>>, AppError> {
    let conn = state.conn();
    Ok(Json(businesses::list_businesses(&conn)?))
}

// POST /api/businesses
pub async fn create_business(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BusinessInput>,
) -> Result<(StatusCode, Json<Business>), AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    let business = businesses::create_business(&conn, &req)?;
    Ok((StatusCode::CREATED, Json(business)))
}

// GET /api/businesses/:id
pub async fn get_business(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Business>, AppError> {
    let conn = state.conn();
    Ok(Json(businesses::get_business(&conn, id)?))
}

// PUT /api/businesses/:id
pub async fn update_business(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<BusinessInput>,
) -> Result<Json<Business>, AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    Ok(Json(businesses::update_business(&conn, id, &req)?))
}

// DELETE /api/businesses/:id
pub async fn delete_business(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    businesses::delete_business(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
