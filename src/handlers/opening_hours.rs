use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveTime;
use serde::Deserialize;

use super::admin::require_admin;
use crate::errors::AppError;
use crate::models::opening_hour::hhmm;
use crate::models::OpeningHour;
use crate::services::opening_hours::{self, OpeningHourInput};
use crate::state::AppState;

// POST /api/opening-hours
#[derive(Deserialize)]
pub struct CreateOpeningHourRequest {
    pub business_id: i64,
    pub day_of_week: i64,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

pub async fn create_opening_hour(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOpeningHourRequest>,
) -> Result<(StatusCode, Json<OpeningHour>), AppError> {
    require_admin(&state, &headers)?;
    let input = OpeningHourInput {
        day_of_week: req.day_of_week,
        start_time: req.start_time,
        end_time: req.end_time,
    };
    let conn = state.conn();
    let created = opening_hours::create_opening_hour(&conn, req.business_id, &input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/opening-hours/:id
pub async fn get_opening_hour(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<OpeningHour>, AppError> {
    let conn = state.conn();
    Ok(Json(opening_hours::get_opening_hour(&conn, id)?))
}

// GET /api/opening-hours/business/:business_id
pub async fn list_for_business(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<i64>,
) -> Result<Json<Vec<OpeningHour>>, AppError> {
    let conn = state.conn();
    Ok(Json(opening_hours::list_for_business(&conn, business_id)?))
}

// PUT /api/opening-hours/:id
pub async fn update_opening_hour(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<OpeningHourInput>,
) -> Result<Json<OpeningHour>, AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    Ok(Json(opening_hours::update_opening_hour(&conn, id, &input)?))
}

// DELETE /api/opening-hours/:id
pub async fn delete_opening_hour(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    opening_hours::delete_opening_hour(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
