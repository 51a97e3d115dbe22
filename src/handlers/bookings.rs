use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::admin::require_admin;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::availability::{self, Slot, SlotCheck};
use crate::services::booking::{self, BookingChanges, NewBooking};
use crate::state::AppState;

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub business_id: i64,
    pub service_id: i64,
    pub customer_id: i64,
    pub start_time: NaiveDateTime,
    pub status: Option<BookingStatus>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let request = NewBooking {
        business_id: req.business_id,
        service_id: req.service_id,
        customer_id: req.customer_id,
        start_time: req.start_time,
        status: req.status,
    };
    let created = {
        let mut conn = state.conn();
        booking::create_booking(&mut conn, &request)?
    };
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    require_admin(&state, &headers)?;
    let conn = state.conn();
    Ok(Json(booking::list_all(&conn, query.status.as_deref(), query.limit)?))
}

// GET /api/bookings/availability
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub business_id: i64,
    pub service_id: i64,
    pub start_time: NaiveDateTime,
}

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<SlotCheck>, AppError> {
    let conn = state.conn();
    let check = availability::check_availability(&conn, query.business_id, query.service_id, query.start_time)?;
    Ok(Json(check))
}

// GET /api/bookings/slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub business_id: i64,
    pub service_id: i64,
    pub date: NaiveDate,
    pub step_minutes: Option<i64>,
}

pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let step = query.step_minutes.unwrap_or(state.config.slot_step_minutes);
    let conn = state.conn();
    let slots = availability::available_slots(&conn, query.business_id, query.service_id, query.date, step)?;
    Ok(Json(slots))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let conn = state.conn();
    Ok(Json(booking::get_booking(&conn, id)?))
}

// PUT /api/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub status: Option<BookingStatus>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let changes = BookingChanges {
        start_time: req.start_time,
        end_time: req.end_time,
        status: req.status,
    };
    let mut conn = state.conn();
    Ok(Json(booking::update_booking(&mut conn, id, &changes)?))
}

// POST /api/bookings/:id/cancel and DELETE /api/bookings/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let mut conn = state.conn();
    Ok(Json(booking::cancel_booking(&mut conn, id)?))
}

// GET /api/bookings/business/:id
pub async fn list_for_business(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<i64>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let conn = state.conn();
    Ok(Json(booking::list_for_business(&conn, business_id)?))
}

// GET /api/bookings/customer/:id
pub async fn list_for_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<i64>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let conn = state.conn();
    Ok(Json(booking::list_for_customer(&conn, customer_id)?))
}
