use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::Customer;
use crate::services::customers::{self, CustomerInput};
use crate::state::AppState;

// GET /api/customers
pub async fn list_customers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Customer>>, AppError> {
    let conn = state.conn();
    Ok(Json(customers::list_customers(&conn)?))
}

// POST /api/customers
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CustomerInput>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let conn = state.conn();
    let customer = customers::create_customer(&conn, &req)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers/:id
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, AppError> {
    let conn = state.conn();
    Ok(Json(customers::get_customer(&conn, id)?))
}

// PUT /api/customers/:id
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<CustomerInput>,
) -> Result<Json<Customer>, AppError> {
    let conn = state.conn();
    Ok(Json(customers::update_customer(&conn, id, &req)?))
}

// DELETE /api/customers/:id
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let conn = state.conn();
    customers::delete_customer(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
