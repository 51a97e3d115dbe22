use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Business;

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessInput {
    pub name: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn validate(input: &BusinessInput) -> Result<String, AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Business name is required".to_string()));
    }
    Ok(name.to_string())
}

pub fn list_businesses(conn: &Connection) -> Result<Vec<Business>, AppError> {
    Ok(queries::list_businesses(conn)?)
}

pub fn get_business(conn: &Connection, id: i64) -> Result<Business, AppError> {
    queries::get_business(conn, id)?.ok_or_else(|| AppError::NotFound(format!("Business {id}")))
}

pub fn create_business(conn: &Connection, input: &BusinessInput) -> Result<Business, AppError> {
    let name = validate(input)?;
    let id = queries::insert_business(
        conn,
        &name,
        input.description.as_deref(),
        input.email.as_deref(),
        input.phone.as_deref(),
    )?;
    tracing::info!(business_id = id, name = %name, "business created");
    get_business(conn, id)
}

pub fn update_business(conn: &Connection, id: i64, input: &BusinessInput) -> Result<Business, AppError> {
    let name = validate(input)?;
    let business = Business {
        id,
        name,
        description: input.description.clone(),
        email: input.email.clone(),
        phone: input.phone.clone(),
    };
    if !queries::update_business(conn, &business)? {
        return Err(AppError::NotFound(format!("Business {id}")));
    }
    get_business(conn, id)
}

/// Services and opening hours go with the business. Booking history does
/// not, so a business that has ever been booked cannot be deleted.
pub fn delete_business(conn: &Connection, id: i64) -> Result<(), AppError> {
    get_business(conn, id)?;
    if queries::count_bookings_for_business(conn, id)? > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a business that has bookings".to_string(),
        ));
    }
    queries::delete_business(conn, id)?;
    tracing::info!(business_id = id, "business deleted");
    Ok(())
}
