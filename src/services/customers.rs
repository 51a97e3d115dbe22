use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Customer;

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn validate(input: &CustomerInput) -> Result<(String, String), AppError> {
    let first = input.first_name.trim();
    if first.is_empty() {
        return Err(AppError::Validation("First name is required".to_string()));
    }
    let last = input.last_name.trim();
    if last.is_empty() {
        return Err(AppError::Validation("Last name is required".to_string()));
    }
    Ok((first.to_string(), last.to_string()))
}

/// Ordered by last name, then first name.
pub fn list_customers(conn: &Connection) -> Result<Vec<Customer>, AppError> {
    Ok(queries::list_customers(conn)?)
}

pub fn get_customer(conn: &Connection, id: i64) -> Result<Customer, AppError> {
    queries::get_customer(conn, id)?.ok_or_else(|| AppError::NotFound(format!("Customer {id}")))
}

pub fn create_customer(conn: &Connection, input: &CustomerInput) -> Result<Customer, AppError> {
    let (first, last) = validate(input)?;
    let id = queries::insert_customer(conn, &first, &last, input.email.as_deref(), input.phone.as_deref())?;
    let customer = get_customer(conn, id)?;
    tracing::info!(customer_id = id, name = %customer.full_name(), "customer created");
    Ok(customer)
}

pub fn update_customer(conn: &Connection, id: i64, input: &CustomerInput) -> Result<Customer, AppError> {
    let (first_name, last_name) = validate(input)?;
    let customer = Customer {
        id,
        first_name,
        last_name,
        email: input.email.clone(),
        phone: input.phone.clone(),
    };
    if !queries::update_customer(conn, &customer)? {
        return Err(AppError::NotFound(format!("Customer {id}")));
    }
    Ok(customer)
}

pub fn delete_customer(conn: &Connection, id: i64) -> Result<(), AppError> {
    get_customer(conn, id)?;
    if queries::count_bookings_for_customer(conn, id)? > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a customer that has bookings".to_string(),
        ));
    }
    queries::delete_customer(conn, id)?;
    Ok(())
}
