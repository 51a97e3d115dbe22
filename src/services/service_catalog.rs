//! Services a business offers. A service's duration is what turns a
//! requested start time into a bookable range.

use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::service::MAX_DURATION_MINUTES;
use crate::models::Service;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub business_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    #[serde(default)]
    pub price_cents: i64,
    pub is_active: Option<bool>,
}

fn validate(input: &ServiceInput) -> Result<String, AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Service name is required".to_string()));
    }
    if input.duration_minutes <= 0 {
        return Err(AppError::Validation("Duration must be greater than 0".to_string()));
    }
    if input.duration_minutes > MAX_DURATION_MINUTES {
        return Err(AppError::Validation(format!(
            "Duration cannot exceed {MAX_DURATION_MINUTES} minutes"
        )));
    }
    if input.price_cents < 0 {
        return Err(AppError::Validation("Price cannot be negative".to_string()));
    }
    Ok(name.to_string())
}

pub fn get_service(conn: &Connection, id: i64) -> Result<Service, AppError> {
    queries::get_service(conn, id)?.ok_or_else(|| AppError::NotFound(format!("Service {id}")))
}

pub fn list_for_business(conn: &Connection, business_id: i64) -> Result<Vec<Service>, AppError> {
    if queries::get_business(conn, business_id)?.is_none() {
        return Err(AppError::NotFound(format!("Business {business_id}")));
    }
    Ok(queries::list_services_for_business(conn, business_id)?)
}

pub fn create_service(conn: &Connection, input: &ServiceInput) -> Result<Service, AppError> {
    let name = validate(input)?;
    if queries::get_business(conn, input.business_id)?.is_none() {
        return Err(AppError::NotFound(format!("Business {}", input.business_id)));
    }

    let id = queries::insert_service(
        conn,
        input.business_id,
        &name,
        input.description.as_deref(),
        input.duration_minutes,
        input.price_cents,
    )?;

    // Inserted rows default to active
    if input.is_active == Some(false) {
        let mut service = get_service(conn, id)?;
        service.is_active = false;
        queries::update_service(conn, &service)?;
    }

    tracing::info!(
        service_id = id,
        business_id = input.business_id,
        duration_minutes = input.duration_minutes,
        "service created"
    );
    get_service(conn, id)
}

/// Moving a service to another business is not supported; `business_id`
/// must match the stored row.
pub fn update_service(conn: &Connection, id: i64, input: &ServiceInput) -> Result<Service, AppError> {
    let name = validate(input)?;
    let mut service = get_service(conn, id)?;
    if service.business_id != input.business_id {
        return Err(AppError::Validation(
            "A service cannot be moved to another business".to_string(),
        ));
    }

    service.name = name;
    service.description = input.description.clone();
    service.duration_minutes = input.duration_minutes;
    service.price_cents = input.price_cents;
    if let Some(active) = input.is_active {
        service.is_active = active;
    }

    queries::update_service(conn, &service)?;
    get_service(conn, id)
}

pub fn delete_service(conn: &Connection, id: i64) -> Result<(), AppError> {
    get_service(conn, id)?;
    if queries::count_bookings_for_service(conn, id)? > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a service that has bookings; deactivate it instead".to_string(),
        ));
    }
    queries::delete_service(conn, id)?;
    tracing::info!(service_id = id, "service deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup() -> (Connection, i64) {
        let conn = db::init_db(":memory:").unwrap();
        let business_id = queries::insert_business(&conn, "Salon", None, None, None).unwrap();
        (conn, business_id)
    }

    fn input(business_id: i64, duration: i64, price: i64) -> ServiceInput {
        ServiceInput {
            business_id,
            name: "Trim".to_string(),
            description: None,
            duration_minutes: duration,
            price_cents: price,
            is_active: None,
        }
    }

    #[test]
    fn test_validation_messages() {
        let (conn, business_id) = setup();
        let err = create_service(&conn, &input(business_id, 0, 100)).unwrap_err();
        assert_eq!(err.to_string(), "Duration must be greater than 0");

        let err = create_service(&conn, &input(business_id, 30, -1)).unwrap_err();
        assert_eq!(err.to_string(), "Price cannot be negative");
    }

    #[test]
    fn test_duration_longer_than_a_day_rejected() {
        let (conn, business_id) = setup();
        create_service(&conn, &input(business_id, MAX_DURATION_MINUTES, 0)).unwrap();

        for duration in [MAX_DURATION_MINUTES + 1, i64::MAX] {
            let err = create_service(&conn, &input(business_id, duration, 0)).unwrap_err();
            assert_eq!(err.to_string(), "Duration cannot exceed 1440 minutes");
        }

        let service = create_service(&conn, &input(business_id, 30, 0)).unwrap();
        let err = update_service(&conn, service.id, &input(business_id, i64::MAX, 0)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_create_reports_business_name() {
        let (conn, business_id) = setup();
        let service = create_service(&conn, &input(business_id, 45, 3000)).unwrap();
        assert_eq!(service.business_name.as_deref(), Some("Salon"));
        assert!(service.is_active);
        assert_eq!(service.duration(), Some(chrono::Duration::minutes(45)));
    }

    #[test]
    fn test_create_for_missing_business() {
        let (conn, _) = setup();
        let err = create_service(&conn, &input(99, 30, 0)).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_update_can_deactivate() {
        let (conn, business_id) = setup();
        let service = create_service(&conn, &input(business_id, 30, 0)).unwrap();

        let mut change = input(business_id, 60, 500);
        change.is_active = Some(false);
        let updated = update_service(&conn, service.id, &change).unwrap();
        assert_eq!(updated.duration_minutes, 60);
        assert!(!updated.is_active);

        let other = queries::insert_business(&conn, "Barber", None, None, None).unwrap();
        let err = update_service(&conn, service.id, &input(other, 30, 0)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
