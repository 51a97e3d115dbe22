pub mod admin;
pub mod bookings;
pub mod businesses;
pub mod customers;
pub mod health;
pub mod opening_hours;
pub mod otp;
pub mod services;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/validate-session", get(admin::validate_session))
        .route("/api/admin/logout", post(admin::logout))
        .route(
            "/api/businesses",
            get(businesses::list_businesses).post(businesses::create_business),
        )
        .route(
            "/api/businesses/:id",
            get(businesses::get_business)
                .put(businesses::update_business)
                .delete(businesses::delete_business),
        )
        .route("/api/services", post(services::create_service))
        .route(
            "/api/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/api/services/business/:business_id",
            get(services::list_for_business),
        )
        .route(
            "/api/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/api/customers/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/api/opening-hours", post(opening_hours::create_opening_hour))
        .route(
            "/api/opening-hours/:id",
            get(opening_hours::get_opening_hour)
                .put(opening_hours::update_opening_hour)
                .delete(opening_hours::delete_opening_hour),
        )
        .route(
            "/api/opening-hours/business/:business_id",
            get(opening_hours::list_for_business),
        )
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/availability", get(bookings::check_availability))
        .route("/api/bookings/slots", get(bookings::available_slots))
        .route(
            "/api/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::cancel_booking),
        )
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/bookings/business/:id", get(bookings::list_for_business))
        .route("/api/bookings/customer/:id", get(bookings::list_for_customer))
        .route("/api/otp/request", post(otp::request_otp))
        .route("/api/otp/verify", post(otp::verify_otp))
        .with_state(state)
}
