pub mod admin_auth;
pub mod availability;
pub mod booking;
pub mod businesses;
pub mod customers;
pub mod messaging;
pub mod opening_hours;
pub mod otp;
pub mod overlap;
pub mod service_catalog;
pub mod sweeper;
