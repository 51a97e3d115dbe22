pub mod booking;
pub mod business;
pub mod customer;
pub mod opening_hour;
pub mod otp;
pub mod service;
pub mod session;

pub use booking::{Booking, BookingStatus};
pub use business::Business;
pub use customer::Customer;
pub use opening_hour::OpeningHour;
pub use otp::OtpCode;
pub use service::Service;
pub use session::AdminSession;
