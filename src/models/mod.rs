pub mod admin;
pub mod booking;
pub mod booking_request;
pub mod rating;
pub mod session;

pub use admin::AdminResource;
pub use booking::{Booking, BookingStatus, PartyRef, ServiceRef, StatusFilter};
pub use booking_request::BookingRequest;
pub use rating::Rating;
pub use session::{Actor, Role};
