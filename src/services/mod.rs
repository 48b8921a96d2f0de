pub mod admin;
pub mod api;
pub mod booking_form;
pub mod booking_list;
pub mod rating;
pub mod session;
pub mod workflow;
