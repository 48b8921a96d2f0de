pub mod http;

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::models::{Actor, AdminResource, Booking, BookingRequest, BookingStatus};
use crate::services::workflow::BookingAction;

/// Status changes the backend exposes as `PUT /api/bookings/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Accept,
    Reject,
    Complete,
    Revoke,
}

impl StatusChange {
    /// Rating has its own endpoint and maps to no status change.
    pub fn for_action(action: BookingAction) -> Option<Self> {
        match action {
            BookingAction::Accept => Some(StatusChange::Accept),
            BookingAction::Reject => Some(StatusChange::Reject),
            BookingAction::Complete => Some(StatusChange::Complete),
            BookingAction::Revoke => Some(StatusChange::Revoke),
            BookingAction::Rate => None,
        }
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            StatusChange::Accept => "accept-request",
            StatusChange::Reject => "reject-request",
            StatusChange::Complete => "complete",
            StatusChange::Revoke => "revoke-booking",
        }
    }
}

/// The REST backend that owns bookings, ratings and accounts.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Returns the access token.
    async fn login(&self, username: &str, password: &str) -> Result<String, ClientError>;

    async fn logout(&self, token: &str) -> Result<(), ClientError>;

    async fn customer_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, ClientError>;

    async fn provider_bookings(&self, actor: &Actor) -> Result<Vec<Booking>, ClientError>;

    async fn request_booking(
        &self,
        actor: &Actor,
        request: &BookingRequest,
    ) -> Result<(), ClientError>;

    async fn change_status(
        &self,
        actor: &Actor,
        booking_id: &str,
        change: StatusChange,
    ) -> Result<(), ClientError>;

    /// Rates the other party of a completed booking as `actor`.
    async fn rate(&self, actor: &Actor, booking_id: &str, value: u8) -> Result<(), ClientError>;

    async fn admin_find(
        &self,
        actor: &Actor,
        resource: AdminResource,
        key: &str,
    ) -> Result<serde_json::Value, ClientError>;

    async fn admin_create(
        &self,
        actor: &Actor,
        resource: AdminResource,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError>;

    async fn admin_update(
        &self,
        actor: &Actor,
        resource: AdminResource,
        key: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError>;
}
