use serde::{Deserialize, Deserializer, Serialize};

use super::rating::Rating;
use super::session::Role;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(deserialize_with = "opaque_id")]
    pub booking_id: String,
    pub status: BookingStatus,
    pub customer: PartyRef,
    pub provider: PartyRef,
    pub service: ServiceRef,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub amount_paid: Option<f64>,
    #[serde(default)]
    pub type_of_job: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Rating the customer gave the provider for this booking.
    #[serde(default)]
    pub customer_rating: Option<Rating>,
    /// Rating the provider gave the customer for this booking.
    #[serde(default)]
    pub provider_rating: Option<Rating>,
}

impl Booking {
    /// Whether `role` has already rated the other party. Only a completed
    /// booking can count as rated.
    pub fn is_rated_by(&self, role: Role) -> bool {
        if self.status != BookingStatus::Completed {
            return false;
        }
        self.rating_by(role).is_some()
    }

    pub fn rating_by(&self, role: Role) -> Option<&Rating> {
        match role {
            Role::Customer => self.customer_rating.as_ref(),
            Role::Provider => self.provider_rating.as_ref(),
            Role::Admin => None,
        }
    }

    /// A rating attached to a booking that is not completed.
    pub fn has_stray_rating(&self) -> bool {
        self.status != BookingStatus::Completed
            && (self.customer_rating.is_some() || self.provider_rating.is_some())
    }

    pub fn party_username(&self, role: Role) -> Option<&str> {
        match role {
            Role::Customer => Some(&self.customer.username),
            Role::Provider => Some(&self.provider.username),
            Role::Admin => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartyRef {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl PartyRef {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
    #[serde(deserialize_with = "opaque_id")]
    pub service_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Requested,
    Booked,
    Rejected,
    Revoked,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Requested,
        BookingStatus::Booked,
        BookingStatus::Rejected,
        BookingStatus::Revoked,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "REQUESTED",
            BookingStatus::Booked => "BOOKED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Revoked => "REVOKED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REQUESTED" => Some(BookingStatus::Requested),
            "BOOKED" => Some(BookingStatus::Booked),
            "REJECTED" => Some(BookingStatus::Rejected),
            "REVOKED" => Some(BookingStatus::Revoked),
            "COMPLETED" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Revoked | BookingStatus::Completed
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status scope of a booking list. `All` sends no filter to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(BookingStatus),
}

impl StatusFilter {
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("ALL") {
            return Some(StatusFilter::All);
        }
        BookingStatus::parse(s).map(StatusFilter::Only)
    }

    pub fn status(&self) -> Option<BookingStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(*status),
        }
    }

    pub fn matches(&self, status: BookingStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

/// Backend ids arrive either as JSON strings or numbers; both are kept opaque.
pub(crate) fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
