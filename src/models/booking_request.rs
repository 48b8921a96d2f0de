use chrono::NaiveDateTime;
use serde::Serialize;

pub const MIN_AMOUNT: i64 = 100;
pub const MAX_AMOUNT: i64 = 10_000;

/// Wire format of `dateTime` in booking requests (`dd-MM-yyyy HH:mm`).
pub const DATE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M";

/// A customer's request to book a provider. Path parameters (`typeOfJob`,
/// customer) travel in the URL; the rest is the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub type_of_job: String,
    pub provider_username: String,
    pub location: String,
    pub date_time: NaiveDateTime,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequestBody {
    pub provider_id: String,
    pub location: String,
    pub date_time: String,
    pub amount: i64,
}

impl BookingRequest {
    pub fn body(&self) -> BookingRequestBody {
        BookingRequestBody {
            provider_id: self.provider_username.clone(),
            location: self.location.clone(),
            date_time: self.date_time.format(DATE_TIME_FORMAT).to_string(),
            amount: self.amount,
        }
    }
}

pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M"))
        .ok()
}
