use serde::{Deserialize, Serialize};

use super::booking::opaque_id;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// One party's evaluation of the other for a completed booking. Immutable
/// once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    #[serde(deserialize_with = "opaque_id")]
    pub booking_id: String,
    #[serde(default)]
    pub rater_username: Option<String>,
    #[serde(default)]
    pub rated_username: Option<String>,
    #[serde(alias = "rating")]
    pub value: u8,
}

pub fn is_valid_rating(value: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&value)
}
