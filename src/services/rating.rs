use crate::errors::ClientError;
use crate::models::rating::{is_valid_rating, MAX_RATING, MIN_RATING};
use crate::models::{Actor, Booking, Role};
use crate::services::api::MarketplaceApi;
use crate::services::booking_list::{authorize, BookingListView};
use crate::services::workflow::{self, BookingAction};

#[derive(Debug, Clone, PartialEq)]
pub enum DialogState {
    Closed,
    Open { booking_id: String },
    Submitting { booking_id: String },
}

/// Collects a 1-5 rating for one completed booking. The chosen value and
/// comment survive a failed submit so the user can retry as-is.
pub struct RatingDialog {
    state: DialogState,
    value: u8,
    comment: String,
    error: Option<String>,
}

impl Default for RatingDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingDialog {
    pub fn new() -> Self {
        Self {
            state: DialogState::Closed,
            value: 0,
            comment: String::new(),
            error: None,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Opens the dialog for a booking `role` may still rate.
    pub fn open(&mut self, booking: &Booking, role: Role) -> Result<(), ClientError> {
        workflow::check_action(booking, role, BookingAction::Rate)?;
        self.state = DialogState::Open {
            booking_id: booking.booking_id.clone(),
        };
        self.value = 0;
        self.comment.clear();
        self.error = None;
        Ok(())
    }

    pub fn set_value(&mut self, value: u8) {
        self.value = value;
        self.error = None;
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_string();
    }

    pub fn close(&mut self) {
        self.state = DialogState::Closed;
        self.value = 0;
        self.comment.clear();
        self.error = None;
    }

    /// Sends the rating. On success the dialog closes and `list` is
    /// refetched; on failure the dialog stays open with the error shown.
    /// A dialog left in `Submitting` by a cancelled call can be submitted
    /// again.
    pub async fn submit(
        &mut self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
        list: &mut BookingListView,
    ) -> Result<(), ClientError> {
        let booking_id = match &self.state {
            DialogState::Open { booking_id } | DialogState::Submitting { booking_id } => {
                booking_id.clone()
            }
            DialogState::Closed => {
                return Err(ClientError::Validation("No booking selected for rating.".to_string()))
            }
        };
        self.error = None;

        if !is_valid_rating(self.value) {
            let err = ClientError::Validation(format!(
                "Please select a rating between {MIN_RATING} and {MAX_RATING}."
            ));
            self.error = Some(err.user_message());
            return Err(err);
        }

        let actor = match authorize(actor, list.scope().required_role()) {
            Ok(actor) => actor,
            Err(e) => {
                self.error = Some(e.user_message());
                return Err(e);
            }
        };

        self.state = DialogState::Submitting {
            booking_id: booking_id.clone(),
        };
        match api.rate(actor, &booking_id, self.value).await {
            Ok(()) => {
                tracing::info!("{} rated booking {booking_id} with {}", actor.username, self.value);
                if !self.comment.trim().is_empty() {
                    tracing::debug!("rating comment for {booking_id} is not sent, the backend takes none");
                }
                self.close();
                if let Err(e) = list.refresh(api, Some(actor)).await {
                    tracing::warn!("refetch after rating {booking_id} failed: {e}");
                }
                Ok(())
            }
            Err(e) => {
                self.state = DialogState::Open { booking_id };
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }
}
