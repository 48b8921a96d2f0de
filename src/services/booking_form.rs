use crate::errors::ClientError;
use crate::models::booking_request::{parse_date_time, MAX_AMOUNT, MIN_AMOUNT};
use crate::models::{Actor, BookingRequest, Role};
use crate::services::api::MarketplaceApi;
use crate::services::booking_list::authorize;

/// The "book this provider" form. Inputs are kept as typed by the user and
/// only turned into a request on submit.
#[derive(Debug, Clone, Default)]
pub struct BookServiceForm {
    pub provider: String,
    pub type_of_job: String,
    pub location: String,
    pub date_time: String,
    pub amount: String,
    error: Option<String>,
    notice: Option<String>,
}

fn required(value: &str, field: &str) -> Result<String, ClientError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::Validation(format!("{field} is required.")));
    }
    Ok(value.to_string())
}

impl BookServiceForm {
    pub fn for_provider(provider: &str, type_of_job: &str) -> Self {
        Self {
            provider: provider.to_string(),
            type_of_job: type_of_job.to_string(),
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn validate(&self) -> Result<BookingRequest, ClientError> {
        let provider_username = required(&self.provider, "Provider")?;
        let type_of_job = required(&self.type_of_job, "Type of job")?;
        let location = required(&self.location, "Location")?;

        let date_time = parse_date_time(&self.date_time).ok_or_else(|| {
            ClientError::Validation("Date and time must look like 25-12-2025 14:30.".to_string())
        })?;

        let amount: i64 = self.amount.trim().parse().map_err(|_| {
            ClientError::Validation("Amount must be a whole number.".to_string())
        })?;
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) {
            return Err(ClientError::Validation(format!(
                "Amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}."
            )));
        }

        Ok(BookingRequest {
            type_of_job,
            provider_username,
            location,
            date_time,
            amount,
        })
    }

    pub async fn submit(
        &mut self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
    ) -> Result<(), ClientError> {
        self.error = None;
        self.notice = None;

        let result = self.try_submit(api, actor).await;
        match &result {
            Ok(()) => {
                self.notice = Some("Booking request sent.".to_string());
                self.location.clear();
                self.date_time.clear();
                self.amount.clear();
            }
            Err(e) => self.error = Some(e.user_message()),
        }
        result
    }

    async fn try_submit(
        &self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
    ) -> Result<(), ClientError> {
        let actor = authorize(actor, Role::Customer)?;
        let request = self.validate()?;

        api.request_booking(actor, &request).await?;

        tracing::info!(
            "{} requested {} from {}",
            actor.username,
            request.type_of_job,
            request.provider_username
        );
        Ok(())
    }
}
