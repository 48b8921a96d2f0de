use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{MarketplaceApi, StatusChange};
use crate::errors::ClientError;
use crate::models::{Actor, AdminResource, Booking, BookingRequest, BookingStatus, Role};

pub struct HttpMarketplaceApi {
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(alias = "token")]
    access_token: String,
}

impl HttpMarketplaceApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid API URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "API URL cannot be used as a base: {base_url}"
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            client: builder.build()?,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("API URL cannot be used as a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn bearer(actor: &Actor) -> Result<&str, ClientError> {
    if actor.token.trim().is_empty() {
        return Err(ClientError::NotLoggedIn);
    }
    Ok(&actor.token)
}

/// Pulls a human-readable message out of an error body, if the backend sent one.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(msg) = value.as_str() {
            return Some(msg.to_string()).filter(|m| !m.trim().is_empty());
        }
        return ["message", "error", "detail"]
            .iter()
            .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(|m| m.trim())
            .find(|m| !m.is_empty())
            .map(|m| m.to_string());
    }

    // Plain-text bodies are shown as-is; HTML error pages are not.
    if trimmed.starts_with('<') {
        return None;
    }
    Some(trimmed.to_string())
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    check_status_as(resp, true).await
}

/// A 401 on a bearer-authenticated call means the session is gone; on the
/// login call it is just a rejected credential.
async fn check_status_as(
    resp: reqwest::Response,
    authenticated: bool,
) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if authenticated && status == StatusCode::UNAUTHORIZED {
        tracing::warn!("backend refused token ({status})");
        return Err(ClientError::Unauthorized);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = extract_message(&body);
    tracing::warn!("backend rejected request ({status}): {}", message.as_deref().unwrap_or("no message"));
    Err(ClientError::Backend {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Like `read_json`, but an empty 2xx body reads as JSON null.
async fn read_optional_json(resp: reqwest::Response) -> Result<serde_json::Value, ClientError> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceApi {
    // POST /api/auth/login
    async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let url = self.endpoint(&["api", "auth", "login"])?;
        tracing::debug!("POST {url}");

        let resp = self
            .client
            .post(url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        let resp = check_status_as(resp, false).await?;
        let bytes = resp.bytes().await?;
        let body: LoginResponse =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?;
        if body.access_token.trim().is_empty() {
            return Err(ClientError::Decode("empty access token".to_string()));
        }
        Ok(body.access_token)
    }

    // POST /api/auth/logout
    async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "auth", "logout"])?;
        tracing::debug!("POST {url}");

        let resp = self.client.post(url).bearer_auth(token).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    // GET /api/bookings/get-booked-requests/:customer?status=
    async fn customer_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, ClientError> {
        let token = bearer(actor)?;
        let mut url = self.endpoint(&["api", "bookings", "get-booked-requests", &actor.username])?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status.as_str());
        }
        tracing::debug!("GET {url}");

        let resp = self.client.get(url).bearer_auth(token).send().await?;
        read_json(resp).await
    }

    // GET /api/bookings/all-received-requests/:provider
    async fn provider_bookings(&self, actor: &Actor) -> Result<Vec<Booking>, ClientError> {
        let token = bearer(actor)?;
        let url = self.endpoint(&["api", "bookings", "all-received-requests", &actor.username])?;
        tracing::debug!("GET {url}");

        let resp = self.client.get(url).bearer_auth(token).send().await?;
        read_json(resp).await
    }

    // POST /api/bookings/book-request/:type_of_job/:customer
    async fn request_booking(
        &self,
        actor: &Actor,
        request: &BookingRequest,
    ) -> Result<(), ClientError> {
        let token = bearer(actor)?;
        let url = self.endpoint(&[
            "api",
            "bookings",
            "book-request",
            &request.type_of_job,
            &actor.username,
        ])?;
        tracing::debug!("POST {url}");

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request.body())
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    // PUT /api/bookings/{accept-request,reject-request,complete,revoke-booking}/:id
    async fn change_status(
        &self,
        actor: &Actor,
        booking_id: &str,
        change: StatusChange,
    ) -> Result<(), ClientError> {
        let token = bearer(actor)?;
        let url = self.endpoint(&["api", "bookings", change.path_segment(), booking_id])?;
        tracing::debug!("PUT {url}");

        let resp = self.client.put(url).bearer_auth(token).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    // POST /api/customer/rate-provider/:customer/:booking/:value
    // POST /api/provider/rate-customer/:provider/:booking/:value
    async fn rate(&self, actor: &Actor, booking_id: &str, value: u8) -> Result<(), ClientError> {
        let token = bearer(actor)?;
        let (scope, action) = match actor.role {
            Role::Customer => ("customer", "rate-provider"),
            Role::Provider => ("provider", "rate-customer"),
            Role::Admin => {
                return Err(ClientError::WrongRole {
                    required: Role::Customer,
                    actual: Role::Admin,
                })
            }
        };
        let value = value.to_string();
        let url = self.endpoint(&["api", scope, action, &actor.username, booking_id, &value])?;
        tracing::debug!("POST {url}");

        let resp = self.client.post(url).bearer_auth(token).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    // GET /api/admin/:resource/:key
    async fn admin_find(
        &self,
        actor: &Actor,
        resource: AdminResource,
        key: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let token = bearer(actor)?;
        let url = self.endpoint(&["api", "admin", resource.as_str(), key])?;
        tracing::debug!("GET {url}");

        let resp = self.client.get(url).bearer_auth(token).send().await?;
        read_optional_json(resp).await
    }

    // POST /api/admin/:resource
    async fn admin_create(
        &self,
        actor: &Actor,
        resource: AdminResource,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let token = bearer(actor)?;
        let url = self.endpoint(&["api", "admin", resource.as_str()])?;
        tracing::debug!("POST {url}");

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        read_optional_json(resp).await
    }

    // PUT /api/admin/:resource/:key
    async fn admin_update(
        &self,
        actor: &Actor,
        resource: AdminResource,
        key: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let token = bearer(actor)?;
        let url = self.endpoint(&["api", "admin", resource.as_str(), key])?;
        tracing::debug!("PUT {url}");

        let resp = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        read_optional_json(resp).await
    }
}
