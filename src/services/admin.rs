use serde_json::Value;

use crate::errors::ClientError;
use crate::models::{Actor, AdminResource, Role};
use crate::services::api::MarketplaceApi;
use crate::services::booking_list::authorize;

/// Search/create/update screens of the admin dashboard. Holds the last
/// record shown and the last error.
#[derive(Debug, Default)]
pub struct AdminConsole {
    record: Option<Value>,
    error: Option<String>,
}

fn required_key(key: &str) -> Result<&str, ClientError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ClientError::Validation("A username or id is required.".to_string()));
    }
    Ok(key)
}

fn object_body(body: &Value) -> Result<(), ClientError> {
    match body {
        Value::Object(map) if !map.is_empty() => Ok(()),
        _ => Err(ClientError::Validation(
            "Details must be a non-empty JSON object.".to_string(),
        )),
    }
}

impl AdminConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> Option<&Value> {
        self.record.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn settle(&mut self, result: Result<Value, ClientError>) -> Result<&Value, ClientError> {
        match result {
            Ok(record) => {
                self.error = None;
                Ok(&*self.record.insert(record))
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn find(
        &mut self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
        resource: AdminResource,
        key: &str,
    ) -> Result<&Value, ClientError> {
        self.record = None;
        let result = async {
            let actor = authorize(actor, Role::Admin)?;
            let key = required_key(key)?;
            api.admin_find(actor, resource, key).await
        }
        .await;
        self.settle(result)
    }

    pub async fn create(
        &mut self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
        resource: AdminResource,
        body: &Value,
    ) -> Result<&Value, ClientError> {
        let result = async {
            let actor = authorize(actor, Role::Admin)?;
            object_body(body)?;
            let created = api.admin_create(actor, resource, body).await?;
            tracing::info!("{} created a {} record", actor.username, resource.as_str());
            Ok::<_, ClientError>(created)
        }
        .await;
        self.settle(result)
    }

    pub async fn update(
        &mut self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
        resource: AdminResource,
        key: &str,
        body: &Value,
    ) -> Result<&Value, ClientError> {
        let result = async {
            let actor = authorize(actor, Role::Admin)?;
            let key = required_key(key)?;
            object_body(body)?;
            let updated = api.admin_update(actor, resource, key, body).await?;
            tracing::info!("{} updated {} {key}", actor.username, resource.as_str());
            Ok::<_, ClientError>(updated)
        }
        .await;
        self.settle(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::api::mock::MockApi;
    use crate::services::booking_list::tests::actor;

    #[tokio::test]
    async fn test_non_admin_is_rejected_locally() {
        let api = MockApi::new(vec![]);
        let alice = actor("alice", Role::Customer);
        let mut console = AdminConsole::new();

        let err = console
            .find(&api, Some(&alice), AdminResource::Users, "bob")
            .await
            .unwrap_err();
        assert!(err.requires_login());
        assert_eq!(console.error(), Some("Please log in as an admin to continue."));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_find_create_update() {
        let api = MockApi::new(vec![]);
        let root = actor("root", Role::Admin);
        let mut console = AdminConsole::new();

        let found = console
            .find(&api, Some(&root), AdminResource::Providers, " bob ")
            .await
            .unwrap()
            .clone();
        assert_eq!(found["username"], "bob");

        let body = json!({"name": "Gardening", "description": "Lawn and hedges"});
        console
            .create(&api, Some(&root), AdminResource::Services, &body)
            .await
            .unwrap();
        console
            .update(&api, Some(&root), AdminResource::Services, "7", &body)
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "admin_find:providers:bob",
                "admin_create:services",
                "admin_update:services:7",
            ]
        );
        assert_eq!(console.record(), Some(&body));
    }

    #[tokio::test]
    async fn test_invalid_input_never_sent() {
        let api = MockApi::new(vec![]);
        let root = actor("root", Role::Admin);
        let mut console = AdminConsole::new();

        assert!(console
            .update(&api, Some(&root), AdminResource::Users, "", &json!({"name": "x"}))
            .await
            .is_err());
        assert!(console
            .create(&api, Some(&root), AdminResource::Users, &json!([]))
            .await
            .is_err());
        assert!(api.calls().is_empty());
    }
}
