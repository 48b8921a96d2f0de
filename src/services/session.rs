use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries::{self, TOKEN_KEY, USERNAME_KEY};
use crate::errors::ClientError;
use crate::models::{Actor, Role};
use crate::services::api::MarketplaceApi;

// ── Token claims ──

#[derive(Debug, Default, Deserialize)]
struct Claims {
    sub: Option<String>,
    role: Option<String>,
    #[serde(default)]
    roles: Vec<serde_json::Value>,
    #[serde(default)]
    authorities: Vec<serde_json::Value>,
}

/// Username and role carried in the access token's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: Option<String>,
    pub role: Role,
}

fn authority_name(value: &serde_json::Value) -> Option<&str> {
    value
        .as_str()
        .or_else(|| value.get("authority").and_then(|v| v.as_str()))
}

/// Reads the claims of a JWT-shaped token without verifying its signature;
/// the backend is the one that checks it.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;

    let role = claims
        .role
        .as_deref()
        .and_then(Role::parse)
        .or_else(|| {
            claims
                .roles
                .iter()
                .chain(claims.authorities.iter())
                .filter_map(authority_name)
                .find_map(Role::parse)
        })?;

    Some(TokenClaims {
        subject: claims.sub,
        role,
    })
}

// ── Navigation ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Customer,
    Provider,
    Admin,
}

impl Dashboard {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Customer => Dashboard::Customer,
            Role::Provider => Dashboard::Provider,
            Role::Admin => Dashboard::Admin,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Dashboard::Customer => "/customer/dashboard",
            Dashboard::Provider => "/provider/dashboard",
            Dashboard::Admin => "/admin/dashboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const fn nav(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

/// Menu entries for the current actor; guests get the public menu.
pub fn navigation(actor: Option<&Actor>) -> Vec<NavItem> {
    match actor.map(|a| a.role) {
        None => vec![
            nav("Home", "/"),
            nav("Services", "/services"),
            nav("Log in", "/login"),
            nav("Sign up", "/signup"),
        ],
        Some(Role::Customer) => vec![
            nav("Home", "/"),
            nav("Services", "/services"),
            nav("My bookings", Dashboard::Customer.path()),
            nav("Profile", "/customer/profile"),
            nav("Log out", "/logout"),
        ],
        Some(Role::Provider) => vec![
            nav("Home", "/"),
            nav("Booking requests", Dashboard::Provider.path()),
            nav("Profile", "/provider/profile"),
            nav("Log out", "/logout"),
        ],
        Some(Role::Admin) => vec![
            nav("Home", "/"),
            nav("Users", "/admin/users"),
            nav("Customers", "/admin/customers"),
            nav("Providers", "/admin/providers"),
            nav("Services", "/admin/services"),
            nav("Log out", "/logout"),
        ],
    }
}

// ── Gate ──

/// What a protected view should render.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Loading,
    LoginRequired,
    Redirect(Dashboard),
    Allow(Actor),
}

/// Session state for one client. Constructed from local storage at start-up
/// and passed explicitly to every view.
pub struct SessionGate {
    store: Connection,
    actor: Option<Actor>,
    loading: bool,
}

impl SessionGate {
    pub fn new(store: Connection) -> Self {
        Self {
            store,
            actor: None,
            loading: true,
        }
    }

    /// Rebuilds the actor from the persisted token. Ends the loading phase
    /// whatever the outcome.
    pub fn restore(&mut self) -> Result<Option<&Actor>, ClientError> {
        let result = self.read_persisted();
        self.loading = false;
        self.actor = result?;
        match &self.actor {
            Some(actor) => tracing::info!("restored session for {} ({})", actor.username, actor.role),
            None => tracing::debug!("no stored session"),
        }
        Ok(self.actor.as_ref())
    }

    fn read_persisted(&self) -> Result<Option<Actor>, ClientError> {
        let Some(token) = queries::get_value(&self.store, TOKEN_KEY)? else {
            return Ok(None);
        };
        let stored_username = queries::get_value(&self.store, USERNAME_KEY)?;

        let Some(claims) = decode_claims(&token) else {
            tracing::warn!("stored token carries no readable role, discarding it");
            self.forget_stored_session()?;
            return Ok(None);
        };
        let Some(username) = stored_username.or(claims.subject) else {
            tracing::warn!("stored session has no username, ignoring it");
            return Ok(None);
        };

        Ok(Some(Actor {
            username,
            role: claims.role,
            token,
        }))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// Access decision for a view that needs `required`.
    pub fn gate(&self, required: Role) -> GateDecision {
        if self.loading {
            return GateDecision::Loading;
        }
        match &self.actor {
            None => GateDecision::LoginRequired,
            Some(actor) if actor.role == required => GateDecision::Allow(actor.clone()),
            Some(actor) => GateDecision::Redirect(Dashboard::for_role(actor.role)),
        }
    }

    pub async fn login(
        &mut self,
        api: &dyn MarketplaceApi,
        username: &str,
        password: &str,
    ) -> Result<&Actor, ClientError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Username and password are required.".to_string(),
            ));
        }

        let token = api.login(username, password).await?;
        let claims = decode_claims(&token)
            .ok_or_else(|| ClientError::Decode("access token carries no role".to_string()))?;

        queries::set_value(&self.store, TOKEN_KEY, &token)?;
        queries::set_value(&self.store, USERNAME_KEY, username)?;

        tracing::info!("logged in as {username} ({})", claims.role);
        self.loading = false;
        Ok(&*self.actor.insert(Actor {
            username: username.to_string(),
            role: claims.role,
            token,
        }))
    }

    /// Best-effort: the local session is dropped even when the backend call
    /// fails. Returns the backend error, if any, for display.
    pub async fn logout(&mut self, api: &dyn MarketplaceApi) -> Result<Option<ClientError>, ClientError> {
        let backend_error = match self.actor.take() {
            Some(actor) => match api.logout(&actor.token).await {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!("backend logout failed, clearing local session anyway: {e}");
                    Some(e)
                }
            },
            None => None,
        };

        self.forget_stored_session()?;
        tracing::info!("logged out");
        Ok(backend_error)
    }

    /// Drops a session the backend no longer accepts.
    pub fn invalidate(&mut self) -> Result<(), ClientError> {
        if let Some(actor) = self.actor.take() {
            tracing::warn!("session for {} rejected by backend", actor.username);
        }
        self.forget_stored_session()
    }

    fn forget_stored_session(&self) -> Result<(), ClientError> {
        queries::remove_value(&self.store, TOKEN_KEY)?;
        queries::remove_value(&self.store, USERNAME_KEY)?;
        Ok(())
    }

    /// Wipes everything this client keeps locally.
    pub fn clear_local_data(&mut self) -> Result<usize, ClientError> {
        self.actor = None;
        let removed = queries::clear_all(&self.store)?;
        tracing::info!("cleared {removed} local entries");
        Ok(removed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;
    use crate::services::api::mock::MockApi;

    pub(crate) fn make_token(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    fn auth_api(role: &str) -> MockApi {
        MockApi::new(vec![])
            .with_token(make_token(serde_json::json!({"sub": "alice", "role": role})))
    }

    #[test]
    fn test_decode_claims_variants() {
        let token = make_token(serde_json::json!({"sub": "bob", "role": "ROLE_PROVIDER"}));
        assert_eq!(
            decode_claims(&token),
            Some(TokenClaims {
                subject: Some("bob".to_string()),
                role: Role::Provider,
            })
        );

        let token = make_token(serde_json::json!({"sub": "root", "authorities": [{"authority": "ROLE_ADMIN"}]}));
        assert_eq!(decode_claims(&token).map(|c| c.role), Some(Role::Admin));

        let token = make_token(serde_json::json!({"roles": ["SCOPE_read", "ROLE_CUSTOMER"]}));
        assert_eq!(decode_claims(&token).map(|c| c.role), Some(Role::Customer));

        assert_eq!(decode_claims("opaque-token"), None);
        assert_eq!(decode_claims(&make_token(serde_json::json!({"sub": "x"}))), None);
    }

    #[test]
    fn test_gate_loading_before_restore() {
        let gate = SessionGate::new(db::init_db(":memory:").unwrap());
        assert!(gate.is_loading());
        assert_eq!(gate.gate(Role::Customer), GateDecision::Loading);
    }

    #[test]
    fn test_restore_without_token_requires_login() {
        let mut gate = SessionGate::new(db::init_db(":memory:").unwrap());
        assert!(gate.restore().unwrap().is_none());
        assert!(!gate.is_loading());
        assert_eq!(gate.gate(Role::Customer), GateDecision::LoginRequired);
    }

    #[test]
    fn test_restore_from_storage_and_redirect_on_mismatch() {
        let conn = db::init_db(":memory:").unwrap();
        let token = make_token(serde_json::json!({"sub": "ignored", "role": "ROLE_PROVIDER"}));
        queries::set_value(&conn, TOKEN_KEY, &token).unwrap();
        queries::set_value(&conn, USERNAME_KEY, "bob").unwrap();

        let mut gate = SessionGate::new(conn);
        let actor = gate.restore().unwrap().cloned().unwrap();
        assert_eq!(actor.username, "bob");
        assert_eq!(actor.role, Role::Provider);

        assert_eq!(gate.gate(Role::Provider), GateDecision::Allow(actor));
        assert_eq!(
            gate.gate(Role::Customer),
            GateDecision::Redirect(Dashboard::Provider)
        );
    }

    #[test]
    fn test_unreadable_stored_token_is_discarded() {
        let conn = db::init_db(":memory:").unwrap();
        queries::set_value(&conn, TOKEN_KEY, "opaque-token").unwrap();
        queries::set_value(&conn, USERNAME_KEY, "alice").unwrap();

        let mut gate = SessionGate::new(conn);
        assert!(gate.restore().unwrap().is_none());
        assert_eq!(gate.gate(Role::Customer), GateDecision::LoginRequired);
        assert_eq!(queries::get_value(&gate.store, TOKEN_KEY).unwrap(), None);
        assert_eq!(queries::get_value(&gate.store, USERNAME_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let api = auth_api("ROLE_CUSTOMER");
        let mut gate = SessionGate::new(db::init_db(":memory:").unwrap());

        let actor = gate.login(&api, "alice", "pw").await.unwrap().clone();
        assert_eq!(actor.role, Role::Customer);
        assert_eq!(
            queries::get_value(&gate.store, USERNAME_KEY).unwrap(),
            Some("alice".to_string())
        );

        // A fresh gate over the same storage restores the same actor.
        let store = std::mem::replace(&mut gate.store, db::init_db(":memory:").unwrap());
        let mut restored = SessionGate::new(store);
        assert_eq!(restored.restore().unwrap(), Some(&actor));
    }

    #[tokio::test]
    async fn test_login_failure_keeps_logged_out() {
        let api = auth_api("ROLE_CUSTOMER");
        let mut gate = SessionGate::new(db::init_db(":memory:").unwrap());
        gate.restore().unwrap();

        let err = gate.login(&api, "alice", "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Bad credentials");
        assert!(gate.current_actor().is_none());

        let err = gate.login(&api, "  ", "pw").await.unwrap_err();
        assert!(err.is_precondition());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let api = auth_api("ROLE_CUSTOMER");
        let mut gate = SessionGate::new(db::init_db(":memory:").unwrap());
        gate.login(&api, "alice", "pw").await.unwrap();
        api.fail_next(500, None);

        let backend_error = gate.logout(&api).await.unwrap();
        assert!(backend_error.is_some());
        assert_eq!(api.count("logout"), 1);
        assert!(gate.current_actor().is_none());
        assert_eq!(queries::get_value(&gate.store, TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_local_data() {
        let api = auth_api("ROLE_ADMIN");
        let mut gate = SessionGate::new(db::init_db(":memory:").unwrap());
        gate.login(&api, "root", "pw").await.unwrap();

        assert_eq!(gate.clear_local_data().unwrap(), 2);
        assert!(gate.current_actor().is_none());
        assert_eq!(gate.gate(Role::Admin), GateDecision::LoginRequired);
    }

    #[test]
    fn test_navigation_per_role() {
        let guest = navigation(None);
        assert!(guest.iter().any(|i| i.path == "/login"));

        let provider = Actor {
            username: "bob".to_string(),
            role: Role::Provider,
            token: "t".to_string(),
        };
        let items = navigation(Some(&provider));
        assert!(items.iter().any(|i| i.path == Dashboard::Provider.path()));
        assert!(!items.iter().any(|i| i.path == "/login"));
    }
}
