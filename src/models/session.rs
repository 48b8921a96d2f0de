use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "ROLE_CUSTOMER")]
    Customer,
    #[serde(rename = "ROLE_PROVIDER")]
    Provider,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "ROLE_CUSTOMER",
            Role::Provider => "ROLE_PROVIDER",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    /// Accepts both the backend authority name and the bare role name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().trim_start_matches("ROLE_") {
            "CUSTOMER" => Some(Role::Customer),
            "PROVIDER" => Some(Role::Provider),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// The authenticated party on whose behalf calls are made.
#[derive(Clone, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub role: Role,
    pub token: String,
}

// Keeps the bearer token out of logs and panics.
impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_variants() {
        assert_eq!(Role::parse("ROLE_CUSTOMER"), Some(Role::Customer));
        assert_eq!(Role::parse("provider"), Some(Role::Provider));
        assert_eq!(Role::parse(" role_admin "), Some(Role::Admin));
        assert_eq!(Role::parse("ROLE_GUEST"), None);
    }

    #[test]
    fn test_actor_debug_redacts_token() {
        let actor = Actor {
            username: "alice".to_string(),
            role: Role::Customer,
            token: "secret-token".to_string(),
        };
        let printed = format!("{actor:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("secret-token"));
    }
}
