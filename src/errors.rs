use crate::models::Role;
use crate::services::workflow::TransitionError;

pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("requires the {required} role, logged in as {actual}")]
    WrongRole { required: Role, actual: Role },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("session is no longer valid")]
    Unauthorized,

    #[error("backend rejected request ({status})")]
    Backend { status: u16, message: Option<String> },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("local storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Raised locally, before any request was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ClientError::NotLoggedIn
                | ClientError::WrongRole { .. }
                | ClientError::Validation(_)
                | ClientError::Transition(_)
        )
    }

    /// The session is gone and the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::NotLoggedIn | ClientError::WrongRole { .. } | ClientError::Unauthorized
        )
    }

    /// Banner text shown next to the control that triggered the request.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NotLoggedIn | ClientError::Unauthorized => {
                "Please log in to continue.".to_string()
            }
            ClientError::WrongRole { required, .. } => {
                let article = if *required == Role::Admin { "an" } else { "a" };
                format!("Please log in as {article} {required} to continue.")
            }
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Transition(e) => e.to_string(),
            ClientError::Backend {
                message: Some(msg), ..
            } => msg.clone(),
            ClientError::Backend { message: None, .. }
            | ClientError::Transport(_)
            | ClientError::Decode(_)
            | ClientError::Storage(_)
            | ClientError::Config(_) => FALLBACK_MESSAGE.to_string(),
        }
    }
}
