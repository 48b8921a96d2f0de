use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub storage_path: String,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("GOLOCAL_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            storage_path: env::var("GOLOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "golocal.db".to_string()),
            timeout: env::var("GOLOCAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
        }
    }
}
