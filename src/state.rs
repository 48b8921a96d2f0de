use crate::config::ClientConfig;
use crate::db;
use crate::errors::ClientError;
use crate::services::api::http::HttpMarketplaceApi;
use crate::services::api::MarketplaceApi;
use crate::services::session::SessionGate;

pub struct AppState {
    pub config: ClientConfig,
    pub api: Box<dyn MarketplaceApi>,
    pub session: SessionGate,
}

impl AppState {
    /// Opens local storage, restores any saved session and points the API
    /// client at the configured backend.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let conn = db::init_db(&config.storage_path)?;
        let api = HttpMarketplaceApi::new(&config.api_url, config.timeout)?;

        let mut session = SessionGate::new(conn);
        session.restore()?;

        Ok(Self {
            config,
            api: Box::new(api),
            session,
        })
    }
}
