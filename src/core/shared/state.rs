use crate::config::AppConfig;
use crate::directory::{AuthClient, AuthServiceClient, AuthServiceConfig};
use crate::tables::{RestTableStore, TableStore};
use std::sync::Arc;

/// Shared, read-only state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tables: Arc<dyn TableStore>,
    pub auth: Arc<dyn AuthClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("tables", &"Arc<dyn TableStore>")
            .field("auth", &"Arc<dyn AuthClient>")
            .finish()
    }
}

impl AppState {
    pub fn new(config: AppConfig, tables: Arc<dyn TableStore>, auth: Arc<dyn AuthClient>) -> Self {
        Self {
            config: Arc::new(config),
            tables,
            auth,
        }
    }

    /// Builds the HTTP clients for the hosted data and auth services.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let tables = RestTableStore::new(&config.tables)?;
        let auth = AuthServiceClient::new(AuthServiceConfig::from(&config.auth))?;
        Ok(Self::new(config, Arc::new(tables), Arc::new(auth)))
    }

    pub fn tickets_table(&self) -> &str {
        &self.config.tables.tickets_table
    }

    pub fn profiles_table(&self) -> &str {
        &self.config.tables.profiles_table
    }
}
