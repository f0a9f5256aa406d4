//! Layered application configuration.
//!
//! Values are resolved from built-in defaults, then an optional
//! `insighta.toml` in the working directory, then `INSIGHTA_`-prefixed
//! environment variables. Nested keys use `__` in the environment, e.g.
//! `INSIGHTA_TABLES__URL` or `INSIGHTA_STAFF_BOOTSTRAP__ENABLED`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CONFIG_FILE: &str = "insighta.toml";
pub const ENV_PREFIX: &str = "INSIGHTA_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub server: ServerConfig,
    pub tables: TablesConfig,
    pub auth: AuthConfig,
    pub staff_bootstrap: StaffBootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    /// Base URL of the hosted data service, without the `/rest/v1` suffix.
    pub url: String,
    pub api_key: String,
    pub tickets_table: String,
    pub profiles_table: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub url: String,
    pub api_key: String,
    pub cookie_name: String,
    pub cookie_max_age_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffBootstrapConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            tables: TablesConfig {
                url: "http://localhost:54321".to_string(),
                api_key: String::new(),
                tickets_table: "tickets".to_string(),
                profiles_table: "profiles".to_string(),
            },
            auth: AuthConfig {
                url: "http://localhost:54321".to_string(),
                api_key: String::new(),
                cookie_name: "insighta_session".to_string(),
                cookie_max_age_hours: 24,
            },
            staff_bootstrap: StaffBootstrapConfig {
                enabled: false,
                max_attempts: 6,
                delay_ms: 250,
            },
        }
    }
}

impl AppConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, anyhow::Error> {
        let config: AppConfig = Self::figment().extract()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Staff bootstrap never runs in production, whatever the flag says.
    pub fn staff_bootstrap_active(&self) -> bool {
        self.staff_bootstrap.enabled && !self.is_production()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl std::fmt::Debug for TablesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablesConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("tickets_table", &self.tickets_table)
            .field("profiles_table", &self.profiles_table)
            .finish()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("cookie_max_age_hours", &self.cookie_max_age_hours)
            .finish()
    }
}

impl StaffBootstrapConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
