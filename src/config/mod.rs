use std::time::Duration;

use clap::Args;

/// Path of the rules API on current servers.
pub const RULES_API_PATH: &str = "/api/v1/rules";

/// Path of the rules API on servers that only expose legacy routes.
pub const LEGACY_RULES_API_PATH: &str = "/api/prom/rules";

/// Ruler client configuration.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Address of the ruler API, e.g. http://localhost:9009
    #[arg(
        long,
        default_value = "http://localhost:9009",
        env = "RULECTL_ADDRESS"
    )]
    pub address: String,

    /// Tenant ID sent as X-Scope-OrgID
    #[arg(long, env = "RULECTL_TENANT_ID")]
    pub id: Option<String>,

    /// Basic auth username (defaults to the tenant ID when a key is set)
    #[arg(long, env = "RULECTL_USER")]
    pub user: Option<String>,

    /// Basic auth password or API key
    #[arg(long, env = "RULECTL_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Use the legacy /api/prom/rules routes
    #[arg(long, default_value = "false", env = "RULECTL_USE_LEGACY_ROUTES")]
    pub use_legacy_routes: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", env = "RULECTL_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}

impl Config {
    /// Base path of the rules API for this server.
    pub fn api_path(&self) -> &'static str {
        if self.use_legacy_routes {
            LEGACY_RULES_API_PATH
        } else {
            RULES_API_PATH
        }
    }

    /// Get request timeout as Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: "http://localhost:9009".to_string(),
            id: None,
            user: None,
            key: None,
            use_legacy_routes: false,
            timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}
