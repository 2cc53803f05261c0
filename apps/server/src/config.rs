use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub platform_path: String,
    pub jwks_path: String,
    /// Pending purchases older than this are swept to failed
    pub pending_purchase_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?;

        let platform_path =
            env::var("PLATFORM_CONFIG").unwrap_or_else(|_| "lectern.config.json".to_string());

        let jwks_path = env::var("JWKS_PATH").unwrap_or_else(|_| "jwks.json".to_string());

        let ttl_hours: u64 = env::var("PURCHASE_PENDING_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PURCHASE_PENDING_TTL_HOURS".to_string()))?;

        Ok(Config {
            port,
            platform_path,
            jwks_path,
            pending_purchase_ttl: Duration::from_secs(ttl_hours * 3600),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(var) => write!(f, "Invalid value for: {}", var),
        }
    }
}

impl std::error::Error for ConfigError {}
