use std::env;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {message}")]
    Invalid {
        name: &'static str,
        message: String,
    },
}

/// Process configuration, read once at startup from the environment
/// (a `.env` file is honored via dotenvy before this runs).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Upstream API key; forwarded on every upstream call when set.
    pub api_key: Option<String>,
    /// Upstream base URL.
    pub base_url: String,
    /// Payment network identifier, e.g. "base" or "solana".
    pub network: Option<String>,
    /// Hex-encoded signing key.
    pub private_key: Option<String>,
    /// Listen port.
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = require("PAYSTREAM_BASE_URL")?;
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|err| ConfigError::Invalid {
                name: "PORT",
                message: err.to_string(),
            })?,
            Err(_) => 5050,
        };

        Ok(Self {
            api_key: optional("PAYSTREAM_API_KEY"),
            base_url,
            network: optional("PAYSTREAM_NETWORK"),
            private_key: optional("PAYSTREAM_PRIVATE_KEY"),
            port,
        })
    }

    /// Payment-signing mode needs both a network and a key.
    pub fn signing_enabled(&self) -> bool {
        self.network.is_some() && self.private_key.is_some()
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
