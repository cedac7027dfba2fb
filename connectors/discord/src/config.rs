//! Discord login module configuration.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{LoginError, LoginResultOf};
use crate::types::Snowflake;

/// Configuration for the Discord login method (`config/config.json`).
///
/// Loaded once when the module is built and never mutated afterwards. Not
/// `Serialize`: it holds the client secret and bot token.
#[derive(Clone, Deserialize)]
pub struct ModuleConfig {
    /// Whether the host should expose this login method
    pub enabled: bool,

    /// Short label shown by the host
    #[serde(rename = "shortName")]
    pub short_name: String,

    /// OAuth2 client ID
    #[serde(rename = "public")]
    pub client_id: String,

    /// OAuth2 client secret
    #[serde(rename = "secret")]
    pub client_secret: String,

    /// Bot token used for guild role management (empty disables role sync)
    pub bot_token: String,

    /// Guild whose role is synchronized
    pub guild_id: Snowflake,

    /// Role granted to linked accounts
    pub customer_role: Snowflake,

    /// Reject logins whose granted scopes miss a required scope
    #[serde(default = "default_strict_scopes")]
    pub strict_scopes: bool,

    /// Request timeout
    #[serde(default = "default_timeout", deserialize_with = "duration_secs::deserialize")]
    pub timeout: Duration,

    /// Base URL for the Discord API (default: https://discordapp.com/api)
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_strict_scopes() -> bool {
    true
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_api_url() -> String {
    "https://discordapp.com/api".into()
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl ModuleConfig {
    /// Parse and validate a configuration document.
    ///
    /// # Errors
    /// Returns `LoginError::Config` if a key is missing, has the wrong type,
    /// or fails validation.
    pub fn from_json_str(json: &str) -> LoginResultOf<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LoginError::Config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    /// Returns `LoginError::Config` if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> LoginResultOf<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoginError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Check the invariants the login flow relies on.
    ///
    /// # Errors
    /// Returns `LoginError::Config` naming the first offending key.
    pub fn validate(&self) -> LoginResultOf<()> {
        if self.client_id.trim().is_empty() {
            return Err(LoginError::Config(
                "Missing required 'public' (client id) in configuration".into(),
            ));
        }
        if self.client_secret.trim().is_empty() {
            return Err(LoginError::Config(
                "Missing required 'secret' (client secret) in configuration".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(LoginError::Config("'timeout' must be at least 1 second".into()));
        }
        Url::parse(&self.api_url)
            .map_err(|e| LoginError::Config(format!("Invalid 'api_url': {e}")))?;
        Ok(())
    }

    /// Whether guild role synchronization has the credentials it needs.
    #[must_use]
    pub fn role_sync_configured(&self) -> bool {
        !self.bot_token.trim().is_empty()
    }

    /// Token endpoint, derived from `api_url`.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.api_base())
    }

    /// Profile endpoint, derived from `api_url`.
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!("{}/users/@me", self.api_base())
    }

    pub(crate) fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

impl fmt::Debug for ModuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleConfig")
            .field("enabled", &self.enabled)
            .field("short_name", &self.short_name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("bot_token", &"[REDACTED]")
            .field("guild_id", &self.guild_id)
            .field("customer_role", &self.customer_role)
            .field("strict_scopes", &self.strict_scopes)
            .field("timeout", &self.timeout)
            .field("api_url", &self.api_url)
            .finish()
    }
}
