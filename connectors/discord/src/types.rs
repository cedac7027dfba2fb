//! Discord API and login-method types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{ErrorBody, LoginError};

/// CDN template for user avatars.
const AVATAR_CDN_URL: &str = "https://cdn.discord.com/avatars";

/// Discord snowflake identifier (users, guilds, roles).
///
/// Always non-zero. Parsed from text only when the text is plain ASCII digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(u64);

impl Snowflake {
    /// Wrap a raw numeric id.
    ///
    /// # Errors
    /// Returns `LoginError::Validation` for zero.
    pub fn new(id: u64) -> Result<Self, LoginError> {
        if id == 0 {
            return Err(LoginError::Validation(
                "Discord identifier must be non-zero".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for Snowflake {
    type Err = LoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LoginError::Validation(format!(
                "'{s}' is not a numeric Discord identifier"
            )));
        }
        let id = s.parse::<u64>().map_err(|_| {
            LoginError::Validation(format!("'{s}' is out of range for a Discord identifier"))
        })?;
        Self::new(id)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Discord sends snowflakes as strings; config files written by hand often use
// bare integers. Accept both.
impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(id) => Self::new(id).map_err(de::Error::custom),
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Successful response from the OAuth2 token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the user
    pub access_token: String,

    /// Token type (always "Bearer" for Discord)
    pub token_type: String,

    /// Space-delimited scopes the user actually granted
    #[serde(default)]
    pub scope: String,

    /// Lifetime in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Scopes granted by the user.
    pub fn granted_scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}

/// Discord user as returned by `GET /users/@me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordUser {
    /// User ID
    pub id: String,

    /// Username
    pub username: String,

    /// Email (requires the `email` scope)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Global display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,

    /// Whether the email has been verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl DiscordUser {
    /// CDN URL of the user's avatar.
    #[must_use]
    pub fn icon_url(&self) -> String {
        format!(
            "{AVATAR_CDN_URL}/{}/{}.png",
            self.id,
            self.avatar.as_deref().unwrap_or_default()
        )
    }
}

/// Normalized login result handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub icon_url: String,
}

impl From<DiscordUser> for LoginResult {
    fn from(user: DiscordUser) -> Self {
        let icon_url = user.icon_url();
        Self {
            user_id: user.id,
            email: user.email.unwrap_or_default(),
            username: user.username,
            icon_url,
        }
    }
}

/// Outcome of a guild role add/remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSyncResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl MembershipSyncResult {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(ErrorBody::new(code, message)),
        }
    }
}

/// A local account's link to a Discord identity, as the host sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAccount {
    /// Host-side account identifier
    pub local_account_id: String,

    /// Discord user id, as stored by the host
    pub external_id: String,
}

impl ExternalAccount {
    pub fn new(local_account_id: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            local_account_id: local_account_id.into(),
            external_id: external_id.into(),
        }
    }
}

/// Static module metadata (`module.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Display name
    pub name: String,

    /// Unique module identifier, used in callback paths
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Any other keys, preserved as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
