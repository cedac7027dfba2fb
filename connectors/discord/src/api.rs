//! Discord REST API clients.
//!
//! [`DiscordOAuthClient`] talks to the OAuth2 and user endpoints with client
//! credentials or the user's bearer token. [`DiscordBotClient`] carries the
//! bot token and is only used for guild role management. Neither retries:
//! every call is exactly one request.

use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    config::ModuleConfig,
    error::{DiscordError, DiscordResult},
    types::{DiscordUser, Snowflake, TokenResponse},
};

fn http_client(config: &ModuleConfig) -> DiscordResult<Client> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .user_agent(format!("fcp-discord-login/{}", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Parameters of an authorization-code exchange.
#[derive(Clone, Copy)]
pub struct CodeExchange<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub redirect_uri: &'a str,
    pub code: &'a str,
}

/// OAuth2 client for the token and profile endpoints.
#[derive(Debug, Clone)]
pub struct DiscordOAuthClient {
    client: Client,
    token_url: String,
    profile_url: String,
}

impl DiscordOAuthClient {
    /// Create a new client from configuration.
    pub fn new(config: &ModuleConfig) -> DiscordResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            token_url: config.token_url(),
            profile_url: config.profile_url(),
        })
    }

    /// Exchange an authorization code for an access token.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, exchange: &CodeExchange<'_>) -> DiscordResult<TokenResponse> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", exchange.client_id),
            ("client_secret", exchange.client_secret),
            ("redirect_uri", exchange.redirect_uri),
            ("code", exchange.code),
        ];

        debug!(url = %self.token_url, "Exchanging authorization code");
        let response = self.client.post(&self.token_url).form(&form[..]).send().await?;
        read_json(response).await
    }

    /// Fetch the profile of the user owning `access_token`.
    #[instrument(skip_all)]
    pub async fn fetch_profile(&self, access_token: &str) -> DiscordResult<DiscordUser> {
        debug!(url = %self.profile_url, "Fetching Discord profile");
        let response = self
            .client
            .get(&self.profile_url)
            .bearer_auth(access_token)
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        read_json(response).await
    }
}

/// Bot-authenticated client for guild member role management.
#[derive(Clone)]
pub struct DiscordBotClient {
    client: Client,
    base_url: String,
    bot_token: String,
}

impl DiscordBotClient {
    /// Create a new client from configuration.
    pub fn new(config: &ModuleConfig) -> DiscordResult<Self> {
        // Normalize token (remove "Bot " prefix if present)
        let bot_token = config
            .bot_token
            .strip_prefix("Bot ")
            .unwrap_or(&config.bot_token)
            .to_string();

        Ok(Self {
            client: http_client(config)?,
            base_url: config.api_base().to_string(),
            bot_token,
        })
    }

    /// Add a role to a guild member. Discord treats repeats as no-ops.
    #[instrument(skip(self))]
    pub async fn add_guild_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> DiscordResult<()> {
        let url = self.member_role_url(guild_id, user_id, role_id);
        let response = self
            .client
            .put(&url)
            .header(header::AUTHORIZATION, format!("Bot {}", self.bot_token))
            .header(header::CONTENT_LENGTH, "0")
            .send()
            .await?;
        expect_no_content(response).await
    }

    /// Remove a role from a guild member.
    #[instrument(skip(self))]
    pub async fn remove_guild_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> DiscordResult<()> {
        let url = self.member_role_url(guild_id, user_id, role_id);
        let response = self
            .client
            .delete(&url)
            .header(header::AUTHORIZATION, format!("Bot {}", self.bot_token))
            .send()
            .await?;
        expect_no_content(response).await
    }

    fn member_role_url(&self, guild_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> String {
        format!(
            "{}/guilds/{guild_id}/members/{user_id}/roles/{role_id}",
            self.base_url
        )
    }
}

/// Error payload shapes Discord uses: REST (`code`/`message`), OAuth2
/// (`error`/`error_description`) and rate limits (`retry_after`).
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    code: Option<i32>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    retry_after: Option<f64>,
}

async fn read_json<T: DeserializeOwned>(response: Response) -> DiscordResult<T> {
    let status = response.status();
    let retry_after = retry_after_header(&response);
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(decode_error(status, retry_after, &bytes));
    }

    let value: serde_json::Value = serde_json::from_slice(&bytes)?;

    // Discord occasionally answers 200 with an error body instead of a token.
    if value.get("error").is_some() || value.get("message").is_some() {
        return Err(decode_error(status, retry_after, &bytes));
    }

    Ok(serde_json::from_value(value)?)
}

async fn expect_no_content(response: Response) -> DiscordResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let retry_after = retry_after_header(&response);
    let bytes = response.bytes().await?;
    Err(decode_error(status, retry_after, &bytes))
}

fn retry_after_header(response: &Response) -> Option<f64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn decode_error(status: StatusCode, retry_after: Option<f64>, bytes: &[u8]) -> DiscordError {
    let payload: ErrorPayload = serde_json::from_slice(bytes).unwrap_or_default();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return DiscordError::RateLimited {
            retry_after: retry_after
                .or(payload.retry_after.filter(|v| v.is_finite()))
                .unwrap_or(1.0),
        };
    }

    if let Some(error) = payload.error {
        return DiscordError::OAuth {
            status: status.as_u16(),
            error,
            description: payload.error_description.unwrap_or_default(),
        };
    }

    let message = payload.message.unwrap_or_else(|| {
        let text = String::from_utf8_lossy(bytes).trim().to_string();
        if text.is_empty() {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        } else {
            text
        }
    });

    DiscordError::Api {
        status: status.as_u16(),
        code: payload.code,
        message,
    }
}
