//! OAuth2 authorization-code flow against Discord.
//!
//! `Idle -> code exchange -> scope check -> profile fetch -> LoginResult`.
//! Each call is independent; nothing survives between attempts.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{info, instrument, warn};

use crate::{
    api::{CodeExchange, DiscordOAuthClient},
    config::ModuleConfig,
    error::{LoginError, LoginResultOf},
    types::{LoginResult, TokenResponse},
};

/// Discord's authorization endpoint. Fixed; never taken from configuration.
pub const AUTHORIZE_URL: &str = "https://discordapp.com/oauth2/authorize";

/// Scopes the login method requests and requires.
pub const REQUIRED_SCOPES: [&str; 2] = ["identify", "email"];

/// RFC 3986 unreserved characters stay as-is, everything else is encoded.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

/// Authorization flow for one module configuration.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationFlow<'a> {
    config: &'a ModuleConfig,
    redirect_uri: &'a str,
}

impl<'a> AuthorizationFlow<'a> {
    #[must_use]
    pub const fn new(config: &'a ModuleConfig, redirect_uri: &'a str) -> Self {
        Self {
            config,
            redirect_uri,
        }
    }

    /// Build the URL the host redirects the user to.
    ///
    /// `state` is embedded verbatim; binding and verifying it is the host's job.
    #[must_use]
    pub fn auth_url(&self, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?response_type=code&client_id={}&state={state}&scope={}&redirect_uri={}",
            encode(&self.config.client_id),
            encode(&REQUIRED_SCOPES.join(" ")),
            encode(self.redirect_uri),
        )
    }

    /// Exchange `code`, check scopes and fetch the user's profile.
    ///
    /// # Errors
    /// - `LoginError::Config` if client credentials are empty
    /// - `LoginError::Upstream` if Discord rejects the code, the token, or
    ///   cannot be reached
    /// - `LoginError::Scope` if strict scope checking is on and a required
    ///   scope was not granted
    #[instrument(skip_all)]
    pub async fn authorize(&self, code: &str) -> LoginResultOf<LoginResult> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(LoginError::Config(
                "Client id and secret are required to authorize".into(),
            ));
        }

        let client = DiscordOAuthClient::new(self.config)?;

        let token = client
            .exchange_code(&CodeExchange {
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                redirect_uri: self.redirect_uri,
                code,
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Authorization code exchange failed"))?;

        self.check_scopes(&token)?;

        let profile = client
            .fetch_profile(&token.access_token)
            .await
            .inspect_err(|e| warn!(error = %e, "Discord profile fetch failed"))?;

        info!(user_id = %profile.id, "Discord login authorized");
        Ok(LoginResult::from(profile))
    }

    fn check_scopes(&self, token: &TokenResponse) -> LoginResultOf<()> {
        let missing = missing_scopes(token);
        if missing.is_empty() {
            return Ok(());
        }

        if !self.config.strict_scopes {
            warn!(
                granted = %token.scope,
                missing = ?missing,
                "Accepting login with missing scopes (strict_scopes disabled)"
            );
            return Ok(());
        }

        Err(LoginError::Scope {
            granted: token.granted_scopes().map(String::from).collect(),
            required: REQUIRED_SCOPES.iter().map(|s| (*s).to_string()).collect(),
        })
    }
}

/// Required scopes absent from the provider's grant.
fn missing_scopes(token: &TokenResponse) -> Vec<&'static str> {
    REQUIRED_SCOPES
        .into_iter()
        .filter(|required| !token.granted_scopes().any(|granted| granted == *required))
        .collect()
}
