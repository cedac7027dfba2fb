//! FCP Discord Login
//!
//! "Sign in with Discord" as a pluggable login method for an authentication
//! host.
//!
//! - OAuth2 authorization-code flow: authorize URL, code exchange, scope
//!   check, profile fetch
//! - Guild role synchronization when a local account links or unlinks its
//!   Discord identity
//!
//! ```rust,ignore
//! use fcp_discord_login::{DiscordLoginModule, LoginMethod, RedirectSource};
//!
//! let module = DiscordLoginModule::from_dir(
//!     "/srv/modules/discordOAuth2",
//!     &RedirectSource::BaseUrl("https://panel.example".into()),
//! )?;
//!
//! let url = module.auth_url(&state);
//! // ... user comes back with ?code=...
//! let login = module.authorize(&code).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod api;
mod authorize;
mod config;
mod connector;
mod error;
mod host;
mod membership;
mod resources;
mod types;

pub use api::{CodeExchange, DiscordBotClient, DiscordOAuthClient};
pub use authorize::{AUTHORIZE_URL, AuthorizationFlow, REQUIRED_SCOPES};
pub use config::ModuleConfig;
pub use connector::DiscordLoginModule;
pub use error::{DiscordError, DiscordResult, ErrorBody, LoginError, LoginResultOf};
pub use host::{CallbackUrlService, FixedCallbackUrl, LoginMethod, RedirectSource};
pub use membership::MembershipSync;
pub use resources::ModuleResources;
pub use types::{
    DiscordUser, ExternalAccount, LoginResult, MembershipSyncResult, ModuleInfo, Snowflake,
    TokenResponse,
};
