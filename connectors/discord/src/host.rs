//! Contract between the authentication host and a login-method module.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::ModuleConfig,
    error::LoginResultOf,
    types::{ExternalAccount, LoginResult, MembershipSyncResult, ModuleInfo},
};

/// A pluggable external-identity login method.
///
/// Implementations are shared across host requests and must not keep
/// per-request state.
#[async_trait]
pub trait LoginMethod: Send + Sync {
    /// Whether the host should register this login method.
    fn start_module(&self) -> bool;

    /// One-time hook run by the host after registration.
    fn initial(&self) {}

    fn short_name(&self) -> &str;

    fn config(&self) -> &ModuleConfig;

    fn module_info(&self) -> &ModuleInfo;

    fn name(&self) -> &str {
        &self.module_info().name
    }

    fn identifier(&self) -> &str {
        &self.module_info().identifier
    }

    /// Localized strings for `lang`, `None` when the language is not shipped.
    fn messages(&self, lang: &str) -> LoginResultOf<Option<BTreeMap<String, String>>>;

    /// Extra properties exposed to the host UI.
    fn properties(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }

    /// URL to send the user to, carrying the host's opaque `state`.
    fn auth_url(&self, state: &str) -> String;

    /// Complete the login from the provider's authorization `code`.
    async fn authorize(&self, code: &str) -> LoginResultOf<LoginResult>;

    /// Called after the host links `account`. Never fails.
    async fn on_connect(&self, account: &ExternalAccount) -> MembershipSyncResult;

    /// Called after the host unlinks `account`. Never fails.
    async fn on_disconnect(&self, account: &ExternalAccount) -> MembershipSyncResult;
}

/// Host service that knows the public callback URL for external accounts.
pub trait CallbackUrlService: Send + Sync {
    fn external_account_return_url(&self) -> String;
}

/// A callback URL fixed by the operator.
#[derive(Debug, Clone)]
pub struct FixedCallbackUrl(pub String);

impl CallbackUrlService for FixedCallbackUrl {
    fn external_account_return_url(&self) -> String {
        self.0.clone()
    }
}

/// Where the OAuth2 `redirect_uri` comes from. Resolved once at construction.
#[derive(Clone)]
pub enum RedirectSource {
    /// Ask the host's callback-URL service.
    Service(Arc<dyn CallbackUrlService>),
    /// Template `{base_url}/auth/r/{module_identifier}`.
    BaseUrl(String),
}

impl RedirectSource {
    /// Resolve the redirect URI for the module `identifier`.
    #[must_use]
    pub fn resolve(&self, identifier: &str) -> String {
        match self {
            Self::Service(service) => service.external_account_return_url(),
            Self::BaseUrl(base) => format!("{}/auth/r/{identifier}", base.trim_end_matches('/')),
        }
    }
}

impl std::fmt::Debug for RedirectSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(_) => f.write_str("RedirectSource::Service"),
            Self::BaseUrl(base) => f.debug_tuple("RedirectSource::BaseUrl").field(base).finish(),
        }
    }
}
