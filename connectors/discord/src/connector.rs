//! "Sign in with Discord" login method.
//!
//! Glues configuration, module metadata and the redirect URI together and
//! exposes the flow and role sync through [`LoginMethod`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use crate::{
    authorize::AuthorizationFlow,
    config::ModuleConfig,
    error::LoginResultOf,
    host::{LoginMethod, RedirectSource},
    membership::MembershipSync,
    resources::ModuleResources,
    types::{ExternalAccount, LoginResult, MembershipSyncResult, ModuleInfo},
};

/// Discord login method.
///
/// Immutable after construction; safe to share across host requests.
#[derive(Debug)]
pub struct DiscordLoginModule {
    config: ModuleConfig,
    info: ModuleInfo,
    resources: ModuleResources,
    redirect_uri: String,
}

impl DiscordLoginModule {
    /// Build the module from already-loaded parts.
    ///
    /// # Errors
    /// Returns `LoginError::Config` if `config` fails validation.
    pub fn new(
        config: ModuleConfig,
        info: ModuleInfo,
        resources: ModuleResources,
        redirect: &RedirectSource,
    ) -> LoginResultOf<Self> {
        config.validate()?;
        let redirect_uri = redirect.resolve(&info.identifier);

        info!(
            identifier = %info.identifier,
            enabled = config.enabled,
            role_sync = config.role_sync_configured(),
            strict_scopes = config.strict_scopes,
            "Discord login module loaded"
        );

        Ok(Self {
            config,
            info,
            resources,
            redirect_uri,
        })
    }

    /// Load `module.json` and `config/config.json` from a module directory.
    ///
    /// # Errors
    /// Returns `LoginError::Config` or `LoginError::Resource` if either file
    /// is missing or invalid.
    pub fn from_dir(
        root: impl Into<std::path::PathBuf>,
        redirect: &RedirectSource,
    ) -> LoginResultOf<Self> {
        let resources = ModuleResources::new(root);
        let info = resources.load_info()?;
        let config = resources.load_config()?;
        Self::new(config, info, resources, redirect)
    }

    /// The redirect URI sent to Discord.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn flow(&self) -> AuthorizationFlow<'_> {
        AuthorizationFlow::new(&self.config, &self.redirect_uri)
    }
}

#[async_trait]
impl LoginMethod for DiscordLoginModule {
    fn start_module(&self) -> bool {
        self.config.enabled
    }

    fn short_name(&self) -> &str {
        &self.config.short_name
    }

    fn config(&self) -> &ModuleConfig {
        &self.config
    }

    fn module_info(&self) -> &ModuleInfo {
        &self.info
    }

    fn messages(&self, lang: &str) -> LoginResultOf<Option<BTreeMap<String, String>>> {
        self.resources.messages(lang)
    }

    fn auth_url(&self, state: &str) -> String {
        self.flow().auth_url(state)
    }

    async fn authorize(&self, code: &str) -> LoginResultOf<LoginResult> {
        self.flow().authorize(code).await
    }

    async fn on_connect(&self, account: &ExternalAccount) -> MembershipSyncResult {
        MembershipSync::new(&self.config).connect(account).await
    }

    async fn on_disconnect(&self, account: &ExternalAccount) -> MembershipSyncResult {
        MembershipSync::new(&self.config).disconnect(account).await
    }
}
