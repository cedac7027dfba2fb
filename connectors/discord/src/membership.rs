//! Guild role synchronization for linked Discord accounts.
//!
//! Best effort: a failed Discord call is reported in the returned
//! [`MembershipSyncResult`] and logged, never propagated, so the host's
//! link/unlink still goes through.

use tracing::{info, warn};

use crate::{
    api::DiscordBotClient,
    config::ModuleConfig,
    error::{DiscordError, DiscordResult},
    types::{ExternalAccount, MembershipSyncResult, Snowflake},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleChange {
    Grant,
    Revoke,
}

impl RoleChange {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }
}

/// Adds or removes the configured guild role.
#[derive(Debug, Clone, Copy)]
pub struct MembershipSync<'a> {
    config: &'a ModuleConfig,
}

impl<'a> MembershipSync<'a> {
    #[must_use]
    pub const fn new(config: &'a ModuleConfig) -> Self {
        Self { config }
    }

    /// Grant the configured role to the account's Discord user.
    pub async fn connect(&self, account: &ExternalAccount) -> MembershipSyncResult {
        self.apply(account, RoleChange::Grant).await
    }

    /// Revoke the configured role from the account's Discord user.
    pub async fn disconnect(&self, account: &ExternalAccount) -> MembershipSyncResult {
        self.apply(account, RoleChange::Revoke).await
    }

    async fn apply(&self, account: &ExternalAccount, change: RoleChange) -> MembershipSyncResult {
        if !self.config.role_sync_configured() {
            warn!(
                local_account_id = %account.local_account_id,
                change = change.as_str(),
                "Skipping guild role sync: no bot token configured"
            );
            return MembershipSyncResult::failed(
                "sync_not_configured",
                "Guild role synchronization requires a bot token",
            );
        }

        let user_id = match account.external_id.parse::<Snowflake>() {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    local_account_id = %account.local_account_id,
                    external_id = %account.external_id,
                    "Rejecting guild role sync for malformed Discord id"
                );
                return MembershipSyncResult::failed(e.code(), e.to_string());
            }
        };

        match self.call(user_id, change).await {
            Ok(()) => {
                info!(
                    local_account_id = %account.local_account_id,
                    user_id = %user_id,
                    guild_id = %self.config.guild_id,
                    role_id = %self.config.customer_role,
                    change = change.as_str(),
                    "Guild role synchronized"
                );
                MembershipSyncResult::ok()
            }
            Err(e) => {
                warn!(
                    local_account_id = %account.local_account_id,
                    user_id = %user_id,
                    change = change.as_str(),
                    error = %e,
                    retry_after = ?e.retry_after(),
                    "Guild role sync failed"
                );
                MembershipSyncResult::failed(sync_error_code(&e), e.to_string())
            }
        }
    }

    async fn call(&self, user_id: Snowflake, change: RoleChange) -> DiscordResult<()> {
        let bot = DiscordBotClient::new(self.config)?;
        let (guild_id, role_id) = (self.config.guild_id, self.config.customer_role);
        match change {
            RoleChange::Grant => bot.add_guild_member_role(guild_id, user_id, role_id).await,
            RoleChange::Revoke => bot.remove_guild_member_role(guild_id, user_id, role_id).await,
        }
    }
}

/// Machine code for a failed role call.
fn sync_error_code(err: &DiscordError) -> &'static str {
    match err {
        DiscordError::RateLimited { .. } => "rate_limited",
        DiscordError::Api { status: 401, .. } | DiscordError::OAuth { status: 401, .. } => {
            "unauthorized"
        }
        DiscordError::Api { status: 403, .. } => "forbidden",
        DiscordError::Api { status: 404, .. } => "not_found",
        _ => "upstream_error",
    }
}
