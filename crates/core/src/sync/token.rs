//! Token lifecycle management
//!
//! Returns a currently-valid access token for a tenant, refreshing it
//! against the provider when expired and persisting the new token/expiry.

use std::sync::Arc;

use chrono::{Duration, Utc};
use syncline_domain::{Credential, Result, SyncError};
use tracing::{debug, info, warn};

use super::ports::{CalendarProvider, CredentialRepository};

/// Resolves a valid access token for a tenant, refreshing transparently.
pub struct TokenManager {
    credentials: Arc<dyn CredentialRepository>,
    provider: Arc<dyn CalendarProvider>,
    refresh_margin_secs: i64,
}

impl TokenManager {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        provider: Arc<dyn CalendarProvider>,
        refresh_margin_secs: i64,
    ) -> Self {
        Self { credentials, provider, refresh_margin_secs }
    }

    /// Return the tenant's credential with a usable access token.
    ///
    /// Exactly one credential write happens per actual refresh; a cached
    /// token that is still valid (outside the safety margin) produces no
    /// write and no provider traffic. A rejected refresh token deactivates
    /// the credential and fails with `ReauthorizationRequired` - terminal
    /// for this run, never retried.
    pub async fn resolve(&self, tenant_id: &str) -> Result<Credential> {
        let Some(mut credential) = self.credentials.find_active(tenant_id).await? else {
            return Err(SyncError::CredentialNotFound(tenant_id.to_string()));
        };

        let now = Utc::now();
        if credential.token_valid_at(now, self.refresh_margin_secs) {
            debug!(tenant_id, "access token still valid, using cached token");
            return Ok(credential);
        }

        debug!(tenant_id, expires_at = %credential.token_expires_at, "access token expired, refreshing");

        let refreshed = match self.provider.refresh_access_token(&credential.refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(err) if err.requires_reconnect() => {
                warn!(tenant_id, "refresh token rejected by provider, deactivating credential");
                self.credentials.mark_inactive(tenant_id).await?;
                return Err(SyncError::ReauthorizationRequired(tenant_id.to_string()));
            }
            Err(err) => return Err(err),
        };

        let expires_at = now + Duration::seconds(refreshed.expires_in);
        self.credentials
            .update_access_token(tenant_id, &refreshed.access_token, expires_at)
            .await?;

        info!(tenant_id, expires_at = %expires_at, "access token refreshed");

        credential.access_token = refreshed.access_token;
        credential.token_expires_at = expires_at;
        Ok(credential)
    }
}
