//! Session-aware request execution.
//!
//! Every call goes through [`AuthenticatedClient::execute`]:
//!
//! ```text
//! attempt ── ok / non-401 ──────────────────────────────► returned as-is
//!    │ 401
//!    ▼
//! refresh token? ── no ──► invalidate ──────────────────► UnauthorizedNoRefresh
//!    │ yes
//!    ▼
//! token endpoint ── error ──► mark stale, invalidate ──► RefreshFailed
//!    │ new access token
//!    ▼
//! retry once with new token ─────────────────────────────► Ok / RetriedFinalError
//!    └─► store token, schedule Reinitialize
//! ```
//!
//! There is no path from the retry back to the refresh step.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::client::RenewedAccess;
use super::{ApiClient, ApiError, ApiRequest, ApiResponse, RequestError};
use crate::auth::SessionStore;
use crate::config::ClientConfig;
use crate::events::ClientEvents;

/// How long a refresh result may be handed to other requests that were
/// rejected with the same refresh token.
const REFRESH_REUSE_WINDOW: Duration = Duration::from_secs(10);

const REASON_NO_REFRESH_TOKEN: &str = "No refresh token available";
const REASON_REFRESH_FAILED: &str = "Token refresh failed";

struct LastRefresh {
    refresh_token: String,
    renewed: RenewedAccess,
    at: Instant,
}

/// API client that attaches the session's bearer token and recovers from a
/// single expired-token rejection per request.
///
/// Clone is cheap; clones share the connection pool, the session store and
/// the refresh gate.
#[derive(Clone)]
pub struct AuthenticatedClient {
    transport: ApiClient,
    store: Arc<dyn SessionStore>,
    events: ClientEvents,
    reinit_delay: Duration,
    refresh_gate: Option<Arc<Mutex<Option<LastRefresh>>>>,
}

impl AuthenticatedClient {
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
        events: ClientEvents,
    ) -> Result<Self, ApiError> {
        let transport = ApiClient::new(config)?;
        Ok(Self::from_transport(transport, config, store, events))
    }

    pub fn from_transport(
        transport: ApiClient,
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
        events: ClientEvents,
    ) -> Self {
        Self {
            transport,
            store,
            events,
            reinit_delay: config.reinit_delay,
            refresh_gate: config
                .coalesce_refreshes
                .then(|| Arc::new(Mutex::new(None))),
        }
    }

    pub fn transport(&self) -> &ApiClient {
        &self.transport
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn events(&self) -> &ClientEvents {
        &self.events
    }

    /// Send `request` with the current session's access token.
    ///
    /// A 401 triggers one token refresh and one retry; see the module docs
    /// for every outcome. Transport errors are never retried.
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, RequestError> {
        let session = self.store.current().await;
        let attempt = match session.as_ref().and_then(|s| s.access()) {
            Some(access) => request.with_bearer(access)?,
            None => request.clone(),
        };

        match self.transport.dispatch(&attempt).await {
            Err(e) if e.is_unauthorized() => {
                warn!(
                    method = %request.method(),
                    path = request.path(),
                    "Access token rejected, attempting refresh"
                );
                self.recover(request, attempt.bearer_token(), e).await
            }
            other => other.map_err(RequestError::from),
        }
    }

    async fn recover(
        &self,
        request: &ApiRequest,
        rejected: Option<&str>,
        unauthorized: ApiError,
    ) -> Result<ApiResponse, RequestError> {
        let refresh = self
            .store
            .current()
            .await
            .and_then(|s| s.refresh().map(str::to_string));

        let Some(refresh) = refresh else {
            warn!("No refresh token available, signing out");
            self.store.invalidate(REASON_NO_REFRESH_TOKEN).await;
            return Err(RequestError::UnauthorizedNoRefresh(unauthorized));
        };

        let renewed = match self.renew(&refresh, rejected).await {
            Ok(renewed) => renewed,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, signing out");
                self.store
                    .mark_error(&format!("{}: {}", REASON_REFRESH_FAILED, e))
                    .await;
                self.store.invalidate(REASON_REFRESH_FAILED).await;
                return Err(RequestError::RefreshFailed(e));
            }
        };
        info!("Token refreshed successfully");

        if let Err(e) = self
            .store
            .update_tokens(renewed.access.clone(), renewed.rotated_refresh.clone())
            .await
        {
            warn!(error = %e, "Failed to store refreshed token");
        }

        let refreshed = self.transport.with_token(renewed.access);
        let result = refreshed.dispatch(request).await;

        // Everyone holding the old token rebuilds from the refreshed session
        self.events.schedule_reinitialize(self.reinit_delay);

        result.map_err(|e| {
            warn!(error = %e, path = request.path(), "Request failed after token refresh");
            RequestError::RetriedFinalError(e)
        })
    }

    /// Call the token endpoint, or reuse a result that another request just
    /// obtained for the same refresh token when refreshes are coalesced.
    ///
    /// A cached access token is only handed out to requests that were sent
    /// with an older one. If `rejected` is the cached token itself, the
    /// server has already refused it and a fresh refresh is made.
    async fn renew(
        &self,
        refresh: &str,
        rejected: Option<&str>,
    ) -> Result<RenewedAccess, ApiError> {
        let Some(ref gate) = self.refresh_gate else {
            return self.transport.refresh_access(refresh).await;
        };

        let mut last = gate.lock().await;
        if let Some(prev) = last.as_ref() {
            if prev.refresh_token == refresh
                && rejected != Some(prev.renewed.access.as_str())
                && prev.at.elapsed() < REFRESH_REUSE_WINDOW
            {
                debug!("Reusing concurrent token refresh");
                return Ok(prev.renewed.clone());
            }
        }

        let renewed = self.transport.refresh_access(refresh).await?;
        *last = Some(LastRefresh {
            refresh_token: refresh.to_string(),
            renewed: renewed.clone(),
            at: Instant::now(),
        });
        Ok(renewed)
    }
}
