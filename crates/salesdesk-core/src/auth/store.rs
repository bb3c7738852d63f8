use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::SessionData;
use crate::events::ClientEvents;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Where the API client reads credentials from.
///
/// Implementations are shared behind `Arc<dyn SessionStore>` by every client
/// clone, so all methods take `&self`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Snapshot of the current session, if any.
    async fn current(&self) -> Option<SessionData>;

    /// Install a freshly authenticated session.
    async fn establish(&self, session: SessionData) -> Result<()>;

    /// Record a refreshed access token (and a rotated refresh token, if any).
    async fn update_tokens(&self, access: String, refresh: Option<String>) -> Result<()>;

    /// Flag the current session as stale ahead of invalidation.
    async fn mark_error(&self, error: &str);

    /// Clear the session and ask the host to route to login. Calling this
    /// with no session still publishes the login signal.
    async fn invalidate(&self, reason: &str);
}

/// Session held only in memory.
pub struct MemorySessionStore {
    data: RwLock<Option<SessionData>>,
    events: ClientEvents,
}

impl MemorySessionStore {
    pub fn new(events: ClientEvents) -> Self {
        Self {
            data: RwLock::new(None),
            events,
        }
    }

    pub fn with_session(session: SessionData, events: ClientEvents) -> Self {
        Self {
            data: RwLock::new(Some(session)),
            events,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn current(&self) -> Option<SessionData> {
        self.data.read().await.clone()
    }

    async fn establish(&self, session: SessionData) -> Result<()> {
        *self.data.write().await = Some(session);
        Ok(())
    }

    async fn update_tokens(&self, access: String, refresh: Option<String>) -> Result<()> {
        let mut guard = self.data.write().await;
        let data = guard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("No session to update"))?;
        data.apply_refresh(access, refresh);
        Ok(())
    }

    async fn mark_error(&self, error: &str) {
        if let Some(data) = self.data.write().await.as_mut() {
            data.error = Some(error.to_string());
        }
    }

    async fn invalidate(&self, reason: &str) {
        let previous = self.data.write().await.take();
        log_invalidation(previous.as_ref(), reason);
        self.events.login_required(reason);
    }
}

/// Session persisted as JSON in the cache directory so it survives restarts.
/// Every mutation rewrites the file; invalidation removes it.
pub struct FileSessionStore {
    path: PathBuf,
    data: RwLock<Option<SessionData>>,
    events: ClientEvents,
}

impl FileSessionStore {
    /// Open the store in `cache_dir`, loading any saved session.
    pub fn open(cache_dir: &Path, events: ClientEvents) -> Result<Self> {
        let path = cache_dir.join(SESSION_FILE);
        let data = Self::read_file(&path)?;
        debug!(path = %path.display(), has_session = data.is_some(), "Session store opened");
        Ok(Self {
            path,
            data: RwLock::new(data),
            events,
        })
    }

    /// Re-read the session file, picking up changes made by another process
    /// or an earlier refresh. Returns whether a session is present.
    pub async fn reload(&self) -> Result<bool> {
        let data = Self::read_file(&self.path)?;
        let present = data.is_some();
        *self.data.write().await = data;
        Ok(present)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Result<Option<SessionData>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).context("Failed to read session file")?;
        match serde_json::from_str(&contents) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                // A corrupt session is treated as logged out
                warn!(error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn write_file(&self, data: &SessionData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn remove_file(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn current(&self) -> Option<SessionData> {
        self.data.read().await.clone()
    }

    async fn establish(&self, session: SessionData) -> Result<()> {
        let mut guard = self.data.write().await;
        self.write_file(&session)?;
        *guard = Some(session);
        Ok(())
    }

    async fn update_tokens(&self, access: String, refresh: Option<String>) -> Result<()> {
        let mut guard = self.data.write().await;
        let data = guard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("No session to update"))?;
        data.apply_refresh(access, refresh);
        self.write_file(data)
    }

    async fn mark_error(&self, error: &str) {
        let mut guard = self.data.write().await;
        if let Some(data) = guard.as_mut() {
            data.error = Some(error.to_string());
            if let Err(e) = self.write_file(data) {
                warn!(error = %e, "Failed to persist session error");
            }
        }
    }

    async fn invalidate(&self, reason: &str) {
        let previous = {
            let mut guard = self.data.write().await;
            if let Err(e) = self.remove_file() {
                warn!(error = %e, "Failed to remove session file");
            }
            guard.take()
        };
        log_invalidation(previous.as_ref(), reason);
        self.events.login_required(reason);
    }
}

fn log_invalidation(previous: Option<&SessionData>, reason: &str) {
    match previous {
        Some(data) => info!(user = %data.user.uuid, reason, "Session invalidated"),
        None => debug!(reason, "Session already invalidated"),
    }
}
