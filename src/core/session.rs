use crate::core::models::{SessionPatch, SubscriptionStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, watch};

/// Cached claims written by the PocketBiz app at login. The access
/// token is opaque; this tool only reads it back out for API calls
/// and merges one activation patch into the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Session {
    pub fn is_premium(&self) -> bool {
        self.subscription_status.is_premium()
    }
}

/// Seam between the poller and the session layer: a premium check at
/// startup and the single write-back after confirmation. The poller
/// owns the at-most-once guarantee; implementations just merge.
#[async_trait]
pub trait SessionSync: Send + Sync {
    fn is_premium(&self) -> bool;
    async fn apply(&self, patch: SessionPatch) -> Result<()>;
}

/// File-backed session service with an observer channel, so consumers
/// react to updates instead of reaching into ambient state.
pub struct SessionStore {
    path: PathBuf,
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    pub fn load(path: PathBuf) -> Result<Self> {
        let session = read_session_file(&path)?;
        let (tx, _) = watch::channel(session);
        Ok(Self { path, tx })
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    #[allow(dead_code)]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// Re-reads the session file after an external change. Returns
    /// the fresh value, or None when the file is gone (logged out).
    pub fn reload(&self) -> Result<Option<Session>> {
        let session = read_session_file(&self.path)?;
        self.tx.send_replace(session.clone());
        Ok(session)
    }

    /// Merges the patch into the persisted session and notifies
    /// subscribers. Idempotent: applying the same patch twice leaves
    /// the same session on disk.
    pub fn update(&self, patch: &SessionPatch) -> Result<()> {
        let mut session = self
            .current()
            .context("No session to update; log in via the PocketBiz app first")?;

        session.subscription_status = patch.subscription_status;
        session.company_id = Some(patch.company_id.clone());
        session.company_name = Some(patch.company_name.clone());
        session.logo_url = patch.logo_url.clone();

        write_session_file(&self.path, &session)?;
        self.tx.send_replace(Some(session));
        Ok(())
    }
}

#[async_trait]
impl SessionSync for SessionStore {
    fn is_premium(&self) -> bool {
        self.current().is_some_and(|s| s.is_premium())
    }

    async fn apply(&self, patch: SessionPatch) -> Result<()> {
        self.update(&patch)
    }
}

fn read_session_file(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session from {}", path.display()))?;

    let session = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file {}", path.display()))?;

    Ok(Some(session))
}

fn write_session_file(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(session)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write session to {}", path.display()))
}

/// Watches the session file for rewrites by the main app (login,
/// logout, token refresh) while the poller runs.
pub struct SessionWatcher {
    _watcher: RecommendedWatcher,
}

impl SessionWatcher {
    pub fn start(session_path: &Path) -> Result<(Self, mpsc::UnboundedReceiver<()>)> {
        let (async_tx, async_rx) = mpsc::unbounded_channel::<()>();
        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<()>();

        let watched_name = session_path
            .file_name()
            .context("Session path has no file name")?
            .to_string_lossy()
            .to_string();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                if let Ok(event) = res {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        let hit = event.paths.iter().any(|path| {
                            path.file_name()
                                .map(|name| name.to_string_lossy() == watched_name.as_str())
                                .unwrap_or(false)
                        });
                        if hit {
                            let _ = notify_tx.send(());
                        }
                    }
                }
            },
            Config::default(),
        )?;

        let parent = session_path
            .parent()
            .context("Session path has no parent directory")?;

        if parent.exists() {
            watcher
                .watch(parent, RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch directory: {}", parent.display()))?;
            tracing::info!(?parent, "Watching session directory");
        } else {
            tracing::warn!(?parent, "Session directory does not exist, skipping watch");
        }

        tokio::spawn(async move {
            while notify_rx.recv().await.is_some() {
                // Coalesce editor-style rewrite bursts into one reload.
                tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
                while notify_rx.try_recv().is_ok() {}

                tracing::info!("Session file changed on disk");
                let _ = async_tx.send(());
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    fn temp_session_path() -> PathBuf {
        let seq = TEST_DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir()
            .join(format!("pocketbiz-watch-test-{}-{}", std::process::id(), seq))
            .join("session.json")
    }

    fn free_session() -> Session {
        Session {
            user_id: "usr_1".to_string(),
            access_token: "tok_abc".to_string(),
            subscription_status: SubscriptionStatus::Free,
            company_id: None,
            company_name: None,
            logo_url: None,
        }
    }

    fn premium_patch() -> SessionPatch {
        SessionPatch {
            subscription_status: SubscriptionStatus::Premium,
            company_id: "cmp_9".to_string(),
            company_name: "Acme Bakery".to_string(),
            logo_url: Some("https://api.pocketbiz.app/files/logo_9".to_string()),
        }
    }

    #[test]
    fn test_missing_file_loads_as_no_session() {
        let store = SessionStore::load(temp_session_path()).unwrap();
        assert!(store.current().is_none());
        assert!(!store.is_premium());
    }

    #[test]
    fn test_update_merges_and_persists() {
        let path = temp_session_path();
        write_session_file(&path, &free_session()).unwrap();

        let store = SessionStore::load(path.clone()).unwrap();
        assert!(!store.is_premium());

        store.update(&premium_patch()).unwrap();

        let updated = store.current().unwrap();
        assert!(updated.is_premium());
        assert_eq!(updated.company_id.as_deref(), Some("cmp_9"));
        assert_eq!(updated.company_name.as_deref(), Some("Acme Bakery"));
        // Untouched claims survive the merge.
        assert_eq!(updated.user_id, "usr_1");
        assert_eq!(updated.access_token, "tok_abc");

        // And a fresh load sees the persisted value.
        let reloaded = SessionStore::load(path).unwrap();
        assert!(reloaded.is_premium());
    }

    #[test]
    fn test_update_is_idempotent() {
        let path = temp_session_path();
        write_session_file(&path, &free_session()).unwrap();

        let store = SessionStore::load(path).unwrap();
        store.update(&premium_patch()).unwrap();
        let first = store.current().unwrap();

        store.update(&premium_patch()).unwrap();
        let second = store.current().unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_update_without_session_fails() {
        let store = SessionStore::load(temp_session_path()).unwrap();
        assert!(store.update(&premium_patch()).is_err());
    }

    #[test]
    fn test_subscribers_observe_updates() {
        let path = temp_session_path();
        write_session_file(&path, &free_session()).unwrap();

        let store = SessionStore::load(path).unwrap();
        let rx = store.subscribe();

        store.update(&premium_patch()).unwrap();

        let seen = rx.borrow().clone().unwrap();
        assert!(seen.is_premium());
    }

    #[test]
    fn test_reload_picks_up_external_logout() {
        let path = temp_session_path();
        write_session_file(&path, &free_session()).unwrap();

        let store = SessionStore::load(path.clone()).unwrap();
        assert!(store.current().is_some());

        std::fs::remove_file(&path).unwrap();
        assert!(store.reload().unwrap().is_none());
        assert!(store.current().is_none());
    }

    #[test]
    fn test_session_wire_format_is_camel_case() {
        let json = r#"{
            "userId": "usr_7",
            "accessToken": "tok_xyz",
            "subscriptionStatus": "PREMIUM",
            "companyId": "cmp_1",
            "companyName": "Riverside Cafe"
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.user_id, "usr_7");
        assert!(session.is_premium());
        assert!(session.logo_url.is_none());
    }
}
