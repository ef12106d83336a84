//! Session and token storage.
//!
//! The session holds an opaque bearer token and the last-fetched user
//! profile. It lives redundantly in memory and in a durable storage backend;
//! durable storage is the source of truth across process restarts. No expiry
//! is tracked client-side — a 401 from the backend is the only invalidity
//! signal, and the HTTP client reacts to it by clearing the session.

use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::types::UserProfile;
use crate::util::atomic_write_str;

/// The persisted session record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl Session {
    fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Durable key-value collaborator behind the in-memory session cache.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<Session>, ClientError>;
    fn store(&self, session: &Session) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// JSON file backend at `~/.execsec/session.json` (overridable).
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new() -> Self {
        Self {
            path: default_session_path(),
        }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Default session file location.
pub fn default_session_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".execsec")
        .join("session.json")
}

impl TokenStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    fn store(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
                }
            }
        }

        let content = serde_json::to_string_pretty(session)?;
        atomic_write_str(&self.path, &content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-process backend for tests and demo mode.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Option<Session>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.inner.lock().clone())
    }

    fn store(&self, session: &Session) -> Result<(), ClientError> {
        *self.inner.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.inner.lock() = None;
        Ok(())
    }
}

struct Cache {
    loaded: bool,
    session: Session,
}

/// In-memory session cache over a durable storage backend.
///
/// Reads load lazily from storage once and stay cached until the next write.
/// Writes go to storage first, then the cache, so every subsequent request
/// immediately observes the change.
pub struct SessionStore {
    storage: Box<dyn TokenStorage>,
    cache: Mutex<Cache>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        Self {
            storage,
            cache: Mutex::new(Cache {
                loaded: false,
                session: Session::default(),
            }),
        }
    }

    /// File-backed store at the default location.
    pub fn file_backed() -> Self {
        Self::new(Box::new(FileStorage::new()))
    }

    /// In-memory store with no durable backing beyond process lifetime.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    fn with_session<T>(&self, f: impl FnOnce(&Session) -> T) -> T {
        let mut cache = self.cache.lock();
        if !cache.loaded {
            match self.storage.load() {
                Ok(Some(session)) => cache.session = session,
                Ok(None) => {}
                Err(err) => {
                    log::warn!("session storage read failed, starting unauthenticated: {err}");
                }
            }
            cache.loaded = true;
        }
        f(&cache.session)
    }

    fn update(&self, f: impl FnOnce(&mut Session)) -> Result<(), ClientError> {
        let mut cache = self.cache.lock();
        if !cache.loaded {
            if let Ok(Some(session)) = self.storage.load() {
                cache.session = session;
            }
            cache.loaded = true;
        }
        f(&mut cache.session);
        if cache.session.is_empty() {
            self.storage.clear()?;
        } else {
            self.storage.store(&cache.session)?;
        }
        Ok(())
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.with_session(|s| s.token.clone())
    }

    /// Replace the token. `None` removes it from memory and storage.
    pub fn set_token(&self, token: Option<String>) -> Result<(), ClientError> {
        self.update(|s| s.token = token)
    }

    /// Last-fetched user profile, if any.
    pub fn user(&self) -> Option<UserProfile> {
        self.with_session(|s| s.user.clone())
    }

    /// Replace the profile wholesale. Never merged.
    pub fn set_user(&self, user: Option<UserProfile>) -> Result<(), ClientError> {
        self.update(|s| s.user = user)
    }

    /// Store a full login result in one write.
    pub fn set_session(&self, token: String, user: UserProfile) -> Result<(), ClientError> {
        self.update(|s| {
            s.token = Some(token);
            s.user = Some(user);
        })
    }

    /// Hard logout: wipe token and profile from memory and storage.
    pub fn clear(&self) -> Result<(), ClientError> {
        self.update(|s| *s = Session::default())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_token_roundtrip_in_memory() {
        let store = SessionStore::in_memory();
        assert!(store.token().is_none());
        assert!(!store.is_authenticated());

        store.set_token(Some("x".to_string())).unwrap();
        assert_eq!(store.token().as_deref(), Some("x"));
        assert!(store.is_authenticated());

        store.set_token(None).unwrap();
        assert!(store.token().is_none());
    }

    #[test]
    fn test_fresh_store_rereads_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::new(Box::new(FileStorage::at(path.clone())));
        store.set_token(Some("x".to_string())).unwrap();

        // A fresh in-memory client over the same file sees the token.
        let fresh = SessionStore::new(Box::new(FileStorage::at(path)));
        assert_eq!(fresh.token().as_deref(), Some("x"));
    }

    #[test]
    fn test_clear_removes_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::new(Box::new(FileStorage::at(path.clone())));
        store.set_session("x".to_string(), profile()).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.token().is_none());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_profile_replaced_wholesale() {
        let store = SessionStore::in_memory();
        store.set_user(Some(profile())).unwrap();

        let replacement = UserProfile {
            full_name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            avatar_url: Some("https://example.com/g.png".to_string()),
        };
        store.set_user(Some(replacement.clone())).unwrap();
        assert_eq!(store.user(), Some(replacement));
    }

    #[test]
    fn test_set_token_none_keeps_user() {
        let store = SessionStore::in_memory();
        store.set_session("x".to_string(), profile()).unwrap();

        store.set_token(None).unwrap();
        assert!(store.token().is_none());
        assert_eq!(store.user().map(|u| u.email), Some("ada@example.com".into()));
    }

    #[test]
    fn test_missing_file_means_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(Box::new(FileStorage::at(dir.path().join("none.json"))));
        assert!(store.token().is_none());
    }

    #[test]
    fn test_new_token_fully_replaces_old() {
        let store = SessionStore::in_memory();
        store.set_token(Some("old".to_string())).unwrap();
        store.set_token(Some("new".to_string())).unwrap();
        assert_eq!(store.token().as_deref(), Some("new"));
    }
}
