//! Credential storage with a client-side expiry horizon.
//!
//! Storage failures never reach the caller: an unreadable or unwritable store
//! behaves like an empty one (the user simply has to log in again) and the
//! failure is logged.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque session token issued by the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential storage unavailable: {0}")]
    Unavailable(String),

    #[error("credential storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored credential is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable home of the session credential.
///
/// Only the session state writes through this trait.
pub trait CredentialStore: Send + Sync {
    /// The stored credential, if present and not past its expiry.
    fn load(&self) -> Option<Credential>;

    /// Persist `credential`, replacing any previous one, for `ttl`.
    fn save(&self, credential: &Credential, ttl: Duration);

    /// Remove the stored credential. Removing nothing is not an error.
    fn clear(&self);
}

/// On-disk / in-storage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCredential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl StoredCredential {
    fn new(credential: &Credential, ttl: Duration) -> Self {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).unwrap_or_else(|| {
            tracing::warn!(ttl_days = ttl.num_days(), "credential ttl out of range; keeping until the end of time");
            DateTime::<Utc>::MAX_UTC
        });
        Self {
            token: credential.as_str().to_string(),
            expires_at,
        }
    }

    fn live(self, now: DateTime<Utc>) -> Option<Credential> {
        (now < self.expires_at).then(|| Credential::new(self.token))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local store, for tests and embedders with their own persistence.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: RwLock<Option<StoredCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `credential`.
    pub fn with_credential(credential: &Credential, ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(Some(StoredCredential::new(credential, ttl))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credential> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.clone().and_then(|stored| stored.live(Utc::now()))
    }

    fn save(&self, credential: &Credential, ttl: Duration) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(StoredCredential::new(credential, ttl));
    }

    fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File store
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileCredentialStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::path::{Path, PathBuf};

    use chrono::{Duration, Utc};

    use super::{Credential, CredentialStore, CredentialStoreError, StoredCredential};
    use crate::config::ClientConfig;

    /// JSON record in a file, surviving process restarts.
    #[derive(Debug, Clone)]
    pub struct FileCredentialStore {
        path: PathBuf,
    }

    impl FileCredentialStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// Use the configured path, or `<data dir>/reportdesk/<key>.json`.
        pub fn from_config(config: &ClientConfig) -> Result<Self, CredentialStoreError> {
            if let Some(path) = &config.credential_path {
                return Ok(Self::new(path.clone()));
            }
            let dir = dirs::data_dir().ok_or_else(|| {
                CredentialStoreError::Unavailable("could not determine data directory".to_string())
            })?;
            Ok(Self::new(
                dir.join("reportdesk")
                    .join(format!("{}.json", config.credential_key)),
            ))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn try_load(&self) -> Result<Option<Credential>, CredentialStoreError> {
            let raw = match std::fs::read_to_string(&self.path) {
                Ok(raw) => raw,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(err.into()),
            };
            let stored: StoredCredential = serde_json::from_str(&raw)?;
            let live = stored.live(Utc::now());
            if live.is_none() {
                tracing::debug!(path = ?self.path, "stored credential expired; removing");
                self.try_clear()?;
            }
            Ok(live)
        }

        fn try_save(&self, credential: &Credential, ttl: Duration) -> Result<(), CredentialStoreError> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let record = serde_json::to_vec(&StoredCredential::new(credential, ttl))?;

            // Write-then-rename so a crash never leaves a torn record.
            let tmp = self.path.with_extension("json.tmp");
            std::fs::write(&tmp, record)?;
            restrict_permissions(&tmp)?;
            std::fs::rename(&tmp, &self.path)?;
            Ok(())
        }

        fn try_clear(&self) -> Result<(), CredentialStoreError> {
            match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            }
        }
    }

    #[cfg(unix)]
    fn restrict_permissions(path: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
    }

    #[cfg(not(unix))]
    fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
        Ok(())
    }

    impl CredentialStore for FileCredentialStore {
        fn load(&self) -> Option<Credential> {
            match self.try_load() {
                Ok(credential) => credential,
                Err(err) => {
                    tracing::warn!(path = ?self.path, "failed to load credential: {err}");
                    None
                }
            }
        }

        fn save(&self, credential: &Credential, ttl: Duration) {
            if let Err(err) = self.try_save(credential, ttl) {
                tracing::warn!(path = ?self.path, "failed to persist credential: {err}");
            }
        }

        fn clear(&self) {
            if let Err(err) = self.try_clear() {
                tracing::warn!(path = ?self.path, "failed to clear credential: {err}");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Browser store
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserCredentialStore;

#[cfg(target_arch = "wasm32")]
mod browser {
    use chrono::{Duration, Utc};

    use super::{Credential, CredentialStore, CredentialStoreError, StoredCredential};

    /// `window.localStorage` under a fixed key.
    #[derive(Debug, Clone)]
    pub struct BrowserCredentialStore {
        key: String,
    }

    impl BrowserCredentialStore {
        pub fn new(key: impl Into<String>) -> Self {
            Self { key: key.into() }
        }

        fn storage(&self) -> Result<web_sys::Storage, CredentialStoreError> {
            let window = web_sys::window()
                .ok_or_else(|| CredentialStoreError::Unavailable("no window object".to_string()))?;
            window
                .local_storage()
                .map_err(|e| CredentialStoreError::Unavailable(format!("{e:?}")))?
                .ok_or_else(|| CredentialStoreError::Unavailable("localStorage disabled".to_string()))
        }

        fn try_load(&self) -> Result<Option<Credential>, CredentialStoreError> {
            let storage = self.storage()?;
            let raw = storage
                .get_item(&self.key)
                .map_err(|e| CredentialStoreError::Unavailable(format!("{e:?}")))?;
            let Some(raw) = raw else {
                return Ok(None);
            };
            let stored: StoredCredential = serde_json::from_str(&raw)?;
            let live = stored.live(Utc::now());
            if live.is_none() {
                self.try_clear()?;
            }
            Ok(live)
        }

        fn try_save(&self, credential: &Credential, ttl: Duration) -> Result<(), CredentialStoreError> {
            let record = serde_json::to_string(&StoredCredential::new(credential, ttl))?;
            self.storage()?
                .set_item(&self.key, &record)
                .map_err(|e| CredentialStoreError::Unavailable(format!("{e:?}")))
        }

        fn try_clear(&self) -> Result<(), CredentialStoreError> {
            self.storage()?
                .remove_item(&self.key)
                .map_err(|e| CredentialStoreError::Unavailable(format!("{e:?}")))
        }
    }

    impl CredentialStore for BrowserCredentialStore {
        fn load(&self) -> Option<Credential> {
            self.try_load()
                .map_err(|err| tracing::warn!(key = %self.key, "failed to load credential: {err}"))
                .ok()
                .flatten()
        }

        fn save(&self, credential: &Credential, ttl: Duration) {
            if let Err(err) = self.try_save(credential, ttl) {
                tracing::warn!(key = %self.key, "failed to persist credential: {err}");
            }
        }

        fn clear(&self) {
            if let Err(err) = self.try_clear() {
                tracing::warn!(key = %self.key, "failed to clear credential: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_lifecycle() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().is_none());

        store.save(&Credential::new("tok-1"), Duration::days(7));
        assert_eq!(store.load(), Some(Credential::new("tok-1")));

        store.save(&Credential::new("tok-2"), Duration::days(7));
        assert_eq!(store.load(), Some(Credential::new("tok-2")));

        store.clear();
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn expired_credentials_read_as_absent() {
        let store = MemoryCredentialStore::new();
        store.save(&Credential::new("stale"), Duration::seconds(-1));
        assert!(store.load().is_none());

        let store = MemoryCredentialStore::with_credential(&Credential::new("stale"), Duration::zero());
        assert!(store.load().is_none());
    }

    #[test]
    fn out_of_range_ttl_saturates_instead_of_panicking() {
        let store = MemoryCredentialStore::new();
        store.save(&Credential::new("tok"), Duration::days(1_000_000_000));
        assert_eq!(store.load(), Some(Credential::new("tok")));

        let stored = StoredCredential::new(&Credential::new("tok"), Duration::days(1_000_000_000));
        assert_eq!(stored.expires_at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let rendered = format!("{:?}", Credential::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod file_store {
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicUsize, Ordering};

        use super::*;

        fn scratch_path(name: &str) -> PathBuf {
            static COUNTER: AtomicUsize = AtomicUsize::new(0);
            let n = COUNTER.fetch_add(1, Ordering::SeqCst);
            std::env::temp_dir()
                .join(format!("reportdesk-cred-{}-{}", std::process::id(), n))
                .join(name)
        }

        #[test]
        fn survives_a_new_store_instance() {
            let path = scratch_path("credential.json");
            FileCredentialStore::new(&path).save(&Credential::new("persisted"), Duration::days(7));

            let reopened = FileCredentialStore::new(&path);
            assert_eq!(reopened.load(), Some(Credential::new("persisted")));

            reopened.clear();
            assert!(!path.exists());
            assert!(reopened.load().is_none());
        }

        #[test]
        fn expired_record_is_removed_on_load() {
            let path = scratch_path("credential.json");
            let store = FileCredentialStore::new(&path);
            store.save(&Credential::new("old"), Duration::seconds(-5));

            assert!(path.exists());
            assert!(store.load().is_none());
            assert!(!path.exists());
        }

        #[test]
        fn corrupt_record_reads_as_absent() {
            let path = scratch_path("credential.json");
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "{ not json").unwrap();

            assert!(FileCredentialStore::new(&path).load().is_none());
        }

        #[test]
        fn configured_path_wins() {
            let config = crate::ClientConfig {
                credential_path: Some(PathBuf::from("/tmp/elsewhere.json")),
                ..Default::default()
            };
            let store = FileCredentialStore::from_config(&config).unwrap();
            assert_eq!(store.path(), PathBuf::from("/tmp/elsewhere.json").as_path());
        }
    }
}
