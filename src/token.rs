use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::AccessToken;

/// Holder of the current access token.
///
/// Implementations only need to persist one opaque string; absence means
/// unauthenticated. Expiry is never tracked here.
///
/// `get` runs on every request from async code, so it must be cheap and must
/// not wait on other tasks. Writes happen only on sign-in, refresh and logout.
pub trait TokenStore: Send + Sync + 'static {
    /// The stored token, if any.
    fn get(&self) -> Option<AccessToken>;

    /// Replace the stored token.
    fn set(&self, token: AccessToken) -> Result<(), Error>;

    /// Remove the stored token.
    fn clear(&self) -> Result<(), Error>;
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AccessToken>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token.
    #[must_use]
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<AccessToken> {
        self.token.lock().clone()
    }

    fn set(&self, token: AccessToken) -> Result<(), Error> {
        *self.token.lock() = Some(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.token.lock() = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    #[serde(rename = "authToken")]
    auth_token: AccessToken,
}

/// Durable token store: a single-key JSON document on disk.
///
/// Survives process restarts. Writes go to a sibling temp file first and are
/// renamed into place, so a crash never leaves a half-written token.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create a store at the path named by `TASKMGR_TOKEN_FILE`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `TASKMGR_TOKEN_FILE` is not set.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let path = var("TASKMGR_TOKEN_FILE")
            .ok_or_else(|| Error::Config("TASKMGR_TOKEN_FILE is required".into()))?;
        Ok(Self::new(path))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<AccessToken> {
        let _guard = self.lock.lock();
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Token file unreadable");
                return None;
            }
        };
        match serde_json::from_slice::<StoredCredential>(&raw) {
            Ok(stored) if !stored.auth_token.is_empty() => Some(stored.auth_token),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Token file corrupt, ignoring");
                None
            }
        }
    }

    fn set(&self, token: AccessToken) -> Result<(), Error> {
        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_vec(&StoredCredential { auth_token: token })?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(|e| Error::Storage(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Storage(format!("{}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<(), Error> {
        let _guard = self.lock.lock();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("{}: {e}", self.path.display()))),
        }
    }
}

/// Outcome of committing a refreshed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshCommit {
    /// The refreshed token is now current.
    Committed(AccessToken),
    /// Someone logged in or out while the refresh was in flight; the refreshed
    /// token was discarded. Carries whatever is current now.
    Superseded(Option<AccessToken>),
}

/// The single current-token view shared by every session component.
///
/// Each `replace` or `clear` advances a write epoch. A refresh captures the
/// epoch before its exchange and only commits if it is unchanged, so a clear
/// is never overwritten by a stale refresh result.
pub struct SharedToken {
    store: Arc<dyn TokenStore>,
    epoch: Mutex<u64>,
}

impl SharedToken {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            epoch: Mutex::new(0),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<AccessToken> {
        self.store.get()
    }

    /// Current token together with the epoch it was read at.
    ///
    /// The store is read outside the epoch lock. Writers hold the lock for
    /// the whole write, so an unchanged epoch on both sides of the read means
    /// no write overlapped it.
    #[must_use]
    pub fn snapshot(&self) -> (u64, Option<AccessToken>) {
        loop {
            let before = *self.epoch.lock();
            let token = self.store.get();
            if *self.epoch.lock() == before {
                return (before, token);
            }
        }
    }

    /// Install a freshly issued token (login, OAuth callback).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backing store cannot persist it.
    pub fn replace(&self, token: AccessToken) -> Result<(), Error> {
        let mut epoch = self.epoch.lock();
        *epoch += 1;
        self.store.set(token)
    }

    /// Drop the current token (logout, terminal refresh failure).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backing store cannot remove it.
    pub fn clear(&self) -> Result<(), Error> {
        let mut epoch = self.epoch.lock();
        *epoch += 1;
        self.store.clear()
    }

    /// Store a refreshed token only if nothing was written since `observed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backing store cannot persist it.
    pub fn commit_refresh(
        &self,
        observed: u64,
        token: AccessToken,
    ) -> Result<RefreshCommit, Error> {
        let mut epoch = self.epoch.lock();
        if *epoch != observed {
            return Ok(RefreshCommit::Superseded(self.store.get()));
        }
        *epoch += 1;
        self.store.set(token.clone())?;
        Ok(RefreshCommit::Committed(token))
    }
}

impl std::fmt::Debug for SharedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedToken")
            .field("epoch", &*self.epoch.lock())
            .finish_non_exhaustive()
    }
}
