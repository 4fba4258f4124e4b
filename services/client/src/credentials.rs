//! Access credential storage
//!
//! The store owns the access credential. Login, refresh and logout are the
//! only writers. Absence is a normal state: no operation here fails.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

/// Opaque bearer token proving authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Storage for the access credential
pub trait CredentialStore: Send + Sync {
    /// Current credential, if any
    fn get(&self) -> Option<Credential>;

    /// Replace the stored credential
    fn set(&self, credential: Credential);

    /// Forget the stored credential
    fn clear(&self);

    /// A session exists iff a non-empty credential is stored
    fn is_authenticated(&self) -> bool {
        self.get().is_some_and(|credential| !credential.is_empty())
    }
}

/// Process-local credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, credential: Credential) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    fn clear(&self) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Credential store persisted to a JSON file, one entry per API origin
///
/// The file maps an origin (e.g. `http://localhost:8080`) to its access
/// token, so sessions against different servers do not clobber each other.
/// Write failures are logged and the in-memory copy stays authoritative.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    origin: String,
    cached: RwLock<Option<Credential>>,
}

impl FileCredentialStore {
    /// Open the store at `path` for `origin`, loading any saved credential
    pub fn open(path: impl Into<PathBuf>, origin: impl Into<String>) -> Self {
        let path = path.into();
        let origin = origin.into();
        let cached = read_entries(&path)
            .remove(&origin)
            .map(Credential::new)
            .filter(|credential| !credential.is_empty());

        debug!(
            "Opened credential file {} for {} (stored credential: {})",
            path.display(),
            origin,
            cached.is_some()
        );

        Self {
            path,
            origin,
            cached: RwLock::new(cached),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, credential: Option<&Credential>) {
        let mut entries = read_entries(&self.path);
        match credential {
            Some(credential) => {
                entries.insert(self.origin.clone(), credential.as_str().to_string());
            }
            None => {
                entries.remove(&self.origin);
            }
        }

        if let Err(e) = write_entries(&self.path, &entries) {
            warn!(
                "Failed to persist credential file {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, credential: Credential) {
        self.persist(Some(&credential));
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    fn clear(&self) {
        self.persist(None);
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn read_entries(path: &Path) -> HashMap<String, String> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(
            "Ignoring unreadable credential file {}: {}",
            path.display(),
            e
        );
        HashMap::new()
    })
}

fn write_entries(path: &Path, entries: &HashMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(entries)?;
    fs::write(path, raw)
}
