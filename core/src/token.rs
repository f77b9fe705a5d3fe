//! Session token storage.
//!
//! `Session` reads the token through `TokenStore::get` before every
//! authenticated request and never caches it, so a token written by a new
//! login (or removed by logout) takes effect on the very next call.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ApiError;

/// Key under which the session token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Capability for reading and writing the courier's session token.
pub trait TokenStore {
    /// The current token, or `None` when logged out. Read failures are
    /// logged and reported as `None` so requests still go out.
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> Result<(), ApiError>;

    fn clear(&self) -> Result<(), ApiError>;
}

impl<S: TokenStore + ?Sized> TokenStore for &S {
    fn get(&self) -> Option<String> {
        (**self).get()
    }

    fn set(&self, token: &str) -> Result<(), ApiError> {
        (**self).set(token)
    }

    fn clear(&self) -> Result<(), ApiError> {
        (**self).clear()
    }
}

/// In-process token store. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.slot.lock().ok()?.clone()
    }

    fn set(&self, token: &str) -> Result<(), ApiError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| ApiError::TokenStore(e.to_string()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| ApiError::TokenStore(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// Token store backed by a single file named `TOKEN_KEY` inside `dir`.
///
/// On Unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unable to read session token");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ApiError::TokenStore(e.to_string()))?;
        }
        write_private(&self.path, token).map_err(|e| ApiError::TokenStore(e.to_string()))
    }

    fn clear(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::TokenStore(e.to_string())),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}
