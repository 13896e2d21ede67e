use crate::LinkStoreError;

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::debug;

const STATE_FILENAME: &str = "github_oauth_state";

/// Holds the single outstanding OAuth correlation token between `start`
/// and `complete`.
pub trait CorrelationStore: Send + Sync {
    /// Replace any previous token.
    fn save(&self, token: &str) -> Result<(), LinkStoreError>;

    /// Load and delete the token. A second call returns `None`.
    fn take(&self) -> Result<Option<String>, LinkStoreError>;
}

/// Token kept in `github_oauth_state` under the config directory, so a
/// callback handled by another process can still verify it.
pub struct FileCorrelationStore {
    path: PathBuf,
}

impl FileCorrelationStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STATE_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LinkStoreError {
        LinkStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CorrelationStore for FileCorrelationStore {
    fn save(&self, token: &str) -> Result<(), LinkStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write-then-rename so a reader never sees a partial token
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, token).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!("Saved OAuth state to {}", self.path.display());
        Ok(())
    }

    fn take(&self) -> Result<Option<String>, LinkStoreError> {
        let token = match fs::read_to_string(&self.path) {
            Ok(token) => token,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        }

        let token = token.trim().to_string();
        Ok((!token.is_empty()).then_some(token))
    }
}

#[derive(Default)]
pub struct MemoryCorrelationStore {
    token: Mutex<Option<String>>,
}

impl MemoryCorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CorrelationStore for MemoryCorrelationStore {
    fn save(&self, token: &str) -> Result<(), LinkStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn take(&self) -> Result<Option<String>, LinkStoreError> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).take())
    }
}
