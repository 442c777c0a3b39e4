//! # Session Store Module
//!
//! Persists the user-account sign-in result as a JSON document. The file is
//! loaded once at startup and replaced wholesale after every successful login.

use std::io::Write;
use std::path::PathBuf;

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("failed to write session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored session; unreadable or malformed files count as absent
    pub fn load(&self) -> Option<Value> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored session");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(session) => {
                info!(path = %self.path.display(), "Loaded stored session");
                Some(session)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Session file is not valid JSON");
                None
            }
        }
    }

    /// Overwrite the stored session with `session`
    pub fn save(&self, session: &Value) -> Result<(), SessionStoreError> {
        let bytes = serde_json::to_vec(session)?;
        let io_err = |source| SessionStoreError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut temp_file = NamedTempFile::new_in(&dir).map_err(io_err)?;
        temp_file.write_all(&bytes).map_err(io_err)?;
        temp_file.as_file().sync_all().map_err(io_err)?;
        temp_file.persist(&self.path).map_err(|e| io_err(e.error))?;

        info!(path = %self.path.display(), bytes = bytes.len(), "Session saved");
        Ok(())
    }
}
