//! Persistence of the last synchronized snapshot.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{DsyncError, Result};
use crate::types::TokenSnapshot;

/// A snapshot file replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored baseline. A missing file means there is none; an
    /// unreadable one is logged and treated the same way.
    pub fn load(&self) -> Result<Option<TokenSnapshot>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt snapshot");
                Ok(None)
            }
        }
    }

    /// Write to a temporary file next to the target, then rename over it.
    pub fn save(&self, snapshot: &TokenSnapshot) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut json = snapshot.to_canonical_json()?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| DsyncError::write(&self.path, e.error.to_string()))?;
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}
