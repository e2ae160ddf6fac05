//! Bundled fallback token set used when the document cannot be fetched.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{DsyncError, Result};
use crate::types::TokenSnapshot;

const BUILTIN: &str = include_str!("../assets/sample_tokens.json");

/// The token set compiled into the binary.
pub fn builtin_snapshot() -> Result<TokenSnapshot> {
    Ok(serde_json::from_str(BUILTIN)?)
}

/// Load the sample set from `path` when given, else the bundled one.
/// An empty set is an error: there is nothing to synthesize from.
pub fn load_sample(path: Option<&Path>) -> Result<TokenSnapshot> {
    let snapshot = match path {
        Some(path) => {
            info!(path = %path.display(), "loading sample tokens");
            let raw = fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        }
        None => builtin_snapshot()?,
    };
    if snapshot.is_empty() {
        return Err(DsyncError::NoTokenData(
            "sample token set contains no tokens".to_string(),
        ));
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_sample_has_every_category() {
        let snapshot = builtin_snapshot().expect("bundled sample parses");
        assert_eq!(snapshot.colors.len(), 5);
        assert_eq!(snapshot.typography.len(), 4);
        assert_eq!(snapshot.spacing["md"], 16.0);
        assert_eq!(snapshot.radii["full"], 9999.0);
        assert_eq!(snapshot.shadows.len(), 2);
        assert!(snapshot.timestamp.is_none());
    }

    #[test]
    fn override_path_replaces_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, r#"{"spacing": {"gutter": 12.0}}"#).unwrap();

        let snapshot = load_sample(Some(&path)).expect("load override");
        assert_eq!(snapshot.token_count(), 1);
        assert_eq!(snapshot.spacing["gutter"], 12.0);
    }

    #[test]
    fn empty_or_missing_sample_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(&path, "{}").unwrap();
        assert!(matches!(load_sample(Some(&path)), Err(DsyncError::NoTokenData(_))));
        assert!(matches!(
            load_sample(Some(&dir.path().join("missing.json"))),
            Err(DsyncError::Io(_))
        ));
    }
}
