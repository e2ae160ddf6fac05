//! Persisting generated artifacts under the output directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::diagnostics::Diagnostic;
use crate::types::GeneratedArtifact;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReport {
    /// Paths written, relative to the output directory.
    pub written: Vec<PathBuf>,
    pub failures: Vec<Diagnostic>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes artifacts independently; one failure never stops the others.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_all(&self, artifacts: &[GeneratedArtifact]) -> WriteReport {
        let mut report = WriteReport::default();
        for artifact in artifacts {
            match self.write_one(artifact) {
                Ok(()) => {
                    debug!(path = %artifact.relative_path.display(), "wrote artifact");
                    report.written.push(artifact.relative_path.clone());
                }
                Err(message) => {
                    warn!(path = %artifact.relative_path.display(), %message, "artifact write failed");
                    report.failures.push(Diagnostic::Write {
                        path: artifact.relative_path.clone(),
                        message,
                    });
                }
            }
        }
        report
    }

    fn write_one(&self, artifact: &GeneratedArtifact) -> Result<(), String> {
        let relative = &artifact.relative_path;
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.as_os_str().is_empty() || !contained {
            return Err("path escapes the output directory".to_string());
        }

        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        fs::write(&target, &artifact.content).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactKind;
    use tempfile::TempDir;

    fn artifact(path: &str, content: &str) -> GeneratedArtifact {
        GeneratedArtifact {
            relative_path: PathBuf::from(path),
            content: content.to_string(),
            kind: ArtifactKind::ComponentSource,
        }
    }

    #[test]
    fn writes_nested_paths_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());

        let report = writer.write_all(&[artifact("previews/CardView.swift", "one")]);
        assert!(report.is_complete());
        let report = writer.write_all(&[artifact("previews/CardView.swift", "two")]);
        assert_eq!(report.written, vec![PathBuf::from("previews/CardView.swift")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("previews/CardView.swift")).unwrap(),
            "two"
        );
    }

    #[test]
    fn one_failure_does_not_abort_the_rest() {
        let dir = TempDir::new().unwrap();
        // A file where a directory is needed makes that one write fail.
        fs::write(dir.path().join("tests"), "blocker").unwrap();
        let writer = OutputWriter::new(dir.path());

        let report = writer.write_all(&[
            artifact("Card.swift", "card"),
            artifact("tests/CardTests.swift", "tests"),
            artifact("../escape.swift", "nope"),
            artifact("Button.swift", "button"),
        ]);

        assert_eq!(
            report.written,
            vec![PathBuf::from("Card.swift"), PathBuf::from("Button.swift")]
        );
        assert_eq!(report.failures.len(), 2);
        assert!(!dir.path().parent().unwrap().join("escape.swift").exists());
    }
}
