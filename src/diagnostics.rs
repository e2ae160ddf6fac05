//! Recoverable problems accumulated during a run.
//!
//! Each variant corresponds to an error the pipeline recovers from locally;
//! they are logged where they occur and surfaced in the run report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::types::TokenCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Diagnostic {
    /// The document could not be fetched; the bundled sample was used.
    #[serde(rename_all = "camelCase")]
    Fetch { message: String },
    /// A node or subtree was skipped.
    #[serde(rename_all = "camelCase")]
    MalformedNode {
        parent_id: Option<String>,
        node_id: Option<String>,
        reason: String,
    },
    /// No canonical token was close enough; the category default was used.
    #[serde(rename_all = "camelCase")]
    NoTokenMatch {
        category: TokenCategory,
        value: String,
        fallback: String,
    },
    /// Two identifiers collapsed to the same sanitized name.
    #[serde(rename_all = "camelCase")]
    NameCollision { original: String, renamed: String },
    /// A component could not be rendered.
    #[serde(rename_all = "camelCase")]
    Synthesis { component: String, message: String },
    /// A single artifact could not be persisted.
    #[serde(rename_all = "camelCase")]
    Write { path: PathBuf, message: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Fetch { message } => {
                write!(f, "fetch failed, using sample tokens: {message}")
            }
            Diagnostic::MalformedNode {
                parent_id,
                node_id,
                reason,
            } => write!(
                f,
                "skipped malformed node {} under {}: {reason}",
                node_id.as_deref().unwrap_or("<unknown>"),
                parent_id.as_deref().unwrap_or("<root>")
            ),
            Diagnostic::NoTokenMatch {
                category,
                value,
                fallback,
            } => write!(
                f,
                "no {} token near {value}; using {fallback}",
                category.as_str()
            ),
            Diagnostic::NameCollision { original, renamed } => {
                write!(f, "name collision on {original}; renamed to {renamed}")
            }
            Diagnostic::Synthesis { component, message } => {
                write!(f, "could not synthesize {component}: {message}")
            }
            Diagnostic::Write { path, message } => {
                write!(f, "failed to write {}: {message}", path.display())
            }
        }
    }
}
