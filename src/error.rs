use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum DsyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Figma API error (status: {status:?}): {message}")]
    FigmaApi {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("No usable token data: {0}")]
    NoTokenData(String),
}

impl DsyncError {
    pub fn figma_api(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        DsyncError::FigmaApi {
            status,
            message: message.into(),
        }
    }

    pub fn template(message: impl Into<String>) -> Self {
        DsyncError::Template(message.into())
    }

    pub fn write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DsyncError::Write {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            DsyncError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions.",
            ),
            DsyncError::Network(e) => ErrorPayload::new(
                ErrorCategory::Network,
                e.to_string(),
                "Check connectivity/proxy/VPN and retry.",
            ),
            DsyncError::InvalidUrl(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Verify base_url in the config (e.g., https://api.figma.com).",
            ),
            DsyncError::FigmaApi { status, message } => ErrorPayload::new(
                ErrorCategory::Figma,
                format!("Figma API error (status {:?}): {}", status, message),
                "Check FIGMA_TOKEN/file key and rate limits; retry after waiting.",
            ),
            DsyncError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check JSON inputs (document, snapshot, sample tokens); run with --verbose for details.",
            ),
            DsyncError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("figma_token") || lower.contains("figma token") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Set FIGMA_TOKEN (or FIGMA_OAUTH_TOKEN) before syncing from Figma.",
                    )
                } else if lower.contains("file key") || lower.contains("file_key") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Set file_key in the config or FIGMA_FILE_KEY in the environment.",
                    )
                } else if lower.contains("interval") || lower.contains("timeout") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Use a positive humantime duration such as \"30s\" or \"2m\".",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags/paths and the config file.",
                    )
                }
            }
            DsyncError::Template(msg) => ErrorPayload::new(
                ErrorCategory::Template,
                msg.to_string(),
                "Every template must contain {{NAME}}, {{BODY}}, {{BACKGROUND_COLOR}}, {{TEXT_COLOR}}, {{BORDER_RADIUS}}, {{PADDING}} and {{STATES}}.",
            ),
            DsyncError::Write { .. } => ErrorPayload::new(
                ErrorCategory::Write,
                self.to_string(),
                "Check that the output directory is writable.",
            ),
            DsyncError::NoTokenData(msg) => ErrorPayload::new(
                ErrorCategory::Figma,
                msg.to_string(),
                "Provide Figma credentials or a readable sample_tokens file.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, DsyncError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Network,
    Figma,
    Template,
    Write,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
