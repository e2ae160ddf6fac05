use crate::error::ErrorPayload;
use crate::pipeline::RunReport;
use crate::watch::WatchSummary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version for output payloads.
pub const DSYNC_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum DsyncOutput {
    Sync(RunOutput),
    Generate(RunOutput),
    Watch(WatchOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub version: String,
    pub output_dir: PathBuf,
    #[serde(flatten)]
    pub report: RunReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchOutput {
    pub version: String,
    pub output_dir: PathBuf,
    #[serde(flatten)]
    pub summary: WatchSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{ChangeReason, ChangeReport};
    use crate::diagnostics::Diagnostic;
    use crate::error::DsyncError;
    use crate::pipeline::RunOutcome;

    fn report() -> RunReport {
        RunReport {
            run: 1,
            outcome: RunOutcome::PartiallyWritten,
            source: "file:doc.json".to_string(),
            used_sample: false,
            cancelled_after: None,
            change: Some(ChangeReport {
                changed: true,
                reason: ChangeReason::NoBaseline,
                changed_tokens: Vec::new(),
            }),
            token_count: 4,
            components: vec!["PrimaryButton".to_string()],
            written: vec![PathBuf::from("PrimaryButton.swift")],
            diagnostics: vec![Diagnostic::Write {
                path: PathBuf::from("tests/PrimaryButtonTests.swift"),
                message: "permission denied".to_string(),
            }],
        }
    }

    #[test]
    fn sync_output_flattens_the_report() {
        let output = DsyncOutput::Sync(RunOutput {
            version: DSYNC_OUTPUT_VERSION.to_string(),
            output_dir: PathBuf::from("Generated"),
            report: report(),
        });

        let json = serde_json::to_string(&output).expect("serialize sync output");
        assert!(json.contains("\"mode\":\"sync\""));
        assert!(json.contains("\"outcome\":\"partiallyWritten\""));
        assert!(json.contains("\"reason\":\"noBaseline\""));
        assert!(json.contains("\"type\":\"write\""));
        assert!(json.contains("\"outputDir\":\"Generated\""));
    }

    #[test]
    fn watch_output_serializes_counts() {
        let output = DsyncOutput::Watch(WatchOutput {
            version: DSYNC_OUTPUT_VERSION.to_string(),
            output_dir: PathBuf::from("Generated"),
            summary: WatchSummary {
                ticks: 5,
                runs: 3,
                skipped: 2,
                ..WatchSummary::default()
            },
        });

        let json = serde_json::to_string(&output).expect("serialize watch output");
        assert!(json.contains("\"mode\":\"watch\""));
        assert!(json.contains("\"skipped\":2"));
        assert!(!json.contains("\"last\""));
    }

    #[test]
    fn error_output_carries_category() {
        let payload = DsyncError::NoTokenData("nothing".to_string()).to_payload();
        let output = DsyncOutput::Error(ErrorOutput {
            version: DSYNC_OUTPUT_VERSION.to_string(),
            message: Some(payload.message.clone()),
            error: payload,
        });

        let json = serde_json::to_string(&output).expect("serialize error output");
        assert!(json.contains("\"mode\":\"error\""));
        assert!(json.contains("\"category\":\"figma\""));
    }
}
