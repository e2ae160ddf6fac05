use dsync_lib::{Diagnostic, DsyncError, ErrorCategory};
use std::path::PathBuf;

#[test]
fn config_error_display_includes_message() {
    let err = DsyncError::Config("missing output_dir".to_string());

    assert_eq!(format!("{}", err), "Configuration error: missing output_dir");
}

#[test]
fn io_error_display_wraps_source() {
    let io_err = std::io::Error::other("disk full");
    let err: DsyncError = io_err.into();
    let rendered = format!("{}", err);

    assert!(rendered.starts_with("IO error: "));
    assert!(rendered.contains("disk full"));
}

#[test]
fn figma_api_helper_includes_status_and_message() {
    let err = DsyncError::figma_api(Some(reqwest::StatusCode::NOT_FOUND), "not found");

    assert_eq!(
        format!("{}", err),
        "Figma API error (status: Some(404)): not found"
    );
}

#[test]
fn figma_api_helper_handles_missing_status() {
    let err = DsyncError::figma_api(None, "missing token");

    assert_eq!(
        format!("{}", err),
        "Figma API error (status: None): missing token"
    );
}

#[test]
fn template_helper_uses_message() {
    let err = DsyncError::template("card template is missing {{BODY}}");

    assert_eq!(
        format!("{}", err),
        "Template error: card template is missing {{BODY}}"
    );
    assert_eq!(err.to_payload().category, ErrorCategory::Template);
}

#[test]
fn no_token_data_has_remediation() {
    let payload = DsyncError::NoTokenData("empty".to_string()).to_payload();

    assert!(payload
        .remediation
        .unwrap_or_default()
        .contains("sample_tokens"));
}

#[test]
fn write_diagnostic_display_names_path() {
    let diag = Diagnostic::Write {
        path: PathBuf::from("tokens/Colors.swift"),
        message: "read-only file system".to_string(),
    };

    assert_eq!(
        diag.to_string(),
        "failed to write tokens/Colors.swift: read-only file system"
    );
}
