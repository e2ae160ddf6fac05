use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dsync_lib::{
    DsyncError, DsyncOutput, ErrorOutput, RunOutcome, RunOutput, DSYNC_OUTPUT_VERSION,
};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &DsyncOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: DsyncError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = DsyncOutput::Error(ErrorOutput {
        version: DSYNC_OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Exit code 2 is reserved for failed runs; partial writes use 1.
    ExitCode::from(2)
}

fn write_json_output(body: &DsyncOutput, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

fn write_pretty_output(body: &DsyncOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &DsyncOutput, colorize: bool) -> String {
    match body {
        DsyncOutput::Sync(out) => format_run("[SYNC]", out, colorize),
        DsyncOutput::Generate(out) => format_run("[GENERATE]", out, colorize),
        DsyncOutput::Watch(out) => {
            let mut buf = String::new();
            let header = color("[WATCH]", "34", colorize);
            let summary = &out.summary;
            writeln!(
                buf,
                "{} {} run(s) over {} tick(s), {} skipped, {} failed",
                header, summary.runs, summary.ticks, summary.skipped, summary.failures
            )
            .ok();
            writeln!(
                buf,
                "Written: {} full, {} partial into {}",
                summary.written,
                summary.partially_written,
                out.output_dir.display()
            )
            .ok();
            if let Some(last) = &summary.last {
                writeln!(buf, "Last run: #{} {}", last.run, outcome_label(last.outcome, colorize)).ok();
            }
            buf
        }
        DsyncOutput::Error(out) => {
            let mut buf = String::new();
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
            buf
        }
    }
}

fn format_run(label: &str, out: &RunOutput, colorize: bool) -> String {
    let mut buf = String::new();
    let report = &out.report;
    let header = color(label, "36", colorize);
    writeln!(buf, "{} {}", header, outcome_label(report.outcome, colorize)).ok();
    let source = if report.used_sample {
        format!("{} (sample tokens)", report.source)
    } else {
        report.source.clone()
    };
    writeln!(buf, "Source: {source}").ok();
    writeln!(buf, "Tokens: {}", report.token_count).ok();

    if let Some(change) = &report.change {
        writeln!(buf, "Change: {:?}", change.reason).ok();
        let mut changed = change.changed_tokens.clone();
        if changed.len() > 10 {
            changed.truncate(10);
        }
        for token in changed {
            writeln!(buf, "- {token}").ok();
        }
    }
    if !report.components.is_empty() {
        writeln!(buf, "Components: {}", report.components.join(", ")).ok();
    }
    if !report.written.is_empty() {
        writeln!(
            buf,
            "Wrote {} file(s) to {}",
            report.written.len(),
            out.output_dir.display()
        )
        .ok();
    }
    if !report.diagnostics.is_empty() {
        writeln!(buf, "Diagnostics:").ok();
        for diagnostic in &report.diagnostics {
            writeln!(buf, "- {diagnostic}").ok();
        }
    }
    buf
}

fn outcome_label(outcome: RunOutcome, colorize: bool) -> String {
    match outcome {
        RunOutcome::Written => color("WRITTEN", "32", colorize),
        RunOutcome::Stopped => color("UNCHANGED", "32", colorize),
        RunOutcome::PartiallyWritten => color("PARTIAL", "33", colorize),
        RunOutcome::Cancelled => color("CANCELLED", "33", colorize),
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Determine the exit code for a finished run.
pub fn exit_code_for_run(outcome: RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::PartiallyWritten => ExitCode::from(1),
        RunOutcome::Written | RunOutcome::Stopped | RunOutcome::Cancelled => ExitCode::SUCCESS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsync_lib::{ChangeReason, ChangeReport, Diagnostic, RunReport};

    fn run_output(outcome: RunOutcome) -> RunOutput {
        RunOutput {
            version: DSYNC_OUTPUT_VERSION.to_string(),
            output_dir: PathBuf::from("Generated"),
            report: RunReport {
                run: 1,
                outcome,
                source: "figma:abc".to_string(),
                used_sample: true,
                cancelled_after: None,
                change: Some(ChangeReport {
                    changed: true,
                    reason: ChangeReason::ValuesChanged,
                    changed_tokens: vec!["color/primary".to_string()],
                }),
                token_count: 12,
                components: vec!["PrimaryButton".to_string(), "ProfileCard".to_string()],
                written: vec![PathBuf::from("PrimaryButton.swift")],
                diagnostics: vec![Diagnostic::Fetch {
                    message: "timeout".to_string(),
                }],
            },
        }
    }

    #[test]
    fn exit_code_for_run_maps_outcomes() {
        assert_eq!(exit_code_for_run(RunOutcome::Written), ExitCode::SUCCESS);
        assert_eq!(exit_code_for_run(RunOutcome::Stopped), ExitCode::SUCCESS);
        assert_eq!(exit_code_for_run(RunOutcome::PartiallyWritten), ExitCode::from(1));
    }

    #[test]
    fn render_error_always_returns_fatal_exit_code() {
        let code = render_error(
            DsyncError::Config("boom".to_string()),
            OutputFormat::Json,
            None,
        );
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn format_pretty_includes_outcome_changes_and_diagnostics() {
        let pretty = format_pretty(&DsyncOutput::Sync(run_output(RunOutcome::Written)), false);
        assert!(pretty.contains("[SYNC] WRITTEN"));
        assert!(pretty.contains("figma:abc (sample tokens)"));
        assert!(pretty.contains("Change: ValuesChanged"));
        assert!(pretty.contains("- color/primary"));
        assert!(pretty.contains("Components: PrimaryButton, ProfileCard"));
        assert!(pretty.contains("Wrote 1 file(s) to Generated"));
        assert!(pretty.contains("fetch failed, using sample tokens: timeout"));
    }

    #[test]
    fn format_pretty_labels_partial_generate_runs() {
        let pretty = format_pretty(
            &DsyncOutput::Generate(run_output(RunOutcome::PartiallyWritten)),
            false,
        );
        assert!(pretty.contains("[GENERATE] PARTIAL"));
    }

    #[test]
    fn format_pretty_error_includes_hint() {
        let payload = DsyncError::NoTokenData("nothing to do".to_string()).to_payload();
        let pretty = format_pretty(
            &DsyncOutput::Error(ErrorOutput {
                version: DSYNC_OUTPUT_VERSION.to_string(),
                message: Some(payload.message.clone()),
                error: payload,
            }),
            false,
        );
        assert!(pretty.contains("[ERROR] nothing to do"));
        assert!(pretty.contains("Hint:"));
    }
}
