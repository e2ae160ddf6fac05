use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use dsync_lib::{
    watch, DsyncOutput, Pipeline, Selection, WatchOptions, WatchOutput, WatchSummary,
    DSYNC_OUTPUT_VERSION,
};
use tokio::sync::Mutex;

use super::{cancel_on_ctrl_c, emit, prepare_config};
use crate::cli::{OutputFormat, SourceArgs};
use crate::formatting::render_error;

/// Run the watch command until interrupted or `max_runs` is reached.
pub async fn run_watch(
    config_path: Option<PathBuf>,
    format: OutputFormat,
    source: SourceArgs,
    interval: Option<Duration>,
    max_runs: Option<u64>,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match prepare_config(config_path.as_deref(), &source) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output),
    };
    let (pipeline, state) = match Pipeline::from_config(&config, Selection::Components, false) {
        Ok(built) => built,
        Err(err) => return render_error(err, format, output),
    };

    let options = WatchOptions {
        interval: interval.unwrap_or(config.poll_interval),
        max_runs,
    };
    let summary = watch(
        Arc::new(pipeline),
        Arc::new(Mutex::new(state)),
        options,
        cancel_on_ctrl_c(),
    )
    .await;

    let code = exit_code_for_watch(&summary);
    let body = DsyncOutput::Watch(WatchOutput {
        version: DSYNC_OUTPUT_VERSION.to_string(),
        output_dir: config.output_dir.clone(),
        summary,
    });
    emit(&body, format, output, code)
}

/// 2 when every run failed, 1 when any run failed or wrote partially.
fn exit_code_for_watch(summary: &WatchSummary) -> ExitCode {
    if summary.runs > 0 && summary.failures == summary.runs {
        ExitCode::from(2)
    } else if summary.failures > 0 || summary.partially_written > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
