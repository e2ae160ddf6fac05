use std::path::PathBuf;
use std::process::ExitCode;

use dsync_lib::{DsyncOutput, Pipeline, RunOutput, Selection, DSYNC_OUTPUT_VERSION};

use super::{cancel_on_ctrl_c, emit, prepare_config};
use crate::cli::{OutputFormat, SourceArgs};
use crate::formatting::{exit_code_for_run, render_error};

/// Run the sync command.
pub async fn run_sync(
    config_path: Option<PathBuf>,
    format: OutputFormat,
    source: SourceArgs,
    force: bool,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match prepare_config(config_path.as_deref(), &source) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output),
    };
    let (pipeline, mut state) = match Pipeline::from_config(&config, Selection::Components, force) {
        Ok(built) => built,
        Err(err) => return render_error(err, format, output),
    };

    let cancel = cancel_on_ctrl_c();
    match pipeline.run(&mut state, &cancel).await {
        Ok(report) => {
            let code = exit_code_for_run(report.outcome);
            let body = DsyncOutput::Sync(RunOutput {
                version: DSYNC_OUTPUT_VERSION.to_string(),
                output_dir: config.output_dir.clone(),
                report,
            });
            emit(&body, format, output, code)
        }
        Err(err) => render_error(err, format, output),
    }
}
