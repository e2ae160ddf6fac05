mod generate;
mod sync;
mod watch;

pub use generate::run_generate;
pub use sync::run_sync;
pub use watch::run_watch;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dsync_lib::{Config, DsyncError, DsyncOutput};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::{OutputFormat, SourceArgs};
use crate::formatting::write_output;
use crate::settings::{format_effective_config, load_config, resolve_config};

/// Config file, environment and flags merged and validated.
fn prepare_config(config_path: Option<&Path>, source: &SourceArgs) -> Result<Config, DsyncError> {
    let config = resolve_config(load_config(config_path)?, source, config_path)?;
    debug!("{}", format_effective_config(&config, config_path));
    Ok(config)
}

/// A token cancelled on Ctrl-C; runs stop at the next stage boundary.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; cancelling");
            token.cancel();
        }
    });
    cancel
}

fn emit(body: &DsyncOutput, format: OutputFormat, output: Option<PathBuf>, code: ExitCode) -> ExitCode {
    match write_output(body, format, output) {
        Ok(()) => code,
        Err(e) => {
            eprintln!("Failed to write output: {e}");
            ExitCode::from(2)
        }
    }
}
