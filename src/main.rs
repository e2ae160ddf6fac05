mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_generate, run_sync, run_watch};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

/// Logs go to stderr so stdout stays machine-readable. `--verbose` forces
/// debug level; otherwise `RUST_LOG` applies, defaulting to info.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(filter)
        .try_init();
}

async fn run() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Sync {
            source,
            force,
            output,
        } => run_sync(args.config, args.format, source, force, output).await,
        Commands::Generate {
            source,
            nodes,
            all,
            output,
        } => run_generate(args.config, args.format, source, nodes, all, output).await,
        Commands::Watch {
            source,
            interval,
            max_runs,
            output,
        } => run_watch(args.config, args.format, source, interval, max_runs, output).await,
    }
}
