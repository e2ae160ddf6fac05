use clap::{Args, Parser, Subcommand, ValueEnum};
use dsync_lib::ResolveMode;
use humantime_serde::re::humantime;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dsync")]
#[command(
    version,
    about = "Design Sync - Extract design tokens from Figma and synthesize SwiftUI components",
    long_about = "Design Sync (dsync)\n\nModes:\n- sync: fetch the document once; regenerate tokens and components when tokens changed.\n- generate: synthesize components for selected nodes (or all top-level frames), regardless of changes.\n- watch: repeat sync on an interval; ticks arriving during a run are skipped.\n\nWithout credentials or a reachable document the bundled sample tokens are used.\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose (debug) logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML); defaults to $XDG_CONFIG_HOME/dsync/config.toml; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,
}

/// Flags shared by every subcommand that runs the pipeline.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(long, value_name = "PATH", help = "Read the document from a local JSON file instead of Figma")]
    pub document: Option<PathBuf>,

    #[arg(long, value_name = "KEY", help = "Figma file key (overrides config and FIGMA_FILE_KEY)")]
    pub file_key: Option<String>,

    #[arg(long, value_name = "PATH", help = "Directory receiving generated sources")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Where the last synchronized snapshot is stored")]
    pub snapshot: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Directory of <archetype>.swift.tmpl overrides")]
    pub templates: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Token JSON used when the document is unavailable")]
    pub sample_tokens: Option<PathBuf>,

    #[arg(long, value_enum, help = "What to do with values matching no token")]
    pub mode: Option<ModeArg>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch once and regenerate when tokens changed
    Sync {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, help = "Regenerate even when no token changed")]
        force: bool,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },
    /// Synthesize components for a selection, regardless of changes
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(
            long = "node",
            value_name = "ID",
            value_delimiter = ',',
            conflicts_with = "all",
            help = "Node id to generate (repeatable or comma-separated)"
        )]
        nodes: Vec<String>,

        #[arg(long, help = "Generate every visible top-level frame")]
        all: bool,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },
    /// Repeat sync on an interval
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(
            long,
            value_parser = parse_interval,
            help = "Polling interval (e.g. 30s, 2m); defaults to poll_interval from config"
        )]
        interval: Option<Duration>,

        #[arg(long, help = "Stop after this many runs")]
        max_runs: Option<u64>,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Register,
    Fallback,
}

impl From<ModeArg> for ResolveMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Register => ResolveMode::Register,
            ModeArg::Fallback => ResolveMode::Fallback,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

fn parse_interval(raw: &str) -> Result<Duration, String> {
    let interval = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if interval.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(interval)
}

pub fn parse() -> Cli {
    Cli::parse()
}
