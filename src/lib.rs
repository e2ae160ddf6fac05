//! Design Sync (dsync) Library
//!
//! Extracts canonical design tokens from a Figma document graph, detects
//! changes against the last synchronized snapshot, and synthesizes SwiftUI
//! component sources, previews and test stubs from archetype templates.
//!
//! # Module Overview
//!
//! - [`figma`] - Figma REST client and document decoding
//! - [`source`] - Document sources (API, local file)
//! - [`walker`] - Iterative, depth-bounded tree traversal
//! - [`extract`] - Token extraction into a [`TokenSnapshot`]
//! - [`resolve`] - Nearest-token resolution and registries
//! - [`detect`] - Snapshot change detection
//! - [`classify`] - Archetype and layout inference
//! - [`synth`] - Template rendering of components and token files
//! - [`writer`] / [`store`] - Artifact and snapshot persistence
//! - [`pipeline`] / [`watch`] - One run, and runs on an interval
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use dsync_lib::{Config, Pipeline, Selection};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> dsync_lib::Result<()> {
//! let config = Config::load(None).map_err(|e| dsync_lib::DsyncError::Config(e.to_string()))?;
//! let (pipeline, mut state) = Pipeline::from_config(&config, Selection::Components, false)?;
//! let report = pipeline.run(&mut state, &CancellationToken::new()).await?;
//! println!("{:?}: {} files", report.outcome, report.written.len());
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod figma;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod sample;
pub mod source;
pub mod store;
pub mod synth;
pub mod types;
pub mod walker;
pub mod watch;
pub mod writer;

pub use classify::Selection;
pub use config::{Config, ConfigError};
pub use detect::{detect_changes, ChangeReason, ChangeReport};
pub use diagnostics::Diagnostic;
pub use error::{DsyncError, ErrorCategory, ErrorPayload, Result};
pub use figma::{FigmaAuth, FigmaClient, FigmaError};
pub use output::{DsyncOutput, ErrorOutput, RunOutput, WatchOutput, DSYNC_OUTPUT_VERSION};
pub use pipeline::{Pipeline, PipelineOptions, PipelineState, RunOutcome, RunReport, Stage};
pub use resolve::{ResolveMode, Tolerances};
pub use source::DocumentSource;
pub use types::{
    ArtifactKind, Archetype, ComponentDescriptor, DocumentNode, GeneratedArtifact, NodeKind,
    Orientation, TokenSnapshot,
};
pub use watch::{watch, WatchOptions, WatchSummary};
