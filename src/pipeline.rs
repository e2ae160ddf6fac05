//! One synchronization run: fetch, extract, detect, classify, synthesize, write.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classify::{describe, select, Selection};
use crate::config::Config;
use crate::detect::{detect_changes, ChangeReport};
use crate::diagnostics::Diagnostic;
use crate::error::{DsyncError, Result};
use crate::extract::extract_tokens;
use crate::resolve::{Registries, ResolveMode, Tolerances};
use crate::sample::load_sample;
use crate::source::{DocumentSource, FetchedDocument};
use crate::store::SnapshotStore;
use crate::synth::templates::TemplateSet;
use crate::synth::synthesize;
use crate::types::{ArtifactKind, ComponentDescriptor, TokenSnapshot};
use crate::writer::OutputWriter;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub max_depth: usize,
    pub selection: Selection,
    pub resolve_mode: ResolveMode,
    pub tolerances: Tolerances,
    /// Synthesize even when the detector reports no change.
    pub force: bool,
    pub sample_tokens: Option<PathBuf>,
    /// The fetch covers only part of the file. Token files and the
    /// snapshot describe the whole file, so both are left untouched.
    pub partial_document: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_depth: crate::config::DEFAULT_MAX_DEPTH,
            selection: Selection::default(),
            resolve_mode: ResolveMode::default(),
            tolerances: Tolerances::default(),
            force: false,
            sample_tokens: None,
            partial_document: false,
        }
    }
}

/// The only state carried from one run to the next.
#[derive(Debug)]
pub struct PipelineState {
    store: SnapshotStore,
    writer: OutputWriter,
    baseline: Option<TokenSnapshot>,
    baseline_loaded: bool,
    runs: u64,
}

impl PipelineState {
    pub fn new(store: SnapshotStore, writer: OutputWriter) -> Self {
        Self {
            store,
            writer,
            baseline: None,
            baseline_loaded: false,
            runs: 0,
        }
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn writer(&self) -> &OutputWriter {
        &self.writer
    }

    /// The last synchronized snapshot, read from the store on first use.
    pub fn baseline(&mut self) -> Option<&TokenSnapshot> {
        if !self.baseline_loaded {
            self.baseline = match self.store.load() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(path = %self.store.path().display(), error = %e, "cannot read snapshot; treating as no baseline");
                    None
                }
            };
            self.baseline_loaded = true;
        }
        self.baseline.as_ref()
    }

    fn commit(&mut self, snapshot: TokenSnapshot) -> Result<()> {
        self.store.save(&snapshot)?;
        self.baseline = Some(snapshot);
        self.baseline_loaded = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Fetched,
    Extracted,
    Detected,
    Classified,
    Synthesized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    /// Tokens unchanged since the last sync; nothing written.
    Stopped,
    Written,
    /// At least one artifact failed; the baseline was left untouched.
    PartiallyWritten,
    /// Cancelled between stages; nothing written.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run: u64,
    pub outcome: RunOutcome,
    pub source: String,
    pub used_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_after: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<ChangeReport>,
    pub token_count: usize,
    pub components: Vec<String>,
    pub written: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    fn new(run: u64, source: String) -> Self {
        Self {
            run,
            outcome: RunOutcome::Stopped,
            source,
            used_sample: false,
            cancelled_after: None,
            change: None,
            token_count: 0,
            components: Vec::new(),
            written: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn cancelled(mut self, stage: Option<Stage>) -> Self {
        info!(run = self.run, stage = ?stage, "run cancelled");
        self.outcome = RunOutcome::Cancelled;
        self.cancelled_after = stage;
        self
    }
}

#[derive(Debug)]
pub struct Pipeline {
    source: DocumentSource,
    templates: TemplateSet,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(source: DocumentSource, templates: TemplateSet, options: PipelineOptions) -> Self {
        Self {
            source,
            templates,
            options,
        }
    }

    /// Build a pipeline and its state from a validated config.
    pub fn from_config(
        config: &Config,
        selection: Selection,
        force: bool,
    ) -> Result<(Self, PipelineState)> {
        let templates = match &config.templates_dir {
            Some(dir) => TemplateSet::with_overrides(dir)?,
            None => TemplateSet::builtin()?,
        };
        let options = PipelineOptions {
            max_depth: config.max_depth,
            selection,
            resolve_mode: config.resolve_mode,
            tolerances: config.tolerances,
            force,
            sample_tokens: config.sample_tokens.clone(),
            partial_document: false,
        };
        let state = PipelineState::new(
            SnapshotStore::new(&config.snapshot_path),
            OutputWriter::new(&config.output_dir),
        );
        Ok((
            Self::new(DocumentSource::from_config(config), templates, options),
            state,
        ))
    }

    /// Mark the fetch as narrower than the file the baseline came from.
    pub fn into_partial(mut self) -> Self {
        self.options.partial_document = true;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    /// Execute one run. Only a run with no tokens from either the document
    /// or the sample fails; every other problem is a diagnostic.
    pub async fn run(
        &self,
        state: &mut PipelineState,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        state.runs += 1;
        let mut report = RunReport::new(state.runs, self.source.describe());
        if cancel.is_cancelled() {
            return Ok(report.cancelled(None));
        }

        let max_depth = self.options.max_depth;
        info!(run = report.run, source = %report.source, "fetching document");
        let document = match self.source.fetch(max_depth).await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(error = %e, "fetch failed; using sample tokens");
                report.diagnostics.push(Diagnostic::Fetch {
                    message: e.to_string(),
                });
                None
            }
        };
        if cancel.is_cancelled() {
            return Ok(report.cancelled(Some(Stage::Fetched)));
        }

        let snapshot = self.tokens(document.as_ref(), &mut report)?;
        report.token_count = snapshot.token_count();
        info!(tokens = report.token_count, sample = report.used_sample, "tokens extracted");
        if cancel.is_cancelled() {
            return Ok(report.cancelled(Some(Stage::Extracted)));
        }

        let change = detect_changes(state.baseline(), &snapshot);
        info!(changed = change.changed, reason = ?change.reason, tokens = change.changed_tokens.len(), "change detection");
        let proceed = change.changed || self.options.force;
        report.change = Some(change);
        if !proceed {
            report.outcome = RunOutcome::Stopped;
            return Ok(report);
        }
        if cancel.is_cancelled() {
            return Ok(report.cancelled(Some(Stage::Detected)));
        }

        let descriptors = match &document {
            Some(document) => self.classify(document, &mut report),
            None => Vec::new(),
        };
        info!(components = descriptors.len(), "classified components");
        if cancel.is_cancelled() {
            return Ok(report.cancelled(Some(Stage::Classified)));
        }

        let mut registries = Registries::from_snapshot(&snapshot, &self.options.tolerances);
        let mut synthesis = synthesize(
            &descriptors,
            &snapshot,
            &mut registries,
            &self.templates,
            self.options.resolve_mode,
        );
        if self.options.partial_document {
            synthesis
                .artifacts
                .retain(|artifact| artifact.kind != ArtifactKind::TokenSource);
        }
        report.diagnostics.extend(synthesis.diagnostics);
        report.components = synthesis.components;
        info!(artifacts = synthesis.artifacts.len(), "synthesized artifacts");
        if cancel.is_cancelled() {
            return Ok(report.cancelled(Some(Stage::Synthesized)));
        }

        let written = state.writer.write_all(&synthesis.artifacts);
        report.written = written.written.clone();
        let complete = written.is_complete();
        report.diagnostics.extend(written.failures);

        report.outcome = if complete && self.options.partial_document {
            debug!("partial document; baseline kept");
            RunOutcome::Written
        } else if complete {
            match state.commit(snapshot) {
                Ok(()) => RunOutcome::Written,
                Err(e) => {
                    warn!(error = %e, "snapshot not saved");
                    let path = match &e {
                        DsyncError::Write { path, .. } => path.clone(),
                        _ => state.store.path().to_path_buf(),
                    };
                    report.diagnostics.push(Diagnostic::Write {
                        path,
                        message: e.to_string(),
                    });
                    RunOutcome::PartiallyWritten
                }
            }
        } else {
            RunOutcome::PartiallyWritten
        };
        info!(outcome = ?report.outcome, written = report.written.len(), "run finished");
        Ok(report)
    }

    /// Tokens from the document, or from the sample when the document is
    /// missing or yields none.
    fn tokens(
        &self,
        document: Option<&FetchedDocument>,
        report: &mut RunReport,
    ) -> Result<TokenSnapshot> {
        if let Some(document) = document {
            report.diagnostics.extend(document.diagnostics.iter().cloned());
            let extraction = extract_tokens(
                &document.root,
                document.last_modified.clone(),
                self.options.max_depth,
            );
            report.diagnostics.extend(extraction.diagnostics);
            if !extraction.snapshot.is_empty() {
                return Ok(extraction.snapshot);
            }
            warn!("document yielded no tokens; using sample tokens");
            report.diagnostics.push(Diagnostic::Fetch {
                message: "document contains no tokens".to_string(),
            });
        }

        let snapshot = load_sample(self.options.sample_tokens.as_deref()).map_err(|e| {
            DsyncError::NoTokenData(format!("no document tokens and sample unavailable: {e}"))
        })?;
        report.used_sample = true;
        Ok(snapshot)
    }

    fn classify(
        &self,
        document: &FetchedDocument,
        report: &mut RunReport,
    ) -> Vec<ComponentDescriptor> {
        let (nodes, missing) = select(&document.root, &self.options.selection, self.options.max_depth);
        report.diagnostics.extend(missing);
        nodes
            .into_iter()
            .map(|node| {
                let descriptor = describe(node, self.options.max_depth);
                debug!(node = %node.id, archetype = ?descriptor.archetype, orientation = ?descriptor.orientation, "classified");
                descriptor
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn document() -> Value {
        json!({
            "name": "Kit",
            "lastModified": "2024-05-01T10:00:00Z",
            "document": {
                "id": "0:0", "name": "Document", "type": "DOCUMENT",
                "children": [{
                    "id": "0:1", "name": "Page", "type": "CANVAS",
                    "children": [{
                        "id": "1:1", "name": "Primary Button", "type": "COMPONENT",
                        "cornerRadius": 8,
                        "paddingTop": 12, "paddingLeft": 16,
                        "fills": [{ "type": "SOLID", "color": { "r": 0.8627, "g": 0.149, "b": 0.149, "a": 1 } }],
                        "absoluteBoundingBox": { "x": 0, "y": 0, "width": 120, "height": 44 },
                        "children": [{
                            "id": "1:2", "name": "Label", "type": "TEXT", "characters": "Go",
                            "fills": [{ "type": "SOLID", "color": { "r": 1, "g": 1, "b": 1, "a": 1 } }],
                            "style": { "fontFamily": "Inter", "fontSize": 16, "fontWeight": 600 }
                        }]
                    }]
                }]
            }
        })
    }

    struct Fixture {
        dir: TempDir,
        pipeline: Pipeline,
        state: PipelineState,
    }

    impl Fixture {
        fn out(&self) -> PathBuf {
            self.dir.path().join("out")
        }
    }

    fn fixture_with(source: impl FnOnce(&Path) -> DocumentSource, options: PipelineOptions) -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = source(dir.path());
        let state = PipelineState::new(
            SnapshotStore::new(dir.path().join("state/snapshot.json")),
            OutputWriter::new(dir.path().join("out")),
        );
        let pipeline = Pipeline::new(source, TemplateSet::builtin().unwrap(), options);
        Fixture {
            dir,
            pipeline,
            state,
        }
    }

    fn file_fixture(options: PipelineOptions) -> Fixture {
        fixture_with(
            |dir| {
                let path = dir.join("doc.json");
                fs::write(&path, document().to_string()).unwrap();
                DocumentSource::File(path)
            },
            options,
        )
    }

    #[tokio::test]
    async fn first_run_writes_components_tokens_and_snapshot() {
        let mut fx = file_fixture(PipelineOptions::default());
        let report = fx.pipeline.run(&mut fx.state, &CancellationToken::new()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Written);
        assert!(!report.used_sample);
        assert_eq!(report.components, vec!["PrimaryButton"]);
        assert_eq!(report.written.len(), 9);
        assert!(fx.out().join("PrimaryButton.swift").is_file());
        assert!(fx.out().join("previews/PrimaryButtonView.swift").is_file());
        assert!(fx.out().join("tests/PrimaryButtonTests.swift").is_file());
        assert!(fx.out().join("tokens/Colors.swift").is_file());
        assert!(fx.dir.path().join("state/snapshot.json").is_file());
    }

    #[tokio::test]
    async fn partial_document_keeps_token_files_and_baseline() {
        let mut fx = file_fixture(PipelineOptions::default());
        let cancel = CancellationToken::new();
        fx.pipeline.run(&mut fx.state, &cancel).await.unwrap();
        let colors = fs::read_to_string(fx.out().join("tokens/Colors.swift")).unwrap();
        let snapshot_path = fx.dir.path().join("state/snapshot.json");
        let snapshot = fs::read_to_string(&snapshot_path).unwrap();

        // Only the label subtree: one color instead of two.
        let label = &document()["document"]["children"][0]["children"][0]["children"][0];
        let subtree = fx.dir.path().join("label.json");
        fs::write(&subtree, label.to_string()).unwrap();
        let narrowed = Pipeline::new(
            DocumentSource::File(subtree),
            TemplateSet::builtin().unwrap(),
            PipelineOptions {
                force: true,
                selection: Selection::AllFrames,
                ..PipelineOptions::default()
            },
        )
        .into_partial();
        let report = narrowed.run(&mut fx.state, &cancel).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Written);
        assert!(report.written.iter().all(|p| !p.starts_with("tokens")));
        assert_eq!(fs::read_to_string(fx.out().join("tokens/Colors.swift")).unwrap(), colors);
        assert_eq!(fs::read_to_string(&snapshot_path).unwrap(), snapshot);

        let report = fx.pipeline.run(&mut fx.state, &cancel).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Stopped);
    }

    #[tokio::test]
    async fn second_identical_run_stops_without_writing() {
        let mut fx = file_fixture(PipelineOptions::default());
        let cancel = CancellationToken::new();
        fx.pipeline.run(&mut fx.state, &cancel).await.unwrap();
        let before = fs::read_to_string(fx.out().join("PrimaryButton.swift")).unwrap();

        let report = fx.pipeline.run(&mut fx.state, &cancel).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Stopped);
        assert_eq!(report.change.as_ref().map(|c| c.changed), Some(false));
        assert!(report.written.is_empty());
        assert_eq!(fs::read_to_string(fx.out().join("PrimaryButton.swift")).unwrap(), before);
        assert_eq!(fx.state.runs(), 2);
    }

    #[tokio::test]
    async fn force_regenerates_identical_output() {
        let mut fx = file_fixture(PipelineOptions {
            force: true,
            ..PipelineOptions::default()
        });
        let cancel = CancellationToken::new();
        fx.pipeline.run(&mut fx.state, &cancel).await.unwrap();
        let first = fs::read_to_string(fx.out().join("PrimaryButton.swift")).unwrap();

        let report = fx.pipeline.run(&mut fx.state, &cancel).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Written);
        assert_eq!(report.change.as_ref().map(|c| c.changed), Some(false));
        assert_eq!(fs::read_to_string(fx.out().join("PrimaryButton.swift")).unwrap(), first);
    }

    #[tokio::test]
    async fn baseline_survives_a_fresh_state() {
        let mut fx = file_fixture(PipelineOptions::default());
        fx.pipeline.run(&mut fx.state, &CancellationToken::new()).await.unwrap();

        let mut fresh = PipelineState::new(
            SnapshotStore::new(fx.dir.path().join("state/snapshot.json")),
            OutputWriter::new(fx.out()),
        );
        let report = fx.pipeline.run(&mut fresh, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Stopped);
    }

    #[tokio::test]
    async fn unavailable_source_falls_back_to_sample() {
        let mut fx = fixture_with(
            |_| DocumentSource::Unavailable("offline".to_string()),
            PipelineOptions::default(),
        );
        let report = fx.pipeline.run(&mut fx.state, &CancellationToken::new()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Written);
        assert!(report.used_sample);
        assert!(report.components.is_empty());
        assert!(matches!(report.diagnostics[0], Diagnostic::Fetch { .. }));
        assert!(fs::read_to_string(fx.out().join("tokens/Colors.swift"))
            .unwrap()
            .contains("assassinRed"));
    }

    #[tokio::test]
    async fn no_document_and_no_sample_fails_without_writing() {
        let mut fx = fixture_with(
            |_| DocumentSource::Unavailable("offline".to_string()),
            PipelineOptions {
                sample_tokens: Some(PathBuf::from("/nonexistent/sample.json")),
                ..PipelineOptions::default()
            },
        );
        let err = fx.pipeline.run(&mut fx.state, &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, DsyncError::NoTokenData(_)));
        assert!(!fx.out().exists());
        assert!(!fx.dir.path().join("state/snapshot.json").exists());
    }

    #[tokio::test]
    async fn cancelled_run_writes_nothing() {
        let mut fx = file_fixture(PipelineOptions::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = fx.pipeline.run(&mut fx.state, &cancel).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert!(!fx.out().exists());
    }

    #[tokio::test]
    async fn partial_write_keeps_previous_baseline() {
        let mut fx = file_fixture(PipelineOptions::default());
        fs::create_dir_all(fx.out()).unwrap();
        fs::write(fx.out().join("tests"), "blocker").unwrap();

        let report = fx.pipeline.run(&mut fx.state, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::PartiallyWritten);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::Write { .. })));
        assert!(fx.out().join("PrimaryButton.swift").is_file());
        assert!(!fx.dir.path().join("state/snapshot.json").exists());

        // The next run still sees no baseline and retries.
        fs::remove_file(fx.out().join("tests")).unwrap();
        let report = fx.pipeline.run(&mut fx.state, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Written);
    }

    #[tokio::test]
    async fn missing_selected_node_is_reported() {
        let mut fx = file_fixture(PipelineOptions {
            selection: Selection::Nodes(vec!["1:1".to_string(), "9:9".to_string()]),
            ..PipelineOptions::default()
        });
        let report = fx.pipeline.run(&mut fx.state, &CancellationToken::new()).await.unwrap();

        assert_eq!(report.components, vec!["PrimaryButton"]);
        assert!(report.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::Synthesis { component, .. } if component == "9:9"
        )));
    }
}
