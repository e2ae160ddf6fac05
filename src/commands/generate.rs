use std::path::PathBuf;
use std::process::ExitCode;

use dsync_lib::{Config, DsyncOutput, Pipeline, RunOutput, Selection, DSYNC_OUTPUT_VERSION};
use tracing::info;

use super::{cancel_on_ctrl_c, emit, prepare_config};
use crate::cli::{OutputFormat, SourceArgs};
use crate::formatting::{exit_code_for_run, render_error};

/// Run the generate command. Generation always bypasses change detection.
pub async fn run_generate(
    config_path: Option<PathBuf>,
    format: OutputFormat,
    source: SourceArgs,
    nodes: Vec<String>,
    all: bool,
    output: Option<PathBuf>,
) -> ExitCode {
    let mut config = match prepare_config(config_path.as_deref(), &source) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output),
    };

    let selection = selection_for(nodes, all);
    let narrowed = narrow_fetch(&mut config, &selection);

    let (pipeline, mut state) = match Pipeline::from_config(&config, selection, true) {
        Ok(built) => built,
        Err(err) => return render_error(err, format, output),
    };
    let pipeline = if narrowed {
        pipeline.into_partial()
    } else {
        pipeline
    };

    let cancel = cancel_on_ctrl_c();
    match pipeline.run(&mut state, &cancel).await {
        Ok(report) => {
            let code = exit_code_for_run(report.outcome);
            let body = DsyncOutput::Generate(RunOutput {
                version: DSYNC_OUTPUT_VERSION.to_string(),
                output_dir: config.output_dir.clone(),
                report,
            });
            emit(&body, format, output, code)
        }
        Err(err) => render_error(err, format, output),
    }
}

/// Narrow the API fetch to the selected subtrees. Returns whether the fetch
/// now covers less than the configured scope.
fn narrow_fetch(config: &mut Config, selection: &Selection) -> bool {
    let Selection::Nodes(ids) = selection else {
        return false;
    };
    info!(nodes = ids.len(), "generating selected nodes");
    if config.document_path.is_some() || config.node_ids == *ids {
        return false;
    }
    config.node_ids = ids.clone();
    true
}

fn selection_for(nodes: Vec<String>, all: bool) -> Selection {
    if all {
        Selection::AllFrames
    } else if nodes.is_empty() {
        Selection::Components
    } else {
        Selection::Nodes(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_prefers_all_then_nodes_then_components() {
        assert_eq!(selection_for(vec!["1:2".into()], true), Selection::AllFrames);
        assert_eq!(
            selection_for(vec!["1:2".into()], false),
            Selection::Nodes(vec!["1:2".into()])
        );
        assert_eq!(selection_for(Vec::new(), false), Selection::Components);
    }

    #[test]
    fn node_selection_narrows_api_fetch_as_partial() {
        let mut config = Config {
            file_key: Some("abc".into()),
            ..Config::default()
        };
        assert!(narrow_fetch(&mut config, &Selection::Nodes(vec!["1:1".into()])));
        assert_eq!(config.node_ids, vec!["1:1".to_string()]);

        let mut config = Config::default();
        assert!(!narrow_fetch(&mut config, &Selection::AllFrames));
        assert!(config.node_ids.is_empty());
    }

    #[test]
    fn local_documents_are_never_narrowed() {
        let mut config = Config {
            document_path: Some(PathBuf::from("doc.json")),
            ..Config::default()
        };
        assert!(!narrow_fetch(&mut config, &Selection::Nodes(vec!["1:1".into()])));
        assert!(config.node_ids.is_empty());
    }
}
