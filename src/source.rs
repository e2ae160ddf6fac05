//! Where a run's document graph comes from.

use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::error::{DsyncError, Result};
use crate::figma::{decode_owned, map_figma_error, parse_json, release, FigmaAuth, FigmaClient};
use crate::types::{DocumentNode, NodeKind};

/// Id of the synthetic root that holds several fetched subtrees.
pub const SELECTION_ROOT_ID: &str = "selection";

#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// The Figma REST API; `node_ids` narrows the fetch to those subtrees.
    Figma {
        client: FigmaClient,
        file_key: String,
        node_ids: Vec<String>,
    },
    /// A local JSON document, either a full file response or a bare node.
    File(PathBuf),
    /// No usable source; every fetch fails with the reason.
    Unavailable(String),
}

/// A decoded document tree ready for extraction.
#[derive(Debug)]
pub struct FetchedDocument {
    pub root: DocumentNode,
    pub last_modified: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DocumentSource {
    /// A local document wins over the API. Missing credentials or file key
    /// leave the source unavailable rather than failing, so runs can still
    /// fall back to the sample tokens.
    pub fn from_config(config: &Config) -> Self {
        if let Some(path) = &config.document_path {
            return DocumentSource::File(path.clone());
        }
        let Some(file_key) = config.file_key.clone().filter(|k| !k.trim().is_empty()) else {
            return DocumentSource::Unavailable("no Figma file key configured".to_string());
        };
        let Some(auth) = FigmaAuth::from_env() else {
            return DocumentSource::Unavailable(
                "FIGMA_TOKEN or FIGMA_OAUTH_TOKEN is not set".to_string(),
            );
        };
        match FigmaClient::with_base_url_and_timeout(auth, &config.base_url, config.fetch_timeout)
        {
            Ok(client) => DocumentSource::Figma {
                client,
                file_key,
                node_ids: config.node_ids.clone(),
            },
            Err(e) => DocumentSource::Unavailable(map_figma_error(e).to_string()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DocumentSource::Figma {
                file_key, node_ids, ..
            } if node_ids.is_empty() => format!("figma:{file_key}"),
            DocumentSource::Figma {
                file_key, node_ids, ..
            } => format!("figma:{file_key}?ids={}", node_ids.join(",")),
            DocumentSource::File(path) => format!("file:{}", path.display()),
            DocumentSource::Unavailable(_) => "unavailable".to_string(),
        }
    }

    pub async fn fetch(&self, max_depth: usize) -> Result<FetchedDocument> {
        match self {
            DocumentSource::Figma {
                client,
                file_key,
                node_ids,
            } if node_ids.is_empty() => {
                info!(file_key = %file_key, "fetching Figma file");
                let file = client.fetch_file(file_key).await.map_err(map_figma_error)?;
                let decoded = decode_owned(file.document, max_depth)?;
                Ok(FetchedDocument {
                    root: decoded.root,
                    last_modified: file.last_modified,
                    diagnostics: decoded.diagnostics,
                })
            }
            DocumentSource::Figma {
                client,
                file_key,
                node_ids,
            } => {
                info!(file_key = %file_key, nodes = node_ids.len(), "fetching Figma nodes");
                let response = client
                    .fetch_nodes(file_key, node_ids)
                    .await
                    .map_err(map_figma_error)?;
                let mut nodes = response.nodes;
                let documents: Vec<(String, Option<Value>)> = node_ids
                    .iter()
                    .map(|id| (id.clone(), nodes.remove(id).map(|c| c.document)))
                    .collect();
                nodes.into_values().for_each(|c| release(c.document));
                assemble_selection(documents, response.last_modified, max_depth)
            }
            DocumentSource::File(path) => {
                info!(path = %path.display(), "reading local document");
                let raw = fs::read_to_string(path)?;
                let value: Value = parse_json(&raw)?;
                decode_local(value, max_depth)
            }
            DocumentSource::Unavailable(reason) => {
                Err(DsyncError::Config(format!("document source unavailable: {reason}")))
            }
        }
    }
}

/// Accepts a file response (`{"document": …, "lastModified": …}`), a nodes
/// response (`{"nodes": {id: {"document": …}}}`) or a bare node.
fn decode_local(mut value: Value, max_depth: usize) -> Result<FetchedDocument> {
    let last_modified = value
        .get("lastModified")
        .and_then(Value::as_str)
        .map(str::to_owned);

    let document = value.get_mut("document").map(Value::take);
    if let Some(document) = document {
        release(value);
        let decoded = decode_owned(document, max_depth)?;
        return Ok(FetchedDocument {
            root: decoded.root,
            last_modified,
            diagnostics: decoded.diagnostics,
        });
    }

    let nodes = value
        .get_mut("nodes")
        .filter(|nodes| nodes.is_object())
        .map(Value::take);
    if let Some(Value::Object(nodes)) = nodes {
        release(value);
        let documents = nodes
            .into_iter()
            .map(|(id, mut container)| {
                let document = container.get_mut("document").map(Value::take);
                release(container);
                (id, document)
            })
            .collect();
        return assemble_selection(documents, last_modified, max_depth);
    }

    let decoded = decode_owned(value, max_depth)?;
    Ok(FetchedDocument {
        root: decoded.root,
        last_modified,
        diagnostics: decoded.diagnostics,
    })
}

/// Decode each requested subtree and hang them under one synthetic root.
fn assemble_selection(
    documents: Vec<(String, Option<Value>)>,
    last_modified: Option<String>,
    max_depth: usize,
) -> Result<FetchedDocument> {
    let mut root = DocumentNode::new(SELECTION_ROOT_ID, "Selection", NodeKind::Other);
    let mut diagnostics = Vec::new();
    let child_depth = max_depth.saturating_sub(1);

    for (id, document) in documents {
        let Some(document) = document else {
            warn!(node = %id, "requested node missing from response");
            diagnostics.push(Diagnostic::MalformedNode {
                parent_id: Some(SELECTION_ROOT_ID.to_string()),
                node_id: Some(id),
                reason: "node not returned by the API".to_string(),
            });
            continue;
        };
        match decode_owned(document, child_depth) {
            Ok(decoded) => {
                debug!(node = %id, "decoded selected node");
                root.children.push(decoded.root);
                diagnostics.extend(decoded.diagnostics);
            }
            Err(e) => {
                warn!(node = %id, error = %e, "skipping malformed selected node");
                diagnostics.push(Diagnostic::MalformedNode {
                    parent_id: Some(SELECTION_ROOT_ID.to_string()),
                    node_id: Some(id),
                    reason: e.to_string(),
                });
            }
        }
    }

    if root.children.is_empty() {
        return Err(DsyncError::figma_api(
            None,
            "none of the requested nodes could be decoded",
        ));
    }
    Ok(FetchedDocument {
        root,
        last_modified,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn text(id: &str) -> Value {
        json!({ "id": id, "name": "Label", "type": "TEXT", "characters": "Hi" })
    }

    #[tokio::test]
    async fn file_source_reads_full_file_responses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let body = json!({
            "name": "Kit",
            "lastModified": "2024-05-01T10:00:00Z",
            "document": { "id": "0:0", "name": "Document", "type": "DOCUMENT", "children": [text("1:1")] }
        });
        fs::write(&path, body.to_string()).unwrap();

        let fetched = DocumentSource::File(path).fetch(16).await.unwrap();
        assert_eq!(fetched.last_modified.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(fetched.root.children.len(), 1);
        assert_eq!(fetched.root.children[0].kind, NodeKind::Text);
    }

    #[tokio::test]
    async fn file_source_accepts_bare_nodes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node.json");
        fs::write(&path, text("2:2").to_string()).unwrap();

        let fetched = DocumentSource::File(path).fetch(16).await.unwrap();
        assert_eq!(fetched.root.id, "2:2");
        assert!(fetched.last_modified.is_none());
    }

    /// A FRAME chain `levels` nodes deep, built as text so the test never
    /// holds the nested value itself.
    fn frame_chain(levels: usize) -> String {
        let mut raw = String::from(r#"{"lastModified":"2024-05-01T10:00:00Z","document":"#);
        for level in 0..levels {
            raw.push_str(&format!(
                r#"{{"id":"n{level}","name":"Level {level}","type":"FRAME","children":["#
            ));
        }
        raw.push_str(&"]}".repeat(levels));
        raw.push('}');
        raw
    }

    fn chain_depth(root: &DocumentNode) -> usize {
        let mut depth = 0;
        let mut node = root;
        while let Some(child) = node.children.first() {
            node = child;
            depth += 1;
        }
        depth
    }

    #[tokio::test]
    async fn file_source_cuts_documents_deeper_than_max_depth() {
        let dir = TempDir::new().unwrap();
        for levels in [70, 5_000] {
            let path = dir.path().join(format!("deep-{levels}.json"));
            fs::write(&path, frame_chain(levels)).unwrap();

            let fetched = DocumentSource::File(path).fetch(64).await.unwrap();
            assert_eq!(fetched.root.id, "n0");
            assert_eq!(chain_depth(&fetched.root), 64);
            assert_eq!(fetched.diagnostics.len(), 1);
            match &fetched.diagnostics[0] {
                Diagnostic::MalformedNode {
                    parent_id, reason, ..
                } => {
                    assert_eq!(parent_id.as_deref(), Some("n64"));
                    assert!(reason.contains("maximum depth of 64"));
                }
                other => panic!("expected malformed node, got {other:?}"),
            }
        }
    }

    #[test]
    fn release_handles_deeply_nested_values() {
        let value: Value = parse_json(&frame_chain(20_000)).unwrap();
        release(value);
    }

    #[tokio::test]
    async fn unavailable_source_fails_with_reason() {
        let err = DocumentSource::Unavailable("no Figma file key configured".to_string())
            .fetch(16)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no Figma file key"));
    }

    #[test]
    fn selection_skips_missing_and_malformed_nodes() {
        let fetched = assemble_selection(
            vec![
                ("1:1".to_string(), Some(text("1:1"))),
                ("1:2".to_string(), None),
                ("1:3".to_string(), Some(json!("not a node"))),
            ],
            None,
            16,
        )
        .unwrap();

        assert_eq!(fetched.root.id, SELECTION_ROOT_ID);
        assert_eq!(fetched.root.children.len(), 1);
        assert_eq!(fetched.diagnostics.len(), 2);
    }

    #[test]
    fn selection_with_no_decodable_nodes_is_an_error() {
        let result = assemble_selection(vec![("1:2".to_string(), None)], None, 16);
        assert!(result.is_err());
    }

    #[test]
    fn config_without_file_key_is_unavailable() {
        let config = Config::default();
        assert!(matches!(
            DocumentSource::from_config(&config),
            DocumentSource::Unavailable(_)
        ));
    }

    #[test]
    fn config_document_path_takes_priority() {
        let config = Config {
            document_path: Some(PathBuf::from("doc.json")),
            file_key: Some("abc".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            DocumentSource::from_config(&config),
            DocumentSource::File(_)
        ));
    }
}
