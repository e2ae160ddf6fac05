//! Iterative pre-order traversal of a [`DocumentNode`] tree.

use std::collections::HashSet;

use tracing::warn;

use crate::diagnostics::Diagnostic;
use crate::types::DocumentNode;

/// A node yielded by [`Walk`], with its depth below the root.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub node: &'a DocumentNode,
    pub depth: usize,
}

/// Lazy pre-order walk: parent before children, children in declared order.
///
/// Ids already yielded are skipped along with their subtree, as are nodes
/// deeper than `max_depth`. Each skip is logged and recorded; collect them
/// with [`Walk::into_diagnostics`] once the walk is exhausted.
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<(&'a DocumentNode, usize, Option<&'a str>)>,
    seen: HashSet<&'a str>,
    max_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

/// Start a fresh walk at `root`. Walks are cheap; restart by calling again.
pub fn walk(root: &DocumentNode, max_depth: usize) -> Walk<'_> {
    Walk {
        stack: vec![(root, 0, None)],
        seen: HashSet::new(),
        max_depth,
        diagnostics: Vec::new(),
    }
}

impl<'a> Walk<'a> {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn skip(&mut self, node: &DocumentNode, parent: Option<&str>, reason: String) {
        warn!(node = %node.id, parent = parent.unwrap_or("<root>"), %reason, "skipping node");
        self.diagnostics.push(Diagnostic::MalformedNode {
            parent_id: parent.map(str::to_owned),
            node_id: Some(node.id.clone()),
            reason,
        });
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, depth, parent)) = self.stack.pop() {
            if depth > self.max_depth {
                let reason = format!("exceeds the maximum depth of {}", self.max_depth);
                self.skip(node, parent, reason);
                continue;
            }
            if !self.seen.insert(node.id.as_str()) {
                self.skip(node, parent, "duplicate node id".to_string());
                continue;
            }
            self.stack.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child| (child, depth + 1, Some(node.id.as_str()))),
            );
            return Some(Visit { node, depth });
        }
        None
    }
}
