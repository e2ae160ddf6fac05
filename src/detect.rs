//! Snapshot comparison gating the synthesis stage.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{TokenCategory, TokenSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeReason {
    NoBaseline,
    CardinalityChanged,
    ValuesChanged,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub changed: bool,
    pub reason: ChangeReason,
    /// Category-qualified names (`color/primary`) of added, removed or
    /// modified tokens.
    pub changed_tokens: Vec<String>,
}

/// Compare a fresh snapshot against the last synchronized one.
///
/// Timestamps are ignored; only token contents count.
pub fn detect_changes(previous: Option<&TokenSnapshot>, current: &TokenSnapshot) -> ChangeReport {
    let Some(previous) = previous else {
        return ChangeReport {
            changed: true,
            reason: ChangeReason::NoBaseline,
            changed_tokens: Vec::new(),
        };
    };

    let mut changed_tokens = Vec::new();
    let mut cardinality_changed = false;

    let mut compare = |category: TokenCategory, cardinality: bool, names: Vec<String>| {
        cardinality_changed |= cardinality;
        changed_tokens.extend(names.into_iter().map(|n| category.qualify(&n)));
    };

    let (c, n) = diff_map(&previous.colors, &current.colors);
    compare(TokenCategory::Color, c, n);
    let (c, n) = diff_map(&previous.typography, &current.typography);
    compare(TokenCategory::Typography, c, n);
    let (c, n) = diff_map(&previous.spacing, &current.spacing);
    compare(TokenCategory::Spacing, c, n);
    let (c, n) = diff_map(&previous.radii, &current.radii);
    compare(TokenCategory::Radius, c, n);
    let (c, n) = diff_map(&previous.shadows, &current.shadows);
    compare(TokenCategory::Shadow, c, n);

    let reason = if cardinality_changed {
        ChangeReason::CardinalityChanged
    } else if !changed_tokens.is_empty() {
        ChangeReason::ValuesChanged
    } else {
        ChangeReason::Unchanged
    };

    ChangeReport {
        changed: reason != ChangeReason::Unchanged,
        reason,
        changed_tokens,
    }
}

/// Returns whether the sizes differ and every name whose value differs or
/// which exists on only one side, in name order.
fn diff_map<V: PartialEq>(
    previous: &BTreeMap<String, V>,
    current: &BTreeMap<String, V>,
) -> (bool, Vec<String>) {
    let keys: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();
    let names = keys
        .into_iter()
        .filter(|key| previous.get(*key) != current.get(*key))
        .cloned()
        .collect();
    (previous.len() != current.len(), names)
}
