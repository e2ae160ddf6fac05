//! Component selection, archetype classification and layout inference.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::diagnostics::Diagnostic;
use crate::types::{
    Archetype, ComponentDescriptor, DocumentNode, Geometry, LayoutMode, NodeKind, Orientation,
};
use crate::walker::walk;

/// Which subtrees become components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "ids")]
pub enum Selection {
    /// Explicit node ids, in document order.
    Nodes(Vec<String>),
    /// The first visible frame, group or component on every path from the root.
    AllFrames,
    /// Every visible component node.
    #[default]
    Components,
}

const ARCHETYPE_RULES: &[(&[&str], Archetype)] = &[
    (&["button"], Archetype::Button),
    (&["card"], Archetype::Card),
    (&["input", "field"], Archetype::TextField),
    (&["modal", "dialog"], Archetype::Modal),
    (&["navigation", "nav"], Archetype::Navigation),
];

/// First matching case-insensitive substring rule, else `Generic`.
pub fn classify_archetype(name: &str) -> Archetype {
    let lower = name.to_lowercase();
    ARCHETYPE_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map_or(Archetype::Generic, |(_, archetype)| *archetype)
}

/// Stacking direction implied by two adjacent siblings.
pub fn pair_orientation(a: &Geometry, b: &Geometry) -> Orientation {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    if dx > dy {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

/// Orientation of a container's visible children, or `None` when fewer
/// than two children leave nothing to decide. A declared auto-layout
/// direction takes precedence over geometry.
pub fn infer_orientation(node: &DocumentNode) -> Option<Orientation> {
    match node.layout.as_ref().and_then(|l| l.mode) {
        Some(LayoutMode::Horizontal) => return Some(Orientation::Horizontal),
        Some(LayoutMode::Vertical) => return Some(Orientation::Vertical),
        None => {}
    }

    let children: Vec<&DocumentNode> = node.children.iter().filter(|c| c.visible).collect();
    if children.len() < 2 {
        return None;
    }

    let (mut vertical, mut horizontal) = (0usize, 0usize);
    for pair in children.windows(2) {
        match pair_orientation(&pair[0].geometry, &pair[1].geometry) {
            Orientation::Vertical => vertical += 1,
            Orientation::Horizontal => horizontal += 1,
        }
    }

    Some(if horizontal > vertical {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    })
}

/// Render a point value without a trailing `.0`.
pub fn format_points(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Build the descriptor for `node` and its visible descendants, at most
/// `max_depth` levels deep.
pub fn describe(node: &DocumentNode, max_depth: usize) -> ComponentDescriptor {
    describe_at(node, 0, max_depth)
}

fn describe_at(node: &DocumentNode, depth: usize, max_depth: usize) -> ComponentDescriptor {
    let children = if depth < max_depth {
        node.children
            .iter()
            .filter(|c| c.visible)
            .map(|c| describe_at(c, depth + 1, max_depth))
            .collect()
    } else {
        if !node.children.is_empty() {
            warn!(node = %node.id, max_depth, "descriptor truncated at depth bound");
        }
        Vec::new()
    };

    let archetype = classify_archetype(&node.name);
    let orientation = infer_orientation(node).unwrap_or_default();
    debug!(node = %node.id, ?archetype, ?orientation, "classified");

    ComponentDescriptor {
        id: node.id.clone(),
        name: node.name.clone(),
        archetype,
        kind: node.kind,
        properties: properties(node),
        children,
        orientation,
    }
}

fn properties(node: &DocumentNode) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();

    if node.kind != NodeKind::Text {
        if let Some(fill) = node.first_solid_fill() {
            props.insert("background".to_string(), fill.to_hex());
            if fill.a < 1.0 {
                props.insert("background_opacity".to_string(), format!("{:.2}", fill.a));
            }
        }
    }

    let text_color = if node.kind == NodeKind::Text {
        node.first_solid_fill()
    } else {
        node.children
            .iter()
            .filter(|c| c.visible && c.kind == NodeKind::Text)
            .find_map(DocumentNode::first_solid_fill)
    };
    if let Some(color) = text_color {
        props.insert("text_color".to_string(), color.to_hex());
    }

    if let Some(radius) = node.corner_radius.filter(|r| *r > 0.0) {
        props.insert("radius".to_string(), format_points(radius));
    }
    if let Some(layout) = &node.layout {
        if let Some(padding) = layout.max_padding() {
            props.insert("padding".to_string(), format_points(padding));
        }
        if let Some(spacing) = layout.item_spacing {
            props.insert("item_spacing".to_string(), format_points(spacing));
        }
    }
    if let Some(style) = &node.text_style {
        if let Some(size) = style.font_size {
            props.insert("font_size".to_string(), format_points(size));
        }
        if let Some(family) = &style.font_family {
            props.insert("font_family".to_string(), family.clone());
        }
    }
    if let Some(text) = &node.characters {
        props.insert("text".to_string(), text.clone());
    }
    if node.geometry.width > 0.0 || node.geometry.height > 0.0 {
        props.insert("width".to_string(), format_points(node.geometry.width));
        props.insert("height".to_string(), format_points(node.geometry.height));
    }

    props
}

/// Nodes matching `selection`, in document order, plus a diagnostic for
/// every requested id that was not found.
pub fn select<'a>(
    root: &'a DocumentNode,
    selection: &Selection,
    max_depth: usize,
) -> (Vec<&'a DocumentNode>, Vec<Diagnostic>) {
    match selection {
        Selection::Components => (
            walk(root, max_depth)
                .map(|v| v.node)
                .filter(|n| n.kind == NodeKind::Component && n.visible)
                .collect(),
            Vec::new(),
        ),
        Selection::AllFrames => (top_level_containers(root, max_depth), Vec::new()),
        Selection::Nodes(ids) => {
            let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
            let found: Vec<&DocumentNode> = walk(root, max_depth)
                .map(|v| v.node)
                .filter(|n| wanted.contains(n.id.as_str()))
                .collect();
            let found_ids: HashSet<&str> = found.iter().map(|n| n.id.as_str()).collect();
            let missing = ids
                .iter()
                .filter(|id| !found_ids.contains(id.as_str()))
                .map(|id| {
                    warn!(node = %id, "selected node not found in document");
                    Diagnostic::Synthesis {
                        component: id.clone(),
                        message: "node not found in document".to_string(),
                    }
                })
                .collect();
            (found, missing)
        }
    }
}

fn top_level_containers(root: &DocumentNode, max_depth: usize) -> Vec<&DocumentNode> {
    let mut out = Vec::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        if !node.visible || depth > max_depth {
            continue;
        }
        if node.kind.is_container() {
            out.push(node);
            continue;
        }
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }
    out
}
