//! Decoding raw Figma node JSON into [`DocumentNode`] trees.
//!
//! Decoding is iterative so arbitrarily deep documents cannot exhaust the
//! stack. A child that fails to decode is skipped together with its subtree
//! and recorded as a [`Diagnostic::MalformedNode`]; only a malformed root is
//! an error.

use palette::Srgb;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::diagnostics::Diagnostic;
use crate::error::{DsyncError, Result};
use crate::types::{
    DocumentNode, Effect, Geometry, LayoutMode, LayoutSpacing, NodeKind, Paint, PaintKind, Rgba,
    TextStyle,
};

use super::api_types::{FigmaColor, FigmaEffect, FigmaNodeFields, FigmaPaintData, FigmaTypeStyle};

/// A decoded tree plus everything that was skipped while building it.
#[derive(Debug)]
pub struct DecodedDocument {
    pub root: DocumentNode,
    pub diagnostics: Vec<Diagnostic>,
}

const NO_CHILDREN: &[Value] = &[];

struct Frame<'a> {
    node: DocumentNode,
    pending: std::slice::Iter<'a, Value>,
    depth: usize,
}

/// Parse JSON with no nesting limit. Depth is bounded later by
/// [`decode_document`], which cuts the tree instead of rejecting it.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_str(raw);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Drop a raw tree without recursing once per nesting level.
pub fn release(value: Value) {
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Array(items) => stack.extend(items),
            Value::Object(map) => stack.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

/// [`decode_document`] for an owned tree, which is released afterwards.
pub fn decode_owned(value: Value, max_depth: usize) -> Result<DecodedDocument> {
    let decoded = decode_document(&value, max_depth);
    release(value);
    decoded
}

/// Decode `value` and its descendants up to `max_depth` levels below it.
pub fn decode_document(value: &Value, max_depth: usize) -> Result<DecodedDocument> {
    let mut diagnostics = Vec::new();
    let (root, children) = decode_node(value).map_err(|reason| {
        DsyncError::figma_api(None, format!("document root is malformed: {reason}"))
    })?;
    let root_children = match children {
        Ok(children) => children,
        Err(reason) => {
            record(&mut diagnostics, None, Some(&root.id), reason);
            NO_CHILDREN
        }
    };

    let mut stack = vec![Frame {
        node: root,
        pending: root_children.iter(),
        depth: 0,
    }];

    loop {
        let Some(top) = stack.last_mut() else {
            break;
        };

        let Some(child) = top.pending.next() else {
            let Some(done) = stack.pop() else {
                break;
            };
            match stack.last_mut() {
                Some(parent) => parent.node.children.push(done.node),
                None => {
                    return Ok(DecodedDocument {
                        root: done.node,
                        diagnostics,
                    })
                }
            }
            continue;
        };

        let parent_id = top.node.id.clone();
        let depth = top.depth + 1;
        if depth > max_depth {
            let skipped = 1 + top.pending.len();
            top.pending = NO_CHILDREN.iter();
            record(
                &mut diagnostics,
                Some(&parent_id),
                child_id(child),
                format!("{skipped} child node(s) exceed the maximum depth of {max_depth}"),
            );
            continue;
        }

        match decode_node(child) {
            Ok((node, Ok(children))) => stack.push(Frame {
                node,
                pending: children.iter(),
                depth,
            }),
            Ok((node, Err(reason))) => {
                record(&mut diagnostics, Some(&parent_id), Some(&node.id), reason);
                stack.push(Frame {
                    node,
                    pending: NO_CHILDREN.iter(),
                    depth,
                });
            }
            Err(reason) => record(&mut diagnostics, Some(&parent_id), child_id(child), reason),
        }
    }

    // The loop only exits through the root pop above.
    Err(DsyncError::figma_api(None, "document decoding ended without a root"))
}

fn record(
    diagnostics: &mut Vec<Diagnostic>,
    parent_id: Option<&str>,
    node_id: Option<&str>,
    reason: String,
) {
    warn!(
        parent = parent_id.unwrap_or("<root>"),
        node = node_id.unwrap_or("<unknown>"),
        %reason,
        "skipping malformed node"
    );
    diagnostics.push(Diagnostic::MalformedNode {
        parent_id: parent_id.map(str::to_owned),
        node_id: node_id.map(str::to_owned),
        reason,
    });
}

fn child_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

type Children<'a> = std::result::Result<&'a [Value], String>;

/// Decode a single node's own fields; the children slice is returned
/// undecoded so the caller can walk it.
fn decode_node(value: &Value) -> std::result::Result<(DocumentNode, Children<'_>), String> {
    if !value.is_object() {
        return Err("node is not a JSON object".to_string());
    }
    let fields = FigmaNodeFields::deserialize(value).map_err(|e| e.to_string())?;
    if fields.id.trim().is_empty() {
        return Err("node id is empty".to_string());
    }

    let children = match value.get("children") {
        None | Some(Value::Null) => Ok(NO_CHILDREN),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err("children is not an array".to_string()),
    };

    debug!(id = %fields.id, kind = %fields.node_type, "decoded node");
    Ok((map_node(fields), children))
}

fn map_node(fields: FigmaNodeFields) -> DocumentNode {
    let kind = NodeKind::from_figma_type(&fields.node_type);
    let layout = map_layout(&fields);
    DocumentNode {
        id: fields.id,
        name: fields.name,
        kind,
        children: Vec::new(),
        fills: fields.fills.iter().map(map_paint).collect(),
        text_style: fields.style.as_ref().map(map_text_style),
        layout,
        geometry: fields
            .absolute_bounding_box
            .map(|bb| Geometry {
                x: bb.x,
                y: bb.y,
                width: bb.width,
                height: bb.height,
            })
            .unwrap_or_default(),
        corner_radius: fields.corner_radius,
        effects: fields.effects.iter().filter_map(map_effect).collect(),
        visible: fields.visible.unwrap_or(true),
        characters: fields.characters,
    }
}

/// Convert a unit-range Figma color to 8-bit channels, folding in paint opacity.
pub fn map_color(color: &FigmaColor, opacity: Option<f64>) -> Rgba {
    let rgb: Srgb<u8> = Srgb::new(
        color.r.clamp(0.0, 1.0) as f32,
        color.g.clamp(0.0, 1.0) as f32,
        color.b.clamp(0.0, 1.0) as f32,
    )
    .into_format();
    Rgba {
        r: rgb.red,
        g: rgb.green,
        b: rgb.blue,
        a: (color.a * opacity.unwrap_or(1.0)).clamp(0.0, 1.0),
    }
}

fn map_paint(paint: &FigmaPaintData) -> Paint {
    let visible = paint.visible.unwrap_or(true);
    let kind = if visible && paint.paint_type.eq_ignore_ascii_case("solid") {
        PaintKind::Solid
    } else {
        PaintKind::Other
    };
    Paint {
        kind,
        color: paint.color.as_ref().map(|c| map_color(c, paint.opacity)),
    }
}

fn map_text_style(style: &FigmaTypeStyle) -> TextStyle {
    TextStyle {
        font_family: style.font_family.clone(),
        font_size: style.font_size,
        font_weight: style.font_weight,
        line_height: style.line_height_px,
        letter_spacing: style.letter_spacing,
    }
}

fn map_layout(fields: &FigmaNodeFields) -> Option<LayoutSpacing> {
    let mode = match fields.layout_mode.as_deref() {
        Some("HORIZONTAL") => Some(LayoutMode::Horizontal),
        Some("VERTICAL") => Some(LayoutMode::Vertical),
        _ => None,
    };
    let layout = LayoutSpacing {
        padding_top: fields.padding_top,
        padding_right: fields.padding_right,
        padding_bottom: fields.padding_bottom,
        padding_left: fields.padding_left,
        item_spacing: fields.item_spacing,
        mode,
    };
    (layout != LayoutSpacing::default()).then_some(layout)
}

fn map_effect(effect: &FigmaEffect) -> Option<Effect> {
    if effect.effect_type != "DROP_SHADOW" || effect.visible == Some(false) {
        return None;
    }
    let color = effect.color.as_ref()?;
    Some(Effect {
        color: map_color(color, None),
        offset_x: effect.offset.as_ref().map_or(0.0, |o| o.x),
        offset_y: effect.offset.as_ref().map_or(0.0, |o| o.y),
        radius: effect.radius.unwrap_or(0.0),
        spread: effect.spread.unwrap_or(0.0),
    })
}
