//! Token extraction from a walked document tree.

use tracing::{debug, info};

use crate::diagnostics::Diagnostic;
use crate::naming::token_name;
use crate::types::{
    ColorToken, DocumentNode, NodeKind, ShadowToken, TokenSnapshot, TypographyToken,
};
use crate::walker::walk;

pub const DEFAULT_FONT_FAMILY: &str = "System";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_FONT_WEIGHT: u16 = 400;
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Result of one extraction pass.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub snapshot: TokenSnapshot,
    pub diagnostics: Vec<Diagnostic>,
}

/// Accumulate every token in the tree under `root`.
///
/// Identical derived names overwrite earlier entries (last write wins), and
/// spacing is keyed by position, so the result only depends on the tree.
pub fn extract_tokens(
    root: &DocumentNode,
    timestamp: Option<String>,
    max_depth: usize,
) -> Extraction {
    let mut snapshot = TokenSnapshot {
        timestamp,
        ..TokenSnapshot::default()
    };

    let mut visits = walk(root, max_depth);
    for visit in visits.by_ref() {
        let node = visit.node;
        let name = token_name(&node.name);

        if let Some(color) = node.first_solid_fill() {
            debug!(node = %node.id, token = %name, hex = %color.to_hex(), "color token");
            snapshot
                .colors
                .insert(name.clone(), ColorToken::new(name.clone(), color));
        }

        if let Some(token) = typography_token(node, &name) {
            snapshot.typography.insert(name.clone(), token);
        }

        if let Some(layout) = &node.layout {
            for (key, points) in layout.entries() {
                snapshot.spacing.insert(key.to_string(), points);
            }
        }

        if let Some(radius) = node.corner_radius.filter(|r| *r > 0.0) {
            snapshot.radii.insert(name.clone(), radius);
        }

        if let Some(effect) = node.effects.first() {
            snapshot.shadows.insert(
                name.clone(),
                ShadowToken {
                    name: name.clone(),
                    color: effect.color,
                    x: effect.offset_x,
                    y: effect.offset_y,
                    radius: effect.radius,
                    spread: effect.spread,
                },
            );
        }
    }

    info!(
        colors = snapshot.colors.len(),
        typography = snapshot.typography.len(),
        spacing = snapshot.spacing.len(),
        radii = snapshot.radii.len(),
        shadows = snapshot.shadows.len(),
        "extracted tokens"
    );

    Extraction {
        snapshot,
        diagnostics: visits.into_diagnostics(),
    }
}

fn typography_token(node: &DocumentNode, name: &str) -> Option<TypographyToken> {
    if node.kind != NodeKind::Text {
        return None;
    }
    let style = node.text_style.as_ref()?;
    let font_size = style.font_size.unwrap_or(DEFAULT_FONT_SIZE);
    Some(TypographyToken {
        name: name.to_string(),
        font_family: style
            .font_family
            .clone()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        font_size,
        font_weight: style
            .font_weight
            .map_or(DEFAULT_FONT_WEIGHT, clamp_weight),
        line_height: style.line_height.unwrap_or(font_size * LINE_HEIGHT_FACTOR),
        letter_spacing: style.letter_spacing.unwrap_or(0.0),
    })
}

fn clamp_weight(weight: f64) -> u16 {
    if weight.is_nan() {
        return DEFAULT_FONT_WEIGHT;
    }
    weight.round().clamp(100.0, 900.0) as u16
}
