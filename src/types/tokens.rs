//! Canonical design tokens and point-in-time snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::document::Rgba;

/// Token categories, used to qualify names in change reports and registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Color,
    Typography,
    Spacing,
    Radius,
    Shadow,
}

impl TokenCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::Color => "color",
            TokenCategory::Typography => "typography",
            TokenCategory::Spacing => "spacing",
            TokenCategory::Radius => "radius",
            TokenCategory::Shadow => "shadow",
        }
    }

    /// `color/primary`-style qualified name.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}/{}", self.as_str(), name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorToken {
    pub name: String,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl ColorToken {
    pub fn new(name: impl Into<String>, color: Rgba) -> Self {
        Self {
            name: name.into(),
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        }
    }

    pub fn rgba(&self) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyToken {
    pub name: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u16,
    pub line_height: f64,
    pub letter_spacing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowToken {
    pub name: String,
    pub color: Rgba,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub spread: f64,
}

/// Immutable capture of every token extracted in one pass.
///
/// Maps are ordered so that serializing an unchanged snapshot is
/// byte-identical across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    /// Last-modified stamp of the source document, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub colors: BTreeMap<String, ColorToken>,
    #[serde(default)]
    pub typography: BTreeMap<String, TypographyToken>,
    #[serde(default)]
    pub spacing: BTreeMap<String, f64>,
    #[serde(default)]
    pub radii: BTreeMap<String, f64>,
    #[serde(default)]
    pub shadows: BTreeMap<String, ShadowToken>,
}

impl TokenSnapshot {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
            && self.typography.is_empty()
            && self.spacing.is_empty()
            && self.radii.is_empty()
            && self.shadows.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.colors.len()
            + self.typography.len()
            + self.spacing.len()
            + self.radii.len()
            + self.shadows.len()
    }

    /// Canonical JSON form used for persistence and idempotence checks.
    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
