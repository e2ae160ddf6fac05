//! Figma API response types for parsing JSON from the Figma REST API.
//!
//! Node trees are kept as raw [`serde_json::Value`] in the envelopes so that a
//! single malformed child does not fail decoding of the whole document; the
//! per-node fields are decoded with [`FigmaNodeFields`].

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// A Figma file response from the files endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaFileResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub document: Value,
}

/// Response from the nodes endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaNodesResponse {
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub nodes: HashMap<String, FigmaNodeContainer>,
}

/// Wrapper containing the document for a node.
#[derive(Debug, Deserialize)]
pub struct FigmaNodeContainer {
    pub document: Value,
}

/// The style-bearing fields of a single node; children are decoded separately.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaNodeFields {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub fills: Vec<FigmaPaintData>,
    #[serde(default)]
    pub style: Option<FigmaTypeStyle>,
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub absolute_bounding_box: Option<FigmaBoundingBox>,
    #[serde(default)]
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub padding_top: Option<f64>,
    #[serde(default)]
    pub padding_right: Option<f64>,
    #[serde(default)]
    pub padding_bottom: Option<f64>,
    #[serde(default)]
    pub padding_left: Option<f64>,
    #[serde(default)]
    pub item_spacing: Option<f64>,
    #[serde(default)]
    pub layout_mode: Option<String>,
    #[serde(default)]
    pub effects: Vec<FigmaEffect>,
}

/// Bounding box coordinates from Figma.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaBoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Typography style from Figma.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaTypeStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<f64>,
    pub line_height_px: Option<f64>,
    pub letter_spacing: Option<f64>,
}

/// Paint/fill data from Figma.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaPaintData {
    #[serde(rename = "type")]
    pub paint_type: String,
    pub color: Option<FigmaColor>,
    pub opacity: Option<f64>,
    pub visible: Option<bool>,
}

/// RGBA color from Figma (0.0-1.0 range).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FigmaColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct FigmaVector {
    pub x: f64,
    pub y: f64,
}

/// Layer effect (shadows, blurs).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaEffect {
    #[serde(rename = "type")]
    pub effect_type: String,
    pub visible: Option<bool>,
    pub color: Option<FigmaColor>,
    pub offset: Option<FigmaVector>,
    pub radius: Option<f64>,
    pub spread: Option<f64>,
}
