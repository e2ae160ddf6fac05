//! Document graph types decoded from the design tool.
//!
//! A [`DocumentNode`] tree is created fresh for every fetch and owned
//! exclusively by its parent. Decoding from raw API JSON lives in
//! [`crate::figma::conversion`].

use serde::{Deserialize, Serialize};

/// Closed set of node kinds the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Frame,
    Component,
    Text,
    Rectangle,
    Group,
    Other,
}

impl NodeKind {
    /// Map a Figma `type` string onto a node kind.
    pub fn from_figma_type(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "FRAME" | "SECTION" | "INSTANCE" | "COMPONENT_SET" => NodeKind::Frame,
            "COMPONENT" => NodeKind::Component,
            "TEXT" => NodeKind::Text,
            "RECTANGLE" | "ELLIPSE" | "VECTOR" => NodeKind::Rectangle,
            "GROUP" => NodeKind::Group,
            _ => NodeKind::Other,
        }
    }

    /// Whether the kind can hold a laid-out child list.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::Frame | NodeKind::Component | NodeKind::Group
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaintKind {
    Solid,
    Other,
}

/// 8-bit RGB color with a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Upper-case `#RRGGBB` representation (alpha dropped).
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub kind: PaintKind,
    pub color: Option<Rgba>,
}

impl Paint {
    pub fn solid(color: Rgba) -> Self {
        Self {
            kind: PaintKind::Solid,
            color: Some(color),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<f64>,
    pub line_height: Option<f64>,
    pub letter_spacing: Option<f64>,
}

/// Declared auto-layout direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutMode {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpacing {
    pub padding_top: Option<f64>,
    pub padding_right: Option<f64>,
    pub padding_bottom: Option<f64>,
    pub padding_left: Option<f64>,
    pub item_spacing: Option<f64>,
    pub mode: Option<LayoutMode>,
}

impl LayoutSpacing {
    /// Present fields paired with their fixed spacing keys, in a stable order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        [
            ("padding-top", self.padding_top),
            ("padding-right", self.padding_right),
            ("padding-bottom", self.padding_bottom),
            ("padding-left", self.padding_left),
            ("item-spacing", self.item_spacing),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }

    /// Largest declared padding, used as the single padding of a component.
    pub fn max_padding(&self) -> Option<f64> {
        [
            self.padding_top,
            self.padding_right,
            self.padding_bottom,
            self.padding_left,
        ]
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A visible drop shadow effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub color: Rgba,
    pub offset_x: f64,
    pub offset_y: f64,
    pub radius: f64,
    pub spread: f64,
}

/// One node of the design document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
    #[serde(default)]
    pub fills: Vec<Paint>,
    pub text_style: Option<TextStyle>,
    pub layout: Option<LayoutSpacing>,
    #[serde(default)]
    pub geometry: Geometry,
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub characters: Option<String>,
}

fn default_visible() -> bool {
    true
}

impl DocumentNode {
    /// A bare node with no style information.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            children: Vec::new(),
            fills: Vec::new(),
            text_style: None,
            layout: None,
            geometry: Geometry::default(),
            corner_radius: None,
            effects: Vec::new(),
            visible: true,
            characters: None,
        }
    }

    pub fn with_children(mut self, children: Vec<DocumentNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_fill(mut self, color: Rgba) -> Self {
        self.fills.push(Paint::solid(color));
        self
    }

    pub fn at(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.geometry = Geometry {
            x,
            y,
            width,
            height,
        };
        self
    }

    /// First solid paint carrying a color.
    pub fn first_solid_fill(&self) -> Option<Rgba> {
        self.fills
            .iter()
            .find(|p| p.kind == PaintKind::Solid && p.color.is_some())
            .and_then(|p| p.color)
    }
}
