//! Classified component trees and the artifacts synthesized from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::document::NodeKind;

/// Structural category of a component subtree; drives template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Archetype {
    Button,
    Card,
    TextField,
    Modal,
    Navigation,
    Generic,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::Button,
        Archetype::Card,
        Archetype::TextField,
        Archetype::Modal,
        Archetype::Navigation,
        Archetype::Generic,
    ];

    /// Stem used for template override file names (`text_field.swift.tmpl`).
    pub fn template_stem(&self) -> &'static str {
        match self {
            Archetype::Button => "button",
            Archetype::Card => "card",
            Archetype::TextField => "text_field",
            Archetype::Modal => "modal",
            Archetype::Navigation => "navigation",
            Archetype::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// A classified subtree, built once per run and owned by the synthesis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub id: String,
    pub name: String,
    pub archetype: Archetype,
    pub kind: NodeKind,
    pub properties: BTreeMap<String, String>,
    pub children: Vec<ComponentDescriptor>,
    pub orientation: Orientation,
}

impl ComponentDescriptor {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn numeric_property(&self, key: &str) -> Option<f64> {
        self.property(key).and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    ComponentSource,
    Preview,
    Test,
    TokenSource,
}

/// A single generated output file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    pub relative_path: PathBuf,
    pub content: String,
    pub kind: ArtifactKind,
}
