//! Core types used throughout the dsync library.
//!
//! - [`document`] - The design-tool node tree ([`DocumentNode`] and friends)
//! - [`tokens`] - Canonical design tokens and the [`TokenSnapshot`]
//! - [`component`] - Classified component trees and generated artifacts

pub mod component;
pub mod document;
pub mod tokens;

pub use component::{ArtifactKind, Archetype, ComponentDescriptor, GeneratedArtifact, Orientation};
pub use document::{
    DocumentNode, Effect, Geometry, LayoutMode, LayoutSpacing, NodeKind, Paint, PaintKind, Rgba,
    TextStyle,
};
pub use tokens::{
    ColorToken, ShadowToken, TokenCategory, TokenSnapshot, TypographyToken,
};
