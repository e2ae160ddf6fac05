//! Mapping raw style values onto canonical tokens.

use indexmap::IndexMap;
use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::diagnostics::Diagnostic;
use crate::naming::{member_name, token_name, NameAllocator};
use crate::types::{Rgba, TokenCategory, TokenSnapshot};

pub const DEFAULT_COLOR: &str = "text-primary";
pub const DEFAULT_SPACING: &str = "md";
pub const DEFAULT_RADIUS: &str = "md";
pub const DEFAULT_FONT: &str = "body";

/// What to do with a value that matches no canonical token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// Register the value as a new canonical token.
    Register,
    /// Use the category's designated default token.
    #[default]
    Fallback,
}

/// Maximum distance at which a value still matches a token, per category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    pub color: f64,
    pub spacing: f64,
    pub radius: f64,
    pub font_size: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            color: 24.0,
            spacing: 2.0,
            radius: 2.0,
            font_size: 1.0,
        }
    }
}

/// A value that can be compared against canonical tokens.
pub trait TokenValue: Copy + Debug {
    fn distance(&self, other: &Self) -> f64;
    /// Human-readable form for diagnostics.
    fn describe(&self) -> String;
    /// Name for a newly registered token holding this value.
    fn derive_name(&self, category: TokenCategory) -> String;
}

impl TokenValue for Rgba {
    /// Sum of absolute channel differences, alpha scaled to the 0-255 range.
    fn distance(&self, other: &Self) -> f64 {
        let channels = (self.r as i32 - other.r as i32).abs()
            + (self.g as i32 - other.g as i32).abs()
            + (self.b as i32 - other.b as i32).abs();
        channels as f64 + (self.a - other.a).abs() * 255.0
    }

    fn describe(&self) -> String {
        if self.a < 1.0 {
            format!("{} @ {:.2}", self.to_hex(), self.a)
        } else {
            self.to_hex()
        }
    }

    fn derive_name(&self, category: TokenCategory) -> String {
        token_name(&format!("{} {}", category.as_str(), self.to_hex()))
    }
}

/// A length in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Points(pub f64);

impl TokenValue for Points {
    fn distance(&self, other: &Self) -> f64 {
        (self.0 - other.0).abs()
    }

    fn describe(&self) -> String {
        format!("{}pt", self.0)
    }

    fn derive_name(&self, category: TokenCategory) -> String {
        token_name(&format!("{} {}", category.as_str(), self.0))
    }
}

/// Parse `#RRGGBB` (or `#RGB`) into an opaque color.
pub fn parse_hex(raw: &str) -> Option<Rgba> {
    let rgb: Srgb<u8> = raw.trim().parse().ok()?;
    Some(Rgba::opaque(rgb.red, rgb.green, rgb.blue))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Matched { distance: f64 },
    Registered,
    Defaulted,
}

/// The token a value resolved to, with the member name used to reference it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub name: String,
    pub member: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    member: String,
}

/// Canonical tokens of one category, in registration order.
#[derive(Debug)]
pub struct TokenRegistry<V> {
    category: TokenCategory,
    tolerance: f64,
    default_name: String,
    default_member: String,
    entries: IndexMap<String, Entry<V>>,
    names: NameAllocator,
    members: NameAllocator,
    diagnostics: Vec<Diagnostic>,
}

impl<V: TokenValue> TokenRegistry<V> {
    pub fn new(category: TokenCategory, tolerance: f64, default_name: &str) -> Self {
        let default_member = member_name(default_name);
        let mut members = NameAllocator::for_identifiers();
        members.allocate(&default_member);
        Self {
            category,
            tolerance,
            default_name: default_name.to_string(),
            default_member,
            entries: IndexMap::new(),
            names: NameAllocator::for_tokens(),
            members,
            diagnostics: Vec::new(),
        }
    }

    pub fn category(&self) -> TokenCategory {
        self.category
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a canonical token; a taken name is suffixed (`name-2`).
    pub fn register(&mut self, name: &str, value: V) -> Resolution {
        let name = self.names.allocate(name);
        let member = if name == self.default_name {
            self.default_member.clone()
        } else {
            self.members.allocate(&member_name(&name))
        };
        self.entries.insert(
            name.clone(),
            Entry {
                value,
                member: member.clone(),
            },
        );
        Resolution {
            name,
            member,
            outcome: Outcome::Registered,
        }
    }

    /// Nearest token within tolerance; the earliest registered wins ties.
    pub fn nearest(&self, value: &V) -> Option<(&str, &str, f64)> {
        let mut best: Option<(&str, &str, f64)> = None;
        for (name, entry) in &self.entries {
            let distance = value.distance(&entry.value);
            if distance > self.tolerance {
                continue;
            }
            if best.map_or(true, |(_, _, d)| distance < d) {
                best = Some((name.as_str(), entry.member.as_str(), distance));
            }
        }
        best
    }

    pub fn resolve(&mut self, value: V, mode: ResolveMode) -> Resolution {
        if let Some((name, member, distance)) = self.nearest(&value) {
            debug!(category = self.category.as_str(), token = name, distance, "matched token");
            return Resolution {
                name: name.to_string(),
                member: member.to_string(),
                outcome: Outcome::Matched { distance },
            };
        }

        match mode {
            ResolveMode::Register => {
                let derived = value.derive_name(self.category);
                let resolution = self.register(&derived, value);
                debug!(
                    category = self.category.as_str(),
                    token = %resolution.name,
                    value = %value.describe(),
                    "registered token"
                );
                resolution
            }
            ResolveMode::Fallback => {
                let value = value.describe();
                warn!(
                    category = self.category.as_str(),
                    %value,
                    fallback = %self.default_name,
                    "no token within tolerance; using default"
                );
                self.diagnostics.push(Diagnostic::NoTokenMatch {
                    category: self.category,
                    value,
                    fallback: self.default_name.clone(),
                });
                Resolution {
                    name: self.default_name.clone(),
                    member: self.default_member.clone(),
                    outcome: Outcome::Defaulted,
                }
            }
        }
    }

    /// `(name, member, value)` in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &V)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.member.as_str(), &entry.value))
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn default_member(&self) -> &str {
        &self.default_member
    }

    /// Whether the default token is backed by a registered entry.
    pub fn has_default(&self) -> bool {
        self.entries.contains_key(&self.default_name)
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        let mut out = std::mem::take(&mut self.diagnostics);
        out.extend(self.names.take_renames());
        out.extend(self.members.take_renames());
        out
    }
}

/// Registries for every resolvable category, seeded from a snapshot.
#[derive(Debug)]
pub struct Registries {
    pub colors: TokenRegistry<Rgba>,
    pub spacing: TokenRegistry<Points>,
    pub radii: TokenRegistry<Points>,
    pub font_sizes: TokenRegistry<Points>,
}

impl Registries {
    /// Seed from a snapshot. Snapshot maps are keyed by name, so among
    /// seeded tokens a distance tie goes to the alphabetically first name.
    pub fn from_snapshot(snapshot: &TokenSnapshot, tolerances: &Tolerances) -> Self {
        let mut colors = TokenRegistry::new(TokenCategory::Color, tolerances.color, DEFAULT_COLOR);
        for (name, token) in &snapshot.colors {
            colors.register(name, token.rgba());
        }

        let mut spacing =
            TokenRegistry::new(TokenCategory::Spacing, tolerances.spacing, DEFAULT_SPACING);
        for (key, points) in &snapshot.spacing {
            spacing.register(key, Points(*points));
        }

        let mut radii = TokenRegistry::new(TokenCategory::Radius, tolerances.radius, DEFAULT_RADIUS);
        for (name, points) in &snapshot.radii {
            radii.register(name, Points(*points));
        }

        let mut font_sizes =
            TokenRegistry::new(TokenCategory::Typography, tolerances.font_size, DEFAULT_FONT);
        for (name, token) in &snapshot.typography {
            font_sizes.register(name, Points(token.font_size));
        }

        Self {
            colors,
            spacing,
            radii,
            font_sizes,
        }
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        let mut out = self.colors.take_diagnostics();
        out.extend(self.spacing.take_diagnostics());
        out.extend(self.radii.take_diagnostics());
        out.extend(self.font_sizes.take_diagnostics());
        out
    }
}
