//! Swift sources declaring the canonical tokens under `DesignTokens`.

use std::fmt::Write as _;
use std::path::PathBuf;

use super::swift_string;
use crate::classify::format_points;
use crate::naming::{member_name, NameAllocator};
use crate::resolve::{Points, Registries, TokenRegistry};
use crate::types::{ArtifactKind, GeneratedArtifact, Rgba, TokenSnapshot};

pub const TOKENS_DIR: &str = "tokens";

const DEFAULT_SPACING_POINTS: f64 = 16.0;
const DEFAULT_RADIUS_POINTS: f64 = 12.0;

/// Render `tokens/*.swift` from the registries (so tokens registered during
/// synthesis are included) and the snapshot's typography and shadows.
pub fn render(snapshot: &TokenSnapshot, registries: &Registries) -> Vec<GeneratedArtifact> {
    vec![
        artifact("DesignTokens.swift", "import SwiftUI\n\npublic enum DesignTokens {}\n".to_string()),
        artifact("Colors.swift", colors(&registries.colors)),
        artifact("Typography.swift", typography(snapshot, &registries.font_sizes)),
        artifact(
            "Spacing.swift",
            lengths("Spacing", &registries.spacing, DEFAULT_SPACING_POINTS),
        ),
        artifact(
            "BorderRadius.swift",
            lengths("BorderRadius", &registries.radii, DEFAULT_RADIUS_POINTS),
        ),
        artifact("Shadows.swift", shadows(snapshot)),
    ]
}

fn artifact(file: &str, content: String) -> GeneratedArtifact {
    GeneratedArtifact {
        relative_path: PathBuf::from(TOKENS_DIR).join(file),
        content,
        kind: ArtifactKind::TokenSource,
    }
}

fn open(out: &mut String, group: &str) {
    out.push_str("import SwiftUI\n\nextension DesignTokens {\n");
    writeln!(out, "    public enum {group} {{").ok();
}

fn close(out: &mut String) {
    out.push_str("    }\n}\n");
}

fn swift_color(color: &Rgba) -> String {
    format!(
        "Color(.sRGB, red: {:.3}, green: {:.3}, blue: {:.3}, opacity: {:.3})",
        color.r as f64 / 255.0,
        color.g as f64 / 255.0,
        color.b as f64 / 255.0,
        color.a
    )
}

fn colors(registry: &TokenRegistry<Rgba>) -> String {
    let mut out = String::new();
    open(&mut out, "Colors");
    for (name, member, color) in registry.entries() {
        writeln!(out, "        /// {name} {}", color.to_hex()).ok();
        writeln!(out, "        public static let {member} = {}", swift_color(color)).ok();
    }
    if !registry.has_default() {
        writeln!(
            out,
            "        public static let {} = Color.primary",
            registry.default_member()
        )
        .ok();
    }
    close(&mut out);
    out
}

fn lengths(group: &str, registry: &TokenRegistry<Points>, default_points: f64) -> String {
    let mut out = String::new();
    open(&mut out, group);
    for (_, member, points) in registry.entries() {
        writeln!(
            out,
            "        public static let {member}: CGFloat = {}",
            format_points(points.0)
        )
        .ok();
    }
    if !registry.has_default() {
        writeln!(
            out,
            "        public static let {}: CGFloat = {}",
            registry.default_member(),
            format_points(default_points)
        )
        .ok();
    }
    close(&mut out);
    out
}

fn font_weight(weight: u16) -> &'static str {
    match (weight + 50) / 100 {
        0 | 1 => ".ultraLight",
        2 => ".thin",
        3 => ".light",
        4 => ".regular",
        5 => ".medium",
        6 => ".semibold",
        7 => ".bold",
        8 => ".heavy",
        _ => ".black",
    }
}

fn typography(snapshot: &TokenSnapshot, registry: &TokenRegistry<Points>) -> String {
    let mut out = String::new();
    open(&mut out, "Typography");
    for (name, member, size) in registry.entries() {
        let font = match snapshot.typography.get(name) {
            Some(token) if token.font_family != "System" => format!(
                "Font.custom({}, size: {}).weight({})",
                swift_string(&token.font_family),
                format_points(token.font_size),
                font_weight(token.font_weight)
            ),
            Some(token) => format!(
                "Font.system(size: {}, weight: {})",
                format_points(token.font_size),
                font_weight(token.font_weight)
            ),
            None => format!("Font.system(size: {})", format_points(size.0)),
        };
        if let Some(token) = snapshot.typography.get(name) {
            writeln!(
                out,
                "        /// line height {}, letter spacing {}",
                format_points(token.line_height),
                format_points(token.letter_spacing)
            )
            .ok();
        }
        writeln!(out, "        public static let {member} = {font}").ok();
    }
    if !registry.has_default() {
        writeln!(
            out,
            "        public static let {} = Font.system(size: 16)",
            registry.default_member()
        )
        .ok();
    }
    close(&mut out);
    out
}

fn shadows(snapshot: &TokenSnapshot) -> String {
    let mut out = String::from(
        "import SwiftUI\n\npublic struct ShadowStyle {\n    public let color: Color\n    public let radius: CGFloat\n    public let x: CGFloat\n    public let y: CGFloat\n    public let spread: CGFloat\n}\n\n",
    );
    out.push_str("extension DesignTokens {\n    public enum Shadows {\n");
    let mut members = NameAllocator::for_identifiers();
    for (name, shadow) in &snapshot.shadows {
        let member = members.allocate(&member_name(name));
        writeln!(
            out,
            "        public static let {member} = ShadowStyle(color: {}, radius: {}, x: {}, y: {}, spread: {})",
            swift_color(&shadow.color),
            format_points(shadow.radius),
            format_points(shadow.x),
            format_points(shadow.y),
            format_points(shadow.spread)
        )
        .ok();
    }
    close(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Tolerances;
    use crate::sample::builtin_snapshot;

    fn rendered() -> Vec<GeneratedArtifact> {
        let snapshot = builtin_snapshot().expect("sample");
        let registries = Registries::from_snapshot(&snapshot, &Tolerances::default());
        render(&snapshot, &registries)
    }

    fn file<'a>(artifacts: &'a [GeneratedArtifact], name: &str) -> &'a str {
        artifacts
            .iter()
            .find(|a| a.relative_path == PathBuf::from(TOKENS_DIR).join(name))
            .map(|a| a.content.as_str())
            .unwrap_or_else(|| panic!("missing {name}"))
    }

    #[test]
    fn renders_every_token_file() {
        let artifacts = rendered();
        assert_eq!(artifacts.len(), 6);
        assert!(artifacts.iter().all(|a| a.kind == ArtifactKind::TokenSource));
    }

    #[test]
    fn colors_use_camel_case_members_and_default() {
        let artifacts = rendered();
        let colors = file(&artifacts, "Colors.swift");
        assert!(colors.contains(
            "public static let assassinRed = Color(.sRGB, red: 0.863, green: 0.149, blue: 0.149, opacity: 1.000)"
        ));
        assert!(colors.contains("public static let textPrimary = Color.primary"));
    }

    #[test]
    fn lengths_and_typography_render_points() {
        let artifacts = rendered();
        let spacing = file(&artifacts, "Spacing.swift");
        assert!(spacing.contains("public static let md: CGFloat = 16"));
        assert_eq!(spacing.matches("static let md").count(), 1);

        let typography = file(&artifacts, "Typography.swift");
        assert!(typography.contains("public static let missionTitle = Font.system(size: 28, weight: .bold)"));
        assert!(typography.contains("public static let body = Font.system(size: 16)"));
    }

    #[test]
    fn font_weights_round_to_nearest_named_weight() {
        assert_eq!(font_weight(100), ".ultraLight");
        assert_eq!(font_weight(449), ".regular");
        assert_eq!(font_weight(450), ".medium");
        assert_eq!(font_weight(900), ".black");
    }
}
