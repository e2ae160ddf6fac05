//! Code synthesis: component descriptors and tokens to SwiftUI source files.

pub mod templates;
pub mod token_files;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::diagnostics::Diagnostic;
use crate::naming::{identifier, NameAllocator};
use crate::resolve::{parse_hex, Points, Registries, ResolveMode};
use crate::types::{
    Archetype, ArtifactKind, ComponentDescriptor, GeneratedArtifact, NodeKind, Orientation, Rgba,
    TokenSnapshot,
};

pub use templates::{find_unresolved, Template, TemplateSet, PLACEHOLDERS};

const INDENT: &str = "    ";

/// Output of one synthesis pass.
#[derive(Debug, Default)]
pub struct Synthesis {
    pub artifacts: Vec<GeneratedArtifact>,
    /// Type names of the components that rendered successfully.
    pub components: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render every descriptor, then the token source files.
///
/// Components that fail to render are reported and skipped; the rest are
/// still produced. Token files come last so tokens registered while
/// resolving component values are included.
pub fn synthesize(
    descriptors: &[ComponentDescriptor],
    snapshot: &TokenSnapshot,
    registries: &mut Registries,
    templates: &TemplateSet,
    mode: ResolveMode,
) -> Synthesis {
    let mut synthesis = Synthesis::default();
    let mut names = NameAllocator::for_identifiers();
    names.allocate("DesignTokens");

    for descriptor in descriptors {
        let name = names.allocate(&identifier(&descriptor.name));
        let mut renderer = Renderer {
            registries: &mut *registries,
            mode,
        };
        match renderer.component(descriptor, &name, templates) {
            Ok(source) => {
                debug!(component = %name, archetype = ?descriptor.archetype, "rendered component");
                synthesis.artifacts.extend(component_artifacts(&name, source));
                synthesis.components.push(name);
            }
            Err(message) => {
                warn!(component = %name, %message, "component synthesis failed");
                synthesis.diagnostics.push(Diagnostic::Synthesis {
                    component: name,
                    message,
                });
            }
        }
    }

    synthesis
        .artifacts
        .extend(token_files::render(snapshot, registries));
    synthesis.diagnostics.extend(names.take_renames());
    synthesis.diagnostics.extend(registries.take_diagnostics());

    info!(
        components = synthesis.components.len(),
        artifacts = synthesis.artifacts.len(),
        "synthesized artifacts"
    );
    synthesis
}

fn component_artifacts(name: &str, source: String) -> [GeneratedArtifact; 3] {
    let lookup = |key: &str| (key == "NAME").then_some(name);
    [
        GeneratedArtifact {
            relative_path: PathBuf::from(format!("{name}.swift")),
            content: source,
            kind: ArtifactKind::ComponentSource,
        },
        GeneratedArtifact {
            relative_path: PathBuf::from("previews").join(format!("{name}View.swift")),
            content: templates::substitute(templates::PREVIEW, lookup),
            kind: ArtifactKind::Preview,
        },
        GeneratedArtifact {
            relative_path: PathBuf::from("tests").join(format!("{name}Tests.swift")),
            content: templates::substitute(templates::TEST, lookup),
            kind: ArtifactKind::Test,
        },
    ]
}

/// Local state declared by each archetype's template.
pub fn states(archetype: Archetype) -> &'static str {
    match archetype {
        Archetype::Button => "@State private var isPressed = false",
        Archetype::TextField => "@State private var text = \"\"",
        Archetype::Modal => "@State private var isPresented = true",
        Archetype::Card | Archetype::Navigation | Archetype::Generic => "",
    }
}

/// Escape text for a Swift string literal. Braces are written as unicode
/// escapes so user text can never form a placeholder marker.
pub fn swift_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '{' => out.push_str("\\u{7B}"),
            '}' => out.push_str("\\u{7D}"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

struct Renderer<'r> {
    registries: &'r mut Registries,
    mode: ResolveMode,
}

impl Renderer<'_> {
    fn component(
        &mut self,
        descriptor: &ComponentDescriptor,
        name: &str,
        templates: &TemplateSet,
    ) -> Result<String, String> {
        let template = templates
            .get(descriptor.archetype)
            .ok_or_else(|| format!("no template for {:?}", descriptor.archetype))?;

        let values = templates::Values {
            name: name.to_string(),
            body: self.body(descriptor),
            background_color: self
                .background(descriptor)
                .unwrap_or_else(|| "Color.clear".to_string()),
            text_color: match descriptor.property("text_color").and_then(parse_hex) {
                Some(color) => self.color_ref(color),
                None => format!(
                    "DesignTokens.Colors.{}",
                    self.registries.colors.default_member()
                ),
            },
            border_radius: descriptor
                .numeric_property("radius")
                .map_or_else(|| "0".to_string(), |r| self.radius_ref(r)),
            padding: descriptor
                .numeric_property("padding")
                .map_or_else(|| "0".to_string(), |p| self.spacing_ref(p)),
            states: states(descriptor.archetype).to_string(),
        };

        let rendered = template.render(&values);
        let unresolved = find_unresolved(&rendered);
        if unresolved.is_empty() {
            Ok(rendered)
        } else {
            Err(format!("unresolved placeholders {}", unresolved.join(", ")))
        }
    }

    /// Top-level body: nothing, the only child, or all children stacked
    /// in the archetype's container.
    fn body(&mut self, descriptor: &ComponentDescriptor) -> String {
        match descriptor.children.as_slice() {
            [] => "EmptyView()".to_string(),
            [only] => self.fragment(only),
            children => {
                let header = self.container_header(
                    descriptor.archetype,
                    descriptor.orientation,
                    descriptor.numeric_property("item_spacing"),
                );
                let fragments: Vec<String> = children.iter().map(|c| self.fragment(c)).collect();
                stack(&header, &fragments)
            }
        }
    }

    fn fragment(&mut self, node: &ComponentDescriptor) -> String {
        match node.kind {
            NodeKind::Text => self.text(node),
            NodeKind::Rectangle => self.rectangle(node),
            NodeKind::Frame | NodeKind::Component | NodeKind::Group => self.container(node),
            NodeKind::Other => "EmptyView()".to_string(),
        }
    }

    fn text(&mut self, node: &ComponentDescriptor) -> String {
        let content = node.property("text").unwrap_or(&node.name);
        let mut lines = vec![format!("Text({})", swift_string(content))];
        if let Some(size) = node.numeric_property("font_size") {
            lines.push(format!(".font({})", self.font_ref(size)));
        }
        if let Some(color) = node.property("text_color").and_then(parse_hex) {
            lines.push(format!(".foregroundColor({})", self.color_ref(color)));
        }
        modifiers(lines)
    }

    fn rectangle(&mut self, node: &ComponentDescriptor) -> String {
        let shape = match node.numeric_property("radius") {
            Some(radius) => format!("RoundedRectangle(cornerRadius: {})", self.radius_ref(radius)),
            None => "Rectangle()".to_string(),
        };
        let mut lines = vec![shape];
        if let Some(fill) = self.background(node) {
            lines.push(format!(".fill({fill})"));
        }
        if let (Some(w), Some(h)) = (node.property("width"), node.property("height")) {
            lines.push(format!(".frame(width: {w}, height: {h})"));
        }
        modifiers(lines)
    }

    fn container(&mut self, node: &ComponentDescriptor) -> String {
        if node.children.is_empty() {
            return "EmptyView()".to_string();
        }
        let header = self.container_header(
            Archetype::Generic,
            node.orientation,
            node.numeric_property("item_spacing"),
        );
        let fragments: Vec<String> = node.children.iter().map(|c| self.fragment(c)).collect();
        let mut lines = vec![stack(&header, &fragments)];
        if let Some(padding) = node.numeric_property("padding") {
            lines.push(format!(".padding({})", self.spacing_ref(padding)));
        }
        if let Some(background) = self.background(node) {
            lines.push(format!(".background({background})"));
        }
        if let Some(radius) = node.numeric_property("radius") {
            lines.push(format!(".cornerRadius({})", self.radius_ref(radius)));
        }
        modifiers(lines)
    }

    fn container_header(
        &mut self,
        archetype: Archetype,
        orientation: Orientation,
        item_spacing: Option<f64>,
    ) -> String {
        let mut args = Vec::new();
        let stack = match orientation {
            Orientation::Vertical => {
                if archetype == Archetype::TextField {
                    args.push("alignment: .leading".to_string());
                }
                "VStack"
            }
            Orientation::Horizontal => "HStack",
        };
        if let Some(spacing) = item_spacing {
            args.push(format!("spacing: {}", self.spacing_ref(spacing)));
        }
        if args.is_empty() {
            stack.to_string()
        } else {
            format!("{stack}({})", args.join(", "))
        }
    }

    fn background(&mut self, node: &ComponentDescriptor) -> Option<String> {
        let mut color = node.property("background").and_then(parse_hex)?;
        if let Some(alpha) = node.numeric_property("background_opacity") {
            color.a = alpha;
        }
        Some(self.color_ref(color))
    }

    fn color_ref(&mut self, color: Rgba) -> String {
        let resolution = self.registries.colors.resolve(color, self.mode);
        format!("DesignTokens.Colors.{}", resolution.member)
    }

    fn spacing_ref(&mut self, points: f64) -> String {
        let resolution = self.registries.spacing.resolve(Points(points), self.mode);
        format!("DesignTokens.Spacing.{}", resolution.member)
    }

    fn radius_ref(&mut self, points: f64) -> String {
        let resolution = self.registries.radii.resolve(Points(points), self.mode);
        format!("DesignTokens.BorderRadius.{}", resolution.member)
    }

    fn font_ref(&mut self, size: f64) -> String {
        let resolution = self.registries.font_sizes.resolve(Points(size), self.mode);
        format!("DesignTokens.Typography.{}", resolution.member)
    }
}

/// Join a view with its modifiers, one indented modifier per line.
fn modifiers(lines: Vec<String>) -> String {
    let mut iter = lines.into_iter();
    let mut out = iter.next().unwrap_or_default();
    for modifier in iter {
        out.push('\n');
        out.push_str(INDENT);
        out.push_str(&modifier.replace('\n', &format!("\n{INDENT}")));
    }
    out
}

fn stack(header: &str, fragments: &[String]) -> String {
    let mut out = format!("{header} {{");
    for fragment in fragments {
        out.push('\n');
        out.push_str(INDENT);
        out.push_str(&fragment.replace('\n', &format!("\n{INDENT}")));
    }
    out.push_str("\n}");
    out
}
