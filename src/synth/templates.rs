//! Component templates and placeholder substitution.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{DsyncError, Result};
use crate::types::Archetype;

/// Every placeholder a component template must contain.
pub const PLACEHOLDERS: [&str; 7] = [
    "NAME",
    "BODY",
    "BACKGROUND_COLOR",
    "TEXT_COLOR",
    "BORDER_RADIUS",
    "PADDING",
    "STATES",
];

pub const TEMPLATE_EXTENSION: &str = "swift.tmpl";

/// A component template known to contain every placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn parse(label: &str, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let missing: Vec<&str> = PLACEHOLDERS
            .iter()
            .copied()
            .filter(|key| !source.contains(&format!("{{{{{key}}}}}")))
            .collect();
        if !missing.is_empty() {
            let list: Vec<String> = missing.iter().map(|k| format!("{{{{{k}}}}}")).collect();
            return Err(DsyncError::template(format!(
                "{label} template is missing {}",
                list.join(", ")
            )));
        }
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute placeholders in a single pass; substituted text is never
    /// rescanned. Multi-line values are indented to the placeholder's line.
    pub fn render(&self, values: &Values) -> String {
        substitute(&self.source, |key| values.get(key))
    }
}

/// Values for one rendering of a component template.
#[derive(Debug, Clone, Default)]
pub struct Values {
    pub name: String,
    pub body: String,
    pub background_color: String,
    pub text_color: String,
    pub border_radius: String,
    pub padding: String,
    pub states: String,
}

impl Values {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "NAME" => &self.name,
            "BODY" => &self.body,
            "BACKGROUND_COLOR" => &self.background_color,
            "TEXT_COLOR" => &self.text_color,
            "BORDER_RADIUS" => &self.border_radius,
            "PADDING" => &self.padding,
            "STATES" => &self.states,
            _ => return None,
        };
        Some(value.as_str())
    }
}

pub(crate) fn substitute<'v>(source: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let replacement = after
            .find("}}")
            .and_then(|end| lookup(&after[..end]).map(|value| (value, end)));
        match replacement {
            Some((value, end)) => {
                let indent = current_indent(&out).to_string();
                out.push_str(&value.replace('\n', &format!("\n{indent}")));
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);

    let mut tidy: String = out
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    tidy.push('\n');
    tidy
}

fn current_indent(out: &str) -> &str {
    let line_start = out.rfind('\n').map_or(0, |i| i + 1);
    let line = &out[line_start..];
    let width = line.len() - line.trim_start().len();
    &line[..width]
}

/// Every `{{IDENT}}` marker left in rendered output.
pub fn find_unresolved(rendered: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = rendered;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        if let Some(end) = after.find("}}") {
            let inner = &after[..end];
            if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                found.push(format!("{{{{{inner}}}}}"));
                rest = &after[end + 2..];
                continue;
            }
        }
        rest = after;
    }
    found
}

/// Component templates keyed by archetype.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: HashMap<Archetype, Template>,
}

impl TemplateSet {
    pub fn builtin() -> Result<Self> {
        let mut templates = HashMap::new();
        for archetype in Archetype::ALL {
            templates.insert(
                archetype,
                Template::parse(archetype.template_stem(), builtin_source(archetype))?,
            );
        }
        Ok(Self { templates })
    }

    /// Built-in templates with any `<stem>.swift.tmpl` files in `dir` layered on top.
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut set = Self::builtin()?;
        if !dir.is_dir() {
            return Err(DsyncError::Config(format!(
                "templates_dir {} is not a directory",
                dir.display()
            )));
        }
        for archetype in Archetype::ALL {
            let path = dir.join(format!("{}.{TEMPLATE_EXTENSION}", archetype.template_stem()));
            if !path.is_file() {
                continue;
            }
            let source = fs::read_to_string(&path)?;
            let template = Template::parse(&path.display().to_string(), source)?;
            info!(path = %path.display(), ?archetype, "loaded template override");
            set.templates.insert(archetype, template);
        }
        Ok(set)
    }

    pub fn get(&self, archetype: Archetype) -> Option<&Template> {
        self.templates.get(&archetype)
    }
}

fn builtin_source(archetype: Archetype) -> &'static str {
    match archetype {
        Archetype::Button => BUTTON,
        Archetype::Card => CARD,
        Archetype::TextField => TEXT_FIELD,
        Archetype::Modal => MODAL,
        Archetype::Navigation => NAVIGATION,
        Archetype::Generic => GENERIC,
    }
}

const BUTTON: &str = r#"import SwiftUI

// MARK: - {{NAME}}
// Generated from Figma design

public struct {{NAME}}: View {
    {{STATES}}

    let action: () -> Void

    public init(action: @escaping () -> Void = {}) {
        self.action = action
    }

    public var body: some View {
        Button(action: action) {
            {{BODY}}
        }
        .padding({{PADDING}})
        .background({{BACKGROUND_COLOR}})
        .foregroundColor({{TEXT_COLOR}})
        .cornerRadius({{BORDER_RADIUS}})
        .scaleEffect(isPressed ? 0.97 : 1.0)
    }
}
"#;

const CARD: &str = r#"import SwiftUI

// MARK: - {{NAME}}
// Generated from Figma design

public struct {{NAME}}: View {
    {{STATES}}

    public init() {}

    public var body: some View {
        {{BODY}}
            .padding({{PADDING}})
            .foregroundColor({{TEXT_COLOR}})
            .background({{BACKGROUND_COLOR}})
            .cornerRadius({{BORDER_RADIUS}})
    }
}
"#;

const TEXT_FIELD: &str = r#"import SwiftUI

// MARK: - {{NAME}}
// Generated from Figma design

public struct {{NAME}}: View {
    {{STATES}}

    public init() {}

    public var body: some View {
        VStack(alignment: .leading) {
            {{BODY}}
            TextField("", text: $text)
        }
        .padding({{PADDING}})
        .foregroundColor({{TEXT_COLOR}})
        .background({{BACKGROUND_COLOR}})
        .cornerRadius({{BORDER_RADIUS}})
    }
}
"#;

const MODAL: &str = r#"import SwiftUI

// MARK: - {{NAME}}
// Generated from Figma design

public struct {{NAME}}: View {
    {{STATES}}

    public init() {}

    public var body: some View {
        if isPresented {
            {{BODY}}
                .padding({{PADDING}})
                .foregroundColor({{TEXT_COLOR}})
                .background({{BACKGROUND_COLOR}})
                .cornerRadius({{BORDER_RADIUS}})
        }
    }
}
"#;

const NAVIGATION: &str = r#"import SwiftUI

// MARK: - {{NAME}}
// Generated from Figma design

public struct {{NAME}}: View {
    {{STATES}}

    public init() {}

    public var body: some View {
        NavigationStack {
            {{BODY}}
                .padding({{PADDING}})
        }
        .foregroundColor({{TEXT_COLOR}})
        .background({{BACKGROUND_COLOR}})
        .cornerRadius({{BORDER_RADIUS}})
    }
}
"#;

const GENERIC: &str = r#"import SwiftUI

// MARK: - {{NAME}}
// Generated from Figma design

public struct {{NAME}}: View {
    {{STATES}}

    public init() {}

    public var body: some View {
        {{BODY}}
            .padding({{PADDING}})
            .foregroundColor({{TEXT_COLOR}})
            .background({{BACKGROUND_COLOR}})
            .cornerRadius({{BORDER_RADIUS}})
    }
}
"#;

/// Preview provider for a generated component; `{{NAME}}` only.
pub const PREVIEW: &str = r#"import SwiftUI

struct {{NAME}}View_Previews: PreviewProvider {
    static var previews: some View {
        Group {
            {{NAME}}()
                .previewDisplayName("Light Mode")

            {{NAME}}()
                .preferredColorScheme(.dark)
                .previewDisplayName("Dark Mode")
        }
    }
}
"#;

/// XCTest stub for a generated component; `{{NAME}}` only.
pub const TEST: &str = r#"import XCTest
import SwiftUI
@testable import DesignSystem

final class {{NAME}}Tests: XCTestCase {
    func testComponentInitialization() {
        let component = {{NAME}}()
        XCTAssertNotNil(component)
    }

    func testComponentRendering() {
        let component = {{NAME}}()
        XCTAssertNotNil(component.body)
    }
}
"#;
