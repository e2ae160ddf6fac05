//! Deterministic name derivation for tokens, identifiers and file names.

use std::collections::HashSet;

use tracing::warn;

use crate::diagnostics::Diagnostic;

/// Derive a token name from a node name: lower-cased, runs of
/// non-alphanumerics collapsed to a single hyphen, hyphens trimmed.
pub fn token_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_hyphen = false;
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    if out.is_empty() {
        "unnamed".to_string()
    } else {
        out
    }
}

/// Swift keywords that cannot name a member without backticks.
const SWIFT_KEYWORDS: &[&str] = &[
    "as", "associatedtype", "await", "break", "case", "catch", "class", "continue", "default",
    "defer", "deinit", "do", "else", "enum", "extension", "fallthrough", "false", "fileprivate",
    "for", "func", "guard", "if", "import", "in", "init", "inout", "internal", "is", "let", "nil",
    "open", "operator", "private", "protocol", "public", "repeat", "rethrows", "return", "self",
    "static", "struct", "subscript", "super", "switch", "throw", "throws", "true", "try",
    "typealias", "var", "where", "while",
];

const RESERVED_TYPE_NAMES: &[&str] = &["Any", "Protocol", "Self", "Type"];

/// Derive a type identifier: alphanumeric words capitalized and joined,
/// always beginning with a letter.
pub fn identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    match out.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {
            if RESERVED_TYPE_NAMES.contains(&out.as_str()) {
                format!("{out}Component")
            } else {
                out
            }
        }
        _ => format!("Component{out}"),
    }
}

/// Lower camel case member name for a token (`assassin-red` -> `assassinRed`).
pub fn member_name(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut upper_next = false;
    for ch in token.chars() {
        if !ch.is_ascii_alphanumeric() {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.push(ch.to_ascii_uppercase());
        } else if out.is_empty() {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
        upper_next = false;
    }
    match out.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {
            if SWIFT_KEYWORDS.contains(&out.as_str()) {
                format!("{out}Token")
            } else {
                out
            }
        }
        _ => format!("token{}", capitalize(&out)),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Hands out unique names, suffixing later duplicates with a counter.
#[derive(Debug, Default)]
pub struct NameAllocator {
    used: HashSet<String>,
    separator: &'static str,
    renames: Vec<Diagnostic>,
}

impl NameAllocator {
    /// Suffixes are appended directly (`Button2`); for type identifiers.
    pub fn for_identifiers() -> Self {
        Self {
            used: HashSet::new(),
            separator: "",
            renames: Vec::new(),
        }
    }

    /// Suffixes are hyphenated (`primary-2`); for token names.
    pub fn for_tokens() -> Self {
        Self {
            used: HashSet::new(),
            separator: "-",
            renames: Vec::new(),
        }
    }

    /// Collisions recorded so far, drained.
    pub fn take_renames(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.renames)
    }

    /// Reserve `base`, or the first free `base{sep}{n}` for n >= 2.
    pub fn allocate(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}{}{n}", self.separator);
            if self.used.insert(candidate.clone()) {
                warn!(name = base, renamed = %candidate, "name collision; suffixed later identifier");
                self.renames.push(Diagnostic::NameCollision {
                    original: base.to_string(),
                    renamed: candidate.clone(),
                });
                return candidate;
            }
            n += 1;
        }
    }
}
