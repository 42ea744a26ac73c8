//! Name Resolution
//!
//! Names of generated abstractions and members, computed from schema names
//! and the configured decorations. Nothing here decides *whether* something
//! is generated; it only answers what it is called.
//!
//! Field-level names join node and field: `Person` + `pet` -> `PersonPet`,
//! then decorate (`PersonPetSelection`, `PersonPetQuery`).

use super::config::Decorations;
use crate::graph::{NodeKind, TypeNode};

// =============================================================================
// Namer
// =============================================================================

/// Decorated names for one layout
#[derive(Debug, Clone, Copy)]
pub struct Namer<'l> {
    decorations: &'l Decorations,
}

impl<'l> Namer<'l> {
    pub fn new(decorations: &'l Decorations) -> Self {
        Self { decorations }
    }

    pub fn entity(&self, node: &str) -> String {
        self.decorations.entity.apply(node)
    }

    pub fn projection(&self, node: &str) -> String {
        self.decorations.projection.apply(node)
    }

    pub fn qualification(&self, node: &str) -> String {
        self.decorations.qualification.apply(node)
    }

    pub fn qualified_projection(&self, node: &str) -> String {
        self.decorations.qualified_projection.apply(node)
    }

    /// What a nested selection of `node` is configured through: the
    /// qualified projection for interfaces and unions, the plain projection
    /// for everything else
    pub fn nested_projection(&self, node: &TypeNode) -> String {
        match node.kind() {
            NodeKind::Interface | NodeKind::Union => self.qualified_projection(node.name()),
            _ => self.projection(node.name()),
        }
    }

    pub fn selection(&self, node: &str, field: &str) -> String {
        self.decorations.selection.apply(&field_level(node, field))
    }

    pub fn query(&self, node: &str, field: &str) -> String {
        self.decorations.query.apply(&field_level(node, field))
    }

    /// Member narrowing a polymorphic selection to one subtype (`onDog`)
    pub fn on_subtype(&self, subtype: &str) -> String {
        self.decorations.on_subtype.apply(subtype)
    }
}

fn field_level(node: &str, field: &str) -> String {
    format!("{}{}", node, capitalize(field))
}

// =============================================================================
// Case Helpers
// =============================================================================

/// Uppercase the first character
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c == '-' || c == ' ' {
            result.push('_');
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    result
}

// =============================================================================
// Keywords
// =============================================================================

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "static", "struct", "trait",
    "true", "type", "unsafe", "use", "where", "while", "async", "await",
    "dyn", "abstract", "become", "box", "do", "final", "macro", "override",
    "priv", "typeof", "unsized", "virtual", "yield", "try",
];

/// Raw-escape a Rust keyword (`type` -> `r#type`).
///
/// `self`, `Self`, `super` and `crate` cannot be raw identifiers and get a
/// trailing underscore instead.
pub fn escape_keyword(name: &str) -> String {
    match name {
        "self" | "Self" | "super" | "crate" => format!("{}_", name),
        _ if RUST_KEYWORDS.contains(&name) => format!("r#{}", name),
        _ => name.to_string(),
    }
}
