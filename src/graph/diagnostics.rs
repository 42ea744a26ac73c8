//! Diagnostics
//!
//! Collects schema problems found while freezing a [`SchemaGraph`](super::SchemaGraph).
//! Whether a problem is fatal, a warning, or ignored is decided by
//! [`StrictnessConfig`]; a few problems (unresolved type references) are
//! always fatal because later passes cannot work around them.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Duplicates (last declaration wins) ===
    /// Two type definitions share a name
    DuplicateNode,
    /// Two fields on one node share a name
    DuplicateField,
    /// Two arguments on one field share a name
    DuplicateArgument,
    /// Two enum values share a name
    DuplicateEnumValue,

    // === References ===
    /// `implements` names something that is not a known interface
    UnresolvedInterface,
    /// Union member is not a known object type
    UnresolvedUnionMember,
    /// Field or argument type names no node
    UnresolvedType,
    /// Query/mutation root points at a node of the wrong kind
    RootKindMismatch,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateNode => "S001",
            Self::DuplicateField => "S002",
            Self::DuplicateArgument => "S003",
            Self::DuplicateEnumValue => "S004",
            Self::UnresolvedInterface => "S101",
            Self::UnresolvedUnionMember => "S102",
            Self::UnresolvedType => "S103",
            Self::RootKindMismatch => "S104",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity & Strictness
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// How a class of schema problems is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warn,
    Ignore,
}

/// Strictness knobs for schema validation.
///
/// The defaults keep the permissive behavior (duplicates overwrite, unknown
/// interfaces are dropped) but log every occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrictnessConfig {
    /// Duplicate node, field, argument or enum value names
    #[serde(default = "default_warn")]
    pub duplicate_definition: DiagnosticLevel,

    /// Interface or union member names that resolve to nothing
    #[serde(default = "default_warn")]
    pub unresolved_interface: DiagnosticLevel,
}

fn default_warn() -> DiagnosticLevel {
    DiagnosticLevel::Warn
}

impl Default for StrictnessConfig {
    fn default() -> Self {
        Self {
            duplicate_definition: DiagnosticLevel::Warn,
            unresolved_interface: DiagnosticLevel::Warn,
        }
    }
}

impl StrictnessConfig {
    /// Every configurable problem is fatal
    pub fn strict() -> Self {
        Self {
            duplicate_definition: DiagnosticLevel::Error,
            unresolved_interface: DiagnosticLevel::Error,
        }
    }

    /// Level applied to a diagnostic code
    pub fn level_for(&self, code: DiagnosticCode) -> DiagnosticLevel {
        match code {
            DiagnosticCode::DuplicateNode
            | DiagnosticCode::DuplicateField
            | DiagnosticCode::DuplicateArgument
            | DiagnosticCode::DuplicateEnumValue => self.duplicate_definition,
            DiagnosticCode::UnresolvedInterface
            | DiagnosticCode::UnresolvedUnionMember => self.unresolved_interface,
            DiagnosticCode::UnresolvedType | DiagnosticCode::RootKindMismatch => DiagnosticLevel::Error,
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Node that caused this diagnostic
    pub node: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Resolved severity
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Additional context (field, argument, offending name)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(
        node: impl Into<String>,
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node: node.into(),
            code,
            severity,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {} ({})", self.code, self.severity, self.message, self.node)?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from graph construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem at the level configured for its code.
    ///
    /// Ignored problems are dropped, warnings are logged and kept.
    pub fn report(
        &mut self,
        strictness: &StrictnessConfig,
        node: &str,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) {
        let severity = match strictness.level_for(code) {
            DiagnosticLevel::Ignore => return,
            DiagnosticLevel::Warn => Severity::Warning,
            DiagnosticLevel::Error => Severity::Error,
        };
        let item = DiagnosticItem::new(node, code, severity, message);
        if severity == Severity::Warning {
            tracing::warn!(code = %item.code, node = %item.node, "{}", item.message);
        }
        self.items.push(item);
    }

    /// Add diagnostic for a duplicate definition
    pub fn duplicate(
        &mut self,
        strictness: &StrictnessConfig,
        node: &str,
        code: DiagnosticCode,
        what: &str,
    ) {
        self.report(
            strictness,
            node,
            code,
            format!("'{}' is declared more than once; the last declaration wins", what),
        );
    }

    /// Add diagnostic for an unresolved type reference
    pub fn unresolved_type(&mut self, node: &str, owner: &str, type_name: &str) {
        self.items.push(
            DiagnosticItem::new(
                node,
                DiagnosticCode::UnresolvedType,
                Severity::Error,
                format!("type '{}' is not declared in the schema", type_name),
            )
            .with_context(format!("referenced by {}", owner)),
        );
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
