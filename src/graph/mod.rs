//! Schema Graph
//!
//! In-memory model of a GraphQL-style type schema: nodes (object, interface,
//! union, enum, input, scalar, query and mutation roots), their fields,
//! arguments and type references.
//!
//! The graph is assembled once through [`SchemaBuilder`] and frozen by
//! `build()`. After that nothing mutates, which is what makes the lazily
//! derived facts below sound:
//! - `implements` / union members (name lookups resolved on first use)
//! - overridden fields (see [`OverrideResolver`])
//! - `is_selection` (see [`SelectionClassifier`])
//! - comment fallback to the overridden field
//!
//! All cross-type references are names resolved against the one graph, so
//! cyclic schemas (A -> B -> A) never create ownership cycles.
//!
//! The caches are `std::cell::OnceCell`, so a `SchemaGraph` is `!Sync`.
//! Derivation for one graph runs on one thread; concurrent first population
//! of the caches is rejected by the compiler rather than left to chance.

pub mod builder;
pub mod classify;
pub mod diagnostics;
pub mod loader;
pub mod overrides;

pub use builder::{ArgumentBuilder, EnumValueBuilder, FieldBuilder, NodeBuilder, SchemaBuilder};
pub use classify::SelectionClassifier;
pub use diagnostics::{
    DiagnosticCode, DiagnosticItem, DiagnosticLevel, Diagnostics, Severity, StrictnessConfig,
};
pub use loader::{load_from_path, load_from_str, DirectiveLayout, LoadConfig, SchemaDocument};
pub use overrides::OverrideResolver;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Identity
// =============================================================================

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one frozen graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u64);

impl GraphId {
    pub(crate) fn next() -> Self {
        GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a field: graph, owning node slot, field slot.
///
/// Slots are positions in the declaration-ordered maps and stay valid
/// because the graph never changes after `build()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub(crate) graph: GraphId,
    pub(crate) node: usize,
    pub(crate) field: usize,
}

// =============================================================================
// Node Kind
// =============================================================================

/// Kind of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Scalar,
    Query,
    Mutation,
    Object,
    Interface,
    Union,
    Enum,
    Input,
}

impl NodeKind {
    /// Selecting a value of this kind needs a nested selection
    pub fn has_projection(&self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::Union)
    }

    /// Interfaces and unions select per concrete subtype
    pub fn is_polymorphic(&self) -> bool {
        matches!(self, Self::Interface | Self::Union)
    }

    /// Object-like kinds that carry entity abstractions
    pub fn has_entity(&self) -> bool {
        matches!(
            self,
            Self::Query | Self::Mutation | Self::Object | Self::Interface | Self::Union
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Object => "object",
            Self::Interface => "interface",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::Input => "input",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Type Reference
// =============================================================================

/// Reference to a node from a field or argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Name of the referenced node
    pub node: String,
    /// Value is a list of the referenced node
    pub list: bool,
    /// Value may be null
    pub nullable: bool,
}

impl TypeRef {
    /// Nullable, non-list reference
    pub fn named(node: impl Into<String>) -> Self {
        Self { node: node.into(), list: false, nullable: true }
    }

    pub fn non_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    /// Parse the usual notation: `Name`, `Name!`, `[Name]`, `[Name!]!`.
    ///
    /// Item nullability inside a list is accepted but not tracked.
    pub fn parse(notation: &str) -> Option<Self> {
        let text = notation.trim();
        let (text, nullable) = match text.strip_suffix('!') {
            Some(rest) => (rest.trim_end(), false),
            None => (text, true),
        };

        let (inner, list) = match text.strip_prefix('[') {
            Some(rest) => (rest.strip_suffix(']')?.trim(), true),
            None => (text, false),
        };
        let inner = inner.strip_suffix('!').unwrap_or(inner).trim();

        let valid = !inner.is_empty()
            && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !inner.starts_with(|c: char| c.is_ascii_digit());
        if !valid {
            return None;
        }

        Some(Self { node: inner.to_string(), list, nullable })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "[{}]", self.node)?;
        } else {
            f.write_str(&self.node)?;
        }
        if !self.nullable {
            f.write_str("!")?;
        }
        Ok(())
    }
}

// =============================================================================
// Enum Value
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub(crate) name: String,
    pub(crate) comments: Vec<String>,
}

impl EnumValue {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

// =============================================================================
// Argument
// =============================================================================

/// An argument of a field
#[derive(Debug)]
pub struct ArgumentDef {
    pub(crate) field: FieldId,
    pub(crate) name: String,
    pub(crate) type_ref: TypeRef,
    pub(crate) has_default: bool,
    pub(crate) comments: Vec<String>,
    /// Field whose same-named argument supplies the effective comments
    pub(crate) comment_source: OnceCell<FieldId>,
}

impl ArgumentDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    /// Comments declared on this argument only (no fallback)
    pub fn own_comments(&self) -> &[String] {
        &self.comments
    }

    /// Can be omitted by the caller: nullable or defaulted
    pub fn is_initialized(&self) -> bool {
        self.type_ref.nullable || self.has_default
    }
}

impl PartialEq for ArgumentDef {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.name == other.name
    }
}

impl Eq for ArgumentDef {}

impl Hash for ArgumentDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for ArgumentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_ref)
    }
}

// =============================================================================
// Field
// =============================================================================

/// Directive flags recorded on a field besides `required` and `default`.
///
/// Model data only: derivation does not read these flags. `is_required` and
/// `has_default` already fold in `primaryKey` and `default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDirectives {
    pub primary_key: bool,
    pub selection: bool,
    pub resolve: bool,
}

/// A field of a node
#[derive(Debug)]
pub struct FieldDef {
    pub(crate) id: FieldId,
    pub(crate) owner: String,
    pub(crate) name: String,
    pub(crate) type_ref: TypeRef,
    pub(crate) required: bool,
    pub(crate) has_default: bool,
    pub(crate) directives: FieldDirectives,
    pub(crate) arguments: IndexMap<String, ArgumentDef>,
    pub(crate) comments: Vec<String>,

    // Derived, populated on first use
    pub(crate) overridden: OnceCell<Option<FieldId>>,
    pub(crate) comment_source: OnceCell<FieldId>,
    pub(crate) selection: OnceCell<bool>,
}

impl FieldDef {
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Name of the owning node
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Always fetched; needs no selector
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    pub fn directives(&self) -> FieldDirectives {
        self.directives
    }

    pub fn arguments(&self) -> impl Iterator<Item = &ArgumentDef> {
        self.arguments.values()
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentDef> {
        self.arguments.get(name)
    }

    /// Comments declared on this field only (no fallback)
    pub fn own_comments(&self) -> &[String] {
        &self.comments
    }
}

impl PartialEq for FieldDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FieldDef {}

impl Hash for FieldDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.owner, self.name, self.type_ref)
    }
}

// =============================================================================
// Type Node
// =============================================================================

/// One declared type
#[derive(Debug)]
pub struct TypeNode {
    pub(crate) graph: GraphId,
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) declared_interfaces: Vec<String>,
    pub(crate) member_names: Vec<String>,
    pub(crate) comments: Vec<String>,
    pub(crate) enum_values: IndexMap<String, EnumValue>,
    pub(crate) fields: IndexMap<String, FieldDef>,

    // Derived, populated on first use (node slots)
    pub(crate) implements: OnceCell<Vec<usize>>,
    pub(crate) members: OnceCell<Vec<usize>>,
}

impl TypeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Interface names as written, including unresolved ones
    pub fn declared_interfaces(&self) -> &[String] {
        &self.declared_interfaces
    }

    /// Union member names as written, including unresolved ones
    pub fn member_names(&self) -> &[String] {
        &self.member_names
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn enum_values(&self) -> impl Iterator<Item = &EnumValue> {
        self.enum_values.values()
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }
}

impl PartialEq for TypeNode {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph && self.name == other.name
    }
}

impl Eq for TypeNode {}

impl Hash for TypeNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.graph.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

// =============================================================================
// Schema Graph
// =============================================================================

/// The frozen schema
#[derive(Debug)]
pub struct SchemaGraph {
    pub(crate) id: GraphId,
    /// Nodes in declaration order, indexed by name
    pub(crate) nodes: IndexMap<String, TypeNode>,
    pub(crate) query: Option<String>,
    pub(crate) mutation: Option<String>,
    pub(crate) subscription: Option<String>,
    /// Non-fatal diagnostics surfaced while freezing
    pub(crate) diagnostics: Diagnostics,
}

impl SchemaGraph {
    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Warnings kept from construction
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Get a node by name
    pub fn node(&self, name: &str) -> Option<&TypeNode> {
        self.nodes.get(name)
    }

    pub(crate) fn node_at(&self, index: usize) -> &TypeNode {
        &self.nodes[index]
    }

    /// All nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes.values()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &TypeNode> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// Look up a field by identity
    pub fn field(&self, id: FieldId) -> Option<&FieldDef> {
        if id.graph != self.id {
            return None;
        }
        self.nodes
            .get_index(id.node)
            .and_then(|(_, node)| node.fields.get_index(id.field))
            .map(|(_, field)| field)
    }

    pub(crate) fn field_at(&self, id: FieldId) -> &FieldDef {
        &self.nodes[id.node].fields[id.field]
    }

    /// Node owning a field
    pub fn owner_of(&self, field: &FieldDef) -> &TypeNode {
        self.node_at(field.id.node)
    }

    /// Node a type reference points at
    pub fn referenced(&self, type_ref: &TypeRef) -> Option<&TypeNode> {
        self.nodes.get(&type_ref.node)
    }

    pub fn query(&self) -> Option<&TypeNode> {
        self.query.as_deref().and_then(|name| self.node(name))
    }

    pub fn mutation(&self) -> Option<&TypeNode> {
        self.mutation.as_deref().and_then(|name| self.node(name))
    }

    pub fn subscription(&self) -> Option<&TypeNode> {
        self.subscription.as_deref().and_then(|name| self.node(name))
    }

    /// Interfaces a node implements, in declared order.
    ///
    /// Names that do not resolve to an interface node are dropped
    /// (construction already reported them).
    pub fn implements<'g>(&'g self, node: &'g TypeNode) -> Vec<&'g TypeNode> {
        let slots = node.implements.get_or_init(|| {
            resolve_slots(self, &node.declared_interfaces, node.index, NodeKind::Interface)
        });
        slots.iter().map(|&slot| self.node_at(slot)).collect()
    }

    /// Resolved object members of a union, in member order
    pub fn union_members<'g>(&'g self, node: &'g TypeNode) -> Vec<&'g TypeNode> {
        let slots = node.members.get_or_init(|| {
            resolve_slots(self, &node.member_names, node.index, NodeKind::Object)
        });
        slots.iter().map(|&slot| self.node_at(slot)).collect()
    }

    /// Concrete object types a polymorphic node can resolve to.
    ///
    /// Interface: every OBJECT node implementing it, in declaration order.
    /// Union: its object members. Anything else: nothing.
    pub fn possible_objects<'g>(&'g self, node: &'g TypeNode) -> Vec<&'g TypeNode> {
        match node.kind {
            NodeKind::Interface => self
                .nodes_of_kind(NodeKind::Object)
                .filter(|object| self.implements(object).iter().any(|i| *i == node))
                .collect(),
            NodeKind::Union => self.union_members(node),
            _ => Vec::new(),
        }
    }

    /// Override resolution over this graph
    pub fn overrides(&self) -> OverrideResolver<'_> {
        OverrideResolver::new(self)
    }

    /// Selection facts over this graph
    pub fn classifier(&self) -> SelectionClassifier<'_> {
        SelectionClassifier::new(self)
    }
}

/// Resolve names to node slots of one kind, skipping self and repeats
fn resolve_slots(graph: &SchemaGraph, names: &[String], own: usize, kind: NodeKind) -> Vec<usize> {
    let mut slots: Vec<usize> = Vec::with_capacity(names.len());
    for name in names {
        let Some(index) = graph.nodes.get_index_of(name.as_str()) else {
            continue;
        };
        if index == own || graph.nodes[index].kind != kind || slots.contains(&index) {
            continue;
        }
        slots.push(index);
    }
    slots
}
