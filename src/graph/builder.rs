//! Schema Construction
//!
//! Append-only builders that accumulate nodes, fields, arguments and enum
//! values, then freeze into a [`SchemaGraph`]. `SchemaBuilder::build` consumes
//! the builder, so nothing can be added once the graph exists.
//!
//! Duplicate names overwrite the earlier declaration in place (the slot keeps
//! its original position) and are reported according to [`StrictnessConfig`].

use indexmap::IndexMap;
use std::cell::OnceCell;

use super::diagnostics::{DiagnosticCode, Diagnostics, StrictnessConfig};
use super::{
    ArgumentDef, EnumValue, FieldDef, FieldDirectives, FieldId, GraphId, NodeKind, SchemaGraph,
    TypeNode, TypeRef,
};
use crate::error::{GenError, Result};

// =============================================================================
// Schema Builder
// =============================================================================

/// Accumulates a schema before freezing it
pub struct SchemaBuilder {
    id: GraphId,
    nodes: IndexMap<String, TypeNode>,
    query: Option<String>,
    mutation: Option<String>,
    subscription: Option<String>,
    strictness: StrictnessConfig,
    diagnostics: Diagnostics,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new(StrictnessConfig::default())
    }
}

impl SchemaBuilder {
    pub fn new(strictness: StrictnessConfig) -> Self {
        Self {
            id: GraphId::next(),
            nodes: IndexMap::new(),
            query: None,
            mutation: None,
            subscription: None,
            strictness,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Whether a node with this name was already added
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Add a node, filling it through `block`
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
        block: impl FnOnce(&mut NodeBuilder<'_>),
    ) -> &mut Self {
        let name = name.into();
        let index = match self.nodes.get_index_of(&name) {
            Some(index) => {
                self.diagnostics.duplicate(
                    &self.strictness,
                    &name,
                    DiagnosticCode::DuplicateNode,
                    &name,
                );
                index
            }
            None => self.nodes.len(),
        };

        let mut builder = NodeBuilder {
            node: TypeNode {
                graph: self.id,
                index,
                name: name.clone(),
                kind,
                declared_interfaces: Vec::new(),
                member_names: Vec::new(),
                comments: Vec::new(),
                enum_values: IndexMap::new(),
                fields: IndexMap::new(),
                implements: OnceCell::new(),
                members: OnceCell::new(),
            },
            strictness: &self.strictness,
            diagnostics: &mut self.diagnostics,
        };
        block(&mut builder);
        let node = builder.build();

        self.nodes.insert(name, node);
        self
    }

    pub fn set_query(&mut self, name: impl Into<String>) -> &mut Self {
        self.query = Some(name.into());
        self
    }

    pub fn set_mutation(&mut self, name: impl Into<String>) -> &mut Self {
        self.mutation = Some(name.into());
        self
    }

    pub fn set_subscription(&mut self, name: impl Into<String>) -> &mut Self {
        self.subscription = Some(name.into());
        self
    }

    /// Validate references and freeze.
    ///
    /// Fails with [`GenError::Diagnostics`] when any diagnostic resolved to
    /// error level; warnings are kept on the graph.
    pub fn build(mut self) -> Result<SchemaGraph> {
        self.check_references();
        self.query = self.resolve_root(self.query.clone(), NodeKind::Query, "query");
        self.mutation = self.resolve_root(self.mutation.clone(), NodeKind::Mutation, "mutation");
        if let Some(name) = self.subscription.clone() {
            self.check_root(&name, NodeKind::Object, "subscription");
        }

        if self.diagnostics.has_errors() {
            return Err(GenError::Diagnostics(self.diagnostics));
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            warnings = self.diagnostics.warning_count(),
            "schema graph frozen"
        );

        Ok(SchemaGraph {
            id: self.id,
            nodes: self.nodes,
            query: self.query,
            mutation: self.mutation,
            subscription: self.subscription,
            diagnostics: self.diagnostics,
        })
    }

    fn check_references(&mut self) {
        let kind_of = |name: &str| self.nodes.get(name).map(|n| n.kind);
        let mut problems: Vec<(String, DiagnosticCode, String)> = Vec::new();
        let mut unresolved: Vec<(String, String, String)> = Vec::new();

        for node in self.nodes.values() {
            for interface in &node.declared_interfaces {
                if kind_of(interface) != Some(NodeKind::Interface) {
                    problems.push((
                        node.name.clone(),
                        DiagnosticCode::UnresolvedInterface,
                        format!("'{}' is not a declared interface; it is ignored", interface),
                    ));
                }
            }
            for member in &node.member_names {
                if kind_of(member) != Some(NodeKind::Object) {
                    problems.push((
                        node.name.clone(),
                        DiagnosticCode::UnresolvedUnionMember,
                        format!("'{}' is not a declared object type; it is ignored", member),
                    ));
                }
            }
            for field in node.fields.values() {
                if kind_of(&field.type_ref.node).is_none() {
                    unresolved.push((
                        node.name.clone(),
                        format!("field '{}'", field.name),
                        field.type_ref.node.clone(),
                    ));
                }
                for arg in field.arguments.values() {
                    if kind_of(&arg.type_ref.node).is_none() {
                        unresolved.push((
                            node.name.clone(),
                            format!("argument '{}' of field '{}'", arg.name, field.name),
                            arg.type_ref.node.clone(),
                        ));
                    }
                }
            }
        }

        for (node, code, message) in problems {
            self.diagnostics.report(&self.strictness, &node, code, message);
        }
        for (node, owner, type_name) in unresolved {
            self.diagnostics.unresolved_type(&node, &owner, &type_name);
        }
    }

    /// Explicit roots must match `kind`; otherwise the first node of that kind is the root
    fn resolve_root(&mut self, explicit: Option<String>, kind: NodeKind, role: &str) -> Option<String> {
        match explicit {
            Some(name) => {
                self.check_root(&name, kind, role);
                Some(name)
            }
            None => self
                .nodes
                .values()
                .find(|n| n.kind == kind)
                .map(|n| n.name.clone()),
        }
    }

    fn check_root(&mut self, name: &str, kind: NodeKind, role: &str) {
        let actual = self.nodes.get(name).map(|n| n.kind);
        if actual != Some(kind) {
            let found = actual.map(|k| k.to_string()).unwrap_or_else(|| "nothing".to_string());
            self.diagnostics.report(
                &self.strictness,
                name,
                DiagnosticCode::RootKindMismatch,
                format!("{} root must be a {} node, found {}", role, kind, found),
            );
        }
    }
}

// =============================================================================
// Node Builder
// =============================================================================

/// Fills one node
pub struct NodeBuilder<'s> {
    node: TypeNode,
    strictness: &'s StrictnessConfig,
    diagnostics: &'s mut Diagnostics,
}

impl NodeBuilder<'_> {
    pub fn add_implements(&mut self, interface: impl Into<String>) -> &mut Self {
        self.node.declared_interfaces.push(interface.into());
        self
    }

    /// Add a union member
    pub fn add_member(&mut self, object: impl Into<String>) -> &mut Self {
        self.node.member_names.push(object.into());
        self
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.node.comments.push(comment.into());
        self
    }

    pub fn add_enum_value(
        &mut self,
        name: impl Into<String>,
        block: impl FnOnce(&mut EnumValueBuilder),
    ) -> &mut Self {
        let mut builder = EnumValueBuilder {
            value: EnumValue { name: name.into(), comments: Vec::new() },
        };
        block(&mut builder);
        let value = builder.build();

        if self.node.enum_values.contains_key(&value.name) {
            self.diagnostics.duplicate(
                self.strictness,
                &self.node.name,
                DiagnosticCode::DuplicateEnumValue,
                &value.name,
            );
        }
        self.node.enum_values.insert(value.name.clone(), value);
        self
    }

    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        type_ref: TypeRef,
        required: bool,
        has_default: bool,
        block: impl FnOnce(&mut FieldBuilder<'_>),
    ) -> &mut Self {
        let name = name.into();
        let slot = match self.node.fields.get_index_of(&name) {
            Some(slot) => {
                self.diagnostics.duplicate(
                    self.strictness,
                    &self.node.name,
                    DiagnosticCode::DuplicateField,
                    &name,
                );
                slot
            }
            None => self.node.fields.len(),
        };
        let id = FieldId { graph: self.node.graph, node: self.node.index, field: slot };

        let mut builder = FieldBuilder {
            field: FieldDef {
                id,
                owner: self.node.name.clone(),
                name: name.clone(),
                type_ref,
                required,
                has_default,
                directives: FieldDirectives::default(),
                arguments: IndexMap::new(),
                comments: Vec::new(),
                overridden: OnceCell::new(),
                comment_source: OnceCell::new(),
                selection: OnceCell::new(),
            },
            strictness: self.strictness,
            diagnostics: &mut *self.diagnostics,
        };
        block(&mut builder);
        let field = builder.build();

        self.node.fields.insert(name, field);
        self
    }

    fn build(self) -> TypeNode {
        self.node
    }
}

// =============================================================================
// Field Builder
// =============================================================================

/// Fills one field
pub struct FieldBuilder<'s> {
    field: FieldDef,
    strictness: &'s StrictnessConfig,
    diagnostics: &'s mut Diagnostics,
}

impl FieldBuilder<'_> {
    pub fn add_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.field.comments.push(comment.into());
        self
    }

    pub fn set_primary_key(&mut self, value: bool) -> &mut Self {
        self.field.directives.primary_key = value;
        self
    }

    pub fn set_selection(&mut self, value: bool) -> &mut Self {
        self.field.directives.selection = value;
        self
    }

    pub fn set_resolve(&mut self, value: bool) -> &mut Self {
        self.field.directives.resolve = value;
        self
    }

    pub fn add_argument(
        &mut self,
        name: impl Into<String>,
        type_ref: TypeRef,
        has_default: bool,
        block: impl FnOnce(&mut ArgumentBuilder),
    ) -> &mut Self {
        let mut builder = ArgumentBuilder {
            argument: ArgumentDef {
                field: self.field.id,
                name: name.into(),
                type_ref,
                has_default,
                comments: Vec::new(),
                comment_source: OnceCell::new(),
            },
        };
        block(&mut builder);
        let argument = builder.build();

        if self.field.arguments.contains_key(&argument.name) {
            let what = format!("{}({})", self.field.name, argument.name);
            self.diagnostics.duplicate(
                self.strictness,
                &self.field.owner,
                DiagnosticCode::DuplicateArgument,
                &what,
            );
        }
        self.field.arguments.insert(argument.name.clone(), argument);
        self
    }

    fn build(self) -> FieldDef {
        self.field
    }
}

// =============================================================================
// Argument / Enum Value Builders
// =============================================================================

pub struct ArgumentBuilder {
    argument: ArgumentDef,
}

impl ArgumentBuilder {
    pub fn add_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.argument.comments.push(comment.into());
        self
    }

    fn build(self) -> ArgumentDef {
        self.argument
    }
}

pub struct EnumValueBuilder {
    value: EnumValue,
}

impl EnumValueBuilder {
    pub fn add_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.value.comments.push(comment.into());
        self
    }

    fn build(self) -> EnumValue {
        self.value
    }
}
