//! Selection Classification
//!
//! Two facts every derived abstraction depends on:
//! - `has_projection`: a type reference points at an object, interface or
//!   union, so selecting it needs a nested selection instead of a leaf value
//! - `is_selection`: the field has a projection AND every argument can be
//!   omitted, so it is selectable with zero mandatory input
//!
//! Both are pure. `has_projection` is a single name lookup; `is_selection`
//! is cached on the field.

use super::{FieldDef, SchemaGraph, TypeRef};

/// Answers selection questions over a frozen graph
#[derive(Clone, Copy)]
pub struct SelectionClassifier<'g> {
    graph: &'g SchemaGraph,
}

impl<'g> SelectionClassifier<'g> {
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self { graph }
    }

    pub fn has_projection(&self, type_ref: &TypeRef) -> bool {
        self.graph
            .referenced(type_ref)
            .map(|node| node.kind().has_projection())
            .unwrap_or(false)
    }

    pub fn is_selection(&self, field: &FieldDef) -> bool {
        *field.selection.get_or_init(|| {
            self.has_projection(&field.type_ref) && field.arguments().all(|arg| arg.is_initialized())
        })
    }
}
