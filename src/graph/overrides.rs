//! Override Resolution
//!
//! Matches a field to the same-named field of an implemented interface.
//! Only direct interfaces are scanned, in declared order, and the first hit
//! wins; that is the whole diamond tie-break. Matching is by name only, no
//! type compatibility is checked.
//!
//! Results are cached on the field the first time they are asked for.

use std::collections::HashSet;

use super::{ArgumentDef, FieldDef, FieldId, SchemaGraph};

/// Resolves overridden fields and inherited comments over a frozen graph
#[derive(Clone, Copy)]
pub struct OverrideResolver<'g> {
    graph: &'g SchemaGraph,
}

impl<'g> OverrideResolver<'g> {
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self { graph }
    }

    /// The interface field this field overrides, if any
    pub fn overridden_field(&self, field: &FieldDef) -> Option<&'g FieldDef> {
        let resolved = field.overridden.get_or_init(|| self.resolve(field));
        resolved.map(|id| self.graph.field_at(id))
    }

    pub fn is_override(&self, field: &FieldDef) -> bool {
        self.overridden_field(field).is_some()
    }

    /// Own comments, or the nearest overridden field's comments when empty
    pub fn field_comments(&self, field: &'g FieldDef) -> &'g [String] {
        let source = *field.comment_source.get_or_init(|| {
            self.walk_overrides(field, |candidate| !candidate.comments.is_empty())
        });
        &self.graph.field_at(source).comments
    }

    /// Own comments, or the same-named argument's comments up the override
    /// chain. The chain ends at the first overridden field without an
    /// argument of that name.
    pub fn argument_comments(&self, argument: &'g ArgumentDef) -> &'g [String] {
        let source = *argument.comment_source.get_or_init(|| {
            let owner = self.graph.field_at(argument.field);
            let mut seen = HashSet::new();
            let mut current = owner;
            loop {
                match current.arguments.get(&argument.name) {
                    Some(arg) if !arg.comments.is_empty() => return current.id,
                    Some(_) => {}
                    None => return owner.id,
                }
                if !seen.insert(current.id) {
                    return owner.id;
                }
                match self.overridden_field(current) {
                    Some(next) => current = next,
                    None => return owner.id,
                }
            }
        });

        self.graph
            .field_at(source)
            .arguments
            .get(&argument.name)
            .map(|arg| arg.comments.as_slice())
            .unwrap_or(&[])
    }

    fn resolve(&self, field: &FieldDef) -> Option<FieldId> {
        let owner = self.graph.node_at(field.id.node);
        self.graph
            .implements(owner)
            .into_iter()
            .find_map(|interface| interface.fields.get(&field.name))
            .map(|ancestor| ancestor.id)
    }

    /// First field along the override chain satisfying `accept`, else `start`.
    ///
    /// Interface cycles are malformed but must not loop forever.
    fn walk_overrides(&self, start: &'g FieldDef, accept: impl Fn(&FieldDef) -> bool) -> FieldId {
        let mut seen = HashSet::new();
        let mut current = start;
        loop {
            if accept(current) {
                return current.id;
            }
            if !seen.insert(current.id) {
                return start.id;
            }
            match self.overridden_field(current) {
                Some(next) => current = next,
                None => return start.id,
            }
        }
    }
}
