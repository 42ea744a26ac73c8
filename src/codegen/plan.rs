//! Generation Plan
//!
//! What the derivation engine hands to a code builder: per node, an ordered
//! list of abstractions, each with a name, supertypes and ordered members.
//! Plans carry no target-language syntax; scalar types stay schema names
//! until an emitter maps them.
//!
//! Plans are plain values. Two derivations over the same frozen graph
//! compare equal.

use serde::Serialize;
use std::collections::HashSet;

use super::config::FamilyToggles;
use crate::graph::NodeKind;

// =============================================================================
// Plan
// =============================================================================

/// Everything generated for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationPlan {
    pub node: String,
    pub kind: NodeKind,
    pub abstractions: Vec<Abstraction>,
}

impl GenerationPlan {
    pub fn is_empty(&self) -> bool {
        self.abstractions.is_empty()
    }

    pub fn abstraction(&self, kind: AbstractionKind) -> Option<&Abstraction> {
        self.abstractions.iter().find(|a| a.kind == kind)
    }

    /// Look up an abstraction by its generated name
    pub fn named(&self, name: &str) -> Option<&Abstraction> {
        self.abstractions.iter().find(|a| a.name == name)
    }
}

/// Abstraction families.
///
/// `Query` is the composite half of the selection family and is toggled
/// together with `Selection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstractionKind {
    Entity,
    Projection,
    Qualification,
    QualifiedProjection,
    Selection,
    Query,
}

impl AbstractionKind {
    pub fn is_enabled(&self, toggles: &FamilyToggles) -> bool {
        toggles.enabled
            && match self {
                Self::Entity => toggles.entity,
                Self::Projection => toggles.projection,
                Self::Qualification => toggles.qualification,
                Self::QualifiedProjection => toggles.qualified_projection,
                Self::Selection | Self::Query => toggles.selection,
            }
    }
}

/// One generated declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abstraction {
    pub kind: AbstractionKind,
    pub name: String,
    /// Names of abstractions this one extends, in order
    pub supertypes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Field a selection or query belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub members: Vec<Member>,
}

impl Abstraction {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name() == name)
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(Member::name).collect()
    }
}

// =============================================================================
// Members
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum Member {
    Property(Property),
    Method(Method),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Self::Property(p) => &p.name,
            Self::Method(m) => &m.name,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Self::Property(p) => Some(p),
            Self::Method(_) => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Self::Method(m) => Some(m),
            Self::Property(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub is_override: bool,
    pub is_mutable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub is_abstract: bool,
    pub is_override: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub has_default: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

/// Type of a property or parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TypeExpr {
    /// Schema scalar, mapped by the emitter
    Scalar { name: String, list: bool, nullable: bool },
    /// Enum or input type, used as named
    Named { name: String, list: bool, nullable: bool },
    /// Entity abstraction of an object, interface or union
    Entity { name: String, list: bool, nullable: bool },
    /// Nested configurator over an abstraction; defaults to "select nothing"
    Configurator { target: String },
}

impl TypeExpr {
    pub fn configurator_target(&self) -> Option<&str> {
        match self {
            Self::Configurator { target } => Some(target),
            _ => None,
        }
    }
}

// =============================================================================
// Pruning
// =============================================================================

/// Drop disabled families from a set of plans.
///
/// Derivation always computes every family; this filter is the only place
/// toggles are read. References to removed abstractions (supertypes,
/// defaulted configurator parameters) are dropped with them so the
/// remaining plans stay self-consistent.
pub fn prune(plans: Vec<GenerationPlan>, toggles: &FamilyToggles) -> Vec<GenerationPlan> {
    let removed: HashSet<String> = plans
        .iter()
        .flat_map(|p| &p.abstractions)
        .filter(|a| !a.kind.is_enabled(toggles))
        .map(|a| a.name.clone())
        .collect();

    if removed.is_empty() {
        return plans;
    }

    plans
        .into_iter()
        .map(|mut plan| {
            plan.abstractions.retain(|a| a.kind.is_enabled(toggles));
            for abstraction in &mut plan.abstractions {
                abstraction.supertypes.retain(|s| !removed.contains(s));
                for member in &mut abstraction.members {
                    if let Member::Method(method) = member {
                        method.parameters.retain(|p| {
                            !(p.has_default
                                && p.ty.configurator_target().is_some_and(|t| removed.contains(t)))
                        });
                    }
                }
            }
            plan
        })
        .collect()
}
