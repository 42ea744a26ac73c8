//! Code Generation
//!
//! Turns a frozen schema graph into generation plans and hands them to a
//! code builder.
//!
//! Architecture:
//! - `LayoutConfiguration`: naming and enable flags, validated up front
//! - `DerivationEngine`: configuration-agnostic plan per node
//! - `prune`: the only place enable flags are applied
//! - `CodeBuilder`: consumes finished plans; never feeds decisions back
//!
//! The key constraint: all-or-nothing. Every plan is derived before the
//! first one is emitted, and builders keep their output in memory until
//! `finish`, so a fatal error leaves nothing half-written.

pub mod config;
pub mod derive;
pub mod names;
pub mod plan;
pub mod rust;

pub use config::{
    ArgumentNames, Decoration, Decorations, FamilyToggles, LayoutConfiguration, ScalarMappings,
};
pub use derive::DerivationEngine;
pub use names::Namer;
pub use plan::{
    prune, Abstraction, AbstractionKind, GenerationPlan, Member, Method, Parameter, Property,
    TypeExpr,
};
pub use rust::{GeneratedFile, RustEmitter};

use crate::error::Result;
use crate::graph::SchemaGraph;

// =============================================================================
// Code Builder Contract
// =============================================================================

/// Consumer of generation plans
pub trait CodeBuilder {
    /// What the builder produces once every plan was emitted
    type Output;

    /// Accept one plan. Called once per node, in declaration order.
    fn emit(&mut self, plan: &GenerationPlan) -> Result<()>;

    /// Produce the output
    fn finish(self) -> Self::Output;
}

// =============================================================================
// Public API
// =============================================================================

/// Validate the layout, derive every node and prune disabled families.
///
/// Returns every plan or the first fatal error; never a partial set.
pub fn generate(graph: &SchemaGraph, layout: &LayoutConfiguration) -> Result<Vec<GenerationPlan>> {
    layout.validate()?;

    let engine = DerivationEngine::new(graph, layout);
    let plans = engine.derive_all()?;

    Ok(prune(plans, &layout.families))
}

/// Generate and feed every plan to `builder`
pub fn build<B: CodeBuilder>(
    graph: &SchemaGraph,
    layout: &LayoutConfiguration,
    mut builder: B,
) -> Result<B::Output> {
    let plans = generate(graph, layout)?;
    for plan in &plans {
        builder.emit(plan)?;
    }
    Ok(builder.finish())
}
