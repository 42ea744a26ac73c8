//! Typed Query Generator
//!
//! Derives typed query-building abstractions from a GraphQL-style schema
//! model: for every declared type, which companion abstractions exist and
//! what they contain.
//!
//! ## Features
//!
//! - **Frozen Schema Graph**: built once, then read-only; derived facts are
//!   computed lazily and cached
//! - **Override Resolution**: one resolved ancestor field per field, first
//!   declared interface wins
//! - **Selection Classification**: which fields are selectable with no
//!   mandatory input
//! - **Generation Plans**: Entity, Projection, Selection/Query,
//!   Qualification and QualifiedProjection per node
//! - **All-or-Nothing Output**: nothing is written unless every plan succeeds
//!
//! ## Architecture
//!
//! ```text
//! schema document (JSON)
//!   └─ graph::loader ──> SchemaGraph ──┬─ OverrideResolver
//!                                      └─ SelectionClassifier
//!                                             │
//!   codegen::DerivationEngine <───────────────┘
//!     └─ GenerationPlan per node ── prune(FamilyToggles)
//!          └─ CodeBuilder (RustEmitter) ──> files
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;

pub use codegen::{generate, CodeBuilder, DerivationEngine, GenerationPlan, LayoutConfiguration};
pub use config::GeneratorConfig;
pub use error::{GenError, Result};
pub use graph::{SchemaBuilder, SchemaGraph};
