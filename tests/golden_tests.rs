//! Golden Tests for Generation Plans
//!
//! Loads the schema fixtures the way the CLI does and checks the derived
//! plans and the rendered Rust output end to end.

use std::path::{Path, PathBuf};

use typed_query_gen::codegen::{
    self, rust, AbstractionKind, GeneratedFile, LayoutConfiguration, Member, RustEmitter, TypeExpr,
};
use typed_query_gen::graph::{
    load_from_path, load_from_str, DiagnosticCode, LoadConfig, NodeKind, SchemaGraph,
    StrictnessConfig,
};
use typed_query_gen::{GenError, GenerationPlan};

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn pets() -> SchemaGraph {
    load_from_str(include_str!("fixtures/pets.json"), &LoadConfig::default()).unwrap()
}

fn plans(graph: &SchemaGraph, layout: &LayoutConfiguration) -> Vec<GenerationPlan> {
    codegen::generate(graph, layout).unwrap()
}

fn plan_for<'p>(plans: &'p [GenerationPlan], node: &str) -> &'p GenerationPlan {
    plans.iter().find(|p| p.node == node).unwrap()
}

fn file<'f>(files: &'f [GeneratedFile], name: &str) -> &'f str {
    &files.iter().find(|f| f.path == Path::new(name)).unwrap().contents
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_pets_fixture_loads() {
    let graph = pets();

    // 5 builtin scalars + 8 declared types
    assert_eq!(graph.len(), 13);
    assert!(graph.diagnostics().is_empty());
    assert_eq!(graph.query().map(|n| n.name()), Some("Query"));

    let animal = graph.node("Animal").unwrap();
    let objects: Vec<&str> = graph.possible_objects(animal).iter().map(|n| n.name()).collect();
    assert_eq!(objects, vec!["Dog", "Cat"]);
}

#[test]
fn test_directory_merge_last_declaration_wins() {
    let graph = load_from_path(&fixtures_path().join("split"), &LoadConfig::default()).unwrap();

    let dog = graph.node("Dog").unwrap();
    assert!(dog.field("barks").is_some());
    assert_eq!(graph.diagnostics().warning_count(), 1);
    assert_eq!(graph.diagnostics().all()[0].code, DiagnosticCode::DuplicateNode);
    assert_eq!(graph.query().map(|n| n.name()), Some("Query"));
}

#[test]
fn test_directory_merge_strict_is_fatal() {
    let config = LoadConfig { strictness: StrictnessConfig::strict(), ..LoadConfig::default() };
    let err = load_from_path(&fixtures_path().join("split"), &config).unwrap_err();
    assert!(matches!(err, GenError::Diagnostics(ref diags) if diags.error_count() == 1));
}

// =============================================================================
// Derivation
// =============================================================================

#[test]
fn test_every_node_gets_a_plan_in_declaration_order() {
    let graph = pets();
    let plans = plans(&graph, &LayoutConfiguration::default());

    let nodes: Vec<&str> = plans.iter().map(|p| p.node.as_str()).collect();
    let declared: Vec<&str> = graph.nodes().map(|n| n.name()).collect();
    assert_eq!(nodes, declared);

    for plan in &plans {
        let leaf = matches!(plan.kind, NodeKind::Scalar | NodeKind::Enum | NodeKind::Input);
        assert_eq!(plan.is_empty(), leaf, "{}", plan.node);
    }
}

#[test]
fn test_person_selects_pet_through_query() {
    let graph = pets();
    let plans = plans(&graph, &LayoutConfiguration::default());
    let person = plan_for(&plans, "Person");

    let projection = person.abstraction(AbstractionKind::Projection).unwrap();
    assert_eq!(projection.member_names(), vec!["name", "pet", "dog", "nickname"]);

    let pet = projection.member("pet").and_then(Member::as_method).unwrap();
    assert_eq!(
        pet.parameters[0].ty,
        TypeExpr::Configurator { target: "PersonPetQuery".to_string() }
    );

    let query = person.named("PersonPetQuery").unwrap();
    assert_eq!(
        query.supertypes,
        vec!["PersonPetSelection".to_string(), "AnimalQualifiedProjection".to_string()]
    );

    // dog needs an id, so it has no selection
    assert!(person.named("PersonDogSelection").is_none());
}

#[test]
fn test_query_root_search_selection() {
    let graph = pets();
    let plans = plans(&graph, &LayoutConfiguration::default());
    let query = plan_for(&plans, "Query");

    let selection = query.named("QuerySearchSelection").unwrap();
    assert_eq!(selection.member_names(), vec!["filter"]);
    assert_eq!(selection.field.as_deref(), Some("search"));

    let search_query = query.named("QuerySearchQuery").unwrap();
    assert_eq!(search_query.supertypes[1], "ResultQualifiedProjection");

    // people has no arguments at all
    assert!(query.named("QueryPeopleSelection").is_some());
    assert!(query.named("QueryPeopleQuery").is_some());
}

#[test]
fn test_polymorphic_qualifications() {
    let graph = pets();
    let plans = plans(&graph, &LayoutConfiguration::default());

    for node in ["Animal", "Result"] {
        let plan = plan_for(&plans, node);
        let qualification = plan.abstraction(AbstractionKind::Qualification).unwrap();
        assert_eq!(qualification.member_names(), vec!["onDog", "onCat"], "{}", node);
        assert!(plan.abstraction(AbstractionKind::QualifiedProjection).is_some());
    }

    let dog = plan_for(&plans, "Dog");
    assert!(dog.abstraction(AbstractionKind::Qualification).is_none());
    let entity = dog.abstraction(AbstractionKind::Entity).unwrap();
    assert_eq!(entity.supertypes, vec!["Animal".to_string()]);
}

#[test]
fn test_disabled_selection_family() {
    let graph = pets();
    let mut layout = LayoutConfiguration::default();
    layout.families.selection = false;
    let plans = plans(&graph, &layout);

    assert!(plans
        .iter()
        .flat_map(|p| &p.abstractions)
        .all(|a| !matches!(a.kind, AbstractionKind::Selection | AbstractionKind::Query)));

    let projection = plan_for(&plans, "Person").abstraction(AbstractionKind::Projection).unwrap();
    let pet = projection.member("pet").and_then(Member::as_method).unwrap();
    assert!(pet.parameters.is_empty());
}

#[test]
fn test_invalid_layout_generates_nothing() {
    let graph = pets();
    let mut layout = LayoutConfiguration::default();
    layout.arguments.query_argument = layout.arguments.projection_argument.clone();

    let err = codegen::generate(&graph, &layout).unwrap_err();
    assert!(matches!(err, GenError::Config(_)));
}

// =============================================================================
// Rust Output
// =============================================================================

#[test]
fn test_rust_output_files() {
    let graph = pets();
    let layout = LayoutConfiguration::default();
    let files = codegen::build(&graph, &layout, RustEmitter::new(&layout)).unwrap();

    let names: Vec<String> = files.iter().map(|f| f.path.display().to_string()).collect();
    assert_eq!(
        names,
        vec!["animal.rs", "dog.rs", "cat.rs", "result.rs", "person.rs", "query.rs", "mod.rs"]
    );

    let person = file(&files, "person.rs");
    assert!(person.contains("pub trait Person {"));
    assert!(person.contains("fn pet(&self) -> Option<Box<dyn Animal>>;"));
    assert!(person.contains("pub trait PersonProjection {"));
    assert!(person.contains("dyn PersonPetQuery"));
    assert!(person.contains("pub trait PersonPetQuery: PersonPetSelection + AnimalQualifiedProjection"));

    let dog = file(&files, "dog.rs");
    assert!(dog.contains("pub trait Dog: Animal {"));
    assert!(dog.contains("fn color(&self) -> Option<Color>;"));
    assert!(dog.contains("fn barks(&self) -> Option<i32>;"));

    let root = file(&files, "mod.rs");
    assert!(root.contains("mod person;"));
    assert!(root.contains("pub use query::*;"));
}

#[test]
fn test_write_rust_output() {
    let graph = pets();
    let layout = LayoutConfiguration::default();
    let files = codegen::build(&graph, &layout, RustEmitter::new(&layout)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    rust::write_files(&out, &files).unwrap();

    assert!(out.join("mod.rs").exists());
    let written = std::fs::read_to_string(out.join("animal.rs")).unwrap();
    assert!(written.contains("pub trait AnimalQualification"));
}

#[test]
fn test_plans_serialize() {
    let graph = pets();
    let plans = plans(&graph, &LayoutConfiguration::default());

    let json = serde_json::to_value(&plans).unwrap();
    let person = json
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["node"] == "Person")
        .unwrap();
    assert_eq!(person["kind"], "OBJECT");
    assert_eq!(person["abstractions"][0]["kind"], "entity");
    assert_eq!(person["abstractions"][0]["name"], "Person");
}
