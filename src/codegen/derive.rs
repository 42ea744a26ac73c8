//! Derivation Engine
//!
//! Computes the generation plan of every node. Per kind:
//!
//! | kind                    | Entity | Projection | Qualification + QualifiedProjection | Selection/Query |
//! |-------------------------|--------|------------|-------------------------------------|-----------------|
//! | OBJECT, QUERY, MUTATION | yes    | yes        | no                                  | per field       |
//! | INTERFACE, UNION        | yes    | yes        | yes                                 | per field       |
//! | SCALAR, ENUM, INPUT     | -      | -          | -                                   | -               |
//!
//! Per field:
//! - Entity: one accessor, marked override when the field overrides an
//!   interface field
//! - Projection: one selector unless the field is required (always fetched)
//! - Selection: only for fields where `is_selection` holds; settable
//!   properties are the nullable arguments, and a Query composite merges the
//!   selection with the nested projection of the field's type
//!
//! The engine never reads enable flags. Every family is computed and
//! [`prune`](super::plan::prune) filters afterwards.

use crate::error::{GenError, Result};
use crate::graph::{
    ArgumentDef, FieldDef, NodeKind, OverrideResolver, SchemaGraph, SelectionClassifier, TypeNode,
    TypeRef,
};

use super::config::LayoutConfiguration;
use super::names::Namer;
use super::plan::{
    Abstraction, AbstractionKind, GenerationPlan, Member, Method, Parameter, Property, TypeExpr,
};

/// Derives generation plans over one frozen graph
pub struct DerivationEngine<'a> {
    graph: &'a SchemaGraph,
    overrides: OverrideResolver<'a>,
    classifier: SelectionClassifier<'a>,
    names: Namer<'a>,
    layout: &'a LayoutConfiguration,
}

impl<'a> DerivationEngine<'a> {
    pub fn new(graph: &'a SchemaGraph, layout: &'a LayoutConfiguration) -> Self {
        Self {
            graph,
            overrides: graph.overrides(),
            classifier: graph.classifier(),
            names: Namer::new(&layout.decorations),
            layout,
        }
    }

    /// Plans for every node, in declaration order
    pub fn derive_all(&self) -> Result<Vec<GenerationPlan>> {
        let plans = self
            .graph
            .nodes()
            .map(|node| self.derive(node))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            nodes = plans.len(),
            abstractions = plans.iter().map(|p| p.abstractions.len()).sum::<usize>(),
            "derived generation plans"
        );
        Ok(plans)
    }

    /// Plan for one node
    pub fn derive(&self, node: &'a TypeNode) -> Result<GenerationPlan> {
        let mut abstractions = Vec::new();

        match node.kind() {
            NodeKind::Scalar | NodeKind::Enum | NodeKind::Input => {}
            NodeKind::Query | NodeKind::Mutation | NodeKind::Object => {
                abstractions.push(self.entity(node));
                abstractions.push(self.projection(node));
                abstractions.extend(self.selections(node));
            }
            NodeKind::Interface | NodeKind::Union => {
                abstractions.push(self.entity(node));
                abstractions.push(self.projection(node));
                abstractions.push(self.qualification(node)?);
                abstractions.push(self.qualified_projection(node)?);
                abstractions.extend(self.selections(node));
            }
        }

        tracing::debug!(
            node = node.name(),
            kind = %node.kind(),
            abstractions = abstractions.len(),
            "derived plan"
        );

        Ok(GenerationPlan {
            node: node.name().to_string(),
            kind: node.kind(),
            abstractions,
        })
    }

    // =========================================================================
    // Entity
    // =========================================================================

    /// Data view: one accessor per field
    pub fn entity(&self, node: &'a TypeNode) -> Abstraction {
        let members = node
            .fields()
            .map(|field| {
                Member::Property(Property {
                    name: field.name().to_string(),
                    ty: self.value_type(field.type_ref()),
                    is_override: self.overrides.is_override(field),
                    is_mutable: false,
                    comments: self.overrides.field_comments(field).to_vec(),
                })
            })
            .collect();

        Abstraction {
            kind: AbstractionKind::Entity,
            name: self.names.entity(node.name()),
            supertypes: self.interface_names(node, |n| self.names.entity(n)),
            comments: node.comments().to_vec(),
            field: None,
            members,
        }
    }

    // =========================================================================
    // Projection
    // =========================================================================

    /// Optional-field selectors
    pub fn projection(&self, node: &'a TypeNode) -> Abstraction {
        let members = node
            .fields()
            .filter(|field| !field.is_required())
            .map(|field| {
                let is_override = self
                    .overrides
                    .overridden_field(field)
                    .is_some_and(|ancestor| !ancestor.is_required());
                Member::Method(Method {
                    name: field.name().to_string(),
                    parameters: self.selector_parameters(node, field),
                    is_abstract: true,
                    is_override,
                    comments: self.overrides.field_comments(field).to_vec(),
                })
            })
            .collect();

        Abstraction {
            kind: AbstractionKind::Projection,
            name: self.names.projection(node.name()),
            supertypes: self.interface_names(node, |n| self.names.projection(n)),
            comments: node.comments().to_vec(),
            field: None,
            members,
        }
    }

    /// Mandatory arguments first; a non-selection field also takes its
    /// omittable arguments (defaulted); a projected field ends with one
    /// nested configurator
    fn selector_parameters(&self, node: &TypeNode, field: &'a FieldDef) -> Vec<Parameter> {
        let is_selection = self.classifier.is_selection(field);

        let mut parameters: Vec<Parameter> = field
            .arguments()
            .filter(|arg| !arg.is_initialized())
            .map(|arg| self.argument_parameter(arg, false))
            .collect();

        if !is_selection {
            parameters.extend(
                field
                    .arguments()
                    .filter(|arg| arg.is_initialized())
                    .map(|arg| self.argument_parameter(arg, true)),
            );
        }

        if self.classifier.has_projection(field.type_ref()) {
            let arguments = &self.layout.arguments;
            let (name, target) = if is_selection {
                (
                    arguments.query_argument.clone(),
                    self.names.query(node.name(), field.name()),
                )
            } else {
                (
                    arguments.projection_argument.clone(),
                    self.nested_projection(field.type_ref()),
                )
            };
            parameters.push(Parameter {
                name,
                ty: TypeExpr::Configurator { target },
                has_default: true,
                comments: Vec::new(),
            });
        }

        parameters
    }

    fn argument_parameter(&self, arg: &'a ArgumentDef, has_default: bool) -> Parameter {
        Parameter {
            name: arg.name().to_string(),
            ty: self.value_type(arg.type_ref()),
            has_default,
            comments: self.overrides.argument_comments(arg).to_vec(),
        }
    }

    // =========================================================================
    // Qualification
    // =========================================================================

    /// One `on<Subtype>` narrowing member per concrete object type.
    ///
    /// Only interfaces and unions qualify; asking for any other kind is a
    /// programming error and aborts the run.
    pub fn qualification(&self, node: &'a TypeNode) -> Result<Abstraction> {
        self.require_polymorphic(node, "qualification")?;

        let members = self
            .graph
            .possible_objects(node)
            .into_iter()
            .map(|subtype| {
                Member::Method(Method {
                    name: self.names.on_subtype(subtype.name()),
                    parameters: vec![Parameter {
                        name: self.layout.arguments.projection_argument.clone(),
                        ty: TypeExpr::Configurator {
                            target: self.names.projection(subtype.name()),
                        },
                        has_default: true,
                        comments: Vec::new(),
                    }],
                    is_abstract: true,
                    is_override: false,
                    comments: subtype.comments().to_vec(),
                })
            })
            .collect();

        Ok(Abstraction {
            kind: AbstractionKind::Qualification,
            name: self.names.qualification(node.name()),
            supertypes: Vec::new(),
            comments: node.comments().to_vec(),
            field: None,
            members,
        })
    }

    /// Projection and qualification of the same polymorphic node combined
    pub fn qualified_projection(&self, node: &'a TypeNode) -> Result<Abstraction> {
        self.require_polymorphic(node, "qualified projection")?;

        Ok(Abstraction {
            kind: AbstractionKind::QualifiedProjection,
            name: self.names.qualified_projection(node.name()),
            supertypes: vec![
                self.names.projection(node.name()),
                self.names.qualification(node.name()),
            ],
            comments: node.comments().to_vec(),
            field: None,
            members: Vec::new(),
        })
    }

    fn require_polymorphic(&self, node: &TypeNode, family: &str) -> Result<()> {
        if node.kind().is_polymorphic() {
            Ok(())
        } else {
            Err(GenError::generation(
                node.name(),
                format!(
                    "{} requested for a {} node; only interfaces and unions have one",
                    family,
                    node.kind()
                ),
            ))
        }
    }

    // =========================================================================
    // Selection / Query
    // =========================================================================

    /// Selection (and Query) pairs for every selectable field, in field order
    pub fn selections(&self, node: &'a TypeNode) -> Vec<Abstraction> {
        let mut out = Vec::new();
        for field in node.fields().filter(|f| self.classifier.is_selection(f)) {
            let selection = self.selection(node, field);
            let query = self.query(node, field, &selection.name);
            out.push(selection);
            out.extend(query);
        }
        out
    }

    /// Settable arguments of one selectable field
    fn selection(&self, node: &TypeNode, field: &'a FieldDef) -> Abstraction {
        let members = field
            .arguments()
            .filter(|arg| arg.type_ref().nullable)
            .map(|arg| {
                Member::Property(Property {
                    name: arg.name().to_string(),
                    ty: self.value_type(arg.type_ref()),
                    is_override: false,
                    is_mutable: true,
                    comments: self.overrides.argument_comments(arg).to_vec(),
                })
            })
            .collect();

        Abstraction {
            kind: AbstractionKind::Selection,
            name: self.names.selection(node.name(), field.name()),
            supertypes: Vec::new(),
            comments: self.overrides.field_comments(field).to_vec(),
            field: Some(field.name().to_string()),
            members,
        }
    }

    /// Selection merged with the nested projection of the field's type
    fn query(&self, node: &TypeNode, field: &'a FieldDef, selection: &str) -> Option<Abstraction> {
        if !self.classifier.has_projection(field.type_ref()) {
            return None;
        }

        Some(Abstraction {
            kind: AbstractionKind::Query,
            name: self.names.query(node.name(), field.name()),
            supertypes: vec![selection.to_string(), self.nested_projection(field.type_ref())],
            comments: self.overrides.field_comments(field).to_vec(),
            field: Some(field.name().to_string()),
            members: Vec::new(),
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn interface_names(&self, node: &'a TypeNode, name: impl Fn(&str) -> String) -> Vec<String> {
        self.graph
            .implements(node)
            .into_iter()
            .map(|interface| name(interface.name()))
            .collect()
    }

    fn nested_projection(&self, type_ref: &TypeRef) -> String {
        match self.graph.referenced(type_ref) {
            Some(target) => self.names.nested_projection(target),
            None => self.names.projection(&type_ref.node),
        }
    }

    fn value_type(&self, type_ref: &TypeRef) -> TypeExpr {
        let list = type_ref.list;
        let nullable = type_ref.nullable;
        match self.graph.referenced(type_ref).map(|n| n.kind()) {
            Some(NodeKind::Scalar) | None => TypeExpr::Scalar {
                name: type_ref.node.clone(),
                list,
                nullable,
            },
            Some(NodeKind::Enum) | Some(NodeKind::Input) => TypeExpr::Named {
                name: type_ref.node.clone(),
                list,
                nullable,
            },
            Some(_) => TypeExpr::Entity {
                name: self.names.entity(&type_ref.node),
                list,
                nullable,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SchemaBuilder;
    use std::collections::BTreeSet;

    fn pets() -> SchemaGraph {
        let mut schema = SchemaBuilder::default();
        for scalar in ["ID", "String", "Int"] {
            schema.add_node(scalar, NodeKind::Scalar, |_| {});
        }
        schema.add_node("Filter", NodeKind::Input, |_| {});
        schema.add_node("Animal", NodeKind::Interface, |node| {
            node.add_comment("Something alive");
            node.add_field("id", TypeRef::named("ID").non_null(), true, false, |_| {})
                .add_field("name", TypeRef::named("String"), false, false, |field| {
                    field.add_comment("Given name");
                });
        });
        schema.add_node("Dog", NodeKind::Object, |node| {
            node.add_implements("Animal");
            node.add_comment("Barks");
            node.add_field("id", TypeRef::named("ID").non_null(), true, false, |_| {})
                .add_field("name", TypeRef::named("String"), false, false, |_| {})
                .add_field("barks", TypeRef::named("Int"), false, false, |_| {});
        });
        schema.add_node("Cat", NodeKind::Object, |node| {
            node.add_implements("Animal");
            node.add_field("id", TypeRef::named("ID").non_null(), true, false, |_| {})
                .add_field("name", TypeRef::named("String"), false, false, |_| {});
        });
        schema.add_node("Result", NodeKind::Union, |node| {
            node.add_member("Dog").add_member("Cat");
        });
        schema.add_node("Person", NodeKind::Object, |node| {
            node.add_field("id", TypeRef::named("ID").non_null(), true, false, |_| {})
                .add_field("name", TypeRef::named("String"), false, false, |_| {})
                .add_field("pet", TypeRef::named("Animal"), false, false, |field| {
                    field.add_comment("Favorite animal");
                })
                .add_field("dog", TypeRef::named("Dog"), false, false, |field| {
                    field.add_argument("id", TypeRef::named("ID").non_null(), false, |arg| {
                        arg.add_comment("Which dog");
                    });
                })
                .add_field("nickname", TypeRef::named("String"), false, false, |field| {
                    field
                        .add_argument("locale", TypeRef::named("String"), false, |_| {})
                        .add_argument("style", TypeRef::named("Int").non_null(), false, |_| {});
                });
        });
        schema.add_node("Query", NodeKind::Query, |node| {
            node.add_field("search", TypeRef::named("Result").list(), false, false, |field| {
                field
                    .add_argument("limit", TypeRef::named("Int").non_null(), true, |_| {})
                    .add_argument("filter", TypeRef::named("Filter"), false, |_| {});
            });
        });
        schema.build().unwrap()
    }

    fn plan(graph: &SchemaGraph, node: &str) -> GenerationPlan {
        let layout = LayoutConfiguration::default();
        let engine = DerivationEngine::new(graph, &layout);
        engine.derive(graph.node(node).unwrap()).unwrap()
    }

    fn method<'p>(abstraction: &'p Abstraction, name: &str) -> &'p Method {
        abstraction.member(name).and_then(Member::as_method).unwrap()
    }

    #[test]
    fn test_person_projection_and_selection() {
        let graph = pets();
        let plan = plan(&graph, "Person");

        // Required id needs no selector
        let projection = plan.abstraction(AbstractionKind::Projection).unwrap();
        assert_eq!(projection.name, "PersonProjection");
        assert_eq!(projection.member_names(), vec!["name", "pet", "dog", "nickname"]);

        // pet selects through its query
        let pet = method(projection, "pet");
        assert_eq!(pet.parameters.len(), 1);
        assert_eq!(pet.parameters[0].name, "__query");
        assert_eq!(
            pet.parameters[0].ty,
            TypeExpr::Configurator { target: "PersonPetQuery".to_string() }
        );
        assert!(pet.parameters[0].has_default);

        let selection = plan.named("PersonPetSelection").unwrap();
        assert_eq!(selection.kind, AbstractionKind::Selection);
        assert!(selection.members.is_empty());

        let query = plan.named("PersonPetQuery").unwrap();
        assert_eq!(
            query.supertypes,
            vec!["PersonPetSelection".to_string(), "AnimalQualifiedProjection".to_string()]
        );
        assert_eq!(query.comments, vec!["Favorite animal".to_string()]);
    }

    #[test]
    fn test_mandatory_argument_blocks_selection() {
        let graph = pets();
        let plan = plan(&graph, "Person");

        assert!(plan.named("PersonDogSelection").is_none());

        let projection = plan.abstraction(AbstractionKind::Projection).unwrap();
        let dog = method(projection, "dog");
        let names: Vec<&str> = dog.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "__projection"]);
        assert!(!dog.parameters[0].has_default);
        assert_eq!(dog.parameters[0].comments, vec!["Which dog".to_string()]);
        // Object target: plain projection
        assert_eq!(
            dog.parameters[1].ty,
            TypeExpr::Configurator { target: "DogProjection".to_string() }
        );
    }

    #[test]
    fn test_scalar_selector_takes_arguments() {
        let graph = pets();
        let plan = plan(&graph, "Person");
        let projection = plan.abstraction(AbstractionKind::Projection).unwrap();
        let nickname = method(projection, "nickname");

        // Mandatory first, then omittable ones with defaults, no configurator
        let params: Vec<(&str, bool)> =
            nickname.parameters.iter().map(|p| (p.name.as_str(), p.has_default)).collect();
        assert_eq!(params, vec![("style", false), ("locale", true)]);
    }

    #[test]
    fn test_search_selector_and_selection() {
        let graph = pets();
        let plan = plan(&graph, "Query");

        let projection = plan.abstraction(AbstractionKind::Projection).unwrap();
        let search = method(projection, "search");
        assert_eq!(search.parameters.len(), 1);
        assert_eq!(
            search.parameters[0].ty,
            TypeExpr::Configurator { target: "QuerySearchQuery".to_string() }
        );

        // Only the nullable argument is settable; `limit` is fixed by its default
        let selection = plan.named("QuerySearchSelection").unwrap();
        assert_eq!(selection.member_names(), vec!["filter"]);
        let filter = selection.members[0].as_property().unwrap();
        assert!(filter.is_mutable);
        assert_eq!(
            filter.ty,
            TypeExpr::Named { name: "Filter".to_string(), list: false, nullable: true }
        );

        let query = plan.named("QuerySearchQuery").unwrap();
        assert_eq!(query.supertypes[1], "ResultQualifiedProjection");
    }

    #[test]
    fn test_interface_qualification() {
        let graph = pets();
        let plan = plan(&graph, "Animal");

        let qualification = plan.abstraction(AbstractionKind::Qualification).unwrap();
        assert_eq!(qualification.name, "AnimalQualification");
        assert_eq!(qualification.member_names(), vec!["onDog", "onCat"]);

        let on_dog = method(qualification, "onDog");
        assert_eq!(on_dog.parameters[0].name, "__projection");
        assert_eq!(
            on_dog.parameters[0].ty,
            TypeExpr::Configurator { target: "DogProjection".to_string() }
        );
        assert!(on_dog.parameters[0].has_default);
        assert_eq!(on_dog.comments, vec!["Barks".to_string()]);
        assert!(method(qualification, "onCat").comments.is_empty());

        let qualified = plan.abstraction(AbstractionKind::QualifiedProjection).unwrap();
        assert_eq!(
            qualified.supertypes,
            vec!["AnimalProjection".to_string(), "AnimalQualification".to_string()]
        );
    }

    #[test]
    fn test_union_qualification_follows_member_order() {
        let graph = pets();
        let plan = plan(&graph, "Result");

        let qualification = plan.abstraction(AbstractionKind::Qualification).unwrap();
        assert_eq!(qualification.member_names(), vec!["onDog", "onCat"]);

        let entity = plan.abstraction(AbstractionKind::Entity).unwrap();
        assert!(entity.members.is_empty());
    }

    #[test]
    fn test_object_has_no_qualification() {
        let graph = pets();
        let plan = plan(&graph, "Dog");
        assert!(plan.abstraction(AbstractionKind::Qualification).is_none());
        assert!(plan.abstraction(AbstractionKind::QualifiedProjection).is_none());

        let layout = LayoutConfiguration::default();
        let engine = DerivationEngine::new(&graph, &layout);
        let err = engine.qualified_projection(graph.node("Dog").unwrap()).unwrap_err();
        assert!(matches!(err, GenError::Generation { ref node, .. } if node == "Dog"));
        assert!(engine.qualification(graph.node("Dog").unwrap()).is_err());
    }

    #[test]
    fn test_leaf_kinds_have_empty_plans() {
        let graph = pets();
        assert!(plan(&graph, "String").is_empty());
        assert!(plan(&graph, "Filter").is_empty());
    }

    #[test]
    fn test_entity_overrides_and_comments() {
        let graph = pets();
        let plan = plan(&graph, "Dog");
        let entity = plan.abstraction(AbstractionKind::Entity).unwrap();

        assert_eq!(entity.supertypes, vec!["Animal".to_string()]);
        let name = entity.member("name").and_then(Member::as_property).unwrap();
        assert!(name.is_override);
        assert!(!name.is_mutable);
        assert_eq!(name.comments, vec!["Given name".to_string()]);
        let barks = entity.member("barks").and_then(Member::as_property).unwrap();
        assert!(!barks.is_override);

        let projection = plan.abstraction(AbstractionKind::Projection).unwrap();
        assert_eq!(projection.supertypes, vec!["AnimalProjection".to_string()]);
        assert!(method(projection, "name").is_override);
    }

    #[test]
    fn test_entity_member_set_is_union_with_interfaces() {
        let graph = pets();
        let layout = LayoutConfiguration::default();
        let engine = DerivationEngine::new(&graph, &layout);

        for node in graph.nodes().filter(|n| n.kind().has_entity()) {
            let entity = engine.entity(node);
            let mut effective: BTreeSet<String> =
                entity.member_names().into_iter().map(String::from).collect();
            for interface in graph.implements(node) {
                let inherited = engine.entity(interface);
                for member in inherited.member_names() {
                    // Inherited accessors are overridden, never duplicated
                    let own = entity.member(member).and_then(Member::as_property);
                    assert!(own.map_or(true, |p| p.is_override), "{}.{}", node.name(), member);
                    effective.insert(member.to_string());
                }
            }
            let mut expected: BTreeSet<String> = node.fields().map(|f| f.name().to_string()).collect();
            for interface in graph.implements(node) {
                expected.extend(interface.fields().map(|f| f.name().to_string()));
            }
            assert_eq!(effective, expected);
        }
    }

    #[test]
    fn test_abstraction_order() {
        let graph = pets();
        let plan = plan(&graph, "Person");
        let kinds: Vec<AbstractionKind> = plan.abstractions.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AbstractionKind::Entity,
                AbstractionKind::Projection,
                AbstractionKind::Selection,
                AbstractionKind::Query,
            ]
        );
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let graph = pets();
        let layout = LayoutConfiguration::default();
        let engine = DerivationEngine::new(&graph, &layout);

        let first = engine.derive_all().unwrap();
        let second = engine.derive_all().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), graph.len());
    }
}
