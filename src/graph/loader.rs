//! Schema Loading
//!
//! Replays already-parsed schema model documents (JSON) through
//! [`SchemaBuilder`]. A document lists types with their kind, fields written
//! in the usual type notation (`[Result!]!`), arguments with optional default
//! values, and directive names. Directive names are matched through
//! [`DirectiveLayout`], so a schema can use its own spelling for
//! `@primaryKey`, `@required`, `@default`, `@selection` and `@resolve`.
//!
//! A directory is walked recursively and every document in it is merged into
//! one graph, in path order.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::builder::{FieldBuilder, NodeBuilder, SchemaBuilder};
use super::diagnostics::StrictnessConfig;
use super::{NodeKind, SchemaGraph, TypeRef};
use crate::error::{GenError, Result};

/// Scalars every schema can use without declaring them
pub const BUILTIN_SCALARS: [&str; 5] = ["ID", "String", "Int", "Float", "Boolean"];

// =============================================================================
// Directive Layout
// =============================================================================

/// Directive names recognized in documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveLayout {
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default = "default_required")]
    pub required: String,
    #[serde(default = "default_default")]
    pub default: String,
    #[serde(default = "default_selection")]
    pub selection: String,
    #[serde(default = "default_resolve")]
    pub resolve: String,
}

fn default_primary_key() -> String { "primaryKey".to_string() }
fn default_required() -> String { "required".to_string() }
fn default_default() -> String { "default".to_string() }
fn default_selection() -> String { "selection".to_string() }
fn default_resolve() -> String { "resolve".to_string() }

impl Default for DirectiveLayout {
    fn default() -> Self {
        Self {
            primary_key: default_primary_key(),
            required: default_required(),
            default: default_default(),
            selection: default_selection(),
            resolve: default_resolve(),
        }
    }
}

impl DirectiveLayout {
    fn matches(expected: &str, directive: &str) -> bool {
        directive.strip_prefix('@').unwrap_or(directive) == expected
    }

    fn has(&self, directives: &[String], expected: &str) -> bool {
        directives.iter().any(|d| Self::matches(expected, d))
    }
}

// =============================================================================
// Document Model
// =============================================================================

/// One schema model document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub schema: RootsDoc,
    #[serde(default)]
    pub types: Vec<TypeDoc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootsDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDoc {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    /// Union members
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<EnumValueDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValueDoc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_notation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_notation: String,
    /// Default value literal; presence is all that matters here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

// =============================================================================
// Load Configuration
// =============================================================================

/// Configuration for schema loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub directives: DirectiveLayout,
    pub strictness: StrictnessConfig,
    /// File extensions picked up when walking a directory
    pub extensions: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            directives: DirectiveLayout::default(),
            strictness: StrictnessConfig::default(),
            extensions: vec!["json".to_string()],
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load one document from a JSON string
pub fn load_from_str(json: &str, config: &LoadConfig) -> Result<SchemaGraph> {
    let document: SchemaDocument = serde_json::from_str(json)?;
    build_graph(&[document], config)
}

/// Load a document file, or every document below a directory
pub fn load_from_path(path: &Path, config: &LoadConfig) -> Result<SchemaGraph> {
    let files = if path.is_dir() {
        collect_files(path, &config.extensions)
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        return Err(GenError::schema(
            path.display().to_string(),
            "no schema documents found",
        ));
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in &files {
        let content = fs::read_to_string(file)?;
        let document: SchemaDocument = serde_json::from_str(&content).map_err(|e| {
            GenError::schema(file.display().to_string(), format!("failed to parse document: {}", e))
        })?;
        tracing::debug!(file = %file.display(), types = document.types.len(), "loaded schema document");
        documents.push(document);
    }

    build_graph(&documents, config)
}

fn collect_files(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|wanted| wanted == ext))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Merge documents into one builder and freeze
pub fn build_graph(documents: &[SchemaDocument], config: &LoadConfig) -> Result<SchemaGraph> {
    let mut schema = SchemaBuilder::new(config.strictness.clone());

    let declared = |name: &str| documents.iter().flat_map(|d| &d.types).any(|t| t.name == name);
    for scalar in BUILTIN_SCALARS {
        if !declared(scalar) {
            schema.add_node(scalar, NodeKind::Scalar, |_| {});
        }
    }

    // Type notation errors are collected while replaying and raised afterwards
    let mut bad_notation: Option<GenError> = None;

    for document in documents {
        for type_doc in &document.types {
            schema.add_node(type_doc.name.clone(), type_doc.kind, |node| {
                if let Err(e) = replay_type(node, type_doc, &config.directives) {
                    bad_notation.get_or_insert(e);
                }
            });
        }
        if let Some(query) = &document.schema.query {
            schema.set_query(query.clone());
        }
        if let Some(mutation) = &document.schema.mutation {
            schema.set_mutation(mutation.clone());
        }
        if let Some(subscription) = &document.schema.subscription {
            schema.set_subscription(subscription.clone());
        }
    }

    if let Some(e) = bad_notation {
        return Err(e);
    }

    schema.build()
}

fn replay_type(node: &mut NodeBuilder<'_>, doc: &TypeDoc, directives: &DirectiveLayout) -> Result<()> {
    for comment in &doc.comments {
        node.add_comment(comment.clone());
    }
    for interface in &doc.implements {
        node.add_implements(interface.clone());
    }
    for member in &doc.members {
        node.add_member(member.clone());
    }
    for value in &doc.values {
        node.add_enum_value(value.name.clone(), |v| {
            for comment in &value.comments {
                v.add_comment(comment.clone());
            }
        });
    }

    for field in &doc.fields {
        let type_ref = parse_type(&doc.name, &field.name, &field.type_notation)?;
        let arguments = field
            .arguments
            .iter()
            .map(|arg| {
                let owner = format!("{}({})", field.name, arg.name);
                parse_type(&doc.name, &owner, &arg.type_notation).map(|type_ref| (arg, type_ref))
            })
            .collect::<Result<Vec<_>>>()?;
        let required = directives.has(&field.directives, &directives.required)
            || directives.has(&field.directives, &directives.primary_key);
        let has_default = directives.has(&field.directives, &directives.default);

        node.add_field(field.name.clone(), type_ref, required, has_default, |builder| {
            replay_field(builder, field, arguments, directives)
        });
    }
    Ok(())
}

fn replay_field(
    builder: &mut FieldBuilder<'_>,
    field: &FieldDoc,
    arguments: Vec<(&ArgumentDoc, TypeRef)>,
    directives: &DirectiveLayout,
) {
    builder
        .set_primary_key(directives.has(&field.directives, &directives.primary_key))
        .set_selection(directives.has(&field.directives, &directives.selection))
        .set_resolve(directives.has(&field.directives, &directives.resolve));
    for comment in &field.comments {
        builder.add_comment(comment.clone());
    }
    for (arg, type_ref) in arguments {
        builder.add_argument(arg.name.clone(), type_ref, arg.default.is_some(), |a| {
            for comment in &arg.comments {
                a.add_comment(comment.clone());
            }
        });
    }
}

fn parse_type(node: &str, owner: &str, notation: &str) -> Result<TypeRef> {
    TypeRef::parse(notation).ok_or_else(|| {
        GenError::schema(node, format!("{} has malformed type '{}'", owner, notation))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETS: &str = r#"{
        "types": [
            {"name": "Animal", "kind": "INTERFACE", "fields": [
                {"name": "id", "type": "ID!", "directives": ["@primaryKey"]},
                {"name": "name", "type": "String", "directives": ["default"]}
            ]},
            {"name": "Dog", "kind": "OBJECT", "implements": ["Animal"], "fields": [
                {"name": "id", "type": "ID!", "directives": ["primaryKey"]},
                {"name": "name", "type": "String"},
                {"name": "friends", "type": "[Animal!]!", "arguments": [
                    {"name": "limit", "type": "Int!", "default": 10},
                    {"name": "offset", "type": "Int"}
                ]}
            ]},
            {"name": "Query", "kind": "QUERY", "fields": [
                {"name": "pets", "type": "[Animal]", "directives": ["@selection"]}
            ]}
        ]
    }"#;

    #[test]
    fn test_load_from_str() {
        let graph = load_from_str(PETS, &LoadConfig::default()).unwrap();

        // builtin scalars + 3 types
        assert_eq!(graph.len(), 8);
        assert_eq!(graph.query().map(|n| n.name()), Some("Query"));

        let dog = graph.node("Dog").unwrap();
        let id = dog.field("id").unwrap();
        assert!(id.is_required());
        assert!(id.directives().primary_key);

        let friends = dog.field("friends").unwrap();
        assert_eq!(friends.type_ref(), &TypeRef::named("Animal").list().non_null());
        let limit = friends.argument("limit").unwrap();
        assert!(limit.has_default());
        assert!(limit.is_initialized());
        assert!(!friends.argument("offset").unwrap().has_default());

        let name = graph.node("Animal").unwrap().field("name").unwrap();
        assert!(name.has_default());
        assert!(!name.is_required());

        let pets = graph.node("Query").unwrap().field("pets").unwrap();
        assert!(pets.directives().selection);
    }

    #[test]
    fn test_custom_directive_names() {
        let config = LoadConfig {
            directives: DirectiveLayout {
                required: "mandatory".to_string(),
                ..DirectiveLayout::default()
            },
            ..LoadConfig::default()
        };
        let json = r#"{"types": [{"name": "Person", "kind": "OBJECT", "fields": [
            {"name": "name", "type": "String", "directives": ["mandatory"]},
            {"name": "nick", "type": "String", "directives": ["required"]}
        ]}]}"#;
        let graph = load_from_str(json, &config).unwrap();
        let person = graph.node("Person").unwrap();

        assert!(person.field("name").unwrap().is_required());
        assert!(!person.field("nick").unwrap().is_required());
    }

    #[test]
    fn test_malformed_type_notation() {
        let json = r#"{"types": [{"name": "Person", "kind": "OBJECT", "fields": [
            {"name": "name", "type": "[String"}
        ]}]}"#;
        let err = load_from_str(json, &LoadConfig::default()).unwrap_err();
        assert!(err.to_string().contains("malformed type '[String'"));
    }

    #[test]
    fn test_declared_builtin_is_not_duplicated() {
        let json = r#"{"types": [{"name": "String", "kind": "SCALAR"}]}"#;
        let graph = load_from_str(json, &LoadConfig::default()).unwrap();
        assert!(graph.diagnostics().is_empty());
        assert_eq!(graph.len(), BUILTIN_SCALARS.len());
    }

    #[test]
    fn test_load_directory_merges_documents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"types": [{"name": "Animal", "kind": "INTERFACE"}]}"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/b.json"),
            r#"{"types": [{"name": "Dog", "kind": "OBJECT", "implements": ["Animal"]}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let graph = load_from_path(dir.path(), &LoadConfig::default()).unwrap();
        let dog = graph.node("Dog").unwrap();
        assert_eq!(graph.implements(dog).len(), 1);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(dir.path(), &LoadConfig::default()).is_err());
    }
}
