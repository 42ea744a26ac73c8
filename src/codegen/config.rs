//! Layout Configuration
//!
//! Naming and enable-flag knobs consumed read-only by code generation:
//! - `FamilyToggles`: which abstraction families survive pruning
//! - `Decorations`: prefix/postfix per family, used only to name things
//! - `ArgumentNames`: names of generated configurator parameters
//! - `ScalarMappings`: schema scalar -> emitted type name
//!
//! Key principle: derivation is configuration-agnostic. Toggles are applied
//! as a filter after every plan is computed, decorations only rename.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::names::capitalize;
use crate::error::{GenError, Result};

// =============================================================================
// Layout Configuration
// =============================================================================

/// Everything code generation reads from configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfiguration {
    /// Enable flags per abstraction family
    pub families: FamilyToggles,

    /// Prefix/postfix per abstraction family
    pub decorations: Decorations,

    /// Configurator parameter names
    pub arguments: ArgumentNames,

    /// Scalar type mapping for emitted code
    pub scalars: ScalarMappings,
}

/// Enable flags; `enabled = false` turns every family off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyToggles {
    pub enabled: bool,
    pub entity: bool,
    pub projection: bool,
    /// Selection abstractions and their composite queries
    pub selection: bool,
    pub qualification: bool,
    pub qualified_projection: bool,
}

impl Default for FamilyToggles {
    fn default() -> Self {
        Self {
            enabled: true,
            entity: true,
            projection: true,
            selection: true,
            qualification: true,
            qualified_projection: true,
        }
    }
}

/// Prefix/postfix naming template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postfix: Option<String>,
}

impl Decoration {
    pub fn postfix(postfix: &str) -> Self {
        Self { prefix: None, postfix: Some(postfix.to_string()) }
    }

    pub fn prefix(prefix: &str) -> Self {
        Self { prefix: Some(prefix.to_string()), postfix: None }
    }

    /// Decorate a name. A prefix capitalizes the name it precedes
    /// (`on` + `dog` -> `onDog`).
    pub fn apply(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 24);
        match &self.prefix {
            Some(prefix) => {
                out.push_str(prefix);
                out.push_str(&capitalize(name));
            }
            None => out.push_str(name),
        }
        if let Some(postfix) = &self.postfix {
            out.push_str(postfix);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_none() && self.postfix.is_none()
    }
}

/// Decorations per family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decorations {
    pub entity: Decoration,
    pub projection: Decoration,
    pub qualification: Decoration,
    pub qualified_projection: Decoration,
    /// Per-subtype member of a qualification
    pub on_subtype: Decoration,
    pub selection: Decoration,
    pub query: Decoration,
}

impl Default for Decorations {
    fn default() -> Self {
        Self {
            entity: Decoration::default(),
            projection: Decoration::postfix("Projection"),
            qualification: Decoration::postfix("Qualification"),
            qualified_projection: Decoration::postfix("QualifiedProjection"),
            on_subtype: Decoration::prefix("on"),
            selection: Decoration::postfix("Selection"),
            query: Decoration::postfix("Query"),
        }
    }
}

/// Names of generated configurator parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentNames {
    /// Nested projection configurator (`onDog(__projection)`)
    pub projection_argument: String,
    /// Composite query configurator of a selectable field
    pub query_argument: String,
}

impl Default for ArgumentNames {
    fn default() -> Self {
        Self {
            projection_argument: "__projection".to_string(),
            query_argument: "__query".to_string(),
        }
    }
}

/// Schema scalar -> emitted type name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarMappings {
    pub types: IndexMap<String, String>,
    /// Used for scalars with no mapping
    pub fallback: String,
}

impl Default for ScalarMappings {
    fn default() -> Self {
        let types = [
            ("ID", "String"),
            ("String", "String"),
            ("Int", "i32"),
            ("Float", "f64"),
            ("Boolean", "bool"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self { types, fallback: "serde_json::Value".to_string() }
    }
}

impl ScalarMappings {
    /// Mapped type of a scalar. Config sources may lowercase keys, so an
    /// exact match is tried first and a case-insensitive one second.
    pub fn get(&self, scalar: &str) -> &str {
        self.types
            .get(scalar)
            .or_else(|| {
                self.types
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(scalar))
                    .map(|(_, ty)| ty)
            })
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

// =============================================================================
// Validation
// =============================================================================

impl LayoutConfiguration {
    /// Reject configurations that would produce unusable names.
    ///
    /// Runs before any derivation work.
    pub fn validate(&self) -> Result<()> {
        let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .map_err(|e| GenError::Config(e.to_string()))?;
        let fragment = Regex::new(r"^[A-Za-z0-9_]+$")
            .map_err(|e| GenError::Config(e.to_string()))?;

        let arguments = [
            ("arguments.projection_argument", &self.arguments.projection_argument),
            ("arguments.query_argument", &self.arguments.query_argument),
        ];
        for (key, value) in arguments {
            if !identifier.is_match(value) {
                return Err(GenError::Config(format!(
                    "{} must be an identifier, got '{}'",
                    key, value
                )));
            }
        }
        if self.arguments.projection_argument == self.arguments.query_argument {
            return Err(GenError::Config(format!(
                "arguments.projection_argument and arguments.query_argument are both '{}'",
                self.arguments.query_argument
            )));
        }

        let decorations = self.decorations.named();
        for (family, decoration) in &decorations {
            // A prefix starts the generated name, a postfix only extends it
            if let Some(prefix) = &decoration.prefix {
                if !identifier.is_match(prefix) {
                    return Err(GenError::Config(format!(
                        "decorations.{}.prefix must start an identifier, got '{}'",
                        family, prefix
                    )));
                }
            }
            if let Some(postfix) = &decoration.postfix {
                if !fragment.is_match(postfix) {
                    return Err(GenError::Config(format!(
                        "decorations.{}.postfix must be a non-empty name fragment, got '{}'",
                        family, postfix
                    )));
                }
            }
        }

        if self.decorations.on_subtype.is_empty() {
            return Err(GenError::Config(
                "decorations.on_subtype needs a prefix or postfix".to_string(),
            ));
        }

        // Node-level names share one namespace, field-level names another
        let node_level = ["entity", "projection", "qualification", "qualified_projection"];
        let field_level = ["selection", "query"];
        for group in [&node_level[..], &field_level[..]] {
            for (i, a) in group.iter().enumerate() {
                for b in &group[i + 1..] {
                    if self.decorations.by_name(a) == self.decorations.by_name(b) {
                        return Err(GenError::Config(format!(
                            "decorations.{} and decorations.{} are identical; generated names would collide",
                            a, b
                        )));
                    }
                }
            }
        }

        if self.scalars.fallback.trim().is_empty() {
            return Err(GenError::Config("scalars.fallback must not be empty".to_string()));
        }
        if let Some((scalar, _)) = self.scalars.types.iter().find(|(_, ty)| ty.trim().is_empty()) {
            return Err(GenError::Config(format!("scalars.types.{} must not be empty", scalar)));
        }

        Ok(())
    }
}

impl Decorations {
    fn named(&self) -> [(&'static str, &Decoration); 7] {
        [
            ("entity", &self.entity),
            ("projection", &self.projection),
            ("qualification", &self.qualification),
            ("qualified_projection", &self.qualified_projection),
            ("on_subtype", &self.on_subtype),
            ("selection", &self.selection),
            ("query", &self.query),
        ]
    }

    fn by_name(&self, family: &str) -> Option<&Decoration> {
        self.named().into_iter().find(|(name, _)| *name == family).map(|(_, d)| d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_decorations() {
        let decorations = Decorations::default();
        assert_eq!(decorations.entity.apply("Animal"), "Animal");
        assert_eq!(decorations.projection.apply("Animal"), "AnimalProjection");
        assert_eq!(
            decorations.qualified_projection.apply("Animal"),
            "AnimalQualifiedProjection"
        );
        assert_eq!(decorations.on_subtype.apply("Dog"), "onDog");
    }

    #[test]
    fn test_prefix_capitalizes() {
        let decoration = Decoration {
            prefix: Some("Gen".to_string()),
            postfix: Some("Dto".to_string()),
        };
        assert_eq!(decoration.apply("person"), "GenPersonDto");
        assert_eq!(Decoration::default().apply("person"), "person");
    }

    #[test]
    fn test_default_validates() {
        assert!(LayoutConfiguration::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_argument_name() {
        let mut layout = LayoutConfiguration::default();
        layout.arguments.query_argument = "9query".to_string();
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("arguments.query_argument"));

        layout.arguments.query_argument = String::new();
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_fragment() {
        let mut layout = LayoutConfiguration::default();
        layout.decorations.selection.postfix = Some(String::new());
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("decorations.selection.postfix"));

        layout.decorations.selection.postfix = Some("Sel-ection".to_string());
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_rejects_prefix_starting_with_digit() {
        let mut layout = LayoutConfiguration::default();
        layout.decorations.entity = Decoration::prefix("9");
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("decorations.entity.prefix"));

        // Digits are fine once the name has started
        let mut layout = LayoutConfiguration::default();
        layout.decorations.entity = Decoration::prefix("v2");
        layout.decorations.selection = Decoration::postfix("2");
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_rejects_colliding_families() {
        let mut layout = LayoutConfiguration::default();
        layout.decorations.qualification = Decoration::postfix("Projection");
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("would collide"));

        // Entity undecorated and projection undecorated collide too
        let mut layout = LayoutConfiguration::default();
        layout.decorations.projection = Decoration::default();
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_on_subtype() {
        let mut layout = LayoutConfiguration::default();
        layout.decorations.on_subtype = Decoration::default();
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_scalar_mapping_fallback() {
        let scalars = ScalarMappings::default();
        assert_eq!(scalars.get("Int"), "i32");
        assert_eq!(scalars.get("DateTime"), "serde_json::Value");

        let mut lowered = ScalarMappings::default();
        lowered.types.insert("datetime".to_string(), "String".to_string());
        assert_eq!(lowered.get("DateTime"), "String");
    }

    #[test]
    fn test_deserialize_partial() {
        let layout: LayoutConfiguration = toml::from_str(
            r#"
            [families]
            qualification = false

            [decorations.projection]
            postfix = "Proj"
            "#,
        )
        .unwrap();

        assert!(!layout.families.qualification);
        assert!(layout.families.entity);
        assert_eq!(layout.decorations.projection.apply("Dog"), "DogProj");
        assert_eq!(layout.decorations.query, Decoration::postfix("Query"));
        assert_eq!(layout.arguments.projection_argument, "__projection");
    }
}
