//! Rust Code Emitter
//!
//! Renders generation plans as Rust trait declarations, one file per node
//! plus a `mod.rs` that declares and re-exports every module.
//!
//! Key constraints:
//! - This module ONLY receives plans + layout, never the schema graph
//! - Scalar types come from `ScalarMappings`
//! - Output stays in memory until `finish`; writing is a separate step
//!
//! Mapping:
//! - every abstraction becomes a trait; supertypes become supertraits
//! - entity properties become `&self` getters
//! - mutable properties become `set_*` methods
//! - defaulted parameters become `Option<..>`
//! - configurators become `Option<&mut dyn FnMut(&mut dyn Target)>`
//! - members marked override are inherited from the supertrait and skipped

use std::fs;
use std::path::{Path, PathBuf};

use super::config::LayoutConfiguration;
use super::names::{escape_keyword, to_snake_case};
use super::plan::{Abstraction, GenerationPlan, Member, Method, Parameter, Property, TypeExpr};
use super::CodeBuilder;
use crate::error::{GenError, Result};

const HEADER: &str = "//! Generated by typed-query-gen - DO NOT EDIT\n";

// =============================================================================
// Output
// =============================================================================

/// One rendered file, path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Write rendered files below `dir`, creating it when missing
pub fn write_files(dir: &Path, files: &[GeneratedFile]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for file in files {
        let path = dir.join(&file.path);
        fs::write(&path, &file.contents)?;
        tracing::debug!(path = %path.display(), "wrote generated file");
    }
    Ok(())
}

// =============================================================================
// Emitter
// =============================================================================

/// Renders plans as Rust traits
pub struct RustEmitter<'l> {
    layout: &'l LayoutConfiguration,
    files: Vec<GeneratedFile>,
    modules: Vec<String>,
}

impl<'l> RustEmitter<'l> {
    pub fn new(layout: &'l LayoutConfiguration) -> Self {
        Self { layout, files: Vec::new(), modules: Vec::new() }
    }

    /// Render one plan to source text
    pub fn render(&self, plan: &GenerationPlan) -> String {
        let mut output = String::new();
        output.push_str(HEADER);
        output.push_str(&format!("//! Abstractions for {} `{}`\n\n", plan.kind, plan.node));
        output.push_str("#[allow(unused_imports)]\nuse super::*;\n");

        for abstraction in &plan.abstractions {
            output.push('\n');
            self.emit_abstraction(&mut output, abstraction);
        }

        output
    }

    fn emit_abstraction(&self, output: &mut String, abstraction: &Abstraction) {
        emit_comments(output, &abstraction.comments, "");

        let supertraits = if abstraction.supertypes.is_empty() {
            String::new()
        } else {
            format!(": {}", abstraction.supertypes.join(" + "))
        };

        let members: Vec<&Member> = abstraction
            .members
            .iter()
            .filter(|m| !is_inherited(m))
            .collect();

        if members.is_empty() {
            output.push_str(&format!("pub trait {}{} {{}}\n", abstraction.name, supertraits));
            return;
        }

        output.push_str(&format!("pub trait {}{} {{\n", abstraction.name, supertraits));
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            match member {
                Member::Property(property) => self.emit_property(output, property),
                Member::Method(method) => self.emit_method(output, method),
            }
        }
        output.push_str("}\n");
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn emit_property(&self, output: &mut String, property: &Property) {
        emit_comments(output, &property.comments, "    ");
        let ty = self.value_type(&property.ty);
        let name = to_snake_case(&property.name);
        if property.is_mutable {
            output.push_str(&format!("    fn set_{}(&mut self, value: {});\n", name, ty));
        } else {
            output.push_str(&format!("    fn {}(&self) -> {};\n", escape_keyword(&name), ty));
        }
    }

    fn emit_method(&self, output: &mut String, method: &Method) {
        emit_comments(output, &method.comments, "    ");
        let mut signature = vec!["&mut self".to_string()];
        signature.extend(method.parameters.iter().map(|p| self.parameter(p)));
        output.push_str(&format!(
            "    fn {}({});\n",
            escape_keyword(&to_snake_case(&method.name)),
            signature.join(", ")
        ));
    }

    fn parameter(&self, parameter: &Parameter) -> String {
        let name = escape_keyword(&to_snake_case(&parameter.name));
        let ty = match &parameter.ty {
            TypeExpr::Configurator { target } => {
                format!("Option<&mut dyn FnMut(&mut dyn {})>", target)
            }
            other => {
                let ty = self.value_type(other);
                // Nullable values already read as "may be omitted"
                if parameter.has_default && !is_nullable(other) {
                    format!("Option<{}>", ty)
                } else {
                    ty
                }
            }
        };
        format!("{}: {}", name, ty)
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn value_type(&self, ty: &TypeExpr) -> String {
        let (inner, list, nullable) = match ty {
            TypeExpr::Scalar { name, list, nullable } => {
                (self.layout.scalars.get(name).to_string(), *list, *nullable)
            }
            TypeExpr::Named { name, list, nullable } => (name.clone(), *list, *nullable),
            TypeExpr::Entity { name, list, nullable } => {
                (format!("Box<dyn {}>", name), *list, *nullable)
            }
            TypeExpr::Configurator { target } => {
                return format!("&mut dyn FnMut(&mut dyn {})", target);
            }
        };

        let ty = if list { format!("Vec<{}>", inner) } else { inner };
        if nullable {
            format!("Option<{}>", ty)
        } else {
            ty
        }
    }
}

impl CodeBuilder for RustEmitter<'_> {
    type Output = Vec<GeneratedFile>;

    fn emit(&mut self, plan: &GenerationPlan) -> Result<()> {
        if plan.is_empty() {
            return Ok(());
        }

        let module = to_snake_case(&plan.node);
        if self.modules.contains(&module) {
            return Err(GenError::generation(
                &plan.node,
                format!("module name '{}' is already taken by another node", module),
            ));
        }
        self.files.push(GeneratedFile {
            path: PathBuf::from(format!("{}.rs", module)),
            contents: self.render(plan),
        });
        self.modules.push(module);
        Ok(())
    }

    fn finish(mut self) -> Self::Output {
        let mut root = String::new();
        root.push_str(HEADER);
        root.push_str("//!\n//! Enum and input types are referenced by schema name and must be in\n");
        root.push_str("//! scope of the parent module.\n\n");
        root.push_str("#[allow(unused_imports)]\nuse super::*;\n\n");
        for module in &self.modules {
            root.push_str(&format!("mod {};\n", escape_keyword(module)));
        }
        if !self.modules.is_empty() {
            root.push('\n');
        }
        for module in &self.modules {
            root.push_str(&format!("pub use {}::*;\n", escape_keyword(module)));
        }

        self.files.push(GeneratedFile { path: PathBuf::from("mod.rs"), contents: root });
        self.files
    }
}

// =============================================================================
// Helper Utilities
// =============================================================================

fn is_inherited(member: &Member) -> bool {
    match member {
        Member::Property(p) => p.is_override,
        Member::Method(m) => m.is_override,
    }
}

fn is_nullable(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Scalar { nullable, .. }
        | TypeExpr::Named { nullable, .. }
        | TypeExpr::Entity { nullable, .. } => *nullable,
        TypeExpr::Configurator { .. } => true,
    }
}

fn emit_comments(output: &mut String, comments: &[String], indent: &str) {
    for comment in comments {
        for line in comment.lines() {
            if line.is_empty() {
                output.push_str(&format!("{}///\n", indent));
            } else {
                output.push_str(&format!("{}/// {}\n", indent, line));
            }
        }
    }
}
