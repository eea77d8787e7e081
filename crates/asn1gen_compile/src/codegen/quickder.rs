//! Back end generating Quick-DER C headers.
//!
//! Two things are generated for each type assignment of a module:
//!
//! ```text
//! #define DER_PACK_unit_SyntaxDeclSym \
//!         DER_PACK_ENTER | ..., \
//!         ..., \
//!         DER_PACK_LEAVE, \
//!         DER_PACK_END
//! ```
//!
//! a walking path for the `der_pack()`/`der_unpack()` instructions, and an
//! overlay struct labelling the unpacked cursors:
//!
//! ```text
//! typedef struct {
//!     dercursor field1;
//!     struct unit_EmbeddedSym_ovly field2;
//! } unit_SyntaxDeclSym_ovly;
//! ```
//!
//! The unit prefix is the sanitized module name, so `rfc5280.asn1` output is
//! included as `rfc5280.h` by C code. Assignments are emitted in dependency
//! order so every overlay refers only to typedefs above it; value
//! assignments emit nothing in this back end.

use asn1gen_language::analysis::dependency_sort;
use asn1gen_language::sema::{
    Assignment, CollectionKind, ComponentType, ConstructedKind, Module, TagClass, TypeAssignment,
    TypeNode,
};
use std::io::Write;

use super::{Backend, GenError};
use crate::keywords::sanitize_c_identifier;
use crate::writer::CodeWriter;

/// The line-comment prefix of the emitted language.
pub const COMMENT_PREFIX: &str = "//";

/// Output filename for a module in split mode.
pub fn output_name(module: &Module) -> String {
    format!("{}.h", sanitize_c_identifier(&module.name))
}

/// Generates a Quick-DER C header for one module.
pub struct QuickDerBackend<'a, W: Write> {
    module: &'a Module,
    referenced: &'a [Module],
    unit: String,
    writer: CodeWriter<W>,
}

impl<'a, W: Write> QuickDerBackend<'a, W> {
    pub fn new(module: &'a Module, out: W, referenced: &'a [Module]) -> Self {
        QuickDerBackend {
            module,
            referenced,
            unit: sanitize_c_identifier(&module.name),
            writer: CodeWriter::with_indent_size(out, 4),
        }
    }

    fn emit_module(&mut self) -> Result<(), GenError> {
        self.emit_head()?;
        self.emit_overlays()?;
        self.emit_pack_paths()?;
        self.emit_tail()?;
        Ok(())
    }

    fn emit_head(&mut self) -> Result<(), GenError> {
        self.writer.write_line(&format!(
            "/* Quick-DER declarations for {} */",
            self.module.name
        ))?;
        self.writer.write_blanks(1)?;
        self.writer.write_line("#include <quick-der/api.h>")?;
        self.writer.write_blanks(1)?;
        self.writer
            .write_line(&format!("/* This module {} depends on:", self.unit))?;
        let mut dependency_count = 0;
        for module in self.referenced {
            if module.name != self.module.name {
                self.writer
                    .write_line(&format!(" *   {}", sanitize_c_identifier(&module.name)))?;
                dependency_count += 1;
            }
        }
        if dependency_count == 0 {
            self.writer.write_line(" *   (no other modules)")?;
        }
        self.writer.write_line(" */")?;
        self.writer.write_blanks(1)?;
        Ok(())
    }

    fn emit_tail(&mut self) -> Result<(), GenError> {
        self.writer.write_blanks(1)?;
        self.writer.write_line(&format!(
            "/* Quick-DER declarations for {} end here */",
            self.module.name
        ))?;
        Ok(())
    }

    /// Overlay structures with ASN.1 derived nesting and labelling.
    fn emit_overlays(&mut self) -> Result<(), GenError> {
        self.writer
            .write_line("/* Overlay structures with ASN.1 derived nesting and labelling */")?;
        self.writer.write_blanks(1)?;
        for component in dependency_sort(self.module) {
            for assignment in component {
                if let Assignment::Type(type_assignment) = assignment {
                    let typedef = self.overlay_typedef(type_assignment)?;
                    self.writer.write_block(&typedef)?;
                    self.writer.write_blanks(1)?;
                }
            }
        }
        Ok(())
    }

    /// Parser walking paths in terms of DER bytecode instructions.
    fn emit_pack_paths(&mut self) -> Result<(), GenError> {
        self.writer.write_blanks(1)?;
        self.writer
            .write_line("/* Parser definitions in terms of ASN.1 derived bytecode instructions */")?;
        self.writer.write_blanks(1)?;
        for component in dependency_sort(self.module) {
            for assignment in component {
                if let Assignment::Type(type_assignment) = assignment {
                    let path = self.pack_define(type_assignment)?;
                    self.writer.write_block(&path)?;
                    self.writer.write_blanks(1)?;
                }
            }
        }
        Ok(())
    }

    // -- overlays -----------------------------------------------------------

    fn overlay_typedef(&self, assignment: &TypeAssignment) -> Result<String, GenError> {
        let overlay = self.overlay_expr(&assignment.type_decl)?;
        Ok(format!(
            "typedef {} {}_{}_ovly;",
            overlay,
            self.unit,
            sanitize_c_identifier(&assignment.name)
        ))
    }

    /// The C type overlaying one ASN.1 type: `dercursor` for every leaf,
    /// nested structs for constructed types, the referenced overlay typedef
    /// for defined types.
    fn overlay_expr(&self, t: &TypeNode) -> Result<String, GenError> {
        match t {
            TypeNode::Simple(_)
            | TypeNode::ValueList(_)
            | TypeNode::BitString(_)
            | TypeNode::Collection(_) => Ok("dercursor".to_string()),
            TypeNode::Tagged(tagged) => self.overlay_expr(&tagged.type_decl),
            TypeNode::Defined(defined) => {
                let unit = match &defined.module_ref {
                    Some(module) => sanitize_c_identifier(module),
                    None => self.unit.clone(),
                };
                Ok(format!(
                    "{}_{}_ovly",
                    unit,
                    sanitize_c_identifier(&defined.type_name)
                ))
            }
            TypeNode::Selection(selection) => {
                let member = self
                    .module
                    .resolve_selection_type(selection, self.referenced)?;
                self.overlay_expr(&member.type_decl)
            }
            TypeNode::Constructed(constructed) => {
                let mut fragment = self.writer.fragment();
                fragment.write_line("struct {")?;
                fragment.push_indent();
                self.overlay_members(&constructed.components, &mut fragment)?;
                fragment.pop_indent();
                // No trailing newline so the typedef name lands on this line.
                Ok(format!("{}}}", fragment.into_string()))
            }
        }
    }

    fn overlay_members(
        &self,
        components: &[ComponentType],
        fragment: &mut crate::writer::Fragment,
    ) -> Result<(), GenError> {
        for component in components {
            match component {
                ComponentType::Named(named)
                | ComponentType::Optional(named)
                | ComponentType::Defaulted(named, _) => {
                    let member_type = self.overlay_expr(&named.type_decl)?;
                    fragment.write_block(&format!(
                        "{} {};",
                        member_type,
                        sanitize_c_identifier(&named.identifier)
                    ))?;
                }
                ComponentType::ComponentsOf(referent) => {
                    let included = self
                        .module
                        .resolve_components_of(referent, self.referenced)?;
                    self.overlay_members(included, fragment)?;
                }
                ComponentType::ExtensionMarker => {}
            }
        }
        Ok(())
    }

    // -- pack paths ---------------------------------------------------------

    fn pack_define(&self, assignment: &TypeAssignment) -> Result<String, GenError> {
        let mut instructions = Vec::new();
        self.pack_node(&assignment.type_decl, &mut instructions)?;
        instructions.push("DER_PACK_END".to_string());

        let mut lines = vec![format!(
            "#define DER_PACK_{}_{} \\",
            self.unit,
            sanitize_c_identifier(&assignment.name)
        )];
        let last = instructions.len() - 1;
        for (position, instruction) in instructions.iter().enumerate() {
            if position == last {
                lines.push(format!("    {}", instruction));
            } else {
                lines.push(format!("    {}, \\", instruction));
            }
        }
        Ok(lines.join("\n"))
    }

    fn pack_node(&self, t: &TypeNode, out: &mut Vec<String>) -> Result<(), GenError> {
        match t {
            TypeNode::Simple(simple) => {
                out.push(format!(
                    "DER_PACK_STORE | DER_TAG_{}",
                    der_tag_name(&simple.type_name)
                ));
                Ok(())
            }
            TypeNode::ValueList(list) => {
                out.push(format!(
                    "DER_PACK_STORE | DER_TAG_{}",
                    der_tag_name(&list.type_name)
                ));
                Ok(())
            }
            TypeNode::BitString(_) => {
                out.push("DER_PACK_STORE | DER_TAG_BIT_STRING".to_string());
                Ok(())
            }
            TypeNode::Defined(defined) => {
                let unit = match &defined.module_ref {
                    Some(module) => sanitize_c_identifier(module),
                    None => self.unit.clone(),
                };
                out.push(format!(
                    "DER_PACK_{}_{}",
                    unit,
                    sanitize_c_identifier(&defined.type_name)
                ));
                Ok(())
            }
            TypeNode::Tagged(tagged) => {
                out.push(format!(
                    "DER_PACK_ENTER | DER_{}_TAG({})",
                    der_tag_class(tagged.class),
                    tagged.class_number
                ));
                self.pack_node(&tagged.type_decl, out)?;
                out.push("DER_PACK_LEAVE".to_string());
                Ok(())
            }
            TypeNode::Selection(selection) => {
                let member = self
                    .module
                    .resolve_selection_type(selection, self.referenced)?;
                self.pack_node(&member.type_decl, out)
            }
            TypeNode::Collection(collection) => {
                // Variable-sized content is stored whole for iteration.
                let tag = match collection.kind {
                    CollectionKind::SequenceOf => "DER_TAG_SEQUENCE",
                    CollectionKind::SetOf => "DER_TAG_SET",
                };
                out.push(format!("DER_PACK_STORE | {}", tag));
                Ok(())
            }
            TypeNode::Constructed(constructed) => match constructed.kind {
                ConstructedKind::Sequence => {
                    out.push("DER_PACK_ENTER | DER_TAG_SEQUENCE".to_string());
                    self.pack_components(&constructed.components, out)?;
                    out.push("DER_PACK_LEAVE".to_string());
                    Ok(())
                }
                ConstructedKind::Set => {
                    out.push("DER_PACK_ENTER | DER_TAG_SET".to_string());
                    self.pack_components(&constructed.components, out)?;
                    out.push("DER_PACK_LEAVE".to_string());
                    Ok(())
                }
                ConstructedKind::Choice => {
                    out.push("DER_PACK_CHOICE_BEGIN".to_string());
                    self.pack_components(&constructed.components, out)?;
                    out.push("DER_PACK_CHOICE_END".to_string());
                    Ok(())
                }
            },
        }
    }

    fn pack_components(
        &self,
        components: &[ComponentType],
        out: &mut Vec<String>,
    ) -> Result<(), GenError> {
        for component in components {
            match component {
                ComponentType::Named(named) => self.pack_node(&named.type_decl, out)?,
                // Defaulted components may be absent on the wire, like
                // optional ones.
                ComponentType::Optional(named) | ComponentType::Defaulted(named, _) => {
                    out.push("DER_PACK_OPTIONAL".to_string());
                    self.pack_node(&named.type_decl, out)?;
                }
                ComponentType::ComponentsOf(referent) => {
                    let included = self
                        .module
                        .resolve_components_of(referent, self.referenced)?;
                    self.pack_components(included, out)?;
                }
                ComponentType::ExtensionMarker => {}
            }
        }
        Ok(())
    }
}

impl<'a, W: Write> Backend for QuickDerBackend<'a, W> {
    fn generate_code(&mut self) -> Result<(), GenError> {
        self.emit_module()
    }
}

fn der_tag_name(type_name: &str) -> String {
    sanitize_c_identifier(type_name).to_uppercase()
}

fn der_tag_class(class: TagClass) -> &'static str {
    match class {
        TagClass::Universal => "UNIVERSAL",
        TagClass::Application => "APPLICATION",
        TagClass::Private => "PRIVATE",
        TagClass::Context => "CONTEXT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asn1gen_language::{build_semantic_model, parse_asn1};

    fn generate(source: &str) -> String {
        let tree = parse_asn1(source).expect("parse failed");
        let modules = build_semantic_model(&tree).expect("sema failed");
        let mut out = Vec::new();
        QuickDerBackend::new(&modules[0], &mut out, &modules)
            .generate_code()
            .expect("codegen failed");
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn header_includes_api_and_dependencies() {
        let output = generate("M DEFINITIONS ::= BEGIN A ::= INTEGER END");
        assert!(output.contains("#include <quick-der/api.h>"));
        assert!(output.contains("(no other modules)"));
    }

    #[test]
    fn simple_overlay_is_a_cursor() {
        let output = generate("M DEFINITIONS ::= BEGIN A ::= INTEGER END");
        assert!(output.contains("typedef dercursor M_A_ovly;"));
    }

    #[test]
    fn constructed_overlay_nests_members() {
        let output = generate(
            "M DEFINITIONS ::= BEGIN S ::= SEQUENCE { a INTEGER, b OCTET STRING } END",
        );
        assert!(output.contains("typedef struct {"));
        assert!(output.contains("    dercursor a;"));
        assert!(output.contains("    dercursor b;"));
        assert!(output.contains("} M_S_ovly;"));
    }

    #[test]
    fn defined_overlay_uses_referenced_typedef() {
        let output = generate(
            "M DEFINITIONS ::= BEGIN A ::= SEQUENCE { b B } B ::= INTEGER END",
        );
        assert!(output.contains("    M_B_ovly b;"));
        // Dependency order puts the referenced typedef first.
        let b_typedef = output.find("typedef dercursor M_B_ovly;").unwrap();
        let a_typedef = output.find("} M_A_ovly;").unwrap();
        assert!(b_typedef < a_typedef);
    }

    #[test]
    fn pack_path_for_sequence() {
        let output = generate(
            "M DEFINITIONS ::= BEGIN S ::= SEQUENCE { a INTEGER, b BOOLEAN OPTIONAL } END",
        );
        assert!(output.contains("#define DER_PACK_M_S \\"));
        assert!(output.contains("DER_PACK_ENTER | DER_TAG_SEQUENCE"));
        assert!(output.contains("DER_PACK_STORE | DER_TAG_INTEGER"));
        assert!(output.contains("DER_PACK_OPTIONAL"));
        assert!(output.contains("DER_PACK_LEAVE"));
        assert!(output.trim_end().ends_with("/* Quick-DER declarations for M end here */"));
    }

    #[test]
    fn pack_path_terminates_with_end() {
        let output = generate("M DEFINITIONS ::= BEGIN A ::= INTEGER END");
        let define = output.find("#define DER_PACK_M_A").unwrap();
        let tail = &output[define..];
        assert!(tail.contains("DER_PACK_END"));
    }

    #[test]
    fn choice_path_is_bracketed() {
        let output = generate(
            "M DEFINITIONS ::= BEGIN C ::= CHOICE { a INTEGER, b BOOLEAN } END",
        );
        assert!(output.contains("DER_PACK_CHOICE_BEGIN"));
        assert!(output.contains("DER_PACK_CHOICE_END"));
    }

    #[test]
    fn tagged_path_enters_and_leaves() {
        let output =
            generate("M DEFINITIONS ::= BEGIN T ::= [APPLICATION 3] INTEGER END");
        assert!(output.contains("DER_PACK_ENTER | DER_APPLICATION_TAG(3)"));
        assert!(output.contains("DER_PACK_LEAVE"));
    }

    #[test]
    fn context_tag_is_the_default_class() {
        let output = generate("M DEFINITIONS ::= BEGIN T ::= [0] INTEGER END");
        assert!(output.contains("DER_PACK_ENTER | DER_CONTEXT_TAG(0)"));
    }

    #[test]
    fn collections_store_whole_content() {
        let output = generate(
            "M DEFINITIONS ::= BEGIN
                L ::= SEQUENCE OF INTEGER
                S ::= SET OF INTEGER
            END",
        );
        assert!(output.contains("DER_PACK_STORE | DER_TAG_SEQUENCE"));
        assert!(output.contains("DER_PACK_STORE | DER_TAG_SET"));
    }

    #[test]
    fn multi_word_builtins_use_underscored_tags() {
        let output = generate("M DEFINITIONS ::= BEGIN K ::= OCTET STRING END");
        assert!(output.contains("DER_PACK_STORE | DER_TAG_OCTET_STRING"));
    }

    #[test]
    fn components_of_expands_in_overlay_and_pack() {
        let output = generate(
            "M DEFINITIONS ::= BEGIN
                A ::= SEQUENCE { COMPONENTS OF B }
                B ::= SEQUENCE { x INTEGER, y BOOLEAN }
            END",
        );
        let a_typedef_end = output.find("} M_A_ovly;").unwrap();
        let a_typedef_start = output[..a_typedef_end].rfind("typedef struct {").unwrap();
        let a_overlay = &output[a_typedef_start..a_typedef_end];
        assert!(a_overlay.contains("dercursor x;"));
        assert!(a_overlay.contains("dercursor y;"));

        let a_define = output.find("#define DER_PACK_M_A").unwrap();
        let a_path_end = output[a_define..].find("DER_PACK_END").unwrap() + a_define;
        let a_path = &output[a_define..a_path_end];
        assert_eq!(a_path.matches("DER_TAG_INTEGER").count(), 1);
        assert_eq!(a_path.matches("DER_TAG_BOOLEAN").count(), 1);
    }

    #[test]
    fn value_assignments_emit_nothing() {
        let output = generate("M DEFINITIONS ::= BEGIN answer INTEGER ::= 42 END");
        assert!(!output.contains("answer"));
        assert!(!output.contains("42"));
    }

    #[test]
    fn c_keywords_are_escaped() {
        let output = generate(
            "M DEFINITIONS ::= BEGIN S ::= SEQUENCE { union BOOLEAN } END",
        );
        assert!(output.contains("dercursor union_;"));
    }

    #[test]
    fn hyphenated_module_names_sanitize_into_unit() {
        let output = generate("My-Module DEFINITIONS ::= BEGIN A ::= INTEGER END");
        assert!(output.contains("typedef dercursor My_Module_A_ovly;"));
        assert!(output.contains("#define DER_PACK_My_Module_A"));
    }
}
