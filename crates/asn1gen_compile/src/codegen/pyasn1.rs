//! Back end generating pyasn1 declarations.
//!
//! Pyasn1 represents type assignments as class derivation:
//!
//! ```text
//! # Foo ::= INTEGER
//! class Foo(univ.Integer):
//!     pass
//! ```
//!
//! For constructed types the component types are instantiated inline. To
//! cope with circular references, every dependency component is emitted in
//! two passes: first a *declaration* (the empty class) for each assignment,
//! then a *definition* populating its members:
//!
//! ```text
//! class Seq(univ.Sequence):
//!     pass
//!
//! Seq.componentType = namedtype.NamedTypes(
//!     namedtype.NamedType('foo', univ.Integer())
//! )
//! ```
//!
//! Separating the introduction of a name from the details of what it
//! contains lets recursive definitions resolve against already-declared
//! names. Nested types that need no name of their own are emitted as
//! *inline definitions* (the `univ.Integer()` above).

use asn1gen_language::analysis::dependency_sort;
use asn1gen_language::sema::{
    Assignment, ComponentType, Constraint, Module, NamedValue, NodeRef, RangeBound,
    ResolvedImplicitness, TagClass, TaggedType, TypeAssignment, TypeNode, ValueAssignment,
    ValueNode,
};
use std::io::Write;

use super::{Backend, GenError};
use crate::keywords::{sanitize_python_identifier, sanitize_python_module};
use crate::writer::CodeWriter;

/// The line-comment prefix of the emitted language.
pub const COMMENT_PREFIX: &str = "#";

/// Output filename for a module in split mode.
pub fn output_name(module: &Module) -> String {
    format!("{}.py", sanitize_python_module(&module.name))
}

/// Generates pyasn1 class declarations for one module.
pub struct Pyasn1Backend<'a, W: Write> {
    module: &'a Module,
    referenced: &'a [Module],
    writer: CodeWriter<W>,
}

impl<'a, W: Write> Pyasn1Backend<'a, W> {
    pub fn new(module: &'a Module, out: W, referenced: &'a [Module]) -> Self {
        Pyasn1Backend {
            module,
            referenced,
            writer: CodeWriter::new(out),
        }
    }

    fn emit_module(&mut self) -> Result<(), GenError> {
        self.writer.write_line(
            "from pyasn1.type import univ, char, namedtype, namedval, tag, constraint, useful",
        )?;
        for module in self.referenced {
            if module.name != self.module.name {
                self.writer
                    .write_line(&format!("import {}", sanitize_python_module(&module.name)))?;
            }
        }
        self.writer.write_blanks(2)?;

        let has_oid_values = self
            .module
            .descendants()
            .any(|node| matches!(node, NodeRef::Value(ValueNode::ObjectIdentifier(_))));
        if has_oid_values {
            let helper = self.oid_helper();
            self.writer.write_block(&helper)?;
            self.writer.write_blanks(2)?;
        }

        for component in dependency_sort(self.module) {
            for &assignment in &component {
                let declaration = self.decl(assignment)?;
                self.writer.write_block(&declaration)?;
                self.writer.write_blanks(2)?;
            }
            for &assignment in &component {
                if let Some(definition) = self.defn(assignment)? {
                    self.writer.write_block(&definition)?;
                    self.writer.write_blanks(2)?;
                }
            }
        }
        Ok(())
    }

    // -- declarations -------------------------------------------------------

    fn decl(&self, assignment: &Assignment) -> Result<String, GenError> {
        match assignment {
            Assignment::Type(type_assignment) => self.decl_type_assignment(type_assignment),
            Assignment::Value(value_assignment) => self.decl_value_assignment(value_assignment),
        }
    }

    fn decl_type_assignment(&self, assignment: &TypeAssignment) -> Result<String, GenError> {
        let base_decl: &TypeNode = match &assignment.type_decl {
            TypeNode::Selection(selection) => {
                &self
                    .module
                    .resolve_selection_type(selection, self.referenced)?
                    .type_decl
            }
            other => other,
        };
        let assigned_type = translate_type(&assignment.name);
        let base_type = translate_type(base_decl.type_name());

        let mut fragment = self.writer.fragment();
        fragment.write_line(&format!("class {}({}):", assigned_type, base_type))?;
        fragment.push_indent();
        fragment.write_line("pass")?;
        fragment.pop_indent();
        Ok(fragment.into_string())
    }

    fn decl_value_assignment(&self, assignment: &ValueAssignment) -> Result<String, GenError> {
        let assigned_value = sanitize_python_identifier(&assignment.name);
        let construct_expr =
            self.value_construct_expr(&assignment.type_decl, &assignment.value)?;
        Ok(format!("{} = {}", assigned_value, construct_expr))
    }

    // -- definitions --------------------------------------------------------

    fn defn(&self, assignment: &Assignment) -> Result<Option<String>, GenError> {
        match assignment {
            Assignment::Value(_) => Ok(None),
            Assignment::Type(type_assignment) => {
                let class_name = translate_type(&type_assignment.name);
                self.defn_type(&class_name, &type_assignment.type_decl)
            }
        }
    }

    fn defn_type(&self, class_name: &str, t: &TypeNode) -> Result<Option<String>, GenError> {
        match t {
            TypeNode::Simple(simple) => Ok(match &simple.constraint {
                Some(constraint) => Some(format!(
                    "{}.subtypeSpec = {}",
                    class_name,
                    self.constraint_expr(constraint)?
                )),
                None => None,
            }),
            TypeNode::Defined(_) | TypeNode::Selection(_) => Ok(None),
            TypeNode::Constructed(constructed) => {
                let mut fragment = self.writer.fragment();
                fragment.write_line(&format!(
                    "{}.componentType = namedtype.NamedTypes(",
                    class_name
                ))?;
                fragment.push_indent();
                let components = self.component_exprs(&constructed.components)?;
                fragment.write_block(&components)?;
                fragment.pop_indent();
                fragment.write_line(")")?;
                Ok(Some(fragment.into_string()))
            }
            TypeNode::Collection(collection) => {
                let mut fragment = self.writer.fragment();
                fragment.write_line(&format!(
                    "{}.componentType = {}",
                    class_name,
                    self.expr(&collection.element)?
                ))?;
                if let Some(size) = &collection.size_constraint {
                    fragment.write_line(&format!(
                        "{}.subtypeSpec={}",
                        class_name,
                        self.constraint_expr(size)?
                    ))?;
                }
                Ok(Some(fragment.into_string()))
            }
            TypeNode::Tagged(tagged) => {
                let implicitness = self.module.resolve_tag_implicitness(
                    tagged.implicitness,
                    &tagged.type_decl,
                    self.referenced,
                )?;
                let method = match implicitness {
                    ResolvedImplicitness::Implicit => "tagImplicitly",
                    ResolvedImplicitness::Explicit => "tagExplicitly",
                };
                let base_type = translate_type(tagged.type_decl.type_name());

                let mut fragment = self.writer.fragment();
                fragment.write_line(&format!(
                    "{}.tagSet = {}.tagSet.{}({})",
                    class_name,
                    base_type,
                    method,
                    self.tag_expr(tagged)?
                ))?;
                if let Some(nested) = self.defn_type(class_name, &tagged.type_decl)? {
                    fragment.write_block(&nested)?;
                }
                Ok(Some(fragment.into_string()))
            }
            TypeNode::ValueList(list) => {
                let mut fragment = self.writer.fragment();
                if !list.named_values.is_empty() {
                    fragment.write_line(&format!(
                        "{}.namedValues = namedval.NamedValues(",
                        class_name
                    ))?;
                    fragment.push_indent();
                    fragment.write_enumeration(&named_value_pairs(&list.named_values))?;
                    fragment.pop_indent();
                    fragment.write_line(")")?;
                }
                if let Some(constraint) = &list.constraint {
                    fragment.write_line(&format!(
                        "{}.subtypeSpec={}",
                        class_name,
                        self.constraint_expr(constraint)?
                    ))?;
                }
                Ok(Some(fragment.into_string()))
            }
            TypeNode::BitString(bits) => {
                let mut fragment = self.writer.fragment();
                if !bits.named_bits.is_empty() {
                    fragment.write_line(&format!(
                        "{}.namedValues = namedval.NamedValues(",
                        class_name
                    ))?;
                    fragment.push_indent();
                    fragment.write_enumeration(&named_value_pairs(&bits.named_bits))?;
                    fragment.pop_indent();
                    fragment.write_line(")")?;
                }
                if let Some(constraint) = &bits.constraint {
                    fragment.write_line(&format!(
                        "{}.subtypeSpec={}",
                        class_name,
                        self.constraint_expr(constraint)?
                    ))?;
                }
                Ok(Some(fragment.into_string()))
            }
        }
    }

    // -- inline definitions -------------------------------------------------

    fn expr(&self, t: &TypeNode) -> Result<String, GenError> {
        match t {
            TypeNode::Simple(simple) => {
                let mut type_expr = translate_type(&simple.type_name) + "()";
                if let Some(constraint) = &simple.constraint {
                    type_expr += &format!(
                        ".subtype(subtypeSpec={})",
                        self.constraint_expr(constraint)?
                    );
                }
                Ok(type_expr)
            }
            TypeNode::BitString(bits) => {
                let mut type_expr = translate_type("BIT STRING") + "()";
                if let Some(constraint) = &bits.constraint {
                    type_expr += &format!(
                        ".subtype(subtypeSpec={})",
                        self.constraint_expr(constraint)?
                    );
                }
                Ok(type_expr)
            }
            TypeNode::Defined(defined) => {
                let mut translated = translate_type(&defined.type_name) + "()";
                if let Some(module_ref) = &defined.module_ref {
                    if *module_ref != self.module.name {
                        translated =
                            format!("{}.{}", sanitize_python_module(module_ref), translated);
                    }
                }
                Ok(translated)
            }
            TypeNode::ValueList(list) => {
                let class_name = translate_type(&list.type_name);
                let pairs = named_value_pairs(&list.named_values);
                if pairs.is_empty() {
                    Ok(class_name + "()")
                } else {
                    Ok(format!(
                        "{}(namedValues=namedval.NamedValues({}))",
                        class_name,
                        pairs.join(", ")
                    ))
                }
            }
            TypeNode::Constructed(constructed) => {
                let class_name = translate_type(constructed.kind.type_name());
                let mut fragment = self.writer.fragment();
                fragment.write_line(&format!(
                    "{}(componentType=namedtype.NamedTypes(",
                    class_name
                ))?;
                fragment.push_indent();
                let components = self.component_exprs(&constructed.components)?;
                fragment.write_block(&components)?;
                fragment.pop_indent();
                fragment.write_line("))")?;
                Ok(fragment.into_string())
            }
            TypeNode::Collection(collection) => {
                let class_name = translate_type(collection.kind.type_name());
                let mut expr = format!(
                    "{}(componentType={})",
                    class_name,
                    self.expr(&collection.element)?
                );
                if let Some(size) = &collection.size_constraint {
                    expr += &format!(".subtype(subtypeSpec={})", self.constraint_expr(size)?);
                }
                Ok(expr)
            }
            TypeNode::Tagged(tagged) => {
                let implicitness = self.module.resolve_tag_implicitness(
                    tagged.implicitness,
                    &tagged.type_decl,
                    self.referenced,
                )?;
                let keyword = match implicitness {
                    ResolvedImplicitness::Implicit => "implicitTag",
                    ResolvedImplicitness::Explicit => "explicitTag",
                };
                let mut type_expr = self.expr(&tagged.type_decl)?;
                type_expr += &format!(".subtype({}={})", keyword, self.tag_expr(tagged)?);
                Ok(type_expr)
            }
            TypeNode::Selection(selection) => {
                let member = self
                    .module
                    .resolve_selection_type(selection, self.referenced)?;
                self.expr(&member.type_decl)
            }
        }
    }

    fn component_exprs(&self, components: &[ComponentType]) -> Result<String, GenError> {
        let mut exprs = Vec::new();
        for component in components {
            if !matches!(component, ComponentType::ExtensionMarker) {
                exprs.push(self.component_expr(component)?);
            }
        }
        let mut fragment = self.writer.fragment();
        fragment.write_enumeration(&exprs)?;
        Ok(fragment.into_string())
    }

    fn component_expr(&self, component: &ComponentType) -> Result<String, GenError> {
        match component {
            ComponentType::ComponentsOf(referent) => {
                // COMPONENTS OF works like a literal include: expand all
                // components of the resolved referent in place.
                let included = self
                    .module
                    .resolve_components_of(referent, self.referenced)?;
                let content = self.component_exprs(included)?;
                Ok(content.trim().to_string())
            }
            ComponentType::Optional(named) => Ok(format!(
                "namedtype.OptionalNamedType('{}', {})",
                named.identifier,
                self.expr(&named.type_decl)?
            )),
            ComponentType::Defaulted(named, default) => {
                let mut type_expr = self.expr(&named.type_decl)?;
                type_expr += &format!(".subtype(value={})", self.translate_value(default));
                Ok(format!(
                    "namedtype.DefaultedNamedType('{}', {})",
                    named.identifier, type_expr
                ))
            }
            ComponentType::Named(named) => Ok(format!(
                "namedtype.NamedType('{}', {})",
                named.identifier,
                self.expr(&named.type_decl)?
            )),
            ComponentType::ExtensionMarker => Ok(String::new()),
        }
    }

    // -- tags, constraints and values ---------------------------------------

    fn tag_expr(&self, tagged: &TaggedType) -> Result<String, GenError> {
        let context = match tagged.class {
            TagClass::Universal => "tag.tagClassUniversal",
            TagClass::Application => "tag.tagClassApplication",
            TagClass::Private => "tag.tagClassPrivate",
            TagClass::Context => "tag.tagClassContext",
        };
        let resolved = self
            .module
            .resolve_type_decl(&tagged.type_decl, self.referenced)?;
        let tag_format = if matches!(resolved, TypeNode::Constructed(_)) {
            "tag.tagFormatConstructed"
        } else {
            "tag.tagFormatSimple"
        };
        Ok(format!(
            "tag.Tag({}, {}, {})",
            context, tag_format, tagged.class_number
        ))
    }

    fn constraint_expr(&self, constraint: &Constraint) -> Result<String, GenError> {
        match constraint {
            Constraint::SingleValue(value) => Ok(format!(
                "constraint.SingleValueConstraint({})",
                self.translate_value(value)
            )),
            Constraint::ValueRange(lower, upper) => Ok(format!(
                "constraint.ValueRangeConstraint({}, {})",
                self.bound_expr(lower),
                self.bound_expr(upper)
            )),
            Constraint::Size(nested) => {
                let (min_value, max_value) = match nested.as_ref() {
                    Constraint::SingleValue(value) => {
                        (self.translate_value(value), self.translate_value(value))
                    }
                    Constraint::ValueRange(lower, upper) => {
                        (self.bound_expr(lower), self.bound_expr(upper))
                    }
                    Constraint::Size(_) => {
                        return Err(GenError::Sema(
                            asn1gen_language::sema::SemaError::UnsupportedConstruct(
                                "nested SIZE constraint".to_string(),
                            ),
                        ))
                    }
                };
                Ok(format!(
                    "constraint.ValueSizeConstraint({}, {})",
                    min_value, max_value
                ))
            }
        }
    }

    fn bound_expr(&self, bound: &RangeBound) -> String {
        match bound {
            RangeBound::Value(value) => self.translate_value(value),
            RangeBound::Min => "MIN".to_string(),
            RangeBound::Max => "MAX".to_string(),
        }
    }

    fn value_construct_expr(
        &self,
        type_decl: &TypeNode,
        value: &ValueNode,
    ) -> Result<String, GenError> {
        if let ValueNode::ObjectIdentifier(components) = value {
            return Ok(self.oid_value_expr(components));
        }
        let value_type = translate_type(type_decl.type_name());
        let root_type = self.module.resolve_type_decl(type_decl, self.referenced)?;
        // bstring and hstring construct differently depending on the target.
        let value_expr = match value {
            ValueNode::BinaryString(bits) if root_type.type_name() == "OCTET STRING" => {
                format!("binValue='{}'", bits)
            }
            ValueNode::BinaryString(bits) => format!("\"'{}'B\"", bits),
            ValueNode::HexString(digits) if root_type.type_name() == "OCTET STRING" => {
                format!("hexValue='{}'", digits)
            }
            ValueNode::HexString(digits) => format!("\"'{}'H\"", digits),
            other => self.translate_value(other),
        };
        Ok(format!("{}({})", value_type, value_expr))
    }

    /// Translates ASN.1 built-in values to Python equivalents; unrecognized
    /// values pass through as (possibly module-qualified) identifiers.
    fn translate_value(&self, value: &ValueNode) -> String {
        match value {
            ValueNode::Boolean(true) => "1".to_string(),
            ValueNode::Boolean(false) => "0".to_string(),
            ValueNode::Integer(number) => number.to_string(),
            ValueNode::Real(lexeme) => lexeme.clone(),
            ValueNode::Null => "NULL".to_string(),
            ValueNode::CharacterString(content) => format!("\"{}\"", content),
            ValueNode::BinaryString(bits) => format!("\"'{}'B\"", bits),
            ValueNode::HexString(digits) => format!("\"'{}'H\"", digits),
            ValueNode::Referenced { module_ref, name } => {
                let sanitized = sanitize_python_identifier(name);
                match module_ref {
                    Some(module) if *module != self.module.name => {
                        format!("{}.{}", sanitize_python_module(module), sanitized)
                    }
                    _ => sanitized,
                }
            }
            ValueNode::ObjectIdentifier(components) => self.oid_value_expr(components),
        }
    }

    fn oid_value_expr(&self, components: &[asn1gen_language::sema::OidComponent]) -> String {
        use asn1gen_language::sema::oids::registered_arc;
        use asn1gen_language::sema::OidComponent;

        let parts: Vec<String> = components
            .iter()
            .map(|component| match component {
                OidComponent::Name(name) => match registered_arc(name) {
                    Some(number) => number.to_string(),
                    None => sanitize_python_identifier(name),
                },
                OidComponent::Number(number) => number.to_string(),
                OidComponent::NameAndNumber(_, number) => number.to_string(),
                OidComponent::Reference { module_ref, name } => {
                    self.translate_value(&ValueNode::Referenced {
                        module_ref: Some(module_ref.clone()),
                        name: name.clone(),
                    })
                }
            })
            .collect();
        format!("_OID({})", parts.join(", "))
    }

    /// The `_OID` helper prepended when the module carries OID values.
    fn oid_helper(&self) -> String {
        [
            "def _OID(*components):",
            "    output = []",
            "    for x in tuple(components):",
            "        if isinstance(x, univ.ObjectIdentifier):",
            "            output.extend(list(x))",
            "        else:",
            "            output.append(int(x))",
            "",
            "    return univ.ObjectIdentifier(output)",
        ]
        .join("\n")
    }
}

impl<'a, W: Write> Backend for Pyasn1Backend<'a, W> {
    fn generate_code(&mut self) -> Result<(), GenError> {
        self.emit_module()
    }
}

/// Named-value and named-bit pairs with extension markers dropped; entries
/// without an explicit number take their ordinal position.
fn named_value_pairs(entries: &[NamedValue]) -> Vec<String> {
    let mut pairs = Vec::new();
    for entry in entries {
        if let NamedValue::Named { identifier, value } = entry {
            let number = value.unwrap_or(pairs.len() as i64);
            pairs.push(format!("('{}', {})", identifier, number));
        }
    }
    pairs
}

/// Translates ASN.1 built-in type names to pyasn1 equivalents; user-defined
/// names are sanitized and pass through.
fn translate_type(type_name: &str) -> String {
    let sanitized = sanitize_python_identifier(type_name);
    let translated = match sanitized.as_str() {
        "ANY" => "univ.Any",
        "INTEGER" => "univ.Integer",
        "BOOLEAN" => "univ.Boolean",
        "NULL" => "univ.Null",
        "ENUMERATED" => "univ.Enumerated",
        "REAL" => "univ.Real",
        "BIT STRING" => "univ.BitString",
        "OCTET STRING" => "univ.OctetString",
        "CHOICE" => "univ.Choice",
        "SEQUENCE" => "univ.Sequence",
        "SET" => "univ.Set",
        "SEQUENCE OF" => "univ.SequenceOf",
        "SET OF" => "univ.SetOf",
        "OBJECT IDENTIFIER" => "univ.ObjectIdentifier",
        "CHARACTER STRING" => "char.UTF8String",
        "UTF8String" => "char.UTF8String",
        "GeneralString" => "char.GeneralString",
        "NumericString" => "char.NumericString",
        "PrintableString" => "char.PrintableString",
        "IA5String" => "char.IA5String",
        "GraphicString" => "char.GraphicString",
        "VisibleString" => "char.VisibleString",
        "ISO646String" => "char.VisibleString",
        "TeletexString" => "char.TeletexString",
        "T61String" => "char.T61String",
        "UniversalString" => "char.UniversalString",
        "BMPString" => "char.BMPString",
        "VideotexString" => "char.VideotexString",
        "GeneralizedTime" => "useful.GeneralizedTime",
        "UTCTime" => "useful.UTCTime",
        "ObjectDescriptor" => "useful.ObjectDescriptor",
        _ => return sanitized,
    };
    translated.to_string()
}
