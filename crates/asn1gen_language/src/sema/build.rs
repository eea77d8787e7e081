//! Translation from the tagged parse tree into the semantic model.
//!
//! One factory function per parse-tree tag, dispatched by matching on
//! [`TokenKind`]. Each factory extracts the children the child-layout
//! contract promises, validates their shape, and recursively builds child
//! model nodes. A shape violation means the tree holds a construct the model
//! cannot express and surfaces as [`SemaError::UnsupportedConstruct`].

use super::{
    Assignment, BitStringType, CollectionKind, CollectionType, ComponentType, Constraint,
    ConstructedKind, ConstructedType, DefinedType, Exports, ImportedSymbols, Module,
    NamedComponent, NamedValue, OidComponent, RangeBound, SelectionType, SemaError, SimpleType,
    TagClass, TagDefault, TagImplicitness, TaggedType, TypeAssignment, TypeNode, ValueAssignment,
    ValueListType, ValueNode,
};
use crate::parse_tree::{ParseNode, TaggedToken, TokenKind};

/// Builds one [`Module`] per parsed `ModuleDefinition`, in source order.
pub fn build_semantic_model(parse_tree: &[ParseNode]) -> Result<Vec<Module>, SemaError> {
    parse_tree.iter().map(build_module).collect()
}

fn malformed(detail: impl Into<String>) -> SemaError {
    SemaError::UnsupportedConstruct(detail.into())
}

fn expect_kind(node: &ParseNode, kind: TokenKind) -> Result<&TaggedToken, SemaError> {
    node.as_kind(kind)
        .ok_or_else(|| malformed(format!("expected {:?} node", kind)))
}

fn expect_child(token: &TaggedToken, index: usize) -> Result<&ParseNode, SemaError> {
    token
        .child(index)
        .ok_or_else(|| malformed(format!("{:?} node is missing child {}", token.kind, index)))
}

fn expect_leaf(node: &ParseNode) -> Result<&str, SemaError> {
    node.as_leaf().ok_or_else(|| malformed("expected a lexeme"))
}

fn expect_list(node: &ParseNode) -> Result<&[ParseNode], SemaError> {
    node.as_list().ok_or_else(|| malformed("expected a group"))
}

/// Reads the single leaf out of a wrapper token such as `Identifier` or
/// `ModuleReference`.
fn wrapped_leaf(node: &ParseNode, kind: TokenKind) -> Result<String, SemaError> {
    let token = expect_kind(node, kind)?;
    Ok(expect_leaf(expect_child(token, 0)?)?.to_string())
}

fn parse_i64(text: &str) -> Result<i64, SemaError> {
    text.parse()
        .map_err(|_| malformed(format!("integer value out of range: {}", text)))
}

fn parse_u64(text: &str) -> Result<u64, SemaError> {
    text.parse()
        .map_err(|_| malformed(format!("number out of range: {}", text)))
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

fn build_module(node: &ParseNode) -> Result<Module, SemaError> {
    let token = expect_kind(node, TokenKind::ModuleDefinition)?;
    let name = wrapped_leaf(expect_child(token, 0)?, TokenKind::ModuleReference)?;
    let definitive_identifier = build_definitive_identifier(expect_child(token, 1)?)?;
    let tag_default = build_tag_default(expect_child(token, 2)?)?;
    let extensibility_implied = !expect_child(token, 3)?.is_absent();

    let body = expect_kind(expect_child(token, 4)?, TokenKind::ModuleBody)?;
    let exports = build_exports(expect_child(body, 0)?)?;
    let imports = build_imports(expect_child(body, 1)?)?;
    let assignments = build_assignments(expect_child(body, 2)?)?;

    Ok(Module {
        name,
        definitive_identifier,
        tag_default,
        extensibility_implied,
        exports,
        imports,
        assignments,
    })
}

fn build_definitive_identifier(
    node: &ParseNode,
) -> Result<Option<Vec<OidComponent>>, SemaError> {
    let token = expect_kind(node, TokenKind::DefinitiveIdentifier)?;
    if token.elements.is_empty() {
        return Ok(None);
    }
    let components = token
        .elements
        .iter()
        .map(build_definitive_component)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(components))
}

fn build_definitive_component(node: &ParseNode) -> Result<OidComponent, SemaError> {
    let token = node
        .as_token()
        .ok_or_else(|| malformed("expected a definitive OID component"))?;
    match token.kind {
        TokenKind::NameForm => Ok(OidComponent::Name(
            expect_leaf(expect_child(token, 0)?)?.to_string(),
        )),
        TokenKind::DefinitiveNumberForm => Ok(OidComponent::Number(parse_u64(expect_leaf(
            expect_child(token, 0)?,
        )?)?)),
        TokenKind::DefinitiveNameAndNumberForm => {
            let name = wrapped_leaf(expect_child(token, 0)?, TokenKind::NameForm)?;
            let number = wrapped_leaf(expect_child(token, 1)?, TokenKind::DefinitiveNumberForm)?;
            Ok(OidComponent::NameAndNumber(name, parse_u64(&number)?))
        }
        _ => Err(malformed("unexpected definitive OID component")),
    }
}

fn build_tag_default(node: &ParseNode) -> Result<TagDefault, SemaError> {
    if node.is_absent() {
        return Ok(TagDefault::Unspecified);
    }
    match expect_leaf(node)? {
        "EXPLICIT TAGS" => Ok(TagDefault::Explicit),
        "IMPLICIT TAGS" => Ok(TagDefault::Implicit),
        "AUTOMATIC TAGS" => Ok(TagDefault::Automatic),
        other => Err(malformed(format!("unexpected tag default: {}", other))),
    }
}

fn build_exports(node: &ParseNode) -> Result<Exports, SemaError> {
    if node.is_absent() {
        return Ok(Exports::All);
    }
    let token = expect_kind(node, TokenKind::Exports)?;
    let symbols = token
        .elements
        .iter()
        .map(|symbol| Ok(expect_leaf(symbol)?.to_string()))
        .collect::<Result<Vec<_>, SemaError>>()?;
    Ok(Exports::Named(symbols))
}

fn build_imports(node: &ParseNode) -> Result<Vec<ImportedSymbols>, SemaError> {
    if node.is_absent() {
        return Ok(Vec::new());
    }
    let token = expect_kind(node, TokenKind::Imports)?;
    token
        .elements
        .iter()
        .map(|group| {
            let group = expect_kind(group, TokenKind::SymbolsFromModule)?;
            let symbols = expect_list(expect_child(group, 0)?)?
                .iter()
                .map(|symbol| Ok(expect_leaf(symbol)?.to_string()))
                .collect::<Result<Vec<_>, SemaError>>()?;
            let reference = expect_kind(expect_child(group, 1)?, TokenKind::GlobalModuleReference)?;
            let module = wrapped_leaf(expect_child(reference, 0)?, TokenKind::ModuleReference)?;
            Ok(ImportedSymbols { module, symbols })
        })
        .collect()
}

fn build_assignments(node: &ParseNode) -> Result<Vec<Assignment>, SemaError> {
    let token = expect_kind(node, TokenKind::AssignmentList)?;
    token.elements.iter().map(build_assignment).collect()
}

fn build_assignment(node: &ParseNode) -> Result<Assignment, SemaError> {
    let token = node
        .as_token()
        .ok_or_else(|| malformed("expected an assignment"))?;
    match token.kind {
        TokenKind::TypeAssignment => Ok(Assignment::Type(TypeAssignment {
            name: expect_leaf(expect_child(token, 0)?)?.to_string(),
            type_decl: build_type(expect_child(token, 1)?)?,
        })),
        TokenKind::ValueAssignment => Ok(Assignment::Value(ValueAssignment {
            name: expect_leaf(expect_child(token, 0)?)?.to_string(),
            type_decl: build_type(expect_child(token, 1)?)?,
            value: build_value(expect_child(token, 2)?)?,
        })),
        _ => Err(malformed("unexpected assignment form")),
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn build_type(node: &ParseNode) -> Result<TypeNode, SemaError> {
    let token = expect_kind(node, TokenKind::Type)?;
    let inner = expect_child(token, 0)?
        .as_token()
        .ok_or_else(|| malformed("expected a type"))?;
    match inner.kind {
        TokenKind::SimpleType => build_simple_type(inner),
        TokenKind::ValueListType => build_value_list_type(inner),
        TokenKind::BitStringType => build_bitstring_type(inner),
        TokenKind::SequenceType => build_constructed_type(inner, ConstructedKind::Sequence),
        TokenKind::SetType => build_constructed_type(inner, ConstructedKind::Set),
        TokenKind::ChoiceType => build_choice_type(inner),
        TokenKind::SequenceOfType => build_collection_type(inner, CollectionKind::SequenceOf),
        TokenKind::SetOfType => build_collection_type(inner, CollectionKind::SetOf),
        TokenKind::TaggedType => build_tagged_type(inner),
        TokenKind::SelectionType => build_selection_type(inner),
        TokenKind::DefinedType => build_defined_type(inner),
        other => Err(malformed(format!("unexpected type form: {:?}", other))),
    }
}

fn build_simple_type(token: &TaggedToken) -> Result<TypeNode, SemaError> {
    let type_name = expect_leaf(expect_child(token, 0)?)?.to_string();
    let constraint = match token.elements.len() {
        1 => None,
        2 => Some(build_constraint(expect_child(token, 1)?)?),
        _ => {
            return Err(malformed(format!(
                "{} carries more than one constraint",
                type_name
            )))
        }
    };
    Ok(TypeNode::Simple(SimpleType {
        type_name,
        constraint,
    }))
}

fn build_value_list_type(token: &TaggedToken) -> Result<TypeNode, SemaError> {
    let type_name = expect_leaf(expect_child(token, 0)?)?.to_string();
    let named_values = expect_list(expect_child(token, 1)?)?
        .iter()
        .map(build_named_value)
        .collect::<Result<Vec<_>, _>>()?;
    let constraint = build_optional_constraint(expect_child(token, 2)?)?;
    Ok(TypeNode::ValueList(ValueListType {
        type_name,
        named_values,
        constraint,
    }))
}

fn build_bitstring_type(token: &TaggedToken) -> Result<TypeNode, SemaError> {
    let named_bits = expect_list(expect_child(token, 1)?)?
        .iter()
        .map(build_named_value)
        .collect::<Result<Vec<_>, _>>()?;
    let constraint = build_optional_constraint(expect_child(token, 2)?)?;
    Ok(TypeNode::BitString(BitStringType {
        named_bits,
        constraint,
    }))
}

fn build_named_value(node: &ParseNode) -> Result<NamedValue, SemaError> {
    let token = node
        .as_token()
        .ok_or_else(|| malformed("expected a named value"))?;
    match token.kind {
        TokenKind::ExtensionMarker => Ok(NamedValue::ExtensionMarker),
        TokenKind::NamedValue => {
            let identifier = wrapped_leaf(expect_child(token, 0)?, TokenKind::Identifier)?;
            let value = match token.child(1) {
                Some(value_node) => {
                    let value = wrapped_leaf(value_node, TokenKind::Value)?;
                    Some(parse_i64(&value)?)
                }
                None => None,
            };
            Ok(NamedValue::Named { identifier, value })
        }
        _ => Err(malformed("unexpected named value form")),
    }
}

fn build_constructed_type(
    token: &TaggedToken,
    kind: ConstructedKind,
) -> Result<TypeNode, SemaError> {
    let components = expect_list(expect_child(token, 1)?)?
        .iter()
        .map(build_component)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TypeNode::Constructed(ConstructedType { kind, components }))
}

fn build_choice_type(token: &TaggedToken) -> Result<TypeNode, SemaError> {
    let components = expect_list(expect_child(token, 1)?)?
        .iter()
        .map(|alternative| {
            let alternative_token = alternative
                .as_token()
                .ok_or_else(|| malformed("expected a CHOICE alternative"))?;
            match alternative_token.kind {
                TokenKind::ExtensionMarker => Ok(ComponentType::ExtensionMarker),
                TokenKind::NamedType => {
                    Ok(ComponentType::Named(build_named_component(alternative_token)?))
                }
                _ => Err(malformed("unexpected CHOICE alternative")),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TypeNode::Constructed(ConstructedType {
        kind: ConstructedKind::Choice,
        components,
    }))
}

fn build_component(node: &ParseNode) -> Result<ComponentType, SemaError> {
    let token = node
        .as_token()
        .ok_or_else(|| malformed("expected a component"))?;
    if token.kind == TokenKind::ExtensionMarker {
        return Ok(ComponentType::ExtensionMarker);
    }
    let token = expect_kind(node, TokenKind::ComponentType)?;
    let inner = expect_child(token, 0)?
        .as_token()
        .ok_or_else(|| malformed("expected a component body"))?;
    match inner.kind {
        TokenKind::NamedType => Ok(ComponentType::Named(build_named_component(inner)?)),
        TokenKind::ComponentTypeOptional => {
            let named = expect_kind(expect_child(inner, 0)?, TokenKind::NamedType)?;
            Ok(ComponentType::Optional(build_named_component(named)?))
        }
        TokenKind::ComponentTypeDefault => {
            let named = expect_kind(expect_child(inner, 0)?, TokenKind::NamedType)?;
            let default = build_value(expect_child(inner, 1)?)?;
            Ok(ComponentType::Defaulted(
                build_named_component(named)?,
                default,
            ))
        }
        TokenKind::ComponentTypeComponentsOf => {
            Ok(ComponentType::ComponentsOf(build_type(expect_child(inner, 0)?)?))
        }
        _ => Err(malformed("unexpected component form")),
    }
}

fn build_named_component(token: &TaggedToken) -> Result<NamedComponent, SemaError> {
    Ok(NamedComponent {
        identifier: wrapped_leaf(expect_child(token, 0)?, TokenKind::Identifier)?,
        type_decl: build_type(expect_child(token, 1)?)?,
    })
}

fn build_collection_type(
    token: &TaggedToken,
    kind: CollectionKind,
) -> Result<TypeNode, SemaError> {
    let size_constraint = build_optional_constraint(expect_child(token, 0)?)?;
    let element_node = expect_child(token, 1)?;
    let (element_name, element) = match element_node.as_token() {
        Some(inner) if inner.kind == TokenKind::NamedType => {
            let named = build_named_component(inner)?;
            (Some(named.identifier), named.type_decl)
        }
        _ => (None, build_type(element_node)?),
    };
    Ok(TypeNode::Collection(CollectionType {
        kind,
        size_constraint,
        element_name,
        element: Box::new(element),
    }))
}

fn build_tagged_type(token: &TaggedToken) -> Result<TypeNode, SemaError> {
    let tag = expect_kind(expect_child(token, 0)?, TokenKind::Tag)?;
    let (class, number_node) = match tag.elements.len() {
        1 => (TagClass::Context, expect_child(tag, 0)?),
        2 => {
            let class = match wrapped_leaf(expect_child(tag, 0)?, TokenKind::TagClass)?.as_str() {
                "UNIVERSAL" => TagClass::Universal,
                "APPLICATION" => TagClass::Application,
                "PRIVATE" => TagClass::Private,
                other => return Err(malformed(format!("unexpected tag class: {}", other))),
            };
            (class, expect_child(tag, 1)?)
        }
        _ => return Err(malformed("unexpected tag form")),
    };
    let number = wrapped_leaf(number_node, TokenKind::TagClassNumber)?;
    let class_number = number
        .parse()
        .map_err(|_| malformed(format!("tag number out of range: {}", number)))?;

    let implicitness = {
        let node = expect_child(token, 1)?;
        if node.is_absent() {
            TagImplicitness::Default
        } else {
            match expect_leaf(node)? {
                "IMPLICIT" => TagImplicitness::Implicit,
                "EXPLICIT" => TagImplicitness::Explicit,
                other => return Err(malformed(format!("unexpected implicitness: {}", other))),
            }
        }
    };

    Ok(TypeNode::Tagged(TaggedType {
        class,
        class_number,
        implicitness,
        type_decl: Box::new(build_type(expect_child(token, 2)?)?),
    }))
}

fn build_selection_type(token: &TaggedToken) -> Result<TypeNode, SemaError> {
    Ok(TypeNode::Selection(SelectionType {
        identifier: wrapped_leaf(expect_child(token, 0)?, TokenKind::Identifier)?,
        type_decl: Box::new(build_type(expect_child(token, 1)?)?),
    }))
}

fn build_defined_type(token: &TaggedToken) -> Result<TypeNode, SemaError> {
    let module_node = expect_child(token, 0)?;
    let module_ref = if module_node.is_absent() {
        None
    } else {
        Some(wrapped_leaf(module_node, TokenKind::ModuleReference)?)
    };
    let type_name = expect_leaf(expect_child(token, 1)?)?.to_string();
    let size_constraint = build_optional_constraint(expect_child(token, 2)?)?;
    Ok(TypeNode::Defined(DefinedType {
        module_ref,
        type_name,
        size_constraint,
    }))
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

fn build_optional_constraint(node: &ParseNode) -> Result<Option<Constraint>, SemaError> {
    if node.is_absent() {
        Ok(None)
    } else {
        Ok(Some(build_constraint(node)?))
    }
}

fn build_constraint(node: &ParseNode) -> Result<Constraint, SemaError> {
    let token = node
        .as_token()
        .ok_or_else(|| malformed("expected a constraint"))?;
    match token.kind {
        TokenKind::SingleValueConstraint => {
            Ok(Constraint::SingleValue(build_value(expect_child(token, 0)?)?))
        }
        TokenKind::ValueRangeConstraint => Ok(Constraint::ValueRange(
            build_range_bound(expect_child(token, 0)?)?,
            build_range_bound(expect_child(token, 1)?)?,
        )),
        TokenKind::SizeConstraint => Ok(Constraint::Size(Box::new(build_constraint(
            expect_child(token, 0)?,
        )?))),
        other => Err(malformed(format!("unsupported constraint form: {:?}", other))),
    }
}

fn build_range_bound(node: &ParseNode) -> Result<RangeBound, SemaError> {
    match node.as_leaf() {
        Some("MIN") => Ok(RangeBound::Min),
        Some("MAX") => Ok(RangeBound::Max),
        _ => Ok(RangeBound::Value(build_value(node)?)),
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

fn build_value(node: &ParseNode) -> Result<ValueNode, SemaError> {
    if let Some(lexeme) = node.as_leaf() {
        return match lexeme {
            "TRUE" => Ok(ValueNode::Boolean(true)),
            "FALSE" => Ok(ValueNode::Boolean(false)),
            "NULL" => Ok(ValueNode::Null),
            _ if lexeme.contains(['.', 'e', 'E']) => Ok(ValueNode::Real(lexeme.to_string())),
            _ => Ok(ValueNode::Integer(parse_i64(lexeme)?)),
        };
    }
    let token = node
        .as_token()
        .ok_or_else(|| malformed("expected a value"))?;
    match token.kind {
        TokenKind::BinaryStringValue => Ok(ValueNode::BinaryString(
            expect_leaf(expect_child(token, 0)?)?.to_string(),
        )),
        TokenKind::HexStringValue => Ok(ValueNode::HexString(
            expect_leaf(expect_child(token, 0)?)?.to_string(),
        )),
        TokenKind::CharacterStringValue => Ok(ValueNode::CharacterString(
            expect_leaf(expect_child(token, 0)?)?.to_string(),
        )),
        TokenKind::ReferencedValue => build_referenced_value(token),
        TokenKind::ObjectIdentifierValue => {
            let components = token
                .elements
                .iter()
                .map(build_oid_component)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ValueNode::ObjectIdentifier(components))
        }
        other => Err(malformed(format!("unexpected value form: {:?}", other))),
    }
}

fn build_referenced_value(token: &TaggedToken) -> Result<ValueNode, SemaError> {
    match token.elements.len() {
        1 => Ok(ValueNode::Referenced {
            module_ref: None,
            name: expect_leaf(expect_child(token, 0)?)?.to_string(),
        }),
        2 => Ok(ValueNode::Referenced {
            module_ref: Some(wrapped_leaf(
                expect_child(token, 0)?,
                TokenKind::ModuleReference,
            )?),
            name: expect_leaf(expect_child(token, 1)?)?.to_string(),
        }),
        _ => Err(malformed("unexpected referenced value form")),
    }
}

fn build_oid_component(node: &ParseNode) -> Result<OidComponent, SemaError> {
    let token = node
        .as_token()
        .ok_or_else(|| malformed("expected an OID component"))?;
    match token.kind {
        TokenKind::NameForm => Ok(OidComponent::Name(
            expect_leaf(expect_child(token, 0)?)?.to_string(),
        )),
        TokenKind::NumberForm => Ok(OidComponent::Number(parse_u64(expect_leaf(expect_child(
            token, 0,
        )?)?)?)),
        TokenKind::NameAndNumberForm => {
            let name = wrapped_leaf(expect_child(token, 0)?, TokenKind::NameForm)?;
            let number = wrapped_leaf(expect_child(token, 1)?, TokenKind::NumberForm)?;
            Ok(OidComponent::NameAndNumber(name, parse_u64(&number)?))
        }
        TokenKind::ReferencedValue => {
            if token.elements.len() != 2 {
                return Err(malformed("unexpected OID component reference"));
            }
            Ok(OidComponent::Reference {
                module_ref: wrapped_leaf(expect_child(token, 0)?, TokenKind::ModuleReference)?,
                name: expect_leaf(expect_child(token, 1)?)?.to_string(),
            })
        }
        _ => Err(malformed("unexpected OID component")),
    }
}
