//! The grammar rule set for the supported X.680 subset.
//!
//! One function per nonterminal. Each function either consumes a production
//! and returns its tagged tree, or fails; callers implement ordered choice
//! by resetting the cursor and trying the next alternative. Alternative
//! order is significant and mirrors the precedence the language needs:
//! value-list types before plain `INTEGER`, tagged before untagged,
//! constructed before `SEQUENCE OF`/`SET OF`, builtins before references.
//!
//! Suppression decisions (which lexemes survive into the tree) follow the
//! child layout contract documented in [`crate::parse_tree`].

use super::{Cursor, Fail, Initial, PResult};
use crate::parse_tree::{ParseNode, TokenKind};

type Rule = fn(&mut Cursor<'_>) -> PResult<ParseNode>;

/// Tries rules in order, resetting between alternatives.
fn first_of(c: &mut Cursor<'_>, rules: &[Rule]) -> PResult<ParseNode> {
    for rule in rules {
        let mark = c.mark();
        match rule(c) {
            Ok(node) => return Ok(node),
            Err(Fail) => c.reset(mark),
        }
    }
    Err(Fail)
}

/// Runs an optional rule, yielding [`ParseNode::Empty`] when it fails.
fn optional(c: &mut Cursor<'_>, rule: Rule) -> ParseNode {
    let mark = c.mark();
    match rule(c) {
        Ok(node) => node,
        Err(Fail) => {
            c.reset(mark);
            ParseNode::Empty
        }
    }
}

/// `{ element, element, ... }` with an optionally empty body.
fn braced_list(c: &mut Cursor<'_>, element: Rule) -> PResult<ParseNode> {
    c.literal("{")?;
    let mut items = Vec::new();
    let mark = c.mark();
    match element(c) {
        Ok(first) => {
            items.push(first);
            loop {
                let sep = c.mark();
                if c.literal(",").is_err() {
                    c.reset(sep);
                    break;
                }
                match element(c) {
                    Ok(item) => items.push(item),
                    Err(Fail) => {
                        c.reset(sep);
                        break;
                    }
                }
            }
        }
        Err(Fail) => c.reset(mark),
    }
    c.literal("}")?;
    Ok(ParseNode::List(items))
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

pub(crate) fn module_definition(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let module_ref = module_reference(c)?;
    let definitive = definitive_identifier(c)?;
    c.keyword("DEFINITIONS")?;
    let tag_default = optional(c, tag_default_kw);
    let extension_default = optional(c, extension_default_kw);
    c.literal("::=")?;
    c.keyword("BEGIN")?;
    let body = module_body(c)?;
    c.keyword("END")?;
    Ok(ParseNode::token(
        TokenKind::ModuleDefinition,
        vec![module_ref, definitive, tag_default, extension_default, body],
    ))
}

fn module_reference(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let name = c.identifier(Initial::Upper)?;
    Ok(ParseNode::token(
        TokenKind::ModuleReference,
        vec![ParseNode::leaf(name)],
    ))
}

fn tag_default_kw(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    for (first, second) in [
        ("EXPLICIT", "TAGS"),
        ("IMPLICIT", "TAGS"),
        ("AUTOMATIC", "TAGS"),
    ] {
        let mark = c.mark();
        if c.keyword2(first, second).is_ok() {
            return Ok(ParseNode::leaf(format!("{} {}", first, second)));
        }
        c.reset(mark);
    }
    Err(Fail)
}

fn extension_default_kw(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword2("EXTENSIBILITY", "IMPLIED")?;
    Ok(ParseNode::leaf("EXTENSIBILITY IMPLIED"))
}

/// `{ iso standard(8571) ... }` after the module name; the token is always
/// present, with no children when the identifier is absent.
fn definitive_identifier(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let mark = c.mark();
    let mut components = Vec::new();
    if c.literal("{").is_ok() {
        components.push(definitive_objid_component(c)?);
        loop {
            let each = c.mark();
            match definitive_objid_component(c) {
                Ok(component) => components.push(component),
                Err(Fail) => {
                    c.reset(each);
                    break;
                }
            }
        }
        c.literal("}")?;
    } else {
        c.reset(mark);
    }
    Ok(ParseNode::token(TokenKind::DefinitiveIdentifier, components))
}

fn definitive_objid_component(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(
        c,
        &[
            definitive_name_and_number_form,
            name_form,
            definitive_number_form,
        ],
    )
}

fn definitive_name_and_number_form(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let name = name_form(c)?;
    c.literal("(")?;
    let number = definitive_number_form(c)?;
    c.literal(")")?;
    Ok(ParseNode::token(
        TokenKind::DefinitiveNameAndNumberForm,
        vec![name, number],
    ))
}

fn definitive_number_form(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let number = c.number()?;
    Ok(ParseNode::token(
        TokenKind::DefinitiveNumberForm,
        vec![ParseNode::leaf(number)],
    ))
}

fn module_body(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let exports = optional(c, exports);
    let imports = optional(c, imports);
    let assignments = assignment_list(c)?;
    Ok(ParseNode::token(
        TokenKind::ModuleBody,
        vec![exports, imports, assignments],
    ))
}

fn exports(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("EXPORTS")?;
    let symbols = match symbol_list(c) {
        Ok(symbols) => symbols,
        Err(Fail) => Vec::new(),
    };
    c.literal(";")?;
    Ok(ParseNode::token(TokenKind::Exports, symbols))
}

fn imports(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("IMPORTS")?;
    let mut groups = Vec::new();
    loop {
        let mark = c.mark();
        match symbols_from_module(c) {
            Ok(group) => groups.push(group),
            Err(Fail) => {
                c.reset(mark);
                break;
            }
        }
    }
    c.literal(";")?;
    Ok(ParseNode::token(TokenKind::Imports, groups))
}

fn symbols_from_module(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let symbols = symbol_list(c)?;
    c.keyword("FROM")?;
    let module = global_module_reference(c)?;
    Ok(ParseNode::token(
        TokenKind::SymbolsFromModule,
        vec![ParseNode::List(symbols), module],
    ))
}

fn global_module_reference(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let module = module_reference(c)?;
    let identifier = optional(c, object_identifier_value);
    Ok(ParseNode::token(
        TokenKind::GlobalModuleReference,
        vec![module, identifier],
    ))
}

/// Comma-separated type or value reference names.
fn symbol_list(c: &mut Cursor<'_>) -> PResult<Vec<ParseNode>> {
    let mut symbols = vec![symbol(c)?];
    loop {
        let mark = c.mark();
        if c.literal(",").is_err() {
            c.reset(mark);
            break;
        }
        match symbol(c) {
            Ok(node) => symbols.push(node),
            Err(Fail) => {
                c.reset(mark);
                break;
            }
        }
    }
    Ok(symbols)
}

fn symbol(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let mark = c.mark();
    if let Ok(name) = c.identifier(Initial::Lower) {
        return Ok(ParseNode::leaf(name));
    }
    c.reset(mark);
    let name = c.identifier(Initial::Upper)?;
    Ok(ParseNode::leaf(name))
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

fn assignment_list(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let mut assignments = Vec::new();
    loop {
        let mark = c.mark();
        match assignment(c) {
            Ok(node) => assignments.push(node),
            Err(Fail) => {
                c.reset(mark);
                break;
            }
        }
    }
    Ok(ParseNode::token(TokenKind::AssignmentList, assignments))
}

fn assignment(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(c, &[type_assignment, value_assignment])
}

fn type_assignment(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let name = c.identifier(Initial::Upper)?;
    c.literal("::=")?;
    let ty = type_(c)?;
    Ok(ParseNode::token(
        TokenKind::TypeAssignment,
        vec![ParseNode::leaf(name), ty],
    ))
}

fn value_assignment(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let name = c.identifier(Initial::Lower)?;
    let ty = type_(c)?;
    c.literal("::=")?;
    let value = value(c)?;
    Ok(ParseNode::token(
        TokenKind::ValueAssignment,
        vec![ParseNode::leaf(name), ty, value],
    ))
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub(crate) fn type_(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let inner = first_of(
        c,
        &[
            value_list_type,
            tagged_type,
            simple_type,
            constructed_type,
            sequenceof_type,
            setof_type,
            bitstring_type,
            referenced_type,
        ],
    )?;
    Ok(ParseNode::token(TokenKind::Type, vec![inner]))
}

fn constructed_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(c, &[choice_type, sequence_type, set_type])
}

fn referenced_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(c, &[defined_type, selection_type])
}

fn value_list_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(c, &[restricted_integer_type, enumerated_type])
}

fn restricted_integer_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("INTEGER")?;
    let values = braced_list(c, named_number)?;
    let constraint = optional(c, single_value_constraint);
    Ok(ParseNode::token(
        TokenKind::ValueListType,
        vec![ParseNode::leaf("INTEGER"), values, constraint],
    ))
}

fn enumerated_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("ENUMERATED")?;
    let values = braced_list(c, enumeration)?;
    Ok(ParseNode::token(
        TokenKind::ValueListType,
        vec![ParseNode::leaf("ENUMERATED"), values, ParseNode::Empty],
    ))
}

fn enumeration(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(c, &[named_number, named_nonumber, extension_marker])
}

fn named_number(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let identifier = identifier(c)?;
    c.literal("(")?;
    let number = c.signed_number()?;
    c.literal(")")?;
    Ok(ParseNode::token(
        TokenKind::NamedValue,
        vec![
            identifier,
            ParseNode::token(TokenKind::Value, vec![ParseNode::leaf(number)]),
        ],
    ))
}

fn named_nonumber(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let identifier = identifier(c)?;
    Ok(ParseNode::token(TokenKind::NamedValue, vec![identifier]))
}

fn bitstring_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword2("BIT", "STRING")?;
    let named_bits = {
        let mark = c.mark();
        match braced_list(c, named_number) {
            Ok(list) => list,
            Err(Fail) => {
                c.reset(mark);
                ParseNode::List(Vec::new())
            }
        }
    };
    let constraint = {
        let mark = c.mark();
        match first_of(c, &[single_value_constraint, size_constraint]) {
            Ok(node) => node,
            Err(Fail) => {
                c.reset(mark);
                ParseNode::Empty
            }
        }
    };
    Ok(ParseNode::token(
        TokenKind::BitStringType,
        vec![ParseNode::leaf("BIT STRING"), named_bits, constraint],
    ))
}

fn sequence_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("SEQUENCE")?;
    let components = braced_list(c, component_or_marker)?;
    Ok(ParseNode::token(
        TokenKind::SequenceType,
        vec![ParseNode::leaf("SEQUENCE"), components],
    ))
}

fn set_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("SET")?;
    let components = braced_list(c, component_or_marker)?;
    Ok(ParseNode::token(
        TokenKind::SetType,
        vec![ParseNode::leaf("SET"), components],
    ))
}

fn choice_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("CHOICE")?;
    let alternatives = braced_list(c, named_type_or_marker)?;
    Ok(ParseNode::token(
        TokenKind::ChoiceType,
        vec![ParseNode::leaf("CHOICE"), alternatives],
    ))
}

fn sequenceof_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("SEQUENCE")?;
    let size = optional(c, size_constraint);
    c.keyword("OF")?;
    let inner = first_of(c, &[type_, named_type])?;
    Ok(ParseNode::token(
        TokenKind::SequenceOfType,
        vec![size, inner],
    ))
}

fn setof_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("SET")?;
    let size = optional(c, size_constraint);
    c.keyword("OF")?;
    let inner = first_of(c, &[type_, named_type])?;
    Ok(ParseNode::token(TokenKind::SetOfType, vec![size, inner]))
}

fn component_or_marker(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(c, &[component_type, extension_marker])
}

fn named_type_or_marker(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(c, &[named_type, extension_marker])
}

fn extension_marker(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.literal("...")?;
    Ok(ParseNode::token(TokenKind::ExtensionMarker, Vec::new()))
}

fn component_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let mark = c.mark();
    if c.keyword2("COMPONENTS", "OF").is_ok() {
        let ty = type_(c)?;
        let inner = ParseNode::token(TokenKind::ComponentTypeComponentsOf, vec![ty]);
        return Ok(ParseNode::token(TokenKind::ComponentType, vec![inner]));
    }
    c.reset(mark);

    let named = named_type(c)?;
    let inner = {
        let keyword_mark = c.mark();
        if c.keyword("OPTIONAL").is_ok() {
            ParseNode::token(TokenKind::ComponentTypeOptional, vec![named])
        } else {
            c.reset(keyword_mark);
            if c.keyword("DEFAULT").is_ok() {
                let default = value(c)?;
                ParseNode::token(TokenKind::ComponentTypeDefault, vec![named, default])
            } else {
                c.reset(keyword_mark);
                named
            }
        }
    };
    Ok(ParseNode::token(TokenKind::ComponentType, vec![inner]))
}

fn named_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let identifier = identifier(c)?;
    let ty = type_(c)?;
    Ok(ParseNode::token(TokenKind::NamedType, vec![identifier, ty]))
}

fn identifier(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let name = c.identifier(Initial::Lower)?;
    Ok(ParseNode::token(
        TokenKind::Identifier,
        vec![ParseNode::leaf(name)],
    ))
}

fn tagged_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let tag = tag(c)?;
    let implicitness = {
        let mark = c.mark();
        if c.keyword("IMPLICIT").is_ok() {
            ParseNode::leaf("IMPLICIT")
        } else {
            c.reset(mark);
            if c.keyword("EXPLICIT").is_ok() {
                ParseNode::leaf("EXPLICIT")
            } else {
                c.reset(mark);
                ParseNode::Empty
            }
        }
    };
    let ty = type_(c)?;
    Ok(ParseNode::token(
        TokenKind::TaggedType,
        vec![tag, implicitness, ty],
    ))
}

fn tag(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.literal("[")?;
    let class = optional(c, tag_class);
    let number = tag_class_number(c)?;
    c.literal("]")?;
    let children = if class.is_absent() {
        vec![number]
    } else {
        vec![class, number]
    };
    Ok(ParseNode::token(TokenKind::Tag, children))
}

fn tag_class(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    for class in ["UNIVERSAL", "APPLICATION", "PRIVATE"] {
        let mark = c.mark();
        if c.keyword(class).is_ok() {
            return Ok(ParseNode::token(
                TokenKind::TagClass,
                vec![ParseNode::leaf(class)],
            ));
        }
        c.reset(mark);
    }
    Err(Fail)
}

fn tag_class_number(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let number = c.number()?;
    Ok(ParseNode::token(
        TokenKind::TagClassNumber,
        vec![ParseNode::leaf(number)],
    ))
}

/// Restricted character string types, all single keywords.
const RESTRICTED_STRING_TYPES: &[&str] = &[
    "BMPString",
    "GeneralString",
    "GraphicString",
    "IA5String",
    "ISO646String",
    "NumericString",
    "PrintableString",
    "TeletexString",
    "T61String",
    "UniversalString",
    "UTF8String",
    "VideotexString",
    "VisibleString",
];

const USEFUL_TYPES: &[&str] = &["GeneralizedTime", "UTCTime", "ObjectDescriptor"];

fn simple_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let (name, size) = simple_type_head(c)?;
    let mut children = vec![ParseNode::leaf(name)];
    if let Some(size) = size {
        children.push(size);
    }
    let mark = c.mark();
    match first_of(c, &[value_range_constraint, single_value_constraint]) {
        Ok(constraint) => children.push(constraint),
        Err(Fail) => c.reset(mark),
    }
    Ok(ParseNode::token(TokenKind::SimpleType, children))
}

/// The type-name head of a simple type, plus the size constraint the string
/// types accept in place.
fn simple_type_head(c: &mut Cursor<'_>) -> PResult<(String, Option<ParseNode>)> {
    if c.keyword("ANY").is_ok() {
        // ANY DEFINED BY identifier: the qualifier is accepted and dropped.
        let mark = c.mark();
        if !(c.keyword2("DEFINED", "BY").is_ok() && c.identifier(Initial::Lower).is_ok()) {
            c.reset(mark);
        }
        return Ok(("ANY".to_string(), None));
    }
    for simple in ["BOOLEAN", "NULL", "REAL", "INTEGER"] {
        let mark = c.mark();
        if c.keyword(simple).is_ok() {
            return Ok((simple.to_string(), None));
        }
        c.reset(mark);
    }
    let mark = c.mark();
    if c.keyword2("OCTET", "STRING").is_ok() {
        let size = optional_size(c);
        return Ok(("OCTET STRING".to_string(), size));
    }
    c.reset(mark);
    if c.keyword2("OBJECT", "IDENTIFIER").is_ok() {
        return Ok(("OBJECT IDENTIFIER".to_string(), None));
    }
    c.reset(mark);
    for &string_type in RESTRICTED_STRING_TYPES {
        let each = c.mark();
        if c.keyword(string_type).is_ok() {
            let size = optional_size(c);
            return Ok((string_type.to_string(), size));
        }
        c.reset(each);
    }
    if c.keyword2("CHARACTER", "STRING").is_ok() {
        let size = optional_size(c);
        return Ok(("CHARACTER STRING".to_string(), size));
    }
    c.reset(mark);
    for &useful in USEFUL_TYPES {
        let each = c.mark();
        if c.keyword(useful).is_ok() {
            return Ok((useful.to_string(), None));
        }
        c.reset(each);
    }
    c.fail("simple type")
}

fn optional_size(c: &mut Cursor<'_>) -> Option<ParseNode> {
    let mark = c.mark();
    match size_constraint(c) {
        Ok(node) => Some(node),
        Err(Fail) => {
            c.reset(mark);
            None
        }
    }
}

fn defined_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let module = {
        let mark = c.mark();
        let mut qualifier = ParseNode::Empty;
        if let Ok(module) = module_reference(c) {
            if c.dot().is_ok() {
                qualifier = module;
            } else {
                c.reset(mark);
            }
        } else {
            c.reset(mark);
        }
        qualifier
    };
    let name = c.identifier(Initial::Upper)?;
    let size = optional(c, size_constraint);
    Ok(ParseNode::token(
        TokenKind::DefinedType,
        vec![module, ParseNode::leaf(name), size],
    ))
}

fn selection_type(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let identifier = identifier(c)?;
    c.literal("<")?;
    let ty = type_(c)?;
    Ok(ParseNode::token(
        TokenKind::SelectionType,
        vec![identifier, ty],
    ))
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

fn single_value_constraint(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.literal("(")?;
    let value = value(c)?;
    c.literal(")")?;
    Ok(ParseNode::token(
        TokenKind::SingleValueConstraint,
        vec![value],
    ))
}

fn value_range_constraint(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.literal("(")?;
    let lower = range_bound(c, "MIN")?;
    c.range_separator()?;
    let upper = range_bound(c, "MAX")?;
    c.literal(")")?;
    Ok(ParseNode::token(
        TokenKind::ValueRangeConstraint,
        vec![lower, upper],
    ))
}

/// A range endpoint: number, referenced value, or the MIN/MAX keyword.
fn range_bound(c: &mut Cursor<'_>, extremum: &'static str) -> PResult<ParseNode> {
    let mark = c.mark();
    if let Ok(number) = c.real_number(true) {
        return Ok(ParseNode::leaf(number));
    }
    c.reset(mark);
    if let Ok(reference) = referenced_value(c) {
        return Ok(reference);
    }
    c.reset(mark);
    if c.keyword(extremum).is_ok() {
        return Ok(ParseNode::leaf(extremum));
    }
    c.reset(mark);
    Err(Fail)
}

fn size_constraint(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let mark = c.mark();
    let outer_paren = c.literal("(").is_ok();
    if !outer_paren {
        c.reset(mark);
    }
    c.keyword("SIZE")?;
    let nested = first_of(c, &[single_value_constraint, value_range_constraint])?;
    if outer_paren {
        c.literal(")")?;
    }
    Ok(ParseNode::token(TokenKind::SizeConstraint, vec![nested]))
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

pub(crate) fn value(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(
        c,
        &[
            boolean_value,
            bitstring_value,
            real_or_integer_value,
            null_value,
            cstring_value,
            referenced_value,
            object_identifier_value,
        ],
    )
}

fn boolean_value(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let mark = c.mark();
    if c.keyword("TRUE").is_ok() {
        return Ok(ParseNode::leaf("TRUE"));
    }
    c.reset(mark);
    c.keyword("FALSE")?;
    Ok(ParseNode::leaf("FALSE"))
}

fn bitstring_value(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let mark = c.mark();
    if let Ok(bits) = c.quoted_digit_string("01", b'B') {
        return Ok(ParseNode::token(
            TokenKind::BinaryStringValue,
            vec![ParseNode::leaf(bits)],
        ));
    }
    c.reset(mark);
    let digits = c.quoted_digit_string("0123456789ABCDEF", b'H')?;
    Ok(ParseNode::token(
        TokenKind::HexStringValue,
        vec![ParseNode::leaf(digits)],
    ))
}

/// Numeric literals; plain integers come out of the same rule since the
/// fraction and exponent are optional.
fn real_or_integer_value(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let number = c.real_number(false)?;
    Ok(ParseNode::leaf(number))
}

fn null_value(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.keyword("NULL")?;
    Ok(ParseNode::leaf("NULL"))
}

fn cstring_value(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let content = c.quoted_string()?;
    Ok(ParseNode::token(
        TokenKind::CharacterStringValue,
        vec![ParseNode::leaf(content)],
    ))
}

fn referenced_value(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let mark = c.mark();
    if let Ok(module) = module_reference(c) {
        if c.dot().is_ok() {
            if let Ok(name) = c.identifier(Initial::Lower) {
                return Ok(ParseNode::token(
                    TokenKind::ReferencedValue,
                    vec![module, ParseNode::leaf(name)],
                ));
            }
        }
        c.reset(mark);
    } else {
        c.reset(mark);
    }
    let name = c.identifier(Initial::Lower)?;
    Ok(ParseNode::token(
        TokenKind::ReferencedValue,
        vec![ParseNode::leaf(name)],
    ))
}

fn object_identifier_value(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    c.literal("{")?;
    let mut components = vec![objid_component(c)?];
    loop {
        let mark = c.mark();
        match objid_component(c) {
            Ok(component) => components.push(component),
            Err(Fail) => {
                c.reset(mark);
                break;
            }
        }
    }
    c.literal("}")?;
    Ok(ParseNode::token(
        TokenKind::ObjectIdentifierValue,
        components,
    ))
}

fn objid_component(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    first_of(
        c,
        &[
            name_and_number_form,
            name_form,
            number_form,
            external_reference_component,
        ],
    )
}

fn name_form(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let name = c.identifier(Initial::Lower)?;
    Ok(ParseNode::token(
        TokenKind::NameForm,
        vec![ParseNode::leaf(name)],
    ))
}

fn number_form(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let number = c.number()?;
    Ok(ParseNode::token(
        TokenKind::NumberForm,
        vec![ParseNode::leaf(number)],
    ))
}

fn name_and_number_form(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let name = name_form(c)?;
    c.literal("(")?;
    let number = number_form(c)?;
    c.literal(")")?;
    Ok(ParseNode::token(
        TokenKind::NameAndNumberForm,
        vec![name, number],
    ))
}

/// `Module.value` appearing as an OID component.
fn external_reference_component(c: &mut Cursor<'_>) -> PResult<ParseNode> {
    let module = module_reference(c)?;
    c.dot()?;
    let name = c.identifier(Initial::Lower)?;
    Ok(ParseNode::token(
        TokenKind::ReferencedValue,
        vec![module, ParseNode::leaf(name)],
    ))
}

#[cfg(test)]
mod tests {
    use crate::parse_tree::{ParseNode, TokenKind};
    use crate::parser::parse_asn1;

    fn parse_one(source: &str) -> ParseNode {
        let mut modules = parse_asn1(source).expect("parse failed");
        assert_eq!(modules.len(), 1);
        modules.remove(0)
    }

    fn first_assignment(module: &ParseNode) -> &ParseNode {
        let module = module.as_kind(TokenKind::ModuleDefinition).unwrap();
        let body = module.child(4).unwrap().as_kind(TokenKind::ModuleBody).unwrap();
        let assignments = body
            .child(2)
            .unwrap()
            .as_kind(TokenKind::AssignmentList)
            .unwrap();
        assignments.child(0).expect("no assignments")
    }

    #[test]
    fn minimal_module() {
        let module = parse_one("M DEFINITIONS ::= BEGIN END");
        let token = module.as_kind(TokenKind::ModuleDefinition).unwrap();
        let name = token.child(0).unwrap().as_kind(TokenKind::ModuleReference).unwrap();
        assert_eq!(name.child(0).unwrap().as_leaf(), Some("M"));
        assert!(token.child(2).unwrap().is_absent());
        assert!(token.child(3).unwrap().is_absent());
    }

    #[test]
    fn module_with_definitive_identifier_and_defaults() {
        let module =
            parse_one("Mod { iso standard(8571) } DEFINITIONS IMPLICIT TAGS EXTENSIBILITY IMPLIED ::= BEGIN END");
        let token = module.as_kind(TokenKind::ModuleDefinition).unwrap();
        let definitive = token
            .child(1)
            .unwrap()
            .as_kind(TokenKind::DefinitiveIdentifier)
            .unwrap();
        assert_eq!(definitive.elements.len(), 2);
        assert_eq!(token.child(2).unwrap().as_leaf(), Some("IMPLICIT TAGS"));
        assert_eq!(
            token.child(3).unwrap().as_leaf(),
            Some("EXTENSIBILITY IMPLIED")
        );
    }

    #[test]
    fn two_modules_in_one_source() {
        let modules =
            parse_asn1("A DEFINITIONS ::= BEGIN END B DEFINITIONS ::= BEGIN END").unwrap();
        assert_eq!(modules.len(), 2);
    }

    #[test]
    fn simple_type_assignment() {
        let module = parse_one("M DEFINITIONS ::= BEGIN Age ::= INTEGER END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        assert_eq!(assignment.child(0).unwrap().as_leaf(), Some("Age"));
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let simple = ty.child(0).unwrap().as_kind(TokenKind::SimpleType).unwrap();
        assert_eq!(simple.child(0).unwrap().as_leaf(), Some("INTEGER"));
    }

    #[test]
    fn integer_with_range_constraint() {
        let module = parse_one("M DEFINITIONS ::= BEGIN Age ::= INTEGER (0..120) END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let simple = ty.child(0).unwrap().as_kind(TokenKind::SimpleType).unwrap();
        let range = simple
            .child(1)
            .unwrap()
            .as_kind(TokenKind::ValueRangeConstraint)
            .unwrap();
        assert_eq!(range.child(0).unwrap().as_leaf(), Some("0"));
        assert_eq!(range.child(1).unwrap().as_leaf(), Some("120"));
    }

    #[test]
    fn range_with_min_max_bounds() {
        let module = parse_one("M DEFINITIONS ::= BEGIN T ::= INTEGER (MIN..MAX) END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let simple = ty.child(0).unwrap().as_kind(TokenKind::SimpleType).unwrap();
        let range = simple
            .child(1)
            .unwrap()
            .as_kind(TokenKind::ValueRangeConstraint)
            .unwrap();
        assert_eq!(range.child(0).unwrap().as_leaf(), Some("MIN"));
        assert_eq!(range.child(1).unwrap().as_leaf(), Some("MAX"));
    }

    #[test]
    fn integer_with_named_values() {
        let module = parse_one("M DEFINITIONS ::= BEGIN Color ::= INTEGER { red(0), blue(1) } END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let list_type = ty.child(0).unwrap().as_kind(TokenKind::ValueListType).unwrap();
        assert_eq!(list_type.child(0).unwrap().as_leaf(), Some("INTEGER"));
        let values = list_type.child(1).unwrap().as_list().unwrap();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn enumerated_with_extension_marker() {
        let module = parse_one("M DEFINITIONS ::= BEGIN E ::= ENUMERATED { a(0), ... } END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let list_type = ty.child(0).unwrap().as_kind(TokenKind::ValueListType).unwrap();
        let values = list_type.child(1).unwrap().as_list().unwrap();
        assert!(values[1].as_kind(TokenKind::ExtensionMarker).is_some());
    }

    #[test]
    fn sequence_with_optional_and_default() {
        let module = parse_one(
            "M DEFINITIONS ::= BEGIN S ::= SEQUENCE { a INTEGER, b BOOLEAN OPTIONAL, c INTEGER DEFAULT 5 } END",
        );
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let sequence = ty.child(0).unwrap().as_kind(TokenKind::SequenceType).unwrap();
        let components = sequence.child(1).unwrap().as_list().unwrap();
        assert_eq!(components.len(), 3);
        let plain = components[0].as_kind(TokenKind::ComponentType).unwrap();
        assert!(plain.child(0).unwrap().as_kind(TokenKind::NamedType).is_some());
        let optional = components[1].as_kind(TokenKind::ComponentType).unwrap();
        assert!(optional
            .child(0)
            .unwrap()
            .as_kind(TokenKind::ComponentTypeOptional)
            .is_some());
        let defaulted = components[2].as_kind(TokenKind::ComponentType).unwrap();
        let inner = defaulted
            .child(0)
            .unwrap()
            .as_kind(TokenKind::ComponentTypeDefault)
            .unwrap();
        assert_eq!(inner.child(1).unwrap().as_leaf(), Some("5"));
    }

    #[test]
    fn components_of_inside_sequence() {
        let module = parse_one("M DEFINITIONS ::= BEGIN S ::= SEQUENCE { COMPONENTS OF Base } END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let sequence = ty.child(0).unwrap().as_kind(TokenKind::SequenceType).unwrap();
        let components = sequence.child(1).unwrap().as_list().unwrap();
        let component = components[0].as_kind(TokenKind::ComponentType).unwrap();
        assert!(component
            .child(0)
            .unwrap()
            .as_kind(TokenKind::ComponentTypeComponentsOf)
            .is_some());
    }

    #[test]
    fn sequence_of_with_size() {
        let module = parse_one("M DEFINITIONS ::= BEGIN L ::= SEQUENCE SIZE (1..8) OF INTEGER END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let seq_of = ty.child(0).unwrap().as_kind(TokenKind::SequenceOfType).unwrap();
        assert!(seq_of.child(0).unwrap().as_kind(TokenKind::SizeConstraint).is_some());
        assert!(seq_of.child(1).unwrap().as_kind(TokenKind::Type).is_some());
    }

    #[test]
    fn set_of_named_element() {
        let module = parse_one("M DEFINITIONS ::= BEGIN L ::= SET OF item INTEGER END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let set_of = ty.child(0).unwrap().as_kind(TokenKind::SetOfType).unwrap();
        assert!(set_of.child(1).unwrap().as_kind(TokenKind::NamedType).is_some());
    }

    #[test]
    fn tagged_type_with_class_and_implicitness() {
        let module = parse_one("M DEFINITIONS ::= BEGIN T ::= [APPLICATION 3] IMPLICIT INTEGER END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let tagged = ty.child(0).unwrap().as_kind(TokenKind::TaggedType).unwrap();
        let tag = tagged.child(0).unwrap().as_kind(TokenKind::Tag).unwrap();
        assert_eq!(tag.elements.len(), 2);
        assert_eq!(tagged.child(1).unwrap().as_leaf(), Some("IMPLICIT"));
    }

    #[test]
    fn context_tag_without_class() {
        let module = parse_one("M DEFINITIONS ::= BEGIN T ::= [0] INTEGER END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let tagged = ty.child(0).unwrap().as_kind(TokenKind::TaggedType).unwrap();
        let tag = tagged.child(0).unwrap().as_kind(TokenKind::Tag).unwrap();
        assert_eq!(tag.elements.len(), 1);
        assert!(tagged.child(1).unwrap().is_absent());
    }

    #[test]
    fn bit_string_with_named_bits() {
        let module =
            parse_one("M DEFINITIONS ::= BEGIN Flags ::= BIT STRING { a(0), b(1) } (SIZE (2)) END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let bits = ty.child(0).unwrap().as_kind(TokenKind::BitStringType).unwrap();
        assert_eq!(bits.child(1).unwrap().as_list().unwrap().len(), 2);
        assert!(bits.child(2).unwrap().as_kind(TokenKind::SizeConstraint).is_some());
    }

    #[test]
    fn octet_string_with_size() {
        let module = parse_one("M DEFINITIONS ::= BEGIN K ::= OCTET STRING (SIZE (16)) END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let simple = ty.child(0).unwrap().as_kind(TokenKind::SimpleType).unwrap();
        assert_eq!(simple.child(0).unwrap().as_leaf(), Some("OCTET STRING"));
        assert!(simple.child(1).unwrap().as_kind(TokenKind::SizeConstraint).is_some());
    }

    #[test]
    fn any_defined_by_is_plain_any() {
        let module = parse_one("M DEFINITIONS ::= BEGIN T ::= ANY DEFINED BY kind END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let simple = ty.child(0).unwrap().as_kind(TokenKind::SimpleType).unwrap();
        assert_eq!(simple.child(0).unwrap().as_leaf(), Some("ANY"));
        assert_eq!(simple.elements.len(), 1);
    }

    #[test]
    fn defined_type_with_module_qualifier() {
        let module = parse_one("M DEFINITIONS ::= BEGIN T ::= Other.Foo END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let defined = ty.child(0).unwrap().as_kind(TokenKind::DefinedType).unwrap();
        let qualifier = defined
            .child(0)
            .unwrap()
            .as_kind(TokenKind::ModuleReference)
            .unwrap();
        assert_eq!(qualifier.child(0).unwrap().as_leaf(), Some("Other"));
        assert_eq!(defined.child(1).unwrap().as_leaf(), Some("Foo"));
    }

    #[test]
    fn selection_type() {
        let module = parse_one("M DEFINITIONS ::= BEGIN T ::= alpha < Options END");
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::TypeAssignment)
            .unwrap();
        let ty = assignment.child(1).unwrap().as_kind(TokenKind::Type).unwrap();
        let selection = ty.child(0).unwrap().as_kind(TokenKind::SelectionType).unwrap();
        let identifier = selection.child(0).unwrap().as_kind(TokenKind::Identifier).unwrap();
        assert_eq!(identifier.child(0).unwrap().as_leaf(), Some("alpha"));
    }

    #[test]
    fn value_assignments() {
        let source = "M DEFINITIONS ::= BEGIN
            flag BOOLEAN ::= TRUE
            count INTEGER ::= -12
            ratio REAL ::= 3.14e1
            label PrintableString ::= \"hi\"
            mask BIT STRING ::= '1010'B
            key OCTET STRING ::= '0FA5'H
            alias INTEGER ::= other
        END";
        let module = parse_one(source);
        let body = module
            .as_kind(TokenKind::ModuleDefinition)
            .unwrap()
            .child(4)
            .unwrap()
            .as_kind(TokenKind::ModuleBody)
            .unwrap();
        let assignments = body
            .child(2)
            .unwrap()
            .as_kind(TokenKind::AssignmentList)
            .unwrap();
        assert_eq!(assignments.elements.len(), 7);
        let flag = assignments.child(0).unwrap().as_kind(TokenKind::ValueAssignment).unwrap();
        assert_eq!(flag.child(2).unwrap().as_leaf(), Some("TRUE"));
        let mask = assignments.child(4).unwrap().as_kind(TokenKind::ValueAssignment).unwrap();
        assert!(mask.child(2).unwrap().as_kind(TokenKind::BinaryStringValue).is_some());
        let alias = assignments.child(6).unwrap().as_kind(TokenKind::ValueAssignment).unwrap();
        assert!(alias.child(2).unwrap().as_kind(TokenKind::ReferencedValue).is_some());
    }

    #[test]
    fn object_identifier_value_forms() {
        let module = parse_one(
            "M DEFINITIONS ::= BEGIN oid OBJECT IDENTIFIER ::= { iso member-body(2) 840 } END",
        );
        let assignment = first_assignment(&module)
            .as_kind(TokenKind::ValueAssignment)
            .unwrap();
        let oid = assignment
            .child(2)
            .unwrap()
            .as_kind(TokenKind::ObjectIdentifierValue)
            .unwrap();
        assert_eq!(oid.elements.len(), 3);
        assert!(oid.child(0).unwrap().as_kind(TokenKind::NameForm).is_some());
        assert!(oid.child(1).unwrap().as_kind(TokenKind::NameAndNumberForm).is_some());
        assert!(oid.child(2).unwrap().as_kind(TokenKind::NumberForm).is_some());
    }

    #[test]
    fn exports_and_imports() {
        let source = "M DEFINITIONS ::= BEGIN
            EXPORTS Certificate, name;
            IMPORTS Foo, bar FROM Other
                    Baz FROM Third { iso 3 };
            A ::= Foo
        END";
        let module = parse_one(source);
        let body = module
            .as_kind(TokenKind::ModuleDefinition)
            .unwrap()
            .child(4)
            .unwrap()
            .as_kind(TokenKind::ModuleBody)
            .unwrap();
        let exports = body.child(0).unwrap().as_kind(TokenKind::Exports).unwrap();
        assert_eq!(exports.elements.len(), 2);
        let imports = body.child(1).unwrap().as_kind(TokenKind::Imports).unwrap();
        assert_eq!(imports.elements.len(), 2);
        let group = imports
            .child(0)
            .unwrap()
            .as_kind(TokenKind::SymbolsFromModule)
            .unwrap();
        assert_eq!(group.child(0).unwrap().as_list().unwrap().len(), 2);
    }

    #[test]
    fn comments_between_tokens() {
        let source = "M DEFINITIONS ::= BEGIN -- intro --
            A ::= /* inline */ INTEGER -- trailing
        END";
        parse_one(source);
    }

    #[test]
    fn nested_constructed_types() {
        let source = "M DEFINITIONS ::= BEGIN
            T ::= SEQUENCE {
                inner CHOICE { a INTEGER, b BOOLEAN },
                rest SET OF OCTET STRING
            }
        END";
        parse_one(source);
    }

    #[test]
    fn empty_sequence_body() {
        parse_one("M DEFINITIONS ::= BEGIN T ::= SEQUENCE { } END");
    }
}
