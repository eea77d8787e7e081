//! The tagged concrete syntax tree produced by the parser.
//!
//! A parsed module is a tree of [`ParseNode`]s. Interior nodes are
//! [`TaggedToken`]s carrying a [`TokenKind`] tag attached at a production
//! boundary; leaves are raw lexemes. Grouped sub-productions (braced lists,
//! symbol lists) appear as [`ParseNode::List`], and an absent optional
//! production appears as [`ParseNode::Empty`] so that sibling positions stay
//! stable. The tree is immutable after parsing; the semantic builder is its
//! only consumer besides the `--stage parse` dump.
//!
//! ## Child layout contract
//!
//! The semantic builder relies on a fixed child layout per tag:
//!
//! | Tag | Children |
//! |-----|----------|
//! | `ModuleDefinition` | `ModuleReference`, `DefinitiveIdentifier`, tag-default leaf or `Empty`, extensibility leaf or `Empty`, `ModuleBody` |
//! | `ModuleBody` | `Exports` or `Empty`, `Imports` or `Empty`, `AssignmentList` |
//! | `Exports` | symbol leaves |
//! | `Imports` | `SymbolsFromModule` tokens |
//! | `SymbolsFromModule` | `List` of symbol leaves, `GlobalModuleReference` |
//! | `GlobalModuleReference` | `ModuleReference`, `ObjectIdentifierValue` or `Empty` |
//! | `TypeAssignment` | name leaf, `Type` |
//! | `ValueAssignment` | name leaf, `Type`, value node |
//! | `Type` | the underlying type token |
//! | `SimpleType` | type-name leaf, then optionally a constraint token |
//! | `ValueListType` | type-name leaf, `List` of `NamedValue`/`ExtensionMarker`, constraint or `Empty` |
//! | `BitStringType` | type-name leaf, `List` of `NamedValue`, constraint or `Empty` |
//! | `SequenceType`/`SetType` | keyword leaf, `List` of `ComponentType`/`ExtensionMarker` |
//! | `ChoiceType` | keyword leaf, `List` of `NamedType`/`ExtensionMarker` |
//! | `SequenceOfType`/`SetOfType` | `SizeConstraint` or `Empty`, `Type` or `NamedType` |
//! | `TaggedType` | `Tag`, implicitness leaf or `Empty`, `Type` |
//! | `Tag` | optional `TagClass`, `TagClassNumber` |
//! | `ComponentType` | one of `ComponentTypeOptional`/`ComponentTypeDefault`/`ComponentTypeComponentsOf`/`NamedType` |
//! | `ComponentTypeOptional` | `NamedType` |
//! | `ComponentTypeDefault` | `NamedType`, value node |
//! | `ComponentTypeComponentsOf` | `Type` |
//! | `NamedType` | `Identifier`, `Type` |
//! | `NamedValue` | `Identifier`, then optionally `Value` |
//! | `DefinedType` | `ModuleReference` or `Empty`, name leaf, `SizeConstraint` or `Empty` |
//! | `SelectionType` | `Identifier`, `Type` |
//! | `SingleValueConstraint` | value node |
//! | `ValueRangeConstraint` | lower bound node, upper bound node |
//! | `SizeConstraint` | nested constraint token |
//! | `ObjectIdentifierValue` | `NameForm`/`NumberForm`/`NameAndNumberForm`/`ReferencedValue` tokens |
//! | `NameForm`, `NumberForm`, `DefinitiveNumberForm` | one leaf |
//! | `NameAndNumberForm` | `NameForm`, `NumberForm` |
//! | `DefinitiveNameAndNumberForm` | `NameForm`, `DefinitiveNumberForm` |
//! | `ReferencedValue` | optional `ModuleReference`, name leaf |
//! | `BinaryStringValue`/`HexStringValue`/`CharacterStringValue` | one leaf |
//! | `ModuleReference`, `Identifier`, `TagClass`, `TagClassNumber`, `Value` | one leaf |
//! | `DefinitiveIdentifier` | zero or more definitive OID component tokens |
//! | `AssignmentList` | `TypeAssignment`/`ValueAssignment` tokens |
//! | `ExtensionMarker` | none |

use serde::Serialize;
use std::fmt::Write as _;

/// Tag attached to a production of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    ModuleDefinition,
    ModuleReference,
    GlobalModuleReference,
    DefinitiveIdentifier,
    ModuleBody,
    Exports,
    Imports,
    SymbolsFromModule,
    AssignmentList,
    TypeAssignment,
    ValueAssignment,
    Type,
    SimpleType,
    ValueListType,
    BitStringType,
    SequenceType,
    SetType,
    ChoiceType,
    SequenceOfType,
    SetOfType,
    TaggedType,
    SelectionType,
    DefinedType,
    ComponentType,
    ComponentTypeOptional,
    ComponentTypeDefault,
    ComponentTypeComponentsOf,
    NamedType,
    NamedValue,
    Value,
    Tag,
    TagClass,
    TagClassNumber,
    Identifier,
    SingleValueConstraint,
    ValueRangeConstraint,
    SizeConstraint,
    ExtensionMarker,
    NameForm,
    NumberForm,
    NameAndNumberForm,
    DefinitiveNumberForm,
    DefinitiveNameAndNumberForm,
    ObjectIdentifierValue,
    BinaryStringValue,
    HexStringValue,
    CharacterStringValue,
    ReferencedValue,
}

/// An interior node: a production tag and its child nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedToken {
    pub kind: TokenKind,
    pub elements: Vec<ParseNode>,
}

impl TaggedToken {
    /// Child at position `i`, if present.
    pub fn child(&self, i: usize) -> Option<&ParseNode> {
        self.elements.get(i)
    }
}

/// A node of the concrete syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParseNode {
    /// A tagged production.
    Token(TaggedToken),
    /// A grouped sub-list (braced list, symbol list).
    List(Vec<ParseNode>),
    /// A raw lexeme.
    Leaf(String),
    /// An absent optional production.
    Empty,
}

impl ParseNode {
    /// Shorthand for building a tagged token node.
    pub fn token(kind: TokenKind, elements: Vec<ParseNode>) -> Self {
        ParseNode::Token(TaggedToken { kind, elements })
    }

    /// Shorthand for building a leaf from any string-ish value.
    pub fn leaf(text: impl Into<String>) -> Self {
        ParseNode::Leaf(text.into())
    }

    /// Returns the tagged token if this node is one.
    pub fn as_token(&self) -> Option<&TaggedToken> {
        match self {
            ParseNode::Token(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the tagged token if this node carries the given tag.
    pub fn as_kind(&self, kind: TokenKind) -> Option<&TaggedToken> {
        self.as_token().filter(|t| t.kind == kind)
    }

    /// Returns the lexeme if this node is a leaf.
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ParseNode::Leaf(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the grouped children if this node is a list.
    pub fn as_list(&self) -> Option<&[ParseNode]> {
        match self {
            ParseNode::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` for an absent optional production.
    pub fn is_absent(&self) -> bool {
        matches!(self, ParseNode::Empty)
    }

    /// Dumps the tree in indented form, one node per line.
    ///
    /// This is the `--stage parse` output format.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        let pad = " ".repeat(indent);
        match self {
            ParseNode::Token(t) => {
                let _ = writeln!(out, "{}{:?}:", pad, t.kind);
                for child in &t.elements {
                    child.dump_into(out, indent + 2);
                }
            }
            ParseNode::List(items) => {
                let _ = writeln!(out, "{}[", pad);
                for item in items {
                    item.dump_into(out, indent + 2);
                }
                let _ = writeln!(out, "{}]", pad);
            }
            ParseNode::Leaf(s) => {
                let _ = writeln!(out, "{}{}", pad, s);
            }
            ParseNode::Empty => {
                let _ = writeln!(out, "{}-", pad);
            }
        }
    }
}
