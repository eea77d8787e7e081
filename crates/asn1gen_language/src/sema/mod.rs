//! The typed, name-resolved semantic model of an ASN.1 module.
//!
//! [`build_semantic_model`] lifts the tagged parse tree into [`Module`]
//! values whose types, values, constraints and components are sum types.
//! Back ends consume the model through the resolver services on [`Module`]:
//!
//! - [`Module::resolve_type_decl`] follows reference and tag chains to the
//!   underlying type, searching imported modules by name,
//! - [`Module::resolve_selection_type`] looks up a CHOICE alternative,
//! - [`Module::resolve_tag_implicitness`] applies the module tag default and
//!   the rule that CHOICE and open types cannot be implicitly tagged,
//! - [`Module::resolve_components_of`] expands a `COMPONENTS OF` referent,
//! - [`Module::descendants`] walks every reachable node in pre-order.
//!
//! The model is built once per invocation and read-only afterwards.

mod build;
pub mod oids;

pub use build::build_semantic_model;

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A semantic-analysis failure, fatal to the invocation.
#[derive(Debug, Clone)]
pub enum SemaError {
    /// A type or value reference with no local or imported target.
    UndefinedReference(String),
    /// `COMPONENTS OF X` where X is not a SEQUENCE or SET.
    BadComponentsOf(String),
    /// `x < T` where T has no alternative named `x`.
    UnknownSelection { member: String, choice: String },
    /// A syntactically accepted construct outside the modeled subset.
    UnsupportedConstruct(String),
}

impl fmt::Display for SemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemaError::UndefinedReference(name) => {
                write!(f, "undefined reference: {}", name)
            }
            SemaError::BadComponentsOf(name) => {
                write!(f, "COMPONENTS OF {} does not refer to a SEQUENCE or SET", name)
            }
            SemaError::UnknownSelection { member, choice } => {
                write!(f, "no alternative named {} in {}", member, choice)
            }
            SemaError::UnsupportedConstruct(detail) => {
                write!(f, "unsupported construct: {}", detail)
            }
        }
    }
}

impl std::error::Error for SemaError {}

// ---------------------------------------------------------------------------
// Modules and assignments
// ---------------------------------------------------------------------------

/// Module-level tagging environment from the `DEFINITIONS` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagDefault {
    Unspecified,
    Explicit,
    Implicit,
    Automatic,
}

/// The `EXPORTS` clause; an absent clause exports everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Exports {
    All,
    Named(Vec<String>),
}

/// One `symbols FROM Module` group of the `IMPORTS` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedSymbols {
    pub module: String,
    pub symbols: Vec<String>,
}

/// A fully built ASN.1 module.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub name: String,
    pub definitive_identifier: Option<Vec<OidComponent>>,
    pub tag_default: TagDefault,
    pub extensibility_implied: bool,
    pub exports: Exports,
    pub imports: Vec<ImportedSymbols>,
    pub assignments: Vec<Assignment>,
}

/// A top-level `Name ::= ...` of a module.
#[derive(Debug, Clone, Serialize)]
pub enum Assignment {
    Type(TypeAssignment),
    Value(ValueAssignment),
}

impl Assignment {
    /// The assigned type or value name.
    pub fn name(&self) -> &str {
        match self {
            Assignment::Type(assignment) => &assignment.name,
            Assignment::Value(assignment) => &assignment.name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeAssignment {
    pub name: String,
    pub type_decl: TypeNode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueAssignment {
    pub name: String,
    pub type_decl: TypeNode,
    pub value: ValueNode,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A type expression.
#[derive(Debug, Clone, Serialize)]
pub enum TypeNode {
    Simple(SimpleType),
    ValueList(ValueListType),
    BitString(BitStringType),
    Constructed(ConstructedType),
    Collection(CollectionType),
    Tagged(TaggedType),
    Selection(SelectionType),
    Defined(DefinedType),
}

impl TypeNode {
    /// The ASN.1 name of this type: the builtin keyword for builtins, the
    /// referenced name for defined types. Tags are transparent.
    pub fn type_name(&self) -> &str {
        match self {
            TypeNode::Simple(simple) => &simple.type_name,
            TypeNode::ValueList(list) => &list.type_name,
            TypeNode::BitString(_) => "BIT STRING",
            TypeNode::Constructed(constructed) => constructed.kind.type_name(),
            TypeNode::Collection(collection) => collection.kind.type_name(),
            TypeNode::Tagged(tagged) => tagged.type_decl.type_name(),
            TypeNode::Selection(selection) => selection.type_decl.type_name(),
            TypeNode::Defined(defined) => &defined.type_name,
        }
    }

    /// CHOICE and ANY take no implicit tag; an implicit tag on them is
    /// forced explicit during tag resolution.
    pub fn is_open_type(&self) -> bool {
        match self {
            TypeNode::Simple(simple) => simple.type_name == "ANY",
            TypeNode::Constructed(constructed) => constructed.kind == ConstructedKind::Choice,
            _ => false,
        }
    }
}

/// BOOLEAN, plain INTEGER, REAL, NULL, OBJECT IDENTIFIER, OCTET STRING, the
/// character string family, the useful types, and ANY.
#[derive(Debug, Clone, Serialize)]
pub struct SimpleType {
    pub type_name: String,
    pub constraint: Option<Constraint>,
}

/// INTEGER or ENUMERATED with named values.
#[derive(Debug, Clone, Serialize)]
pub struct ValueListType {
    pub type_name: String,
    pub named_values: Vec<NamedValue>,
    pub constraint: Option<Constraint>,
}

/// BIT STRING, with or without named bits.
#[derive(Debug, Clone, Serialize)]
pub struct BitStringType {
    pub named_bits: Vec<NamedValue>,
    pub constraint: Option<Constraint>,
}

/// An entry of a named-value or named-bit list.
#[derive(Debug, Clone, Serialize)]
pub enum NamedValue {
    /// `red(0)`, or a bare `red` inside ENUMERATED.
    Named {
        identifier: String,
        value: Option<i64>,
    },
    /// The `...` marker; kept in place, dropped at emission.
    ExtensionMarker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstructedKind {
    Sequence,
    Set,
    Choice,
}

impl ConstructedKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ConstructedKind::Sequence => "SEQUENCE",
            ConstructedKind::Set => "SET",
            ConstructedKind::Choice => "CHOICE",
        }
    }
}

/// SEQUENCE, SET or CHOICE with an ordered component list.
#[derive(Debug, Clone, Serialize)]
pub struct ConstructedType {
    pub kind: ConstructedKind,
    pub components: Vec<ComponentType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectionKind {
    SequenceOf,
    SetOf,
}

impl CollectionKind {
    pub fn type_name(self) -> &'static str {
        match self {
            CollectionKind::SequenceOf => "SEQUENCE OF",
            CollectionKind::SetOf => "SET OF",
        }
    }
}

/// SEQUENCE OF or SET OF.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionType {
    pub kind: CollectionKind,
    pub size_constraint: Option<Constraint>,
    /// `SEQUENCE OF name Type` names the element; the name plays no role in
    /// emission.
    pub element_name: Option<String>,
    pub element: Box<TypeNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagClass {
    Universal,
    Application,
    Private,
    /// The default when no class keyword is written.
    Context,
}

/// Written implicitness of a tag; `Default` defers to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagImplicitness {
    Implicit,
    Explicit,
    Default,
}

/// Implicitness after applying the module default and the open-type rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedImplicitness {
    Implicit,
    Explicit,
}

/// `[class number] IMPLICIT/EXPLICIT Type`.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedType {
    pub class: TagClass,
    pub class_number: u32,
    pub implicitness: TagImplicitness,
    pub type_decl: Box<TypeNode>,
}

/// `alternative < ChoiceType`.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionType {
    pub identifier: String,
    pub type_decl: Box<TypeNode>,
}

/// A reference to a type defined in this or another module.
#[derive(Debug, Clone, Serialize)]
pub struct DefinedType {
    pub module_ref: Option<String>,
    pub type_name: String,
    pub size_constraint: Option<Constraint>,
}

/// A member of a SEQUENCE, SET or CHOICE component list.
#[derive(Debug, Clone, Serialize)]
pub enum ComponentType {
    Named(NamedComponent),
    Optional(NamedComponent),
    Defaulted(NamedComponent, ValueNode),
    /// Literal inclusion of all components of another constructed type;
    /// expanded by back ends, not during model building.
    ComponentsOf(TypeNode),
    ExtensionMarker,
}

impl ComponentType {
    /// The named member, when this component is one.
    pub fn named(&self) -> Option<&NamedComponent> {
        match self {
            ComponentType::Named(component)
            | ComponentType::Optional(component)
            | ComponentType::Defaulted(component, _) => Some(component),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedComponent {
    pub identifier: String,
    pub type_decl: TypeNode,
}

// ---------------------------------------------------------------------------
// Values and constraints
// ---------------------------------------------------------------------------

/// A value expression.
#[derive(Debug, Clone, Serialize)]
pub enum ValueNode {
    Boolean(bool),
    Integer(i64),
    /// Real literals keep their source lexeme for faithful emission.
    Real(String),
    Null,
    BinaryString(String),
    HexString(String),
    CharacterString(String),
    Referenced {
        module_ref: Option<String>,
        name: String,
    },
    ObjectIdentifier(Vec<OidComponent>),
}

/// One arc of an OBJECT IDENTIFIER value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OidComponent {
    Name(String),
    Number(u64),
    NameAndNumber(String, u64),
    /// `Module.value` appearing as a component.
    Reference { module_ref: String, name: String },
}

/// The modeled constraint subset.
#[derive(Debug, Clone, Serialize)]
pub enum Constraint {
    SingleValue(ValueNode),
    ValueRange(RangeBound, RangeBound),
    Size(Box<Constraint>),
}

/// An endpoint of a value range.
#[derive(Debug, Clone, Serialize)]
pub enum RangeBound {
    Value(ValueNode),
    Min,
    Max,
}

// ---------------------------------------------------------------------------
// Resolver services
// ---------------------------------------------------------------------------

fn find_module<'a>(referenced: &'a [Module], name: &str) -> Option<&'a Module> {
    referenced.iter().find(|module| module.name == name)
}

impl Module {
    /// Looks up a local type assignment by name.
    fn local_type(&self, name: &str) -> Option<&TypeNode> {
        self.assignments.iter().find_map(|assignment| match assignment {
            Assignment::Type(type_assignment) if type_assignment.name == name => {
                Some(&type_assignment.type_decl)
            }
            _ => None,
        })
    }

    /// The import group carrying `symbol`, if any.
    fn import_source(&self, symbol: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|group| group.symbols.iter().any(|s| s == symbol))
            .map(|group| group.module.as_str())
    }

    /// Resolves one `DefinedType` step to the module and type it names.
    fn lookup_defined<'a>(
        &'a self,
        defined: &DefinedType,
        referenced: &'a [Module],
    ) -> Result<(&'a Module, &'a TypeNode), SemaError> {
        let home: &Module = match &defined.module_ref {
            Some(module_name) if *module_name != self.name => {
                find_module(referenced, module_name)
                    .ok_or_else(|| SemaError::UndefinedReference(defined.type_name.clone()))?
            }
            _ => self,
        };
        if let Some(node) = home.local_type(&defined.type_name) {
            return Ok((home, node));
        }
        if std::ptr::eq(home, self) {
            if let Some(source) = self.import_source(&defined.type_name) {
                if let Some(module) = find_module(referenced, source) {
                    if let Some(node) = module.local_type(&defined.type_name) {
                        return Ok((module, node));
                    }
                }
            }
        }
        Err(SemaError::UndefinedReference(defined.type_name.clone()))
    }

    /// Follows `DefinedType` and `TaggedType` chains until the underlying
    /// constructed or primitive type is found.
    ///
    /// Imports are searched across `referenced` by module name. A reference
    /// chain that cycles without reaching a concrete type is reported as an
    /// undefined reference.
    pub fn resolve_type_decl<'a>(
        &'a self,
        type_decl: &'a TypeNode,
        referenced: &'a [Module],
    ) -> Result<&'a TypeNode, SemaError> {
        let mut current: &Module = self;
        let mut node = type_decl;
        let mut visited: HashSet<(&str, &str)> = HashSet::new();
        loop {
            match node {
                TypeNode::Tagged(tagged) => node = &tagged.type_decl,
                TypeNode::Defined(defined) => {
                    if !visited.insert((current.name.as_str(), defined.type_name.as_str())) {
                        return Err(SemaError::UndefinedReference(defined.type_name.clone()));
                    }
                    let (next_module, next_node) = current.lookup_defined(defined, referenced)?;
                    current = next_module;
                    node = next_node;
                }
                _ => return Ok(node),
            }
        }
    }

    /// Looks up the alternative a selection type names inside its CHOICE.
    pub fn resolve_selection_type<'a>(
        &'a self,
        selection: &'a SelectionType,
        referenced: &'a [Module],
    ) -> Result<&'a NamedComponent, SemaError> {
        let resolved = self.resolve_type_decl(&selection.type_decl, referenced)?;
        let unknown = || SemaError::UnknownSelection {
            member: selection.identifier.clone(),
            choice: selection.type_decl.type_name().to_string(),
        };
        let choice = match resolved {
            TypeNode::Constructed(constructed) if constructed.kind == ConstructedKind::Choice => {
                constructed
            }
            _ => return Err(unknown()),
        };
        choice
            .components
            .iter()
            .filter_map(ComponentType::named)
            .find(|component| component.identifier == selection.identifier)
            .ok_or_else(unknown)
    }

    /// Expands a `COMPONENTS OF` referent to its component list.
    ///
    /// The referent must resolve to a SEQUENCE or SET.
    pub fn resolve_components_of<'a>(
        &'a self,
        type_decl: &'a TypeNode,
        referenced: &'a [Module],
    ) -> Result<&'a [ComponentType], SemaError> {
        let resolved = self.resolve_type_decl(type_decl, referenced)?;
        match resolved {
            TypeNode::Constructed(constructed)
                if constructed.kind != ConstructedKind::Choice =>
            {
                Ok(&constructed.components)
            }
            _ => Err(SemaError::BadComponentsOf(
                type_decl.type_name().to_string(),
            )),
        }
    }

    /// Resolves a tag's implicitness against the module default.
    ///
    /// A `Default` tag takes the module's tag default, with AUTOMATIC
    /// counting as implicit. An implicit result over a CHOICE or ANY inner
    /// type becomes explicit, since those take no implicit tag.
    pub fn resolve_tag_implicitness(
        &self,
        implicitness: TagImplicitness,
        inner: &TypeNode,
        referenced: &[Module],
    ) -> Result<ResolvedImplicitness, SemaError> {
        let base = match implicitness {
            TagImplicitness::Implicit => ResolvedImplicitness::Implicit,
            TagImplicitness::Explicit => ResolvedImplicitness::Explicit,
            TagImplicitness::Default => match self.tag_default {
                TagDefault::Implicit | TagDefault::Automatic => ResolvedImplicitness::Implicit,
                TagDefault::Explicit | TagDefault::Unspecified => ResolvedImplicitness::Explicit,
            },
        };
        if base == ResolvedImplicitness::Implicit
            && self.resolve_type_decl(inner, referenced)?.is_open_type()
        {
            return Ok(ResolvedImplicitness::Explicit);
        }
        Ok(base)
    }

    /// Lazy pre-order walk of every node reachable from this module's
    /// assignments.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack = Vec::new();
        for assignment in self.assignments.iter().rev() {
            match assignment {
                Assignment::Type(type_assignment) => {
                    stack.push(NodeRef::Type(&type_assignment.type_decl));
                }
                Assignment::Value(value_assignment) => {
                    stack.push(NodeRef::Value(&value_assignment.value));
                    stack.push(NodeRef::Type(&value_assignment.type_decl));
                }
            }
        }
        Descendants { stack }
    }
}

/// A reference to any model node, yielded by [`Descendants`].
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Type(&'a TypeNode),
    Component(&'a ComponentType),
    Value(&'a ValueNode),
    Constraint(&'a Constraint),
}

/// Pre-order iterator over model nodes; see [`Module::descendants`].
pub struct Descendants<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> Descendants<'a> {
    /// Walks the nodes of a single assignment.
    pub fn from_assignment(assignment: &'a Assignment) -> Self {
        let mut stack = Vec::new();
        match assignment {
            Assignment::Type(type_assignment) => {
                stack.push(NodeRef::Type(&type_assignment.type_decl));
            }
            Assignment::Value(value_assignment) => {
                stack.push(NodeRef::Value(&value_assignment.value));
                stack.push(NodeRef::Type(&value_assignment.type_decl));
            }
        }
        Descendants { stack }
    }

    fn push_constraint(&mut self, constraint: &'a Option<Constraint>) {
        if let Some(constraint) = constraint {
            self.stack.push(NodeRef::Constraint(constraint));
        }
    }

    fn push_children(&mut self, node: NodeRef<'a>) {
        match node {
            NodeRef::Type(TypeNode::Simple(simple)) => self.push_constraint(&simple.constraint),
            NodeRef::Type(TypeNode::ValueList(list)) => self.push_constraint(&list.constraint),
            NodeRef::Type(TypeNode::BitString(bits)) => self.push_constraint(&bits.constraint),
            NodeRef::Type(TypeNode::Constructed(constructed)) => {
                for component in constructed.components.iter().rev() {
                    self.stack.push(NodeRef::Component(component));
                }
            }
            NodeRef::Type(TypeNode::Collection(collection)) => {
                self.stack.push(NodeRef::Type(&collection.element));
                self.push_constraint(&collection.size_constraint);
            }
            NodeRef::Type(TypeNode::Tagged(tagged)) => {
                self.stack.push(NodeRef::Type(&tagged.type_decl));
            }
            NodeRef::Type(TypeNode::Selection(selection)) => {
                self.stack.push(NodeRef::Type(&selection.type_decl));
            }
            NodeRef::Type(TypeNode::Defined(defined)) => {
                self.push_constraint(&defined.size_constraint);
            }
            NodeRef::Component(component) => match component {
                ComponentType::Named(named) | ComponentType::Optional(named) => {
                    self.stack.push(NodeRef::Type(&named.type_decl));
                }
                ComponentType::Defaulted(named, default) => {
                    self.stack.push(NodeRef::Value(default));
                    self.stack.push(NodeRef::Type(&named.type_decl));
                }
                ComponentType::ComponentsOf(type_decl) => {
                    self.stack.push(NodeRef::Type(type_decl));
                }
                ComponentType::ExtensionMarker => {}
            },
            NodeRef::Constraint(constraint) => match constraint {
                Constraint::SingleValue(value) => self.stack.push(NodeRef::Value(value)),
                Constraint::ValueRange(lower, upper) => {
                    if let RangeBound::Value(value) = upper {
                        self.stack.push(NodeRef::Value(value));
                    }
                    if let RangeBound::Value(value) = lower {
                        self.stack.push(NodeRef::Value(value));
                    }
                }
                Constraint::Size(nested) => self.stack.push(NodeRef::Constraint(nested)),
            },
            NodeRef::Value(_) => {}
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        let node = self.stack.pop()?;
        self.push_children(node);
        Some(node)
    }
}
