//! The intermediate type graph
//!
//! Every simple type, complex type, anonymous inline type and substitution
//! group of a run becomes one [`TypeDeclaration`], addressed by a dense
//! [`TypeId`]. Declarations refer to each other by qualified name only;
//! the reference index maps each name to exactly one declaration, so cyclic
//! schemas never need recursive-by-value structures.

mod builder;
mod builtins;

pub use builder::build_graph;
pub use builtins::Builtin;

use std::fmt;

use indexmap::IndexMap;

use crate::error::Position;
use crate::locations::Location;
use crate::namespaces::QName;
use crate::schema::{Compositor, DerivationMethod, Facet, Occurs};

/// Index of a declaration in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reference to a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    /// Built-in XSD datatype
    Builtin(Builtin),
    /// User-defined type by qualified name
    Named(QName),
}

impl TypeRef {
    /// Classify a qualified name
    pub fn from_qname(qname: QName) -> Self {
        match Builtin::from_qname(&qname) {
            Some(builtin) => TypeRef::Builtin(builtin),
            None => TypeRef::Named(qname),
        }
    }

    /// The referenced name, if user-defined
    pub fn as_named(&self) -> Option<&QName> {
        match self {
            TypeRef::Named(qname) => Some(qname),
            TypeRef::Builtin(_) => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Builtin(builtin) => write!(f, "xs:{}", builtin.name()),
            TypeRef::Named(qname) => write!(f, "{}", qname),
        }
    }
}

/// Where a field comes from in the instance document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSource {
    /// Child element
    Element,
    /// Attribute
    Attribute,
    /// Character content (simple content value or mixed text)
    Text,
    /// `xs:any`
    Wildcard,
    /// `xs:anyAttribute`
    AttributeWildcard,
}

/// The type of a field before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A type reference
    Type(TypeRef),
    /// `xs:element ref=`: typed by the global element
    ElementRef(QName),
    /// `xs:attribute ref=`: typed by the global attribute
    AttributeRef(QName),
}

/// One member of a composite type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// XML name (local name of the element or attribute)
    pub name: String,
    /// Element, attribute, text or wildcard
    pub source: FieldSource,
    /// Declared type
    pub ty: FieldType,
    /// Flattened occurrence constraints
    pub occurs: Occurs,
    /// `default=`
    pub default: Option<String>,
    /// `fixed=`
    pub fixed: Option<String>,
    /// `nillable="true"`
    pub nillable: bool,
    /// `use="prohibited"` on an attribute
    pub prohibited: bool,
    /// `xs:documentation` text
    pub documentation: Option<String>,
}

impl Field {
    /// A field with no default, fixed value or documentation
    pub fn new(name: impl Into<String>, source: FieldSource, ty: FieldType, occurs: Occurs) -> Self {
        Self {
            name: name.into(),
            source,
            ty,
            occurs,
            default: None,
            fixed: None,
            nillable: false,
            prohibited: false,
            documentation: None,
        }
    }
}

/// One enumeration literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Literal value
    pub value: String,
    /// `xs:documentation` text of the facet
    pub documentation: Option<String>,
}

/// Derivation of a complex type from a named base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    /// Extension or restriction
    pub method: DerivationMethod,
    /// Base type
    pub base: TypeRef,
}

/// Type declaration kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// A simple type restricting another without enumerating values
    Alias {
        /// Restricted type
        target: TypeRef,
        /// Constraining facets, kept for documentation
        facets: Vec<Facet>,
    },
    /// A simple type restricted to a closed set of literals
    Enumeration {
        /// Restricted type
        base: TypeRef,
        /// Literals in source order
        members: Vec<EnumMember>,
        /// Other facets declared alongside the enumeration
        facets: Vec<Facet>,
    },
    /// A complex type with element content (or none)
    Composite {
        /// Top-level compositor of the content model
        compositor: Option<Compositor>,
        /// `mixed="true"`
        mixed: bool,
        /// `abstract="true"`
        is_abstract: bool,
    },
    /// A complex type with character content and attributes
    SimpleContent {
        /// Base of the value (a simple type, or a complex type with simple content)
        value: TypeRef,
        /// Facets of a `simpleContent` restriction
        facets: Vec<Facet>,
    },
    /// `xs:union`
    Union {
        /// Member types in source order
        members: Vec<TypeRef>,
    },
    /// `xs:list`
    List {
        /// Item type
        item: TypeRef,
    },
    /// The closed set of elements that may stand in for a head element
    SubstitutionGroup {
        /// Head element
        head: QName,
        /// Non-abstract head and transitive members, sorted by qualified name
        alternatives: Vec<QName>,
    },
}

impl TypeKind {
    /// Short label for diagnostics and inspection
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Alias { .. } => "alias",
            TypeKind::Enumeration { .. } => "enumeration",
            TypeKind::Composite { .. } => "composite",
            TypeKind::SimpleContent { .. } => "simple-content",
            TypeKind::Union { .. } => "union",
            TypeKind::List { .. } => "list",
            TypeKind::SubstitutionGroup { .. } => "substitution-group",
        }
    }

    /// Whether values of this kind are character data
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            TypeKind::Alias { .. }
                | TypeKind::Enumeration { .. }
                | TypeKind::Union { .. }
                | TypeKind::List { .. }
        )
    }
}

/// Kind of component an anonymous type is nested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnonymousKind {
    /// Inline type of an element
    Element,
    /// Inline type of an attribute
    Attribute,
    /// Inline item type of a list
    ListItem,
    /// Inline member of a union (0-based)
    UnionMember(usize),
    /// Inline base of a restriction
    RestrictionBase,
}

/// The position of an anonymous type in the component tree
///
/// `segments` are the names of the enclosing components, outermost first:
/// `["PurchaseOrder", "items", "item"]` for the type of `item` inside
/// `items` inside the top-level `PurchaseOrder`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousPath {
    /// Namespace the type is placed in
    pub namespace: Option<String>,
    /// Enclosing component names
    pub segments: Vec<String>,
    /// What the type is the inline type of
    pub kind: AnonymousKind,
}

impl AnonymousPath {
    /// Name of the innermost enclosing component
    pub fn enclosing(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("Anonymous")
    }

    /// Suffix distinguishing what kind of inline type this is
    pub fn suffix(&self) -> String {
        match self.kind {
            AnonymousKind::Element | AnonymousKind::Attribute => "Type".to_string(),
            AnonymousKind::ListItem => "Item".to_string(),
            AnonymousKind::UnionMember(index) => format!("Member{}", index + 1),
            AnonymousKind::RestrictionBase => "Base".to_string(),
        }
    }

    /// Path extended by one component
    pub fn child(&self, segment: &str, kind: AnonymousKind) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self {
            namespace: self.namespace.clone(),
            segments,
            kind,
        }
    }
}

/// How a declaration came to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrigin {
    /// A named top-level type
    Declared,
    /// An inline type, named by the anonymous naming strategy
    Anonymous(AnonymousPath),
    /// Created by the builder (substitution groups)
    Synthesized,
}

/// A named or anonymous schema type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    /// Qualified name (synthesized for anonymous types)
    pub qname: QName,
    /// Declared, anonymous or synthesized
    pub origin: TypeOrigin,
    /// Kind with kind-specific data
    pub kind: TypeKind,
    /// Complex type derivation
    pub derivation: Option<Derivation>,
    /// Declared fields (attributes and content particles) in source order
    pub fields: Vec<Field>,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// Defining document
    pub location: Location,
    /// Position inside the defining document
    pub position: Position,
    /// Position of the declaration in its document's top-level order
    pub order: usize,
}

impl TypeDeclaration {
    /// Whether the name was synthesized rather than declared
    pub fn is_synthesized(&self) -> bool {
        !matches!(self.origin, TypeOrigin::Declared)
    }

    /// Every named type reference in this declaration
    pub fn references(&self) -> Vec<&QName> {
        let mut refs = Vec::new();
        match &self.kind {
            TypeKind::Alias { target, .. } => refs.extend(target.as_named()),
            TypeKind::Enumeration { base, .. } => refs.extend(base.as_named()),
            TypeKind::SimpleContent { value, .. } => refs.extend(value.as_named()),
            TypeKind::Union { members } => refs.extend(members.iter().filter_map(TypeRef::as_named)),
            TypeKind::List { item } => refs.extend(item.as_named()),
            TypeKind::Composite { .. } | TypeKind::SubstitutionGroup { .. } => {}
        }
        if let Some(ref derivation) = self.derivation {
            refs.extend(derivation.base.as_named());
        }
        for field in &self.fields {
            if let FieldType::Type(ref ty) = field.ty {
                refs.extend(ty.as_named());
            }
        }
        refs
    }
}

/// A global element declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDeclaration {
    /// Qualified name
    pub qname: QName,
    /// Declared type; `None` means the head's type or `anyType`
    pub ty: Option<TypeRef>,
    /// `default=`
    pub default: Option<String>,
    /// `fixed=`
    pub fixed: Option<String>,
    /// `nillable="true"`
    pub nillable: bool,
    /// `abstract="true"`
    pub is_abstract: bool,
    /// Substitution group heads
    pub substitution_group: Vec<QName>,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// Defining document
    pub location: Location,
    /// Source position
    pub position: Position,
}

/// A global attribute declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDeclaration {
    /// Qualified name
    pub qname: QName,
    /// Declared type
    pub ty: TypeRef,
    /// `default=`
    pub default: Option<String>,
    /// `fixed=`
    pub fixed: Option<String>,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// Defining document
    pub location: Location,
    /// Source position
    pub position: Position,
}

/// All declarations of a run plus the reference index
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    pub(crate) types: Vec<TypeDeclaration>,
    pub(crate) index: IndexMap<QName, TypeId>,
    pub(crate) elements: IndexMap<QName, ElementDeclaration>,
    pub(crate) attributes: IndexMap<QName, AttributeDeclaration>,
    pub(crate) substitution_groups: IndexMap<QName, TypeId>,
}

impl TypeGraph {
    /// Number of declarations
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the graph has no declarations
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declaration by id
    pub fn get(&self, id: TypeId) -> &TypeDeclaration {
        &self.types[id.0]
    }

    /// Look up a type by qualified name
    pub fn lookup(&self, qname: &QName) -> Option<TypeId> {
        self.index.get(qname).copied()
    }

    /// All declarations with their ids
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDeclaration)> {
        self.types.iter().enumerate().map(|(i, t)| (TypeId(i), t))
    }

    /// Global element by qualified name
    pub fn element(&self, qname: &QName) -> Option<&ElementDeclaration> {
        self.elements.get(qname)
    }

    /// Global elements, sorted by qualified name
    pub fn elements(&self) -> impl Iterator<Item = &ElementDeclaration> {
        self.elements.values()
    }

    /// Global attribute by qualified name
    pub fn attribute(&self, qname: &QName) -> Option<&AttributeDeclaration> {
        self.attributes.get(qname)
    }

    /// The synthesized substitution group type for a head element
    pub fn substitution_group(&self, head: &QName) -> Option<TypeId> {
        self.substitution_groups.get(head).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_path() {
        let root = AnonymousPath {
            namespace: None,
            segments: vec!["Order".to_string()],
            kind: AnonymousKind::Element,
        };
        let item = root.child("item", AnonymousKind::Element);
        assert_eq!(item.enclosing(), "item");
        assert_eq!(item.segments, vec!["Order", "item"]);
        assert_eq!(item.suffix(), "Type");
        assert_eq!(root.child("codes", AnonymousKind::UnionMember(1)).suffix(), "Member2");
    }

    #[test]
    fn test_type_ref_classification() {
        let xs = QName::namespaced(crate::namespaces::XSD_NAMESPACE, "string");
        assert_eq!(TypeRef::from_qname(xs), TypeRef::Builtin(Builtin::String));
        let user = QName::namespaced("urn:a", "string");
        assert_eq!(TypeRef::from_qname(user.clone()), TypeRef::Named(user));
    }
}
