//! Semantic resolution
//!
//! Turns the [`TypeGraph`](crate::graph::TypeGraph) into a [`ResolvedGraph`]:
//! every reference checked, derivations flattened into field lists,
//! anonymous aliases collapsed, cycles broken by indirection and every type,
//! field and variant given its final identifier.

mod cycles;
mod derivation;
mod naming;
mod policy;
mod resolver;

pub use resolver::resolve;

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::error::Position;
use crate::graph::{FieldSource, TypeOrigin, TypeRef};
use crate::locations::Location;
use crate::namespaces::QName;
use crate::schema::{Facet, Occurs};

/// How many values a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Exactly one
    Required,
    /// Zero or one
    Optional,
    /// Any number
    Repeated,
}

impl Cardinality {
    /// Cardinality of an occurrence range
    pub fn from_occurs(occurs: Occurs, nillable: bool) -> Self {
        if occurs.is_repeated() {
            Cardinality::Repeated
        } else if occurs.is_optional() || nillable {
            Cardinality::Optional
        } else {
            Cardinality::Required
        }
    }

    /// Label used by inspection output
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Required => "required",
            Cardinality::Optional => "optional",
            Cardinality::Repeated => "repeated",
        }
    }
}

/// A member of a resolved structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// XML name
    pub name: String,
    /// Generated identifier, unique within the owning type
    pub ident: String,
    /// Element, attribute, text or wildcard
    pub source: FieldSource,
    /// Resolved type; named references always exist in the graph
    pub ty: TypeRef,
    /// Occurrence range after group flattening
    pub occurs: Occurs,
    /// Required, optional or repeated
    pub cardinality: Cardinality,
    /// Held behind a pointer to break a containment cycle
    pub indirect: bool,
    /// `default=`
    pub default: Option<String>,
    /// `fixed=`
    pub fixed: Option<String>,
    /// `xs:documentation` text
    pub documentation: Option<String>,
}

/// One enumeration literal with its identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMember {
    /// Literal value
    pub value: String,
    /// Variant identifier
    pub ident: String,
    /// `xs:documentation` text
    pub documentation: Option<String>,
}

/// One arm of a union or substitution group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    /// Variant identifier
    pub ident: String,
    /// Payload type
    pub ty: TypeRef,
    /// Substituting element, for substitution groups
    pub element: Option<QName>,
    /// Payload held behind a pointer to break a containment cycle
    pub indirect: bool,
}

/// The generated form of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A record of fields
    Struct {
        /// Fields: base fields first, then declared ones
        fields: Vec<ResolvedField>,
        /// `abstract="true"`
        is_abstract: bool,
    },
    /// A closed set of literals
    Enumeration {
        /// Lexical base type
        base: TypeRef,
        /// Literals in source order
        members: Vec<ResolvedMember>,
    },
    /// A new name for another type
    Alias {
        /// Aliased type
        target: TypeRef,
        /// Constraining facets, carried as documentation
        facets: Vec<Facet>,
    },
    /// Whitespace-separated list of values
    List {
        /// Item type
        item: TypeRef,
    },
    /// A value of one of several simple types
    Union {
        /// Member types in source order
        variants: Vec<ResolvedVariant>,
    },
    /// One of the elements allowed in place of a head element
    Substitution {
        /// Head element
        head: QName,
        /// Alternatives sorted by element name
        variants: Vec<ResolvedVariant>,
    },
}

impl Shape {
    /// Short label for inspection output
    pub fn label(&self) -> &'static str {
        match self {
            Shape::Struct { .. } => "struct",
            Shape::Enumeration { .. } => "enumeration",
            Shape::Alias { .. } => "alias",
            Shape::List { .. } => "list",
            Shape::Union { .. } => "union",
            Shape::Substitution { .. } => "substitution-group",
        }
    }

    /// Every named type this shape refers to
    pub fn references(&self) -> Vec<&QName> {
        match self {
            Shape::Struct { fields, .. } => fields.iter().filter_map(|f| f.ty.as_named()).collect(),
            Shape::Enumeration { base, .. } => base.as_named().into_iter().collect(),
            Shape::Alias { target, .. } => target.as_named().into_iter().collect(),
            Shape::List { item } => item.as_named().into_iter().collect(),
            Shape::Union { variants } | Shape::Substitution { variants, .. } => {
                variants.iter().filter_map(|v| v.ty.as_named()).collect()
            }
        }
    }
}

/// A type ready for emission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    /// Qualified name
    pub qname: QName,
    /// Generated identifier, unique across the run
    pub ident: String,
    /// Declared, anonymous or synthesized
    pub origin: TypeOrigin,
    /// Generated form
    pub shape: Shape,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// Defining document
    pub location: Location,
    /// Position in the defining document
    pub position: Position,
    /// Top-level declaration order in the defining document
    pub order: usize,
}

impl ResolvedType {
    /// Whether the type was named by the generator
    pub fn is_synthesized(&self) -> bool {
        !matches!(self.origin, TypeOrigin::Declared)
    }
}

/// A global element usable as a document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootElement {
    /// Element name
    pub qname: QName,
    /// Element type
    pub ty: TypeRef,
    /// `abstract="true"`
    pub is_abstract: bool,
}

/// The output of resolution
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    pub(crate) types: IndexMap<QName, ResolvedType>,
    pub(crate) elements: Vec<RootElement>,
}

impl ResolvedGraph {
    /// Number of types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type survived resolution
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Type by qualified name
    pub fn get(&self, qname: &QName) -> Option<&ResolvedType> {
        self.types.get(qname)
    }

    /// All types, sorted by qualified name
    pub fn types(&self) -> impl Iterator<Item = &ResolvedType> {
        self.types.values()
    }

    /// Global elements, sorted by qualified name
    pub fn elements(&self) -> &[RootElement] {
        &self.elements
    }

    /// Every namespace holding at least one type or element
    pub fn namespaces(&self) -> BTreeSet<Option<String>> {
        self.types
            .keys()
            .chain(self.elements.iter().map(|e| &e.qname))
            .map(|q| q.namespace.clone())
            .collect()
    }

    /// Identifier of a named type
    pub fn ident_of(&self, qname: &QName) -> Option<&str> {
        self.types.get(qname).map(|t| t.ident.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MaxOccurs;

    #[test]
    fn test_cardinality_from_occurs() {
        assert_eq!(Cardinality::from_occurs(Occurs::ONCE, false), Cardinality::Required);
        assert_eq!(Cardinality::from_occurs(Occurs::ONCE, true), Cardinality::Optional);
        assert_eq!(Cardinality::from_occurs(Occurs::OPTIONAL, false), Cardinality::Optional);
        assert_eq!(
            Cardinality::from_occurs(Occurs::new(1, MaxOccurs::Unbounded), false),
            Cardinality::Repeated
        );
        assert_eq!(
            Cardinality::from_occurs(Occurs::new(0, MaxOccurs::Bounded(2)), true),
            Cardinality::Repeated
        );
    }
}
