//! XSD schema components
//!
//! A closed set of syntax-level components produced by parsing one schema
//! document. References between components are kept as qualified names;
//! nothing here is resolved across documents.

use crate::error::Position;
use crate::namespaces::QName;

/// A top-level declaration in document order
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `xs:simpleType`
    SimpleType(SimpleTypeDef),
    /// `xs:complexType`
    ComplexType(ComplexTypeDef),
    /// `xs:element`
    Element(ElementDecl),
    /// `xs:attribute`
    Attribute(AttributeDecl),
    /// `xs:group`
    Group(GroupDef),
    /// `xs:attributeGroup`
    AttributeGroup(AttributeGroupDef),
}

impl Declaration {
    /// Declared local name
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::SimpleType(d) => d.name.as_deref(),
            Declaration::ComplexType(d) => d.name.as_deref(),
            Declaration::Element(d) => Some(&d.name),
            Declaration::Attribute(d) => Some(&d.name),
            Declaration::Group(d) => Some(&d.name),
            Declaration::AttributeGroup(d) => Some(&d.name),
        }
    }

    /// Source position
    pub fn position(&self) -> Position {
        match self {
            Declaration::SimpleType(d) => d.position,
            Declaration::ComplexType(d) => d.position,
            Declaration::Element(d) => d.position,
            Declaration::Attribute(d) => d.position,
            Declaration::Group(d) => d.position,
            Declaration::AttributeGroup(d) => d.position,
        }
    }

    /// Short kind label for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Declaration::SimpleType(_) => "simpleType",
            Declaration::ComplexType(_) => "complexType",
            Declaration::Element(_) => "element",
            Declaration::Attribute(_) => "attribute",
            Declaration::Group(_) => "group",
            Declaration::AttributeGroup(_) => "attributeGroup",
        }
    }
}

/// `maxOccurs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaxOccurs {
    /// A finite bound
    Bounded(u64),
    /// `unbounded`
    Unbounded,
}

impl MaxOccurs {
    /// Multiply two bounds; `unbounded` absorbs everything except zero
    pub fn multiply(self, other: MaxOccurs) -> MaxOccurs {
        match (self, other) {
            (MaxOccurs::Bounded(0), _) | (_, MaxOccurs::Bounded(0)) => MaxOccurs::Bounded(0),
            (MaxOccurs::Bounded(a), MaxOccurs::Bounded(b)) => MaxOccurs::Bounded(a.saturating_mul(b)),
            _ => MaxOccurs::Unbounded,
        }
    }
}

/// `minOccurs`/`maxOccurs` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    /// Minimum occurrences
    pub min: u64,
    /// Maximum occurrences
    pub max: MaxOccurs,
}

impl Occurs {
    /// Exactly once
    pub const ONCE: Occurs = Occurs {
        min: 1,
        max: MaxOccurs::Bounded(1),
    };

    /// Zero or one
    pub const OPTIONAL: Occurs = Occurs {
        min: 0,
        max: MaxOccurs::Bounded(1),
    };

    /// Create a new occurrence range
    pub fn new(min: u64, max: MaxOccurs) -> Self {
        Self { min, max }
    }

    /// Compose an outer group's occurrence with an inner particle's
    pub fn multiply(self, inner: Occurs) -> Occurs {
        Occurs {
            min: self.min.saturating_mul(inner.min),
            max: self.max.multiply(inner.max),
        }
    }

    /// More than one occurrence allowed
    pub fn is_repeated(&self) -> bool {
        match self.max {
            MaxOccurs::Bounded(n) => n > 1,
            MaxOccurs::Unbounded => true,
        }
    }

    /// Zero occurrences allowed
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// Exactly one occurrence
    pub fn is_single_mandatory(&self) -> bool {
        self.min >= 1 && !self.is_repeated()
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Occurs::ONCE
    }
}

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compositor {
    /// `xs:sequence`
    Sequence,
    /// `xs:choice`
    Choice,
    /// `xs:all`
    All,
}

impl Compositor {
    /// Parse from the XSD element local name
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Compositor::Sequence),
            "choice" => Some(Compositor::Choice),
            "all" => Some(Compositor::All),
            _ => None,
        }
    }

    /// XSD element local name
    pub fn as_str(&self) -> &'static str {
        match self {
            Compositor::Sequence => "sequence",
            Compositor::Choice => "choice",
            Compositor::All => "all",
        }
    }
}

/// Derivation method of a derived type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivationMethod {
    /// `xs:extension`
    Extension,
    /// `xs:restriction`
    Restriction,
}

/// Constraining facet on a simple type restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Facet {
    /// `xs:enumeration`, with its own documentation if any
    Enumeration {
        /// Literal value
        value: String,
        /// Annotation text
        documentation: Option<String>,
    },
    /// `xs:pattern`
    Pattern(String),
    /// `xs:length`
    Length(String),
    /// `xs:minLength`
    MinLength(String),
    /// `xs:maxLength`
    MaxLength(String),
    /// `xs:minInclusive`
    MinInclusive(String),
    /// `xs:maxInclusive`
    MaxInclusive(String),
    /// `xs:minExclusive`
    MinExclusive(String),
    /// `xs:maxExclusive`
    MaxExclusive(String),
    /// `xs:totalDigits`
    TotalDigits(String),
    /// `xs:fractionDigits`
    FractionDigits(String),
    /// `xs:whiteSpace`
    WhiteSpace(String),
}

impl Facet {
    /// Build a non-enumeration facet from its tag and value
    pub fn from_tag(tag: &str, value: &str) -> Option<Self> {
        let value = value.to_string();
        Some(match tag {
            "pattern" => Facet::Pattern(value),
            "length" => Facet::Length(value),
            "minLength" => Facet::MinLength(value),
            "maxLength" => Facet::MaxLength(value),
            "minInclusive" => Facet::MinInclusive(value),
            "maxInclusive" => Facet::MaxInclusive(value),
            "minExclusive" => Facet::MinExclusive(value),
            "maxExclusive" => Facet::MaxExclusive(value),
            "totalDigits" => Facet::TotalDigits(value),
            "fractionDigits" => Facet::FractionDigits(value),
            "whiteSpace" => Facet::WhiteSpace(value),
            _ => return None,
        })
    }

    /// Whether this is an enumeration facet
    pub fn is_enumeration(&self) -> bool {
        matches!(self, Facet::Enumeration { .. })
    }

    /// `whiteSpace` only normalizes; it never constrains the value space
    pub fn constrains_values(&self) -> bool {
        !matches!(self, Facet::Enumeration { .. } | Facet::WhiteSpace(_))
    }

    /// Human-readable rendering used in generated documentation
    pub fn describe(&self) -> String {
        match self {
            Facet::Enumeration { value, .. } => format!("enumeration = {:?}", value),
            Facet::Pattern(v) => format!("pattern = {:?}", v),
            Facet::Length(v) => format!("length = {}", v),
            Facet::MinLength(v) => format!("minLength = {}", v),
            Facet::MaxLength(v) => format!("maxLength = {}", v),
            Facet::MinInclusive(v) => format!("minInclusive = {}", v),
            Facet::MaxInclusive(v) => format!("maxInclusive = {}", v),
            Facet::MinExclusive(v) => format!("minExclusive = {}", v),
            Facet::MaxExclusive(v) => format!("maxExclusive = {}", v),
            Facet::TotalDigits(v) => format!("totalDigits = {}", v),
            Facet::FractionDigits(v) => format!("fractionDigits = {}", v),
            Facet::WhiteSpace(v) => format!("whiteSpace = {}", v),
        }
    }
}

/// A reference to a simple type, either named or defined inline
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleTypeUse {
    /// `type=`/`base=`/`itemType=`/`memberTypes=` reference
    Named(QName),
    /// Nested anonymous `xs:simpleType`
    Inline(Box<SimpleTypeDef>),
}

/// `xs:simpleType`
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTypeDef {
    /// Name (None for anonymous types)
    pub name: Option<String>,
    /// Variety
    pub content: SimpleContent,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// XSD 1.1-only constructs found inside this definition
    pub unsupported: Vec<String>,
    /// Source position
    pub position: Position,
}

/// Simple type variety
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleContent {
    /// `xs:restriction`
    Restriction {
        /// Base type
        base: SimpleTypeUse,
        /// Facets in source order
        facets: Vec<Facet>,
    },
    /// `xs:list`
    List {
        /// Item type
        item: SimpleTypeUse,
    },
    /// `xs:union`
    Union {
        /// Member types: `memberTypes` first, then inline members
        members: Vec<SimpleTypeUse>,
    },
}

/// How an element's type is given
#[derive(Debug, Clone, PartialEq)]
pub enum ElementTypeUse {
    /// `type=` attribute
    Named(QName),
    /// Anonymous `xs:simpleType`
    InlineSimple(Box<SimpleTypeDef>),
    /// Anonymous `xs:complexType`
    InlineComplex(Box<ComplexTypeDef>),
    /// Neither: the type is `xs:anyType` (or inherited from the substitution group head)
    Unspecified,
}

/// `xs:element` declaration (global or local)
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    /// Local name
    pub name: String,
    /// Type
    pub ty: ElementTypeUse,
    /// `default=`
    pub default: Option<String>,
    /// `fixed=`
    pub fixed: Option<String>,
    /// `nillable="true"`
    pub nillable: bool,
    /// `abstract="true"`
    pub is_abstract: bool,
    /// `substitutionGroup=` heads (XSD 1.1 allows a list)
    pub substitution_group: Vec<QName>,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// XSD 1.1-only constructs found inside this declaration
    pub unsupported: Vec<String>,
    /// Source position
    pub position: Position,
}

/// `use=` on an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeUseKind {
    /// `optional` (the default)
    #[default]
    Optional,
    /// `required`
    Required,
    /// `prohibited`
    Prohibited,
}

impl AttributeUseKind {
    /// Parse from the attribute value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "optional" => Some(AttributeUseKind::Optional),
            "required" => Some(AttributeUseKind::Required),
            "prohibited" => Some(AttributeUseKind::Prohibited),
            _ => None,
        }
    }
}

/// `xs:attribute` declaration (global or local)
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    /// Local name
    pub name: String,
    /// Type; None means `xs:anySimpleType`
    pub ty: Option<SimpleTypeUse>,
    /// `default=`
    pub default: Option<String>,
    /// `fixed=`
    pub fixed: Option<String>,
    /// `use=`
    pub use_kind: AttributeUseKind,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// Source position
    pub position: Position,
}

/// An item in an attribute list
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeItem {
    /// Local attribute declaration
    Local(AttributeDecl),
    /// `xs:attribute ref=`
    Ref {
        /// Referenced global attribute
        target: QName,
        /// `use=`
        use_kind: AttributeUseKind,
        /// `default=` override
        default: Option<String>,
        /// `fixed=` override
        fixed: Option<String>,
        /// Source position
        position: Position,
    },
    /// `xs:attributeGroup ref=`
    GroupRef {
        /// Referenced attribute group
        target: QName,
        /// Source position
        position: Position,
    },
    /// `xs:anyAttribute`
    Any {
        /// Source position
        position: Position,
    },
}

/// A particle: a term with occurrence constraints
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Occurrence constraints
    pub occurs: Occurs,
    /// The term
    pub term: Term,
}

/// Particle term
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Local element declaration
    Element(Box<ElementDecl>),
    /// `xs:element ref=`
    ElementRef {
        /// Referenced global element
        target: QName,
        /// Source position
        position: Position,
    },
    /// Nested model group
    Group(ModelGroup),
    /// `xs:group ref=`
    GroupRef {
        /// Referenced named group
        target: QName,
        /// Source position
        position: Position,
    },
    /// `xs:any`
    Any {
        /// Source position
        position: Position,
    },
}

/// `xs:sequence`/`xs:choice`/`xs:all`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    /// Compositor
    pub compositor: Compositor,
    /// Members in source order
    pub particles: Vec<Particle>,
}

/// Derivation clause of a complex type
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexDerivation {
    /// Extension or restriction
    pub method: DerivationMethod,
    /// `base=`
    pub base: QName,
    /// Whether the derivation appears under `xs:simpleContent`
    pub simple_content: bool,
    /// Facets of a `simpleContent` restriction
    pub facets: Vec<Facet>,
}

/// `xs:complexType`
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexTypeDef {
    /// Name (None for anonymous types)
    pub name: Option<String>,
    /// `mixed="true"`
    pub mixed: bool,
    /// `abstract="true"`
    pub is_abstract: bool,
    /// Derivation, if any
    pub derivation: Option<ComplexDerivation>,
    /// Declared content model (the extension/restriction content when derived)
    pub content: Option<Particle>,
    /// Declared attributes in source order
    pub attributes: Vec<AttributeItem>,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// XSD 1.1-only constructs found inside this definition
    pub unsupported: Vec<String>,
    /// Source position
    pub position: Position,
}

/// Named `xs:group`
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDef {
    /// Local name
    pub name: String,
    /// The group's model
    pub model: ModelGroup,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// Source position
    pub position: Position,
}

/// Named `xs:attributeGroup`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeGroupDef {
    /// Local name
    pub name: String,
    /// Items in source order
    pub items: Vec<AttributeItem>,
    /// `xs:documentation` text
    pub documentation: Option<String>,
    /// Source position
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_occurs_multiply() {
        use MaxOccurs::*;
        assert_eq!(Bounded(2).multiply(Bounded(3)), Bounded(6));
        assert_eq!(Bounded(2).multiply(Unbounded), Unbounded);
        assert_eq!(Unbounded.multiply(Bounded(0)), Bounded(0));
    }

    #[test]
    fn test_occurs_predicates() {
        assert!(Occurs::ONCE.is_single_mandatory());
        assert!(Occurs::OPTIONAL.is_optional());
        assert!(!Occurs::OPTIONAL.is_repeated());
        assert!(Occurs::new(1, MaxOccurs::Unbounded).is_repeated());
        assert_eq!(
            Occurs::OPTIONAL.multiply(Occurs::new(2, MaxOccurs::Bounded(4))),
            Occurs::new(0, MaxOccurs::Bounded(4))
        );
    }

    #[test]
    fn test_facet_from_tag() {
        assert_eq!(Facet::from_tag("maxLength", "10"), Some(Facet::MaxLength("10".into())));
        assert_eq!(Facet::from_tag("assertion", "x"), None);
        assert!(!Facet::WhiteSpace("collapse".into()).constrains_values());
    }
}
