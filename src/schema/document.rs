//! Parsed schema documents

use crate::error::Position;
use crate::locations::Location;
use crate::namespaces::QName;

use super::components::Declaration;

/// Kind of a composition directive
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveKind {
    /// `xs:import`: another namespace
    Import,
    /// `xs:include`: same namespace (or chameleon)
    Include,
    /// `xs:redefine`: include with replacement components
    Redefine {
        /// Replacement simple types, complex types, groups and attribute groups
        components: Vec<Declaration>,
    },
}

impl DirectiveKind {
    /// Element local name of the directive
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveKind::Import => "import",
            DirectiveKind::Include => "include",
            DirectiveKind::Redefine { .. } => "redefine",
        }
    }
}

/// `xs:import`, `xs:include` or `xs:redefine` in a schema document
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Directive kind
    pub kind: DirectiveKind,
    /// `namespace=` (imports only)
    pub namespace: Option<String>,
    /// Raw `schemaLocation=`
    pub schema_location: Option<String>,
    /// Source position
    pub position: Position,
}

/// A construct found in a document that the generator has no mapping for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedConstruct {
    /// Element local name of the construct (`override`, `defaultOpenContent`, ...)
    pub construct: String,
    /// Source position
    pub position: Position,
}

/// One parsed XSD file
///
/// Documents are immutable once the loader has finished; the only
/// post-parse change is the application of `xs:redefine` replacements.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    /// Where the document was read from
    pub location: Location,
    /// Effective target namespace (the includer's for chameleon includes)
    pub target_namespace: Option<String>,
    /// Whether the namespace was adopted from an including document
    pub chameleon: bool,
    /// Composition directives in source order
    pub directives: Vec<Directive>,
    /// Top-level declarations in source order
    pub declarations: Vec<Declaration>,
    /// Document-level constructs with no generation mapping
    pub unsupported: Vec<UnsupportedConstruct>,
}

impl SchemaDocument {
    /// Create an empty document
    pub fn new(location: Location, target_namespace: Option<String>) -> Self {
        Self {
            location,
            target_namespace,
            chameleon: false,
            directives: Vec::new(),
            declarations: Vec::new(),
            unsupported: Vec::new(),
        }
    }

    /// Target namespace as a string slice
    pub fn namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Qualify a local name in this document's target namespace
    pub fn qname(&self, local_name: &str) -> QName {
        QName::new(self.target_namespace.clone(), local_name)
    }

    /// Location string used in diagnostics
    pub fn location_str(&self) -> String {
        self.location.as_str()
    }

    /// Find a declaration of the same kind and name
    pub fn find_declaration_mut(&mut self, kind: &str, name: &str) -> Option<&mut Declaration> {
        self.declarations
            .iter_mut()
            .find(|d| d.kind() == kind && d.name() == Some(name))
    }
}
