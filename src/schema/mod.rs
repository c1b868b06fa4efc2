//! Schema loading
//!
//! Turns a directory of XSD files into a [`SchemaSet`] of parsed
//! [`SchemaDocument`]s with every `import`, `include` and `redefine`
//! followed.

pub mod components;
mod document;
mod parsing;
mod set;

pub use components::{
    AttributeDecl, AttributeGroupDef, AttributeItem, AttributeUseKind, ComplexDerivation,
    ComplexTypeDef, Compositor, Declaration, DerivationMethod, ElementDecl, ElementTypeUse, Facet,
    GroupDef, MaxOccurs, ModelGroup, Occurs, Particle, SimpleContent, SimpleTypeDef,
    SimpleTypeUse, Term,
};
pub use document::{Directive, DirectiveKind, SchemaDocument, UnsupportedConstruct};
pub use parsing::parse_schema_document;
pub use set::SchemaSet;
