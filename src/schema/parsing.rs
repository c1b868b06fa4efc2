//! XSD document parsing
//!
//! Walks the element tree of one schema file and produces a
//! [`SchemaDocument`]. Problems local to one component are collected and
//! parsing continues, so a single run reports every syntax issue in a file.
//! Only a document that is not an `xs:schema` at all fails outright.

use crate::documents::{Document, Element};
use crate::error::{Diagnostic, Result};
use crate::limits::Limits;
use crate::locations::Location;
use crate::names::is_valid_ncname;
use crate::namespaces::{is_xsd_namespace, QName};

use super::components::*;
use super::document::{Directive, DirectiveKind, SchemaDocument, UnsupportedConstruct};

/// XSD element names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const GROUP: &str = "group";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const ANNOTATION: &str = "annotation";
    pub const DOCUMENTATION: &str = "documentation";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const REDEFINE: &str = "redefine";
    pub const OVERRIDE: &str = "override";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const NOTATION: &str = "notation";
    pub const ENUMERATION: &str = "enumeration";
    pub const KEY: &str = "key";
    pub const KEYREF: &str = "keyref";
    pub const UNIQUE: &str = "unique";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const NILLABLE: &str = "nillable";
    pub const DEFAULT: &str = "default";
    pub const FIXED: &str = "fixed";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const MIXED: &str = "mixed";
    pub const ABSTRACT: &str = "abstract";
    pub const SUBSTITUTION_GROUP: &str = "substitutionGroup";
    pub const NAMESPACE: &str = "namespace";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const USE: &str = "use";
}

/// XSD 1.1 constructs that have no generation mapping
const XSD11_CONSTRUCTS: &[&str] = &[
    "assert",
    "assertion",
    "alternative",
    "openContent",
    "defaultOpenContent",
    "explicitTimezone",
];

/// Parse one schema file
///
/// `chameleon_namespace` is the including document's namespace when the
/// file is pulled in by `xs:include`/`xs:redefine`; it is adopted only if
/// the file declares no target namespace of its own. The returned
/// diagnostics are component-level problems; the document is still usable
/// for reporting further errors.
pub fn parse_schema_document(
    xml: &str,
    location: &Location,
    chameleon_namespace: Option<&str>,
    limits: &Limits,
) -> Result<(SchemaDocument, Vec<Diagnostic>)> {
    let location_str = location.as_str();
    let doc = Document::parse(xml, Some(&location_str), limits)?;
    let root = doc.root().ok_or_else(|| {
        Diagnostic::parse("Empty document").with_location(location_str.clone())
    })?;

    if root.local_name() != xsd_elements::SCHEMA || !is_xsd_namespace(root.namespace()) {
        return Err(Diagnostic::parse(format!(
            "Expected xs:schema root element, got {}",
            root.qname
        ))
        .with_location(location_str)
        .with_position(root.position)
        .into());
    }

    let declared = root
        .get_attribute(xsd_attrs::TARGET_NAMESPACE)
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .map(str::to_string);
    let chameleon = declared.is_none() && chameleon_namespace.is_some();
    let target_namespace = declared.or_else(|| chameleon_namespace.map(str::to_string));

    let mut parser = SchemaParser {
        location: location_str,
        target_namespace: target_namespace.clone(),
        chameleon,
        diagnostics: Vec::new(),
    };

    let mut document = SchemaDocument::new(location.clone(), target_namespace);
    document.chameleon = chameleon;
    for child in &root.children {
        parser.parse_schema_child(&mut document, child);
    }

    Ok((document, parser.diagnostics))
}

struct SchemaParser {
    location: String,
    target_namespace: Option<String>,
    chameleon: bool,
    diagnostics: Vec<Diagnostic>,
}

impl SchemaParser {
    fn error(&mut self, elem: &Element, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::parse(message)
                .with_location(self.location.clone())
                .with_position(elem.position),
        );
    }

    fn parse_schema_child(&mut self, document: &mut SchemaDocument, elem: &Element) {
        if !is_xsd_namespace(elem.namespace()) {
            // Foreign elements at the top level are application information.
            return;
        }
        match elem.local_name() {
            xsd_elements::ANNOTATION | xsd_elements::NOTATION => {}
            xsd_elements::IMPORT => {
                document.directives.push(Directive {
                    kind: DirectiveKind::Import,
                    namespace: elem.get_attribute(xsd_attrs::NAMESPACE).map(str::to_string),
                    schema_location: elem.get_attribute(xsd_attrs::SCHEMA_LOCATION).map(str::to_string),
                    position: elem.position,
                });
            }
            xsd_elements::INCLUDE => {
                if let Some(directive) = self.parse_include(elem, DirectiveKind::Include) {
                    document.directives.push(directive);
                }
            }
            xsd_elements::OVERRIDE => {
                // Degrades to a plain include of the overridden document.
                document.unsupported.push(UnsupportedConstruct {
                    construct: xsd_elements::OVERRIDE.to_string(),
                    position: elem.position,
                });
                if let Some(directive) = self.parse_include(elem, DirectiveKind::Include) {
                    document.directives.push(directive);
                }
            }
            xsd_elements::REDEFINE => {
                let components = elem
                    .children
                    .iter()
                    .filter(|c| c.local_name() != xsd_elements::ANNOTATION)
                    .filter_map(|c| self.parse_declaration(c))
                    .collect();
                if let Some(directive) = self.parse_include(elem, DirectiveKind::Redefine { components }) {
                    document.directives.push(directive);
                }
            }
            name if XSD11_CONSTRUCTS.contains(&name) => {
                document.unsupported.push(UnsupportedConstruct {
                    construct: name.to_string(),
                    position: elem.position,
                });
            }
            _ => {
                if let Some(declaration) = self.parse_declaration(elem) {
                    document.declarations.push(declaration);
                }
            }
        }
    }

    fn parse_include(&mut self, elem: &Element, kind: DirectiveKind) -> Option<Directive> {
        match elem.get_attribute(xsd_attrs::SCHEMA_LOCATION) {
            Some(location) => Some(Directive {
                kind,
                namespace: None,
                schema_location: Some(location.to_string()),
                position: elem.position,
            }),
            None => {
                self.error(
                    elem,
                    format!("xs:{} requires a schemaLocation attribute", elem.local_name()),
                );
                None
            }
        }
    }

    /// Parse a named top-level component
    fn parse_declaration(&mut self, elem: &Element) -> Option<Declaration> {
        let kind = elem.local_name();
        let known = matches!(
            kind,
            xsd_elements::ELEMENT
                | xsd_elements::COMPLEX_TYPE
                | xsd_elements::SIMPLE_TYPE
                | xsd_elements::ATTRIBUTE
                | xsd_elements::GROUP
                | xsd_elements::ATTRIBUTE_GROUP
        );
        if !known {
            self.error(elem, format!("Unknown schema child element: {}", kind));
            return None;
        }

        let name = self.required_name(elem)?;
        match kind {
            xsd_elements::ELEMENT => self.parse_element_decl(elem, name).map(Declaration::Element),
            xsd_elements::COMPLEX_TYPE => {
                Some(Declaration::ComplexType(self.parse_complex_type(elem, Some(name))))
            }
            xsd_elements::SIMPLE_TYPE => self
                .parse_simple_type(elem, Some(name))
                .map(Declaration::SimpleType),
            xsd_elements::ATTRIBUTE => Some(Declaration::Attribute(self.parse_attribute_decl(elem, name))),
            xsd_elements::GROUP => self.parse_group(elem, name).map(Declaration::Group),
            _ => Some(Declaration::AttributeGroup(AttributeGroupDef {
                name,
                items: self.parse_attribute_items(elem),
                documentation: documentation(elem),
                position: elem.position,
            })),
        }
    }

    fn required_name(&mut self, elem: &Element) -> Option<String> {
        match elem.get_attribute(xsd_attrs::NAME).map(str::trim) {
            Some(name) if is_valid_ncname(name) => Some(name.to_string()),
            Some(name) => {
                self.error(elem, format!("Invalid name '{}' on xs:{}", name, elem.local_name()));
                None
            }
            None => {
                self.error(elem, format!("xs:{} requires a name attribute", elem.local_name()));
                None
            }
        }
    }

    /// Resolve a QName-valued attribute in the element's namespace context
    fn resolve_qname(&mut self, elem: &Element, value: &str) -> Option<QName> {
        match elem.namespaces.resolve_at(value, elem.position) {
            Ok(qname) => Some(self.adopt(qname)),
            Err(diag) => {
                self.diagnostics.push(diag.with_location(self.location.clone()));
                None
            }
        }
    }

    fn qname_attr(&mut self, elem: &Element, attr: &str) -> Option<QName> {
        let value = elem.get_attribute(attr)?.to_string();
        self.resolve_qname(elem, &value)
    }

    fn qname_list_attr(&mut self, elem: &Element, attr: &str) -> Vec<QName> {
        let value = match elem.get_attribute(attr) {
            Some(v) => v.to_string(),
            None => return Vec::new(),
        };
        value
            .split_whitespace()
            .filter_map(|item| self.resolve_qname(elem, item))
            .collect()
    }

    /// Chameleon documents rewrite no-namespace references into the adopted namespace
    fn adopt(&self, qname: QName) -> QName {
        if self.chameleon && qname.namespace.is_none() {
            qname.with_namespace(self.target_namespace.as_deref())
        } else {
            qname
        }
    }

    fn parse_occurs(&mut self, elem: &Element) -> Occurs {
        let min = match elem.get_attribute(xsd_attrs::MIN_OCCURS).map(str::trim) {
            None => 1,
            Some(value) => match value.parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    self.error(elem, format!("Invalid minOccurs value '{}'", value));
                    1
                }
            },
        };
        let max = match elem.get_attribute(xsd_attrs::MAX_OCCURS).map(str::trim) {
            None => MaxOccurs::Bounded(1),
            Some("unbounded") => MaxOccurs::Unbounded,
            Some(value) => match value.parse::<u64>() {
                Ok(n) => MaxOccurs::Bounded(n),
                Err(_) => {
                    self.error(elem, format!("Invalid maxOccurs value '{}'", value));
                    MaxOccurs::Bounded(1)
                }
            },
        };
        if let MaxOccurs::Bounded(max) = max {
            if max < min {
                self.error(elem, format!("maxOccurs ({}) is less than minOccurs ({})", max, min));
            }
        }
        Occurs::new(min, max)
    }

    fn parse_element_decl(&mut self, elem: &Element, name: String) -> Option<ElementDecl> {
        let mut unsupported = Vec::new();
        let mut inline = ElementTypeUse::Unspecified;
        for child in xsd_children(elem) {
            match child.local_name() {
                xsd_elements::SIMPLE_TYPE => {
                    if let Some(def) = self.parse_simple_type(child, None) {
                        inline = ElementTypeUse::InlineSimple(Box::new(def));
                    }
                }
                xsd_elements::COMPLEX_TYPE => {
                    inline = ElementTypeUse::InlineComplex(Box::new(self.parse_complex_type(child, None)));
                }
                xsd_elements::ANNOTATION
                | xsd_elements::KEY
                | xsd_elements::KEYREF
                | xsd_elements::UNIQUE => {}
                other if XSD11_CONSTRUCTS.contains(&other) => unsupported.push(other.to_string()),
                other => self.error(child, format!("Unexpected xs:{} in element '{}'", other, name)),
            }
        }

        let ty = match self.qname_attr(elem, xsd_attrs::TYPE) {
            Some(qname) => {
                if !matches!(inline, ElementTypeUse::Unspecified) {
                    self.error(elem, format!("Element '{}' has both a type attribute and an inline type", name));
                }
                ElementTypeUse::Named(qname)
            }
            None => inline,
        };

        Some(ElementDecl {
            name,
            ty,
            default: attr_string(elem, xsd_attrs::DEFAULT),
            fixed: attr_string(elem, xsd_attrs::FIXED),
            nillable: flag(elem, xsd_attrs::NILLABLE),
            is_abstract: flag(elem, xsd_attrs::ABSTRACT),
            substitution_group: self.qname_list_attr(elem, xsd_attrs::SUBSTITUTION_GROUP),
            documentation: documentation(elem),
            unsupported,
            position: elem.position,
        })
    }

    fn parse_attribute_decl(&mut self, elem: &Element, name: String) -> AttributeDecl {
        let mut ty = self.qname_attr(elem, xsd_attrs::TYPE).map(SimpleTypeUse::Named);
        if let Some(child) = elem.find_child(xsd_elements::SIMPLE_TYPE) {
            if let Some(def) = self.parse_simple_type(child, None) {
                ty = Some(SimpleTypeUse::Inline(Box::new(def)));
            }
        }
        AttributeDecl {
            name,
            ty,
            default: attr_string(elem, xsd_attrs::DEFAULT),
            fixed: attr_string(elem, xsd_attrs::FIXED),
            use_kind: self.parse_use(elem),
            documentation: documentation(elem),
            position: elem.position,
        }
    }

    fn parse_use(&mut self, elem: &Element) -> AttributeUseKind {
        match elem.get_attribute(xsd_attrs::USE) {
            None => AttributeUseKind::Optional,
            Some(value) => AttributeUseKind::parse(value).unwrap_or_else(|| {
                self.error(elem, format!("Invalid use value '{}'", value));
                AttributeUseKind::Optional
            }),
        }
    }

    fn parse_attribute_items(&mut self, parent: &Element) -> Vec<AttributeItem> {
        let mut items = Vec::new();
        for child in xsd_children(parent) {
            if let Some(item) = self.parse_attribute_item(child) {
                items.push(item);
            }
        }
        items
    }

    /// Parse `xs:attribute`, `xs:attributeGroup` or `xs:anyAttribute`; other elements yield None
    fn parse_attribute_item(&mut self, elem: &Element) -> Option<AttributeItem> {
        match elem.local_name() {
            xsd_elements::ATTRIBUTE => {
                if let Some(target) = self.qname_attr(elem, xsd_attrs::REF) {
                    return Some(AttributeItem::Ref {
                        target,
                        use_kind: self.parse_use(elem),
                        default: attr_string(elem, xsd_attrs::DEFAULT),
                        fixed: attr_string(elem, xsd_attrs::FIXED),
                        position: elem.position,
                    });
                }
                let name = self.required_name(elem)?;
                Some(AttributeItem::Local(self.parse_attribute_decl(elem, name)))
            }
            xsd_elements::ATTRIBUTE_GROUP => match self.qname_attr(elem, xsd_attrs::REF) {
                Some(target) => Some(AttributeItem::GroupRef {
                    target,
                    position: elem.position,
                }),
                None => {
                    self.error(elem, "Attribute group reference requires a ref attribute");
                    None
                }
            },
            xsd_elements::ANY_ATTRIBUTE => Some(AttributeItem::Any {
                position: elem.position,
            }),
            _ => None,
        }
    }

    fn parse_group(&mut self, elem: &Element, name: String) -> Option<GroupDef> {
        let model_elem = xsd_children(elem).find(|c| Compositor::from_tag(c.local_name()).is_some());
        match model_elem {
            Some(model_elem) => Some(GroupDef {
                name,
                model: self.parse_model_group(model_elem),
                documentation: documentation(elem),
                position: elem.position,
            }),
            None => {
                self.error(elem, format!("Group '{}' has no sequence, choice or all", name));
                None
            }
        }
    }

    fn parse_model_group(&mut self, elem: &Element) -> ModelGroup {
        let compositor = Compositor::from_tag(elem.local_name()).unwrap_or(Compositor::Sequence);
        let mut particles = Vec::new();
        for child in xsd_children(elem) {
            if child.local_name() == xsd_elements::ANNOTATION {
                continue;
            }
            if let Some(particle) = self.parse_particle(child) {
                particles.push(particle);
            }
        }
        ModelGroup {
            compositor,
            particles,
        }
    }

    /// Parse a content model particle
    fn parse_particle(&mut self, elem: &Element) -> Option<Particle> {
        let term = match elem.local_name() {
            xsd_elements::ELEMENT => match self.qname_attr(elem, xsd_attrs::REF) {
                Some(target) => Term::ElementRef {
                    target,
                    position: elem.position,
                },
                None => {
                    let name = self.required_name(elem)?;
                    Term::Element(Box::new(self.parse_element_decl(elem, name)?))
                }
            },
            xsd_elements::SEQUENCE | xsd_elements::CHOICE | xsd_elements::ALL => {
                Term::Group(self.parse_model_group(elem))
            }
            xsd_elements::GROUP => match self.qname_attr(elem, xsd_attrs::REF) {
                Some(target) => Term::GroupRef {
                    target,
                    position: elem.position,
                },
                None => {
                    self.error(elem, "Group reference requires a ref attribute");
                    return None;
                }
            },
            xsd_elements::ANY => Term::Any {
                position: elem.position,
            },
            other => {
                self.error(elem, format!("Unexpected xs:{} in content model", other));
                return None;
            }
        };
        Some(Particle {
            occurs: self.parse_occurs(elem),
            term,
        })
    }

    fn parse_complex_type(&mut self, elem: &Element, name: Option<String>) -> ComplexTypeDef {
        let mut def = ComplexTypeDef {
            name,
            mixed: flag(elem, xsd_attrs::MIXED),
            is_abstract: flag(elem, xsd_attrs::ABSTRACT),
            derivation: None,
            content: None,
            attributes: Vec::new(),
            documentation: documentation(elem),
            unsupported: Vec::new(),
            position: elem.position,
        };

        for child in xsd_children(elem) {
            match child.local_name() {
                xsd_elements::ANNOTATION => {}
                xsd_elements::SIMPLE_CONTENT | xsd_elements::COMPLEX_CONTENT => {
                    let simple_content = child.local_name() == xsd_elements::SIMPLE_CONTENT;
                    if child.get_attribute(xsd_attrs::MIXED).is_some() {
                        def.mixed = flag(child, xsd_attrs::MIXED);
                    }
                    self.parse_derivation(&mut def, child, simple_content);
                }
                other if XSD11_CONSTRUCTS.contains(&other) => def.unsupported.push(other.to_string()),
                _ => self.parse_content_child(&mut def, child),
            }
        }
        def
    }

    /// A model group or attribute inside a complex type or derivation
    fn parse_content_child(&mut self, def: &mut ComplexTypeDef, child: &Element) {
        let local = child.local_name();
        if Compositor::from_tag(local).is_some() || local == xsd_elements::GROUP {
            if def.content.is_some() {
                self.error(child, "Complex type has more than one content model");
            }
            def.content = self.parse_particle(child);
        } else if let Some(item) = self.parse_attribute_item(child) {
            def.attributes.push(item);
        } else {
            self.error(child, format!("Unexpected xs:{} in complex type", local));
        }
    }

    fn parse_derivation(&mut self, def: &mut ComplexTypeDef, content: &Element, simple_content: bool) {
        let derivation = xsd_children(content).find(|c| {
            matches!(c.local_name(), xsd_elements::EXTENSION | xsd_elements::RESTRICTION)
        });
        let Some(derivation) = derivation else {
            self.error(content, format!("xs:{} requires an extension or restriction", content.local_name()));
            return;
        };

        let method = if derivation.local_name() == xsd_elements::EXTENSION {
            DerivationMethod::Extension
        } else {
            DerivationMethod::Restriction
        };
        let Some(base) = self.qname_attr(derivation, xsd_attrs::BASE) else {
            self.error(derivation, format!("xs:{} requires a base attribute", derivation.local_name()));
            return;
        };

        let mut facets = Vec::new();
        for child in xsd_children(derivation) {
            let local = child.local_name();
            if local == xsd_elements::ANNOTATION {
                continue;
            }
            if XSD11_CONSTRUCTS.contains(&local) {
                def.unsupported.push(local.to_string());
            } else if simple_content && local == xsd_elements::SIMPLE_TYPE {
                // Inline base refinement inside a simpleContent restriction: keep the facets.
                if let Some(inner) = self.parse_simple_type(child, None) {
                    if let SimpleContent::Restriction { facets: inner_facets, .. } = inner.content {
                        facets.extend(inner_facets);
                    }
                }
            } else if simple_content && method == DerivationMethod::Restriction {
                if let Some(facet) = self.parse_facet(child) {
                    facets.push(facet);
                } else if let Some(item) = self.parse_attribute_item(child) {
                    def.attributes.push(item);
                } else {
                    self.error(child, format!("Unexpected xs:{} in simpleContent restriction", local));
                }
            } else {
                self.parse_content_child(def, child);
            }
        }

        def.derivation = Some(ComplexDerivation {
            method,
            base,
            simple_content,
            facets,
        });
    }

    fn parse_facet(&mut self, elem: &Element) -> Option<Facet> {
        let value = elem.get_attribute(xsd_attrs::VALUE).unwrap_or("");
        if elem.local_name() == xsd_elements::ENUMERATION {
            return Some(Facet::Enumeration {
                value: value.to_string(),
                documentation: documentation(elem),
            });
        }
        Facet::from_tag(elem.local_name(), value)
    }

    fn parse_simple_type(&mut self, elem: &Element, name: Option<String>) -> Option<SimpleTypeDef> {
        let mut unsupported = Vec::new();
        let mut content = None;
        for child in xsd_children(elem) {
            match child.local_name() {
                xsd_elements::ANNOTATION => {}
                xsd_elements::RESTRICTION => {
                    content = Some(self.parse_simple_restriction(child, &mut unsupported));
                }
                xsd_elements::LIST => {
                    let item = match self.qname_attr(child, xsd_attrs::ITEM_TYPE) {
                        Some(qname) => Some(SimpleTypeUse::Named(qname)),
                        None => child
                            .find_child(xsd_elements::SIMPLE_TYPE)
                            .and_then(|inner| self.parse_simple_type(inner, None))
                            .map(|def| SimpleTypeUse::Inline(Box::new(def))),
                    };
                    match item {
                        Some(item) => content = Some(SimpleContent::List { item }),
                        None => self.error(child, "xs:list requires an itemType or an inline simpleType"),
                    }
                }
                xsd_elements::UNION => {
                    let mut members: Vec<SimpleTypeUse> = self
                        .qname_list_attr(child, xsd_attrs::MEMBER_TYPES)
                        .into_iter()
                        .map(SimpleTypeUse::Named)
                        .collect();
                    for inner in child.find_children(xsd_elements::SIMPLE_TYPE) {
                        if let Some(def) = self.parse_simple_type(inner, None) {
                            members.push(SimpleTypeUse::Inline(Box::new(def)));
                        }
                    }
                    if members.is_empty() {
                        self.error(child, "xs:union requires at least one member type");
                    } else {
                        content = Some(SimpleContent::Union { members });
                    }
                }
                other => self.error(child, format!("Unexpected xs:{} in simple type", other)),
            }
        }

        match content {
            Some(content) => Some(SimpleTypeDef {
                name,
                content,
                documentation: documentation(elem),
                unsupported,
                position: elem.position,
            }),
            None => {
                self.error(elem, "xs:simpleType requires a restriction, list or union");
                None
            }
        }
    }

    fn parse_simple_restriction(&mut self, elem: &Element, unsupported: &mut Vec<String>) -> SimpleContent {
        let mut base = self.qname_attr(elem, xsd_attrs::BASE).map(SimpleTypeUse::Named);
        let mut facets = Vec::new();
        for child in xsd_children(elem) {
            let local = child.local_name();
            if local == xsd_elements::ANNOTATION {
                continue;
            }
            if local == xsd_elements::SIMPLE_TYPE {
                if let Some(def) = self.parse_simple_type(child, None) {
                    base = Some(SimpleTypeUse::Inline(Box::new(def)));
                }
            } else if XSD11_CONSTRUCTS.contains(&local) {
                unsupported.push(local.to_string());
            } else if let Some(facet) = self.parse_facet(child) {
                facets.push(facet);
            } else {
                self.error(child, format!("Unknown facet xs:{}", local));
            }
        }

        let base = base.unwrap_or_else(|| {
            self.error(elem, "xs:restriction requires a base attribute or an inline simpleType");
            SimpleTypeUse::Named(QName::namespaced(crate::namespaces::XSD_NAMESPACE, "anySimpleType"))
        });
        SimpleContent::Restriction { base, facets }
    }
}

/// Children in the XSD namespace; `xs:appinfo` payloads and foreign elements are skipped
fn xsd_children(elem: &Element) -> impl Iterator<Item = &Element> {
    elem.children.iter().filter(|c| is_xsd_namespace(c.namespace()))
}

fn attr_string(elem: &Element, attr: &str) -> Option<String> {
    elem.get_attribute(attr).map(str::to_string)
}

/// XSD boolean attribute
fn flag(elem: &Element, attr: &str) -> bool {
    matches!(elem.get_attribute(attr).map(str::trim), Some("true") | Some("1"))
}

/// Concatenated `xs:annotation/xs:documentation` text, normalized per line
fn documentation(elem: &Element) -> Option<String> {
    let annotation = elem.find_child(xsd_elements::ANNOTATION)?;
    let parts: Vec<String> = annotation
        .find_children(xsd_elements::DOCUMENTATION)
        .into_iter()
        .map(|doc| {
            doc.deep_text()
                .lines()
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}
