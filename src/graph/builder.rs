//! Type graph construction
//!
//! Documents are visited in set order and declarations in source order, so
//! anonymous type names (and the numeric suffixes that keep them unique)
//! come out the same on every run. Named groups and attribute groups are
//! flattened once, on first use, and their fields copied into every
//! referencing type.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::AnonymousNaming;
use crate::error::{Diagnostic, Diagnostics, Position};
use crate::limits::Limits;
use crate::namespaces::{QName, XML_NAMESPACE};
use crate::schema::{
    AttributeGroupDef, AttributeItem, AttributeUseKind, ComplexTypeDef, Compositor, Declaration,
    ElementDecl, ElementTypeUse, Facet, GroupDef, MaxOccurs, Occurs, Particle, SchemaDocument,
    SchemaSet, SimpleContent, SimpleTypeDef, SimpleTypeUse, Term,
};

use super::*;

/// Name of the field holding `xs:anyAttribute` values
pub(crate) const ATTRIBUTE_WILDCARD_FIELD: &str = "other_attributes";
/// Name of the field holding `xs:any` content
pub(crate) const WILDCARD_FIELD: &str = "any";

/// Build the type graph for every document in `set`
pub fn build_graph(
    set: &SchemaSet,
    naming: &AnonymousNaming,
    limits: &Limits,
    diagnostics: &mut Diagnostics,
) -> TypeGraph {
    let mut builder = Builder::new(set.documents(), naming);
    builder.collect_globals();
    for (index, document) in set.documents().iter().enumerate() {
        builder.build_document(index, document);
    }
    builder.build_substitution_groups();

    let (graph, builder_diagnostics) = builder.finish();
    diagnostics.extend(builder_diagnostics);
    if let Err(err) = limits.check_type_declarations(graph.len()) {
        diagnostics.push(err.into_diagnostic());
    }
    info!(
        types = graph.len(),
        elements = graph.elements.len(),
        attributes = graph.attributes.len(),
        "type graph built"
    );
    graph
}

struct FlatGroup {
    compositor: Compositor,
    fields: Vec<Field>,
}

/// Where a component is being built
#[derive(Clone, Copy)]
struct Scope<'d> {
    document: &'d SchemaDocument,
    order: usize,
}

impl Scope<'_> {
    fn location(&self) -> String {
        self.document.location_str()
    }
}

struct Builder<'a> {
    documents: &'a [SchemaDocument],
    naming: &'a AnonymousNaming,
    groups: IndexMap<QName, (usize, &'a GroupDef)>,
    attribute_groups: IndexMap<QName, (usize, &'a AttributeGroupDef)>,
    group_cache: HashMap<QName, Option<FlatGroup>>,
    attribute_group_cache: HashMap<QName, Option<Vec<Field>>>,
    expanding: Vec<QName>,
    /// Final qualified name of each declared type, keyed by (document, declaration index)
    declared_names: HashMap<(usize, usize), QName>,
    taken: HashSet<QName>,
    types: Vec<TypeDeclaration>,
    elements: IndexMap<QName, ElementDeclaration>,
    attributes: IndexMap<QName, AttributeDeclaration>,
    substitution_groups: IndexMap<QName, TypeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Builder<'a> {
    fn new(documents: &'a [SchemaDocument], naming: &'a AnonymousNaming) -> Self {
        Self {
            documents,
            naming,
            groups: IndexMap::new(),
            attribute_groups: IndexMap::new(),
            group_cache: HashMap::new(),
            attribute_group_cache: HashMap::new(),
            expanding: Vec::new(),
            declared_names: HashMap::new(),
            taken: HashSet::new(),
            types: Vec::new(),
            elements: IndexMap::new(),
            attributes: IndexMap::new(),
            substitution_groups: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Register named groups and claim every declared type name
    ///
    /// A name declared twice in one namespace keeps its first (by location)
    /// declaration; later ones are renamed after their file stem.
    fn collect_globals(&mut self) {
        let documents = self.documents;
        for (doc_index, document) in documents.iter().enumerate() {
            for (decl_index, declaration) in document.declarations.iter().enumerate() {
                let Some(name) = declaration.name() else {
                    continue;
                };
                let qname = document.qname(name);
                match declaration {
                    Declaration::SimpleType(_) | Declaration::ComplexType(_) => {
                        let final_name = if self.taken.contains(&qname) {
                            let wanted = format!("{}_{}", name, document.location.stem());
                            let renamed = self.unique_name(document.namespace(), &wanted);
                            self.diagnostics.push(
                                Diagnostic::resolution(format!(
                                    "Type '{}' is declared more than once in its namespace; this declaration is renamed to '{}'",
                                    qname, renamed.local_name
                                ))
                                .as_warning()
                                .with_location(document.location_str())
                                .with_position(declaration.position())
                                .with_component(qname.to_string()),
                            );
                            renamed
                        } else {
                            qname
                        };
                        self.taken.insert(final_name.clone());
                        self.declared_names.insert((doc_index, decl_index), final_name);
                    }
                    Declaration::Group(group) => {
                        if self.groups.contains_key(&qname) {
                            self.duplicate_warning(document, declaration, &qname);
                        } else {
                            self.groups.insert(qname, (doc_index, group));
                        }
                    }
                    Declaration::AttributeGroup(group) => {
                        if self.attribute_groups.contains_key(&qname) {
                            self.duplicate_warning(document, declaration, &qname);
                        } else {
                            self.attribute_groups.insert(qname, (doc_index, group));
                        }
                    }
                    Declaration::Element(_) | Declaration::Attribute(_) => {}
                }
            }
        }
    }

    fn duplicate_warning(&mut self, document: &SchemaDocument, declaration: &Declaration, qname: &QName) {
        self.diagnostics.push(
            Diagnostic::resolution(format!(
                "{} '{}' is declared more than once; the first declaration is used",
                declaration.kind(),
                qname
            ))
            .as_warning()
            .with_location(document.location_str())
            .with_position(declaration.position())
            .with_component(qname.to_string()),
        );
    }

    /// `wanted` in `namespace`, with a numeric suffix if already taken
    fn unique_name(&self, namespace: Option<&str>, wanted: &str) -> QName {
        let candidate = QName::new(namespace, wanted);
        if !self.taken.contains(&candidate) {
            return candidate;
        }
        (2..)
            .map(|n| QName::new(namespace, format!("{}{}", wanted, n)))
            .find(|c| !self.taken.contains(c))
            .unwrap_or(candidate)
    }

    fn unsupported(&mut self, scope: Scope<'_>, construct: &str, position: Position, component: &QName) {
        self.diagnostics.push(
            Diagnostic::unsupported(format!(
                "xs:{} (XSD 1.1) has no generation mapping and is ignored",
                construct
            ))
            .with_location(scope.location())
            .with_position(position)
            .with_component(component.to_string()),
        );
    }

    fn build_document(&mut self, doc_index: usize, document: &'a SchemaDocument) {
        debug!(location = %document.location, "building types");
        for unsupported in &document.unsupported {
            let component = QName::new(document.target_namespace.clone(), "schema");
            self.unsupported(
                Scope { document, order: 0 },
                &unsupported.construct,
                unsupported.position,
                &component,
            );
        }

        for (order, declaration) in document.declarations.iter().enumerate() {
            let scope = Scope { document, order };
            match declaration {
                Declaration::SimpleType(def) => {
                    let Some(qname) = self.declared_names.get(&(doc_index, order)).cloned() else {
                        continue;
                    };
                    let root = AnonymousPath {
                        namespace: document.target_namespace.clone(),
                        segments: vec![qname.local_name.clone()],
                        kind: AnonymousKind::RestrictionBase,
                    };
                    self.build_simple_type(def, qname, TypeOrigin::Declared, &root, scope);
                }
                Declaration::ComplexType(def) => {
                    let Some(qname) = self.declared_names.get(&(doc_index, order)).cloned() else {
                        continue;
                    };
                    let segments = vec![qname.local_name.clone()];
                    self.build_complex_type(def, qname, TypeOrigin::Declared, &segments, scope);
                }
                Declaration::Element(decl) => self.build_global_element(decl, scope),
                Declaration::Attribute(decl) => {
                    let qname = document.qname(&decl.name);
                    if self.attributes.contains_key(&qname) {
                        self.duplicate_warning(document, declaration, &qname);
                        continue;
                    }
                    let path = AnonymousPath {
                        namespace: document.target_namespace.clone(),
                        segments: vec![decl.name.clone()],
                        kind: AnonymousKind::Attribute,
                    };
                    let ty = match decl.ty {
                        Some(ref ty) => self.simple_type_ref(ty, &path, scope),
                        None => TypeRef::Builtin(Builtin::AnySimpleType),
                    };
                    self.attributes.insert(
                        qname.clone(),
                        AttributeDeclaration {
                            qname,
                            ty,
                            default: decl.default.clone(),
                            fixed: decl.fixed.clone(),
                            documentation: decl.documentation.clone(),
                            location: document.location.clone(),
                            position: decl.position,
                        },
                    );
                }
                // Built on first reference
                Declaration::Group(_) | Declaration::AttributeGroup(_) => {}
            }
        }
    }

    fn build_global_element(&mut self, decl: &ElementDecl, scope: Scope<'_>) {
        let document = scope.document;
        let qname = document.qname(&decl.name);
        if self.elements.contains_key(&qname) {
            self.diagnostics.push(
                Diagnostic::resolution(format!(
                    "element '{}' is declared more than once; the first declaration is used",
                    qname
                ))
                .as_warning()
                .with_location(document.location_str())
                .with_position(decl.position)
                .with_component(qname.to_string()),
            );
            return;
        }
        for construct in &decl.unsupported {
            self.unsupported(scope, construct, decl.position, &qname);
        }

        let path = vec![decl.name.clone()];
        let ty = match decl.ty {
            ElementTypeUse::Unspecified => None,
            _ => Some(self.element_type_ref(decl, &path, scope)),
        };
        self.elements.insert(
            qname.clone(),
            ElementDeclaration {
                qname,
                ty,
                default: decl.default.clone(),
                fixed: decl.fixed.clone(),
                nillable: decl.nillable,
                is_abstract: decl.is_abstract,
                substitution_group: decl.substitution_group.clone(),
                documentation: decl.documentation.clone(),
                location: document.location.clone(),
                position: decl.position,
            },
        );
    }

    /// Type of an element; `segments` ends with the element's own name
    fn element_type_ref(&mut self, decl: &ElementDecl, segments: &[String], scope: Scope<'_>) -> TypeRef {
        let path = AnonymousPath {
            namespace: scope.document.target_namespace.clone(),
            segments: segments.to_vec(),
            kind: AnonymousKind::Element,
        };
        match decl.ty {
            ElementTypeUse::Named(ref qname) => TypeRef::from_qname(qname.clone()),
            ElementTypeUse::InlineSimple(ref def) => {
                let qname = self.claim_anonymous(&path);
                self.build_simple_type(def, qname.clone(), TypeOrigin::Anonymous(path.clone()), &path, scope);
                self.inherit_documentation(&qname, decl.documentation.as_ref());
                TypeRef::Named(qname)
            }
            ElementTypeUse::InlineComplex(ref def) => {
                let qname = self.claim_anonymous(&path);
                self.build_complex_type(def, qname.clone(), TypeOrigin::Anonymous(path.clone()), segments, scope);
                self.inherit_documentation(&qname, decl.documentation.as_ref());
                TypeRef::Named(qname)
            }
            ElementTypeUse::Unspecified => TypeRef::Builtin(Builtin::AnyType),
        }
    }

    /// An anonymous type without its own annotation takes its element's
    fn inherit_documentation(&mut self, qname: &QName, documentation: Option<&String>) {
        let Some(documentation) = documentation else {
            return;
        };
        if let Some(ty) = self.types.iter_mut().rev().find(|t| &t.qname == qname) {
            if ty.documentation.is_none() {
                ty.documentation = Some(documentation.clone());
            }
        }
    }

    fn claim_anonymous(&mut self, path: &AnonymousPath) -> QName {
        let wanted = self.naming.name(path);
        let qname = self.unique_name(path.namespace.as_deref(), &wanted);
        self.taken.insert(qname.clone());
        qname
    }

    /// Type of a simple type use; inline definitions become anonymous types named from `path`
    fn simple_type_ref(&mut self, ty: &SimpleTypeUse, path: &AnonymousPath, scope: Scope<'_>) -> TypeRef {
        match ty {
            SimpleTypeUse::Named(qname) => TypeRef::from_qname(qname.clone()),
            SimpleTypeUse::Inline(def) => {
                let qname = self.claim_anonymous(path);
                self.build_simple_type(def, qname.clone(), TypeOrigin::Anonymous(path.clone()), path, scope);
                TypeRef::Named(qname)
            }
        }
    }

    /// `path` names the type itself; nested inline types extend it with their own kind
    fn build_simple_type(
        &mut self,
        def: &SimpleTypeDef,
        qname: QName,
        origin: TypeOrigin,
        path: &AnonymousPath,
        scope: Scope<'_>,
    ) -> TypeId {
        for construct in &def.unsupported {
            self.unsupported(scope, construct, def.position, &qname);
        }
        let nested = |kind: AnonymousKind| AnonymousPath {
            namespace: path.namespace.clone(),
            segments: path.segments.clone(),
            kind,
        };

        let kind = match def.content {
            SimpleContent::Restriction { ref base, ref facets } => {
                let base = self.simple_type_ref(base, &nested(AnonymousKind::RestrictionBase), scope);
                let members: Vec<EnumMember> = facets
                    .iter()
                    .filter_map(|facet| match facet {
                        Facet::Enumeration { value, documentation } => Some(EnumMember {
                            value: value.clone(),
                            documentation: documentation.clone(),
                        }),
                        _ => None,
                    })
                    .collect();
                let others: Vec<Facet> = facets.iter().filter(|f| !f.is_enumeration()).cloned().collect();
                if members.is_empty() {
                    TypeKind::Alias {
                        target: base,
                        facets: others,
                    }
                } else {
                    TypeKind::Enumeration {
                        base,
                        members,
                        facets: others,
                    }
                }
            }
            SimpleContent::List { ref item } => TypeKind::List {
                item: self.simple_type_ref(item, &nested(AnonymousKind::ListItem), scope),
            },
            SimpleContent::Union { ref members } => TypeKind::Union {
                members: members
                    .iter()
                    .enumerate()
                    .map(|(i, member)| self.simple_type_ref(member, &nested(AnonymousKind::UnionMember(i)), scope))
                    .collect(),
            },
        };

        self.push_type(TypeDeclaration {
            qname,
            origin,
            kind,
            derivation: None,
            fields: Vec::new(),
            documentation: def.documentation.clone(),
            location: scope.document.location.clone(),
            position: def.position,
            order: scope.order,
        })
    }

    /// `segments` names the type itself (its own name, or its enclosing element path)
    fn build_complex_type(
        &mut self,
        def: &ComplexTypeDef,
        qname: QName,
        origin: TypeOrigin,
        segments: &[String],
        scope: Scope<'_>,
    ) -> TypeId {
        for construct in &def.unsupported {
            self.unsupported(scope, construct, def.position, &qname);
        }

        let mut fields = Vec::new();
        let mut compositor = None;
        if let Some(ref content) = def.content {
            compositor = self.compositor_of(content, scope);
            self.flatten_particle(content, Occurs::ONCE, segments, scope, &mut fields);
        }
        self.attribute_fields(&def.attributes, segments, scope, &mut fields);

        let (kind, derivation) = match def.derivation {
            Some(ref derivation) if derivation.simple_content => (
                TypeKind::SimpleContent {
                    value: TypeRef::from_qname(derivation.base.clone()),
                    facets: derivation.facets.clone(),
                },
                Some(Derivation {
                    method: derivation.method,
                    base: TypeRef::from_qname(derivation.base.clone()),
                }),
            ),
            Some(ref derivation) => (
                TypeKind::Composite {
                    compositor,
                    mixed: def.mixed,
                    is_abstract: def.is_abstract,
                },
                Some(Derivation {
                    method: derivation.method,
                    base: TypeRef::from_qname(derivation.base.clone()),
                }),
            ),
            None => (
                TypeKind::Composite {
                    compositor,
                    mixed: def.mixed,
                    is_abstract: def.is_abstract,
                },
                None,
            ),
        };

        self.push_type(TypeDeclaration {
            qname,
            origin,
            kind,
            derivation,
            fields,
            documentation: def.documentation.clone(),
            location: scope.document.location.clone(),
            position: def.position,
            order: scope.order,
        })
    }

    fn push_type(&mut self, declaration: TypeDeclaration) -> TypeId {
        let id = TypeId(self.types.len());
        debug!(type = %declaration.qname, kind = declaration.kind.label(), "declared type");
        self.types.push(declaration);
        id
    }

    fn compositor_of(&mut self, particle: &Particle, scope: Scope<'_>) -> Option<Compositor> {
        match particle.term {
            Term::Group(ref group) => Some(group.compositor),
            Term::GroupRef { ref target, position } => self
                .flat_group(target, position, scope)
                .map(|group| group.compositor),
            _ => Some(Compositor::Sequence),
        }
    }

    /// Flatten a particle into fields, multiplying occurrence ranges on the way down
    fn flatten_particle(
        &mut self,
        particle: &Particle,
        outer: Occurs,
        segments: &[String],
        scope: Scope<'_>,
        out: &mut Vec<Field>,
    ) {
        let occurs = outer.multiply(particle.occurs);
        match particle.term {
            Term::Element(ref decl) => {
                let mut path = segments.to_vec();
                path.push(decl.name.clone());
                let context = scope.document.qname(segments.first().map(String::as_str).unwrap_or(""));
                for construct in &decl.unsupported {
                    self.unsupported(scope, construct, decl.position, &context);
                }
                let ty = self.element_type_ref(decl, &path, scope);
                out.push(Field {
                    default: decl.default.clone(),
                    fixed: decl.fixed.clone(),
                    nillable: decl.nillable,
                    documentation: decl.documentation.clone(),
                    ..Field::new(decl.name.clone(), FieldSource::Element, FieldType::Type(ty), occurs)
                });
            }
            Term::ElementRef { ref target, .. } => out.push(Field::new(
                target.local_name.clone(),
                FieldSource::Element,
                FieldType::ElementRef(target.clone()),
                occurs,
            )),
            Term::Group(ref group) => {
                let member_outer = if group.compositor == Compositor::Choice && group.particles.len() > 1 {
                    Occurs::new(0, occurs.max)
                } else {
                    occurs
                };
                for member in &group.particles {
                    self.flatten_particle(member, member_outer, segments, scope, out);
                }
            }
            Term::GroupRef { ref target, position } => {
                if let Some(group) = self.flat_group(target, position, scope) {
                    out.extend(group.fields.iter().cloned().map(|mut field| {
                        field.occurs = occurs.multiply(field.occurs);
                        field
                    }));
                }
            }
            Term::Any { .. } => out.push(Field::new(
                WILDCARD_FIELD,
                FieldSource::Wildcard,
                FieldType::Type(TypeRef::Builtin(Builtin::AnyType)),
                occurs,
            )),
        }
    }

    /// Flattened fields of a named group, built on first use
    fn flat_group(&mut self, target: &QName, position: Position, scope: Scope<'_>) -> Option<&FlatGroup> {
        if !self.group_cache.contains_key(target) {
            let built = self.expand_group(target, position, scope);
            self.group_cache.insert(target.clone(), built);
        }
        self.group_cache.get(target).and_then(Option::as_ref)
    }

    fn expand_group(&mut self, target: &QName, position: Position, scope: Scope<'_>) -> Option<FlatGroup> {
        let Some(&(doc_index, group)) = self.groups.get(target) else {
            self.diagnostics.push(
                Diagnostic::resolution(format!("Unresolved group reference '{}'", target))
                    .with_location(scope.location())
                    .with_position(position)
                    .with_component(target.to_string()),
            );
            return None;
        };
        if self.expanding.contains(target) {
            self.diagnostics.push(
                Diagnostic::resolution(format!("Group '{}' contains itself", target))
                    .with_location(scope.location())
                    .with_position(position)
                    .with_component(target.to_string()),
            );
            return None;
        }

        self.expanding.push(target.clone());
        let documents = self.documents;
        let document = &documents[doc_index];
        let group_scope = Scope {
            document,
            order: document
                .declarations
                .iter()
                .position(|d| matches!(d, Declaration::Group(g) if g.name == group.name))
                .unwrap_or(0),
        };
        let particle = Particle {
            occurs: Occurs::ONCE,
            term: Term::Group(group.model.clone()),
        };
        let mut fields = Vec::new();
        self.flatten_particle(&particle, Occurs::ONCE, &[group.name.clone()], group_scope, &mut fields);
        self.expanding.pop();

        Some(FlatGroup {
            compositor: group.model.compositor,
            fields,
        })
    }

    fn attribute_fields(
        &mut self,
        items: &[AttributeItem],
        segments: &[String],
        scope: Scope<'_>,
        out: &mut Vec<Field>,
    ) {
        for item in items {
            match item {
                AttributeItem::Local(decl) => {
                    let mut path_segments = segments.to_vec();
                    path_segments.push(decl.name.clone());
                    let path = AnonymousPath {
                        namespace: scope.document.target_namespace.clone(),
                        segments: path_segments,
                        kind: AnonymousKind::Attribute,
                    };
                    let ty = match decl.ty {
                        Some(ref ty) => self.simple_type_ref(ty, &path, scope),
                        None => TypeRef::Builtin(Builtin::AnySimpleType),
                    };
                    out.push(Field {
                        default: decl.default.clone(),
                        fixed: decl.fixed.clone(),
                        prohibited: decl.use_kind == AttributeUseKind::Prohibited,
                        documentation: decl.documentation.clone(),
                        ..Field::new(
                            decl.name.clone(),
                            FieldSource::Attribute,
                            FieldType::Type(ty),
                            attribute_occurs(decl.use_kind),
                        )
                    });
                }
                AttributeItem::Ref {
                    target,
                    use_kind,
                    default,
                    fixed,
                    ..
                } => {
                    // The xml: attributes are never declared by a loaded schema.
                    let ty = if target.namespace() == Some(XML_NAMESPACE) {
                        FieldType::Type(TypeRef::Builtin(Builtin::String))
                    } else {
                        FieldType::AttributeRef(target.clone())
                    };
                    out.push(Field {
                        default: default.clone(),
                        fixed: fixed.clone(),
                        prohibited: *use_kind == AttributeUseKind::Prohibited,
                        ..Field::new(
                            target.local_name.clone(),
                            FieldSource::Attribute,
                            ty,
                            attribute_occurs(*use_kind),
                        )
                    });
                }
                AttributeItem::GroupRef { target, position } => {
                    if let Some(fields) = self.flat_attribute_group(target, *position, scope) {
                        for field in fields {
                            push_attribute(out, field);
                        }
                    }
                }
                AttributeItem::Any { .. } => push_attribute(
                    out,
                    Field::new(
                        ATTRIBUTE_WILDCARD_FIELD,
                        FieldSource::AttributeWildcard,
                        FieldType::Type(TypeRef::Builtin(Builtin::AnySimpleType)),
                        Occurs::OPTIONAL,
                    ),
                ),
            }
        }
    }

    fn flat_attribute_group(&mut self, target: &QName, position: Position, scope: Scope<'_>) -> Option<Vec<Field>> {
        if let Some(cached) = self.attribute_group_cache.get(target) {
            return cached.clone();
        }

        let built = match self.attribute_groups.get(target).copied() {
            None => {
                self.diagnostics.push(
                    Diagnostic::resolution(format!("Unresolved attribute group reference '{}'", target))
                        .with_location(scope.location())
                        .with_position(position)
                        .with_component(target.to_string()),
                );
                None
            }
            Some(_) if self.expanding.contains(target) => {
                self.diagnostics.push(
                    Diagnostic::resolution(format!("Attribute group '{}' contains itself", target))
                        .with_location(scope.location())
                        .with_position(position)
                        .with_component(target.to_string()),
                );
                None
            }
            Some((doc_index, group)) => {
                self.expanding.push(target.clone());
                let documents = self.documents;
                let document = &documents[doc_index];
                let group_scope = Scope { document, order: 0 };
                let mut fields = Vec::new();
                self.attribute_fields(&group.items, &[group.name.clone()], group_scope, &mut fields);
                self.expanding.pop();
                Some(fields)
            }
        };
        self.attribute_group_cache.insert(target.clone(), built.clone());
        built
    }

    /// One synthesized type per substitution group head
    fn build_substitution_groups(&mut self) {
        let mut members: BTreeMap<QName, BTreeSet<QName>> = BTreeMap::new();
        for element in self.elements.values() {
            for head in &element.substitution_group {
                members.entry(head.clone()).or_default().insert(element.qname.clone());
            }
        }

        for (head, direct) in &members {
            let Some(head_decl) = self.elements.get(head).cloned() else {
                for member in direct {
                    let Some(decl) = self.elements.get(member) else { continue };
                    self.diagnostics.push(
                        Diagnostic::resolution(format!(
                            "Substitution group head '{}' of element '{}' is not declared",
                            head, member
                        ))
                        .with_location(decl.location.as_str())
                        .with_position(decl.position)
                        .with_component(member.to_string()),
                    );
                }
                continue;
            };

            let mut alternatives = BTreeSet::new();
            if !head_decl.is_abstract {
                alternatives.insert(head.clone());
            }
            let mut queue: Vec<QName> = direct.iter().cloned().collect();
            let mut seen: HashSet<QName> = HashSet::new();
            while let Some(member) = queue.pop() {
                if !seen.insert(member.clone()) {
                    continue;
                }
                if let Some(decl) = self.elements.get(&member) {
                    if !decl.is_abstract {
                        alternatives.insert(member.clone());
                    }
                }
                if let Some(nested) = members.get(&member) {
                    queue.extend(nested.iter().cloned());
                }
            }

            let wanted = format!("{}Substitution", head.local_name);
            let qname = self.unique_name(head.namespace(), &wanted);
            self.taken.insert(qname.clone());
            let id = self.push_type(TypeDeclaration {
                qname,
                origin: TypeOrigin::Synthesized,
                kind: TypeKind::SubstitutionGroup {
                    head: head.clone(),
                    alternatives: alternatives.into_iter().collect(),
                },
                derivation: None,
                fields: Vec::new(),
                documentation: head_decl.documentation.clone(),
                location: head_decl.location.clone(),
                position: head_decl.position,
                order: 0,
            });
            self.substitution_groups.insert(head.clone(), id);
        }
    }

    fn finish(mut self) -> (TypeGraph, Vec<Diagnostic>) {
        let mut index = IndexMap::new();
        for (i, declaration) in self.types.iter().enumerate() {
            index.entry(declaration.qname.clone()).or_insert(TypeId(i));
        }
        self.elements.sort_keys();
        self.attributes.sort_keys();
        if !self.group_cache.is_empty() {
            debug!(groups = self.group_cache.len(), "inlined groups");
        }
        let graph = TypeGraph {
            types: self.types,
            index,
            elements: self.elements,
            attributes: self.attributes,
            substitution_groups: self.substitution_groups,
        };
        (graph, self.diagnostics)
    }
}

fn attribute_occurs(use_kind: AttributeUseKind) -> Occurs {
    match use_kind {
        AttributeUseKind::Required => Occurs::ONCE,
        AttributeUseKind::Optional => Occurs::OPTIONAL,
        AttributeUseKind::Prohibited => Occurs::new(0, MaxOccurs::Bounded(0)),
    }
}

/// Attribute wildcards collapse into one map field
fn push_attribute(out: &mut Vec<Field>, field: Field) {
    if field.source == FieldSource::AttributeWildcard
        && out.iter().any(|f| f.source == FieldSource::AttributeWildcard)
    {
        return;
    }
    out.push(field);
}
