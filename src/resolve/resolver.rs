use std::collections::HashSet;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Diagnostic, Diagnostics};
use crate::graph::{
    Builtin, Field, FieldSource, FieldType, TypeDeclaration, TypeGraph, TypeId, TypeKind, TypeOrigin, TypeRef,
};
use crate::namespaces::QName;
use crate::schema::{MaxOccurs, Occurs};

use super::derivation::Flattener;
use super::{
    cycles, naming, policy, Cardinality, ResolvedField, ResolvedGraph, ResolvedMember, ResolvedType,
    ResolvedVariant, RootElement, Shape,
};

/// Name of the character data field of mixed-content types
const MIXED_TEXT_FIELD: &str = "text";

/// Resolve a type graph
///
/// Every problem found is pushed to `diagnostics`; the returned graph is
/// only meaningful for emission when none of them is fatal.
pub fn resolve(graph: &TypeGraph, diagnostics: &mut Diagnostics) -> ResolvedGraph {
    let mut found = Vec::new();
    check_references(graph, &mut found);

    let mut flattener = Flattener::new(graph);
    let mut work: Vec<(TypeId, TypeKind, Vec<Field>)> = Vec::with_capacity(graph.len());
    for (id, decl) in graph.iter() {
        let kind = policy::degrade(graph, decl, &mut found).unwrap_or_else(|| decl.kind.clone());
        let fields = match kind {
            TypeKind::Composite { .. } | TypeKind::SimpleContent { .. } => flattener.fields(id),
            _ => Vec::new(),
        };
        work.push((id, kind, fields));
    }
    found.append(&mut flattener.diagnostics);

    let collapsed: HashSet<QName> = work
        .iter()
        .filter(|(id, kind, _)| {
            matches!(graph.get(*id).origin, TypeOrigin::Anonymous(_)) && matches!(kind, TypeKind::Alias { .. })
        })
        .map(|(id, _, _)| graph.get(*id).qname.clone())
        .collect();
    debug!(collapsed = collapsed.len(), "anonymous aliases collapsed");

    let context = Context {
        graph,
        collapsed: &collapsed,
    };
    let mut resolved: Vec<ResolvedType> = work
        .into_par_iter()
        .filter(|(id, _, _)| !collapsed.contains(&graph.get(*id).qname))
        .map(|(id, kind, fields)| context.resolve_type(graph.get(id), kind, fields))
        .collect();
    resolved.sort_by(|a, b| a.qname.cmp(&b.qname));

    let mut types: IndexMap<QName, ResolvedType> = resolved.into_iter().map(|t| (t.qname.clone(), t)).collect();
    naming::assign_type_idents(&mut types, &mut found);
    let indirections = cycles::break_cycles(&mut types, &mut found);

    let elements = graph
        .elements()
        .map(|element| RootElement {
            qname: element.qname.clone(),
            ty: context.element_type(&element.qname),
            is_abstract: element.is_abstract,
        })
        .collect();

    info!(
        types = types.len(),
        collapsed = collapsed.len(),
        indirections,
        problems = found.len(),
        "type graph resolved"
    );
    diagnostics.extend(found);
    ResolvedGraph { types, elements }
}

/// Report every reference that names nothing in the graph
fn check_references(graph: &TypeGraph, found: &mut Vec<Diagnostic>) {
    let unresolved = |what: &str, target: &QName, decl: &TypeDeclaration| {
        Diagnostic::resolution(format!(
            "Unresolved {} reference '{}' in '{}'",
            what, target, decl.qname
        ))
        .with_location(decl.location.as_str())
        .with_position(decl.position)
        .with_component(decl.qname.to_string())
    };

    for (_, decl) in graph.iter() {
        for target in decl.references() {
            if graph.lookup(target).is_none() {
                found.push(unresolved("type", target, decl));
            }
        }
        for field in &decl.fields {
            match field.ty {
                FieldType::ElementRef(ref target) if graph.element(target).is_none() => {
                    found.push(unresolved("element", target, decl));
                }
                FieldType::AttributeRef(ref target) if graph.attribute(target).is_none() => {
                    found.push(unresolved("attribute", target, decl));
                }
                _ => {}
            }
        }
    }

    for element in graph.elements() {
        if let Some(target) = element.ty.as_ref().and_then(TypeRef::as_named) {
            if graph.lookup(target).is_none() {
                found.push(
                    Diagnostic::resolution(format!(
                        "Unresolved type reference '{}' in element '{}'",
                        target, element.qname
                    ))
                    .with_location(element.location.as_str())
                    .with_position(element.position)
                    .with_component(element.qname.to_string()),
                );
            }
        }
    }
    for attribute in graph.attributes.values() {
        if let Some(target) = attribute.ty.as_named() {
            if graph.lookup(target).is_none() {
                found.push(
                    Diagnostic::resolution(format!(
                        "Unresolved type reference '{}' in attribute '{}'",
                        target, attribute.qname
                    ))
                    .with_location(attribute.location.as_str())
                    .with_position(attribute.position)
                    .with_component(attribute.qname.to_string()),
                );
            }
        }
    }
}

/// Read-only state shared by the per-type workers
struct Context<'g> {
    graph: &'g TypeGraph,
    collapsed: &'g HashSet<QName>,
}

impl Context<'_> {
    /// Follow collapsed anonymous aliases to the type they stand for
    fn canonical(&self, ty: &TypeRef) -> TypeRef {
        let mut current = ty.clone();
        for _ in 0..=self.graph.len() {
            let next = match current {
                TypeRef::Named(ref qname) if self.collapsed.contains(qname) => {
                    match self.graph.lookup(qname).map(|id| &self.graph.get(id).kind) {
                        Some(TypeKind::Alias { target, .. }) => target.clone(),
                        _ => return current,
                    }
                }
                _ => return current,
            };
            current = next;
        }
        current
    }

    /// Type of a global element; untyped members take their head's type
    fn element_type(&self, qname: &QName) -> TypeRef {
        let mut current = qname.clone();
        for _ in 0..=self.graph.elements.len() {
            let Some(element) = self.graph.element(&current) else {
                break;
            };
            if let Some(ref ty) = element.ty {
                return self.canonical(ty);
            }
            match element.substitution_group.first() {
                Some(head) => current = head.clone(),
                None => break,
            }
        }
        TypeRef::Builtin(Builtin::AnyType)
    }

    fn resolve_type(&self, decl: &TypeDeclaration, kind: TypeKind, fields: Vec<Field>) -> ResolvedType {
        let mut shape = match kind {
            TypeKind::Composite { mixed, is_abstract, .. } => {
                let mut fields: Vec<ResolvedField> = fields.iter().map(|f| self.resolve_field(f)).collect();
                if mixed {
                    let occurs = Occurs::new(0, MaxOccurs::Unbounded);
                    fields.push(ResolvedField {
                        name: MIXED_TEXT_FIELD.to_string(),
                        ident: String::new(),
                        source: FieldSource::Text,
                        ty: TypeRef::Builtin(Builtin::String),
                        occurs,
                        cardinality: Cardinality::Repeated,
                        indirect: false,
                        default: None,
                        fixed: None,
                        documentation: None,
                    });
                }
                Shape::Struct { fields, is_abstract }
            }
            TypeKind::SimpleContent { .. } => Shape::Struct {
                fields: fields.iter().map(|f| self.resolve_field(f)).collect(),
                is_abstract: false,
            },
            TypeKind::Enumeration { base, members, .. } => Shape::Enumeration {
                base: self.canonical(&base),
                members: members
                    .into_iter()
                    .map(|m| ResolvedMember {
                        value: m.value,
                        ident: String::new(),
                        documentation: m.documentation,
                    })
                    .collect(),
            },
            TypeKind::Alias { target, facets } => Shape::Alias {
                target: self.canonical(&target),
                facets,
            },
            TypeKind::List { item } => Shape::List {
                item: self.canonical(&item),
            },
            TypeKind::Union { members } => Shape::Union {
                variants: members
                    .iter()
                    .map(|member| ResolvedVariant {
                        ident: String::new(),
                        ty: self.canonical(member),
                        element: None,
                        indirect: false,
                    })
                    .collect(),
            },
            TypeKind::SubstitutionGroup { head, alternatives } => Shape::Substitution {
                head,
                variants: alternatives
                    .into_iter()
                    .map(|element| ResolvedVariant {
                        ident: String::new(),
                        ty: self.element_type(&element),
                        element: Some(element),
                        indirect: false,
                    })
                    .collect(),
            },
        };
        naming::assign_member_idents(&mut shape);

        ResolvedType {
            qname: decl.qname.clone(),
            ident: String::new(),
            origin: decl.origin.clone(),
            shape,
            documentation: decl.documentation.clone(),
            location: decl.location.clone(),
            position: decl.position,
            order: decl.order,
        }
    }

    fn resolve_field(&self, field: &Field) -> ResolvedField {
        let mut default = field.default.clone();
        let mut fixed = field.fixed.clone();
        let mut nillable = field.nillable;
        let mut documentation = field.documentation.clone();

        let ty = match field.ty {
            FieldType::Type(ref ty) => self.canonical(ty),
            FieldType::ElementRef(ref target) => {
                if let Some(element) = self.graph.element(target) {
                    default = default.or_else(|| element.default.clone());
                    fixed = fixed.or_else(|| element.fixed.clone());
                    nillable |= element.nillable;
                    documentation = documentation.or_else(|| element.documentation.clone());
                }
                match self.graph.substitution_group(target) {
                    Some(id) => TypeRef::Named(self.graph.get(id).qname.clone()),
                    None => self.element_type(target),
                }
            }
            FieldType::AttributeRef(ref target) => match self.graph.attribute(target) {
                Some(attribute) => {
                    default = default.or_else(|| attribute.default.clone());
                    fixed = fixed.or_else(|| attribute.fixed.clone());
                    documentation = documentation.or_else(|| attribute.documentation.clone());
                    self.canonical(&attribute.ty)
                }
                None => TypeRef::Builtin(Builtin::AnySimpleType),
            },
        };

        ResolvedField {
            name: field.name.clone(),
            ident: String::new(),
            source: field.source,
            ty,
            occurs: field.occurs,
            cardinality: Cardinality::from_occurs(field.occurs, nillable),
            indirect: false,
            default,
            fixed,
            documentation,
        }
    }
}
