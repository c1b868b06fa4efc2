//! Identifier assignment
//!
//! Type identifiers are unique across a run. Distinct qualified names that
//! sanitize to the same identifier are all disambiguated with their
//! namespace hash (plus a rank among same-namespace collisions); anything
//! still colliding afterwards is a naming conflict.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Diagnostic;
use crate::graph::TypeRef;
use crate::names::{disambiguate, field_ident, type_ident, unique_in_scope, variant_ident};
use crate::namespaces::QName;

use super::{ResolvedType, Shape};

/// Give every type its run-wide identifier
pub(super) fn assign_type_idents(types: &mut IndexMap<QName, ResolvedType>, diagnostics: &mut Vec<Diagnostic>) {
    let mut groups: BTreeMap<String, Vec<QName>> = BTreeMap::new();
    for qname in types.keys() {
        groups.entry(type_ident(&qname.local_name)).or_default().push(qname.clone());
    }

    let mut idents: HashMap<QName, String> = HashMap::new();
    for (ident, mut members) in groups {
        if members.len() == 1 {
            idents.insert(members.remove(0), ident);
            continue;
        }
        members.sort();
        debug!(ident = %ident, count = members.len(), "disambiguating identifier");
        let mut ranks: HashMap<Option<String>, usize> = HashMap::new();
        for qname in members {
            let rank = ranks.entry(qname.namespace.clone()).or_insert(0);
            let disambiguated = disambiguate(&ident, qname.namespace(), *rank);
            *rank += 1;
            idents.insert(qname, disambiguated);
        }
    }

    let mut owners: HashMap<String, QName> = HashMap::new();
    for ty in types.values_mut() {
        let Some(ident) = idents.remove(&ty.qname) else {
            continue;
        };
        if let Some(owner) = owners.get(&ident) {
            diagnostics.push(
                Diagnostic::naming_conflict(format!(
                    "Types '{}' and '{}' both map to identifier '{}'",
                    owner, ty.qname, ident
                ))
                .with_location(ty.location.as_str())
                .with_position(ty.position)
                .with_component(ty.qname.to_string()),
            );
        } else {
            owners.insert(ident.clone(), ty.qname.clone());
        }
        ty.ident = ident;
    }
}

/// Give fields and variants identifiers unique within their owner
pub(super) fn assign_member_idents(shape: &mut Shape) {
    let mut taken = HashSet::new();
    match shape {
        Shape::Struct { fields, .. } => {
            for field in fields {
                field.ident = unique_in_scope(&field_ident(&field.name), &mut taken);
            }
        }
        Shape::Enumeration { members, .. } => {
            for member in members {
                member.ident = unique_in_scope(&variant_ident(&member.value), &mut taken);
            }
        }
        Shape::Union { variants } => {
            for variant in variants {
                let raw = match variant.ty {
                    TypeRef::Builtin(builtin) => builtin.name().to_string(),
                    TypeRef::Named(ref qname) => qname.local_name.clone(),
                };
                variant.ident = unique_in_scope(&variant_ident(&raw), &mut taken);
            }
        }
        Shape::Substitution { variants, .. } => {
            for variant in variants {
                let raw = variant
                    .element
                    .as_ref()
                    .map(|e| e.local_name.clone())
                    .unwrap_or_default();
                variant.ident = unique_in_scope(&variant_ident(&raw), &mut taken);
            }
        }
        Shape::Alias { .. } | Shape::List { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DiagnosticKind, Position};
    use crate::graph::{Builtin, TypeOrigin};
    use crate::locations::Location;
    use crate::resolve::{ResolvedMember, ResolvedVariant};

    fn alias(qname: QName) -> (QName, ResolvedType) {
        let ty = ResolvedType {
            qname: qname.clone(),
            ident: String::new(),
            origin: TypeOrigin::Declared,
            shape: Shape::Alias {
                target: TypeRef::Builtin(Builtin::String),
                facets: Vec::new(),
            },
            documentation: None,
            location: Location::from_path("/schemas/n.xsd"),
            position: Position::new(1, 1),
            order: 0,
        };
        (qname, ty)
    }

    fn idents(types: &IndexMap<QName, ResolvedType>) -> Vec<&str> {
        types.values().map(|t| t.ident.as_str()).collect()
    }

    #[test]
    fn test_unique_names_are_sanitized_only() {
        let mut types: IndexMap<_, _> = [alias(QName::namespaced("urn:a", "purchase-order"))].into_iter().collect();
        let mut diagnostics = Vec::new();
        assign_type_idents(&mut types, &mut diagnostics);
        assert_eq!(idents(&types), vec!["PurchaseOrder"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_collisions_are_disambiguated() {
        let mut types: IndexMap<_, _> = [
            alias(QName::namespaced("urn:a", "Order")),
            alias(QName::namespaced("urn:a", "order")),
            alias(QName::namespaced("urn:b", "Order")),
        ]
        .into_iter()
        .collect();
        let mut diagnostics = Vec::new();
        assign_type_idents(&mut types, &mut diagnostics);
        assert!(diagnostics.is_empty());

        let names = idents(&types);
        assert_eq!(names[0], disambiguate("Order", Some("urn:a"), 0));
        assert_eq!(names[1], disambiguate("Order", Some("urn:a"), 1));
        assert_eq!(names[2], disambiguate("Order", Some("urn:b"), 0));
        let distinct: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_residual_collision_is_a_naming_conflict() {
        let taken = disambiguate("Order", Some("urn:a"), 0);
        let mut types: IndexMap<_, _> = [
            alias(QName::namespaced("urn:a", "Order")),
            alias(QName::namespaced("urn:a", "order")),
            alias(QName::namespaced("urn:c", taken.as_str())),
        ]
        .into_iter()
        .collect();
        let mut diagnostics = Vec::new();
        assign_type_idents(&mut types, &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::NamingConflict);
    }

    #[test]
    fn test_member_idents_are_unique_per_owner() {
        let mut shape = Shape::Enumeration {
            base: TypeRef::Builtin(Builtin::String),
            members: ["in-progress", "IN_PROGRESS", "42"]
                .iter()
                .map(|v| ResolvedMember {
                    value: v.to_string(),
                    ident: String::new(),
                    documentation: None,
                })
                .collect(),
        };
        assign_member_idents(&mut shape);
        let Shape::Enumeration { members, .. } = shape else { unreachable!() };
        let names: Vec<&str> = members.iter().map(|m| m.ident.as_str()).collect();
        assert_eq!(names, vec!["InProgress", "InProgress2", "V42"]);

        let mut union = Shape::Union {
            variants: vec![
                ResolvedVariant {
                    ident: String::new(),
                    ty: TypeRef::Builtin(Builtin::Int),
                    element: None,
                    indirect: false,
                },
                ResolvedVariant {
                    ident: String::new(),
                    ty: TypeRef::Named(QName::local("Size")),
                    element: None,
                    indirect: false,
                },
            ],
        };
        assign_member_idents(&mut union);
        let Shape::Union { variants } = union else { unreachable!() };
        assert_eq!(variants[0].ident, "Int");
        assert_eq!(variants[1].ident, "Size");
    }
}
