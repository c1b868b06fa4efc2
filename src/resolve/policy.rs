//! Restriction shapes with no generated representation
//!
//! Each check reports an unsupported-construct diagnostic and returns the
//! nearest representable kind. Whether the diagnostic aborts the run is
//! decided by the caller's strictness, not here.

use tracing::warn;

use crate::error::Diagnostic;
use crate::graph::{TypeDeclaration, TypeGraph, TypeKind, TypeRef};
use crate::schema::Facet;

/// Degrade an unsupported restriction shape; `None` when the kind is fine as is
pub(super) fn degrade(graph: &TypeGraph, decl: &TypeDeclaration, diagnostics: &mut Vec<Diagnostic>) -> Option<TypeKind> {
    let (reason, degraded) = match decl.kind {
        TypeKind::Enumeration { ref base, .. } if is_list_or_union(graph, base) => (
            format!("enumeration facets on a restriction of list or union type '{}'", base),
            TypeKind::Alias {
                target: base.clone(),
                facets: Vec::new(),
            },
        ),
        TypeKind::Enumeration {
            ref base,
            ref members,
            ref facets,
        } if facets.iter().any(Facet::constrains_values) => (
            format!(
                "enumeration combined with {}; only the enumeration is kept",
                describe(facets)
            ),
            TypeKind::Enumeration {
                base: base.clone(),
                members: members.clone(),
                facets: facets.iter().filter(|f| !f.constrains_values()).cloned().collect(),
            },
        ),
        TypeKind::Alias { ref target, ref facets }
            if facets.iter().any(Facet::constrains_values) && is_list_or_union(graph, target) =>
        {
            (
                format!("{} on a restriction of list or union type '{}'", describe(facets), target),
                TypeKind::Alias {
                    target: target.clone(),
                    facets: Vec::new(),
                },
            )
        }
        TypeKind::SimpleContent { ref value, ref facets } if facets.iter().any(Facet::is_enumeration) => (
            "enumeration facets inside a simpleContent restriction; the base value type is used".to_string(),
            TypeKind::SimpleContent {
                value: value.clone(),
                facets: facets.iter().filter(|f| !f.is_enumeration()).cloned().collect(),
            },
        ),
        _ => return None,
    };

    warn!(type = %decl.qname, reason = %reason, "degrading unsupported restriction");
    diagnostics.push(
        Diagnostic::unsupported(format!("Unmapped restriction facet combination: {}", reason))
            .with_location(decl.location.as_str())
            .with_position(decl.position)
            .with_component(decl.qname.to_string()),
    );
    Some(degraded)
}

fn describe(facets: &[Facet]) -> String {
    facets
        .iter()
        .filter(|f| f.constrains_values())
        .map(Facet::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether values of `ty` are lists or unions, looking through aliases
fn is_list_or_union(graph: &TypeGraph, ty: &TypeRef) -> bool {
    let mut current = ty.clone();
    for _ in 0..=graph.len() {
        let named = match current {
            TypeRef::Builtin(builtin) => return builtin.is_list(),
            TypeRef::Named(ref qname) => qname.clone(),
        };
        let Some(id) = graph.lookup(&named) else {
            return false;
        };
        current = match graph.get(id).kind {
            TypeKind::List { .. } | TypeKind::Union { .. } => return true,
            TypeKind::Alias { ref target, .. } => target.clone(),
            TypeKind::Enumeration { ref base, .. } => base.clone(),
            _ => return false,
        };
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DiagnosticKind, Position};
    use crate::graph::{Builtin, EnumMember, TypeOrigin};
    use crate::locations::Location;
    use crate::namespaces::QName;

    fn declaration(name: &str, kind: TypeKind) -> TypeDeclaration {
        TypeDeclaration {
            qname: QName::local(name),
            origin: TypeOrigin::Declared,
            kind,
            derivation: None,
            fields: Vec::new(),
            documentation: None,
            location: Location::from_path("/schemas/p.xsd"),
            position: Position::new(1, 1),
            order: 0,
        }
    }

    fn member(value: &str) -> EnumMember {
        EnumMember {
            value: value.to_string(),
            documentation: None,
        }
    }

    #[test]
    fn test_enumeration_with_pattern_keeps_enumeration() {
        let graph = TypeGraph::default();
        let decl = declaration(
            "Code",
            TypeKind::Enumeration {
                base: TypeRef::Builtin(Builtin::String),
                members: vec![member("A"), member("B")],
                facets: vec![Facet::Pattern("[A-Z]".to_string()), Facet::WhiteSpace("collapse".to_string())],
            },
        );
        let mut diagnostics = Vec::new();
        let degraded = degrade(&graph, &decl, &mut diagnostics).unwrap();
        let TypeKind::Enumeration { members, facets, .. } = degraded else {
            panic!("expected enumeration");
        };
        assert_eq!(members.len(), 2);
        assert_eq!(facets, vec![Facet::WhiteSpace("collapse".to_string())]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Unsupported);
        assert!(diagnostics[0].message.contains("pattern"));
    }

    #[test]
    fn test_facets_on_builtin_list_degrade_to_alias() {
        let graph = TypeGraph::default();
        let decl = declaration(
            "Tokens",
            TypeKind::Alias {
                target: TypeRef::Builtin(Builtin::NmTokens),
                facets: vec![Facet::MaxLength("4".to_string())],
            },
        );
        let mut diagnostics = Vec::new();
        assert_eq!(
            degrade(&graph, &decl, &mut diagnostics),
            Some(TypeKind::Alias {
                target: TypeRef::Builtin(Builtin::NmTokens),
                facets: Vec::new()
            })
        );
    }

    #[test]
    fn test_plain_shapes_are_untouched() {
        let graph = TypeGraph::default();
        let mut diagnostics = Vec::new();
        let alias = declaration(
            "Short",
            TypeKind::Alias {
                target: TypeRef::Builtin(Builtin::String),
                facets: vec![Facet::MaxLength("8".to_string())],
            },
        );
        let enumeration = declaration(
            "Color",
            TypeKind::Enumeration {
                base: TypeRef::Builtin(Builtin::String),
                members: vec![member("RED")],
                facets: Vec::new(),
            },
        );
        assert_eq!(degrade(&graph, &alias, &mut diagnostics), None);
        assert_eq!(degrade(&graph, &enumeration, &mut diagnostics), None);
        assert!(diagnostics.is_empty());
    }
}
