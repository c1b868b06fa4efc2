//! Containment cycles
//!
//! A field stores its value inline unless it is repeated. Types that reach
//! each other through inline fields form a strongly connected component;
//! inside one, every optional field and every substitution alternative is
//! moved behind a pointer. A component held together by required
//! single-valued fields alone has no finite layout and is an error.

use std::collections::HashSet;

use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::error::Diagnostic;
use crate::namespaces::QName;

use super::{Cardinality, ResolvedType, Shape};

#[derive(Debug, Clone, Copy)]
enum Edge {
    /// Struct field by position; `true` when required
    Field(usize, bool),
    /// Union or substitution variant by position
    Variant(usize),
}

impl Edge {
    fn is_mandatory(&self) -> bool {
        matches!(self, Edge::Field(_, true))
    }
}

/// Mark the indirections that break every cycle; report unbreakable ones
pub(super) fn break_cycles(types: &mut IndexMap<QName, ResolvedType>, diagnostics: &mut Vec<Diagnostic>) -> usize {
    let mut graph: DiGraph<usize, Edge> = DiGraph::with_capacity(types.len(), types.len());
    let nodes: Vec<NodeIndex> = (0..types.len()).map(|i| graph.add_node(i)).collect();

    for (i, ty) in types.values().enumerate() {
        let target = |qname: &QName| types.get_index_of(qname).map(|j| nodes[j]);
        match ty.shape {
            Shape::Struct { ref fields, .. } => {
                for (f, field) in fields.iter().enumerate() {
                    if field.cardinality == Cardinality::Repeated {
                        continue;
                    }
                    if let Some(to) = field.ty.as_named().and_then(target) {
                        let mandatory = field.cardinality == Cardinality::Required;
                        graph.add_edge(nodes[i], to, Edge::Field(f, mandatory));
                    }
                }
            }
            Shape::Union { ref variants } | Shape::Substitution { ref variants, .. } => {
                for (v, variant) in variants.iter().enumerate() {
                    if let Some(to) = variant.ty.as_named().and_then(target) {
                        graph.add_edge(nodes[i], to, Edge::Variant(v));
                    }
                }
            }
            _ => {}
        }
    }

    // Cycles through required fields only
    let mandatory = graph.filter_map(|_, node| Some(*node), |_, edge| edge.is_mandatory().then_some(*edge));
    for component in tarjan_scc(&mandatory) {
        if !is_cyclic(&mandatory, &component) {
            continue;
        }
        let mut members: Vec<&ResolvedType> = component
            .iter()
            .filter_map(|n| types.get_index(mandatory[*n]).map(|(_, t)| t))
            .collect();
        members.sort_by(|a, b| a.qname.cmp(&b.qname));
        let names = members
            .iter()
            .map(|t| format!("'{}'", t.qname))
            .collect::<Vec<_>>()
            .join(", ");
        for member in &members {
            diagnostics.push(
                Diagnostic::resolution(format!(
                    "Types {} contain each other through required single-valued fields; no finite layout exists",
                    names
                ))
                .with_location(member.location.as_str())
                .with_position(member.position)
                .with_component(member.qname.to_string()),
            );
        }
    }

    let mut indirect: Vec<(usize, Edge)> = Vec::new();
    for component in tarjan_scc(&graph) {
        if !is_cyclic(&graph, &component) {
            continue;
        }
        let inside: HashSet<NodeIndex> = component.iter().copied().collect();
        for &node in &component {
            for edge in graph.edges(node) {
                if inside.contains(&edge.target()) && !edge.weight().is_mandatory() {
                    indirect.push((graph[node], *edge.weight()));
                }
            }
        }
    }

    let count = indirect.len();
    for (index, edge) in indirect {
        let Some((_, ty)) = types.get_index_mut(index) else {
            continue;
        };
        match (&mut ty.shape, edge) {
            (Shape::Struct { fields, .. }, Edge::Field(f, _)) => fields[f].indirect = true,
            (Shape::Union { variants }, Edge::Variant(v))
            | (Shape::Substitution { variants, .. }, Edge::Variant(v)) => variants[v].indirect = true,
            _ => {}
        }
        debug!(type = %ty.qname, "indirection inserted");
    }
    count
}

fn is_cyclic<N, E>(graph: &DiGraph<N, E>, component: &[NodeIndex]) -> bool {
    component.len() > 1 || component.iter().any(|&n| graph.contains_edge(n, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Position;
    use crate::graph::{FieldSource, TypeOrigin, TypeRef};
    use crate::locations::Location;
    use crate::resolve::ResolvedField;
    use crate::schema::{MaxOccurs, Occurs};

    fn field(name: &str, target: &str, occurs: Occurs) -> ResolvedField {
        ResolvedField {
            name: name.to_string(),
            ident: name.to_string(),
            source: FieldSource::Element,
            ty: TypeRef::Named(QName::local(target)),
            occurs,
            cardinality: Cardinality::from_occurs(occurs, false),
            indirect: false,
            default: None,
            fixed: None,
            documentation: None,
        }
    }

    fn structure(name: &str, fields: Vec<ResolvedField>) -> (QName, ResolvedType) {
        let qname = QName::local(name);
        let ty = ResolvedType {
            qname: qname.clone(),
            ident: name.to_string(),
            origin: TypeOrigin::Declared,
            shape: Shape::Struct {
                fields,
                is_abstract: false,
            },
            documentation: None,
            location: Location::from_path("/schemas/c.xsd"),
            position: Position::new(1, 1),
            order: 0,
        };
        (qname, ty)
    }

    fn fields_of<'a>(types: &'a IndexMap<QName, ResolvedType>, name: &str) -> &'a [ResolvedField] {
        match types[&QName::local(name)].shape {
            Shape::Struct { ref fields, .. } => fields,
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn test_optional_self_reference_becomes_indirect() {
        let mut types: IndexMap<_, _> = [structure(
            "Node",
            vec![
                field("parent", "Node", Occurs::OPTIONAL),
                field("children", "Node", Occurs::new(0, MaxOccurs::Unbounded)),
            ],
        )]
        .into_iter()
        .collect();
        let mut diagnostics = Vec::new();
        assert_eq!(break_cycles(&mut types, &mut diagnostics), 1);
        assert!(diagnostics.is_empty());
        let fields = fields_of(&types, "Node");
        assert!(fields[0].indirect);
        assert!(!fields[1].indirect);
    }

    #[test]
    fn test_mutually_required_types_are_rejected() {
        let mut types: IndexMap<_, _> = [
            structure("A", vec![field("b", "B", Occurs::ONCE)]),
            structure("B", vec![field("a", "A", Occurs::ONCE)]),
        ]
        .into_iter()
        .collect();
        let mut diagnostics = Vec::new();
        break_cycles(&mut types, &mut diagnostics);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.contains("'A', 'B'"));
    }

    #[test]
    fn test_cycle_with_one_optional_edge_is_broken_there() {
        let mut types: IndexMap<_, _> = [
            structure("A", vec![field("b", "B", Occurs::ONCE)]),
            structure("B", vec![field("a", "A", Occurs::OPTIONAL)]),
            structure("C", vec![field("a", "A", Occurs::ONCE)]),
        ]
        .into_iter()
        .collect();
        let mut diagnostics = Vec::new();
        assert_eq!(break_cycles(&mut types, &mut diagnostics), 1);
        assert!(diagnostics.is_empty());
        assert!(!fields_of(&types, "A")[0].indirect);
        assert!(fields_of(&types, "B")[0].indirect);
        assert!(!fields_of(&types, "C")[0].indirect);
    }
}
