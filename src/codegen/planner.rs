//! Emission planning
//!
//! Partitions resolved types into [`GeneratedUnit`]s under the configured
//! layout and fixes the member order inside each unit: types declared in
//! schema documents first, in document order, then synthesized types by
//! qualified name.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use tracing::debug;

use crate::config::PackageNaming;
use crate::graph::TypeRef;
use crate::names::{module_ident, namespace_hash};
use crate::namespaces::QName;
use crate::resolve::{ResolvedGraph, ResolvedType};

/// Module name for types without a namespace
pub const UNQUALIFIED_MODULE: &str = "unqualified";

/// Index module of multi-unit layouts
pub const INDEX_MODULE: &str = "mod";

/// One emitted source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Module identifier
    pub module: String,
    /// Path relative to the output root
    pub path: PathBuf,
    /// Namespace the unit was derived from; `None` for the single layout
    pub namespace: Option<String>,
    /// Types in emission order
    pub members: Vec<QName>,
    /// Global elements whose table lives in this unit
    pub elements: Vec<QName>,
}

/// Where every generated type goes
#[derive(Debug, Clone)]
pub struct EmissionPlan {
    /// Layout the plan was made for
    pub layout: PackageNaming,
    /// Units sorted by path
    pub units: Vec<GeneratedUnit>,
    /// Elements listed in the index module instead of a unit
    pub index_elements: Vec<QName>,
    unit_of: HashMap<QName, usize>,
}

impl EmissionPlan {
    /// Whether the layout produces an index module
    pub fn has_index(&self) -> bool {
        self.layout != PackageNaming::Single
    }

    /// The unit a type is emitted into
    pub fn unit_of(&self, qname: &QName) -> Option<&GeneratedUnit> {
        self.unit_of.get(qname).map(|&i| &self.units[i])
    }

    /// Module paths per namespace, for the manifest
    pub fn modules_by_namespace(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for unit in &self.units {
            for qname in unit.members.iter().chain(&unit.elements) {
                let key = qname.namespace.clone().unwrap_or_default();
                let modules = map.entry(key).or_default();
                if !modules.contains(&unit.module) {
                    modules.push(unit.module.clone());
                }
            }
        }
        for modules in map.values_mut() {
            modules.sort();
        }
        map
    }
}

/// Module name derived from a namespace URI, scheme dropped
pub fn namespace_module(namespace: Option<&str>) -> String {
    let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) else {
        return UNQUALIFIED_MODULE.to_string();
    };
    let without_scheme = match namespace.split_once("://") {
        Some((_, rest)) => rest,
        None => namespace.strip_prefix("urn:").unwrap_or(namespace),
    };
    module_ident(without_scheme)
}

/// Partition the resolved graph into units
pub fn plan(resolved: &ResolvedGraph, layout: PackageNaming, single_module: &str) -> EmissionPlan {
    // (module, namespace, members)
    let mut groups: Vec<(String, Option<String>, Vec<&ResolvedType>)> = match layout {
        PackageNaming::PerNamespace => {
            let mut by_namespace: BTreeMap<Option<String>, Vec<&ResolvedType>> =
                resolved.namespaces().into_iter().map(|ns| (ns, Vec::new())).collect();
            for ty in resolved.types() {
                by_namespace.entry(ty.qname.namespace.clone()).or_default().push(ty);
            }
            by_namespace
                .into_iter()
                .map(|(ns, members)| (namespace_module(ns.as_deref()), ns, members))
                .collect()
        }
        PackageNaming::PerType => resolved
            .types()
            .map(|ty| (module_ident(&ty.ident), ty.qname.namespace.clone(), vec![ty]))
            .collect(),
        PackageNaming::Single => vec![(single_module.to_string(), None, resolved.types().collect())],
    };
    disambiguate_modules(&mut groups);

    let mut units: Vec<GeneratedUnit> = groups
        .into_iter()
        .map(|(module, namespace, mut members)| {
            order_members(&mut members);
            GeneratedUnit {
                path: PathBuf::from(format!("{}.rs", module)),
                module,
                namespace,
                members: members.into_iter().map(|t| t.qname.clone()).collect(),
                elements: Vec::new(),
            }
        })
        .collect();
    units.sort_by(|a, b| a.path.cmp(&b.path));

    let mut unit_of = HashMap::new();
    for (i, unit) in units.iter().enumerate() {
        for qname in &unit.members {
            unit_of.insert(qname.clone(), i);
        }
    }

    let mut index_elements = Vec::new();
    for element in resolved.elements() {
        let home = match layout {
            PackageNaming::Single => Some(0),
            PackageNaming::PerNamespace => units.iter().position(|u| u.namespace == element.qname.namespace),
            PackageNaming::PerType => match element.ty {
                TypeRef::Named(ref qname) => unit_of.get(qname).copied(),
                TypeRef::Builtin(_) => None,
            },
        };
        match home.and_then(|i| units.get_mut(i)) {
            Some(unit) => unit.elements.push(element.qname.clone()),
            None => index_elements.push(element.qname.clone()),
        }
    }

    debug!(layout = layout.as_str(), units = units.len(), "emission planned");
    EmissionPlan {
        layout,
        units,
        index_elements,
        unit_of,
    }
}

/// Declared types in document order, then synthesized types by name
fn order_members(members: &mut [&ResolvedType]) {
    members.sort_by(|a, b| {
        a.is_synthesized()
            .cmp(&b.is_synthesized())
            .then_with(|| {
                if a.is_synthesized() {
                    std::cmp::Ordering::Equal
                } else {
                    (a.location.as_str(), a.order).cmp(&(b.location.as_str(), b.order))
                }
            })
            .then_with(|| a.qname.cmp(&b.qname))
    });
}

/// Module names that collide case-insensitively get the namespace hash
fn disambiguate_modules(groups: &mut [(String, Option<String>, Vec<&ResolvedType>)]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for (module, _, _) in groups.iter() {
        *counts.entry(module.to_lowercase()).or_default() += 1;
    }
    for (module, namespace, members) in groups.iter_mut() {
        let key = module.to_lowercase();
        if counts[&key] > 1 {
            let owner = match members.first() {
                Some(first) if namespace.is_none() => first.qname.to_string(),
                _ => namespace.clone().unwrap_or_default(),
            };
            *module = format!("{}_{}", module, namespace_hash(Some(owner.as_str())));
        }
    }

    // Whatever still collides gets a rank
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (module, _, _) in groups.iter_mut() {
        let rank = seen.entry(module.to_lowercase()).or_insert(0);
        *rank += 1;
        if *rank > 1 {
            *module = format!("{}_{}", module, rank);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Position;
    use crate::graph::{Builtin, TypeOrigin};
    use crate::locations::Location;
    use crate::resolve::{RootElement, Shape};
    use indexmap::IndexMap;

    fn ty(ns: Option<&str>, name: &str, origin: TypeOrigin, file: &str, order: usize) -> ResolvedType {
        ResolvedType {
            qname: QName::new(ns, name),
            ident: crate::names::type_ident(name),
            origin,
            shape: Shape::Alias {
                target: TypeRef::Builtin(Builtin::String),
                facets: Vec::new(),
            },
            documentation: None,
            location: Location::from_path(format!("/schemas/{}", file)),
            position: Position::new(1, 1),
            order,
        }
    }

    fn graph(types: Vec<ResolvedType>, elements: Vec<RootElement>) -> ResolvedGraph {
        let mut map: IndexMap<QName, ResolvedType> = types.into_iter().map(|t| (t.qname.clone(), t)).collect();
        map.sort_keys();
        ResolvedGraph { types: map, elements }
    }

    #[test]
    fn test_namespace_module_names() {
        assert_eq!(namespace_module(Some("http://example.com/orders/v1")), "example_com_orders_v1");
        assert_eq!(namespace_module(Some("urn:acme:billing")), "acme_billing");
        assert_eq!(namespace_module(None), UNQUALIFIED_MODULE);
        assert_eq!(namespace_module(Some("")), UNQUALIFIED_MODULE);
    }

    #[test]
    fn test_per_namespace_member_order() {
        let anonymous = TypeOrigin::Anonymous(crate::graph::AnonymousPath {
            namespace: Some("urn:a".to_string()),
            segments: vec!["x".to_string()],
            kind: crate::graph::AnonymousKind::Element,
        });
        let resolved = graph(
            vec![
                ty(Some("urn:a"), "Zeta", TypeOrigin::Declared, "a.xsd", 0),
                ty(Some("urn:a"), "Alpha", TypeOrigin::Declared, "a.xsd", 3),
                ty(Some("urn:a"), "xType", anonymous, "a.xsd", 1),
                ty(Some("urn:a"), "Beta", TypeOrigin::Declared, "a2.xsd", 0),
                ty(None, "Loose", TypeOrigin::Declared, "b.xsd", 0),
            ],
            vec![RootElement {
                qname: QName::namespaced("urn:a", "root"),
                ty: TypeRef::Builtin(Builtin::String),
                is_abstract: false,
            }],
        );
        let plan = plan(&resolved, PackageNaming::PerNamespace, "model");
        let modules: Vec<&str> = plan.units.iter().map(|u| u.module.as_str()).collect();
        assert_eq!(modules, vec!["a", UNQUALIFIED_MODULE]);
        let members: Vec<&str> = plan.units[0].members.iter().map(|q| q.local_name.as_str()).collect();
        assert_eq!(members, vec!["Zeta", "Alpha", "Beta", "xType"]);
        assert_eq!(plan.units[0].elements.len(), 1);
        assert!(plan.index_elements.is_empty());
        assert_eq!(plan.unit_of(&QName::local("Loose")).map(|u| u.module.as_str()), Some(UNQUALIFIED_MODULE));
    }

    #[test]
    fn test_colliding_modules_are_disambiguated() {
        let resolved = graph(
            vec![
                ty(Some("http://example.com/a"), "A", TypeOrigin::Declared, "a.xsd", 0),
                ty(Some("https://example.com/a"), "B", TypeOrigin::Declared, "b.xsd", 0),
            ],
            Vec::new(),
        );
        let plan = plan(&resolved, PackageNaming::PerNamespace, "model");
        assert_eq!(plan.units.len(), 2);
        assert_ne!(plan.units[0].module, plan.units[1].module);
        assert!(plan.units.iter().all(|u| u.module.starts_with("example_com_a_")));
    }

    #[test]
    fn test_per_type_and_single_layouts() {
        let types = vec![
            ty(Some("urn:a"), "Order", TypeOrigin::Declared, "a.xsd", 0),
            ty(Some("urn:a"), "Item", TypeOrigin::Declared, "a.xsd", 1),
        ];
        let elements = vec![RootElement {
            qname: QName::namespaced("urn:a", "note"),
            ty: TypeRef::Builtin(Builtin::String),
            is_abstract: false,
        }];
        let resolved = graph(types, elements);

        let per_type = plan(&resolved, PackageNaming::PerType, "model");
        let paths: Vec<PathBuf> = per_type.units.iter().map(|u| u.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("item.rs"), PathBuf::from("order.rs")]);
        assert!(per_type.has_index());
        assert_eq!(per_type.index_elements.len(), 1);

        let single = plan(&resolved, PackageNaming::Single, "model");
        assert_eq!(single.units.len(), 1);
        assert_eq!(single.units[0].path, PathBuf::from("model.rs"));
        assert_eq!(single.units[0].elements.len(), 1);
        assert!(!single.has_index());
    }
}
