//! The loaded document set
//!
//! [`SchemaSet::load`] parses every discovered schema and transitively
//! follows `import`/`include`/`redefine` directives. Work proceeds in
//! waves: all pending locations of a wave are read and parsed in parallel,
//! then the next wave is collected from their directives. The set of
//! visited `(location, namespace)` pairs makes cyclic imports terminate and
//! lets a chameleon document be loaded once per adopting namespace.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Diagnostic, Diagnostics, Position};
use crate::loaders::Loader;
use crate::locations::Location;
use crate::namespaces::{is_xsd_namespace, QName, XML_NAMESPACE};

use super::components::*;
use super::document::{DirectiveKind, SchemaDocument};
use super::parsing::parse_schema_document;

/// Where a pending location was referenced from
#[derive(Debug, Clone)]
struct Origin {
    location: String,
    position: Position,
    directive: &'static str,
    /// Namespace the referenced document must declare, if any
    expected_namespace: Option<Option<String>>,
}

#[derive(Debug, Clone)]
struct Pending {
    location: Location,
    chameleon_namespace: Option<String>,
    origin: Option<Origin>,
    depth: usize,
}

/// An import without `schemaLocation`, checked once loading completes
#[derive(Debug, Clone)]
struct NamespaceRequirement {
    namespace: Option<String>,
    location: String,
    position: Position,
}

/// Every document of one run, keyed by location and target namespace
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    documents: Vec<SchemaDocument>,
}

impl SchemaSet {
    /// Build a set from already parsed documents
    pub fn from_documents(mut documents: Vec<SchemaDocument>) -> Self {
        documents.sort_by(|a, b| {
            (&a.location, &a.target_namespace).cmp(&(&b.location, &b.target_namespace))
        });
        Self { documents }
    }

    /// Load `roots` and everything they reference
    ///
    /// Every problem is pushed into `diagnostics`; the returned set holds
    /// whatever could be parsed.
    pub fn load(roots: &[Location], loader: &Loader, diagnostics: &mut Diagnostics) -> Self {
        let limits = loader.limits().clone();
        let mut visited: HashSet<(Location, Option<String>)> = HashSet::new();
        let mut loaded: HashSet<(Location, Option<String>)> = HashSet::new();
        let mut requirements = Vec::new();
        let mut documents = Vec::new();
        let mut root_problems: Vec<(Location, Vec<Diagnostic>)> = Vec::new();

        let mut wave: Vec<Pending> = roots
            .iter()
            .filter(|location| visited.insert(((*location).clone(), None)))
            .map(|location| Pending {
                location: location.clone(),
                chameleon_namespace: None,
                origin: None,
                depth: 0,
            })
            .collect();

        while !wave.is_empty() {
            debug!(count = wave.len(), "loading schema wave");
            let results: Vec<_> = wave
                .into_par_iter()
                .map(|pending| {
                    let result = loader.load(&pending.location).and_then(|text| {
                        parse_schema_document(
                            &text,
                            &pending.location,
                            pending.chameleon_namespace.as_deref(),
                            &limits,
                        )
                    });
                    (pending, result)
                })
                .collect();

            let mut next = Vec::new();
            for (pending, result) in results {
                let (document, problems) = match result {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        diagnostics.push(attribute_to_origin(err.into_diagnostic(), &pending));
                        continue;
                    }
                };
                if pending.origin.is_none() {
                    root_problems.push((pending.location.clone(), problems));
                } else {
                    diagnostics.extend(problems);
                }

                if let Some(problem) = check_expected_namespace(&pending, &document) {
                    diagnostics.push(problem);
                    continue;
                }
                if !loaded.insert((document.location.clone(), document.target_namespace.clone())) {
                    continue;
                }

                for directive in &document.directives {
                    let origin_location = document.location_str();
                    let (chameleon_namespace, expected_namespace) = match directive.kind {
                        DirectiveKind::Import => {
                            let namespace = directive.namespace.clone();
                            if is_builtin_namespace(namespace.as_deref()) {
                                continue;
                            }
                            if directive.schema_location.is_none() {
                                requirements.push(NamespaceRequirement {
                                    namespace,
                                    location: origin_location,
                                    position: directive.position,
                                });
                                continue;
                            }
                            (None, Some(namespace))
                        }
                        DirectiveKind::Include | DirectiveKind::Redefine { .. } => (
                            document.target_namespace.clone(),
                            Some(document.target_namespace.clone()),
                        ),
                    };
                    let Some(ref schema_location) = directive.schema_location else {
                        continue;
                    };

                    let target = match document.location.resolve(schema_location) {
                        Ok(target) => target,
                        Err(err) => {
                            diagnostics.push(
                                err.into_diagnostic()
                                    .with_location(origin_location)
                                    .with_position(directive.position),
                            );
                            continue;
                        }
                    };

                    let depth = pending.depth + 1;
                    if let Err(err) = limits.check_schema_depth(depth) {
                        diagnostics.push(
                            err.into_diagnostic()
                                .with_location(origin_location)
                                .with_position(directive.position),
                        );
                        continue;
                    }

                    if visited.insert((target.clone(), chameleon_namespace.clone())) {
                        next.push(Pending {
                            location: target,
                            chameleon_namespace,
                            origin: Some(Origin {
                                location: origin_location,
                                position: directive.position,
                                directive: directive.kind.as_str(),
                                expected_namespace,
                            }),
                            depth,
                        });
                    }
                }
                documents.push(document);
            }
            wave = next;
        }

        let roots: HashSet<Location> = roots.iter().cloned().collect();
        let dropped = drop_claimed_roots(&mut documents, &roots);
        for (location, problems) in root_problems {
            if !dropped.contains(&location) {
                diagnostics.extend(problems);
            }
        }

        let mut set = SchemaSet::from_documents(documents);
        for requirement in requirements {
            let satisfied = set
                .documents
                .iter()
                .any(|d| d.target_namespace == requirement.namespace);
            if !satisfied {
                diagnostics.push(
                    Diagnostic::load(format!(
                        "Imported namespace '{}' has no schemaLocation and is not declared by any loaded schema",
                        requirement.namespace.as_deref().unwrap_or("")
                    ))
                    .with_location(requirement.location)
                    .with_position(requirement.position),
                );
            }
        }
        set.apply_redefinitions(diagnostics);

        info!(
            documents = set.documents.len(),
            namespaces = set.namespaces().len(),
            "schemas loaded"
        );
        set
    }

    /// All documents, ordered by location then namespace
    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Distinct target namespaces, no-namespace first
    pub fn namespaces(&self) -> BTreeSet<Option<String>> {
        self.documents
            .iter()
            .map(|d| d.target_namespace.clone())
            .collect()
    }

    /// Documents per target namespace
    pub fn by_namespace(&self) -> BTreeMap<Option<String>, Vec<&SchemaDocument>> {
        let mut map: BTreeMap<Option<String>, Vec<&SchemaDocument>> = BTreeMap::new();
        for document in &self.documents {
            map.entry(document.target_namespace.clone())
                .or_default()
                .push(document);
        }
        map
    }

    /// Total number of top-level declarations
    pub fn declaration_count(&self) -> usize {
        self.documents.iter().map(|d| d.declarations.len()).sum()
    }

    /// Replace redefined components in their original documents
    fn apply_redefinitions(&mut self, diagnostics: &mut Diagnostics) {
        let mut redefinitions = Vec::new();
        for document in &self.documents {
            for directive in &document.directives {
                let DirectiveKind::Redefine { ref components } = directive.kind else {
                    continue;
                };
                let Some(ref schema_location) = directive.schema_location else {
                    continue;
                };
                if let Ok(target) = document.location.resolve(schema_location) {
                    redefinitions.push((
                        target,
                        document.target_namespace.clone(),
                        document.location_str(),
                        components.clone(),
                    ));
                }
            }
        }

        for (target, namespace, origin, components) in redefinitions {
            let Some(index) = self
                .documents
                .iter()
                .position(|d| d.location == target && d.target_namespace == namespace)
            else {
                // The load failure has already been reported.
                continue;
            };
            for replacement in components {
                let name = replacement.name().unwrap_or_default().to_string();
                let qname = self.documents[index].qname(&name);
                let kind = replacement.kind();
                match self.documents[index].find_declaration_mut(kind, &name) {
                    Some(original) => {
                        debug!(component = %qname, "applying redefinition");
                        *original = redefine(original, replacement, &qname);
                    }
                    None => diagnostics.push(
                        Diagnostic::resolution(format!(
                            "Redefined {} '{}' does not exist in '{}'",
                            kind, name, target
                        ))
                        .with_location(origin.clone())
                        .with_position(replacement.position())
                        .with_component(qname.to_string()),
                    ),
                }
            }
        }
    }
}

/// Remove the unqualified copies of discovered files that are chameleon includes
///
/// Discovery seeds every file as a no-namespace root. A file that a
/// namespaced schema includes belongs to the includer, so its standalone
/// copy is dropped unless a kept document still needs it without a
/// namespace: an unqualified include or redefine, or an import with no
/// namespace. Returns the dropped locations.
fn drop_claimed_roots(documents: &mut Vec<SchemaDocument>, roots: &HashSet<Location>) -> HashSet<Location> {
    let claimed: HashSet<&Location> = documents
        .iter()
        .filter(|d| d.chameleon)
        .map(|d| &d.location)
        .collect();
    let mut dropped: HashSet<Location> = documents
        .iter()
        .filter(|d| d.target_namespace.is_none() && !d.chameleon)
        .filter(|d| roots.contains(&d.location) && claimed.contains(&d.location))
        .map(|d| d.location.clone())
        .collect();

    // Keeping a copy can make the copies it includes needed again
    loop {
        let needed: HashSet<Location> = documents
            .iter()
            .filter(|d| !(d.target_namespace.is_none() && dropped.contains(&d.location)))
            .flat_map(|d| {
                d.directives
                    .iter()
                    .filter(move |directive| match directive.kind {
                        DirectiveKind::Import => directive.namespace.is_none(),
                        DirectiveKind::Include | DirectiveKind::Redefine { .. } => d.target_namespace.is_none(),
                    })
                    .filter_map(|directive| directive.schema_location.as_deref())
                    .filter_map(move |schema_location| d.location.resolve(schema_location).ok())
            })
            .collect();
        let before = dropped.len();
        dropped.retain(|location| !needed.contains(location));
        if dropped.len() == before {
            break;
        }
    }

    if !dropped.is_empty() {
        documents.retain(|d| !(d.target_namespace.is_none() && !d.chameleon && dropped.contains(&d.location)));
        debug!(count = dropped.len(), "dropped unqualified copies of chameleon includes");
    }
    dropped
}

/// The XML and XSD namespaces are always available without loading anything
fn is_builtin_namespace(namespace: Option<&str>) -> bool {
    namespace == Some(XML_NAMESPACE) || is_xsd_namespace(namespace)
}

fn attribute_to_origin(diagnostic: Diagnostic, pending: &Pending) -> Diagnostic {
    match pending.origin {
        Some(ref origin) => {
            let message = format!(
                "{} (referenced by {} at {}:{})",
                diagnostic.message, origin.directive, origin.location, origin.position
            );
            let location = diagnostic
                .location
                .clone()
                .unwrap_or_else(|| pending.location.as_str());
            Diagnostic {
                message,
                location: Some(location),
                ..diagnostic
            }
        }
        None => diagnostic,
    }
}

fn check_expected_namespace(pending: &Pending, document: &SchemaDocument) -> Option<Diagnostic> {
    let origin = pending.origin.as_ref()?;
    let expected = origin.expected_namespace.as_ref()?;
    if &document.target_namespace == expected {
        return None;
    }
    Some(
        Diagnostic::load(format!(
            "Schema '{}' has target namespace '{}' but {} at {}:{} expects '{}'",
            pending.location,
            document.target_namespace.as_deref().unwrap_or(""),
            origin.directive,
            origin.location,
            origin.position,
            expected.as_deref().unwrap_or("")
        ))
        .with_location(origin.location.clone())
        .with_position(origin.position),
    )
}

/// Merge a redefinition with the component it replaces
///
/// A replacement that refers to its own name refers to the original
/// definition; that self-reference is folded into the result so the
/// redefined component keeps a single name.
fn redefine(original: &Declaration, replacement: Declaration, qname: &QName) -> Declaration {
    match (original, replacement) {
        (Declaration::ComplexType(original), Declaration::ComplexType(mut replacement)) => {
            let self_based = replacement
                .derivation
                .as_ref()
                .map(|d| &d.base == qname)
                .unwrap_or(false);
            if self_based {
                let method = replacement.derivation.as_ref().map(|d| d.method);
                replacement.derivation = original.derivation.clone();
                if method == Some(DerivationMethod::Extension) {
                    replacement.content = concat_content(original.content.clone(), replacement.content);
                    let mut attributes = original.attributes.clone();
                    attributes.extend(replacement.attributes);
                    replacement.attributes = attributes;
                } else {
                    let mut attributes: Vec<AttributeItem> = original
                        .attributes
                        .iter()
                        .filter(|a| !redeclares(&replacement.attributes, a))
                        .cloned()
                        .collect();
                    attributes.extend(replacement.attributes);
                    replacement.attributes = attributes;
                }
            }
            Declaration::ComplexType(replacement)
        }
        (Declaration::SimpleType(original), Declaration::SimpleType(mut replacement)) => {
            if let SimpleContent::Restriction {
                base: SimpleTypeUse::Named(ref base),
                ref facets,
            } = replacement.content
            {
                if base == qname {
                    replacement.content = restrict_simple(original, facets.clone());
                }
            }
            Declaration::SimpleType(replacement)
        }
        (Declaration::Group(original), Declaration::Group(mut replacement)) => {
            replacement.model = expand_self_group(replacement.model, qname, &original.model);
            Declaration::Group(replacement)
        }
        (Declaration::AttributeGroup(original), Declaration::AttributeGroup(mut replacement)) => {
            let mut items = Vec::new();
            for item in replacement.items {
                match item {
                    AttributeItem::GroupRef { ref target, .. } if target == qname => {
                        items.extend(original.items.iter().cloned())
                    }
                    other => items.push(other),
                }
            }
            replacement.items = items;
            Declaration::AttributeGroup(replacement)
        }
        (_, replacement) => replacement,
    }
}

fn concat_content(base: Option<Particle>, extra: Option<Particle>) -> Option<Particle> {
    match (base, extra) {
        (Some(base), Some(extra)) => Some(Particle {
            occurs: Occurs::ONCE,
            term: Term::Group(ModelGroup {
                compositor: Compositor::Sequence,
                particles: vec![base, extra],
            }),
        }),
        (base, extra) => base.or(extra),
    }
}

fn redeclares(items: &[AttributeItem], candidate: &AttributeItem) -> bool {
    let key = |item: &AttributeItem| match item {
        AttributeItem::Local(decl) => Some(decl.name.clone()),
        AttributeItem::Ref { target, .. } => Some(target.local_name.clone()),
        _ => None,
    };
    match key(candidate) {
        Some(name) => items.iter().any(|item| key(item).as_deref() == Some(name.as_str())),
        None => false,
    }
}

fn restrict_simple(original: &SimpleTypeDef, facets: Vec<Facet>) -> SimpleContent {
    match &original.content {
        SimpleContent::Restriction {
            base,
            facets: original_facets,
        } => {
            let replaces_enumeration = facets.iter().any(Facet::is_enumeration);
            let mut merged: Vec<Facet> = original_facets
                .iter()
                .filter(|f| !(replaces_enumeration && f.is_enumeration()))
                .cloned()
                .collect();
            merged.extend(facets);
            SimpleContent::Restriction {
                base: base.clone(),
                facets: merged,
            }
        }
        _ => SimpleContent::Restriction {
            base: SimpleTypeUse::Inline(Box::new(SimpleTypeDef {
                name: None,
                ..original.clone()
            })),
            facets,
        },
    }
}

fn expand_self_group(model: ModelGroup, qname: &QName, original: &ModelGroup) -> ModelGroup {
    let particles = model
        .particles
        .into_iter()
        .map(|particle| match particle.term {
            Term::GroupRef { ref target, .. } if target == qname => Particle {
                occurs: particle.occurs,
                term: Term::Group(original.clone()),
            },
            Term::Group(inner) => Particle {
                occurs: particle.occurs,
                term: Term::Group(expand_self_group(inner, qname, original)),
            },
            _ => particle,
        })
        .collect();
    ModelGroup {
        compositor: model.compositor,
        particles,
    }
}
