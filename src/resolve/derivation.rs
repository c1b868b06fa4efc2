//! Derivation flattening
//!
//! Extension prepends the base type's effective fields; restriction keeps
//! the declared content and inherits attributes it does not redeclare or
//! prohibit. Results are memoized per type, so long chains are walked once.

use tracing::debug;

use crate::error::Diagnostic;
use crate::graph::{Field, FieldSource, FieldType, TypeDeclaration, TypeGraph, TypeId, TypeKind, TypeRef};
use crate::schema::{DerivationMethod, Occurs};

/// Name of the character content field of simple-content types
pub(crate) const VALUE_FIELD: &str = "value";

#[derive(Clone)]
enum State {
    Pending,
    InProgress,
    Done(Vec<Field>),
}

pub(super) struct Flattener<'g> {
    graph: &'g TypeGraph,
    states: Vec<State>,
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl<'g> Flattener<'g> {
    pub(super) fn new(graph: &'g TypeGraph) -> Self {
        Self {
            graph,
            states: vec![State::Pending; graph.len()],
            diagnostics: Vec::new(),
        }
    }

    /// Effective fields of a type, base fields first; prohibited attributes are gone
    pub(super) fn fields(&mut self, id: TypeId) -> Vec<Field> {
        let graph = self.graph;
        match self.states[id.0] {
            State::Done(ref fields) => return fields.clone(),
            State::InProgress => {
                let decl = graph.get(id);
                self.diagnostics.push(
                    Diagnostic::resolution(format!("Type '{}' derives from itself", decl.qname))
                        .with_location(decl.location.as_str())
                        .with_position(decl.position)
                        .with_component(decl.qname.to_string()),
                );
                return own_fields(decl);
            }
            State::Pending => {}
        }

        self.states[id.0] = State::InProgress;
        let decl = graph.get(id);
        let fields = match decl.kind {
            TypeKind::SimpleContent { ref value, .. } => match self.complex_base(decl) {
                Some((method, base)) => {
                    let base_fields = self.fields(base);
                    self.derive(method, base_fields, decl)
                }
                None => {
                    let mut fields = vec![Field::new(
                        VALUE_FIELD,
                        FieldSource::Text,
                        FieldType::Type(value.clone()),
                        Occurs::ONCE,
                    )];
                    fields.extend(own_fields(decl));
                    fields
                }
            },
            TypeKind::Composite { .. } => match self.complex_base(decl) {
                Some((method, base)) => {
                    let base_fields = self.fields(base);
                    self.derive(method, base_fields, decl)
                }
                None => own_fields(decl),
            },
            _ => Vec::new(),
        };

        self.states[id.0] = State::Done(fields.clone());
        fields
    }

    /// The complex base type a declaration derives from, if any
    fn complex_base(&self, decl: &TypeDeclaration) -> Option<(DerivationMethod, TypeId)> {
        let derivation = decl.derivation.as_ref()?;
        let TypeRef::Named(ref base) = derivation.base else {
            return None;
        };
        let id = self.graph.lookup(base)?;
        match self.graph.get(id).kind {
            TypeKind::Composite { .. } | TypeKind::SimpleContent { .. } => Some((derivation.method, id)),
            _ => None,
        }
    }

    fn derive(&self, method: DerivationMethod, base: Vec<Field>, decl: &TypeDeclaration) -> Vec<Field> {
        debug!(
            type = %decl.qname,
            method = ?method,
            inherited = base.len(),
            "flattening derivation"
        );
        match method {
            DerivationMethod::Extension => {
                let mut fields = base;
                fields.extend(own_fields(decl));
                fields
            }
            DerivationMethod::Restriction => restrict(base, &decl.fields),
        }
    }
}

fn own_fields(decl: &TypeDeclaration) -> Vec<Field> {
    decl.fields.iter().filter(|f| !f.prohibited).cloned().collect()
}

fn is_attribute(field: &Field) -> bool {
    matches!(field.source, FieldSource::Attribute | FieldSource::AttributeWildcard)
}

/// Declared content replaces the base content; attributes are inherited
fn restrict(base: Vec<Field>, own: &[Field]) -> Vec<Field> {
    let mut fields: Vec<Field> = base
        .iter()
        .filter(|f| f.source == FieldSource::Text)
        .cloned()
        .collect();
    fields.extend(own.iter().filter(|f| !is_attribute(f) && f.source != FieldSource::Text).cloned());

    for inherited in base.iter().filter(|f| is_attribute(f)) {
        match own.iter().find(|f| is_attribute(f) && f.name == inherited.name) {
            Some(redeclared) if redeclared.prohibited => {}
            Some(redeclared) => fields.push(redeclared.clone()),
            None => fields.push(inherited.clone()),
        }
    }
    for declared in own.iter().filter(|f| is_attribute(f) && !f.prohibited) {
        if !base.iter().any(|f| is_attribute(f) && f.name == declared.name) {
            fields.push(declared.clone());
        }
    }
    fields
}
