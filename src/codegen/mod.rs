//! Code emission
//!
//! Planning decides which unit every type goes into, rendering turns each
//! unit into source text and writing persists the result.

mod planner;
mod render;
mod writer;

pub use planner::{namespace_module, plan, EmissionPlan, GeneratedUnit, INDEX_MODULE, UNQUALIFIED_MODULE};
pub use render::{builtin_type, header, Renderer, RustRenderer};
pub use writer::{
    is_incomplete, write_atomic, write_output, Manifest, ManifestUnit, RenderedFile, INCOMPLETE_MARKER,
    MANIFEST_FILE,
};

use std::path::PathBuf;

use rayon::prelude::*;

use crate::resolve::ResolvedGraph;

/// Render every unit of a plan, plus the index module when the layout has one
///
/// Units render in parallel; the result is sorted by path.
pub fn emit(plan: &EmissionPlan, resolved: &ResolvedGraph, renderer: &dyn Renderer) -> Vec<RenderedFile> {
    let mut files: Vec<RenderedFile> = plan
        .units
        .par_iter()
        .map(|unit| RenderedFile {
            path: unit.path.clone(),
            contents: renderer.render_unit(unit, plan, resolved),
        })
        .collect();
    if plan.has_index() {
        files.push(RenderedFile {
            path: PathBuf::from(format!("{}.rs", INDEX_MODULE)),
            contents: renderer.render_index(plan, resolved),
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Manifest describing a plan
pub fn manifest(plan: &EmissionPlan, resolved: &ResolvedGraph) -> Manifest {
    let units = plan
        .units
        .iter()
        .map(|unit| ManifestUnit {
            module: unit.module.clone(),
            path: unit.path.to_string_lossy().replace('\\', "/"),
            namespace: unit.namespace.clone(),
            types: unit
                .members
                .iter()
                .filter_map(|q| resolved.ident_of(q).map(str::to_string))
                .collect(),
            elements: unit.elements.iter().map(|q| q.to_string()).collect(),
        })
        .collect();
    Manifest {
        generator: env!("CARGO_PKG_NAME").to_string(),
        version: crate::VERSION.to_string(),
        layout: plan.layout.as_str().to_string(),
        namespaces: plan.modules_by_namespace(),
        units,
    }
}
