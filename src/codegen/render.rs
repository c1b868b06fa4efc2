//! Source rendering
//!
//! [`Renderer`] is the seam between the planned model and a target
//! language. [`RustRenderer`] is the one shipped: structs for composites,
//! enums for enumerations, unions and substitution groups, type aliases for
//! everything else.

use std::fmt::Write as _;

use heck::ToShoutySnakeCase;

use crate::graph::{Builtin, FieldSource, TypeRef};
use crate::names::type_ident;
use crate::namespaces::QName;
use crate::resolve::{Cardinality, ResolvedField, ResolvedGraph, ResolvedType, ResolvedVariant, Shape};

use super::planner::{EmissionPlan, GeneratedUnit};

/// Turns planned units into source text
///
/// Implementations must be pure: the same plan and graph always render to
/// the same bytes.
pub trait Renderer: Send + Sync {
    /// Short name recorded in the manifest
    fn name(&self) -> &'static str;

    /// Source of one unit
    fn render_unit(&self, unit: &GeneratedUnit, plan: &EmissionPlan, resolved: &ResolvedGraph) -> String;

    /// Source of the index module of multi-unit layouts
    fn render_index(&self, plan: &EmissionPlan, resolved: &ResolvedGraph) -> String;
}

/// Rust source renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct RustRenderer;

/// First line of every generated file
pub fn header() -> String {
    format!("// @generated by xsdgen {}. Do not edit by hand.\n", crate::VERSION)
}

/// Rust type standing in for a built-in datatype
pub fn builtin_type(builtin: Builtin) -> &'static str {
    match builtin {
        Builtin::Boolean => "bool",
        Builtin::Integer | Builtin::Long | Builtin::NonPositiveInteger | Builtin::NegativeInteger => "i64",
        Builtin::Int => "i32",
        Builtin::Short => "i16",
        Builtin::Byte => "i8",
        Builtin::UnsignedLong | Builtin::NonNegativeInteger | Builtin::PositiveInteger => "u64",
        Builtin::UnsignedInt => "u32",
        Builtin::UnsignedShort => "u16",
        Builtin::UnsignedByte => "u8",
        Builtin::Float => "f32",
        Builtin::Double => "f64",
        Builtin::HexBinary | Builtin::Base64Binary => "Vec<u8>",
        Builtin::IdRefs | Builtin::Entities | Builtin::NmTokens => "Vec<String>",
        _ => "String",
    }
}

/// Rust string literal for an arbitrary value
fn literal(value: &str) -> String {
    format!("{:?}", value)
}

fn doc(out: &mut String, indent: &str, text: &str) {
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            let _ = writeln!(out, "{}///", indent);
        } else {
            let _ = writeln!(out, "{}/// {}", indent, line);
        }
    }
}

/// Rendering state for one unit
struct UnitContext<'a> {
    module: Option<&'a str>,
    plan: &'a EmissionPlan,
    resolved: &'a ResolvedGraph,
}

impl UnitContext<'_> {
    /// Path of a type as seen from this unit
    fn type_path(&self, ty: &TypeRef) -> String {
        let qname = match ty {
            TypeRef::Builtin(builtin) => return builtin_type(*builtin).to_string(),
            TypeRef::Named(qname) => qname,
        };
        let ident = self.ident(qname);
        match (self.module, self.plan.unit_of(qname)) {
            (Some(module), Some(unit)) if unit.module != module && self.plan.has_index() => {
                format!("super::{}::{}", unit.module, ident)
            }
            (None, Some(unit)) if self.plan.has_index() => format!("{}::{}", unit.module, ident),
            _ => ident,
        }
    }

    fn ident(&self, qname: &QName) -> String {
        self.resolved
            .ident_of(qname)
            .map(str::to_string)
            .unwrap_or_else(|| type_ident(&qname.local_name))
    }

    fn field_type(&self, field: &ResolvedField) -> String {
        if field.source == FieldSource::AttributeWildcard {
            return "std::collections::BTreeMap<String, String>".to_string();
        }
        let inner = self.type_path(&field.ty);
        match (field.cardinality, field.indirect) {
            (Cardinality::Repeated, _) => format!("Vec<{}>", inner),
            (Cardinality::Optional, true) => format!("Option<Box<{}>>", inner),
            (Cardinality::Optional, false) => format!("Option<{}>", inner),
            (Cardinality::Required, true) => format!("Box<{}>", inner),
            (Cardinality::Required, false) => inner,
        }
    }

    fn variant_payload(&self, variant: &ResolvedVariant) -> String {
        let inner = self.type_path(&variant.ty);
        if variant.indirect {
            format!("Box<{}>", inner)
        } else {
            inner
        }
    }

    fn element_table(&self, out: &mut String, elements: &[QName]) {
        if elements.is_empty() {
            return;
        }
        out.push_str("/// Global elements: (namespace, local name, type)\n");
        out.push_str("pub const ELEMENTS: &[(&str, &str, &str)] = &[\n");
        for qname in elements {
            let ty = self
                .resolved
                .elements()
                .iter()
                .find(|e| &e.qname == qname)
                .map(|e| self.type_path(&e.ty))
                .unwrap_or_else(|| "String".to_string());
            let _ = writeln!(
                out,
                "    ({}, {}, {}),",
                literal(qname.namespace().unwrap_or("")),
                literal(&qname.local_name),
                literal(&ty)
            );
        }
        out.push_str("];\n");
    }

    fn render_type(&self, out: &mut String, ty: &ResolvedType) {
        if let Some(ref documentation) = ty.documentation {
            doc(out, "", documentation);
            out.push_str("///\n");
        }
        let _ = writeln!(out, "/// Schema type `{}`", ty.qname);
        match ty.shape {
            Shape::Struct { ref fields, is_abstract } => self.render_struct(out, ty, fields, is_abstract),
            Shape::Enumeration { ref members, .. } => {
                out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]\n");
                let _ = writeln!(out, "pub enum {} {{", ty.ident);
                for member in members {
                    if let Some(ref documentation) = member.documentation {
                        doc(out, "    ", documentation);
                    }
                    let _ = writeln!(out, "    {},", member.ident);
                }
                out.push_str("}\n\n");

                let _ = writeln!(out, "impl {} {{", ty.ident);
                out.push_str("    /// Every value, in schema order\n");
                let _ = writeln!(out, "    pub const VALUES: &'static [{}] = &[", ty.ident);
                for member in members {
                    let _ = writeln!(out, "        {}::{},", ty.ident, member.ident);
                }
                out.push_str("    ];\n\n");
                out.push_str("    /// Lexical value\n");
                out.push_str("    pub fn as_str(&self) -> &'static str {\n");
                out.push_str("        match self {\n");
                for member in members {
                    let _ = writeln!(out, "            {}::{} => {},", ty.ident, member.ident, literal(&member.value));
                }
                out.push_str("        }\n    }\n\n");
                out.push_str("    /// Parse a lexical value\n");
                out.push_str("    pub fn from_value(value: &str) -> Option<Self> {\n");
                out.push_str("        match value {\n");
                for member in members {
                    let _ = writeln!(
                        out,
                        "            {} => Some({}::{}),",
                        literal(&member.value),
                        ty.ident,
                        member.ident
                    );
                }
                out.push_str("            _ => None,\n        }\n    }\n}\n\n");

                let _ = writeln!(out, "impl std::fmt::Display for {} {{", ty.ident);
                out.push_str("    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {\n");
                out.push_str("        f.write_str(self.as_str())\n    }\n}\n");
            }
            Shape::Alias { ref target, ref facets } => {
                if !facets.is_empty() {
                    out.push_str("///\n/// Constraints:\n");
                    for facet in facets {
                        let _ = writeln!(out, "/// - {}", facet.describe());
                    }
                }
                let _ = writeln!(out, "pub type {} = {};", ty.ident, self.type_path(target));
            }
            Shape::List { ref item } => {
                let _ = writeln!(out, "pub type {} = Vec<{}>;", ty.ident, self.type_path(item));
            }
            Shape::Union { ref variants } => {
                out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
                let _ = writeln!(out, "pub enum {} {{", ty.ident);
                for variant in variants {
                    let _ = writeln!(out, "    {}({}),", variant.ident, self.variant_payload(variant));
                }
                out.push_str("}\n");
            }
            Shape::Substitution { ref head, ref variants } => {
                let _ = writeln!(out, "/// Elements that may appear in place of `{}`", head);
                out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
                let _ = writeln!(out, "pub enum {} {{", ty.ident);
                for variant in variants {
                    if let Some(ref element) = variant.element {
                        let _ = writeln!(out, "    /// Element `{}`", element);
                    }
                    let _ = writeln!(out, "    {}({}),", variant.ident, self.variant_payload(variant));
                }
                out.push_str("}\n\n");

                let _ = writeln!(out, "impl {} {{", ty.ident);
                out.push_str("    /// Local name of the element this value stands for\n");
                out.push_str("    pub fn element_name(&self) -> &'static str {\n");
                if variants.is_empty() {
                    out.push_str("        match *self {}\n");
                } else {
                    out.push_str("        match self {\n");
                    for variant in variants {
                        let name = variant.element.as_ref().map(|e| e.local_name.as_str()).unwrap_or("");
                        let _ = writeln!(out, "            {}::{}(_) => {},", ty.ident, variant.ident, literal(name));
                    }
                    out.push_str("        }\n");
                }
                out.push_str("    }\n}\n");
            }
        }
    }

    fn render_struct(&self, out: &mut String, ty: &ResolvedType, fields: &[ResolvedField], is_abstract: bool) {
        if is_abstract {
            out.push_str("///\n/// Abstract: documents carry one of its derived types instead.\n");
        }
        out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
        if fields.is_empty() {
            let _ = writeln!(out, "pub struct {} {{}}", ty.ident);
            return;
        }
        let _ = writeln!(out, "pub struct {} {{", ty.ident);
        for field in fields {
            if let Some(ref documentation) = field.documentation {
                doc(out, "    ", documentation);
            }
            let _ = writeln!(out, "    pub {}: {},", field.ident, self.field_type(field));
        }
        out.push_str("}\n");

        let constants: Vec<(String, &str)> = fields
            .iter()
            .flat_map(|f| {
                let name = f.ident.trim_end_matches('_').to_shouty_snake_case();
                f.default
                    .as_deref()
                    .map(|v| (format!("{}_DEFAULT", name), v))
                    .into_iter()
                    .chain(f.fixed.as_deref().map(|v| (format!("{}_FIXED", name), v)))
            })
            .collect();
        if constants.is_empty() {
            return;
        }
        let _ = writeln!(out, "\nimpl {} {{", ty.ident);
        for (name, value) in constants {
            let _ = writeln!(out, "    pub const {}: &'static str = {};", name, literal(value));
        }
        out.push_str("}\n");
    }
}

impl Renderer for RustRenderer {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn render_unit(&self, unit: &GeneratedUnit, plan: &EmissionPlan, resolved: &ResolvedGraph) -> String {
        let context = UnitContext {
            module: Some(unit.module.as_str()),
            plan,
            resolved,
        };
        let mut out = header();
        out.push('\n');
        match unit.namespace {
            Some(ref namespace) if plan.has_index() => {
                let _ = writeln!(out, "//! Types of namespace `{}`", namespace);
            }
            None if plan.has_index() => out.push_str("//! Types without a namespace\n"),
            _ => out.push_str("//! Generated schema types\n"),
        }
        out.push_str("\n#![allow(dead_code)]\n");

        for qname in &unit.members {
            if let Some(ty) = resolved.get(qname) {
                out.push('\n');
                context.render_type(&mut out, ty);
            }
        }
        if !unit.elements.is_empty() {
            out.push('\n');
            context.element_table(&mut out, &unit.elements);
        }
        out
    }

    fn render_index(&self, plan: &EmissionPlan, resolved: &ResolvedGraph) -> String {
        let context = UnitContext {
            module: None,
            plan,
            resolved,
        };
        let mut out = header();
        out.push_str("\n//! Generated schema modules\n\n");
        for unit in &plan.units {
            let _ = writeln!(out, "pub mod {};", unit.module);
        }
        if !plan.index_elements.is_empty() {
            out.push('\n');
            context.element_table(&mut out, &plan.index_elements);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::planner::plan;
    use crate::config::PackageNaming;
    use crate::error::Position;
    use crate::graph::TypeOrigin;
    use crate::locations::Location;
    use crate::resolve::{ResolvedMember, RootElement};
    use crate::schema::Occurs;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn ty(ns: &str, name: &str, shape: Shape) -> ResolvedType {
        ResolvedType {
            qname: QName::namespaced(ns, name),
            ident: name.to_string(),
            origin: TypeOrigin::Declared,
            shape,
            documentation: None,
            location: Location::from_path("/schemas/r.xsd"),
            position: Position::new(1, 1),
            order: 0,
        }
    }

    fn field(name: &str, ty: TypeRef, cardinality: Cardinality) -> ResolvedField {
        ResolvedField {
            name: name.to_string(),
            ident: name.to_string(),
            source: FieldSource::Element,
            ty,
            occurs: Occurs::ONCE,
            cardinality,
            indirect: false,
            default: None,
            fixed: None,
            documentation: None,
        }
    }

    fn graph(types: Vec<ResolvedType>, elements: Vec<RootElement>) -> ResolvedGraph {
        let mut map: IndexMap<QName, ResolvedType> = types.into_iter().map(|t| (t.qname.clone(), t)).collect();
        map.sort_keys();
        ResolvedGraph { types: map, elements }
    }

    #[test]
    fn test_enumeration_rendering() {
        let mut color = ty(
            "urn:c",
            "Color",
            Shape::Enumeration {
                base: TypeRef::Builtin(Builtin::String),
                members: ["RED", "GREEN"]
                    .iter()
                    .map(|v| ResolvedMember {
                        value: v.to_string(),
                        ident: crate::names::variant_ident(v),
                        documentation: None,
                    })
                    .collect(),
            },
        );
        color.documentation = Some("Paint colors".to_string());
        let resolved = graph(vec![color], Vec::new());
        let plan = plan(&resolved, PackageNaming::Single, "model");
        let source = RustRenderer.render_unit(&plan.units[0], &plan, &resolved);

        let expected = format!(
            "{}\n//! Generated schema types\n\n#![allow(dead_code)]\n\n{}",
            header(),
            r#"/// Paint colors
///
/// Schema type `{urn:c}Color`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Green,
}

impl Color {
    /// Every value, in schema order
    pub const VALUES: &'static [Color] = &[
        Color::Red,
        Color::Green,
    ];

    /// Lexical value
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Green => "GREEN",
        }
    }

    /// Parse a lexical value
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "RED" => Some(Color::Red),
            "GREEN" => Some(Color::Green),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
"#
        );
        assert_eq!(source, expected);
    }

    #[test]
    fn test_struct_field_types_and_cross_unit_paths() {
        let mut next = field("next", TypeRef::Named(QName::namespaced("urn:a", "Node")), Cardinality::Optional);
        next.indirect = true;
        let mut status = field("status", TypeRef::Builtin(Builtin::String), Cardinality::Optional);
        status.source = FieldSource::Attribute;
        status.default = Some("new".to_string());
        let mut extra = field("other_attributes", TypeRef::Builtin(Builtin::AnySimpleType), Cardinality::Optional);
        extra.source = FieldSource::AttributeWildcard;

        let node = ty(
            "urn:a",
            "Node",
            Shape::Struct {
                fields: vec![
                    next,
                    field("tags", TypeRef::Named(QName::namespaced("urn:b", "Tag")), Cardinality::Repeated),
                    field("count", TypeRef::Builtin(Builtin::UnsignedInt), Cardinality::Required),
                    status,
                    extra,
                ],
                is_abstract: false,
            },
        );
        let tag = ty(
            "urn:b",
            "Tag",
            Shape::Alias {
                target: TypeRef::Builtin(Builtin::Token),
                facets: vec![crate::schema::Facet::MaxLength("16".to_string())],
            },
        );
        let resolved = graph(
            vec![node, tag],
            vec![RootElement {
                qname: QName::namespaced("urn:a", "node"),
                ty: TypeRef::Named(QName::namespaced("urn:a", "Node")),
                is_abstract: false,
            }],
        );
        let plan = plan(&resolved, PackageNaming::PerNamespace, "model");
        let a = RustRenderer.render_unit(&plan.units[0], &plan, &resolved);
        assert!(a.contains("    pub next: Option<Box<Node>>,\n"));
        assert!(a.contains("    pub tags: Vec<super::b::Tag>,\n"));
        assert!(a.contains("    pub count: u32,\n"));
        assert!(a.contains("    pub status: Option<String>,\n"));
        assert!(a.contains("    pub other_attributes: std::collections::BTreeMap<String, String>,\n"));
        assert!(a.contains("    pub const STATUS_DEFAULT: &'static str = \"new\";\n"));
        assert!(a.contains("    (\"urn:a\", \"node\", \"Node\"),\n"));
        assert!(a.starts_with(&header()));

        let b = RustRenderer.render_unit(&plan.units[1], &plan, &resolved);
        assert!(b.contains("/// - maxLength = 16\npub type Tag = String;\n"));

        let index = RustRenderer.render_index(&plan, &resolved);
        assert!(index.contains("pub mod a;\npub mod b;\n"));
    }

    #[test]
    fn test_substitution_group_rendering() {
        let group = ty(
            "urn:s",
            "ShapeSubstitution",
            Shape::Substitution {
                head: QName::namespaced("urn:s", "shape"),
                variants: vec![ResolvedVariant {
                    ident: "Circle".to_string(),
                    ty: TypeRef::Builtin(Builtin::Double),
                    element: Some(QName::namespaced("urn:s", "circle")),
                    indirect: false,
                }],
            },
        );
        let resolved = graph(vec![group], Vec::new());
        let plan = plan(&resolved, PackageNaming::Single, "model");
        let source = RustRenderer.render_unit(&plan.units[0], &plan, &resolved);
        assert!(source.contains("    Circle(f64),\n"));
        assert!(source.contains("            ShapeSubstitution::Circle(_) => \"circle\",\n"));
    }
}
