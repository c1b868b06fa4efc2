//! XML name validation and identifier sanitization
//!
//! Schema names are XML NCNames; generated identifiers must be valid in the
//! target language. Every schema-name-to-identifier mapping in a run goes
//! through the functions here so the same input always maps to the same
//! output identifier.

use heck::{ToPascalCase, ToSnakeCase};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{Diagnostic, Result as XsdResult};

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}\-\.0-9\u{B7}]*$")
        .unwrap()
});

/// Runs of characters that cannot appear in an identifier
static INVALID_IDENT_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Words that cannot be used as plain identifiers in generated code
const RESERVED_WORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
    "union",
];

/// Type names generated code must never shadow
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Self", "String", "Vec", "Option", "Result", "Box", "Some", "None", "Ok", "Err",
    "Default", "Clone", "Debug", "Copy", "PartialEq", "Eq", "Hash", "Send", "Sync",
];

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Check if a string is a valid QName (qualified name)
pub fn is_valid_qname(name: &str) -> bool {
    if let Some((prefix, local)) = name.split_once(':') {
        is_valid_ncname(prefix) && is_valid_ncname(local)
    } else {
        is_valid_ncname(name)
    }
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> XsdResult<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Diagnostic::parse(format!("Invalid NCName: '{}'", name)).into())
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Whether `word` is reserved in generated code
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word) || RESERVED_TYPE_NAMES.contains(&word)
}

/// Reduce an arbitrary schema name to ASCII word separators
fn words(raw: &str) -> String {
    INVALID_IDENT_CHARS.replace_all(raw, " ").trim().to_string()
}

fn finish(ident: String, fallback: &str, digit_prefix: &str) -> String {
    let ident = if ident.is_empty() {
        fallback.to_string()
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}{}", digit_prefix, ident)
    } else {
        ident
    };
    if is_reserved(&ident) {
        format!("{}_", ident)
    } else {
        ident
    }
}

/// Sanitize a schema name into a type identifier (PascalCase)
pub fn type_ident(raw: &str) -> String {
    finish(words(raw).to_pascal_case(), "Unnamed", "T")
}

/// Sanitize a schema name into a field identifier (snake_case)
pub fn field_ident(raw: &str) -> String {
    finish(words(raw).to_snake_case(), "value", "f_")
}

/// Sanitize an enumeration literal into a variant identifier (PascalCase)
pub fn variant_ident(raw: &str) -> String {
    finish(words(raw).to_pascal_case(), "Empty", "V")
}

/// Sanitize a namespace-derived name into a module identifier (snake_case)
pub fn module_ident(raw: &str) -> String {
    finish(words(raw).to_snake_case(), "unqualified", "ns_")
}

/// First eight hex digits of the SHA-256 of a namespace URI
///
/// The empty string stands for "no namespace".
pub fn namespace_hash(namespace: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.unwrap_or("").as_bytes());
    let digest = hasher.finalize();
    digest
        .iter()
        .take(4)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Disambiguate a colliding identifier
///
/// `index` is the rank of the name among the colliding names sharing its
/// namespace, so names from different namespaces differ by hash and names
/// from the same namespace differ by index.
pub fn disambiguate(ident: &str, namespace: Option<&str>, index: usize) -> String {
    let hash = namespace_hash(namespace);
    if index == 0 {
        format!("{}Ns{}", ident, hash)
    } else {
        format!("{}Ns{}{}", ident, hash, index + 1)
    }
}

/// Make `ident` unique against `taken` by appending 2, 3, ...
///
/// Used for names scoped to one owner (fields of a type, variants of an enum).
pub fn unique_in_scope(ident: &str, taken: &mut std::collections::HashSet<String>) -> String {
    if taken.insert(ident.to_string()) {
        return ident.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}{}", ident, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(is_valid_ncname("my-element"));
        assert!(is_valid_ncname("_x.y"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("prefix:element"));
        assert!(!is_valid_ncname("123element"));
    }

    #[test]
    fn test_is_valid_qname() {
        assert!(is_valid_qname("element"));
        assert!(is_valid_qname("xs:schema"));

        assert!(!is_valid_qname(":element"));
        assert!(!is_valid_qname("element:"));
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("element"), (None, "element"));
        assert_eq!(split_qname("xs:element"), (Some("xs"), "element"));
    }

    #[test]
    fn test_type_ident() {
        assert_eq!(type_ident("purchase-order"), "PurchaseOrder");
        assert_eq!(type_ident("USAddress"), "UsAddress");
        assert_eq!(type_ident("item.type"), "ItemType");
        assert_eq!(type_ident("3dPoint"), "T3dPoint");
        assert_eq!(type_ident("string"), "String_");
        assert_eq!(type_ident(""), "Unnamed");
    }

    #[test]
    fn test_field_ident() {
        assert_eq!(field_ident("shipTo"), "ship_to");
        assert_eq!(field_ident("type"), "type_");
        assert_eq!(field_ident("1st"), "f_1st");
        assert_eq!(field_ident("---"), "value");
    }

    #[test]
    fn test_variant_ident() {
        assert_eq!(variant_ident("RED"), "Red");
        assert_eq!(variant_ident("in-progress"), "InProgress");
        assert_eq!(variant_ident("42"), "V42");
        assert_eq!(variant_ident(""), "Empty");
    }

    #[test]
    fn test_module_ident() {
        assert_eq!(module_ident("example.com/orders/v1"), "example_com_orders_v1");
        assert_eq!(module_ident(""), "unqualified");
        assert_eq!(module_ident("mod"), "mod_");
    }

    #[test]
    fn test_namespace_hash_is_stable() {
        assert_eq!(namespace_hash(Some("urn:a")), namespace_hash(Some("urn:a")));
        assert_ne!(namespace_hash(Some("urn:a")), namespace_hash(Some("urn:b")));
        assert_eq!(namespace_hash(None).len(), 8);
    }

    #[test]
    fn test_disambiguate() {
        let a = disambiguate("Order", Some("urn:a"), 0);
        let b = disambiguate("Order", Some("urn:b"), 0);
        let a2 = disambiguate("Order", Some("urn:a"), 1);
        assert_ne!(a, b);
        assert_ne!(a, a2);
        assert!(a.starts_with("OrderNs"));
        assert_eq!(a, disambiguate("Order", Some("urn:a"), 0));
    }

    #[test]
    fn test_unique_in_scope() {
        let mut taken = HashSet::new();
        assert_eq!(unique_in_scope("name", &mut taken), "name");
        assert_eq!(unique_in_scope("name", &mut taken), "name2");
        assert_eq!(unique_in_scope("name", &mut taken), "name3");
    }
}
