//! Property tests for identifier sanitization and disambiguation

use std::collections::HashSet;

use once_cell::sync::Lazy;
use proptest::prelude::*;
use regex::Regex;

use xsdgen::names::{disambiguate, field_ident, is_reserved, module_ident, type_ident, unique_in_scope, variant_ident};

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// XML NCNames, ASCII subset
fn ncname() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_.-]{0,24}"
}

fn namespace() -> impl Strategy<Value = Option<String>> {
    prop::option::of("(urn:[a-z]{1,8}(:[a-z0-9]{1,8}){0,3}|https?://[a-z]{1,10}\\.com(/[a-z0-9]{1,6}){0,3})")
}

proptest! {
    #[test]
    fn test_sanitized_names_are_valid_identifiers(name in ncname()) {
        for ident in [type_ident(&name), field_ident(&name), variant_ident(&name), module_ident(&name)] {
            prop_assert!(IDENT.is_match(&ident), "{:?} -> {:?}", name, ident);
            prop_assert!(!is_reserved(&ident), "{:?} -> {:?}", name, ident);
        }
    }

    #[test]
    fn test_sanitization_is_a_function(name in ncname()) {
        prop_assert_eq!(type_ident(&name), type_ident(&name.clone()));
        prop_assert_eq!(field_ident(&name), field_ident(&name.clone()));
    }

    #[test]
    fn test_disambiguation_separates_namespaces(
        name in ncname(),
        a in namespace(),
        b in namespace(),
    ) {
        prop_assume!(a != b);
        let ident = type_ident(&name);
        prop_assert_ne!(
            disambiguate(&ident, a.as_deref(), 0),
            disambiguate(&ident, b.as_deref(), 0)
        );
    }

    #[test]
    fn test_disambiguation_separates_ranks(name in ncname(), ns in namespace(), count in 2usize..8) {
        let ident = type_ident(&name);
        let all: HashSet<String> = (0..count).map(|i| disambiguate(&ident, ns.as_deref(), i)).collect();
        prop_assert_eq!(all.len(), count);
        for candidate in &all {
            prop_assert!(IDENT.is_match(candidate));
        }
    }

    #[test]
    fn test_scoped_names_never_repeat(names in prop::collection::vec(ncname(), 1..20)) {
        let mut taken = HashSet::new();
        let idents: Vec<String> = names.iter().map(|n| unique_in_scope(&field_ident(n), &mut taken)).collect();
        let distinct: HashSet<&String> = idents.iter().collect();
        prop_assert_eq!(distinct.len(), idents.len());
    }
}
