// EquivalenceMap behavior suite.
//
// The core invariants:
// - put reports the previous value; put_if_absent reports without
//   overwriting.
// - replace touches existing mappings only; its 3-way form gates on the
//   value equivalence, not on structural equality.
// - Key addressing uses the key equivalence; value comparisons use the
//   value equivalence and nothing else.
use equiv_collections::{collect, BitEquality, Equivalence};
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

// Strings are "the same key" regardless of ASCII case.
#[derive(Clone)]
struct CaseFold(RandomState);

impl CaseFold {
    fn new() -> Self {
        CaseFold(RandomState::new())
    }
}

impl Equivalence<String> for CaseFold {
    fn is_equivalent(&self, a: &String, b: &String) -> bool {
        a.eq_ignore_ascii_case(b)
    }
    fn hash_one(&self, e: &String) -> u64 {
        self.0.hash_one(e.to_ascii_lowercase())
    }
}

fn string_map() -> equiv_collections::EquivalenceMap<String, String> {
    collect::equality::<String>().sets().maps().new_map()
}

// Test: conditional replace.
// Verifies: replace_if_equivalent fails against a non-equivalent expected
// value and leaves the mapping untouched; succeeds against the stored one.
#[test]
fn replace_gates_on_expected_value() {
    let mut m = string_map();
    m.put("a".to_string(), "1".to_string());

    assert!(!m.replace_if_equivalent(&"a".to_string(), &"2".to_string(), "X".to_string()));
    assert_eq!(m.get(&"a".to_string()), Some("1".to_string()));

    assert!(m.replace_if_equivalent(&"a".to_string(), &"1".to_string(), "X".to_string()));
    assert_eq!(m.get(&"a".to_string()), Some("X".to_string()));
}

// Test: put_if_absent.
// Verifies: first call stores and reports absence; second reports the
// stored value and does not overwrite.
#[test]
fn put_if_absent_never_overwrites() {
    let mut m = string_map();
    assert_eq!(m.put_if_absent("k".to_string(), "v1".to_string()), None);
    assert_eq!(
        m.put_if_absent("k".to_string(), "v2".to_string()),
        Some("v1".to_string())
    );
    assert_eq!(m.get(&"k".to_string()), Some("v1".to_string()));
    assert_eq!(m.len(), 1);
}

// Test: key equivalence addresses, later spellings do not re-key.
// Verifies: a case-folding key equivalence maps all spellings to one
// mapping whose stored key is the first spelling seen.
#[test]
fn key_equivalence_addresses_lookups() {
    let mut m = collect::equivalence(CaseFold::new())
        .sets()
        .maps::<u32>()
        .new_map();
    assert_eq!(m.put("Alpha".to_string(), 1), None);
    assert_eq!(m.put("ALPHA".to_string(), 2), Some(1));
    assert_eq!(m.get(&"alpha".to_string()), Some(2));
    assert_eq!(m.len(), 1);
    let keys: Vec<String> = m.keys().collect();
    assert_eq!(keys, vec!["Alpha".to_string()], "first spelling is kept");
}

// Test: the value equivalence governs value comparisons only.
// Verifies: remove_pair and replace_if_equivalent match case-insensitively
// when the value equivalence folds case, while get still returns the
// stored spelling.
#[test]
fn value_equivalence_governs_value_comparisons() {
    let mut m = collect::equality::<u32>()
        .sets()
        .maps::<String>()
        .new_map_with_value_equivalence(CaseFold::new());
    m.put(1, "Value".to_string());

    assert!(m.contains_value(&"VALUE".to_string()));
    assert!(m.replace_if_equivalent(&1, &"vAlUe".to_string(), "Next".to_string()));
    assert_eq!(m.get(&1), Some("Next".to_string()));
    assert!(!m.remove_pair(&1, &"other".to_string()));
    assert!(m.remove_pair(&1, &"NEXT".to_string()));
    assert!(m.is_empty());
}

// Test: packed value storage with a bit-pattern value equivalence.
// Verifies: float values live unboxed and compare by bits (NaN matches
// itself, -0.0 does not match 0.0).
#[test]
fn packed_float_values() {
    let mut m = collect::equality::<u32>()
        .sets()
        .maps_with_packed_storage::<f64>()
        .new_map_with_value_equivalence(BitEquality::new());
    m.put(1, f64::NAN);
    m.put(2, 0.0);

    assert!(m.contains_value(&f64::NAN));
    assert!(!m.contains_value(&-0.0));
    assert!(m.remove_pair(&1, &f64::NAN));
    assert_eq!(m.len(), 1);
}

// Test: remove returns the mapped value and clears both slots.
// Verifies: a removed key is absent from keys() and its value from
// values().
#[test]
fn remove_clears_both_stores() {
    let mut m = string_map();
    m.put("a".to_string(), "1".to_string());
    m.put("b".to_string(), "2".to_string());
    assert_eq!(m.remove(&"a".to_string()), Some("1".to_string()));
    assert_eq!(m.remove(&"a".to_string()), None);
    assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b".to_string()]);
    assert_eq!(m.values().collect::<Vec<_>>(), vec!["2".to_string()]);
}

// Test: growth keeps pairs aligned under a deterministic eviction source.
// Verifies: after hundreds of insertions through many doublings, every
// key still maps to its own value, never a displaced neighbor's.
#[test]
fn growth_keeps_pairs_aligned() {
    let mut m = collect::equality::<u32>()
        .sets()
        .maps::<String>()
        .new_map_with_rng(equiv_collections::seeded_rng(9));
    for k in 0..500 {
        assert_eq!(m.put(k, format!("v{k}")), None);
    }
    assert_eq!(m.len(), 500);
    for k in 0..500 {
        assert_eq!(m.get(&k), Some(format!("v{k}")));
    }
}
