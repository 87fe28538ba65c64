#![cfg(test)]

// Property tests for the set and map, kept inside the crate so they can
// drive internal growth through the public surface: containers start at
// capacity zero, so early insertions exercise the grow-and-replay path
// over and over.

use crate::collect;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
enum SetOp {
    Add(u16),
    Remove(u16),
    Contains(u16),
    Iterate,
    Clear,
}

fn arb_set_ops() -> impl Strategy<Value = Vec<SetOp>> {
    let op = prop_oneof![
        4 => any::<u16>().prop_map(|v| SetOp::Add(v % 64)),
        2 => any::<u16>().prop_map(|v| SetOp::Remove(v % 64)),
        2 => any::<u16>().prop_map(|v| SetOp::Contains(v % 64)),
        1 => Just(SetOp::Iterate),
        1 => Just(SetOp::Clear),
    ];
    proptest::collection::vec(op, 1..120)
}

// Property: state-machine equivalence against std HashSet across random
// operation sequences. Invariants exercised:
// - add/remove report whether the set changed, matching the model.
// - contains parity for present and absent values.
// - iteration yields each live element exactly once.
// - len parity after every operation, across any number of internal
//   resizes (the set starts at capacity 0).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_set_matches_model(ops in arb_set_ops()) {
        let mut sut = collect::equality::<u16>().sets().new_set_from(Vec::new());
        let mut model: HashSet<u16> = HashSet::new();
        for op in ops {
            match op {
                SetOp::Add(v) => prop_assert_eq!(sut.add(v), model.insert(v)),
                SetOp::Remove(v) => prop_assert_eq!(sut.remove(&v), model.remove(&v)),
                SetOp::Contains(v) => prop_assert_eq!(sut.contains(&v), model.contains(&v)),
                SetOp::Iterate => {
                    let seen: HashSet<u16> = sut.iter().collect();
                    prop_assert_eq!(&seen, &model);
                }
                SetOp::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(sut.len(), model.len());
        }
    }
}

// Property: the same state machine over packed primitive storage — the
// bit-gated store must be indistinguishable from the boxed one.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_packed_set_matches_model(ops in arb_set_ops()) {
        let mut sut = collect::equality::<i32>()
            .sets_with_packed_storage()
            .new_set_from(Vec::new());
        let mut model: HashSet<i32> = HashSet::new();
        for op in ops {
            match op {
                SetOp::Add(v) => {
                    let v = v as i32;
                    prop_assert_eq!(sut.add(v), model.insert(v));
                }
                SetOp::Remove(v) => {
                    let v = v as i32;
                    prop_assert_eq!(sut.remove(&v), model.remove(&v));
                }
                SetOp::Contains(v) => {
                    let v = v as i32;
                    prop_assert_eq!(sut.contains(&v), model.contains(&v));
                }
                SetOp::Iterate => {
                    let seen: HashSet<i32> = sut.iter().collect();
                    prop_assert_eq!(&seen, &model);
                }
                SetOp::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(sut.len(), model.len());
        }
    }
}

#[derive(Clone, Debug)]
enum MapOp {
    Put(u16, u32),
    PutIfAbsent(u16, u32),
    Remove(u16),
    RemovePair(u16, u32),
    Replace(u16, u32),
    ReplaceIf(u16, u32, u32),
    Get(u16),
    ContainsValue(u32),
    Iterate,
}

fn arb_map_ops() -> impl Strategy<Value = Vec<MapOp>> {
    let key = any::<u16>().prop_map(|k| k % 48);
    let value = any::<u32>().prop_map(|v| v % 8);
    let op = prop_oneof![
        4 => (key.clone(), value.clone()).prop_map(|(k, v)| MapOp::Put(k, v)),
        2 => (key.clone(), value.clone()).prop_map(|(k, v)| MapOp::PutIfAbsent(k, v)),
        2 => key.clone().prop_map(MapOp::Remove),
        1 => (key.clone(), value.clone()).prop_map(|(k, v)| MapOp::RemovePair(k, v)),
        1 => (key.clone(), value.clone()).prop_map(|(k, v)| MapOp::Replace(k, v)),
        1 => (key.clone(), value.clone(), value.clone())
            .prop_map(|(k, old, new)| MapOp::ReplaceIf(k, old, new)),
        2 => key.clone().prop_map(MapOp::Get),
        1 => value.clone().prop_map(MapOp::ContainsValue),
        1 => Just(MapOp::Iterate),
    ];
    proptest::collection::vec(op, 1..120)
}

// Property: state-machine equivalence against std HashMap. Invariants
// exercised beyond the set suite:
// - put reports the previous value; put_if_absent reports it without
//   overwriting.
// - remove_pair and replace_if_equivalent gate on the current value.
// - replace never inserts.
// - contains_value parity (value-equivalence linear scan).
// - key/value lock-step survives growth (map starts at default capacity
//   but small key domain forces collisions and evictions).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_map_matches_model(ops in arb_map_ops()) {
        let mut sut = collect::equality::<u16>().sets().maps::<u32>().new_map();
        let mut model: HashMap<u16, u32> = HashMap::new();
        for op in ops {
            match op {
                MapOp::Put(k, v) => {
                    prop_assert_eq!(sut.put(k, v), model.insert(k, v));
                }
                MapOp::PutIfAbsent(k, v) => {
                    let expected = model.get(&k).copied();
                    prop_assert_eq!(sut.put_if_absent(k, v), expected);
                    model.entry(k).or_insert(v);
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(sut.remove(&k), model.remove(&k));
                }
                MapOp::RemovePair(k, v) => {
                    let matched = model.get(&k) == Some(&v);
                    prop_assert_eq!(sut.remove_pair(&k, &v), matched);
                    if matched {
                        model.remove(&k);
                    }
                }
                MapOp::Replace(k, v) => {
                    let previous = model.get(&k).copied();
                    prop_assert_eq!(sut.replace(&k, v), previous);
                    if previous.is_some() {
                        model.insert(k, v);
                    }
                }
                MapOp::ReplaceIf(k, old, new) => {
                    let matched = model.get(&k) == Some(&old);
                    prop_assert_eq!(sut.replace_if_equivalent(&k, &old, new), matched);
                    if matched {
                        model.insert(k, new);
                    }
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(sut.get(&k), model.get(&k).copied());
                }
                MapOp::ContainsValue(v) => {
                    prop_assert_eq!(sut.contains_value(&v), model.values().any(|x| *x == v));
                }
                MapOp::Iterate => {
                    let seen: HashMap<u16, u32> = sut.iter().collect();
                    prop_assert_eq!(&seen, &model);
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }
    }
}
