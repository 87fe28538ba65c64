//! EquivalenceMap: parallel key and value stores addressed by the key
//! equivalence.

use crate::boxed_store::BoxedStorage;
use crate::cuckoo::{self, Cuckoo, PairedAccess, Probes, Put};
use crate::equivalence::{Equality, Equivalence};
use crate::mutability::Mutability;
use crate::store::{Storage, Store};
use std::fmt;
use std::marker::PhantomData;

/// A map whose key sameness is decided by a caller-supplied equivalence.
///
/// Keys live in one store, values in a second store of identical capacity;
/// slot `i` of the value store holds the value for the key occupying slot
/// `i` of the key store, and the two stores grow together in lock-step.
/// The value equivalence is used only for value-comparison operations
/// ([`contains_value`](Self::contains_value),
/// [`remove_pair`](Self::remove_pair),
/// [`replace_if_equivalent`](Self::replace_if_equivalent)), never for
/// addressing.
pub struct EquivalenceMap<K, V, Q = Equality, W = Equality, GK = BoxedStorage<K>, GV = BoxedStorage<V>>
where
    GK: Storage<K>,
    GV: Storage<V>,
{
    cuckoo: Cuckoo<Q>,
    value_equ: W,
    key_storage: GK,
    value_storage: GV,
    probes: Probes,
    keys: GK::Store,
    values: GV::Store,
}

impl<K, V, Q, W, GK, GV> EquivalenceMap<K, V, Q, W, GK, GV>
where
    Q: Equivalence<K>,
    W: Equivalence<V>,
    GK: Storage<K>,
    GV: Storage<V>,
{
    pub(crate) fn new(
        cuckoo: Cuckoo<Q>,
        value_equ: W,
        key_storage: GK,
        value_storage: GV,
        initial_capacity: usize,
    ) -> Self {
        let keys = key_storage.new_store(initial_capacity);
        let values = value_storage.new_store(initial_capacity);
        Self {
            cuckoo,
            value_equ,
            key_storage,
            value_storage,
            probes: Probes::new(initial_capacity),
            keys,
            values,
        }
    }

    pub fn key_equivalence(&self) -> &Q {
        &self.cuckoo.equ
    }

    pub fn value_equivalence(&self) -> &W {
        &self.value_equ
    }

    pub fn len(&self) -> usize {
        self.keys.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current slot capacity of both backing stores.
    pub fn capacity(&self) -> usize {
        self.keys.capacity()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index_of(key).is_some()
    }

    /// Whether any mapping's value is equivalent to `value` under the value
    /// equivalence. Linear in capacity.
    pub fn contains_value(&self, value: &V) -> bool {
        self.index_of_value(value).is_some()
    }

    /// The value mapped to the key equivalent to `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.index_of(key).and_then(|i| self.values.get(i))
    }

    /// Map `key` to `value`, replacing and returning the previous value if
    /// an equivalent key was already present.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.put_impl(key, value, true)
    }

    /// Map `key` to `value` only if no equivalent key is present. The
    /// previous value is reported either way and never overwritten.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn put_if_absent(&mut self, key: K, value: V) -> Option<V> {
        self.put_impl(key, value, false)
    }

    /// Remove the mapping for the key equivalent to `key`, returning its
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.check_mutable();
        let i = self.index_of(key)?;
        self.keys.set(i, None);
        self.values.set(i, None)
    }

    /// Remove the mapping only if its value is equivalent to `value` under
    /// the value equivalence. Returns whether the map changed.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn remove_pair(&mut self, key: &K, value: &V) -> bool {
        self.check_mutable();
        let Some(i) = self.index_of(key) else {
            return false;
        };
        if !self.value_matches(i, value) {
            return false;
        }
        self.keys.set(i, None);
        self.values.set(i, None);
        true
    }

    /// Replace the value of an existing mapping, returning the previous
    /// value; absent keys are left absent.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn replace(&mut self, key: &K, value: V) -> Option<V> {
        self.check_mutable();
        let i = self.index_of(key)?;
        self.values.set(i, Some(value))
    }

    /// Replace the value of an existing mapping only when the current value
    /// is equivalent to `expected` under the value equivalence. Returns
    /// whether the map changed.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn replace_if_equivalent(&mut self, key: &K, expected: &V, value: V) -> bool {
        self.check_mutable();
        let Some(i) = self.index_of(key) else {
            return false;
        };
        if !self.value_matches(i, expected) {
            return false;
        }
        self.values.set(i, Some(value));
        true
    }

    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn clear(&mut self) {
        self.check_mutable();
        self.keys.clear();
        self.values.clear();
    }

    /// Iterate `(key, value)` pairs in ascending slot order. The order is
    /// capacity-dependent and not stable across resizes.
    pub fn iter(&self) -> Iter<'_, K, V, GK::Store, GV::Store> {
        Iter {
            keys: &self.keys,
            values: &self.values,
            index: 0,
            _marker: PhantomData,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, GK::Store> {
        Keys {
            keys: &self.keys,
            index: 0,
            _marker: PhantomData,
        }
    }

    pub fn values(&self) -> Values<'_, V, GV::Store> {
        Values {
            values: &self.values,
            index: 0,
            _marker: PhantomData,
        }
    }

    /// Keep only the mappings `f` approves.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn retain(&mut self, mut f: impl FnMut(&K, &V) -> bool) {
        self.check_mutable();
        for i in 0..self.keys.capacity() {
            let discard = self.keys.map_slot(i, |occupant| match occupant {
                Some(k) => self
                    .values
                    .map_slot(i, |v| !f(k, v.expect("value slot mirrors key slot"))),
                None => false,
            });
            if discard {
                self.keys.set(i, None);
                self.values.set(i, None);
            }
        }
    }

    fn index_of(&self, key: &K) -> Option<usize> {
        cuckoo::index_of(&self.cuckoo.equ, self.probes, &self.keys, key)
    }

    fn index_of_value(&self, value: &V) -> Option<usize> {
        (0..self.values.capacity()).find(|&i| self.value_matches(i, value))
    }

    fn value_matches(&self, index: usize, value: &V) -> bool {
        self.values.map_slot(index, |occupant| {
            matches!(occupant, Some(cur) if self.value_equ.is_equivalent(cur, value))
        })
    }

    fn check_mutable(&self) {
        assert!(self.keys.is_mutable(), "map is immutable");
    }

    fn put_impl(&mut self, key: K, value: V, overwrite: bool) -> Option<V> {
        self.check_mutable();
        let put = PairedAccess::new(
            &self.cuckoo.equ,
            self.cuckoo.rng.as_mut(),
            self.probes,
            &self.keys,
            &self.values,
        )
        .put(key, value, overwrite);
        match put {
            Put::Done(previous) => previous,
            Put::Grow { key, value } => {
                self.grow_and_reinsert(key, value);
                None
            }
        }
    }

    /// Replace both stores with doubled ones, replay every live pair and
    /// finally place the homeless pair. Doubles again if any placement
    /// exhausts retries. The stores move in lock-step.
    fn grow_and_reinsert(&mut self, key: K, value: V) {
        let (mut key, mut value) = (key, value);
        let old_capacity = self.keys.capacity();
        let mut new_capacity = if old_capacity == 0 { 2 } else { old_capacity * 2 };
        'grow: loop {
            let keys = self.key_storage.new_store(new_capacity);
            let values = self.value_storage.new_store(new_capacity);
            let probes = Probes::new(new_capacity);
            {
                let mut access = PairedAccess::new(
                    &self.cuckoo.equ,
                    self.cuckoo.rng.as_mut(),
                    probes,
                    &keys,
                    &values,
                );
                for i in 0..old_capacity {
                    if let Some(k) = self.keys.get(i) {
                        let v = self.values.get(i).expect("value slot mirrors key slot");
                        match access.put(k, v, false) {
                            Put::Done(_) => {}
                            Put::Grow { .. } => {
                                new_capacity *= 2;
                                continue 'grow;
                            }
                        }
                    }
                }
                match access.put(key, value, false) {
                    Put::Done(_) => {}
                    Put::Grow {
                        key: k,
                        value: v,
                    } => {
                        key = k;
                        value = v;
                        new_capacity *= 2;
                        continue 'grow;
                    }
                }
            }
            self.keys = keys;
            self.values = values;
            self.probes = probes;
            return;
        }
    }

    fn derived(&self, keys: GK::Store, values: GV::Store) -> Self
    where
        Q: Clone,
        W: Clone,
    {
        Self {
            cuckoo: Cuckoo::new(self.cuckoo.equ.clone()),
            value_equ: self.value_equ.clone(),
            key_storage: self.key_storage.clone(),
            value_storage: self.value_storage.clone(),
            probes: Probes::new(keys.capacity()),
            keys,
            values,
        }
    }
}

impl<K, V, Q, W, GK, GV> Mutability for EquivalenceMap<K, V, Q, W, GK, GV>
where
    Q: Equivalence<K> + Clone,
    W: Equivalence<V> + Clone,
    GK: Storage<K>,
    GV: Storage<V>,
{
    fn is_mutable(&self) -> bool {
        self.keys.is_mutable()
    }

    fn mutable_copy(&self) -> Self {
        self.derived(self.keys.mutable_copy(), self.values.mutable_copy())
    }

    fn immutable_copy(&self) -> Self {
        self.derived(self.keys.immutable_copy(), self.values.immutable_copy())
    }

    fn mutable_view(&self) -> Self {
        assert!(
            self.keys.is_mutable(),
            "cannot take a mutable view of an immutable map"
        );
        self.derived(self.keys.mutable_view(), self.values.mutable_view())
    }

    fn immutable_view(&self) -> Self {
        self.derived(self.keys.immutable_view(), self.values.immutable_view())
    }
}

impl<K, V, Q, W, GK, GV> fmt::Debug for EquivalenceMap<K, V, Q, W, GK, GV>
where
    K: fmt::Debug,
    V: fmt::Debug,
    Q: Equivalence<K>,
    W: Equivalence<V>,
    GK: Storage<K>,
    GV: Storage<V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(key, value)` pairs in ascending slot order.
pub struct Iter<'a, K, V, SK, SV> {
    keys: &'a SK,
    values: &'a SV,
    index: usize,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<'a, K, V, SK, SV> Iterator for Iter<'a, K, V, SK, SV>
where
    SK: Store<K>,
    SV: Store<V>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        while self.index < self.keys.capacity() {
            let i = self.index;
            self.index += 1;
            if let Some(k) = self.keys.get(i) {
                let v = self.values.get(i).expect("value slot mirrors key slot");
                return Some((k, v));
            }
        }
        None
    }
}

/// Iterator over keys in ascending slot order.
pub struct Keys<'a, K, SK> {
    keys: &'a SK,
    index: usize,
    _marker: PhantomData<fn() -> K>,
}

impl<'a, K, SK: Store<K>> Iterator for Keys<'a, K, SK> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        while self.index < self.keys.capacity() {
            let i = self.index;
            self.index += 1;
            if let Some(k) = self.keys.get(i) {
                return Some(k);
            }
        }
        None
    }
}

/// Iterator over values in ascending slot order.
pub struct Values<'a, V, SV> {
    values: &'a SV,
    index: usize,
    _marker: PhantomData<fn() -> V>,
}

impl<'a, V, SV: Store<V>> Iterator for Values<'a, V, SV> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        while self.index < self.values.capacity() {
            let i = self.index;
            self.index += 1;
            if let Some(v) = self.values.get(i) {
                return Some(v);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect;

    fn int_map() -> EquivalenceMap<u32, String> {
        collect::equality().sets().maps().new_map()
    }

    /// Invariant: put/get/remove round trip; put reports the previous
    /// value.
    #[test]
    fn round_trip() {
        let mut m = int_map();
        assert_eq!(m.put(1, "a".to_string()), None);
        assert_eq!(m.get(&1), Some("a".to_string()));
        assert_eq!(m.put(1, "b".to_string()), Some("a".to_string()));
        assert_eq!(m.len(), 1);
        assert_eq!(m.remove(&1), Some("b".to_string()));
        assert_eq!(m.get(&1), None);
        assert!(m.is_empty());
    }

    /// Invariant: keys and values grow in lock-step; every pair survives
    /// growth intact.
    #[test]
    fn lock_step_growth() {
        let mut m = int_map();
        for k in 0..200 {
            assert_eq!(m.put(k, format!("v{k}")), None);
        }
        assert_eq!(m.len(), 200);
        assert!(m.capacity() >= 200);
        for k in 0..200 {
            assert_eq!(m.get(&k), Some(format!("v{k}")), "pair {k} survived growth");
        }
    }

    /// Invariant: `replace` touches only existing mappings.
    #[test]
    fn replace_requires_presence() {
        let mut m = int_map();
        assert_eq!(m.replace(&1, "x".to_string()), None);
        assert!(!m.contains_key(&1), "replace must not insert");
        m.put(1, "a".to_string());
        assert_eq!(m.replace(&1, "x".to_string()), Some("a".to_string()));
        assert_eq!(m.get(&1), Some("x".to_string()));
    }

    /// Invariant: `remove_pair` removes only when the stored value is
    /// equivalent to the expected one.
    #[test]
    fn remove_pair_checks_value() {
        let mut m = int_map();
        m.put(1, "a".to_string());
        assert!(!m.remove_pair(&1, &"b".to_string()));
        assert!(m.contains_key(&1));
        assert!(m.remove_pair(&1, &"a".to_string()));
        assert!(!m.contains_key(&1));
    }

    /// Invariant: `retain` keeps exactly the approved mappings.
    #[test]
    fn retain_filters() {
        let mut m = int_map();
        for k in 0..10 {
            m.put(k, format!("v{k}"));
        }
        m.retain(|k, _| k % 2 == 0);
        assert_eq!(m.len(), 5);
        assert!(m.contains_key(&4));
        assert!(!m.contains_key(&5));
    }

    /// Invariant: `keys`, `values` and `iter` agree with each other.
    #[test]
    fn iterators_agree() {
        let mut m = int_map();
        for k in 0..20 {
            m.put(k, format!("v{k}"));
        }
        let mut pairs: Vec<_> = m.iter().collect();
        pairs.sort_unstable();
        let mut keys: Vec<_> = m.keys().collect();
        keys.sort_unstable();
        let mut values: Vec<_> = m.values().collect();
        values.sort_unstable();
        assert_eq!(pairs.len(), 20);
        assert_eq!(keys, pairs.iter().map(|(k, _)| *k).collect::<Vec<_>>());
        let mut pair_values: Vec<_> = pairs.iter().map(|(_, v)| v.clone()).collect();
        pair_values.sort_unstable();
        assert_eq!(values, pair_values);
    }

    /// Invariant: `contains_value` compares under the value equivalence.
    #[test]
    fn contains_value_scans() {
        let mut m = int_map();
        m.put(1, "a".to_string());
        m.put(2, "b".to_string());
        assert!(m.contains_value(&"a".to_string()));
        assert!(!m.contains_value(&"z".to_string()));
    }
}
