//! Fluent construction of equivalence sets and maps: pick an equivalence,
//! pick a storage flavor per element type, then mint containers.

use crate::boxed_store::BoxedStorage;
use crate::cuckoo::Cuckoo;
use crate::equivalence::{Equality, Equivalence, Identity};
use crate::map::EquivalenceMap;
use crate::packed_store::{PackedStorage, Primitive};
use crate::set::EquivalenceSet;
use crate::store::Storage;
use rand::RngCore;
use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::Rc;

const DEFAULT_CAPACITY: usize = 16;

/// Containers built from an explicit equivalence.
pub fn equivalence<E, Q: Equivalence<E>>(equ: Q) -> Collections<E, Q> {
    Collections {
        equ,
        _marker: PhantomData,
    }
}

/// Containers over natural equality.
pub fn equality<E: Eq + Hash>() -> Collections<E, Equality> {
    equivalence(Equality::new())
}

/// Containers over reference identity of `Rc` handles.
pub fn identity<T>() -> Collections<Rc<T>, Identity> {
    equivalence(Identity)
}

/// Entry point binding an equivalence; continues by picking element
/// storage.
pub struct Collections<E, Q> {
    equ: Q,
    _marker: PhantomData<fn() -> E>,
}

impl<E, Q: Equivalence<E>> Collections<E, Q> {
    /// Boxed element storage, for any clonable element type.
    pub fn sets(self) -> Sets<E, Q, BoxedStorage<E>>
    where
        E: Clone,
    {
        self.sets_with_storage(BoxedStorage::new())
    }

    /// Packed element storage: a raw primitive array plus a presence bit
    /// per slot.
    pub fn sets_with_packed_storage(self) -> Sets<E, Q, PackedStorage<E>>
    where
        E: Primitive,
    {
        self.sets_with_storage(PackedStorage::new())
    }

    pub fn sets_with_storage<G: Storage<E>>(self, storage: G) -> Sets<E, Q, G> {
        Sets {
            equ: self.equ,
            storage,
            _marker: PhantomData,
        }
    }
}

/// Set factory bound to an equivalence and an element storage flavor.
pub struct Sets<E, Q, G> {
    equ: Q,
    storage: G,
    _marker: PhantomData<fn() -> E>,
}

impl<E, Q, G> Sets<E, Q, G>
where
    Q: Equivalence<E> + Clone,
    G: Storage<E>,
{
    /// An empty set with the default initial capacity.
    pub fn new_set(&self) -> EquivalenceSet<E, Q, G> {
        EquivalenceSet::new(
            Cuckoo::new(self.equ.clone()),
            self.storage.clone(),
            DEFAULT_CAPACITY,
        )
    }

    /// An empty set with an injected eviction-choice source.
    pub fn new_set_with_rng(&self, rng: Box<dyn RngCore>) -> EquivalenceSet<E, Q, G> {
        EquivalenceSet::new(
            Cuckoo::with_rng(self.equ.clone(), rng),
            self.storage.clone(),
            DEFAULT_CAPACITY,
        )
    }

    /// A set seeded with `elements`, capacity derived from their count.
    pub fn new_set_from<I>(&self, elements: I) -> EquivalenceSet<E, Q, G>
    where
        I: IntoIterator<Item = E>,
    {
        let elements: Vec<E> = elements.into_iter().collect();
        let mut set = EquivalenceSet::new(
            Cuckoo::new(self.equ.clone()),
            self.storage.clone(),
            initial_capacity(elements.len()),
        );
        for e in elements {
            set.add(e);
        }
        set
    }

    /// Boxed value storage, for any clonable value type.
    pub fn maps<V: Clone>(&self) -> Maps<E, V, Q, G, BoxedStorage<V>> {
        self.maps_with_storage(BoxedStorage::new())
    }

    /// Packed value storage over one primitive kind.
    pub fn maps_with_packed_storage<V: Primitive>(&self) -> Maps<E, V, Q, G, PackedStorage<V>> {
        self.maps_with_storage(PackedStorage::new())
    }

    pub fn maps_with_storage<V, GV: Storage<V>>(&self, value_storage: GV) -> Maps<E, V, Q, G, GV> {
        Maps {
            equ: self.equ.clone(),
            key_storage: self.storage.clone(),
            value_storage,
            _marker: PhantomData,
        }
    }
}

/// Map factory bound to a key equivalence and both storage flavors.
pub struct Maps<K, V, Q, GK, GV> {
    equ: Q,
    key_storage: GK,
    value_storage: GV,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, Q, GK, GV> Maps<K, V, Q, GK, GV>
where
    Q: Equivalence<K> + Clone,
    GK: Storage<K>,
    GV: Storage<V>,
{
    /// An empty map comparing values by natural equality.
    pub fn new_map(&self) -> EquivalenceMap<K, V, Q, Equality, GK, GV>
    where
        V: Eq + Hash,
    {
        self.new_map_with_value_equivalence(Equality::new())
    }

    /// An empty map with an explicit value equivalence.
    pub fn new_map_with_value_equivalence<W: Equivalence<V>>(
        &self,
        value_equ: W,
    ) -> EquivalenceMap<K, V, Q, W, GK, GV> {
        EquivalenceMap::new(
            Cuckoo::new(self.equ.clone()),
            value_equ,
            self.key_storage.clone(),
            self.value_storage.clone(),
            DEFAULT_CAPACITY,
        )
    }

    /// An empty map with an injected eviction-choice source.
    pub fn new_map_with_rng(&self, rng: Box<dyn RngCore>) -> EquivalenceMap<K, V, Q, Equality, GK, GV>
    where
        V: Eq + Hash,
    {
        EquivalenceMap::new(
            Cuckoo::with_rng(self.equ.clone(), rng),
            Equality::new(),
            self.key_storage.clone(),
            self.value_storage.clone(),
            DEFAULT_CAPACITY,
        )
    }
}

fn initial_capacity(size: usize) -> usize {
    if size < 2 {
        size
    } else if size < 10 {
        size + 2
    } else {
        (size as f32 * 1.2).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: derived initial capacity follows the size rules — the
    /// count itself below 2, a small slack below 10, 20% headroom above.
    #[test]
    fn initial_capacity_rules() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(1), 1);
        assert_eq!(initial_capacity(2), 4);
        assert_eq!(initial_capacity(9), 11);
        assert_eq!(initial_capacity(10), 12);
        assert_eq!(initial_capacity(100), 120);
    }

    /// Invariant: `new_set` starts at the default capacity; `new_set_from`
    /// derives capacity from the element count and holds the elements.
    #[test]
    fn set_factories() {
        let sets = equality::<u32>().sets();
        let s = sets.new_set();
        assert_eq!(s.capacity(), 16);
        assert!(s.is_empty());

        let seeded = sets.new_set_from(0..20u32);
        assert_eq!(seeded.len(), 20);
        assert!(seeded.capacity() >= 20);
        assert!((0..20).all(|n| seeded.contains(&n)));
    }

    /// Invariant: packed factories produce working containers for
    /// primitive element types.
    #[test]
    fn packed_factories() {
        let mut s = equality::<i32>().sets_with_packed_storage().new_set();
        s.add(5);
        assert!(s.contains(&5));

        let mut m = equality::<i32>()
            .sets_with_packed_storage()
            .maps_with_packed_storage::<i64>()
            .new_map();
        m.put(1, 10i64);
        assert_eq!(m.get(&1), Some(10));
    }

    /// Invariant: the identity builder distinguishes equal values in
    /// distinct allocations.
    #[test]
    fn identity_builder() {
        let mut s = identity::<u32>().sets().new_set();
        let a = Rc::new(1u32);
        let b = Rc::new(1u32);
        assert!(s.add(a.clone()));
        assert!(s.add(b.clone()), "distinct allocation is a distinct member");
        assert!(!s.add(a.clone()));
        assert_eq!(s.len(), 2);
    }
}
