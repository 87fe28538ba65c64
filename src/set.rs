//! EquivalenceSet: one store and one equivalence composed through the
//! probe engine.

use crate::boxed_store::BoxedStorage;
use crate::cuckoo::{self, Access, Add, Cuckoo, Probes};
use crate::equivalence::{Equality, Equivalence};
use crate::mutability::Mutability;
use crate::store::{Storage, Store};
use std::fmt;
use std::marker::PhantomData;

/// A set whose membership is decided by a caller-supplied equivalence.
///
/// No two occupied slots hold equivalent elements, and every element lives
/// at one of its own candidate slots for the current capacity. Insertions
/// that exhaust the engine's eviction budget grow the backing store
/// transparently (capacity doubles) and replay every live element.
///
/// Mutability, views and copies follow the [`Mutability`] contract: views
/// share the backing store, copies own a fresh one. A resize replaces only
/// this set's own store reference — views taken before it keep observing
/// the store they captured.
pub struct EquivalenceSet<E, Q = Equality, G = BoxedStorage<E>>
where
    G: Storage<E>,
{
    cuckoo: Cuckoo<Q>,
    storage: G,
    probes: Probes,
    store: G::Store,
}

impl<E, Q, G> EquivalenceSet<E, Q, G>
where
    Q: Equivalence<E>,
    G: Storage<E>,
{
    pub(crate) fn new(cuckoo: Cuckoo<Q>, storage: G, initial_capacity: usize) -> Self {
        let store = storage.new_store(initial_capacity);
        Self {
            cuckoo,
            storage,
            probes: Probes::new(initial_capacity),
            store,
        }
    }

    /// The equivalence deciding membership.
    pub fn equivalence(&self) -> &Q {
        &self.cuckoo.equ
    }

    pub fn len(&self) -> usize {
        self.store.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current slot capacity of the backing store.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn contains(&self, e: &E) -> bool {
        self.index_of(e).is_some()
    }

    /// The stored representative equivalent to `e`, if any. Useful when the
    /// relation collapses structurally distinct values.
    pub fn get(&self, e: &E) -> Option<E> {
        self.index_of(e).and_then(|i| self.store.get(i))
    }

    /// Add `e` unless an equivalent element is already present. Returns
    /// whether the set changed.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn add(&mut self, e: E) -> bool {
        self.check_mutable();
        let outcome = self.access().add(e);
        match outcome {
            Add::Added => true,
            Add::Present => false,
            Add::Grow(left) => {
                self.grow_and_reinsert(left);
                true
            }
        }
    }

    /// Remove the element equivalent to `e`. Returns whether the set
    /// changed.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn remove(&mut self, e: &E) -> bool {
        self.check_mutable();
        match self.index_of(e) {
            Some(i) => {
                self.store.set(i, None);
                true
            }
            None => false,
        }
    }

    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn clear(&mut self) {
        self.check_mutable();
        self.store.clear();
    }

    /// Iterate the elements in ascending slot order. The order is
    /// capacity-dependent and not stable across resizes.
    pub fn iter(&self) -> Iter<'_, E, G::Store> {
        Iter {
            store: &self.store,
            index: 0,
            _marker: PhantomData,
        }
    }

    /// Keep only the elements `f` approves.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable.
    pub fn retain(&mut self, mut f: impl FnMut(&E) -> bool) {
        self.check_mutable();
        for i in 0..self.store.capacity() {
            let discard = self
                .store
                .map_slot(i, |occupant| matches!(occupant, Some(e) if !f(e)));
            if discard {
                self.store.set(i, None);
            }
        }
    }

    fn index_of(&self, e: &E) -> Option<usize> {
        cuckoo::index_of(&self.cuckoo.equ, self.probes, &self.store, e)
    }

    fn access(&mut self) -> Access<'_, Q, G::Store> {
        Access::new(
            &self.cuckoo.equ,
            self.cuckoo.rng.as_mut(),
            self.probes,
            &self.store,
        )
    }

    fn check_mutable(&self) {
        assert!(self.store.is_mutable(), "set is immutable");
    }

    /// Replace the backing store with a doubled one, replay every live
    /// element through a fresh first-pass access and finally place the
    /// homeless element. Doubles again if any placement exhausts retries.
    fn grow_and_reinsert(&mut self, mut homeless: E) {
        let old_capacity = self.store.capacity();
        let mut new_capacity = if old_capacity == 0 { 2 } else { old_capacity * 2 };
        'grow: loop {
            let store = self.storage.new_store(new_capacity);
            let probes = Probes::new(new_capacity);
            {
                let mut access = Access::new(
                    &self.cuckoo.equ,
                    self.cuckoo.rng.as_mut(),
                    probes,
                    &store,
                );
                for i in 0..old_capacity {
                    if let Some(e) = self.store.get(i) {
                        match access.add(e) {
                            Add::Added | Add::Present => {}
                            Add::Grow(_) => {
                                new_capacity *= 2;
                                continue 'grow;
                            }
                        }
                    }
                }
                match access.add(homeless) {
                    Add::Added | Add::Present => {}
                    Add::Grow(left) => {
                        homeless = left;
                        new_capacity *= 2;
                        continue 'grow;
                    }
                }
            }
            self.store = store;
            self.probes = probes;
            return;
        }
    }

    fn derived(&self, store: G::Store) -> Self
    where
        Q: Clone,
    {
        Self {
            cuckoo: Cuckoo::new(self.cuckoo.equ.clone()),
            storage: self.storage.clone(),
            probes: Probes::new(store.capacity()),
            store,
        }
    }
}

impl<E, Q, G> Mutability for EquivalenceSet<E, Q, G>
where
    Q: Equivalence<E> + Clone,
    G: Storage<E>,
{
    fn is_mutable(&self) -> bool {
        self.store.is_mutable()
    }

    fn mutable_copy(&self) -> Self {
        self.derived(self.store.mutable_copy())
    }

    fn immutable_copy(&self) -> Self {
        self.derived(self.store.immutable_copy())
    }

    fn mutable_view(&self) -> Self {
        assert!(
            self.store.is_mutable(),
            "cannot take a mutable view of an immutable set"
        );
        self.derived(self.store.mutable_view())
    }

    fn immutable_view(&self) -> Self {
        self.derived(self.store.immutable_view())
    }
}

impl<E, Q, G> fmt::Debug for EquivalenceSet<E, Q, G>
where
    E: fmt::Debug,
    Q: Equivalence<E>,
    G: Storage<E>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over a store's occupied slots in ascending index order,
/// cloning elements out of shared storage.
pub struct Iter<'a, E, S> {
    store: &'a S,
    index: usize,
    _marker: PhantomData<fn() -> E>,
}

impl<'a, E, S: Store<E>> Iterator for Iter<'a, E, S> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        while self.index < self.store.capacity() {
            let i = self.index;
            self.index += 1;
            if let Some(e) = self.store.get(i) {
                return Some(e);
            }
        }
        None
    }
}
