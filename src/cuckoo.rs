//! The multi-probe ("cuckoo") insertion and lookup engine.
//!
//! Every element has up to [`HASH_COUNT`] candidate slots derived from its
//! equivalence hash and the table capacity. Insertion evicts a random
//! candidate occupant when all candidates are taken, retrying with the
//! displaced element up to [`RETRY_LIMIT`] times; past that the engine hands
//! the still-homeless element back to the container, which owns the
//! grow-and-replay loop. The engine itself never allocates storage.

use crate::equivalence::Equivalence;
use crate::store::Store;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

pub(crate) const HASH_COUNT: usize = 3;
pub(crate) const RETRY_LIMIT: usize = 3;

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Sizes a full-width equivalence hash to one table capacity.
///
/// The candidates for a hash are three successive mixes reduced into
/// `[0, capacity)`; the same hash yields the same candidates for a given
/// capacity, for any capacity. Candidates are generally distinct but may
/// collide, which is harmless.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Probes {
    capacity: usize,
}

impl Probes {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn candidates(&self, hash: u64) -> [usize; HASH_COUNT] {
        debug_assert!(self.capacity > 0, "candidates of a zero-capacity table");
        let mut out = [0; HASH_COUNT];
        let mut state = hash;
        for slot in &mut out {
            state = splitmix64(state);
            *slot = (state % self.capacity as u64) as usize;
        }
        out
    }
}

/// Eviction source that always selects candidate 0.
///
/// For containers that never actually evict (at most one element) the
/// choice is moot, and pinning it keeps behavior fully deterministic; also
/// useful to pin eviction order in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinnedRng;

impl RngCore for PinnedRng {
    fn next_u32(&mut self) -> u32 {
        0
    }
    fn next_u64(&mut self) -> u64 {
        0
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        dest.fill(0);
        Ok(())
    }
}

/// A seeded eviction source for reproducible behavior.
pub fn seeded_rng(seed: u64) -> Box<dyn RngCore> {
    Box::new(StdRng::seed_from_u64(seed))
}

/// The engine: an equivalence plus the eviction-choice source. Containers
/// own one and bind it to their current store per operation.
pub(crate) struct Cuckoo<Q> {
    pub equ: Q,
    pub rng: Box<dyn RngCore>,
}

impl<Q> Cuckoo<Q> {
    pub fn new(equ: Q) -> Self {
        Self::with_rng(equ, seeded_rng(0))
    }

    pub fn with_rng(equ: Q, rng: Box<dyn RngCore>) -> Self {
        Self { equ, rng }
    }
}

/// Outcome of a set insertion.
pub(crate) enum Add<E> {
    Added,
    Present,
    /// Retries exhausted; the carried element still needs a home and the
    /// store must grow before it can get one.
    Grow(E),
}

/// Outcome of a map insertion. `Done` carries the previous value when the
/// key was already present (observable only on the first pass).
pub(crate) enum Put<K, V> {
    Done(Option<V>),
    Grow { key: K, value: V },
}

enum SlotStatus {
    Free,
    Occupied,
    Present,
}

/// Equivalence-based lookup: the first candidate slot whose occupant is
/// equivalent to `e`. Never mutates, never retries.
pub(crate) fn index_of<E, Q, S>(equ: &Q, probes: Probes, store: &S, e: &E) -> Option<usize>
where
    Q: Equivalence<E>,
    S: Store<E>,
{
    if probes.capacity() == 0 {
        return None;
    }
    probes
        .candidates(equ.hash_one(e))
        .into_iter()
        .find(|&h| store.map_slot(h, |occupant| matches!(occupant, Some(e2) if equ.is_equivalent(e, e2))))
}

/// Per-operation binding of the engine to one store.
pub(crate) struct Access<'a, Q, S> {
    equ: &'a Q,
    rng: &'a mut dyn RngCore,
    probes: Probes,
    store: &'a S,
}

impl<'a, Q, S> Access<'a, Q, S> {
    pub fn new(equ: &'a Q, rng: &'a mut dyn RngCore, probes: Probes, store: &'a S) -> Self {
        Self {
            equ,
            rng,
            probes,
            store,
        }
    }

    pub fn add<E>(&mut self, mut e: E) -> Add<E>
    where
        Q: Equivalence<E>,
        S: Store<E>,
    {
        if self.probes.capacity() == 0 {
            return Add::Grow(e);
        }
        let mut retries = 0;
        let mut first = true;
        loop {
            let candidates = self.probes.candidates(self.equ.hash_one(&e));
            let mut first_free = None;
            for &h in &candidates {
                let status = self.store.map_slot(h, |occupant| match occupant {
                    None => SlotStatus::Free,
                    Some(e2) if first && self.equ.is_equivalent(&e, e2) => SlotStatus::Present,
                    Some(_) => SlotStatus::Occupied,
                });
                match status {
                    SlotStatus::Free => {
                        if first_free.is_none() {
                            first_free = Some(h);
                        }
                        // An evicted element cannot be present elsewhere, so
                        // the first free slot settles it; on the first pass
                        // the remaining candidates must still be scanned for
                        // an equivalent occupant.
                        if !first {
                            break;
                        }
                    }
                    SlotStatus::Present => return Add::Present,
                    SlotStatus::Occupied => {}
                }
            }
            if let Some(h) = first_free {
                self.store.set(h, Some(e));
                return Add::Added;
            }
            // Every candidate is occupied by a non-equivalent element.
            let h = candidates[self.rng.gen_range(0..HASH_COUNT)];
            let evicted = self.store.set(h, Some(e)).expect("evicted slot was occupied");
            if retries >= RETRY_LIMIT {
                return Add::Grow(evicted);
            }
            e = evicted;
            first = false;
            retries += 1;
        }
    }
}

/// Per-operation binding of the engine to a key store and its parallel
/// value store. The value follows the key through every placement and
/// eviction so slot `i` of the value store always mirrors key slot `i`.
pub(crate) struct PairedAccess<'a, Q, S, T> {
    equ: &'a Q,
    rng: &'a mut dyn RngCore,
    probes: Probes,
    keys: &'a S,
    values: &'a T,
}

impl<'a, Q, S, T> PairedAccess<'a, Q, S, T> {
    pub fn new(
        equ: &'a Q,
        rng: &'a mut dyn RngCore,
        probes: Probes,
        keys: &'a S,
        values: &'a T,
    ) -> Self {
        Self {
            equ,
            rng,
            probes,
            keys,
            values,
        }
    }

    pub fn put<K, V>(&mut self, key: K, value: V, overwrite: bool) -> Put<K, V>
    where
        Q: Equivalence<K>,
        S: Store<K>,
        T: Store<V>,
    {
        if self.probes.capacity() == 0 {
            return Put::Grow { key, value };
        }
        let (mut key, mut value) = (key, value);
        let mut retries = 0;
        let mut first = true;
        loop {
            let candidates = self.probes.candidates(self.equ.hash_one(&key));
            let mut first_free = None;
            for &h in &candidates {
                let status = self.keys.map_slot(h, |occupant| match occupant {
                    None => SlotStatus::Free,
                    Some(k2) if first && self.equ.is_equivalent(&key, k2) => SlotStatus::Present,
                    Some(_) => SlotStatus::Occupied,
                });
                match status {
                    SlotStatus::Free => {
                        if first_free.is_none() {
                            first_free = Some(h);
                        }
                        if !first {
                            break;
                        }
                    }
                    SlotStatus::Present => {
                        let previous = if overwrite {
                            self.values.set(h, Some(value))
                        } else {
                            self.values.get(h)
                        };
                        return Put::Done(previous);
                    }
                    SlotStatus::Occupied => {}
                }
            }
            if let Some(h) = first_free {
                self.keys.set(h, Some(key));
                self.values.set(h, Some(value));
                return Put::Done(None);
            }
            let h = candidates[self.rng.gen_range(0..HASH_COUNT)];
            let evicted_key = self.keys.set(h, Some(key)).expect("evicted slot was occupied");
            let evicted_value = self
                .values
                .set(h, Some(value))
                .expect("value slot mirrors an occupied key slot");
            if retries >= RETRY_LIMIT {
                return Put::Grow {
                    key: evicted_key,
                    value: evicted_value,
                };
            }
            key = evicted_key;
            value = evicted_value;
            first = false;
            retries += 1;
        }
    }
}
