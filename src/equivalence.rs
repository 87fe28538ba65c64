//! Equivalence relations and the predefined relations shipped with the crate.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::rc::Rc;

/// A reflexive, symmetric, transitive relation deciding when two values are
/// "the same element", paired with a hash consistent with it.
///
/// The consistency invariant is the whole contract: for any `a` and `b`,
/// `is_equivalent(a, b)` implies `hash_one(a) == hash_one(b)`. The hash is
/// full-width; sizing it to a table capacity is the probe engine's job, so
/// one hash stays valid across every resize.
///
/// Implementations are expected to be cheap to clone; containers clone their
/// equivalence into derived copies and views.
pub trait Equivalence<E> {
    /// Whether `a` and `b` are the same element under this relation.
    fn is_equivalent(&self, a: &E, b: &E) -> bool;

    /// A hash consistent with [`Equivalence::is_equivalent`].
    fn hash_one(&self, e: &E) -> u64;
}

/// Natural equality: two values are equivalent when they are `==`, hashed
/// through a caller-suppliable [`BuildHasher`].
pub struct Equality<S = RandomState> {
    build: S,
}

impl Equality {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<S: BuildHasher> Equality<S> {
    pub fn with_hasher(build: S) -> Self {
        Self { build }
    }
}

impl Default for Equality {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> Clone for Equality<S> {
    fn clone(&self) -> Self {
        Self {
            build: self.build.clone(),
        }
    }
}

impl<E, S> Equivalence<E> for Equality<S>
where
    E: Eq + Hash,
    S: BuildHasher,
{
    fn is_equivalent(&self, a: &E, b: &E) -> bool {
        a == b
    }

    fn hash_one(&self, e: &E) -> u64 {
        self.build.hash_one(e)
    }
}

/// Reference identity over `Rc<T>`: two handles are equivalent only when
/// they point at the same allocation, hashed from the pointer address.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<T> Equivalence<Rc<T>> for Identity {
    fn is_equivalent(&self, a: &Rc<T>, b: &Rc<T>) -> bool {
        Rc::ptr_eq(a, b)
    }

    fn hash_one(&self, e: &Rc<T>) -> u64 {
        // Fibonacci mix so aligned pointers don't hash to aligned values.
        (Rc::as_ptr(e) as usize as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl<T: Sealed> Sealed for Vec<T> {}
}

/// Types comparable and hashable by their IEEE-754 bit pattern. Implemented
/// for `f32`, `f64` and vectors of either; the basis of [`BitEquality`].
pub trait BitPattern: sealed::Sealed {
    fn bits_eq(&self, other: &Self) -> bool;
    fn hash_bits<H: Hasher>(&self, state: &mut H);
}

impl BitPattern for f32 {
    fn bits_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
    fn hash_bits<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.to_bits());
    }
}

impl BitPattern for f64 {
    fn bits_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
    fn hash_bits<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.to_bits());
    }
}

impl<T: BitPattern> BitPattern for Vec<T> {
    fn bits_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.bits_eq(b))
    }
    fn hash_bits<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for x in self {
            x.hash_bits(state);
        }
    }
}

/// Bit-pattern equivalence over floats and float vectors.
///
/// Floats have no `Eq`, so [`Equality`] cannot store them; this relation
/// compares raw bit patterns instead. Under it a NaN is equivalent to
/// itself (same payload) and `0.0` is distinct from `-0.0`.
pub struct BitEquality<S = RandomState> {
    build: S,
}

impl BitEquality {
    pub fn new() -> Self {
        Self {
            build: RandomState::new(),
        }
    }
}

impl Default for BitEquality {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> Clone for BitEquality<S> {
    fn clone(&self) -> Self {
        Self {
            build: self.build.clone(),
        }
    }
}

impl<E, S> Equivalence<E> for BitEquality<S>
where
    E: BitPattern,
    S: BuildHasher,
{
    fn is_equivalent(&self, a: &E, b: &E) -> bool {
        a.bits_eq(b)
    }

    fn hash_one(&self, e: &E) -> u64 {
        let mut state = self.build.build_hasher();
        e.hash_bits(&mut state);
        state.finish()
    }
}

/// Equivalent iff identical serialized byte form.
///
/// Equality re-derives and compares the byte forms directly rather than
/// trusting the hash; hash collisions between distinct byte forms are
/// possible and must not make values equivalent.
pub struct SerialEquality<F, S = RandomState> {
    serialize: F,
    build: S,
}

impl<F> SerialEquality<F> {
    /// Build the equivalence from an injected serializer.
    pub fn new(serialize: F) -> Self {
        Self {
            serialize,
            build: RandomState::new(),
        }
    }
}

#[cfg(feature = "serde")]
impl<E: serde::Serialize> SerialEquality<fn(&E) -> Vec<u8>> {
    /// Serialized-form equivalence over the JSON encoding of `E`.
    ///
    /// # Panics
    ///
    /// Panics if a value fails to encode (e.g. a map with non-string keys).
    pub fn json() -> Self {
        fn encode<E: serde::Serialize>(e: &E) -> Vec<u8> {
            serde_json::to_vec(e).expect("value must encode as JSON")
        }
        Self::new(encode::<E> as fn(&E) -> Vec<u8>)
    }
}

impl<F: Clone, S: Clone> Clone for SerialEquality<F, S> {
    fn clone(&self) -> Self {
        Self {
            serialize: self.serialize.clone(),
            build: self.build.clone(),
        }
    }
}

impl<E, F, S> Equivalence<E> for SerialEquality<F, S>
where
    F: Fn(&E) -> Vec<u8>,
    S: BuildHasher,
{
    fn is_equivalent(&self, a: &E, b: &E) -> bool {
        (self.serialize)(a) == (self.serialize)(b)
    }

    fn hash_one(&self, e: &E) -> u64 {
        self.build.hash_one((self.serialize)(e).as_slice())
    }
}
