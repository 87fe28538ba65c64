//! Primitive-packed store: a raw value array plus a presence bit per slot.
//!
//! Primitive slots cannot themselves represent absence, so occupancy lives
//! in a parallel bit vector and `get` consults the bit before decoding the
//! slot. Footprint per slot is the primitive itself plus one bit, with no
//! per-element boxing.

use crate::bits::BitVec;
use crate::mutability::Mutability;
use crate::store::{Storage, Store};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

mod sealed {
    pub trait Sealed {}
}

/// The closed set of element kinds a [`PackedStore`] can hold.
///
/// One implementation per primitive kind, selected at construction time by
/// the type parameter; there is no runtime kind dispatch.
pub trait Primitive: Copy + sealed::Sealed + 'static {
    /// The filler written into unoccupied slots.
    fn zero() -> Self;
}

macro_rules! primitive {
    ($($t:ty => $zero:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}
            impl Primitive for $t {
                fn zero() -> Self {
                    $zero
                }
            }
        )*
    };
}

primitive! {
    i8 => 0,
    i16 => 0,
    i32 => 0,
    i64 => 0,
    f32 => 0.0,
    f64 => 0.0,
    char => '\0',
    bool => false,
}

struct Packed<P> {
    values: Vec<P>,
    populated: BitVec,
    count: usize,
}

/// Slot storage over a raw primitive array, shared between handles.
pub struct PackedStore<P: Primitive> {
    inner: Rc<RefCell<Packed<P>>>,
    mutable: bool,
}

impl<P: Primitive> PackedStore<P> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Packed {
                values: vec![P::zero(); capacity],
                populated: BitVec::new(capacity),
                count: 0,
            })),
            mutable: true,
        }
    }

    fn check_mutable(&self) {
        assert!(self.mutable, "store is immutable");
    }
}

impl<P: Primitive> Store<P> for PackedStore<P> {
    fn capacity(&self) -> usize {
        self.inner.borrow().populated.len()
    }

    fn count(&self) -> usize {
        self.inner.borrow().count
    }

    fn get(&self, index: usize) -> Option<P> {
        let inner = self.inner.borrow();
        inner.populated.get(index).then(|| inner.values[index])
    }

    fn map_slot<R>(&self, index: usize, f: impl FnOnce(Option<&P>) -> R) -> R {
        let inner = self.inner.borrow();
        if inner.populated.get(index) {
            f(Some(&inner.values[index]))
        } else {
            f(None)
        }
    }

    fn set(&self, index: usize, value: Option<P>) -> Option<P> {
        self.check_mutable();
        let mut inner = self.inner.borrow_mut();
        let was = inner.populated.get(index);
        match value {
            Some(v) => {
                let previous = was.then(|| inner.values[index]);
                inner.values[index] = v;
                if !was {
                    inner.populated.set(index, true);
                    inner.count += 1;
                }
                previous
            }
            None => {
                if was {
                    inner.populated.set(index, false);
                    inner.count -= 1;
                    Some(inner.values[index])
                } else {
                    None
                }
            }
        }
    }

    fn clear(&self) {
        self.check_mutable();
        let mut inner = self.inner.borrow_mut();
        inner.populated.clear_all();
        inner.count = 0;
    }
}

impl<P: Primitive> Mutability for PackedStore<P> {
    fn is_mutable(&self) -> bool {
        self.mutable
    }

    fn mutable_copy(&self) -> Self {
        let inner = self.inner.borrow();
        Self {
            inner: Rc::new(RefCell::new(Packed {
                values: inner.values.clone(),
                populated: inner.populated.clone(),
                count: inner.count,
            })),
            mutable: true,
        }
    }

    fn immutable_copy(&self) -> Self {
        Self {
            mutable: false,
            ..self.mutable_copy()
        }
    }

    fn mutable_view(&self) -> Self {
        assert!(
            self.mutable,
            "cannot take a mutable view of an immutable store"
        );
        Self {
            inner: self.inner.clone(),
            mutable: true,
        }
    }

    fn immutable_view(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            mutable: false,
        }
    }
}

/// Factory for [`PackedStore`] over one primitive kind.
pub struct PackedStorage<P> {
    _marker: PhantomData<fn() -> P>,
}

impl<P> PackedStorage<P> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P> Default for PackedStorage<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for PackedStorage<P> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<P: Primitive> Storage<P> for PackedStorage<P> {
    type Store = PackedStore<P>;

    fn new_store(&self, capacity: usize) -> PackedStore<P> {
        PackedStore::new(capacity)
    }
}
