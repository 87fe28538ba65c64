//! equiv-collections: single-threaded sets and maps whose notion of "the
//! same element" is a caller-supplied equivalence relation, over
//! cuckoo-hashed slot storage.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one probe engine serving every container, over storage that can
//!   be boxed or packed, so each piece can be reasoned about independently.
//! - Layers:
//!   - Equivalence: a relation plus a full-width hash consistent with it;
//!     predefined relations for natural equality, `Rc` identity, float bit
//!     patterns and serialized byte forms.
//!   - Store (boxed or packed): fixed-capacity indexed slots with an
//!     occupied count; absence reads as `None`. Packed stores hold a raw
//!     primitive array plus a presence bit per slot. Storage is shared
//!     behind `Rc<RefCell<..>>`; each handle carries its own
//!     mutable/immutable flag.
//!   - Cuckoo engine: 3 candidate slots per element, bounded eviction
//!     retries, injectable eviction randomness. The engine returns
//!     "needs to grow" with the homeless element instead of resizing;
//!     containers own the grow-and-replay loop.
//!   - EquivalenceSet / EquivalenceMap: one store (or a key/value pair of
//!     stores moving in lock-step) bound to the engine; maps carry a second
//!     equivalence used only for value comparisons.
//!   - collect: fluent factories choosing equivalence, storage flavors and
//!     initial capacity.
//!
//! Constraints
//! - Single-threaded: every container and store is `!Send`/`!Sync` (shared
//!   storage is `Rc`-based). Concurrent use is out of contract.
//! - Elements are `Clone`; reads clone out of shared storage, while probe
//!   comparisons run on borrows and never clone.
//! - Mutability is uniform: views alias storage, copies own it, and any
//!   mutation through an immutable handle panics before touching storage.
//! - A resize swaps only the resizing container's own store; views taken
//!   earlier keep observing the store they captured.
//!
//! Determinism
//! - Eviction choice is drawn from an injectable source; factory-built
//!   containers default to a fixed-seed generator, and [`PinnedRng`] pins
//!   the choice entirely for tests and trivial containers.

mod bits;
pub mod boxed_store;
pub mod collect;
mod collections_proptest;
mod cuckoo;
pub mod equivalence;
pub mod map;
pub mod mutability;
pub mod packed_store;
pub mod set;
pub mod store;

// Public surface
pub use boxed_store::{BoxedStorage, BoxedStore};
pub use cuckoo::{seeded_rng, PinnedRng};
pub use equivalence::{BitEquality, BitPattern, Equality, Equivalence, Identity, SerialEquality};
pub use map::EquivalenceMap;
pub use mutability::Mutability;
pub use packed_store::{PackedStorage, PackedStore, Primitive};
pub use set::EquivalenceSet;
pub use store::{Storage, Store};
