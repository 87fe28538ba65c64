//! The mutable/immutable, view/copy contract shared by stores and containers.

/// Uniform mutability surface.
///
/// Two axes matter observationally: whether a handle may mutate, and whether
/// it shares storage with the handle it was derived from. Views share
/// storage (mutations through any other live handle are visible through
/// them); copies own freshly allocated storage and are decoupled from the
/// source the moment they are created.
///
/// Deriving never touches the source: every method takes `&self` and the
/// source handle keeps working unchanged.
pub trait Mutability: Sized {
    /// Whether mutations through this handle are permitted.
    fn is_mutable(&self) -> bool;

    /// An independent mutable handle over a fresh copy of the contents.
    fn mutable_copy(&self) -> Self;

    /// An independent immutable handle over a fresh copy of the contents.
    fn immutable_copy(&self) -> Self;

    /// A mutable handle sharing this handle's storage.
    ///
    /// # Panics
    ///
    /// Panics if this handle is immutable; a mutable alias would break the
    /// immutability contract for every other handle over the same storage.
    fn mutable_view(&self) -> Self;

    /// An immutable handle sharing this handle's storage. Mutations made
    /// through other live handles remain visible through it.
    fn immutable_view(&self) -> Self;

    /// A mutable handle: this handle's storage if already mutable, else a
    /// mutable copy.
    fn mutable(&self) -> Self {
        if self.is_mutable() {
            self.mutable_view()
        } else {
            self.mutable_copy()
        }
    }

    /// An immutable handle over this handle's storage.
    fn immutable(&self) -> Self {
        self.immutable_view()
    }
}
