//! Reusable scratch storage.
//!
//! Combined buffer rebuilds and edge extraction fill large temporary arrays
//! over and over. [`Scratch<T>`] keeps such a value between uses: releasing
//! it clears the contents but keeps the allocation, so the next rebuild does
//! not have to grow its vectors from zero again.
//!
//! ```
//! use quartz_core::scratch::Scratch;
//!
//! let mut staging = Scratch::<Vec<u8>>::default();
//! staging.activate().extend_from_slice(&[1, 2, 3]);
//! assert!(staging.is_active());
//!
//! staging.release();
//! assert!(!staging.is_active());
//! assert!(staging.inner().capacity() >= 3);
//! ```

/// A value that can be emptied while keeping its allocations.
pub trait Reusable {
    /// Create an empty value.
    fn empty() -> Self;

    /// Clear the contents, preserving capacity.
    fn clear_for_reuse(&mut self);
}

impl<T> Reusable for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }

    fn clear_for_reuse(&mut self) {
        self.clear();
    }
}

/// Storage that alternates between an active (filled) and released (cleared) state.
#[derive(Debug)]
pub struct Scratch<T: Reusable> {
    value: T,
    active: bool,
}

impl<T: Reusable> Scratch<T> {
    /// Wrap a value that already holds valid data.
    pub fn new(value: T) -> Self {
        Self {
            value,
            active: true,
        }
    }

    /// Whether the scratch value currently holds data.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The active value, or `None` if released.
    pub fn get(&self) -> Option<&T> {
        self.active.then_some(&self.value)
    }

    /// Mark the value as in use and return it for filling.
    ///
    /// A released value comes back empty; an active one is returned as is.
    pub fn activate(&mut self) -> &mut T {
        self.active = true;
        &mut self.value
    }

    /// Clear the value and keep its allocation for the next [`activate`](Self::activate).
    pub fn release(&mut self) {
        if self.active {
            self.value.clear_for_reuse();
            self.active = false;
        }
    }

    /// The inner value regardless of state.
    pub fn inner(&self) -> &T {
        &self.value
    }
}

impl<T: Reusable> Default for Scratch<T> {
    fn default() -> Self {
        Self {
            value: T::empty(),
            active: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Staging {
        bytes: Vec<u8>,
        indices: Vec<u32>,
    }

    impl Reusable for Staging {
        fn empty() -> Self {
            Self::default()
        }

        fn clear_for_reuse(&mut self) {
            self.bytes.clear();
            self.indices.clear();
        }
    }

    #[test]
    fn test_default_is_released() {
        let scratch = Scratch::<Staging>::default();
        assert!(!scratch.is_active());
        assert!(scratch.get().is_none());
    }

    #[test]
    fn test_new_is_active() {
        let scratch = Scratch::new(vec![1u32, 2, 3]);
        assert!(scratch.is_active());
        assert_eq!(scratch.get().unwrap(), &vec![1, 2, 3]);
    }

    #[test]
    fn test_release_keeps_capacity() {
        let mut scratch = Scratch::<Staging>::default();
        let staging = scratch.activate();
        staging.bytes.extend_from_slice(&[0; 64]);
        staging.indices.extend_from_slice(&[0; 16]);

        scratch.release();

        assert!(!scratch.is_active());
        assert!(scratch.inner().bytes.is_empty());
        assert!(scratch.inner().bytes.capacity() >= 64);
        assert!(scratch.inner().indices.capacity() >= 16);
    }

    #[test]
    fn test_release_twice_is_noop() {
        let mut scratch = Scratch::new(vec![1u8]);
        scratch.release();
        scratch.release();
        assert!(!scratch.is_active());
    }

    #[test]
    fn test_activate_active_returns_existing() {
        let mut scratch = Scratch::new(vec![7u8, 8]);
        assert_eq!(scratch.activate(), &vec![7, 8]);
    }

    #[test]
    fn test_repeated_rebuilds() {
        let mut scratch = Scratch::<Vec<u32>>::default();
        for round in 0..3 {
            let values = scratch.activate();
            assert!(values.is_empty());
            values.extend(0..10 + round);
            assert_eq!(scratch.get().map(Vec::len), Some(10 + round as usize));
            scratch.release();
            assert!(scratch.inner().capacity() >= 10);
        }
    }
}
