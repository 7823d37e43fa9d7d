use base::cell::Cell;

/// A counter cell tracking how many handles currently share one value.
///
/// The cell is not synchronized. Every method takes `&self` so that all handles
/// sharing the cell can update it, which also makes the cell `!Sync`.
#[derive(Debug, Default)]
pub struct RefCount {
    count: Cell<usize>,
}

impl RefCount {
    /// Creates a cell with a count of zero.
    pub const fn new() -> Self {
        RefCount { count: Cell::new(0) }
    }

    /// Increments the count by one.
    ///
    /// Panics if the count would overflow.
    #[inline]
    pub fn add_ref(&self) {
        let count = self.count.get();
        if count == usize::MAX {
            panic!("reference count overflow");
        }
        self.count.set(count + 1);
    }

    /// Decrements the count by one and returns the new count.
    ///
    /// The caller that observes zero is responsible for freeing whatever the cell guards.
    #[inline]
    pub fn release(&self) -> usize {
        match self.count.get().checked_sub(1) {
            Some(count) => {
                self.count.set(count);
                count
            }
            None => panic!("released a reference count of zero"),
        }
    }

    /// Returns the current count.
    #[inline]
    pub fn count(&self) -> usize {
        self.count.get()
    }
}
