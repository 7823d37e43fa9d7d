#![no_std]
//! A single-threaded reference-counted pointer, [`SharedPointer`], whose release strategy
//! ([`Scalar`] or [`Array`]) is fixed by its type.
//!
//! ```
//! use shared_pointer::SharedPointer;
//!
//! let a = SharedPointer::new(5);
//! let b = a.clone();
//!
//! assert!(a == b);
//! assert_eq!(b.ref_count(), 2);
//!
//! drop(a);
//! assert_eq!(*b, 5);
//! assert_eq!(b.ref_count(), 1);
//! ```
extern crate maybe_std as base;

mod kind;
mod ref_count;
mod shared_pointer;

pub use kind::{Array, Release, Scalar};
pub use ref_count::RefCount;
pub use shared_pointer::SharedPointer;

/// A smart pointer that keeps track of how many pointers refer to the same allocation and
/// exposes this information in its API.
pub trait ReferenceCounted<T: ?Sized>: Clone {
    /// Get the number of owning pointers referring to the same allocation.
    ///
    /// Implementations must fulfill that this is at least one for every live pointer.
    fn reference_count(this: &Self) -> usize;
}
