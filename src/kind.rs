//! Release strategies selecting how the last handle frees a shared value.

use base::alloc::{dealloc, Layout};
use base::ptr::{self, NonNull};

use base::prelude::v1::*;

mod private {
    pub trait Sealed {}

    impl Sealed for super::Scalar {}
    impl Sealed for super::Array {}
}

/// Frees a value of type `T` that was handed to a
/// [`SharedPointer`](crate::SharedPointer).
///
/// This trait is sealed: the only strategies are [`Scalar`] and [`Array`].
pub trait Release<T: ?Sized>: private::Sealed {
    /// Drops the value behind `ptr` and frees its allocation.
    ///
    /// # Safety
    ///
    /// `ptr` must come from the allocation this strategy expects (see the
    /// implementors), must not be used afterwards, and must be released at most once.
    unsafe fn release(ptr: NonNull<T>);
}

/// Single-object release: the value was allocated by a `Box<T>`.
///
/// This is the default strategy and works for any `T`, including trait objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {}

/// Whole-buffer release: the value is a slice `[E]` whose buffer was allocated as a
/// `Box<[E]>` (or a `Vec<E>` shrunk to fit).
///
/// Every element is dropped in place and then the buffer is deallocated in one go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Array {}

impl<T: ?Sized> Release<T> for Scalar {
    #[inline]
    unsafe fn release(ptr: NonNull<T>) {
        drop(Box::from_raw(ptr.as_ptr()));
    }
}

impl<E> Release<[E]> for Array {
    unsafe fn release(ptr: NonNull<[E]>) {
        let layout = Layout::for_value(ptr.as_ref());
        ptr::drop_in_place(ptr.as_ptr());

        // A `Box<[E]>` never allocates zero-sized buffers.
        if layout.size() != 0 {
            dealloc(ptr.as_ptr().cast(), layout);
        }
    }
}
