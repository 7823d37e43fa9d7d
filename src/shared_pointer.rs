use base::borrow;
use base::convert::From;
use base::fmt;
use base::hash::{Hash, Hasher};
use base::marker::PhantomData;
use base::mem;
use base::ops::{Deref, Not};
use base::ptr::{self, NonNull};

use base::prelude::v1::*;

use crate::kind::{Array, Release, Scalar};
use crate::ref_count::RefCount;
use crate::ReferenceCounted;

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        log::trace!($($arg)*);
    }};
}

/// A non-thread-safe reference-counted pointer with a compile-time release strategy.
///
/// Every handle owns one increment of a shared [`RefCount`] cell, including null handles,
/// which get a cell of their own. Cloning a handle increments the cell, dropping it
/// decrements the cell, and the handle that drives the count to zero frees both the
/// value (through `K`) and the cell.
///
/// Handles compare by identity of the shared value, and only against handles of the
/// exact same type:
///
/// ```compile_fail
/// use shared_pointer::SharedPointer;
///
/// let a = SharedPointer::new(1u32);
/// let b = SharedPointer::new(1u64);
/// let _ = a == b;
/// ```
///
/// ```compile_fail
/// use shared_pointer::{Array, SharedPointer};
///
/// let a: SharedPointer<[u8]> = SharedPointer::from_box(vec![1u8].into_boxed_slice());
/// let b: SharedPointer<[u8], Array> = SharedPointer::from(vec![1u8]);
/// let _ = a == b;
/// ```
pub struct SharedPointer<T: ?Sized, K: Release<T> = Scalar> {
    value: Option<NonNull<T>>,
    count: NonNull<RefCount>,
    phantom: PhantomData<(Box<T>, K)>,
}

impl<T: ?Sized, K: Release<T>> SharedPointer<T, K> {
    /// Takes ownership of `value` and pairs it with a fresh counter holding one reference.
    fn from_value(value: Option<NonNull<T>>) -> Self {
        let count = RefCount::new();
        count.add_ref();
        let count = NonNull::from(Box::leak(Box::new(count)));

        trace!("allocated reference count {:p}", count);
        Self { value, count, phantom: PhantomData }
    }

    #[inline]
    fn counter(&self) -> &RefCount {
        // The cell stays alive as long as any handle sharing it, including this one.
        unsafe { self.count.as_ref() }
    }

    /// The counter identifies the group of handles sharing one value, even when values of
    /// zero-sized types share an address.
    fn identity(&self) -> Option<NonNull<RefCount>> {
        self.value.map(|_| self.count)
    }

    fn addr(&self) -> *const u8 {
        match self.value {
            Some(value) => value.as_ptr().cast::<u8>() as *const u8,
            None => ptr::null(),
        }
    }

    /// Creates a handle that holds no value.
    ///
    /// ```
    /// use shared_pointer::SharedPointer;
    ///
    /// let empty: SharedPointer<i32> = SharedPointer::null();
    /// assert!(empty.is_null());
    /// assert!(!&empty);
    /// assert_eq!(empty.ref_count(), 1);
    /// ```
    pub fn null() -> Self {
        Self::from_value(None)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Number of handles sharing this handle's counter.
    ///
    /// Exposed for diagnostics and tests.
    #[inline]
    pub fn ref_count(&self) -> usize {
        self.counter().count()
    }

    /// Returns the shared value, or `None` for a null handle.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref().map(|value| unsafe { value.as_ref() })
    }

    /// Returns a mutable reference to the value if this is the only handle sharing it.
    ///
    /// ```
    /// use shared_pointer::SharedPointer;
    ///
    /// let mut a = SharedPointer::new(0);
    /// *a.get_mut().unwrap() = 5;
    ///
    /// let b = a.clone();
    /// assert!(a.get_mut().is_none());
    /// assert_eq!(*b, 5);
    /// ```
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.ref_count() == 1 {
            self.value.as_mut().map(|value| unsafe { value.as_mut() })
        } else {
            None
        }
    }

    /// Exchanges the value and the counter of two handles. Counts are left untouched.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.value, &mut other.value);
        mem::swap(&mut self.count, &mut other.count);
    }

    /// Makes `self` share `rhs`'s value.
    ///
    /// A temporary copy of `rhs` is swapped into `self`, and dropping the temporary
    /// releases whatever `self` held before. Assigning a handle to itself, or to a handle
    /// sharing the same value, leaves the count unchanged.
    ///
    /// ```
    /// use shared_pointer::SharedPointer;
    ///
    /// let a = SharedPointer::new(String::from("a"));
    /// let mut b = SharedPointer::new(String::from("b"));
    ///
    /// b.assign(&a);
    /// assert!(a == b);
    /// assert_eq!(b.ref_count(), 2);
    /// ```
    pub fn assign(&mut self, rhs: &Self) {
        let mut copy = rhs.clone();
        copy.swap(self);
    }

    /// Returns `true` if both handles share the same value. Two null handles are equal.
    ///
    /// ```
    /// use shared_pointer::SharedPointer;
    ///
    /// let a = SharedPointer::new(());
    /// let b = SharedPointer::new(());
    /// assert!(!SharedPointer::ptr_eq(&a, &b));
    /// assert!(SharedPointer::ptr_eq(&a, &a.clone()));
    /// ```
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.identity() == other.identity()
    }
}

impl<T> SharedPointer<T, Scalar> {
    /// Moves `value` to the heap and creates the first handle to it.
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Returns the value if `this` is the last handle sharing it.
    ///
    /// Otherwise, or if `this` is null, the handle is returned unchanged.
    ///
    /// ```
    /// use shared_pointer::SharedPointer;
    ///
    /// let a = SharedPointer::new(3);
    /// let b = a.clone();
    ///
    /// let a = SharedPointer::try_unwrap(a).unwrap_err();
    /// drop(b);
    /// assert_eq!(SharedPointer::try_unwrap(a), Ok(3));
    /// ```
    pub fn try_unwrap(this: Self) -> Result<T, Self> {
        let value = this.value;
        match value {
            Some(value) if this.ref_count() == 1 => unsafe {
                let count = this.count;
                mem::forget(this);

                drop(Box::from_raw(count.as_ptr()));
                trace!("unwrapped shared value {:p}", value);
                Ok(*Box::from_raw(value.as_ptr()))
            },
            _ => Err(this),
        }
    }
}

impl<T: ?Sized> SharedPointer<T, Scalar> {
    /// Takes ownership of a boxed value.
    ///
    /// This is how a handle typed for a trait object wraps any implementor:
    ///
    /// ```
    /// use core::fmt::Display;
    /// use shared_pointer::SharedPointer;
    ///
    /// let shown: SharedPointer<dyn Display> = SharedPointer::from_box(Box::new(42));
    /// assert_eq!(shown.to_string(), "42");
    /// ```
    pub fn from_box(value: Box<T>) -> Self {
        Self::from_value(Some(NonNull::from(Box::leak(value))))
    }
}

impl<E> SharedPointer<[E], Array> {
    /// Takes ownership of a heap buffer, released as a whole by the last handle.
    pub fn from_boxed_slice(values: Box<[E]>) -> Self {
        Self::from_value(Some(NonNull::from(Box::leak(values))))
    }
}

impl<T: ?Sized, K: Release<T>> Clone for SharedPointer<T, K> {
    /// Makes another handle to the same value, increasing the shared count.
    #[inline]
    fn clone(&self) -> Self {
        self.counter().add_ref();
        Self { value: self.value, count: self.count, phantom: PhantomData }
    }

    #[inline]
    fn clone_from(&mut self, source: &Self) {
        self.assign(source);
    }
}

impl<T: ?Sized, K: Release<T>> Drop for SharedPointer<T, K> {
    /// Drops the handle.
    ///
    /// The last handle sharing a counter frees the value, if any, and then the counter.
    ///
    /// ```
    /// use std::cell::Cell;
    /// use shared_pointer::SharedPointer;
    ///
    /// struct Foo<'a>(&'a Cell<u32>);
    ///
    /// impl Drop for Foo<'_> {
    ///     fn drop(&mut self) {
    ///         self.0.set(self.0.get() + 1);
    ///     }
    /// }
    ///
    /// let drops = Cell::new(0);
    /// let foo = SharedPointer::new(Foo(&drops));
    /// let foo2 = foo.clone();
    ///
    /// drop(foo);
    /// assert_eq!(drops.get(), 0);
    /// drop(foo2);
    /// assert_eq!(drops.get(), 1);
    /// ```
    fn drop(&mut self) {
        if self.counter().release() != 0 {
            return;
        }

        unsafe {
            if let Some(value) = self.value {
                trace!("releasing shared value {:p}", value);
                K::release(value);
            }
            drop(Box::from_raw(self.count.as_ptr()));
        }
    }
}

impl<T: ?Sized, K: Release<T>> Deref for SharedPointer<T, K> {
    type Target = T;

    /// Panics if the handle is null.
    #[inline]
    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => panic!("dereferenced a null SharedPointer"),
        }
    }
}

impl<T: ?Sized, K: Release<T>> borrow::Borrow<T> for SharedPointer<T, K> {
    fn borrow(&self) -> &T {
        &**self
    }
}

impl<T: ?Sized, K: Release<T>> AsRef<T> for SharedPointer<T, K> {
    fn as_ref(&self) -> &T {
        &**self
    }
}

impl<'a, T: ?Sized, K: Release<T>> Not for &'a SharedPointer<T, K> {
    type Output = bool;

    /// Same as [`SharedPointer::is_null`].
    #[inline]
    fn not(self) -> bool {
        self.is_null()
    }
}

impl<T: ?Sized, K: Release<T>> ReferenceCounted<T> for SharedPointer<T, K> {
    fn reference_count(this: &Self) -> usize {
        this.ref_count()
    }
}

impl<T: ?Sized, K: Release<T>> Default for SharedPointer<T, K> {
    /// Creates a null handle.
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized, K: Release<T>> PartialEq for SharedPointer<T, K> {
    /// Two handles are equal if they share the same value. This implementation
    /// never compares the values themselves.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T: ?Sized, K: Release<T>> Eq for SharedPointer<T, K> {}

impl<T: ?Sized, K: Release<T>> Hash for SharedPointer<T, K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state)
    }
}

impl<T: ?Sized + fmt::Debug, K: Release<T>> fmt::Debug for SharedPointer<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("SharedPointer");
        match self.get() {
            Some(value) => debug.field("value", &value),
            None => debug.field("value", &format_args!("null")),
        };
        debug.field("ref_count", &self.ref_count()).finish()
    }
}

impl<T: ?Sized, K: Release<T>> fmt::Pointer for SharedPointer<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.addr(), f)
    }
}

impl<T> From<T> for SharedPointer<T, Scalar> {
    fn from(t: T) -> Self {
        Self::new(t)
    }
}

impl<T: ?Sized> From<Box<T>> for SharedPointer<T, Scalar> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<E> From<Box<[E]>> for SharedPointer<[E], Array> {
    fn from(values: Box<[E]>) -> Self {
        Self::from_boxed_slice(values)
    }
}

impl<E> From<Vec<E>> for SharedPointer<[E], Array> {
    fn from(values: Vec<E>) -> Self {
        Self::from_boxed_slice(values.into_boxed_slice())
    }
}
