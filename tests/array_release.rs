//! Runs in its own test binary because it installs a counting global allocator.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use shared_pointer::{Array, SharedPointer};

/// An element size no other allocation in this binary is expected to use.
const ELEMENT_SIZE: usize = 4093;
const LEN: usize = 3;

struct CountingAllocator;

static BUFFER_DEALLOCS: AtomicUsize = AtomicUsize::new(0);
static ELEMENT_DROPS: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if layout.size() == ELEMENT_SIZE * LEN && layout.align() == 1 {
            BUFFER_DEALLOCS.fetch_add(1, Ordering::SeqCst);
        }
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

struct Element {
    _payload: [u8; ELEMENT_SIZE],
}

impl Drop for Element {
    fn drop(&mut self) {
        ELEMENT_DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn array_buffer_released_once() {
    let elements: Vec<Element> = (0..LEN)
        .map(|_| Element { _payload: [0; ELEMENT_SIZE] })
        .collect();

    let before = BUFFER_DEALLOCS.load(Ordering::SeqCst);

    let a: SharedPointer<[Element], Array> = SharedPointer::from(elements);
    let b = a.clone();
    let mut c: SharedPointer<[Element], Array> = SharedPointer::null();
    c.assign(&b);

    assert_eq!(a.len(), LEN);
    assert_eq!(c.ref_count(), 3);

    drop(a);
    drop(b);
    assert_eq!(ELEMENT_DROPS.load(Ordering::SeqCst), 0);
    assert_eq!(BUFFER_DEALLOCS.load(Ordering::SeqCst), before);

    drop(c);
    assert_eq!(ELEMENT_DROPS.load(Ordering::SeqCst), LEN);
    assert_eq!(BUFFER_DEALLOCS.load(Ordering::SeqCst), before + 1);

    let empty: SharedPointer<[Element], Array> = SharedPointer::from(Vec::new());
    assert!(!empty.is_null());
    assert_eq!(empty.len(), 0);
}
