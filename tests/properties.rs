use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use shared_pointer::SharedPointer;

struct Tracked(Rc<Cell<usize>>);

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[derive(Debug, Clone)]
enum Op {
    New,
    Null,
    Clone(usize),
    Drop(usize),
    Assign(usize, usize),
    Swap(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::New),
        Just(Op::Null),
        any::<usize>().prop_map(Op::Clone),
        any::<usize>().prop_map(Op::Drop),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Assign(a, b)),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Swap(a, b)),
    ]
}

fn distinct_values(handles: &[SharedPointer<Tracked>]) -> usize {
    let mut seen: Vec<&SharedPointer<Tracked>> = Vec::new();
    for h in handles.iter().filter(|h| !h.is_null()) {
        if !seen.iter().any(|s| SharedPointer::ptr_eq(*s, h)) {
            seen.push(h);
        }
    }
    seen.len()
}

proptest! {
    #[test]
    fn counts_match_live_handles(ops in proptest::collection::vec(op(), 0..64)) {
        let drops = Rc::new(Cell::new(0));
        let mut created = 0;
        let mut handles: Vec<SharedPointer<Tracked>> = Vec::new();

        for op in ops {
            let len = handles.len();
            match op {
                Op::New => {
                    created += 1;
                    handles.push(SharedPointer::new(Tracked(Rc::clone(&drops))));
                }
                Op::Null => handles.push(SharedPointer::null()),
                Op::Clone(i) if len > 0 => {
                    let h = handles[i % len].clone();
                    handles.push(h);
                }
                Op::Drop(i) if len > 0 => {
                    handles.swap_remove(i % len);
                }
                Op::Assign(i, j) if len > 0 => {
                    let rhs = handles[j % len].clone();
                    handles[i % len].assign(&rhs);
                }
                Op::Swap(i, j) if len > 1 && i % len != j % len => {
                    let (i, j) = (i % len, j % len);
                    let (lo, hi) = (i.min(j), i.max(j));
                    let (left, right) = handles.split_at_mut(hi);
                    left[lo].swap(&mut right[0]);
                }
                _ => {}
            }

            for h in handles.iter().filter(|h| !h.is_null()) {
                let sharing = handles.iter().filter(|o| SharedPointer::ptr_eq(*o, h)).count();
                prop_assert_eq!(h.ref_count(), sharing);
            }
            prop_assert_eq!(drops.get(), created - distinct_values(&handles));
        }

        drop(handles);
        prop_assert_eq!(drops.get(), created);
    }
}
