//! Cursor, removal, and key-update tests for the 3-link heap variants.
//!
//! Both addressable variants expose the same handle surface, so the suite
//! is generated once per type. Forward traversal is right-to-left
//! post-order over the current tree shape; the tests never assume a
//! particular visit order, only that every live element shows up exactly
//! once.

use mergeable_heaps::{AddressablePairingHeap, HeapError, MinDistHeap};

macro_rules! cursor_suite {
    ($mod_name:ident, $heap_type:ty, $check:path) => {
        mod $mod_name {
            use super::*;

            #[test]
            fn traversal_reaches_every_node() {
                let mut heap = <$heap_type>::new();
                for v in [1, 3, 5, 2, 4, 6] {
                    heap.push(v);
                }

                let mut count = 0;
                let mut it = heap.begin();
                while !heap.is_end(it) {
                    assert!(count < 6);
                    count += 1;
                    it = heap.succ(it);
                }
                assert_eq!(count, 6);

                let mut seen: Vec<i32> = heap.iter().copied().collect();
                seen.sort_unstable();
                assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
            }

            #[test]
            fn remove_during_traversal() {
                let mut heap = <$heap_type>::new();
                for v in [1, 3, 5, 2, 4, 6] {
                    heap.push(v);
                }

                let mut it = heap.begin();
                while !heap.is_end(it) {
                    if *heap.get(it).unwrap() & 1 == 1 {
                        it = heap.remove(it);
                    } else {
                        it = heap.succ(it);
                    }
                }
                $check(&heap);
                assert_eq!(heap.len(), 3);
                assert_eq!(heap.iter().count(), 3);

                let mut it = heap.end();
                let begin = heap.begin();
                let mut backward = 0;
                while it != begin {
                    it = heap.pred(it).unwrap();
                    backward += 1;
                }
                assert_eq!(backward, 3);

                let mut old = 0;
                let mut count = 0;
                while let Some(v) = heap.pop() {
                    assert_eq!(old + 2, v);
                    old = v;
                    count += 1;
                }
                assert_eq!(count, 3);
            }

            #[test]
            fn reverse_traversal_round_trip() {
                let mut heap = <$heap_type>::new();
                for v in [1, 3, 5, 2, 4, 6] {
                    heap.push(v);
                }

                let mut it = heap.end();
                let begin = heap.begin();
                let mut seen = Vec::new();
                while it != begin {
                    it = heap.pred(it).unwrap();
                    seen.push(*heap.get(it).unwrap());
                }
                assert_eq!(seen.len(), 6);
                seen.sort_unstable();
                assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);

                assert_eq!(heap.pred(it).unwrap_err(), HeapError::OutOfRange);
            }

            #[test]
            fn reverse_traversal_after_erase() {
                let mut heap = <$heap_type>::new();
                for v in 0..100 {
                    heap.push(v);
                }

                // erase the odd values during forward traversal
                let mut it = heap.begin();
                while !heap.is_end(it) {
                    if *heap.get(it).unwrap() & 1 == 1 {
                        it = heap.remove(it);
                    } else {
                        it = heap.succ(it);
                    }
                }
                $check(&heap);

                // now reverse-iterate from the end position
                let mut it = heap.end();
                let begin = heap.begin();
                let mut count = 0;
                while it != begin {
                    it = heap.pred(it).unwrap();
                    assert_eq!(*heap.get(it).unwrap() & 1, 0);
                    count += 1;
                }
                assert_eq!(count, 50);
            }

            #[test]
            fn decrease_lifts_value_to_front() {
                let mut heap = <$heap_type>::new();
                let handle = heap.push(10);
                for v in [7, 9, 8] {
                    heap.push(v);
                }

                *heap.get_mut(handle).unwrap() = 2;
                heap.decrease(handle);
                $check(&heap);
                assert_eq!(heap.front(), Some(&2));
                assert_eq!(heap.get(handle), Some(&2));
            }

            #[test]
            fn decrease_is_monotone_at_the_front() {
                let mut heap = <$heap_type>::new();
                let mut handles = Vec::new();
                for v in 0..40 {
                    handles.push(heap.push(v * 10 + 5));
                }

                for (i, &handle) in handles.iter().enumerate().step_by(3) {
                    let before = *heap.front().unwrap();
                    *heap.get_mut(handle).unwrap() = i as i32;
                    heap.decrease(handle);
                    assert!(*heap.front().unwrap() <= before);
                    $check(&heap);
                }

                let mut prev = i32::MIN;
                while let Some(v) = heap.pop() {
                    assert!(v >= prev);
                    prev = v;
                }
            }

            #[test]
            fn decrease_on_the_root_is_a_no_op() {
                let mut heap = <$heap_type>::new();
                let handle = heap.push(1);
                heap.push(5);

                *heap.get_mut(handle).unwrap() = 0;
                heap.decrease(handle);
                $check(&heap);
                assert_eq!(heap.pop(), Some(0));
                assert_eq!(heap.pop(), Some(5));
            }

            #[test]
            fn readjust_handles_increase_and_decrease() {
                let mut heap = <$heap_type>::new();
                let up = heap.push(1);
                let down = heap.push(50);
                for v in [20, 30, 40] {
                    heap.push(v);
                }

                *heap.get_mut(up).unwrap() = 35;
                heap.readjust(up);
                $check(&heap);

                *heap.get_mut(down).unwrap() = 10;
                heap.readjust(down);
                $check(&heap);

                let drained: Vec<i32> = std::iter::from_fn(|| heap.pop()).collect();
                assert_eq!(drained, vec![10, 20, 30, 35, 40]);
            }

            #[test]
            fn remove_returns_the_successor() {
                let mut heap = <$heap_type>::new();
                for v in 0..10 {
                    heap.push(v);
                }

                // removing through the returned successor visits what is
                // left exactly once
                let mut remaining = 10;
                let mut it = heap.begin();
                while !heap.is_end(it) {
                    it = heap.remove(it);
                    remaining -= 1;
                    assert_eq!(heap.len(), remaining);
                }
                assert!(heap.is_empty());
            }

            #[test]
            fn remove_the_front() {
                let mut heap = <$heap_type>::new();
                let front = heap.push(1);
                for v in [4, 2, 3] {
                    heap.push(v);
                }

                heap.remove(front);
                $check(&heap);
                assert_eq!(heap.len(), 3);
                let drained: Vec<i32> = std::iter::from_fn(|| heap.pop()).collect();
                assert_eq!(drained, vec![2, 3, 4]);
            }

            #[test]
            fn end_positions_compare_equal() {
                let mut heap = <$heap_type>::new();
                assert!(heap.begin() == heap.end());
                assert!(heap.is_end(heap.begin()));
                assert_eq!(heap.get(heap.end()), None);

                heap.push(1);
                assert!(heap.begin() != heap.end());
                assert!(heap.succ(heap.begin()) == heap.end());
                // the end position is its own successor
                assert!(heap.succ(heap.end()) == heap.end());

                // end positions of distinct heaps are one logical position
                let other = <$heap_type>::new();
                assert!(heap.end() == other.end());
            }

            #[test]
            fn traversal_survives_a_mid_walk_update() {
                let mut heap = <$heap_type>::new();
                let mut handles = Vec::new();
                for v in 0..20 {
                    handles.push(heap.push(v));
                }

                // a structural change distorts the walk but must not break
                // stepping or lose the heap's consistency
                let mut it = heap.begin();
                let mut steps = 0;
                while !heap.is_end(it) && steps < 5 {
                    it = heap.succ(it);
                    steps += 1;
                }
                *heap.get_mut(handles[19]).unwrap() = -1;
                heap.decrease(handles[19]);
                while !heap.is_end(it) {
                    assert!(heap.get(it).is_some());
                    it = heap.succ(it);
                }
                $check(&heap);
                assert_eq!(heap.pop(), Some(-1));
            }
        }
    };
}

fn check_mindist(heap: &MinDistHeap<i32>) {
    heap.validate().unwrap();
}

fn check_addressable(heap: &AddressablePairingHeap<i32>) {
    heap.validate().unwrap();
}

cursor_suite!(mindist_cursors, MinDistHeap<i32>, super::check_mindist);
cursor_suite!(
    addressable_pairing_cursors,
    AddressablePairingHeap<i32>,
    super::check_addressable
);

// ============================================================================
// Variant-specific scenarios
// ============================================================================

#[test]
fn mindist_batch_then_traverse() {
    let mut heap: MinDistHeap<i32> = MinDistHeap::new();
    heap.push_many([1, 3, 5, 2, 4, 6]);

    let mut count = 0;
    let mut it = heap.begin();
    while !heap.is_end(it) {
        count += 1;
        it = heap.succ(it);
    }
    assert_eq!(count, 6);

    for v in 1..=6 {
        assert_eq!(heap.pop(), Some(v));
    }
}

#[test]
fn pairing_hundred_remove_odds_reverse() {
    let mut heap: AddressablePairingHeap<i32> = AddressablePairingHeap::new();
    for v in 0..100 {
        heap.push(v);
    }

    let mut it = heap.begin();
    while !heap.is_end(it) {
        if *heap.get(it).unwrap() & 1 == 1 {
            it = heap.remove(it);
        } else {
            it = heap.succ(it);
        }
    }

    let mut it = heap.end();
    let begin = heap.begin();
    let mut evens = 0;
    while it != begin {
        it = heap.pred(it).unwrap();
        assert_eq!(*heap.get(it).unwrap() & 1, 0);
        evens += 1;
    }
    assert_eq!(evens, 50);
}
