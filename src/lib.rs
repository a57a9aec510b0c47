//! Mergeable min-heap data structures over pointer-linked trees.
//!
//! This crate provides two heap families in two node shapes each:
//!
//! | Container | Links per node | Supports |
//! |---|---|---|
//! | [`LeftistHeap`] | 2 (children) | push, batch build, front, pop, merge |
//! | [`PairingHeap`] | 2 (child + sibling) | push, front, pop, merge |
//! | [`MinDistHeap`] | 3 (children + parent) | + cursors, remove, decrease, readjust, batch build |
//! | [`AddressablePairingHeap`] | 3 (child + sibling + back link) | + cursors, remove, decrease, readjust |
//!
//! The 2-link variants are lean queues for the least-N / top-K class of
//! problems. The 3-link variants spend one extra pointer per node and get
//! handle-addressable elements in return: O(1) `decrease`, in-place
//! `remove`, `readjust` after an arbitrary key change, and bidirectional
//! iteration in structural order.
//!
//! All four are min-heaps under a [`Compare`] strategy fixed at
//! construction ([`NaturalOrder`], i.e. `Ord`, by default), all support
//! O(log n)-or-better `merge`, and all destroy and validate their trees
//! without native recursion, so degenerate shapes of any depth are safe.
//!
//! # Example
//!
//! ```rust
//! use mergeable_heaps::MinDistHeap;
//!
//! let mut heap: MinDistHeap<i32> = MinDistHeap::new();
//! heap.push_many([5, 1, 3]);
//! let handle = heap.push(10);
//! *heap.get_mut(handle).unwrap() = 0;
//! heap.decrease(handle);
//! assert_eq!(heap.pop(), Some(0));
//! assert_eq!(heap.pop(), Some(1));
//! ```
//!
//! # Thread safety
//!
//! The containers are single-threaded by construction (their node pointers
//! make them `!Send`/`!Sync`). Even operations that look read-only may
//! shuffle the tree, so concurrent use must be synchronized externally.

pub mod addressable_pairing;
pub mod leftist;
pub mod mindist;
pub mod pairing;
pub mod ptrset;
pub mod traits;

pub use addressable_pairing::{AddressablePairingHeap, PairingHandle};
pub use leftist::LeftistHeap;
pub use mindist::{MinDistHandle, MinDistHeap};
pub use pairing::PairingHeap;
pub use ptrset::PointerSet;
pub use traits::{Compare, HeapError, NaturalOrder};
