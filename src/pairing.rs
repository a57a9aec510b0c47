//! Pairing heap with forward-only links.
//!
//! A classic child/sibling implementation: no iteration, no decrease-key
//! support, only push / front / pop / merge. Sufficient for the least-N or
//! top-K class of problems.
//!
//! Every node holds its first child (`down`) and its next sibling (`next`).
//! Merge is O(1) actual: the losing root simply becomes the new first child
//! of the winner. `pop` reconstructs the heap from the orphaned child list
//! with the classic two-pass pairing strategy, which is what makes the
//! amortized bounds work out.

use crate::ptrset::PointerSet;
use crate::traits::{check, Compare, HeapError, NaturalOrder};
use std::marker::PhantomData;
use std::ptr::NonNull;

type Link<T> = Option<NonNull<Node<T>>>;

struct Node<T> {
    next: Link<T>,
    down: Link<T>,
    value: T,
}

/// Mergeable min-heap over a multi-way pairing tree.
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::PairingHeap;
///
/// let mut heap: PairingHeap<i32> = PairingHeap::new();
/// heap.push(5);
/// heap.push(1);
/// heap.push(3);
/// assert_eq!(heap.pop(), Some(1));
/// assert_eq!(heap.pop(), Some(3));
/// ```
pub struct PairingHeap<T, C = NaturalOrder> {
    root: Link<T>,
    len: usize,
    cmp: C,
    _phantom: PhantomData<T>,
}

impl<T, C: Default> Default for PairingHeap<T, C> {
    fn default() -> Self {
        PairingHeap {
            root: None,
            len: 0,
            cmp: C::default(),
            _phantom: PhantomData,
        }
    }
}

impl<T, C> Drop for PairingHeap<T, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C> PairingHeap<T, C> {
    /// Creates an empty heap with the default comparator value.
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::default()
    }

    /// Creates an empty heap ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        PairingHeap {
            root: None,
            len: 0,
            cmp,
            _phantom: PhantomData,
        }
    }

    /// Returns true if the heap holds no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of elements in the heap.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Reference to the minimum element, or `None` if the heap is empty.
    pub fn front(&self) -> Option<&T> {
        self.root.map(|n| unsafe { &(*n.as_ptr()).value })
    }

    /// Removes all elements without recursing, whatever shape the tree
    /// degenerated into.
    pub fn clear(&mut self) {
        let mut hold = self.root.take();
        self.len = 0;
        unsafe {
            while let Some(node) = Self::shred_pop(&mut hold) {
                drop(Box::from_raw(node.as_ptr()));
            }
        }
    }

    fn alloc(value: T) -> NonNull<Node<T>> {
        NonNull::from(Box::leak(Box::new(Node {
            next: None,
            down: None,
            value,
        })))
    }

    // two simple helpers to attach nodes in horizontal or vertical order:

    unsafe fn cons(a: Link<T>, b: Link<T>) -> Link<T> {
        match a {
            Some(n) => {
                (*n.as_ptr()).next = b;
                a
            }
            None => b,
        }
    }

    unsafe fn dunk(a: Link<T>, b: Link<T>) -> Link<T> {
        match a {
            Some(n) => {
                (*n.as_ptr()).down = b;
                a
            }
            None => b,
        }
    }

    /// Removes and returns one node from `pref`, leaving `pref` pointing at
    /// the remaining forest.
    ///
    /// Same funnel as the leftist variant: the sibling chain is grafted to
    /// the end of the child chain, which keeps a full serialization at O(n)
    /// strict. The intermediate shapes are no longer pairing trees; once
    /// shredding starts it must run to the end.
    unsafe fn shred_pop(pref: &mut Link<T>) -> Option<NonNull<Node<T>>> {
        let node = (*pref)?;
        let n = node.as_ptr();
        match ((*n).down, (*n).next) {
            (down, None) => *pref = down,
            (None, next) => *pref = next,
            (Some(down), Some(next)) => {
                let mut scan = down;
                while let Some(sib) = (*scan.as_ptr()).next {
                    scan = sib;
                }
                (*scan.as_ptr()).next = Some(next);
                *pref = Some(down);
            }
        }
        (*n).down = None;
        (*n).next = None;
        Some(node)
    }
}

impl<T, C: Compare<T>> PairingHeap<T, C> {
    unsafe fn less(cmp: &C, a: NonNull<Node<T>>, b: NonNull<Node<T>>) -> bool {
        cmp.less(&(*a.as_ptr()).value, &(*b.as_ptr()).value)
    }

    /// Merges two heaps. O(1) actual, the magic of pairing heaps!
    ///
    /// With both heaps present, one becomes a child of the other; `h1` gets
    /// precedence unless that would violate the order constraint. The
    /// winner's own sibling link is cleared, it is a root now.
    unsafe fn merge_nodes(cmp: &C, h1: Link<T>, h2: Link<T>) -> Link<T> {
        let retv = match (h1, h2) {
            (None, h2) => h2,
            (h1, None) => h1,
            (Some(a), Some(b)) => {
                if !Self::less(cmp, b, a) {
                    Self::dunk(Some(a), Self::cons(Some(b), (*a.as_ptr()).down))
                } else {
                    Self::dunk(Some(b), Self::cons(Some(a), (*b.as_ptr()).down))
                }
            }
        };
        if let Some(r) = retv {
            (*r.as_ptr()).next = None;
        }
        retv
    }

    /// Builds one heap from a sibling list of sub-heaps.
    ///
    /// This is the core of the pairing heap algorithm: merge pairs of
    /// siblings from left to right, then combine all the resulting heaps
    /// into one from right to left. The merged pairs are consed onto an
    /// internal stack-as-list, so the reversal comes at no cost.
    unsafe fn build(cmp: &C, mut h: Link<T>) -> Link<T> {
        let mut q: Link<T> = None;
        loop {
            let Some(a) = h else { break };
            let Some(b) = (*a.as_ptr()).next else { break };
            h = (*b.as_ptr()).next;
            q = Self::cons(Self::merge_nodes(cmp, Some(a), Some(b)), q);
        }
        while let Some(a) = q {
            q = (*a.as_ptr()).next;
            h = Self::merge_nodes(cmp, Some(a), h);
        }
        // And that's it. Really.
        h
    }

    /// Inserts `value`. O(1) actual.
    pub fn push(&mut self, value: T) {
        let node = Self::alloc(value);
        unsafe {
            self.root = Self::merge_nodes(&self.cmp, self.root.take(), Some(node));
        }
        self.len += 1;
    }

    /// Removes and returns the minimum element. Amortized O(log n).
    pub fn pop(&mut self) -> Option<T> {
        let root = self.root.take()?;
        unsafe {
            let node = Box::from_raw(root.as_ptr());
            self.root = Self::build(&self.cmp, node.down);
            self.len -= 1;
            Some(node.value)
        }
    }

    /// Absorbs all elements of `other`, leaving it empty. O(1).
    pub fn merge(&mut self, other: &mut Self) {
        let hold = other.root.take();
        unsafe {
            self.root = Self::merge_nodes(&self.cmp, self.root.take(), hold);
        }
        self.len += std::mem::replace(&mut other.len, 0);
    }

    /// Checks everything the forward-only layout can express: heap order
    /// between a node and each member of its child list, and single
    /// reachability of every node (via a pointer set sized for `nodes`).
    pub fn validate(&self, nodes: usize) -> Result<(), HeapError> {
        // The tree forming a pairing heap can be anything below the root:
        // a horizontal list with no children, a vertical chain with no
        // siblings, and everything in between. That keeps life interesting
        // and efficient validation a challenge ;)
        //
        // The trick in managing the work queue is that the tip is always
        // replaced in place by its sibling, unless there is none, in which
        // case the stack shrinks. A node's children are scanned against it
        // the moment the node is processed, and only the head child is
        // pushed. Both degenerate shapes stay at depth 1 this way, and the
        // general bound is the longest left spine.
        let mut set = PointerSet::with_capacity(nodes)?;
        let mut que: Vec<NonNull<Node<T>>> = Vec::new();

        unsafe {
            if let Some(root) = self.root {
                check((*root.as_ptr()).next.is_none(), "root must not have a sibling")?;
                check(
                    set.insert(root.as_ptr() as *const ())?,
                    "root already visited",
                )?;
                que.push(root);
            }

            while let Some(&node) = que.last() {
                let child = (*node.as_ptr()).down;
                match (*node.as_ptr()).next {
                    Some(sib) => *que.last_mut().unwrap() = sib,
                    None => {
                        que.pop();
                    }
                }
                let mut scan = child;
                if scan.is_some() {
                    que.push(child.unwrap());
                }
                while let Some(c) = scan {
                    check(
                        set.insert(c.as_ptr() as *const ())?,
                        "node reached twice",
                    )?;
                    check(!Self::less(&self.cmp, c, node), "heap order")?;
                    scan = (*c.as_ptr()).next;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_pass_build_restores_order() {
        let mut heap: PairingHeap<i32> = PairingHeap::new();
        // ascending pushes pile everything into the root's child list, so
        // the first pop runs two-pass pairing over the full width
        for v in 0..32 {
            heap.push(v);
        }
        heap.validate(64).unwrap();
        for expect in 0..32 {
            assert_eq!(heap.pop(), Some(expect));
            heap.validate(64).unwrap();
        }
    }

    #[test]
    fn degenerate_chain_clears_iteratively() {
        let mut heap: PairingHeap<i32> = PairingHeap::new();
        // descending pushes build a 1-ary chain; clear must not recurse
        for v in (0..50_000).rev() {
            heap.push(v);
        }
        heap.clear();
        assert!(heap.is_empty());
    }
}
