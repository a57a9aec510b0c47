//! Leftist heap with children-only links.
//!
//! A classic two-pointer implementation: no iteration, no decrease-key
//! support, only push / multi-push / front / pop / merge. Each node carries
//! its *leaf distance* (null-path length), and the leftist invariant keeps
//! the right spine short:
//!
//! - `dist = 1 + min(dist of children)`, an absent child counting as 0
//! - `right.dist <= left.dist` for every node
//!
//! Merging walks only the right spines, so `push`, `pop` and `merge` are all
//! O(log n). [`LeftistHeap::push_many`] builds a heap from a batch in O(n).

use crate::ptrset::PointerSet;
use crate::traits::{check, Compare, HeapError, NaturalOrder};
use std::collections::BinaryHeap;
use std::marker::PhantomData;
use std::ptr::NonNull;

type Link<T> = Option<NonNull<Node<T>>>;

struct Node<T> {
    left: Link<T>,
    right: Link<T>,
    /// leaf distance: 1 + min of the children's dist, absent child = 0
    dist: u16,
    value: T,
}

/// Mergeable min-heap with the leftist balancing rule.
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::LeftistHeap;
///
/// let mut heap: LeftistHeap<i32> = LeftistHeap::new();
/// heap.push_many([5, 1, 3]);
/// assert_eq!(heap.front(), Some(&1));
/// assert_eq!(heap.pop(), Some(1));
/// assert_eq!(heap.pop(), Some(3));
/// ```
pub struct LeftistHeap<T, C = NaturalOrder> {
    root: Link<T>,
    len: usize,
    cmp: C,
    _phantom: PhantomData<T>,
}

impl<T, C: Default> Default for LeftistHeap<T, C> {
    fn default() -> Self {
        LeftistHeap {
            root: None,
            len: 0,
            cmp: C::default(),
            _phantom: PhantomData,
        }
    }
}

impl<T, C> Drop for LeftistHeap<T, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C> LeftistHeap<T, C> {
    /// Creates an empty heap with the default comparator value.
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::default()
    }

    /// Creates an empty heap ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        LeftistHeap {
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

    /// Removes all elements.
    ///
    /// Destruction is serialized through [`Self::shred_pop`], so arbitrarily
    /// deep trees are released without recursing.
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
            left: None,
            right: None,
            dist: 1,
            value,
        })))
    }

    /// Resets a node to a one-element heap.
    unsafe fn singleton(node: NonNull<Node<T>>) -> NonNull<Node<T>> {
        let n = node.as_ptr();
        (*n).left = None;
        (*n).right = None;
        (*n).dist = 1;
        node
    }

    /// Removes and returns one node from `pref`, leaving `pref` pointing at
    /// the remaining forest.
    ///
    /// This is a "tree funnel": for the node at the root position, the root
    /// is replaced by a tree where the right child is grafted to the end of
    /// the right spine of the left subtree. That serializes the tree in O(1)
    /// amortized per node and O(n) strict for the whole tree. (And since
    /// this is a leftist heap, the end of the right spine is reached soon!)
    ///
    /// While every shredding step yields a new binary tree, that tree has no
    /// structural bounds; once shredding starts, it must run to the end.
    unsafe fn shred_pop(pref: &mut Link<T>) -> Option<NonNull<Node<T>>> {
        let node = (*pref)?;
        let n = node.as_ptr();
        match ((*n).left, (*n).right) {
            (left, None) => *pref = left,
            (None, right) => *pref = right,
            (Some(left), Some(right)) => {
                let mut scan = left;
                while let Some(next) = (*scan.as_ptr()).right {
                    scan = next;
                }
                (*scan.as_ptr()).right = Some(right);
                *pref = Some(left);
            }
        }
        Some(Self::singleton(node))
    }
}

impl<T, C: Compare<T>> LeftistHeap<T, C> {
    unsafe fn less(cmp: &C, a: NonNull<Node<T>>, b: NonNull<Node<T>>) -> bool {
        cmp.less(&(*a.as_ptr()).value, &(*b.as_ptr()).value)
    }

    /// Merges two trees along their right spines. O(log n).
    ///
    /// The recursion depth is bounded by the right-spine lengths, which the
    /// leftist invariant keeps logarithmic in the combined size.
    unsafe fn merge_nodes(cmp: &C, h1: Link<T>, h2: Link<T>) -> Link<T> {
        let (h1, h2) = if h1.is_none() { (h2, h1) } else { (h1, h2) };
        let Some(top) = h1 else { return None };
        let Some(other) = h2 else { return Some(top) };

        let (top, other) = if Self::less(cmp, other, top) {
            (other, top)
        } else {
            (top, other)
        };
        let t = top.as_ptr();
        (*t).right = Self::merge_nodes(cmp, (*t).right, Some(other));
        let rd = (*t).right.map_or(0, |r| (*r.as_ptr()).dist);
        let ld = (*t).left.map_or(0, |l| (*l.as_ptr()).dist);
        if (*t).left.is_none() || rd > ld {
            std::mem::swap(&mut (*t).left, &mut (*t).right);
        }
        (*t).dist = (*t).right.map_or(0, |r| (*r.as_ptr()).dist) + 1;
        Some(top)
    }

    /// Inserts `value`. Amortized O(log n).
    pub fn push(&mut self, value: T) {
        let node = Self::alloc(value);
        unsafe {
            self.root = Self::merge_nodes(&self.cmp, self.root.take(), Some(node));
        }
        self.len += 1;
    }

    /// Builds a heap from a batch of elements in O(n) and merges it in.
    ///
    /// The batch is paired bottom-up through a fixed "hedge" array indexed
    /// by merge rank: slot k holds a tree made of 2^k inputs, or is empty.
    /// Each fresh singleton is merged into slot 0; a collision cascades
    /// upward like binary addition. The hedge has one slot per pointer bit,
    /// and the rank saturates at the top slot, so the build stays O(n) for
    /// any batch a real machine can address.
    pub fn push_many<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        const LIMIT: usize = usize::BITS as usize;

        // chain singletons through the right slot
        let mut head: Link<T> = None;
        let mut count = 0usize;
        for value in values {
            let node = Self::alloc(value);
            unsafe {
                (*node.as_ptr()).right = head;
            }
            head = Some(node);
            count += 1;
        }

        unsafe {
            // Phase I: construct the hedge, bottom-up
            let mut hedge: [Link<T>; LIMIT] = [None; LIMIT];
            let mut hsize = 0usize;
            while let Some(node) = head {
                head = (*node.as_ptr()).right;
                let mut tree = Some(Self::singleton(node));
                let mut hidx = 0usize;
                while hidx < hsize && hedge[hidx].is_some() {
                    tree = Self::merge_nodes(&self.cmp, hedge[hidx].take(), tree);
                    hidx += 1;
                }
                if hidx < hsize {
                    hedge[hidx] = tree;
                } else if hsize < LIMIT {
                    hedge[hsize] = tree;
                    hsize += 1;
                } else {
                    hedge[LIMIT - 1] = tree;
                }
            }

            // Phase II: combine all trees left in the hedge
            let mut built: Link<T> = None;
            for slot in hedge[..hsize].iter_mut() {
                if slot.is_some() {
                    built = Self::merge_nodes(&self.cmp, slot.take(), built);
                }
            }

            // Phase III: merge the created heap with the existing heap
            self.root = Self::merge_nodes(&self.cmp, self.root.take(), built);
        }
        self.len += count;
    }

    /// Removes and returns the minimum element.
    pub fn pop(&mut self) -> Option<T> {
        let root = self.root.take()?;
        unsafe {
            let node = Box::from_raw(root.as_ptr());
            self.root = Self::merge_nodes(&self.cmp, node.left, node.right);
            self.len -= 1;
            Some(node.value)
        }
    }

    /// Absorbs all elements of `other`, leaving it empty. O(log n).
    pub fn merge(&mut self, other: &mut Self) {
        let hold = other.root.take();
        unsafe {
            self.root = Self::merge_nodes(&self.cmp, self.root.take(), hold);
        }
        self.len += std::mem::replace(&mut other.len, 0);
    }

    /// Checks every structural invariant the two-pointer layout can express:
    /// heap order between each node and its children, single reachability
    /// of every node, and the leftist distance rules.
    ///
    /// `nodes` is an upper bound on the node count, used to size the
    /// pointer set that detects cross-links.
    pub fn validate(&self, nodes: usize) -> Result<(), HeapError> {
        // Full traversal of a leftist heap with forward pointers only is
        // tricky, as the nesting can be VERY deep. We use a trick here that
        // sounds a bit like a chicken-egg problem, but is actually not:
        //
        //   >> We use a PRIORITY QUEUE to enumerate nodes of a PRIORITY QUEUE! <<
        //
        // The queue used in traversal is ordered by LEAF DISTANCE, and we
        // always proceed with the node having the smallest leaf distance.
        // A plain stack that descends the light side first does not help: a
        // short right spine does not prevent a very heavy left child below.
        // The distance-ordered queue continues along the shortest currently
        // available path, always, which keeps its length near the minimum
        // possible depth.
        struct Frontier<T>(u16, NonNull<Node<T>>);
        impl<T> PartialEq for Frontier<T> {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl<T> Eq for Frontier<T> {}
        impl<T> PartialOrd for Frontier<T> {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl<T> Ord for Frontier<T> {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                // smallest leaf distance first
                other.0.cmp(&self.0)
            }
        }

        let mut set = PointerSet::with_capacity(nodes)?;
        let mut que: BinaryHeap<Frontier<T>> = BinaryHeap::new();

        unsafe {
            if let Some(root) = self.root {
                check(
                    set.insert(root.as_ptr() as *const ())?,
                    "root already visited",
                )?;
                que.push(Frontier((*root.as_ptr()).dist, root));
            }

            while let Some(Frontier(_, node)) = que.pop() {
                let n = node.as_ptr();
                let mut wlc = 0u16;
                let mut wrc = 0u16;

                if let Some(left) = (*n).left {
                    check(
                        set.insert(left.as_ptr() as *const ())?,
                        "left child reached twice",
                    )?;
                    check(!Self::less(&self.cmp, left, node), "heap order (left child)")?;
                    wlc = (*left.as_ptr()).dist;
                    que.push(Frontier(wlc, left));
                }

                if let Some(right) = (*n).right {
                    check(
                        set.insert(right.as_ptr() as *const ())?,
                        "right child reached twice",
                    )?;
                    check(
                        !Self::less(&self.cmp, right, node),
                        "heap order (right child)",
                    )?;
                    wrc = (*right.as_ptr()).dist;
                    que.push(Frontier(wrc, right));
                }

                check(wrc <= wlc, "leftist order of children")?;
                check((*n).dist == wrc + 1, "leaf distance")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hedge_build_matches_incremental() {
        let values = [9, 4, 7, 1, 8, 2, 6, 3, 5, 0];
        let mut a: LeftistHeap<i32> = LeftistHeap::new();
        let mut b: LeftistHeap<i32> = LeftistHeap::new();
        for v in values {
            a.push(v);
        }
        b.push_many(values);
        a.validate(16).unwrap();
        b.validate(16).unwrap();
        for expect in 0..10 {
            assert_eq!(a.pop(), Some(expect));
            assert_eq!(b.pop(), Some(expect));
        }
        assert!(a.is_empty() && b.is_empty());
    }

    #[test]
    fn shred_releases_every_node() {
        let mut heap: LeftistHeap<String> = LeftistHeap::new();
        heap.push_many((0..100).map(|i| format!("v{i:03}")));
        assert_eq!(heap.len(), 100);
        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);
        assert_eq!(heap.front(), None);
    }

    #[test]
    fn push_many_on_loaded_heap() {
        let mut heap: LeftistHeap<i32> = LeftistHeap::new();
        heap.push(10);
        heap.push(-3);
        heap.push_many([7, -1, 4]);
        heap.validate(8).unwrap();
        assert_eq!(heap.len(), 5);
        let drained: Vec<i32> = std::iter::from_fn(|| heap.pop()).collect();
        assert_eq!(drained, vec![-3, -1, 4, 7, 10]);
    }
}
