//! Minimum-leaf-distance balanced heap with parent pointers.
//!
//! This is a leftist heap gone symmetric: while in a leftist heap the right
//! child of a node has no greater leaf distance than the left child, we do
//! not maintain that restriction. We just make sure that whenever a subtree
//! has to be merged below a node, we merge into the *lighter* side. This
//! comes at only moderate additional complexity, but it results in much less
//! distortion of iteration: with a leftist heap, any node may flip sides in
//! its parent along the right spine, on any operation.
//!
//! The third pointer per node (the parent link) buys:
//!
//! - bidirectional iteration in structural order ([`MinDistHeap::begin`],
//!   [`MinDistHeap::succ`], [`MinDistHeap::pred`])
//! - in-place removal through a handle ([`MinDistHeap::remove`])
//! - O(1) subtree cuts, so [`MinDistHeap::decrease`] and
//!   [`MinDistHeap::readjust`] restore heap order without a rebuild
//!
//! The container embeds a permanent sentinel: a node-shaped record whose
//! left slot holds the real root. Iteration treats the null parent link as
//! the end marker, so an "end" position from any heap compares equal to any
//! other.

use crate::traits::{check, Compare, HeapError, NaturalOrder};
use std::collections::BinaryHeap;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

type Link = Option<NonNull<Links>>;

/// Untyped link record. The topology code works on these alone; the value
/// lives in the [`Node`] wrapper and is only touched where elements are
/// compared, created, or destroyed.
struct Links {
    left: Link,
    right: Link,
    up: Link,
    /// leaf distance: 1 + min of the children's dist, absent child = 0
    dist: u16,
}

impl Links {
    const fn detached() -> Self {
        Links {
            left: None,
            right: None,
            up: None,
            dist: 1,
        }
    }
}

// `links` must stay the first field: node pointers are passed around as
// `NonNull<Links>` and cast back to `Node<T>` for value access.
#[repr(C)]
struct Node<T> {
    links: Links,
    value: T,
}

fn alloc<T>(value: T) -> NonNull<Links> {
    NonNull::from(Box::leak(Box::new(Node {
        links: Links::detached(),
        value,
    })))
    .cast()
}

unsafe fn dealloc<T>(node: NonNull<Links>) {
    drop(Box::from_raw(node.cast::<Node<T>>().as_ptr()));
}

unsafe fn value_ref<'a, T>(node: NonNull<Links>) -> &'a T {
    &(*node.cast::<Node<T>>().as_ptr()).value
}

unsafe fn value_mut<'a, T>(node: NonNull<Links>) -> &'a mut T {
    &mut (*node.cast::<Node<T>>().as_ptr()).value
}

unsafe fn dist_of(link: Link) -> u16 {
    match link {
        Some(n) => (*n.as_ptr()).dist,
        None => 0,
    }
}

/// Finds the first structural-order descendant of `node`: enter the left
/// slot once (for the sentinel that is the root slot), then keep descending,
/// preferring the right child. The name describes the motion.
unsafe fn abseil(node: NonNull<Links>) -> NonNull<Links> {
    let mut node = node;
    let mut next = (*node.as_ptr()).left;
    while let Some(n) = next {
        node = n;
        next = match (*n.as_ptr()).right {
            Some(right) => Some(right),
            None => (*n.as_ptr()).left,
        };
    }
    node
}

/// One forward step of right-to-left post-order traversal. The sentinel
/// (null parent link) is its own successor.
unsafe fn iter_succ(node: NonNull<Links>) -> NonNull<Links> {
    match (*node.as_ptr()).up {
        Some(parent) => {
            if (*parent.as_ptr()).right == Some(node) {
                abseil(parent)
            } else {
                parent
            }
        }
        None => node,
    }
}

/// One backward step; fails with [`HeapError::OutOfRange`] when stepping
/// before the first position.
unsafe fn iter_pred(node: NonNull<Links>) -> Result<NonNull<Links>, HeapError> {
    if let Some(left) = (*node.as_ptr()).left {
        return Ok(left);
    }
    if let Some(right) = (*node.as_ptr()).right {
        return Ok(right);
    }
    let mut cur = node;
    let mut prev = (*node.as_ptr()).up;
    while let Some(p) = prev {
        let sibling = (*p.as_ptr()).right;
        if sibling != Some(cur) {
            if let Some(s) = sibling {
                return Ok(s);
            }
        }
        cur = p;
        prev = (*p.as_ptr()).up;
    }
    Err(HeapError::OutOfRange)
}

/// Surrenders one node from `pref` and leaves `pref` pointing at the rest.
///
/// The trick for *efficient* destructive enumeration is quickly finding a
/// link where the children of the ripped node can be stored. With a parent
/// pointer available we can (ab)use it as the next-to-process stack, making
/// the effort O(1) actual per step. Of course this warps the structure into
/// something that violates every assumption of the tree, so once ripping has
/// started, it has to be done to the end!
unsafe fn shred_pop(pref: &mut Link) -> Option<NonNull<Links>> {
    let node = (*pref)?;
    *pref = (*node.as_ptr()).up;
    for hold in [(*node.as_ptr()).left, (*node.as_ptr()).right] {
        if let Some(h) = hold {
            (*h.as_ptr()).up = *pref;
            *pref = Some(h);
        }
    }
    Some(node)
}

/// Position in a [`MinDistHeap`], handed out by `push` and the cursor
/// methods.
///
/// Handles are plain positions: copying them is free and they never own the
/// element. A handle stays usable as long as its node stays in the heap;
/// using a handle after the node was removed (or after the heap dropped it)
/// is undefined behavior, exactly like a dangling iterator. Structural
/// mutations distort the traversal order seen through old handles but keep
/// them safe to step.
///
/// All end positions compare equal, regardless of which traversal produced
/// them.
pub struct MinDistHandle<T> {
    node: NonNull<Links>,
    _phantom: PhantomData<*mut T>,
}

impl<T> MinDistHandle<T> {
    fn new(node: NonNull<Links>) -> Self {
        MinDistHandle {
            node,
            _phantom: PhantomData,
        }
    }
}

impl<T> Clone for MinDistHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for MinDistHandle<T> {}

impl<T> PartialEq for MinDistHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
            || unsafe {
                (*self.node.as_ptr()).up.is_none() && (*other.node.as_ptr()).up.is_none()
            }
    }
}
impl<T> Eq for MinDistHandle<T> {}

impl<T> fmt::Debug for MinDistHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MinDistHandle").field(&self.node).finish()
    }
}

/// Mergeable min-heap with parent pointers, cursors, and in-place updates.
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::MinDistHeap;
///
/// let mut heap: MinDistHeap<i32> = MinDistHeap::new();
/// let handle = heap.push(10);
/// heap.push(4);
/// *heap.get_mut(handle).unwrap() = 2;
/// heap.decrease(handle);
/// assert_eq!(heap.front(), Some(&2));
/// ```
pub struct MinDistHeap<T, C = NaturalOrder> {
    /// the root holder & end sentinel; boxed so node parent links survive
    /// moves of the container itself
    root: Box<Links>,
    len: usize,
    cmp: C,
    _phantom: PhantomData<T>,
}

impl<T, C: Default> Default for MinDistHeap<T, C> {
    fn default() -> Self {
        MinDistHeap {
            root: Box::new(Links::detached()),
            len: 0,
            cmp: C::default(),
            _phantom: PhantomData,
        }
    }
}

impl<T, C> Drop for MinDistHeap<T, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C> MinDistHeap<T, C> {
    /// Creates an empty heap with the default comparator value.
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::default()
    }

    /// Creates an empty heap ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        MinDistHeap {
            root: Box::new(Links::detached()),
            len: 0,
            cmp,
            _phantom: PhantomData,
        }
    }

    /// Returns true if the heap holds no elements.
    pub fn is_empty(&self) -> bool {
        self.root.left.is_none()
    }

    /// Number of elements in the heap.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Reference to the minimum element, or `None` if the heap is empty.
    pub fn front(&self) -> Option<&T> {
        self.root.left.map(|n| unsafe { value_ref::<T>(n) })
    }

    fn sentinel(&self) -> NonNull<Links> {
        NonNull::from(&*self.root)
    }

    /// Cuts the whole tree off the sentinel.
    fn take_root(&mut self) -> Link {
        let temp = self.root.left.take();
        if let Some(t) = temp {
            unsafe {
                (*t.as_ptr()).up = None;
            }
        }
        temp
    }

    /// Removes all elements. Serialized through [`shred_pop`], so depth
    /// never becomes a problem.
    pub fn clear(&mut self) {
        let mut hold = self.take_root();
        self.len = 0;
        unsafe {
            while let Some(node) = shred_pop(&mut hold) {
                dealloc::<T>(node);
            }
        }
    }

    /// First position of forward traversal; equals [`Self::end`] on an
    /// empty heap.
    pub fn begin(&self) -> MinDistHandle<T> {
        MinDistHandle::new(unsafe { abseil(self.sentinel()) })
    }

    /// The end position. Identified by its null parent link, not by
    /// address, so end positions of different heaps compare equal.
    pub fn end(&self) -> MinDistHandle<T> {
        MinDistHandle::new(self.sentinel())
    }

    /// True iff `handle` is an end position.
    pub fn is_end(&self, handle: MinDistHandle<T>) -> bool {
        unsafe { (*handle.node.as_ptr()).up.is_none() }
    }

    /// Forward step (right-to-left post-order). The end position is its own
    /// successor.
    pub fn succ(&self, handle: MinDistHandle<T>) -> MinDistHandle<T> {
        MinDistHandle::new(unsafe { iter_succ(handle.node) })
    }

    /// Backward step (left-to-right pre-order). Stepping before
    /// [`Self::begin`] fails with [`HeapError::OutOfRange`].
    pub fn pred(&self, handle: MinDistHandle<T>) -> Result<MinDistHandle<T>, HeapError> {
        unsafe { iter_pred(handle.node).map(MinDistHandle::new) }
    }

    /// The element at `handle`, or `None` for the end position.
    pub fn get(&self, handle: MinDistHandle<T>) -> Option<&T> {
        unsafe {
            if (*handle.node.as_ptr()).up.is_none() {
                None
            } else {
                Some(value_ref::<T>(handle.node))
            }
        }
    }

    /// Mutable element access. Changing the order-relevant part of a value
    /// must be followed by [`Self::decrease`] or [`Self::readjust`] before
    /// any other heap operation.
    pub fn get_mut(&mut self, handle: MinDistHandle<T>) -> Option<&mut T> {
        unsafe {
            if (*handle.node.as_ptr()).up.is_none() {
                None
            } else {
                Some(value_mut::<T>(handle.node))
            }
        }
    }

    /// Iterates the elements in structural order (not heap order).
    pub fn iter(&self) -> MinDistIter<'_, T> {
        MinDistIter {
            pos: unsafe { abseil(self.sentinel()) },
            _phantom: PhantomData,
        }
    }
}

impl<T, C: Compare<T>> MinDistHeap<T, C> {
    unsafe fn less(cmp: &C, a: NonNull<Links>, b: NonNull<Links>) -> bool {
        cmp.less(value_ref::<T>(a), value_ref::<T>(b))
    }

    /// In-place merge of the heaps `h1` and `h2` into the slot `link` of
    /// `parent`.
    ///
    /// Phase I walks down both trees: the smaller root is linked in through
    /// `link`, its lighter child slot becomes the new `link`, and the walk
    /// continues between that child and the other tree. Phase II attaches
    /// the survivor. Phase III walks back up through the parent links,
    /// refreshing leaf distances: at least as many steps as the walk down
    /// took, and after that only while the distance still changes.
    ///
    /// Termination of phase III is guaranteed: each node stores the minimum
    /// null-path length of its children, which is logarithmically bounded by
    /// the subtree size, and a local structural change can only affect the
    /// value while it remains below that bound. So at most O(log n) updates
    /// propagate, whether the distance grew or shrank.
    unsafe fn merge_links(cmp: &C, parent: Link, link: *mut Link, h1: Link, h2: Link) {
        let mut parent = parent;
        let mut link = link;
        let mut h1 = h1;
        let mut h2 = h2;
        let mut steps: i32 = 1;

        // Phase I: merge trees until at most one is surviving
        while let (Some(a), Some(b)) = (h1, h2) {
            steps += 1;
            let from_h2 = Self::less(cmp, b, a);
            let pick = if from_h2 { b } else { a };
            *link = Some(pick);
            (*pick.as_ptr()).up = parent;
            parent = Some(pick);
            let p = pick.as_ptr();
            let take_left = match ((*p).left, (*p).right) {
                (None, _) => true,
                (Some(l), Some(r)) => (*r.as_ptr()).dist > (*l.as_ptr()).dist,
                (Some(_), None) => false,
            };
            link = if take_left {
                &mut (*p).left
            } else {
                &mut (*p).right
            };
            if from_h2 {
                h2 = *link;
            } else {
                h1 = *link;
            }
        }

        // Phase II: connect the survivor. Unless both heaps were empty
        // there is exactly one; give it a proper parent link.
        let survivor = h1.or(h2);
        *link = survivor;
        if let Some(s) = survivor {
            (*s.as_ptr()).up = parent;
        }

        // Phase III: update the leaf distances.
        while let Some(node) = parent {
            let p = node.as_ptr();
            let lcw = dist_of((*p).left);
            let rcw = dist_of((*p).right);
            let nnw = lcw.min(rcw) + 1;
            steps -= 1;
            if steps < 0 && nnw == (*p).dist {
                break;
            }
            (*p).dist = nnw;
            parent = (*p).up;
        }
    }

    /// Builds a heap from a list of isolated nodes chained through their
    /// parent slots: pair them left to right into merged sub-heaps threaded
    /// onto a fresh list, and repeat on that list until one tree remains.
    unsafe fn build(cmp: &C, head: Link) -> Link {
        let mut head = head;
        loop {
            let Some(first) = head else { return None };
            let Some(second) = (*first.as_ptr()).up else { return head };
            let mut list: Link = None;
            let mut h1 = first;
            let mut h2 = second;
            loop {
                head = (*h2.as_ptr()).up;
                let mut hold: Link = None;
                Self::merge_links(cmp, None, &mut hold, Some(h1), Some(h2));
                let top = hold.expect("merging two nodes yields a node");
                (*top.as_ptr()).up = list;
                list = hold;
                let Some(a) = head else { break };
                let Some(b) = (*a.as_ptr()).up else { break };
                h1 = a;
                h2 = b;
            }
            match head {
                Some(leftover) => (*leftover.as_ptr()).up = list,
                None => head = list,
            }
        }
    }

    /// Cuts the subtree rooted at `node` off the heap.
    ///
    /// Why call merge with two empty operands here? It not only writes the
    /// null leaf into the vacated slot, it also reruns the leaf-distance
    /// propagation for the ancestors. A slight form of abuse, but
    /// convenient.
    unsafe fn tcut(cmp: &C, node: NonNull<Links>) -> NonNull<Links> {
        let parent = (*node.as_ptr()).up.expect("cannot cut the end position");
        let p = parent.as_ptr();
        if (*p).left == Some(node) {
            Self::merge_links(cmp, Some(parent), &mut (*p).left, None, None);
        } else {
            Self::merge_links(cmp, Some(parent), &mut (*p).right, None, None);
        }
        (*node.as_ptr()).up = None;
        node
    }

    /// Cuts `node` alone off the heap, replacing it by the merge of its own
    /// two children. This retains most of the order already achieved.
    unsafe fn ncut(cmp: &C, node: NonNull<Links>) -> NonNull<Links> {
        let parent = (*node.as_ptr()).up.expect("cannot cut the end position");
        let p = parent.as_ptr();
        let (h1, h2) = ((*node.as_ptr()).left, (*node.as_ptr()).right);
        if (*p).left == Some(node) {
            Self::merge_links(cmp, Some(parent), &mut (*p).left, h1, h2);
        } else {
            Self::merge_links(cmp, Some(parent), &mut (*p).right, h1, h2);
        }
        let n = node.as_ptr();
        (*n).left = None;
        (*n).right = None;
        (*n).up = None;
        (*n).dist = 1;
        node
    }

    /// Inserts `value` into the lighter side of the merge path and returns
    /// a handle to it. Amortized O(log n).
    pub fn push(&mut self, value: T) -> MinDistHandle<T> {
        let node = alloc(value);
        unsafe {
            let s = NonNull::from(&mut *self.root);
            let h1 = (*s.as_ptr()).left;
            Self::merge_links(&self.cmp, Some(s), &mut (*s.as_ptr()).left, h1, Some(node));
        }
        self.len += 1;
        MinDistHandle::new(node)
    }

    /// Builds a balanced forest from a batch of elements in O(n) and merges
    /// it with the existing root.
    pub fn push_many<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut head: Link = None;
        let mut count = 0usize;
        for value in values {
            let node = alloc(value);
            unsafe {
                (*node.as_ptr()).up = head;
            }
            head = Some(node);
            count += 1;
        }
        unsafe {
            let built = Self::build(&self.cmp, head);
            let s = NonNull::from(&mut *self.root);
            let h1 = (*s.as_ptr()).left;
            Self::merge_links(&self.cmp, Some(s), &mut (*s.as_ptr()).left, h1, built);
        }
        self.len += count;
    }

    /// Removes and returns the minimum element.
    pub fn pop(&mut self) -> Option<T> {
        let root = self.root.left?;
        unsafe {
            let s = NonNull::from(&mut *self.root);
            let (h1, h2) = ((*root.as_ptr()).left, (*root.as_ptr()).right);
            Self::merge_links(&self.cmp, Some(s), &mut (*s.as_ptr()).left, h1, h2);
            self.len -= 1;
            let node = Box::from_raw(root.cast::<Node<T>>().as_ptr());
            Some(node.value)
        }
    }

    /// Absorbs all elements of `other`, leaving it empty.
    pub fn merge(&mut self, other: &mut Self) {
        let hold = other.take_root();
        unsafe {
            let s = NonNull::from(&mut *self.root);
            let h1 = (*s.as_ptr()).left;
            Self::merge_links(&self.cmp, Some(s), &mut (*s.as_ptr()).left, h1, hold);
        }
        self.len += std::mem::replace(&mut other.len, 0);
    }

    /// Removes the element at `handle` and returns the position of its
    /// forward-traversal successor.
    ///
    /// This invalidates every handle to the removed node and distorts the
    /// traversal order seen through all other live handles.
    pub fn remove(&mut self, handle: MinDistHandle<T>) -> MinDistHandle<T> {
        unsafe {
            let succ = iter_succ(handle.node);
            let node = Self::ncut(&self.cmp, handle.node);
            dealloc::<T>(node);
            self.len -= 1;
            MinDistHandle::new(succ)
        }
    }

    /// Quickly restores heap order after the element at `handle` was made
    /// *smaller*.
    ///
    /// O(1) actual apart from distance propagation: cutting a subtree from
    /// any position is O(1), and so is the following merge with the
    /// remaining heap. A decreased key does not invalidate the subtree
    /// rooted at the node, so the whole subtree is pruned and regrafted.
    /// ([`Self::readjust`] is the heavier tool for arbitrary key changes,
    /// where the invariant between the node and its children may be gone.)
    ///
    /// Distorts the traversal order seen through live handles.
    pub fn decrease(&mut self, handle: MinDistHandle<T>) -> MinDistHandle<T> {
        unsafe {
            let s = NonNull::from(&mut *self.root);
            if (*s.as_ptr()).left != Some(handle.node) {
                let cut = Self::tcut(&self.cmp, handle.node);
                let h1 = (*s.as_ptr()).left;
                Self::merge_links(&self.cmp, Some(s), &mut (*s.as_ptr()).left, h1, Some(cut));
            }
        }
        handle
    }

    /// Fully restores heap order after an arbitrary change to the element
    /// at `handle`: the node alone is cut (its children re-rooted in place,
    /// as in [`Self::remove`]) and re-merged as a singleton.
    ///
    /// Distorts the traversal order seen through live handles.
    pub fn readjust(&mut self, handle: MinDistHandle<T>) -> MinDistHandle<T> {
        unsafe {
            let node = Self::ncut(&self.cmp, handle.node);
            let s = NonNull::from(&mut *self.root);
            let h1 = (*s.as_ptr()).left;
            Self::merge_links(&self.cmp, Some(s), &mut (*s.as_ptr()).left, h1, Some(node));
        }
        handle
    }

    /// Checks heap order, parent-link consistency, and leaf distances over
    /// the whole tree.
    pub fn validate(&self) -> Result<(), HeapError> {
        // Full traversal of a distance-balanced heap can be tricky, as the
        // nesting can be VERY deep. We use a trick here that sounds a bit
        // like a chicken-egg problem, but is actually not:
        //
        //   >> We use a PRIORITY QUEUE to enumerate nodes of a PRIORITY QUEUE! <<
        //
        // The traversal queue is ordered by LEAF DISTANCE, and we always
        // proceed with the node having the smallest one, i.e. along the
        // shortest currently available path. That keeps the queue close to
        // the lowest possible length; a plain stack cannot promise that,
        // since a short right spine does not prevent a very heavy left
        // child below.
        struct Frontier(u16, NonNull<Links>);
        impl PartialEq for Frontier {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl Eq for Frontier {}
        impl PartialOrd for Frontier {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for Frontier {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                other.0.cmp(&self.0)
            }
        }

        let mut que: BinaryHeap<Frontier> = BinaryHeap::new();

        check(self.root.up.is_none(), "sentinel must not have a parent")?;
        check(self.root.right.is_none(), "sentinel must not have a right child")?;

        unsafe {
            if let Some(root) = self.root.left {
                check(
                    (*root.as_ptr()).up == Some(self.sentinel()),
                    "root parent link",
                )?;
                que.push(Frontier((*root.as_ptr()).dist, root));
            }

            while let Some(Frontier(_, node)) = que.pop() {
                let n = node.as_ptr();
                let mut wlc = 0u16;
                let mut wrc = 0u16;

                if let Some(left) = (*n).left {
                    check((*left.as_ptr()).up == Some(node), "left child parent link")?;
                    check(!Self::less(&self.cmp, left, node), "heap order (left child)")?;
                    wlc = (*left.as_ptr()).dist;
                    que.push(Frontier(wlc, left));
                }

                if let Some(right) = (*n).right {
                    check((*right.as_ptr()).up == Some(node), "right child parent link")?;
                    check(
                        !Self::less(&self.cmp, right, node),
                        "heap order (right child)",
                    )?;
                    wrc = (*right.as_ptr()).dist;
                    que.push(Frontier(wrc, right));
                }

                check((*n).dist == wlc.min(wrc) + 1, "leaf distance")?;
            }
        }
        Ok(())
    }
}

/// Forward iterator over a [`MinDistHeap`] in structural order.
pub struct MinDistIter<'a, T> {
    pos: NonNull<Links>,
    _phantom: PhantomData<&'a T>,
}

impl<'a, T> Iterator for MinDistIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        unsafe {
            if (*self.pos.as_ptr()).up.is_none() {
                return None;
            }
            let value = value_ref::<T>(self.pos);
            self.pos = iter_succ(self.pos);
            Some(value)
        }
    }
}

impl<'a, T, C> IntoIterator for &'a MinDistHeap<T, C> {
    type Item = &'a T;
    type IntoIter = MinDistIter<'a, T>;

    fn into_iter(self) -> MinDistIter<'a, T> {
        self.iter()
    }
}
