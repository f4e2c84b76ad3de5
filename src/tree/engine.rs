//! The red-black tree engine.
//!
//! Nodes live in a `Vec`-backed arena and refer to each other through
//! [`NodeId`] handles instead of pointers. This keeps the whole engine free
//! of unsafe code, and it preserves the property the containers built on top
//! rely on: a node keeps its id (and therefore its payload address within the
//! arena slot) for as long as it is allocated, no matter how much the tree is
//! rearranged around it. Removing a node with two children swaps it with its
//! in-order successor *structurally* - links and colors move, payloads don't.
//!
//! The comparator is not stored here. `find` and `insert` take a comparator
//! closure per call; the containers pass a closure capturing their own key
//! comparator (and, for probe lookups, the borrowed probe key - which is how
//! a search avoids copying the probe into a temporary entry).
//!
//! The rotation primitives are public and report their preconditions as
//! errors so they can be exercised directly. They deliberately do not touch
//! the tree's root pointer; the insert/remove repair loops do that at the
//! points where the old root can have been rotated below a new one.

use std::cmp::Ordering;
use std::mem;

use crate::error::{Error, Result};

/// Handle to a node in the arena. Stable until the node is released.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Node color. Absent children count as black.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// Outcome of a comparator descent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Search {
    /// A node comparing equal to the needle.
    Found(NodeId),
    /// No equal node; carries the insertion point - the last node visited,
    /// absent only when the searched subtree was empty.
    Miss(Option<NodeId>),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Debug, Clone)]
struct Node<E> {
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    color: Color,
    entry: E,
}

#[derive(Debug, Clone)]
enum Slot<E> {
    Used(Node<E>),
    Free { next: Option<NodeId> },
}

#[derive(Debug, Clone)]
pub struct RedBlackTree<E> {
    slots: Vec<Slot<E>>,
    free: Option<NodeId>,
    root: Option<NodeId>,
    count: usize,
}

impl<E> Default for RedBlackTree<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RedBlackTree<E> {
    pub fn new() -> Self {
        RedBlackTree { slots: Vec::new(), free: None, root: None, count: 0 }
    }

    /// Number of nodes attached to the tree.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Whether `id` names a currently allocated node.
    pub fn contains_id(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Slot::Used(_)))
    }

    /// Allocate a fresh, disconnected red node carrying `entry`.
    pub fn alloc(&mut self, entry: E) -> NodeId {
        let node = Node { parent: None, left: None, right: None, color: Color::Red, entry };
        match self.free {
            Some(id) => {
                self.free = match &self.slots[id.0] {
                    Slot::Free { next } => *next,
                    Slot::Used(_) => unreachable!("free list points at a used slot"),
                };
                self.slots[id.0] = Slot::Used(node);
                id
            }
            None => {
                self.slots.push(Slot::Used(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Return `id`'s slot to the free list and hand back its payload. The
    /// node must already be detached from the tree (see [`RedBlackTree::remove`]).
    pub fn release(&mut self, id: NodeId) -> E {
        match mem::replace(&mut self.slots[id.0], Slot::Free { next: self.free }) {
            Slot::Used(node) => {
                self.free = Some(id);
                node.entry
            }
            Slot::Free { next } => {
                self.slots[id.0] = Slot::Free { next };
                panic!("release of a vacant node slot");
            }
        }
    }

    pub fn entry(&self, id: NodeId) -> Result<&E> {
        match self.slots.get(id.0) {
            Some(Slot::Used(node)) => Ok(&node.entry),
            _ => Err(Error::ItemNotFound),
        }
    }

    pub(crate) fn entry_mut(&mut self, id: NodeId) -> Result<&mut E> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Used(node)) => Ok(&mut node.entry),
            _ => Err(Error::ItemNotFound),
        }
    }

    /// Payload of a node known to be allocated.
    pub(crate) fn payload(&self, id: NodeId) -> &E {
        &self.node(id).entry
    }

    pub(crate) fn payload_mut(&mut self, id: NodeId) -> &mut E {
        &mut self.node_mut(id).entry
    }

    fn node(&self, id: NodeId) -> &Node<E> {
        match &self.slots[id.0] {
            Slot::Used(node) => node,
            Slot::Free { .. } => panic!("vacant node slot"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<E> {
        match &mut self.slots[id.0] {
            Slot::Used(node) => node,
            Slot::Free { .. } => panic!("vacant node slot"),
        }
    }

    // ---- node accessors ----------------------------------------------------

    /// Color of a possibly absent node. NIL children are black.
    pub fn color(&self, node: Option<NodeId>) -> Color {
        match node {
            None => Color::Black,
            Some(id) => self.node(id).color,
        }
    }

    pub fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    /// Re-parent `node`. Its color is untouched.
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        debug_assert_ne!(Some(node), parent);
        self.node_mut(node).parent = parent;
    }

    fn child(&self, id: NodeId, dir: Dir) -> Option<NodeId> {
        let node = self.node(id);
        match dir {
            Dir::Left => node.left,
            Dir::Right => node.right,
        }
    }

    fn set_child(&mut self, id: NodeId, dir: Dir, child: Option<NodeId>) {
        debug_assert_ne!(Some(id), child);
        let node = self.node_mut(id);
        match dir {
            Dir::Left => node.left = child,
            Dir::Right => node.right = child,
        }
    }

    /// True iff `child` is the left child of `parent`. The caller must have
    /// established that `child` is attached to `parent` on one of its sides.
    fn is_on_left(&self, parent: NodeId, child: NodeId) -> bool {
        let node = self.node(parent);
        if node.left == Some(child) {
            true
        } else {
            debug_assert_eq!(node.right, Some(child));
            false
        }
    }

    fn dir_of(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.is_on_left(parent, child) { Dir::Left } else { Dir::Right }
    }

    // ---- rotations ---------------------------------------------------------

    /// The shared single-rotation body. `dir` names the rotation: a left
    /// rotation moves `y` up from the right side of its parent `x`, a right
    /// rotation from the left side. `y`'s former `dir`-child becomes `x`'s
    /// child on the vacated side.
    fn rotate(&mut self, y: NodeId, dir: Dir) -> Result<()> {
        let x = match self.parent(y) {
            Some(x) => x,
            None => return Err(Error::YHasNoParent),
        };
        let o = dir.opposite();
        if self.child(x, o) != Some(y) {
            return Err(match dir {
                Dir::Left => Error::YIsNotRightChildOfX,
                Dir::Right => Error::YIsNotLeftChildOfX,
            });
        }
        let b = self.child(y, dir);
        if let Some(b) = b {
            self.set_parent(b, Some(x));
        }
        self.set_child(x, o, b);
        match self.parent(x) {
            None => self.set_parent(y, None),
            Some(p) => {
                if self.child(p, dir) == Some(x) {
                    self.set_child(p, dir, Some(y));
                } else {
                    self.set_child(p, o, Some(y));
                }
                self.set_parent(y, Some(p));
            }
        }
        self.set_child(y, dir, Some(x));
        self.set_parent(x, Some(y));
        Ok(())
    }

    /// Rotate `y` up over its parent. `y` must be the right child.
    pub fn rotate_left(&mut self, y: NodeId) -> Result<()> {
        self.rotate(y, Dir::Left)
    }

    /// Rotate `y` up over its parent. `y` must be the left child.
    pub fn rotate_right(&mut self, y: NodeId) -> Result<()> {
        self.rotate(y, Dir::Right)
    }

    /// Two single rotations of `y`, first `dir` then its opposite, lifting
    /// `y` over both its parent `x` and grandparent `z`. Failures of the
    /// second rotation are reported in terms of `x` and `z`.
    fn rotate_double(&mut self, y: NodeId, dir: Dir) -> Result<()> {
        let x = self.parent(y).ok_or(Error::YHasNoParent)?;
        if self.parent(x).is_none() {
            return Err(Error::XHasNoParent);
        }
        self.rotate(y, dir)?;
        self.rotate(y, dir.opposite()).map_err(|err| match err {
            Error::YHasNoParent => Error::XHasNoParent,
            Error::YIsNotRightChildOfX => Error::XIsNotRightChildOfZ,
            Error::YIsNotLeftChildOfX => Error::XIsNotLeftChildOfZ,
            other => other,
        })
    }

    /// Left rotation of `y` followed by a right rotation.
    pub fn rotate_left_right(&mut self, y: NodeId) -> Result<()> {
        self.rotate_double(y, Dir::Left)
    }

    /// Right rotation of `y` followed by a left rotation.
    pub fn rotate_right_left(&mut self, y: NodeId) -> Result<()> {
        self.rotate_double(y, Dir::Right)
    }

    // ---- search ------------------------------------------------------------

    /// Descend from `from` (or the root), steered by `cmp`, which reports how
    /// the needle compares against the visited node's entry: `Less` descends
    /// left, `Greater` right, `Equal` stops.
    pub fn find(&self, from: Option<NodeId>, mut cmp: impl FnMut(&E) -> Ordering) -> Search {
        let mut node = from.or(self.root);
        let mut last = None;
        while let Some(id) = node {
            last = Some(id);
            match cmp(self.payload(id)) {
                Ordering::Equal => return Search::Found(id),
                Ordering::Less => node = self.left(id),
                Ordering::Greater => node = self.right(id),
            }
        }
        Search::Miss(last)
    }

    // ---- insert ------------------------------------------------------------

    /// Attach `child` below the insertion point `parent` (absent only for an
    /// empty tree), on the side `cmp(child, parent)` dictates, then repair.
    ///
    /// If the dictated side is already occupied, the occupant is demoted one
    /// level below the incoming node: the incoming node takes the occupant's
    /// color and place, the occupant turns red and repair continues from it.
    ///
    /// Errors: `InsertionPointIsAbsent`, `NodeAlreadyExists`. On error the
    /// tree is unchanged and `child` stays disconnected.
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        child: NodeId,
        mut cmp: impl FnMut(&E, &E) -> Ordering,
    ) -> Result<()> {
        if parent.is_none() && self.root.is_some() {
            return Err(Error::InsertionPointIsAbsent);
        }
        self.set_color(child, Color::Red);

        let mut parent = parent;
        let mut child = child;
        match parent {
            None => self.root = Some(child),
            Some(p) => {
                let dir = match cmp(self.payload(child), self.payload(p)) {
                    Ordering::Equal => return Err(Error::NodeAlreadyExists),
                    Ordering::Less => Dir::Left,
                    Ordering::Greater => Dir::Right,
                };
                if let Some(occupant) = self.child(p, dir) {
                    // Demote the occupant below the incoming node. The
                    // incoming node inherits the occupant's color so the
                    // subtree above stays untouched; the occupant re-enters
                    // repair as the fresh red node.
                    let color = self.color(Some(occupant));
                    self.set_color(occupant, Color::Red);
                    self.set_color(child, color);
                    self.set_parent(child, Some(p));
                    self.set_child(p, dir, Some(child));
                    parent = Some(child);
                    child = occupant;
                }
                let p = parent.unwrap();
                self.set_parent(child, Some(p));
                self.set_child(p, dir, Some(child));
            }
        }
        self.count += 1;

        // Repair upward from the red child.
        loop {
            debug_assert_eq!(self.color(Some(child)), Color::Red);
            let p = match parent {
                None => {
                    self.set_color(child, Color::Black);
                    return Ok(());
                }
                Some(p) => p,
            };
            if self.color(Some(p)) == Color::Black {
                return Ok(());
            }
            // A red parent is never the root, so the grandparent exists.
            let g = self.parent(p).unwrap();
            let mut uncle = self.left(g);
            if uncle == Some(p) {
                uncle = self.right(g);
            }
            if self.color(uncle) == Color::Red {
                // Red uncle: push the blackness down from the grandparent
                // and continue from it.
                self.set_color(p, Color::Black);
                self.set_color(uncle.unwrap(), Color::Black);
                self.set_color(g, Color::Red);
                child = g;
                parent = self.parent(child);
                continue;
            }
            let parent_dir = self.dir_of(g, p);
            let child_dir = self.dir_of(p, child);
            if parent_dir == child_dir {
                // Same side: one rotation of the parent over the grandparent.
                self.rotate(p, parent_dir.opposite()).unwrap();
                self.set_color(p, Color::Black);
                self.set_color(g, Color::Red);
                if self.root == Some(g) {
                    self.root = Some(p);
                }
            } else {
                // Zig-zag: double rotation of the child over parent and
                // grandparent.
                self.rotate_double(child, child_dir.opposite()).unwrap();
                self.set_color(child, Color::Black);
                self.set_color(g, Color::Red);
                if self.root == Some(g) {
                    self.root = Some(child);
                }
            }
            return Ok(());
        }
    }

    // ---- remove ------------------------------------------------------------

    /// Detach `node` from the tree. Its slot stays allocated; call
    /// [`RedBlackTree::release`] to reclaim it and take the payload back.
    ///
    /// A node with two children is first swapped - links and colors, never
    /// payloads - with its in-order successor, so ids held on other nodes
    /// stay valid across the removal.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        if !self.contains_id(node) {
            return Err(Error::ItemNotFound);
        }
        let mut node = node;
        let (double_black, db_parent) = loop {
            let color = self.color(Some(node));
            let left = self.left(node);
            let right = self.right(node);
            let parent = self.parent(node);
            match (left, right) {
                (None, None) => {
                    if let Some(p) = parent {
                        let dir = self.dir_of(p, node);
                        self.set_child(p, dir, None);
                    }
                    self.count -= 1;
                    if self.root == Some(node) {
                        self.root = None;
                    } else if color == Color::Black {
                        // Black leaf gone: the deficit sits on the vacated
                        // NIL position itself.
                        break (None, parent);
                    }
                    return Ok(());
                }
                (Some(child), None) | (None, Some(child)) => {
                    let child_color = self.color(Some(child));
                    if let Some(p) = parent {
                        let dir = self.dir_of(p, node);
                        self.set_child(p, dir, Some(child));
                    }
                    self.set_parent(child, parent);
                    self.set_color(child, Color::Black);
                    if self.root == Some(node) {
                        self.root = Some(child);
                    }
                    self.count -= 1;
                    if color == Color::Black && child_color == Color::Black {
                        break (Some(child), parent);
                    }
                    return Ok(());
                }
                (Some(_), Some(_)) => {
                    self.swap_with_successor(node);
                    // The node now occupies the successor's old position
                    // and has at most one child; go around again.
                }
            }
        };
        self.repair_double_black(double_black, db_parent);
        Ok(())
    }

    /// Exchange `node` with its in-order successor structurally and by
    /// color. Handles the adjacent case where the successor is `node`'s own
    /// right child.
    fn swap_with_successor(&mut self, node: NodeId) {
        let next = self.next(node).unwrap();

        let color = self.color(Some(node));
        let left = self.left(node);
        let right = self.right(node);
        let parent = self.parent(node);
        let color_ = self.color(Some(next));
        let left_ = self.left(next);
        let right_ = self.right(next);
        let parent_ = self.parent(next);

        self.set_parent(node, if parent_ == Some(node) { Some(next) } else { parent_ });
        self.set_parent(next, if parent == Some(next) { Some(node) } else { parent });
        self.set_child(node, Dir::Left, if left_ == Some(node) { Some(next) } else { left_ });
        self.set_child(next, Dir::Left, if left == Some(next) { Some(node) } else { left });
        self.set_child(node, Dir::Right, if right_ == Some(node) { Some(next) } else { right_ });
        self.set_child(next, Dir::Right, if right == Some(next) { Some(node) } else { right });
        self.set_color(node, color_);
        self.set_color(next, color);

        if let Some(p) = parent_ {
            if p != node {
                let dir = self.dir_of(p, next);
                self.set_child(p, dir, Some(node));
            }
        }
        if let Some(p) = parent {
            if p != next {
                let dir = self.dir_of(p, node);
                self.set_child(p, dir, Some(next));
            }
        }
        if let Some(l) = left_ {
            if l != node {
                self.set_parent(l, Some(node));
            }
        }
        if let Some(l) = left {
            if l != next {
                self.set_parent(l, Some(next));
            }
        }
        if let Some(r) = right_ {
            if r != node {
                self.set_parent(r, Some(node));
            }
        }
        if let Some(r) = right {
            if r != next {
                self.set_parent(r, Some(next));
            }
        }
        if self.root == Some(node) {
            self.root = Some(next);
        }
    }

    /// Resolve a black-height deficit at `db` (absent for a vacated NIL
    /// position) whose parent is `parent`.
    fn repair_double_black(&mut self, mut db: Option<NodeId>, mut parent: Option<NodeId>) {
        loop {
            // The root absorbs the deficit.
            if db.is_some() && db == self.root {
                break;
            }
            let p = parent.unwrap();
            // On the vacated-NIL side the child pointer is absent, which is
            // exactly what `db` holds in that case.
            let is_left = self.left(p) == db;
            let sibling = if is_left { self.right(p) } else { self.left(p) };
            // A double black node has a black height of at least one, so a
            // sibling must exist.
            let s = sibling.unwrap();
            let s_left = self.left(s);
            let s_right = self.right(s);
            let p_color = self.color(Some(p));
            let s_color = self.color(Some(s));
            let sl_color = self.color(s_left);
            let sr_color = self.color(s_right);

            // Red sibling: rotate it through the parent and swap their
            // colors. The deficit keeps its place but gains a black sibling.
            if s_color == Color::Red {
                debug_assert_eq!(p_color, Color::Black);
                debug_assert_eq!(sl_color, Color::Black);
                debug_assert_eq!(sr_color, Color::Black);
                self.rotate(s, if is_left { Dir::Left } else { Dir::Right }).unwrap();
                self.set_color(p, Color::Red);
                self.set_color(s, Color::Black);
                if self.root == Some(p) {
                    self.root = Some(s);
                }
                continue;
            }
            if sl_color == Color::Black && sr_color == Color::Black {
                if p_color == Color::Black {
                    // Everything black: drain one black from the sibling and
                    // push the deficit up to the parent.
                    self.set_color(s, Color::Red);
                    db = Some(p);
                    parent = self.parent(p);
                    continue;
                }
                // Red parent pays the deficit.
                self.set_color(p, Color::Black);
                self.set_color(s, Color::Red);
                break;
            }
            let closest = if is_left { s_left } else { s_right };
            let farthest = if is_left { s_right } else { s_left };
            // Closest red, farthest black: rotate the close child through
            // the sibling, turning this into the farthest-red case.
            if self.color(farthest) == Color::Black {
                debug_assert_eq!(self.color(closest), Color::Red);
                let c = closest.unwrap();
                self.rotate(c, if is_left { Dir::Right } else { Dir::Left }).unwrap();
                self.set_color(s, Color::Red);
                self.set_color(c, Color::Black);
                continue;
            }
            // Farthest red: rotate the sibling through the parent; the
            // sibling takes over the parent's color and the deficit is paid.
            let f = farthest.unwrap();
            self.rotate(s, if is_left { Dir::Left } else { Dir::Right }).unwrap();
            self.set_color(s, p_color);
            self.set_color(p, Color::Black);
            self.set_color(f, Color::Black);
            if self.root == Some(p) {
                self.root = Some(s);
            }
            break;
        }
    }

    // ---- walk --------------------------------------------------------------

    /// Leftmost node of the subtree rooted at `root`.
    pub fn minimum(&self, mut root: NodeId) -> NodeId {
        while let Some(left) = self.left(root) {
            root = left;
        }
        root
    }

    /// Rightmost node of the subtree rooted at `root`.
    pub fn maximum(&self, mut root: NodeId) -> NodeId {
        while let Some(right) = self.right(root) {
            root = right;
        }
        root
    }

    /// In-order successor of `node`.
    pub fn next(&self, node: NodeId) -> Result<NodeId> {
        if !self.contains_id(node) {
            return Err(Error::ItemNotFound);
        }
        if let Some(right) = self.right(node) {
            return Ok(self.minimum(right));
        }
        let mut n = node;
        while let Some(p) = self.parent(n) {
            if self.right(p) != Some(n) {
                return Ok(p);
            }
            n = p;
        }
        Err(Error::EndOfSequence)
    }

    /// In-order predecessor of `node`.
    pub fn prev(&self, node: NodeId) -> Result<NodeId> {
        if !self.contains_id(node) {
            return Err(Error::ItemNotFound);
        }
        if let Some(left) = self.left(node) {
            return Ok(self.maximum(left));
        }
        let mut n = node;
        while let Some(p) = self.parent(n) {
            if self.left(p) != Some(n) {
                return Ok(p);
            }
            n = p;
        }
        Err(Error::EndOfSequence)
    }

    pub fn first(&self) -> Result<NodeId> {
        match self.root {
            None => Err(Error::ContainerIsEmpty),
            Some(root) => Ok(self.minimum(root)),
        }
    }

    pub fn last(&self) -> Result<NodeId> {
        match self.root {
            None => Err(Error::ContainerIsEmpty),
            Some(root) => Ok(self.maximum(root)),
        }
    }

    /// In-order iteration over `(id, entry)`.
    pub fn iter(&self) -> Iter<'_, E> {
        Iter { tree: self, next: self.first().ok() }
    }

    /// Hand every payload to `on_destroy` and reset the tree to empty.
    pub fn clear(&mut self, mut on_destroy: impl FnMut(E)) {
        for slot in self.slots.drain(..) {
            if let Slot::Used(node) = slot {
                on_destroy(node.entry);
            }
        }
        self.free = None;
        self.root = None;
        self.count = 0;
    }
}

pub struct Iter<'a, E> {
    tree: &'a RedBlackTree<E>,
    next: Option<NodeId>,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = (NodeId, &'a E);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.next(id).ok();
        Some((id, self.tree.payload(id)))
    }
}

#[cfg(test)]
impl<E> RedBlackTree<E> {
    /// Walk the subtree at `id` checking structure: parent back-links, no
    /// red node with a red child, equal black heights. Returns the black
    /// height of the subtree and the number of nodes in it.
    fn dbg_check_walk(&self, id: NodeId, parent: Option<NodeId>) -> (usize, usize) {
        let node = self.node(id);
        assert_eq!(node.parent, parent, "broken parent link at {:?}", id);
        if node.color == Color::Red {
            assert_eq!(self.color(node.left), Color::Black, "red-red at {:?}", id);
            assert_eq!(self.color(node.right), Color::Black, "red-red at {:?}", id);
        }
        if node.left.is_some() {
            assert_ne!(node.left, node.right, "shared child at {:?}", id);
        }
        let (left_height, left_count) = match node.left {
            Some(left) => self.dbg_check_walk(left, Some(id)),
            None => (1, 0),
        };
        let (right_height, right_count) = match node.right {
            Some(right) => self.dbg_check_walk(right, Some(id)),
            None => (1, 0),
        };
        assert_eq!(left_height, right_height, "black height mismatch at {:?}", id);
        let own = if node.color == Color::Black { 1 } else { 0 };
        (left_height + own, left_count + right_count + 1)
    }

    pub(crate) fn dbg_check(&self) {
        match self.root {
            None => assert_eq!(self.count, 0),
            Some(root) => {
                assert_eq!(self.node(root).parent, None);
                assert_eq!(self.node(root).color, Color::Black, "red root");
                let (_, count) = self.dbg_check_walk(root, None);
                assert_eq!(count, self.count, "count out of sync");
            }
        }
    }
}
