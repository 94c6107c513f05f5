//! Height-balanced ordered set of discovered vertices.
//!
//! Nodes live in a per-traversal arena and link to each other by index, so a
//! whole set is released at once when the traversal is reset. The tree keeps
//! the usual AVL invariant: sibling subtree heights differ by at most one.

use smallvec::SmallVec;

use super::VertexId;

/// One discovered vertex together with the parent it was first reached from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visited {
    /// Vertex id.
    pub id: VertexId,
    /// BFS parent at first discovery; equal to `id` for the traversal root.
    pub parent: VertexId,
}

impl Visited {
    /// Entry for the traversal root, which is its own parent.
    pub fn root(id: VertexId) -> Self {
        Self { id, parent: id }
    }

    /// Returns `true` when this entry is the traversal root.
    pub fn is_root(&self) -> bool {
        self.parent == self.id
    }
}

/// Outcome of [`VisitedSet::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// The entry was linked into the tree.
    Inserted,
    /// An entry with the same id already existed and was left untouched.
    Present(Visited),
}

type Link = Option<usize>;

#[derive(Debug)]
struct AvlNode {
    entry: Visited,
    before: Link,
    after: Link,
    up: Link,
    height: i16,
    imbalance: i16,
}

impl AvlNode {
    fn leaf(entry: Visited, up: Link) -> Self {
        Self {
            entry,
            before: None,
            after: None,
            up,
            height: 1,
            imbalance: 0,
        }
    }
}

/// Ordered set of visited vertices keyed by id.
#[derive(Debug, Default)]
pub struct VisitedSet {
    nodes: Vec<AvlNode>,
    root: Link,
}

impl VisitedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set whose arena can hold `capacity` entries before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Number of entries in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no vertex has been recorded.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the tree; zero when empty.
    pub fn height(&self) -> usize {
        self.height_of(self.root) as usize
    }

    /// Looks up the entry for `id`.
    pub fn search(&self, id: VertexId) -> Option<&Visited> {
        self.find(id).map(|idx| &self.nodes[idx].entry)
    }

    /// Returns `true` if `id` has been recorded.
    pub fn contains(&self, id: VertexId) -> bool {
        self.find(id).is_some()
    }

    /// Links `entry` into the tree unless its id is already present, in which
    /// case the existing entry is returned and the tree is unchanged.
    pub fn insert(&mut self, entry: Visited) -> Insertion {
        let Some(mut cursor) = self.root else {
            self.nodes.push(AvlNode::leaf(entry, None));
            self.root = Some(0);
            return Insertion::Inserted;
        };
        let slot = self.nodes.len();
        loop {
            let node = &mut self.nodes[cursor];
            let link = if entry.id < node.entry.id {
                &mut node.before
            } else if entry.id > node.entry.id {
                &mut node.after
            } else {
                return Insertion::Present(node.entry);
            };
            match *link {
                Some(next) => cursor = next,
                None => {
                    *link = Some(slot);
                    break;
                }
            }
        }
        self.nodes.push(AvlNode::leaf(entry, Some(cursor)));
        self.rebalance_from(cursor);
        Insertion::Inserted
    }

    /// Smallest entry in the set.
    pub fn first(&self) -> Option<&Visited> {
        self.leftmost(self.root).map(|idx| &self.nodes[idx].entry)
    }

    /// Entry with the next larger id after `id`, which must be present.
    pub fn next(&self, id: VertexId) -> Option<&Visited> {
        self.find(id)
            .and_then(|idx| self.successor(idx))
            .map(|idx| &self.nodes[idx].entry)
    }

    /// In-order iterator over all entries.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            set: self,
            next: self.leftmost(self.root),
        }
    }

    /// Hands every entry to `release` in post-order and leaves the set empty.
    pub fn destroy<F: FnMut(Visited)>(&mut self, mut release: F) {
        self.post_order(self.root, &mut release);
        self.nodes.clear();
        self.root = None;
    }

    /// Ids from the root down to `id`, recovered by following parent links.
    ///
    /// The walk stops early if a parent is missing from the set; it never runs
    /// longer than the number of recorded entries.
    pub fn lineage(&self, id: VertexId) -> SmallVec<[VertexId; 16]> {
        let mut chain: SmallVec<[VertexId; 16]> = SmallVec::new();
        let mut cursor = id;
        while let Some(entry) = self.search(cursor) {
            chain.push(entry.id);
            if entry.is_root() || chain.len() > self.nodes.len() {
                break;
            }
            cursor = entry.parent;
        }
        chain.reverse();
        chain
    }

    fn find(&self, id: VertexId) -> Option<usize> {
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            if id == node.entry.id {
                return Some(idx);
            }
            cursor = if id < node.entry.id {
                node.before
            } else {
                node.after
            };
        }
        None
    }

    fn leftmost(&self, mut link: Link) -> Link {
        let mut found = None;
        while let Some(idx) = link {
            found = Some(idx);
            link = self.nodes[idx].before;
        }
        found
    }

    fn successor(&self, idx: usize) -> Link {
        if self.nodes[idx].after.is_some() {
            return self.leftmost(self.nodes[idx].after);
        }
        let mut child = idx;
        let mut up = self.nodes[idx].up;
        while let Some(parent) = up {
            if self.nodes[parent].before == Some(child) {
                return Some(parent);
            }
            child = parent;
            up = self.nodes[parent].up;
        }
        None
    }

    fn post_order<F: FnMut(Visited)>(&self, link: Link, release: &mut F) {
        if let Some(idx) = link {
            self.post_order(self.nodes[idx].before, release);
            self.post_order(self.nodes[idx].after, release);
            release(self.nodes[idx].entry);
        }
    }

    fn height_of(&self, link: Link) -> i16 {
        link.map_or(0, |idx| self.nodes[idx].height)
    }

    fn recompute_height(&mut self, idx: usize) {
        let before = self.height_of(self.nodes[idx].before);
        let after = self.height_of(self.nodes[idx].after);
        let node = &mut self.nodes[idx];
        node.imbalance = before - after;
        node.height = before.max(after) + 1;
    }

    //     P                B
    //    / \              / \
    //   B   Z    ==>     X   P
    //  / \                  / \
    // X   Y                Y   Z
    fn rotate_before(&mut self, p: usize) -> usize {
        let Some(b) = self.nodes[p].before else {
            return p;
        };
        let y = self.nodes[b].after;
        self.nodes[b].up = self.nodes[p].up;
        self.nodes[b].after = Some(p);
        self.nodes[p].up = Some(b);
        self.nodes[p].before = y;
        if let Some(y) = y {
            self.nodes[y].up = Some(p);
        }
        self.recompute_height(p);
        self.recompute_height(b);
        b
    }

    //     P                A
    //    / \              / \
    //   X   A    ==>     P   Z
    //      / \          / \
    //     Y   Z        X   Y
    fn rotate_after(&mut self, p: usize) -> usize {
        let Some(a) = self.nodes[p].after else {
            return p;
        };
        let y = self.nodes[a].before;
        self.nodes[a].up = self.nodes[p].up;
        self.nodes[a].before = Some(p);
        self.nodes[p].up = Some(a);
        self.nodes[p].after = y;
        if let Some(y) = y {
            self.nodes[y].up = Some(p);
        }
        self.recompute_height(p);
        self.recompute_height(a);
        a
    }

    fn relink(&mut self, up: Link, old: usize, new: usize) {
        if let Some(up) = up {
            let parent = &mut self.nodes[up];
            if parent.before == Some(old) {
                parent.before = Some(new);
            } else {
                parent.after = Some(new);
            }
        }
    }

    fn rebalance_from(&mut self, start: usize) {
        let mut cursor = Some(start);
        let mut top = start;
        while let Some(mut idx) = cursor {
            self.recompute_height(idx);
            let imbalance = self.nodes[idx].imbalance;
            if imbalance >= 2 {
                if let Some(b) = self.nodes[idx].before {
                    if self.nodes[b].imbalance < 0 {
                        let rotated = self.rotate_after(b);
                        self.nodes[idx].before = Some(rotated);
                    }
                }
                let up = self.nodes[idx].up;
                let rotated = self.rotate_before(idx);
                self.relink(up, idx, rotated);
                idx = rotated;
            } else if imbalance <= -2 {
                if let Some(a) = self.nodes[idx].after {
                    if self.nodes[a].imbalance > 0 {
                        let rotated = self.rotate_before(a);
                        self.nodes[idx].after = Some(rotated);
                    }
                }
                let up = self.nodes[idx].up;
                let rotated = self.rotate_after(idx);
                self.relink(up, idx, rotated);
                idx = rotated;
            }
            top = idx;
            cursor = self.nodes[idx].up;
        }
        self.root = Some(top);
    }
}

/// In-order iterator returned by [`VisitedSet::iter`].
pub struct Iter<'a> {
    set: &'a VisitedSet,
    next: Link,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Visited;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        self.next = self.set.successor(idx);
        Some(&self.set.nodes[idx].entry)
    }
}
