//! Anchored doubly-linked ring lists
//!
//! Every node of a [`LinkArena`] is linked into a ring through its `prev` and
//! `next` handles. A freshly allocated node links to itself. An anchor is a
//! node without a value; the list it heads is the set of nodes reachable from
//! it, anchor excluded.
//!
//! Popping an anchor detaches only the anchor: its former members keep
//! pointing at each other as an unanchored ring. Use [`LinkArena::deep_clear`]
//! when each member must afterwards report [`LinkArena::is_orphan`].

use gridctl_core::{ErrorCode, GridResult, UNTRUSTED_ITERATION_LIMIT};
use heapless::Vec;

use crate::NodeId;

#[derive(Debug)]
enum Payload<T> {
    Free,
    Anchor,
    Value(T),
}

#[derive(Debug)]
struct Link<T> {
    prev: u16,
    next: u16,
    payload: Payload<T>,
}

/// Where a node currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Linked to nothing but itself
    Orphan,
    /// Member of the list headed by this anchor (an anchor reports itself)
    Anchored(NodeId),
    /// Member of a ring with no anchor, left behind by a fast clear
    Unanchored,
}

/// Node storage shared by any number of lists
pub struct LinkArena<T, const N: usize> {
    links: Vec<Link<T>, N>,
    free: Vec<u16, N>,
}

impl<T, const N: usize> LinkArena<T, N> {
    pub const fn new() -> Self {
        Self {
            links: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate an orphan node holding `value`
    pub fn alloc(&mut self, value: T) -> GridResult<NodeId> {
        self.alloc_payload(Payload::Value(value))
    }

    /// Allocate an empty anchor
    pub fn alloc_anchor(&mut self) -> GridResult<NodeId> {
        self.alloc_payload(Payload::Anchor)
    }

    fn alloc_payload(&mut self, payload: Payload<T>) -> GridResult<NodeId> {
        if let Some(raw) = self.free.pop() {
            self.links[raw as usize] = Link {
                prev: raw,
                next: raw,
                payload,
            };
            return Ok(NodeId(raw));
        }
        let raw = self.links.len() as u16;
        self.links
            .push(Link {
                prev: raw,
                next: raw,
                payload,
            })
            .map_err(|_| ErrorCode::Memory)?;
        Ok(NodeId(raw))
    }

    /// Detach `node` and return its slot to the arena
    ///
    /// Releasing an anchor fast-clears its list. Yields the stored value, or
    /// `None` for an anchor.
    pub fn release(&mut self, node: NodeId) -> GridResult<Option<T>> {
        self.check(node)?;
        self.unlink(node.0);
        let link = &mut self.links[node.index()];
        let payload = core::mem::replace(&mut link.payload, Payload::Free);
        self.free.push(node.0).map_err(|_| ErrorCode::InvalidState)?;
        Ok(match payload {
            Payload::Value(value) => Some(value),
            _ => None,
        })
    }

    /// Total slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slots currently holding a node or an anchor
    pub fn allocated(&self) -> usize {
        self.links.len() - self.free.len()
    }

    fn check(&self, node: NodeId) -> GridResult<()> {
        match self.links.get(node.index()) {
            Some(link) if !matches!(link.payload, Payload::Free) => Ok(()),
            _ => Err(ErrorCode::InvalidArgument),
        }
    }

    /// True if `node` refers to a live slot
    pub fn is_valid(&self, node: NodeId) -> bool {
        self.check(node).is_ok()
    }

    pub fn is_anchor(&self, node: NodeId) -> bool {
        matches!(
            self.links.get(node.index()).map(|l| &l.payload),
            Some(Payload::Anchor)
        )
    }

    /// True if `node` links only to itself
    pub fn is_empty(&self, node: NodeId) -> bool {
        self.links
            .get(node.index())
            .map_or(true, |l| l.next == node.0)
    }

    /// Empty and not an anchor
    pub fn is_orphan(&self, node: NodeId) -> bool {
        self.is_valid(node) && !self.is_anchor(node) && self.is_empty(node)
    }

    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        self.check(node).ok()?;
        Some(NodeId(self.links[node.index()].next))
    }

    pub fn prev(&self, node: NodeId) -> Option<NodeId> {
        self.check(node).ok()?;
        Some(NodeId(self.links[node.index()].prev))
    }

    /// First member of the list headed by `anchor`
    pub fn front(&self, anchor: NodeId) -> Option<NodeId> {
        if self.is_empty(anchor) {
            None
        } else {
            self.next(anchor)
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&T> {
        match &self.links.get(node.index())?.payload {
            Payload::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut T> {
        match &mut self.links.get_mut(node.index())?.payload {
            Payload::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Link `node` just before `at`
    ///
    /// With `at` an anchor this appends to its list. A non-anchor `node` is
    /// first detached from whatever list holds it. An anchor `node` moves its
    /// whole list and is left empty; an empty anchor is a no-op.
    pub fn push_back(&mut self, at: NodeId, node: NodeId) -> GridResult<()> {
        self.push(at, node, false)
    }

    /// Link `node` just after `at`, same rules as [`push_back`](Self::push_back)
    pub fn push_front(&mut self, at: NodeId, node: NodeId) -> GridResult<()> {
        self.push(at, node, true)
    }

    fn push(&mut self, at: NodeId, node: NodeId, after: bool) -> GridResult<()> {
        self.check(at)?;
        self.check(node)?;
        if at == node {
            return Ok(());
        }
        let (first, last) = if self.is_anchor(node) {
            if self.is_empty(node) {
                return Ok(());
            }
            if self.ring_contains(node, at)? {
                return Err(ErrorCode::InvalidArgument);
            }
            let first = self.links[node.index()].next;
            let last = self.links[node.index()].prev;
            self.unlink(node.0);
            (first, last)
        } else {
            self.unlink(node.0);
            (node.0, node.0)
        };
        let target = if after {
            self.links[at.index()].next
        } else {
            at.0
        };
        self.splice_before(target, first, last);
        Ok(())
    }

    /// Detach `node` from its list
    ///
    /// No-op on an orphan. On an anchor this is the fast clear: the anchor
    /// becomes empty and its members stay linked among themselves.
    pub fn pop_self(&mut self, node: NodeId) -> GridResult<()> {
        self.check(node)?;
        self.unlink(node.0);
        Ok(())
    }

    /// Detach `anchor` from its members without visiting them
    pub fn fast_clear(&mut self, anchor: NodeId) -> GridResult<()> {
        self.pop_self(anchor)
    }

    /// Detach every node linked with `node`, leaving each one orphan
    pub fn deep_clear(&mut self, node: NodeId) -> GridResult<()> {
        self.check(node)?;
        for _ in 0..=N {
            let next = self.links[node.index()].next;
            if next == node.0 {
                return Ok(());
            }
            self.unlink(next);
        }
        Err(ErrorCode::InfiniteLoop)
    }

    /// Exchange the positions of `a` and `b`
    ///
    /// If exactly one of them is empty it takes the other's place and the
    /// other ends up alone.
    pub fn swap(&mut self, a: NodeId, b: NodeId) -> GridResult<()> {
        self.check(a)?;
        self.check(b)?;
        if a == b {
            return Ok(());
        }
        match (self.is_empty(a), self.is_empty(b)) {
            (true, true) => Ok(()),
            (true, false) => {
                self.replace(b, a);
                Ok(())
            }
            (false, true) => {
                self.replace(a, b);
                Ok(())
            }
            (false, false) => {
                let (a, b) = (a.0, b.0);
                if self.links[a as usize].next == b {
                    self.unlink(a);
                    let target = self.links[b as usize].next;
                    self.splice_before(target, a, a);
                } else if self.links[b as usize].next == a {
                    self.unlink(b);
                    let target = self.links[a as usize].next;
                    self.splice_before(target, b, b);
                } else {
                    let after_a = self.links[a as usize].next;
                    self.unlink(a);
                    self.splice_before(b, a, a);
                    self.unlink(b);
                    self.splice_before(after_a, b, b);
                }
                Ok(())
            }
        }
    }

    /// Put the lone `incoming` where `outgoing` is, leaving `outgoing` alone
    fn replace(&mut self, outgoing: NodeId, incoming: NodeId) {
        let target = self.links[outgoing.index()].next;
        self.unlink(outgoing.0);
        self.splice_before(target, incoming.0, incoming.0);
    }

    /// Number of members in the ring of `anchor`, anchor excluded
    pub fn len(&self, anchor: NodeId) -> usize {
        self.iter(anchor).count()
    }

    /// Iterate the values of the list headed by `anchor`
    pub fn iter(&self, anchor: NodeId) -> Iter<'_, T, N> {
        let start = if self.is_valid(anchor) {
            self.links[anchor.index()].next
        } else {
            anchor.0
        };
        Iter {
            arena: self,
            anchor: anchor.0,
            cursor: start,
            budget: N,
        }
    }

    /// Classify where `node` sits
    pub fn membership(&self, node: NodeId) -> Membership {
        if self.is_anchor(node) {
            return Membership::Anchored(node);
        }
        if !self.is_valid(node) || self.is_empty(node) {
            return Membership::Orphan;
        }
        let mut cursor = self.links[node.index()].next;
        for _ in 0..N {
            if cursor == node.0 {
                break;
            }
            if matches!(self.links[cursor as usize].payload, Payload::Anchor) {
                return Membership::Anchored(NodeId(cursor));
            }
            cursor = self.links[cursor as usize].next;
        }
        Membership::Unanchored
    }

    /// Verify `n.next.prev == n` for every node of the ring holding `node`
    pub fn check_ring(&self, node: NodeId) -> bool {
        if !self.is_valid(node) {
            return false;
        }
        let mut cursor = node.0;
        for _ in 0..=N {
            let link = &self.links[cursor as usize];
            let Some(next) = self.links.get(link.next as usize) else {
                return false;
            };
            if next.prev != cursor || matches!(next.payload, Payload::Free) {
                return false;
            }
            cursor = link.next;
            if cursor == node.0 {
                return true;
            }
        }
        false
    }

    fn ring_contains(&self, start: NodeId, needle: NodeId) -> GridResult<bool> {
        let mut cursor = self.links[start.index()].next;
        let limit = N.min(UNTRUSTED_ITERATION_LIMIT as usize);
        for _ in 0..=limit {
            if cursor == start.0 {
                return Ok(false);
            }
            if cursor == needle.0 {
                return Ok(true);
            }
            cursor = self.links[cursor as usize].next;
        }
        Err(ErrorCode::InfiniteLoop)
    }

    fn unlink(&mut self, raw: u16) {
        let (prev, next) = {
            let link = &self.links[raw as usize];
            (link.prev, link.next)
        };
        self.links[prev as usize].next = next;
        self.links[next as usize].prev = prev;
        let link = &mut self.links[raw as usize];
        link.prev = raw;
        link.next = raw;
    }

    /// Insert the open chain `first..=last` before `target`
    fn splice_before(&mut self, target: u16, first: u16, last: u16) {
        let prev = self.links[target as usize].prev;
        self.links[prev as usize].next = first;
        self.links[first as usize].prev = prev;
        self.links[last as usize].next = target;
        self.links[target as usize].prev = last;
    }
}

impl<T, const N: usize> Default for LinkArena<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(handle, value)` pairs of one list
pub struct Iter<'a, T, const N: usize> {
    arena: &'a LinkArena<T, N>,
    anchor: u16,
    cursor: u16,
    budget: usize,
}

impl<'a, T, const N: usize> Iterator for Iter<'a, T, N> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor != self.anchor && self.budget > 0 {
            self.budget -= 1;
            let id = NodeId(self.cursor);
            let link = self.arena.links.get(self.cursor as usize)?;
            self.cursor = link.next;
            if let Payload::Value(value) = &link.payload {
                return Some((id, value));
            }
        }
        None
    }
}
