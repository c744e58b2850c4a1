//! Uniform queue contract over lists and heaps
//!
//! Scheduler code only needs push/next/pop/clear; [`TaskQueue`] gives it that
//! regardless of whether a list (FIFO or LIFO) or a heap backs the queue.

use gridctl_core::{ErrorCode, GridResult};

use crate::{Compare, Heap, LinkArena, Membership, NodeId};

/// Queue of arena-owned items addressed by [`NodeId`]
pub trait TaskQueue {
    type Item;

    /// Store `item` in a new orphan node
    fn alloc(&mut self, item: Self::Item) -> GridResult<NodeId>;

    /// Detach `node` if queued and free its storage
    fn release(&mut self, node: NodeId) -> GridResult<Self::Item>;

    /// Enqueue an allocated node
    fn push(&mut self, node: NodeId) -> GridResult<()>;

    /// Head of the queue
    fn next(&self) -> Option<NodeId>;

    /// Remove and return the head
    fn pop(&mut self) -> Option<NodeId>;

    /// Remove `node` from wherever it sits in the queue
    fn cancel(&mut self, node: NodeId) -> GridResult<()>;

    fn is_empty(&self) -> bool;

    fn len(&self) -> usize;

    fn is_queued(&self, node: NodeId) -> bool;

    fn get(&self, node: NodeId) -> Option<&Self::Item>;

    /// Mutate an item in place, keeping the queue order consistent
    fn with_mut<R>(&mut self, node: NodeId, f: impl FnOnce(&mut Self::Item) -> R) -> Option<R>;

    /// Drop every member without visiting them
    fn fast_clear(&mut self) -> GridResult<()>;

    /// Drop every member, leaving each one orphan
    fn deep_clear(&mut self) -> GridResult<()>;
}

/// Service order of a [`ListQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Pushes go to the tail
    Fifo,
    /// Pushes go to the head
    Lifo,
}

/// List-backed queue
///
/// The anchor occupies one of the `N` arena slots.
pub struct ListQueue<T, const N: usize> {
    arena: LinkArena<T, N>,
    anchor: NodeId,
    discipline: Discipline,
}

impl<T, const N: usize> ListQueue<T, N> {
    /// # Panics
    ///
    /// If `N` is zero, leaving no room for the anchor.
    pub fn new(discipline: Discipline) -> Self {
        let mut arena = LinkArena::new();
        let anchor = match arena.alloc_anchor() {
            Ok(anchor) => anchor,
            Err(_) => panic!("ListQueue needs at least one slot for its anchor"),
        };
        Self {
            arena,
            anchor,
            discipline,
        }
    }

    pub fn fifo() -> Self {
        Self::new(Discipline::Fifo)
    }

    pub fn lifo() -> Self {
        Self::new(Discipline::Lifo)
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Underlying arena, for ring inspection
    pub fn arena(&self) -> &LinkArena<T, N> {
        &self.arena
    }

    /// Iterate queued items from head to tail
    pub fn iter(&self) -> crate::list::Iter<'_, T, N> {
        self.arena.iter(self.anchor)
    }
}

impl<T, const N: usize> Default for ListQueue<T, N> {
    fn default() -> Self {
        Self::fifo()
    }
}

impl<T, const N: usize> TaskQueue for ListQueue<T, N> {
    type Item = T;

    fn alloc(&mut self, item: T) -> GridResult<NodeId> {
        self.arena.alloc(item)
    }

    fn release(&mut self, node: NodeId) -> GridResult<T> {
        if node == self.anchor {
            return Err(ErrorCode::InvalidArgument);
        }
        self.arena.release(node)?.ok_or(ErrorCode::InvalidArgument)
    }

    fn push(&mut self, node: NodeId) -> GridResult<()> {
        if node == self.anchor || self.arena.is_anchor(node) {
            return Err(ErrorCode::InvalidArgument);
        }
        match self.discipline {
            Discipline::Fifo => self.arena.push_back(self.anchor, node),
            Discipline::Lifo => self.arena.push_front(self.anchor, node),
        }
    }

    fn next(&self) -> Option<NodeId> {
        self.arena.front(self.anchor)
    }

    fn pop(&mut self) -> Option<NodeId> {
        let head = self.next()?;
        self.arena.pop_self(head).ok()?;
        Some(head)
    }

    fn cancel(&mut self, node: NodeId) -> GridResult<()> {
        if node == self.anchor {
            return Err(ErrorCode::InvalidArgument);
        }
        self.arena.pop_self(node)
    }

    fn is_empty(&self) -> bool {
        self.arena.is_empty(self.anchor)
    }

    fn len(&self) -> usize {
        self.arena.len(self.anchor)
    }

    fn is_queued(&self, node: NodeId) -> bool {
        node != self.anchor && self.arena.membership(node) == Membership::Anchored(self.anchor)
    }

    fn get(&self, node: NodeId) -> Option<&T> {
        self.arena.get(node)
    }

    fn with_mut<R>(&mut self, node: NodeId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.arena.get_mut(node).map(f)
    }

    fn fast_clear(&mut self) -> GridResult<()> {
        self.arena.fast_clear(self.anchor)
    }

    fn deep_clear(&mut self) -> GridResult<()> {
        self.arena.deep_clear(self.anchor)
    }
}

/// Heap-backed queue, greatest item first
pub struct PriorityQueue<T, C, const N: usize> {
    heap: Heap<T, C, N>,
}

impl<T, C: Compare<T>, const N: usize> PriorityQueue<T, C, N> {
    pub const fn new(cmp: C) -> Self {
        Self {
            heap: Heap::new(cmp),
        }
    }

    /// Underlying heap, for consistency checks
    pub fn heap(&self) -> &Heap<T, C, N> {
        &self.heap
    }
}

impl<T, C: Compare<T> + Default, const N: usize> Default for PriorityQueue<T, C, N> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<T, C: Compare<T>, const N: usize> TaskQueue for PriorityQueue<T, C, N> {
    type Item = T;

    fn alloc(&mut self, item: T) -> GridResult<NodeId> {
        self.heap.alloc(item)
    }

    fn release(&mut self, node: NodeId) -> GridResult<T> {
        self.heap.release(node)
    }

    fn push(&mut self, node: NodeId) -> GridResult<()> {
        self.heap.push(node)
    }

    fn next(&self) -> Option<NodeId> {
        self.heap.peek()
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.heap.pop()
    }

    fn cancel(&mut self, node: NodeId) -> GridResult<()> {
        self.heap.pop_self(node)
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn is_queued(&self, node: NodeId) -> bool {
        self.heap.contains(node)
    }

    fn get(&self, node: NodeId) -> Option<&T> {
        self.heap.get(node)
    }

    fn with_mut<R>(&mut self, node: NodeId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.heap.with_mut(node, f)
    }

    fn fast_clear(&mut self) -> GridResult<()> {
        self.heap.fast_clear();
        Ok(())
    }

    fn deep_clear(&mut self) -> GridResult<()> {
        self.heap.deep_clear();
        Ok(())
    }
}
