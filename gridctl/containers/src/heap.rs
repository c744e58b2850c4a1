//! Fixed-capacity binary max-heap over arena nodes
//!
//! Each node caches its position in the heap array, so any node can be
//! removed in O(log n), not only the root. Writes through
//! [`Heap::with_mut`] and [`Heap::update`] always re-sift the node, even when
//! the new value compares equal to the old one.

use gridctl_core::{ErrorCode, GridResult};
use heapless::Vec;

use crate::NodeId;

/// Strict ordering used by the heap; the greatest element sits at the root
pub trait Compare<T> {
    /// True if `a` orders strictly before `b`
    fn less(&self, a: &T, b: &T) -> bool;
}

/// `Ord` based comparison
#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalOrder;

impl<T: Ord> Compare<T> for NaturalOrder {
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

impl<T, F: Fn(&T, &T) -> bool> Compare<T> for F {
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    pos: Option<u16>,
}

/// Node storage and heap order in one structure
pub struct Heap<T, C, const N: usize> {
    slots: Vec<Option<Entry<T>>, N>,
    free: Vec<u16, N>,
    order: Vec<NodeId, N>,
    cmp: C,
}

impl<T, C: Compare<T>, const N: usize> Heap<T, C, N> {
    pub const fn new(cmp: C) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            cmp,
        }
    }

    /// Allocate an orphan node
    pub fn alloc(&mut self, value: T) -> GridResult<NodeId> {
        let entry = Some(Entry { value, pos: None });
        if let Some(raw) = self.free.pop() {
            self.slots[raw as usize] = entry;
            return Ok(NodeId::new(raw as usize));
        }
        let index = self.slots.len();
        self.slots.push(entry).map_err(|_| ErrorCode::Memory)?;
        Ok(NodeId::new(index))
    }

    /// Remove `node` from the heap if needed and free its slot
    pub fn release(&mut self, node: NodeId) -> GridResult<T> {
        if self.contains(node) {
            self.pop_self(node)?;
        }
        let entry = self
            .slots
            .get_mut(node.index())
            .and_then(Option::take)
            .ok_or(ErrorCode::InvalidArgument)?;
        self.free.push(node.index() as u16).map_err(|_| ErrorCode::InvalidState)?;
        Ok(entry.value)
    }

    fn entry(&self, node: NodeId) -> Option<&Entry<T>> {
        self.slots.get(node.index())?.as_ref()
    }

    fn entry_mut(&mut self, node: NodeId) -> Option<&mut Entry<T>> {
        self.slots.get_mut(node.index())?.as_mut()
    }

    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.entry(node).map(|e| &e.value)
    }

    /// True if `node` is in the heap and its cached position agrees
    pub fn contains(&self, node: NodeId) -> bool {
        match self.entry(node).and_then(|e| e.pos) {
            Some(pos) => self.order.get(pos as usize) == Some(&node),
            None => false,
        }
    }

    /// Allocated and not in the heap
    pub fn is_orphan(&self, node: NodeId) -> bool {
        self.entry(node).is_some() && !self.contains(node)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Node with the greatest value
    pub fn peek(&self) -> Option<NodeId> {
        self.order.first().copied()
    }

    /// Insert an orphan node
    pub fn push(&mut self, node: NodeId) -> GridResult<()> {
        if self.entry(node).is_none() {
            return Err(ErrorCode::InvalidArgument);
        }
        if self.contains(node) {
            return Err(ErrorCode::InvalidArgument);
        }
        let pos = self.order.len();
        self.order.push(node).map_err(|_| ErrorCode::Memory)?;
        if let Some(entry) = self.entry_mut(node) {
            entry.pos = Some(pos as u16);
        }
        self.sift_up(pos);
        Ok(())
    }

    /// Remove and return the root
    pub fn pop(&mut self) -> Option<NodeId> {
        let root = self.peek()?;
        self.pop_self(root).ok()?;
        Some(root)
    }

    /// Remove `node` from wherever it sits
    ///
    /// No-op on an orphan. A node whose cached position disagrees with the
    /// heap array is reset to orphan and reported as `InvalidState`.
    pub fn pop_self(&mut self, node: NodeId) -> GridResult<()> {
        let pos = match self.entry(node) {
            None => return Err(ErrorCode::InvalidArgument),
            Some(Entry { pos: None, .. }) => return Ok(()),
            Some(Entry { pos: Some(pos), .. }) => *pos as usize,
        };
        if self.order.get(pos) != Some(&node) {
            if let Some(entry) = self.entry_mut(node) {
                entry.pos = None;
            }
            return Err(ErrorCode::InvalidState);
        }
        let last = self.order.len() - 1;
        self.swap_positions(pos, last);
        self.order.pop();
        if let Some(entry) = self.entry_mut(node) {
            entry.pos = None;
        }
        if pos < self.order.len() {
            let pos = self.sift_up(pos);
            self.sift_down(pos);
        }
        Ok(())
    }

    /// Mutate a node's value, then restore heap order around it
    pub fn with_mut<R>(&mut self, node: NodeId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let entry = self.entry_mut(node)?;
        let result = f(&mut entry.value);
        let pos = entry.pos;
        if let Some(pos) = pos {
            if self.order.get(pos as usize) == Some(&node) {
                let pos = self.sift_up(pos as usize);
                self.sift_down(pos);
            }
        }
        Some(result)
    }

    /// Replace a node's value
    pub fn update(&mut self, node: NodeId, value: T) -> GridResult<()> {
        self.with_mut(node, |v| *v = value)
            .ok_or(ErrorCode::InvalidArgument)
    }

    /// Forget the heap content without touching the nodes
    ///
    /// Former members keep a stale position until pushed again or
    /// deep-cleared.
    pub fn fast_clear(&mut self) {
        self.order.clear();
    }

    /// Empty the heap, leaving every allocated node orphan
    pub fn deep_clear(&mut self) {
        self.order.clear();
        for entry in self.slots.iter_mut().flatten() {
            entry.pos = None;
        }
    }

    /// Verify heap ordering and position back-pointers
    pub fn check(&self) -> bool {
        for (i, node) in self.order.iter().enumerate() {
            match self.entry(*node) {
                Some(entry) if entry.pos == Some(i as u16) => {}
                _ => return false,
            }
            if i > 0 && self.less_at((i - 1) / 2, i) {
                return false;
            }
        }
        true
    }

    /// Heap members in array order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |&node| self.get(node).map(|v| (node, v)))
    }

    fn less_at(&self, i: usize, j: usize) -> bool {
        match (self.get(self.order[i]), self.get(self.order[j])) {
            (Some(a), Some(b)) => self.cmp.less(a, b),
            _ => false,
        }
    }

    fn swap_positions(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.order.swap(i, j);
        let (a, b) = (self.order[i], self.order[j]);
        if let Some(entry) = self.entry_mut(a) {
            entry.pos = Some(i as u16);
        }
        if let Some(entry) = self.entry_mut(b) {
            entry.pos = Some(j as u16);
        }
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less_at(parent, pos) {
                break;
            }
            self.swap_positions(parent, pos);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.order.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut largest = pos;
            if left < len && self.less_at(largest, left) {
                largest = left;
            }
            if right < len && self.less_at(largest, right) {
                largest = right;
            }
            if largest == pos {
                return pos;
            }
            self.swap_positions(pos, largest);
            pos = largest;
        }
    }
}

impl<T: Ord, const N: usize> Default for Heap<T, NaturalOrder, N> {
    fn default() -> Self {
        Self::new(NaturalOrder)
    }
}
