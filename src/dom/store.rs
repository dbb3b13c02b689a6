//! Backing Store
//!
//! The ordered item sequence of one container axis, plus the generation
//! counter every view and cursor over that axis compares against.
//!
//! The store only knows about ids. Ownership bookkeeping (the `owner`
//! field of the items) is maintained by `Document`, which is the only
//! caller of the mutating methods here.

use super::node::NodeId;
use crate::error::{DomError, Result};

/// Ordered item ids plus a structural generation counter
#[derive(Debug, Clone, Default)]
pub struct BackingStore {
    items: Vec<NodeId>,
    generation: u64,
}

impl BackingStore {
    /// Create an empty store
    pub fn new() -> Self {
        BackingStore {
            items: Vec::new(),
            generation: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at backing index `i`
    #[inline]
    pub fn get(&self, i: usize) -> Option<NodeId> {
        self.items.get(i).copied()
    }

    #[inline]
    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    /// Structural generation; bumps once per structural mutation
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Backing index of an item, by identity
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.items.iter().position(|&item| item == id)
    }

    #[inline]
    fn bump(&mut self) {
        self.generation += 1;
    }

    pub(crate) fn insert_at(&mut self, i: usize, id: NodeId) -> Result<()> {
        if i > self.items.len() {
            return Err(DomError::IndexOutOfRange {
                index: i,
                size: self.items.len(),
            });
        }
        self.items.insert(i, id);
        self.bump();
        Ok(())
    }

    pub(crate) fn remove_at(&mut self, i: usize) -> Result<NodeId> {
        if i >= self.items.len() {
            return Err(DomError::IndexOutOfRange {
                index: i,
                size: self.items.len(),
            });
        }
        let old = self.items.remove(i);
        self.bump();
        Ok(old)
    }

    pub(crate) fn replace_at(&mut self, i: usize, id: NodeId) -> Result<NodeId> {
        let size = self.items.len();
        let slot = self
            .items
            .get_mut(i)
            .ok_or(DomError::IndexOutOfRange { index: i, size })?;
        let old = std::mem::replace(slot, id);
        self.bump();
        Ok(old)
    }

    /// Swap the whole sequence in place, returning the previous items
    pub(crate) fn replace_all(&mut self, items: Vec<NodeId>) -> Vec<NodeId> {
        let old = std::mem::replace(&mut self.items, items);
        self.bump();
        old
    }

    pub(crate) fn clear(&mut self) -> Vec<NodeId> {
        self.replace_all(Vec::new())
    }

    /// Rewrite the items at `slots` (ascending backing indices) with
    /// `items`, in order. Counts as one structural mutation.
    pub(crate) fn permute(&mut self, slots: &[usize], items: &[NodeId]) {
        debug_assert_eq!(slots.len(), items.len());
        for (&slot, &id) in slots.iter().zip(items) {
            self.items[slot] = id;
        }
        self.bump();
    }

    /// Fill a freshly created store without counting a mutation
    pub(crate) fn populate(&mut self, items: Vec<NodeId>) {
        debug_assert!(self.items.is_empty());
        self.items = items;
    }
}
