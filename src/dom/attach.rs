//! Attach / Detach
//!
//! The only code that mutates backing stores. Each operation validates
//! every precondition first, then touches the store (one generation bump
//! per item) and updates the `owner` back-reference of every item that
//! entered or left, before returning.

use tracing::{debug, instrument, trace};

use super::document::Document;
use super::node::{Axis, NodeId, NodeKind, DOCUMENT_NODE};
use crate::error::{DomError, Result};

/// Where a candidate item is going
#[derive(Debug, Clone, Copy)]
struct Placement<'a> {
    /// Backing index being overwritten, excluded from conflict checks
    replacing: Option<usize>,
    /// The whole store is being swapped; existing items do not count
    wholesale: bool,
    /// Items of the same batch that precede the candidate
    earlier: &'a [NodeId],
}

impl Placement<'static> {
    const INSERT: Self = Placement {
        replacing: None,
        wholesale: false,
        earlier: &[],
    };
}

impl Document {
    fn set_owner(&mut self, item: NodeId, owner: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(item as usize) {
            node.owner = owner;
        }
    }

    /// Can `item` go into the `axis` store of `parent`?
    fn admit(&self, parent: NodeId, axis: Axis, item: NodeId, at: Placement<'_>) -> Result<()> {
        let node = self.node(item)?;
        let store = self.store(parent, axis)?;
        let kind = node.kind;

        if kind.axis() != Some(axis) {
            return Err(DomError::IllegalAdd {
                item,
                reason: "node kind does not belong in this store",
            });
        }

        match node.owner {
            Some(owner) if !(at.wholesale && owner == parent) => {
                return Err(DomError::OwnershipConflict { item, owner });
            }
            _ => {}
        }
        if at.earlier.contains(&item) {
            return Err(DomError::IllegalAdd {
                item,
                reason: "node appears twice in one operation",
            });
        }

        // existing items that will still be there afterwards
        let survivors = store
            .items()
            .iter()
            .enumerate()
            .filter(|&(i, _)| !at.wholesale && Some(i) != at.replacing)
            .map(|(_, &id)| id);
        let mut neighbours = survivors.chain(at.earlier.iter().copied());

        if parent == DOCUMENT_NODE {
            match kind {
                NodeKind::Element => {
                    if neighbours.any(|id| self.kind(id) == Some(NodeKind::Element)) {
                        return Err(DomError::IllegalAdd {
                            item,
                            reason: "the document already has a root element",
                        });
                    }
                }
                NodeKind::Comment | NodeKind::ProcessingInstruction => {}
                _ => {
                    return Err(DomError::IllegalAdd {
                        item,
                        reason: "not allowed at document level",
                    })
                }
            }
            return Ok(());
        }

        match kind {
            NodeKind::Element => {
                if item == parent || self.is_ancestor(item, parent) {
                    return Err(DomError::IllegalAdd {
                        item,
                        reason: "an element cannot contain itself or an ancestor",
                    });
                }
            }
            NodeKind::Attribute => {
                let clash = neighbours.any(|id| {
                    self.get_node(id).is_some_and(|other| {
                        other.name_id == node.name_id && other.namespace_id == node.namespace_id
                    })
                });
                if clash {
                    return Err(DomError::IllegalAdd {
                        item,
                        reason: "duplicate attribute",
                    });
                }
            }
            NodeKind::NamespaceDecl => {
                let clash = neighbours.any(|id| {
                    self.get_node(id)
                        .is_some_and(|other| other.name_id == node.name_id)
                });
                if clash {
                    return Err(DomError::IllegalAdd {
                        item,
                        reason: "prefix is already declared on this element",
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Check a whole batch, reporting the first bad element
    fn admit_batch(&self, parent: NodeId, axis: Axis, items: &[NodeId], wholesale: bool) -> Result<()> {
        for (position, &item) in items.iter().enumerate() {
            let at = Placement {
                replacing: None,
                wholesale,
                earlier: &items[..position],
            };
            if let Err(err) = self.admit(parent, axis, item, at) {
                debug!(parent, position, error = %err, "rejected bulk operation");
                return Err(err.in_bulk(position));
            }
        }
        Ok(())
    }

    pub(crate) fn insert_item(&mut self, parent: NodeId, axis: Axis, index: usize, item: NodeId) -> Result<()> {
        let size = self.store(parent, axis)?.len();
        if index > size {
            return Err(DomError::IndexOutOfRange { index, size });
        }
        self.admit(parent, axis, item, Placement::INSERT)?;

        let store = self.store_mut(parent, axis)?;
        store.insert_at(index, item)?;
        let generation = store.generation();
        self.set_owner(item, Some(parent));
        trace!(parent, ?axis, index, item, generation, "inserted");
        Ok(())
    }

    /// Insert `items` contiguously from backing index `index`. Nothing is
    /// inserted unless every item is acceptable.
    pub(crate) fn insert_items(&mut self, parent: NodeId, axis: Axis, index: usize, items: &[NodeId]) -> Result<()> {
        let size = self.store(parent, axis)?.len();
        if index > size {
            return Err(DomError::IndexOutOfRange { index, size });
        }
        self.admit_batch(parent, axis, items, false)?;

        for (offset, &item) in items.iter().enumerate() {
            let store = self.store_mut(parent, axis)?;
            store.insert_at(index + offset, item)?;
            let generation = store.generation();
            self.set_owner(item, Some(parent));
            trace!(parent, ?axis, index = index + offset, item, generation, "inserted");
        }
        Ok(())
    }

    pub(crate) fn remove_item_at(&mut self, parent: NodeId, axis: Axis, index: usize) -> Result<NodeId> {
        let store = self.store_mut(parent, axis)?;
        let item = store.remove_at(index)?;
        let generation = store.generation();
        self.set_owner(item, None);
        trace!(parent, ?axis, index, item, generation, "removed");
        Ok(item)
    }

    pub(crate) fn replace_item_at(&mut self, parent: NodeId, axis: Axis, index: usize, item: NodeId) -> Result<NodeId> {
        let size = self.store(parent, axis)?.len();
        if index >= size {
            return Err(DomError::IndexOutOfRange { index, size });
        }
        let at = Placement {
            replacing: Some(index),
            ..Placement::INSERT
        };
        self.admit(parent, axis, item, at)?;

        let store = self.store_mut(parent, axis)?;
        let old = store.replace_at(index, item)?;
        let generation = store.generation();
        self.set_owner(old, None);
        self.set_owner(item, Some(parent));
        trace!(parent, ?axis, index, old, item, generation, "replaced");
        Ok(old)
    }

    /// Swap a whole store in place. Views bound to `parent` see the new
    /// items on their next call.
    #[instrument(level = "trace", skip(self, items), fields(count = items.len()))]
    pub(crate) fn replace_store(&mut self, parent: NodeId, axis: Axis, items: Vec<NodeId>) -> Result<Vec<NodeId>> {
        self.store(parent, axis)?;
        self.admit_batch(parent, axis, &items, true)?;

        let store = self.store_mut(parent, axis)?;
        let old = store.replace_all(items);
        let generation = store.generation();
        for &id in &old {
            self.set_owner(id, None);
        }
        let new = self.store(parent, axis)?.items().to_vec();
        for id in new {
            self.set_owner(id, Some(parent));
        }
        debug!(parent, ?axis, removed = old.len(), generation, "replaced store");
        Ok(old)
    }

    pub(crate) fn clear_store(&mut self, parent: NodeId, axis: Axis) -> Result<Vec<NodeId>> {
        let store = self.store_mut(parent, axis)?;
        let old = store.clear();
        let generation = store.generation();
        for &id in &old {
            self.set_owner(id, None);
        }
        trace!(parent, ?axis, removed = old.len(), generation, "cleared");
        Ok(old)
    }

    /// Rewrite the given backing slots with a permutation of their items
    pub(crate) fn permute_store(&mut self, parent: NodeId, axis: Axis, slots: &[usize], items: &[NodeId]) -> Result<()> {
        let store = self.store_mut(parent, axis)?;
        store.permute(slots, items);
        trace!(parent, ?axis, count = items.len(), generation = store.generation(), "reordered");
        Ok(())
    }

    /// Remove `item` from whatever holds it. Returns the former owner;
    /// detaching a detached item does nothing.
    pub fn detach(&mut self, item: NodeId) -> Option<NodeId> {
        let node = self.get_node(item)?;
        let owner = node.owner?;
        let axis = node.kind.axis()?;
        let index = self.store(owner, axis).ok()?.position(item)?;
        self.remove_item_at(owner, axis, index).ok()?;
        Some(owner)
    }
}
