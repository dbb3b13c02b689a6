//! Error taxonomy for the content model
//!
//! Every failure is synchronous and local. Validation always happens
//! before a store is touched, so an `Err` means nothing changed.

use crate::dom::{NodeId, NodeKind};

/// Errors raised by stores, views and cursors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Index outside `[0, size)` (or `[0, size]` for insertion)
    #[error("index {index} out of range for size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Item does not satisfy the view's membership filter
    #[error("{kind:?} node {item} is not accepted by this view")]
    TypeMismatch { item: NodeId, kind: NodeKind },

    /// Item still belongs to a node and must be detached first
    #[error("node {item} is already attached to node {owner}")]
    OwnershipConflict { item: NodeId, owner: NodeId },

    /// A cursor saw a structural change it did not make itself
    #[error("store changed underneath cursor (expected generation {expected}, found {found})")]
    ConcurrentModification { expected: u64, found: u64 },

    /// One element of a bulk operation was invalid; nothing was applied
    #[error("bulk operation rejected at position {position}: {source}")]
    BulkConflict {
        position: usize,
        #[source]
        source: Box<DomError>,
    },

    /// `next`/`previous` ran past the end of the view
    #[error("no more elements")]
    NoSuchElement,

    /// `remove`/`set` on a cursor with no current element
    #[error("cursor has no current element")]
    NoCurrentElement,

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The node has no store for the requested axis
    #[error("node {0} cannot hold this kind of content")]
    NotAContainer(NodeId),

    /// Structural rule violation (cycle, second root, duplicate attribute...)
    #[error("cannot add node {item}: {reason}")]
    IllegalAdd { item: NodeId, reason: &'static str },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid {kind:?} data: {reason}")]
    InvalidData { kind: NodeKind, reason: &'static str },
}

impl DomError {
    /// Wrap an error raised while checking element `position` of a batch
    pub(crate) fn in_bulk(self, position: usize) -> Self {
        DomError::BulkConflict {
            position,
            source: Box::new(self),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DomError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_bulk_conflict_keeps_source() {
        let err = DomError::OwnershipConflict { item: 4, owner: 1 }.in_bulk(2);
        assert!(matches!(err, DomError::BulkConflict { position: 2, .. }));
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("node 4 is already attached to node 1"));
    }

    #[test]
    fn test_display() {
        let err = DomError::IndexOutOfRange { index: 5, size: 3 };
        assert_eq!(err.to_string(), "index 5 out of range for size 3");
    }
}
