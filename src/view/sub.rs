//! Sub View
//!
//! A window `[offset, offset + len)` over a `FilteredView`. The bounds
//! are fixed when the window is created: changes made elsewhere do not
//! move them. Inserting or removing through the window itself grows or
//! shrinks it, and the change is visible through the base view at the
//! corresponding position.

use std::cell::Cell;

use super::filtered::FilteredView;
use super::ListView;
use crate::dom::{Document, NodeId};
use crate::error::{DomError, Result};

/// Not `Clone`: the window length is per handle and grows or shrinks
/// only through that handle's own mutators.
#[derive(Debug)]
pub struct SubView {
    base: FilteredView,
    offset: usize,
    len: Cell<usize>,
}

impl SubView {
    pub(crate) fn new(base: FilteredView, offset: usize, len: usize) -> Self {
        SubView {
            base,
            offset,
            len: Cell::new(len),
        }
    }

    pub fn base(&self) -> &FilteredView {
        &self.base
    }

    /// Index in the base view of this window's first item
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn check(&self, doc: &Document, index: usize) -> Result<usize> {
        let size = self.size(doc);
        if index < size {
            Ok(self.offset + index)
        } else {
            Err(DomError::IndexOutOfRange { index, size })
        }
    }

    fn check_insert(&self, doc: &Document, index: usize) -> Result<usize> {
        let size = self.size(doc);
        if index <= size {
            Ok(self.offset + index)
        } else {
            Err(DomError::IndexOutOfRange { index, size })
        }
    }

    /// Window `[from, to)` of this window, over the same base
    pub fn sub_view(&self, doc: &Document, from: usize, to: usize) -> Result<SubView> {
        let size = self.size(doc);
        if to > size {
            return Err(DomError::IndexOutOfRange { index: to, size });
        }
        if from > to {
            return Err(DomError::IndexOutOfRange { index: from, size: to });
        }
        Ok(SubView::new(self.base.clone(), self.offset + from, to - from))
    }
}

impl ListView for SubView {
    /// The window length, clipped to what the base view still holds
    fn size(&self, doc: &Document) -> usize {
        let available = self.base.size(doc).saturating_sub(self.offset);
        self.len.get().min(available)
    }

    fn get(&self, doc: &Document, index: usize) -> Result<NodeId> {
        let at = self.check(doc, index)?;
        self.base.get(doc, at)
    }

    fn set(&self, doc: &mut Document, index: usize, item: NodeId) -> Result<NodeId> {
        let at = self.check(doc, index)?;
        self.base.set(doc, at, item)
    }

    fn insert(&self, doc: &mut Document, index: usize, item: NodeId) -> Result<()> {
        let at = self.check_insert(doc, index)?;
        self.base.insert(doc, at, item)?;
        self.len.set(self.len.get() + 1);
        Ok(())
    }

    fn remove(&self, doc: &mut Document, index: usize) -> Result<NodeId> {
        let at = self.check(doc, index)?;
        let item = self.base.remove(doc, at)?;
        self.len.set(self.len.get() - 1);
        Ok(item)
    }

    fn insert_all(&self, doc: &mut Document, index: usize, items: &[NodeId]) -> Result<()> {
        let at = self.check_insert(doc, index)?;
        self.base.insert_all(doc, at, items)?;
        self.len.set(self.len.get() + items.len());
        Ok(())
    }

    fn generation(&self, doc: &Document) -> u64 {
        self.base.generation(doc)
    }
}
