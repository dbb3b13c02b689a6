//! Cursor
//!
//! Bidirectional position over a view, sitting between item
//! `position - 1` and item `position`. Unlike `ViewIter` it does not
//! hold the document, so the document can be changed between steps. It
//! remembers the store generation it last saw: `next`/`previous` fail
//! with `ConcurrentModification` if someone else changed the store in
//! the meantime. Changes made through the cursor itself refresh the
//! snapshot and are never reported.

use tracing::debug;

use super::ListView;
use crate::dom::{Document, NodeId};
use crate::error::{DomError, Result};

pub struct Cursor<'v, V: ListView> {
    view: &'v V,
    position: usize,
    /// View index of the item last returned by `next`/`previous`
    last_returned: Option<usize>,
    expected: u64,
}

impl<'v, V: ListView> Cursor<'v, V> {
    pub(crate) fn new(view: &'v V, doc: &Document) -> Self {
        Self::starting_at(view, doc, 0)
    }

    pub(crate) fn starting_at(view: &'v V, doc: &Document, position: usize) -> Self {
        Cursor {
            view,
            position,
            last_returned: None,
            expected: view.generation(doc),
        }
    }

    /// Never fails, even after outside changes
    pub fn has_next(&self, doc: &Document) -> bool {
        self.position < self.view.size(doc)
    }

    pub fn has_previous(&self) -> bool {
        self.position > 0
    }

    /// Index `next` would return
    pub fn next_index(&self) -> usize {
        self.position
    }

    /// Index `previous` would return
    pub fn previous_index(&self) -> Option<usize> {
        self.position.checked_sub(1)
    }

    fn check_generation(&self, doc: &Document) -> Result<()> {
        let found = self.view.generation(doc);
        if found == self.expected {
            return Ok(());
        }
        debug!(expected = self.expected, found, "cursor saw a foreign change");
        Err(DomError::ConcurrentModification {
            expected: self.expected,
            found,
        })
    }

    fn refresh(&mut self, doc: &Document) {
        self.expected = self.view.generation(doc);
    }

    pub fn next(&mut self, doc: &Document) -> Result<NodeId> {
        self.check_generation(doc)?;
        if self.position >= self.view.size(doc) {
            return Err(DomError::NoSuchElement);
        }
        let item = self.view.get(doc, self.position)?;
        self.last_returned = Some(self.position);
        self.position += 1;
        Ok(item)
    }

    pub fn previous(&mut self, doc: &Document) -> Result<NodeId> {
        self.check_generation(doc)?;
        let Some(index) = self.position.checked_sub(1) else {
            return Err(DomError::NoSuchElement);
        };
        let item = self.view.get(doc, index)?;
        self.position = index;
        self.last_returned = Some(index);
        Ok(item)
    }

    /// Remove the item last returned by `next`/`previous`
    pub fn remove(&mut self, doc: &mut Document) -> Result<NodeId> {
        let index = self.last_returned.ok_or(DomError::NoCurrentElement)?;
        let item = self.view.remove(doc, index)?;
        if index < self.position {
            self.position -= 1;
        }
        self.last_returned = None;
        self.refresh(doc);
        Ok(item)
    }

    /// Replace the item last returned by `next`/`previous`
    pub fn set(&mut self, doc: &mut Document, item: NodeId) -> Result<NodeId> {
        let index = self.last_returned.ok_or(DomError::NoCurrentElement)?;
        let old = self.view.set(doc, index, item)?;
        self.refresh(doc);
        Ok(old)
    }

    /// Insert before the cursor; a following `previous` returns `item`
    pub fn add(&mut self, doc: &mut Document, item: NodeId) -> Result<()> {
        self.view.insert(doc, self.position, item)?;
        self.position += 1;
        self.last_returned = None;
        self.refresh(doc);
        Ok(())
    }
}
