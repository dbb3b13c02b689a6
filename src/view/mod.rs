//! Live List Views
//!
//! Views are cheap handles bound to a node and a `Filter`. They hold no
//! items of their own; every call reads the node's current backing store
//! through the `Document` passed in, so any number of views over the
//! same node stay consistent with each other and with wholesale
//! replacement of the store.
//!
//! - `FilteredView`: predicate-restricted list over one axis of a node
//! - `SubView`: fixed window over a `FilteredView`
//! - `Cursor`: bidirectional, fail-fast position over either
//! - `ViewIter`: borrowing iterator (the borrow rules out interference)

pub mod cursor;
pub mod filter;
pub mod filtered;
pub mod sub;

pub use cursor::Cursor;
pub use filter::Filter;
pub use filtered::FilteredView;
pub use sub::SubView;

use crate::dom::{Document, NodeId};
use crate::error::{DomError, Result};

/// List operations shared by `FilteredView` and `SubView`
///
/// Reads take `&Document`, writes take `&mut Document`. Indices are
/// positions within the view, not within the backing store.
pub trait ListView: Sized {
    /// Number of items currently in the view
    fn size(&self, doc: &Document) -> usize;

    fn get(&self, doc: &Document, index: usize) -> Result<NodeId>;

    /// Replace the item at `index`, returning the detached old item
    fn set(&self, doc: &mut Document, index: usize, item: NodeId) -> Result<NodeId>;

    /// Insert `item` so that it ends up at `index` (`index <= size`)
    fn insert(&self, doc: &mut Document, index: usize, item: NodeId) -> Result<()>;

    /// Remove and detach the item at `index`
    fn remove(&self, doc: &mut Document, index: usize) -> Result<NodeId>;

    /// Insert every item from `index` on; all-or-nothing
    fn insert_all(&self, doc: &mut Document, index: usize, items: &[NodeId]) -> Result<()>;

    /// Generation of the store the view reads
    fn generation(&self, doc: &Document) -> u64;

    fn is_empty(&self, doc: &Document) -> bool {
        self.size(doc) == 0
    }

    fn index_of(&self, doc: &Document, item: NodeId) -> Option<usize> {
        self.iter(doc).position(|id| id == item)
    }

    fn last_index_of(&self, doc: &Document, item: NodeId) -> Option<usize> {
        let size = self.size(doc);
        self.iter(doc).rev().position(|id| id == item).map(|i| size - 1 - i)
    }

    fn contains(&self, doc: &Document, item: NodeId) -> bool {
        self.index_of(doc, item).is_some()
    }

    fn contains_all(&self, doc: &Document, items: &[NodeId]) -> bool {
        items.iter().all(|&item| self.contains(doc, item))
    }

    /// Snapshot of the current items; later changes do not show up in it
    fn to_vec(&self, doc: &Document) -> Vec<NodeId> {
        self.iter(doc).collect()
    }

    /// Append a snapshot of the current items to `dst`
    fn copy_into(&self, doc: &Document, dst: &mut Vec<NodeId>) {
        dst.extend(self.iter(doc));
    }

    /// Append at the end of the view
    fn push(&self, doc: &mut Document, item: NodeId) -> Result<()> {
        let size = self.size(doc);
        self.insert(doc, size, item)
    }

    /// Append every item; all-or-nothing
    fn add_all(&self, doc: &mut Document, items: &[NodeId]) -> Result<()> {
        let size = self.size(doc);
        self.insert_all(doc, size, items)
    }

    /// Remove `item` if the view holds it
    fn remove_item(&self, doc: &mut Document, item: NodeId) -> Result<bool> {
        match self.index_of(doc, item) {
            Some(index) => self.remove(doc, index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Remove every listed item the view holds; true if anything changed
    fn remove_all(&self, doc: &mut Document, items: &[NodeId]) -> Result<bool> {
        let mut changed = false;
        for &item in items {
            changed |= self.remove_item(doc, item)?;
        }
        Ok(changed)
    }

    /// Remove every item not listed in `keep`; true if anything changed
    fn retain_all(&self, doc: &mut Document, keep: &[NodeId]) -> Result<bool> {
        let mut changed = false;
        for index in (0..self.size(doc)).rev() {
            if !keep.contains(&self.get(doc, index)?) {
                self.remove(doc, index)?;
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Remove every item of the view; items outside it stay
    fn clear(&self, doc: &mut Document) -> Result<()> {
        for index in (0..self.size(doc)).rev() {
            self.remove(doc, index)?;
        }
        Ok(())
    }

    fn iter<'a>(&'a self, doc: &'a Document) -> ViewIter<'a, Self> {
        ViewIter {
            view: self,
            doc,
            front: 0,
            back: self.size(doc),
        }
    }

    /// Cursor positioned before the first item
    fn cursor<'v>(&'v self, doc: &Document) -> Cursor<'v, Self> {
        Cursor::new(self, doc)
    }

    /// Cursor positioned before item `start` (`start <= size`)
    fn cursor_at<'v>(&'v self, doc: &Document, start: usize) -> Result<Cursor<'v, Self>> {
        let size = self.size(doc);
        if start > size {
            return Err(DomError::IndexOutOfRange { index: start, size });
        }
        Ok(Cursor::starting_at(self, doc, start))
    }
}

/// Borrowing iterator over a view
pub struct ViewIter<'a, V> {
    view: &'a V,
    doc: &'a Document,
    front: usize,
    back: usize,
}

impl<'a, V: ListView> Iterator for ViewIter<'a, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let id = self.view.get(self.doc, self.front).ok()?;
        self.front += 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, V: ListView> DoubleEndedIterator for ViewIter<'a, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let id = self.view.get(self.doc, self.back - 1).ok()?;
        self.back -= 1;
        Some(id)
    }
}

impl<'a, V: ListView> ExactSizeIterator for ViewIter<'a, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DOCUMENT_NODE;
    use pretty_assertions::assert_eq;

    /// `foo` holding `[T1, bar, T2, baz, T3, C1, quux, T4]`
    struct Fixture {
        doc: Document,
        foo: NodeId,
        content: Vec<NodeId>,
        bar: NodeId,
        baz: NodeId,
        quux: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let foo = doc.create_element("foo").unwrap();
        doc.set_root_element(foo).unwrap();
        let t1 = doc.create_text("T1").unwrap();
        let bar = doc.create_element("bar").unwrap();
        let t2 = doc.create_text("T2").unwrap();
        let baz = doc.create_element("baz").unwrap();
        let t3 = doc.create_text("T3").unwrap();
        let c1 = doc.create_comment("C1").unwrap();
        let quux = doc.create_element("quux").unwrap();
        let t4 = doc.create_text("T4").unwrap();
        let content = vec![t1, bar, t2, baz, t3, c1, quux, t4];
        doc.replace_content(foo, content.iter().copied()).unwrap();
        Fixture {
            doc,
            foo,
            content,
            bar,
            baz,
            quux,
        }
    }

    #[test]
    fn test_canonical_fixture() {
        let f = fixture();
        let content = f.doc.content_view(f.foo);
        assert_eq!(content.size(&f.doc), 8);
        for (i, &id) in f.content.iter().enumerate() {
            assert_eq!(content.index_of(&f.doc, id), Some(i));
        }

        let children = f.doc.children_view(f.foo);
        assert_eq!(children.size(&f.doc), 3);
        assert_eq!(children.index_of(&f.doc, f.bar), Some(0));
        assert_eq!(children.index_of(&f.doc, f.baz), Some(1));
        assert_eq!(children.index_of(&f.doc, f.quux), Some(2));
        for &id in &f.content {
            if ![f.bar, f.baz, f.quux].contains(&id) {
                assert_eq!(children.index_of(&f.doc, id), None);
            }
        }
    }

    #[test]
    fn test_mutation_propagation() {
        let mut f = fixture();
        let doc = &mut f.doc;
        let content = doc.content_view(f.foo);
        let children = doc.children_view(f.foo);
        let c2 = doc.create_comment("C2").unwrap();
        let c3 = doc.create_comment("C3").unwrap();

        assert_eq!(children.remove(doc, 1).unwrap(), f.baz);
        content.insert(doc, 1, c2).unwrap();
        assert_eq!(content.remove(doc, 3).unwrap(), f.content[2]);
        assert_eq!(content.set(doc, 2, c3).unwrap(), f.bar);

        let expected = vec![
            f.content[0],
            c2,
            c3,
            f.content[4],
            f.content[5],
            f.quux,
            f.content[7],
        ];
        assert_eq!(content.to_vec(doc), expected);
        assert_eq!(content.size(doc), 7);
        assert_eq!(doc.owner(f.bar), None);
        assert_eq!(doc.owner(f.baz), None);
        assert_eq!(doc.owner(f.quux), Some(f.foo));
        assert_eq!(children.to_vec(doc), vec![f.quux]);
        doc.assert_consistent();
    }

    #[test]
    fn test_view_tracks_growth() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        doc.set_root_element(root).unwrap();
        let content = doc.content_view(root);
        let mut kids = Vec::new();
        for _ in 0..20 {
            let kid = doc.create_element("kid").unwrap();
            content.push(&mut doc, kid).unwrap();
            kids.push(kid);
        }

        let view = doc.children_named(root, "kid");
        assert_eq!(view.size(&doc), 20);
        for _ in 0..20 {
            let kid = doc.create_element("kid").unwrap();
            doc.content_view(root).push(&mut doc, kid).unwrap();
            kids.push(kid);
        }
        assert_eq!(view.size(&doc), 40);
        assert_eq!(view.to_vec(&doc), kids);
    }

    #[test]
    fn test_wholesale_replace_is_seen() {
        let mut doc = Document::new();
        let el = doc.create_element("el").unwrap();
        doc.set_attribute(el, "only", "1").unwrap();
        let attrs = doc.attributes_view(el);
        assert_eq!(attrs.size(&doc), 1);

        let a = doc.create_attribute("a", "1").unwrap();
        let b = doc.create_attribute("b", "2").unwrap();
        doc.replace_attributes(el, [a, b]).unwrap();
        assert_eq!(attrs.size(&doc), 2);
        assert_eq!(attrs.to_vec(&doc), vec![a, b]);
    }

    #[test]
    fn test_cursor_contract() {
        let mut f = fixture();
        let doc = &mut f.doc;
        let children = doc.children_view(f.foo);
        let mut cursor = children.cursor(doc);
        let mut added = 0;
        while cursor.has_next(doc) {
            cursor.next(doc).unwrap();
            for _ in 0..2 {
                let x = doc.create_element("x").unwrap();
                cursor.add(doc, x).unwrap();
                added += 1;
            }
        }
        assert_eq!(children.size(doc), 3 + added);

        let tail = doc.create_element("tail").unwrap();
        cursor.add(doc, tail).unwrap();
        assert_eq!(cursor.previous(doc).unwrap(), tail);
        let y = doc.create_element("y").unwrap();
        assert_eq!(cursor.set(doc, y).unwrap(), tail);
        assert_eq!(doc.owner(tail), None);
        assert_eq!(cursor.remove(doc).unwrap(), y);
        assert_eq!(doc.owner(y), None);
        assert!(!children.contains(doc, y));
        assert_eq!(children.size(doc), 3 + added);
        doc.assert_consistent();
    }

    #[test]
    fn test_iterators() {
        let f = fixture();
        let children = f.doc.children_view(f.foo);
        let forward: Vec<_> = children.iter(&f.doc).collect();
        let mut backward: Vec<_> = children.iter(&f.doc).rev().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(children.iter(&f.doc).len(), 3);
        assert_eq!(children.last_index_of(&f.doc, f.quux), Some(2));
    }

    #[test]
    fn test_snapshot_is_not_live() {
        let mut f = fixture();
        let content = f.doc.content_view(f.foo);
        let snapshot = content.to_vec(&f.doc);
        let mut copied = vec![DOCUMENT_NODE];
        content.copy_into(&f.doc, &mut copied);
        content.clear(&mut f.doc).unwrap();
        assert_eq!(snapshot, f.content);
        assert_eq!(&copied[1..], &f.content[..]);
        assert!(content.is_empty(&f.doc));
    }

    #[test]
    fn test_bulk_readd_fails_whole() {
        let mut f = fixture();
        let doc = &mut f.doc;
        let children = doc.children_view(f.foo);
        let fresh = doc.create_element("fresh").unwrap();
        let batch = [fresh, f.bar];
        let err = children.add_all(doc, &batch).unwrap_err();
        assert!(matches!(err, DomError::BulkConflict { position: 1, .. }));
        assert_eq!(doc.owner(fresh), None);
        assert_eq!(children.size(doc), 3);

        let others = doc.create_element("others").unwrap();
        let kids = children.to_vec(doc);
        let target = doc.children_view(others);
        assert!(target.add_all(doc, &kids).is_err());
        assert!(target.is_empty(doc));
    }

    #[test]
    fn test_remove_and_retain() {
        let mut f = fixture();
        let doc = &mut f.doc;
        let content = doc.content_view(f.foo);
        let children = doc.children_view(f.foo);
        assert!(children.remove_item(doc, f.baz).unwrap());
        assert!(!children.remove_item(doc, f.baz).unwrap());
        // a text item is not in the element view
        assert!(!children.remove_item(doc, f.content[0]).unwrap());

        assert!(children.retain_all(doc, &[f.quux]).unwrap());
        assert_eq!(children.to_vec(doc), vec![f.quux]);
        assert_eq!(content.size(doc), 6);
        assert!(!children.remove_all(doc, &[f.bar]).unwrap());
        assert!(children.contains_all(doc, &[f.quux]));
        doc.assert_consistent();
    }
}
