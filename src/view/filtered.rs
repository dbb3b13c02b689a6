//! Filtered View
//!
//! A list over the items of one node's store that satisfy a `Filter`.
//! The k-th item of the view is always the k-th matching item of the
//! store as it is *now*; nothing is copied.
//!
//! Translation from view index to backing index is a scan. With the
//! `index-hint` feature the last translation (and the filtered size) is
//! remembered per view, keyed by document instance and store generation,
//! so sequential access costs O(1) per step and a stale hint is simply
//! ignored.

use std::cell::Cell;
use std::cmp::Ordering;

use super::filter::Filter;
use super::sub::SubView;
use super::ListView;
use crate::dom::{Axis, BackingStore, Document, NodeId};
use crate::error::{DomError, Result};

/// Which store state a cached answer belongs to: a view can be handed
/// a clone of its document whose store reached the same generation by
/// other edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    stamp: u64,
    generation: u64,
}

impl CacheKey {
    fn of(doc: &Document, store: &BackingStore) -> Self {
        CacheKey {
            stamp: doc.stamp(),
            generation: store.generation(),
        }
    }
}

/// Last successful translation: view index `filtered` sits at backing
/// index `backing` in the store state `key`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexHint {
    key: CacheKey,
    filtered: usize,
    backing: usize,
}

/// Live, predicate-restricted list over a node's store
#[derive(Debug, Clone)]
pub struct FilteredView {
    node: NodeId,
    filter: Filter,
    hint: Cell<Option<IndexHint>>,
    size_hint: Cell<Option<(CacheKey, usize)>>,
}

impl FilteredView {
    pub fn new(node: NodeId, filter: Filter) -> Self {
        FilteredView {
            node,
            filter,
            hint: Cell::new(None),
            size_hint: Cell::new(None),
        }
    }

    /// Node whose store the view reads
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn axis(&self) -> Axis {
        self.filter.axis()
    }

    fn backing<'d>(&self, doc: &'d Document) -> Option<&'d BackingStore> {
        doc.store(self.node, self.axis()).ok()
    }

    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.filter.matches(doc, id)
    }

    /// Reject items the filter does not accept, before any mutation
    fn accept(&self, doc: &Document, item: NodeId) -> Result<()> {
        let kind = doc.kind(item).ok_or(DomError::UnknownNode(item))?;
        if self.matches(doc, item) {
            Ok(())
        } else {
            Err(DomError::TypeMismatch { item, kind })
        }
    }

    fn count(&self, doc: &Document, store: &BackingStore) -> usize {
        store
            .items()
            .iter()
            .filter(|&&id| self.matches(doc, id))
            .count()
    }

    /// Backing index of view index `k`, or `None` past the end
    fn translate(&self, doc: &Document, k: usize) -> Option<usize> {
        let store = self.backing(doc)?;
        let items = store.items();
        if !cfg!(feature = "index-hint") {
            return self.scan_forward(doc, items, 0, 0, k);
        }

        let key = CacheKey::of(doc, store);
        let found = self.translate_hinted(doc, items, key, k);
        if let Some(backing) = found {
            self.hint.set(Some(IndexHint {
                key,
                filtered: k,
                backing,
            }));
        }
        found
    }

    /// Start from whichever known position is nearest to `k`: the front,
    /// the last translation, or the back when the size is known.
    fn translate_hinted(&self, doc: &Document, items: &[NodeId], key: CacheKey, k: usize) -> Option<usize> {
        let hint = self.hint.get().filter(|h| h.key == key);
        let size = self
            .size_hint
            .get()
            .filter(|&(cached, _)| cached == key)
            .map(|(_, size)| size);
        if size.is_some_and(|size| k >= size) {
            return None;
        }

        let mut best = k;
        let mut start: (usize, usize, bool) = (0, 0, true);
        if let Some(h) = hint {
            if k >= h.filtered && k - h.filtered < best {
                best = k - h.filtered;
                start = (h.backing, h.filtered, true);
            } else if k < h.filtered && h.filtered - k < best {
                best = h.filtered - k;
                start = (h.backing + 1, h.filtered + 1, false);
            }
        }
        if let Some(size) = size {
            if size - k < best {
                start = (items.len(), size, false);
            }
        }

        match start {
            (backing, filtered, true) => self.scan_forward(doc, items, backing, filtered, k),
            (backing, filtered, false) => self.scan_backward(doc, items, backing, filtered, k),
        }
    }

    /// `filtered` is the view index of the first match at or after `from`
    fn scan_forward(&self, doc: &Document, items: &[NodeId], from: usize, mut filtered: usize, k: usize) -> Option<usize> {
        for (backing, &id) in items.iter().enumerate().skip(from) {
            if self.matches(doc, id) {
                if filtered == k {
                    return Some(backing);
                }
                filtered += 1;
            }
        }
        None
    }

    /// `filtered` is the number of matches before backing index `until`
    fn scan_backward(&self, doc: &Document, items: &[NodeId], until: usize, mut filtered: usize, k: usize) -> Option<usize> {
        for backing in (0..until.min(items.len())).rev() {
            if self.matches(doc, items[backing]) {
                filtered -= 1;
                if filtered == k {
                    return Some(backing);
                }
            }
        }
        None
    }

    fn out_of_range(&self, doc: &Document, index: usize) -> DomError {
        DomError::IndexOutOfRange {
            index,
            size: self.size(doc),
        }
    }

    /// Backing index an insertion at view index `k` lands on
    fn insertion_point(&self, doc: &Document, k: usize) -> Result<usize> {
        let size = self.size(doc);
        if k > size {
            return Err(DomError::IndexOutOfRange { index: k, size });
        }
        let store = self
            .backing(doc)
            .ok_or(DomError::NotAContainer(self.node))?;
        if k < size {
            self.translate(doc, k)
                .ok_or(DomError::IndexOutOfRange { index: k, size })
        } else {
            Ok(store.len())
        }
    }

    /// Window `[from, to)` of this view
    pub fn sub_view(&self, doc: &Document, from: usize, to: usize) -> Result<SubView> {
        let size = self.size(doc);
        if to > size {
            return Err(DomError::IndexOutOfRange { index: to, size });
        }
        if from > to {
            return Err(DomError::IndexOutOfRange { index: from, size: to });
        }
        Ok(SubView::new(self.clone(), from, to - from))
    }

    /// Stable sort of the view's items among the slots they occupy;
    /// items outside the view keep their positions.
    pub fn sort_by<F>(&self, doc: &mut Document, mut compare: F) -> Result<()>
    where
        F: FnMut(&Document, NodeId, NodeId) -> Ordering,
    {
        let (slots, mut items): (Vec<usize>, Vec<NodeId>) = {
            let doc: &Document = doc;
            let store = doc.store(self.node, self.axis())?;
            store
                .items()
                .iter()
                .enumerate()
                .filter(|&(_, &id)| self.matches(doc, id))
                .map(|(slot, &id)| (slot, id))
                .unzip()
        };
        if items.len() < 2 {
            return Ok(());
        }
        {
            let doc: &Document = doc;
            items.sort_by(|&a, &b| compare(doc, a, b));
        }
        doc.permute_store(self.node, self.axis(), &slots, &items)
    }
}

impl ListView for FilteredView {
    fn size(&self, doc: &Document) -> usize {
        let Some(store) = self.backing(doc) else {
            return 0;
        };
        if !cfg!(feature = "index-hint") {
            return self.count(doc, store);
        }
        let key = CacheKey::of(doc, store);
        if let Some((cached, size)) = self.size_hint.get() {
            if cached == key {
                return size;
            }
        }
        let size = self.count(doc, store);
        self.size_hint.set(Some((key, size)));
        size
    }

    fn get(&self, doc: &Document, index: usize) -> Result<NodeId> {
        self.translate(doc, index)
            .and_then(|backing| self.backing(doc)?.get(backing))
            .ok_or_else(|| self.out_of_range(doc, index))
    }

    fn set(&self, doc: &mut Document, index: usize, item: NodeId) -> Result<NodeId> {
        self.accept(doc, item)?;
        let backing = self
            .translate(doc, index)
            .ok_or_else(|| self.out_of_range(doc, index))?;
        doc.replace_item_at(self.node, self.axis(), backing, item)
    }

    fn insert(&self, doc: &mut Document, index: usize, item: NodeId) -> Result<()> {
        self.accept(doc, item)?;
        let backing = self.insertion_point(doc, index)?;
        doc.insert_item(self.node, self.axis(), backing, item)
    }

    fn remove(&self, doc: &mut Document, index: usize) -> Result<NodeId> {
        let backing = self
            .translate(doc, index)
            .ok_or_else(|| self.out_of_range(doc, index))?;
        doc.remove_item_at(self.node, self.axis(), backing)
    }

    fn insert_all(&self, doc: &mut Document, index: usize, items: &[NodeId]) -> Result<()> {
        for (position, &item) in items.iter().enumerate() {
            self.accept(doc, item).map_err(|err| err.in_bulk(position))?;
        }
        let backing = self.insertion_point(doc, index)?;
        doc.insert_items(self.node, self.axis(), backing, items)
    }

    fn generation(&self, doc: &Document) -> u64 {
        self.backing(doc).map_or(0, BackingStore::generation)
    }

    fn index_of(&self, doc: &Document, item: NodeId) -> Option<usize> {
        if !self.matches(doc, item) {
            return None;
        }
        let store = self.backing(doc)?;
        let mut filtered = 0;
        for &id in store.items() {
            if id == item {
                return Some(filtered);
            }
            if self.matches(doc, id) {
                filtered += 1;
            }
        }
        None
    }

    // an item occupies at most one slot
    fn last_index_of(&self, doc: &Document, item: NodeId) -> Option<usize> {
        self.index_of(doc, item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{KindMask, NodeKind};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn mixed(doc: &mut Document, n: usize) -> (NodeId, Vec<NodeId>) {
        let root = doc.create_element("root").unwrap();
        let mut items = Vec::new();
        for i in 0..n {
            let id = if i % 3 == 0 {
                doc.create_element("e").unwrap()
            } else {
                doc.create_text("t").unwrap()
            };
            items.push(id);
        }
        doc.replace_content(root, items.iter().copied()).unwrap();
        (root, items)
    }

    #[test]
    fn test_random_access_matches_scan() {
        let mut doc = Document::new();
        let (root, items) = mixed(&mut doc, 30);
        let view = doc.children_view(root);
        let expected: Vec<_> = items
            .iter()
            .copied()
            .filter(|&id| doc.kind(id) == Some(NodeKind::Element))
            .collect();
        assert_eq!(view.size(&doc), expected.len());
        for k in [0, 5, 2, 9, 9, 1, 7, 3, 0, 8] {
            assert_eq!(view.get(&doc, k).unwrap(), expected[k]);
        }
        for k in (0..expected.len()).rev() {
            assert_eq!(view.get(&doc, k).unwrap(), expected[k]);
        }
        assert_eq!(
            view.get(&doc, expected.len()),
            Err(DomError::IndexOutOfRange {
                index: expected.len(),
                size: expected.len()
            })
        );
    }

    #[test]
    fn test_stale_hint_recomputes() {
        let mut doc = Document::new();
        let (root, items) = mixed(&mut doc, 9);
        let view = doc.children_view(root);
        assert_eq!(view.get(&doc, 2).unwrap(), items[6]);
        // another view removes the first element; the hint is now stale
        doc.content_view(root).remove(&mut doc, 0).unwrap();
        assert_eq!(view.get(&doc, 1).unwrap(), items[6]);
        assert_eq!(view.size(&doc), 2);
    }

    #[test]
    fn test_hint_is_not_shared_across_clones() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let mut kids = Vec::new();
        for _ in 0..5 {
            kids.push(doc.create_element("e").unwrap());
        }
        doc.replace_content(root, kids.iter().copied()).unwrap();
        let mut copy = doc.clone();

        // both stores end up at the same generation by different edits
        let view = doc.children_view(root);
        view.remove(&mut doc, 0).unwrap();
        let text = copy.create_text("t").unwrap();
        copy.replace_content(root, [text]).unwrap();
        assert_eq!(
            doc.store(root, Axis::Content).unwrap().generation(),
            copy.store(root, Axis::Content).unwrap().generation()
        );

        assert_eq!(view.size(&doc), 4);
        assert_eq!(view.get(&doc, 3).unwrap(), kids[4]);
        assert_eq!(view.size(&copy), 0);
        assert!(view.get(&copy, 3).is_err());
        assert_eq!(view.get(&doc, 0).unwrap(), kids[1]);
        assert_eq!(view.size(&doc), 4);
    }

    #[cfg(not(feature = "index-hint"))]
    #[test]
    fn test_unhinted_views_keep_no_cache() {
        let mut doc = Document::new();
        let (root, items) = mixed(&mut doc, 9);
        let view = doc.children_view(root);
        assert_eq!(view.size(&doc), 3);
        assert_eq!(view.get(&doc, 2).unwrap(), items[6]);
        assert_eq!(view.get(&doc, 0).unwrap(), items[0]);
        assert!(view.get(&doc, 3).is_err());
        assert_eq!(view.hint.get(), None);
        assert_eq!(view.size_hint.get(), None);

        doc.content_view(root).remove(&mut doc, 0).unwrap();
        assert_eq!(view.to_vec(&doc), vec![items[3], items[6]]);
    }

    #[test]
    fn test_type_mismatch_leaves_store_alone() {
        let mut doc = Document::new();
        let (root, _) = mixed(&mut doc, 3);
        let view = doc.children_view(root);
        let text = doc.create_text("nope").unwrap();
        let generation = view.generation(&doc);
        assert_eq!(
            view.insert(&mut doc, 0, text),
            Err(DomError::TypeMismatch {
                item: text,
                kind: NodeKind::Text
            })
        );
        assert!(view.set(&mut doc, 0, text).is_err());
        assert_eq!(view.generation(&doc), generation);
        assert_eq!(doc.owner(text), None);

        let named = doc.children_named(root, "kid");
        let wrong = doc.create_element("other").unwrap();
        assert!(matches!(
            named.push(&mut doc, wrong),
            Err(DomError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_insert_positions() {
        let mut doc = Document::new();
        let (root, items) = mixed(&mut doc, 6);
        // content: [E0 t t E3 t t]
        let view = doc.children_view(root);
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        view.insert(&mut doc, 1, a).unwrap();
        view.push(&mut doc, b).unwrap();
        let content = doc.content_view(root).to_vec(&doc);
        assert_eq!(
            content,
            vec![items[0], items[1], items[2], a, items[3], items[4], items[5], b]
        );
        assert!(view.insert(&mut doc, 9, a).is_err());
    }

    #[test]
    fn test_sub_view_bounds() {
        let mut doc = Document::new();
        let (root, _) = mixed(&mut doc, 9);
        let view = doc.content_view(root);
        assert!(view.sub_view(&doc, 0, 10).is_err());
        assert!(view.sub_view(&doc, 5, 4).is_err());
        assert_eq!(view.sub_view(&doc, 3, 3).unwrap().size(&doc), 0);
    }

    #[test]
    fn test_sort_keeps_other_slots() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let c = doc.create_element("c").unwrap();
        let t = doc.create_text("t").unwrap();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.replace_content(root, [c, t, a, b]).unwrap();
        let view = doc.children_view(root);
        let generation = view.generation(&doc);
        view.sort_by(&mut doc, |doc, x, y| doc.name(x).cmp(&doc.name(y)))
            .unwrap();
        assert_eq!(doc.content_view(root).to_vec(&doc), vec![a, t, b, c]);
        assert_eq!(view.generation(&doc), generation + 1);
        doc.assert_consistent();
    }

    #[test]
    fn test_leaf_views_are_empty() {
        let mut doc = Document::new();
        let text = doc.create_text("t").unwrap();
        let view = doc.content_view(text);
        assert_eq!(view.size(&doc), 0);
        let other = doc.create_text("u").unwrap();
        assert_eq!(view.push(&mut doc, other), Err(DomError::NotAContainer(text)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(usize, u8),
        Remove(usize),
        Set(usize, u8),
        Detach(usize),
        Replace(Vec<u8>),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..12usize, 0..4u8).prop_map(|(i, k)| Op::Insert(i, k)),
            (0..12usize).prop_map(Op::Remove),
            (0..12usize, 0..4u8).prop_map(|(i, k)| Op::Set(i, k)),
            (0..40usize).prop_map(Op::Detach),
            prop::collection::vec(0..4u8, 0..6).prop_map(Op::Replace),
        ]
    }

    fn make(doc: &mut Document, kind: u8) -> NodeId {
        match kind {
            0 => doc.create_element("e").unwrap(),
            1 => doc.create_text("t").unwrap(),
            2 => doc.create_comment("c").unwrap(),
            _ => doc.create_element("kid").unwrap(),
        }
    }

    proptest! {
        #[test]
        fn prop_views_agree_with_store(ops in prop::collection::vec(op(), 1..40), pick in 0..4usize) {
            let mut doc = Document::new();
            let root = doc.create_element("root").unwrap();
            let views = [
                doc.content_view(root),
                doc.children_view(root),
                doc.children_named(root, "kid"),
                doc.filtered_view(root, Filter::Kinds(KindMask::TEXT | KindMask::COMMENT)),
            ];
            let view = &views[pick];

            for op in ops {
                // errors are fine; they must just leave things consistent
                let _ = match op {
                    Op::Insert(i, k) => {
                        let item = make(&mut doc, k);
                        view.insert(&mut doc, i, item)
                    }
                    Op::Remove(i) => view.remove(&mut doc, i).map(|_| ()),
                    Op::Set(i, k) => {
                        let item = make(&mut doc, k);
                        view.set(&mut doc, i, item).map(|_| ())
                    }
                    Op::Detach(id) => {
                        doc.detach(id as NodeId);
                        Ok(())
                    }
                    Op::Replace(kinds) => {
                        let items: Vec<_> = kinds.into_iter().map(|k| make(&mut doc, k)).collect();
                        doc.replace_content(root, items).map(|_| ())
                    }
                };

                let store = doc.store(root, Axis::Content).unwrap().items().to_vec();
                for v in &views {
                    let expected: Vec<_> = store
                        .iter()
                        .copied()
                        .filter(|&id| v.filter().matches(&doc, id))
                        .collect();
                    prop_assert_eq!(v.size(&doc), expected.len());
                    prop_assert_eq!(v.to_vec(&doc), expected.clone());
                    for (k, &id) in expected.iter().enumerate() {
                        prop_assert_eq!(v.index_of(&doc, id), Some(k));
                    }
                }
                doc.assert_consistent();
            }
        }
    }
}
