//! XML Document - Arena-based content model
//!
//! Every node of one document lives in a single arena and is addressed
//! by `NodeId`. Slot 0 is the Document node. Items are created detached
//! (see `factory.rs`) and attached by inserting them into a container's
//! store, either through a `FilteredView` or through the wholesale
//! `replace_*` calls below.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::node::{Axis, NodeId, NodeKind, XmlNode, DOCUMENT_NODE};
use super::store::BackingStore;
use super::strings::StringPool;
use super::verify;
use crate::error::{DomError, Result};
use crate::view::{Filter, FilteredView, ListView};

const AXES: [Axis; 3] = [Axis::Content, Axis::Attributes, Axis::Namespaces];

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Runtime options for one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Validate names and character data in the `create_*` constructors
    /// and in `set_value`. Lenient documents accept anything.
    pub verify: bool,
    /// Initial arena capacity
    pub capacity: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            verify: true,
            capacity: 64,
        }
    }
}

/// An XML document stored in arena format
#[derive(Debug)]
pub struct Document {
    /// Arena of nodes
    pub(crate) nodes: Vec<XmlNode>,
    /// Interned names, prefixes and URIs
    pub strings: StringPool,
    pub(crate) options: DocumentOptions,
    /// Unique per instance, clones included; keys the view caches
    stamp: u64,
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Document {
            nodes: self.nodes.clone(),
            strings: self.strings.clone(),
            options: self.options,
            stamp: next_stamp(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty, verifying document
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    pub fn with_options(options: DocumentOptions) -> Self {
        let mut nodes = Vec::with_capacity(options.capacity.max(1));
        nodes.push(XmlNode::document());
        Document {
            nodes,
            strings: StringPool::new(),
            options,
            stamp: next_stamp(),
        }
    }

    pub fn options(&self) -> DocumentOptions {
        self.options
    }

    /// Identity of this document instance; a clone gets a new one
    #[inline]
    pub(crate) fn stamp(&self) -> u64 {
        self.stamp
    }

    /// Id of the Document node
    #[inline]
    pub fn document_node(&self) -> NodeId {
        DOCUMENT_NODE
    }

    /// Get total number of nodes, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&XmlNode> {
        self.get_node(id).ok_or(DomError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut XmlNode> {
        self.nodes
            .get_mut(id as usize)
            .ok_or(DomError::UnknownNode(id))
    }

    pub(crate) fn push_node(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        trace!(id, kind = ?node.kind, "created node");
        self.nodes.push(node);
        id
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// Container currently holding `id`
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.owner
    }

    /// Store of `node` on `axis`
    pub fn store(&self, node: NodeId, axis: Axis) -> Result<&BackingStore> {
        self.node(node)?
            .store(axis)
            .ok_or(DomError::NotAContainer(node))
    }

    pub(crate) fn store_mut(&mut self, node: NodeId, axis: Axis) -> Result<&mut BackingStore> {
        self.node_mut(node)?
            .store_mut(axis)
            .ok_or(DomError::NotAContainer(node))
    }

    // ========================================================================
    // Node data
    // ========================================================================

    /// Local name of an element or attribute, PI target, entity name,
    /// or the prefix of a namespace declaration
    pub fn name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element
            | NodeKind::Attribute
            | NodeKind::ProcessingInstruction
            | NodeKind::EntityRef
            | NodeKind::NamespaceDecl => self.strings.get(node.name_id),
            _ => None,
        }
    }

    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::Attribute => self.strings.get(node.prefix_id),
            NodeKind::NamespaceDecl => self.strings.get(node.name_id),
            _ => None,
        }
    }

    /// `prefix:local`, or just `local` without a prefix
    pub fn qualified_name(&self, id: NodeId) -> Option<String> {
        let local = self.name(id)?;
        match self.prefix(id) {
            Some(prefix) if !prefix.is_empty() && self.kind(id) != Some(NodeKind::NamespaceDecl) => {
                Some(format!("{prefix}:{local}"))
            }
            _ => Some(local.to_string()),
        }
    }

    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::Attribute | NodeKind::NamespaceDecl => {
                self.strings.get(node.namespace_id)
            }
            _ => None,
        }
    }

    /// Character data, attribute value, PI data or entity system id
    pub fn value(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::Document => None,
            NodeKind::NamespaceDecl => self.strings.get(node.namespace_id),
            _ => Some(&node.value),
        }
    }

    /// Replace the payload of a leaf node. Not a structural change: no
    /// store generation moves.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        let kind = self.node(id)?.kind;
        if matches!(
            kind,
            NodeKind::Element | NodeKind::Document | NodeKind::NamespaceDecl
        ) {
            return Err(DomError::InvalidData {
                kind,
                reason: "node has no editable value",
            });
        }
        if self.options.verify {
            match kind {
                NodeKind::Text | NodeKind::Attribute => verify::check_chars(kind, value)?,
                NodeKind::EntityRef => verify::check_system_literal(value)?,
                NodeKind::CData => verify::check_cdata(value)?,
                NodeKind::Comment => verify::check_comment(value)?,
                NodeKind::ProcessingInstruction => verify::check_pi_data(value)?,
                _ => {}
            }
        }
        self.node_mut(id)?.value = value.to_string();
        Ok(())
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Every content item of `node`
    pub fn content_view(&self, node: NodeId) -> FilteredView {
        FilteredView::new(node, Filter::content())
    }

    /// Child elements of `node`
    pub fn children_view(&self, node: NodeId) -> FilteredView {
        FilteredView::new(node, Filter::elements())
    }

    /// Child elements of `node` with local name `name`, in any namespace
    pub fn children_named(&self, node: NodeId, name: &str) -> FilteredView {
        FilteredView::new(node, Filter::element_named(name))
    }

    /// Child elements of `node` with local name `name` in namespace `uri`
    pub fn children_named_ns(&self, node: NodeId, name: &str, uri: &str) -> FilteredView {
        FilteredView::new(node, Filter::element_named_ns(name, uri))
    }

    pub fn attributes_view(&self, node: NodeId) -> FilteredView {
        FilteredView::new(node, Filter::Attributes)
    }

    pub fn namespace_declarations_view(&self, node: NodeId) -> FilteredView {
        FilteredView::new(node, Filter::Namespaces)
    }

    pub fn filtered_view(&self, node: NodeId, filter: Filter) -> FilteredView {
        FilteredView::new(node, filter)
    }

    // ========================================================================
    // Wholesale replacement
    // ========================================================================

    /// Swap the whole content of `node`, returning the detached old items.
    /// Items already held by `node` may be reused.
    pub fn replace_content(
        &mut self,
        node: NodeId,
        items: impl IntoIterator<Item = NodeId>,
    ) -> Result<Vec<NodeId>> {
        self.replace_store(node, Axis::Content, items.into_iter().collect())
    }

    pub fn replace_attributes(
        &mut self,
        node: NodeId,
        items: impl IntoIterator<Item = NodeId>,
    ) -> Result<Vec<NodeId>> {
        self.replace_store(node, Axis::Attributes, items.into_iter().collect())
    }

    pub fn replace_namespace_declarations(
        &mut self,
        node: NodeId,
        items: impl IntoIterator<Item = NodeId>,
    ) -> Result<Vec<NodeId>> {
        self.replace_store(node, Axis::Namespaces, items.into_iter().collect())
    }

    /// Detach every content item of `node`
    pub fn clear_content(&mut self, node: NodeId) -> Result<Vec<NodeId>> {
        self.clear_store(node, Axis::Content)
    }

    // ========================================================================
    // Convenience
    // ========================================================================

    /// The document's single element child, if any
    pub fn root_element(&self) -> Option<NodeId> {
        self.nodes[DOCUMENT_NODE as usize]
            .content
            .items()
            .iter()
            .copied()
            .find(|&id| self.kind(id) == Some(NodeKind::Element))
    }

    /// Install `element` as the root, replacing (and returning) any
    /// previous root in place
    pub fn set_root_element(&mut self, element: NodeId) -> Result<Option<NodeId>> {
        let view = self.children_view(DOCUMENT_NODE);
        if view.is_empty(self) {
            view.push(self, element)?;
            Ok(None)
        } else {
            view.set(self, 0, element).map(Some)
        }
    }

    /// Attribute of `element` with the given qualified name
    pub fn attribute(&self, element: NodeId, qname: &str) -> Option<NodeId> {
        let (prefix, local) = verify::split_qname_unchecked(qname);
        let store = self.store(element, Axis::Attributes).ok()?;
        store.items().iter().copied().find(|&id| {
            self.name(id) == Some(local) && self.prefix(id).unwrap_or("") == prefix
        })
    }

    pub fn attribute_value(&self, element: NodeId, qname: &str) -> Option<&str> {
        self.value(self.attribute(element, qname)?)
    }

    /// Set an attribute value, creating the attribute if needed
    pub fn set_attribute(&mut self, element: NodeId, qname: &str, value: &str) -> Result<NodeId> {
        if let Some(id) = self.attribute(element, qname) {
            self.set_value(id, value)?;
            return Ok(id);
        }
        // fail before allocating if the element cannot take attributes
        self.store(element, Axis::Attributes)?;
        let id = self.create_attribute(qname, value)?;
        self.attributes_view(element).push(self, id)?;
        Ok(id)
    }

    /// Detach and return the named attribute
    pub fn remove_attribute(&mut self, element: NodeId, qname: &str) -> Option<NodeId> {
        let id = self.attribute(element, qname)?;
        self.detach(id)?;
        Some(id)
    }

    /// Concatenated Text and CDATA children of `node`
    pub fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Ok(store) = self.store(node, Axis::Content) {
            for &id in store.items() {
                if let Some(n) = self.get_node(id) {
                    if matches!(n.kind, NodeKind::Text | NodeKind::CData) {
                        out.push_str(&n.value);
                    }
                }
            }
        }
        out
    }

    /// Replace the content of `node` with a single text item
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<Vec<NodeId>> {
        self.store(node, Axis::Content)?;
        if text.is_empty() {
            return self.clear_content(node);
        }
        let id = self.create_text(text)?;
        self.replace_content(node, [id])
    }

    /// Is `ancestor` a strict ancestor of `node`?
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.owner(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.owner(id);
        }
        false
    }

    /// Iterate over content descendants of a node, in document order
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = Vec::new();
        if let Ok(store) = self.store(id, Axis::Content) {
            stack.extend(store.items().iter().rev());
        }
        Descendants { doc: self, stack }
    }

    /// Copy `id` and everything it holds into fresh, detached nodes
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId> {
        let source = self.node(id)?;
        if source.kind == NodeKind::Document {
            return Err(DomError::IllegalAdd {
                item: id,
                reason: "the document node cannot be copied",
            });
        }
        let axes: Vec<(Axis, Vec<NodeId>)> = AXES
            .into_iter()
            .filter_map(|axis| Some((axis, source.store(axis)?.items().to_vec())))
            .collect();
        let mut copy = source.clone();
        copy.owner = None;
        copy.content = BackingStore::new();
        copy.attributes = BackingStore::new();
        copy.namespaces = BackingStore::new();

        let new_id = self.push_node(copy);
        for (axis, children) in axes {
            let copies = children
                .into_iter()
                .map(|child| self.deep_clone(child))
                .collect::<Result<Vec<_>>>()?;
            for &child in &copies {
                self.node_mut(child)?.owner = Some(new_id);
            }
            self.store_mut(new_id, axis)?.populate(copies);
        }
        Ok(new_id)
    }

    /// Check the ownership invariants across the whole arena
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (index, node) in self.nodes.iter().enumerate() {
            let id = index as NodeId;
            for axis in AXES {
                if let Some(store) = node.store(axis) {
                    for &item in store.items() {
                        assert_eq!(self.owner(item), Some(id), "item {item} in store of {id}");
                    }
                }
            }
            if let Some(owner) = node.owner {
                let axis = node.kind.axis().unwrap();
                let store = self.store(owner, axis).unwrap();
                let hits = store.items().iter().filter(|&&i| i == id).count();
                assert_eq!(hits, 1, "node {id} owned by {owner}");
            }
        }
    }
}

/// Depth-first iterator over content descendants
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Ok(store) = self.doc.store(current, Axis::Content) {
            self.stack.extend(store.items().iter().rev());
        }
        Some(current)
    }
}
