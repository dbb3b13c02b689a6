//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.
//! Container nodes own their content through per-axis backing stores;
//! the reverse edge (`owner`) is a plain id, never a second owner.

use bitflags::bitflags;

use super::store::BackingStore;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Id of the Document node, always the first arena slot
pub const DOCUMENT_NODE: NodeId = 0;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// Unexpanded entity reference
    EntityRef,
    /// Attribute of an element
    Attribute,
    /// `xmlns`/`xmlns:prefix` declaration on an element
    NamespaceDecl,
}

bitflags! {
    /// Set of content kinds, used by kind-based filters
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindMask: u8 {
        const ELEMENT = 1 << 0;
        const TEXT = 1 << 1;
        const CDATA = 1 << 2;
        const COMMENT = 1 << 3;
        const PROCESSING_INSTRUCTION = 1 << 4;
        const ENTITY_REF = 1 << 5;
        /// Every kind that can sit on the content axis
        const CONTENT = Self::ELEMENT.bits()
            | Self::TEXT.bits()
            | Self::CDATA.bits()
            | Self::COMMENT.bits()
            | Self::PROCESSING_INSTRUCTION.bits()
            | Self::ENTITY_REF.bits();
    }
}

/// Which of a container's stores an item lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Content,
    Attributes,
    Namespaces,
}

impl NodeKind {
    /// Mask bit for this kind; empty for non-content kinds
    pub fn mask(self) -> KindMask {
        match self {
            NodeKind::Element => KindMask::ELEMENT,
            NodeKind::Text => KindMask::TEXT,
            NodeKind::CData => KindMask::CDATA,
            NodeKind::Comment => KindMask::COMMENT,
            NodeKind::ProcessingInstruction => KindMask::PROCESSING_INSTRUCTION,
            NodeKind::EntityRef => KindMask::ENTITY_REF,
            NodeKind::Document | NodeKind::Attribute | NodeKind::NamespaceDecl => {
                KindMask::empty()
            }
        }
    }

    /// The axis an item of this kind attaches to, if it can attach at all
    pub fn axis(self) -> Option<Axis> {
        match self {
            NodeKind::Document => None,
            NodeKind::Attribute => Some(Axis::Attributes),
            NodeKind::NamespaceDecl => Some(Axis::Namespaces),
            _ => Some(Axis::Content),
        }
    }
}

/// A node in the arena
///
/// The string ids index into the document's `StringPool`. What they mean
/// depends on `kind`:
///
/// | kind           | `name_id`    | `prefix_id` | `namespace_id` | `value`       |
/// |----------------|--------------|-------------|----------------|---------------|
/// | Element        | local name   | prefix      | namespace URI  | -             |
/// | Attribute      | local name   | prefix      | namespace URI  | value         |
/// | NamespaceDecl  | prefix       | -           | URI            | -             |
/// | PI             | target       | -           | -              | data          |
/// | EntityRef      | name         | -           | -              | system id     |
/// | Text/CDATA/Comment | -        | -           | -              | character data|
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Container currently holding this node, if any
    pub(crate) owner: Option<NodeId>,
    pub name_id: u32,
    pub prefix_id: u32,
    pub namespace_id: u32,
    pub(crate) value: String,
    pub(crate) content: BackingStore,
    pub(crate) attributes: BackingStore,
    pub(crate) namespaces: BackingStore,
}

impl XmlNode {
    fn with_kind(kind: NodeKind) -> Self {
        XmlNode {
            kind,
            owner: None,
            name_id: 0,
            prefix_id: 0,
            namespace_id: 0,
            value: String::new(),
            content: BackingStore::new(),
            attributes: BackingStore::new(),
            namespaces: BackingStore::new(),
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document)
    }

    /// Create a new element node
    pub fn element(name_id: u32, prefix_id: u32, namespace_id: u32) -> Self {
        XmlNode {
            name_id,
            prefix_id,
            namespace_id,
            ..Self::with_kind(NodeKind::Element)
        }
    }

    /// Create a character-data node (text, CDATA or comment)
    pub fn character_data(kind: NodeKind, value: String) -> Self {
        debug_assert!(matches!(
            kind,
            NodeKind::Text | NodeKind::CData | NodeKind::Comment
        ));
        XmlNode {
            value,
            ..Self::with_kind(kind)
        }
    }

    /// Create a processing instruction node
    pub fn processing_instruction(target_id: u32, data: String) -> Self {
        XmlNode {
            name_id: target_id,
            value: data,
            ..Self::with_kind(NodeKind::ProcessingInstruction)
        }
    }

    /// Create an entity reference node
    pub fn entity_ref(name_id: u32, system_id: String) -> Self {
        XmlNode {
            name_id,
            value: system_id,
            ..Self::with_kind(NodeKind::EntityRef)
        }
    }

    /// Create an attribute node
    pub fn attribute(name_id: u32, prefix_id: u32, namespace_id: u32, value: String) -> Self {
        XmlNode {
            name_id,
            prefix_id,
            namespace_id,
            value,
            ..Self::with_kind(NodeKind::Attribute)
        }
    }

    /// Create a namespace declaration node
    pub fn namespace_decl(prefix_id: u32, uri_id: u32) -> Self {
        XmlNode {
            name_id: prefix_id,
            namespace_id: uri_id,
            ..Self::with_kind(NodeKind::NamespaceDecl)
        }
    }

    /// Container currently holding this node
    #[inline]
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node can hold stores on the given axis
    pub fn has_axis(&self, axis: Axis) -> bool {
        match self.kind {
            NodeKind::Element => true,
            NodeKind::Document => axis == Axis::Content,
            _ => false,
        }
    }

    /// Store for an axis, if this node has one
    pub fn store(&self, axis: Axis) -> Option<&BackingStore> {
        if !self.has_axis(axis) {
            return None;
        }
        Some(match axis {
            Axis::Content => &self.content,
            Axis::Attributes => &self.attributes,
            Axis::Namespaces => &self.namespaces,
        })
    }

    pub(crate) fn store_mut(&mut self, axis: Axis) -> Option<&mut BackingStore> {
        if !self.has_axis(axis) {
            return None;
        }
        Some(match axis {
            Axis::Content => &mut self.content,
            Axis::Attributes => &mut self.attributes,
            Axis::Namespaces => &mut self.namespaces,
        })
    }
}
