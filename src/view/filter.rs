//! View membership filters

use std::rc::Rc;

use crate::dom::{Axis, Document, KindMask, NodeId, NodeKind};

/// Membership predicate of a `FilteredView`
///
/// The filter also decides which store of the node the view reads:
/// `Attributes` and `Namespaces` look at their own axis, everything else
/// at the content axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Content items whose kind is in the mask
    Kinds(KindMask),
    /// Elements, optionally restricted by local name and namespace URI
    Elements {
        name: Option<Rc<str>>,
        namespace: Option<Rc<str>>,
    },
    Attributes,
    Namespaces,
}

impl Filter {
    /// Every content item
    pub fn content() -> Self {
        Filter::Kinds(KindMask::CONTENT)
    }

    /// Every child element
    pub fn elements() -> Self {
        Filter::Elements {
            name: None,
            namespace: None,
        }
    }

    /// Elements with local name `name`, in any namespace
    pub fn element_named(name: &str) -> Self {
        Filter::Elements {
            name: Some(name.into()),
            namespace: None,
        }
    }

    /// Elements with local name `name` in namespace `uri` (`""` = none)
    pub fn element_named_ns(name: &str, uri: &str) -> Self {
        Filter::Elements {
            name: Some(name.into()),
            namespace: Some(uri.into()),
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            Filter::Attributes => Axis::Attributes,
            Filter::Namespaces => Axis::Namespaces,
            Filter::Kinds(_) | Filter::Elements { .. } => Axis::Content,
        }
    }

    /// Does `id` belong in a view with this filter?
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(node) = doc.get_node(id) else {
            return false;
        };
        match self {
            Filter::Kinds(mask) => mask.intersects(node.kind.mask()),
            // a string that was never interned names no node
            Filter::Elements { name, namespace } => {
                node.is_element()
                    && name
                        .as_deref()
                        .is_none_or(|n| doc.strings.lookup(n) == Some(node.name_id))
                    && namespace
                        .as_deref()
                        .is_none_or(|uri| doc.strings.lookup(uri) == Some(node.namespace_id))
            }
            Filter::Attributes => node.kind == NodeKind::Attribute,
            Filter::Namespaces => node.kind == NodeKind::NamespaceDecl,
        }
    }
}
