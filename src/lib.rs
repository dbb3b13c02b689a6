//! xmlcontent - Arena-backed XML content model with live list views
//!
//! Layers:
//! - `dom`: node arena, per-axis backing stores, ownership rules,
//!   node factories and name/payload checks
//! - `view`: filtered list views over a node's store, fixed windows over
//!   them, and fail-fast cursors
//!
//! Every view is a small handle bound to a node. Views hold no items;
//! they read the node's backing store through the `Document` handed to
//! each call, so changes made through one view (or by replacing the
//! store wholesale) are seen by every other view of the same node.
//!
//! ```
//! use xmlcontent::{Document, ListView};
//!
//! let mut doc = Document::new();
//! let root = doc.create_element("root").unwrap();
//! doc.set_root_element(root).unwrap();
//! let text = doc.create_text("hello").unwrap();
//! let child = doc.create_element("child").unwrap();
//! doc.replace_content(root, [text, child]).unwrap();
//!
//! let children = doc.children_view(root);
//! assert_eq!(children.size(&doc), 1);
//! let extra = doc.create_element("extra").unwrap();
//! children.push(&mut doc, extra).unwrap();
//! assert_eq!(doc.content_view(root).size(&doc), 3);
//! assert_eq!(doc.owner(extra), Some(root));
//! ```

pub mod dom;
pub mod error;
pub mod view;

pub use dom::{Axis, Document, DocumentOptions, KindMask, NodeId, NodeKind, DOCUMENT_NODE};
pub use error::{DomError, Result};
pub use view::{Cursor, Filter, FilteredView, ListView, SubView, ViewIter};
