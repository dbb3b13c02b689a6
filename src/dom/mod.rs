//! DOM Module - Arena-based XML content model
//!
//! Implements the document side of the content model using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices, with a non-owning `owner` back-reference
//! - One backing store per container axis, each with its own generation
//! - String interning for names, prefixes and namespace URIs

pub mod document;
pub mod node;
pub mod store;
pub mod strings;
pub mod verify;

mod attach;
mod factory;

pub use document::{Descendants, Document, DocumentOptions};
pub use node::{Axis, KindMask, NodeId, NodeKind, XmlNode, DOCUMENT_NODE};
pub use store::BackingStore;
pub use strings::StringPool;
