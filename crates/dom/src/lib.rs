//! A small mutable XML tree.
//!
//! Nodes live in an arena owned by [`Tree`] and are addressed by [`NodeId`].
//! Documents are read with `quick-xml` and written back in a compact form
//! that keeps comments, processing instructions, CDATA sections, the XML
//! declaration and the doctype. [`XmlNode`] exposes a tree to the XPath
//! engine.

pub mod error;
pub mod node;
pub mod parse;
pub mod serialize;
pub mod tree;

pub use error::DomError;
pub use node::XmlNode;
pub use tree::{NodeId, NodeKind, Tree, XMLNS_NAMESPACE};
