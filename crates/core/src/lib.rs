//! # xmlpoke-core
//!
//! Editing sessions over XML documents, addressed by XPath.
//!
//! - **document**: the [`Document`] session and its verbs
//! - **path**: extended path expressions (`a/b[@key='v']/@attr`)
//! - **query**: path resolution under the verbs' creation policies
//! - **dispatch**: writing a [`Value`] to resolved nodes
//! - **synth**: creating elements and attributes
//! - **namespace**: session namespace aliases
//! - **error**: the [`PokeError`] type
//!
//! The crate does no file discovery of its own; batch runs over glob
//! patterns live in the `xmlpoke` crate on top of `xmlpoke-source`.

// Re-export foundation crates
pub use xmlpoke_dom as dom;
pub use xmlpoke_xpath1 as xpath;

pub mod dispatch;
pub mod document;
pub mod error;
pub mod namespace;
pub mod path;
pub mod query;
pub mod synth;
pub mod value;

pub use document::Document;
pub use error::PokeError;
pub use namespace::NamespaceAliasTable;
pub use path::{ExtendedPath, KeyPredicate, join_xpath};
pub use query::Policy;
pub use value::{NodeHandle, NodeRef, Scalar, Value};
