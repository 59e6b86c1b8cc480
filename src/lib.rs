//! # xmlpoke
//!
//! Declarative patching of XML documents with XPath.
//!
//! A run selects files with glob patterns (or context objects carrying a
//! pattern), opens each one as a [`Document`], hands it to a callback that
//! applies verbs such as [`Document::set_or_add`], and writes it back:
//!
//! ```no_run
//! use xmlpoke::{FileArg, PokeOptions, poke};
//!
//! poke(&[FileArg::from("config/**/*.xml")], &PokeOptions::new(), |doc, _| {
//!     doc.set_or_add("configuration/appSettings/add[@key='env']/@value", "prod")?;
//!     Ok(())
//! })?;
//! # Ok::<(), xmlpoke::PokeError>(())
//! ```
//!
//! The workspace is split into:
//! - **xmlpoke-xpath1**: an XPath 1.0 engine over any tree implementing its
//!   `DataSourceNode` trait
//! - **xmlpoke-dom**: the mutable XML tree, its parser and serializer
//! - **xmlpoke-source**: glob and context-object expansion to file sets
//! - **xmlpoke-core**: document sessions, path synthesis and value dispatch

// Re-export foundation crates
pub use xmlpoke_dom as dom;
pub use xmlpoke_xpath1 as xpath;

pub mod options;
pub mod poke;

pub use options::{CommitMode, PokeOptions};
pub use poke::{PokeOutcome, PokeReport, poke, poke_files, poke_str};

pub use xmlpoke_core::{
    Document, ExtendedPath, KeyPredicate, NamespaceAliasTable, NodeHandle, NodeRef, PokeError,
    Policy, Scalar, Value, join_xpath,
};
pub use xmlpoke_source::{FileArg, FileSetEntry, PathExtractor, SourceError, expand};
