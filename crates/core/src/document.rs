//! The editing session over one XML document.

use crate::dispatch;
use crate::error::PokeError;
use crate::namespace::NamespaceAliasTable;
use crate::path::join_xpath;
use crate::query::{self, Policy, Resolver};
use crate::value::{NodeHandle, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use xmlpoke_dom::Tree;

/// A parsed document together with the settings its verbs run under.
///
/// Configuration verbs return `&mut Self` and editing verbs
/// `Result<&mut Self, PokeError>`, so calls chain:
///
/// ```
/// use xmlpoke_core::{Document, Value};
///
/// let mut doc = Document::load("<a><b>x</b></a>")?;
/// doc.set("a/b", Value::transform(|_, old| format!("{old}!")))?
///     .set_or_add("a/@c", "d")?;
/// assert_eq!(doc.to_string(), "<a c=\"d\"><b>x!</b></a>");
/// # Ok::<(), xmlpoke_core::PokeError>(())
/// ```
#[derive(Debug)]
pub struct Document {
    tree: Tree,
    base_path: Option<String>,
    namespaces: Option<NamespaceAliasTable>,
    strict: bool,
    trailing_whitespace: String,
    source: Option<PathBuf>,
}

impl Document {
    pub fn load(xml: &str) -> Result<Document, PokeError> {
        let tree = Tree::parse(xml)?;
        let trailing = &xml[xml.trim_end().len()..];
        Ok(Document {
            tree,
            base_path: None,
            namespaces: None,
            strict: false,
            trailing_whitespace: trailing.to_string(),
            source: None,
        })
    }

    /// Reads and parses a UTF-8 file. [`save`](Self::save) writes back to it.
    pub fn open(path: impl AsRef<Path>) -> Result<Document, PokeError> {
        let path = path.as_ref();
        log::debug!("Opening {}", path.display());
        let xml = fs::read_to_string(path)?;
        let mut document = Document::load(&xml)?;
        document.source = Some(path.to_path_buf());
        Ok(document)
    }

    /// The file this document was opened from.
    pub fn path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Prefixes every later verb path with `path`.
    pub fn with_base_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.base_path = Some(path.into());
        self
    }

    /// Registers `prefix` for use in verb paths. Re-registering a prefix
    /// replaces its URI.
    pub fn add_namespace(&mut self, prefix: &str, uri: &str) -> &mut Self {
        self.namespaces
            .get_or_insert_with(NamespaceAliasTable::new)
            .add(prefix, uri);
        self
    }

    /// Makes paths that match nothing an error instead of a no-op.
    pub fn error_on_no_matches(&mut self) -> &mut Self {
        self.strict = true;
        self
    }

    /// Removes the children of every match. Matched attributes are emptied.
    pub fn clear(&mut self, path: &str) -> Result<&mut Self, PokeError> {
        let path = self.full_path(path);
        let mut resolver = self.resolver();
        for node in resolver.query(&path, Policy::Existing)? {
            match node {
                NodeHandle::Element(id) => resolver.tree_mut().clear_children(id),
                NodeHandle::Attribute(_) => dispatch::write_text(resolver.tree_mut(), node, "")?,
            }
        }
        Ok(self)
    }

    /// Detaches every match from its parent.
    pub fn remove(&mut self, path: &str) -> Result<&mut Self, PokeError> {
        let path = self.full_path(path);
        let mut resolver = self.resolver();
        for node in resolver.query(&path, Policy::Existing)? {
            resolver.tree_mut().detach(node.id());
        }
        Ok(self)
    }

    /// Writes `value` to every existing match.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<&mut Self, PokeError> {
        self.write(path, value.into(), Policy::Existing)
    }

    pub fn set_all<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> Result<&mut Self, PokeError>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.write_all(values, Policy::Existing)
    }

    /// Writes `value` to every match, creating the target under each parent
    /// when nothing matches.
    pub fn set_or_add(&mut self, path: &str, value: impl Into<Value>) -> Result<&mut Self, PokeError> {
        self.write(path, value.into(), Policy::CreateIfMissing)
    }

    pub fn set_or_add_all<K, V>(
        &mut self,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<&mut Self, PokeError>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.write_all(values, Policy::CreateIfMissing)
    }

    /// Creates a new target under every parent and writes `value` to it.
    pub fn add(&mut self, path: &str, value: impl Into<Value>) -> Result<&mut Self, PokeError> {
        self.write(path, value.into(), Policy::AlwaysCreate)
    }

    pub fn add_all<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> Result<&mut Self, PokeError>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.write_all(values, Policy::AlwaysCreate)
    }

    /// Creates each missing step of `path`.
    pub fn ensure(&mut self, path: &str) -> Result<&mut Self, PokeError> {
        let path = self.full_path(path);
        self.resolver().ensure(&path)?;
        Ok(self)
    }

    /// The current values of every match.
    pub fn get(&self, path: &str) -> Result<Vec<String>, PokeError> {
        let nodes = self.select(path)?;
        Ok(nodes
            .into_iter()
            .map(|node| node.current_value(&self.tree))
            .collect())
    }

    pub fn count(&self, path: &str) -> Result<usize, PokeError> {
        Ok(self.select(path)?.len())
    }

    /// Overwrites the file the document was opened from.
    pub fn save(&self) -> Result<(), PokeError> {
        let path = self.source.as_deref().ok_or(PokeError::NotFileBacked)?;
        log::debug!("Saving {}", path.display());
        fs::write(path, self.to_string())?;
        Ok(())
    }

    fn full_path(&self, path: &str) -> String {
        join_xpath(self.base_path.as_deref(), path)
    }

    fn select(&self, path: &str) -> Result<Vec<NodeHandle>, PokeError> {
        query::select(&self.tree, self.namespaces.as_ref(), &self.full_path(path))
    }

    fn resolver(&mut self) -> Resolver<'_> {
        Resolver::new(&mut self.tree, self.namespaces.as_ref(), self.strict)
    }

    fn write(&mut self, path: &str, value: Value, policy: Policy) -> Result<&mut Self, PokeError> {
        let path = self.full_path(path);
        let mut resolver = self.resolver();
        let nodes = resolver.query(&path, policy)?;
        dispatch::apply(&mut resolver, &nodes, &value, policy, &path)?;
        Ok(self)
    }

    fn write_all<K, V>(
        &mut self,
        values: impl IntoIterator<Item = (K, V)>,
        policy: Policy,
    ) -> Result<&mut Self, PokeError>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (path, value) in values {
            self.write(path.as_ref(), value.into(), policy)?;
        }
        Ok(self)
    }
}

/// The serialized document, ending in the source's own trailing whitespace.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.tree.to_xml();
        f.write_str(xml.trim_end())?;
        f.write_str(&self.trailing_whitespace)
    }
}
