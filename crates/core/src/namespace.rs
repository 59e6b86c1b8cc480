//! Session namespace aliases and the mapping of aliased names onto the
//! prefixes a document actually declares.

use xmlpoke_dom::{NodeId, Tree};
use xmlpoke_xpath1::Namespaces;

/// Alias to namespace URI, as registered through
/// [`Document::add_namespace`](crate::Document::add_namespace). Re-adding an
/// alias replaces its URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceAliasTable {
    aliases: Namespaces,
}

impl NamespaceAliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, alias: &str, uri: &str) {
        self.aliases.insert(alias.to_string(), uri.to_string());
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// The table in the form the XPath engine takes.
    pub fn as_namespaces(&self) -> &Namespaces {
        &self.aliases
    }
}

/// The lexical name to give a new node, and the namespace it should end up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub qualified: String,
    pub namespace: Option<String>,
}

/// Resolves `name` for a node created under `position`.
///
/// An aliased prefix is swapped for whatever prefix the document binds to the
/// alias's URI at `position`. When only the default namespace (or nothing)
/// binds it, the local name is used and no declaration is invented for it.
/// Unknown prefixes are kept literally.
pub fn resolve_name(
    tree: &Tree,
    position: NodeId,
    name: &str,
    aliases: Option<&NamespaceAliasTable>,
) -> ResolvedName {
    let literal = || ResolvedName {
        qualified: name.to_string(),
        namespace: None,
    };
    let Some((alias, local)) = name.split_once(':') else {
        return literal();
    };
    let Some(uri) = aliases.and_then(|table| table.get(alias)) else {
        return literal();
    };

    let qualified = match tree.lookup_prefix(position, uri) {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    };
    ResolvedName {
        qualified,
        namespace: Some(uri.to_string()),
    }
}
