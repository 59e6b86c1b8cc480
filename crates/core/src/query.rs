//! Resolves verb paths to nodes, creating missing nodes as the verb's
//! policy allows.

use crate::error::PokeError;
use crate::namespace::NamespaceAliasTable;
use crate::path::{ExtendedPath, step_prefixes};
use crate::synth;
use crate::value::NodeHandle;
use xmlpoke_dom::{Tree, XmlNode};

/// Evaluates `path` against the document node of `tree`.
pub fn select(
    tree: &Tree,
    aliases: Option<&NamespaceAliasTable>,
    path: &str,
) -> Result<Vec<NodeHandle>, PokeError> {
    let nodes = xmlpoke_xpath1::select(
        path,
        XmlNode::root(tree),
        aliases.map(NamespaceAliasTable::as_namespaces),
    )?;
    Ok(nodes
        .iter()
        .map(|node| NodeHandle::from_node(tree, node.id))
        .collect())
}

/// How a verb treats paths that match nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Only existing nodes (`clear`, `remove`, `set`).
    Existing,
    /// Existing nodes, or one new node under each parent (`set_or_add`).
    CreateIfMissing,
    /// A new node under each parent, always (`add`).
    AlwaysCreate,
}

/// One verb's view of a session: the tree, the alias table and the
/// strict-match flag.
pub struct Resolver<'s> {
    tree: &'s mut Tree,
    aliases: Option<&'s NamespaceAliasTable>,
    strict: bool,
}

impl<'s> Resolver<'s> {
    pub fn new(tree: &'s mut Tree, aliases: Option<&'s NamespaceAliasTable>, strict: bool) -> Self {
        Self {
            tree,
            aliases,
            strict,
        }
    }

    pub fn tree(&self) -> &Tree {
        &*self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut *self.tree
    }

    pub fn aliases(&self) -> Option<&'s NamespaceAliasTable> {
        self.aliases
    }

    pub fn select(&self, path: &str) -> Result<Vec<NodeHandle>, PokeError> {
        select(&*self.tree, self.aliases, path)
    }

    pub fn query(&mut self, path: &str, policy: Policy) -> Result<Vec<NodeHandle>, PokeError> {
        if policy == Policy::AlwaysCreate {
            return self.create(path, self.strict);
        }
        let nodes = self.select(path)?;
        if !nodes.is_empty() {
            return Ok(nodes);
        }
        match policy {
            Policy::CreateIfMissing => self.create(path, self.strict),
            _ => self.no_match(path, self.strict),
        }
    }

    /// Creates the target of `path` under every node its parent path
    /// matches, stamping the key predicates onto each new node.
    pub fn create(&mut self, path: &str, strict: bool) -> Result<Vec<NodeHandle>, PokeError> {
        let target = ExtendedPath::parse(path)?;
        let parents = if target.parent_path.is_empty() {
            vec![NodeHandle::Element(self.tree.root())]
        } else {
            self.select(&target.parent_path)?
        };
        if parents.is_empty() {
            return self.no_match(&target.parent_path, strict);
        }

        let mut created = Vec::with_capacity(parents.len());
        for parent in parents {
            let node = synth::add_node(
                self.tree,
                self.aliases,
                parent.id(),
                &target.target_name,
                target.is_attribute,
                None,
            )?;
            // Attributes have nowhere to carry keys.
            if !node.is_attribute() {
                for key in &target.key_predicates {
                    synth::add_node(
                        self.tree,
                        self.aliases,
                        node.id(),
                        &key.name,
                        key.is_attribute,
                        Some(&key.value),
                    )?;
                }
            }
            created.push(node);
        }
        Ok(created)
    }

    /// Creates whichever steps of `path` are missing, left to right. Once
    /// one step had to be created, the rest are created without looking.
    pub fn ensure(&mut self, path: &str) -> Result<(), PokeError> {
        let mut created = false;
        for prefix in step_prefixes(path) {
            if created || self.select(prefix)?.is_empty() {
                self.create(prefix, false)?;
                created = true;
            }
        }
        Ok(())
    }

    pub(crate) fn no_match(&self, path: &str, strict: bool) -> Result<Vec<NodeHandle>, PokeError> {
        if strict {
            let err = PokeError::NoMatch(path.to_string());
            log::warn!("{}", err);
            return Err(err);
        }
        Ok(Vec::new())
    }

    pub(crate) fn strict(&self) -> bool {
        self.strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<F>(xml: &str, strict: bool, f: F) -> (Result<Vec<NodeHandle>, PokeError>, String)
    where
        F: FnOnce(&mut Resolver<'_>) -> Result<Vec<NodeHandle>, PokeError>,
    {
        let mut tree = Tree::parse(xml).unwrap();
        let result = f(&mut Resolver::new(&mut tree, None, strict));
        (result, tree.to_xml())
    }

    #[test]
    fn test_existing_policy() {
        let (nodes, _) = run("<a><b/><b/></a>", false, |r| r.query("a/b", Policy::Existing));
        assert_eq!(nodes.unwrap().len(), 2);

        let (nodes, xml) = run("<a/>", false, |r| r.query("a/b", Policy::Existing));
        assert!(nodes.unwrap().is_empty());
        assert_eq!(xml, "<a/>");

        let (err, _) = run("<a/>", true, |r| r.query("a/b", Policy::Existing));
        assert_eq!(err.unwrap_err().to_string(), "No matching nodes for xpath 'a/b'.");
    }

    #[test]
    fn test_create_if_missing_fans_out() {
        let (nodes, xml) = run("<a><b/><b><c/></b></a>", false, |r| {
            r.query("a/b/c", Policy::CreateIfMissing)
        });
        // The existing match wins; nothing is created.
        assert_eq!(nodes.unwrap().len(), 1);
        assert_eq!(xml, "<a><b/><b><c/></b></a>");

        let (nodes, xml) = run("<a><b/><b/></a>", false, |r| {
            r.query("a/b/c[@k='v' and d='e']", Policy::CreateIfMissing)
        });
        assert_eq!(nodes.unwrap().len(), 2);
        assert_eq!(
            xml,
            "<a><b><c k=\"v\"><d>e</d></c></b><b><c k=\"v\"><d>e</d></c></b></a>"
        );
    }

    #[test]
    fn test_missing_parent_reports_parent_path() {
        let (err, _) = run("<a/>", true, |r| r.query("a/b/c", Policy::CreateIfMissing));
        assert_eq!(err.unwrap_err().to_string(), "No matching nodes for xpath 'a/b'.");

        let (nodes, xml) = run("<a/>", false, |r| r.query("a/b/c", Policy::AlwaysCreate));
        assert!(nodes.unwrap().is_empty());
        assert_eq!(xml, "<a/>");
    }

    #[test]
    fn test_always_create_adds_siblings() {
        let (_, xml) = run("<a><b/></a>", false, |r| {
            r.query("a/b", Policy::AlwaysCreate)?;
            r.query("a/@c", Policy::AlwaysCreate)
        });
        assert_eq!(xml, "<a c=\"\"><b/><b/></a>");
    }

    #[test]
    fn test_ensure_creates_missing_steps_once() {
        let (_, xml) = run("<a><b/></a>", false, |r| {
            r.ensure("a/b/c/d")?;
            r.ensure("a/b/c/d")?;
            Ok(Vec::new())
        });
        assert_eq!(xml, "<a><b><c><d/></c></b></a>");
    }

    #[test]
    fn test_ensure_keeps_keys() {
        let (_, xml) = run("<a/>", false, |r| {
            r.ensure("/a/b[@id='1']/c")?;
            Ok(Vec::new())
        });
        assert_eq!(xml, "<a><b id=\"1\"><c/></b></a>");
    }
}
