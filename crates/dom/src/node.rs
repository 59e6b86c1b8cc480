//! Exposes a [`Tree`] to the XPath engine.

use crate::tree::{NodeId, NodeKind, Tree};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use xmlpoke_xpath1::{DataSourceNode, NodeType, QName};

/// A copyable reference to one node of a borrowed tree.
#[derive(Debug, Clone, Copy)]
pub struct XmlNode<'a> {
    pub tree: &'a Tree,
    pub id: NodeId,
}

impl<'a> XmlNode<'a> {
    pub fn new(tree: &'a Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// The document node of `tree`.
    pub fn root(tree: &'a Tree) -> Self {
        Self::new(tree, tree.root())
    }
}

impl PartialEq for XmlNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for XmlNode<'_> {}

impl Hash for XmlNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for XmlNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Document order.
impl Ord for XmlNode<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.id == other.id {
            return Ordering::Equal;
        }
        self.tree
            .document_order(self.id)
            .cmp(&other.tree.document_order(other.id))
            .then(self.id.cmp(&other.id))
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a> {
    fn node_type(&self) -> NodeType {
        match self.tree.kind(self.id) {
            NodeKind::Document => NodeType::Root,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Attribute { .. } => NodeType::Attribute,
            NodeKind::Text(_) | NodeKind::CData(_) => NodeType::Text,
            // Declarations and doctypes are never handed out by `children`.
            NodeKind::Comment(_) | NodeKind::Declaration(_) | NodeKind::DocType(_) => {
                NodeType::Comment
            }
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        self.tree.name(self.id).map(QName::parse)
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        self.tree.namespace_uri(self.id)
    }

    fn string_value(&self) -> String {
        self.tree.text_content(self.id)
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let tree = self.tree;
        Box::new(
            tree.attributes(self.id)
                .iter()
                .copied()
                .filter(move |&a| !tree.is_namespace_declaration(a))
                .map(move |id| XmlNode { tree, id }),
        )
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let tree = self.tree;
        Box::new(
            tree.children(self.id)
                .iter()
                .copied()
                .filter(move |&c| {
                    !matches!(tree.kind(c), NodeKind::Declaration(_) | NodeKind::DocType(_))
                })
                .map(move |id| XmlNode { tree, id }),
        )
    }

    fn parent(&self) -> Option<Self> {
        self.tree.parent(self.id).map(|id| XmlNode {
            tree: self.tree,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlpoke_xpath1::{Namespaces, select};

    fn select_xml(tree: &Tree, expr: &str, namespaces: Option<&Namespaces>) -> Vec<String> {
        select(expr, XmlNode::root(tree), namespaces)
            .unwrap()
            .iter()
            .map(|n| tree.node_to_xml(n.id))
            .collect()
    }

    #[test]
    fn test_select_elements_and_attributes() {
        let tree = Tree::parse("<a><b k=\"1\">x</b><b k=\"2\">y</b></a>").unwrap();
        assert_eq!(select_xml(&tree, "a/b[@k='2']", None), vec!["<b k=\"2\">y</b>"]);
        assert_eq!(select_xml(&tree, "/a/b/@k", None), vec!["k=\"1\"", "k=\"2\""]);
        assert_eq!(select_xml(&tree, "//text()", None), vec!["x", "y"]);
    }

    #[test]
    fn test_namespace_declarations_are_not_attributes() {
        let tree = Tree::parse("<a xmlns:x=\"urn:x\" b=\"c\"/>").unwrap();
        assert_eq!(select_xml(&tree, "a/@*", None), vec!["b=\"c\""]);
    }

    #[test]
    fn test_default_namespace_needs_a_prefix() {
        let tree = Tree::parse("<a xmlns=\"uri:yada\"><b/></a>").unwrap();
        assert!(select_xml(&tree, "/a/b", None).is_empty());

        let mut ns = Namespaces::new();
        ns.insert("z".to_string(), "uri:yada".to_string());
        assert_eq!(select_xml(&tree, "/z:a/z:b", Some(&ns)), vec!["<b/>"]);
    }

    #[test]
    fn test_document_order_after_insertion() {
        let mut tree = Tree::parse("<a><b/><c/></a>").unwrap();
        let a = tree.document_element().unwrap();
        let (b, c) = (tree.children(a)[0], tree.children(a)[1]);
        // Allocated last, but it sits before <c> in the document.
        let d = tree.create_element(b, "d").unwrap();
        let nodes = select("//*", XmlNode::root(&tree), None).unwrap();
        let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a, b, d, c]);
    }
}
