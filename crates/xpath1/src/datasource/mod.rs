//! Defines the core abstraction for a navigable, read-only view of a node tree.
use std::hash::Hash;

/// The namespace URI permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

impl<'a> QName<'a> {
    /// Splits a lexical `prefix:local` name at its first colon.
    pub fn parse(name: &'a str) -> Self {
        match name.split_once(':') {
            Some((prefix, local_part)) => QName {
                prefix: Some(prefix),
                local_part,
            },
            None => QName {
                prefix: None,
                local_part: name,
            },
        }
    }
}

/// The type of a node in the tree, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract the XPath engine evaluates against.
///
/// The engine never touches a concrete tree type. Any tree that can hand out
/// cheap, copyable node references implementing this trait can be queried.
///
/// `'a` is the lifetime of the borrowed tree. `Ord` must follow document order.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The lexical qualified name of the node (e.g., `cfg:setting`). Returns `None`
    /// for node types without names, such as text or root nodes. For a processing
    /// instruction, this is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI of an element or attribute, resolved against the
    /// namespace declarations in scope. `None` means "no namespace".
    fn namespace_uri(&self) -> Option<&'a str>;

    /// The string value of the node, as defined by the XPath 1.0 `string()` function.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node, excluding namespace
    /// declarations. Empty for non-element nodes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the child nodes of this node.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. `None` for the root node. The parent of an attribute is
    /// the element that carries it.
    fn parent(&self) -> Option<Self>;
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::hash::Hasher;

    #[derive(Debug, Clone)]
    struct MockNodeData<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        namespace: Option<&'a str>,
        value: String,
        children: Vec<usize>,
        attributes: Vec<usize>,
        parent: Option<usize>,
    }

    #[derive(Debug, Default)]
    pub struct MockTree<'a> {
        nodes: Vec<MockNodeData<'a>>,
    }

    impl<'a> MockTree<'a> {
        fn push(
            &mut self,
            parent: Option<usize>,
            node_type: NodeType,
            name: Option<&'a str>,
            namespace: Option<&'a str>,
            value: &str,
        ) -> usize {
            let id = self.nodes.len();
            self.nodes.push(MockNodeData {
                node_type,
                name: name.map(QName::parse),
                namespace,
                value: value.to_string(),
                children: vec![],
                attributes: vec![],
                parent,
            });
            if let Some(p) = parent {
                if node_type == NodeType::Attribute {
                    self.nodes[p].attributes.push(id);
                } else {
                    self.nodes[p].children.push(id);
                }
            }
            id
        }
    }

    /// A node reference holding the tree it belongs to.
    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl<'a> PartialEq for MockNode<'a> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl<'a> Eq for MockNode<'a> {}

    impl<'a> PartialOrd for MockNode<'a> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl<'a> Ord for MockNode<'a> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl<'a> Hash for MockNode<'a> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.tree.nodes[self.id].node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.tree.nodes[self.id].name
        }

        fn namespace_uri(&self) -> Option<&'a str> {
            self.tree.nodes[self.id].namespace
        }

        fn string_value(&self) -> String {
            self.tree.nodes[self.id].value.clone()
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(
                tree.nodes[self.id]
                    .attributes
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(
                tree.nodes[self.id]
                    .children
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn parent(&self) -> Option<Self> {
            self.tree.nodes[self.id].parent.map(|id| MockNode {
                id,
                tree: self.tree,
            })
        }
    }

    /// Creates a small mock tree for testing:
    /// ```text
    /// <!-- id 0: root -->
    /// <config xmlns:c="urn:cfg">                    <!-- id 1 -->
    ///   <c:setting name="debug">on</c:setting>      <!-- id 2, attr 3, text 4 -->
    ///   <!-- note -->                               <!-- id 5 -->
    ///   <entry key="a">alpha</entry>                <!-- id 6, attr 7, text 8 -->
    ///   <?build fast?>                              <!-- id 9 -->
    ///   <entry key="b">beta</entry>                 <!-- id 10, attr 11, text 12 -->
    /// </config>
    /// ```
    pub fn create_test_tree<'a>() -> MockTree<'a> {
        let mut tree = MockTree::default();
        let root = tree.push(None, NodeType::Root, None, None, "onalphabeta");
        let config = tree.push(Some(root), NodeType::Element, Some("config"), None, "onalphabeta");
        let setting = tree.push(
            Some(config),
            NodeType::Element,
            Some("c:setting"),
            Some("urn:cfg"),
            "on",
        );
        tree.push(Some(setting), NodeType::Attribute, Some("name"), None, "debug");
        tree.push(Some(setting), NodeType::Text, None, None, "on");
        tree.push(Some(config), NodeType::Comment, None, None, " note ");
        let entry_a = tree.push(Some(config), NodeType::Element, Some("entry"), None, "alpha");
        tree.push(Some(entry_a), NodeType::Attribute, Some("key"), None, "a");
        tree.push(Some(entry_a), NodeType::Text, None, None, "alpha");
        tree.push(
            Some(config),
            NodeType::ProcessingInstruction,
            Some("build"),
            None,
            "fast",
        );
        let entry_b = tree.push(Some(config), NodeType::Element, Some("entry"), None, "beta");
        tree.push(Some(entry_b), NodeType::Attribute, Some("key"), None, "b");
        tree.push(Some(entry_b), NodeType::Text, None, None, "beta");
        tree
    }
}
