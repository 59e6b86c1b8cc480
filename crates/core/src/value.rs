//! Values written by the session verbs and the handles they are written to.

use std::fmt;
use xmlpoke_dom::{DomError, NodeId, Tree};

/// A node a verb resolved to. Anything that is not an attribute (elements,
/// and text or comment nodes selected directly) is an `Element` handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeHandle {
    Element(NodeId),
    Attribute(NodeId),
}

impl NodeHandle {
    pub fn from_node(tree: &Tree, id: NodeId) -> Self {
        if tree.is_attribute(id) {
            NodeHandle::Attribute(id)
        } else {
            NodeHandle::Element(id)
        }
    }

    pub fn id(self) -> NodeId {
        match self {
            NodeHandle::Element(id) | NodeHandle::Attribute(id) => id,
        }
    }

    pub fn is_attribute(self) -> bool {
        matches!(self, NodeHandle::Attribute(_))
    }

    pub fn name(self, tree: &Tree) -> Option<&str> {
        tree.name(self.id())
    }

    /// The attribute value, or the text content of anything else.
    pub fn current_value(self, tree: &Tree) -> String {
        tree.text_content(self.id())
    }

    pub fn set_value(self, tree: &mut Tree, value: &str) -> Result<(), DomError> {
        tree.set_text_content(self.id(), value)
    }
}

/// Read access to a node, handed to transforms.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    handle: NodeHandle,
}

impl<'a> NodeRef<'a> {
    pub fn new(tree: &'a Tree, handle: NodeHandle) -> Self {
        Self { tree, handle }
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    pub fn name(&self) -> Option<&'a str> {
        self.tree.name(self.handle.id())
    }

    pub fn is_attribute(&self) -> bool {
        self.handle.is_attribute()
    }

    pub fn value(&self) -> String {
        self.handle.current_value(self.tree)
    }

    /// The value of an attribute of this element.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.tree.attribute_value(self.handle.id(), name)
    }

    /// The node and its subtree as markup.
    pub fn to_xml(&self) -> String {
        self.tree.node_to_xml(self.handle.id())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Boolean(b) => write!(f, "{b}"),
            Scalar::Number(n) if n.is_nan() => f.write_str("NaN"),
            Scalar::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // `{}` already prints 5.0 as "5" and 1.5 as "1.5".
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

pub type TransformFn = dyn Fn(NodeRef<'_>, &str) -> Value;

/// What a verb writes.
pub enum Value {
    Scalar(Scalar),
    /// Called once per node with the node and its current value.
    Transform(Box<TransformFn>),
    /// Replaces the children of an element with one CDATA section.
    CData(String),
    /// Replaces the children of an element with a parsed fragment.
    Xml(String),
    /// Values for children of each node. Keys starting with `@` address
    /// attributes, other keys child elements.
    Mapping(Vec<(String, Value)>),
}

impl Value {
    pub fn transform<F, V>(f: F) -> Value
    where
        F: Fn(NodeRef<'_>, &str) -> V + 'static,
        V: Into<Value>,
    {
        Value::Transform(Box::new(move |node, current| f(node, current).into()))
    }

    pub fn cdata(text: impl Into<String>) -> Value {
        Value::CData(text.into())
    }

    pub fn xml(fragment: impl Into<String>) -> Value {
        Value::Xml(fragment.into())
    }

    pub fn mapping<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// A short name for the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "a scalar",
            Value::Transform(_) => "a transform",
            Value::CData(_) => "a CDATA section",
            Value::Xml(_) => "an XML fragment",
            Value::Mapping(_) => "a mapping",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            Value::Transform(_) => f.write_str("Transform(..)"),
            Value::CData(s) => f.debug_tuple("CData").field(s).finish(),
            Value::Xml(s) => f.debug_tuple("Xml").field(s).finish(),
            Value::Mapping(entries) => f.debug_tuple("Mapping").field(entries).finish(),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::Text(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::Text(s))
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Scalar(Scalar::Text(s.clone()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Boolean(b))
    }
}

macro_rules! number_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Scalar(Scalar::Number(n as f64))
            }
        })*
    };
}

number_into_value!(i32, i64, u32, u64, usize, f64);

/// Widened through its shortest decimal form, so `0.1f32` stays `0.1`.
impl From<f32> for Value {
    fn from(n: f32) -> Self {
        let widened = n.to_string().parse().unwrap_or(f64::from(n));
        Value::Scalar(Scalar::Number(widened))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(Scalar::Number(5.0).to_string(), "5");
        assert_eq!(Scalar::Number(1.5).to_string(), "1.5");
        assert_eq!(Scalar::Number(-0.25).to_string(), "-0.25");
        assert_eq!(Scalar::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Scalar::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_conversions() {
        assert!(matches!(Value::from(3), Value::Scalar(Scalar::Number(n)) if n == 3.0));
        assert!(matches!(Value::from(false), Value::Scalar(Scalar::Boolean(false))));
        match Value::from(0.1f32) {
            Value::Scalar(n) => assert_eq!(n.to_string(), "0.1"),
            other => panic!("expected a scalar, got {other:?}"),
        }
        let mapping = Value::mapping([("b", Value::from("c")), ("@d", Value::from(1))]);
        match mapping {
            Value::Mapping(entries) => {
                assert_eq!(entries[0].0, "b");
                assert_eq!(entries[1].0, "@d");
            }
            other => panic!("expected a mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_node_handles() {
        let mut tree = Tree::parse("<a b=\"c\">text</a>").unwrap();
        let a = tree.document_element().unwrap();
        let b = tree.attribute(a, "b").unwrap();
        let element = NodeHandle::from_node(&tree, a);
        let attribute = NodeHandle::from_node(&tree, b);
        assert_eq!(element, NodeHandle::Element(a));
        assert!(attribute.is_attribute());
        assert_eq!(attribute.current_value(&tree), "c");

        attribute.set_value(&mut tree, "d").unwrap();
        element.set_value(&mut tree, "e").unwrap();
        assert_eq!(tree.to_xml(), "<a b=\"d\">e</a>");
        assert_eq!(NodeRef::new(&tree, element).attribute("b"), Some("d"));
    }
}
