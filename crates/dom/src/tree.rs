//! The arena that owns every node of a document.

use crate::error::DomError;
use std::cell::OnceCell;
use xmlpoke_xpath1::XML_NAMESPACE;

/// The namespace URI of `xmlns` and `xmlns:*` declaration attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Index of a node inside its [`Tree`]. Only meaningful for the tree that
/// handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element { name: String },
    Attribute { name: String, value: String },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
    /// The raw `<?xml ...?>` markup.
    Declaration(String),
    /// The raw `<!DOCTYPE ...>` markup.
    DocType(String),
}

impl NodeKind {
    fn label(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Element { .. } => "element",
            NodeKind::Attribute { .. } => "attribute",
            NodeKind::Text(_) => "text",
            NodeKind::CData(_) => "CDATA",
            NodeKind::Comment(_) => "comment",
            NodeKind::ProcessingInstruction { .. } => "processing instruction",
            NodeKind::Declaration(_) => "declaration",
            NodeKind::DocType(_) => "doctype",
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<NodeId>,
}

/// An XML document. Node 0 is always the document node.
///
/// Detached nodes stay in the arena but are unreachable from the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    /// Preorder rank of every node, rebuilt lazily after structural edits.
    order: OnceCell<Vec<usize>>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: vec![],
                attributes: vec![],
            }],
            order: OnceCell::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The single element child of the document node, if any.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&c| self.is_element(c))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].attributes
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    pub fn is_attribute(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Attribute { .. })
    }

    /// The lexical name of an element or attribute, or the target of a
    /// processing instruction.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name } | NodeKind::Attribute { name, .. } => Some(name),
            NodeKind::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    /// The part of the name after the first colon.
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id)
            .map(|n| n.split_once(':').map_or(n, |(_, local)| local))
    }

    // --- Construction ---

    /// Appends a node without validating the parent. Used by the parser,
    /// which enforces document structure itself.
    pub(crate) fn push_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        self.order.take();
        let is_attribute = matches!(kind, NodeKind::Attribute { .. });
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: vec![],
            attributes: vec![],
        });
        if is_attribute {
            self.nodes[parent.0].attributes.push(id);
        } else {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn ensure_container(&self, parent: NodeId) -> Result<(), DomError> {
        match self.kind(parent) {
            NodeKind::Document | NodeKind::Element { .. } => Ok(()),
            other => Err(DomError::InvalidParent(other.label())),
        }
    }

    /// Appends a new element as the last child of `parent`.
    ///
    /// The document node accepts a single element child.
    pub fn create_element(&mut self, parent: NodeId, name: &str) -> Result<NodeId, DomError> {
        self.ensure_container(parent)?;
        if parent == self.root() && self.document_element().is_some() {
            return Err(DomError::MultipleRoots(name.to_string()));
        }
        Ok(self.push_child(
            parent,
            NodeKind::Element {
                name: name.to_string(),
            },
        ))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        self.ensure_container(parent)?;
        Ok(self.push_child(parent, NodeKind::Text(text.to_string())))
    }

    pub fn append_cdata(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        self.ensure_container(parent)?;
        Ok(self.push_child(parent, NodeKind::CData(text.to_string())))
    }

    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        self.ensure_container(parent)?;
        Ok(self.push_child(parent, NodeKind::Comment(text.to_string())))
    }

    /// Sets an attribute on `element`, replacing the value of a same-named
    /// attribute or appending a new one. Returns the attribute node.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        value: &str,
    ) -> Result<NodeId, DomError> {
        if !self.is_element(element) {
            return Err(DomError::InvalidParent(self.kind(element).label()));
        }
        if let Some(existing) = self.attribute(element, name) {
            self.set_attribute_value(existing, value);
            return Ok(existing);
        }
        Ok(self.push_child(
            element,
            NodeKind::Attribute {
                name: name.to_string(),
                value: value.to_string(),
            },
        ))
    }

    /// The attribute node of `element` with exactly this lexical name.
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<NodeId> {
        self.attributes(element)
            .iter()
            .copied()
            .find(|&a| self.name(a) == Some(name))
    }

    pub fn attribute_value(&self, element: NodeId, name: &str) -> Option<&str> {
        self.attribute(element, name).and_then(|a| match self.kind(a) {
            NodeKind::Attribute { value, .. } => Some(value.as_str()),
            _ => None,
        })
    }

    fn set_attribute_value(&mut self, attribute: NodeId, new_value: &str) {
        if let NodeKind::Attribute { value, .. } = &mut self.nodes[attribute.0].kind {
            *value = new_value.to_string();
        }
    }

    // --- Content ---

    /// The DOM `textContent` of a node: an attribute's value, the
    /// concatenated text and CDATA of an element's descendants, or the
    /// character data of a leaf node.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::Text(t) | NodeKind::CData(t) | NodeKind::Comment(t) => t.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone(),
            NodeKind::Declaration(_) | NodeKind::DocType(_) => String::new(),
            NodeKind::Document | NodeKind::Element { .. } => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match self.kind(child) {
                NodeKind::Text(t) | NodeKind::CData(t) => out.push_str(t),
                NodeKind::Element { .. } => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    /// Replaces the value of a node. Elements lose all children and gain a
    /// single text node, unless `text` is empty.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        if self.is_element(id) {
            self.clear_children(id);
            if !text.is_empty() {
                self.push_child(id, NodeKind::Text(text.to_string()));
            }
            return Ok(());
        }
        match &mut self.nodes[id.0].kind {
            NodeKind::Attribute { value, .. } => *value = text.to_string(),
            NodeKind::Text(t) | NodeKind::CData(t) | NodeKind::Comment(t) => *t = text.to_string(),
            NodeKind::ProcessingInstruction { data, .. } => *data = text.to_string(),
            other => return Err(DomError::InvalidParent(other.label())),
        }
        Ok(())
    }

    /// Detaches every child of `id`. Attributes are kept.
    pub fn clear_children(&mut self, id: NodeId) {
        self.order.take();
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Removes a node (element, attribute or any other child) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        self.order.take();
        if let Some(parent) = self.nodes[id.0].parent.take() {
            let data = &mut self.nodes[parent.0];
            data.children.retain(|&c| c != id);
            data.attributes.retain(|&a| a != id);
        }
    }

    /// Deep-copies `node` from another tree and appends it under `parent`.
    pub fn import(&mut self, parent: NodeId, source: &Tree, node: NodeId) -> Result<NodeId, DomError> {
        self.ensure_container(parent)?;
        let kind = source.kind(node).clone();
        if let NodeKind::Element { name } = &kind
            && parent == self.root()
            && self.document_element().is_some()
        {
            return Err(DomError::MultipleRoots(name.clone()));
        }
        let copy = self.push_child(parent, kind);
        for &attr in source.attributes(node) {
            self.push_child(copy, source.kind(attr).clone());
        }
        for &child in source.children(node) {
            self.import(copy, source, child)?;
        }
        Ok(copy)
    }

    /// Appends the top-level nodes of a parsed fragment under `parent`.
    /// A fragment's declaration and doctype are dropped.
    pub fn append_fragment(&mut self, parent: NodeId, fragment: &Tree) -> Result<Vec<NodeId>, DomError> {
        let mut added = Vec::new();
        for &node in fragment.children(fragment.root()) {
            if matches!(
                fragment.kind(node),
                NodeKind::Declaration(_) | NodeKind::DocType(_)
            ) {
                continue;
            }
            added.push(self.import(parent, fragment, node)?);
        }
        Ok(added)
    }

    // --- Namespaces ---

    pub fn is_namespace_declaration(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Attribute { name, .. }
            if name == "xmlns" || name.starts_with("xmlns:"))
    }

    /// The nearest element at or above `id` (an attribute resolves to its owner).
    fn scope_element(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_element(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Resolves `prefix` (or the default namespace for `None`) against the
    /// declarations in scope at `id`. An empty `xmlns=""` undeclares the
    /// default namespace.
    pub fn lookup_namespace_uri(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        if prefix == Some("xmlns") {
            return Some(XMLNS_NAMESPACE);
        }
        let declaration = match prefix {
            Some(p) => format!("xmlns:{}", p),
            None => "xmlns".to_string(),
        };
        let mut current = self.scope_element(id);
        while let Some(element) = current {
            if let Some(uri) = self.attribute_value(element, &declaration) {
                return if uri.is_empty() { None } else { Some(uri) };
            }
            current = self.parent(element).and_then(|p| self.scope_element(p));
        }
        None
    }

    /// A non-default prefix bound to `uri` at `id` that is not shadowed by a
    /// closer declaration.
    pub fn lookup_prefix(&self, id: NodeId, uri: &str) -> Option<&str> {
        let mut current = self.scope_element(id);
        while let Some(element) = current {
            for &attr in self.attributes(element) {
                if let NodeKind::Attribute { name, value } = self.kind(attr)
                    && let Some(prefix) = name.strip_prefix("xmlns:")
                    && value == uri
                    && self.lookup_namespace_uri(id, Some(prefix)) == Some(uri)
                {
                    return Some(prefix);
                }
            }
            current = self.parent(element).and_then(|p| self.scope_element(p));
        }
        None
    }

    /// The namespace URI of an element or attribute. Unprefixed attributes
    /// are in no namespace.
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let name = self.name(id)?;
        let prefix = name.split_once(':').map(|(p, _)| p);
        match self.kind(id) {
            NodeKind::Element { .. } => self.lookup_namespace_uri(id, prefix),
            NodeKind::Attribute { .. } => {
                if name == "xmlns" {
                    Some(XMLNS_NAMESPACE)
                } else {
                    prefix.and_then(|p| self.lookup_namespace_uri(id, Some(p)))
                }
            }
            _ => None,
        }
    }

    /// The rank of `id` in document order. Attributes sort after their
    /// element and before its children; detached nodes sort last.
    pub fn document_order(&self, id: NodeId) -> usize {
        self.order.get_or_init(|| self.preorder())[id.0]
    }

    fn preorder(&self) -> Vec<usize> {
        let mut ranks = vec![usize::MAX; self.nodes.len()];
        let mut next = 0;
        let mut pending = vec![self.root()];
        while let Some(id) = pending.pop() {
            ranks[id.0] = next;
            next += 1;
            let data = &self.nodes[id.0];
            for &attr in &data.attributes {
                ranks[attr.0] = next;
                next += 1;
            }
            pending.extend(data.children.iter().rev());
        }
        ranks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let config = tree.create_element(root, "config").unwrap();
        tree.set_attribute(config, "xmlns:c", "urn:cfg").unwrap();
        let setting = tree.create_element(config, "c:setting").unwrap();
        tree.append_text(setting, "on").unwrap();
        (tree, config, setting)
    }

    #[test]
    fn test_single_root_element() {
        let (mut tree, config, _) = sample();
        assert_eq!(tree.document_element(), Some(config));
        let err = tree.create_element(tree.root(), "other").unwrap_err();
        assert_eq!(err, DomError::MultipleRoots("other".to_string()));
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let (mut tree, config, _) = sample();
        let a = tree.set_attribute(config, "mode", "x").unwrap();
        let b = tree.set_attribute(config, "mode", "y").unwrap();
        assert_eq!(a, b);
        assert_eq!(tree.attribute_value(config, "mode"), Some("y"));
        assert_eq!(tree.attributes(config).len(), 2);
    }

    #[test]
    fn test_text_content_round_trip() {
        let (mut tree, config, setting) = sample();
        assert_eq!(tree.text_content(config), "on");
        tree.set_text_content(setting, "off").unwrap();
        assert_eq!(tree.text_content(setting), "off");
        tree.set_text_content(setting, "").unwrap();
        assert!(tree.children(setting).is_empty());
    }

    #[test]
    fn test_detach_and_clear() {
        let (mut tree, config, setting) = sample();
        let ns = tree.attribute(config, "xmlns:c").unwrap();
        tree.detach(ns);
        assert!(tree.attributes(config).is_empty());
        tree.clear_children(config);
        assert!(tree.children(config).is_empty());
        assert_eq!(tree.parent(setting), None);
    }

    #[test]
    fn test_namespace_lookup() {
        let (mut tree, config, setting) = sample();
        assert_eq!(tree.namespace_uri(setting), Some("urn:cfg"));
        assert_eq!(tree.namespace_uri(config), None);
        assert_eq!(tree.lookup_prefix(setting, "urn:cfg"), Some("c"));

        // A closer redeclaration shadows the outer binding.
        tree.set_attribute(setting, "xmlns:c", "urn:other").unwrap();
        assert_eq!(tree.lookup_prefix(setting, "urn:cfg"), None);
        assert_eq!(tree.lookup_prefix(config, "urn:cfg"), Some("c"));
    }

    #[test]
    fn test_default_namespace_has_no_prefix() {
        let mut tree = Tree::new();
        let a = tree.create_element(tree.root(), "a").unwrap();
        tree.set_attribute(a, "xmlns", "uri:yada").unwrap();
        let b = tree.create_element(a, "b").unwrap();
        assert_eq!(tree.namespace_uri(b), Some("uri:yada"));
        assert_eq!(tree.lookup_prefix(b, "uri:yada"), None);
        let attr = tree.set_attribute(b, "c", "d").unwrap();
        assert_eq!(tree.namespace_uri(attr), None);
    }

    #[test]
    fn test_children_rejected_on_leaf_nodes() {
        let (mut tree, _, setting) = sample();
        let text = tree.children(setting)[0];
        assert_eq!(
            tree.create_element(text, "x").unwrap_err(),
            DomError::InvalidParent("text")
        );
    }

    #[test]
    fn test_document_order_ranks_attributes_before_children() {
        let (mut tree, config, setting) = sample();
        let ns = tree.attribute(config, "xmlns:c").unwrap();
        let later = tree.create_element(config, "later").unwrap();
        let mut nodes = vec![later, setting, ns, config];
        nodes.sort_by_key(|&n| tree.document_order(n));
        assert_eq!(nodes, vec![config, ns, setting, later]);

        tree.detach(setting);
        let moved = tree.create_element(config, "moved").unwrap();
        assert!(tree.document_order(later) < tree.document_order(moved));
        assert_eq!(tree.document_order(setting), usize::MAX);
    }
}
