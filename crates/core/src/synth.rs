//! Creates the elements and attributes named by extended paths.

use crate::dispatch;
use crate::error::PokeError;
use crate::namespace::{NamespaceAliasTable, resolve_name};
use crate::value::NodeHandle;
use xmlpoke_dom::{NodeId, Tree};

/// Adds `name` under `parent`: an attribute is set (replacing a same-named
/// one with an empty value), an element is appended as the last child.
/// `initial`, when given, is written through the value dispatcher.
pub fn add_node(
    tree: &mut Tree,
    aliases: Option<&NamespaceAliasTable>,
    parent: NodeId,
    name: &str,
    is_attribute: bool,
    initial: Option<&str>,
) -> Result<NodeHandle, PokeError> {
    let resolved = resolve_name(tree, parent, name, aliases);
    let node = if is_attribute {
        NodeHandle::Attribute(tree.set_attribute(parent, &resolved.qualified, "")?)
    } else {
        let element = tree.create_element(parent, &resolved.qualified)?;
        // An unprefixed name only lands in the namespace if it is the default.
        if let Some(uri) = resolved.namespace.as_deref()
            && tree.namespace_uri(element) != Some(uri)
        {
            tree.set_attribute(element, "xmlns", uri)?;
        }
        NodeHandle::Element(element)
    };
    log::debug!(
        "Created {} '{}'",
        if is_attribute { "attribute" } else { "element" },
        resolved.qualified
    );

    if let Some(value) = initial {
        dispatch::write_text(tree, node, value)?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlpoke_dom::DomError;

    #[test]
    fn test_elements_are_appended_last() {
        let mut tree = Tree::parse("<a><b/></a>").unwrap();
        let a = tree.document_element().unwrap();
        add_node(&mut tree, None, a, "c", false, Some("d")).unwrap();
        assert_eq!(tree.to_xml(), "<a><b/><c>d</c></a>");
    }

    #[test]
    fn test_attributes_are_reset() {
        let mut tree = Tree::parse("<a b=\"old\" c=\"keep\"/>").unwrap();
        let a = tree.document_element().unwrap();
        let b = add_node(&mut tree, None, a, "b", true, None).unwrap();
        assert!(b.is_attribute());
        assert_eq!(tree.to_xml(), "<a b=\"\" c=\"keep\"/>");
        add_node(&mut tree, None, a, "d", true, Some("e")).unwrap();
        assert_eq!(tree.to_xml(), "<a b=\"\" c=\"keep\" d=\"e\"/>");
    }

    #[test]
    fn test_namespaced_names() {
        let mut aliases = NamespaceAliasTable::new();
        aliases.add("z", "uri:yada");
        aliases.add("o", "uri:other");

        let mut tree = Tree::parse("<a xmlns=\"uri:yada\"/>").unwrap();
        let a = tree.document_element().unwrap();
        add_node(&mut tree, Some(&aliases), a, "z:b", false, None).unwrap();
        add_node(&mut tree, Some(&aliases), a, "o:c", false, None).unwrap();
        assert_eq!(
            tree.to_xml(),
            "<a xmlns=\"uri:yada\"><b/><c xmlns=\"uri:other\"/></a>"
        );
    }

    #[test]
    fn test_second_root_is_rejected() {
        let mut tree = Tree::parse("<a/>").unwrap();
        let root = tree.root();
        let err = add_node(&mut tree, None, root, "b", false, None).unwrap_err();
        assert!(matches!(err, PokeError::Dom(DomError::MultipleRoots(_))));
    }
}
