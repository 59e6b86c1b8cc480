//! Writes a [`Value`] to resolved nodes.

use crate::error::PokeError;
use crate::namespace::resolve_name;
use crate::query::{Policy, Resolver};
use crate::synth;
use crate::value::{NodeHandle, NodeRef, Value};
use xmlpoke_dom::Tree;

/// Writes `value` to every node. `path` names the nodes in errors raised
/// while resolving the children of a mapping.
pub fn apply(
    resolver: &mut Resolver<'_>,
    nodes: &[NodeHandle],
    value: &Value,
    policy: Policy,
    path: &str,
) -> Result<(), PokeError> {
    for &node in nodes {
        apply_to_node(resolver, node, value, policy, path)?;
    }
    Ok(())
}

fn apply_to_node(
    resolver: &mut Resolver<'_>,
    node: NodeHandle,
    value: &Value,
    policy: Policy,
    path: &str,
) -> Result<(), PokeError> {
    match value {
        Value::Transform(transform) => {
            let next = {
                let tree = resolver.tree();
                let current = node.current_value(tree);
                transform(NodeRef::new(tree, node), &current)
            };
            apply_to_node(resolver, node, &next, policy, path)
        }
        Value::Scalar(scalar) => write_text(resolver.tree_mut(), node, &scalar.to_string()),
        Value::CData(text) => {
            let tree = resolver.tree_mut();
            let id = content_target(tree, node, value)?;
            tree.clear_children(id);
            tree.append_cdata(id, text)?;
            Ok(())
        }
        Value::Xml(source) => {
            let fragment = Tree::parse_fragment(source)?;
            let tree = resolver.tree_mut();
            let id = content_target(tree, node, value)?;
            tree.clear_children(id);
            tree.append_fragment(id, &fragment)?;
            Ok(())
        }
        Value::Mapping(entries) => {
            for (selector, child) in entries {
                let children = resolve_children(resolver, node, selector, policy, path)?;
                let child_path = format!("{path}/{selector}");
                apply(resolver, &children, child, policy, &child_path)?;
            }
            Ok(())
        }
    }
}

/// Assigns an attribute value, or replaces the content of anything else
/// with a single text node.
pub(crate) fn write_text(tree: &mut Tree, node: NodeHandle, text: &str) -> Result<(), PokeError> {
    node.set_value(tree, text)?;
    Ok(())
}

fn content_target(
    tree: &Tree,
    node: NodeHandle,
    value: &Value,
) -> Result<xmlpoke_dom::NodeId, PokeError> {
    match node {
        NodeHandle::Element(id) => Ok(id),
        NodeHandle::Attribute(id) => Err(PokeError::AttributeValue {
            kind: value.kind(),
            name: tree.name(id).unwrap_or_default().to_string(),
        }),
    }
}

/// The attributes or child elements of `node` a mapping key addresses.
fn resolve_children(
    resolver: &mut Resolver<'_>,
    node: NodeHandle,
    selector: &str,
    policy: Policy,
    path: &str,
) -> Result<Vec<NodeHandle>, PokeError> {
    let (is_attribute, name) = match selector.strip_prefix('@') {
        Some(name) => (true, name),
        None => (false, selector),
    };
    let parent = node.id();

    let existing: Vec<NodeHandle> = if policy == Policy::AlwaysCreate {
        Vec::new()
    } else {
        let tree = resolver.tree();
        let qualified = resolve_name(tree, parent, name, resolver.aliases()).qualified;
        if is_attribute {
            tree.attribute(parent, &qualified)
                .map(NodeHandle::Attribute)
                .into_iter()
                .collect()
        } else {
            tree.children(parent)
                .iter()
                .copied()
                .filter(|&c| tree.is_element(c) && tree.name(c) == Some(qualified.as_str()))
                .map(NodeHandle::Element)
                .collect()
        }
    };
    if !existing.is_empty() {
        return Ok(existing);
    }

    match policy {
        Policy::Existing => resolver.no_match(&format!("{path}/{selector}"), resolver.strict()),
        Policy::CreateIfMissing | Policy::AlwaysCreate => {
            let aliases = resolver.aliases();
            let created =
                synth::add_node(resolver.tree_mut(), aliases, parent, name, is_attribute, None)?;
            Ok(vec![created])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poke(xml: &str, path: &str, value: Value, policy: Policy) -> Result<String, PokeError> {
        let mut tree = Tree::parse(xml).unwrap();
        let mut resolver = Resolver::new(&mut tree, None, false);
        let nodes = resolver.query(path, policy)?;
        apply(&mut resolver, &nodes, &value, policy, path)?;
        Ok(tree.to_xml())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(
            poke("<a><b>old<c/></b></a>", "a/b", Value::from("new"), Policy::Existing).unwrap(),
            "<a><b>new</b></a>"
        );
        assert_eq!(
            poke("<a b=\"1\"/>", "a/@b", Value::from(2.5), Policy::Existing).unwrap(),
            "<a b=\"2.5\"/>"
        );
        assert_eq!(
            poke("<a>x</a>", "a", Value::from(""), Policy::Existing).unwrap(),
            "<a/>"
        );
    }

    #[test]
    fn test_transform_sees_current_value() {
        let value = Value::transform(|node, current| format!("{}:{current}!", node.name().unwrap_or("?")));
        assert_eq!(
            poke("<a><b>x</b><b>y</b></a>", "a/b", value, Policy::Existing).unwrap(),
            "<a><b>b:x!</b><b>b:y!</b></a>"
        );
    }

    #[test]
    fn test_transform_may_return_a_mapping() {
        let value = Value::transform(|_, current| Value::mapping([("@was", current)]));
        assert_eq!(
            poke("<a>x</a>", "a", value, Policy::CreateIfMissing).unwrap(),
            "<a was=\"x\">x</a>"
        );
    }

    #[test]
    fn test_cdata_and_fragments() {
        assert_eq!(
            poke("<a><b>x</b></a>", "a", Value::cdata("<y>"), Policy::Existing).unwrap(),
            "<a><![CDATA[<y>]]></a>"
        );
        assert_eq!(
            poke("<a>x</a>", "a", Value::xml("<b c=\"d\"/>text<e/>"), Policy::Existing).unwrap(),
            "<a><b c=\"d\"/>text<e/></a>"
        );
    }

    #[test]
    fn test_wrappers_rejected_on_attributes() {
        let err = poke("<a b=\"1\"/>", "a/@b", Value::cdata("x"), Policy::Existing).unwrap_err();
        assert_eq!(err.to_string(), "Cannot assign a CDATA section to attribute 'b'");
        let err = poke("<a b=\"1\"/>", "a/@b", Value::xml("<x/>"), Policy::Existing).unwrap_err();
        assert!(matches!(err, PokeError::AttributeValue { kind: "an XML fragment", .. }));
    }

    #[test]
    fn test_mapping_creates_children() {
        let value = Value::mapping([("b", Value::from("c")), ("@d", Value::from("e"))]);
        assert_eq!(
            poke("<a/>", "a", value, Policy::CreateIfMissing).unwrap(),
            "<a d=\"e\"><b>c</b></a>"
        );
    }

    #[test]
    fn test_mapping_follows_policy() {
        let nested = || Value::mapping([("b", Value::mapping([("@c", "d")]))]);
        assert_eq!(
            poke("<a><b/></a>", "a", nested(), Policy::Existing).unwrap(),
            "<a><b c=\"d\"/></a>"
        );
        assert_eq!(
            poke("<a/>", "a", nested(), Policy::Existing).unwrap(),
            "<a/>"
        );
        assert!(matches!(
            poke("<a><b/></a>", "a", nested(), Policy::AlwaysCreate),
            Err(PokeError::Dom(xmlpoke_dom::DomError::MultipleRoots(_)))
        ));
        assert_eq!(
            poke("<r><a><b/></a></r>", "r/a", nested(), Policy::AlwaysCreate).unwrap(),
            "<r><a><b/></a><a><b c=\"d\"/></a></r>"
        );
    }

    #[test]
    fn test_mapping_no_match_names_the_child_path() {
        let mut tree = Tree::parse("<a/>").unwrap();
        let mut resolver = Resolver::new(&mut tree, None, true);
        let nodes = resolver.query("a", Policy::Existing).unwrap();
        let value = Value::mapping([("b", "c")]);
        let err = apply(&mut resolver, &nodes, &value, Policy::Existing, "a").unwrap_err();
        assert_eq!(err.to_string(), "No matching nodes for xpath 'a/b'.");
    }
}
