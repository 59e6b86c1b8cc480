//! Pure functions collecting nodes along each XPath axis, in document order
//! for forward axes and reverse document order for reverse axes.

use crate::datasource::DataSourceNode;
use std::collections::HashSet;

fn add_node<'a, N: DataSourceNode<'a>>(node: N, seen: &mut HashSet<N>, results: &mut Vec<N>) {
    if seen.insert(node) {
        results.push(node);
    }
}

pub fn collect_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    add_node(node, seen, results);
}

pub fn collect_child_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    for child in node.children() {
        add_node(child, seen, results);
    }
}

pub fn collect_attribute_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    for attr in node.attributes() {
        add_node(attr, seen, results);
    }
}

/// Pre-order walk, so results come out in document order.
pub fn collect_descendant_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        add_node(current, seen, results);
        let mut children: Vec<N> = current.children().collect();
        children.reverse();
        stack.extend(children);
    }
}

pub fn collect_descendant_or_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    add_node(node, seen, results);
    collect_descendant_nodes(node, seen, results);
}

pub fn collect_parent_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    if let Some(parent) = node.parent() {
        add_node(parent, seen, results);
    }
}

pub fn collect_ancestor_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut current = node.parent();
    while let Some(p) = current {
        add_node(p, seen, results);
        current = p.parent();
    }
}

pub fn collect_ancestor_or_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    add_node(node, seen, results);
    collect_ancestor_nodes(node, seen, results);
}

pub fn collect_following_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    if let Some(parent) = node.parent() {
        for sibling in parent.children().skip_while(|s| *s != node).skip(1) {
            add_node(sibling, seen, results);
        }
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    if let Some(parent) = node.parent() {
        let siblings: Vec<N> = parent.children().take_while(|s| *s != node).collect();
        for sibling in siblings.into_iter().rev() {
            add_node(sibling, seen, results);
        }
    }
}

pub fn collect_following_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut current = Some(node);
    while let Some(c) = current {
        let parent = c.parent();
        if let Some(p) = parent {
            for sibling in p.children().skip_while(|s| *s != c).skip(1) {
                collect_descendant_or_self_nodes(sibling, seen, results);
            }
        }
        current = parent;
    }
}

pub fn collect_preceding_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut current = Some(node);
    while let Some(c) = current {
        let parent = c.parent();
        if let Some(p) = parent {
            for sibling in p.children().take_while(|s| *s != c) {
                collect_descendant_or_self_nodes(sibling, seen, results);
            }
        }
        current = parent;
    }
}
