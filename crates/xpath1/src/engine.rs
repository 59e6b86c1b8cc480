//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{Axis, Expression, LocationPath, NodeTest, NodeTypeTest, Step, UnaryOperator};
use super::{axes, functions, operators};
use crate::datasource::{DataSourceNode, NodeType, QName, XML_NAMESPACE};
use crate::error::XPathError;
use crate::parser::parse_expression;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

/// Prefix to namespace URI bindings available to name tests.
pub type Namespaces = HashMap<String, String>;

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => {
                let s = nodes.first().map(|n| n.string_value()).unwrap_or_default();
                string_to_number(&s)
            }
        }
    }
}

/// XPath only accepts plain decimal literals; `inf`, `1e3` and friends are NaN.
pub(crate) fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    let digits = t.strip_prefix('-').unwrap_or(t);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits != ".";
    if valid {
        t.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Formats a number the way XPath's `string()` does.
pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A container for all state needed during expression evaluation.
/// `'a` is the lifetime of the underlying data source.
/// `'d` is the lifetime of the evaluation context itself.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    pub namespaces: Option<&'d Namespaces>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    pub fn new(
        context_node: N,
        root_node: N,
        context_position: usize,
        context_size: usize,
        namespaces: Option<&'d Namespaces>,
    ) -> Self {
        Self {
            context_node,
            root_node,
            context_position,
            context_size,
            namespaces,
            _marker: PhantomData,
        }
    }

    fn with_focus(&self, node: N, position: usize, size: usize) -> Self {
        Self::new(node, self.root_node, position, size, self.namespaces)
    }

    /// Resolves a prefix used in a name test. `xml` is always bound.
    fn resolve_prefix(&self, prefix: &str) -> Result<&'d str, XPathError> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE);
        }
        self.namespaces
            .and_then(|ns| ns.get(prefix))
            .map(String::as_str)
            .ok_or_else(|| XPathError::UnknownPrefix(prefix.to_string()))
    }
}

/// Parses `expression` and evaluates it with `context_node` as the focus,
/// returning the selected nodes.
pub fn select<'a, N>(
    expression: &str,
    context_node: N,
    namespaces: Option<&Namespaces>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let expr = parse_expression(expression)?;
    let mut root_node = context_node;
    while let Some(parent) = root_node.parent() {
        root_node = parent;
    }
    let e_ctx = EvaluationContext::new(context_node, root_node, 1, 1, namespaces);
    log::trace!("Selecting '{}'", expression);
    match evaluate(&expr, &e_ctx)? {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        _ => Err(XPathError::NotANodeSet(expression.to_string())),
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            // `and`/`or` only look at the right operand when they have to.
            match op {
                super::ast::BinaryOperator::And if !left_val.to_bool() => {
                    return Ok(XPathValue::Boolean(false));
                }
                super::ast::BinaryOperator::Or if left_val.to_bool() => {
                    return Ok(XPathValue::Boolean(true));
                }
                _ => {}
            }
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let initial_context = if let Some(start_expr) = &path.start_point {
        match evaluate(start_expr, e_ctx)? {
            XPathValue::NodeSet(nodes) => nodes,
            _ => {
                return Err(XPathError::TypeError(
                    "a path can only continue from a node-set".to_string(),
                ));
            }
        }
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    let mut current_nodes = initial_context;
    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Evaluates a single step in a location path by chaining axis collection,
/// node testing, and predicate application, once per context node.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut results = Vec::new();
    let mut seen = HashSet::new();
    for &node in context_nodes {
        let axis_nodes = collect_axis_nodes(step.axis, &[node]);
        let mut tested_nodes =
            filter_by_node_test(&axis_nodes, &step.node_test, step.axis, e_ctx)?;
        // Predicates see proximity positions: nearest node first on reverse axes.
        if is_reverse_axis(step.axis) {
            tested_nodes.sort();
            tested_nodes.reverse();
        }
        for n in apply_predicates(&tested_nodes, &step.predicates, e_ctx)? {
            if seen.insert(n) {
                results.push(n);
            }
        }
    }
    results.sort();
    Ok(results)
}

fn is_reverse_axis(axis: Axis) -> bool {
    matches!(
        axis,
        Axis::Ancestor | Axis::AncestorOrSelf | Axis::PrecedingSibling | Axis::Preceding
    )
}

/// Stage 1: Collects all unique nodes from the context set along a given axis.
fn collect_axis_nodes<'a, N>(axis: Axis, context_nodes: &[N]) -> Vec<N>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut result_nodes = Vec::new();
    let mut seen = HashSet::new();

    for &node in context_nodes {
        match axis {
            Axis::Child => axes::collect_child_nodes(node, &mut seen, &mut result_nodes),
            Axis::Attribute => axes::collect_attribute_nodes(node, &mut seen, &mut result_nodes),
            Axis::Descendant => axes::collect_descendant_nodes(node, &mut seen, &mut result_nodes),
            Axis::DescendantOrSelf => {
                axes::collect_descendant_or_self_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::Parent => axes::collect_parent_nodes(node, &mut seen, &mut result_nodes),
            Axis::Ancestor => axes::collect_ancestor_nodes(node, &mut seen, &mut result_nodes),
            Axis::AncestorOrSelf => {
                axes::collect_ancestor_or_self_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::SelfAxis => axes::collect_self_nodes(node, &mut seen, &mut result_nodes),
            Axis::FollowingSibling => {
                axes::collect_following_sibling_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::PrecedingSibling => {
                axes::collect_preceding_sibling_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::Following => axes::collect_following_nodes(node, &mut seen, &mut result_nodes),
            Axis::Preceding => axes::collect_preceding_nodes(node, &mut seen, &mut result_nodes),
        }
    }
    result_nodes
}

/// Stage 2: Filters a set of nodes based on a `NodeTest`.
///
/// Name tests only match the principal node type of the axis. An unprefixed
/// name matches nodes in no namespace; a prefixed name matches nodes whose
/// namespace URI is the one the prefix is bound to.
fn filter_by_node_test<'a, N>(
    nodes: &[N],
    test: &NodeTest,
    axis: Axis,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let principal = if axis == Axis::Attribute {
        NodeType::Attribute
    } else {
        NodeType::Element
    };

    let matched = match test {
        NodeTest::Wildcard => nodes
            .iter()
            .filter(|n| n.node_type() == principal)
            .copied()
            .collect(),
        NodeTest::PrefixWildcard(prefix) => {
            let uri = e_ctx.resolve_prefix(prefix)?;
            nodes
                .iter()
                .filter(|n| n.node_type() == principal && n.namespace_uri() == Some(uri))
                .copied()
                .collect()
        }
        NodeTest::Name(name) => {
            let wanted = QName::parse(name);
            let uri = match wanted.prefix {
                Some(prefix) => Some(e_ctx.resolve_prefix(prefix)?),
                None => None,
            };
            nodes
                .iter()
                .filter(|n| {
                    n.node_type() == principal
                        && n.name()
                            .is_some_and(|q| q.local_part == wanted.local_part)
                        && n.namespace_uri() == uri
                })
                .copied()
                .collect()
        }
        NodeTest::NodeType(ntt) => nodes
            .iter()
            .filter(|n| match ntt {
                NodeTypeTest::Text => n.node_type() == NodeType::Text,
                NodeTypeTest::Comment => n.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction => {
                    n.node_type() == NodeType::ProcessingInstruction
                }
                NodeTypeTest::Node => true,
            })
            .copied()
            .collect(),
    };
    Ok(matched)
}

/// Stage 3: Filters a set of nodes by applying a series of predicates.
fn apply_predicates<'a, N>(
    nodes: &[N],
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut final_nodes = nodes.to_vec();
    for predicate in predicates {
        let mut predicate_results = Vec::new();
        let context_size = final_nodes.len();
        for (i, node) in final_nodes.iter().enumerate() {
            let predicate_e_ctx = e_ctx.with_focus(*node, i + 1, context_size);
            let result = evaluate(predicate, &predicate_e_ctx)?;
            let keep = match result {
                XPathValue::Number(n) => n == (i + 1) as f64,
                _ => result.to_bool(),
            };
            if keep {
                predicate_results.push(*node);
            }
        }
        final_nodes = predicate_results;
    }
    Ok(final_nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, MockTree, create_test_tree};

    fn ids(nodes: &[MockNode]) -> Vec<usize> {
        nodes.iter().map(|n| n.id).collect()
    }

    fn select_ids(tree: &MockTree, expr: &str, namespaces: Option<&Namespaces>) -> Vec<usize> {
        let root = MockNode { id: 0, tree };
        ids(&select(expr, root, namespaces).unwrap())
    }

    fn cfg_namespaces() -> Namespaces {
        let mut ns = Namespaces::new();
        ns.insert("c".to_string(), "urn:cfg".to_string());
        ns
    }

    #[test]
    fn test_pipeline_functions_individually() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        let config = MockNode { id: 1, tree: &tree };
        let setting = MockNode { id: 2, tree: &tree };
        let text = MockNode { id: 4, tree: &tree };
        let e_ctx = EvaluationContext::new(root, root, 1, 1, None);

        let children = collect_axis_nodes(Axis::Child, &[config]);
        assert_eq!(children.len(), 5);
        let attributes = collect_axis_nodes(Axis::Attribute, &[setting]);
        assert_eq!(ids(&attributes), vec![3]);
        let ancestors = collect_axis_nodes(Axis::Ancestor, &[text]);
        assert_eq!(ancestors, vec![setting, config, root]);

        let all_nodes = vec![root, config, setting, text];
        let elements =
            filter_by_node_test(&all_nodes, &NodeTest::Wildcard, Axis::Child, &e_ctx).unwrap();
        assert_eq!(elements, vec![config, setting]);
        let text_nodes = filter_by_node_test(
            &all_nodes,
            &NodeTest::NodeType(NodeTypeTest::Text),
            Axis::Child,
            &e_ctx,
        )
        .unwrap();
        assert_eq!(text_nodes, vec![text]);

        let predicates = vec![parse_expression("position()=2").unwrap()];
        let filtered = apply_predicates(&all_nodes, &predicates, &e_ctx).unwrap();
        assert_eq!(filtered, vec![config]);
    }

    #[test]
    fn test_predicate_by_attribute() {
        let tree = create_test_tree();
        assert_eq!(select_ids(&tree, "config/entry[@key='b']", None), vec![10]);
    }

    #[test]
    fn test_predicate_by_position() {
        let tree = create_test_tree();
        assert_eq!(select_ids(&tree, "/config/entry[1]", None), vec![6]);
        assert_eq!(select_ids(&tree, "/config/entry[last()]", None), vec![10]);
    }

    #[test]
    fn test_unprefixed_name_does_not_match_namespaced_element() {
        let tree = create_test_tree();
        assert!(select_ids(&tree, "config/setting", None).is_empty());
    }

    #[test]
    fn test_prefixed_name_resolves_through_namespaces() {
        let tree = create_test_tree();
        let ns = cfg_namespaces();
        assert_eq!(select_ids(&tree, "config/c:setting", Some(&ns)), vec![2]);
        assert_eq!(select_ids(&tree, "config/c:*", Some(&ns)), vec![2]);
        assert_eq!(select_ids(&tree, "//c:setting/@name", Some(&ns)), vec![3]);
    }

    #[test]
    fn test_unknown_prefix_is_an_error() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        let err = select("config/x:setting", root, None).unwrap_err();
        assert_eq!(err, XPathError::UnknownPrefix("x".to_string()));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let tree = create_test_tree();
        assert_eq!(select_ids(&tree, "//entry", None), vec![6, 10]);
        assert_eq!(select_ids(&tree, "//entry/text()", None), vec![8, 12]);
    }

    #[test]
    fn test_relative_to_context_and_parent_step() {
        let tree = create_test_tree();
        let entry = MockNode { id: 6, tree: &tree };
        assert_eq!(ids(&select("..", entry, None).unwrap()), vec![1]);
        assert_eq!(ids(&select(".", entry, None).unwrap()), vec![6]);
        assert_eq!(ids(&select("@key", entry, None).unwrap()), vec![7]);
        assert_eq!(ids(&select("/config", entry, None).unwrap()), vec![1]);
    }

    #[test]
    fn test_reverse_axis_results_in_document_order() {
        let tree = create_test_tree();
        let text = MockNode { id: 12, tree: &tree };
        assert_eq!(
            ids(&select("ancestor::node()", text, None).unwrap()),
            vec![0, 1, 10]
        );
        assert_eq!(
            ids(&select("ancestor::*[1]", text, None).unwrap()),
            vec![10]
        );
    }

    #[test]
    fn test_union_and_comment_pi() {
        let tree = create_test_tree();
        assert_eq!(
            select_ids(&tree, "config/comment() | config/processing-instruction()", None),
            vec![5, 9]
        );
    }

    #[test]
    fn test_select_rejects_non_node_set() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        let err = select("count(//entry)", root, None).unwrap_err();
        assert!(matches!(err, XPathError::NotANodeSet(_)));
    }

    #[test]
    fn test_short_circuit_skips_unknown_prefix() {
        let tree = create_test_tree();
        assert_eq!(
            select_ids(&tree, "config/entry[false() and x:y]", None),
            Vec::<usize>::new()
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(5.0), "5");
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert!(string_to_number("inf").is_nan());
        assert_eq!(string_to_number(" 42 "), 42.0);
    }
}
