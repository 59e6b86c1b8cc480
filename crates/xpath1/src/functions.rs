//! Built-in implementations of the XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, string_to_number};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;

type FnResult<N> = Result<XPathValue<N>, XPathError>;

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> FnResult<N> {
    match name {
        // Node-set
        "count" => func_count(name, args),
        "position" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Number(e_ctx.context_position as f64))
        }
        "last" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Number(e_ctx.context_size as f64))
        }
        "local-name" => {
            let node = optional_node(name, args, e_ctx)?;
            Ok(XPathValue::String(
                node.and_then(|n| n.name())
                    .map(|q| q.local_part.to_string())
                    .unwrap_or_default(),
            ))
        }
        "name" => {
            let node = optional_node(name, args, e_ctx)?;
            Ok(XPathValue::String(
                node.and_then(|n| n.name())
                    .map(|q| match q.prefix {
                        Some(prefix) => format!("{}:{}", prefix, q.local_part),
                        None => q.local_part.to_string(),
                    })
                    .unwrap_or_default(),
            ))
        }
        "namespace-uri" => {
            let node = optional_node(name, args, e_ctx)?;
            Ok(XPathValue::String(
                node.and_then(|n| n.namespace_uri())
                    .unwrap_or_default()
                    .to_string(),
            ))
        }

        // String
        "string" => {
            let s = optional_string(name, args, e_ctx)?;
            Ok(XPathValue::String(s))
        }
        "concat" => {
            arity(name, &args, 2, usize::MAX)?;
            Ok(XPathValue::String(
                args.iter().map(|v| v.to_string()).collect(),
            ))
        }
        "starts-with" => {
            let (s1, s2) = two_strings(name, args)?;
            Ok(XPathValue::Boolean(s1.starts_with(&s2)))
        }
        "contains" => {
            let (s1, s2) = two_strings(name, args)?;
            Ok(XPathValue::Boolean(s1.contains(&s2)))
        }
        "substring-before" => {
            let (s1, s2) = two_strings(name, args)?;
            let before = s1.find(&s2).map(|i| &s1[..i]).unwrap_or_default();
            Ok(XPathValue::String(before.to_string()))
        }
        "substring-after" => {
            let (s1, s2) = two_strings(name, args)?;
            let after = s1.find(&s2).map(|i| &s1[i + s2.len()..]).unwrap_or_default();
            Ok(XPathValue::String(after.to_string()))
        }
        "substring" => func_substring(name, args),
        "string-length" => {
            let s = optional_string(name, args, e_ctx)?;
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            let s = optional_string(name, args, e_ctx)?;
            Ok(XPathValue::String(
                s.split_whitespace().collect::<Vec<_>>().join(" "),
            ))
        }
        "translate" => func_translate(name, args),

        // Boolean
        "boolean" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Boolean(args[0].to_bool()))
        }
        "not" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Boolean(!args[0].to_bool()))
        }
        "true" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Boolean(true))
        }
        "false" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Boolean(false))
        }
        "lang" => func_lang(name, args, e_ctx),

        // Number
        "number" => {
            arity(name, &args, 0, 1)?;
            let n = match args.first() {
                Some(v) => v.to_number(),
                None => string_to_number(&e_ctx.context_node.string_value()),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => func_sum(name, args),
        "floor" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Number(args[0].to_number().floor()))
        }
        "ceiling" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Number(args[0].to_number().ceil()))
        }
        "round" => {
            arity(name, &args, 1, 1)?;
            let n = args[0].to_number();
            if n.is_nan() || n.is_infinite() || n == 0.0 {
                return Ok(XPathValue::Number(n));
            }
            // Halves round towards positive infinity.
            Ok(XPathValue::Number((n + 0.5).floor()))
        }

        _ => Err(XPathError::FunctionError {
            function: name.to_string(),
            message: "Unknown XPath function".to_string(),
        }),
    }
}

fn arity<N>(name: &str, args: &[XPathValue<N>], min: usize, max: usize) -> Result<(), XPathError> {
    if args.len() < min || args.len() > max {
        let expected = match (min, max) {
            (a, b) if a == b => format!("{}", a),
            (a, usize::MAX) => format!("at least {}", a),
            (a, b) => format!("{} to {}", a, b),
        };
        return Err(XPathError::FunctionError {
            function: format!("{}()", name),
            message: format!("Expected {} arguments, got {}", expected, args.len()),
        });
    }
    Ok(())
}

fn node_set<N: std::fmt::Debug>(name: &str, value: XPathValue<N>) -> Result<Vec<N>, XPathError> {
    match value {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        v => Err(XPathError::TypeError(format!(
            "{}() argument must be a node-set, got {:?}",
            name, v
        ))),
    }
}

/// The single optional node-set argument, defaulting to the context node.
fn optional_node<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Option<N>, XPathError> {
    arity(name, &args, 0, 1)?;
    match args.pop() {
        None => Ok(Some(e_ctx.context_node)),
        Some(v) => Ok(node_set(name, v)?.first().copied()),
    }
}

/// The single optional string argument, defaulting to the context node's value.
fn optional_string<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<String, XPathError> {
    arity(name, &args, 0, 1)?;
    Ok(match args.pop() {
        None => e_ctx.context_node.string_value(),
        Some(v) => v.to_string(),
    })
}

fn two_strings<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
) -> Result<(String, String), XPathError> {
    arity(name, &args, 2, 2)?;
    let second = args.remove(1).to_string();
    let first = args.remove(0).to_string();
    Ok((first, second))
}

fn func_count<'a, N: DataSourceNode<'a>>(name: &str, mut args: Vec<XPathValue<N>>) -> FnResult<N> {
    arity(name, &args, 1, 1)?;
    let nodes = node_set(name, args.remove(0))?;
    Ok(XPathValue::Number(nodes.len() as f64))
}

fn func_sum<'a, N: DataSourceNode<'a>>(name: &str, mut args: Vec<XPathValue<N>>) -> FnResult<N> {
    arity(name, &args, 1, 1)?;
    let sum = node_set(name, args.remove(0))?
        .iter()
        .map(|node| string_to_number(&node.string_value()))
        .sum();
    Ok(XPathValue::Number(sum))
}

fn func_substring<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
) -> FnResult<N> {
    arity(name, &args, 2, 3)?;
    let length = if args.len() == 3 {
        Some(args.remove(2).to_number())
    } else {
        None
    };
    let start = args.remove(1).to_number();
    let s = args.remove(0).to_string();

    // Positions are 1-based and both bounds are rounded.
    let first = (start + 0.5).floor();
    let last = length.map_or(f64::INFINITY, |l| first + (l + 0.5).floor());

    let result = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = (i + 1) as f64;
            pos >= first && pos < last
        })
        .map(|(_, c)| c)
        .collect();
    Ok(XPathValue::String(result))
}

fn func_translate<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
) -> FnResult<N> {
    arity(name, &args, 3, 3)?;
    let to: Vec<char> = args.remove(2).to_string().chars().collect();
    let from: Vec<char> = args.remove(1).to_string().chars().collect();
    let source = args.remove(0).to_string();
    let result = source
        .chars()
        .filter_map(|c| match from.iter().position(|&f| f == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect();
    Ok(XPathValue::String(result))
}

fn func_lang<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> FnResult<N> {
    arity(name, &args, 1, 1)?;
    let wanted = args.remove(0).to_string().to_lowercase();
    let mut current = Some(e_ctx.context_node);
    if current.is_some_and(|n| n.node_type() != NodeType::Element) {
        current = current.and_then(|n| n.parent());
    }

    while let Some(node) = current {
        let lang = node.attributes().find(|attr| {
            attr.name()
                .is_some_and(|q| q.prefix == Some("xml") && q.local_part == "lang")
        });
        if let Some(attr) = lang {
            let lang = attr.string_value().to_lowercase();
            let matches = lang == wanted || lang.starts_with(&format!("{}-", wanted));
            return Ok(XPathValue::Boolean(matches));
        }
        current = node.parent();
    }
    Ok(XPathValue::Boolean(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, MockTree, create_test_tree};
    use crate::engine::evaluate;
    use crate::parser::parse_expression;

    fn eval_at<'a>(tree: &'a MockTree<'a>, node: usize, expr: &str) -> XPathValue<MockNode<'a>> {
        let root = MockNode { id: 0, tree };
        let context = MockNode { id: node, tree };
        let e_ctx = EvaluationContext::new(context, root, 1, 1, None);
        evaluate(&parse_expression(expr).unwrap(), &e_ctx).unwrap()
    }

    fn eval_string(expr: &str) -> String {
        let tree = create_test_tree();
        eval_at(&tree, 0, expr).to_string()
    }

    #[test]
    fn test_node_set_functions() {
        let tree = create_test_tree();
        assert_eq!(eval_at(&tree, 0, "count(//entry)").to_number(), 2.0);
        assert_eq!(eval_at(&tree, 2, "local-name()").to_string(), "setting");
        assert_eq!(eval_at(&tree, 2, "name()").to_string(), "c:setting");
        assert_eq!(eval_at(&tree, 2, "namespace-uri()").to_string(), "urn:cfg");
        assert_eq!(eval_at(&tree, 0, "name(//entry)").to_string(), "entry");
        assert_eq!(eval_at(&tree, 0, "name(//missing)").to_string(), "");
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(eval_string("concat('a', 'b', 'c')"), "abc");
        assert_eq!(eval_string("starts-with('hello', 'he')"), "true");
        assert_eq!(eval_string("contains('hello', 'z')"), "false");
        assert_eq!(eval_string("substring-before('1999/04/01', '/')"), "1999");
        assert_eq!(eval_string("substring-after('1999/04/01', '/')"), "04/01");
        assert_eq!(eval_string("substring('12345', 2, 3)"), "234");
        assert_eq!(eval_string("substring('12345', 1.5, 2.6)"), "234");
        assert_eq!(eval_string("string-length('hello')"), "5");
        assert_eq!(eval_string("normalize-space('  a   b  ')"), "a b");
        assert_eq!(eval_string("translate('bar', 'abc', 'ABC')"), "BAr");
        assert_eq!(eval_string("translate('--aaa--', 'abc-', 'ABC')"), "AAA");
    }

    #[test]
    fn test_string_value_of_context() {
        let tree = create_test_tree();
        assert_eq!(eval_at(&tree, 6, "string()").to_string(), "alpha");
        assert_eq!(eval_at(&tree, 6, "string-length()").to_number(), 5.0);
    }

    #[test]
    fn test_boolean_and_number_functions() {
        assert_eq!(eval_string("not(false())"), "true");
        assert_eq!(eval_string("boolean('')"), "false");
        assert_eq!(eval_string("number('12')"), "12");
        assert_eq!(eval_string("number('abc')"), "NaN");
        assert_eq!(eval_string("floor(2.7)"), "2");
        assert_eq!(eval_string("ceiling(2.1)"), "3");
        assert_eq!(eval_string("round(2.5)"), "3");
        assert_eq!(eval_string("round(-2.5)"), "-2");
        assert_eq!(eval_string("sum(//entry/@key)"), "NaN");
    }

    #[test]
    fn test_arity_errors() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        let e_ctx = EvaluationContext::new(root, root, 1, 1, None);
        let err = evaluate(&parse_expression("count()").unwrap(), &e_ctx).unwrap_err();
        assert!(matches!(err, XPathError::FunctionError { .. }));
        let err = evaluate(&parse_expression("frobnicate()").unwrap(), &e_ctx).unwrap_err();
        assert_eq!(
            err,
            XPathError::FunctionError {
                function: "frobnicate".to_string(),
                message: "Unknown XPath function".to_string()
            }
        );
    }
}
