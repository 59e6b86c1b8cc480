//! Binary operator semantics for XPath 1.0, including the existential
//! comparison rules for node-sets.

use super::ast::BinaryOperator;
use super::engine::{XPathValue, string_to_number};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;

pub fn evaluate<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    match op {
        BinaryOperator::Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        BinaryOperator::And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        BinaryOperator::Equals
        | BinaryOperator::NotEquals
        | BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => Ok(XPathValue::Boolean(compare(op, &left, &right))),
        BinaryOperator::Plus => Ok(XPathValue::Number(left.to_number() + right.to_number())),
        BinaryOperator::Minus => Ok(XPathValue::Number(left.to_number() - right.to_number())),
        BinaryOperator::Multiply => Ok(XPathValue::Number(left.to_number() * right.to_number())),
        BinaryOperator::Divide => Ok(XPathValue::Number(left.to_number() / right.to_number())),
        BinaryOperator::Modulo => Ok(XPathValue::Number(left.to_number() % right.to_number())),
        BinaryOperator::Union => match (left, right) {
            (XPathValue::NodeSet(mut l), XPathValue::NodeSet(r)) => {
                l.extend(r);
                l.sort();
                l.dedup();
                Ok(XPathValue::NodeSet(l))
            }
            _ => Err(XPathError::TypeError(
                "The '|' operator requires node-set operands".to_string(),
            )),
        },
    }
}

/// An operand reduced to the atoms it contributes to a comparison.
enum Atom {
    Str(String),
    Num(f64),
    Bool(bool),
}

fn atoms<'a, N: DataSourceNode<'a>>(value: &XPathValue<N>) -> Vec<Atom> {
    match value {
        XPathValue::NodeSet(nodes) => nodes.iter().map(|n| Atom::Str(n.string_value())).collect(),
        XPathValue::String(s) => vec![Atom::Str(s.clone())],
        XPathValue::Number(n) => vec![Atom::Num(*n)],
        XPathValue::Boolean(b) => vec![Atom::Bool(*b)],
    }
}

fn compare<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    // A boolean on either side compares against the other operand as a whole.
    match (left, right) {
        (XPathValue::Boolean(b), other) => {
            return compare_atoms(op, &Atom::Bool(*b), &Atom::Bool(other.to_bool()));
        }
        (other, XPathValue::Boolean(b)) => {
            return compare_atoms(op, &Atom::Bool(other.to_bool()), &Atom::Bool(*b));
        }
        _ => {}
    }
    let left_atoms = atoms(left);
    let right_atoms = atoms(right);
    left_atoms
        .iter()
        .any(|l| right_atoms.iter().any(|r| compare_atoms(op, l, r)))
}

fn atom_number(atom: &Atom) -> f64 {
    match atom {
        Atom::Str(s) => string_to_number(s),
        Atom::Num(n) => *n,
        Atom::Bool(b) => f64::from(u8::from(*b)),
    }
}

fn compare_atoms(op: BinaryOperator, left: &Atom, right: &Atom) -> bool {
    match op {
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let equal = match (left, right) {
                (Atom::Bool(a), Atom::Bool(b)) => a == b,
                (Atom::Num(_), _) | (_, Atom::Num(_)) => atom_number(left) == atom_number(right),
                (Atom::Str(a), Atom::Str(b)) => a == b,
                // Booleans are paired with booleans by the caller.
                _ => atom_number(left) == atom_number(right),
            };
            if op == BinaryOperator::Equals {
                equal
            } else {
                !equal
            }
        }
        _ => {
            let (l, r) = (atom_number(left), atom_number(right));
            match op {
                BinaryOperator::LessThan => l < r,
                BinaryOperator::LessThanOrEqual => l <= r,
                BinaryOperator::GreaterThan => l > r,
                BinaryOperator::GreaterThanOrEqual => l >= r,
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, create_test_tree};

    #[test]
    fn test_arithmetic() {
        let r: XPathValue<MockNode> = evaluate(
            BinaryOperator::Modulo,
            XPathValue::Number(7.0),
            XPathValue::Number(3.0),
        )
        .unwrap();
        assert_eq!(r.to_number(), 1.0);
        let r: XPathValue<MockNode> = evaluate(
            BinaryOperator::Divide,
            XPathValue::String("9".into()),
            XPathValue::Number(2.0),
        )
        .unwrap();
        assert_eq!(r.to_number(), 4.5);
    }

    #[test]
    fn test_node_set_comparison_is_existential() {
        let tree = create_test_tree();
        let keys = vec![MockNode { id: 7, tree: &tree }, MockNode { id: 11, tree: &tree }];
        let eq = evaluate(
            BinaryOperator::Equals,
            XPathValue::NodeSet(keys.clone()),
            XPathValue::String("b".into()),
        )
        .unwrap();
        assert!(eq.to_bool());
        // Both `=` and `!=` can hold at once for a node-set.
        let ne = evaluate(
            BinaryOperator::NotEquals,
            XPathValue::NodeSet(keys),
            XPathValue::String("b".into()),
        )
        .unwrap();
        assert!(ne.to_bool());
    }

    #[test]
    fn test_empty_node_set_compares_false() {
        let eq: XPathValue<MockNode> = evaluate(
            BinaryOperator::Equals,
            XPathValue::NodeSet(vec![]),
            XPathValue::String("".into()),
        )
        .unwrap();
        assert!(!eq.to_bool());
        let eq_bool: XPathValue<MockNode> = evaluate(
            BinaryOperator::Equals,
            XPathValue::NodeSet(vec![]),
            XPathValue::Boolean(false),
        )
        .unwrap();
        assert!(eq_bool.to_bool());
    }

    #[test]
    fn test_union_requires_node_sets() {
        let err = evaluate::<MockNode>(
            BinaryOperator::Union,
            XPathValue::Number(1.0),
            XPathValue::NodeSet(vec![]),
        )
        .unwrap_err();
        assert!(matches!(err, XPathError::TypeError(_)));
    }
}
