//! Extended path expressions: an XPath whose final step names the node to
//! create (`@name` for an attribute) and whose final bracket groups may carry
//! `name = 'value'` clauses that are stamped onto created nodes.

use crate::error::PokeError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, recognize},
    sequence::{delimited, pair},
};

/// One equality clause of the final step, such as `@id = 'x'` or `name = "x"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPredicate {
    pub name: String,
    pub value: String,
    pub is_attribute: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPath {
    /// Everything before the final step. Empty means the document node.
    pub parent_path: String,
    pub target_name: String,
    pub is_attribute: bool,
    pub key_predicates: Vec<KeyPredicate>,
}

impl ExtendedPath {
    pub fn parse(path: &str) -> Result<ExtendedPath, PokeError> {
        let (parent_path, tail) = match top_level_positions(path, '/').last() {
            Some(&slash) => (path[..slash].trim(), &path[slash + 1..]),
            None => ("", path),
        };

        let target_end = tail.find('[').unwrap_or(tail.len());
        let target = tail[..target_end].trim();
        let (is_attribute, target_name) = match target.strip_prefix('@') {
            Some(name) => (true, name.trim()),
            None => (false, target),
        };
        if all_consuming(qname).parse(target_name).is_err() {
            return Err(PokeError::InvalidPath(path.to_string()));
        }

        let key_predicates = bracket_groups(&tail[target_end..])
            .into_iter()
            .flat_map(split_and_clauses)
            .filter_map(|clause| all_consuming(equality).parse(clause).ok().map(|(_, p)| p))
            .collect();

        Ok(ExtendedPath {
            parent_path: parent_path.to_string(),
            target_name: target_name.to_string(),
            is_attribute,
            key_predicates,
        })
    }
}

/// Joins two paths with exactly one `/` between them.
pub fn join_xpath(base: Option<&str>, path: &str) -> String {
    match base {
        Some(base) if !base.is_empty() => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ),
        _ => path.to_string(),
    }
}

/// The increasing prefixes of `path`, one per non-empty step:
/// `/a/b[c='/']` yields `/a` and `/a/b[c='/']`.
pub fn step_prefixes(path: &str) -> Vec<&str> {
    let mut prefixes = Vec::new();
    let mut segment_start = 0;
    for end in top_level_positions(path, '/').into_iter().chain([path.len()]) {
        if !path[segment_start..end].trim().is_empty() {
            prefixes.push(&path[..end]);
        }
        segment_start = end + 1;
    }
    prefixes
}

/// Byte offsets of `target` outside brackets, parentheses and quotes.
fn top_level_positions(s: &str, target: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, c) if c == target && depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

/// The contents of each top-level `[...]` group.
fn bracket_groups(s: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            (None, ']') if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    groups.push(&s[start..i]);
                }
            }
            _ => {}
        }
    }
    groups
}

/// Splits a predicate body on the `and` keyword outside quotes and brackets.
fn split_and_clauses(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let is_break = |b: u8| b.is_ascii_whitespace() || matches!(b, b'\'' | b'"' | b')');
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match (quote, b) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'\'' | b'"') => quote = Some(b),
            (None, b'[' | b'(') => depth += 1,
            (None, b']' | b')') => depth = depth.saturating_sub(1),
            (None, b'a')
                if depth == 0
                    && body[i..].starts_with("and")
                    && i > 0
                    && is_break(bytes[i - 1])
                    && bytes.get(i + 3).is_some_and(|&n| n.is_ascii_whitespace() || n == b'@' || n == b'(') =>
            {
                clauses.push(&body[start..i]);
                start = i + 3;
                i += 3;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    clauses.push(&body[start..]);
    clauses
}

// --- Clause grammar ---

fn ncname(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
    ))
    .parse(input)
}

/// `local` or `prefix:local`.
fn qname(input: &str) -> IResult<&str, &str> {
    recognize(pair(ncname, opt(pair(char(':'), ncname)))).parse(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
    ))
    .parse(input)
}

/// `[@]name = 'value'`, with free whitespace around every token.
fn equality(input: &str) -> IResult<&str, KeyPredicate> {
    map(
        (
            multispace0,
            opt(char('@')),
            delimited(multispace0, qname, multispace0),
            char('='),
            delimited(multispace0, quoted, multispace0),
        ),
        |(_, at, name, _, value)| KeyPredicate {
            name: name.to_string(),
            value: value.to_string(),
            is_attribute: at.is_some(),
        },
    )
    .parse(input)
}
