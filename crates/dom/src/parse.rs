//! quick-xml events to [`Tree`].

use crate::error::DomError;
use crate::tree::{NodeId, NodeKind, Tree};
use std::borrow::Cow;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

impl Tree {
    /// Parses a complete document. Exactly one root element is required;
    /// whitespace, comments, processing instructions, the declaration and
    /// the doctype may surround it.
    pub fn parse(xml: &str) -> Result<Tree, DomError> {
        let tree = build(xml, false)?;
        if tree.document_element().is_none() {
            return Err(DomError::NoRootElement);
        }
        Ok(tree)
    }

    /// Parses a fragment that may have any number of top-level nodes,
    /// including loose text.
    pub fn parse_fragment(xml: &str) -> Result<Tree, DomError> {
        build(xml, true)
    }
}

fn parse_error(position: u64, message: impl ToString) -> DomError {
    DomError::Parse {
        position: position as usize,
        message: message.to_string(),
    }
}

fn utf8(bytes: &[u8], position: u64) -> Result<&str, DomError> {
    std::str::from_utf8(bytes).map_err(|e| parse_error(position, e))
}

fn build(xml: &str, fragment: bool) -> Result<Tree, DomError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut tree = Tree::new();
    let mut stack: Vec<NodeId> = vec![tree.root()];

    loop {
        let start = reader.buffer_position() as u64;
        let parent = stack.last().copied().unwrap_or(tree.root());
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let element = open_element(&mut tree, parent, e, fragment, start)?;
                stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                open_element(&mut tree, parent, e, fragment, start)?;
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(parse_error(start, "Unexpected closing tag"));
                }
                stack.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| parse_error(start, err))?;
                if text.is_empty() {
                    continue;
                }
                if !fragment && stack.len() == 1 && !text.trim().is_empty() {
                    return Err(parse_error(start, "Text is not allowed outside the root element"));
                }
                tree.push_child(parent, NodeKind::Text(text.into_owned()));
            }
            Ok(Event::CData(ref e)) => {
                let text = utf8(e.as_ref(), start)?.to_string();
                tree.push_child(parent, NodeKind::CData(text));
            }
            Ok(Event::Comment(_)) | Ok(Event::PI(_)) | Ok(Event::Decl(_)) | Ok(Event::DocType(_)) => {
                // Markup is kept verbatim from the source.
                let end = reader.buffer_position() as usize;
                let raw = &xml[markup_start(xml, start as usize)..end];
                tree.push_child(parent, markup_kind(raw));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(reader.error_position() as u64, e)),
        }
    }

    if stack.len() > 1 {
        let unclosed: Vec<&str> = stack[1..].iter().filter_map(|&id| tree.name(id)).collect();
        return Err(DomError::Unclosed(unclosed.join(">, <")));
    }
    log::trace!(
        "Parsed {} ({} bytes)",
        if fragment { "fragment" } else { "document" },
        xml.len()
    );
    Ok(tree)
}

fn open_element(
    tree: &mut Tree,
    parent: NodeId,
    e: &BytesStart,
    fragment: bool,
    position: u64,
) -> Result<NodeId, DomError> {
    let name = utf8(e.name().as_ref(), position)?.to_string();
    if !fragment && parent == tree.root() && tree.document_element().is_some() {
        return Err(DomError::MultipleRoots(name));
    }
    let element = tree.push_child(parent, NodeKind::Element { name });
    for attr in e.attributes() {
        let attr = attr.map_err(|err| parse_error(position, err))?;
        let name = utf8(attr.key.as_ref(), position)?.to_string();
        let raw = utf8(&attr.value, position)?;
        let value = unescape(&normalize_attribute(raw))
            .map_err(|err| parse_error(position, err))?
            .into_owned();
        tree.push_child(element, NodeKind::Attribute { name, value });
    }
    Ok(element)
}

/// Literal line ends and tabs in an attribute value read as single spaces.
/// Character references are expanded afterwards, so `&#10;` survives.
fn normalize_attribute(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\t', '\n', '\r']) {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace("\r\n", " ").replace(['\t', '\n', '\r'], " "))
}

/// The offset of the `<` opening the markup read from `position`, which may
/// already sit past it when the previous event was text.
fn markup_start(xml: &str, position: usize) -> usize {
    if xml[position..].starts_with('<') {
        position
    } else {
        xml[..position].rfind('<').unwrap_or(position)
    }
}

/// Classifies the raw text of a comment, processing instruction,
/// declaration or doctype.
fn markup_kind(raw: &str) -> NodeKind {
    if let Some(body) = raw.strip_prefix("<!--").and_then(|r| r.strip_suffix("-->")) {
        return NodeKind::Comment(body.to_string());
    }
    if let Some(body) = raw.strip_prefix("<?").and_then(|r| r.strip_suffix("?>")) {
        let (target, data) = body
            .split_once(char::is_whitespace)
            .map(|(t, d)| (t, d.trim_start()))
            .unwrap_or((body, ""));
        if target == "xml" {
            return NodeKind::Declaration(raw.to_string());
        }
        return NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        };
    }
    NodeKind::DocType(raw.to_string())
}
