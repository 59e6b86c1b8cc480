//! [`Tree`] to XML text.
//!
//! Output is compact: nothing is indented or re-wrapped, empty elements are
//! self-closed and attributes keep their order and use double quotes.

use crate::tree::{NodeId, NodeKind, Tree};
use std::borrow::Cow;
use std::fmt;

/// Escapes text content.
pub fn escape_xml_text(s: &str) -> Cow<'_, str> {
    escape(s, false)
}

/// Escapes an attribute value for a double-quoted attribute.
pub fn escape_xml_attr(s: &str) -> Cow<'_, str> {
    escape(s, true)
}

/// Whitespace in attribute values is written as character references, or a
/// reader would normalize it to spaces. Text keeps its line ends as parsed.
fn escape(s: &str, quotes: bool) -> Cow<'_, str> {
    let needs_escape = |b: u8| {
        matches!(b, b'&' | b'<' | b'>') || (quotes && matches!(b, b'"' | b'\n' | b'\r' | b'\t'))
    };
    if !s.bytes().any(needs_escape) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            '\r' if quotes => out.push_str("&#13;"),
            '\n' if quotes => out.push_str("&#10;"),
            '\t' if quotes => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

impl Tree {
    /// Serializes the whole document.
    pub fn to_xml(&self) -> String {
        self.node_to_xml(self.root())
    }

    /// Serializes one node and everything below it.
    pub fn node_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        write_node(self, id, &mut out);
        out
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn write_node(tree: &Tree, id: NodeId, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Document => {
            for &child in tree.children(id) {
                write_node(tree, child, out);
            }
        }
        NodeKind::Element { name } => write_element(tree, id, name, out),
        NodeKind::Attribute { name, value } => {
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_xml_attr(value));
            out.push('"');
        }
        NodeKind::Text(text) => out.push_str(&escape_xml_text(text)),
        NodeKind::CData(text) => {
            // A `]]>` inside the payload closes one section and opens the next.
            out.push_str("<![CDATA[");
            out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
        NodeKind::Declaration(raw) | NodeKind::DocType(raw) => out.push_str(raw),
    }
}

fn write_element(tree: &Tree, id: NodeId, name: &str, out: &mut String) {
    out.push('<');
    out.push_str(name);
    for &attr in tree.attributes(id) {
        out.push(' ');
        write_node(tree, attr, out);
    }

    let children = tree.children(id);
    if children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for &child in children {
        write_node(tree, child, out);
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_markup() {
        let source = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE a>\n<a x=\"1\" y=\"&quot;q&quot;\">\n  <!-- c --><b>1 &lt; 2 &amp;&amp; 3 &gt; 2</b><![CDATA[<raw/>]]><?pi data?><empty/>\n</a>";
        let tree = Tree::parse(source).unwrap();
        assert_eq!(tree.to_xml(), source);
    }

    #[test]
    fn test_empty_elements_are_self_closed() {
        let tree = Tree::parse("<a xmlns=\"uri:yada\" b=\"\"></a>").unwrap();
        assert_eq!(tree.to_string(), "<a xmlns=\"uri:yada\" b=\"\"/>");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_xml_text("a\"b"), "a\"b");
        assert_eq!(escape_xml_attr("a\"b<"), "a&quot;b&lt;");
        assert!(matches!(escape_xml_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_attribute_whitespace_round_trips() {
        let source = "<add key=\"banner\" value=\"line1&#10;line2&#9;x&#13;\"/>";
        let tree = Tree::parse(source).unwrap();
        assert_eq!(tree.to_xml(), source);

        let reparsed = Tree::parse(&tree.to_xml()).unwrap();
        let add = reparsed.document_element().unwrap();
        assert_eq!(reparsed.attribute_value(add, "value"), Some("line1\nline2\tx\r"));
    }

    #[test]
    fn test_raw_attribute_whitespace_is_normalized() {
        let tree = Tree::parse("<a b=\"x\r\ny\tz\"/>").unwrap();
        assert_eq!(tree.to_xml(), "<a b=\"x y z\"/>");
    }

    #[test]
    fn test_text_keeps_crlf() {
        let source = "<a>\r\n  <b>1</b>\r\n</a>";
        assert_eq!(Tree::parse(source).unwrap().to_xml(), source);
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let mut tree = Tree::parse("<a/>").unwrap();
        let a = tree.document_element().unwrap();
        tree.append_cdata(a, "x]]>y").unwrap();
        let xml = tree.to_xml();
        assert_eq!(xml, "<a><![CDATA[x]]]]><![CDATA[>y]]></a>");
        let reparsed = Tree::parse(&xml).unwrap();
        let a = reparsed.document_element().unwrap();
        assert_eq!(reparsed.text_content(a), "x]]>y");
    }

    #[test]
    fn test_node_to_xml() {
        let tree = Tree::parse("<a><b c=\"d\">e</b></a>").unwrap();
        let a = tree.document_element().unwrap();
        let b = tree.children(a)[0];
        assert_eq!(tree.node_to_xml(b), "<b c=\"d\">e</b>");
    }
}
