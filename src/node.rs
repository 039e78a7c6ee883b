//! The node tree and its walk into shared template source.

use serde_json::Value;

use crate::attribute::{Attribute, Attributes};
use crate::source::{SourceBuilder, Values};

/// One chunk of a text node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Chunk {
    /// Static text, escaped when the template source is built.
    Literal(String),
    /// A dynamic value routed through a placeholder and escaped at execution
    /// time.
    Bound {
        /// The single-input fragment rendering the value; `{{.}}` by default.
        fragment: String,
        /// The bound value.
        value: Value,
    },
}

impl Chunk {
    /// Create a static chunk.
    pub fn literal(text: impl Into<String>) -> Self {
        Chunk::Literal(text.into())
    }

    /// Create a dynamic chunk substituting the whole value.
    pub fn value(value: impl Into<Value>) -> Self {
        Chunk::Bound {
            fragment: Attribute::DEFAULT_FRAGMENT.to_string(),
            value: value.into(),
        }
    }

    /// Create a dynamic chunk rendered through a caller-supplied fragment.
    pub fn templated(fragment: impl Into<String>, value: impl Into<Value>) -> Self {
        Chunk::Bound {
            fragment: fragment.into(),
            value: value.into(),
        }
    }
}

/// A node in an HTML document tree.
///
/// Trees are plain values: build one with the constructors here or the
/// functions in [`crate::builder`], then render it any number of times. A
/// tree is never mutated by rendering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Node {
    /// A normal element with a closing tag.
    Element {
        /// The tag name.
        name: String,
        /// The attributes, in append order.
        attributes: Attributes,
        /// The ordered children.
        children: NodeList,
    },
    /// A void element: no children and no closing tag.
    Void {
        /// The tag name.
        name: String,
        /// The attributes, in append order.
        attributes: Attributes,
    },
    /// Text content, escaped for the HTML text context.
    Text {
        /// The ordered chunks.
        chunks: Vec<Chunk>,
    },
    /// Pre-trusted markup inserted with no escaping. The caller asserts
    /// safety.
    Raw {
        /// The raw HTML.
        html: String,
    },
    /// A literal `<!...>` fragment such as a doctype, inserted with no
    /// escaping.
    Declaration {
        /// The content between `<!` and `>`.
        content: String,
    },
    /// An ordered sequence of top-level children with no wrapping tag.
    Document {
        /// The ordered children.
        children: NodeList,
    },
    /// A transparent sequence; renders as its members in order.
    List {
        /// The ordered children.
        children: NodeList,
    },
}

impl Node {
    /// Create an element node.
    pub fn element(
        name: impl Into<String>,
        attributes: Attributes,
        children: impl Into<NodeList>,
    ) -> Self {
        Node::Element {
            name: name.into(),
            attributes,
            children: children.into(),
        }
    }

    /// Create a void element node.
    pub fn void(name: impl Into<String>, attributes: Attributes) -> Self {
        Node::Void {
            name: name.into(),
            attributes,
        }
    }

    /// Create a text node with one static chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text {
            chunks: vec![Chunk::literal(text)],
        }
    }

    /// Create a text node bound to one dynamic value, escaped at render time.
    pub fn text_value(value: impl Into<Value>) -> Self {
        Node::Text {
            chunks: vec![Chunk::value(value)],
        }
    }

    /// Create a text node rendering one value through a caller-supplied
    /// fragment.
    pub fn text_template(fragment: impl Into<String>, value: impl Into<Value>) -> Self {
        Node::Text {
            chunks: vec![Chunk::templated(fragment, value)],
        }
    }

    /// Create a text node from an ordered sequence of chunks.
    pub fn text_chunks(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        Node::Text {
            chunks: chunks.into_iter().collect(),
        }
    }

    /// Create a raw node. The content is inserted with no escaping; the
    /// caller asserts it is safe.
    pub fn raw(html: impl Into<String>) -> Self {
        Node::Raw { html: html.into() }
    }

    /// Create a declaration node; `content` lands between `<!` and `>`.
    pub fn declaration(content: impl Into<String>) -> Self {
        Node::Declaration {
            content: content.into(),
        }
    }

    /// Create a doctype declaration, e.g. `Node::doctype("html")`.
    pub fn doctype(kind: &str) -> Self {
        Node::Declaration {
            content: format!("DOCTYPE {kind}"),
        }
    }

    /// Create a document node: top-level children with no wrapping tag.
    pub fn document(children: impl Into<NodeList>) -> Self {
        Node::Document {
            children: children.into(),
        }
    }

    /// Create a transparent list node.
    pub fn list(children: impl Into<NodeList>) -> Self {
        Node::List {
            children: children.into(),
        }
    }

    /// Flatten this tree into template source and bound values.
    pub fn build_template(&self) -> (String, Values) {
        let mut builder = SourceBuilder::new();
        self.build_template_to(&mut builder, 0);
        builder.finish()
    }

    /// Append this node's template-source contribution at the given
    /// indentation, registering any dynamic data it owns into the builder.
    pub fn build_template_to(&self, out: &mut SourceBuilder, indent: usize) {
        match self {
            Node::Element {
                name,
                attributes,
                children,
            } => {
                out.fresh_line(indent);
                out.literal("<");
                out.literal(name);
                attributes.build_template_to(out);
                out.literal(">");
                if children.is_empty() {
                    out.literal("</");
                    out.literal(name);
                    out.literal(">");
                } else {
                    for child in children.iter() {
                        child.build_template_to(out, indent + 1);
                    }
                    out.fresh_line(indent);
                    out.literal("</");
                    out.literal(name);
                    out.literal(">");
                }
            }
            Node::Void { name, attributes } => {
                out.fresh_line(indent);
                out.literal("<");
                out.literal(name);
                attributes.build_template_to(out);
                out.literal(">");
            }
            Node::Text { chunks } => {
                out.fresh_line(indent);
                for chunk in chunks {
                    match chunk {
                        Chunk::Literal(text) => out.literal(&escape_literal(text)),
                        Chunk::Bound { fragment, value } => {
                            let key = out.bind(value.clone());
                            out.splice(fragment, &key);
                        }
                    }
                }
            }
            Node::Raw { html } => {
                out.fresh_line(indent);
                out.literal(html);
            }
            Node::Declaration { content } => {
                out.fresh_line(indent);
                out.literal("<!");
                out.literal(content);
                out.literal(">");
            }
            Node::Document { children } | Node::List { children } => {
                for child in children.iter() {
                    child.build_template_to(out, indent);
                }
            }
        }
    }

    pub(crate) fn template_name(&self) -> &str {
        match self {
            Node::Element { name, .. } | Node::Void { name, .. } => name,
            Node::Text { .. } => "text",
            Node::Raw { .. } => "raw",
            Node::Declaration { .. } => "declaration",
            Node::Document { .. } => "document",
            Node::List { .. } => "list",
        }
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::text(text)
    }
}

/// An ordered, mutable sequence of nodes, used to assemble children
/// incrementally before attaching them to a parent.
///
/// Rendering a list is equivalent to rendering its members in order. Mutating
/// a list while it is part of a tree being rendered is a caller error; the
/// library provides no locking.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeList(Vec<Node>);

impl NodeList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node.
    pub fn push(&mut self, node: Node) {
        self.0.push(node);
    }

    /// Insert a node at the front.
    pub fn prepend(&mut self, node: Node) {
        self.0.insert(0, node);
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the nodes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.iter()
    }
}

impl From<Node> for NodeList {
    fn from(node: Node) -> Self {
        NodeList(vec![node])
    }
}

impl From<Vec<Node>> for NodeList {
    fn from(nodes: Vec<Node>) -> Self {
        NodeList(nodes)
    }
}

impl<const N: usize> From<[Node; N]> for NodeList {
    fn from(nodes: [Node; N]) -> Self {
        NodeList(nodes.into())
    }
}

impl FromIterator<Node> for NodeList {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        NodeList(iter.into_iter().collect())
    }
}

impl Extend<Node> for NodeList {
    fn extend<I: IntoIterator<Item = Node>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for NodeList {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Escape static text for inlining into the template source. `{` is
// additionally neutralized so literal text can never open a template action.
fn escape_literal(text: &str) -> String {
    html_escape::encode_safe(text).replace('{', "&#123;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_element_collapses_to_one_line() {
        let (source, values) = Node::element("div", Attributes::new(), []).build_template();
        assert_eq!(source, "<div></div>");
        assert!(values.is_empty());
    }

    #[test]
    fn children_indent_one_level_deeper() {
        let tree = Node::element(
            "ul",
            Attributes::new(),
            [
                Node::element("li", Attributes::new(), [Node::text("one")]),
                Node::element("li", Attributes::new(), [Node::text("two")]),
            ],
        );
        let (source, _) = tree.build_template();
        assert_eq!(
            source,
            "<ul>\n  <li>\n    one\n  </li>\n  <li>\n    two\n  </li>\n</ul>"
        );
    }

    #[test]
    fn static_text_is_escaped_into_the_source() {
        let (source, values) = Node::text("a < b & c").build_template();
        assert_eq!(source, "a &lt; b &amp; c");
        assert!(values.is_empty());
    }

    #[test]
    fn static_text_cannot_open_an_action() {
        let (source, _) = Node::text("{{.P0}}").build_template();
        assert!(!source.contains("{{"));
    }

    #[test]
    fn dynamic_text_binds_a_placeholder() {
        let (source, values) = Node::text_value("Home").build_template();
        assert_eq!(source, "{{.P0}}");
        assert_eq!(values["P0"], json!("Home"));
    }

    #[test]
    fn mixed_chunks_share_one_line() {
        let tree = Node::text_chunks([
            Chunk::literal("Hello, "),
            Chunk::value("world"),
            Chunk::literal("!"),
        ]);
        let (source, values) = tree.build_template();
        assert_eq!(source, "Hello, {{.P0}}!");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn raw_and_declaration_are_verbatim() {
        let (source, _) = Node::raw("<b>x</b>").build_template();
        assert_eq!(source, "<b>x</b>");
        let (source, _) = Node::doctype("html").build_template();
        assert_eq!(source, "<!DOCTYPE html>");
    }

    #[test]
    fn list_is_transparent() {
        let mut inner = NodeList::new();
        inner.push(Node::text("b"));
        inner.prepend(Node::text("a"));
        let via_list = Node::element("p", Attributes::new(), [Node::list(inner)]);
        let direct = Node::element("p", Attributes::new(), [Node::text("a"), Node::text("b")]);
        assert_eq!(via_list.build_template(), direct.build_template());
    }

    #[test]
    fn document_wraps_nothing() {
        let (source, _) = Node::document([Node::text("a"), Node::text("b")]).build_template();
        assert_eq!(source, "a\nb");
        let (source, _) = Node::document(NodeList::new()).build_template();
        assert_eq!(source, "");
    }

    #[test]
    fn attributes_bind_in_tree_order() {
        let tree = Node::element(
            "div",
            Attributes::new().set("id", "x"),
            [Node::element("span", Attributes::new().set("id", "y"), [])],
        );
        let (source, values) = tree.build_template();
        assert_eq!(
            source,
            "<div id=\"{{.P0}}\">\n  <span id=\"{{.P1}}\"></span>\n</div>"
        );
        assert_eq!(values["P0"], json!("x"));
        assert_eq!(values["P1"], json!("y"));
    }
}
