//! A generated construction surface: one function per common HTML tag and
//! one chaining setter per common attribute.
//!
//! The catalog is open. Anything missing here is reachable through
//! [`Node::element`], [`Node::void`] and [`Attributes::set`]; these functions
//! are pure shorthand for those.

use serde_json::Value;

use crate::{Attributes, Node, NodeList};

/// Create a text node. Shorthand for [`Node::text`].
pub fn text(text: impl Into<String>) -> Node {
    Node::text(text)
}

/// Create a raw, never-escaped node. Shorthand for [`Node::raw`].
pub fn raw(html: impl Into<String>) -> Node {
    Node::raw(html)
}

/// Create a doctype declaration. Shorthand for [`Node::doctype`].
pub fn doctype(kind: &str) -> Node {
    Node::doctype(kind)
}

/// Create a document node. Shorthand for [`Node::document`].
pub fn document(children: impl Into<NodeList>) -> Node {
    Node::document(children)
}

/// Create a document holding an HTML5 doctype followed by an `html` element
/// with the given attributes and children.
pub fn html5(attributes: Attributes, children: impl Into<NodeList>) -> Node {
    Node::document([doctype("html"), html(attributes, children)])
}

macro_rules! element_fns {
    ($($tag:ident),* $(,)?) => {
        $(
            #[doc = concat!("Create a `<", stringify!($tag), ">` element.")]
            pub fn $tag(attributes: Attributes, children: impl Into<NodeList>) -> Node {
                Node::element(stringify!($tag), attributes, children)
            }
        )*
        /// Tag names with a generated element function.
        pub const ELEMENT_TAGS: &[&str] = &[$(stringify!($tag)),*];
    };
}
element_fns! {
    html, head, title, body, main, header, footer, nav, section, article, aside,
    div, p, span, a, em, strong, small, b, i, u, s, q, code, pre, blockquote,
    ol, ul, li, dl, dt, dd,
    table, caption, colgroup, thead, tbody, tfoot, tr, td, th,
    h1, h2, h3, h4, h5, h6,
    form, fieldset, legend, button, label, select, option, textarea, output,
    figure, figcaption, picture, video, audio, canvas,
    script, style, noscript, iframe, object,
    time, mark, summary, details, dialog, address,
}

macro_rules! void_element_fns {
    ($($tag:ident),* $(,)?) => {
        $(
            #[doc = concat!("Create a void `<", stringify!($tag), ">` element.")]
            pub fn $tag(attributes: Attributes) -> Node {
                Node::void(stringify!($tag), attributes)
            }
        )*
        /// Tag names with a generated void-element function.
        pub const VOID_TAGS: &[&str] = &[$(stringify!($tag)),*];
    };
}
void_element_fns! {
    area, base, br, col, embed, hr, img, input, link, meta, param, source,
    track, wbr,
}

macro_rules! attribute_fns {
    ($($method:ident => $name:literal),* $(,)?) => {
        impl Attributes {
            $(
                #[doc = concat!("Append a `", $name, "` attribute bound to `value`.")]
                pub fn $method(self, value: impl Into<Value>) -> Self {
                    self.set($name, value)
                }
            )*
        }
        /// Attribute names with a generated setter.
        pub const ATTRIBUTE_NAMES: &[&str] = &[$($name),*];
    };
}
attribute_fns! {
    class => "class", id => "id", href => "href", src => "src", alt => "alt",
    title => "title", name => "name", value => "value",
    placeholder => "placeholder", rel => "rel", target => "target",
    width => "width", height => "height", lang => "lang", charset => "charset",
    content => "content", action => "action", method => "method",
    style => "style", role => "role",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_elements_carry_their_tag_name() {
        let node = div(Attributes::new(), [text("x")]);
        assert!(matches!(&node, Node::Element { name, .. } if name == "div"));
        let node = br(Attributes::new());
        assert!(matches!(&node, Node::Void { name, .. } if name == "br"));
    }

    #[test]
    fn generated_setters_append_named_attributes() {
        let attributes = Attributes::new().class("wide").id("top");
        let names: Vec<_> = attributes.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, ["class", "id"]);
    }

    #[test]
    fn html5_prepends_the_doctype() {
        let page = html5(Attributes::new(), [body(Attributes::new(), [text("hi")])]);
        let rendered = page.render_to_string().unwrap();
        assert!(rendered.starts_with("<!DOCTYPE html>\n<html>"));
    }
}
