#![deny(missing_docs)]
//! Build HTML documents as trees of typed nodes and render them to an output
//! stream with contextual escaping of every dynamically bound value.
//!
//! A render flattens the tree into one template source string, binding each
//! dynamic value under a unique placeholder, then either writes the source
//! verbatim (when nothing was bound) or compiles and executes it once,
//! escaping each substitution for the syntactic context it lands in: HTML
//! text, a quoted attribute value, or — only where the caller opted in
//! through [`Node::raw`] — not at all.
//!
//! # Example
//!
//! ```
//! use htmlweft::{builder::*, Attributes, Node};
//!
//! let page = html5(
//!     Attributes::new().lang("en"),
//!     [
//!         head(Attributes::new(), [title(Attributes::new(), [text("Home")])]),
//!         body(
//!             Attributes::new(),
//!             [div(
//!                 Attributes::new().class("greeting"),
//!                 [Node::text_value("Hello <world>")],
//!             )],
//!         ),
//!     ],
//! );
//! let rendered = page.render_to_string().unwrap();
//! assert!(rendered.starts_with("<!DOCTYPE html>"));
//! assert!(rendered.contains("Hello &lt;world&gt;"));
//! ```

pub mod builder;

mod attribute;
pub use attribute::{Attribute, Attributes};

mod node;
pub use node::{Chunk, Node, NodeList};

mod render;
pub use render::RenderError;

mod source;
pub use source::{SourceBuilder, Values};

mod template;
pub use template::{ExecuteError, Template, TemplateError};

// Re-export the value type callers bind into trees.
pub use serde_json::Value;
