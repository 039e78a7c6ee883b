//! Render execution: the fast path for all-static trees, and the
//! compile-and-execute path for trees with bound values.

use std::fmt;
use std::io::Write;

use serde_json::Value;

use crate::node::Node;
use crate::source::SourceBuilder;
use crate::template::{ExecuteError, Template, TemplateError};

/// Error produced by a failed render.
///
/// Every failure is terminal for the render call; on the templated path the
/// destination may already hold partial output, which callers must not treat
/// as a usable document.
#[derive(Debug)]
pub enum RenderError {
    /// The generated template source failed to compile: a caller-supplied
    /// attribute or text fragment is not valid template syntax.
    Compile {
        /// Name of the template that failed.
        template: String,
        /// The compile error.
        error: TemplateError,
    },
    /// A bound value did not satisfy its fragment at substitution time.
    Execute {
        /// Name of the template that failed.
        template: String,
        /// The execution error.
        error: ExecuteError,
    },
    /// The destination sink rejected a write.
    Io(std::io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Compile { template, error } => {
                write!(f, "compiling template `{template}`: {error}")
            }
            RenderError::Execute { template, error } => {
                write!(f, "executing template `{template}`: {error}")
            }
            RenderError::Io(error) => write!(f, "writing rendered output: {error}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Compile { error, .. } => Some(error),
            RenderError::Execute { error, .. } => Some(error),
            RenderError::Io(error) => Some(error),
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(error: std::io::Error) -> Self {
        RenderError::Io(error)
    }
}

impl Node {
    /// Render this node to a writer.
    ///
    /// The tree is first flattened into one template source with a
    /// placeholder per dynamic value. A tree with no dynamic values is
    /// written verbatim; otherwise the source is compiled once and executed
    /// against the bound values, streaming contextually escaped output to the
    /// writer.
    pub fn render_to(&self, writer: &mut impl Write) -> Result<(), RenderError> {
        let mut builder = SourceBuilder::new();
        self.build_template_to(&mut builder, 0);
        let (source, values) = builder.finish();
        if values.is_empty() {
            writer.write_all(source.as_bytes())?;
            return Ok(());
        }
        let name = self.template_name();
        let template = Template::parse(name, &source).map_err(|error| RenderError::Compile {
            template: name.to_string(),
            error,
        })?;
        template.execute(&Value::Object(values), writer)
    }

    /// Render this node to a `String`.
    pub fn render_to_string(&self) -> Result<String, RenderError> {
        let mut output = Vec::new();
        self.render_to(&mut output)?;
        Ok(String::from_utf8(output).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attributes;
    use serde_json::json;

    #[test]
    fn fast_path_writes_the_source_verbatim() {
        let tree = Node::document([
            Node::doctype("html"),
            Node::element("p", Attributes::new(), [Node::text("static only")]),
        ]);
        let (source, values) = tree.build_template();
        assert!(values.is_empty());
        assert_eq!(tree.render_to_string().unwrap(), source);
    }

    #[test]
    fn templated_path_substitutes_and_escapes() {
        let tree = Node::element(
            "div",
            Attributes::new().set("class", "wide"),
            [Node::text_value("a < b")],
        );
        assert_eq!(
            tree.render_to_string().unwrap(),
            "<div class=\"wide\">\n  a &lt; b\n</div>"
        );
    }

    #[test]
    fn rendering_twice_is_identical() {
        let tree = Node::element(
            "span",
            Attributes::new().set("id", "x"),
            [Node::text_value("v")],
        );
        assert_eq!(
            tree.render_to_string().unwrap(),
            tree.render_to_string().unwrap()
        );
    }

    #[test]
    fn bad_fragment_surfaces_as_compile_error() {
        let tree = Node::element(
            "div",
            Attributes::new().set_with("class", "x", "{{if .}}on"),
            [],
        );
        let error = tree.render_to_string().unwrap_err();
        assert!(matches!(error, RenderError::Compile { .. }));
    }

    #[test]
    fn incompatible_value_surfaces_as_execute_error() {
        let tree = Node::element(
            "div",
            Attributes::new().set("class", json!({ "not": "a scalar" })),
            [],
        );
        let error = tree.render_to_string().unwrap_err();
        assert!(matches!(error, RenderError::Execute { .. }));
    }

    #[test]
    fn write_failures_propagate() {
        struct Failing;
        impl Write for Failing {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "sink closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let tree = Node::text("static");
        let error = tree.render_to(&mut Failing).unwrap_err();
        assert!(matches!(error, RenderError::Io(_)));
    }
}
