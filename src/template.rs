//! The template engine that executes generated source against bound values.
//!
//! Actions are `{{ ... }}`: a bare path emits the value it resolves to,
//! `{{if .path}} ... {{else}} ... {{end}}` branches on truthiness, and
//! `{{range .path}} ... {{end}}` iterates an array with the iteration element
//! as the current value. Every emitted value is escaped for the syntactic
//! context the substitution point lands in, tracked across the literal text
//! surrounding it: HTML text, inside a tag, or inside a quoted attribute
//! value.

use std::fmt;
use std::io::Write;

use serde_json::Value;

use crate::render::RenderError;

/// A path inside an action: the current value (`.`) or a chain of object
/// field names (`.a.b`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(Vec<String>);

impl Path {
    fn parse(token: &str, offset: usize) -> Result<Self, TemplateError> {
        if token == "." {
            return Ok(Path(Vec::new()));
        }
        let Some(tail) = token.strip_prefix('.') else {
            return Err(TemplateError::BadPath {
                token: token.to_string(),
                offset,
            });
        };
        let mut segments = Vec::new();
        for segment in tail.split('.') {
            let valid = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(TemplateError::BadPath {
                    token: token.to_string(),
                    offset,
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Path(segments))
    }

    fn resolve<'a>(&self, current: &'a Value) -> Option<&'a Value> {
        let mut value = current;
        for segment in &self.0 {
            value = value.as_object()?.get(segment)?;
        }
        Some(value)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for segment in &self.0 {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// Error compiling template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// An action opened with `{{` but never closed with `}}`.
    UnclosedAction {
        /// Byte offset of the opening delimiter.
        offset: usize,
    },
    /// An action with no content.
    EmptyAction {
        /// Byte offset of the opening delimiter.
        offset: usize,
    },
    /// A token that is not a valid path where a path was expected.
    BadPath {
        /// The offending token.
        token: String,
        /// Byte offset of the enclosing action.
        offset: usize,
    },
    /// An `if` or `range` with no argument.
    MissingArgument {
        /// The keyword missing its argument.
        keyword: String,
        /// Byte offset of the enclosing action.
        offset: usize,
    },
    /// An `else` or `end` with no open block to close.
    UnexpectedKeyword {
        /// The offending keyword.
        keyword: String,
        /// Byte offset of the enclosing action.
        offset: usize,
    },
    /// An `if` or `range` block without a matching `end`.
    UnclosedBlock {
        /// The keyword that opened the block.
        keyword: String,
        /// Byte offset of the opening action.
        offset: usize,
    },
    /// Extra tokens after a complete action.
    TrailingTokens {
        /// The full action text.
        action: String,
        /// Byte offset of the enclosing action.
        offset: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnclosedAction { offset } => {
                write!(f, "action at offset {offset} is never closed with `}}}}`")
            }
            TemplateError::EmptyAction { offset } => {
                write!(f, "empty action at offset {offset}")
            }
            TemplateError::BadPath { token, offset } => {
                write!(f, "`{token}` at offset {offset} is not a valid path")
            }
            TemplateError::MissingArgument { keyword, offset } => {
                write!(f, "`{keyword}` at offset {offset} is missing its argument")
            }
            TemplateError::UnexpectedKeyword { keyword, offset } => {
                write!(f, "`{keyword}` at offset {offset} has no open block")
            }
            TemplateError::UnclosedBlock { keyword, offset } => {
                write!(f, "`{keyword}` block at offset {offset} has no matching `end`")
            }
            TemplateError::TrailingTokens { action, offset } => {
                write!(f, "trailing tokens in action `{action}` at offset {offset}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Error executing a compiled template against bound values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    /// An emitted path did not resolve to a value.
    Missing {
        /// The path that failed to resolve.
        path: String,
    },
    /// A `range` path resolved to something other than an array or null.
    NotIterable {
        /// The path that resolved to a non-iterable value.
        path: String,
    },
    /// An emitted path resolved to an array or object.
    NotPrintable {
        /// The path that resolved to a non-scalar value.
        path: String,
    },
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteError::Missing { path } => write!(f, "`{path}` resolves to no value"),
            ExecuteError::NotIterable { path } => {
                write!(f, "`{path}` does not resolve to an array")
            }
            ExecuteError::NotPrintable { path } => {
                write!(f, "`{path}` resolves to a value with no scalar form")
            }
        }
    }
}

impl std::error::Error for ExecuteError {}

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Literal(String),
    Emit(Path),
    Cond {
        path: Path,
        then: Vec<Op>,
        otherwise: Vec<Op>,
    },
    Repeat {
        path: Path,
        body: Vec<Op>,
    },
}

/// A compiled template, ready to execute any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    ops: Vec<Op>,
}

impl Template {
    /// Compile template source under the given name. The name only appears in
    /// error reporting.
    pub fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        let ops = parse_ops(source)?;
        Ok(Template {
            name: name.to_string(),
            ops,
        })
    }

    /// The template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute against a root value, streaming contextually escaped output to
    /// the writer. The writer may hold partial output when this fails.
    pub fn execute(&self, root: &Value, writer: &mut dyn Write) -> Result<(), RenderError> {
        let mut exec = Exec {
            writer,
            context: Context::Text,
        };
        exec.run(&self.ops, root)
            .map_err(|failure| failure.into_render(&self.name))
    }
}

enum Failure {
    Execute(ExecuteError),
    Io(std::io::Error),
}

impl Failure {
    fn into_render(self, template: &str) -> RenderError {
        match self {
            Failure::Execute(error) => RenderError::Execute {
                template: template.to_string(),
                error,
            },
            Failure::Io(error) => RenderError::Io(error),
        }
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        Failure::Io(error)
    }
}

enum Frame {
    Cond {
        path: Path,
        then: Vec<Op>,
        otherwise: Vec<Op>,
        in_else: bool,
        offset: usize,
    },
    Repeat {
        path: Path,
        body: Vec<Op>,
        offset: usize,
    },
}

fn push_op(ops: &mut Vec<Op>, stack: &mut Vec<Frame>, op: Op) {
    match stack.last_mut() {
        Some(Frame::Cond {
            then,
            otherwise,
            in_else,
            ..
        }) => {
            if *in_else {
                otherwise.push(op);
            } else {
                then.push(op);
            }
        }
        Some(Frame::Repeat { body, .. }) => body.push(op),
        None => ops.push(op),
    }
}

fn parse_ops(source: &str) -> Result<Vec<Op>, TemplateError> {
    let mut ops = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut offset = 0;
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            push_op(&mut ops, &mut stack, Op::Literal(rest[..start].to_string()));
        }
        let action_offset = offset + start;
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(TemplateError::UnclosedAction {
                offset: action_offset,
            });
        };
        parse_action(&after[..end], action_offset, &mut ops, &mut stack)?;
        offset = action_offset + 2 + end + 2;
        rest = &after[end + 2..];
    }
    if !rest.is_empty() {
        push_op(&mut ops, &mut stack, Op::Literal(rest.to_string()));
    }
    if let Some(frame) = stack.pop() {
        let (keyword, offset) = match frame {
            Frame::Cond { offset, .. } => ("if", offset),
            Frame::Repeat { offset, .. } => ("range", offset),
        };
        return Err(TemplateError::UnclosedBlock {
            keyword: keyword.to_string(),
            offset,
        });
    }
    Ok(ops)
}

fn parse_action(
    action: &str,
    offset: usize,
    ops: &mut Vec<Op>,
    stack: &mut Vec<Frame>,
) -> Result<(), TemplateError> {
    let mut tokens = action.split_whitespace();
    let Some(head) = tokens.next() else {
        return Err(TemplateError::EmptyAction { offset });
    };
    match head {
        "if" | "range" => {
            let Some(argument) = tokens.next() else {
                return Err(TemplateError::MissingArgument {
                    keyword: head.to_string(),
                    offset,
                });
            };
            if tokens.next().is_some() {
                return Err(TemplateError::TrailingTokens {
                    action: action.trim().to_string(),
                    offset,
                });
            }
            let path = Path::parse(argument, offset)?;
            if head == "if" {
                stack.push(Frame::Cond {
                    path,
                    then: Vec::new(),
                    otherwise: Vec::new(),
                    in_else: false,
                    offset,
                });
            } else {
                stack.push(Frame::Repeat {
                    path,
                    body: Vec::new(),
                    offset,
                });
            }
        }
        "else" => {
            if tokens.next().is_some() {
                return Err(TemplateError::TrailingTokens {
                    action: action.trim().to_string(),
                    offset,
                });
            }
            match stack.last_mut() {
                Some(Frame::Cond { in_else, .. }) if !*in_else => *in_else = true,
                _ => {
                    return Err(TemplateError::UnexpectedKeyword {
                        keyword: "else".to_string(),
                        offset,
                    })
                }
            }
        }
        "end" => {
            if tokens.next().is_some() {
                return Err(TemplateError::TrailingTokens {
                    action: action.trim().to_string(),
                    offset,
                });
            }
            let Some(frame) = stack.pop() else {
                return Err(TemplateError::UnexpectedKeyword {
                    keyword: "end".to_string(),
                    offset,
                });
            };
            let op = match frame {
                Frame::Cond {
                    path,
                    then,
                    otherwise,
                    ..
                } => Op::Cond {
                    path,
                    then,
                    otherwise,
                },
                Frame::Repeat { path, body, .. } => Op::Repeat { path, body },
            };
            push_op(ops, stack, op);
        }
        _ => {
            if tokens.next().is_some() {
                return Err(TemplateError::TrailingTokens {
                    action: action.trim().to_string(),
                    offset,
                });
            }
            let path = Path::parse(head, offset)?;
            push_op(ops, stack, Op::Emit(path));
        }
    }
    Ok(())
}

/// Escaping context at the current output position, tracked across literal
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Text,
    Tag,
    Attr(char),
}

struct Exec<'w> {
    writer: &'w mut dyn Write,
    context: Context,
}

impl Exec<'_> {
    fn run(&mut self, ops: &[Op], current: &Value) -> Result<(), Failure> {
        for op in ops {
            match op {
                Op::Literal(text) => self.write_literal(text)?,
                Op::Emit(path) => {
                    let Some(value) = path.resolve(current) else {
                        return Err(Failure::Execute(ExecuteError::Missing {
                            path: path.to_string(),
                        }));
                    };
                    let Some(text) = scalar_to_string(value) else {
                        return Err(Failure::Execute(ExecuteError::NotPrintable {
                            path: path.to_string(),
                        }));
                    };
                    self.write_escaped(&text)?;
                }
                Op::Cond {
                    path,
                    then,
                    otherwise,
                } => {
                    let truthy = path.resolve(current).map(is_truthy).unwrap_or(false);
                    if truthy {
                        self.run(then, current)?;
                    } else {
                        self.run(otherwise, current)?;
                    }
                }
                Op::Repeat { path, body } => match path.resolve(current) {
                    None | Some(Value::Null) => {}
                    Some(Value::Array(items)) => {
                        for item in items {
                            self.run(body, item)?;
                        }
                    }
                    Some(_) => {
                        return Err(Failure::Execute(ExecuteError::NotIterable {
                            path: path.to_string(),
                        }))
                    }
                },
            }
        }
        Ok(())
    }

    fn write_literal(&mut self, text: &str) -> Result<(), Failure> {
        self.writer.write_all(text.as_bytes())?;
        for c in text.chars() {
            self.context = match (self.context, c) {
                (Context::Text, '<') => Context::Tag,
                (Context::Tag, '>') => Context::Text,
                (Context::Tag, q @ ('"' | '\'')) => Context::Attr(q),
                (Context::Attr(q), c) if c == q => Context::Tag,
                (context, _) => context,
            };
        }
        Ok(())
    }

    // Escaped output cannot contain `<`, `>` or a quote, so it never moves
    // the context.
    fn write_escaped(&mut self, text: &str) -> Result<(), Failure> {
        let escaped = match self.context {
            Context::Text => html_escape::encode_safe(text),
            Context::Tag | Context::Attr(_) => html_escape::encode_quoted_attribute(text),
        };
        self.writer.write_all(escaped.as_bytes())?;
        Ok(())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(source: &str, root: Value) -> Result<String, RenderError> {
        let template = Template::parse("test", source).expect("source should compile");
        let mut output = Vec::new();
        template.execute(&root, &mut output)?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn emits_scalar_values() {
        let root = json!({ "P0": "hi", "P1": 3, "P2": true, "P3": null });
        assert_eq!(
            run("{{.P0}}/{{.P1}}/{{.P2}}/{{.P3}}.", root).unwrap(),
            "hi/3/true/."
        );
    }

    #[test]
    fn emits_nested_fields() {
        let root = json!({ "P0": { "user": { "name": "ada" } } });
        assert_eq!(run("{{.P0.user.name}}", root).unwrap(), "ada");
    }

    #[test]
    fn escapes_for_text_context() {
        let root = json!({ "P0": "<b>\"x\" & y<b>" });
        assert_eq!(
            run("<p>{{.P0}}</p>", root).unwrap(),
            "<p>&lt;b&gt;&quot;x&quot; &amp; y&lt;b&gt;</p>"
        );
    }

    #[test]
    fn escapes_for_attribute_context() {
        let root = json!({ "P0": "a\"b" });
        assert_eq!(
            run("<div class=\"{{.P0}}\">", root).unwrap(),
            "<div class=\"a&quot;b\">"
        );
    }

    #[test]
    fn context_returns_to_text_after_tag_closes() {
        let root = json!({ "P0": "x\"y", "P1": "x\"y" });
        let output = run("<i id=\"{{.P0}}\">{{.P1}}</i>", root).unwrap();
        assert_eq!(output, "<i id=\"x&quot;y\">x&quot;y</i>");
    }

    #[test]
    fn branches_on_truthiness() {
        assert_eq!(
            run("{{if .P0}}yes{{else}}no{{end}}", json!({ "P0": "x" })).unwrap(),
            "yes"
        );
        assert_eq!(
            run("{{if .P0}}yes{{else}}no{{end}}", json!({ "P0": "" })).unwrap(),
            "no"
        );
        // A missing path is false, not an error.
        assert_eq!(run("{{if .P9}}yes{{else}}no{{end}}", json!({})).unwrap(), "no");
    }

    #[test]
    fn ranges_over_arrays() {
        let root = json!({ "P0": ["a", "b", "c"] });
        assert_eq!(run("{{range .P0}}{{.}},{{end}}", root).unwrap(), "a,b,c,");
    }

    #[test]
    fn ranges_over_element_fields() {
        let root = json!({ "P0": [{ "id": 1 }, { "id": 2 }] });
        assert_eq!(run("{{range .P0}}#{{.id}}{{end}}", root).unwrap(), "#1#2");
    }

    #[test]
    fn range_of_null_is_empty() {
        assert_eq!(run("[{{range .P0}}x{{end}}]", json!({ "P0": null })).unwrap(), "[]");
        assert_eq!(run("[{{range .P0}}x{{end}}]", json!({})).unwrap(), "[]");
    }

    #[test]
    fn missing_emit_is_an_error() {
        let error = run("{{.P0}}", json!({})).unwrap_err();
        assert!(matches!(
            error,
            RenderError::Execute {
                error: ExecuteError::Missing { .. },
                ..
            }
        ));
    }

    #[test]
    fn non_scalar_emit_is_an_error() {
        let error = run("{{.P0}}", json!({ "P0": { "a": 1 } })).unwrap_err();
        assert!(matches!(
            error,
            RenderError::Execute {
                error: ExecuteError::NotPrintable { .. },
                ..
            }
        ));
    }

    #[test]
    fn non_array_range_is_an_error() {
        let error = run("{{range .P0}}x{{end}}", json!({ "P0": "s" })).unwrap_err();
        assert!(matches!(
            error,
            RenderError::Execute {
                error: ExecuteError::NotIterable { .. },
                ..
            }
        ));
    }

    #[test]
    fn rejects_unclosed_action() {
        assert_eq!(
            Template::parse("t", "a{{.P0").unwrap_err(),
            TemplateError::UnclosedAction { offset: 1 }
        );
    }

    #[test]
    fn rejects_empty_action() {
        assert_eq!(
            Template::parse("t", "{{ }}").unwrap_err(),
            TemplateError::EmptyAction { offset: 0 }
        );
    }

    #[test]
    fn rejects_bad_paths() {
        assert!(matches!(
            Template::parse("t", "{{P0}}").unwrap_err(),
            TemplateError::BadPath { .. }
        ));
        assert!(matches!(
            Template::parse("t", "{{..a}}").unwrap_err(),
            TemplateError::BadPath { .. }
        ));
    }

    #[test]
    fn rejects_stray_else_and_end() {
        assert!(matches!(
            Template::parse("t", "{{else}}").unwrap_err(),
            TemplateError::UnexpectedKeyword { .. }
        ));
        assert!(matches!(
            Template::parse("t", "{{end}}").unwrap_err(),
            TemplateError::UnexpectedKeyword { .. }
        ));
    }

    #[test]
    fn rejects_unclosed_block() {
        assert_eq!(
            Template::parse("t", "{{if .P0}}x").unwrap_err(),
            TemplateError::UnclosedBlock {
                keyword: "if".to_string(),
                offset: 0
            }
        );
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(matches!(
            Template::parse("t", "{{.P0 .P1}}").unwrap_err(),
            TemplateError::TrailingTokens { .. }
        ));
    }
}
