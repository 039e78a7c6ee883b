//! Accumulation state for one render call: the template source, the bound
//! values, and the placeholder counter.

use serde_json::{Map, Value};

/// The value map consumed by template execution, keyed by placeholder.
///
/// Created empty at the start of a render, populated during the tree walk,
/// consumed once by execution, then discarded.
pub type Values = Map<String, Value>;

/// Accumulates template source and bound values during a tree walk.
///
/// Placeholder keys are allocated from an explicit monotonic counter rather
/// than the current map size, so uniqueness cannot be broken by anything that
/// touches the map between walk steps.
#[derive(Debug, Default)]
pub struct SourceBuilder {
    source: String,
    values: Values,
    next_binding: usize,
}

impl SourceBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal template source.
    pub fn literal(&mut self, text: &str) {
        self.source.push_str(text);
    }

    /// Start a fresh line at the given indentation. Does nothing while the
    /// buffer is empty, so output never begins with a newline.
    pub fn fresh_line(&mut self, indent: usize) {
        if self.source.is_empty() {
            return;
        }
        self.source.push('\n');
        for _ in 0..indent {
            self.source.push_str("  ");
        }
    }

    /// Bind a value under a freshly allocated placeholder key and return the
    /// key. Keys are unique within this builder.
    pub fn bind(&mut self, value: Value) -> String {
        let key = format!("P{}", self.next_binding);
        self.next_binding += 1;
        self.values.insert(key.clone(), value);
        key
    }

    /// Splice a single-input template fragment into the source, rerouting its
    /// implicit input through `key` first.
    pub fn splice(&mut self, fragment: &str, key: &str) {
        let rewritten = reroute(fragment, key);
        self.source.push_str(&rewritten);
    }

    /// Whether no values have been bound yet.
    pub fn is_static(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the builder, yielding the accumulated source and values.
    pub fn finish(self) -> (String, Values) {
        (self.source, self.values)
    }
}

/// Rewrite a fragment written against an implicit input so that every
/// input-rooted path routes through `key` instead: `.` becomes `.P3`,
/// `.user.name` becomes `.P3.user.name`. Paths inside a `{{range}}` body
/// refer to the iteration element and are left untouched.
///
/// This is a purely syntactic rename; an unterminated action passes through
/// unchanged for the compile step to report.
fn reroute(fragment: &str, key: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + key.len() + 1);
    let mut rest = fragment;
    // Open blocks, `true` for range.
    let mut blocks: Vec<bool> = Vec::new();
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let action = &after[..end];
        out.push_str("{{");
        if blocks.contains(&true) {
            out.push_str(action);
        } else {
            let mut first = true;
            for token in action.split_whitespace() {
                if !first {
                    out.push(' ');
                }
                first = false;
                match token.strip_prefix('.') {
                    Some(tail) => {
                        out.push('.');
                        out.push_str(key);
                        if !tail.is_empty() {
                            out.push('.');
                            out.push_str(tail);
                        }
                    }
                    None => out.push_str(token),
                }
            }
        }
        out.push_str("}}");
        match action.split_whitespace().next() {
            Some("range") => blocks.push(true),
            Some("if") => blocks.push(false),
            Some("end") => {
                blocks.pop();
            }
            _ => {}
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}
