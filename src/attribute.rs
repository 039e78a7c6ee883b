//! The attribute binding model: one name/value/fragment binding, and the
//! ordered list a node owns.

use serde_json::Value;

use crate::source::SourceBuilder;

/// One name/value binding on an element.
///
/// The fragment is a single-input template expression describing how the
/// bound value renders into the attribute string. The default substitutes the
/// whole value; callers can supply conditionals or list expansions instead,
/// written against the implicit input (`{{if .}}...{{end}}`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attribute {
    name: String,
    data: Option<Value>,
    fragment: String,
}

impl Attribute {
    /// The default fragment: substitute the whole bound value.
    pub const DEFAULT_FRAGMENT: &'static str = "{{.}}";

    /// Create an attribute bound to a value, rendered with the default
    /// fragment.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            data: Some(value.into()),
            fragment: Self::DEFAULT_FRAGMENT.to_string(),
        }
    }

    /// Create an attribute bound to a value, rendered with a caller-supplied
    /// fragment.
    pub fn with_fragment(
        name: impl Into<String>,
        value: impl Into<Value>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data: Some(value.into()),
            fragment: fragment.into(),
        }
    }

    /// Create an attribute with no bound data; a pure literal fragment
    /// renders unchanged.
    pub fn literal(name: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
            fragment: fragment.into(),
        }
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound data, if any.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The template fragment.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

/// An ordered sequence of [`Attribute`]s, built by value-returning chaining.
///
/// Each chain step consumes the list and returns the extended one, so a list
/// attached to a node is never mutated behind its back. Attributes render in
/// append order; repeated names are kept as appended, not merged.
///
/// ```
/// use htmlweft::Attributes;
///
/// let attributes = Attributes::new().class("wide").data("url", "/home");
/// assert_eq!(attributes.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute bound to `value` with the default fragment.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push(Attribute::new(name, value));
        self
    }

    /// Append an attribute bound to `value` with a caller-supplied fragment.
    pub fn set_with(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        fragment: impl Into<String>,
    ) -> Self {
        self.0.push(Attribute::with_fragment(name, value, fragment));
        self
    }

    /// Append an attribute with no bound data and a literal fragment.
    pub fn literal(mut self, name: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.0.push(Attribute::literal(name, fragment));
        self
    }

    /// Append a `data-*` attribute.
    pub fn data(self, key: &str, value: impl Into<Value>) -> Self {
        self.set(format!("data-{key}"), value)
    }

    /// Append an already-built attribute.
    pub fn push(mut self, attribute: Attribute) -> Self {
        self.0.push(attribute);
        self
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the attributes in append order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    // Emit ` name="<fragment>"` for each attribute in order, binding each
    // attribute's data under a fresh placeholder. Absent data binds null,
    // which substitutes as the empty string.
    pub(crate) fn build_template_to(&self, out: &mut SourceBuilder) {
        for attribute in &self.0 {
            let key = out.bind(attribute.data.clone().unwrap_or(Value::Null));
            out.literal(" ");
            out.literal(&attribute.name);
            out.literal("=\"");
            out.splice(&attribute.fragment, &key);
            out.literal("\"");
        }
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Attributes(iter.into_iter().collect())
    }
}

impl From<Vec<Attribute>> for Attributes {
    fn from(attributes: Vec<Attribute>) -> Self {
        Attributes(attributes)
    }
}
