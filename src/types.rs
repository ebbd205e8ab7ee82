//! Core types for schema tree navigation.

use std::fmt;

use serde_json::Value;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a value can sit in schema position.
///
/// Boolean schemas are valid from draft-06 onward and tolerated for
/// draft-04; anything that is not an object or boolean is a structural
/// error at walk time.
pub fn is_schema(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Bool(_))
}

/// JS-style truthiness, used by the logical-or merge rule and the
/// `cfPrivate`/`cfOmitFromExample` markers.
pub(crate) fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Bool(false) | Value::Null)
}

/// One segment of a path from a schema node to one of its subschemas:
/// an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(String),
    Index(usize),
}

impl Step {
    /// Key name, if this is a key step.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Step::Key(k) => Some(k),
            Step::Index(_) => None,
        }
    }
}

impl From<&str> for Step {
    fn from(key: &str) -> Self {
        Step::Key(key.to_string())
    }
}

impl From<String> for Step {
    fn from(key: String) -> Self {
        Step::Key(key)
    }
}

impl From<usize> for Step {
    fn from(index: usize) -> Self {
        Step::Index(index)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(k) => write!(f, "{}", k),
            Step::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Format a path as a JSON-pointer-style string for error messages.
/// The empty path formats as `/`.
pub fn format_path(path: &[Step]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for step in path {
        out.push('/');
        out.push_str(&step.to_string());
    }
    out
}

/// Get a subschema by path when the number of path components is
/// unknown. Useful for callbacks that need to examine a node relative
/// to the one they were handed. Returns `None` if the path cannot be
/// fully applied.
pub fn get_subschema<'a>(schema: &'a Value, path: &[Step]) -> Option<&'a Value> {
    let mut current = schema;
    for step in path {
        current = match step {
            Step::Key(k) => current.get(k.as_str())?,
            Step::Index(i) => current.get(*i)?,
        };
    }
    Some(current)
}

/// Mutable counterpart of [`get_subschema`].
pub fn get_subschema_mut<'a>(schema: &'a mut Value, path: &[Step]) -> Option<&'a mut Value> {
    let mut current = schema;
    for step in path {
        current = match step {
            Step::Key(k) => current.get_mut(k.as_str())?,
            Step::Index(i) => current.get_mut(*i)?,
        };
    }
    Some(current)
}

/// Replace the value at `path` (which must be non-empty and already
/// present) with `value`. Returns `false` if the path does not resolve.
pub fn set_subschema(schema: &mut Value, path: &[Step], value: Value) -> bool {
    match get_subschema_mut(schema, path) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Options accepted by the documentation pipeline.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Absolute URI prefix for link hrefs, used both when rewriting
    /// hrefs during self-reference merging and when building example
    /// request URLs. Plain string concatenation: in general this should
    /// end in `/` while hrefs should not begin with one.
    pub base_uri: Option<String>,
    /// A schema whose `example` supplies default request headers for
    /// every link. A link's own `headerSchema` overrides (not extends)
    /// these defaults.
    pub global_header_schema: Option<Value>,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URI used for href completion and request URLs.
    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Set the global header schema.
    pub fn global_header_schema(mut self, schema: Value) -> Self {
        self.global_header_schema = Some(schema);
        self
    }
}
