//! Link Description Object lookup and href resolution.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;

use crate::error::TransformError;

/// Search fields for finding an LDO in a schema's top-level `links`.
/// Only `title`, `rel` and `method` are supported; matching is
/// case-insensitive, and an LDO without a `method` counts as `GET`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl LinkQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.title.is_none() && self.rel.is_none() && self.method.is_none()
    }

    fn matches(&self, ldo: &Value) -> bool {
        if self.is_empty() {
            return false;
        }
        for (field, wanted) in [("title", &self.title), ("rel", &self.rel)] {
            if let Some(wanted) = wanted {
                match ldo.get(field).and_then(Value::as_str) {
                    Some(value) if value.eq_ignore_ascii_case(wanted) => {}
                    _ => return false,
                }
            }
        }
        if let Some(wanted) = &self.method {
            let method = ldo.get("method").and_then(Value::as_str).unwrap_or("GET");
            if !method.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        true
    }

    /// The query as compact JSON, for error messages.
    fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// All LDOs in the schema's top-level `links` matching the query.
/// An empty query matches nothing.
pub fn extract_ldos<'a>(query: &LinkQuery, schema: &'a Value) -> Vec<&'a Value> {
    schema
        .get("links")
        .and_then(Value::as_array)
        .map(|links| links.iter().filter(|ldo| query.matches(ldo)).collect())
        .unwrap_or_default()
}

/// The single LDO matching the query.
///
/// # Errors
///
/// Fails when no LDO matches, or when more than one does.
pub fn extract_ldo<'a>(query: &LinkQuery, schema: &'a Value) -> Result<&'a Value, TransformError> {
    let matches = extract_ldos(query, schema);
    match matches.len() {
        0 => Err(TransformError::NoMatchingLink {
            query: query.describe(),
        }),
        1 => Ok(matches[0]),
        _ => Err(TransformError::DuplicateLinks {
            query: query.describe(),
        }),
    }
}

/// Matches the JSON-pointer flavored template variables used in API
/// document hrefs.
fn pointer_variable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{#/definitions/([^{}]+)\}").expect("literal pattern"))
}

fn variable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("literal pattern"))
}

/// Resolve an LDO's href template against a data object, typically the
/// root schema's rolled-up example.
///
/// Standard `{name}` variables work as-is, while the JSON-pointer
/// flavor is first normalized: `{#/definitions/zone_identifier}`
/// becomes `{zone_identifier}`, with a trailing `identifier` shortened
/// to `id` because instance data always uses the short form. Dotted
/// variable names descend into nested objects, so `{zone.id}` reads
/// `values.zone.id`. Strings, numbers and booleans substitute; a
/// variable that resolves to nothing (or to a non-scalar) is kept as
/// its literal `{name}` placeholder so the gap stays visible in
/// rendered output.
///
/// # Errors
///
/// Fails if the LDO has no `href`.
pub fn resolve_uri(ldo: &Value, template_values: &Value) -> Result<String, TransformError> {
    let href = ldo
        .get("href")
        .and_then(Value::as_str)
        .ok_or(TransformError::MissingHref)?;

    let template = pointer_variable_re().replace_all(href, |caps: &Captures| {
        let name = &caps[1];
        match name.strip_suffix("identifier") {
            Some(stem) => format!("{{{stem}id}}"),
            None => format!("{{{name}}}"),
        }
    });

    let resolved = variable_re().replace_all(&template, |caps: &Captures| {
        let name = &caps[1];
        let mut value = template_values;
        for component in name.split('.') {
            match value.get(component) {
                Some(next) => value = next,
                None => return caps[0].to_string(),
            }
        }
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => caps[0].to_string(),
        }
    });
    Ok(resolved.into_owned())
}
