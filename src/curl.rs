//! Example request synthesis.
//!
//! Attaches a `cfCurl` string to every link, showing the request a
//! *NIX curl invocation would make against the documented endpoint,
//! assembled from the rolled-up examples. Must run after the example
//! roll-up pass, as the root schema's example supplies the href
//! template variables.

use serde_json::{Map, Value};

use crate::error::TransformError;
use crate::example::is_hidden;
use crate::ldo::resolve_uri;
use crate::types::{get_subschema_mut, Step};
use crate::walker::Visitor;

/// Render a header or parameter value the way it appears on a command
/// line: bare scalars, compact JSON otherwise.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// `x-auth-email` renders as `X-Auth-Email`.
fn title_case_header(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// `key=value` pairs sorted alphabetically by key, for deterministic
/// query strings and form bodies.
fn sorted_pairs(params: &Map<String, Value>, separator: &str) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    keys.iter()
        .map(|key| format!("{}={}", key, render_value(&params[key.as_str()])))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Post-visit callback attaching `cfCurl` example commands to every
/// LDO in a visited subschema's `links`.
#[derive(Debug)]
pub struct CurlExamples {
    root_example: Value,
    root_hidden: bool,
    base_uri: String,
    global_headers: Option<Value>,
}

impl CurlExamples {
    /// Capture the root schema's rolled-up example (for href template
    /// variables) and the default header set. A link's own
    /// `headerSchema` overrides, not extends, the global headers;
    /// declaring one without an example yields a request with no
    /// headers at all.
    pub fn new(root: &Value, base_uri: &str, global_header_schema: Option<&Value>) -> Self {
        Self {
            root_example: root.get("example").cloned().unwrap_or(Value::Null),
            root_hidden: is_hidden(root),
            base_uri: base_uri.to_string(),
            global_headers: global_header_schema
                .and_then(|schema| schema.get("example"))
                .cloned(),
        }
    }

    /// One curl command line for one LDO.
    fn render(&self, ldo: &Value) -> Result<String, TransformError> {
        let method = ldo
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_uppercase();
        let mut url = format!("{}{}", self.base_uri, resolve_uri(ldo, &self.root_example)?);

        let request_example = ldo.get("schema").and_then(|schema| schema.get("example"));
        let multipart =
            ldo.get("encType").and_then(Value::as_str) == Some("multipart/form-data");

        let mut body = String::new();
        if method == "GET" {
            if let Some(params) = request_example.and_then(Value::as_object) {
                if !params.is_empty() {
                    url.push('?');
                    url.push_str(&sorted_pairs(params, "&"));
                }
            }
        } else if multipart {
            if let Some(params) = request_example.and_then(Value::as_object) {
                body = format!(" \\\n     --form '{}'", sorted_pairs(params, ";"));
            }
        } else if let Some(example) = request_example {
            let data = serde_json::to_string(example).unwrap_or_default();
            body = format!(" \\\n     --data '{data}'");
        }

        let headers = match ldo.get("headerSchema") {
            Some(header_schema) => header_schema.get("example").cloned(),
            None => self.global_headers.clone(),
        };
        let mut header_lines = String::new();
        if let Some(Value::Object(headers)) = headers {
            let mut names: Vec<&String> = headers.keys().collect();
            names.sort_by_key(|name| name.to_lowercase());
            for name in names {
                header_lines.push_str(&format!(
                    " \\\n     -H \"{}: {}\"",
                    title_case_header(name),
                    render_value(&headers[name.as_str()])
                ));
            }
        }

        Ok(format!("curl -X {method} \"{url}\"{header_lines}{body}"))
    }
}

impl Visitor for CurlExamples {
    fn post(
        &mut self,
        owner: &mut Value,
        path: &[Step],
        _parent_path: &[Step],
    ) -> Result<(), TransformError> {
        if self.root_hidden {
            return Ok(());
        }
        let Some(child) = get_subschema_mut(owner, path) else {
            return Ok(());
        };
        if !child.is_object() || is_hidden(child) {
            return Ok(());
        }
        let Some(links) = child.get("links").and_then(Value::as_array) else {
            return Ok(());
        };

        let mut commands: Vec<Option<String>> = Vec::with_capacity(links.len());
        for ldo in links {
            if !ldo.is_object() || is_hidden(ldo) {
                commands.push(None);
            } else {
                commands.push(Some(self.render(ldo)?));
            }
        }

        if let Some(links) = child.get_mut("links").and_then(Value::as_array_mut) {
            for (ldo, command) in links.iter_mut().zip(commands) {
                if let (Some(map), Some(command)) = (ldo.as_object_mut(), command) {
                    map.insert("cfCurl".to_string(), Value::String(command));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Vocabulary;
    use crate::walker::walk_schema;
    use serde_json::json;

    const BASE: &str = "https://example.com/api/";

    fn global_headers() -> Value {
        json!({
            "required": ["content-type", "x-auth-email", "x-auth-key"],
            "properties": {
                "x-auth-email": {"type": "string", "example": "user@example.com"},
                "x-auth-key": {
                    "type": "string",
                    "example": "c2547eb745079dac9320b638f5e225cf483cc5cfdda41"
                },
                "content-type": {
                    "type": "string",
                    "enum": ["application/json"],
                    "example": "application/json"
                }
            },
            "example": {
                "x-auth-email": "user@example.com",
                "x-auth-key": "c2547eb745079dac9320b638f5e225cf483cc5cfdda41",
                "content-type": "application/json"
            }
        })
    }

    const GLOBAL_HEADERS_EXPECTED: &str = concat!(
        " \\\n     -H \"Content-Type: application/json\"",
        " \\\n     -H \"X-Auth-Email: user@example.com\"",
        " \\\n     -H \"X-Auth-Key: c2547eb745079dac9320b638f5e225cf483cc5cfdda41\""
    );

    fn attach(schema: &mut Value, global: Option<&Value>) {
        let mut curl = CurlExamples::new(schema, BASE, global);
        walk_schema(schema, &mut curl, &Vocabulary::doc()).unwrap();
    }

    #[test]
    fn defaulted_get_no_query_no_headers() {
        // An empty headerSchema suppresses the global headers.
        let mut schema = json!({
            "links": [{"href": "foos", "headerSchema": {}}]
        });
        attach(&mut schema, Some(&global_headers()));
        assert_eq!(
            schema["links"][0]["cfCurl"],
            json!(format!("curl -X GET \"{BASE}foos\""))
        );
    }

    #[test]
    fn get_with_query_string_and_global_headers() {
        let mut schema = json!({
            "links": [{
                "href": "foos",
                "method": "GET",
                "schema": {
                    "properties": {
                        "thing": {"example": "xyz"},
                        "stuff": {"example": 42}
                    },
                    "example": {"thing": "xyz", "stuff": 42}
                }
            }]
        });
        attach(&mut schema, Some(&global_headers()));
        assert_eq!(
            schema["links"][0]["cfCurl"],
            json!(format!(
                "curl -X GET \"{BASE}foos?stuff=42&thing=xyz\"{GLOBAL_HEADERS_EXPECTED}"
            ))
        );
    }

    #[test]
    fn delete_with_nothing_else() {
        // Lowercase methods are uppercased.
        let mut schema = json!({
            "links": [{"href": "deletable/thing", "method": "delete"}]
        });
        attach(&mut schema, None);
        assert_eq!(
            schema["links"][0]["cfCurl"],
            json!(format!("curl -X DELETE \"{BASE}deletable/thing\""))
        );
    }

    #[test]
    fn put_json_data_template_vars_and_override_headers() {
        let mut schema = json!({
            "links": [{
                "href": "foos/{foo}/bars/{bar}",
                "method": "PUT",
                "schema": {
                    "type": "object",
                    "properties": {
                        "x": {"example": 2},
                        "y": {"example": true}
                    },
                    "example": {"x": 2, "y": true}
                },
                "headerSchema": {
                    "properties": {"accept": {"example": "application/json"}},
                    "example": {"accept": "application/json"}
                }
            }],
            "example": {"foo": 123, "bar": 456}
        });
        attach(&mut schema, Some(&global_headers()));
        assert_eq!(
            schema["links"][0]["cfCurl"],
            json!(format!(
                "curl -X PUT \"{BASE}foos/123/bars/456\"\
                 \u{20}\\\n     -H \"Accept: application/json\"\
                 \u{20}\\\n     --data '{{\"x\":2,\"y\":true}}'"
            ))
        );
    }

    #[test]
    fn post_form_data() {
        let mut schema = json!({
            "links": [{
                "href": "postable",
                "method": "POST",
                "encType": "multipart/form-data",
                "schema": {
                    "type": "object",
                    "properties": {
                        "x": {"example": 2},
                        "y": {"example": true}
                    },
                    "example": {"x": 2, "y": true}
                }
            }]
        });
        attach(&mut schema, Some(&global_headers()));
        assert_eq!(
            schema["links"][0]["cfCurl"],
            json!(format!(
                "curl -X POST \"{BASE}postable\"{GLOBAL_HEADERS_EXPECTED}\
                 \u{20}\\\n     --form 'x=2;y=true'"
            ))
        );
    }

    #[test]
    fn unresolved_template_variable_stays_visible() {
        let mut schema = json!({
            "links": [{
                "href": "foos/{id}",
                "method": "GET",
                "schema": {
                    "properties": {"q": {"example": "z"}},
                    "example": {"q": "z"}
                },
                "headerSchema": {}
            }]
        });
        attach(&mut schema, None);
        assert_eq!(
            schema["links"][0]["cfCurl"],
            json!(format!("curl -X GET \"{BASE}foos/{{id}}?q=z\""))
        );
    }

    #[test]
    fn no_links_no_problem() {
        let mut schema = json!({});
        attach(&mut schema, Some(&global_headers()));
        assert_eq!(schema, json!({}));
    }

    #[test]
    fn hidden_links_and_hidden_roots_are_skipped() {
        let mut schema = json!({
            "links": [
                {"href": "public"},
                {"href": "secret", "cfPrivate": true}
            ]
        });
        attach(&mut schema, None);
        assert!(schema["links"][0].get("cfCurl").is_some());
        assert!(schema["links"][1].get("cfCurl").is_none());

        let mut schema = json!({
            "cfPrivate": true,
            "links": [{"href": "secret"}]
        });
        attach(&mut schema, None);
        assert!(schema["links"][0].get("cfCurl").is_none());
    }

    #[test]
    fn title_casing_headers() {
        assert_eq!(title_case_header("content-type"), "Content-Type");
        assert_eq!(title_case_header("x-auth-email"), "X-Auth-Email");
        assert_eq!(title_case_header("accept"), "Accept");
    }
}
