//! Self-reference merging.
//!
//! API documents refer back to their own resource definition with an
//! empty-pointer `cfRecurse` sentinel inside link request and response
//! schemas. This pass substitutes each sentinel with a deep copy of
//! the root schema, trimmed of `links` and `definitions` so that the
//! copies stay small (untrimmed substitution can balloon real-world
//! documents past a gigabyte).
//!
//! Only the whole-document sentinel inside LDO subschemas is handled.
//! Sentinels elsewhere, or with non-empty pointer values, have
//! undefined results and are a documented limitation.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::TransformError;
use crate::types::{get_subschema, get_subschema_mut, set_subschema, Step, TransformOptions};
use crate::vocabulary::Vocabulary;
use crate::walker::{walk_subschemas, PreVisit};

/// Matches any `{#/json/pointer}` style URI template variable.
fn pointer_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{#(?:/\w+)+\}").expect("literal pattern"))
}

/// Matches the supported form: exactly one level under `definitions`.
fn definition_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\{#/definitions/(\w+)\}$").expect("literal pattern"))
}

/// Scan every link href for `{#/definitions/<name>}` template
/// variables, drop definitions no href references, and drop the
/// `definitions` keyword entirely once empty (visual noise only at
/// that point).
///
/// # Errors
///
/// Pointer variables nested more than one level under `definitions`
/// are rejected, naming the offending token.
fn prune_definitions(schema: &mut Value) -> Result<(), TransformError> {
    let mut used: HashSet<String> = HashSet::new();
    if let Some(links) = schema.get("links").and_then(Value::as_array) {
        for ldo in links {
            let Some(href) = ldo.get("href").and_then(Value::as_str) else {
                continue;
            };
            for token in pointer_token_re().find_iter(href) {
                match definition_token_re().captures(token.as_str()) {
                    Some(caps) => {
                        used.insert(caps[1].to_string());
                    }
                    None => {
                        return Err(TransformError::TemplateVariable {
                            token: token.as_str().to_string(),
                        });
                    }
                }
            }
        }
    }

    if let Some(defs) = schema.get_mut("definitions").and_then(Value::as_object_mut) {
        defs.retain(|name, _| used.contains(name));
    }
    let emptied = schema
        .get("definitions")
        .and_then(Value::as_object)
        .map(Map::is_empty)
        .unwrap_or(false);
    if emptied {
        if let Some(map) = schema.as_object_mut() {
            map.remove("definitions");
        }
    }
    Ok(())
}

/// Substitute the document's self-reference sentinels, in place.
///
/// No-op if the document has no top-level `links`. Otherwise:
/// definitions are pruned to those referenced by link hrefs, nested
/// `links`/`definitions` are stripped from every subschema, each
/// link's `schema`/`targetSchema` gets a synthetic path-derived `id`
/// if it lacks one (so downstream tooling never sees two documents
/// with the same empty id), hrefs are prefixed with the base URI if
/// one is configured, and each `{"cfRecurse": ""}` subschema under
/// `links` is replaced by a copy of the trimmed root. Only `type` and
/// `required` declared alongside the sentinel survive into the
/// replacement; any other keyword there is dropped.
///
/// # Errors
///
/// Fails on malformed definition pointers in hrefs and on structural
/// errors encountered while walking.
pub fn merge_recurse(
    schema: &mut Value,
    options: &TransformOptions,
    vocab: &Vocabulary,
) -> Result<(), TransformError> {
    if schema.get("links").is_none() {
        return Ok(());
    }

    if schema.get("definitions").is_some() {
        prune_definitions(schema)?;
    }

    // The self-reference pattern is only supported at top level, so
    // nested links and definitions are dead weight in the output.
    let mut strip = PreVisit(
        |owner: &mut Value, path: &[Step], _: &[Step]| -> Result<(), TransformError> {
            if let Some(map) = get_subschema_mut(owner, path).and_then(Value::as_object_mut) {
                map.remove("links");
                map.remove("definitions");
            }
            Ok(())
        },
    );
    walk_subschemas(schema, &mut strip, &[], vocab)?;

    let root_id = schema
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    if let Some(links) = schema.get_mut("links").and_then(Value::as_array_mut) {
        for (index, ldo) in links.iter_mut().enumerate() {
            for field in ["schema", "targetSchema"] {
                if let Some(sub) = ldo.get_mut(field).and_then(Value::as_object_mut) {
                    // Multiple documents without ids (or with equal
                    // ids) would still produce identical link ids, so
                    // don't do that.
                    if !sub.contains_key("id") {
                        sub.insert(
                            "id".to_string(),
                            Value::String(format!("{root_id}#/links/{index}/{field}")),
                        );
                    }
                }
            }

            if let Some(base) = options.base_uri.as_deref() {
                // Plain concatenation rather than RFC 3986 reference
                // resolution, consistent with how the resulting URLs
                // are assembled everywhere else.
                if let Some(href) = ldo.get("href").and_then(Value::as_str) {
                    let full = format!("{base}{href}");
                    if let Some(map) = ldo.as_object_mut() {
                        map.insert("href".to_string(), Value::String(full));
                    }
                }
            }
        }
    }

    // Detach the links so the trimmed root cannot contain them, and so
    // the replacement walk never touches non-link subschemas.
    let links = match schema.as_object_mut().and_then(|m| m.remove("links")) {
        Some(links) => links,
        None => return Ok(()),
    };
    let mut trimmed = schema.clone();
    if let Some(map) = trimmed.as_object_mut() {
        map.remove("definitions");
    }

    let mut wrapper = Value::Object(Map::new());
    if let Some(map) = wrapper.as_object_mut() {
        map.insert("links".to_string(), links);
    }

    let mut replace = PreVisit(
        |owner: &mut Value, path: &[Step], _: &[Step]| -> Result<(), TransformError> {
            let sentinel = get_subschema(owner, path)
                .and_then(|child| child.get("cfRecurse"))
                .and_then(Value::as_str)
                == Some("");
            if !sentinel {
                return Ok(());
            }
            let mut merged = trimmed.clone();
            if let Some(child) = get_subschema(owner, path) {
                for keyword in ["type", "required"] {
                    if let (Some(out), Some(value)) = (merged.as_object_mut(), child.get(keyword)) {
                        out.insert(keyword.to_string(), value.clone());
                    }
                }
            }
            set_subschema(owner, path, merged);
            Ok(())
        },
    );
    walk_subschemas(&mut wrapper, &mut replace, &[], vocab)?;

    if let (Some(map), Some(links)) = (
        schema.as_object_mut(),
        wrapper.as_object_mut().and_then(|m| m.remove("links")),
    ) {
        map.insert("links".to_string(), links);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vocab() -> Vocabulary {
        Vocabulary::draft4_hyper().merge(&Vocabulary::doc())
    }

    #[test]
    fn no_links_is_a_no_op() {
        let mut schema = json!({
            "definitions": {"unused": {"type": "string"}},
            "properties": {"a": {"links": [{"href": "x"}]}}
        });
        let before = schema.clone();
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();
        assert_eq!(schema, before);
    }

    #[test]
    fn replaces_sentinel_with_trimmed_root() {
        let mut schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"],
            "links": [
                {"href": "things", "schema": {"cfRecurse": ""}}
            ]
        });
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();

        let merged = &schema["links"][0]["schema"];
        assert_eq!(merged["type"], json!("object"));
        assert_eq!(merged["required"], json!(["name"]));
        assert_eq!(merged["properties"]["name"], json!({"type": "string"}));
        // The copy carries no links of its own.
        assert!(merged.get("links").is_none());
        assert!(merged.get("cfRecurse").is_none());
    }

    #[test]
    fn sentinel_siblings_type_and_required_override() {
        let mut schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string"}},
            "links": [
                {
                    "href": "things",
                    "schema": {
                        "cfRecurse": "",
                        "type": ["object", "null"],
                        "required": [],
                        "title": "dropped"
                    }
                }
            ]
        });
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();

        let merged = &schema["links"][0]["schema"];
        assert_eq!(merged["type"], json!(["object", "null"]));
        assert_eq!(merged["required"], json!([]));
        // Other keywords alongside the sentinel are dropped.
        assert!(merged.get("title").is_none());
    }

    #[test]
    fn sentinel_nested_in_link_subschema() {
        let mut schema = json!({
            "title": "Thing",
            "links": [
                {
                    "href": "things",
                    "targetSchema": {
                        "properties": {
                            "result": {"cfRecurse": ""}
                        }
                    }
                }
            ]
        });
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();
        assert_eq!(
            schema["links"][0]["targetSchema"]["properties"]["result"]["title"],
            json!("Thing")
        );
    }

    #[test]
    fn prunes_unreferenced_definitions() {
        let mut schema = json!({
            "definitions": {
                "zone_identifier": {"type": "string"},
                "unused": {"type": "integer"}
            },
            "links": [
                {"href": "zones/{#/definitions/zone_identifier}/things"}
            ]
        });
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();
        assert_eq!(
            schema["definitions"],
            json!({"zone_identifier": {"type": "string"}})
        );
    }

    #[test]
    fn removes_definitions_when_all_pruned() {
        let mut schema = json!({
            "definitions": {"unused": {"type": "integer"}},
            "links": [{"href": "things"}]
        });
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();
        assert!(schema.get("definitions").is_none());
    }

    #[test]
    fn deep_definition_pointer_is_rejected() {
        let mut schema = json!({
            "definitions": {"a": {"properties": {"b": {}}}},
            "links": [{"href": "things/{#/definitions/a/b}"}]
        });
        let err = merge_recurse(&mut schema, &TransformOptions::new(), &vocab());
        match err {
            Err(TransformError::TemplateVariable { token }) => {
                assert_eq!(token, "{#/definitions/a/b}");
            }
            other => panic!("expected template variable error, got {:?}", other),
        }
    }

    #[test]
    fn strips_nested_links_and_definitions() {
        let mut schema = json!({
            "properties": {
                "a": {
                    "links": [{"href": "nested"}],
                    "definitions": {"x": {}},
                    "type": "object"
                }
            },
            "links": [{"href": "things"}]
        });
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();
        assert_eq!(schema["properties"]["a"], json!({"type": "object"}));
        // Top-level links survive.
        assert!(schema.get("links").is_some());
    }

    #[test]
    fn assigns_synthetic_ids() {
        let mut schema = json!({
            "id": "thing.json",
            "links": [
                {
                    "href": "things",
                    "schema": {"type": "object"},
                    "targetSchema": {"id": "explicit", "type": "object"}
                },
                {"href": "other", "schema": {}}
            ]
        });
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();
        assert_eq!(
            schema["links"][0]["schema"]["id"],
            json!("thing.json#/links/0/schema")
        );
        assert_eq!(schema["links"][0]["targetSchema"]["id"], json!("explicit"));
        assert_eq!(
            schema["links"][1]["schema"]["id"],
            json!("#/links/1/schema")
        );
    }

    #[test]
    fn prefixes_hrefs_with_base_uri() {
        let mut schema = json!({
            "links": [{"href": "things"}, {"href": "things/{#/definitions/identifier}"}],
            "definitions": {"identifier": {"type": "string"}}
        });
        let options = TransformOptions::new().base_uri("https://api.example.com/");
        merge_recurse(&mut schema, &options, &vocab()).unwrap();
        assert_eq!(schema["links"][0]["href"], json!("https://api.example.com/things"));
        assert_eq!(
            schema["links"][1]["href"],
            json!("https://api.example.com/things/{#/definitions/identifier}")
        );
    }

    #[test]
    fn non_empty_sentinel_is_left_alone() {
        let mut schema = json!({
            "links": [{"href": "things", "schema": {"cfRecurse": "#/definitions/x"}}]
        });
        merge_recurse(&mut schema, &TransformOptions::new(), &vocab()).unwrap();
        assert_eq!(
            schema["links"][0]["schema"],
            json!({"cfRecurse": "#/definitions/x", "id": "#/links/0/schema"})
        );
    }
}
