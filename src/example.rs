//! Bottom-up example synthesis.
//!
//! Runs as a post-order walk so every descendant has already had its
//! own roll-up attempted before a composite node assembles from them.
//! Nodes that already carry an `example` are left untouched, which
//! also makes the pass idempotent.

use serde_json::{Map, Value};

use crate::error::TransformError;
use crate::types::{get_subschema_mut, is_truthy, Step};
use crate::walker::Visitor;

/// The shape an example takes, inferred from a schema's declared
/// `type` and structural keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryType {
    /// One of several alternatives (`oneOf`/`anyOf`).
    Multi,
    Object,
    Array,
    /// Scalar or undetermined.
    Scalar,
}

/// Infer the example shape for a schema node.
///
/// The declared `type` wins (first element if a type array). A node
/// typed `object` or `array` without the corresponding structural
/// keywords, but with a `oneOf`/`anyOf`, is treated as multi-valued.
/// Without a declared `type`, the structural keywords themselves
/// decide.
pub fn infer_primary_type(schema: &Value) -> PrimaryType {
    let declared = match schema.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(types)) => types.first().and_then(Value::as_str),
        _ => None,
    };
    let object_keywords = ["properties", "patternProperties", "additionalProperties"]
        .iter()
        .any(|k| schema.get(*k).is_some());
    let array_keywords = schema.get("items").is_some();
    let alternatives = schema.get("oneOf").is_some() || schema.get("anyOf").is_some();

    match declared {
        Some("object") if !object_keywords && alternatives => PrimaryType::Multi,
        Some("object") => PrimaryType::Object,
        Some("array") if !array_keywords && alternatives => PrimaryType::Multi,
        Some("array") => PrimaryType::Array,
        Some(_) => PrimaryType::Scalar,
        None if object_keywords => PrimaryType::Object,
        None if array_keywords => PrimaryType::Array,
        None if alternatives => PrimaryType::Multi,
        None => PrimaryType::Scalar,
    }
}

/// A node marked private or omitted never contributes to examples.
pub(crate) fn is_hidden(schema: &Value) -> bool {
    schema.get("cfPrivate").map(is_truthy).unwrap_or(false)
        || schema.get("cfOmitFromExample").map(is_truthy).unwrap_or(false)
}

/// Adopt the first alternative that already carries an example,
/// scanning `oneOf` before `anyOf`.
fn multi_example(schema: &Value) -> Option<Value> {
    for keyword in ["oneOf", "anyOf"] {
        if let Some(members) = schema.get(keyword).and_then(Value::as_array) {
            for member in members {
                if let Some(example) = member.get("example") {
                    return Some(example.clone());
                }
            }
        }
    }
    None
}

/// Assemble an object example from the properties' examples, in
/// declaration order. A required property without an example makes
/// the whole example invalid, so nothing is produced in that case;
/// likewise an empty assembly produces no example at all.
fn object_example(schema: &Value) -> Option<Value> {
    let properties = schema.get("properties").and_then(Value::as_object)?;
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut example = Map::new();
    for (name, property) in properties {
        if is_hidden(property) {
            continue;
        }
        match property.get("example") {
            Some(value) => {
                example.insert(name.clone(), value.clone());
            }
            None if required.contains(&name.as_str()) => return None,
            None => {}
        }
    }
    if example.is_empty() {
        None
    } else {
        Some(Value::Object(example))
    }
}

/// Assemble an array example from `items` (and `additionalItems`),
/// padding with the trailing element's example up to `minItems`.
fn array_example(schema: &Value) -> Option<Value> {
    let min_items = schema
        .get("minItems")
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;

    let mut example = match schema.get("items")? {
        Value::Array(items) => {
            // Tuple form: every element must already have an example,
            // or the positions would not line up.
            let mut example = Vec::with_capacity(items.len());
            for item in items {
                example.push(item.get("example")?.clone());
            }
            if let Some(extra) = schema
                .get("additionalItems")
                .and_then(|item| item.get("example"))
            {
                example.push(extra.clone());
            }
            example
        }
        items => vec![items.get("example")?.clone()],
    };

    if let Some(pad) = example.last().cloned() {
        while example.len() < min_items {
            example.push(pad.clone());
        }
    }
    Some(Value::Array(example))
}

/// Roll up an example onto one schema node, if it lacks one and its
/// descendants supply enough material.
pub fn roll_up_example(schema: &mut Value) {
    if !schema.is_object() || schema.get("example").is_some() {
        return;
    }
    let example = match infer_primary_type(schema) {
        PrimaryType::Multi => multi_example(schema),
        PrimaryType::Object => object_example(schema),
        PrimaryType::Array => array_example(schema),
        PrimaryType::Scalar => schema.get("default").cloned(),
    };
    if let (Some(map), Some(example)) = (schema.as_object_mut(), example) {
        map.insert("example".to_string(), example);
    }
}

/// Post-visit callback applying [`roll_up_example`] to every node.
#[derive(Debug, Default)]
pub struct ExampleRollup;

impl Visitor for ExampleRollup {
    fn post(
        &mut self,
        owner: &mut Value,
        path: &[Step],
        _parent_path: &[Step],
    ) -> Result<(), TransformError> {
        if let Some(child) = get_subschema_mut(owner, path) {
            roll_up_example(child);
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

    #[test]
    fn primary_type_inference() {
        assert_eq!(
            infer_primary_type(&json!({"type": "object", "properties": {}})),
            PrimaryType::Object
        );
        assert_eq!(
            infer_primary_type(&json!({"type": ["array", "null"], "items": {}})),
            PrimaryType::Array
        );
        assert_eq!(
            infer_primary_type(&json!({"type": "object", "oneOf": [{}]})),
            PrimaryType::Multi
        );
        assert_eq!(
            infer_primary_type(&json!({"properties": {"a": {}}})),
            PrimaryType::Object
        );
        assert_eq!(infer_primary_type(&json!({"items": {}})), PrimaryType::Array);
        assert_eq!(
            infer_primary_type(&json!({"anyOf": [{}]})),
            PrimaryType::Multi
        );
        assert_eq!(infer_primary_type(&json!({"type": "string"})), PrimaryType::Scalar);
        assert_eq!(infer_primary_type(&json!({})), PrimaryType::Scalar);
    }

    #[test]
    fn existing_example_is_untouched() {
        let mut schema = json!({"type": "string", "default": "x", "example": "keep"});
        roll_up_example(&mut schema);
        assert_eq!(schema["example"], json!("keep"));
    }

    #[test]
    fn scalar_adopts_default() {
        let mut schema = json!({"type": "integer", "default": 7});
        roll_up_example(&mut schema);
        assert_eq!(schema["example"], json!(7));

        let mut schema = json!({"type": "integer"});
        roll_up_example(&mut schema);
        assert!(schema.get("example").is_none());
    }

    #[test]
    fn object_assembles_property_examples() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "id": {"example": 42},
                "name": {"example": "deleted"},
                "internal": {"cfOmitFromExample": true, "example": "secret"},
                "hidden": {"cfPrivate": true, "example": "secret"},
                "extra": {"type": "string"}
            }
        });
        roll_up_example(&mut schema);
        assert_eq!(schema["example"], json!({"id": 42, "name": "deleted"}));
    }

    #[test]
    fn required_property_without_example_aborts() {
        let mut schema = json!({
            "type": "object",
            "required": ["x"],
            "properties": {
                "x": {"type": "integer"},
                "y": {"example": 1}
            }
        });
        roll_up_example(&mut schema);
        assert!(schema.get("example").is_none());
    }

    #[test]
    fn empty_object_example_is_omitted() {
        let mut schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}}
        });
        roll_up_example(&mut schema);
        assert!(schema.get("example").is_none());
    }

    #[test]
    fn array_pads_to_min_items() {
        let mut schema = json!({"type": "array", "items": {"example": 42}, "minItems": 3});
        roll_up_example(&mut schema);
        assert_eq!(schema["example"], json!([42, 42, 42]));
    }

    #[test]
    fn tuple_items_require_every_example() {
        let mut schema = json!({
            "type": "array",
            "items": [{"example": 1}, {"example": "two"}],
            "additionalItems": {"example": true},
            "minItems": 5
        });
        roll_up_example(&mut schema);
        assert_eq!(schema["example"], json!([1, "two", true, true, true]));

        let mut schema = json!({
            "type": "array",
            "items": [{"example": 1}, {"type": "string"}]
        });
        roll_up_example(&mut schema);
        assert!(schema.get("example").is_none());
    }

    #[test]
    fn multi_takes_first_one_of_then_any_of() {
        let mut schema = json!({
            "oneOf": [{"type": "string"}, {"example": "b"}],
            "anyOf": [{"example": "c"}]
        });
        roll_up_example(&mut schema);
        assert_eq!(schema["example"], json!("b"));

        let mut schema = json!({
            "anyOf": [{"type": "string"}, {"example": "c"}]
        });
        roll_up_example(&mut schema);
        assert_eq!(schema["example"], json!("c"));
    }

    #[test]
    fn walk_rolls_up_bottom_up() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": {"type": "string", "default": "alpha"},
                    "minItems": 2
                },
                "id": {"type": "integer", "default": 9}
            }
        });
        let mut rollup = ExampleRollup;
        walk_schema(&mut schema, &mut rollup, &Vocabulary::doc()).unwrap();
        assert_eq!(
            schema["example"],
            json!({"tags": ["alpha", "alpha"], "id": 9})
        );
    }

    #[test]
    fn roll_up_is_idempotent() {
        let mut schema = json!({
            "type": "object",
            "properties": {"id": {"type": "integer", "default": 9}}
        });
        let mut rollup = ExampleRollup;
        walk_schema(&mut schema, &mut rollup, &Vocabulary::doc()).unwrap();
        let once = schema.clone();
        walk_schema(&mut schema, &mut rollup, &Vocabulary::doc()).unwrap();
        assert_eq!(schema, once);
    }
}
