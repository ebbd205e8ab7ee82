//! The full documentation pipeline.
//!
//! Processes a dereferenced (no `$ref`) hyper-schema into the form
//! the rendering layer consumes: self-references substituted, `allOf`
//! glue collapsed, examples rolled up bottom-up, and a `cfCurl`
//! example request attached to every link. draft-04 hyper-schema is
//! assumed when no `$schema` is declared, and the documentation
//! extension keywords are always recognized.

use serde_json::Value;

use crate::collapse::{merge_doc_extensions, AllOfCollapser};
use crate::curl::CurlExamples;
use crate::error::TransformError;
use crate::example::ExampleRollup;
use crate::recurse::merge_recurse;
use crate::types::TransformOptions;
use crate::vocabulary::{select_vocabulary, Draft, Vocabulary};
use crate::walker::walk_schema;

/// Run every pass over the document, mutating it in place.
///
/// A collapse that cannot complete (keyword collisions, unsupported
/// keyword interactions) is an authoring error in the source schema;
/// partially transformed output is not rolled back.
///
/// # Errors
///
/// Propagates the first error from any pass.
pub fn process_api_doc(
    schema: &mut Value,
    options: &TransformOptions,
) -> Result<(), TransformError> {
    let vocab =
        select_vocabulary(schema, Some(Vocabulary::draft4_hyper())).merge(&Vocabulary::doc());

    // Hrefs stay relative through the merge; the curl pass prepends
    // the base URI when it builds example request URLs.
    merge_recurse(schema, &TransformOptions::new(), &vocab)?;

    let draft_uri = schema
        .get("$schema")
        .and_then(Value::as_str)
        .unwrap_or(Draft::Draft4Hyper.uri())
        .to_string();
    let mut collapser = AllOfCollapser::new(&draft_uri, &[merge_doc_extensions()]);
    walk_schema(schema, &mut collapser, &vocab)?;

    let mut rollup = ExampleRollup;
    walk_schema(schema, &mut rollup, &vocab)?;

    // A separate walk: the root example must be complete before any
    // request URL is resolved, and the walker visits the root last.
    let mut curl = CurlExamples::new(
        schema,
        options.base_uri.as_deref().unwrap_or(""),
        options.global_header_schema.as_ref(),
    );
    walk_schema(schema, &mut curl, &vocab)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_document_pipeline() {
        let mut schema = json!({
            "id": "thing.json",
            "title": "Thing",
            "type": "object",
            "properties": {
                "id": {"type": "integer", "default": 1},
                "name": {"type": "string", "example": "widget"}
            },
            "required": ["id", "name"],
            "links": [
                {
                    "title": "Create Thing",
                    "rel": "collection",
                    "method": "POST",
                    "href": "things",
                    "schema": {"allOf": [{"cfRecurse": ""}]}
                },
                {
                    "title": "Fetch Thing",
                    "rel": "self",
                    "href": "things/{id}",
                    "headerSchema": {"example": {"accept": "application/json"}}
                }
            ]
        });
        let options = TransformOptions::new()
            .base_uri("https://api.example.com/")
            .global_header_schema(json!({
                "example": {"content-type": "application/json"}
            }));
        process_api_doc(&mut schema, &options).unwrap();

        // Self-reference substituted and allOf glue collapsed away.
        let request = &schema["links"][0]["schema"];
        assert!(request.get("allOf").is_none());
        assert!(request.get("cfRecurse").is_none());
        assert_eq!(request["type"], json!("object"));
        assert_eq!(request["required"], json!(["id", "name"]));
        assert_eq!(request["id"], json!("thing.json#/links/0/schema"));

        // Examples rolled up bottom-up.
        assert_eq!(schema["example"], json!({"id": 1, "name": "widget"}));
        assert_eq!(request["example"], json!({"id": 1, "name": "widget"}));

        // Request examples assembled from the processed document.
        assert_eq!(
            schema["links"][0]["cfCurl"],
            json!(
                "curl -X POST \"https://api.example.com/things\"\
                 \u{20}\\\n     -H \"Content-Type: application/json\"\
                 \u{20}\\\n     --data '{\"id\":1,\"name\":\"widget\"}'"
            )
        );
        assert_eq!(
            schema["links"][1]["cfCurl"],
            json!(
                "curl -X GET \"https://api.example.com/things/1\"\
                 \u{20}\\\n     -H \"Accept: application/json\""
            )
        );
    }

    #[test]
    fn document_without_links_still_gains_examples() {
        let mut schema = json!({
            "type": "object",
            "properties": {"a": {"default": "x"}}
        });
        process_api_doc(&mut schema, &TransformOptions::new()).unwrap();
        assert_eq!(schema["example"], json!({"a": "x"}));
    }

    #[test]
    fn collision_surfaces_from_the_collapse_pass() {
        let mut schema = json!({
            "type": "object",
            "allOf": [{"type": "string"}]
        });
        let err = process_api_doc(&mut schema, &TransformOptions::new());
        assert!(matches!(err, Err(TransformError::Collision { .. })));
    }
}
