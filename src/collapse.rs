//! `allOf` collapsing.
//!
//! Flattens `allOf` arrays into their parent schema using a per-keyword
//! merge vocabulary. All merge functions modify the supplied parent in
//! place and never modify the subschema, in keeping with the walker's
//! in-place mutation contract (copies of large documents are what this
//! crate exists to avoid).

use std::collections::HashMap;

use serde_json::Value;

use crate::error::TransformError;
use crate::types::{format_path, get_subschema_mut, is_truthy, json_type_name, Step};
use crate::vocabulary::Draft;
use crate::walker::Visitor;

/// How two occurrences of the same keyword are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Values must already be deep-equal, else error.
    Collision,
    /// The subschema's value is discarded. Explicit rather than a
    /// missing entry, so the vocabulary reads as a closed set.
    ParentWins,
    /// Logical OR of the two values.
    Or,
    /// Set union of two arrays, de-duplicated by deep equality,
    /// parent's order first.
    ArrayUnion,
    /// Per-property recursive collapse of an object of subschemas.
    Properties,
    /// Recursive collapse of a single-subschema `items`.
    Items,
    /// Any use of this keyword fails the whole collapse.
    NotSupported,
}

/// Keyword-to-merge-rule table.
pub type MergeVocabulary = HashMap<&'static str, MergeRule>;

/// Merge rules for the draft-04 core keywords.
///
/// Several collision entries could in principle be merged more
/// cleverly (e.g. taking the stricter of two `maximum`s); for
/// documentation purposes requiring equality is sufficient and keeps
/// surprises out of the rendered schema.
pub fn merge_draft4() -> MergeVocabulary {
    HashMap::from([
        ("type", MergeRule::Collision),
        ("enum", MergeRule::Collision),
        ("minimum", MergeRule::Collision),
        ("maximum", MergeRule::Collision),
        ("exclusiveMinimum", MergeRule::Collision),
        ("exclusiveMaximum", MergeRule::Collision),
        ("multipleOf", MergeRule::Collision),
        ("minLength", MergeRule::Collision),
        ("maxLength", MergeRule::Collision),
        ("pattern", MergeRule::Collision),
        ("items", MergeRule::Items),
        ("additionalItems", MergeRule::NotSupported),
        ("minItems", MergeRule::Collision),
        ("maxItems", MergeRule::Collision),
        ("uniqueItems", MergeRule::Or),
        ("properties", MergeRule::Properties),
        ("patternProperties", MergeRule::Properties),
        ("additionalProperties", MergeRule::NotSupported),
        ("dependencies", MergeRule::Collision),
        ("required", MergeRule::ArrayUnion),
        ("minProperties", MergeRule::Collision),
        ("maxProperties", MergeRule::Collision),
        // "allOf" is handled separately by the collapse callback, but
        // if one is seen here, parent-wins is effectively a no-op.
        ("allOf", MergeRule::ParentWins),
        ("anyOf", MergeRule::Collision),
        ("oneOf", MergeRule::Collision),
        ("not", MergeRule::Collision),
        ("title", MergeRule::ParentWins),
        ("description", MergeRule::ParentWins),
        ("default", MergeRule::ParentWins),
        ("format", MergeRule::Collision),
        // Nested definitions only make sense once $refs are
        // dereferenced, which is a precondition here, so dropping the
        // subschema's copy is fine.
        ("definitions", MergeRule::ParentWins),
        ("id", MergeRule::ParentWins),
        // $refs must be dereferenced before collapsing.
        ("$ref", MergeRule::NotSupported),
    ])
}

/// Merge rules for draft-04 hyper-schema: core plus the link keywords.
pub fn merge_draft4_hyper() -> MergeVocabulary {
    let mut vocab = merge_draft4();
    vocab.extend([
        ("links", MergeRule::ArrayUnion),
        ("readOnly", MergeRule::Or),
        ("media", MergeRule::Collision),
        ("pathStart", MergeRule::NotSupported),
        ("fragmentResolution", MergeRule::NotSupported),
    ]);
    vocab
}

/// Merge rules for the documentation extension keywords.
pub fn merge_doc_extensions() -> MergeVocabulary {
    HashMap::from([
        ("$comment", MergeRule::ParentWins),
        ("example", MergeRule::ParentWins),
        ("cfPrivate", MergeRule::Or),
        ("cfOmitFromExample", MergeRule::Or),
        ("cfExtendedDescription", MergeRule::ParentWins),
        ("cfNotes", MergeRule::ParentWins),
        ("cfLinkErrors", MergeRule::ArrayUnion),
        ("cfSectionNotes", MergeRule::ArrayUnion),
        // The self-reference sentinel must always be merged away
        // before collapsing.
        ("cfRecurse", MergeRule::NotSupported),
    ])
}

/// Build the merge vocabulary for a declared `$schema`, extended by
/// any additional vocabularies. Later tables override earlier ones on
/// keyword collision.
///
/// Hyper-schema identifiers select the hyper table; plain schema
/// identifiers the core table. The tabled keywords carry the same
/// collapse semantics in draft-06 and draft-07, so all recognized
/// drafts share the draft-04 rules.
pub fn merge_vocabulary(schema_uri: &str, extensions: &[MergeVocabulary]) -> MergeVocabulary {
    let mut vocab = match Draft::from_uri(schema_uri) {
        Some(Draft::Draft4) | Some(Draft::Draft6) | Some(Draft::Draft7) => merge_draft4(),
        Some(Draft::Draft4Hyper) | Some(Draft::Draft6Hyper) | Some(Draft::Draft7Hyper) => {
            merge_draft4_hyper()
        }
        None => MergeVocabulary::new(),
    };
    for extension in extensions {
        vocab.extend(extension.iter().map(|(k, v)| (*k, *v)));
    }
    vocab
}

/// Merge `subschema`'s keywords into `parent` in place, to whatever
/// extent the vocabulary allows.
///
/// # Errors
///
/// Boolean-schema collapses that would have to change the parent's
/// JSON type, keyword collisions without a defined resolution, and
/// unsupported keyword interactions are all fatal; the error names the
/// keyword and path.
pub fn collapse_into(
    parent: &mut Value,
    parent_path: &[Step],
    subschema: &Value,
    vocab: &MergeVocabulary,
) -> Result<(), TransformError> {
    let parent_bool = parent.as_bool();
    let sub_bool = subschema.as_bool();

    if parent_bool == Some(true) || (parent_bool != Some(false) && sub_bool == Some(false)) {
        // In-place mutation cannot turn an object schema into `false`
        // or grow keywords onto a bare `true`.
        return Err(TransformError::BooleanCollapse {
            path: format_path(parent_path),
        });
    }
    if parent_bool == Some(false) || sub_bool == Some(true) {
        // Either the parent is already fully constrained, or the
        // subschema adds no constraints. Nothing to do.
        return Ok(());
    }

    if !subschema.is_object() {
        return Err(TransformError::InvalidSchemaNode {
            actual: json_type_name(subschema),
        });
    }
    if !parent.is_object() {
        return Err(TransformError::InvalidSchemaNode {
            actual: json_type_name(parent),
        });
    }

    // NOTE: $ref and cfRecurse must be pre-processed out first.
    let keywords: Vec<String> = subschema
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();

    for keyword in keywords {
        if parent.get(&keyword).is_none() {
            // Present only in the subschema: copy onto the parent.
            if let (Some(map), Some(value)) = (parent.as_object_mut(), subschema.get(&keyword)) {
                map.insert(keyword, value.clone());
            }
            continue;
        }
        match vocab.get(keyword.as_str()).copied() {
            Some(rule) => apply_rule(rule, parent, parent_path, subschema, vocab, &keyword)?,
            None => {
                // Both sides declare a keyword the vocabulary has no
                // rule for: fail closed rather than guess.
                return Err(TransformError::NoMergeRule {
                    keyword,
                    path: format_path(parent_path),
                });
            }
        }
    }
    Ok(())
}

fn apply_rule(
    rule: MergeRule,
    parent: &mut Value,
    parent_path: &[Step],
    subschema: &Value,
    vocab: &MergeVocabulary,
    keyword: &str,
) -> Result<(), TransformError> {
    match rule {
        MergeRule::ParentWins => Ok(()),

        MergeRule::Collision => {
            if parent.get(keyword) != subschema.get(keyword) {
                return Err(TransformError::Collision {
                    keyword: keyword.to_string(),
                    path: format_path(parent_path),
                });
            }
            Ok(())
        }

        MergeRule::Or => {
            let parent_truthy = parent.get(keyword).map(is_truthy).unwrap_or(false);
            if !parent_truthy {
                if let (Some(map), Some(value)) =
                    (parent.as_object_mut(), subschema.get(keyword))
                {
                    map.insert(keyword.to_string(), value.clone());
                }
            }
            Ok(())
        }

        MergeRule::ArrayUnion => {
            let mut union: Vec<Value> = parent
                .get(keyword)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if let Some(extra) = subschema.get(keyword).and_then(Value::as_array) {
                for item in extra {
                    if !union.contains(item) {
                        union.push(item.clone());
                    }
                }
            }
            if let Some(map) = parent.as_object_mut() {
                map.insert(keyword.to_string(), Value::Array(union));
            }
            Ok(())
        }

        MergeRule::Properties => collapse_object_of_schemas(parent, parent_path, subschema, vocab, keyword),

        MergeRule::Items => collapse_items(parent, parent_path, subschema, vocab, keyword),

        MergeRule::NotSupported => Err(TransformError::UnsupportedKeyword {
            keyword: keyword.to_string(),
            path: format_path(parent_path),
        }),
    }
}

/// Per-property recursive collapse for `properties` and
/// `patternProperties`.
///
/// The interactions among `properties`, `patternProperties` and
/// `additionalProperties` are complex; collapsing in the presence of
/// `additionalProperties` is unsupported.
fn collapse_object_of_schemas(
    parent: &mut Value,
    parent_path: &[Step],
    subschema: &Value,
    vocab: &MergeVocabulary,
    keyword: &str,
) -> Result<(), TransformError> {
    if parent.get("additionalProperties").is_some() || subschema.get("additionalProperties").is_some()
    {
        return Err(TransformError::UnsupportedKeyword {
            keyword: "additionalProperties".to_string(),
            path: format_path(parent_path),
        });
    }

    let props: Vec<String> = subschema
        .get(keyword)
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();

    for prop in props {
        let Some(sub_child) = subschema.get(keyword).and_then(|v| v.get(&prop)) else {
            continue;
        };
        let parent_has = parent
            .get(keyword)
            .and_then(|v| v.get(&prop))
            .is_some();
        if parent_has {
            // Both sides declare the property: collapse them.
            let child_path: Vec<Step> = parent_path
                .iter()
                .cloned()
                .chain([Step::from(keyword), Step::Key(prop.clone())])
                .collect();
            if let Some(parent_child) = parent.get_mut(keyword).and_then(|v| v.get_mut(&prop)) {
                collapse_into(parent_child, &child_path, sub_child, vocab)?;
            }
        } else if let Some(map) = parent.get_mut(keyword).and_then(Value::as_object_mut) {
            // Only in the subschema: add it to the parent.
            map.insert(prop, sub_child.clone());
        }
    }
    Ok(())
}

/// Recursive collapse for `items`.
///
/// Array-form `items` and the `additionalItems` interaction are
/// unsupported; properly handling them would also allow collapsing
/// when one side is an array and the other a single schema.
fn collapse_items(
    parent: &mut Value,
    parent_path: &[Step],
    subschema: &Value,
    vocab: &MergeVocabulary,
    keyword: &str,
) -> Result<(), TransformError> {
    if parent.get("additionalItems").is_some() || subschema.get("additionalItems").is_some() {
        return Err(TransformError::UnsupportedKeyword {
            keyword: "additionalItems".to_string(),
            path: format_path(parent_path),
        });
    }
    let parent_is_array = parent.get(keyword).map(Value::is_array).unwrap_or(false);
    let sub_is_array = subschema.get(keyword).map(Value::is_array).unwrap_or(false);
    if parent_is_array || sub_is_array {
        return Err(TransformError::ArrayItems {
            path: format_path(parent_path),
        });
    }

    let child_path: Vec<Step> = parent_path
        .iter()
        .cloned()
        .chain([Step::from(keyword)])
        .collect();
    if let (Some(parent_child), Some(sub_child)) = (parent.get_mut(keyword), subschema.get(keyword))
    {
        collapse_into(parent_child, &child_path, sub_child, vocab)?;
    }
    Ok(())
}

/// Post-visit callback that flattens each visited subschema's `allOf`
/// into the subschema itself, then deletes the `allOf` keyword.
///
/// Run post-order so that members' own `allOf`s are already collapsed
/// by the time their parent is processed.
pub struct AllOfCollapser {
    vocab: MergeVocabulary,
}

impl AllOfCollapser {
    /// Build a collapser for the given `$schema` identifier plus any
    /// extension vocabularies (e.g. [`merge_doc_extensions`]).
    pub fn new(schema_uri: &str, extensions: &[MergeVocabulary]) -> Self {
        Self {
            vocab: merge_vocabulary(schema_uri, extensions),
        }
    }

    /// Build a collapser over an explicit merge vocabulary.
    pub fn with_vocabulary(vocab: MergeVocabulary) -> Self {
        Self { vocab }
    }
}

impl Visitor for AllOfCollapser {
    fn post(
        &mut self,
        owner: &mut Value,
        path: &[Step],
        parent_path: &[Step],
    ) -> Result<(), TransformError> {
        let full: Vec<Step> = parent_path.iter().chain(path.iter()).cloned().collect();
        let Some(child) = get_subschema_mut(owner, path) else {
            return Ok(());
        };
        if child.get("allOf").is_none() {
            return Ok(());
        }

        // The visited subschema itself is the running parent of the
        // fold. Members are read-only; clone them out so the fold can
        // mutate the subschema freely.
        let members: Vec<Value> = child
            .get("allOf")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for member in &members {
            collapse_into(child, &full, member, &self.vocab)?;
        }
        if let Some(map) = child.as_object_mut() {
            map.remove("allOf");
        }
        Ok(())
    }
}
