//! Generic traversal over schema trees.
//!
//! The walker visits every subschema reachable through the active
//! vocabulary's keywords, in keyword order then index/property
//! insertion order, calling a [`Visitor`] before and after descending
//! into each one.
//!
//! Callbacks receive the *owner* node mutably together with the
//! visited child's path inside it (one to three steps; empty for the
//! root visit, where the owner is the visited node itself). This lets
//! a pre callback mutate the child in place, or delete the keyword
//! entirely from the owner — when that happens the walker skips the
//! descent and the matching post call. Deleting a single LDO keyword
//! from a `links` entry is likewise supported. Any other removal
//! (such as deleting a whole array element or LDO) has undefined
//! results and is a documented limitation.

use serde_json::Value;

use crate::error::TransformError;
use crate::types::{get_subschema, get_subschema_mut, is_schema, json_type_name, Step};
use crate::vocabulary::{Strategy, Vocabulary};

/// Pre/post visit hooks for the walker. Both default to no-ops.
///
/// The visited subschema lives at `path` inside `owner`; fetch it with
/// [`get_subschema_mut`](crate::types::get_subschema_mut). `parent_path`
/// is the absolute path of `owner` from the walk's root.
pub trait Visitor {
    fn pre(
        &mut self,
        owner: &mut Value,
        path: &[Step],
        parent_path: &[Step],
    ) -> Result<(), TransformError> {
        let _ = (owner, path, parent_path);
        Ok(())
    }

    fn post(
        &mut self,
        owner: &mut Value,
        path: &[Step],
        parent_path: &[Step],
    ) -> Result<(), TransformError> {
        let _ = (owner, path, parent_path);
        Ok(())
    }
}

/// Adapter running a closure as a pre-visit callback.
pub struct PreVisit<F>(pub F);

impl<F> Visitor for PreVisit<F>
where
    F: FnMut(&mut Value, &[Step], &[Step]) -> Result<(), TransformError>,
{
    fn pre(
        &mut self,
        owner: &mut Value,
        path: &[Step],
        parent_path: &[Step],
    ) -> Result<(), TransformError> {
        (self.0)(owner, path, parent_path)
    }
}

/// Adapter running a closure as a post-visit callback.
pub struct PostVisit<F>(pub F);

impl<F> Visitor for PostVisit<F>
where
    F: FnMut(&mut Value, &[Step], &[Step]) -> Result<(), TransformError>,
{
    fn post(
        &mut self,
        owner: &mut Value,
        path: &[Step],
        parent_path: &[Step],
    ) -> Result<(), TransformError> {
        (self.0)(owner, path, parent_path)
    }
}

/// Outcome of applying the callbacks to one child. Keyword deletion is
/// an explicit outcome here rather than an error, so real errors stay
/// on the `Err` channel.
enum Applied {
    Continued,
    KeywordRemoved,
    LdoKeywordRemoved,
}

/// Walk the entire schema, including the root node itself.
pub fn walk_schema<V>(
    schema: &mut Value,
    visitor: &mut V,
    vocab: &Vocabulary,
) -> Result<(), TransformError>
where
    V: Visitor + ?Sized,
{
    visitor.pre(schema, &[], &[])?;
    walk_subschemas(schema, visitor, &[], vocab)?;
    visitor.post(schema, &[], &[])
}

/// Walk a schema's subschemas. The root node is NOT passed to the
/// callbacks; use [`walk_schema`] to include it.
pub fn walk_subschemas<V>(
    schema: &mut Value,
    visitor: &mut V,
    parent_path: &[Step],
    vocab: &Vocabulary,
) -> Result<(), TransformError>
where
    V: Visitor + ?Sized,
{
    if !is_schema(schema) {
        return Err(TransformError::InvalidSchemaNode {
            actual: json_type_name(schema),
        });
    }

    // Boolean schemas have no keywords to descend into.
    let Some(map) = schema.as_object() else {
        return Ok(());
    };

    // Snapshot the keyword list: callbacks may delete keywords from
    // this node while we iterate.
    let keywords: Vec<String> = map.keys().cloned().collect();

    for keyword in keywords {
        if schema.get(&keyword).is_none() {
            continue;
        }
        let Some(strategy) = vocab.strategy(&keyword) else {
            // Unrecognized keywords are opaque data.
            continue;
        };
        match strategy {
            Strategy::Single => {
                apply(schema, &[Step::from(keyword)], visitor, parent_path, vocab)?;
            }
            Strategy::Array => {
                process_array(schema, &keyword, visitor, parent_path, vocab)?;
            }
            Strategy::SingleOrArray => {
                let single = schema.get(&keyword).map(is_schema).unwrap_or(false);
                if single {
                    apply(schema, &[Step::from(keyword)], visitor, parent_path, vocab)?;
                } else {
                    process_array(schema, &keyword, visitor, parent_path, vocab)?;
                }
            }
            Strategy::Object => {
                process_object(schema, &keyword, false, visitor, parent_path, vocab)?;
            }
            Strategy::MaybeObject => {
                process_object(schema, &keyword, true, visitor, parent_path, vocab)?;
            }
            Strategy::Links => {
                process_links(schema, visitor, parent_path, vocab)?;
            }
        }
    }
    Ok(())
}

/// Apply callbacks to each schema in an array-valued keyword.
fn process_array<V>(
    schema: &mut Value,
    keyword: &str,
    visitor: &mut V,
    parent_path: &[Step],
    vocab: &Vocabulary,
) -> Result<(), TransformError>
where
    V: Visitor + ?Sized,
{
    let mut index = 0;
    loop {
        let len = match schema.get(keyword).and_then(Value::as_array) {
            Some(items) => items.len(),
            None => return Ok(()),
        };
        if index >= len {
            return Ok(());
        }
        let path = [Step::from(keyword), Step::from(index)];
        if let Applied::KeywordRemoved = apply(schema, &path, visitor, parent_path, vocab)? {
            return Ok(());
        }
        index += 1;
    }
}

/// Apply callbacks to each (maybe-)schema property of an object-valued
/// keyword, in insertion order.
fn process_object<V>(
    schema: &mut Value,
    keyword: &str,
    maybe: bool,
    visitor: &mut V,
    parent_path: &[Step],
    vocab: &Vocabulary,
) -> Result<(), TransformError>
where
    V: Visitor + ?Sized,
{
    let props: Vec<String> = match schema.get(keyword).and_then(Value::as_object) {
        Some(map) => map.keys().cloned().collect(),
        None => return Ok(()),
    };

    for prop in props {
        let Some(value) = schema.get(keyword).and_then(|v| v.get(&prop)) else {
            // The keyword (or this property) went away; if the whole
            // keyword is gone, stop.
            if schema.get(keyword).is_none() {
                return Ok(());
            }
            continue;
        };
        if maybe && !is_schema(value) {
            continue;
        }
        let path = [Step::from(keyword), Step::from(prop)];
        if let Applied::KeywordRemoved = apply(schema, &path, visitor, parent_path, vocab)? {
            return Ok(());
        }
    }
    Ok(())
}

/// Loop over the links and apply the callbacks to each LDO keyword the
/// vocabulary recognizes.
fn process_links<V>(
    schema: &mut Value,
    visitor: &mut V,
    parent_path: &[Step],
    vocab: &Vocabulary,
) -> Result<(), TransformError>
where
    V: Visitor + ?Sized,
{
    let mut index = 0;
    loop {
        let len = match schema.get("links").and_then(Value::as_array) {
            Some(links) => links.len(),
            None => return Ok(()),
        };
        if index >= len {
            return Ok(());
        }

        let ldo_keys: Vec<String> = match schema["links"][index].as_object() {
            Some(map) => map.keys().cloned().collect(),
            None => Vec::new(),
        };

        for key in ldo_keys {
            if !vocab.ldo_keywords().contains(&key.as_str()) {
                continue;
            }
            let path = [Step::from("links"), Step::from(index), Step::from(key)];
            if let Applied::KeywordRemoved = apply(schema, &path, visitor, parent_path, vocab)? {
                return Ok(());
            }
        }
        index += 1;
    }
}

/// Run the callbacks for one child and descend into it, unless the pre
/// callback deleted it.
fn apply<V>(
    owner: &mut Value,
    path: &[Step],
    visitor: &mut V,
    parent_path: &[Step],
    vocab: &Vocabulary,
) -> Result<Applied, TransformError>
where
    V: Visitor + ?Sized,
{
    visitor.pre(owner, path, parent_path)?;

    // Re-read: the pre callback may have mutated or deleted the child.
    if get_subschema(owner, path).is_none() {
        if path.first().and_then(Step::as_key) == Some("links") && owner.get("links").is_some() {
            // Deleting an LDO keyword is allowed. Deleting an entire
            // LDO is not, and is documented to produce undefined
            // behavior, so we do not check for it.
            return Ok(Applied::LdoKeywordRemoved);
        }
        return Ok(Applied::KeywordRemoved);
    }

    let extended: Vec<Step> = parent_path.iter().chain(path.iter()).cloned().collect();
    if let Some(child) = get_subschema_mut(owner, path) {
        walk_subschemas(child, visitor, &extended, vocab)?;
    }
    visitor.post(owner, path, parent_path)?;
    Ok(Applied::Continued)
}
