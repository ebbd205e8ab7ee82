//! Transform JSON Hyper-Schema documents into documentation-ready form.
//!
//! API reference documentation is generated from dereferenced
//! hyper-schema documents (drafts 04 through 07, no `$ref`). This
//! crate provides the transformation passes that prepare such a
//! document for rendering, each one mutating the tree in place:
//!
//! - **Self-reference merging**: the `cfRecurse` sentinel inside link
//!   schemas is replaced with a trimmed copy of the root schema.
//! - **`allOf` collapsing**: composition used as glue is flattened
//!   into the parent schema under per-keyword merge rules.
//! - **Example roll-up**: object and array schemas without an
//!   `example` gain one assembled bottom-up from their properties'
//!   and items' examples.
//! - **Request synthesis**: every link gains a `cfCurl` string showing
//!   an example request built from the rolled-up examples.
//!
//! The passes are built on a generic vocabulary-driven schema walker,
//! which is also exported for custom transformations.
//!
//! # Example
//!
//! ```
//! use hyperdoc::{process_api_doc, TransformOptions};
//! use serde_json::json;
//!
//! let mut schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": {"type": "string", "example": "widget"}
//!     },
//!     "links": [
//!         {"title": "List", "rel": "collection", "href": "things"}
//!     ]
//! });
//!
//! let options = TransformOptions::new().base_uri("https://api.example.com/");
//! process_api_doc(&mut schema, &options)?;
//!
//! assert_eq!(schema["example"], json!({"name": "widget"}));
//! assert_eq!(
//!     schema["links"][0]["cfCurl"],
//!     json!("curl -X GET \"https://api.example.com/things\"")
//! );
//! # Ok::<(), hyperdoc::TransformError>(())
//! ```

pub mod collapse;
pub mod curl;
pub mod error;
pub mod example;
pub mod ldo;
pub mod loader;
pub mod pipeline;
pub mod recurse;
pub mod types;
pub mod vocabulary;
pub mod walker;

pub use collapse::{
    collapse_into, merge_doc_extensions, merge_draft4, merge_draft4_hyper, merge_vocabulary,
    AllOfCollapser, MergeRule, MergeVocabulary,
};
pub use curl::CurlExamples;
pub use error::{LoadError, TransformError};
pub use example::{infer_primary_type, roll_up_example, ExampleRollup, PrimaryType};
pub use ldo::{extract_ldo, extract_ldos, resolve_uri, LinkQuery};
pub use loader::{is_url, load_schema, load_schema_auto, load_schema_str};
#[cfg(feature = "remote")]
pub use loader::load_schema_url;
pub use pipeline::process_api_doc;
pub use recurse::merge_recurse;
pub use types::{
    format_path, get_subschema, get_subschema_mut, set_subschema, Step, TransformOptions,
};
pub use vocabulary::{select_vocabulary, Draft, Strategy, Vocabulary};
pub use walker::{walk_schema, walk_subschemas, PostVisit, PreVisit, Visitor};
