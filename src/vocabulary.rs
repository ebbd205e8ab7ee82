//! Keyword vocabularies for schema traversal.
//!
//! A vocabulary maps each recognized keyword to the traversal strategy
//! the walker applies to its value, plus the set of Link Description
//! Object sub-keywords the draft treats as subschemas. Each draft's
//! table is built by copying the prior draft's table and applying named
//! overrides. Unrecognized keywords are opaque data to the walker.

use std::collections::HashMap;

use serde_json::Value;

/// How the walker descends into a keyword's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The value is a single subschema (`not`, `additionalProperties`, ...).
    Single,
    /// The value is an array of subschemas (`allOf`, `anyOf`, `oneOf`).
    Array,
    /// The value is either a single subschema or an array of them (`items`).
    SingleOrArray,
    /// The value is an object whose property values are subschemas
    /// (`properties`, `patternProperties`).
    Object,
    /// The value is an object whose property values may or may not be
    /// subschemas (`dependencies`, where string arrays are legal).
    MaybeObject,
    /// The value is a `links` array of LDOs; each LDO's recognized
    /// sub-keywords hold subschemas.
    Links,
}

/// A recognized JSON Schema draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draft {
    Draft4,
    Draft4Hyper,
    Draft6,
    Draft6Hyper,
    Draft7,
    Draft7Hyper,
}

impl Draft {
    /// Look up a draft from its `$schema` identifier.
    pub fn from_uri(uri: &str) -> Option<Draft> {
        match uri {
            "http://json-schema.org/draft-04/schema#" => Some(Draft::Draft4),
            "http://json-schema.org/draft-04/hyper-schema#" => Some(Draft::Draft4Hyper),
            "http://json-schema.org/draft-06/schema#" => Some(Draft::Draft6),
            "http://json-schema.org/draft-06/hyper-schema#" => Some(Draft::Draft6Hyper),
            "http://json-schema.org/draft-07/schema#" => Some(Draft::Draft7),
            "http://json-schema.org/draft-07/hyper-schema#" => Some(Draft::Draft7Hyper),
            _ => None,
        }
    }

    /// The `$schema` identifier for this draft.
    pub fn uri(&self) -> &'static str {
        match self {
            Draft::Draft4 => "http://json-schema.org/draft-04/schema#",
            Draft::Draft4Hyper => "http://json-schema.org/draft-04/hyper-schema#",
            Draft::Draft6 => "http://json-schema.org/draft-06/schema#",
            Draft::Draft6Hyper => "http://json-schema.org/draft-06/hyper-schema#",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema#",
            Draft::Draft7Hyper => "http://json-schema.org/draft-07/hyper-schema#",
        }
    }
}

/// An immutable keyword-to-strategy table plus the LDO sub-keywords
/// recognized under `links`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    table: HashMap<&'static str, Strategy>,
    ldo_keywords: Vec<&'static str>,
}

impl Vocabulary {
    /// Strategy for a keyword, if the vocabulary recognizes it.
    pub fn strategy(&self, keyword: &str) -> Option<Strategy> {
        self.table.get(keyword).copied()
    }

    /// LDO sub-keywords treated as subschemas by this vocabulary.
    pub fn ldo_keywords(&self) -> &[&'static str] {
        &self.ldo_keywords
    }

    /// Build a new vocabulary from this one with `other`'s entries
    /// overriding on keyword collision. If `other` processes links,
    /// its LDO keyword set replaces this one's.
    pub fn merge(&self, other: &Vocabulary) -> Vocabulary {
        let mut table = self.table.clone();
        for (k, v) in &other.table {
            table.insert(k, *v);
        }
        let ldo_keywords = if other.table.contains_key("links") {
            other.ldo_keywords.clone()
        } else {
            self.ldo_keywords.clone()
        };
        Vocabulary {
            table,
            ldo_keywords,
        }
    }

    /// The draft-04 core applicator keywords.
    pub fn draft4() -> Vocabulary {
        let table = HashMap::from([
            ("properties", Strategy::Object),
            ("patternProperties", Strategy::Object),
            ("additionalProperties", Strategy::Single),
            ("dependencies", Strategy::MaybeObject),
            ("items", Strategy::SingleOrArray),
            ("additionalItems", Strategy::Single),
            ("allOf", Strategy::Array),
            ("anyOf", Strategy::Array),
            ("oneOf", Strategy::Array),
            ("not", Strategy::Single),
        ]);
        Vocabulary {
            table,
            ldo_keywords: Vec::new(),
        }
    }

    /// draft-04 hyper-schema: core plus `links` with the `schema` and
    /// `targetSchema` LDO keywords.
    pub fn draft4_hyper() -> Vocabulary {
        let mut vocab = Self::draft4();
        vocab.table.insert("links", Strategy::Links);
        vocab.ldo_keywords = vec!["schema", "targetSchema"];
        vocab
    }

    /// draft-06: draft-04 plus `propertyNames`.
    pub fn draft6() -> Vocabulary {
        let mut vocab = Self::draft4();
        vocab.table.insert("propertyNames", Strategy::Single);
        vocab
    }

    /// draft-06 hyper-schema: `schema` is replaced by `hrefSchema` and
    /// `submissionSchema`.
    pub fn draft6_hyper() -> Vocabulary {
        let mut vocab = Self::draft6();
        vocab.table.insert("links", Strategy::Links);
        vocab.ldo_keywords = vec!["hrefSchema", "targetSchema", "submissionSchema"];
        vocab
    }

    /// draft-07: draft-06 plus the conditional applicators.
    pub fn draft7() -> Vocabulary {
        let mut vocab = Self::draft6();
        vocab.table.insert("if", Strategy::Single);
        vocab.table.insert("then", Strategy::Single);
        vocab.table.insert("else", Strategy::Single);
        vocab
    }

    /// draft-07 hyper-schema: draft-06 hyper plus `headerSchema`.
    pub fn draft7_hyper() -> Vocabulary {
        let mut vocab = Self::draft7();
        vocab.table.insert("links", Strategy::Links);
        vocab.ldo_keywords = vec![
            "hrefSchema",
            "targetSchema",
            "submissionSchema",
            "headerSchema",
        ];
        vocab
    }

    /// The documentation vocabulary: draft-04 applicators plus a
    /// `links` entry that tolerates every LDO schema keyword from any
    /// draft, so mixed-draft documents still traverse fully.
    pub fn doc() -> Vocabulary {
        let mut vocab = Self::draft4();
        vocab.table.insert("links", Strategy::Links);
        vocab.ldo_keywords = vec![
            "schema",
            "targetSchema",
            "hrefSchema",
            "submissionSchema",
            "headerSchema",
        ];
        vocab
    }

    /// Vocabulary for a known draft.
    pub fn for_draft(draft: Draft) -> Vocabulary {
        match draft {
            Draft::Draft4 => Self::draft4(),
            Draft::Draft4Hyper => Self::draft4_hyper(),
            Draft::Draft6 => Self::draft6(),
            Draft::Draft6Hyper => Self::draft6_hyper(),
            Draft::Draft7 => Self::draft7(),
            Draft::Draft7Hyper => Self::draft7_hyper(),
        }
    }
}

/// Select a vocabulary from a document's declared `$schema`, falling
/// back to the supplied vocabulary, or to the newest hyper-schema if
/// none is supplied.
pub fn select_vocabulary(schema: &Value, fallback: Option<Vocabulary>) -> Vocabulary {
    if let Some(uri) = schema.get("$schema").and_then(Value::as_str) {
        if let Some(draft) = Draft::from_uri(uri) {
            return Vocabulary::for_draft(draft);
        }
    }
    fallback.unwrap_or_else(Vocabulary::draft7_hyper)
}
