//! Error types for schema transformation and document loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while transforming a schema document.
///
/// These are authoring bugs in the schema composition, surfaced
/// immediately with the offending keyword and a JSON-pointer-style
/// path. None of them are retried.
#[derive(Debug, Error)]
pub enum TransformError {
    // Structural errors: something that is not a schema found in
    // schema position.
    #[error("expected object or boolean as schema, got {actual}")]
    InvalidSchemaNode { actual: &'static str },

    // Unsupported-construct errors.
    #[error("keyword \"{keyword}\" not supported at {path}")]
    UnsupportedKeyword { keyword: String, path: String },

    #[error("array form of \"items\" not supported at {path}")]
    ArrayItems { path: String },

    #[error("cannot collapse boolean schemas at {path}")]
    BooleanCollapse { path: String },

    #[error("unsupported template variable format '{token}'")]
    TemplateVariable { token: String },

    #[error("no href to resolve")]
    MissingHref,

    // Collision errors.
    #[error("collision for keyword \"{keyword}\" at {path}")]
    Collision { keyword: String, path: String },

    #[error("no merge rule registered for keyword \"{keyword}\" at {path}")]
    NoMergeRule { keyword: String, path: String },

    // Lookup errors.
    #[error("no link found for '{query}'")]
    NoMatchingLink { query: String },

    #[error("found duplicate links for '{query}'")]
    DuplicateLinks { query: String },
}

impl TransformError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        // Every transform error is a schema-authoring error.
        2
    }
}

/// Errors during schema document loading.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_error_messages() {
        let err = TransformError::UnsupportedKeyword {
            keyword: "additionalProperties".into(),
            path: "/allOf/0".into(),
        };
        assert_eq!(
            err.to_string(),
            "keyword \"additionalProperties\" not supported at /allOf/0"
        );

        let err = TransformError::Collision {
            keyword: "type".into(),
            path: "/properties/id".into(),
        };
        assert_eq!(
            err.to_string(),
            "collision for keyword \"type\" at /properties/id"
        );

        let err = TransformError::InvalidSchemaNode { actual: "array" };
        assert_eq!(
            err.to_string(),
            "expected object or boolean as schema, got array"
        );
    }

    #[test]
    fn transform_error_exit_codes() {
        let err = TransformError::MissingHref;
        assert_eq!(err.exit_code(), 2);
        let err = TransformError::NoMatchingLink {
            query: "{\"rel\":\"self\"}".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let bad = serde_json::from_str::<serde_json::Value>("{");
        let err = LoadError::InvalidJson {
            source: bad.unwrap_err(),
        };
        assert_eq!(err.exit_code(), 2);
    }
}
