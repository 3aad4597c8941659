use thiserror::Error;

pub type Result<T, E = DocumentError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Only [`Document::get`](crate::Document::get) and friends report this, deletion treats a
    /// missing path as already deleted.
    #[error("Path `{path}` not found in manifest, missing segment `{segment}`")]
    PathNotFound { path: String, segment: String },

    #[error("Value at `{path}` has an unexpected shape: {source}")]
    UnexpectedShape {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DocumentError {
    pub(crate) fn path_not_found(path: &str, segment: &str) -> Self {
        DocumentError::PathNotFound {
            path: path.to_owned(),
            segment: segment.to_owned(),
        }
    }

    /// Whether this is a [`DocumentError::PathNotFound`], for callers that treat an absent field
    /// as an empty one.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::PathNotFound { .. })
    }
}
