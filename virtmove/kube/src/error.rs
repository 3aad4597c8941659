use thiserror::Error;

use crate::resource::ResourceKind;

pub type Result<T, E = KubeApiError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum KubeApiError {
    #[error("Kube failed: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to infer Kube config: {0}")]
    InferKubeConfigError(#[from] kube::config::InferConfigError),

    #[error("Failed to load Kube config: {0}")]
    KubeConfigPathError(#[from] kube::config::KubeconfigError),

    #[error("Path expansion for kubeconfig failed: {0}")]
    ConfigPathExpansionError(String),

    #[error("{kind} `{name}` not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error("Manifest is missing `{0}`")]
    MissingField(&'static str),

    #[error("Unsupported resource kind `{0}`")]
    UnsupportedKind(String),

    #[error("Failed to convert between a kube object and a manifest: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to apply JSON patch: {0}")]
    InvalidPatch(#[from] json_patch::PatchError),
}

impl KubeApiError {
    /// Maps a 404 from the API server to [`KubeApiError::NotFound`], so callers can tell a missing
    /// object apart from an unreachable cluster.
    pub(crate) fn from_lookup(error: kube::Error, kind: ResourceKind, name: &str) -> Self {
        match error {
            kube::Error::Api(response) if response.code == 404 => KubeApiError::NotFound {
                kind,
                name: name.to_owned(),
            },
            other => KubeApiError::KubeError(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeApiError::NotFound { .. })
    }
}
