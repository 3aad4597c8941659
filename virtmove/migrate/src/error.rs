use serde_json::Value;
use thiserror::Error;
use virtmove_kube::error::KubeApiError;
use virtmove_manifest::DocumentError;

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Kube(#[from] KubeApiError),

    /// A volume that is neither a `persistentVolumeClaim` nor a `dataVolume` reference.
    #[error("Unknown volume type: {0}")]
    UnknownVolumeShape(Value),

    #[error("datavolume/{0} has no `status.claimName`, its import never completed")]
    UnresolvedImport(String),

    #[error("persistentvolumeclaim/{0} has no `status.capacity.storage`")]
    ClaimCapacityUnknown(String),

    #[error("Failed to build manifest: {0}")]
    Serialization(#[from] serde_json::Error),
}
