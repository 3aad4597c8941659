use json_patch::Patch;
use tracing::debug;
use virtmove_manifest::Document;

use crate::{
    error::{KubeApiError, Result},
    resource::ResourceKind,
};

/// Everything the transformations need from a cluster.
///
/// Every call is a single request, awaited before the next one is made. Nothing here retries,
/// a failure is returned to the caller as is.
#[allow(async_fn_in_trait)]
pub trait ClusterClient {
    /// Checks that the cluster is reachable with the current credentials.
    async fn status_check(&self) -> Result<()>;

    /// Fails with [`KubeApiError::NotFound`] when the object does not exist.
    async fn get(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<Document>;

    async fn get_all(&self, kind: ResourceKind, namespace: &str) -> Result<Vec<Document>>;

    /// Create or replace, the kind, name and namespace are taken from the manifest itself.
    async fn apply(&self, document: &Document) -> Result<()>;

    /// Submits a JSON patch against the live object.
    ///
    /// Needed where applying the whole manifest would not remove a field that is no longer
    /// declared, like a list of templates.
    async fn patch(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
        patch: Patch,
    ) -> Result<()>;

    async fn delete(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<()>;

    /// Applies `document` only when no object with its kind, name and namespace exists yet.
    ///
    /// Returns whether the object was created.
    async fn create_if_not_exists(&self, document: &Document) -> Result<bool> {
        let kind = ResourceKind::of(document)?;
        let name = document
            .name()
            .ok_or(KubeApiError::MissingField("metadata.name"))?;
        let namespace = document.namespace().unwrap_or_default();

        match self.get(kind, name, namespace).await {
            Ok(_) => {
                debug!(%kind, name, namespace, "object already exists, not creating");
                Ok(false)
            }
            Err(error) if error.is_not_found() => {
                self.apply(document).await?;
                Ok(true)
            }
            Err(error) => Err(error),
        }
    }
}
