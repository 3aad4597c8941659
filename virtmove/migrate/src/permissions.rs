use k8s_openapi::{
    api::rbac::v1::{ClusterRole, PolicyRule, RoleBinding, RoleRef, Subject},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
    Resource,
};
use tracing::info;
use virtmove_kube::ClusterClient;
use virtmove_manifest::Document;

use crate::error::Result;

/// ClusterRole allowing to read `DataVolume` sources, which CDI checks before cloning a claim
/// into another namespace.
pub const CLONER_ROLE_NAME: &str = "datavolume-cloner";

/// The service account of the destination namespace that CDI clones on behalf of.
pub const CLONER_SERVICE_ACCOUNT: &str = "default";

pub fn cloner_cluster_role() -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some(CLONER_ROLE_NAME.to_owned()),
            ..Default::default()
        },
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec!["cdi.kubevirt.io".to_owned()]),
            resources: Some(vec!["datavolumes/source".to_owned()]),
            verbs: vec!["*".to_owned()],
            ..Default::default()
        }]),
        ..Default::default()
    }
}

/// Binds [`CLONER_ROLE_NAME`] in `source_namespace` to the default service account of
/// `dest_namespace`.
pub fn cloner_role_binding(source_namespace: &str, dest_namespace: &str) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            name: Some(format!("{CLONER_ROLE_NAME}-{dest_namespace}")),
            namespace: Some(source_namespace.to_owned()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: ClusterRole::GROUP.to_owned(),
            kind: ClusterRole::KIND.to_owned(),
            name: CLONER_ROLE_NAME.to_owned(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_owned(),
            name: CLONER_SERVICE_ACCOUNT.to_owned(),
            namespace: Some(dest_namespace.to_owned()),
            ..Default::default()
        }]),
    }
}

/// Creates the cloner role and binding unless they already exist. Existing objects are left as
/// they are.
#[tracing::instrument(level = "debug", skip(client), err)]
pub async fn ensure_clone_permissions<C>(
    client: &C,
    source_namespace: &str,
    dest_namespace: &str,
) -> Result<()>
where
    C: ClusterClient,
{
    let role = Document::new(serde_json::to_value(cloner_cluster_role())?);
    if client.create_if_not_exists(&role).await? {
        info!(role = CLONER_ROLE_NAME, "created cluster role");
    }

    let binding = Document::new(serde_json::to_value(cloner_role_binding(
        source_namespace,
        dest_namespace,
    ))?);
    if client.create_if_not_exists(&binding).await? {
        info!(
            binding = binding.name(),
            namespace = source_namespace,
            "created role binding"
        );
    }

    Ok(())
}
