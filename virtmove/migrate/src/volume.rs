use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::ObjectMeta};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use virtmove_kube::{ClusterClient, ResourceKind};
use virtmove_manifest::Document;

use crate::error::{MigrateError, Result};

/// Where the VM declares its volumes.
pub const VOLUMES_PATH: &str = "spec.template.spec.volumes";

/// Where the VM declares the `DataVolume`s it owns.
pub const TEMPLATES_PATH: &str = "spec.dataVolumeTemplates";

/// Access mode requested for cloned claims.
pub const CLONE_ACCESS_MODE: &str = "ReadWriteOnce";

/// What backs a VM volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSource {
    /// `persistentVolumeClaim.claimName`
    DirectClaim(String),
    /// `dataVolume.name`, a `DataVolume` that populates (or populated) a claim.
    StorageImport(String),
}

/// One entry of [`VOLUMES_PATH`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeAttachment {
    /// Ties the volume to a disk of the VM domain, must survive any rewrite.
    pub name: String,
    pub source: VolumeSource,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVolume {
    name: String,
    persistent_volume_claim: Option<ClaimReference>,
    data_volume: Option<DataVolumeReference>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimReference {
    claim_name: String,
}

#[derive(Deserialize)]
struct DataVolumeReference {
    name: String,
}

impl TryFrom<&Value> for VolumeAttachment {
    type Error = MigrateError;

    fn try_from(volume: &Value) -> Result<Self> {
        let unknown = || MigrateError::UnknownVolumeShape(volume.clone());
        let raw = RawVolume::deserialize(volume).map_err(|_| unknown())?;

        let source = match (raw.persistent_volume_claim, raw.data_volume) {
            (Some(claim), _) => VolumeSource::DirectClaim(claim.claim_name),
            (None, Some(data_volume)) => VolumeSource::StorageImport(data_volume.name),
            (None, None) => return Err(unknown()),
        };

        Ok(VolumeAttachment {
            name: raw.name,
            source,
        })
    }
}

impl From<&VolumeAttachment> for Value {
    fn from(attachment: &VolumeAttachment) -> Self {
        match &attachment.source {
            VolumeSource::DirectClaim(claim) => json!({
                "name": attachment.name,
                "persistentVolumeClaim": { "claimName": claim },
            }),
            VolumeSource::StorageImport(data_volume) => json!({
                "name": attachment.name,
                "dataVolume": { "name": data_volume },
            }),
        }
    }
}

/// The part of a `DataVolume` status this tool looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeStatus {
    pub phase: Option<String>,
    /// Claim populated by the import, set once CDI created it.
    pub claim_name: Option<String>,
}

impl DataVolumeStatus {
    pub const SUCCEEDED: &'static str = "Succeeded";
    /// The import has not started, CDI waits for a consumer (the VM) to be scheduled.
    pub const PENDING_POPULATION: &'static str = "PendingPopulation";

    pub fn of(data_volume: &Document) -> Result<Self> {
        match data_volume.get_as("status") {
            Ok(status) => Ok(status),
            Err(error) if error.is_not_found() => Ok(DataVolumeStatus::default()),
            Err(error) => Err(error.into()),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.phase.as_deref() == Some(Self::SUCCEEDED)
    }

    pub fn is_pending_population(&self) -> bool {
        self.phase.as_deref() == Some(Self::PENDING_POPULATION)
    }

    pub fn phase(&self) -> &str {
        self.phase.as_deref().unwrap_or("Unknown")
    }
}

/// Reads the status of `datavolume/{name}`.
pub async fn data_volume_status<C>(
    client: &C,
    name: &str,
    namespace: &str,
) -> Result<DataVolumeStatus>
where
    C: ClusterClient,
{
    let data_volume = client.get(ResourceKind::DataVolume, name, namespace).await?;

    DataVolumeStatus::of(&data_volume)
}

/// Name of the claim populated by `datavolume/{name}`.
pub async fn imported_claim<C>(client: &C, name: &str, namespace: &str) -> Result<String>
where
    C: ClusterClient,
{
    data_volume_status(client, name, namespace)
        .await?
        .claim_name
        .ok_or_else(|| MigrateError::UnresolvedImport(name.to_owned()))
}

async fn claim_capacity<C>(client: &C, claim: &str, namespace: &str) -> Result<Quantity>
where
    C: ClusterClient,
{
    let claim_document = client
        .get(ResourceKind::PersistentVolumeClaim, claim, namespace)
        .await?;

    match claim_document.get_as("status.capacity.storage") {
        Ok(capacity) => Ok(capacity),
        Err(error) if error.is_not_found() => {
            Err(MigrateError::ClaimCapacityUnknown(claim.to_owned()))
        }
        Err(error) => Err(error.into()),
    }
}

/// Name of the `DataVolume` that clones `claim` out of `source_namespace`.
///
/// Only depends on its inputs, so running a clone twice yields the same templates.
pub fn clone_name(claim: &str, source_namespace: &str) -> String {
    format!("{claim}-{source_namespace}")
}

/// An entry of [`TEMPLATES_PATH`] that makes CDI clone an existing claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageTemplate {
    pub metadata: ObjectMeta,
    pub spec: StorageTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageTemplateSpec {
    pub storage: StorageRequest,
    pub source: CloneSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRequest {
    pub access_modes: Vec<String>,
    pub resources: StorageResources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageResources {
    pub requests: BTreeMap<String, Quantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneSource {
    pub pvc: ClaimSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSource {
    pub namespace: String,
    pub name: String,
}

impl StorageTemplate {
    pub fn clone_of(claim: &str, source_namespace: &str, capacity: Quantity) -> Self {
        StorageTemplate {
            metadata: ObjectMeta {
                name: Some(clone_name(claim, source_namespace)),
                ..Default::default()
            },
            spec: StorageTemplateSpec {
                storage: StorageRequest {
                    access_modes: vec![CLONE_ACCESS_MODE.to_owned()],
                    resources: StorageResources {
                        requests: BTreeMap::from([("storage".to_owned(), capacity)]),
                    },
                },
                source: CloneSource {
                    pvc: ClaimSource {
                        namespace: source_namespace.to_owned(),
                        name: claim.to_owned(),
                    },
                },
            },
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}

/// Result of [`resolve_clone_volumes`], both lists in the order of the source volumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClonedVolumes {
    pub volumes: Vec<VolumeAttachment>,
    pub templates: Vec<StorageTemplate>,
}

impl ClonedVolumes {
    pub fn volumes_value(&self) -> Value {
        Value::Array(self.volumes.iter().map(Value::from).collect())
    }

    pub fn templates_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.templates)?)
    }
}

/// Resolves every volume to the claim backing it and plans a clone of that claim.
///
/// All volumes are checked for a known shape before the cluster is asked anything, a single
/// unknown volume fails the whole VM.
#[tracing::instrument(level = "debug", skip(client, volumes), err)]
pub async fn resolve_clone_volumes<C>(
    client: &C,
    volumes: &[Value],
    source_namespace: &str,
) -> Result<ClonedVolumes>
where
    C: ClusterClient,
{
    let attachments = volumes
        .iter()
        .map(VolumeAttachment::try_from)
        .collect::<Result<Vec<_>>>()?;

    let mut cloned = ClonedVolumes {
        volumes: Vec::with_capacity(attachments.len()),
        templates: Vec::with_capacity(attachments.len()),
    };

    for attachment in attachments {
        let claim = match attachment.source {
            VolumeSource::DirectClaim(claim) => claim,
            VolumeSource::StorageImport(data_volume) => {
                imported_claim(client, &data_volume, source_namespace).await?
            }
        };

        let capacity = claim_capacity(client, &claim, source_namespace).await?;
        let template = StorageTemplate::clone_of(&claim, source_namespace, capacity);
        debug!(volume = %attachment.name, %claim, template = template.name(), "planned clone");

        cloned.volumes.push(VolumeAttachment {
            name: attachment.name,
            source: VolumeSource::StorageImport(template.name().to_owned()),
        });
        cloned.templates.push(template);
    }

    Ok(cloned)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use virtmove_kube::memory::InMemoryCluster;

    use super::*;
    use crate::testing::{cluster, data_volume, pvc};

    #[rstest]
    #[case(
        json!({ "name": "disk0", "persistentVolumeClaim": { "claimName": "data-pvc" } }),
        VolumeSource::DirectClaim("data-pvc".to_owned())
    )]
    #[case(
        json!({ "name": "disk0", "dataVolume": { "name": "fedora-dv" } }),
        VolumeSource::StorageImport("fedora-dv".to_owned())
    )]
    fn known_volume_shapes(#[case] volume: Value, #[case] source: VolumeSource) {
        let attachment = VolumeAttachment::try_from(&volume).unwrap();

        assert_eq!(attachment.name, "disk0");
        assert_eq!(attachment.source, source);
        assert_eq!(Value::from(&attachment), volume);
    }

    #[rstest]
    #[case(json!({ "other_field": "x", "name": "disk1" }))]
    #[case(json!({ "name": "cloudinit", "cloudInitNoCloud": { "userData": "#cloud-config" } }))]
    #[case(json!({ "persistentVolumeClaim": { "claimName": "no-name" } }))]
    #[case(json!({ "name": "disk0", "dataVolume": {} }))]
    #[case(json!("disk0"))]
    fn unknown_volume_shapes(#[case] volume: Value) {
        assert!(matches!(
            VolumeAttachment::try_from(&volume),
            Err(MigrateError::UnknownVolumeShape(reported)) if reported == volume
        ));
    }

    #[rstest]
    #[case("data-pvc", "ns-a", "data-pvc-ns-a")]
    #[case("fedora-root", "vms", "fedora-root-vms")]
    fn clone_names(#[case] claim: &str, #[case] namespace: &str, #[case] expected: &str) {
        assert_eq!(clone_name(claim, namespace), expected);
        assert_eq!(clone_name(claim, namespace), clone_name(claim, namespace));
    }

    #[rstest]
    fn template_manifest() {
        let template = StorageTemplate::clone_of("data-pvc", "ns-a", Quantity("10Gi".to_owned()));

        assert_eq!(
            serde_json::to_value(&template).unwrap(),
            json!({
                "metadata": { "name": "data-pvc-ns-a" },
                "spec": {
                    "storage": {
                        "accessModes": ["ReadWriteOnce"],
                        "resources": { "requests": { "storage": "10Gi" } }
                    },
                    "source": { "pvc": { "namespace": "ns-a", "name": "data-pvc" } }
                }
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn resolve_keeps_order_and_names(cluster: InMemoryCluster) {
        let volumes = vec![
            json!({ "name": "root", "dataVolume": { "name": "fedora-dv" } }),
            json!({ "name": "data", "persistentVolumeClaim": { "claimName": "data-pvc" } }),
        ];

        let cloned = resolve_clone_volumes(&cluster, &volumes, "ns-a")
            .await
            .unwrap();

        assert_eq!(
            cloned.volumes,
            vec![
                VolumeAttachment {
                    name: "root".to_owned(),
                    source: VolumeSource::StorageImport("fedora-root-ns-a".to_owned()),
                },
                VolumeAttachment {
                    name: "data".to_owned(),
                    source: VolumeSource::StorageImport("data-pvc-ns-a".to_owned()),
                },
            ]
        );
        assert_eq!(
            cloned
                .templates
                .iter()
                .map(StorageTemplate::name)
                .collect::<Vec<_>>(),
            vec!["fedora-root-ns-a", "data-pvc-ns-a"]
        );
        assert_eq!(
            cloned.templates[0].spec.storage.resources.requests["storage"],
            Quantity("30Gi".to_owned())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unresolved_import() {
        let cluster = InMemoryCluster::new().with_object(data_volume(
            "pending-dv",
            "ns-a",
            json!({ "phase": "PendingPopulation" }),
        ));
        let volumes = vec![json!({ "name": "root", "dataVolume": { "name": "pending-dv" } })];

        assert!(matches!(
            resolve_clone_volumes(&cluster, &volumes, "ns-a").await,
            Err(MigrateError::UnresolvedImport(name)) if name == "pending-dv"
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_shape_stops_before_any_lookup(cluster: InMemoryCluster) {
        let volumes = vec![
            json!({ "name": "data", "persistentVolumeClaim": { "claimName": "data-pvc" } }),
            json!({ "other_field": "x", "name": "disk1" }),
        ];

        assert!(matches!(
            resolve_clone_volumes(&cluster, &volumes, "ns-a").await,
            Err(MigrateError::UnknownVolumeShape(_))
        ));
        assert!(cluster.calls().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn claim_without_capacity() {
        let cluster = InMemoryCluster::new().with_object(pvc("unbound", "ns-a", None));
        let volumes =
            vec![json!({ "name": "data", "persistentVolumeClaim": { "claimName": "unbound" } })];

        assert!(matches!(
            resolve_clone_volumes(&cluster, &volumes, "ns-a").await,
            Err(MigrateError::ClaimCapacityUnknown(claim)) if claim == "unbound"
        ));
    }

    #[rstest]
    #[case(json!({ "phase": "Succeeded", "claimName": "x" }), true, false)]
    #[case(json!({ "phase": "PendingPopulation" }), false, true)]
    #[case(json!({ "phase": "ImportInProgress" }), false, false)]
    fn data_volume_phases(#[case] status: Value, #[case] succeeded: bool, #[case] pending: bool) {
        let status = DataVolumeStatus::of(&Document::new(data_volume("dv", "ns-a", status)))
            .unwrap();

        assert_eq!(status.is_succeeded(), succeeded);
        assert_eq!(status.is_pending_population(), pending);
    }

    #[rstest]
    fn data_volume_without_status() {
        let status = DataVolumeStatus::of(&Document::new(json!({
            "kind": "DataVolume",
            "metadata": { "name": "dv", "namespace": "ns-a" }
        })))
        .unwrap();

        assert_eq!(status, DataVolumeStatus::default());
        assert_eq!(status.phase(), "Unknown");
    }
}
