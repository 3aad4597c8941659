use std::{fmt, str::FromStr};

use k8s_openapi::{
    api::{
        core::v1::PersistentVolumeClaim,
        rbac::v1::{ClusterRole, RoleBinding},
    },
    Resource,
};
use kube::api::{ApiResource, GroupVersionKind};
use virtmove_manifest::Document;

use crate::error::{KubeApiError, Result};

const KUBEVIRT_GROUP: &str = "kubevirt.io";
const KUBEVIRT_VERSION: &str = "v1";
const CDI_GROUP: &str = "cdi.kubevirt.io";
const CDI_VERSION: &str = "v1beta1";

/// The cluster resources this tool reads or writes.
///
/// KubeVirt and CDI types are not part of `k8s-openapi`, so everything goes through
/// [`kube::api::DynamicObject`] and this enum carries the [`ApiResource`] for each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// `virtualmachines.kubevirt.io`
    VirtualMachine,
    /// `datavolumes.cdi.kubevirt.io`, the "storage import" that populates a claim.
    DataVolume,
    PersistentVolumeClaim,
    ClusterRole,
    RoleBinding,
}

impl ResourceKind {
    pub fn kind(self) -> &'static str {
        match self {
            ResourceKind::VirtualMachine => "VirtualMachine",
            ResourceKind::DataVolume => "DataVolume",
            ResourceKind::PersistentVolumeClaim => PersistentVolumeClaim::KIND,
            ResourceKind::ClusterRole => ClusterRole::KIND,
            ResourceKind::RoleBinding => RoleBinding::KIND,
        }
    }

    pub fn api_resource(self) -> ApiResource {
        match self {
            ResourceKind::VirtualMachine => ApiResource::from_gvk_with_plural(
                &GroupVersionKind::gvk(KUBEVIRT_GROUP, KUBEVIRT_VERSION, self.kind()),
                "virtualmachines",
            ),
            ResourceKind::DataVolume => ApiResource::from_gvk_with_plural(
                &GroupVersionKind::gvk(CDI_GROUP, CDI_VERSION, self.kind()),
                "datavolumes",
            ),
            ResourceKind::PersistentVolumeClaim => ApiResource::erase::<PersistentVolumeClaim>(&()),
            ResourceKind::ClusterRole => ApiResource::erase::<ClusterRole>(&()),
            ResourceKind::RoleBinding => ApiResource::erase::<RoleBinding>(&()),
        }
    }

    /// Cluster scoped kinds ignore the namespace they are requested with.
    pub fn is_namespaced(self) -> bool {
        !matches!(self, ResourceKind::ClusterRole)
    }

    /// Kind of a manifest, read from its `kind` field.
    pub fn of(document: &Document) -> Result<Self> {
        document
            .kind()
            .ok_or(KubeApiError::MissingField("kind"))?
            .parse()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

impl FromStr for ResourceKind {
    type Err = KubeApiError;

    /// Accepts the kind name as well as the short names `kubectl` knows these kinds by.
    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind.to_ascii_lowercase().as_str() {
            "virtualmachine" | "vm" | "vms" => Ok(ResourceKind::VirtualMachine),
            "datavolume" | "dv" | "dvs" => Ok(ResourceKind::DataVolume),
            "persistentvolumeclaim" | "pvc" | "pvcs" => Ok(ResourceKind::PersistentVolumeClaim),
            "clusterrole" => Ok(ResourceKind::ClusterRole),
            "rolebinding" => Ok(ResourceKind::RoleBinding),
            _ => Err(KubeApiError::UnsupportedKind(kind.to_owned())),
        }
    }
}
