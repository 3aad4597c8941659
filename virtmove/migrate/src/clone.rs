use serde_json::{json, Value};
use tracing::{info, warn};
use virtmove_kube::{ClusterClient, ResourceKind};
use virtmove_manifest::Document;
use virtmove_progress::{messages::PRESERVE_MAC_HINT, Progress};

use crate::{
    context::TransformContext,
    error::Result,
    permissions::ensure_clone_permissions,
    volume::{resolve_clone_volumes, TEMPLATES_PATH, VOLUMES_PATH},
};

/// The run strategy of a fresh clone, so it does not start before its disks are cloned.
pub const CLONE_RUN_STRATEGY: &str = "Halted";

/// Turns `vm` into a manifest that re-creates it in `context.dest_namespace`, on new storage
/// cloned from the claims it uses in `context.source_namespace`.
///
/// The edits run in a fixed order, and the cluster is only read, never written.
#[tracing::instrument(level = "debug", skip(client, vm, progress), fields(vm = %context.name), err)]
pub async fn clone_to_namespace<C, P>(
    client: &C,
    mut vm: Document,
    context: &TransformContext,
    progress: &P,
) -> Result<Document>
where
    C: ClusterClient,
    P: Progress,
{
    vm.delete("status");
    vm.delete("spec.preference.revisionName");
    vm.set(
        "metadata",
        json!({ "name": context.name, "namespace": context.dest_namespace }),
    );

    if context.preserve_mac {
        progress.warning(PRESERVE_MAC_HINT);
    } else {
        vm.delete_any("macAddress");
    }

    vm.delete("spec.template.spec.running");
    vm.set("spec.template.spec.runStrategy", CLONE_RUN_STRATEGY);

    let volumes: Vec<Value> = vm.get_as(VOLUMES_PATH)?;
    let cloned = resolve_clone_volumes(client, &volumes, &context.source_namespace).await?;

    vm.set(VOLUMES_PATH, cloned.volumes_value());
    vm.set(TEMPLATES_PATH, cloned.templates_value()?);

    Ok(vm)
}

/// Result of cloning one VM of a [`NamespaceClone`].
#[derive(Debug)]
pub struct ClonedVm {
    pub name: String,
    pub result: Result<Document>,
}

/// Clones the VMs of a namespace into another one, one VM at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceClone {
    pub source_namespace: String,
    pub dest_namespace: String,
    /// Only clone the VM with this name.
    pub name: Option<String>,
    pub preserve_mac: bool,
    /// Do not create the RBAC objects CDI needs to clone claims across namespaces.
    pub skip_permissions: bool,
}

impl NamespaceClone {
    pub fn new<S, D>(source_namespace: S, dest_namespace: D) -> Self
    where
        S: Into<String>,
        D: Into<String>,
    {
        NamespaceClone {
            source_namespace: source_namespace.into(),
            dest_namespace: dest_namespace.into(),
            name: None,
            preserve_mac: false,
            skip_permissions: false,
        }
    }

    /// Clones every selected VM.
    ///
    /// Listing the VMs and setting up permissions are fatal for the whole run. A failure while
    /// cloning one VM is only recorded in its [`ClonedVm`], the next VM is still cloned.
    #[tracing::instrument(level = "debug", skip(client, progress), err)]
    pub async fn run<C, P>(&self, client: &C, progress: &P) -> Result<Vec<ClonedVm>>
    where
        C: ClusterClient,
        P: Progress,
    {
        if !self.skip_permissions {
            ensure_clone_permissions(client, &self.source_namespace, &self.dest_namespace).await?;
        }

        let vms = client
            .get_all(ResourceKind::VirtualMachine, &self.source_namespace)
            .await?;

        let selected = vms
            .into_iter()
            .filter_map(|vm| {
                let name = vm.name()?.to_owned();
                Some((name, vm))
            })
            .filter(|(name, _)| self.name.as_ref().is_none_or(|wanted| wanted == name))
            .collect::<Vec<_>>();

        if selected.is_empty() {
            progress.warning(&format!(
                "no VirtualMachine to clone in namespace {}",
                self.source_namespace
            ));
        }

        let mut cloned = Vec::with_capacity(selected.len());

        for (name, vm) in selected {
            let mut subtask = progress.subtask(&format!("cloning {name}"));
            let context = TransformContext::clone_into(
                &self.source_namespace,
                &self.dest_namespace,
                &name,
            )
            .preserve_mac(self.preserve_mac);

            let result = clone_to_namespace(client, vm, &context, &subtask).await;

            match &result {
                Ok(_) => {
                    info!(vm = %name, dest = %self.dest_namespace, "cloned");
                    subtask.success(Some(&format!("cloned {name}")));
                }
                Err(error) => {
                    warn!(vm = %name, %error, "clone failed");
                    subtask.failure(Some(&format!("failed to clone {name}: {error}")));
                }
            }

            cloned.push(ClonedVm { name, result });
        }

        Ok(cloned)
    }
}
