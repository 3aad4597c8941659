use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::{info, warn};
use virtmove_kube::{ClusterClient, ResourceKind};
use virtmove_manifest::Document;
use virtmove_progress::{
    messages::{CONTINUE_PROMPT, IMPORT_IN_PROGRESS_HINT, PENDING_POPULATION_HINT},
    Progress,
};

use crate::{
    context::TransformContext,
    error::{MigrateError, Result},
    volume::{
        data_volume_status, DataVolumeStatus, VolumeAttachment, VolumeSource, TEMPLATES_PATH,
        VOLUMES_PATH,
    },
};

/// JSON pointers of the fields a conversion touches on the live object.
const TEMPLATES_POINTER: &str = "/spec/dataVolumeTemplates";
const VOLUMES_POINTER: &str = "/spec/template/spec/volumes";

#[derive(Debug)]
pub enum ConvertOutcome {
    /// The operator did not confirm after being warned about an unfinished import. Nothing was
    /// changed.
    Declined,
    Converted(Conversion),
}

/// A VM whose `dataVolume` volumes were rewritten to reference their claims directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub vm: Document,
    /// Whether the VM declared `spec.dataVolumeTemplates` before the conversion.
    pub had_templates: bool,
    /// `DataVolume`s no volume references anymore, in volume order and without repeats.
    pub superseded_imports: Vec<String>,
}

impl Conversion {
    /// Nothing on the live object would change.
    pub fn is_noop(&self) -> bool {
        !self.had_templates && self.superseded_imports.is_empty()
    }

    /// JSON patch bringing the live object in line with [`Conversion::vm`].
    ///
    /// Only removes the templates when there were any, removing a missing path fails the whole
    /// patch.
    pub fn patch(&self) -> Result<json_patch::Patch> {
        let mut operations = Vec::with_capacity(2);

        if self.had_templates {
            operations.push(json!({ "op": "remove", "path": TEMPLATES_POINTER }));
        }

        operations.push(json!({
            "op": "replace",
            "path": VOLUMES_POINTER,
            "value": self.vm.get(VOLUMES_PATH)?,
        }));

        Ok(serde_json::from_value(Value::Array(operations))?)
    }
}

/// Rewrites every `dataVolume` volume of `vm` to use the claim its import populated, and drops
/// the VM's `dataVolumeTemplates`.
///
/// Each `DataVolume` is checked first. When one has not reached `Succeeded`, the operator is
/// warned and `confirm` is asked whether to go on; a `false` answer ends the conversion with
/// [`ConvertOutcome::Declined`] before anything is edited.
///
/// Volumes of any other type are left as they are.
#[tracing::instrument(
    level = "debug",
    skip(client, vm, progress, confirm),
    fields(vm = %context.name),
    err
)]
pub async fn convert_to_direct_storage<C, P, F>(
    client: &C,
    mut vm: Document,
    context: &TransformContext,
    progress: &P,
    mut confirm: F,
) -> Result<ConvertOutcome>
where
    C: ClusterClient,
    P: Progress,
    F: FnMut(&str) -> bool,
{
    let mut volumes: Vec<Value> = vm.get_as(VOLUMES_PATH)?;
    let classified = volumes
        .iter()
        .map(import_of)
        .collect::<Result<Vec<_>>>()?;

    let mut imports: Vec<String> = Vec::new();
    for data_volume in classified.iter().flatten() {
        if !imports.contains(data_volume) {
            imports.push(data_volume.clone());
        }
    }

    let mut statuses = BTreeMap::new();
    for data_volume in &imports {
        let status =
            data_volume_status(client, data_volume, &context.source_namespace).await?;

        if !status.is_succeeded() {
            progress.warning(&format!(
                "datavolume/{data_volume} is in phase {}, not {}",
                status.phase(),
                DataVolumeStatus::SUCCEEDED
            ));

            if status.is_pending_population() {
                progress.warning(PENDING_POPULATION_HINT);
            } else {
                progress.warning(IMPORT_IN_PROGRESS_HINT);
            }

            if !confirm(CONTINUE_PROMPT) {
                info!(%data_volume, "conversion declined");
                return Ok(ConvertOutcome::Declined);
            }
        }

        statuses.insert(data_volume.clone(), status);
    }

    let had_templates = vm.delete(TEMPLATES_PATH).is_some();

    for (volume, data_volume) in volumes.iter_mut().zip(&classified) {
        let Some(data_volume) = data_volume else {
            continue;
        };

        let claim = statuses
            .get(data_volume)
            .and_then(|status| status.claim_name.clone())
            .ok_or_else(|| MigrateError::UnresolvedImport(data_volume.clone()))?;

        if let Value::Object(fields) = volume {
            fields.remove("dataVolume");
            fields.insert(
                "persistentVolumeClaim".to_owned(),
                json!({ "claimName": claim }),
            );
        }
    }

    vm.set(VOLUMES_PATH, volumes);

    Ok(ConvertOutcome::Converted(Conversion {
        vm,
        had_templates,
        superseded_imports: imports,
    }))
}

/// Name of the `DataVolume` behind `volume`, `None` for volumes without a `dataVolume` key.
///
/// A `dataVolume` volume that does not parse as one is rejected, it would otherwise be left
/// pointing at an import this conversion deletes.
fn import_of(volume: &Value) -> Result<Option<String>> {
    if volume.get("dataVolume").is_none() {
        return Ok(None);
    }

    match VolumeAttachment::try_from(volume)?.source {
        VolumeSource::StorageImport(data_volume) => Ok(Some(data_volume)),
        VolumeSource::DirectClaim(_) => Err(MigrateError::UnknownVolumeShape(volume.clone())),
    }
}

/// Patches the live VM with `conversion`, then optionally deletes the imports it superseded.
///
/// The VM stays patched when a deletion fails, the failure is only reported as a warning.
#[tracing::instrument(level = "debug", skip(client, conversion, progress), err)]
pub async fn apply_conversion<C, P>(
    client: &C,
    conversion: &Conversion,
    context: &TransformContext,
    delete_imports: bool,
    progress: &P,
) -> Result<()>
where
    C: ClusterClient,
    P: Progress,
{
    if conversion.is_noop() {
        progress.info(&format!(
            "virtualmachine/{} has no DataVolume to convert",
            context.name
        ));
        return Ok(());
    }

    client
        .patch(
            ResourceKind::VirtualMachine,
            &context.name,
            &context.dest_namespace,
            conversion.patch()?,
        )
        .await?;
    info!(vm = %context.name, namespace = %context.dest_namespace, "patched");

    if !delete_imports {
        return Ok(());
    }

    for data_volume in &conversion.superseded_imports {
        match client
            .delete(
                ResourceKind::DataVolume,
                data_volume,
                &context.source_namespace,
            )
            .await
        {
            Ok(()) => progress.info(&format!("deleted datavolume/{data_volume}")),
            Err(error) => {
                warn!(%data_volume, %error, "failed to delete superseded import");
                progress.warning(&format!(
                    "virtualmachine/{} was converted, but datavolume/{data_volume} could not be \
                     deleted: {error}",
                    context.name
                ));
            }
        }
    }

    Ok(())
}
