use tracing::warn;
use virtmove_kube::ClusterClient;
use virtmove_migrate::{ClonedVm, NamespaceClone};
use virtmove_progress::{Progress, ProgressTracker};

use crate::{
    config::{CloneArgs, KubeArgs},
    error::{CliError, CliResult},
    kube::connect,
    output::{clone_file_stem, write_document},
};

pub(crate) async fn clone_command(kube: &KubeArgs, args: CloneArgs) -> CliResult<()> {
    let mut progress = ProgressTracker::from_env("virtmove clone");
    let client = connect(kube, &progress).await?;

    clone_vms(&client, args, &mut progress).await
}

/// Clones every selected VM and writes one manifest per VM that could be cloned.
///
/// Fails once all VMs were processed if any of them could not be cloned or written.
pub(crate) async fn clone_vms<C, P>(
    client: &C,
    args: CloneArgs,
    progress: &mut P,
) -> CliResult<()>
where
    C: ClusterClient,
    P: Progress,
{
    let CloneArgs {
        source_namespace,
        dest_namespace,
        output_dir,
        name,
        preserve_mac,
        skip_permissions,
    } = args;

    let batch = NamespaceClone {
        source_namespace,
        dest_namespace,
        name,
        preserve_mac,
        skip_permissions,
    };

    let cloned = batch
        .run(client, &*progress)
        .await
        .map_err(CliError::CloneFailed)?;

    let total = cloned.len();
    let mut failed = 0;

    for ClonedVm { name, result } in cloned {
        let Ok(vm) = result else {
            failed += 1;
            continue;
        };

        match write_document(&output_dir, &clone_file_stem(&name), &vm) {
            Ok(path) => progress.info(&format!("wrote {}", path.display())),
            Err(error) => {
                warn!(vm = %name, %error, "failed to write clone manifest");
                progress.warning(&error.to_string());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        progress.failure(Some("some VirtualMachines could not be cloned"));
        return Err(CliError::PartialClone { failed, total });
    }

    progress.success(Some(&format!(
        "{total} VirtualMachine manifests written for namespace {}",
        batch.dest_namespace
    )));

    Ok(())
}
