use virtmove_kube::{ClusterClient, ResourceKind};
use virtmove_migrate::{
    apply_conversion, convert_to_direct_storage, ConvertOutcome, TransformContext,
};
use virtmove_progress::{Progress, ProgressTracker, SimpleProgress};

use crate::{
    config::{ConvertArgs, KubeArgs},
    error::{CliError, CliResult},
    kube::connect,
    output::{convert_file_stem, write_document},
    prompt,
};

pub(crate) async fn convert_command(kube: &KubeArgs, args: ConvertArgs) -> CliResult<()> {
    // A spinner would redraw over the confirmation prompt.
    let mut progress = ProgressTracker::try_from_env("virtmove convert")
        .unwrap_or_else(|| SimpleProgress::new("virtmove convert").into());
    let client = connect(kube, &progress).await?;

    convert_vm(&client, &args, &mut progress, prompt::confirm).await
}

/// Converts one VM, writing the result or patching the live object with `--apply`.
///
/// `confirm` is only asked when `--yes` was not passed. Declining is a successful run that
/// changed nothing.
pub(crate) async fn convert_vm<C, P, F>(
    client: &C,
    args: &ConvertArgs,
    progress: &mut P,
    mut confirm: F,
) -> CliResult<()>
where
    C: ClusterClient,
    P: Progress,
    F: FnMut(&str) -> bool,
{
    let vm = client
        .get(ResourceKind::VirtualMachine, &args.vm, &args.namespace)
        .await
        .map_err(|error| CliError::VirtualMachineLookupFailed(args.vm.clone(), error))?;

    let context = TransformContext::in_place(&args.namespace, &args.vm);
    let convert_error = |error| CliError::ConvertFailed(args.vm.clone(), error);

    let outcome = convert_to_direct_storage(client, vm, &context, &*progress, |question| {
        args.yes || confirm(question)
    })
    .await
    .map_err(convert_error)?;

    let conversion = match outcome {
        ConvertOutcome::Declined => {
            progress.success(Some("conversion cancelled, nothing was changed"));
            return Ok(());
        }
        ConvertOutcome::Converted(conversion) => conversion,
    };

    if args.apply {
        apply_conversion(
            client,
            &conversion,
            &context,
            args.delete_datavolumes,
            &*progress,
        )
        .await
        .map_err(convert_error)?;

        progress.success(Some(&format!(
            "virtualmachine/{} converted in namespace {}",
            args.vm, args.namespace
        )));
    } else {
        let path = write_document(
            &args.output_dir,
            &convert_file_stem(&args.vm),
            &conversion.vm,
        )?;

        progress.success(Some(&format!("wrote {}", path.display())));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use rstest::rstest;
    use serde_json::json;
    use virtmove_kube::memory::{ClusterCall, InMemoryCluster};
    use virtmove_progress::NullProgress;

    use super::*;
    use crate::testing::imported_cluster;

    fn args(output_dir: &Path) -> ConvertArgs {
        ConvertArgs {
            vm: "fedora".to_owned(),
            namespace: "ns-a".to_owned(),
            output_dir: output_dir.to_owned(),
            apply: false,
            delete_datavolumes: false,
            yes: false,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn declined_changes_nothing() {
        let directory = tempfile::tempdir().unwrap();
        let cluster = imported_cluster("PendingPopulation");
        let args = ConvertArgs {
            apply: true,
            delete_datavolumes: true,
            ..args(directory.path())
        };
        let mut prompts = 0;

        convert_vm(&cluster, &args, &mut NullProgress, |_| {
            prompts += 1;
            false
        })
        .await
        .unwrap();

        assert_eq!(prompts, 1);
        assert!(cluster.mutations().is_empty());
        assert_eq!(fs::read_dir(directory.path()).unwrap().count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn yes_skips_the_prompt() {
        let directory = tempfile::tempdir().unwrap();
        let cluster = imported_cluster("ImportInProgress");
        let args = ConvertArgs {
            yes: true,
            ..args(directory.path())
        };

        convert_vm(&cluster, &args, &mut NullProgress, |_| {
            panic!("no prompt expected")
        })
        .await
        .unwrap();

        let manifest: serde_yaml::Value = serde_yaml::from_str(
            &fs::read_to_string(directory.path().join("VirtualMachine.fedora.yaml")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            manifest["spec"]["template"]["spec"]["volumes"][0]["persistentVolumeClaim"]
                ["claimName"]
                .as_str(),
            Some("fedora-root")
        );
        assert!(cluster.mutations().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn apply_and_delete_imports() {
        let directory = tempfile::tempdir().unwrap();
        let cluster = imported_cluster("Succeeded");
        let args = ConvertArgs {
            apply: true,
            delete_datavolumes: true,
            ..args(directory.path())
        };

        convert_vm(&cluster, &args, &mut NullProgress, |_| {
            panic!("no prompt expected")
        })
        .await
        .unwrap();

        assert!(matches!(
            cluster.mutations().as_slice(),
            [ClusterCall::Patch { .. }, ClusterCall::Delete { .. }]
        ));
        assert_eq!(
            cluster
                .object(ResourceKind::VirtualMachine, "fedora", "ns-a")
                .unwrap()
                .get("spec.template.spec.volumes")
                .unwrap(),
            &json!([{ "name": "root", "persistentVolumeClaim": { "claimName": "fedora-root" } }])
        );
        assert!(cluster
            .object(ResourceKind::DataVolume, "fedora-dv", "ns-a")
            .is_none());
        assert_eq!(fs::read_dir(directory.path()).unwrap().count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_vm() {
        let directory = tempfile::tempdir().unwrap();

        let result = convert_vm(
            &InMemoryCluster::new(),
            &args(directory.path()),
            &mut NullProgress,
            |_| true,
        )
        .await;

        assert!(matches!(
            result,
            Err(CliError::VirtualMachineLookupFailed(name, _)) if name == "fedora"
        ));
    }
}
