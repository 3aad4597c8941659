use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;
use virtmove_kube::error::KubeApiError;
use virtmove_migrate::MigrateError;

pub(crate) type CliResult<T, E = CliError> = core::result::Result<T, E>;

const GENERAL_HELP: &str = r#"

- If you're still stuck, run again with `--log-level virtmove=debug` and include the output in a
  bug report.

"#;

const GENERAL_BUG: &str = r#"This is a bug. Please report it, including the VirtualMachine
manifest (`kubectl get vm <name> -o yaml`) if you can share it.

"#;

#[derive(Debug, Error, Diagnostic)]
pub(crate) enum CliError {
    #[error("Failed to build the async runtime: {0}")]
    #[diagnostic(help("{GENERAL_BUG}"))]
    RuntimeError(std::io::Error),

    #[error("Failed to create Kubernetes API client: {0}")]
    #[diagnostic(help(
        "Please check that your kubeconfig is valid, and that `--context` names a context in \
         it.{GENERAL_HELP}"
    ))]
    CreateKubeApiFailed(KubeApiError),

    #[error("Cluster is not reachable: {0}")]
    #[diagnostic(help(
        "Please check that the cluster is up and that `kubectl cluster-info` works with the same \
         kubeconfig and context.{GENERAL_HELP}"
    ))]
    ClusterUnreachable(KubeApiError),

    #[error("Failed to get virtualmachine/{0}: {1}")]
    #[diagnostic(help(
        "Please check the VirtualMachine name and namespace, `kubectl get vm -n <namespace>` \
         lists them.{GENERAL_HELP}"
    ))]
    VirtualMachineLookupFailed(String, KubeApiError),

    #[error("Failed to clone VirtualMachines: {0}")]
    #[diagnostic(help(
        "Listing VirtualMachines and creating the clone permissions needs the matching RBAC \
         rights, use `--skip-permissions` if an administrator already set them up.{GENERAL_HELP}"
    ))]
    CloneFailed(MigrateError),

    #[error("{failed} of {total} VirtualMachines could not be cloned")]
    #[diagnostic(help(
        "The manifests of the other VirtualMachines were written, see above for what \
         failed.{GENERAL_HELP}"
    ))]
    PartialClone { failed: usize, total: usize },

    #[error("Failed to convert virtualmachine/{0}: {1}")]
    #[diagnostic(help("{GENERAL_HELP}"))]
    ConvertFailed(String, MigrateError),

    #[error("Failed to serialize the manifest: {0}")]
    #[diagnostic(help("{GENERAL_BUG}"))]
    SerializeManifest(serde_json::Error),

    #[error("Failed to write `{path}`: {1}", path = .0.display())]
    #[diagnostic(help("Please check that the output directory is writable.{GENERAL_HELP}"))]
    WriteManifest(PathBuf, std::io::Error),
}
