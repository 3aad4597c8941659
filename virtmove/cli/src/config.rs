use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about,
    long_about = r#"
Clone KubeVirt VirtualMachines into another namespace, or convert VirtualMachines that use
DataVolumes to use the PersistentVolumeClaims behind them directly."#
)]
pub(super) struct Cli {
    #[command(flatten)]
    pub(super) kube: KubeArgs,

    /// Log filter, in `RUST_LOG` syntax. Overrides `RUST_LOG`.
    #[arg(long, global = true, env = "VIRTMOVE_LOG_LEVEL")]
    pub(super) log_level: Option<String>,

    #[command(subcommand)]
    pub(super) commands: Commands,
}

/// How to reach the cluster, shared by every command that talks to it.
#[derive(Args, Debug, Default, PartialEq, Eq)]
pub(super) struct KubeArgs {
    /// Path to the kubeconfig to use, `~` and environment variables are expanded.
    #[arg(long, global = true, env = "VIRTMOVE_KUBECONFIG", value_hint = ValueHint::FilePath)]
    pub(super) kubeconfig: Option<String>,

    /// Kube context to use from the kubeconfig.
    #[arg(long, global = true, env = "VIRTMOVE_CONTEXT")]
    pub(super) context: Option<String>,

    /// Do not verify the TLS certificate of the API server.
    #[arg(long, global = true, env = "VIRTMOVE_ACCEPT_INVALID_CERTIFICATES")]
    pub(super) accept_invalid_certificates: bool,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Write manifests that re-create the VirtualMachines of one namespace in another namespace,
    /// on clones of their disks.
    Clone(Box<CloneArgs>),

    /// Make a VirtualMachine use the PersistentVolumeClaims populated by its DataVolumes
    /// directly, instead of the DataVolumes.
    Convert(Box<ConvertArgs>),

    /// Generate shell completions for the provided shell.
    /// Supported shells: bash, elvish, fish, powershell, zsh
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub(super) struct CloneArgs {
    /// Namespace of the VirtualMachines to clone.
    pub(super) source_namespace: String,

    /// Namespace the clones are meant for.
    pub(super) dest_namespace: String,

    /// Directory the manifests are written to.
    #[arg(
        short = 'o',
        long,
        env = "VIRTMOVE_OUTPUT_DIR",
        default_value = ".",
        value_hint = ValueHint::DirPath
    )]
    pub(super) output_dir: PathBuf,

    /// Only clone the VirtualMachine with this name.
    #[arg(long)]
    pub(super) name: Option<String>,

    /// Keep the MAC addresses of the source VirtualMachines on the clones.
    #[arg(long, env = "VIRTMOVE_PRESERVE_MAC")]
    pub(super) preserve_mac: bool,

    /// Do not create the ClusterRole and RoleBinding CDI needs to clone disks across namespaces.
    #[arg(long, env = "VIRTMOVE_SKIP_PERMISSIONS")]
    pub(super) skip_permissions: bool,
}

#[derive(Args, Debug)]
pub(super) struct ConvertArgs {
    /// Name of the VirtualMachine to convert.
    pub(super) vm: String,

    /// Namespace of the VirtualMachine.
    #[arg(short = 'n', long, env = "VIRTMOVE_NAMESPACE")]
    pub(super) namespace: String,

    /// Directory the converted manifest is written to, when not applying it.
    #[arg(
        short = 'o',
        long,
        env = "VIRTMOVE_OUTPUT_DIR",
        default_value = ".",
        value_hint = ValueHint::DirPath
    )]
    pub(super) output_dir: PathBuf,

    /// Patch the VirtualMachine in the cluster instead of writing a manifest.
    #[arg(long)]
    pub(super) apply: bool,

    /// After patching, delete the DataVolumes the VirtualMachine no longer uses.
    #[arg(long, requires = "apply")]
    pub(super) delete_datavolumes: bool,

    /// Do not ask for confirmation when a DataVolume has not finished importing.
    #[arg(short = 'y', long)]
    pub(super) yes: bool,
}

#[derive(Args, Debug)]
pub(super) struct CompletionsArgs {
    pub(super) shell: Shell,
}
