use virtmove_kube::{ClusterClient, KubernetesAPI};
use virtmove_progress::Progress;

use crate::{
    config::KubeArgs,
    error::{CliError, CliResult},
};

/// Creates the cluster client and checks the cluster answers, before any command does work.
pub(crate) async fn connect<P>(args: &KubeArgs, progress: &P) -> CliResult<KubernetesAPI>
where
    P: Progress,
{
    let mut subtask = progress.subtask("connecting to the cluster");

    let client = KubernetesAPI::create(
        args.accept_invalid_certificates,
        args.kubeconfig.as_deref(),
        args.context.clone(),
    )
    .await
    .map_err(CliError::CreateKubeApiFailed)?;

    client
        .status_check()
        .await
        .map_err(CliError::ClusterUnreachable)?;

    subtask.success(Some("cluster is reachable"));

    Ok(client)
}
