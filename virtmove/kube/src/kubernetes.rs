use std::ops::Deref;

use json_patch::Patch as JsonPatch;
use kube::{
    api::{DeleteParams, DynamicObject, ListParams, Patch, PatchParams},
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config,
};
use tracing::{debug, info};
use virtmove_manifest::Document;

use crate::{
    client::ClusterClient,
    error::{KubeApiError, Result},
    resource::ResourceKind,
};

/// Field manager name used for server side apply.
pub const FIELD_MANAGER: &str = "virtmove";

/// [`ClusterClient`] talking to the Kubernetes API server.
#[derive(Clone)]
pub struct KubernetesAPI {
    client: Client,
}

impl KubernetesAPI {
    pub async fn create<P>(
        accept_invalid_certificates: bool,
        kubeconfig: Option<P>,
        kube_context: Option<String>,
    ) -> Result<Self>
    where
        P: AsRef<str>,
    {
        let client = create_kube_api(accept_invalid_certificates, kubeconfig, kube_context).await?;

        Ok(KubernetesAPI::new(client))
    }

    pub fn new(client: Client) -> Self {
        KubernetesAPI { client }
    }

    /// Namespaced kinds without a namespace fall back to the default namespace of the kube
    /// context, cluster scoped kinds ignore `namespace`.
    fn api(&self, kind: ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = kind.api_resource();

        match namespace.filter(|_| kind.is_namespaced()) {
            Some(namespace) if !namespace.is_empty() => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            _ if kind.is_namespaced() => {
                Api::default_namespaced_with(self.client.clone(), &resource)
            }
            _ => Api::all_with(self.client.clone(), &resource),
        }
    }
}

fn to_document(object: &DynamicObject) -> Result<Document> {
    Ok(Document::new(serde_json::to_value(object)?))
}

impl ClusterClient for KubernetesAPI {
    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn status_check(&self) -> Result<()> {
        let version = self.client.apiserver_version().await?;
        debug!(version = %version.git_version, "cluster is reachable");

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn get(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<Document> {
        let object = self
            .api(kind, Some(namespace))
            .get(name)
            .await
            .map_err(|error| KubeApiError::from_lookup(error, kind, name))?;

        to_document(&object)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn get_all(&self, kind: ResourceKind, namespace: &str) -> Result<Vec<Document>> {
        self.api(kind, Some(namespace))
            .list(&ListParams::default())
            .await?
            .items
            .iter()
            .map(to_document)
            .collect()
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(kind = document.kind(), name = document.name()),
        err
    )]
    async fn apply(&self, document: &Document) -> Result<()> {
        let kind = ResourceKind::of(document)?;
        let name = document
            .name()
            .ok_or(KubeApiError::MissingField("metadata.name"))?;

        self.api(kind, document.namespace())
            .patch(
                name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(document.as_value()),
            )
            .await?;

        info!(%kind, name, "applied");

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn patch(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
        patch: JsonPatch,
    ) -> Result<()> {
        self.api(kind, Some(namespace))
            .patch(name, &PatchParams::default(), &Patch::Json::<()>(patch))
            .await
            .map_err(|error| KubeApiError::from_lookup(error, kind, name))?;

        info!(%kind, name, namespace, "patched");

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<()> {
        self.api(kind, Some(namespace))
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|error| KubeApiError::from_lookup(error, kind, name))?;

        info!(%kind, name, namespace, "deleted");

        Ok(())
    }
}

pub async fn create_kube_api<P>(
    accept_invalid_certificates: bool,
    kubeconfig: Option<P>,
    kube_context: Option<String>,
) -> Result<Client>
where
    P: AsRef<str>,
{
    let kube_config_opts = KubeConfigOptions {
        context: kube_context,
        ..Default::default()
    };

    let mut config = if let Some(kubeconfig) = kubeconfig {
        let kubeconfig = shellexpand::full(&kubeconfig)
            .map_err(|e| KubeApiError::ConfigPathExpansionError(e.to_string()))?;
        let parsed_kube_config = Kubeconfig::read_from(kubeconfig.deref())?;
        Config::from_custom_kubeconfig(parsed_kube_config, &kube_config_opts).await?
    } else if kube_config_opts.context.is_some() {
        // if context is set, it's not in cluster so it has to be a kubeconfig.
        Config::from_kubeconfig(&kube_config_opts).await?
    } else {
        Config::infer().await?
    };
    config.accept_invalid_certs = accept_invalid_certificates;
    Client::try_from(config).map_err(KubeApiError::from)
}
