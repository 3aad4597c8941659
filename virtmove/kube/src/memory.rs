use std::{cell::RefCell, collections::BTreeMap};

use json_patch::Patch;
use kube::core::ErrorResponse;
use virtmove_manifest::Document;

use crate::{
    client::ClusterClient,
    error::{KubeApiError, Result},
    resource::ResourceKind,
};

type ObjectKey = (ResourceKind, String, String);

/// A request made against an [`InMemoryCluster`], in the order it was made.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterCall {
    StatusCheck,
    Get {
        kind: ResourceKind,
        name: String,
        namespace: String,
    },
    GetAll {
        kind: ResourceKind,
        namespace: String,
    },
    Apply {
        kind: ResourceKind,
        name: String,
        namespace: String,
    },
    Patch {
        kind: ResourceKind,
        name: String,
        namespace: String,
        patch: Patch,
    },
    Delete {
        kind: ResourceKind,
        name: String,
        namespace: String,
    },
}

impl ClusterCall {
    /// Whether this call changes cluster state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ClusterCall::Apply { .. } | ClusterCall::Patch { .. } | ClusterCall::Delete { .. }
        )
    }
}

/// [`ClusterClient`] over a map of manifests, recording every call it receives.
#[derive(Debug, Default)]
pub struct InMemoryCluster {
    objects: RefCell<BTreeMap<ObjectKey, Document>>,
    calls: RefCell<Vec<ClusterCall>>,
    unreachable: bool,
    failing_deletes: bool,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document`, keyed by its `kind`, `metadata.namespace` and `metadata.name`.
    ///
    /// Panics if any of those is missing, this is only meant for test fixtures.
    pub fn with_object(self, document: serde_json::Value) -> Self {
        let document = Document::new(document);
        let key = object_key(&document).expect("fixture manifests need kind and metadata.name");
        self.objects.borrow_mut().insert(key, document);
        self
    }

    /// Makes [`ClusterClient::status_check`] fail.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Makes every [`ClusterClient::delete`] fail.
    pub fn failing_deletes(mut self) -> Self {
        self.failing_deletes = true;
        self
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<ClusterCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    /// Current state of a stored object.
    pub fn object(&self, kind: ResourceKind, name: &str, namespace: &str) -> Option<Document> {
        self.objects
            .borrow()
            .get(&(kind, scoped(kind, namespace), name.to_owned()))
            .cloned()
    }

    fn record(&self, call: ClusterCall) {
        self.calls.borrow_mut().push(call);
    }
}

fn scoped(kind: ResourceKind, namespace: &str) -> String {
    if kind.is_namespaced() {
        namespace.to_owned()
    } else {
        String::new()
    }
}

fn api_error(code: u16, reason: &str, message: &str) -> KubeApiError {
    KubeApiError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_owned(),
        message: message.to_owned(),
        reason: reason.to_owned(),
        code,
    }))
}

fn object_key(document: &Document) -> Result<ObjectKey> {
    let kind = ResourceKind::of(document)?;
    let name = document
        .name()
        .ok_or(KubeApiError::MissingField("metadata.name"))?;
    let namespace = scoped(kind, document.namespace().unwrap_or_default());

    Ok((kind, namespace, name.to_owned()))
}

impl ClusterClient for InMemoryCluster {
    async fn status_check(&self) -> Result<()> {
        self.record(ClusterCall::StatusCheck);

        if self.unreachable {
            Err(api_error(503, "ServiceUnavailable", "connection refused"))
        } else {
            Ok(())
        }
    }

    async fn get(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<Document> {
        self.record(ClusterCall::Get {
            kind,
            name: name.to_owned(),
            namespace: namespace.to_owned(),
        });

        self.object(kind, name, namespace)
            .ok_or_else(|| KubeApiError::NotFound {
                kind,
                name: name.to_owned(),
            })
    }

    async fn get_all(&self, kind: ResourceKind, namespace: &str) -> Result<Vec<Document>> {
        self.record(ClusterCall::GetAll {
            kind,
            namespace: namespace.to_owned(),
        });

        let namespace = scoped(kind, namespace);

        Ok(self
            .objects
            .borrow()
            .iter()
            .filter(|((stored_kind, stored_namespace, _), _)| {
                *stored_kind == kind && *stored_namespace == namespace
            })
            .map(|(_, document)| document.clone())
            .collect())
    }

    async fn apply(&self, document: &Document) -> Result<()> {
        let key = object_key(document)?;
        let (kind, namespace, name) = key.clone();

        self.record(ClusterCall::Apply {
            kind,
            name,
            namespace,
        });
        self.objects.borrow_mut().insert(key, document.clone());

        Ok(())
    }

    async fn patch(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
        patch: Patch,
    ) -> Result<()> {
        self.record(ClusterCall::Patch {
            kind,
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            patch: patch.clone(),
        });

        let key = (kind, scoped(kind, namespace), name.to_owned());
        let mut objects = self.objects.borrow_mut();
        let document = objects.get_mut(&key).ok_or_else(|| KubeApiError::NotFound {
            kind,
            name: name.to_owned(),
        })?;

        let mut value = document.as_value().clone();
        json_patch::patch(&mut value, &patch.0)?;
        *document = Document::new(value);

        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<()> {
        self.record(ClusterCall::Delete {
            kind,
            name: name.to_owned(),
            namespace: namespace.to_owned(),
        });

        if self.failing_deletes {
            return Err(api_error(403, "Forbidden", "delete is not allowed"));
        }

        self.objects
            .borrow_mut()
            .remove(&(kind, scoped(kind, namespace), name.to_owned()))
            .map(|_| ())
            .ok_or_else(|| KubeApiError::NotFound {
                kind,
                name: name.to_owned(),
            })
    }
}
