//! Fixtures shared by the tests of this crate.

use std::{cell::RefCell, rc::Rc};

use rstest::fixture;
use serde_json::{json, Value};
use virtmove_kube::memory::InMemoryCluster;
use virtmove_progress::Progress;

pub(crate) const MAC_DEFAULT: &str = "02:5e:11:00:00:01";
pub(crate) const MAC_STORAGE: &str = "02:5e:11:00:00:02";

pub(crate) fn vm(name: &str, namespace: &str, volumes: Value) -> Value {
    json!({
        "apiVersion": "kubevirt.io/v1",
        "kind": "VirtualMachine",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "8a4b1c52-6b1e-4f6c-9d0b-1f9f4c8e2a11",
            "resourceVersion": "48213",
            "labels": { "app": name },
            "annotations": { "kubevirt.io/latest-observed-api-version": "v1" }
        },
        "spec": {
            "preference": {
                "kind": "VirtualMachineClusterPreference",
                "name": "fedora",
                "revisionName": "fedora-rev-1"
            },
            "template": {
                "spec": {
                    "running": true,
                    "domain": {
                        "devices": {
                            "interfaces": [
                                { "name": "default", "masquerade": {}, "macAddress": MAC_DEFAULT },
                                { "name": "storage", "bridge": {}, "macAddress": MAC_STORAGE }
                            ]
                        }
                    },
                    "volumes": volumes
                }
            }
        },
        "status": { "printableStatus": "Running", "ready": true }
    })
}

pub(crate) fn data_volume(name: &str, namespace: &str, status: Value) -> Value {
    json!({
        "apiVersion": "cdi.kubevirt.io/v1beta1",
        "kind": "DataVolume",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "source": { "http": { "url": "https://example.com/fedora.qcow2" } } },
        "status": status
    })
}

pub(crate) fn pvc(name: &str, namespace: &str, capacity: Option<&str>) -> Value {
    let status = match capacity {
        Some(capacity) => json!({ "phase": "Bound", "capacity": { "storage": capacity } }),
        None => json!({ "phase": "Pending" }),
    };

    json!({
        "apiVersion": "v1",
        "kind": "PersistentVolumeClaim",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "accessModes": ["ReadWriteOnce"] },
        "status": status
    })
}

/// `ns-a` with an imported root disk (`fedora-dv` -> `fedora-root`, 30Gi) and a plain claim
/// (`data-pvc`, 10Gi).
#[fixture]
pub(crate) fn cluster() -> InMemoryCluster {
    InMemoryCluster::new()
        .with_object(data_volume(
            "fedora-dv",
            "ns-a",
            json!({ "phase": "Succeeded", "claimName": "fedora-root", "progress": "100.0%" }),
        ))
        .with_object(pvc("fedora-root", "ns-a", Some("30Gi")))
        .with_object(pvc("data-pvc", "ns-a", Some("10Gi")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reported {
    Warning(String),
    Info(String),
}

/// [`Progress`] that keeps every warning and info message, subtasks included.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingProgress {
    reported: Rc<RefCell<Vec<Reported>>>,
}

impl RecordingProgress {
    pub(crate) fn warnings(&self) -> Vec<String> {
        self.reported
            .borrow()
            .iter()
            .filter_map(|reported| match reported {
                Reported::Warning(message) => Some(message.clone()),
                Reported::Info(_) => None,
            })
            .collect()
    }
}

impl Progress for RecordingProgress {
    fn subtask(&self, _: &str) -> Self {
        self.clone()
    }

    fn success(&mut self, _: Option<&str>) {}

    fn failure(&mut self, _: Option<&str>) {}

    fn warning(&self, msg: &str) {
        self.reported
            .borrow_mut()
            .push(Reported::Warning(msg.to_owned()));
    }

    fn info(&self, msg: &str) {
        self.reported.borrow_mut().push(Reported::Info(msg.to_owned()));
    }
}

#[fixture]
pub(crate) fn progress() -> RecordingProgress {
    RecordingProgress::default()
}
