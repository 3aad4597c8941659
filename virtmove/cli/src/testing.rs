//! Cluster fixtures for the command tests.

use serde_json::{json, Value};
use virtmove_kube::memory::InMemoryCluster;

pub(crate) fn vm(name: &str, namespace: &str, volumes: Value) -> Value {
    json!({
        "apiVersion": "kubevirt.io/v1",
        "kind": "VirtualMachine",
        "metadata": { "name": name, "namespace": namespace, "uid": format!("{name}-uid") },
        "spec": {
            "template": {
                "spec": {
                    "running": true,
                    "domain": {
                        "devices": {
                            "interfaces": [
                                {
                                    "name": "default",
                                    "masquerade": {},
                                    "macAddress": "02:5e:11:00:00:01"
                                }
                            ]
                        }
                    },
                    "volumes": volumes
                }
            }
        }
    })
}

pub(crate) fn pvc(name: &str, namespace: &str, capacity: &str) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "PersistentVolumeClaim",
        "metadata": { "name": name, "namespace": namespace },
        "status": { "phase": "Bound", "capacity": { "storage": capacity } }
    })
}

pub(crate) fn data_volume(name: &str, namespace: &str, phase: &str, claim: &str) -> Value {
    json!({
        "apiVersion": "cdi.kubevirt.io/v1beta1",
        "kind": "DataVolume",
        "metadata": { "name": name, "namespace": namespace },
        "status": { "phase": phase, "claimName": claim }
    })
}

/// `ns-a` with `fedora` on an imported root disk whose `DataVolume` (`fedora-dv`) is in `phase`.
pub(crate) fn imported_cluster(phase: &str) -> InMemoryCluster {
    InMemoryCluster::new()
        .with_object(vm(
            "fedora",
            "ns-a",
            json!([{ "name": "root", "dataVolume": { "name": "fedora-dv" } }]),
        ))
        .with_object(data_volume("fedora-dv", "ns-a", phase, "fedora-root"))
        .with_object(pvc("fedora-root", "ns-a", "30Gi"))
}
