#![warn(clippy::indexing_slicing)]

//! Cluster access for virtmove.
//!
//! The transformations only ever see a [`ClusterClient`], [`KubernetesAPI`] is the implementation
//! that talks to a real API server.

pub mod client;
pub mod error;
pub mod kubernetes;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod resource;

pub use client::ClusterClient;
pub use kubernetes::KubernetesAPI;
pub use resource::ResourceKind;
