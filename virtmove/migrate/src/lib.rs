#![warn(clippy::indexing_slicing)]

//! The VM transformations: [`clone_to_namespace`] re-creates a VM in another namespace on cloned
//! storage, [`convert_to_direct_storage`] makes a VM use the claims behind its `DataVolume`s.
//!
//! Both take the VM as a [`virtmove_manifest::Document`] and a [`virtmove_kube::ClusterClient`]
//! for the lookups they need, and hand back the edited document. Writing it out or submitting it
//! is up to the caller.

pub mod clone;
pub mod context;
pub mod convert;
pub mod error;
pub mod permissions;
pub mod volume;

#[cfg(test)]
mod testing;

pub use clone::{clone_to_namespace, ClonedVm, NamespaceClone};
pub use context::TransformContext;
pub use convert::{apply_conversion, convert_to_direct_storage, Conversion, ConvertOutcome};
pub use error::{MigrateError, Result};
