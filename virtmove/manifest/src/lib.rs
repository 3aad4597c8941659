#![warn(clippy::indexing_slicing)]

//! Path addressable editing of untyped Kubernetes manifests.
//!
//! A [`Document`] wraps a deserialized manifest and lets callers say what they want changed
//! ("drop `status`", "replace `metadata`") with dot separated paths like
//! `spec.template.spec.volumes`, instead of walking nested maps by hand at every call site.

pub mod document;
pub mod error;

pub use document::Document;
pub use error::{DocumentError, Result};
