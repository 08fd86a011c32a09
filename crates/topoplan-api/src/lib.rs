//! # Topoplan API
//!
//! Provisioning layer for topoplan.
//! This crate turns a derived `TopologyPlan` into real resources, either
//! through a remote provisioning API or an in-memory backend for dry runs.

pub mod backend;
pub mod client;
pub mod errors;
pub mod memory;
pub mod provisioner;

// Re-export common types for convenience
pub use backend::*;
pub use client::*;
pub use errors::*;
pub use memory::*;
pub use provisioner::*;

// Re-export core types that API consumers will need
pub use topoplan_core::{Result as CoreResult, TopologyPlan};
pub use topoplan_utils::ResourceKind;
