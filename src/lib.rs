//! # topoplan
//!
//! Derives the deployment topology for a set of tenants sharing one network
//! and one load balancer, and provisions it.
//!
//! The work is split across the workspace crates re-exported here:
//! - `topoplan-core`: pure plan derivation
//! - `topoplan-utils`: deployment files, formatting, reference generation
//! - `topoplan-api`: provisioning backends and the provisioner
//! - `topoplan-cli`: the `topoplan` command line

pub use topoplan_api as api;
pub use topoplan_cli as cli;
pub use topoplan_utils as utils;

// Re-export main public types
pub use topoplan_core::{
    derive_plan, validate_settings, DeploymentSettings, PlanError, TopologyPlan,
};
