//! # Topoplan Utils
//!
//! Infrastructure utilities for the topoplan project.
//! This crate contains deployment file loading, plan formatting and
//! reference generation used by the provisioning layer and the CLI.

pub mod deployment;
pub mod errors;
pub mod formatters;
pub mod id_generator;
pub mod parsers;

// Re-export common types for convenience
pub use deployment::*;
pub use errors::*;
pub use formatters::*;
pub use id_generator::*;
pub use parsers::*;
