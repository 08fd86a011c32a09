//! # Topoplan Core
//!
//! Deployment topology derivation for multi-tenant fleets sharing one
//! network and one load balancer.
//!
//! This crate contains pure planning logic with no I/O dependencies:
//! - Domain models for the plan and its resources
//! - Network, fleet, routing, DNS and credential planners
//! - Input validation and error definitions
//!
//! Provisioning the plan is the job of `topoplan-api`.

pub mod credentials;
pub mod dns;
pub mod edge;
pub mod errors;
pub mod fleet;
pub mod models;
pub mod naming;
pub mod network;
pub mod plan;
pub mod routing;

// Re-export commonly used types
pub use credentials::issue_credential;
pub use dns::bind_dns;
pub use edge::plan_edge;
pub use errors::{PlanError, Result};
pub use fleet::{external_target, FleetAllocator};
pub use models::{
    BastionHost, Certificate, DeploymentSettings, DnsRecord, EdgeResources, HealthCheck,
    HostedZone, InstancePlacement, InstanceRef, Listener, ListenerBootstrap, ListenerRule,
    LoadBalancer, NetworkTopology, Policy, Protocol, RoutingEntry, SecretTemplate,
    SecurityGroup, StatementScope, Subnet, TargetGroup, Tenant, TenantCredential, TenantFleet,
    TopologyPlan,
};
pub use naming::ResourceNames;
pub use network::plan_network;
pub use plan::{derive_plan, validate_settings, PlanningSession};
pub use routing::{
    build_routes, ListenerState, PriorityAllocator, RoutingSession, RoutingTable,
    MAX_RULE_PRIORITY,
};
