use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use topoplan_core::{
    Certificate, DnsRecord, EdgeResources, InstancePlacement, Listener, ListenerRule,
    NetworkTopology, TargetGroup, TenantCredential,
};
use topoplan_utils::ResourceKind;

/// A provisioned resource: the plan's logical name and the backend's id for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub logical_id: String,
    pub physical_id: String,
}

impl ResourceRef {
    pub fn new(
        kind: ResourceKind,
        logical_id: impl Into<String>,
        physical_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            logical_id: logical_id.into(),
            physical_id: physical_id.into(),
        }
    }
}

/// Whatever turns plan declarations into real resources.
///
/// Declarations reference each other by logical name, so a backend must be
/// fed in dependency order; [`crate::Provisioner`] does that.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    async fn create_network(&self, network: &NetworkTopology) -> Result<ResourceRef>;

    /// Hosted zone, security groups, load balancer and step hosts, in that order
    async fn create_edge(&self, edge: &EdgeResources) -> Result<Vec<ResourceRef>>;

    async fn create_instance(&self, placement: &InstancePlacement) -> Result<ResourceRef>;

    async fn create_target_group(&self, target_group: &TargetGroup) -> Result<ResourceRef>;

    async fn create_listener(&self, listener: &Listener) -> Result<ResourceRef>;

    async fn create_certificate(&self, certificate: &Certificate) -> Result<ResourceRef>;

    async fn create_rule(&self, rule: &ListenerRule) -> Result<ResourceRef>;

    async fn create_record(&self, record: &DnsRecord) -> Result<ResourceRef>;

    async fn create_credential(&self, credential: &TenantCredential) -> Result<ResourceRef>;
}
