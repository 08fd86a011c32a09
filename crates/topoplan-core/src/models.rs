use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deployment input, field names follow the deployment file (`env.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSettings {
    pub prefix: String,
    pub domain: String,
    #[serde(default)]
    pub sub_domains: Vec<String>,
    pub instance_count: u32,
    #[serde(default)]
    pub use_cert: bool,
    /// Base offset for the routing priority counter
    #[serde(default)]
    pub temp_priority: u32,
}

/// One subdomain-scoped application unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub subdomain: String,
    /// Position in the input list
    pub ordinal: usize,
}

impl Tenant {
    pub fn new(subdomain: impl Into<String>, ordinal: usize) -> Self {
        Self {
            subdomain: subdomain.into(),
            ordinal,
        }
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetKind {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub name: String,
    pub kind: SubnetKind,
    pub cidr: Ipv4Net,
    /// Availability zone index
    pub zone: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTopology {
    pub name: String,
    pub cidr: Ipv4Net,
    pub public_subnets: Vec<Subnet>,
    pub private_subnets: Vec<Subnet>,
    pub nat_gateways: usize,
    pub enable_dns_support: bool,
    pub enable_dns_hostnames: bool,
    pub instance_tenancy: String,
}

// ---------------------------------------------------------------------------
// Compute
// ---------------------------------------------------------------------------

/// Logical reference to an instance. The provisioning backend resolves it to
/// a physical id; policies and target groups only ever hold the logical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceRef(String);

impl InstanceRef {
    pub fn new(logical_id: impl Into<String>) -> Self {
        Self(logical_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image lookup is the backend's job, the plan only says what it wants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSelector {
    pub family: String,
    pub cpu_arch: String,
}

impl Default for ImageSelector {
    fn default() -> Self {
        Self {
            family: "amazon-linux-2".to_string(),
            cpu_arch: "arm64".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSpec {
    pub instance_type: String,
    pub image: ImageSelector,
    pub key_name: String,
    pub security_groups: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePlacement {
    pub tenant: String,
    /// Ordinal within the tenant's fleet
    pub index: usize,
    /// Name of the private subnet the instance lands in
    pub subnet: String,
    pub instance: InstanceRef,
    pub spec: InstanceSpec,
}

impl InstancePlacement {
    /// Only the first instance of a fleet receives routed traffic
    pub fn is_external_target(&self) -> bool {
        self.index == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantFleet {
    pub tenant: Tenant,
    pub placements: Vec<InstancePlacement>,
}

impl TenantFleet {
    pub fn external_target(&self) -> Option<&InstancePlacement> {
        self.placements.first()
    }

    pub fn instance_refs(&self) -> Vec<InstanceRef> {
        self.placements.iter().map(|p| p.instance.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Load balancing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Fixed target group health check policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub path: String,
    pub healthy_http_codes: String,
    pub interval_secs: u32,
    pub timeout_secs: u32,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            healthy_http_codes: "200".to_string(),
            interval_secs: 30,
            timeout_secs: 5,
            healthy_threshold: 2,
            unhealthy_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    pub name: String,
    pub tenant: String,
    pub vpc: String,
    pub port: u16,
    pub protocol: Protocol,
    pub health_check: HealthCheck,
    pub targets: Vec<InstanceRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub name: String,
    pub domain_name: String,
    pub subject_alternative_names: Vec<String>,
    /// Hosted zone used for DNS validation
    pub validation_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    pub name: String,
    pub load_balancer: String,
    pub protocol: Protocol,
    pub port: u16,
    pub default_target_group: String,
    pub certificate: Option<String>,
    pub open: bool,
}

/// The shared listeners, created once on the first tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerBootstrap {
    pub http: Listener,
    pub https: Option<Listener>,
    pub certificate: Option<Certificate>,
}

impl ListenerBootstrap {
    /// Listeners in rule-attachment order: HTTP first, then HTTPS
    pub fn active(&self) -> Vec<&Listener> {
        std::iter::once(&self.http)
            .chain(self.https.as_ref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerRule {
    pub name: String,
    pub listener: String,
    pub protocol: Protocol,
    pub priority: u32,
    pub host_header: String,
    pub target_group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingEntry {
    pub tenant: String,
    pub priority: u32,
    pub target_group: String,
    pub host_header: String,
    pub rules: Vec<ListenerRule>,
}

// ---------------------------------------------------------------------------
// Edge: zone, security groups, load balancer, bastions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedZone {
    pub name: String,
    pub zone_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRule {
    pub peer: Ipv4Net,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    pub name: String,
    pub vpc: String,
    pub ingress: Vec<IngressRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub name: String,
    pub internet_facing: bool,
    pub security_group: String,
    pub subnets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BastionHost {
    pub name: String,
    pub subnet: String,
    pub spec: InstanceSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResources {
    pub zone: HostedZone,
    pub app_security_group: SecurityGroup,
    pub lb_security_group: SecurityGroup,
    pub step_security_group: SecurityGroup,
    pub load_balancer: LoadBalancer,
    pub bastions: Vec<BastionHost>,
}

// ---------------------------------------------------------------------------
// DNS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    pub name: String,
    pub tenant: String,
    pub zone: String,
    pub record_name: String,
    pub record_type: String,
    /// Load balancer the alias resolves to
    pub alias_target: String,
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
}

/// What a policy statement applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "instances", rename_all = "camelCase")]
pub enum StatementScope {
    AllInstances,
    Instances(Vec<InstanceRef>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: StatementScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub name: String,
    pub statements: Vec<PolicyStatement>,
}

impl Policy {
    /// Instances the policy lets the holder start and stop
    pub fn scoped_instances(&self) -> Vec<&InstanceRef> {
        self.statements
            .iter()
            .filter_map(|s| match &s.resources {
                StatementScope::Instances(refs) => Some(refs.iter()),
                StatementScope::AllInstances => None,
            })
            .flatten()
            .collect()
    }
}

/// Reference to an attribute of another planned resource, resolved by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRef {
    pub resource: String,
    pub attribute: String,
}

impl AttributeRef {
    pub fn new(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }
}

/// Shape of the generated secret. The secret value itself only exists once
/// the backend generates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretTemplate {
    pub name: String,
    pub fields: BTreeMap<String, AttributeRef>,
    /// Key the backend writes its generated string under. Required by the
    /// backend, never read by anyone.
    pub generate_string_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantCredential {
    pub tenant: String,
    pub policy: Policy,
    pub identity: String,
    pub access_key: String,
    pub secret: SecretTemplate,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Everything the provisioning backend needs for one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyPlan {
    pub settings: DeploymentSettings,
    pub network: NetworkTopology,
    pub edge: EdgeResources,
    pub fleets: Vec<TenantFleet>,
    pub target_groups: Vec<TargetGroup>,
    /// `None` only when there are no tenants
    pub listeners: Option<ListenerBootstrap>,
    pub routes: Vec<RoutingEntry>,
    pub dns_records: Vec<DnsRecord>,
    pub credentials: Vec<TenantCredential>,
}

impl TopologyPlan {
    pub fn tenant_count(&self) -> usize {
        self.fleets.len()
    }

    pub fn instance_count(&self) -> usize {
        self.fleets.iter().map(|f| f.placements.len()).sum()
    }

    pub fn rule_count(&self) -> usize {
        self.routes.iter().map(|r| r.rules.len()).sum()
    }

    pub fn route(&self, tenant: &str) -> Option<&RoutingEntry> {
        self.routes.iter().find(|r| r.tenant == tenant)
    }

    pub fn credential(&self, tenant: &str) -> Option<&TenantCredential> {
        self.credentials.iter().find(|c| c.tenant == tenant)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_from_deployment_file() {
        let raw = json!({
            "prefix": "demo",
            "domain": "example.com",
            "subDomains": ["shop", "blog"],
            "instanceCount": 2
        });

        let settings: DeploymentSettings = serde_json::from_value(raw).unwrap();
        assert_eq!(settings.sub_domains, vec!["shop", "blog"]);
        assert_eq!(settings.instance_count, 2);
        assert!(!settings.use_cert);
        assert_eq!(settings.temp_priority, 0);
    }

    #[test]
    fn test_bootstrap_active_listener_order() {
        let listener = |protocol: Protocol| Listener {
            name: format!("demo-{}", protocol.as_str()),
            load_balancer: "demo-alb".to_string(),
            protocol,
            port: protocol.default_port(),
            default_target_group: "demo-a-tg".to_string(),
            certificate: None,
            open: true,
        };

        let http_only = ListenerBootstrap {
            http: listener(Protocol::Http),
            https: None,
            certificate: None,
        };
        assert_eq!(http_only.active().len(), 1);

        let both = ListenerBootstrap {
            https: Some(listener(Protocol::Https)),
            ..http_only
        };
        let protocols: Vec<Protocol> = both.active().iter().map(|l| l.protocol).collect();
        assert_eq!(protocols, vec![Protocol::Http, Protocol::Https]);
    }

    #[test]
    fn test_statement_scope_serialization() {
        let scope = StatementScope::Instances(vec![InstanceRef::new("demo-a-0")]);
        let value = serde_json::to_value(&scope).unwrap();
        assert_eq!(value, json!({"scope": "instances", "instances": ["demo-a-0"]}));

        let any = serde_json::to_value(&StatementScope::AllInstances).unwrap();
        assert_eq!(any, json!({"scope": "allInstances"}));
    }
}
