use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kinds of resource the provisioning backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Network,
    HostedZone,
    SecurityGroup,
    LoadBalancer,
    Instance,
    TargetGroup,
    Listener,
    Certificate,
    ListenerRule,
    DnsRecord,
    Credential,
}

impl ResourceKind {
    /// Path segment used by the provisioning API
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Network => "networks",
            ResourceKind::HostedZone => "hosted-zones",
            ResourceKind::SecurityGroup => "security-groups",
            ResourceKind::LoadBalancer => "load-balancers",
            ResourceKind::Instance => "instances",
            ResourceKind::TargetGroup => "target-groups",
            ResourceKind::Listener => "listeners",
            ResourceKind::Certificate => "certificates",
            ResourceKind::ListenerRule => "listener-rules",
            ResourceKind::DnsRecord => "dns-records",
            ResourceKind::Credential => "credentials",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for generating physical references - allows for different implementations and testing
pub trait ReferenceGenerator {
    fn physical_id(&self, kind: ResourceKind, logical_id: &str) -> String;
}

/// Generates stable, ARN-style physical references.
///
/// The same (kind, logical id) pair always maps to the same reference, so a
/// re-derived plan provisioned against the in-memory backend yields identical
/// ids.
#[derive(Debug, Clone)]
pub struct DeterministicReferenceGenerator {
    region: String,
    account: String,
}

impl DeterministicReferenceGenerator {
    pub fn new(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account: account.into(),
        }
    }

    fn digest(kind: ResourceKind, logical_id: &str) -> String {
        let name = format!("{}/{}", kind.as_str(), logical_id);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
            .simple()
            .to_string()
    }
}

impl Default for DeterministicReferenceGenerator {
    fn default() -> Self {
        Self::new("us-east-1", "000000000000")
    }
}

impl ReferenceGenerator for DeterministicReferenceGenerator {
    fn physical_id(&self, kind: ResourceKind, logical_id: &str) -> String {
        let digest = Self::digest(kind, logical_id);
        let short = &digest[..17];
        let elb = format!(
            "arn:aws:elasticloadbalancing:{}:{}",
            self.region, self.account
        );

        match kind {
            ResourceKind::Network => format!("vpc-{}", short),
            ResourceKind::SecurityGroup => format!("sg-{}", short),
            ResourceKind::Instance => format!("i-{}", short),
            ResourceKind::HostedZone => format!("Z{}", digest[..13].to_uppercase()),
            ResourceKind::LoadBalancer => {
                format!("{}:loadbalancer/app/{}/{}", elb, logical_id, &digest[..16])
            }
            ResourceKind::TargetGroup => {
                format!("{}:targetgroup/{}/{}", elb, logical_id, &digest[..16])
            }
            ResourceKind::Listener => {
                format!("{}:listener/app/{}/{}", elb, logical_id, &digest[..16])
            }
            ResourceKind::ListenerRule => {
                format!("{}:listener-rule/app/{}/{}", elb, logical_id, &digest[..16])
            }
            ResourceKind::Certificate => format!(
                "arn:aws:acm:{}:{}:certificate/{}",
                self.region,
                self.account,
                Uuid::new_v5(&Uuid::NAMESPACE_OID, digest.as_bytes())
            ),
            ResourceKind::DnsRecord => format!("rrset-{}", short),
            ResourceKind::Credential => {
                format!("arn:aws:iam::{}:user/{}", self.account, logical_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_are_stable() {
        let generator = DeterministicReferenceGenerator::default();

        let first = generator.physical_id(ResourceKind::Instance, "demo-shop-0");
        let second = generator.physical_id(ResourceKind::Instance, "demo-shop-0");
        assert_eq!(first, second);
        assert!(first.starts_with("i-"));
        assert_eq!(first.len(), 19);
    }

    #[test]
    fn test_references_differ_by_kind_and_name() {
        let generator = DeterministicReferenceGenerator::default();

        assert_ne!(
            generator.physical_id(ResourceKind::Instance, "demo-shop-0"),
            generator.physical_id(ResourceKind::Instance, "demo-shop-1")
        );
        assert_ne!(
            generator.physical_id(ResourceKind::Network, "x"),
            generator.physical_id(ResourceKind::SecurityGroup, "x")
        );
    }

    #[test]
    fn test_arn_formats() {
        let generator = DeterministicReferenceGenerator::new("eu-west-1", "123456789012");

        let tg = generator.physical_id(ResourceKind::TargetGroup, "demo-shop-tg");
        assert!(tg.starts_with(
            "arn:aws:elasticloadbalancing:eu-west-1:123456789012:targetgroup/demo-shop-tg/"
        ));

        let cert = generator.physical_id(ResourceKind::Certificate, "demo-site-cert");
        assert!(cert.starts_with("arn:aws:acm:eu-west-1:123456789012:certificate/"));

        let user = generator.physical_id(ResourceKind::Credential, "demo-shop-operator");
        assert_eq!(user, "arn:aws:iam::123456789012:user/demo-shop-operator");
    }

    #[test]
    fn test_kind_path_segments() {
        assert_eq!(ResourceKind::ListenerRule.as_str(), "listener-rules");
        assert_eq!(ResourceKind::DnsRecord.to_string(), "dns-records");
    }
}
