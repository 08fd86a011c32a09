//! Resource naming.
//!
//! Every derived resource name comes from here so that two components can
//! never disagree about what a tenant's instance or target group is called.

use crate::models::Protocol;

/// Maximum length the load balancer accepts for a target group name
pub const TARGET_GROUP_NAME_MAX: usize = 32;

/// Name builder bound to one deployment prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    prefix: String,
}

impl ResourceNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // Deployment-wide resources

    pub fn network(&self) -> String {
        format!("vpc-{}", self.prefix)
    }

    pub fn public_subnet(&self, zone: usize) -> String {
        format!("{}-public-{}", self.prefix, zone)
    }

    pub fn private_subnet(&self, zone: usize) -> String {
        format!("{}-private-{}", self.prefix, zone)
    }

    pub fn hosted_zone(&self) -> String {
        format!("{}-hosted-zone", self.prefix)
    }

    pub fn app_security_group(&self) -> String {
        format!("{}-sg-app", self.prefix)
    }

    pub fn lb_security_group(&self) -> String {
        format!("{}-sg-alb", self.prefix)
    }

    pub fn step_security_group(&self) -> String {
        format!("{}-sg-step", self.prefix)
    }

    pub fn load_balancer(&self) -> String {
        format!("{}-alb", self.prefix)
    }

    pub fn step_host(&self, number: usize) -> String {
        format!("{}-step{}", self.prefix, number)
    }

    pub fn step_key_pair(&self) -> String {
        format!("{}-step", self.prefix)
    }

    pub fn listener(&self, protocol: Protocol) -> String {
        format!("{}-{}", self.prefix, protocol.as_str())
    }

    pub fn certificate(&self) -> String {
        format!("{}-site-cert", self.prefix)
    }

    // Per-tenant resources

    pub fn instance(&self, tenant: &str, index: usize) -> String {
        format!("{}-{}-{}", self.prefix, tenant, index)
    }

    pub fn key_pair(&self, tenant: &str) -> String {
        format!("{}-{}", self.prefix, tenant)
    }

    pub fn target_group(&self, tenant: &str) -> String {
        format!("{}-{}-tg", self.prefix, tenant)
    }

    pub fn rule(&self, tenant: &str, protocol: Protocol) -> String {
        format!("{}-{}-{}-rule", self.prefix, tenant, protocol.as_str())
    }

    pub fn record_set(&self, tenant: &str) -> String {
        format!("{}-{}-record-set", self.prefix, tenant)
    }

    pub fn policy(&self, tenant: &str) -> String {
        format!("{}-{}-instance-policy", self.prefix, tenant)
    }

    pub fn identity(&self, tenant: &str) -> String {
        format!("{}-{}-operator", self.prefix, tenant)
    }

    pub fn access_key(&self, tenant: &str) -> String {
        format!("{}-{}-access-key", self.prefix, tenant)
    }

    pub fn secret(&self, tenant: &str) -> String {
        format!("{}-{}-credentials", self.prefix, tenant)
    }
}

/// Host header a tenant's routing rules match on
pub fn host_header(subdomain: &str, domain: &str) -> String {
    format!("{}.{}", subdomain, domain)
}
