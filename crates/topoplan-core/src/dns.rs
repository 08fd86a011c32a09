use crate::models::{DnsRecord, HostedZone, LoadBalancer, Tenant};
use crate::naming::ResourceNames;

/// Alias A-record pointing a tenant's subdomain at the shared load balancer.
/// Emitted once per tenant regardless of certificate state.
pub fn bind_dns(
    names: &ResourceNames,
    tenant: &Tenant,
    zone: &HostedZone,
    load_balancer: &LoadBalancer,
) -> DnsRecord {
    DnsRecord {
        name: names.record_set(&tenant.subdomain),
        tenant: tenant.subdomain.clone(),
        zone: zone.name.clone(),
        record_name: tenant.subdomain.clone(),
        record_type: "A".to_string(),
        alias_target: load_balancer.name.clone(),
    }
}
