//! Routing table construction.
//!
//! Tenants are routed strictly in input order. Two pieces of state travel
//! with the pass: the priority counter and the listener state. Both live in a
//! [`RoutingSession`] that each step consumes and hands back, so there is no
//! shared mutable reference to check for "has the listener been created yet".

use crate::errors::{PlanError, Result};
use crate::models::{
    Certificate, HealthCheck, Listener, ListenerBootstrap, ListenerRule, NetworkTopology,
    Protocol, RoutingEntry, TargetGroup, TenantFleet,
};
use crate::naming::{host_header, ResourceNames};
use std::collections::BTreeMap;

/// Highest rule priority the load balancer accepts
pub const MAX_RULE_PRIORITY: u32 = 50_000;

/// Port the tenant application listens on
pub const APP_PORT: u16 = 5250;

/// Hands out one strictly increasing priority per tenant.
///
/// Every priority handed out is remembered with its holder; claiming a
/// priority twice is reported as [`PlanError::PriorityCollision`] instead of
/// silently producing two rules at the same position.
#[derive(Debug, Clone)]
pub struct PriorityAllocator {
    counter: u32,
    assigned: BTreeMap<u32, String>,
}

impl PriorityAllocator {
    /// Start counting at `base`; the first tenant gets `base + 1`
    pub fn starting_at(base: u32) -> Self {
        Self {
            counter: base,
            assigned: BTreeMap::new(),
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance the counter and assign the new value to `tenant`
    pub fn next_for(&mut self, tenant: &str) -> Result<u32> {
        let priority = self
            .counter
            .checked_add(1)
            .filter(|p| *p <= MAX_RULE_PRIORITY)
            .ok_or_else(|| {
                PlanError::configuration(format!(
                    "routing priority for tenant '{}' would exceed {} (counter at {})",
                    tenant, MAX_RULE_PRIORITY, self.counter
                ))
            })?;

        self.counter = priority;
        self.claim(tenant, priority)
    }

    /// Record `priority` as held by `tenant`
    pub fn claim(&mut self, tenant: &str, priority: u32) -> Result<u32> {
        if let Some(holder) = self.assigned.get(&priority) {
            log::error!(
                "Priority {} requested by '{}' is already held by '{}'",
                priority,
                tenant,
                holder
            );
            return Err(PlanError::PriorityCollision {
                tenant: tenant.to_string(),
                priority,
                holder: holder.clone(),
                counter: self.counter,
            });
        }

        self.assigned.insert(priority, tenant.to_string());
        Ok(priority)
    }

    /// Assigned priorities in ascending order
    pub fn assigned(&self) -> impl Iterator<Item = (u32, &str)> {
        self.assigned.iter().map(|(p, t)| (*p, t.as_str()))
    }
}

/// Listener lifecycle for one deployment.
///
/// `NoListener` moves to `ListenerReady` on the first tenant and stays there;
/// the bootstrap is never rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerState {
    NoListener,
    ListenerReady(ListenerBootstrap),
}

impl ListenerState {
    fn bootstrap(self, context: &RoutingContext<'_>, default_target_group: &TargetGroup) -> Self {
        match self {
            ListenerState::NoListener => {
                log::info!(
                    "Bootstrapping shared listeners on {} (https: {})",
                    default_target_group.name,
                    context.use_cert
                );
                ListenerState::ListenerReady(context.listeners_for(default_target_group))
            }
            ready @ ListenerState::ListenerReady(_) => ready,
        }
    }

    pub fn listeners(&self) -> Option<&ListenerBootstrap> {
        match self {
            ListenerState::NoListener => None,
            ListenerState::ListenerReady(bootstrap) => Some(bootstrap),
        }
    }

    pub fn into_listeners(self) -> Option<ListenerBootstrap> {
        match self {
            ListenerState::NoListener => None,
            ListenerState::ListenerReady(bootstrap) => Some(bootstrap),
        }
    }
}

/// Deployment-wide inputs shared by every routing step
#[derive(Debug, Clone)]
pub struct RoutingContext<'a> {
    pub names: &'a ResourceNames,
    pub domain: &'a str,
    pub use_cert: bool,
    pub vpc: &'a str,
    pub load_balancer: String,
    pub zone: String,
}

impl<'a> RoutingContext<'a> {
    pub fn new(
        names: &'a ResourceNames,
        network: &'a NetworkTopology,
        domain: &'a str,
        use_cert: bool,
    ) -> Self {
        Self {
            names,
            domain,
            use_cert,
            vpc: &network.name,
            load_balancer: names.load_balancer(),
            zone: names.hosted_zone(),
        }
    }

    fn listeners_for(&self, default_target_group: &TargetGroup) -> ListenerBootstrap {
        let http = self.listener(Protocol::Http, default_target_group, None);

        let (https, certificate) = if self.use_cert {
            let certificate = Certificate {
                name: self.names.certificate(),
                domain_name: self.domain.to_string(),
                subject_alternative_names: vec![format!("*.{}", self.domain)],
                validation_zone: self.zone.clone(),
            };
            let https = self.listener(
                Protocol::Https,
                default_target_group,
                Some(certificate.name.clone()),
            );
            (Some(https), Some(certificate))
        } else {
            (None, None)
        };

        ListenerBootstrap {
            http,
            https,
            certificate,
        }
    }

    fn listener(
        &self,
        protocol: Protocol,
        default_target_group: &TargetGroup,
        certificate: Option<String>,
    ) -> Listener {
        Listener {
            name: self.names.listener(protocol),
            load_balancer: self.load_balancer.clone(),
            protocol,
            port: protocol.default_port(),
            default_target_group: default_target_group.name.clone(),
            certificate,
            open: true,
        }
    }
}

/// Build a tenant's target group. Only the first placement is registered.
pub fn build_target_group(
    names: &ResourceNames,
    vpc: &str,
    fleet: &TenantFleet,
) -> Result<TargetGroup> {
    let target = fleet.external_target().ok_or_else(|| {
        PlanError::configuration(format!(
            "tenant '{}' has no instances to route to",
            fleet.tenant.subdomain
        ))
    })?;

    Ok(TargetGroup {
        name: names.target_group(&fleet.tenant.subdomain),
        tenant: fleet.tenant.subdomain.clone(),
        vpc: vpc.to_string(),
        port: APP_PORT,
        protocol: Protocol::Http,
        health_check: HealthCheck::default(),
        targets: vec![target.instance.clone()],
    })
}

/// Order-dependent routing state threaded through the tenant pass
#[derive(Debug, Clone)]
pub struct RoutingSession<'a> {
    context: RoutingContext<'a>,
    priorities: PriorityAllocator,
    listeners: ListenerState,
}

impl<'a> RoutingSession<'a> {
    pub fn new(context: RoutingContext<'a>, base_priority: u32) -> Self {
        Self {
            context,
            priorities: PriorityAllocator::starting_at(base_priority),
            listeners: ListenerState::NoListener,
        }
    }

    pub fn listener_state(&self) -> &ListenerState {
        &self.listeners
    }

    pub fn priorities(&self) -> &PriorityAllocator {
        &self.priorities
    }

    /// Route one tenant and hand the session back for the next one
    pub fn route(mut self, fleet: &TenantFleet) -> Result<(Self, TargetGroup, RoutingEntry)> {
        let tenant = fleet.tenant.subdomain.as_str();
        let target_group = build_target_group(self.context.names, self.context.vpc, fleet)?;
        let priority = self.priorities.next_for(tenant)?;

        self.listeners = self.listeners.bootstrap(&self.context, &target_group);

        let host = host_header(tenant, self.context.domain);
        let rules = self
            .listeners
            .listeners()
            .map(|bootstrap| bootstrap.active())
            .unwrap_or_default()
            .into_iter()
            .map(|listener| ListenerRule {
                name: self.context.names.rule(tenant, listener.protocol),
                listener: listener.name.clone(),
                protocol: listener.protocol,
                priority,
                host_header: host.clone(),
                target_group: target_group.name.clone(),
            })
            .collect();

        log::debug!(
            "Routed {} at priority {} via {}",
            host,
            priority,
            target_group.name
        );

        let entry = RoutingEntry {
            tenant: tenant.to_string(),
            priority,
            target_group: target_group.name.clone(),
            host_header: host,
            rules,
        };

        Ok((self, target_group, entry))
    }

    pub fn finish(self) -> Option<ListenerBootstrap> {
        self.listeners.into_listeners()
    }
}

/// Result of routing every tenant of a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    pub listeners: Option<ListenerBootstrap>,
    pub target_groups: Vec<TargetGroup>,
    pub entries: Vec<RoutingEntry>,
}

/// Route `fleets` in order, starting the priority counter at `base_priority`
pub fn build_routes(
    names: &ResourceNames,
    fleets: &[TenantFleet],
    network: &NetworkTopology,
    use_cert: bool,
    domain: &str,
    base_priority: u32,
) -> Result<RoutingTable> {
    let session = RoutingSession::new(
        RoutingContext::new(names, network, domain, use_cert),
        base_priority,
    );

    let (session, target_groups, entries) = fleets.iter().try_fold(
        (session, Vec::new(), Vec::new()),
        |(session, mut target_groups, mut entries), fleet| {
            let (session, target_group, entry) = session.route(fleet)?;
            target_groups.push(target_group);
            entries.push(entry);
            Ok::<_, PlanError>((session, target_groups, entries))
        },
    )?;

    Ok(RoutingTable {
        listeners: session.finish(),
        target_groups,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::FleetAllocator;
    use crate::models::Tenant;
    use crate::network::plan_network;

    fn fleets(
        names: &ResourceNames,
        network: &NetworkTopology,
        tenants: &[&str],
    ) -> Vec<TenantFleet> {
        let allocator = FleetAllocator::new(names, names.app_security_group());
        tenants
            .iter()
            .enumerate()
            .map(|(i, t)| {
                allocator
                    .allocate_fleet(Tenant::new(*t, i), 2, &network.private_subnets)
                    .unwrap()
            })
            .collect()
    }

    fn routes(tenants: &[&str], use_cert: bool, base: u32) -> RoutingTable {
        let names = ResourceNames::new("demo");
        let network = plan_network(&names);
        let fleets = fleets(&names, &network, tenants);
        build_routes(&names, &fleets, &network, use_cert, "example.com", base).unwrap()
    }

    #[test]
    fn test_priorities_follow_input_order() {
        let table = routes(&["a", "b", "c"], false, 0);

        let priorities: Vec<(&str, u32)> = table
            .entries
            .iter()
            .map(|e| (e.tenant.as_str(), e.priority))
            .collect();
        assert_eq!(priorities, vec![("a", 1), ("b", 2), ("c", 3)]);
    }

    #[test]
    fn test_base_priority_offsets_counter() {
        let table = routes(&["a", "b"], false, 10);

        let priorities: Vec<u32> = table.entries.iter().map(|e| e.priority).collect();
        assert_eq!(priorities, vec![11, 12]);
    }

    #[test]
    fn test_http_only_without_certificate() {
        let table = routes(&["a", "b"], false, 0);
        let listeners = table.listeners.unwrap();

        assert!(listeners.https.is_none());
        assert!(listeners.certificate.is_none());
        assert_eq!(listeners.http.default_target_group, "demo-a-tg");
        assert!(table
            .entries
            .iter()
            .all(|e| e.rules.len() == 1 && e.rules[0].protocol == Protocol::Http));
    }

    #[test]
    fn test_certificate_adds_https_listener_once() {
        let table = routes(&["a", "b", "c"], true, 0);
        let listeners = table.listeners.unwrap();

        let https = listeners.https.unwrap();
        let certificate = listeners.certificate.unwrap();
        assert_eq!(https.port, 443);
        assert_eq!(https.certificate.as_deref(), Some("demo-site-cert"));
        assert_eq!(https.default_target_group, "demo-a-tg");
        assert_eq!(certificate.domain_name, "example.com");
        assert_eq!(certificate.subject_alternative_names, vec!["*.example.com"]);

        for entry in &table.entries {
            let protocols: Vec<Protocol> = entry.rules.iter().map(|r| r.protocol).collect();
            assert_eq!(protocols, vec![Protocol::Http, Protocol::Https]);
            assert!(entry.rules.iter().all(|r| r.priority == entry.priority));
        }
    }

    #[test]
    fn test_rules_match_host_header() {
        let table = routes(&["shop"], false, 0);
        let rule = &table.entries[0].rules[0];

        assert_eq!(rule.host_header, "shop.example.com");
        assert_eq!(rule.listener, "demo-http");
        assert_eq!(rule.target_group, "demo-shop-tg");
        assert_eq!(rule.name, "demo-shop-http-rule");
    }

    #[test]
    fn test_target_group_registers_first_placement_only() {
        let table = routes(&["a", "b"], false, 0);

        for tg in &table.target_groups {
            assert_eq!(tg.targets.len(), 1);
            assert_eq!(tg.targets[0].as_str(), format!("demo-{}-0", tg.tenant));
            assert_eq!(tg.port, APP_PORT);
            assert_eq!(tg.health_check, HealthCheck::default());
        }
    }

    #[test]
    fn test_no_tenants_no_listeners() {
        let table = routes(&[], true, 0);

        assert!(table.listeners.is_none());
        assert!(table.entries.is_empty());
        assert!(table.target_groups.is_empty());
    }

    #[test]
    fn test_listener_state_is_terminal() {
        let names = ResourceNames::new("demo");
        let network = plan_network(&names);
        let fleets = fleets(&names, &network, &["a", "b"]);
        let session =
            RoutingSession::new(RoutingContext::new(&names, &network, "example.com", true), 0);
        assert_eq!(session.listener_state(), &ListenerState::NoListener);

        let (session, _, _) = session.route(&fleets[0]).unwrap();
        let after_first = session.listener_state().clone();
        let (session, _, _) = session.route(&fleets[1]).unwrap();

        assert_eq!(session.listener_state(), &after_first);
        assert_eq!(session.priorities().counter(), 2);
    }

    #[test]
    fn test_priority_collision_is_reported() {
        let mut allocator = PriorityAllocator::starting_at(0);
        assert_eq!(allocator.next_for("a").unwrap(), 1);

        let err = allocator.claim("b", 1).unwrap_err();
        match err {
            PlanError::PriorityCollision {
                tenant,
                priority,
                holder,
                counter,
            } => {
                assert_eq!(tenant, "b");
                assert_eq!(priority, 1);
                assert_eq!(holder, "a");
                assert_eq!(counter, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_priority_ceiling() {
        let mut allocator = PriorityAllocator::starting_at(MAX_RULE_PRIORITY - 1);
        assert_eq!(allocator.next_for("a").unwrap(), MAX_RULE_PRIORITY);

        let err = allocator.next_for("b").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(allocator.assigned().count(), 1);
    }

    #[test]
    fn test_target_group_requires_placements() {
        let names = ResourceNames::new("demo");
        let fleet = TenantFleet {
            tenant: Tenant::new("empty", 0),
            placements: Vec::new(),
        };

        assert!(build_target_group(&names, "vpc-demo", &fleet).is_err());
    }
}
