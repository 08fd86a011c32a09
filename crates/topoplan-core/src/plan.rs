use crate::credentials::issue_credential;
use crate::dns::bind_dns;
use crate::edge::plan_edge;
use crate::errors::{PlanError, Result};
use crate::fleet::FleetAllocator;
use crate::models::{
    DeploymentSettings, DnsRecord, EdgeResources, ListenerBootstrap, NetworkTopology,
    RoutingEntry, TargetGroup, Tenant, TenantCredential, TenantFleet, TopologyPlan,
};
use crate::naming::{ResourceNames, TARGET_GROUP_NAME_MAX};
use crate::network::plan_network;
use crate::routing::{RoutingContext, RoutingSession, MAX_RULE_PRIORITY};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn dns_label() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("DNS label pattern compiles")
    })
}

/// Reject invalid input before anything is planned
pub fn validate_settings(settings: &DeploymentSettings) -> Result<()> {
    if settings.prefix.trim().is_empty() {
        return Err(PlanError::configuration("prefix cannot be empty"));
    }

    if settings.prefix.chars().any(char::is_whitespace) {
        return Err(PlanError::configuration(format!(
            "prefix '{}' cannot contain whitespace",
            settings.prefix
        )));
    }

    if settings.domain.trim().is_empty() {
        return Err(PlanError::configuration("domain cannot be empty"));
    }

    if settings.instance_count < 1 {
        return Err(PlanError::configuration(
            "instanceCount must be a positive integer",
        ));
    }

    let names = ResourceNames::new(&settings.prefix);
    let mut seen = HashSet::new();

    for subdomain in &settings.sub_domains {
        if !dns_label().is_match(subdomain) {
            return Err(PlanError::configuration(format!(
                "subdomain '{}' is not a valid lowercase DNS label",
                subdomain
            )));
        }

        if !seen.insert(subdomain.as_str()) {
            return Err(PlanError::configuration(format!(
                "duplicate subdomain '{}'",
                subdomain
            )));
        }

        let target_group = names.target_group(subdomain);
        if target_group.len() > TARGET_GROUP_NAME_MAX {
            return Err(PlanError::configuration(format!(
                "target group name '{}' exceeds {} characters",
                target_group, TARGET_GROUP_NAME_MAX
            )));
        }
    }

    let last_priority = u64::from(settings.temp_priority) + settings.sub_domains.len() as u64;
    if last_priority > u64::from(MAX_RULE_PRIORITY) {
        return Err(PlanError::configuration(format!(
            "tempPriority {} leaves no room for {} tenant(s) below priority {}",
            settings.temp_priority,
            settings.sub_domains.len(),
            MAX_RULE_PRIORITY
        )));
    }

    Ok(())
}

/// Per-deployment planning state, threaded through one ordered pass over the
/// tenants. The network and edge resources are read-only here.
pub struct PlanningSession<'a> {
    names: &'a ResourceNames,
    network: &'a NetworkTopology,
    edge: &'a EdgeResources,
    instance_count: u32,
    routing: RoutingSession<'a>,
    fleets: Vec<TenantFleet>,
    target_groups: Vec<TargetGroup>,
    routes: Vec<RoutingEntry>,
    dns_records: Vec<DnsRecord>,
    credentials: Vec<TenantCredential>,
}

/// What a finished session produced
pub struct SessionOutput {
    pub listeners: Option<ListenerBootstrap>,
    pub fleets: Vec<TenantFleet>,
    pub target_groups: Vec<TargetGroup>,
    pub routes: Vec<RoutingEntry>,
    pub dns_records: Vec<DnsRecord>,
    pub credentials: Vec<TenantCredential>,
}

impl<'a> PlanningSession<'a> {
    pub fn new(
        names: &'a ResourceNames,
        network: &'a NetworkTopology,
        edge: &'a EdgeResources,
        settings: &'a DeploymentSettings,
    ) -> Self {
        let routing = RoutingSession::new(
            RoutingContext::new(names, network, &settings.domain, settings.use_cert),
            settings.temp_priority,
        );

        Self {
            names,
            network,
            edge,
            instance_count: settings.instance_count,
            routing,
            fleets: Vec::new(),
            target_groups: Vec::new(),
            routes: Vec::new(),
            dns_records: Vec::new(),
            credentials: Vec::new(),
        }
    }

    /// Plan one tenant: fleet, then routing, then DNS and credentials
    pub fn plan_tenant(mut self, tenant: Tenant) -> Result<Self> {
        let fleet = FleetAllocator::new(self.names, &self.edge.app_security_group.name)
            .allocate_fleet(tenant, self.instance_count, &self.network.private_subnets)?;

        let (routing, target_group, route) = self.routing.route(&fleet)?;
        self.routing = routing;

        let record = bind_dns(
            self.names,
            &fleet.tenant,
            &self.edge.zone,
            &self.edge.load_balancer,
        );
        let credential = issue_credential(self.names, &fleet.tenant, fleet.placements.clone())?;

        self.target_groups.push(target_group);
        self.routes.push(route);
        self.dns_records.push(record);
        self.credentials.push(credential);
        self.fleets.push(fleet);

        Ok(self)
    }

    pub fn finish(self) -> SessionOutput {
        SessionOutput {
            listeners: self.routing.finish(),
            fleets: self.fleets,
            target_groups: self.target_groups,
            routes: self.routes,
            dns_records: self.dns_records,
            credentials: self.credentials,
        }
    }
}

/// Derive the complete plan for a deployment.
///
/// All-or-nothing: any validation failure or invariant violation returns an
/// error and no partial plan.
pub fn derive_plan(settings: &DeploymentSettings) -> Result<TopologyPlan> {
    validate_settings(settings)?;

    let names = ResourceNames::new(&settings.prefix);
    let network = plan_network(&names);
    let edge = plan_edge(&names, &settings.domain, &network);

    let output = settings
        .sub_domains
        .iter()
        .enumerate()
        .map(|(ordinal, subdomain)| Tenant::new(subdomain.clone(), ordinal))
        .try_fold(
            PlanningSession::new(&names, &network, &edge, settings),
            PlanningSession::plan_tenant,
        )?
        .finish();

    log::info!(
        "Derived plan '{}' for {} tenant(s), {} routing rule(s)",
        settings.prefix,
        output.fleets.len(),
        output.routes.iter().map(|r| r.rules.len()).sum::<usize>()
    );

    Ok(TopologyPlan {
        settings: settings.clone(),
        network,
        edge,
        fleets: output.fleets,
        target_groups: output.target_groups,
        listeners: output.listeners,
        routes: output.routes,
        dns_records: output.dns_records,
        credentials: output.credentials,
    })
}
