use topoplan_core::{HealthCheck, Listener, RoutingEntry, TopologyPlan};

/// Trait for formatting different types of data
pub trait Formatter<T> {
    fn format(&self, input: T) -> String;
}

/// Health check formatter, e.g. "GET / -> 200 every 30s"
pub struct HealthCheckFormatter;

impl Formatter<&HealthCheck> for HealthCheckFormatter {
    fn format(&self, check: &HealthCheck) -> String {
        format!(
            "GET {} -> {} every {}s",
            check.path, check.healthy_http_codes, check.interval_secs
        )
    }
}

/// Listener formatter, e.g. "HTTPS:443 (cert demo-site-cert)"
pub struct ListenerFormatter;

impl Formatter<&Listener> for ListenerFormatter {
    fn format(&self, listener: &Listener) -> String {
        match &listener.certificate {
            Some(cert) => format!("{}:{} (cert {})", listener.protocol, listener.port, cert),
            None => format!("{}:{}", listener.protocol, listener.port),
        }
    }
}

/// Renders the protocols a route is reachable on, e.g. "HTTP+HTTPS"
pub struct RouteProtocolsFormatter;

impl Formatter<&RoutingEntry> for RouteProtocolsFormatter {
    fn format(&self, entry: &RoutingEntry) -> String {
        let protocols: Vec<String> = entry.rules.iter().map(|r| r.protocol.to_string()).collect();
        if protocols.is_empty() {
            "-".to_string()
        } else {
            protocols.join("+")
        }
    }
}

/// One line plan summary
pub struct PlanSummaryFormatter;

impl Formatter<&TopologyPlan> for PlanSummaryFormatter {
    fn format(&self, plan: &TopologyPlan) -> String {
        let listeners = plan
            .listeners
            .as_ref()
            .map(|l| l.active().len())
            .unwrap_or(0);

        format!(
            "{} tenant(s), {} instance(s), {} listener(s), {} rule(s) behind {}",
            plan.tenant_count(),
            plan.instance_count(),
            listeners,
            plan.rule_count(),
            plan.edge.load_balancer.name
        )
    }
}

// Convenience functions
pub fn format_health_check(check: &HealthCheck) -> String {
    HealthCheckFormatter.format(check)
}

pub fn format_listener(listener: &Listener) -> String {
    ListenerFormatter.format(listener)
}

pub fn format_route_protocols(entry: &RoutingEntry) -> String {
    RouteProtocolsFormatter.format(entry)
}

pub fn format_plan_summary(plan: &TopologyPlan) -> String {
    PlanSummaryFormatter.format(plan)
}

/// Masks a secret down to its first and last four characters, e.g.
/// "abcd****5678". Anything of eight characters or fewer is fully masked.
pub struct SecretFormatter;

impl Formatter<&str> for SecretFormatter {
    fn format(&self, secret: &str) -> String {
        let chars: Vec<char> = secret.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", head, tail)
    }
}

pub fn mask_secret(secret: &str) -> String {
    SecretFormatter.format(secret)
}
