use crate::Result;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use topoplan_api::{ProvisioningReport, ResourceKind};
use topoplan_core::{TenantCredential, TopologyPlan};
use topoplan_utils::{
    format_health_check, format_listener, format_plan_summary, format_route_protocols,
};

/// Table formatting utilities
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    max_widths: Vec<usize>,
}

enum Rule {
    Top,
    Middle,
    Bottom,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        let max_widths = headers.iter().map(|h| h.chars().count()).collect();
        Self {
            headers,
            rows: Vec::new(),
            max_widths,
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            if i < self.max_widths.len() {
                self.max_widths[i] = self.max_widths[i].max(cell.chars().count());
            }
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render without colors so widths line up
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.rule(Rule::Top));
        out.push_str(&self.line(&self.headers));
        out.push_str(&self.rule(Rule::Middle));
        for row in &self.rows {
            out.push_str(&self.line(row));
        }
        out.push_str(&self.rule(Rule::Bottom));
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }

    fn rule(&self, position: Rule) -> String {
        let (left, joint, right) = match position {
            Rule::Top => ('┌', '┬', '┐'),
            Rule::Middle => ('├', '┼', '┤'),
            Rule::Bottom => ('└', '┴', '┘'),
        };

        let segments: Vec<String> = self
            .max_widths
            .iter()
            .map(|&width| "─".repeat(width + 2))
            .collect();

        format!("{}{}{}\n", left, segments.join(&joint.to_string()), right)
    }

    fn line(&self, cells: &[String]) -> String {
        let mut out = String::from("│");
        for (i, width) in self.max_widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            out.push_str(&format!(" {:<width$} │", cell, width = width));
        }
        out.push('\n');
        out
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}

/// Display the whole plan: shared resources first, then one row per tenant
pub fn display_plan(plan: &TopologyPlan) {
    println!(
        "{}",
        format!("Topology plan: {}", plan.settings.prefix).bold().blue()
    );
    println!("  {}: {}", "Domain".bold(), plan.settings.domain);
    println!(
        "  {}: {} ({})",
        "Network".bold(),
        plan.network.name,
        plan.network.cidr
    );
    println!(
        "  {}: {}",
        "Load balancer".bold(),
        plan.edge.load_balancer.name
    );

    match &plan.listeners {
        Some(bootstrap) => {
            let listeners: Vec<String> =
                bootstrap.active().into_iter().map(format_listener).collect();
            println!("  {}: {}", "Listeners".bold(), listeners.join(", "));
        }
        None => println!("  {}: {}", "Listeners".bold(), "none (no tenants)".yellow()),
    }
    println!();

    if plan.fleets.is_empty() {
        println!("{}", "No tenants in this deployment.".yellow());
        return;
    }

    tenant_table(plan).print();
    println!();
    credential_table(&plan.credentials).print();

    if let Some(target_group) = plan.target_groups.first() {
        println!(
            "\n  {}: {}",
            "Health check".bold(),
            format_health_check(&target_group.health_check)
        );
    }
    println!("  {}", format_plan_summary(plan).dimmed());
}

pub fn tenant_table(plan: &TopologyPlan) -> Table {
    let mut table = Table::new(headers(&[
        "Tenant",
        "Priority",
        "Host",
        "Protocols",
        "Instances",
        "Target",
    ]));

    for fleet in &plan.fleets {
        let tenant = fleet.tenant.subdomain.as_str();
        let (priority, host, protocols) = match plan.route(tenant) {
            Some(route) => (
                route.priority.to_string(),
                route.host_header.clone(),
                format_route_protocols(route),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };

        let target = fleet
            .external_target()
            .map(|p| p.instance.to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            tenant.to_string(),
            priority,
            host,
            protocols,
            fleet.placements.len().to_string(),
            target,
        ]);
    }

    table
}

pub fn credential_table(credentials: &[TenantCredential]) -> Table {
    let mut table = Table::new(headers(&["Tenant", "Identity", "Secret", "Scoped instances"]));

    for credential in credentials {
        let scoped: Vec<String> = credential
            .policy
            .scoped_instances()
            .into_iter()
            .map(|i| i.to_string())
            .collect();

        table.add_row(vec![
            credential.tenant.clone(),
            credential.identity.clone(),
            credential.secret.name.clone(),
            scoped.join(", "),
        ]);
    }

    table
}

/// Display what an apply created, in creation order
pub fn display_report(report: &ProvisioningReport) {
    let mut table = Table::new(headers(&["Kind", "Logical ID", "Physical ID"]));
    for resource in &report.resources {
        table.add_row(vec![
            resource.kind.to_string(),
            resource.logical_id.clone(),
            resource.physical_id.clone(),
        ]);
    }
    table.print();

    let elapsed = report.finished_at - report.started_at;
    println!(
        "\nApplied {} at {}",
        report.prefix,
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "{} resources in {}ms ({} listeners, {} rules, {} credentials)",
        report.len(),
        elapsed.num_milliseconds(),
        report.count(ResourceKind::Listener),
        report.count(ResourceKind::ListenerRule),
        report.count(ResourceKind::Credential)
    );
}

/// Interactive prompts
pub fn prompt_confirm(message: &str, default: bool) -> Result<bool> {
    let result = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(default)
        .interact()?;

    Ok(result)
}

/// Status messages
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use topoplan_core::{derive_plan, DeploymentSettings};

    fn plan() -> TopologyPlan {
        derive_plan(&DeploymentSettings {
            prefix: "demo".to_string(),
            domain: "example.com".to_string(),
            sub_domains: vec!["a".to_string(), "b".to_string()],
            instance_count: 2,
            use_cert: false,
            temp_priority: 0,
        })
        .unwrap()
    }

    #[test]
    fn test_table_render() {
        let mut table = Table::new(headers(&["Name", "N"]));
        table.add_row(vec!["shop".to_string(), "12".to_string()]);

        assert_eq!(
            table.render(),
            "┌──────┬────┐\n\
             │ Name │ N  │\n\
             ├──────┼────┤\n\
             │ shop │ 12 │\n\
             └──────┴────┘\n"
        );
    }

    #[test]
    fn test_table_pads_short_rows() {
        let mut table = Table::new(headers(&["A", "B"]));
        table.add_row(vec!["x".to_string()]);
        assert!(table.render().contains("│ x │   │"));
    }

    #[test]
    fn test_tenant_table_rows() {
        let rendered = tenant_table(&plan()).render();

        assert!(rendered.contains("a.example.com"));
        assert!(rendered.contains("demo-a-0"));
        assert!(rendered.contains("demo-b-0"));
        assert!(!rendered.contains("HTTPS"));
    }

    #[test]
    fn test_credential_table_rows() {
        let plan = plan();
        let rendered = credential_table(&plan.credentials).render();

        assert!(rendered.contains("demo-a-operator"));
        assert!(rendered.contains("demo-b-0, demo-b-1"));
    }
}
