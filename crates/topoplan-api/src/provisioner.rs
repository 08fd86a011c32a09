use crate::backend::{ProvisioningBackend, ResourceRef};
use crate::errors::Result;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use topoplan_core::{ListenerRule, TopologyPlan};
use topoplan_utils::ResourceKind;

/// What one apply created, in creation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningReport {
    pub prefix: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub resources: Vec<ResourceRef>,
}

impl ProvisioningReport {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.resources.iter().filter(|r| r.kind == kind).count()
    }

    pub fn find(&self, logical_id: &str) -> Option<&ResourceRef> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }
}

/// Applies a plan against a backend in dependency order.
///
/// Everything whose order matters is created one call at a time. DNS records
/// and credentials only depend on what already exists by then, so they are
/// created concurrently at the end. A failure stops the apply; nothing is
/// retried or rolled back.
pub struct Provisioner<B> {
    backend: B,
}

impl<B: ProvisioningBackend> Provisioner<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub async fn apply(&self, plan: &TopologyPlan) -> Result<ProvisioningReport> {
        let started_at = Utc::now();
        let mut resources = Vec::new();

        info!(
            "Provisioning {} ({} tenants)",
            plan.settings.prefix,
            plan.tenant_count()
        );

        resources.push(self.backend.create_network(&plan.network).await?);
        resources.extend(self.backend.create_edge(&plan.edge).await?);

        for fleet in &plan.fleets {
            for placement in &fleet.placements {
                resources.push(self.backend.create_instance(placement).await?);
            }
        }

        for target_group in &plan.target_groups {
            resources.push(self.backend.create_target_group(target_group).await?);
        }

        // The HTTPS listener references the certificate, so it goes first
        if let Some(bootstrap) = &plan.listeners {
            if let Some(certificate) = &bootstrap.certificate {
                resources.push(self.backend.create_certificate(certificate).await?);
            }
            for listener in bootstrap.active() {
                resources.push(self.backend.create_listener(listener).await?);
            }
        }

        for rule in rules_by_priority(plan) {
            debug!("Applying rule {} at priority {}", rule.name, rule.priority);
            resources.push(self.backend.create_rule(rule).await?);
        }

        let (records, credentials) = futures::try_join!(
            try_join_all(plan.dns_records.iter().map(|r| self.backend.create_record(r))),
            try_join_all(
                plan.credentials
                    .iter()
                    .map(|c| self.backend.create_credential(c))
            ),
        )?;
        resources.extend(records);
        resources.extend(credentials);

        let report = ProvisioningReport {
            prefix: plan.settings.prefix.clone(),
            started_at,
            finished_at: Utc::now(),
            resources,
        };

        info!(
            "Provisioned {} resources for {}",
            report.len(),
            report.prefix
        );

        Ok(report)
    }
}

/// Rules across all tenants, lowest priority first. Within one priority the
/// HTTP rule precedes the HTTPS rule.
fn rules_by_priority(plan: &TopologyPlan) -> Vec<&ListenerRule> {
    let mut rules: Vec<&ListenerRule> = plan.routes.iter().flat_map(|r| &r.rules).collect();
    rules.sort_by_key(|rule| (rule.priority, rule.protocol.default_port()));
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use topoplan_core::{derive_plan, DeploymentSettings};

    fn settings(sub_domains: &[&str], instance_count: u32, use_cert: bool) -> DeploymentSettings {
        DeploymentSettings {
            prefix: "demo".to_string(),
            domain: "example.com".to_string(),
            sub_domains: sub_domains.iter().map(|s| s.to_string()).collect(),
            instance_count,
            use_cert,
            temp_priority: 0,
        }
    }

    #[tokio::test]
    async fn test_dry_run_single_tenant_with_cert() {
        let plan = derive_plan(&settings(&["a"], 1, true)).unwrap();
        let provisioner = Provisioner::new(InMemoryBackend::new());

        let report = provisioner.apply(&plan).await.unwrap();

        assert_eq!(report.count(ResourceKind::Listener), 2);
        assert_eq!(report.count(ResourceKind::Certificate), 1);
        assert_eq!(report.count(ResourceKind::ListenerRule), 2);
        assert_eq!(report.count(ResourceKind::TargetGroup), 1);
        assert_eq!(report.count(ResourceKind::DnsRecord), 1);
        assert_eq!(report.count(ResourceKind::Credential), 1);
        // one app instance plus two step hosts
        assert_eq!(report.count(ResourceKind::Instance), 3);

        let ports = provisioner.backend().listener_ports().await;
        assert_eq!(ports.keys().copied().collect::<Vec<_>>(), vec![80, 443]);
        assert!(report.started_at <= report.finished_at);
    }

    #[tokio::test]
    async fn test_report_lists_every_resource() {
        let plan = derive_plan(&settings(&["a", "b"], 2, false)).unwrap();
        let provisioner = Provisioner::new(InMemoryBackend::new());

        let report = provisioner.apply(&plan).await.unwrap();
        let stored = provisioner.backend().resources().await;

        assert_eq!(report.len(), stored.len());
        for resource in &stored {
            assert_eq!(report.find(&resource.logical_id), Some(resource));
        }
        // network, zone, three groups, lb, two step hosts, four instances,
        // two target groups, one listener, two rules, two records, two users
        assert_eq!(report.len(), 21);
    }

    #[tokio::test]
    async fn test_rules_applied_in_priority_order() {
        let mut input = settings(&["c", "a", "b"], 1, true);
        input.temp_priority = 10;
        let plan = derive_plan(&input).unwrap();
        let provisioner = Provisioner::new(InMemoryBackend::new());

        provisioner.apply(&plan).await.unwrap();

        let rule_calls: Vec<String> = provisioner
            .backend()
            .calls()
            .await
            .into_iter()
            .filter(|call| call.kind == ResourceKind::ListenerRule)
            .map(|call| call.logical_id)
            .collect();

        assert_eq!(
            rule_calls,
            vec![
                "demo-c-http-rule",
                "demo-c-https-rule",
                "demo-a-http-rule",
                "demo-a-https-rule",
                "demo-b-http-rule",
                "demo-b-https-rule",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_deployment_provisions_shared_resources_only() {
        let plan = derive_plan(&settings(&[], 1, true)).unwrap();
        let provisioner = Provisioner::new(InMemoryBackend::new());

        let report = provisioner.apply(&plan).await.unwrap();

        assert_eq!(report.count(ResourceKind::Listener), 0);
        assert_eq!(report.count(ResourceKind::Credential), 0);
        assert_eq!(report.count(ResourceKind::LoadBalancer), 1);
    }

    #[tokio::test]
    async fn test_credentials_get_generated_secrets() {
        let plan = derive_plan(&settings(&["a", "b"], 1, false)).unwrap();
        let provisioner = Provisioner::new(InMemoryBackend::new());

        provisioner.apply(&plan).await.unwrap();

        let backend = provisioner.into_backend();
        let a = backend.secret_value("demo-a-credentials").await.unwrap();
        let b = backend.secret_value("demo-b-credentials").await.unwrap();
        assert_ne!(a, b);
    }
}
