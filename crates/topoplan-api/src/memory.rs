use crate::backend::{ProvisioningBackend, ResourceRef};
use crate::errors::{ApiError, Result};
use async_trait::async_trait;
use log::debug;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;
use topoplan_core::{
    Certificate, DnsRecord, EdgeResources, InstancePlacement, Listener, ListenerRule,
    NetworkTopology, TargetGroup, TenantCredential,
};
use topoplan_utils::{DeterministicReferenceGenerator, ReferenceGenerator, ResourceKind};

const SECRET_LENGTH: usize = 40;

/// One call made against the backend, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningCall {
    pub kind: ResourceKind,
    pub logical_id: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    calls: Vec<ProvisioningCall>,
    resources: BTreeMap<String, ResourceRef>,
    /// Names that exist without being resources of their own (subnets)
    known: BTreeSet<String>,
    listener_ports: BTreeMap<u16, String>,
    rule_priorities: BTreeMap<(String, u32), String>,
    secrets: BTreeMap<String, String>,
}

impl MemoryState {
    fn exists(&self, name: &str) -> bool {
        self.resources.contains_key(name) || self.known.contains(name)
    }

    fn require(&self, kind: ResourceKind, logical_id: &str, dependency: &str) -> Result<()> {
        if self.exists(dependency) {
            Ok(())
        } else {
            Err(ApiError::rejected(
                kind,
                logical_id,
                format!("depends on '{}', which does not exist", dependency),
            ))
        }
    }

    fn register(
        &mut self,
        generator: &DeterministicReferenceGenerator,
        kind: ResourceKind,
        logical_id: &str,
    ) -> Result<ResourceRef> {
        self.calls.push(ProvisioningCall {
            kind,
            logical_id: logical_id.to_string(),
        });

        if self.exists(logical_id) {
            return Err(ApiError::rejected(kind, logical_id, "already exists"));
        }

        let created = ResourceRef::new(kind, logical_id, generator.physical_id(kind, logical_id));
        debug!("In-memory backend created {} {}", kind, logical_id);
        self.resources
            .insert(logical_id.to_string(), created.clone());
        Ok(created)
    }
}

/// Backend that keeps everything in memory. Used for dry runs and tests.
///
/// It resolves references between declarations the way a real backend would,
/// so applying declarations out of dependency order fails here too.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    generator: DeterministicReferenceGenerator,
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, including rejected ones
    pub async fn calls(&self) -> Vec<ProvisioningCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn resources(&self) -> Vec<ResourceRef> {
        self.state.lock().await.resources.values().cloned().collect()
    }

    pub async fn resource(&self, logical_id: &str) -> Option<ResourceRef> {
        self.state.lock().await.resources.get(logical_id).cloned()
    }

    /// Listener name per load balancer port
    pub async fn listener_ports(&self) -> BTreeMap<u16, String> {
        self.state.lock().await.listener_ports.clone()
    }

    /// Secret value generated for a credential, keyed by secret name
    pub async fn secret_value(&self, secret_name: &str) -> Option<String> {
        self.state.lock().await.secrets.get(secret_name).cloned()
    }
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}

#[async_trait]
impl ProvisioningBackend for InMemoryBackend {
    async fn create_network(&self, network: &NetworkTopology) -> Result<ResourceRef> {
        let mut state = self.state.lock().await;
        let created = state.register(&self.generator, ResourceKind::Network, &network.name)?;

        state.known.extend(
            network
                .public_subnets
                .iter()
                .chain(&network.private_subnets)
                .map(|subnet| subnet.name.clone()),
        );

        Ok(created)
    }

    async fn create_edge(&self, edge: &EdgeResources) -> Result<Vec<ResourceRef>> {
        let mut state = self.state.lock().await;
        let mut created = Vec::new();

        created.push(state.register(&self.generator, ResourceKind::HostedZone, &edge.zone.name)?);

        for group in [
            &edge.app_security_group,
            &edge.lb_security_group,
            &edge.step_security_group,
        ] {
            state.require(ResourceKind::SecurityGroup, &group.name, &group.vpc)?;
            created.push(state.register(
                &self.generator,
                ResourceKind::SecurityGroup,
                &group.name,
            )?);
        }

        let lb = &edge.load_balancer;
        state.require(ResourceKind::LoadBalancer, &lb.name, &lb.security_group)?;
        for subnet in &lb.subnets {
            state.require(ResourceKind::LoadBalancer, &lb.name, subnet)?;
        }
        created.push(state.register(&self.generator, ResourceKind::LoadBalancer, &lb.name)?);

        for bastion in &edge.bastions {
            state.require(ResourceKind::Instance, &bastion.name, &bastion.subnet)?;
            created.push(state.register(&self.generator, ResourceKind::Instance, &bastion.name)?);
        }

        Ok(created)
    }

    async fn create_instance(&self, placement: &InstancePlacement) -> Result<ResourceRef> {
        let mut state = self.state.lock().await;
        let name = placement.instance.as_str();

        state.require(ResourceKind::Instance, name, &placement.subnet)?;
        for group in &placement.spec.security_groups {
            state.require(ResourceKind::Instance, name, group)?;
        }

        state.register(&self.generator, ResourceKind::Instance, name)
    }

    async fn create_target_group(&self, target_group: &TargetGroup) -> Result<ResourceRef> {
        let mut state = self.state.lock().await;
        let name = &target_group.name;

        state.require(ResourceKind::TargetGroup, name, &target_group.vpc)?;
        for target in &target_group.targets {
            state.require(ResourceKind::TargetGroup, name, target.as_str())?;
        }

        state.register(&self.generator, ResourceKind::TargetGroup, name)
    }

    async fn create_listener(&self, listener: &Listener) -> Result<ResourceRef> {
        let mut state = self.state.lock().await;
        let name = &listener.name;

        if let Some(existing) = state.listener_ports.get(&listener.port) {
            return Err(ApiError::rejected(
                ResourceKind::Listener,
                name,
                format!("port {} already served by '{}'", listener.port, existing),
            ));
        }

        state.require(ResourceKind::Listener, name, &listener.load_balancer)?;
        state.require(ResourceKind::Listener, name, &listener.default_target_group)?;
        if let Some(certificate) = &listener.certificate {
            state.require(ResourceKind::Listener, name, certificate)?;
        }

        let created = state.register(&self.generator, ResourceKind::Listener, name)?;
        state.listener_ports.insert(listener.port, name.clone());
        Ok(created)
    }

    async fn create_certificate(&self, certificate: &Certificate) -> Result<ResourceRef> {
        let mut state = self.state.lock().await;
        state.require(
            ResourceKind::Certificate,
            &certificate.name,
            &certificate.validation_zone,
        )?;
        state.register(&self.generator, ResourceKind::Certificate, &certificate.name)
    }

    async fn create_rule(&self, rule: &ListenerRule) -> Result<ResourceRef> {
        let mut state = self.state.lock().await;
        let name = &rule.name;

        state.require(ResourceKind::ListenerRule, name, &rule.listener)?;
        state.require(ResourceKind::ListenerRule, name, &rule.target_group)?;

        let slot = (rule.listener.clone(), rule.priority);
        if let Some(holder) = state.rule_priorities.get(&slot) {
            return Err(ApiError::rejected(
                ResourceKind::ListenerRule,
                name,
                format!(
                    "priority {} on '{}' already held by '{}'",
                    rule.priority, rule.listener, holder
                ),
            ));
        }

        let created = state.register(&self.generator, ResourceKind::ListenerRule, name)?;
        state.rule_priorities.insert(slot, name.clone());
        Ok(created)
    }

    async fn create_record(&self, record: &DnsRecord) -> Result<ResourceRef> {
        let mut state = self.state.lock().await;
        state.require(ResourceKind::DnsRecord, &record.name, &record.zone)?;
        state.require(ResourceKind::DnsRecord, &record.name, &record.alias_target)?;
        state.register(&self.generator, ResourceKind::DnsRecord, &record.name)
    }

    async fn create_credential(&self, credential: &TenantCredential) -> Result<ResourceRef> {
        let mut state = self.state.lock().await;
        let name = &credential.identity;

        for instance in credential.policy.scoped_instances() {
            state.require(ResourceKind::Credential, name, instance.as_str())?;
        }

        let created = state.register(&self.generator, ResourceKind::Credential, name)?;
        state
            .secrets
            .insert(credential.secret.name.clone(), generate_secret());
        Ok(created)
    }
}
