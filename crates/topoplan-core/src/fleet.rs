use crate::errors::{PlanError, Result};
use crate::models::{
    ImageSelector, InstancePlacement, InstanceRef, InstanceSpec, Subnet, Tenant, TenantFleet,
};
use crate::naming::ResourceNames;
use std::collections::BTreeMap;

/// Instance shape for tenant application hosts
pub const APP_INSTANCE_TYPE: &str = "t4g.micro";

/// Places each tenant's instances across the private subnets.
///
/// Instance `i` lands in `private_subnets[i % len]`, so with the two private
/// subnets of the planned network a fleet alternates between zones no matter
/// how many instances it has.
#[derive(Debug, Clone)]
pub struct FleetAllocator<'a> {
    names: &'a ResourceNames,
    security_group: String,
}

impl<'a> FleetAllocator<'a> {
    pub fn new(names: &'a ResourceNames, security_group: impl Into<String>) -> Self {
        Self {
            names,
            security_group: security_group.into(),
        }
    }

    pub fn allocate(
        &self,
        tenant: &Tenant,
        instance_count: u32,
        private_subnets: &[Subnet],
    ) -> Result<Vec<InstancePlacement>> {
        if instance_count < 1 {
            return Err(PlanError::configuration(format!(
                "instance count for tenant '{}' must be at least 1",
                tenant.subdomain
            )));
        }

        if private_subnets.len() < 2 {
            return Err(PlanError::configuration(format!(
                "fleet placement needs at least 2 private subnets, got {}",
                private_subnets.len()
            )));
        }

        let placements = (0..instance_count as usize)
            .map(|index| {
                let subnet = &private_subnets[index % private_subnets.len()];
                let instance_name = self.names.instance(&tenant.subdomain, index);

                InstancePlacement {
                    tenant: tenant.subdomain.clone(),
                    index,
                    subnet: subnet.name.clone(),
                    instance: InstanceRef::new(instance_name.clone()),
                    spec: InstanceSpec {
                        instance_type: APP_INSTANCE_TYPE.to_string(),
                        image: ImageSelector::default(),
                        key_name: self.names.key_pair(&tenant.subdomain),
                        security_groups: vec![self.security_group.clone()],
                        tags: BTreeMap::from([("Name".to_string(), instance_name)]),
                    },
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Allocated {} instance(s) for tenant '{}'",
            placements.len(),
            tenant.subdomain
        );

        Ok(placements)
    }

    /// Allocate and wrap the result together with its tenant
    pub fn allocate_fleet(
        &self,
        tenant: Tenant,
        instance_count: u32,
        private_subnets: &[Subnet],
    ) -> Result<TenantFleet> {
        let placements = self.allocate(&tenant, instance_count, private_subnets)?;
        Ok(TenantFleet { tenant, placements })
    }
}

/// The one placement that is externally reachable
pub fn external_target(placements: &[InstancePlacement]) -> Option<&InstancePlacement> {
    placements.first()
}
