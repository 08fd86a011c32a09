use crate::errors::{PlanError, Result};
use crate::models::{
    AttributeRef, Effect, InstancePlacement, Policy, PolicyStatement, SecretTemplate,
    StatementScope, Tenant, TenantCredential,
};
use crate::naming::ResourceNames;
use std::collections::BTreeMap;

pub const DESCRIBE_ACTIONS: &[&str] = &["ec2:DescribeInstances"];
pub const POWER_ACTIONS: &[&str] = &["ec2:StartInstances", "ec2:StopInstances"];

/// Key the secret backend fills with its generated string
pub const FILLER_SECRET_KEY: &str = "dummy";

/// Issue the least-privilege credential for one tenant.
///
/// The start/stop statement is scoped to exactly the instances in
/// `placements`, which the caller passes straight from the fleet allocator.
pub fn issue_credential(
    names: &ResourceNames,
    tenant: &Tenant,
    placements: Vec<InstancePlacement>,
) -> Result<TenantCredential> {
    if placements.is_empty() {
        return Err(PlanError::configuration(format!(
            "cannot issue a credential for tenant '{}' without instances",
            tenant.subdomain
        )));
    }

    let scoped = placements.into_iter().map(|p| p.instance).collect();

    let policy = Policy {
        name: names.policy(&tenant.subdomain),
        statements: vec![
            PolicyStatement {
                effect: Effect::Allow,
                actions: actions(DESCRIBE_ACTIONS),
                resources: StatementScope::AllInstances,
            },
            PolicyStatement {
                effect: Effect::Allow,
                actions: actions(POWER_ACTIONS),
                resources: StatementScope::Instances(scoped),
            },
        ],
    };

    let access_key = names.access_key(&tenant.subdomain);
    let fields = BTreeMap::from([
        (
            "accessKeyId".to_string(),
            AttributeRef::new(access_key.clone(), "AccessKeyId"),
        ),
        (
            "secretAccessKey".to_string(),
            AttributeRef::new(access_key.clone(), "SecretAccessKey"),
        ),
    ]);

    Ok(TenantCredential {
        tenant: tenant.subdomain.clone(),
        policy,
        identity: names.identity(&tenant.subdomain),
        access_key,
        secret: SecretTemplate {
            name: names.secret(&tenant.subdomain),
            fields,
            generate_string_key: FILLER_SECRET_KEY.to_string(),
        },
    })
}

fn actions(list: &[&str]) -> Vec<String> {
    list.iter().map(|a| a.to_string()).collect()
}
