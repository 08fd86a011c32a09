use crate::models::{
    BastionHost, EdgeResources, HostedZone, ImageSelector, IngressRule, InstanceSpec,
    LoadBalancer, NetworkTopology, SecurityGroup,
};
use crate::naming::ResourceNames;
use crate::routing::APP_PORT;
use ipnet::Ipv4Net;
use std::collections::BTreeMap;

/// Instance shape for bastion hosts
pub const STEP_INSTANCE_TYPE: &str = "t4g.nano";
pub const STEP_HOST_COUNT: usize = 2;
const SSH_PORT: u16 = 22;

/// Derive the deployment-wide resources that sit in front of the tenants:
/// the hosted zone, security groups, the load balancer and the bastions.
pub fn plan_edge(
    names: &ResourceNames,
    domain: &str,
    network: &NetworkTopology,
) -> EdgeResources {
    let internal = network.cidr;

    let app_security_group = security_group(
        names.app_security_group(),
        network,
        vec![
            IngressRule {
                peer: internal,
                port: APP_PORT,
            },
            IngressRule {
                peer: internal,
                port: SSH_PORT,
            },
        ],
    );

    let lb_security_group = security_group(
        names.lb_security_group(),
        network,
        vec![
            IngressRule {
                peer: internal,
                port: 80,
            },
            IngressRule {
                peer: internal,
                port: 443,
            },
        ],
    );

    let step_security_group = security_group(
        names.step_security_group(),
        network,
        vec![IngressRule {
            peer: Ipv4Net::default(),
            port: SSH_PORT,
        }],
    );

    let load_balancer = LoadBalancer {
        name: names.load_balancer(),
        internet_facing: true,
        security_group: lb_security_group.name.clone(),
        subnets: network.public_subnets.iter().map(|s| s.name.clone()).collect(),
    };

    // step1 lands on public subnet 0, step2 on public subnet 1
    let bastions = (1..=STEP_HOST_COUNT)
        .filter_map(|number| {
            let subnet = network
                .public_subnets
                .get((number + 1) % network.public_subnets.len().max(1))?;
            let name = names.step_host(number);
            Some(BastionHost {
                name: name.clone(),
                subnet: subnet.name.clone(),
                spec: InstanceSpec {
                    instance_type: STEP_INSTANCE_TYPE.to_string(),
                    image: ImageSelector::default(),
                    key_name: names.step_key_pair(),
                    security_groups: vec![step_security_group.name.clone()],
                    tags: BTreeMap::from([("Name".to_string(), name)]),
                },
            })
        })
        .collect();

    EdgeResources {
        zone: HostedZone {
            name: names.hosted_zone(),
            zone_name: domain.to_string(),
        },
        app_security_group,
        lb_security_group,
        step_security_group,
        load_balancer,
        bastions,
    }
}

fn security_group(
    name: String,
    network: &NetworkTopology,
    ingress: Vec<IngressRule>,
) -> SecurityGroup {
    SecurityGroup {
        name,
        vpc: network.name.clone(),
        ingress,
    }
}
