use crate::models::{NetworkTopology, Subnet, SubnetKind};
use crate::naming::ResourceNames;
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// Address block shared by every deployment
pub const ADDRESS_BLOCK: Ipv4Addr = Ipv4Addr::new(172, 32, 0, 0);
pub const ADDRESS_PREFIX_LEN: u8 = 16;
pub const SUBNET_PREFIX_LEN: u8 = 20;
/// Availability zones spanned by the subnet pairs
pub const ZONE_COUNT: usize = 2;
/// One NAT gateway per zone for redundant egress
pub const NAT_GATEWAYS: usize = 2;

/// Derive the shared network for a deployment.
///
/// The shape is fixed: one /16 block carved into /20 subnets, public ones
/// first (one per zone) then private ones, plus two NAT gateways. The prefix
/// is only used for naming.
pub fn plan_network(names: &ResourceNames) -> NetworkTopology {
    let cidr = Ipv4Net::new(ADDRESS_BLOCK, ADDRESS_PREFIX_LEN)
        .expect("constant address prefix length is within range");

    let mut blocks = cidr
        .subnets(SUBNET_PREFIX_LEN)
        .expect("subnet prefix is longer than the address prefix");

    let public_subnets: Vec<Subnet> = (0..ZONE_COUNT)
        .zip(blocks.by_ref())
        .map(|(zone, block)| Subnet {
            name: names.public_subnet(zone),
            kind: SubnetKind::Public,
            cidr: block,
            zone,
        })
        .collect();

    let private_subnets: Vec<Subnet> = (0..ZONE_COUNT)
        .zip(blocks.by_ref())
        .map(|(zone, block)| Subnet {
            name: names.private_subnet(zone),
            kind: SubnetKind::Private,
            cidr: block,
            zone,
        })
        .collect();

    log::debug!(
        "Planned network {} ({}) with {} public and {} private subnets",
        names.network(),
        cidr,
        public_subnets.len(),
        private_subnets.len()
    );

    NetworkTopology {
        name: names.network(),
        cidr,
        public_subnets,
        private_subnets,
        nat_gateways: NAT_GATEWAYS,
        enable_dns_support: true,
        enable_dns_hostnames: true,
        instance_tenancy: "default".to_string(),
    }
}
