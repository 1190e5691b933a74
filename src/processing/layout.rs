//! Primary subnet layout.
//!
//! Public, private and isolated subnets are packed from the base of the VPC
//! upward, one per (subnet group, availability zone), each aligned on its own
//! mask. When the network attaches to a transit hub, the last /24 stays
//! reserved for transit subnets.

use super::carve::transit_window;
use super::classify::classify_subnet;
use super::security::{allow_ingress_from_vpc, declare_security_group};
use super::state::TopologyState;
use crate::config::MIN_PARENT_MASK;
use crate::error::{TopologyError, TopologyResult};
use crate::models::{
    cut_addr, ip_after_subnet, AddressBlock, NatType, Protocol, Route, RouteTarget, Subnet,
    SubnetGroup, SubnetRole, VnetDescriptor, MAX_LENGTH,
};
use crate::provision::Resource;
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// First address past the space usable by primary subnets.
fn allocation_limit(vpc: &AddressBlock, reserve_transit: bool) -> TopologyResult<u64> {
    if reserve_transit && vpc.mask <= MIN_PARENT_MASK {
        Ok(u32::from(transit_window(vpc)?.lo()) as u64)
    } else {
        Ok(u32::from(vpc.hi()) as u64 + 1)
    }
}

/// Assign blocks to every (group, AZ) pair, in configuration order.
///
/// With `reserve_transit` the transit window at the top of `vpc` is left free.
///
/// # Examples
/// ```
/// use vpc_topology_planner::models::{default_subnet_configuration, AddressBlock};
/// use vpc_topology_planner::processing::allocate_blocks;
/// let vpc = AddressBlock::new("10.0.0.0/16").unwrap();
/// let blocks = allocate_blocks(&vpc, &default_subnet_configuration(), 2, true).unwrap();
/// assert_eq!(blocks[0].to_string(), "10.0.0.0/23");
/// assert_eq!(blocks[5].to_string(), "10.0.10.0/23");
/// ```
pub fn allocate_blocks(
    vpc: &AddressBlock,
    groups: &[SubnetGroup],
    az_count: usize,
    reserve_transit: bool,
) -> TopologyResult<Vec<AddressBlock>> {
    let limit = allocation_limit(vpc, reserve_transit)?;
    let mut next_ip: Option<Ipv4Addr> = Some(vpc.lo());
    let mut blocks = Vec::with_capacity(groups.len() * az_count);

    for group in groups {
        if group.cidr_mask < vpc.mask || group.cidr_mask > MAX_LENGTH {
            return Err(TopologyError::InvalidCidr(format!(
                "/{} {} subnets do not fit in {vpc}",
                group.cidr_mask, group.role
            )));
        }
        for _ in 0..az_count {
            let exhausted = || {
                TopologyError::AddressSpaceExhausted(format!(
                    "no room for another /{} {} subnet in {vpc}",
                    group.cidr_mask, group.role
                ))
            };
            let candidate = next_ip.ok_or_else(exhausted)?;

            // Align up to the group's mask
            let start = if cut_addr(candidate, group.cidr_mask)? == candidate {
                candidate
            } else {
                ip_after_subnet(candidate, group.cidr_mask)?.ok_or_else(exhausted)?
            };
            let block = AddressBlock {
                addr: start,
                mask: group.cidr_mask,
            };
            if u32::from(block.hi()) as u64 >= limit {
                return Err(exhausted());
            }
            next_ip = ip_after_subnet(start, group.cidr_mask)?;
            blocks.push(block);
        }
    }
    Ok(blocks)
}

/// Create the primary subnets with their route tables, ACLs and default
/// internet/NAT routes. Returns the subnets in creation order.
pub fn provision_primary_subnets(
    state: &mut TopologyState,
    vnet: &VnetDescriptor,
    reserve_transit: bool,
) -> TopologyResult<Vec<Subnet>> {
    let azs = &vnet.availability_zones;
    if azs.is_empty() {
        return Err(TopologyError::Config(
            "at least one availability zone is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for group in &vnet.subnet_configuration {
        if !group.role.is_primary() {
            return Err(TopologyError::UnsupportedRole {
                role: group.role.to_string(),
                operation: "subnet_configuration (transit subnets come from the transit gateway settings)"
                    .to_string(),
            });
        }
        if !seen.insert(group.role) {
            return Err(TopologyError::Config(format!(
                "subnet_configuration lists the {} role more than once",
                group.role
            )));
        }
    }

    let blocks = allocate_blocks(
        &state.vpc_cidr,
        &vnet.subnet_configuration,
        azs.len(),
        reserve_transit,
    )?;
    let mut blocks = blocks.into_iter();
    let mut subnets = Vec::with_capacity(vnet.subnet_configuration.len() * azs.len());

    let has_public = seen.contains(&SubnetRole::Public);
    let igw_id = if has_public {
        let id = state.resource_id("igw");
        let vpc_id = state.vpc_id.clone();
        state.plan.declare(
            &id,
            Resource::InternetGateway,
            &[vpc_id.as_str()],
        )?;
        Some(id)
    } else {
        None
    };

    for group in &vnet.subnet_configuration {
        for az in azs {
            let cidr = blocks.next().ok_or_else(|| {
                TopologyError::AddressSpaceExhausted(format!("no block left for {} in {az}", group.role))
            })?;
            let route_table_id = state.resource_id(&format!("{}-rtb-{az}", group.role));
            state.add_route_table(&route_table_id, group.role)?;
            let subnet = Subnet {
                id: state.resource_id(&format!("{}-subnet-{az}", group.role)),
                availability_zone: az.clone(),
                role: group.role,
                cidr,
                route_table_id,
            };
            state.add_subnet(&subnet)?;
            classify_subnet(state, &subnet)?;
            log::info!("{} subnet {} {} in {az}", group.role, subnet.id, subnet.cidr);
            subnets.push(subnet);
        }
    }

    if let Some(igw_id) = &igw_id {
        for table in state.registry(SubnetRole::Public).route_table_ids.clone() {
            state.add_route_to(
                &table,
                Route {
                    destination: AddressBlock::any_ipv4(),
                    target: RouteTarget::InternetGateway(igw_id.clone()),
                },
                &[igw_id.as_str()],
            )?;
        }
    }

    let nats = provision_nat(state, vnet, igw_id.as_deref())?;
    let private_tables = state.registry(SubnetRole::Private).route_table_ids.clone();
    if nats.is_empty() && !private_tables.is_empty() {
        log::warn!("private subnets have no NAT device; they get no default route");
    }
    if !nats.is_empty() {
        for (j, table) in private_tables.iter().enumerate() {
            let nat_id = &nats[j % nats.len()];
            let target = match vnet.nat_type {
                NatType::Gateway => RouteTarget::NatGateway(nat_id.clone()),
                NatType::Instance => RouteTarget::Instance(nat_id.clone()),
            };
            state.add_route_to(
                table,
                Route {
                    destination: AddressBlock::any_ipv4(),
                    target,
                },
                &[nat_id.as_str()],
            )?;
        }
    }

    Ok(subnets)
}

/// Declare NAT devices in the public subnets, one per AZ unless capped.
///
/// NAT instances share one security group open to the VPC CIDR and each get
/// an elastic IP, so their egress address is stable.
fn provision_nat(
    state: &mut TopologyState,
    vnet: &VnetDescriptor,
    igw_id: Option<&str>,
) -> TopologyResult<Vec<String>> {
    let public: Vec<Subnet> = state.subnets_of(SubnetRole::Public).cloned().collect();
    let wanted = vnet.nat_gateways.unwrap_or(vnet.availability_zones.len());
    if wanted > public.len() {
        log::warn!(
            "{wanted} NAT devices requested but only {} public subnets; creating {}",
            public.len(),
            public.len()
        );
    }
    if wanted == 0 || public.is_empty() {
        return Ok(Vec::new());
    }

    let security_group_id = match vnet.nat_type {
        NatType::Gateway => None,
        NatType::Instance => {
            let id = state.resource_id("nat-sg");
            declare_security_group(state, &id, "NAT instances, all traffic from the VPC CIDR")?;
            allow_ingress_from_vpc(state, &id, Protocol::All, None, "VPC CIDR")?;
            Some(id)
        }
    };

    let mut nats = Vec::new();
    for subnet in public.iter().take(wanted) {
        let id = state.resource_id(&format!("nat-{}", subnet.availability_zone));
        let mut depends_on = vec![subnet.id.as_str()];
        depends_on.extend(igw_id);
        depends_on.extend(security_group_id.as_deref());
        state.plan.declare(
            &id,
            Resource::Nat {
                kind: vnet.nat_type,
                subnet_id: subnet.id.clone(),
            },
            &depends_on,
        )?;
        if vnet.nat_type == NatType::Instance {
            state.plan.declare(
                &format!("{id}-eip"),
                Resource::Eip {
                    instance_id: id.clone(),
                },
                &[id.as_str()],
            )?;
        }
        nats.push(id);
    }
    Ok(nats)
}
