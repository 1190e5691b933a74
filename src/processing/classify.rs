//! Subnet classification into per-role registries.

use super::rule_sets::default_acl_entries;
use super::state::TopologyState;
use crate::error::{TopologyError, TopologyResult};
use crate::models::Subnet;

/// Create the subnet's ACL with its role defaults and register the subnet,
/// its route table and its ACL under its role.
///
/// Purely additive: classifying the same subnet twice registers it twice.
/// Transit subnets share one ACL and are registered by the transit
/// orchestrator instead.
pub fn classify_subnet(state: &mut TopologyState, subnet: &Subnet) -> TopologyResult<()> {
    if !subnet.role.is_primary() {
        return Err(TopologyError::UnsupportedRole {
            role: subnet.role.to_string(),
            operation: "subnet classification".to_string(),
        });
    }

    let acl_id = state.resource_id(&format!(
        "{}-nacl-{}",
        subnet.role, subnet.availability_zone
    ));
    state.add_acl(&acl_id, subnet.role)?;
    state.associate_acl(&subnet.id, &acl_id)?;
    for entry in default_acl_entries(subnet.role, state.vpc_cidr) {
        state.add_acl_entry_to(&acl_id, entry)?;
    }

    let registry = state.registry_mut(subnet.role);
    registry.acl_ids.push(acl_id);
    registry.route_table_ids.push(subnet.route_table_id.clone());
    registry.subnet_ids.push(subnet.id.clone());

    log::debug!(
        "classified {} {} ({}) as {}",
        subnet.id,
        subnet.cidr,
        subnet.availability_zone,
        subnet.role
    );
    Ok(())
}

/// Classify every subnet in order.
pub fn classify_subnets(state: &mut TopologyState, subnets: &[Subnet]) -> TopologyResult<()> {
    for subnet in subnets {
        classify_subnet(state, subnet)?;
    }
    Ok(())
}
