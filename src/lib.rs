// cargo watch -x 'fmt' -x 'test'

//! Plans the subnet topology of a virtual network: primary subnets per role,
//! transit subnets carved from the top of the address block, default ACLs,
//! routes, the transit hub attachment, security groups and flow logs, as a
//! dependency-ordered resource plan.

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod provision;

use config::PlanConfig;
use models::AddressBlock;
use processing::{
    add_acl_entry, add_flow_logs, add_route, add_vpc_security_groups, attach_gateway_endpoints,
    provision_primary_subnets, TopologyState, TransitOrchestrator,
};
use provision::SecretResolver;

pub use error::{TopologyError, TopologyResult};
pub use processing::check_for_overlapping_subnets;

/// Plan the whole network described by `config`.
///
/// Steps run in order: primary layout, transit orchestration (when
/// configured), caller routes, caller ACL entries, gateway endpoints, VPC
/// security groups, flow logs and a final overlap check. The transit window
/// is only held back from the primary layout when a transit hub is configured.
pub fn plan_topology(
    config: &PlanConfig,
    resolver: &dyn SecretResolver,
) -> TopologyResult<TopologyState> {
    log::info!("#Start plan_topology() {} {}", config.name, config.vpc);
    let cidr = AddressBlock::new(config.cidr_block()?)?;
    let mut state = TopologyState::new(&config.name, cidr)?;

    provision_primary_subnets(&mut state, &config.vpc, config.transit_gateway.is_some())?;

    if let Some(transit) = &config.transit_gateway {
        let mut orchestrator = TransitOrchestrator::new(transit.clone());
        orchestrator.run(&mut state, &config.vpc.availability_zones, resolver)?;
    }

    for request in &config.routes {
        add_route(&mut state, request.role, request.cidrs.as_slice(), request.target.clone())?;
    }
    for request in &config.acl_entries {
        add_acl_entry(&mut state, request.role, request.entry.clone())?;
    }

    attach_gateway_endpoints(&mut state, &config.region, config.gateway_endpoints.as_slice())?;
    add_vpc_security_groups(&mut state)?;
    add_flow_logs(&mut state, config.flow_log_retention_days)?;
    check_for_overlapping_subnets(&state)?;

    log::info!(
        "#End plan_topology() {} subnets, {} resources",
        state.subnets.len(),
        state.plan.len()
    );
    Ok(state)
}
