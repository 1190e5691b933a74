//! Topology planning logic.
//!
//! This module contains the planning steps, each operating on a [`TopologyState`]:
//! - [`carve`] - transit range carving
//! - [`layout`] - primary subnet allocation, internet and NAT egress
//! - [`classify`] - per-role registries and default ACLs
//! - [`mutator`] - caller routes and ACL entries
//! - [`transit`] - transit attachment state machine
//! - [`endpoints`] - gateway endpoints
//! - [`security`] - VPC security groups and flow logs

mod carve;
mod classify;
mod endpoints;
mod layout;
mod mutator;
mod overlap;
mod rule_sets;
mod security;
mod state;
mod transit;

// Re-export public types and functions
pub use carve::{carve, transit_subnet_cidrs, transit_window};
pub use classify::{classify_subnet, classify_subnets};
pub use endpoints::attach_gateway_endpoints;
pub use layout::{allocate_blocks, provision_primary_subnets};
pub use mutator::{add_acl_entry, add_route};
pub use overlap::check_for_overlapping_subnets;
pub use rule_sets::default_acl_entries;
pub use security::{add_flow_logs, add_vpc_security_groups};
pub use state::{Registries, RoleRegistry, TopologyState};
pub use transit::{HubReference, TransitOrchestrator, TransitState, TransitStep};
