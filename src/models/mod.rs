//! Domain models for topology planning.
//!
//! This module contains the core data structures used throughout the planner:
//! - [`AddressBlock`] - IPv4 block with CIDR notation plus the address codec
//! - [`SubnetRole`] - the four semantic subnet roles
//! - [`Acl`], [`AclEntry`] - network ACLs with first-match evaluation
//! - [`RouteTable`], [`Route`], [`RouteTarget`] - routing
//! - [`Subnet`] and [`VnetDescriptor`] - network structures

mod acl;
mod ipv4;
mod role;
mod route;
mod subnet;
mod vnet;

// Re-export public types
pub use acl::{Acl, AclAction, AclEntry, Direction, PortRange, Protocol};
pub use ipv4::{
    block_size, broadcast_addr, cidr_slug, cut_addr, format_addr, get_cidr_mask,
    ip_after_subnet, parse_addr, AddressBlock, MAX_LENGTH,
};
pub use role::SubnetRole;
pub use route::{Route, RouteTable, RouteTarget};
pub use subnet::Subnet;
pub use vnet::{default_subnet_configuration, NatType, SubnetGroup, VnetDescriptor};
