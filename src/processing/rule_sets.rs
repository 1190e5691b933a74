//! Default ACL entries per subnet role.
//!
//! Public, private and isolated ACLs only open intra-VPC traffic, ephemeral
//! return ports and (public only) HTTPS. The transit ACL is fully open; peers
//! enforce their own policy.

use crate::models::{AclEntry, AddressBlock, Direction, PortRange, Protocol, SubnetRole};

fn ingress(rule: u16, cidr: AddressBlock, protocol: Protocol, ports: Option<PortRange>) -> AclEntry {
    AclEntry::allow(rule, Direction::Ingress, cidr, protocol, ports)
}

fn egress(rule: u16, cidr: AddressBlock, protocol: Protocol, ports: Option<PortRange>) -> AclEntry {
    AclEntry::allow(rule, Direction::Egress, cidr, protocol, ports)
}

/// Default entries for an ACL of `role` inside the VPC `vpc_cidr`.
pub fn default_acl_entries(role: SubnetRole, vpc_cidr: AddressBlock) -> Vec<AclEntry> {
    let any = AddressBlock::any_ipv4();
    let ephemeral = Some(PortRange::ephemeral());

    match role {
        SubnetRole::Public => vec![
            ingress(100, vpc_cidr, Protocol::All, None),
            ingress(300, any, Protocol::Tcp, Some(PortRange::single(443))),
            ingress(500, any, Protocol::Tcp, ephemeral),
            ingress(510, any, Protocol::Udp, ephemeral),
            egress(100, any, Protocol::Tcp, ephemeral),
            egress(110, any, Protocol::Udp, ephemeral),
            egress(600, any, Protocol::All, None),
        ],
        SubnetRole::Private | SubnetRole::Isolated => vec![
            ingress(100, vpc_cidr, Protocol::All, None),
            ingress(500, any, Protocol::Tcp, ephemeral),
            ingress(510, any, Protocol::Udp, ephemeral),
            egress(100, any, Protocol::All, None),
        ],
        SubnetRole::Transit => vec![
            ingress(100, any, Protocol::All, None),
            egress(100, any, Protocol::All, None),
        ],
    }
}
