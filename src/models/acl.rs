//! Network access-control lists and their entries.

use super::AddressBlock;
use crate::error::{TopologyError, TopologyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Allow,
    Deny,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ingress,
    Egress,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ingress => f.write_str("ingress"),
            Direction::Egress => f.write_str("egress"),
        }
    }
}

/// IP protocol matched by an entry. `All` is the platform's `-1`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    All,
    Icmp,
    Tcp,
    Udp,
}

impl Protocol {
    /// Protocol number as the platform expects it.
    pub fn number(&self) -> i16 {
        match self {
            Protocol::All => -1,
            Protocol::Icmp => 1,
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
        }
    }

    fn matches(&self, other: Protocol) -> bool {
        matches!(self, Protocol::All) || *self == other
    }
}

/// Inclusive port range.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

impl PortRange {
    pub fn single(port: u16) -> PortRange {
        PortRange { from: port, to: port }
    }

    /// Ephemeral return-traffic ports.
    pub fn ephemeral() -> PortRange {
        PortRange {
            from: 1024,
            to: 65535,
        }
    }

    pub fn contains(&self, port: u16) -> bool {
        self.from <= port && port <= self.to
    }
}

/// One ACL rule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AclEntry {
    pub rule_number: u16,
    pub action: AclAction,
    pub cidr: AddressBlock,
    pub protocol: Protocol,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<PortRange>,
}

impl AclEntry {
    pub fn allow(
        rule_number: u16,
        direction: Direction,
        cidr: AddressBlock,
        protocol: Protocol,
        port_range: Option<PortRange>,
    ) -> AclEntry {
        AclEntry {
            rule_number,
            action: AclAction::Allow,
            cidr,
            protocol,
            direction,
            port_range,
        }
    }

    fn matches(&self, direction: Direction, addr: Ipv4Addr, protocol: Protocol, port: Option<u16>) -> bool {
        if self.direction != direction || !self.cidr.contains(addr) || !self.protocol.matches(protocol) {
            return false;
        }
        match (self.port_range, port) {
            (None, _) => true,
            (Some(range), Some(port)) => range.contains(port),
            (Some(_), None) => false,
        }
    }
}

/// A network ACL and its ordered entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Acl {
    pub id: String,
    pub entries: Vec<AclEntry>,
}

impl Acl {
    pub fn new(id: &str) -> Acl {
        Acl {
            id: id.to_string(),
            entries: Vec::new(),
        }
    }

    /// Rule numbers are unique per direction.
    pub fn has_rule(&self, rule_number: u16, direction: Direction) -> bool {
        self.entries
            .iter()
            .any(|e| e.rule_number == rule_number && e.direction == direction)
    }

    /// Fail with [`TopologyError::DuplicateRuleNumber`] if `entry` would collide.
    pub fn check_entry(&self, entry: &AclEntry) -> TopologyResult<()> {
        if self.has_rule(entry.rule_number, entry.direction) {
            return Err(TopologyError::DuplicateRuleNumber {
                acl_id: self.id.clone(),
                rule_number: entry.rule_number,
                direction: entry.direction.to_string(),
            });
        }
        Ok(())
    }

    pub fn add_entry(&mut self, entry: AclEntry) -> TopologyResult<()> {
        self.check_entry(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Entries of one direction in evaluation order.
    pub fn ordered(&self, direction: Direction) -> Vec<&AclEntry> {
        let mut entries: Vec<&AclEntry> = self
            .entries
            .iter()
            .filter(|e| e.direction == direction)
            .collect();
        entries.sort_by_key(|e| e.rule_number);
        entries
    }

    /// First-match evaluation; unmatched traffic is denied.
    pub fn evaluate(
        &self,
        direction: Direction,
        addr: Ipv4Addr,
        protocol: Protocol,
        port: Option<u16>,
    ) -> AclAction {
        self.ordered(direction)
            .into_iter()
            .find(|e| e.matches(direction, addr, protocol, port))
            .map(|e| e.action)
            .unwrap_or(AclAction::Deny)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(s: &str) -> AddressBlock {
        AddressBlock::new(s).unwrap()
    }

    #[test]
    fn test_duplicate_rule_number_per_direction() {
        let mut acl = Acl::new("nacl-1");
        acl.add_entry(AclEntry::allow(100, Direction::Ingress, AddressBlock::any_ipv4(), Protocol::All, None))
            .unwrap();
        // Same number on the other direction is fine
        acl.add_entry(AclEntry::allow(100, Direction::Egress, AddressBlock::any_ipv4(), Protocol::All, None))
            .unwrap();
        let err = acl
            .add_entry(AclEntry::allow(100, Direction::Ingress, block("10.0.0.0/8"), Protocol::Tcp, None))
            .unwrap_err();
        assert!(matches!(
            err,
            TopologyError::DuplicateRuleNumber { rule_number: 100, .. }
        ));
        assert_eq!(acl.entries.len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let mut acl = Acl::new("nacl-1");
        acl.add_entry(AclEntry::allow(200, Direction::Ingress, AddressBlock::any_ipv4(), Protocol::Tcp, Some(PortRange::single(22))))
            .unwrap();
        acl.add_entry(AclEntry {
            rule_number: 90,
            action: AclAction::Deny,
            cidr: block("203.0.113.0/24"),
            protocol: Protocol::All,
            direction: Direction::Ingress,
            port_range: None,
        })
        .unwrap();

        let blocked = Ipv4Addr::new(203, 0, 113, 7);
        let other = Ipv4Addr::new(198, 51, 100, 7);
        assert_eq!(acl.evaluate(Direction::Ingress, blocked, Protocol::Tcp, Some(22)), AclAction::Deny);
        assert_eq!(acl.evaluate(Direction::Ingress, other, Protocol::Tcp, Some(22)), AclAction::Allow);
        assert_eq!(acl.evaluate(Direction::Ingress, other, Protocol::Tcp, Some(23)), AclAction::Deny);
        assert_eq!(acl.evaluate(Direction::Egress, other, Protocol::Tcp, Some(22)), AclAction::Deny);
    }

    #[test]
    fn test_protocol_numbers() {
        assert_eq!(Protocol::All.number(), -1);
        assert_eq!(Protocol::Tcp.number(), 6);
        assert_eq!(Protocol::Udp.number(), 17);
    }

    #[test]
    fn test_entry_serde() {
        let json = r#"{"rule_number":120,"action":"allow","cidr":"10.10.0.0/16","protocol":"tcp","direction":"ingress","port_range":{"from":443,"to":443}}"#;
        let entry: AclEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.rule_number, 120);
        assert_eq!(entry.port_range, Some(PortRange::single(443)));
        assert_eq!(entry.direction, Direction::Ingress);
    }
}
