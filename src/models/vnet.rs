//! Virtual network descriptor.

use super::SubnetRole;
use crate::config::DEFAULT_SUBNET_MASK;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How private subnets reach the internet.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NatType {
    #[default]
    Gateway,
    Instance,
}

/// One group of primary subnets, created once per availability zone.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubnetGroup {
    pub role: SubnetRole,
    pub cidr_mask: u8,
}

/// Default layout: public, private and isolated at /23 in each AZ.
pub fn default_subnet_configuration() -> Vec<SubnetGroup> {
    SubnetRole::PRIMARY
        .iter()
        .map(|role| SubnetGroup {
            role: *role,
            cidr_mask: DEFAULT_SUBNET_MASK,
        })
        .collect()
}

/// Describes the virtual network to plan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VnetDescriptor {
    /// VPC CIDR, e.g. `10.0.0.0/16`. Kept as text so a missing value can be reported.
    pub cidr_block: Option<String>,
    pub availability_zones: Vec<String>,
    #[serde(default)]
    pub nat_type: NatType,
    /// Number of NAT devices. Defaults to one per availability zone.
    #[serde(default)]
    pub nat_gateways: Option<usize>,
    #[serde(default = "default_subnet_configuration")]
    pub subnet_configuration: Vec<SubnetGroup>,
}

impl fmt::Display for VnetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} subnet groups, nat {:?})",
            self.cidr_block.as_deref().unwrap_or("<unset>"),
            self.availability_zones.join(", "),
            self.subnet_configuration.len(),
            self.nat_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let vnet: VnetDescriptor = serde_json::from_str(
            r#"{"cidr_block":"10.0.0.0/16","availability_zones":["us-east-1a","us-east-1b"]}"#,
        )
        .unwrap();
        assert_eq!(vnet.nat_type, NatType::Gateway);
        assert_eq!(vnet.nat_gateways, None);
        assert_eq!(vnet.subnet_configuration, default_subnet_configuration());
        assert_eq!(vnet.subnet_configuration[1].role, SubnetRole::Private);
        assert_eq!(vnet.subnet_configuration[1].cidr_mask, 23);
    }
}
