//! Subnet data model.

use super::{AddressBlock, SubnetRole};
use serde::{Deserialize, Serialize};

/// A subnet carved from the parent virtual network.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subnet {
    /// Logical id of the subnet resource.
    pub id: String,
    /// Availability domain the subnet lives in.
    pub availability_zone: String,
    pub role: SubnetRole,
    /// Address block of the subnet.
    pub cidr: AddressBlock,
    /// Route table associated with the subnet.
    pub route_table_id: String,
}
