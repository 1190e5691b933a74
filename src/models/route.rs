//! Route tables and route targets.

use super::{AddressBlock, SubnetRole};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Forwarding target of a route, tagged with its kind.
///
/// Serialised as `{"kind": "nat_gateway", "id": "nat-0123abcd"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RouteTarget {
    InternetGateway(String),
    Instance(String),
    NatGateway(String),
    NetworkInterface(String),
    VpcEndpoint(String),
    PeeringConnection(String),
    /// Only produced by the transit attachment flow.
    TransitGateway(String),
}

impl RouteTarget {
    pub fn id(&self) -> &str {
        match self {
            RouteTarget::InternetGateway(id)
            | RouteTarget::Instance(id)
            | RouteTarget::NatGateway(id)
            | RouteTarget::NetworkInterface(id)
            | RouteTarget::VpcEndpoint(id)
            | RouteTarget::PeeringConnection(id)
            | RouteTarget::TransitGateway(id) => id,
        }
    }

    /// Name of the platform field this target populates.
    pub fn field_name(&self) -> &'static str {
        match self {
            RouteTarget::InternetGateway(_) => "gatewayId",
            RouteTarget::Instance(_) => "instanceId",
            RouteTarget::NatGateway(_) => "natGatewayId",
            RouteTarget::NetworkInterface(_) => "networkInterfaceId",
            RouteTarget::VpcEndpoint(_) => "vpcEndpointId",
            RouteTarget::PeeringConnection(_) => "vpcPeeringConnectionId",
            RouteTarget::TransitGateway(_) => "transitGatewayId",
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field_name(), self.id())
    }
}

/// A static route.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub destination: AddressBlock,
    pub target: RouteTarget,
}

/// A route table owned by one role.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteTable {
    pub id: String,
    pub role: SubnetRole,
    pub routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(id: &str, role: SubnetRole) -> RouteTable {
        RouteTable {
            id: id.to_string(),
            role,
            routes: Vec::new(),
        }
    }

    /// Append a route unless an identical one is already present.
    pub fn add_route(&mut self, route: Route) {
        if !self.routes.contains(&route) {
            self.routes.push(route);
        }
    }
}
