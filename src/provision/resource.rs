//! Resource declarations handed to the provisioning engine.

use crate::models::{AclEntry, AddressBlock, NatType, PortRange, Protocol, RouteTarget, SubnetRole};
use serde::{Deserialize, Serialize};

/// A resource the platform will create.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resource {
    Vpc {
        cidr: AddressBlock,
    },
    InternetGateway,
    Subnet {
        availability_zone: String,
        cidr: AddressBlock,
        role: SubnetRole,
    },
    RouteTable {
        role: SubnetRole,
        name: String,
    },
    SubnetRouteTableAssociation {
        subnet_id: String,
        route_table_id: String,
    },
    NetworkAcl {
        role: SubnetRole,
        name: String,
    },
    SubnetNetworkAclAssociation {
        subnet_id: String,
        network_acl_id: String,
    },
    NetworkAclEntry {
        network_acl_id: String,
        entry: AclEntry,
    },
    Nat {
        kind: NatType,
        subnet_id: String,
    },
    Route {
        route_table_id: String,
        destination: AddressBlock,
        target: RouteTarget,
    },
    TransitGatewayAttachment {
        transit_gateway_id: String,
        subnet_ids: Vec<String>,
    },
    GatewayEndpoint {
        service_name: String,
        route_table_ids: Vec<String>,
    },
    SecurityGroup {
        group_name: String,
        description: String,
    },
    SecurityGroupIngress {
        group_id: String,
        cidr: AddressBlock,
        protocol: Protocol,
        port_range: Option<PortRange>,
        description: String,
    },
    /// Elastic IP bound to a NAT instance.
    Eip {
        instance_id: String,
    },
    /// Flow log delivered to a log group of the same name.
    FlowLog {
        log_group_name: String,
        retention_days: u32,
        traffic_type: String,
    },
}

impl Resource {
    /// Platform type name, for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Vpc { .. } => "AWS::EC2::VPC",
            Resource::InternetGateway => "AWS::EC2::InternetGateway",
            Resource::Subnet { .. } => "AWS::EC2::Subnet",
            Resource::RouteTable { .. } => "AWS::EC2::RouteTable",
            Resource::SubnetRouteTableAssociation { .. } => "AWS::EC2::SubnetRouteTableAssociation",
            Resource::NetworkAcl { .. } => "AWS::EC2::NetworkAcl",
            Resource::SubnetNetworkAclAssociation { .. } => "AWS::EC2::SubnetNetworkAclAssociation",
            Resource::NetworkAclEntry { .. } => "AWS::EC2::NetworkAclEntry",
            Resource::Nat {
                kind: NatType::Gateway,
                ..
            } => "AWS::EC2::NatGateway",
            Resource::Nat {
                kind: NatType::Instance,
                ..
            } => "AWS::EC2::Instance",
            Resource::Route { .. } => "AWS::EC2::Route",
            Resource::TransitGatewayAttachment { .. } => "AWS::EC2::TransitGatewayAttachment",
            Resource::GatewayEndpoint { .. } => "AWS::EC2::VPCEndpoint",
            Resource::SecurityGroup { .. } => "AWS::EC2::SecurityGroup",
            Resource::SecurityGroupIngress { .. } => "AWS::EC2::SecurityGroupIngress",
            Resource::Eip { .. } => "AWS::EC2::EIP",
            Resource::FlowLog { .. } => "AWS::EC2::FlowLog",
        }
    }
}

/// A declared resource with its dependency edges.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlannedResource {
    pub id: String,
    pub resource: Resource,
    pub depends_on: Vec<String>,
}
