//! CSV output of the planned subnets.

use super::terminal::format_field;
use crate::models::Subnet;
use crate::processing::TopologyState;
use crate::provision::Resource;

const HEADER: &str = r#" "cnt",    "role",            "az",                      "subnet_id",      "subnet_cidr", "hosts",                 "route_table",                  "acl""#;

/// ACL associated with `subnet`, read from its association resource.
fn acl_of(state: &TopologyState, subnet: &Subnet) -> String {
    match state
        .plan
        .get(&format!("{}-nacl-assoc", subnet.id))
        .map(|planned| &planned.resource)
    {
        Some(Resource::SubnetNetworkAclAssociation { network_acl_id, .. }) => {
            network_acl_id.clone()
        }
        _ => "None".to_string(),
    }
}

/// Header plus one CSV row per subnet, in creation order.
pub fn registry_rows(state: &TopologyState) -> Vec<String> {
    let mut rows = vec![HEADER.to_string()];
    for (i, subnet) in state.subnets.iter().enumerate() {
        rows.push(format!(
            "{cnt},{role},{az},{id},{cidr},{hosts},{rtb},{acl}",
            cnt = format_field(i + 1, 6),
            role = format_field(subnet.role, 10),
            az = format_field(&subnet.availability_zone, 16),
            id = format_field(&subnet.id, 32),
            cidr = format_field(subnet.cidr, 18),
            hosts = format_field(subnet.cidr.size(), 8),
            rtb = format_field(&subnet.route_table_id, 30),
            acl = format_field(acl_of(state, subnet), 30),
        ));
    }
    rows
}

/// Print every subnet of the network as CSV to stdout.
pub fn registry_print(state: &TopologyState) {
    log::info!("#Start registry_print() subnet count = {}", state.subnets.len());
    for row in registry_rows(state) {
        println!("{row}");
    }
}
