//! VPC-wide security groups and flow logs.

use super::state::TopologyState;
use crate::config::FLOW_LOG_RETENTION_DAYS;
use crate::error::{TopologyError, TopologyResult};
use crate::models::{PortRange, Protocol};
use crate::provision::Resource;

/// Service groups every network gets: (id suffix, service, TCP port).
const VPC_SERVICE_GROUPS: [(&str, &str, u16); 2] = [("ssh", "SSH", 22), ("rdp", "RDP", 3389)];

/// Declare a security group in the VPC.
pub(crate) fn declare_security_group(
    state: &mut TopologyState,
    id: &str,
    description: &str,
) -> TopologyResult<String> {
    let vpc_id = state.vpc_id.clone();
    state.plan.declare(
        id,
        Resource::SecurityGroup {
            group_name: id.to_string(),
            description: description.to_string(),
        },
        &[vpc_id.as_str()],
    )
}

/// Allow ingress to `group_id` from the whole VPC CIDR.
pub(crate) fn allow_ingress_from_vpc(
    state: &mut TopologyState,
    group_id: &str,
    protocol: Protocol,
    port_range: Option<PortRange>,
    description: &str,
) -> TopologyResult<String> {
    let cidr = state.vpc_cidr;
    state.plan.declare(
        &format!("{group_id}-ingress"),
        Resource::SecurityGroupIngress {
            group_id: group_id.to_string(),
            cidr,
            protocol,
            port_range,
            description: description.to_string(),
        },
        &[group_id],
    )
}

/// Declare the internal SSH and RDP groups, each open to the VPC CIDR only.
/// Returns the group ids.
pub fn add_vpc_security_groups(state: &mut TopologyState) -> TopologyResult<Vec<String>> {
    let mut ids = Vec::with_capacity(VPC_SERVICE_GROUPS.len());
    for (suffix, service, port) in VPC_SERVICE_GROUPS {
        let id = state.resource_id(&format!("{suffix}-internal"));
        declare_security_group(
            state,
            &id,
            &format!("Allows all {service} traffic from the VPC CIDR"),
        )?;
        allow_ingress_from_vpc(
            state,
            &id,
            Protocol::Tcp,
            Some(PortRange::single(port)),
            &format!("{service} ingress"),
        )?;
        log::info!("security group {id} allows tcp/{port} from {}", state.vpc_cidr);
        ids.push(id);
    }
    Ok(ids)
}

/// Capture all VPC traffic to the log group `/flowlogs/{name}`.
pub fn add_flow_logs(state: &mut TopologyState, retention_days: u32) -> TopologyResult<String> {
    if !FLOW_LOG_RETENTION_DAYS.contains(&retention_days) {
        return Err(TopologyError::Config(format!(
            "flow log retention of {retention_days} days is not supported; use one of {FLOW_LOG_RETENTION_DAYS:?}"
        )));
    }
    let id = state.resource_id("flow-log");
    let vpc_id = state.vpc_id.clone();
    state.plan.declare(
        &id,
        Resource::FlowLog {
            log_group_name: format!("/flowlogs/{}", state.name),
            retention_days,
            traffic_type: "ALL".to_string(),
        },
        &[vpc_id.as_str()],
    )?;
    log::info!("flow log {id} kept for {retention_days} days");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AddressBlock;

    fn state() -> TopologyState {
        TopologyState::new("net", AddressBlock::new("10.0.0.0/16").unwrap()).unwrap()
    }

    #[test]
    fn test_vpc_security_groups() {
        let mut state = state();
        let ids = add_vpc_security_groups(&mut state).unwrap();
        assert_eq!(ids, vec!["net-ssh-internal", "net-rdp-internal"]);
        assert_eq!(state.plan.count_kind("AWS::EC2::SecurityGroup"), 2);

        let rdp = state.plan.get("net-rdp-internal-ingress").unwrap();
        assert_eq!(rdp.depends_on, vec!["net-rdp-internal"]);
        match &rdp.resource {
            Resource::SecurityGroupIngress {
                cidr,
                protocol,
                port_range,
                ..
            } => {
                assert_eq!(cidr.to_string(), "10.0.0.0/16");
                assert_eq!(*protocol, Protocol::Tcp);
                assert_eq!(*port_range, Some(PortRange::single(3389)));
            }
            other => panic!("unexpected resource {other:?}"),
        }
        assert_eq!(state.plan.get("net-ssh-internal").unwrap().depends_on, vec!["net-vpc"]);

        // Planning again declares nothing new
        let before = state.plan.len();
        add_vpc_security_groups(&mut state).unwrap();
        assert_eq!(state.plan.len(), before);
    }

    #[test]
    fn test_flow_logs() {
        let mut state = state();
        let id = add_flow_logs(&mut state, 7).unwrap();
        assert_eq!(id, "net-flow-log");
        match &state.plan.get(&id).unwrap().resource {
            Resource::FlowLog {
                log_group_name,
                retention_days,
                traffic_type,
            } => {
                assert_eq!(log_group_name, "/flowlogs/net");
                assert_eq!(*retention_days, 7);
                assert_eq!(traffic_type, "ALL");
            }
            other => panic!("unexpected resource {other:?}"),
        }

        let err = add_flow_logs(&mut state, 8).unwrap_err();
        assert!(matches!(err, TopologyError::Config(_)));
        // A different retention for the same network conflicts
        assert!(matches!(
            add_flow_logs(&mut state, 30),
            Err(TopologyError::ResourceConflict { .. })
        ));
    }
}
