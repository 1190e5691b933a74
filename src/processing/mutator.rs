//! Caller-driven route and ACL additions per role.

use super::state::TopologyState;
use crate::error::{TopologyError, TopologyResult};
use crate::models::{AclEntry, AddressBlock, Route, RouteTarget, SubnetRole};

fn require_primary(role: SubnetRole, operation: &str) -> TopologyResult<()> {
    if role.is_primary() {
        Ok(())
    } else {
        Err(TopologyError::UnsupportedRole {
            role: role.to_string(),
            operation: operation.to_string(),
        })
    }
}

/// Append `entry` to every ACL registered under `role`.
///
/// Every target ACL is checked before any is modified, so a rule number
/// collision leaves all of them untouched.
pub fn add_acl_entry(
    state: &mut TopologyState,
    role: SubnetRole,
    entry: AclEntry,
) -> TopologyResult<Vec<String>> {
    require_primary(role, "add_acl_entry")?;
    let acl_ids = state.registry(role).acl_ids.clone();
    for acl_id in &acl_ids {
        state.check_acl_entry(acl_id, &entry)?;
    }

    let mut ids = Vec::with_capacity(acl_ids.len());
    for acl_id in &acl_ids {
        ids.push(state.add_acl_entry_to(acl_id, entry.clone())?);
    }
    log::info!(
        "added {} rule {} for {} to {} {role} ACLs",
        entry.direction,
        entry.rule_number,
        entry.cidr,
        ids.len()
    );
    Ok(ids)
}

/// Route each of `cidrs` to `target` from every route table of `role`.
///
/// Routes to the transit hub only come from the attachment flow. Destinations
/// must be network addresses. The whole batch is checked before any table is
/// modified.
pub fn add_route<S: AsRef<str>>(
    state: &mut TopologyState,
    role: SubnetRole,
    cidrs: &[S],
    target: RouteTarget,
) -> TopologyResult<Vec<String>> {
    require_primary(role, "add_route")?;
    if let RouteTarget::TransitGateway(_) = target {
        return Err(TopologyError::UnsupportedRole {
            role: role.to_string(),
            operation: "add_route to a transit hub (use the transit attachment routes)".to_string(),
        });
    }
    let destinations = cidrs
        .iter()
        .map(|c| AddressBlock::new_network(c.as_ref()))
        .collect::<TopologyResult<Vec<_>>>()?;

    let mut batch = Vec::new();
    for route_table_id in &state.registry(role).route_table_ids {
        for destination in &destinations {
            batch.push((
                route_table_id.clone(),
                Route {
                    destination: *destination,
                    target: target.clone(),
                },
            ));
        }
    }
    let ids = state.add_routes(batch, &[])?;
    log::info!("added {} {role} routes via {target}", ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Protocol, Subnet};
    use crate::processing::classify_subnet;
    use crate::provision::Resource;

    /// Two private subnets, each with its own route table and ACL.
    fn two_private() -> TopologyState {
        let mut state =
            TopologyState::new("net", AddressBlock::new("10.0.0.0/16").unwrap()).unwrap();
        for (az, cidr) in [("az1", "10.0.4.0/23"), ("az2", "10.0.6.0/23")] {
            let rtb = state
                .add_route_table(&format!("net-private-rtb-{az}"), SubnetRole::Private)
                .unwrap();
            let subnet = Subnet {
                id: format!("net-private-subnet-{az}"),
                availability_zone: az.to_string(),
                role: SubnetRole::Private,
                cidr: AddressBlock::new(cidr).unwrap(),
                route_table_id: rtb,
            };
            state.add_subnet(&subnet).unwrap();
            classify_subnet(&mut state, &subnet).unwrap();
        }
        state
    }

    #[test]
    fn test_add_route_to_every_table_of_role() {
        let mut state = two_private();
        let target = RouteTarget::NatGateway("nat-0123abcd".to_string());
        let ids = add_route(&mut state, SubnetRole::Private, &["172.16.0.0/16"], target.clone()).unwrap();
        assert_eq!(ids.len(), 2);

        for id in &ids {
            match &state.plan.get(id).unwrap().resource {
                Resource::Route {
                    destination,
                    target: t,
                    ..
                } => {
                    assert_eq!(destination.to_string(), "172.16.0.0/16");
                    assert_eq!(t, &target);
                    assert_eq!(t.field_name(), "natGatewayId");
                }
                other => panic!("unexpected resource {other:?}"),
            }
        }
        assert_eq!(state.route_tables["net-private-rtb-az2"].routes.len(), 1);
    }

    #[test]
    fn test_add_route_role_without_tables() {
        let mut state = two_private();
        let ids = add_route(
            &mut state,
            SubnetRole::Public,
            &["0.0.0.0/0"],
            RouteTarget::InternetGateway("igw-1".to_string()),
        )
        .unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_add_route_rejects_transit() {
        let mut state = two_private();
        let err = add_route(
            &mut state,
            SubnetRole::Transit,
            &["10.10.0.0/16"],
            RouteTarget::NetworkInterface("eni-1".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, TopologyError::UnsupportedRole { .. }));

        let err = add_route(
            &mut state,
            SubnetRole::Private,
            &["10.10.0.0/16"],
            RouteTarget::TransitGateway("tgw-1".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, TopologyError::UnsupportedRole { .. }));
    }

    #[test]
    fn test_add_route_bad_cidr_changes_nothing() {
        let mut state = two_private();
        let before = state.plan.len();
        let err = add_route(
            &mut state,
            SubnetRole::Private,
            &["172.16.0.0/16", "172.16.0.0"],
            RouteTarget::VpcEndpoint("vpce-1".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, TopologyError::InvalidCidr(_)));
        assert_eq!(state.plan.len(), before);
    }

    #[test]
    fn test_add_acl_entry_to_every_acl() {
        let mut state = two_private();
        let entry = AclEntry::allow(
            200,
            Direction::Ingress,
            AddressBlock::new("172.16.0.0/16").unwrap(),
            Protocol::Tcp,
            None,
        );
        let ids = add_acl_entry(&mut state, SubnetRole::Private, entry).unwrap();
        assert_eq!(ids, vec!["net-private-nacl-az1-ingress-200", "net-private-nacl-az2-ingress-200"]);
        assert_eq!(state.acls["net-private-nacl-az1"].entries.len(), 5);
    }

    #[test]
    fn test_add_acl_entry_duplicate_rule_number() {
        let mut state = two_private();
        // 500 ingress is a default rule
        let entry = AclEntry::allow(
            500,
            Direction::Ingress,
            AddressBlock::new("172.16.0.0/16").unwrap(),
            Protocol::Tcp,
            None,
        );
        let err = add_acl_entry(&mut state, SubnetRole::Private, entry).unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateRuleNumber { rule_number: 500, .. }));
        assert_eq!(state.acls["net-private-nacl-az1"].entries.len(), 4);
        assert_eq!(state.acls["net-private-nacl-az2"].entries.len(), 4);
    }

    #[test]
    fn test_add_acl_entry_rejects_transit() {
        let mut state = two_private();
        let entry = AclEntry::allow(200, Direction::Egress, AddressBlock::any_ipv4(), Protocol::All, None);
        assert!(matches!(
            add_acl_entry(&mut state, SubnetRole::Transit, entry),
            Err(TopologyError::UnsupportedRole { .. })
        ));
    }

    #[test]
    fn test_add_route_boundary_distinct_destinations() {
        let mut state = two_private();
        let ids = add_route(
            &mut state,
            SubnetRole::Private,
            &["1.10.0.0/16", "11.0.0.0/16"],
            RouteTarget::PeeringConnection("pcx-1".to_string()),
        )
        .unwrap();
        assert_eq!(
            ids,
            vec![
                "net-private-rtb-az1-1-10-0-0-16",
                "net-private-rtb-az1-11-0-0-0-16",
                "net-private-rtb-az2-1-10-0-0-16",
                "net-private-rtb-az2-11-0-0-0-16",
            ]
        );
        for table in ["net-private-rtb-az1", "net-private-rtb-az2"] {
            assert_eq!(state.route_tables[table].routes.len(), 2);
        }
    }

    #[test]
    fn test_add_route_conflict_on_second_table_changes_nothing() {
        let mut state = two_private();
        // Only the second table already has a default route
        state
            .add_route_to(
                "net-private-rtb-az2",
                Route {
                    destination: AddressBlock::any_ipv4(),
                    target: RouteTarget::NatGateway("nat-az2".to_string()),
                },
                &[],
            )
            .unwrap();
        let before = state.plan.len();

        let err = add_route(
            &mut state,
            SubnetRole::Private,
            &["10.50.0.0/16", "0.0.0.0/0"],
            RouteTarget::NetworkInterface("eni-1".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, TopologyError::ResourceConflict { .. }));
        assert_eq!(state.plan.len(), before);
        assert!(state.route_tables["net-private-rtb-az1"].routes.is_empty());
        assert_eq!(state.route_tables["net-private-rtb-az2"].routes.len(), 1);
    }

    #[test]
    fn test_add_route_rejects_host_bits() {
        let mut state = two_private();
        let before = state.plan.len();
        let err = add_route(
            &mut state,
            SubnetRole::Private,
            &["172.16.5.0/16"],
            RouteTarget::PeeringConnection("pcx-1".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, TopologyError::InvalidCidr(_)));
        assert_eq!(state.plan.len(), before);
    }
}
