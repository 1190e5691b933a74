//! Transit attachment orchestration.
//!
//! Connecting a network to a transit hub is a four-state machine:
//!
//! - Unconfigured: nothing created
//! - SubnetsProvisioned: transit subnets, shared route table and shared ACL exist
//! - AttachmentCreated: the hub attachment references every transit subnet
//! - RoutesApplied: static routes to the hub exist (terminal)
//!
//! Routes carry a dependency edge on the attachment, so the provisioning
//! engine can never submit them first, whatever it parallelises. Repeating a
//! completed step is a no-op, which makes re-running the whole flow safe.

use super::carve::transit_subnet_cidrs;
use super::rule_sets::default_acl_entries;
use super::state::TopologyState;
use crate::config::{TransitGatewayProps, MAX_TRANSIT_SUBNETS};
use crate::error::{TopologyError, TopologyResult};
use crate::models::{AddressBlock, Route, RouteTarget, Subnet, SubnetRole};
use crate::provision::{Resource, SecretResolver};
use std::fmt;

/// Where the hub id comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubReference {
    Direct(String),
    SharedSecret { partial_arn: String },
}

impl HubReference {
    /// Exactly one of the two must be given; empty strings count as absent.
    pub fn from_parts(direct: Option<&str>, secret: Option<&str>) -> TopologyResult<HubReference> {
        let direct = direct.filter(|s| !s.trim().is_empty());
        let secret = secret.filter(|s| !s.trim().is_empty());
        match (direct, secret) {
            (Some(id), None) => Ok(HubReference::Direct(id.to_string())),
            (None, Some(arn)) => Ok(HubReference::SharedSecret {
                partial_arn: arn.to_string(),
            }),
            _ => Err(TopologyError::AmbiguousOrMissingHubReference),
        }
    }

    pub fn from_props(props: &TransitGatewayProps) -> TopologyResult<HubReference> {
        HubReference::from_parts(
            props.transit_gateway_id.as_deref(),
            props.shared_account_secret_partial_arn.as_deref(),
        )
    }

    /// Resolve to the hub id. Secret lookup failures are fatal.
    pub fn resolve(&self, resolver: &dyn SecretResolver) -> TopologyResult<String> {
        match self {
            HubReference::Direct(id) => Ok(id.clone()),
            HubReference::SharedSecret { partial_arn } => {
                resolver.resolve_hub_id(partial_arn).map_err(|e| match e {
                    TopologyError::SecretResolutionFailed { .. } => e,
                    other => TopologyError::SecretResolutionFailed {
                        secret: partial_arn.clone(),
                        reason: other.to_string(),
                    },
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitState {
    #[default]
    Unconfigured,
    SubnetsProvisioned,
    AttachmentCreated,
    RoutesApplied,
}

/// Orchestrator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitStep {
    ProvisionSubnets,
    CreateAttachment,
    ApplyRoutes,
}

impl fmt::Display for TransitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitState::Unconfigured => "Unconfigured",
            TransitState::SubnetsProvisioned => "SubnetsProvisioned",
            TransitState::AttachmentCreated => "AttachmentCreated",
            TransitState::RoutesApplied => "RoutesApplied",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for TransitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TransitState {
    /// Next state after `step`. A step that already completed keeps the
    /// current state.
    pub fn transition(&self, step: TransitStep) -> TopologyResult<TransitState> {
        use TransitState::*;
        use TransitStep::*;

        match (self, step) {
            (Unconfigured, ProvisionSubnets) => Ok(SubnetsProvisioned),
            (state, ProvisionSubnets) => Ok(*state),

            (SubnetsProvisioned, CreateAttachment) => Ok(AttachmentCreated),
            (AttachmentCreated | RoutesApplied, CreateAttachment) => Ok(*self),
            (Unconfigured, CreateAttachment) => Err(TopologyError::InvalidTransition {
                from: self.to_string(),
                step: step.to_string(),
            }),

            (AttachmentCreated | RoutesApplied, ApplyRoutes) => Ok(RoutesApplied),
            (Unconfigured | SubnetsProvisioned, ApplyRoutes) => {
                Err(TopologyError::AttachmentNotReady {
                    state: self.to_string(),
                })
            }
        }
    }
}

/// Drives one network through the transit state machine.
#[derive(Debug, Clone)]
pub struct TransitOrchestrator {
    props: TransitGatewayProps,
    state: TransitState,
    hub_id: Option<String>,
    route_table_id: Option<String>,
    acl_id: Option<String>,
    attachment_id: Option<String>,
}

impl TransitOrchestrator {
    pub fn new(props: TransitGatewayProps) -> TransitOrchestrator {
        TransitOrchestrator {
            props,
            state: TransitState::Unconfigured,
            hub_id: None,
            route_table_id: None,
            acl_id: None,
            attachment_id: None,
        }
    }

    pub fn state(&self) -> TransitState {
        self.state
    }

    pub fn attachment_id(&self) -> Option<&str> {
        self.attachment_id.as_deref()
    }

    pub fn hub_id(&self) -> Option<&str> {
        self.hub_id.as_deref()
    }

    /// Create one transit subnet per AZ (at most eight) with the shared route
    /// table and ACL.
    pub fn provision_subnets(
        &mut self,
        topology: &mut TopologyState,
        availability_zones: &[String],
    ) -> TopologyResult<Vec<Subnet>> {
        let next = self.state.transition(TransitStep::ProvisionSubnets)?;
        if next == self.state {
            return Ok(topology.subnets_of(SubnetRole::Transit).cloned().collect());
        }
        HubReference::from_props(&self.props)?;
        if availability_zones.is_empty() {
            return Err(TopologyError::Config(
                "at least one availability zone is required for transit subnets".to_string(),
            ));
        }
        let blocks = transit_subnet_cidrs(&topology.vpc_cidr)?;
        if availability_zones.len() > MAX_TRANSIT_SUBNETS {
            log::warn!(
                "{} availability zones requested; only {MAX_TRANSIT_SUBNETS} transit subnets are created",
                availability_zones.len()
            );
        }

        let route_table_id = topology.resource_id("transit-rtb-shared");
        topology.add_route_table(&route_table_id, SubnetRole::Transit)?;
        let acl_id = topology.resource_id("transit-nacl-shared");
        topology.add_acl(&acl_id, SubnetRole::Transit)?;
        for entry in default_acl_entries(SubnetRole::Transit, topology.vpc_cidr) {
            topology.add_acl_entry_to(&acl_id, entry)?;
        }
        register_once(&mut topology.registry_mut(SubnetRole::Transit).route_table_ids, &route_table_id);
        register_once(&mut topology.registry_mut(SubnetRole::Transit).acl_ids, &acl_id);

        let mut subnets = Vec::new();
        for (az, cidr) in availability_zones.iter().zip(blocks) {
            let subnet = Subnet {
                id: topology.resource_id(&format!("transit-subnet-{az}")),
                availability_zone: az.clone(),
                role: SubnetRole::Transit,
                cidr,
                route_table_id: route_table_id.clone(),
            };
            topology.add_subnet(&subnet)?;
            topology.associate_acl(&subnet.id, &acl_id)?;
            register_once(&mut topology.registry_mut(SubnetRole::Transit).subnet_ids, &subnet.id);
            log::info!("transit subnet {} {} in {az}", subnet.id, subnet.cidr);
            subnets.push(subnet);
        }

        self.route_table_id = Some(route_table_id);
        self.acl_id = Some(acl_id);
        self.state = next;
        log::info!("transit state: {}", self.state);
        Ok(subnets)
    }

    /// Resolve the hub id and attach every transit subnet to it.
    pub fn create_attachment(
        &mut self,
        topology: &mut TopologyState,
        resolver: &dyn SecretResolver,
    ) -> TopologyResult<String> {
        let next = self.state.transition(TransitStep::CreateAttachment)?;
        if next == self.state {
            if let Some(id) = &self.attachment_id {
                return Ok(id.clone());
            }
        }

        let hub_id = HubReference::from_props(&self.props)?.resolve(resolver)?;
        let subnet_ids = topology.registry(SubnetRole::Transit).subnet_ids.clone();
        let depends_on: Vec<&str> = subnet_ids.iter().map(|s| s.as_str()).collect();
        let id = topology.resource_id("tgw-attachment");
        topology.plan.declare(
            &id,
            Resource::TransitGatewayAttachment {
                transit_gateway_id: hub_id.clone(),
                subnet_ids: subnet_ids.clone(),
            },
            &depends_on,
        )?;
        topology.transit_attachment_id = Some(id.clone());

        self.hub_id = Some(hub_id);
        self.attachment_id = Some(id.clone());
        self.state = next;
        log::info!("transit state: {} ({id})", self.state);
        Ok(id)
    }

    /// Add the requested static routes to the hub.
    ///
    /// Transit role requests go on the shared transit table; other roles go
    /// on every route table of that role. Either every route is added or,
    /// on error, none is and the state stays at AttachmentCreated.
    pub fn apply_routes(&mut self, topology: &mut TopologyState) -> TopologyResult<Vec<String>> {
        let next = self.state.transition(TransitStep::ApplyRoutes)?;
        if self.state == TransitState::RoutesApplied {
            return Ok(Vec::new());
        }
        let (Some(attachment_id), Some(hub_id)) = (self.attachment_id.clone(), self.hub_id.clone())
        else {
            return Err(TopologyError::AttachmentNotReady {
                state: self.state.to_string(),
            });
        };

        let requests = self
            .props
            .routes
            .iter()
            .map(|r| Ok((r.role, AddressBlock::new_network(&r.cidr)?)))
            .collect::<TopologyResult<Vec<_>>>()?;

        let mut batch = Vec::new();
        for (role, destination) in requests {
            let tables = &topology.registry(role).route_table_ids;
            if tables.is_empty() {
                log::warn!("no {role} route tables; transit route to {destination} skipped");
            }
            for table in tables {
                batch.push((
                    table.clone(),
                    Route {
                        destination,
                        target: RouteTarget::TransitGateway(hub_id.clone()),
                    },
                ));
            }
        }
        let ids = topology.add_routes(batch, &[attachment_id.as_str()])?;

        self.state = next;
        log::info!("transit state: {} ({} routes)", self.state, ids.len());
        Ok(ids)
    }

    /// Run every remaining step in order.
    pub fn run(
        &mut self,
        topology: &mut TopologyState,
        availability_zones: &[String],
        resolver: &dyn SecretResolver,
    ) -> TopologyResult<()> {
        self.provision_subnets(topology, availability_zones)?;
        self.create_attachment(topology, resolver)?;
        self.apply_routes(topology)?;
        Ok(())
    }
}

fn register_once(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|i| i == id) {
        ids.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransitRouteRequest;
    use crate::models::{Acl, AclAction, Direction, Protocol};
    use crate::provision::StaticSecretResolver;
    use std::net::Ipv4Addr;

    const ARN: &str = "arn:aws:secretsmanager:us-east-1:222222222222:secret:transitGateway";

    fn azs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("us-east-1{}", (b'a' + i as u8) as char)).collect()
    }

    fn topology() -> TopologyState {
        TopologyState::new("net", AddressBlock::new("10.0.0.0/16").unwrap()).unwrap()
    }

    fn props(direct: Option<&str>, secret: Option<&str>) -> TransitGatewayProps {
        TransitGatewayProps {
            transit_gateway_id: direct.map(|s| s.to_string()),
            shared_account_secret_partial_arn: secret.map(|s| s.to_string()),
            routes: vec![TransitRouteRequest {
                role: SubnetRole::Transit,
                cidr: "172.16.0.0/16".to_string(),
            }],
        }
    }

    #[test]
    fn test_hub_reference_exclusive() {
        assert!(matches!(
            HubReference::from_parts(Some("tgw-1"), Some(ARN)),
            Err(TopologyError::AmbiguousOrMissingHubReference)
        ));
        assert!(matches!(
            HubReference::from_parts(None, None),
            Err(TopologyError::AmbiguousOrMissingHubReference)
        ));
        assert!(matches!(
            HubReference::from_parts(Some(""), None),
            Err(TopologyError::AmbiguousOrMissingHubReference)
        ));
        assert_eq!(
            HubReference::from_parts(Some("tgw-1"), None).unwrap(),
            HubReference::Direct("tgw-1".to_string())
        );

        let mut topology = topology();
        let mut orchestrator = TransitOrchestrator::new(props(Some("tgw-1"), Some(ARN)));
        assert!(matches!(
            orchestrator.provision_subnets(&mut topology, &azs(2)),
            Err(TopologyError::AmbiguousOrMissingHubReference)
        ));
        assert_eq!(orchestrator.state(), TransitState::Unconfigured);
        assert!(topology.registry(SubnetRole::Transit).subnet_ids.is_empty());
    }

    #[test]
    fn test_provision_subnets() {
        let mut topology = topology();
        let mut orchestrator = TransitOrchestrator::new(props(Some("tgw-1"), None));
        let subnets = orchestrator.provision_subnets(&mut topology, &azs(3)).unwrap();
        let cidrs: Vec<String> = subnets.iter().map(|s| s.cidr.to_string()).collect();
        assert_eq!(cidrs, vec!["10.0.255.0/27", "10.0.255.32/27", "10.0.255.64/27"]);
        assert_eq!(orchestrator.state(), TransitState::SubnetsProvisioned);

        let registry = topology.registry(SubnetRole::Transit);
        assert_eq!(registry.subnet_ids.len(), 3);
        assert_eq!(registry.route_table_ids, vec!["net-transit-rtb-shared"]);
        assert_eq!(registry.acl_ids, vec!["net-transit-nacl-shared"]);
        assert!(subnets.iter().all(|s| s.route_table_id == "net-transit-rtb-shared"));

        let acl: &Acl = &topology.acls["net-transit-nacl-shared"];
        assert_eq!(acl.entries.len(), 2);
        let outside = Ipv4Addr::new(203, 0, 113, 7);
        assert_eq!(acl.evaluate(Direction::Ingress, outside, Protocol::Udp, Some(53)), AclAction::Allow);
    }

    #[test]
    fn test_provision_subnets_clamps_to_eight() {
        let mut topology = topology();
        let mut orchestrator = TransitOrchestrator::new(props(Some("tgw-1"), None));
        let subnets = orchestrator.provision_subnets(&mut topology, &azs(10)).unwrap();
        assert_eq!(subnets.len(), 8);
        assert_eq!(subnets[7].cidr.to_string(), "10.0.255.224/27");
    }

    #[test]
    fn test_provision_subnets_small_parent() {
        let mut topology =
            TopologyState::new("net", AddressBlock::new("10.0.0.0/25").unwrap()).unwrap();
        let mut orchestrator = TransitOrchestrator::new(props(Some("tgw-1"), None));
        assert!(matches!(
            orchestrator.provision_subnets(&mut topology, &azs(2)),
            Err(TopologyError::BlockTooSmall { .. })
        ));
    }

    #[test]
    fn test_routes_rejected_before_attachment() {
        let mut topology = topology();
        let mut orchestrator = TransitOrchestrator::new(props(Some("tgw-1"), None));
        assert!(matches!(
            orchestrator.apply_routes(&mut topology),
            Err(TopologyError::AttachmentNotReady { .. })
        ));
        orchestrator.provision_subnets(&mut topology, &azs(2)).unwrap();
        let before = topology.plan.len();
        let err = orchestrator.apply_routes(&mut topology).unwrap_err();
        assert!(matches!(err, TopologyError::AttachmentNotReady { ref state } if state == "SubnetsProvisioned"));
        assert_eq!(topology.plan.len(), before);
        assert_eq!(orchestrator.state(), TransitState::SubnetsProvisioned);
    }

    #[test]
    fn test_attachment_before_subnets_is_invalid() {
        let mut topology = topology();
        let mut orchestrator = TransitOrchestrator::new(props(Some("tgw-1"), None));
        assert!(matches!(
            orchestrator.create_attachment(&mut topology, &StaticSecretResolver::new()),
            Err(TopologyError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_secret_resolution_failure_halts() {
        let mut topology = topology();
        let mut orchestrator = TransitOrchestrator::new(props(None, Some(ARN)));
        orchestrator.provision_subnets(&mut topology, &azs(2)).unwrap();
        let err = orchestrator
            .create_attachment(&mut topology, &StaticSecretResolver::new())
            .unwrap_err();
        assert!(matches!(err, TopologyError::SecretResolutionFailed { .. }));
        assert_eq!(orchestrator.state(), TransitState::SubnetsProvisioned);
        assert!(topology.transit_attachment_id.is_none());
    }

    #[test]
    fn test_full_flow_orders_routes_after_attachment() {
        let mut topology = topology();
        let resolver = StaticSecretResolver::new().with_hub_id(ARN, "tgw-0shared");
        let mut orchestrator = TransitOrchestrator::new(props(None, Some(ARN)));
        orchestrator.run(&mut topology, &azs(2), &resolver).unwrap();
        assert_eq!(orchestrator.state(), TransitState::RoutesApplied);
        assert_eq!(orchestrator.hub_id(), Some("tgw-0shared"));
        assert_eq!(topology.transit_attachment_id.as_deref(), Some("net-tgw-attachment"));

        let attachment = topology.plan.get("net-tgw-attachment").unwrap();
        assert_eq!(
            attachment.depends_on,
            vec!["net-transit-subnet-us-east-1a", "net-transit-subnet-us-east-1b"]
        );

        let route_id = "net-transit-rtb-shared-172-16-0-0-16";
        let route = topology.plan.get(route_id).unwrap();
        assert!(route.depends_on.contains(&"net-tgw-attachment".to_string()));
        assert!(topology.plan.level_of(route_id) > topology.plan.level_of("net-tgw-attachment"));
        assert_eq!(
            topology.route_tables["net-transit-rtb-shared"].routes[0].target,
            RouteTarget::TransitGateway("tgw-0shared".to_string())
        );
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let mut topology = topology();
        let mut orchestrator = TransitOrchestrator::new(props(Some("tgw-1"), None));
        orchestrator.run(&mut topology, &azs(2), &StaticSecretResolver::new()).unwrap();
        let declared = topology.plan.len();

        // Same orchestrator skips everything
        orchestrator.run(&mut topology, &azs(2), &StaticSecretResolver::new()).unwrap();
        assert_eq!(topology.plan.len(), declared);

        // A fresh orchestrator re-declares identical resources
        let mut again = TransitOrchestrator::new(props(Some("tgw-1"), None));
        again.run(&mut topology, &azs(2), &StaticSecretResolver::new()).unwrap();
        assert_eq!(topology.plan.len(), declared);
        assert_eq!(topology.registry(SubnetRole::Transit).subnet_ids.len(), 2);

        // A different hub id is a conflict
        let mut other = TransitOrchestrator::new(props(Some("tgw-2"), None));
        assert!(matches!(
            other.run(&mut topology, &azs(2), &StaticSecretResolver::new()),
            Err(TopologyError::ResourceConflict { .. })
        ));
    }

    #[test]
    fn test_transition_table() {
        use TransitState::*;
        use TransitStep::*;
        assert_eq!(Unconfigured.transition(ProvisionSubnets).unwrap(), SubnetsProvisioned);
        assert_eq!(SubnetsProvisioned.transition(CreateAttachment).unwrap(), AttachmentCreated);
        assert_eq!(AttachmentCreated.transition(ApplyRoutes).unwrap(), RoutesApplied);
        assert_eq!(RoutesApplied.transition(ProvisionSubnets).unwrap(), RoutesApplied);
        assert!(Unconfigured.transition(ApplyRoutes).is_err());
    }

    fn attached(routes: &[(SubnetRole, &str)]) -> (TopologyState, TransitOrchestrator) {
        let mut topology = topology();
        let mut transit_props = props(Some("tgw-1"), None);
        transit_props.routes = routes
            .iter()
            .map(|(role, cidr)| TransitRouteRequest {
                role: *role,
                cidr: cidr.to_string(),
            })
            .collect();
        let mut orchestrator = TransitOrchestrator::new(transit_props);
        orchestrator.provision_subnets(&mut topology, &azs(2)).unwrap();
        orchestrator
            .create_attachment(&mut topology, &StaticSecretResolver::new())
            .unwrap();
        (topology, orchestrator)
    }

    #[test]
    fn test_conflicting_route_applies_nothing() {
        let (mut topology, mut orchestrator) =
            attached(&[(SubnetRole::Transit, "10.1.0.0/16"), (SubnetRole::Transit, "0.0.0.0/0")]);
        topology
            .add_route_to(
                "net-transit-rtb-shared",
                Route {
                    destination: AddressBlock::any_ipv4(),
                    target: RouteTarget::NetworkInterface("eni-fw".to_string()),
                },
                &[],
            )
            .unwrap();
        let before = topology.plan.len();

        assert!(matches!(
            orchestrator.apply_routes(&mut topology),
            Err(TopologyError::ResourceConflict { .. })
        ));
        assert_eq!(orchestrator.state(), TransitState::AttachmentCreated);
        assert_eq!(topology.plan.len(), before);
        assert_eq!(topology.route_tables["net-transit-rtb-shared"].routes.len(), 1);
    }

    #[test]
    fn test_route_with_host_bits_rejected() {
        let (mut topology, mut orchestrator) = attached(&[(SubnetRole::Transit, "172.16.5.0/16")]);
        let before = topology.plan.len();
        assert!(matches!(
            orchestrator.apply_routes(&mut topology),
            Err(TopologyError::InvalidCidr(_))
        ));
        assert_eq!(orchestrator.state(), TransitState::AttachmentCreated);
        assert_eq!(topology.plan.len(), before);
    }
}
