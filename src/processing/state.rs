//! Topology state threaded through every planning step.
//!
//! A [`TopologyState`] is owned by one planning call. It carries the per-role
//! registries consumed by callers, the route tables and ACLs with their
//! contents, and the [`Plan`] the provisioning engine will execute.

use crate::error::{TopologyError, TopologyResult};
use crate::models::{
    cidr_slug, Acl, AclEntry, AddressBlock, Route, RouteTable, Subnet, SubnetRole,
};
use crate::provision::{Plan, Resource};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Identifiers of everything belonging to one role.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct RoleRegistry {
    pub subnet_ids: Vec<String>,
    pub route_table_ids: Vec<String>,
    pub acl_ids: Vec<String>,
}

/// One registry per role.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct Registries {
    pub public: RoleRegistry,
    pub private: RoleRegistry,
    pub isolated: RoleRegistry,
    pub transit: RoleRegistry,
}

impl Registries {
    pub fn get(&self, role: SubnetRole) -> &RoleRegistry {
        match role {
            SubnetRole::Public => &self.public,
            SubnetRole::Private => &self.private,
            SubnetRole::Isolated => &self.isolated,
            SubnetRole::Transit => &self.transit,
        }
    }

    pub fn get_mut(&mut self, role: SubnetRole) -> &mut RoleRegistry {
        match role {
            SubnetRole::Public => &mut self.public,
            SubnetRole::Private => &mut self.private,
            SubnetRole::Isolated => &mut self.isolated,
            SubnetRole::Transit => &mut self.transit,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct TopologyState {
    /// Network name, prefix of every logical id.
    pub name: String,
    pub vpc_id: String,
    pub vpc_cidr: AddressBlock,
    registries: Registries,
    pub subnets: Vec<Subnet>,
    pub route_tables: BTreeMap<String, RouteTable>,
    pub acls: BTreeMap<String, Acl>,
    pub plan: Plan,
    pub transit_attachment_id: Option<String>,
}

impl TopologyState {
    /// Start a topology for the network `name` and declare its VPC.
    pub fn new(name: &str, vpc_cidr: AddressBlock) -> TopologyResult<TopologyState> {
        if !vpc_cidr.is_network() {
            log::warn!(
                "VPC CIDR {vpc_cidr} has host bits set; planning with {}",
                vpc_cidr.network()
            );
        }
        let vpc_cidr = vpc_cidr.network();
        let mut plan = Plan::new();
        let vpc_id = plan.declare(&format!("{name}-vpc"), Resource::Vpc { cidr: vpc_cidr }, &[])?;

        Ok(TopologyState {
            name: name.to_string(),
            vpc_id,
            vpc_cidr,
            registries: Registries::default(),
            subnets: Vec::new(),
            route_tables: BTreeMap::new(),
            acls: BTreeMap::new(),
            plan,
            transit_attachment_id: None,
        })
    }

    /// Logical id scoped to this network.
    pub fn resource_id(&self, suffix: &str) -> String {
        format!("{}-{}", self.name, suffix)
    }

    pub fn registry(&self, role: SubnetRole) -> &RoleRegistry {
        self.registries.get(role)
    }

    pub(crate) fn registry_mut(&mut self, role: SubnetRole) -> &mut RoleRegistry {
        self.registries.get_mut(role)
    }

    /// All four registries in role order.
    pub fn registries(&self) -> impl Iterator<Item = (SubnetRole, &RoleRegistry)> {
        SubnetRole::ALL
            .into_iter()
            .map(move |role| (role, self.registries.get(role)))
    }

    pub fn subnets_of(&self, role: SubnetRole) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(move |s| s.role == role)
    }

    /// Every route table id across all roles, in registry order.
    pub fn all_route_table_ids(&self) -> Vec<String> {
        self.registries()
            .flat_map(|(_, r)| r.route_table_ids.iter().cloned())
            .collect()
    }

    /// Declare a route table. Registration under a role is the caller's job.
    pub fn add_route_table(&mut self, id: &str, role: SubnetRole) -> TopologyResult<String> {
        let vpc_id = self.vpc_id.clone();
        self.plan.declare(
            id,
            Resource::RouteTable {
                role,
                name: id.to_string(),
            },
            &[vpc_id.as_str()],
        )?;
        self.route_tables
            .entry(id.to_string())
            .or_insert_with(|| RouteTable::new(id, role));
        Ok(id.to_string())
    }

    /// Declare an ACL. Registration under a role is the caller's job.
    pub fn add_acl(&mut self, id: &str, role: SubnetRole) -> TopologyResult<String> {
        let vpc_id = self.vpc_id.clone();
        self.plan.declare(
            id,
            Resource::NetworkAcl {
                role,
                name: id.to_string(),
            },
            &[vpc_id.as_str()],
        )?;
        self.acls
            .entry(id.to_string())
            .or_insert_with(|| Acl::new(id));
        Ok(id.to_string())
    }

    /// Declare a subnet and associate it with its route table.
    pub fn add_subnet(&mut self, subnet: &Subnet) -> TopologyResult<()> {
        if !self.vpc_cidr.contains_block(&subnet.cidr) {
            return Err(TopologyError::AddressSpaceExhausted(format!(
                "subnet {} ({}) is outside {}",
                subnet.id, subnet.cidr, self.vpc_cidr
            )));
        }
        let vpc_id = self.vpc_id.clone();
        self.plan.declare(
            &subnet.id,
            Resource::Subnet {
                availability_zone: subnet.availability_zone.clone(),
                cidr: subnet.cidr,
                role: subnet.role,
            },
            &[vpc_id.as_str()],
        )?;
        self.plan.declare(
            &format!("{}-rtb-assoc", subnet.id),
            Resource::SubnetRouteTableAssociation {
                subnet_id: subnet.id.clone(),
                route_table_id: subnet.route_table_id.clone(),
            },
            &[subnet.id.as_str(), subnet.route_table_id.as_str()],
        )?;
        if !self.subnets.iter().any(|s| s.id == subnet.id) {
            self.subnets.push(subnet.clone());
        }
        Ok(())
    }

    /// Associate a subnet with an ACL.
    pub fn associate_acl(&mut self, subnet_id: &str, acl_id: &str) -> TopologyResult<()> {
        self.plan.declare(
            &format!("{subnet_id}-nacl-assoc"),
            Resource::SubnetNetworkAclAssociation {
                subnet_id: subnet_id.to_string(),
                network_acl_id: acl_id.to_string(),
            },
            &[subnet_id, acl_id],
        )?;
        Ok(())
    }

    /// Check whether `entry` may be appended to the ACL `acl_id`.
    pub fn check_acl_entry(&self, acl_id: &str, entry: &AclEntry) -> TopologyResult<()> {
        let acl = self.acls.get(acl_id).ok_or_else(|| TopologyError::UnknownDependency {
            id: format!("{acl_id}-entry"),
            dependency: acl_id.to_string(),
        })?;
        if acl.entries.contains(entry) {
            return Ok(());
        }
        acl.check_entry(entry)
    }

    /// Append an entry to one ACL. Re-adding an identical entry is a no-op.
    pub fn add_acl_entry_to(&mut self, acl_id: &str, entry: AclEntry) -> TopologyResult<String> {
        self.check_acl_entry(acl_id, &entry)?;
        let id = format!("{acl_id}-{}-{}", entry.direction, entry.rule_number);
        self.plan.declare(
            &id,
            Resource::NetworkAclEntry {
                network_acl_id: acl_id.to_string(),
                entry: entry.clone(),
            },
            &[acl_id],
        )?;
        if let Some(acl) = self.acls.get_mut(acl_id) {
            if !acl.entries.contains(&entry) {
                acl.entries.push(entry);
            }
        }
        Ok(id)
    }

    /// Logical id of the route to `destination` in one table.
    pub fn route_id(route_table_id: &str, destination: &AddressBlock) -> String {
        format!("{route_table_id}-{}", cidr_slug(destination))
    }

    fn route_resource(route_table_id: &str, route: &Route) -> Resource {
        Resource::Route {
            route_table_id: route_table_id.to_string(),
            destination: route.destination,
            target: route.target.clone(),
        }
    }

    /// Check whether `route` may be added to `route_table_id`. Returns its id.
    pub fn check_route(
        &self,
        route_table_id: &str,
        route: &Route,
        extra_depends_on: &[&str],
    ) -> TopologyResult<String> {
        if !self.route_tables.contains_key(route_table_id) {
            return Err(TopologyError::UnknownDependency {
                id: format!("{route_table_id}-route"),
                dependency: route_table_id.to_string(),
            });
        }
        if !route.destination.is_network() {
            return Err(TopologyError::InvalidCidr(format!(
                "route destination {} has host bits set (did you mean {}?)",
                route.destination,
                route.destination.network()
            )));
        }
        let id = TopologyState::route_id(route_table_id, &route.destination);
        let mut depends_on = vec![route_table_id];
        depends_on.extend_from_slice(extra_depends_on);
        self.plan.check_declare(
            &id,
            &TopologyState::route_resource(route_table_id, route),
            &depends_on,
        )?;
        Ok(id)
    }

    /// Add a route to one route table, with extra dependency edges.
    pub fn add_route_to(
        &mut self,
        route_table_id: &str,
        route: Route,
        extra_depends_on: &[&str],
    ) -> TopologyResult<String> {
        let id = self.check_route(route_table_id, &route, extra_depends_on)?;
        let mut depends_on = vec![route_table_id];
        depends_on.extend_from_slice(extra_depends_on);
        self.plan.declare(
            &id,
            TopologyState::route_resource(route_table_id, &route),
            &depends_on,
        )?;
        if let Some(table) = self.route_tables.get_mut(route_table_id) {
            table.add_route(route);
        }
        Ok(id)
    }

    /// Add a batch of `(route table, route)` pairs sharing `extra_depends_on`.
    ///
    /// Every route is checked against the plan and against the rest of the
    /// batch first; on error nothing is added.
    pub fn add_routes(
        &mut self,
        routes: Vec<(String, Route)>,
        extra_depends_on: &[&str],
    ) -> TopologyResult<Vec<String>> {
        let mut pending: HashMap<String, &Route> = HashMap::new();
        for (route_table_id, route) in &routes {
            let id = self.check_route(route_table_id, route, extra_depends_on)?;
            if let Some(other) = pending.get(&id) {
                if *other != route {
                    return Err(TopologyError::ResourceConflict { id });
                }
                continue;
            }
            pending.insert(id, route);
        }

        let mut ids = Vec::with_capacity(routes.len());
        for (route_table_id, route) in routes {
            ids.push(self.add_route_to(&route_table_id, route, extra_depends_on)?);
        }
        Ok(ids)
    }
}
