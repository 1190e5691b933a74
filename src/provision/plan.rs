//! Resource graph with explicit dependency edges.
//!
//! A [`Plan`] is what the provisioning engine consumes. Every declaration names
//! the resources it depends on, and those must already be declared, so the graph
//! is acyclic by construction. [`Plan::waves`] groups resources into levels that
//! may be created in parallel; a resource never shares a level with anything it
//! depends on.

use super::resource::{PlannedResource, Resource};
use crate::error::{TopologyError, TopologyResult};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize, Debug, Default, Clone)]
pub struct Plan {
    resources: Vec<PlannedResource>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Plan {
    pub fn new() -> Plan {
        Plan::default()
    }

    /// Check that `id` could be declared with `resource` and `depends_on`
    /// without declaring it. `Ok(true)` means an identical declaration exists.
    pub fn check_declare(
        &self,
        id: &str,
        resource: &Resource,
        depends_on: &[&str],
    ) -> TopologyResult<bool> {
        if let Some(&pos) = self.index.get(id) {
            let existing = &self.resources[pos];
            if &existing.resource == resource && existing.depends_on == depends_on {
                return Ok(true);
            }
            return Err(TopologyError::ResourceConflict { id: id.to_string() });
        }

        if let Some(missing) = depends_on.iter().find(|d| !self.index.contains_key(**d)) {
            return Err(TopologyError::UnknownDependency {
                id: id.to_string(),
                dependency: missing.to_string(),
            });
        }
        Ok(false)
    }

    /// Declare a resource under a logical id.
    ///
    /// Declaring an id again with the same resource and edges succeeds without
    /// adding anything; declaring it with different parameters is a conflict.
    pub fn declare(
        &mut self,
        id: &str,
        resource: Resource,
        depends_on: &[&str],
    ) -> TopologyResult<String> {
        if self.check_declare(id, &resource, depends_on)? {
            log::debug!("{id} already declared with identical parameters");
            return Ok(id.to_string());
        }

        let depends_on: Vec<String> = depends_on.iter().map(|d| d.to_string()).collect();
        log::debug!(
            "declare {kind} {id} depends_on={depends_on:?}",
            kind = resource.kind()
        );
        self.index.insert(id.to_string(), self.resources.len());
        self.resources.push(PlannedResource {
            id: id.to_string(),
            resource,
            depends_on,
        });
        Ok(id.to_string())
    }

    pub fn get(&self, id: &str) -> Option<&PlannedResource> {
        self.index.get(id).map(|&pos| &self.resources[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Resources in declaration order, which is a valid topological order.
    pub fn resources(&self) -> &[PlannedResource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Count declared resources of one platform type.
    pub fn count_kind(&self, kind: &str) -> usize {
        self.resources
            .iter()
            .filter(|r| r.resource.kind() == kind)
            .count()
    }

    /// Dependency level of every resource: 0 without edges, otherwise one more
    /// than its deepest dependency.
    pub fn levels(&self) -> Vec<usize> {
        let mut levels: Vec<usize> = Vec::with_capacity(self.resources.len());
        for planned in &self.resources {
            let level = planned
                .depends_on
                .iter()
                .filter_map(|d| self.index.get(d))
                .map(|&pos| levels[pos] + 1)
                .max()
                .unwrap_or(0);
            levels.push(level);
        }
        levels
    }

    pub fn level_of(&self, id: &str) -> Option<usize> {
        let pos = *self.index.get(id)?;
        Some(self.levels()[pos])
    }

    /// Group resources into waves that can be created concurrently.
    pub fn waves(&self) -> Vec<Vec<&PlannedResource>> {
        let levels = self.levels();
        let depth = levels.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        let mut waves: Vec<Vec<&PlannedResource>> = vec![Vec::new(); depth];
        for (planned, level) in self.resources.iter().zip(levels) {
            waves[level].push(planned);
        }
        waves
    }
}
