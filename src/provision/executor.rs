//! Plan execution against a platform API.

use super::plan::Plan;
use super::resource::PlannedResource;
use crate::error::{TopologyError, TopologyResult};
use colored::Colorize;
use std::collections::HashSet;

/// Result of asking the platform to create one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The platform already has a resource under this id.
    AlreadyExists { identical: bool },
}

/// The provisioning platform.
pub trait ResourceApi {
    /// Create `planned` and return once the platform confirms it.
    fn create(&mut self, planned: &PlannedResource) -> TopologyResult<CreateOutcome>;
}

/// Summary of an execution.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub created: Vec<String>,
    pub already_present: Vec<String>,
}

/// Execute `plan` wave by wave.
///
/// A resource is submitted only after every dependency was confirmed. Existing
/// identical resources count as success; the first failure halts execution and
/// nothing is rolled back.
pub fn execute(plan: &Plan, api: &mut dyn ResourceApi) -> TopologyResult<ExecutionReport> {
    let mut report = ExecutionReport::default();
    let mut confirmed: HashSet<&str> = HashSet::new();

    for (n, wave) in plan.waves().into_iter().enumerate() {
        log::info!("wave #{n:2}: {} resources", wave.len());
        for planned in &wave {
            if let Some(dep) = planned
                .depends_on
                .iter()
                .find(|d| !confirmed.contains(d.as_str()))
            {
                return Err(TopologyError::UnknownDependency {
                    id: planned.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        for planned in wave {
            match api.create(planned)? {
                CreateOutcome::Created => report.created.push(planned.id.clone()),
                CreateOutcome::AlreadyExists { identical: true } => {
                    log::debug!("{} already exists", planned.id);
                    report.already_present.push(planned.id.clone())
                }
                CreateOutcome::AlreadyExists { identical: false } => {
                    log::error!(
                        "{} {} exists with different parameters",
                        "conflict".on_red(),
                        planned.id
                    );
                    return Err(TopologyError::ResourceConflict {
                        id: planned.id.clone(),
                    });
                }
            }
            confirmed.insert(planned.id.as_str());
        }
    }

    log::info!(
        "execution done: created={} already_present={}",
        report.created.len(),
        report.already_present.len()
    );
    Ok(report)
}

/// Logs every submission and reports it as created.
#[derive(Debug, Default)]
pub struct DryRunApi {
    pub submitted: Vec<String>,
}

impl ResourceApi for DryRunApi {
    fn create(&mut self, planned: &PlannedResource) -> TopologyResult<CreateOutcome> {
        log::info!(
            "dry-run create {kind} {id}",
            kind = planned.resource.kind(),
            id = planned.id.blue()
        );
        self.submitted.push(planned.id.clone());
        Ok(CreateOutcome::Created)
    }
}
