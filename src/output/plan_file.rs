//! Rendered plan written to a dated JSON file.

use crate::error::TopologyResult;
use crate::processing::TopologyState;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What goes on disk: the full state plus the creation waves by id.
#[derive(Serialize, Debug)]
struct PlanFile<'a> {
    generated: String,
    waves: Vec<Vec<&'a str>>,
    topology: &'a TopologyState,
}

/// File name for a plan generated on `date` (`YYYY-MM-DD`).
pub fn plan_file_name(date: &str) -> String {
    format!("topology_plan_{date}.json")
}

/// Write the plan as `topology_plan_{YYYY-MM-DD}.json` under `dir`.
pub fn write_plan(state: &TopologyState, dir: &Path) -> TopologyResult<PathBuf> {
    let now = chrono::Utc::now();
    let path = dir.join(plan_file_name(&now.format("%Y-%m-%d").to_string()));

    let waves = state.plan.waves();
    let file = PlanFile {
        generated: now.to_rfc3339(),
        waves: waves
            .iter()
            .map(|wave| wave.iter().map(|r| r.id.as_str()).collect())
            .collect(),
        topology: state,
    };
    let json = serde_json::to_string_pretty(&file)?;
    log::warn!("Writing plan file: {}", path.display());
    std::fs::write(&path, json)?;
    Ok(path)
}
