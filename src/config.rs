//! Planner constants and plan-file configuration.

use crate::error::{TopologyError, TopologyResult};
use crate::models::{AclEntry, RouteTarget, SubnetRole, VnetDescriptor};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix length of every transit subnet.
pub const TRANSIT_SUBNET_MASK: u8 = 27;
/// Number of transit blocks carved from the transit window.
pub const MAX_TRANSIT_SUBNETS: usize = 8;
/// Size of the window at the top of the parent reserved for transit subnets.
pub const TRANSIT_WINDOW_SIZE: u64 = 256;
/// Smallest parent block able to hold the transit window.
pub const MIN_PARENT_MASK: u8 = 24;
/// Default prefix length of primary subnets.
pub const DEFAULT_SUBNET_MASK: u8 = 23;

/// Flow log retention when the plan file gives none.
pub const DEFAULT_FLOW_LOG_RETENTION_DAYS: u32 = 7;
/// Retention periods the log service accepts.
pub const FLOW_LOG_RETENTION_DAYS: [u32; 22] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

pub const PLAN_FILE_ENV: &str = "TOPOLOGY_PLAN_FILE";
pub const DEFAULT_PLAN_FILE: &str = "topology.json";
pub const OUTPUT_DIR_ENV: &str = "TOPOLOGY_OUTPUT_DIR";

fn default_gateway_endpoints() -> Vec<String> {
    vec!["dynamodb".to_string(), "s3".to_string()]
}

fn default_flow_log_retention() -> u32 {
    DEFAULT_FLOW_LOG_RETENTION_DAYS
}

/// A peer CIDR to send over the transit hub from subnets of `role`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransitRouteRequest {
    pub role: SubnetRole,
    pub cidr: String,
}

/// Connects the network to an existing transit hub.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TransitGatewayProps {
    /// Hub id used directly, e.g. `tgw-0abc`.
    #[serde(default)]
    pub transit_gateway_id: Option<String>,
    /// Partial ARN (no random suffix) of a shared secret holding the hub id under key `id`.
    #[serde(default)]
    pub shared_account_secret_partial_arn: Option<String>,
    #[serde(default)]
    pub routes: Vec<TransitRouteRequest>,
}

/// Caller route added to every route table of a role.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub role: SubnetRole,
    pub cidrs: Vec<String>,
    pub target: RouteTarget,
}

/// Caller ACL entry added to every ACL of a role.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AclRequest {
    pub role: SubnetRole,
    #[serde(flatten)]
    pub entry: AclEntry,
}

/// Contents of a plan file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlanConfig {
    /// Name used for tagging and resource ids.
    pub name: String,
    pub region: String,
    pub vpc: VnetDescriptor,
    #[serde(default)]
    pub transit_gateway: Option<TransitGatewayProps>,
    #[serde(default)]
    pub routes: Vec<RouteRequest>,
    #[serde(default)]
    pub acl_entries: Vec<AclRequest>,
    #[serde(default = "default_gateway_endpoints")]
    pub gateway_endpoints: Vec<String>,
    /// Days the flow log group keeps records.
    #[serde(default = "default_flow_log_retention")]
    pub flow_log_retention_days: u32,
}

impl PlanConfig {
    /// Parse a plan from JSON text, reporting the failing path.
    pub fn from_json(json: &str) -> TopologyResult<PlanConfig> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
            TopologyError::Config(format!("error parsing plan: path={} error={}", e.path(), e))
        })
    }

    /// The VPC CIDR, or a message telling the user where to set it.
    pub fn cidr_block(&self) -> TopologyResult<&str> {
        self.vpc.cidr_block.as_deref().ok_or_else(|| {
            TopologyError::Config(format!(
                "the VPC CIDR block must be defined for '{}'; set vpc.cidr_block in the plan file",
                self.name
            ))
        })
    }
}

/// Resolve the plan file path from the environment.
pub fn plan_file_path() -> String {
    std::env::var(PLAN_FILE_ENV).unwrap_or_else(|_| DEFAULT_PLAN_FILE.to_string())
}

/// Resolve the output directory from the environment.
pub fn output_dir() -> String {
    std::env::var(OUTPUT_DIR_ENV).unwrap_or_else(|_| ".".to_string())
}

/// Read and parse a plan file.
pub fn load_plan_config(path: &str) -> TopologyResult<PlanConfig> {
    if !Path::new(path).exists() {
        return Err(TopologyError::Config(format!(
            "plan file does not exist: {path}"
        )));
    }
    log::info!("Reading plan file: {path}");
    let json = std::fs::read_to_string(path)?;
    PlanConfig::from_json(&json)
}
