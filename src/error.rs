//! Error types for topology planning.

use thiserror::Error;

/// Errors raised while planning a virtual network topology.
///
/// None of these are retried inside the planner; retry policy belongs to
/// whatever orchestration layer invoked it.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Malformed dotted-quad address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed `addr/len` block.
    #[error("invalid CIDR: {0}")]
    InvalidCidr(String),

    /// Parent block cannot hold the transit window.
    #[error("block {cidr} is smaller than /{min_mask}")]
    BlockTooSmall { cidr: String, min_mask: u8 },

    #[error("exactly one of transit_gateway_id or shared_account_secret_partial_arn must be specified")]
    AmbiguousOrMissingHubReference,

    #[error("failed to resolve hub id from secret {secret}: {reason}")]
    SecretResolutionFailed { secret: String, reason: String },

    /// Route submission attempted before the attachment exists.
    #[error("transit attachment is not created yet (state: {state})")]
    AttachmentNotReady { state: String },

    #[error("rule number {rule_number} ({direction}) already exists in ACL {acl_id}")]
    DuplicateRuleNumber {
        acl_id: String,
        rule_number: u16,
        direction: String,
    },

    #[error("role '{role}' is not supported by {operation}")]
    UnsupportedRole { role: String, operation: String },

    #[error("invalid transition from {from} via {step}")]
    InvalidTransition { from: String, step: String },

    /// Logical id already declared with different parameters.
    #[error("resource {id} already exists with different parameters")]
    ResourceConflict { id: String },

    #[error("resource {id} depends on undeclared resource {dependency}")]
    UnknownDependency { id: String, dependency: String },

    #[error("address space exhausted: {0}")]
    AddressSpaceExhausted(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;
