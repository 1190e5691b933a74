//! Boundary to the provisioning platform.
//!
//! This module handles everything that talks to, or stands in for, the platform:
//! - [`plan`] - resource graph with explicit dependency edges
//! - [`executor`] - wave-by-wave execution against a [`ResourceApi`]
//! - [`secrets`] - hub id lookup from a shared secret
//! - [`cli`] - platform CLI command execution

pub mod cli;
pub mod executor;
pub mod plan;
mod resource;
pub mod secrets;

// Re-export public types and functions
pub use executor::{execute, CreateOutcome, DryRunApi, ExecutionReport, ResourceApi};
pub use plan::Plan;
pub use resource::{PlannedResource, Resource};
pub use secrets::{AwsCliSecretResolver, SecretResolver, StaticSecretResolver};
