//! Semantic subnet roles.

use crate::error::TopologyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four semantic roles a subnet can play.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SubnetRole {
    Public,
    Private,
    Isolated,
    Transit,
}

impl SubnetRole {
    /// All roles, in registry order.
    pub const ALL: [SubnetRole; 4] = [
        SubnetRole::Public,
        SubnetRole::Private,
        SubnetRole::Isolated,
        SubnetRole::Transit,
    ];

    /// Roles created by the primary layout and mutable through the generic path.
    pub const PRIMARY: [SubnetRole; 3] = [
        SubnetRole::Public,
        SubnetRole::Private,
        SubnetRole::Isolated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetRole::Public => "public",
            SubnetRole::Private => "private",
            SubnetRole::Isolated => "isolated",
            SubnetRole::Transit => "transit",
        }
    }

    pub fn is_primary(&self) -> bool {
        !matches!(self, SubnetRole::Transit)
    }
}

impl fmt::Display for SubnetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubnetRole {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(SubnetRole::Public),
            "private" => Ok(SubnetRole::Private),
            "isolated" => Ok(SubnetRole::Isolated),
            "transit" => Ok(SubnetRole::Transit),
            other => Err(TopologyError::Config(format!("unknown subnet role '{other}'"))),
        }
    }
}
