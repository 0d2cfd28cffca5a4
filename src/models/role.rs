//! Application roles. Role strings come from a loosely typed table and are
//! parsed into a closed enum at the boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    SuperAdmin,
    CenterAdmin,
    Student,
    Coordinator,
}

impl AppRole {
    pub const ALL: [AppRole; 4] = [
        AppRole::SuperAdmin,
        AppRole::CenterAdmin,
        AppRole::Student,
        AppRole::Coordinator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::SuperAdmin => "super_admin",
            AppRole::CenterAdmin => "center_admin",
            AppRole::Student => "student",
            AppRole::Coordinator => "coordinator",
        }
    }

    /// Whether principals with this role are bound to a single center.
    pub fn is_tenant_scoped(&self) -> bool {
        matches!(self, AppRole::CenterAdmin)
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role string that does not name any known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for AppRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(AppRole::SuperAdmin),
            "center_admin" => Ok(AppRole::CenterAdmin),
            "student" => Ok(AppRole::Student),
            "coordinator" => Ok(AppRole::Coordinator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
