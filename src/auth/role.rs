use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced when a role string is outside the closed set.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// The closed set of staff roles. Every verified identity carries exactly one
/// of these; a value outside the set is a data-integrity defect and is
/// rejected at the deserialization boundary, never represented in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Doctor,
    Nurse,
    Receptionist,
    Pharmacist,
}

impl Role {
    /// Roles permitted to perform administrative user-management operations.
    pub fn is_administrative(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Receptionist => "receptionist",
            Role::Pharmacist => "pharmacist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "receptionist" => Ok(Role::Receptionist),
            "pharmacist" => Ok(Role::Pharmacist),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
