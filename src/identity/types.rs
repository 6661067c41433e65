//! Identity and organization types

use super::Plan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a signed-in identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub organization_id: String,
}

/// Organization an identity belongs to
///
/// The plan is held by value: changing plans replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub plan: Plan,
}

impl Organization {
    /// Copy of this organization with `plan` in place of the current one
    pub fn with_plan(&self, plan: Plan) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            plan,
        }
    }
}
