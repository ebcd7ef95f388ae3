// ABOUTME: Permission model for board access checks
// ABOUTME: Explicit role-to-permission mapping consumed by the request layer

use serde::{Deserialize, Serialize};

/// What a caller wants to do with a board resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    Read,
    Write,
}

/// Role a user holds within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectRole {
    Admin,
    Member,
}

impl ProjectRole {
    /// Whether this role grants the requested permission.
    ///
    /// Admins can read and write; members are read-only.
    pub fn grants(self, permission: Permission) -> bool {
        match (self, permission) {
            (ProjectRole::Admin, _) => true,
            (ProjectRole::Member, Permission::Read) => true,
            (ProjectRole::Member, Permission::Write) => false,
        }
    }
}
