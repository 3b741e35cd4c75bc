//! Company roles and the permission matrix.
//!
//! Mirrors the server's role table so the client can hide or refuse actions
//! the server would reject anyway. The server remains the authority.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A member's role within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Manager,
    Analyst,
    Auditor,
    Viewer,
    #[serde(other)]
    Unknown,
}

/// An action gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewAny,
    ViewOwn,
    ViewAssigned,
    ViewEvidence,
    CreateAny,
    CreateEvidence,
    UpdateAny,
    UpdateOwn,
    DeleteAny,
    DeleteOwn,
    ManageUsers,
    ManageSettings,
    AssignControls,
    ManageRisks,
    AssessRisks,
    ExportReports,
}

impl Role {
    /// Every assignable role, most privileged first.
    pub const ALL: [Role; 6] = [
        Role::Owner,
        Role::Admin,
        Role::Manager,
        Role::Analyst,
        Role::Auditor,
        Role::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Analyst => "analyst",
            Role::Auditor => "auditor",
            Role::Viewer => "viewer",
            Role::Unknown => "unknown",
        }
    }

    /// Display label used by the web UI.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Admin => "Administrator",
            Role::Manager => "Manager",
            Role::Analyst => "Analyst",
            Role::Auditor => "Auditor",
            Role::Viewer => "Viewer",
            Role::Unknown => "Unknown",
        }
    }

    /// Explicit permissions granted to this role. Owners hold every
    /// permission and return an empty slice here; use [`Role::can`].
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Owner | Role::Unknown => &[],
            Role::Admin => &[
                ViewAny,
                CreateAny,
                UpdateAny,
                DeleteAny,
                ManageUsers,
                ManageSettings,
            ],
            Role::Manager => &[
                ViewAny,
                CreateAny,
                UpdateOwn,
                DeleteOwn,
                AssignControls,
                ManageRisks,
            ],
            Role::Analyst => &[ViewAny, CreateEvidence, UpdateOwn, AssessRisks],
            Role::Auditor => &[ViewAny, ExportReports, ViewEvidence],
            Role::Viewer => &[ViewOwn, ViewAssigned],
        }
    }

    /// Whether this role holds `permission`.
    pub fn can(&self, permission: Permission) -> bool {
        match self {
            Role::Owner => true,
            other => other.permissions().contains(&permission),
        }
    }

    /// Owners and admins manage memberships and invitations.
    pub fn can_manage_members(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    /// Whether this role may assign `target` to another member.
    ///
    /// Only an owner can grant the owner role; admins can grant anything else.
    pub fn can_grant(&self, target: Role) -> bool {
        match self {
            Role::Owner => target != Role::Unknown,
            Role::Admin => !matches!(target, Role::Owner | Role::Unknown),
            _ => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CoreError::invalid(
                    "role",
                    format!(
                        "'{}' is not one of owner, admin, manager, analyst, auditor, viewer",
                        s
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_can_everything() {
        assert!(Role::Owner.can(Permission::ManageUsers));
        assert!(Role::Owner.can(Permission::ExportReports));
        assert!(Role::Owner.can(Permission::ViewAssigned));
    }

    #[test]
    fn test_matrix_rows() {
        assert!(Role::Admin.can(Permission::ManageSettings));
        assert!(!Role::Admin.can(Permission::ExportReports));
        assert!(Role::Manager.can(Permission::AssignControls));
        assert!(!Role::Manager.can(Permission::UpdateAny));
        assert!(Role::Analyst.can(Permission::CreateEvidence));
        assert!(Role::Auditor.can(Permission::ViewEvidence));
        assert!(!Role::Auditor.can(Permission::CreateAny));
        assert!(Role::Viewer.can(Permission::ViewOwn));
        assert!(!Role::Viewer.can(Permission::ViewAny));
        assert!(!Role::Unknown.can(Permission::ViewOwn));
    }

    #[test]
    fn test_only_owner_grants_owner() {
        assert!(Role::Owner.can_grant(Role::Owner));
        assert!(!Role::Admin.can_grant(Role::Owner));
        assert!(Role::Admin.can_grant(Role::Admin));
        assert!(Role::Admin.can_grant(Role::Viewer));
        assert!(!Role::Manager.can_grant(Role::Viewer));
    }

    #[test]
    fn test_member_management() {
        assert!(Role::Owner.can_manage_members());
        assert!(Role::Admin.can_manage_members());
        assert!(!Role::Auditor.can_manage_members());
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let r: Role = serde_json::from_str("\"superuser\"").unwrap();
        assert_eq!(r, Role::Unknown);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Analyst".parse::<Role>().unwrap(), Role::Analyst);
        assert!("root".parse::<Role>().is_err());
    }
}
