//! Companies, memberships, invitations and departments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CompanyId, DepartmentId, InvitationId, MembershipId, UserId};
pub use crate::roles::Role;

/// Subscription plan of a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Professional,
    Enterprise,
    #[serde(other)]
    Unknown,
}

/// A company (tenant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub max_users: u32,
    #[serde(default)]
    pub max_storage_mb: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Body of `PATCH companies/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

/// A user's membership in a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub user: UserId,
    pub company: CompanyId,
    pub role: Role,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Company plus the caller's membership in it.
///
/// Returned when a company is created and when an invitation is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipWithCompany {
    #[serde(default)]
    pub message: String,
    pub company: Company,
    pub membership: Membership,
}

/// Response of `POST invitations/accept/`.
pub type InvitationAccepted = MembershipWithCompany;

/// Body of `PATCH memberships/{id}/`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

/// A shareable invitation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    /// If set, only this address may accept
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub company: Option<CompanyId>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub invited_by: Option<UserId>,
    #[serde(default)]
    pub invited_by_email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accepted_by: Option<UserId>,
    #[serde(default)]
    pub is_revoked: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Not yet accepted, not revoked, not expired at `now`.
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked
            && self.accepted_at.is_none()
            && self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// Public view of an invitation, readable without logging in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationPreview {
    #[serde(default)]
    pub company_name: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub invited_by_email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_valid: Option<bool>,
}

/// Body of `POST invitations/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInvitation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
}

/// A department inside a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub parent: Option<DepartmentId>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub manager: Option<UserId>,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub children_count: u32,
    #[serde(default)]
    pub company: Option<CompanyId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A node of `organizations/departments/tree/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentNode {
    pub id: DepartmentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub manager: Option<UserId>,
    #[serde(default)]
    pub children: Vec<DepartmentNode>,
}

impl DepartmentNode {
    /// Number of departments in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(DepartmentNode::size).sum::<usize>()
    }
}

/// Body for creating or updating a department.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<DepartmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<UserId>,
}
