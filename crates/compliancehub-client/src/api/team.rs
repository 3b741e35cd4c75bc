//! Memberships and invitations.
//!
//! Role changes, removals and invitations are checked against the caller's
//! role before anything is sent, when the session knows that role. The
//! server enforces the same rules; the pre-check only saves a round-trip.

use compliancehub_core::validation;
use compliancehub_core::{
    CompanyAccess, CompanyId, CoreError, CreateInvitation, Invitation, InvitationAccepted,
    InvitationId, InvitationPreview, ListQuery, Membership, MembershipId, MessageResponse, Page,
    Role, RoleUpdate,
};

use super::{action, detail};
use crate::error::{ClientError, Result};
use crate::transport::{RequestSpec, Transport};

const MEMBERSHIPS: &str = "memberships/";
const COMPANY_MEMBERS: &str = "memberships/company_members/";
const INVITATIONS: &str = "invitations/";
const INVITATION_PREVIEW: &str = "invitations/preview/";
const INVITATION_ACCEPT: &str = "invitations/accept/";

pub struct TeamApi<'a> {
    transport: &'a Transport,
}

impl<'a> TeamApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    /// The caller's role in the selected company, when known.
    async fn caller_role(&self) -> Result<Option<Role>> {
        let Some(session) = self.transport.session().await? else {
            return Ok(None);
        };
        let company = self.transport.company().await?;
        Ok(company.and_then(|c| session.role_in(&c)))
    }

    async fn require_manager(&self, denied: &str) -> Result<Option<Role>> {
        let role = self.caller_role().await?;
        match role {
            Some(r) if !r.can_manage_members() => Err(ClientError::Forbidden(denied.to_string())),
            _ => Ok(role),
        }
    }

    async fn require_company(&self) -> Result<CompanyId> {
        self.transport
            .company()
            .await?
            .ok_or(ClientError::NoCompanySelected)
    }

    /// The caller's own memberships, optionally for one company.
    pub async fn mine(&self, company: Option<&CompanyId>) -> Result<Page<Membership>> {
        let query = ListQuery::new().filter_opt("company", company);
        self.transport.get(MEMBERSHIPS, &query).await
    }

    /// Every active member of the selected company.
    pub async fn members(&self) -> Result<Vec<Membership>> {
        self.require_company().await?;
        self.transport.get(COMPANY_MEMBERS, &ListQuery::new()).await
    }

    pub async fn change_role(&self, id: &MembershipId, role: Role) -> Result<Membership> {
        if role == Role::Unknown {
            return Err(CoreError::invalid("role", "Unknown role.").into());
        }
        let caller = self
            .require_manager("Only owners and admins can change member roles.")
            .await?;
        if let Some(caller) = caller {
            if !caller.can_grant(role) {
                return Err(ClientError::Forbidden(
                    "Only owners can grant the owner role.".to_string(),
                ));
            }
        }
        let spec = RequestSpec::patch(detail(MEMBERSHIPS, id))
            .json(&RoleUpdate { role })?
            .invalidates(&[MEMBERSHIPS]);
        self.transport.send(spec).await
    }

    pub async fn remove(&self, id: &MembershipId) -> Result<()> {
        self.require_manager("Only owners and admins can remove members.")
            .await?;
        let spec = RequestSpec::delete(detail(MEMBERSHIPS, id)).invalidates(&[MEMBERSHIPS]);
        self.transport.send_no_content(spec).await
    }

    /// Invitations of the selected company, newest first.
    pub async fn invitations(&self, query: &ListQuery) -> Result<Page<Invitation>> {
        self.transport.get(INVITATIONS, query).await
    }

    /// Create a shareable invitation. Without an email anyone holding the
    /// link may accept it.
    pub async fn invite(&self, request: &CreateInvitation) -> Result<Invitation> {
        if let Some(email) = &request.email {
            validation::validate_email(email)?;
        }
        let caller = self
            .require_manager("Only owners and admins can create invitations.")
            .await?;
        if let Some(caller) = caller {
            if !caller.can_grant(request.role) {
                return Err(ClientError::Forbidden(format!(
                    "You cannot invite members as {}.",
                    request.role.label()
                )));
            }
        }
        self.require_company().await?;
        let spec = RequestSpec::post(INVITATIONS)
            .json(request)?
            .invalidates(&[INVITATIONS]);
        self.transport.send(spec).await
    }

    pub async fn revoke(&self, id: &InvitationId) -> Result<MessageResponse> {
        self.require_manager("Only owners and admins can revoke invitations.")
            .await?;
        let spec = RequestSpec::post(action(INVITATIONS, id, "revoke")).invalidates(&[INVITATIONS]);
        self.transport.send(spec).await
    }

    /// What an invitation offers. Needs no login.
    pub async fn preview(&self, token: &str) -> Result<InvitationPreview> {
        let token = validation::require_non_blank("token", token)?;
        let spec = RequestSpec::get(INVITATION_PREVIEW)
            .param("token", token)
            .anonymous();
        self.transport.send(spec).await
    }

    /// Join the inviting company as the logged-in user.
    pub async fn accept(&self, token: &str) -> Result<InvitationAccepted> {
        let token = validation::require_non_blank("token", token)?;
        let spec = RequestSpec::post(INVITATION_ACCEPT)
            .json(&serde_json::json!({ "token": token }))?
            .invalidates(&[MEMBERSHIPS, INVITATIONS, "companies/"]);
        let accepted: InvitationAccepted = self.transport.send(spec).await?;

        // The new membership is not in the login-time company list yet
        if let Some(mut session) = self.transport.session().await? {
            if session.role_in(&accepted.company.id).is_none() {
                session.companies.push(CompanyAccess {
                    id: accepted.company.id.clone(),
                    name: accepted.company.name.clone(),
                    role: accepted.membership.role,
                });
                self.transport.save_session(&session).await?;
            }
        }
        Ok(accepted)
    }
}
