//! Companies (tenants) and their departments.

use compliancehub_core::validation;
use compliancehub_core::{
    Company, CompanyAccess, CompanyId, CompanyUpdate, Department, DepartmentId, DepartmentInput,
    DepartmentNode, ListQuery, MembershipWithCompany, Page,
};

use super::{action, detail};
use crate::error::Result;
use crate::transport::{RequestSpec, Transport};

const COMPANIES: &str = "companies/";
const CREATE_WITH_MEMBERSHIP: &str = "companies/create_with_membership/";
const DEPARTMENTS: &str = "organizations/departments/";
const DEPARTMENT_TREE: &str = "organizations/departments/tree/";

/// Companies the user belongs to.
pub struct OrganizationsApi<'a> {
    transport: &'a Transport,
}

impl<'a> OrganizationsApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<Company>> {
        self.transport.get(COMPANIES, query).await
    }

    pub async fn get(&self, id: &CompanyId) -> Result<Company> {
        self.transport.get(&detail(COMPANIES, id), &ListQuery::new()).await
    }

    pub async fn update(&self, id: &CompanyId, update: &CompanyUpdate) -> Result<Company> {
        if let Some(name) = &update.name {
            validation::validate_company_name(name)?;
        }
        let spec = RequestSpec::patch(detail(COMPANIES, id))
            .json(update)?
            .invalidates(&[COMPANIES]);
        self.transport.send(spec).await
    }

    /// Create a company with the caller as its owner. The session learns
    /// the new membership; selecting the company is left to the caller.
    pub async fn create_with_membership(&self, name: &str) -> Result<MembershipWithCompany> {
        let name = validation::validate_company_name(name)?;
        let spec = RequestSpec::post(CREATE_WITH_MEMBERSHIP)
            .json(&serde_json::json!({ "name": name }))?
            .invalidates(&[COMPANIES, "memberships/"]);
        let created: MembershipWithCompany = self.transport.send(spec).await?;

        if let Some(mut session) = self.transport.session().await? {
            session.companies.push(CompanyAccess {
                id: created.company.id.clone(),
                name: created.company.name.clone(),
                role: created.membership.role,
            });
            self.transport.save_session(&session).await?;
        }
        Ok(created)
    }

    /// Address later requests to `id` via the tenant header.
    pub async fn select_company(&self, id: &CompanyId) -> Result<()> {
        self.transport.select_company(id.clone()).await
    }

    pub async fn current(&self) -> Result<Option<CompanyId>> {
        self.transport.company().await
    }
}

/// Department hierarchy of the selected company.
pub struct DepartmentsApi<'a> {
    transport: &'a Transport,
}

impl<'a> DepartmentsApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    /// Filter by parent with `query.filter("parent", id)`.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Department>> {
        self.transport.get(DEPARTMENTS, query).await
    }

    pub async fn get(&self, id: &DepartmentId) -> Result<Department> {
        self.transport.get(&detail(DEPARTMENTS, id), &ListQuery::new()).await
    }

    pub async fn create(&self, input: &DepartmentInput) -> Result<Department> {
        validation::require_non_blank("name", &input.name)?;
        let spec = RequestSpec::post(DEPARTMENTS)
            .json(input)?
            .invalidates(&[DEPARTMENTS]);
        self.transport.send(spec).await
    }

    pub async fn update(&self, id: &DepartmentId, input: &DepartmentInput) -> Result<Department> {
        validation::require_non_blank("name", &input.name)?;
        let spec = RequestSpec::patch(detail(DEPARTMENTS, id))
            .json(input)?
            .invalidates(&[DEPARTMENTS]);
        self.transport.send(spec).await
    }

    pub async fn delete(&self, id: &DepartmentId) -> Result<()> {
        let spec = RequestSpec::delete(detail(DEPARTMENTS, id)).invalidates(&[DEPARTMENTS]);
        self.transport.send_no_content(spec).await
    }

    /// Root departments with their descendants nested.
    pub async fn tree(&self) -> Result<Vec<DepartmentNode>> {
        self.transport.get(DEPARTMENT_TREE, &ListQuery::new()).await
    }

    pub async fn ancestors(&self, id: &DepartmentId) -> Result<Vec<Department>> {
        self.transport
            .get(&action(DEPARTMENTS, id, "ancestors"), &ListQuery::new())
            .await
    }

    pub async fn descendants(&self, id: &DepartmentId) -> Result<Vec<Department>> {
        self.transport
            .get(&action(DEPARTMENTS, id, "descendants"), &ListQuery::new())
            .await
    }
}
