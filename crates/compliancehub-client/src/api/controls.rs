//! Reference controls, the company's applied controls, requirement
//! mappings and control exceptions.

use compliancehub_core::validation;
use compliancehub_core::{
    AppliedControl, AppliedControlId, AppliedControlSummary, AppliedControlUpdate, AppliedCount,
    ApplyControlRequest, ApplyFrameworkControlsRequest, ControlDashboard, ControlException,
    ControlExceptionId, EffectivenessMetrics, ListQuery, MappingId, MessageResponse,
    NewControlException, Page, ReferenceControl, ReferenceControlId, RequirementCoverage,
    RequirementMapping,
};

use super::{action, detail, route};
use crate::error::Result;
use crate::transport::{RequestSpec, Transport};

const PREFIX: &str = "controls/";
const REFERENCE: &str = "controls/reference-controls/";
const APPLIED: &str = "controls/applied-controls/";
const MAPPINGS: &str = "controls/requirement-mappings/";
const EXCEPTIONS: &str = "controls/exceptions/";

/// Applied controls feed compliance scores, so changing them also drops
/// cached compliance data.
const APPLIED_INVALIDATES: &[&str] = &[PREFIX, "compliance/"];

pub struct ControlsApi<'a> {
    transport: &'a Transport,
}

impl<'a> ControlsApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub fn reference(&self) -> ReferenceControlsApi<'a> {
        ReferenceControlsApi {
            transport: self.transport,
        }
    }

    pub fn applied(&self) -> AppliedControlsApi<'a> {
        AppliedControlsApi {
            transport: self.transport,
        }
    }

    pub fn mappings(&self) -> MappingsApi<'a> {
        MappingsApi {
            transport: self.transport,
        }
    }

    pub fn exceptions(&self) -> ExceptionsApi<'a> {
        ExceptionsApi {
            transport: self.transport,
        }
    }
}

/// The shared control catalogue.
pub struct ReferenceControlsApi<'a> {
    transport: &'a Transport,
}

impl ReferenceControlsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<ReferenceControl>> {
        self.transport.get(REFERENCE, query).await
    }

    pub async fn get(&self, id: &ReferenceControlId) -> Result<ReferenceControl> {
        self.transport.get(&detail(REFERENCE, id), &ListQuery::new()).await
    }

    /// Requirement mappings of this control.
    pub async fn requirements(&self, id: &ReferenceControlId) -> Result<Vec<RequirementMapping>> {
        self.transport
            .get(&action(REFERENCE, id, "requirements"), &ListQuery::new())
            .await
    }

    /// The selected company's instances of this control.
    pub async fn applied_instances(
        &self,
        id: &ReferenceControlId,
    ) -> Result<Vec<AppliedControlSummary>> {
        self.transport
            .get(&action(REFERENCE, id, "applied_instances"), &ListQuery::new())
            .await
    }
}

/// The selected company's applied controls.
pub struct AppliedControlsApi<'a> {
    transport: &'a Transport,
}

impl AppliedControlsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<AppliedControlSummary>> {
        self.transport.get(APPLIED, query).await
    }

    pub async fn get(&self, id: &AppliedControlId) -> Result<AppliedControl> {
        self.transport.get(&detail(APPLIED, id), &ListQuery::new()).await
    }

    pub async fn update(
        &self,
        id: &AppliedControlId,
        update: &AppliedControlUpdate,
    ) -> Result<AppliedControl> {
        let spec = RequestSpec::patch(detail(APPLIED, id))
            .json(update)?
            .invalidates(APPLIED_INVALIDATES);
        self.transport.send(spec).await
    }

    pub async fn delete(&self, id: &AppliedControlId) -> Result<()> {
        let spec = RequestSpec::delete(detail(APPLIED, id)).invalidates(APPLIED_INVALIDATES);
        self.transport.send_no_content(spec).await
    }

    /// Instantiate one reference control for the company.
    pub async fn apply_control(&self, request: &ApplyControlRequest) -> Result<AppliedControl> {
        validation::require_non_blank("reference_control", request.reference_control.as_str())?;
        let spec = RequestSpec::post(route(APPLIED, "apply_control"))
            .json(request)?
            .invalidates(APPLIED_INVALIDATES);
        self.transport.send(spec).await
    }

    /// Instantiate every control mapped to a framework's requirements.
    /// Controls already applied are skipped by the server.
    pub async fn apply_framework_controls(
        &self,
        request: &ApplyFrameworkControlsRequest,
    ) -> Result<AppliedCount> {
        validation::require_non_blank("framework", request.framework.as_str())?;
        let spec = RequestSpec::post(route(APPLIED, "apply_framework_controls"))
            .json(request)?
            .invalidates(APPLIED_INVALIDATES);
        self.transport.send(spec).await
    }

    /// How well each requirement of the control is covered.
    pub async fn coverage(&self, id: &AppliedControlId) -> Result<Vec<RequirementCoverage>> {
        self.transport
            .get(&action(APPLIED, id, "coverage"), &ListQuery::new())
            .await
    }

    pub async fn dashboard(&self) -> Result<ControlDashboard> {
        self.transport
            .get(&route(APPLIED, "dashboard"), &ListQuery::new())
            .await
    }

    pub async fn effectiveness_metrics(&self) -> Result<EffectivenessMetrics> {
        self.transport
            .get(&route(APPLIED, "effectiveness_metrics"), &ListQuery::new())
            .await
    }

    pub async fn overdue_reviews(&self) -> Result<Vec<AppliedControlSummary>> {
        self.transport
            .get(&route(APPLIED, "overdue_reviews"), &ListQuery::new())
            .await
    }

    pub async fn with_deficiencies(&self) -> Result<Vec<AppliedControlSummary>> {
        self.transport
            .get(&route(APPLIED, "with_deficiencies"), &ListQuery::new())
            .await
    }
}

/// Requirement to reference-control mappings.
pub struct MappingsApi<'a> {
    transport: &'a Transport,
}

impl MappingsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<RequirementMapping>> {
        self.transport.get(MAPPINGS, query).await
    }

    /// Mark a mapping as validated. Staff only.
    pub async fn validate_mapping(&self, id: &MappingId) -> Result<MessageResponse> {
        let spec = RequestSpec::post(action(MAPPINGS, id, "validate_mapping"))
            .invalidates(&[MAPPINGS, REFERENCE]);
        self.transport.send(spec).await
    }
}

/// Documented deviations from a control.
pub struct ExceptionsApi<'a> {
    transport: &'a Transport,
}

impl ExceptionsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<ControlException>> {
        self.transport.get(EXCEPTIONS, query).await
    }

    pub async fn create(&self, request: &NewControlException) -> Result<ControlException> {
        validation::require_non_blank("reason", &request.reason)?;
        let spec = RequestSpec::post(EXCEPTIONS)
            .json(request)?
            .invalidates(&[EXCEPTIONS]);
        self.transport.send(spec).await
    }

    pub async fn accept(&self, id: &ControlExceptionId) -> Result<MessageResponse> {
        let spec = RequestSpec::post(action(EXCEPTIONS, id, "accept")).invalidates(&[EXCEPTIONS]);
        self.transport.send(spec).await
    }

    /// Active exceptions past their expiration date.
    pub async fn expired(&self) -> Result<Vec<ControlException>> {
        self.transport
            .get(&route(EXCEPTIONS, "expired"), &ListQuery::new())
            .await
    }
}
