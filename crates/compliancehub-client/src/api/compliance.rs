//! Compliance scoring, gaps, framework adoptions and reports.

use compliancehub_core::{
    AdoptFramework, AdoptionId, CalculateAllResponse, CalculateRequest, Certification,
    ComplianceGap, ComplianceOverview, ComplianceReport, ComplianceResult, ComplianceResultId,
    ComplianceResultSummary, CoreError, DepartmentId, DownloadedFile, FrameworkAdoption,
    FrameworkId, GapAnalysis, GapId, GenerateReport, ListQuery, Page, Recommendation, ReportId,
    RequirementOutcome, SeverityCount, TrendPoint,
};
use std::collections::BTreeMap;

use super::{action, detail, route};
use crate::error::Result;
use crate::transport::{RequestSpec, Transport};

const PREFIX: &str = "compliance/";
const RESULTS: &str = "compliance/results/";
const GAPS: &str = "compliance/gaps/";
const ADOPTIONS: &str = "compliance/adoptions/";
const REPORTS: &str = "compliance/reports/";

/// Months of history `trends` covers unless told otherwise.
pub const DEFAULT_TREND_MONTHS: u32 = 12;

pub struct ComplianceApi<'a> {
    transport: &'a Transport,
}

impl<'a> ComplianceApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub fn gaps(&self) -> GapsApi<'a> {
        GapsApi {
            transport: self.transport,
        }
    }

    pub fn adoptions(&self) -> AdoptionsApi<'a> {
        AdoptionsApi {
            transport: self.transport,
        }
    }

    pub fn reports(&self) -> ReportsApi<'a> {
        ReportsApi {
            transport: self.transport,
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<ComplianceResultSummary>> {
        self.transport.get(RESULTS, query).await
    }

    pub async fn get(&self, id: &ComplianceResultId) -> Result<ComplianceResult> {
        self.transport.get(&detail(RESULTS, id), &ListQuery::new()).await
    }

    /// Score a framework now. The new result becomes the current one for the
    /// framework (and department, if given).
    pub async fn calculate(
        &self,
        framework: &FrameworkId,
        department: Option<&DepartmentId>,
    ) -> Result<ComplianceResult> {
        let body = CalculateRequest {
            framework: framework.clone(),
            department: department.cloned(),
        };
        let spec = RequestSpec::post(route(RESULTS, "calculate"))
            .json(&body)?
            .invalidates(&[PREFIX]);
        self.transport.send(spec).await
    }

    /// Score every adopted framework.
    pub async fn calculate_all(&self) -> Result<CalculateAllResponse> {
        let spec = RequestSpec::post(route(RESULTS, "calculate_all")).invalidates(&[PREFIX]);
        self.transport.send(spec).await
    }

    /// Per-requirement outcome keyed by requirement id.
    pub async fn requirement_breakdown(
        &self,
        id: &ComplianceResultId,
    ) -> Result<BTreeMap<String, RequirementOutcome>> {
        self.transport
            .get(&action(RESULTS, id, "requirement_breakdown"), &ListQuery::new())
            .await
    }

    /// The current result of each framework.
    pub async fn current(&self) -> Result<Vec<ComplianceResultSummary>> {
        self.transport
            .get(&route(RESULTS, "current"), &ListQuery::new())
            .await
    }

    pub async fn overview(&self) -> Result<ComplianceOverview> {
        self.transport
            .get(&route(RESULTS, "overview"), &ListQuery::new())
            .await
    }

    /// Score history over the last `months` months, oldest first.
    pub async fn trends(&self, framework: &FrameworkId, months: u32) -> Result<Vec<TrendPoint>> {
        if months == 0 {
            return Err(CoreError::invalid("months", "Must be at least 1.").into());
        }
        let query = ListQuery::new()
            .filter("framework", framework)
            .filter("months", months);
        self.transport.get(&route(RESULTS, "trends"), &query).await
    }

    /// Requirement gaps of the framework's current result.
    pub async fn gap_analysis(&self, framework: &FrameworkId) -> Result<GapAnalysis> {
        let query = ListQuery::new().filter("framework", framework);
        self.transport
            .get(&route(RESULTS, "gap_analysis"), &query)
            .await
    }

    /// Prioritized remediation actions for the framework.
    pub async fn recommendations(&self, framework: &FrameworkId) -> Result<Vec<Recommendation>> {
        let query = ListQuery::new().filter("framework", framework);
        self.transport
            .get(&route(RESULTS, "recommendations"), &query)
            .await
    }
}

/// Tracked compliance gaps.
pub struct GapsApi<'a> {
    transport: &'a Transport,
}

impl GapsApi<'_> {
    /// Filter with `severity`, `status`, `gap_type` or `remediation_owner`.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<ComplianceGap>> {
        self.transport.get(GAPS, query).await
    }

    pub async fn resolve(&self, id: &GapId, notes: &str) -> Result<ComplianceGap> {
        let spec = RequestSpec::post(action(GAPS, id, "resolve"))
            .json(&serde_json::json!({ "notes": notes }))?
            .invalidates(&[GAPS]);
        self.transport.send(spec).await
    }

    pub async fn accept_risk(&self, id: &GapId) -> Result<ComplianceGap> {
        let spec = RequestSpec::post(action(GAPS, id, "accept_risk")).invalidates(&[GAPS]);
        self.transport.send(spec).await
    }

    pub async fn open(&self) -> Result<Vec<ComplianceGap>> {
        self.transport.get(&route(GAPS, "open"), &ListQuery::new()).await
    }

    /// Open or in-progress gaps past their remediation due date.
    pub async fn overdue(&self) -> Result<Vec<ComplianceGap>> {
        self.transport
            .get(&route(GAPS, "overdue"), &ListQuery::new())
            .await
    }

    pub async fn by_severity(&self) -> Result<Vec<SeverityCount>> {
        self.transport
            .get(&route(GAPS, "by_severity"), &ListQuery::new())
            .await
    }
}

/// Framework adoption programs and certifications.
pub struct AdoptionsApi<'a> {
    transport: &'a Transport,
}

impl AdoptionsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<FrameworkAdoption>> {
        self.transport.get(ADOPTIONS, query).await
    }

    /// Start a program for a framework. Adopting the same framework twice
    /// is rejected by the server.
    pub async fn adopt(&self, request: &AdoptFramework) -> Result<FrameworkAdoption> {
        let spec = RequestSpec::post(route(ADOPTIONS, "adopt_framework"))
            .json(request)?
            .invalidates(&[PREFIX]);
        self.transport.send(spec).await
    }

    pub async fn certify(
        &self,
        id: &AdoptionId,
        certification: &Certification,
    ) -> Result<FrameworkAdoption> {
        if let (Some(from), Some(until)) = (
            certification.certification_date,
            certification.certification_expiry_date,
        ) {
            if until < from {
                return Err(CoreError::invalid(
                    "certification_expiry_date",
                    "Expiry date is before the certification date.",
                )
                .into());
            }
        }
        let spec = RequestSpec::post(action(ADOPTIONS, id, "certify"))
            .json(certification)?
            .invalidates(&[ADOPTIONS]);
        self.transport.send(spec).await
    }

    /// Programs that are implementing, operational or certified.
    pub async fn active(&self) -> Result<Vec<FrameworkAdoption>> {
        self.transport
            .get(&route(ADOPTIONS, "active"), &ListQuery::new())
            .await
    }

    pub async fn certified(&self) -> Result<Vec<FrameworkAdoption>> {
        self.transport
            .get(&route(ADOPTIONS, "certified"), &ListQuery::new())
            .await
    }

    /// Certifications expiring within 90 days.
    pub async fn expiring_soon(&self) -> Result<Vec<FrameworkAdoption>> {
        self.transport
            .get(&route(ADOPTIONS, "expiring_soon"), &ListQuery::new())
            .await
    }
}

pub struct ReportsApi<'a> {
    transport: &'a Transport,
}

impl ReportsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<ComplianceReport>> {
        self.transport.get(REPORTS, query).await
    }

    /// Queue a report. It starts out `pending`; poll `list` until it has
    /// a file.
    pub async fn generate(&self, request: &GenerateReport) -> Result<ComplianceReport> {
        if let (Some(start), Some(end)) = (request.period_start, request.period_end) {
            if end < start {
                return Err(
                    CoreError::invalid("period_end", "Period ends before it starts.").into(),
                );
            }
        }
        let spec = RequestSpec::post(route(REPORTS, "generate"))
            .json(request)?
            .invalidates(&[REPORTS]);
        self.transport.send(spec).await
    }

    /// Fetch the report file. Fails with `NotFound` while the report has
    /// not been generated yet.
    pub async fn download(&self, id: &ReportId) -> Result<DownloadedFile> {
        let spec = RequestSpec::get(action(REPORTS, id, "download"));
        self.transport.download(spec).await
    }
}
