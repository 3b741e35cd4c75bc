//! Compliance results, gaps, framework adoptions and reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::decimal;
use crate::grading::ComplianceStatus;
use crate::ids::{
    AdoptionId, AppliedControlId, CompanyId, ComplianceResultId, DepartmentId, FrameworkId, GapId,
    ReportId, RequirementId, UserId,
};

/// State of a compliance calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Calculating,
    #[default]
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Full compliance calculation for one framework (and optionally one
/// department).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub id: ComplianceResultId,
    #[serde(default)]
    pub company: Option<CompanyId>,
    pub framework: FrameworkId,
    #[serde(default)]
    pub framework_code: String,
    #[serde(default)]
    pub framework_name: String,
    #[serde(default)]
    pub department: Option<DepartmentId>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub coverage_percentage: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub compliance_score: f64,
    #[serde(default)]
    pub compliance_grade: String,
    #[serde(default = "unknown_status")]
    pub compliance_status: ComplianceStatus,
    #[serde(default)]
    pub total_requirements: u32,
    #[serde(default)]
    pub requirements_addressed: u32,
    #[serde(default)]
    pub requirements_compliant: u32,
    #[serde(default)]
    pub requirements_partial: u32,
    #[serde(default)]
    pub requirements_non_compliant: u32,
    #[serde(default)]
    pub total_controls: u32,
    #[serde(default)]
    pub controls_operational: u32,
    #[serde(default)]
    pub controls_implemented: u32,
    #[serde(default)]
    pub controls_in_progress: u32,
    #[serde(default)]
    pub controls_not_started: u32,
    #[serde(default)]
    pub controls_with_evidence: u32,
    #[serde(default)]
    pub total_evidence_count: u32,
    #[serde(default)]
    pub high_risk_gaps: u32,
    #[serde(default)]
    pub medium_risk_gaps: u32,
    #[serde(default)]
    pub low_risk_gaps: u32,
    #[serde(default)]
    pub gap_count: u32,
    /// Per-requirement breakdown keyed by requirement id
    #[serde(default)]
    pub requirement_details: BTreeMap<String, RequirementOutcome>,
    #[serde(default)]
    pub control_details: Value,
    #[serde(default)]
    pub calculation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub calculated_by: Option<UserId>,
    #[serde(default)]
    pub calculated_by_email: Option<String>,
    #[serde(default)]
    pub status: CalculationStatus,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_certification_expired: Option<bool>,
}

fn unknown_status() -> ComplianceStatus {
    ComplianceStatus::Unknown
}

/// A compliance result as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResultSummary {
    pub id: ComplianceResultId,
    #[serde(default)]
    pub framework_code: String,
    #[serde(default)]
    pub framework_name: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub compliance_score: f64,
    #[serde(default)]
    pub compliance_grade: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub coverage_percentage: f64,
    #[serde(default)]
    pub gap_count: u32,
    #[serde(default)]
    pub calculation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_current: bool,
}

/// Outcome for one requirement inside a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementOutcome {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub title: String,
    /// `compliant`, `partial`, `non_compliant`, `not_implemented` or `no_controls`
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub score: f64,
    #[serde(default)]
    pub controls: Vec<Value>,
}

/// Body of `POST compliance/results/calculate/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub framework: FrameworkId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkScore {
    /// Framework code
    pub framework: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub score: f64,
    pub grade: String,
}

/// Response of `POST compliance/results/calculate_all/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateAllResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: Vec<FrameworkScore>,
}

/// One framework row of the compliance overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkOverview {
    pub framework_id: FrameworkId,
    pub framework_code: String,
    pub framework_name: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub compliance_score: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub coverage_percentage: f64,
    pub grade: String,
    pub status: ComplianceStatus,
    #[serde(default)]
    pub gap_count: u32,
}

/// Response of `compliance/results/overview/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceOverview {
    #[serde(default)]
    pub total_frameworks: u32,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub avg_compliance_score: f64,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub avg_coverage: f64,
    #[serde(default)]
    pub frameworks: Vec<FrameworkOverview>,
}

/// One point of `compliance/results/trends/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub compliance_score: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub coverage_percentage: f64,
    pub grade: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }
}

/// A requirement-level gap computed on the fly from the current result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisGap {
    pub requirement_code: String,
    #[serde(default)]
    pub requirement_title: String,
    pub status: String,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub score: f64,
    #[serde(default)]
    pub controls: Vec<Value>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Response of `compliance/results/gap_analysis/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    #[serde(default)]
    pub gaps: Vec<AnalysisGap>,
    #[serde(default)]
    pub total: u32,
    /// Absent when the framework has no current result
    #[serde(default)]
    pub by_severity: BTreeMap<String, u32>,
}

/// A prioritized action from `compliance/results/recommendations/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Severity,
    /// `implement_controls`, `add_evidence` or `review_control`
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_impact: String,
    /// Requirement code, for requirement-level actions
    #[serde(default)]
    pub requirement: Option<String>,
    /// Control code, for control-level actions
    #[serde(default)]
    pub control: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    #[default]
    MissingControl,
    IncompleteImplementation,
    InsufficientEvidence,
    ControlIneffective,
    OutdatedEvidence,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GapStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Accepted,
    #[serde(other)]
    Unknown,
}

/// A tracked compliance gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceGap {
    pub id: GapId,
    #[serde(default)]
    pub company: Option<CompanyId>,
    #[serde(default)]
    pub compliance_result: Option<ComplianceResultId>,
    pub requirement: RequirementId,
    #[serde(default)]
    pub requirement_code: String,
    #[serde(default)]
    pub requirement_title: String,
    #[serde(default)]
    pub gap_type: GapType,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub affected_controls: Vec<AppliedControlId>,
    #[serde(default)]
    pub remediation_plan: String,
    #[serde(default)]
    pub remediation_owner: Option<UserId>,
    #[serde(default)]
    pub remediation_owner_email: Option<String>,
    #[serde(default)]
    pub remediation_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: GapStatus,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<UserId>,
    #[serde(default)]
    pub resolution_notes: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One row of `compliance/gaps/by_severity/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionStatus {
    #[default]
    Planning,
    Implementing,
    Operational,
    Certified,
    Suspended,
    #[serde(other)]
    Unknown,
}

/// A company's program to comply with a framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkAdoption {
    pub id: AdoptionId,
    #[serde(default)]
    pub company: Option<CompanyId>,
    pub framework: FrameworkId,
    #[serde(default)]
    pub framework_code: String,
    #[serde(default)]
    pub framework_name: String,
    #[serde(default)]
    pub adoption_status: AdoptionStatus,
    #[serde(default)]
    pub target_completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_certified: bool,
    #[serde(default)]
    pub certification_body: String,
    #[serde(default)]
    pub certification_date: Option<NaiveDate>,
    #[serde(default)]
    pub certification_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub certificate_number: String,
    #[serde(default)]
    pub scope_description: String,
    #[serde(default)]
    pub scope_exclusions: String,
    #[serde(default)]
    pub program_owner: Option<UserId>,
    #[serde(default)]
    pub program_owner_email: Option<String>,
    #[serde(default)]
    pub last_audit_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_audit_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_certification_expired: bool,
    #[serde(default)]
    pub is_audit_overdue: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST compliance/adoptions/adopt_framework/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptFramework {
    pub framework: FrameworkId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_completion_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_owner: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AdoptFramework {
    pub fn new(framework: FrameworkId) -> Self {
        Self {
            framework,
            target_completion_date: None,
            scope_description: None,
            program_owner: None,
            notes: None,
        }
    }
}

/// Body of `POST compliance/adoptions/{id}/certify/`.
///
/// The server defaults the certification date to today.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification_date: Option<NaiveDate>,
    #[serde(default)]
    pub certification_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub certificate_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[default]
    Summary,
    Detailed,
    GapAnalysis,
    EvidenceMatrix,
    ControlMatrix,
    AuditReport,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Excel,
    Csv,
    Json,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// A generated (or pending) compliance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub id: ReportId,
    #[serde(default)]
    pub company: Option<CompanyId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub framework: Option<FrameworkId>,
    #[serde(default)]
    pub framework_code: Option<String>,
    #[serde(default)]
    pub department: Option<DepartmentId>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub report_type: ReportType,
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub report_file: Option<String>,
    #[serde(default)]
    pub report_url: Option<String>,
    #[serde(default)]
    pub report_format: ReportFormat,
    #[serde(default)]
    pub generated_by: Option<UserId>,
    #[serde(default)]
    pub generated_by_email: Option<String>,
    #[serde(default)]
    pub generation_status: GenerationStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST compliance/reports/generate/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateReport {
    pub report_type: ReportType,
    pub report_format: ReportFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<FrameworkId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_string_decimals() {
        let r: ComplianceResult = serde_json::from_value(serde_json::json!({
            "id": "cr-1",
            "framework": "f-1",
            "framework_code": "ISO27001",
            "coverage_percentage": "72.50",
            "compliance_score": "81.25",
            "compliance_grade": "B+",
            "compliance_status": "mostly_compliant",
            "requirement_details": {
                "r-1": {"code": "A.5.1", "title": "Policies", "status": "compliant", "score": 100, "controls": []}
            },
            "status": "completed",
            "is_current": true
        }))
        .unwrap();
        assert_eq!(r.compliance_score, 81.25);
        assert_eq!(r.coverage_percentage, 72.5);
        assert_eq!(r.compliance_status, ComplianceStatus::MostlyCompliant);
        assert_eq!(r.requirement_details["r-1"].score, 100.0);
    }

    #[test]
    fn test_empty_gap_analysis() {
        let g: GapAnalysis = serde_json::from_value(serde_json::json!({"gaps": [], "total": 0})).unwrap();
        assert_eq!(g.total, 0);
        assert!(g.by_severity.is_empty());
    }

    #[test]
    fn test_recommendation_type_field() {
        let rec: Recommendation = serde_json::from_value(serde_json::json!({
            "priority": "critical",
            "type": "implement_controls",
            "requirement": "A.8.2",
            "title": "Implement controls for A.8.2",
            "description": "Requirement 'Privileged access' has no controls implemented",
            "estimated_impact": "high"
        }))
        .unwrap();
        assert_eq!(rec.kind, "implement_controls");
        assert_eq!(rec.priority, Severity::Critical);
        assert_eq!(rec.control, None);
    }

    #[test]
    fn test_generate_report_body() {
        let body = GenerateReport {
            report_type: ReportType::GapAnalysis,
            report_format: ReportFormat::Csv,
            framework: Some(FrameworkId::from("f-1")),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"report_type": "gap_analysis", "report_format": "csv", "framework": "f-1"})
        );
    }
}
