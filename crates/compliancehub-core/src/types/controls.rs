//! Reference controls, applied controls, mappings and exceptions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::decimal;
pub use super::library::Priority;
use crate::ids::{
    AppliedControlId, CompanyId, ControlExceptionId, DepartmentId, FrameworkId, MappingId,
    ReferenceControlId, RequirementId, UserId,
};

/// Control family (ISO 27001 Annex A style grouping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControlFamily {
    AccessControl,
    AssetManagement,
    Cryptography,
    PhysicalSecurity,
    OperationsSecurity,
    CommunicationsSecurity,
    SystemAcquisition,
    SupplierRelationships,
    IncidentManagement,
    BusinessContinuity,
    Compliance,
    RiskManagement,
    HumanResources,
    #[default]
    InformationSecurity,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    #[default]
    Preventive,
    Detective,
    Corrective,
    Deterrent,
    Compensating,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutomationLevel {
    #[default]
    Manual,
    SemiAutomated,
    Automated,
    #[serde(other)]
    Unknown,
}

/// How often a control is performed or reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Continuous,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    #[default]
    Annually,
    AdHoc,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

/// Implementation state of an applied control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    #[default]
    NotStarted,
    InProgress,
    Implemented,
    Testing,
    Operational,
    NeedsImprovement,
    NonCompliant,
    #[serde(other)]
    Unknown,
}

impl ControlStatus {
    /// Implemented, under test, or operational.
    pub fn is_implemented(&self) -> bool {
        matches!(
            self,
            ControlStatus::Implemented | ControlStatus::Testing | ControlStatus::Operational
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlStatus::NotStarted => "not_started",
            ControlStatus::InProgress => "in_progress",
            ControlStatus::Implemented => "implemented",
            ControlStatus::Testing => "testing",
            ControlStatus::Operational => "operational",
            ControlStatus::NeedsImprovement => "needs_improvement",
            ControlStatus::NonCompliant => "non_compliant",
            ControlStatus::Unknown => "unknown",
        }
    }
}

/// A catalogue control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceControl {
    pub id: ReferenceControlId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub control_family: ControlFamily,
    #[serde(default)]
    pub control_type: ControlType,
    #[serde(default)]
    pub implementation_guidance: String,
    #[serde(default)]
    pub testing_procedures: String,
    #[serde(default)]
    pub automation_level: AutomationLevel,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub maturity_level: Option<u8>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub implementation_complexity: Complexity,
    #[serde(default)]
    pub estimated_effort_hours: Option<u32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mapped_requirements_count: u32,
    #[serde(default)]
    pub applied_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A company's instance of a reference control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedControl {
    pub id: AppliedControlId,
    #[serde(default)]
    pub company: Option<CompanyId>,
    pub reference_control: ReferenceControlId,
    #[serde(default)]
    pub reference_control_code: String,
    #[serde(default)]
    pub reference_control_name: String,
    #[serde(default)]
    pub department: Option<DepartmentId>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub status: ControlStatus,
    #[serde(default)]
    pub control_owner: Option<UserId>,
    #[serde(default)]
    pub control_owner_email: Option<String>,
    #[serde(default)]
    pub implementation_notes: String,
    #[serde(default)]
    pub custom_procedures: String,
    #[serde(default)]
    pub custom_frequency: String,
    /// 1-5 rating from the last test
    #[serde(default)]
    pub effectiveness_rating: Option<u8>,
    #[serde(default)]
    pub last_tested_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_tested_by: Option<UserId>,
    #[serde(default)]
    pub test_results: String,
    #[serde(default)]
    pub next_review_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_review_date: Option<NaiveDate>,
    #[serde(default)]
    pub reviewed_by: Option<UserId>,
    #[serde(default)]
    pub has_deficiencies: bool,
    #[serde(default)]
    pub deficiency_notes: String,
    #[serde(default)]
    pub remediation_plan: String,
    #[serde(default)]
    pub remediation_due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "decimal::option::deserialize")]
    pub implementation_cost: Option<f64>,
    #[serde(default, deserialize_with = "decimal::option::deserialize")]
    pub annual_maintenance_cost: Option<f64>,
    #[serde(default)]
    pub evidence_count: u32,
    #[serde(default, deserialize_with = "decimal::option::deserialize")]
    pub compliance_score: Option<f64>,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An applied control as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedControlSummary {
    pub id: AppliedControlId,
    #[serde(default)]
    pub reference_control_code: String,
    #[serde(default)]
    pub reference_control_name: String,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub status: ControlStatus,
    #[serde(default)]
    pub effectiveness_rating: Option<u8>,
    #[serde(default)]
    pub has_deficiencies: bool,
    #[serde(default)]
    pub next_review_date: Option<NaiveDate>,
}

/// Editable fields of an applied control. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedControlUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ControlStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_owner: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effectiveness_rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_deficiencies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deficiency_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation_due_date: Option<NaiveDate>,
}

/// Body of `POST controls/applied-controls/apply_control/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyControlRequest {
    pub reference_control: ReferenceControlId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_owner: Option<UserId>,
}

impl ApplyControlRequest {
    pub fn new(reference_control: ReferenceControlId) -> Self {
        Self {
            reference_control,
            department: None,
            control_owner: None,
        }
    }
}

/// Body of `POST controls/applied-controls/apply_framework_controls/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyFrameworkControlsRequest {
    pub framework: FrameworkId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentId>,
}

/// Response of `apply_framework_controls`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCount {
    #[serde(default)]
    pub message: String,
    pub applied_count: u32,
}

/// Coverage of one requirement by the company's applied controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub total_controls: u32,
    pub implemented_controls: u32,
    #[serde(default)]
    pub operational_controls: u32,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub coverage_percentage: f64,
    /// `fully_compliant`, `partially_compliant`, `not_compliant` or `no_controls`
    pub status: String,
}

/// One entry of `controls/applied-controls/{id}/coverage/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementCoverage {
    /// Requirement code
    pub requirement: String,
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: ControlStatus,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyCount {
    #[serde(rename = "reference_control__control_family")]
    pub control_family: ControlFamily,
    pub count: u32,
}

/// Company-wide control metrics.
///
/// Known fields are typed; anything else the server adds lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlDashboard {
    #[serde(default)]
    pub total_controls: u32,
    #[serde(default)]
    pub status_breakdown: Vec<StatusCount>,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub avg_compliance_score: f64,
    #[serde(default)]
    pub family_breakdown: Vec<FamilyCount>,
    #[serde(default)]
    pub overdue_reviews: u32,
    #[serde(default)]
    pub controls_with_deficiencies: u32,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Response of `controls/applied-controls/effectiveness_metrics/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessMetrics {
    #[serde(default, deserialize_with = "decimal::option::deserialize")]
    pub avg_effectiveness: Option<f64>,
    #[serde(default)]
    pub tested_controls: u32,
    #[serde(default)]
    pub untested_controls: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoverageLevel {
    Full,
    #[default]
    Partial,
    Supporting,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    #[default]
    Pending,
    Validated,
    Rejected,
    #[serde(other)]
    Unknown,
}

/// A requirement-to-control mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementMapping {
    pub id: MappingId,
    pub requirement: RequirementId,
    #[serde(default)]
    pub requirement_code: String,
    #[serde(default)]
    pub requirement_title: String,
    pub reference_control: ReferenceControlId,
    #[serde(default)]
    pub control_code: String,
    #[serde(default)]
    pub control_name: String,
    #[serde(default)]
    pub mapping_rationale: String,
    #[serde(default)]
    pub coverage_level: CoverageLevel,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub validated_by: Option<UserId>,
    #[serde(default)]
    pub validated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionType {
    Technical,
    Business,
    Cost,
    Resource,
    #[default]
    Temporary,
    Compensating,
    #[serde(other)]
    Unknown,
}

/// An accepted deviation from an applied control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlException {
    pub id: ControlExceptionId,
    #[serde(default)]
    pub company: Option<CompanyId>,
    pub applied_control: AppliedControlId,
    #[serde(default)]
    pub applied_control_code: String,
    #[serde(default)]
    pub exception_type: ExceptionType,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub compensating_controls: String,
    #[serde(default)]
    pub risk_acceptance: String,
    #[serde(default)]
    pub accepted_by: Option<UserId>,
    #[serde(default)]
    pub accepted_by_email: Option<String>,
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_expired: bool,
}

/// Body of `POST controls/exceptions/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewControlException {
    pub applied_control: AppliedControlId,
    pub exception_type: ExceptionType,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compensating_controls: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_acceptance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
}
