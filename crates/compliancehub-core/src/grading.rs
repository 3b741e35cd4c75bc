//! Letter grades and status bands for compliance scores.
//!
//! The server attaches both to every result it returns. The client computes
//! them itself for values it derives locally, such as averages shown on the
//! dashboard.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grade thresholds, highest first. A score at or above the bound earns the
/// grade.
const GRADE_BANDS: [(f64, &str); 10] = [
    (95.0, "A+"),
    (90.0, "A"),
    (85.0, "A-"),
    (80.0, "B+"),
    (75.0, "B"),
    (70.0, "B-"),
    (65.0, "C+"),
    (60.0, "C"),
    (55.0, "C-"),
    (50.0, "D"),
];

/// Letter grade for a 0-100 compliance score.
pub fn compliance_grade(score: f64) -> &'static str {
    GRADE_BANDS
        .iter()
        .find(|(bound, _)| score >= *bound)
        .map(|(_, grade)| *grade)
        .unwrap_or("F")
}

/// Overall compliance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    MostlyCompliant,
    PartiallyCompliant,
    NonCompliant,
    #[serde(other)]
    Unknown,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::MostlyCompliant => "mostly_compliant",
            ComplianceStatus::PartiallyCompliant => "partially_compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
            ComplianceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status band for a 0-100 compliance score.
pub fn compliance_status(score: f64) -> ComplianceStatus {
    if score >= 90.0 {
        ComplianceStatus::Compliant
    } else if score >= 75.0 {
        ComplianceStatus::MostlyCompliant
    } else if score >= 50.0 {
        ComplianceStatus::PartiallyCompliant
    } else {
        ComplianceStatus::NonCompliant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(compliance_grade(100.0), "A+");
        assert_eq!(compliance_grade(95.0), "A+");
        assert_eq!(compliance_grade(94.99), "A");
        assert_eq!(compliance_grade(85.0), "A-");
        assert_eq!(compliance_grade(79.9), "B");
        assert_eq!(compliance_grade(70.0), "B-");
        assert_eq!(compliance_grade(60.0), "C");
        assert_eq!(compliance_grade(55.0), "C-");
        assert_eq!(compliance_grade(50.0), "D");
        assert_eq!(compliance_grade(49.99), "F");
        assert_eq!(compliance_grade(0.0), "F");
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(compliance_status(90.0), ComplianceStatus::Compliant);
        assert_eq!(compliance_status(89.9), ComplianceStatus::MostlyCompliant);
        assert_eq!(compliance_status(75.0), ComplianceStatus::MostlyCompliant);
        assert_eq!(compliance_status(50.0), ComplianceStatus::PartiallyCompliant);
        assert_eq!(compliance_status(12.5), ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_nan_scores_fail() {
        assert_eq!(compliance_grade(f64::NAN), "F");
        assert_eq!(compliance_status(f64::NAN), ComplianceStatus::NonCompliant);
    }
}
