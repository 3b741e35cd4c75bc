//! Framework libraries, frameworks and requirements.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{FrameworkId, LoadedLibraryId, RequirementId, StoredLibraryId};

/// Domain of a stored library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LibraryType {
    Security,
    Quality,
    Financial,
    Healthcare,
    Industry,
    #[default]
    Other,
    #[serde(other)]
    Unknown,
}

/// Format of a library's raw content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    #[default]
    Json,
    Xml,
    Yaml,
    Text,
    #[serde(other)]
    Unknown,
}

/// Import state of a loaded library version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Regulatory area of a framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkCategory {
    #[default]
    Security,
    Privacy,
    Quality,
    Financial,
    Healthcare,
    Industry,
    #[serde(other)]
    Unknown,
}

/// Kind of node in a requirement hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    #[default]
    Control,
    Section,
    Policy,
    Procedure,
    Objective,
    #[serde(other)]
    Unknown,
}

/// Priority shared by requirements and reference controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

/// Active version summary embedded in a stored library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveVersion {
    pub id: LoadedLibraryId,
    pub version: String,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
}

/// A raw framework library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLibrary {
    pub id: StoredLibraryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content_format: ContentFormat,
    #[serde(default)]
    pub library_type: LibraryType,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_organization: String,
    #[serde(default)]
    pub active_version: Option<ActiveVersion>,
    #[serde(default)]
    pub total_versions: u32,
    /// Only present on the detail endpoint
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A parsed version of a stored library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedLibrary {
    pub id: LoadedLibraryId,
    pub stored_library: StoredLibraryId,
    #[serde(default)]
    pub stored_library_name: String,
    pub version: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub deprecation_date: Option<NaiveDate>,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub processing_notes: String,
    #[serde(default)]
    pub changelog: String,
    #[serde(default)]
    pub framework_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST library/stored-libraries/{id}/load_version/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadVersionRequest {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
}

/// A compliance framework (ISO 27001, TISAX, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Framework {
    pub id: FrameworkId,
    #[serde(default)]
    pub loaded_library: Option<LoadedLibraryId>,
    #[serde(default)]
    pub loaded_library_version: Option<String>,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub official_name: String,
    #[serde(default)]
    pub issuing_organization: String,
    #[serde(default)]
    pub category: FrameworkCategory,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub applicability: String,
    #[serde(default)]
    pub official_url: String,
    #[serde(default)]
    pub documentation_url: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub requirement_count: u32,
    /// Only present on the detail endpoint
    #[serde(default)]
    pub requirements_tree: Vec<RequirementNode>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A requirement as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub code: String,
    #[serde(default)]
    pub full_code: String,
    pub title: String,
    #[serde(default)]
    pub requirement_type: RequirementType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub parent: Option<RequirementId>,
    #[serde(default)]
    pub parent_code: Option<String>,
}

/// A requirement with its full text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementDetail {
    pub id: RequirementId,
    pub framework: FrameworkId,
    #[serde(default)]
    pub parent: Option<RequirementId>,
    #[serde(default)]
    pub parent_code: Option<String>,
    pub code: String,
    #[serde(default)]
    pub full_code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub implementation_guidance: String,
    #[serde(default)]
    pub requirement_type: RequirementType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub children_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A node of a requirement tree.
///
/// The `requirements_tree` endpoint only sends id, code, title and children;
/// the `?tree=true` variant adds type, priority and the mandatory flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementNode {
    pub id: RequirementId,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub requirement_type: Option<RequirementType>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub is_mandatory: Option<bool>,
    #[serde(default)]
    pub children: Vec<RequirementNode>,
}

impl RequirementNode {
    /// Depth-first walk yielding `(depth, node)`.
    pub fn walk(&self) -> Vec<(usize, &RequirementNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_list_item() {
        let fw: Framework = serde_json::from_value(serde_json::json!({
            "id": "f-1",
            "loaded_library": "l-1",
            "loaded_library_version": "2022",
            "name": "ISO/IEC 27001",
            "code": "ISO27001",
            "category": "security",
            "is_published": true,
            "requirement_count": 93
        }))
        .unwrap();
        assert_eq!(fw.category, FrameworkCategory::Security);
        assert!(fw.requirements_tree.is_empty());
    }

    #[test]
    fn test_requirement_tree_walk_order() {
        let node: RequirementNode = serde_json::from_value(serde_json::json!({
            "id": "r-1", "code": "A.5", "title": "Organizational controls",
            "children": [
                {"id": "r-2", "code": "A.5.1", "title": "Policies", "children": [
                    {"id": "r-3", "code": "A.5.1.1", "title": "Review", "children": []}
                ]},
                {"id": "r-4", "code": "A.5.2", "title": "Roles", "children": []}
            ]
        }))
        .unwrap();

        let codes: Vec<(usize, &str)> = node
            .walk()
            .into_iter()
            .map(|(d, n)| (d, n.code.as_str()))
            .collect();
        assert_eq!(
            codes,
            vec![(0, "A.5"), (1, "A.5.1"), (2, "A.5.1.1"), (1, "A.5.2")]
        );
    }

    #[test]
    fn test_priority_orders_critical_first() {
        assert!(Priority::Critical < Priority::Low);
    }
}
