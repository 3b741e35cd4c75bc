//! # compliancehub-core
//!
//! Data-transfer types and pure helpers for the ComplianceHub API.
//!
//! This crate performs no I/O. It describes what the API sends and accepts,
//! and holds the small rules the client applies before talking to it:
//! - typed identifiers and response shapes for every resource
//! - list query rendering and pagination envelopes
//! - error-message extraction from API error bodies
//! - the role permission matrix, compliance grading, upload checks
//!
//! ## Example
//!
//! ```rust
//! use compliancehub_core::{compliance_grade, upload, ListQuery, Role};
//!
//! assert_eq!(compliance_grade(87.0), "A-");
//! assert!(Role::Admin.can_grant(Role::Analyst));
//! assert!(upload::validate("policy.pdf", 1024).is_ok());
//!
//! let q = ListQuery::new().search("access").filter("verification_status", "pending");
//! assert_eq!(q.render(), "search=access&verification_status=pending");
//! ```

pub mod error;
pub mod error_message;
pub mod grading;
pub mod ids;
pub mod page;
pub mod query;
pub mod roles;
pub mod types;
pub mod upload;
pub mod validation;

// Re-export main types at crate root
pub use error::CoreError;
pub use grading::{compliance_grade, compliance_status, ComplianceStatus};
pub use ids::*;
pub use page::{Page, DEFAULT_PAGE_SIZE};
pub use query::ListQuery;
pub use roles::{Permission, Role};
pub use types::*;
