//! Per-resource API modules.
//!
//! Each module wraps one backend app. Its methods map one-to-one onto
//! endpoints and declare which cached resources a mutation makes stale.

pub mod auth;
pub mod compliance;
pub mod controls;
pub mod evidence;
pub mod library;
pub mod organizations;
pub mod profile;
pub mod team;

pub use auth::AuthApi;
pub use compliance::{AdoptionsApi, ComplianceApi, GapsApi, ReportsApi};
pub use controls::{AppliedControlsApi, ControlsApi, ExceptionsApi, MappingsApi, ReferenceControlsApi};
pub use evidence::{CommentsApi, EvidenceApi, EvidenceLinksApi};
pub use library::{FrameworksApi, LibraryApi, LoadedLibrariesApi, RequirementsApi, StoredLibrariesApi};
pub use organizations::{DepartmentsApi, OrganizationsApi};
pub use profile::ProfileApi;
pub use team::TeamApi;

/// `{collection}{id}/`
pub(crate) fn detail(collection: &str, id: impl std::fmt::Display) -> String {
    format!("{}{}/", collection, id)
}

/// `{collection}{action}/`, a list-level action
pub(crate) fn route(collection: &str, action: &str) -> String {
    format!("{}{}/", collection, action)
}

/// `{collection}{id}/{action}/`
pub(crate) fn action(collection: &str, id: impl std::fmt::Display, action: &str) -> String {
    format!("{}{}/{}/", collection, id, action)
}
