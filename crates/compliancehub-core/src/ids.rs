//! Typed identifiers for API resources.
//!
//! The API hands out UUIDs for every resource. The client never inspects
//! them, so each identifier is an opaque string newtype. Separate types keep
//! an `EvidenceId` from being passed where an `AppliedControlId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! resource_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Wrap a raw identifier.
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                /// Borrow the raw identifier.
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(id: &str) -> Self {
                    Self(id.to_string())
                }
            }

            impl From<String> for $name {
                fn from(id: String) -> Self {
                    Self(id)
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }
        )+
    };
}

resource_id! {
    /// A user account.
    UserId,
    /// A company (tenant).
    CompanyId,
    /// A user's membership in a company.
    MembershipId,
    /// A pending or accepted invitation.
    InvitationId,
    /// A department inside a company.
    DepartmentId,
    /// A stored (raw) library.
    StoredLibraryId,
    /// A loaded library version.
    LoadedLibraryId,
    /// A compliance framework.
    FrameworkId,
    /// A framework requirement.
    RequirementId,
    /// A catalogue control.
    ReferenceControlId,
    /// A company's instance of a reference control.
    AppliedControlId,
    /// A requirement-to-control mapping.
    MappingId,
    /// An exception granted on an applied control.
    ControlExceptionId,
    /// An evidence record.
    EvidenceId,
    /// A link between evidence and an applied control.
    EvidenceLinkId,
    /// A comment on evidence.
    CommentId,
    /// A compliance calculation result.
    ComplianceResultId,
    /// A compliance gap.
    GapId,
    /// A framework adoption program.
    AdoptionId,
    /// A generated compliance report.
    ReportId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_transparent_on_the_wire() {
        let id = EvidenceId::new("5f0c6a1e-1111-4c3b-9d4e-000000000001");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5f0c6a1e-1111-4c3b-9d4e-000000000001\"");

        let back: EvidenceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_display() {
        let id = CompanyId::from("acme");
        assert_eq!(id.to_string(), "acme");
        assert_eq!(id.as_str(), "acme");
    }
}
