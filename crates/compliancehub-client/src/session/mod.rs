//! Client-side session state and where it is kept.

mod credentials;
mod store;

pub use credentials::{CredentialSource, SessionTokens};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

use compliancehub_core::{CompanyAccess, CompanyId, Role, TokenPair};

/// Who is logged in, with which tokens, acting for which company.
#[derive(Debug, Clone)]
pub struct Session {
    pub tokens: SessionTokens,
    pub user_email: Option<String>,
    /// Company sent in `X-Company-ID`
    pub company_id: Option<CompanyId>,
    /// Companies the user belonged to at login
    pub companies: Vec<CompanyAccess>,
}

impl Session {
    pub fn new(tokens: SessionTokens) -> Self {
        Self {
            tokens,
            user_email: None,
            company_id: None,
            companies: Vec::new(),
        }
    }

    /// Session from a login response. A single-company user gets that
    /// company selected.
    pub fn from_login(email: impl Into<String>, pair: &TokenPair) -> Self {
        Self {
            tokens: SessionTokens::from_login(pair),
            user_email: Some(email.into()),
            company_id: pair.company_id.clone(),
            companies: pair.companies.clone(),
        }
    }

    /// The user's role in `company`, when the login response listed it.
    pub fn role_in(&self, company: &CompanyId) -> Option<Role> {
        self.companies
            .iter()
            .find(|c| &c.id == company)
            .map(|c| c.role)
    }

    /// The user's role in the selected company.
    pub fn current_role(&self) -> Option<Role> {
        self.company_id.as_ref().and_then(|id| self.role_in(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(companies: Vec<CompanyAccess>, company_id: Option<&str>) -> TokenPair {
        TokenPair {
            access: "a".into(),
            refresh: "r".into(),
            companies,
            company_id: company_id.map(CompanyId::new),
        }
    }

    #[test]
    fn test_single_company_is_selected() {
        let session = Session::from_login(
            "ada@acme.io",
            &pair(
                vec![CompanyAccess {
                    id: CompanyId::new("c1"),
                    name: "Acme".into(),
                    role: Role::Admin,
                }],
                Some("c1"),
            ),
        );
        assert_eq!(session.company_id, Some(CompanyId::new("c1")));
        assert_eq!(session.current_role(), Some(Role::Admin));
        assert_eq!(session.tokens.source(), CredentialSource::Login);
    }

    #[test]
    fn test_role_unknown_without_selection() {
        let session = Session::from_login(
            "ada@acme.io",
            &pair(
                vec![
                    CompanyAccess {
                        id: CompanyId::new("c1"),
                        name: "Acme".into(),
                        role: Role::Owner,
                    },
                    CompanyAccess {
                        id: CompanyId::new("c2"),
                        name: "Globex".into(),
                        role: Role::Viewer,
                    },
                ],
                None,
            ),
        );
        assert_eq!(session.current_role(), None);
        assert_eq!(session.role_in(&CompanyId::new("c2")), Some(Role::Viewer));
    }
}
