//! Framework library: stored libraries, their loaded versions, frameworks
//! and requirements. Read-only for non-staff users.

use compliancehub_core::validation;
use compliancehub_core::{
    Framework, FrameworkId, ListQuery, LoadVersionRequest, LoadedLibrary, LoadedLibraryId,
    MessageResponse, Page, Requirement, RequirementDetail, RequirementId, RequirementNode,
    StoredLibrary, StoredLibraryId,
};

use super::{action, detail};
use crate::error::Result;
use crate::transport::{RequestSpec, Transport};

const PREFIX: &str = "library/";
const STORED: &str = "library/stored-libraries/";
const LOADED: &str = "library/loaded-libraries/";
const FRAMEWORKS: &str = "library/frameworks/";
const ACTIVE_FRAMEWORKS: &str = "library/frameworks/active/";
const REQUIREMENTS: &str = "library/requirements/";
const ROOT_REQUIREMENTS: &str = "library/requirements/roots/";

pub struct LibraryApi<'a> {
    transport: &'a Transport,
}

impl<'a> LibraryApi<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub fn stored(&self) -> StoredLibrariesApi<'a> {
        StoredLibrariesApi {
            transport: self.transport,
        }
    }

    pub fn loaded(&self) -> LoadedLibrariesApi<'a> {
        LoadedLibrariesApi {
            transport: self.transport,
        }
    }

    pub fn frameworks(&self) -> FrameworksApi<'a> {
        FrameworksApi {
            transport: self.transport,
        }
    }

    pub fn requirements(&self) -> RequirementsApi<'a> {
        RequirementsApi {
            transport: self.transport,
        }
    }
}

pub struct StoredLibrariesApi<'a> {
    transport: &'a Transport,
}

impl StoredLibrariesApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<StoredLibrary>> {
        self.transport.get(STORED, query).await
    }

    pub async fn get(&self, id: &StoredLibraryId) -> Result<StoredLibrary> {
        self.transport.get(&detail(STORED, id), &ListQuery::new()).await
    }

    /// Every loaded version of the library.
    pub async fn versions(&self, id: &StoredLibraryId) -> Result<Vec<LoadedLibrary>> {
        self.transport
            .get(&action(STORED, id, "versions"), &ListQuery::new())
            .await
    }

    /// Register a new version for processing. Staff only.
    pub async fn load_version(
        &self,
        id: &StoredLibraryId,
        request: &LoadVersionRequest,
    ) -> Result<LoadedLibrary> {
        validation::require_non_blank("version", &request.version)?;
        let spec = RequestSpec::post(action(STORED, id, "load_version"))
            .json(request)?
            .invalidates(&[PREFIX]);
        self.transport.send(spec).await
    }
}

pub struct LoadedLibrariesApi<'a> {
    transport: &'a Transport,
}

impl LoadedLibrariesApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Page<LoadedLibrary>> {
        self.transport.get(LOADED, query).await
    }

    /// Make this version the active one of its library. Staff only.
    pub async fn activate(&self, id: &LoadedLibraryId) -> Result<MessageResponse> {
        let spec = RequestSpec::post(action(LOADED, id, "activate")).invalidates(&[PREFIX]);
        self.transport.send(spec).await
    }

    pub async fn frameworks(&self, id: &LoadedLibraryId) -> Result<Vec<Framework>> {
        self.transport
            .get(&action(LOADED, id, "frameworks"), &ListQuery::new())
            .await
    }
}

pub struct FrameworksApi<'a> {
    transport: &'a Transport,
}

impl FrameworksApi<'_> {
    /// Published frameworks of active library versions.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Framework>> {
        self.transport.get(FRAMEWORKS, query).await
    }

    /// Framework detail, including its requirement tree.
    pub async fn get(&self, id: &FrameworkId) -> Result<Framework> {
        self.transport.get(&detail(FRAMEWORKS, id), &ListQuery::new()).await
    }

    pub async fn requirements(&self, id: &FrameworkId) -> Result<Vec<Requirement>> {
        self.transport
            .get(&action(FRAMEWORKS, id, "requirements"), &ListQuery::new())
            .await
    }

    /// Root requirements with children nested.
    pub async fn requirements_tree(&self, id: &FrameworkId) -> Result<Vec<RequirementNode>> {
        self.transport
            .get(&action(FRAMEWORKS, id, "requirements_tree"), &ListQuery::new())
            .await
    }

    /// Every framework of an active library version, unpaginated.
    pub async fn active(&self) -> Result<Vec<Framework>> {
        self.transport.get(ACTIVE_FRAMEWORKS, &ListQuery::new()).await
    }
}

pub struct RequirementsApi<'a> {
    transport: &'a Transport,
}

impl RequirementsApi<'_> {
    /// Filter with `framework`, `parent`, `requirement_type`, `priority` or
    /// `is_mandatory`.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Requirement>> {
        self.transport.get(REQUIREMENTS, query).await
    }

    pub async fn get(&self, id: &RequirementId) -> Result<RequirementDetail> {
        self.transport.get(&detail(REQUIREMENTS, id), &ListQuery::new()).await
    }

    pub async fn children(&self, id: &RequirementId) -> Result<Vec<Requirement>> {
        self.transport
            .get(&action(REQUIREMENTS, id, "children"), &ListQuery::new())
            .await
    }

    pub async fn ancestors(&self, id: &RequirementId) -> Result<Vec<Requirement>> {
        self.transport
            .get(&action(REQUIREMENTS, id, "ancestors"), &ListQuery::new())
            .await
    }

    pub async fn descendants(&self, id: &RequirementId) -> Result<Vec<Requirement>> {
        self.transport
            .get(&action(REQUIREMENTS, id, "descendants"), &ListQuery::new())
            .await
    }

    /// Top-level requirements of a framework.
    pub async fn roots(&self, framework: &FrameworkId) -> Result<Vec<Requirement>> {
        let query = ListQuery::new().filter("framework", framework);
        self.transport.get(ROOT_REQUIREMENTS, &query).await
    }
}
