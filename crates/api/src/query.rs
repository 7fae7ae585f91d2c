//! Query parameter types shared by list endpoints.

use serde::Deserialize;

/// Default page size for list endpoints.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// `?status=&limit=` on `GET /jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobListParams {
    /// Snake-case status name, e.g. `running`.
    pub status: Option<String>,
    pub limit: Option<usize>,
}

/// `?artifact_type=&job_id=&service_id=&limit=` on `GET /artifacts`.
///
/// Only one filter applies, with precedence type > job > service.
#[derive(Debug, Default, Deserialize)]
pub struct ArtifactListParams {
    pub artifact_type: Option<String>,
    pub job_id: Option<String>,
    pub service_id: Option<String>,
    pub limit: Option<usize>,
}
