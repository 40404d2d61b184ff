use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A concrete GitLab project a target resolved to.
///
/// Identity is `id`; the path is kept for reporting and exclusion matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedProject {
    pub id: u64,
    pub path_with_namespace: String,
    /// Missing on some older GitLab responses, treated as not archived
    #[serde(default)]
    pub archived: bool,
}

/// A single pipeline record as listed by the project pipelines endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    /// Pipeline status (e.g., "success", "failed", "running")
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// A pipeline queued for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeletionItem {
    pub project_id: u64,
    pub pipeline_id: u64,
}
