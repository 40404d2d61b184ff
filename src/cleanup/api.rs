use async_trait::async_trait;

use super::types::{Pipeline, ResolvedProject};
use crate::error::Result;

/// Read and delete operations the cleanup needs from the source-control host.
///
/// Listing methods return every page; pipelines come back newest first.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Looks up a project by its full path, failing with `NotFound` if it does not exist.
    async fn get_project(&self, path: &str) -> Result<ResolvedProject>;

    /// Lists the projects of a group, including subgroups when `include_subgroups` is set.
    async fn get_group_projects(
        &self,
        group: &str,
        include_subgroups: bool,
    ) -> Result<Vec<ResolvedProject>>;

    async fn get_project_pipelines(&self, project_id: u64) -> Result<Vec<Pipeline>>;

    async fn delete_pipeline(&self, project_id: u64, pipeline_id: u64) -> Result<()>;
}
