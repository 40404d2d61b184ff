use super::core::GitLabClient;
use crate::cleanup::Pipeline;
use crate::error::Result;

impl GitLabClient {
    /// Lists all pipelines of a project, newest first.
    pub async fn fetch_pipelines(&self, project_id: u64) -> Result<Vec<Pipeline>> {
        let url = self.endpoint(&format!("projects/{project_id}/pipelines"))?;
        self.paginated(url, &[]).await
    }

    pub async fn delete_project_pipeline(&self, project_id: u64, pipeline_id: u64) -> Result<()> {
        let url = self.endpoint(&format!("projects/{project_id}/pipelines/{pipeline_id}"))?;
        self.delete(url).await
    }
}
