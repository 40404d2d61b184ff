use super::core::GitLabClient;
use crate::cleanup::ResolvedProject;
use crate::error::{JanitorError, Result};

impl GitLabClient {
    /// Fetches a single project by its full path (e.g., "group/project").
    pub async fn fetch_project(&self, path: &str) -> Result<ResolvedProject> {
        let url = self.endpoint(&format!("projects/{}", urlencoding::encode(path)))?;

        self.get_json(url, &[])
            .await
            .map_err(|e| not_found_as(e, || format!("Project '{path}'")))
    }

    /// Lists every project of a group, optionally descending into subgroups.
    pub async fn fetch_group_projects(
        &self,
        group: &str,
        include_subgroups: bool,
    ) -> Result<Vec<ResolvedProject>> {
        let url = self.endpoint(&format!("groups/{}/projects", urlencoding::encode(group)))?;

        self.paginated(url, &[("include_subgroups", include_subgroups.to_string())])
            .await
            .map_err(|e| not_found_as(e, || format!("Group '{group}'")))
    }
}

fn not_found_as(error: JanitorError, what: impl FnOnce() -> String) -> JanitorError {
    match error {
        JanitorError::Api { status: 404, .. } => JanitorError::NotFound(what()),
        other => other,
    }
}
