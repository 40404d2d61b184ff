use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::api::PipelineApi;
use super::types::{DeletionItem, Pipeline, ResolvedProject};
use crate::error::{JanitorError, Result};

pub fn project(id: u64, path: &str, archived: bool) -> ResolvedProject {
    ResolvedProject {
        id,
        path_with_namespace: path.to_string(),
        archived,
    }
}

pub fn pipeline(id: u64, status: &str, updated_at: DateTime<Utc>) -> Pipeline {
    Pipeline {
        id,
        status: status.to_string(),
        updated_at,
    }
}

/// In-memory GitLab used by the cleanup tests.
#[derive(Default)]
pub struct FakeApi {
    projects: HashMap<String, ResolvedProject>,
    groups: HashMap<String, Vec<ResolvedProject>>,
    subgroups: HashMap<String, Vec<ResolvedProject>>,
    pipelines: HashMap<u64, Vec<Pipeline>>,
    broken_listings: HashSet<u64>,
    broken_deletes: HashSet<DeletionItem>,
    deleted: Mutex<Vec<DeletionItem>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: ResolvedProject) -> Self {
        self.projects
            .insert(project.path_with_namespace.clone(), project);
        self
    }

    pub fn with_group(mut self, group: &str, projects: Vec<ResolvedProject>) -> Self {
        self.groups.insert(group.to_string(), projects);
        self
    }

    /// Projects only visible when listing `group` with subgroups.
    pub fn with_subgroup_projects(mut self, group: &str, projects: Vec<ResolvedProject>) -> Self {
        self.subgroups.insert(group.to_string(), projects);
        self
    }

    pub fn with_pipelines(mut self, project_id: u64, pipelines: Vec<Pipeline>) -> Self {
        self.pipelines.insert(project_id, pipelines);
        self
    }

    pub fn with_broken_listing(mut self, project_id: u64) -> Self {
        self.broken_listings.insert(project_id);
        self
    }

    pub fn with_broken_delete(mut self, project_id: u64, pipeline_id: u64) -> Self {
        self.broken_deletes.insert(DeletionItem {
            project_id,
            pipeline_id,
        });
        self
    }

    /// Deletions that went through, sorted.
    pub fn deleted(&self) -> Vec<DeletionItem> {
        let mut deleted = self.deleted.lock().unwrap().clone();
        deleted.sort_by_key(|item| (item.project_id, item.pipeline_id));
        deleted
    }
}

fn server_error() -> JanitorError {
    JanitorError::Api {
        status: 500,
        message: "500 Internal Server Error".to_string(),
    }
}

#[async_trait]
impl PipelineApi for FakeApi {
    async fn get_project(&self, path: &str) -> Result<ResolvedProject> {
        self.projects
            .get(path)
            .cloned()
            .ok_or_else(|| JanitorError::NotFound(format!("Project '{path}'")))
    }

    async fn get_group_projects(
        &self,
        group: &str,
        include_subgroups: bool,
    ) -> Result<Vec<ResolvedProject>> {
        let mut projects = self
            .groups
            .get(group)
            .cloned()
            .ok_or_else(|| JanitorError::NotFound(format!("Group '{group}'")))?;

        if include_subgroups {
            projects.extend(self.subgroups.get(group).cloned().unwrap_or_default());
        }
        Ok(projects)
    }

    async fn get_project_pipelines(&self, project_id: u64) -> Result<Vec<Pipeline>> {
        if self.broken_listings.contains(&project_id) {
            return Err(server_error());
        }
        Ok(self.pipelines.get(&project_id).cloned().unwrap_or_default())
    }

    async fn delete_pipeline(&self, project_id: u64, pipeline_id: u64) -> Result<()> {
        let item = DeletionItem {
            project_id,
            pipeline_id,
        };
        tokio::task::yield_now().await;

        if self.broken_deletes.contains(&item) {
            return Err(server_error());
        }
        self.deleted.lock().unwrap().push(item);
        Ok(())
    }
}
