use std::collections::{BTreeSet, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::api::PipelineApi;
use super::types::ResolvedProject;
use crate::error::Result;

/// Which projects of a group to keep based on their archived flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveInclusion {
    /// Only archived projects
    Only,
    /// Archived and active projects
    #[default]
    Include,
    /// Only active projects
    Exclude,
}

impl ArchiveInclusion {
    pub fn admits(self, archived: bool) -> bool {
        match self {
            Self::Only => archived,
            Self::Include => true,
            Self::Exclude => !archived,
        }
    }
}

/// Precedence class used when a project is reachable from several targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    High,
}

/// A declared cleanup scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Project {
        name: String,
    },
    Group {
        name: String,
        recursive: bool,
        exclude: BTreeSet<String>,
        archived: ArchiveInclusion,
    },
}

impl Target {
    /// A project named directly beats one reached through a group.
    pub fn priority(&self) -> Priority {
        match self {
            Self::Project { .. } => Priority::High,
            Self::Group { .. } => Priority::Low,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Project { name } => format!("Project {name}"),
            Self::Group {
                name, recursive, ..
            } if *recursive => format!("Group {name} (recursive)"),
            Self::Group { name, .. } => format!("Group {name}"),
        }
    }

    /// Expands the target into the concrete projects it covers.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the named project or group does not exist, or any
    /// API error raised while listing.
    pub async fn resolve(&self, api: &dyn PipelineApi) -> Result<Vec<ResolvedProject>> {
        match self {
            Self::Project { name } => {
                let project = api.get_project(name).await?;
                debug!("Project {name} resolved to id {}", project.id);
                Ok(vec![project])
            }
            Self::Group {
                name,
                recursive,
                exclude,
                archived,
            } => {
                let listed = api.get_group_projects(name, *recursive).await?;
                let total = listed.len();

                let mut seen = HashSet::new();
                let projects: Vec<_> = listed
                    .into_iter()
                    .filter(|project| archived.admits(project.archived))
                    .filter(|project| !exclude.contains(&project.path_with_namespace))
                    .filter(|project| seen.insert(project.id))
                    .collect();

                info!(
                    "Group {name}: {} of {total} projects selected",
                    projects.len()
                );
                Ok(projects)
            }
        }
    }
}
