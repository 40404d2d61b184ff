mod aggregate;
mod api;
mod executor;
mod filter;
mod policy;
mod target;
#[cfg(test)]
mod testing;
mod types;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::Result;
use crate::output::PhaseProgress;

pub use aggregate::{aggregate, ProjectPolicies};
pub use api::PipelineApi;
pub use executor::{default_workers, delete_all, fan_out, TaskFailure};
pub use filter::select_for_deletion;
pub use policy::{Policy, RetentionOptions};
pub use target::{ArchiveInclusion, Target};
pub use types::{DeletionItem, Pipeline, ResolvedProject};

/// Outcome of one cleanup run, handed to the reporting layer.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Distinct projects covered by the targets
    pub projects: usize,
    /// Pipelines selected for deletion
    pub found: usize,
    pub deleted: usize,
    /// Listings and deletions that failed, in no particular order
    pub failures: Vec<TaskFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies retention policies to every project reachable from a set of targets.
///
/// A run has three phases, each finishing before the next starts:
/// 1. Resolve targets into projects (any error aborts the run)
/// 2. List every project's pipelines and select the ones to delete
/// 3. Delete the selected pipelines
///
/// Phases 2 and 3 share a bounded worker pool and collect per-item failures
/// into the [`RunReport`] instead of aborting.
pub struct Janitor<'a> {
    api: &'a dyn PipelineApi,
    workers: usize,
}

impl<'a> Janitor<'a> {
    pub fn new(api: &'a dyn PipelineApi, workers: usize) -> Self {
        Self {
            api,
            workers: workers.max(1),
        }
    }

    /// Runs the cleanup.
    ///
    /// Each target's overrides are filled from `defaults` before resolution.
    /// Pipelines are aged relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if any target cannot be resolved. Failures while listing
    /// or deleting pipelines are reported in [`RunReport::failures`].
    pub async fn run(
        &self,
        defaults: &Policy,
        targets: &[(Target, Option<RetentionOptions>)],
        now: DateTime<Utc>,
    ) -> Result<RunReport> {
        let targets: Vec<(Target, Policy)> = targets
            .iter()
            .map(|(target, options)| {
                let policy = options
                    .as_ref()
                    .map_or_else(|| defaults.clone(), |options| options.resolve(defaults));
                (target.clone(), policy)
            })
            .collect();

        let progress = PhaseProgress::start_phase_1(targets.len());
        let projects = aggregate(self.api, &targets).await?;

        let progress = progress.finish_phase_1_start_phase_2(projects.len());
        let (candidates, mut failures) = self.find_old_pipelines(&projects, now).await;
        info!("Found {} old pipelines", candidates.len());

        let progress = progress.finish_phase_2_start_phase_3(candidates.len());
        let delete_failures = delete_all(self.api, &candidates, self.workers).await;
        let deleted = candidates.len() - delete_failures.len();
        progress.finish_phase_3(deleted, delete_failures.len());

        failures.extend(delete_failures);
        Ok(RunReport {
            projects: projects.len(),
            found: candidates.len(),
            deleted,
            failures,
        })
    }

    /// Lists pipelines for every project and applies its policy.
    async fn find_old_pipelines(
        &self,
        projects: &ProjectPolicies,
        now: DateTime<Utc>,
    ) -> (Vec<DeletionItem>, Vec<TaskFailure>) {
        let api = self.api;

        let results = fan_out(projects.iter(), self.workers, |(&project_id, project)| async move {
            let pipelines = api.get_project_pipelines(project_id).await.map_err(|error| {
                warn!("Failed to list pipelines of {}: {error}", project.path);
                TaskFailure {
                    project_id,
                    pipeline_id: None,
                    error,
                }
            })?;

            let selected = select_for_deletion(&pipelines, &project.policy, now);
            info!(
                "{} ({}): {} of {} pipelines selected",
                project.path,
                project.source,
                selected.len(),
                pipelines.len()
            );

            Ok::<_, TaskFailure>(
                selected
                    .into_iter()
                    .map(|pipeline| DeletionItem {
                        project_id,
                        pipeline_id: pipeline.id,
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .await;

        let mut candidates = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(items) => candidates.extend(items),
                Err(failure) => failures.push(failure),
            }
        }
        (candidates, failures)
    }
}
