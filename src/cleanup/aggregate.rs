use indexmap::IndexMap;
use log::{debug, info};

use super::api::PipelineApi;
use super::policy::Policy;
use super::target::{Priority, Target};
use crate::error::Result;

/// The policy a project ended up with, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveProject {
    pub path: String,
    pub policy: Policy,
    pub source: String,
}

/// Project id to effective policy, in first-seen order.
pub type ProjectPolicies = IndexMap<u64, EffectiveProject>;

/// Resolves every target and assigns one policy per distinct project.
///
/// Targets are processed in declaration order. A low-priority (group) target
/// never overwrites an id that is already present; a high-priority (project)
/// target always does. A project named directly therefore wins over any group
/// that also reaches it, whichever is declared first.
///
/// # Errors
///
/// Fails on the first target that cannot be resolved.
pub async fn aggregate(
    api: &dyn PipelineApi,
    targets: &[(Target, Policy)],
) -> Result<ProjectPolicies> {
    let mut projects = ProjectPolicies::new();

    for (target, policy) in targets {
        let priority = target.priority();

        for project in target.resolve(api).await? {
            if priority == Priority::Low && projects.contains_key(&project.id) {
                debug!(
                    "{} already assigned, ignoring {}",
                    project.path_with_namespace,
                    target.display_name()
                );
                continue;
            }

            projects.insert(
                project.id,
                EffectiveProject {
                    path: project.path_with_namespace,
                    policy: policy.clone(),
                    source: target.display_name(),
                },
            );
        }
    }

    info!("Found {} project ids", projects.len());
    Ok(projects)
}
