use chrono::{DateTime, Utc};

use super::policy::Policy;
use super::types::Pipeline;

/// Picks the pipelines `policy` allows deleting.
///
/// `pipelines` must be ordered newest first, as GitLab lists them. The first
/// `keep_last` entries are always kept. Of the rest, a pipeline is selected when
/// it was last updated at least `max_age` before `now` (the boundary is
/// inclusive) and its status is not skipped.
pub fn select_for_deletion(
    pipelines: &[Pipeline],
    policy: &Policy,
    now: DateTime<Utc>,
) -> Vec<Pipeline> {
    pipelines
        .iter()
        .skip(policy.keep_last)
        .filter(|pipeline| policy.ignores_age() || now - pipeline.updated_at >= policy.max_age)
        .filter(|pipeline| !policy.skips(&pipeline.status))
        .cloned()
        .collect()
}
