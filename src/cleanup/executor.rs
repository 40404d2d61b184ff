use std::future::Future;
use std::num::NonZeroUsize;

use futures::stream::{self, StreamExt};
use log::{debug, warn};

use super::api::PipelineApi;
use super::types::DeletionItem;
use crate::error::JanitorError;

/// Pool width used when none is configured: twice the available CPU parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        * 2
}

/// Runs `task` on every item with at most `workers` tasks in flight.
///
/// Waits for the whole batch and returns one result per item, in input order.
pub async fn fan_out<I, T, R, F, Fut>(items: I, workers: usize, task: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(task)
        .buffered(workers.max(1))
        .collect()
        .await
}

/// A listing or deletion that failed without stopping its batch.
#[derive(Debug)]
pub struct TaskFailure {
    pub project_id: u64,
    /// `None` when listing the project's pipelines failed
    pub pipeline_id: Option<u64>,
    pub error: JanitorError,
}

/// Deletes every item, collecting failures instead of stopping at the first one.
pub async fn delete_all(
    api: &dyn PipelineApi,
    items: &[DeletionItem],
    workers: usize,
) -> Vec<TaskFailure> {
    debug!("Deleting {} pipelines with {workers} workers", items.len());

    let results = fan_out(items.iter().copied(), workers, |item| async move {
        api.delete_pipeline(item.project_id, item.pipeline_id)
            .await
            .map_err(|error| {
                warn!(
                    "Failed to delete pipeline {} of project {}: {error}",
                    item.pipeline_id, item.project_id
                );
                TaskFailure {
                    project_id: item.project_id,
                    pipeline_id: Some(item.pipeline_id),
                    error,
                }
            })
    })
    .await;

    results.into_iter().filter_map(Result::err).collect()
}
