//! Bounded-concurrency execution of group pipelines.
//!
//! A semaphore gates how many pipelines run at once; every group is spawned
//! exactly once and every spawned task resolves to an `Outcome`. A task that
//! panics still surfaces as a `Skipped` outcome — its label is recovered from
//! a task-id map so no group ever vanishes from the results.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::aggregate::Outcome;
use super::runner::GroupPipeline;
use crate::grouping::ShotGroup;
use crate::report::Reporter;

/// Run every group through the pipeline with at most `limit` active at once.
/// Returns exactly one outcome per group, ordered by completion.
pub async fn run_groups(
    pipeline: Arc<GroupPipeline>,
    groups: Vec<ShotGroup>,
    limit: usize,
    reporter: &dyn Reporter,
) -> Vec<Outcome> {
    let total = groups.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks: JoinSet<Outcome> = JoinSet::new();
    let mut labels: HashMap<tokio::task::Id, String> = HashMap::new();

    for group in groups {
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        let label = group.label();
        let handle = tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            pipeline.process_group(&group).await
        });
        labels.insert(handle.id(), label);
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next_with_id().await {
        let outcome = match joined {
            Ok((_, outcome)) => outcome,
            Err(join_err) => {
                let label = labels
                    .get(&join_err.id())
                    .cloned()
                    .unwrap_or_else(|| "unknown group".to_string());
                tracing::error!(group = %label, error = %join_err, "pipeline task died");
                Outcome::Skipped {
                    group: label,
                    reason: format!("pipeline aborted unexpectedly: {join_err}"),
                }
            }
        };
        outcomes.push(outcome);
        reporter.progress(outcomes.len(), total);
    }

    outcomes
}
