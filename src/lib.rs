//! Platefile turns a folder of photographed recipe cards into structured,
//! importable records.
//!
//! The flow: scan the folder ([`intake`]), cluster shots taken seconds apart
//! ([`grouping`]), run each cluster through the five-stage extraction
//! pipeline under a concurrency cap ([`pipeline`]), then hand the aggregated
//! outcomes to the exporters ([`export`]) and the reporter ([`report`]).

pub mod config;
pub mod export;
pub mod grouping;
pub mod intake;
pub mod pipeline;
pub mod report;
pub mod sanitize;
pub mod schema;
pub mod service;

use std::sync::Arc;

use config::RunConfig;
use intake::IntakeError;
use pipeline::aggregate::BatchSummary;
use pipeline::runner::GroupPipeline;
use pipeline::throttle;
use report::Reporter;
use service::invoker::{ResilientInvoker, RetryPolicy};
use service::ServiceTransport;

/// Run one full batch: intake, grouping, throttled extraction, aggregation.
/// Export and exit-code handling stay with the caller. The transport is
/// injected so tests can script the service.
pub async fn run_batch(
    config: &RunConfig,
    transport: Arc<dyn ServiceTransport>,
    reporter: &dyn Reporter,
) -> Result<BatchSummary, IntakeError> {
    let items = intake::scan_photos(&config.input_dir)?;
    let groups = grouping::group_by_time(
        items,
        chrono::Duration::seconds(config.group_threshold_secs),
    );
    tracing::info!(groups = groups.len(), concurrency = config.concurrency, "starting batch");
    reporter.started(groups.len());

    let invoker = ResilientInvoker::new(
        transport,
        RetryPolicy {
            max_retries: config.max_retries,
            initial_delay: config.initial_delay,
        },
    );
    let pipeline = Arc::new(GroupPipeline::new(
        invoker,
        config.vision_model.clone(),
        config.text_model.clone(),
        config.batch_tags.clone(),
    ));

    let outcomes = throttle::run_groups(pipeline, groups, config.concurrency, reporter).await;
    let summary = BatchSummary::collect(outcomes);
    reporter.finished(&summary);
    Ok(summary)
}
