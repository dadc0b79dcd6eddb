//! The concurrent batch-extraction pipeline: per-group five-stage runner,
//! bounded-concurrency throttle, and outcome aggregation.

pub mod aggregate;
pub mod parse;
pub mod prompts;
pub mod runner;
pub mod throttle;
