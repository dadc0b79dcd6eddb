//! Temporal grouping: partition the sorted photo stream into shot groups.
//!
//! Multi-page recipes are photographed seconds apart, unrelated recipes
//! minutes apart. A greedy scan over the sorted timestamps splits the stream
//! wherever the gap exceeds the threshold. An identical timestamp (gap of
//! zero) also splits: only a strictly positive gap within the threshold
//! continues a group.

use chrono::Duration;

use crate::intake::PhotoItem;

/// A chronologically contiguous cluster of photos, processed as one record.
#[derive(Debug, Clone)]
pub struct ShotGroup {
    pub items: Vec<PhotoItem>,
}

impl ShotGroup {
    /// Display label: member file names, comma-joined. Used in skip reports.
    pub fn label(&self) -> String {
        self.items
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Greedy linear partition of timestamp-sorted items. Every item lands in
/// exactly one group and relative order is preserved.
pub fn group_by_time(items: Vec<PhotoItem>, threshold: Duration) -> Vec<ShotGroup> {
    let mut groups: Vec<ShotGroup> = Vec::new();
    let mut current: Vec<PhotoItem> = Vec::new();

    for item in items {
        if let Some(last) = current.last() {
            let gap = item.timestamp - last.timestamp;
            if gap > Duration::zero() && gap <= threshold {
                current.push(item);
                continue;
            }
            groups.push(ShotGroup { items: std::mem::take(&mut current) });
        }
        current.push(item);
    }
    if !current.is_empty() {
        groups.push(ShotGroup { items: current });
    }

    tracing::debug!(groups = groups.len(), "temporal grouping complete");
    groups
}
