//! Terminal outcomes and their aggregation. No I/O here — the exporters and
//! reporter consume the summary.

use crate::schema::RecipeRecord;

/// The single terminal result of one group's pipeline run.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(RecipeRecord),
    Skipped { group: String, reason: String },
}

/// One skipped group: its member names (the label) and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipEntry {
    pub group: String,
    pub reason: String,
}

/// All outcomes of a run, split for the writers and the reporter.
/// Records and skips are ordered by completion; completion order carries no
/// meaning across groups.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub records: Vec<RecipeRecord>,
    pub skipped: Vec<SkipEntry>,
}

impl BatchSummary {
    pub fn collect(outcomes: Vec<Outcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Success(record) => summary.records.push(record),
                Outcome::Skipped { group, reason } => {
                    summary.skipped.push(SkipEntry { group, reason })
                }
            }
        }
        summary
    }

    pub fn success_count(&self) -> usize {
        self.records.len()
    }

    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn total(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecipeField;

    #[test]
    fn collect_splits_outcomes() {
        let mut record = RecipeRecord::new();
        record.set(RecipeField::Title, "Pancakes");
        let outcomes = vec![
            Outcome::Success(record),
            Outcome::Skipped { group: "a.jpg".into(), reason: "no text".into() },
            Outcome::Skipped { group: "b.jpg, c.jpg".into(), reason: "not a recipe".into() },
        ];

        let summary = BatchSummary::collect(outcomes);
        assert_eq!(summary.success_count(), 1);
        assert_eq!(summary.skip_count(), 2);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.records[0].get(RecipeField::Title), "Pancakes");
        assert_eq!(summary.skipped[1].group, "b.jpg, c.jpg");
    }

    #[test]
    fn empty_run_is_empty_summary() {
        let summary = BatchSummary::collect(vec![]);
        assert_eq!(summary.total(), 0);
    }
}
