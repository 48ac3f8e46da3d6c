//! Partition of edit results by the kind of filesystem change they imply.

use std::time::Duration;

use rule_engine::EditResult;
use tracing::debug;

use crate::diff;

#[derive(Debug, Clone, Default)]
pub struct ResultsClassification {
    pub created: Vec<EditResult>,
    pub deleted: Vec<EditResult>,
    pub moved: Vec<EditResult>,
    pub modified: Vec<EditResult>,
}

impl ResultsClassification {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.deleted.len() + self.moved.len() + self.modified.len()
    }

    /// Created, then deleted, then moved, then modified. Patch and write-back
    /// both follow this order.
    pub fn in_patch_order(&self) -> impl Iterator<Item = &EditResult> {
        self.created
            .iter()
            .chain(&self.deleted)
            .chain(&self.moved)
            .chain(&self.modified)
    }

    pub fn total_time_saved(&self) -> Duration {
        self.in_patch_order().map(|r| r.time_saved).sum()
    }
}

/// Pure and deterministic: the order of each bucket is the input order.
pub fn classify(results: impl IntoIterator<Item = EditResult>) -> ResultsClassification {
    let mut out = ResultsClassification::default();
    for result in results {
        match (&result.before, &result.after) {
            (None, None) => debug!("classify: dropping result with neither side"),
            (None, Some(_)) => out.created.push(result),
            (Some(_), None) => out.deleted.push(result),
            (Some(b), Some(a)) if b.path() != a.path() => out.moved.push(result),
            (Some(b), Some(_)) => {
                if diff::render(&result).is_empty() {
                    debug!("classify: {} has no effective change", b.path().display());
                } else {
                    out.modified.push(result);
                }
            }
        }
    }
    out
}
