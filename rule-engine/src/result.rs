use std::time::Duration;

use source_ingest::model::SourceUnit;

/// One proposed change. `before`/`after` absent mean creation/deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct EditResult {
    pub before: Option<SourceUnit>,
    pub after: Option<SourceUnit>,
    /// Ids of the rules that touched the unit, in the order they did.
    pub rules: Vec<String>,
    pub time_saved: Duration,
}

impl EditResult {
    pub fn new(before: Option<SourceUnit>, after: Option<SourceUnit>) -> Self {
        Self {
            before,
            after,
            rules: Vec::new(),
            time_saved: Duration::ZERO,
        }
    }

    pub fn with_rule(mut self, id: impl Into<String>) -> Self {
        self.rules.push(id.into());
        self
    }

    pub fn with_time_saved(mut self, time_saved: Duration) -> Self {
        self.time_saved = time_saved;
        self
    }
}
