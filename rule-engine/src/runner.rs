//! Runs selected rules over the ingested units.
//!
//! Rules are applied in order to one shared working set, so a later rule
//! sees what earlier ones produced and every file yields at most one
//! [`EditResult`]. Units are never mutated; the working set tracks the
//! original unit next to its latest replacement.

use std::path::PathBuf;
use std::time::Duration;

use source_ingest::model::SourceUnit;
use tracing::{debug, info, instrument, warn};

use crate::result::EditResult;
use crate::rule::{Rule, UnitEdit};

/// A rule hook that failed for one unit. The run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    pub rule: String,
    /// `None` when generation failed.
    pub path: Option<PathBuf>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub results: Vec<EditResult>,
    pub failures: Vec<RuleFailure>,
}

struct Tracked {
    before: Option<SourceUnit>,
    current: Option<SourceUnit>,
    rules: Vec<String>,
    time_saved: Duration,
}

impl Tracked {
    fn touched_by(&mut self, rule: &dyn Rule) {
        if !self.rules.iter().any(|r| r == rule.id()) {
            self.rules.push(rule.id().to_string());
            self.time_saved += rule.time_saved();
        }
    }
}

#[instrument(skip_all, fields(rules = rules.len(), units = units.len()))]
pub fn run(rules: &[Box<dyn Rule>], units: &[SourceUnit]) -> RunOutcome {
    let mut tracked: Vec<Tracked> = units
        .iter()
        .map(|u| Tracked {
            before: Some(u.clone()),
            current: Some(u.clone()),
            rules: Vec::new(),
            time_saved: Duration::ZERO,
        })
        .collect();
    let mut failures = Vec::new();

    for rule in rules {
        info!("runner: running {}", rule.id());
        apply(rule.as_ref(), &mut tracked, &mut failures);
    }

    let results: Vec<EditResult> = tracked
        .into_iter()
        .filter(|t| !t.rules.is_empty())
        .map(|t| EditResult {
            before: t.before,
            after: t.current,
            rules: t.rules,
            time_saved: t.time_saved,
        })
        .collect();
    info!(
        "runner: {} result(s), {} failure(s)",
        results.len(),
        failures.len()
    );
    RunOutcome { results, failures }
}

fn apply(rule: &dyn Rule, tracked: &mut Vec<Tracked>, failures: &mut Vec<RuleFailure>) {
    if rule.is_composite() {
        for child in rule.children() {
            apply(child.as_ref(), tracked, failures);
        }
        return;
    }

    for t in tracked.iter_mut() {
        let edit = match &t.current {
            Some(unit) => rule.visit(unit),
            None => continue,
        };
        match edit {
            Ok(UnitEdit::Unchanged) => {}
            Ok(UnitEdit::Changed(next)) => {
                if t.current.as_ref() != Some(&next) {
                    debug!("runner: {} changed {}", rule.id(), next.path().display());
                    t.current = Some(next);
                    t.touched_by(rule);
                }
            }
            Ok(UnitEdit::Deleted) => {
                t.current = None;
                t.touched_by(rule);
            }
            Err(reason) => {
                let path = t.current.as_ref().map(|u| u.path().to_path_buf());
                warn!(
                    "runner: {} failed on {}: {reason}",
                    rule.id(),
                    path.as_deref().map(|p| p.display().to_string()).unwrap_or_default()
                );
                failures.push(RuleFailure {
                    rule: rule.id().to_string(),
                    path,
                    reason,
                });
            }
        }
    }

    let generated = {
        let existing: Vec<&SourceUnit> =
            tracked.iter().filter_map(|t| t.current.as_ref()).collect();
        rule.generate(&existing)
    };
    match generated {
        Ok(units) => {
            for unit in units {
                debug!("runner: {} generated {}", rule.id(), unit.path().display());
                let mut t = Tracked {
                    before: None,
                    current: Some(unit),
                    rules: Vec::new(),
                    time_saved: Duration::ZERO,
                };
                t.touched_by(rule);
                tracked.push(t);
            }
        }
        Err(reason) => {
            warn!("runner: {} failed to generate files: {reason}", rule.id());
            failures.push(RuleFailure {
                rule: rule.id().to_string(),
                path: None,
                reason,
            });
        }
    }
}
