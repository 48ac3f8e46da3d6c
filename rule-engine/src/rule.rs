//! The rule contract.
//!
//! A rule sees each source unit once through [`Rule::visit`] and may add new
//! units through [`Rule::generate`]. Composite rules only group children; the
//! runner walks them in order and never calls the composite's own hooks.

use std::time::Duration;

use source_ingest::model::SourceUnit;

use crate::fields::{FieldSpec, FieldValue};

/// Default estimate of manual effort saved per changed file.
pub const DEFAULT_TIME_SAVED: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq)]
pub enum UnitEdit {
    Unchanged,
    Changed(SourceUnit),
    Deleted,
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn fields(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Called only with a name from [`Rule::fields`] and a value of the
    /// declared kind.
    fn set_field(&mut self, _name: &str, _value: FieldValue) {}

    fn children(&self) -> &[Box<dyn Rule>] {
        &[]
    }

    fn is_composite(&self) -> bool {
        !self.children().is_empty()
    }

    /// Precondition findings. Reported as warnings; they never block a run.
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }

    fn time_saved(&self) -> Duration {
        DEFAULT_TIME_SAVED
    }

    fn visit(&self, _unit: &SourceUnit) -> Result<UnitEdit, String> {
        Ok(UnitEdit::Unchanged)
    }

    /// New units, given everything that exists after the visit pass.
    fn generate(&self, _existing: &[&SourceUnit]) -> Result<Vec<SourceUnit>, String> {
        Ok(Vec::new())
    }
}

impl std::fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id())
            .field("children", &self.children().len())
            .finish()
    }
}

/// Run `validate` over a rule and its descendants, prefixing each finding
/// with the rule id.
pub fn validate_all(rule: &dyn Rule) -> Vec<String> {
    let mut findings: Vec<String> = rule
        .validate()
        .into_iter()
        .map(|f| format!("{}: {f}", rule.id()))
        .collect();
    for child in rule.children() {
        findings.extend(validate_all(child.as_ref()));
    }
    findings
}
