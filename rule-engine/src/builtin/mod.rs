//! Rules shipped with the runner. They form the host registry layer.

pub mod files;
pub mod text;

use globset::Glob;
use source_ingest::model::SourceUnit;

use crate::rule::Rule;

pub type RuleFactory = fn() -> Box<dyn Rule>;

pub const BUILTINS: &[(&str, RuleFactory)] = &[
    (text::FindAndReplace::ID, make::<text::FindAndReplace>),
    (text::TrimTrailingWhitespace::ID, make::<text::TrimTrailingWhitespace>),
    (text::EnsureFinalNewline::ID, make::<text::EnsureFinalNewline>),
    (text::ExpandTabs::ID, make::<text::ExpandTabs>),
    (files::CreateTextFile::ID, make::<files::CreateTextFile>),
    (files::DeleteFiles::ID, make::<files::DeleteFiles>),
    (files::MoveFile::ID, make::<files::MoveFile>),
    (files::AddRemoteFile::ID, make::<files::AddRemoteFile>),
];

fn make<R: Rule + Default + 'static>() -> Box<dyn Rule> {
    Box::new(R::default())
}

/// Whether `unit` passes an optional path glob. `None` or empty matches all.
pub(crate) fn path_matches(pattern: Option<&str>, unit: &SourceUnit) -> Result<bool, String> {
    match pattern.filter(|p| !p.trim().is_empty()) {
        None => Ok(true),
        Some(p) => Glob::new(p)
            .map(|g| g.compile_matcher().is_match(unit.path()))
            .map_err(|e| format!("invalid file pattern `{p}`: {e}")),
    }
}

pub(crate) fn glob_finding(field: &str, pattern: Option<&str>) -> Option<String> {
    let p = pattern?;
    Glob::new(p)
        .err()
        .map(|e| format!("`{field}` is not a valid glob: {e}"))
}
