//! Text-level rules. They only touch units with a text payload.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{NoExpand, Regex, RegexBuilder};
use source_ingest::model::SourceUnit;

use super::{glob_finding, path_matches};
use crate::fields::{FieldKind, FieldSpec, FieldValue};
use crate::rule::{Rule, UnitEdit};

const FILE_PATTERN: FieldSpec = FieldSpec::new(
    "filePattern",
    FieldKind::String,
    "Glob over project-relative paths; all files when empty",
);

/// Shared tail of the text rules: apply `f` when the unit is text and passes
/// the path filter, and report a change only when the text differs.
fn edit_text(
    unit: &SourceUnit,
    pattern: Option<&str>,
    f: impl FnOnce(&str) -> String,
) -> Result<UnitEdit, String> {
    let Some(text) = unit.text() else {
        return Ok(UnitEdit::Unchanged);
    };
    if !path_matches(pattern, unit)? {
        return Ok(UnitEdit::Unchanged);
    }
    let edited = f(text);
    if edited == text {
        Ok(UnitEdit::Unchanged)
    } else {
        Ok(UnitEdit::Changed(unit.clone().with_text(edited)))
    }
}

#[derive(Debug, Clone)]
pub struct FindAndReplace {
    pub find: String,
    pub replace: String,
    pub regex: bool,
    pub case_sensitive: bool,
    pub file_pattern: Option<String>,
    /// Texts longer than this many bytes are left alone.
    pub max_file_size: Option<i64>,
    pub(crate) compiled: OnceLock<CompiledFind>,
}

/// Matcher built on first use, tagged with the settings it was built from.
#[derive(Debug, Clone)]
pub(crate) struct CompiledFind {
    key: (String, bool, bool),
    regex: Result<Regex, String>,
}

fn build_matcher((find, regex, case_sensitive): &(String, bool, bool)) -> Result<Regex, String> {
    let pattern = if *regex {
        Cow::Borrowed(find.as_str())
    } else {
        Cow::Owned(regex::escape(find))
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!case_sensitive)
        .multi_line(true)
        .build()
        .map_err(|e| e.to_string())
}

impl Default for FindAndReplace {
    fn default() -> Self {
        Self {
            find: String::new(),
            replace: String::new(),
            regex: false,
            case_sensitive: true,
            file_pattern: None,
            max_file_size: None,
            compiled: OnceLock::new(),
        }
    }
}

impl FindAndReplace {
    pub const ID: &'static str = "rewrite.text.FindAndReplace";

    /// The cached matcher, or a fresh one when the public fields changed
    /// since it was built.
    fn matcher(&self) -> Result<Cow<'_, Regex>, String> {
        let key = (self.find.clone(), self.regex, self.case_sensitive);
        let cached = self.compiled.get_or_init(|| CompiledFind {
            regex: build_matcher(&key),
            key: key.clone(),
        });
        if cached.key == key {
            cached.regex.as_ref().map(Cow::Borrowed).map_err(Clone::clone)
        } else {
            build_matcher(&key).map(Cow::Owned)
        }
    }
}

impl Rule for FindAndReplace {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "Find and replace"
    }

    fn description(&self) -> &str {
        "Replace literal text or regex matches in text files."
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("find", FieldKind::String, "Literal text or regex to look for"),
            FieldSpec::new("replace", FieldKind::String, "Replacement; `$1` groups in regex mode"),
            FieldSpec::new("regex", FieldKind::Bool, "Treat `find` as a regex"),
            FieldSpec::new("caseSensitive", FieldKind::Bool, "Match case, defaults to true"),
            FILE_PATTERN,
            FieldSpec::new("maxFileSize", FieldKind::Long, "Skip texts larger than this (bytes)"),
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("find", FieldValue::String(v)) => self.find = v,
            ("replace", FieldValue::String(v)) => self.replace = v,
            ("regex", FieldValue::Bool(v)) => self.regex = v,
            ("caseSensitive", FieldValue::Bool(v)) => self.case_sensitive = v,
            ("filePattern", FieldValue::String(v)) => self.file_pattern = Some(v),
            ("maxFileSize", FieldValue::Long(v)) => self.max_file_size = Some(v),
            _ => return,
        }
        self.compiled = OnceLock::new();
    }

    fn validate(&self) -> Vec<String> {
        let mut findings = Vec::new();
        if self.find.is_empty() {
            findings.push("`find` is required".to_string());
        } else if self.regex {
            if let Err(e) = regex::Regex::new(&self.find) {
                findings.push(format!("`find` is not a valid regex: {e}"));
            }
        }
        findings.extend(glob_finding("filePattern", self.file_pattern.as_deref()));
        findings
    }

    fn visit(&self, unit: &SourceUnit) -> Result<UnitEdit, String> {
        if self.find.is_empty() {
            return Ok(UnitEdit::Unchanged);
        }
        if let (Some(max), Some(text)) = (self.max_file_size, unit.text()) {
            if i64::try_from(text.len()).unwrap_or(i64::MAX) > max {
                return Ok(UnitEdit::Unchanged);
            }
        }
        if unit.text().is_none() || !path_matches(self.file_pattern.as_deref(), unit)? {
            return Ok(UnitEdit::Unchanged);
        }
        let re = self.matcher()?;
        edit_text(unit, None, |text| {
            if self.regex {
                re.replace_all(text, self.replace.as_str()).into_owned()
            } else {
                re.replace_all(text, NoExpand(&self.replace)).into_owned()
            }
        })
    }
}

/// Strips spaces and tabs before every line ending. Line endings are kept.
#[derive(Debug, Clone, Default)]
pub struct TrimTrailingWhitespace {
    pub file_pattern: Option<String>,
}

impl TrimTrailingWhitespace {
    pub const ID: &'static str = "rewrite.text.TrimTrailingWhitespace";
}

pub fn trim_trailing_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        out.push_str(body.trim_end_matches([' ', '\t']));
        out.push_str(ending);
    }
    out
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

impl Rule for TrimTrailingWhitespace {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "Trim trailing whitespace"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FILE_PATTERN]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        if let ("filePattern", FieldValue::String(v)) = (name, value) {
            self.file_pattern = Some(v);
        }
    }

    fn validate(&self) -> Vec<String> {
        glob_finding("filePattern", self.file_pattern.as_deref())
            .into_iter()
            .collect()
    }

    fn visit(&self, unit: &SourceUnit) -> Result<UnitEdit, String> {
        edit_text(unit, self.file_pattern.as_deref(), trim_trailing_whitespace)
    }
}

/// Appends a line ending to non-empty texts that lack one, matching the
/// file's existing style.
#[derive(Debug, Clone, Default)]
pub struct EnsureFinalNewline {
    pub file_pattern: Option<String>,
}

impl EnsureFinalNewline {
    pub const ID: &'static str = "rewrite.text.EnsureFinalNewline";
}

impl Rule for EnsureFinalNewline {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "End files with a newline"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FILE_PATTERN]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        if let ("filePattern", FieldValue::String(v)) = (name, value) {
            self.file_pattern = Some(v);
        }
    }

    fn visit(&self, unit: &SourceUnit) -> Result<UnitEdit, String> {
        edit_text(unit, self.file_pattern.as_deref(), |text| {
            if text.is_empty() || text.ends_with('\n') {
                return text.to_string();
            }
            let ending = if text.contains("\r\n") { "\r\n" } else { "\n" };
            format!("{text}{ending}")
        })
    }
}

/// Replaces tabs with spaces up to the next tab stop.
#[derive(Debug, Clone)]
pub struct ExpandTabs {
    pub tab_width: i32,
    pub file_pattern: Option<String>,
}

impl Default for ExpandTabs {
    fn default() -> Self {
        Self {
            tab_width: 4,
            file_pattern: None,
        }
    }
}

impl ExpandTabs {
    pub const ID: &'static str = "rewrite.text.ExpandTabs";
}

fn expand_tabs(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0usize;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = width - column % width;
                out.extend(std::iter::repeat_n(' ', pad));
                column += pad;
            }
            '\n' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

impl Rule for ExpandTabs {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "Expand tabs"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("tabWidth", FieldKind::Int, "Spaces per tab stop, defaults to 4"),
            FILE_PATTERN,
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("tabWidth", FieldValue::Int(v)) => self.tab_width = v,
            ("filePattern", FieldValue::String(v)) => self.file_pattern = Some(v),
            _ => {}
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut findings = Vec::new();
        if self.tab_width <= 0 {
            findings.push(format!("`tabWidth` must be positive, got {}", self.tab_width));
        }
        findings.extend(glob_finding("filePattern", self.file_pattern.as_deref()));
        findings
    }

    fn visit(&self, unit: &SourceUnit) -> Result<UnitEdit, String> {
        let width = usize::try_from(self.tab_width)
            .ok()
            .filter(|w| *w > 0)
            .ok_or_else(|| format!("invalid tab width {}", self.tab_width))?;
        edit_text(unit, self.file_pattern.as_deref(), |text| {
            expand_tabs(text, width)
        })
    }
}
