//! Rules that create, delete or relocate whole files.

use std::path::{Path, PathBuf};

use source_ingest::model::{Charset, Payload, SourceKind, SourceUnit};

use super::{glob_finding, path_matches};
use crate::fields::{FieldKind, FieldSpec, FieldValue};
use crate::rule::{Rule, UnitEdit};

fn kind_for(path: &Path) -> SourceKind {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(SourceKind::from_file_name)
        .unwrap_or(SourceKind::PlainText)
}

fn exists(existing: &[&SourceUnit], path: &Path) -> bool {
    existing.iter().any(|u| u.path() == path)
}

fn required(field: &str, value: &str) -> Option<String> {
    value
        .trim()
        .is_empty()
        .then(|| format!("`{field}` is required"))
}

#[derive(Debug, Clone, Default)]
pub struct CreateTextFile {
    pub relative_file_name: String,
    pub file_contents: String,
    pub overwrite_existing: bool,
}

impl CreateTextFile {
    pub const ID: &'static str = "rewrite.CreateTextFile";
}

impl Rule for CreateTextFile {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "Create text file"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("relativeFileName", FieldKind::String, "Path of the new file"),
            FieldSpec::new("fileContents", FieldKind::String, "Text of the new file"),
            FieldSpec::new(
                "overwriteExisting",
                FieldKind::Bool,
                "Replace the text of an existing file at that path",
            ),
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("relativeFileName", FieldValue::String(v)) => self.relative_file_name = v,
            ("fileContents", FieldValue::String(v)) => self.file_contents = v,
            ("overwriteExisting", FieldValue::Bool(v)) => self.overwrite_existing = v,
            _ => {}
        }
    }

    fn validate(&self) -> Vec<String> {
        required("relativeFileName", &self.relative_file_name)
            .into_iter()
            .collect()
    }

    fn visit(&self, unit: &SourceUnit) -> Result<UnitEdit, String> {
        if !self.overwrite_existing || unit.path() != Path::new(&self.relative_file_name) {
            return Ok(UnitEdit::Unchanged);
        }
        if unit.text() == Some(self.file_contents.as_str()) {
            return Ok(UnitEdit::Unchanged);
        }
        Ok(UnitEdit::Changed(
            unit.clone().with_text(self.file_contents.clone()),
        ))
    }

    fn generate(&self, existing: &[&SourceUnit]) -> Result<Vec<SourceUnit>, String> {
        let path = PathBuf::from(&self.relative_file_name);
        if self.relative_file_name.trim().is_empty() || exists(existing, &path) {
            return Ok(Vec::new());
        }
        let unit = SourceUnit::new(
            path.clone(),
            kind_for(&path),
            Payload::text(self.file_contents.clone()),
        )
        .with_charset(Charset::Utf8);
        Ok(vec![unit])
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteFiles {
    pub file_pattern: String,
}

impl DeleteFiles {
    pub const ID: &'static str = "rewrite.DeleteFiles";
}

impl Rule for DeleteFiles {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "Delete files"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::new(
            "filePattern",
            FieldKind::String,
            "Glob over project-relative paths",
        )]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        if let ("filePattern", FieldValue::String(v)) = (name, value) {
            self.file_pattern = v;
        }
    }

    fn validate(&self) -> Vec<String> {
        required("filePattern", &self.file_pattern)
            .into_iter()
            .chain(glob_finding("filePattern", Some(self.file_pattern.as_str())))
            .collect()
    }

    fn visit(&self, unit: &SourceUnit) -> Result<UnitEdit, String> {
        // An empty pattern would match everything
        if self.file_pattern.trim().is_empty() {
            return Ok(UnitEdit::Unchanged);
        }
        if path_matches(Some(self.file_pattern.as_str()), unit)? {
            Ok(UnitEdit::Deleted)
        } else {
            Ok(UnitEdit::Unchanged)
        }
    }
}

/// Moves matching files into `destination`, keeping their file names.
#[derive(Debug, Clone, Default)]
pub struct MoveFile {
    pub file_pattern: String,
    pub destination: String,
}

impl MoveFile {
    pub const ID: &'static str = "rewrite.MoveFile";
}

impl Rule for MoveFile {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "Move files"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("filePattern", FieldKind::String, "Glob selecting the files"),
            FieldSpec::new("destination", FieldKind::String, "Target directory, project-relative"),
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("filePattern", FieldValue::String(v)) => self.file_pattern = v,
            ("destination", FieldValue::String(v)) => self.destination = v,
            _ => {}
        }
    }

    fn validate(&self) -> Vec<String> {
        required("filePattern", &self.file_pattern)
            .into_iter()
            .chain(glob_finding("filePattern", Some(self.file_pattern.as_str())))
            .collect()
    }

    fn visit(&self, unit: &SourceUnit) -> Result<UnitEdit, String> {
        if self.file_pattern.trim().is_empty()
            || !path_matches(Some(self.file_pattern.as_str()), unit)?
        {
            return Ok(UnitEdit::Unchanged);
        }
        let Some(name) = unit.path().file_name() else {
            return Ok(UnitEdit::Unchanged);
        };
        let target = Path::new(self.destination.trim_matches('/')).join(name);
        if target == unit.path() {
            return Ok(UnitEdit::Unchanged);
        }
        Ok(UnitEdit::Changed(unit.clone().with_path(target)))
    }
}

/// Creates a file whose content is downloaded when the change is applied.
#[derive(Debug, Clone, Default)]
pub struct AddRemoteFile {
    pub url: String,
    pub relative_file_name: String,
}

impl AddRemoteFile {
    pub const ID: &'static str = "rewrite.AddRemoteFile";
}

impl Rule for AddRemoteFile {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        "Add remote file"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("url", FieldKind::String, "Where the content is fetched from"),
            FieldSpec::new("relativeFileName", FieldKind::String, "Path of the new file"),
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("url", FieldValue::String(v)) => self.url = v,
            ("relativeFileName", FieldValue::String(v)) => self.relative_file_name = v,
            _ => {}
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut findings: Vec<String> = required("url", &self.url)
            .into_iter()
            .chain(required("relativeFileName", &self.relative_file_name))
            .collect();
        if !self.url.is_empty()
            && !(self.url.starts_with("http://") || self.url.starts_with("https://"))
        {
            findings.push(format!("`url` must be http(s): {}", self.url));
        }
        findings
    }

    fn generate(&self, existing: &[&SourceUnit]) -> Result<Vec<SourceUnit>, String> {
        let path = PathBuf::from(&self.relative_file_name);
        if self.url.is_empty() || self.relative_file_name.is_empty() || exists(existing, &path) {
            return Ok(Vec::new());
        }
        Ok(vec![SourceUnit::new(
            path.clone(),
            kind_for(&path),
            Payload::Remote {
                uri: self.url.clone(),
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(path: &str) -> SourceUnit {
        SourceUnit::new(path, SourceKind::PlainText, Payload::text("x"))
    }

    #[test]
    fn create_only_when_missing_unless_overwriting() {
        let mut rule = CreateTextFile {
            relative_file_name: "NOTICE.txt".into(),
            file_contents: "hello\n".into(),
            overwrite_existing: false,
        };
        let present = unit("NOTICE.txt");
        assert!(rule.generate(&[&present]).unwrap().is_empty());
        assert_eq!(rule.visit(&present).unwrap(), UnitEdit::Unchanged);

        let created = rule.generate(&[]).unwrap();
        assert_eq!(created[0].path(), Path::new("NOTICE.txt"));
        assert_eq!(created[0].text(), Some("hello\n"));

        rule.overwrite_existing = true;
        assert!(matches!(
            rule.visit(&present).unwrap(),
            UnitEdit::Changed(u) if u.text() == Some("hello\n")
        ));
    }

    #[test]
    fn move_keeps_identity_and_file_name() {
        let rule = MoveFile {
            file_pattern: "**/*.md".into(),
            destination: "docs/".into(),
        };
        let before = unit("README.md");
        match rule.visit(&before).unwrap() {
            UnitEdit::Changed(after) => {
                assert_eq!(after.path(), Path::new("docs/README.md"));
                assert_eq!(after.id(), before.id());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(rule.visit(&unit("docs/README.md")).unwrap(), UnitEdit::Unchanged);
    }

    #[test]
    fn delete_requires_a_pattern() {
        let rule = DeleteFiles::default();
        assert_eq!(rule.visit(&unit("a.txt")).unwrap(), UnitEdit::Unchanged);
        assert_eq!(rule.validate(), vec!["`filePattern` is required".to_string()]);

        let rule = DeleteFiles {
            file_pattern: "*.log".into(),
        };
        assert_eq!(rule.visit(&unit("a.log")).unwrap(), UnitEdit::Deleted);
    }

    #[test]
    fn remote_files_carry_their_uri() {
        let rule = AddRemoteFile {
            url: "https://example.org/LICENSE".into(),
            relative_file_name: "LICENSE".into(),
        };
        let created = rule.generate(&[]).unwrap();
        assert_eq!(
            created[0].payload(),
            &Payload::Remote {
                uri: "https://example.org/LICENSE".into()
            }
        );
    }
}
