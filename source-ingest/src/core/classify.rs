//! File classification into ingestion groups.

use globset::GlobSet;

use crate::config::model::Filters;
use crate::core::normalize::{build_globset, matches_any};
use crate::errors::Result;
use crate::model::SourceKind;

pub struct Classifier {
    plain_text: Option<GlobSet>,
}

impl Classifier {
    pub fn new(filters: &Filters) -> Result<Self> {
        Ok(Self {
            plain_text: build_globset(&filters.plain_text_masks)?,
        })
    }

    /// Plain-text masks are checked first so that templates such as
    /// `*.qute.java` stay out of the compiled groups. `None` means the file
    /// is not ingested at all.
    pub fn classify(&self, rel: &str) -> Option<SourceKind> {
        if matches_any(rel, self.plain_text.as_ref()) {
            return Some(SourceKind::PlainText);
        }
        let name = rel.rsplit('/').next().unwrap_or(rel);
        SourceKind::from_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_mask_then_name() {
        let c = Classifier::new(&Filters::default()).unwrap();
        assert_eq!(c.classify("pom.xml"), Some(SourceKind::BuildDescriptor));
        assert_eq!(c.classify("module/pom.xml"), Some(SourceKind::BuildDescriptor));
        assert_eq!(c.classify("src/main/resources/beans.xml"), Some(SourceKind::Xml));
        assert_eq!(c.classify("src/App.java"), Some(SourceKind::Java));
        assert_eq!(c.classify("src/page.qute.java"), Some(SourceKind::PlainText));
        assert_eq!(c.classify("build.gradle.kts"), Some(SourceKind::Kotlin));
        assert_eq!(c.classify("Dockerfile"), Some(SourceKind::PlainText));
        assert_eq!(c.classify("docs/README.md"), Some(SourceKind::PlainText));
        assert_eq!(c.classify("logo.png"), None);
    }

    #[test]
    fn without_masks_plain_text_is_not_ingested() {
        let filters = Filters {
            plain_text_masks: vec![],
            ..Filters::default()
        };
        let c = Classifier::new(&filters).unwrap();
        assert_eq!(c.classify("notes.txt"), None);
    }
}
