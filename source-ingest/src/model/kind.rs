//! Source kind taxonomy.
//!
//! Kinds double as ingestion groups: every file of a kind is parsed by the
//! same parser, and compiled kinds additionally get the classpath type index.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Java,
    Kotlin,
    /// `pom.xml`
    BuildDescriptor,
    Xml,
    Yaml,
    Json,
    Properties,
    PlainText,
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Java => "java",
            SourceKind::Kotlin => "kotlin",
            SourceKind::BuildDescriptor => "build-descriptor",
            SourceKind::Xml => "xml",
            SourceKind::Yaml => "yaml",
            SourceKind::Json => "json",
            SourceKind::Properties => "properties",
            SourceKind::PlainText => "plain-text",
        }
    }

    /// Kinds whose parsing needs the resolved classpath.
    pub fn is_compiled(&self) -> bool {
        matches!(self, SourceKind::Java | SourceKind::Kotlin)
    }

    /// Detection by file name and extension. Plain text is never returned
    /// here; it depends on the configured masks.
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name == "pom.xml" {
            return Some(Self::BuildDescriptor);
        }
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "java" => Some(Self::Java),
            "kt" | "kts" => Some(Self::Kotlin),
            "xml" | "xsd" | "xsl" | "wsdl" => Some(Self::Xml),
            "yml" | "yaml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "properties" => Some(Self::Properties),
            _ => None,
        }
    }
}
