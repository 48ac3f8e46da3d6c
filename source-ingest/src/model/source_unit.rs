//! The in-memory representation of one project file.
//!
//! A [`SourceUnit`] is never mutated in place; every `with_*` method consumes
//! the unit and returns a new one with the same identity.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::charset::Charset;
use super::kind::SourceKind;
use super::marker::{Marker, Markers};

/// Deterministic id derived from the project-relative path.
pub fn stable_unit_id(path: &Path) -> Uuid {
    let key = path.to_string_lossy().replace('\\', "/");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpaqueReason {
    /// Larger than the configured size threshold; never read.
    Oversized,
    /// Read, but could not be decoded or parsed.
    Unparseable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Payload {
    Text { text: String },
    Bytes { bytes: Vec<u8> },
    /// Content fetched from `uri` when the unit is written.
    Remote { uri: String },
    /// Placeholder for content that was never decoded.
    Opaque { size: u64, reason: OpaqueReason },
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text { text: text.into() }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Payload::Text { .. } => "text",
            Payload::Bytes { .. } => "bytes",
            Payload::Remote { .. } => "remote",
            Payload::Opaque { .. } => "opaque",
        }
    }
}

/// Owner permission bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
}

impl Default for FileAttributes {
    fn default() -> Self {
        Self {
            readable: true,
            writable: true,
            executable: false,
        }
    }
}

impl FileAttributes {
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode();
        Self {
            readable: mode & 0o400 != 0,
            writable: mode & 0o200 != 0,
            executable: mode & 0o100 != 0,
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            readable: true,
            writable: !meta.permissions().readonly(),
            executable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Type or package name, without `static` and without a trailing `.*`.
    pub name: String,
    pub wildcard: bool,
    pub is_static: bool,
}

impl Import {
    /// The type this import needs: the package for wildcards and the
    /// enclosing type for static member imports.
    pub fn required_type(&self) -> &str {
        if self.is_static && !self.wildcard {
            self.name
                .rsplit_once('.')
                .map(|(owner, _)| owner)
                .unwrap_or(&self.name)
        } else {
            &self.name
        }
    }
}

/// What a parser learned about a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "syntax", rename_all = "kebab-case")]
pub enum Syntax {
    Compiled {
        package: Option<String>,
        imports: Vec<Import>,
        /// Fully qualified names of top-level declarations.
        declared_types: Vec<String>,
        /// Imports not found on the classpath nor in the project.
        missing_types: Vec<String>,
    },
    Xml {
        root: String,
    },
    Yaml {
        documents: usize,
    },
    Json {
        top_level: String,
    },
    Properties {
        entries: usize,
    },
    PlainText {
        lines: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    id: Uuid,
    path: PathBuf,
    kind: SourceKind,
    payload: Payload,
    charset: Option<Charset>,
    attributes: Option<FileAttributes>,
    markers: Markers,
    syntax: Option<Syntax>,
}

impl SourceUnit {
    /// `path` is relative to the project root.
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind, payload: Payload) -> Self {
        let path = path.into();
        Self {
            id: stable_unit_id(&path),
            path,
            kind,
            payload,
            charset: None,
            attributes: None,
            markers: Markers::default(),
            syntax: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.payload, Payload::Opaque { .. })
    }

    pub fn charset(&self) -> Option<Charset> {
        self.charset
    }

    pub fn attributes(&self) -> Option<FileAttributes> {
        self.attributes
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn syntax(&self) -> Option<&Syntax> {
        self.syntax.as_ref()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_payload(Payload::text(text))
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = Some(charset);
        self
    }

    pub fn with_attributes(mut self, attributes: FileAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = Some(syntax);
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.add_if_absent(marker);
        self
    }
}
