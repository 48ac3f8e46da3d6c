//! Per-kind parsers behind one trait, plus the router that picks them.

pub mod java;
pub mod kotlin;
pub mod resource;
pub mod text;

use crate::errors::{IngestError, Result};
use crate::model::{SourceKind, Syntax};

/// Parses decoded text into a [`Syntax`] outline. The error is a
/// human-readable reason; the caller turns it into a degraded unit.
pub trait SourceParser: Send + Sync {
    fn parse(&self, text: &str) -> std::result::Result<Syntax, String>;
}

pub struct ParserRouter {
    java: java::JavaParser,
    kotlin: kotlin::KotlinParser,
    xml: resource::XmlParser,
    yaml: resource::YamlParser,
    json: resource::JsonParser,
    properties: resource::PropertiesParser,
    text: text::PlainTextParser,
}

impl ParserRouter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            java: java::JavaParser,
            kotlin: kotlin::KotlinParser::new()
                .map_err(|e| IngestError::ParserSetup(e.to_string()))?,
            xml: resource::XmlParser,
            yaml: resource::YamlParser,
            json: resource::JsonParser,
            properties: resource::PropertiesParser,
            text: text::PlainTextParser,
        })
    }

    pub fn parser_for(&self, kind: SourceKind) -> &dyn SourceParser {
        match kind {
            SourceKind::Java => &self.java,
            SourceKind::Kotlin => &self.kotlin,
            SourceKind::BuildDescriptor | SourceKind::Xml => &self.xml,
            SourceKind::Yaml => &self.yaml,
            SourceKind::Json => &self.json,
            SourceKind::Properties => &self.properties,
            SourceKind::PlainText => &self.text,
        }
    }
}
