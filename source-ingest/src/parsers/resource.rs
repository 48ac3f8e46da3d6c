//! Resource formats: XML (including build descriptors), YAML, JSON and
//! `.properties`.

use serde::Deserialize;

use super::SourceParser;
use crate::model::Syntax;

pub struct XmlParser;

impl SourceParser for XmlParser {
    fn parse(&self, text: &str) -> Result<Syntax, String> {
        let opts = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, opts).map_err(|e| e.to_string())?;
        Ok(Syntax::Xml {
            root: doc.root_element().tag_name().name().to_string(),
        })
    }
}

pub struct YamlParser;

impl SourceParser for YamlParser {
    fn parse(&self, text: &str) -> Result<Syntax, String> {
        let mut documents = 0;
        for doc in serde_yml::Deserializer::from_str(text) {
            serde_yml::Value::deserialize(doc).map_err(|e| e.to_string())?;
            documents += 1;
        }
        Ok(Syntax::Yaml { documents })
    }
}

pub struct JsonParser;

impl SourceParser for JsonParser {
    fn parse(&self, text: &str) -> Result<Syntax, String> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let top_level = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        };
        Ok(Syntax::Json {
            top_level: top_level.to_string(),
        })
    }
}

/// Java `.properties`: counts logical entries, honouring `\` continuations
/// and `#`/`!` comments.
pub struct PropertiesParser;

impl SourceParser for PropertiesParser {
    fn parse(&self, text: &str) -> Result<Syntax, String> {
        let mut entries = 0;
        let mut continued = false;
        for line in text.lines() {
            let trimmed = line.trim_start();
            if continued {
                continued = ends_with_continuation(trimmed);
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            entries += 1;
            continued = ends_with_continuation(trimmed);
        }
        Ok(Syntax::Properties { entries })
    }
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_counts_documents_and_rejects_garbage() {
        assert_eq!(
            YamlParser.parse("a: 1\n---\nb: 2\n").unwrap(),
            Syntax::Yaml { documents: 2 }
        );
        assert!(YamlParser.parse("a: [1, 2\n").is_err());
    }

    #[test]
    fn xml_and_json_report_their_top_level() {
        assert_eq!(
            XmlParser.parse("<beans><bean/></beans>").unwrap(),
            Syntax::Xml { root: "beans".into() }
        );
        assert!(XmlParser.parse("<beans>").is_err());
        assert_eq!(
            JsonParser.parse("[1, 2]").unwrap(),
            Syntax::Json { top_level: "array".into() }
        );
        assert!(JsonParser.parse("{").is_err());
    }

    #[test]
    fn properties_continuations_and_comments() {
        let src = "# comment\na=1\nb=first \\\n  second\n! other\n\nc=\\\\\nd=4\n";
        assert_eq!(
            PropertiesParser.parse(src).unwrap(),
            Syntax::Properties { entries: 4 }
        );
    }
}
