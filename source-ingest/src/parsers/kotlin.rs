//! Line-oriented Kotlin outline scanner (no grammar).

use regex::Regex;

use super::SourceParser;
use crate::model::{Import, Syntax};

pub struct KotlinParser {
    package: Regex,
    import: Regex,
    declaration: Regex,
}

impl KotlinParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            package: Regex::new(r"(?m)^\s*package\s+([A-Za-z_][\w.]*)")?,
            import: Regex::new(r"(?m)^\s*import\s+([A-Za-z_][\w.]*)(\.\*)?(?:\s+as\s+\w+)?")?,
            declaration: Regex::new(
                r"(?m)^(?:public\s+|private\s+|internal\s+|open\s+|abstract\s+|sealed\s+|data\s+|enum\s+|annotation\s+|value\s+|fun\s+)*(?:class|interface|object)\s+([A-Za-z_]\w*)",
            )?,
        })
    }
}

impl SourceParser for KotlinParser {
    fn parse(&self, text: &str) -> Result<Syntax, String> {
        let package = self
            .package
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        let imports = self
            .import
            .captures_iter(text)
            .filter_map(|c| {
                Some(Import {
                    name: c.get(1)?.as_str().to_string(),
                    wildcard: c.get(2).is_some(),
                    is_static: false,
                })
            })
            .collect();

        let declared_types = self
            .declaration
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| match &package {
                Some(p) => format!("{p}.{}", m.as_str()),
                None => m.as_str().to_string(),
            })
            .collect();

        Ok(Syntax::Compiled {
            package,
            imports,
            declared_types,
            missing_types: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_top_level_outline() {
        let src = "package com.acme\n\nimport kotlinx.coroutines.*\nimport com.acme.util.Strings as S\n\ndata class Point(val x: Int)\nobject Registry\n    class NotTopLevel\n";
        let Syntax::Compiled {
            package,
            imports,
            declared_types,
            ..
        } = KotlinParser::new().unwrap().parse(src).unwrap()
        else {
            panic!("expected compiled syntax");
        };
        assert_eq!(package.as_deref(), Some("com.acme"));
        assert_eq!(imports.len(), 2);
        assert!(imports[0].wildcard);
        assert_eq!(imports[1].name, "com.acme.util.Strings");
        assert_eq!(declared_types, vec!["com.acme.Point", "com.acme.Registry"]);
    }
}
