use super::SourceParser;
use crate::model::Syntax;

/// Catch-all line-oriented parser; never fails on decoded text.
pub struct PlainTextParser;

impl SourceParser for PlainTextParser {
    fn parse(&self, text: &str) -> Result<Syntax, String> {
        Ok(Syntax::PlainText {
            lines: text.lines().count(),
        })
    }
}
