//! Declarative rules: YAML documents that name a list of other rules with
//! their options.
//!
//! ```yaml
//! type: specs.openrewrite.org/v1beta/recipe
//! name: com.acme.Tidy
//! displayName: Tidy text files
//! recipeList:
//!   - rewrite.text.TrimTrailingWhitespace
//!   - rewrite.text.FindAndReplace:
//!       find: colour
//!       replace: color
//! ```
//!
//! Documents of any other `type` are ignored. Steps are resolved against the
//! registry when the rule is instantiated, so a definition may refer to
//! rules from any layer.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yml::Value;
use tracing::debug;

use crate::errors::{Result, RuleError};
use crate::rule::Rule;

pub const RULE_DOCUMENT_TYPE: &str = "specs.openrewrite.org/v1beta/recipe";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    recipe_list: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleStep {
    pub id: String,
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarativeDefinition {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub steps: Vec<RuleStep>,
    /// File or package entry the definition came from.
    pub origin: String,
}

pub fn parse_definitions(text: &str, origin: &str) -> Result<Vec<DeclarativeDefinition>> {
    let invalid = |reason: String| RuleError::Definition {
        origin: origin.to_string(),
        reason,
    };

    let mut out = Vec::new();
    for document in serde_yml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(|e| invalid(e.to_string()))?;
        if value.is_null() {
            continue;
        }
        let raw: RawDocument =
            serde_yml::from_value(value).map_err(|e| invalid(e.to_string()))?;
        if raw.kind.as_deref() != Some(RULE_DOCUMENT_TYPE) {
            debug!(
                "declarative: skipping document of type {:?} in {origin}",
                raw.kind
            );
            continue;
        }
        let id = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| invalid("rule document without `name`".to_string()))?;
        let steps = raw
            .recipe_list
            .into_iter()
            .map(|v| parse_step(v).map_err(|reason| invalid(format!("{id}: {reason}"))))
            .collect::<Result<Vec<_>>>()?;
        out.push(DeclarativeDefinition {
            display_name: raw.display_name.unwrap_or_else(|| id.clone()),
            description: raw.description.unwrap_or_default(),
            id,
            steps,
            origin: origin.to_string(),
        });
    }
    Ok(out)
}

/// `- some.Rule` or `- some.Rule: { key: value }`.
fn parse_step(value: Value) -> std::result::Result<RuleStep, String> {
    match value {
        Value::String(id) => Ok(RuleStep {
            id,
            options: BTreeMap::new(),
        }),
        Value::Mapping(map) => {
            let mut entries = map.into_iter();
            let (Some((key, options)), None) = (entries.next(), entries.next()) else {
                return Err("a step must name exactly one rule".to_string());
            };
            let id = key
                .as_str()
                .ok_or_else(|| "rule id must be a string".to_string())?
                .to_string();
            let options = match options {
                Value::Null => BTreeMap::new(),
                Value::Mapping(fields) => fields
                    .into_iter()
                    .map(|(k, v)| -> std::result::Result<(String, String), String> {
                        let k = k
                            .as_str()
                            .ok_or_else(|| format!("option names of `{id}` must be strings"))?
                            .to_string();
                        let v = scalar_to_string(v)
                            .ok_or_else(|| format!("option `{k}` of `{id}` must be a scalar"))?;
                        Ok((k, v))
                    })
                    .collect::<std::result::Result<_, String>>()?,
                _ => return Err(format!("options of `{id}` must be a mapping")),
            };
            Ok(RuleStep { id, options })
        }
        other => Err(format!("unsupported step {other:?}")),
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// An instantiated declarative rule: a named, ordered group of children.
pub struct DeclarativeRule {
    pub(crate) id: String,
    pub(crate) display_name: String,
    pub(crate) description: String,
    pub(crate) children: Vec<Box<dyn Rule>>,
}

impl Rule for DeclarativeRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn children(&self) -> &[Box<dyn Rule>] {
        &self.children
    }

    /// Composite even when the list is empty.
    fn is_composite(&self) -> bool {
        true
    }
}
