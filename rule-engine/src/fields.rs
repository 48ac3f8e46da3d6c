//! Settable-field configuration.
//!
//! A rule publishes its configurable fields as [`FieldSpec`]s and accepts
//! typed [`FieldValue`]s through [`Rule::set_field`]. [`configure`] is the only
//! way options reach a rule: every key must name a published field and every
//! value must coerce to that field's kind, otherwise nothing is applied.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::errors::FieldConfigError;
use crate::rule::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    /// 32-bit signed.
    Int,
    /// 64-bit signed.
    Long,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::String => "a string",
            FieldKind::Bool => "a boolean",
            FieldKind::Int => "an int",
            FieldKind::Long => "a long",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Bool(bool),
    Int(i32),
    Long(i64),
}

impl FieldKind {
    /// Booleans accept `true`/`false` in any case and nothing else.
    pub fn coerce(&self, raw: &str) -> Option<FieldValue> {
        match self {
            FieldKind::String => Some(FieldValue::String(raw.to_string())),
            FieldKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Some(FieldValue::Bool(true)),
                "false" => Some(FieldValue::Bool(false)),
                _ => None,
            },
            FieldKind::Int => raw.trim().parse().ok().map(FieldValue::Int),
            FieldKind::Long => raw.trim().parse().ok().map(FieldValue::Long),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
        }
    }
}

/// Split `key=value` strings on the first `=`. Later duplicates win.
pub fn parse_options<S: AsRef<str>>(
    raw: &[S],
) -> Result<BTreeMap<String, String>, FieldConfigError> {
    let mut out = BTreeMap::new();
    for option in raw {
        let option = option.as_ref();
        let (key, value) = option
            .split_once('=')
            .filter(|(k, _)| !k.trim().is_empty())
            .ok_or_else(|| FieldConfigError::MalformedOption(option.to_string()))?;
        out.insert(key.trim().to_string(), value.to_string());
    }
    Ok(out)
}

/// Apply `options` to `rule`. Validation happens before the first setter
/// runs, so a rejected configuration leaves the rule untouched.
pub fn configure(
    rule: &mut dyn Rule,
    options: &BTreeMap<String, String>,
) -> Result<(), FieldConfigError> {
    if options.is_empty() {
        return Ok(());
    }
    if rule.is_composite() {
        return Err(FieldConfigError::Composite {
            rule: rule.id().to_string(),
        });
    }

    let fields = rule.fields();
    let unknown: Vec<String> = options
        .keys()
        .filter(|k| !fields.iter().any(|f| f.name == k.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(FieldConfigError::UnknownFields {
            rule: rule.id().to_string(),
            keys: unknown,
        });
    }

    let mut values = Vec::with_capacity(options.len());
    for (key, raw) in options {
        let Some(spec) = fields.iter().find(|f| f.name == key.as_str()) else {
            continue;
        };
        let value = spec
            .kind
            .coerce(raw)
            .ok_or_else(|| FieldConfigError::NotCoercible {
                rule: rule.id().to_string(),
                field: key.clone(),
                value: raw.clone(),
                expected: spec.kind,
            })?;
        values.push((spec.name, value));
    }

    for (name, value) in values {
        debug!("fields: {}.{name} = {value:?}", rule.id());
        rule.set_field(name, value);
    }
    Ok(())
}
