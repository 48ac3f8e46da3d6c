use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use rule_engine::builtin::text::FindAndReplace;
use rule_engine::{FieldConfigError, RuleError, RuleRegistry, configure, parse_options};

#[test]
fn string_and_boolean_overrides_populate_fields() {
    let options = parse_options(&["find=foo", "regex=true"]).unwrap();
    let mut rule = FindAndReplace::default();
    configure(&mut rule, &options).unwrap();

    assert_eq!(rule.find, "foo");
    assert!(rule.regex);
    assert_eq!(rule.replace, "");
    assert!(rule.case_sensitive);
}

#[test]
fn unknown_keys_are_listed_and_nothing_is_applied() {
    let options = parse_options(&["find=foo", "colour=red", "bogus=1"]).unwrap();
    let mut rule = FindAndReplace::default();
    let err = configure(&mut rule, &options).unwrap_err();

    assert_eq!(
        err,
        FieldConfigError::UnknownFields {
            rule: FindAndReplace::ID.to_string(),
            keys: vec!["bogus".to_string(), "colour".to_string()],
        }
    );
    assert!(err.to_string().contains("bogus, colour"));
    assert_eq!(rule.find, "");
}

#[test]
fn selection_applies_options_or_fails_fatally() {
    let registry = RuleRegistry::with_builtins();
    let ok = registry.select(
        "rewrite.text.ExpandTabs",
        &parse_options(&["tabWidth=8"]).unwrap(),
    );
    assert!(ok.is_ok());

    let err = registry
        .select(
            "rewrite.text.ExpandTabs",
            &parse_options(&["tabWidth=eight"]).unwrap(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RuleError::FieldConfiguration(FieldConfigError::NotCoercible { ref field, .. })
            if field == "tabWidth"
    ));

    let none: BTreeMap<String, String> = BTreeMap::new();
    assert!(matches!(
        registry.select("org.example.Missing", &none),
        Err(RuleError::SelectionFailure { .. })
    ));
}
