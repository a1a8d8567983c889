//! Placeholder substitution for SDL templates.
//!
//! A template refers to fixture values with `$name` tokens. Every token with a
//! matching fixture is replaced by the value written as a GraphQL literal, so it
//! can stand wherever SDL accepts a constant value, such as directive arguments
//! and default values.

use std::fmt::Write as _;

use serde_json::Value;

use crate::{fixtures::FixtureMap, sdl::SdlDocument};

/// Replaces all `$name` placeholders in `template` with the matching fixture values.
///
/// Placeholders are replaced longest name first, so a fixture named `id` never
/// eats into a `$identifier` token. Placeholders without a fixture are left as they are.
pub fn substitute(template: &str, fixtures: &FixtureMap) -> String {
    let mut names: Vec<(&str, &Value)> = fixtures.iter().collect();
    names.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));

    let mut text = template.to_owned();

    for (name, value) in names {
        let placeholder = format!("${name}");

        if text.contains(&placeholder) {
            text = text.replace(&placeholder, &render(value));
        }
    }

    text
}

/// Substitutes the fixtures into the template and names the result after its backing file.
pub fn substitute_document(template: &str, fixtures: &FixtureMap, backing_file: &str) -> SdlDocument {
    SdlDocument::new(substitute(template, fixtures), backing_file, "user SDL")
}

/// Writes a JSON value as a GraphQL constant: compact JSON where object keys are bare names.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');

            for (i, (key, value)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }

                out.push_str(key);
                out.push(':');
                write_value(value, out);
            }

            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');

            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }

                write_value(item, out);
            }

            out.push(']');
        }
        // Scalars are written exactly as JSON writes them, strings keep their quotes.
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use serde_json::json;

    fn fixtures(value: Value) -> FixtureMap {
        match value {
            Value::Object(map) => FixtureMap::from(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn object_keys_are_unquoted() {
        let template = "type Query { a: A @examples(values: [$name]) }";
        let result = substitute(template, &fixtures(json!({"name": {"a": 1, "b": "x"}})));

        assert_eq!(r#"type Query { a: A @examples(values: [{a:1,b:"x"}]) }"#, result);
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let template = "$v $v and $v";
        let result = substitute(template, &fixtures(json!({"v": 42})));

        assert_eq!("42 42 and 42", result);
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        let template = "a: Int @examples(values: [$unknown, $known])";
        let result = substitute(template, &fixtures(json!({"known": 7, "unused": true})));

        assert_eq!("a: Int @examples(values: [$unknown, 7])", result);
    }

    #[test]
    fn longer_names_win_over_prefixes() {
        let template = "$id $identifier";
        let result = substitute(template, &fixtures(json!({"id": 1, "identifier": "abc"})));

        assert_eq!(r#"1 "abc""#, result);
    }

    #[test]
    fn nested_values() {
        let value = json!({
            "user": {"name": "Ada", "tags": ["a", "b"], "address": {"zip": null, "primary": true}},
            "score": 1.5
        });

        insta::assert_snapshot!(
            render(&value),
            @r#"{user:{name:"Ada",tags:["a","b"],address:{zip:null,primary:true}},score:1.5}"#
        );
    }

    #[test]
    fn string_values_keep_their_quotes() {
        let value = json!({"label": "key\":value"});

        assert_eq!(r#"{label:"key\":value"}"#, render(&value));
    }

    #[test]
    fn substitution_produces_parseable_sdl() {
        let template = indoc! {r#"
            type Query {
              order: Order @examples(values: [$order])
              total: Float @examples(values: $totals)
            }

            type Order {
              id: ID
              lines: [String]
            }
        "#};

        let result = substitute(
            template,
            &fixtures(json!({
                "order": {"id": "o-1", "lines": ["apple", "pear"]},
                "totals": [1.25, 3]
            })),
        );

        assert!(result.contains(r#"@examples(values: [{id:"o-1",lines:["apple","pear"]}])"#));
        assert!(async_graphql_parser::parse_schema(&result).is_ok());
    }

    #[test]
    fn document_is_named_after_backing_file() {
        let document = substitute_document("type Query { a: Int }", &FixtureMap::default(), "schema.faker.graphql");

        assert_eq!("schema.faker.graphql", document.name());
        assert_eq!("type Query { a: Int }", document.text());
    }
}
