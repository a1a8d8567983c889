use std::sync::OnceLock;

use crate::{fake::FAKE_TYPES, sdl::SdlDocument};

pub(crate) const PRELUDE_NAME: &str = "fake definitions";

const DEFINITIONS: &str = r#"
"Attach example values to a field or scalar. One of the values is picked at random for every response."
directive @examples(values: [examples__JSON]!) on FIELD_DEFINITION | SCALAR

"Generate a value with one of the built-in fake data generators."
directive @fake(type: fake__Types!) on FIELD_DEFINITION | SCALAR

"Control how many items a faked list holds."
directive @listLength(min: Int!, max: Int!) on FIELD_DEFINITION

directive @deprecated(reason: String = "No longer supported") on FIELD_DEFINITION | ARGUMENT_DEFINITION | INPUT_FIELD_DEFINITION | ENUM_VALUE

directive @specifiedBy(url: String!) on SCALAR

directive @oneOf on INPUT_OBJECT

"Any JSON value, written as a GraphQL literal."
scalar examples__JSON
"#;

/// The directives and types every user SDL can use without declaring them.
pub(crate) fn prelude() -> &'static SdlDocument {
    static PRELUDE: OnceLock<SdlDocument> = OnceLock::new();

    PRELUDE.get_or_init(|| {
        let mut text = String::from(DEFINITIONS);

        text.push_str("\nenum fake__Types {\n");
        for fake_type in FAKE_TYPES {
            text.push_str("  ");
            text.push_str(fake_type);
            text.push('\n');
        }
        text.push_str("}\n");

        SdlDocument::new(text, PRELUDE_NAME, "built-in fake definitions")
    })
}
