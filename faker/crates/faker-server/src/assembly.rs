//! Turns SDL documents into an executable schema, either standalone or as an
//! extension of a remote schema.

mod build;
mod order;
mod prelude;
pub(crate) mod registry;
mod rules;
mod validation;

use async_graphql::dynamic::Schema;
use async_graphql_parser::types::ServiceDocument;

use crate::{proxy::Upstream, sdl::SdlDocument};

use self::{registry::Origin, validation::Diagnostics};

pub use validation::{ValidationError, ValidationErrors};

/// How the user SDL is turned into a schema. Chosen once at startup.
#[derive(Debug, Clone)]
pub enum BuildMode {
    /// The user SDL alone, every field faked.
    Local,
    /// The user SDL extends the remote one. Remote fields are proxied upstream.
    Overlay(Overlay),
}

#[derive(Debug, Clone)]
pub struct Overlay {
    pub remote: SdlDocument,
    pub upstream: Upstream,
}

impl BuildMode {
    pub fn remote(&self) -> Option<&SdlDocument> {
        match self {
            BuildMode::Local => None,
            BuildMode::Overlay(overlay) => Some(&overlay.remote),
        }
    }

    fn upstream(&self) -> Option<&Upstream> {
        match self {
            BuildMode::Local => None,
            BuildMode::Overlay(overlay) => Some(&overlay.upstream),
        }
    }
}

/// A schema ready to execute requests.
#[derive(Clone)]
pub struct AssembledSchema {
    schema: Schema,
}

impl AssembledSchema {
    pub async fn execute(&self, request: impl Into<async_graphql::Request>) -> async_graphql::Response {
        let request = request.into();
        let keys = order::root_response_keys(&request.query, request.operation_name.as_deref());

        let mut response = self.schema.execute(request).await;

        if let Some(keys) = keys {
            order::reorder(&mut response.data, &keys);
        }

        response
    }

    /// The schema printed back as SDL.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }
}

impl std::fmt::Debug for AssembledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledSchema").finish_non_exhaustive()
    }
}

/// Builds an executable schema from the user SDL. Every problem found is
/// reported at once, nothing is built unless there are none.
pub fn assemble(user: &SdlDocument, mode: &BuildMode) -> Result<AssembledSchema, ValidationErrors> {
    let prelude = prelude::prelude();
    let remote = mode.remote();

    let mut diagnostics = Diagnostics::new(prelude, remote, user);

    let sources = [
        Some((Origin::Prelude, prelude)),
        remote.map(|remote| (Origin::Remote, remote)),
        Some((Origin::User, user)),
    ];

    let mut parsed: Vec<(Origin, ServiceDocument)> = Vec::with_capacity(sources.len());

    for (origin, document) in sources.into_iter().flatten() {
        match async_graphql_parser::parse_schema(document.text()) {
            Ok(ast) => parsed.push((origin, ast)),
            Err(error) => match error.positions().next() {
                Some(pos) => diagnostics.push(syntax_message(&error), origin, pos),
                None => diagnostics.push_unlocated(syntax_message(&error)),
            },
        }
    }

    diagnostics.check()?;

    let documents: Vec<_> = parsed.iter().map(|(origin, ast)| (*origin, ast)).collect();
    let registry = registry::merge(&documents, &mut diagnostics);

    rules::validate(&registry, &mut diagnostics);
    diagnostics.check()?;

    let schema = build::build(registry, mode.upstream().cloned())
        .map_err(|error| ValidationErrors::from(ValidationError::new(error.0)))?;

    tracing::debug!("assembled schema from {}", user.name());

    Ok(AssembledSchema { schema })
}

fn syntax_message(error: &async_graphql_parser::Error) -> String {
    let message = error.to_string();
    let mut lines = message.lines().map(str::trim);

    // Parser messages carry their own source excerpt, keep only the summary line.
    let summary = lines
        .clone()
        .find_map(|line| line.strip_prefix("= "))
        .or_else(|| lines.find(|line| !line.is_empty()))
        .unwrap_or_default();

    format!("Syntax Error: {summary}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn user(text: &str) -> SdlDocument {
        SdlDocument::new(text, "schema.faker.graphql", "user SDL")
    }

    fn messages(errors: &ValidationErrors) -> Vec<&str> {
        errors.iter().map(ValidationError::message).collect()
    }

    #[test]
    fn local_schema_keeps_declaration_order() {
        let schema = assemble(
            &user(indoc! {r#"
                type Query {
                  users: [User!]! @listLength(min: 1, max: 3)
                  count: Int @examples(values: [1, 2])
                }

                type User {
                  id: ID!
                  name: String @fake(type: fullName)
                }
            "#}),
            &BuildMode::Local,
        )
        .unwrap();

        let sdl = schema.sdl();
        let query = sdl.find("type Query").unwrap();
        let users = sdl[query..].find("users").unwrap();
        let count = sdl[query..].find("count").unwrap();

        assert!(users < count);
        assert!(sdl.contains("type User"));
    }

    #[test]
    fn syntax_errors_are_reported_per_document() {
        let errors = assemble(&user("type Query {"), &BuildMode::Local).unwrap_err();

        assert_eq!(1, errors.len());
        assert!(errors.errors()[0].message().starts_with("Syntax Error:"));
        assert!(errors.errors()[0]
            .detail()
            .unwrap()
            .starts_with("schema.faker.graphql:1:"));
    }

    #[test]
    fn every_problem_is_collected() {
        let errors = assemble(
            &user(indoc! {r#"
                type Query {
                  a: Foo
                  b: Int @unknown
                }

                type Query {
                  c: Int
                }

                extend type Missing {
                  d: Int
                }
            "#}),
            &BuildMode::Local,
        )
        .unwrap_err();

        insta::assert_debug_snapshot!(messages(&errors), @r###"
        [
            "Type \"Query\" already exists in the schema. It cannot also be defined in this type definition.",
            "Cannot extend type \"Missing\" because it is not defined.",
            "Unknown type \"Foo\".",
            "Unknown directive \"@unknown\".",
        ]
        "###);
    }

    #[test]
    fn missing_query_root() {
        let errors = assemble(&user("type User { id: ID }"), &BuildMode::Local).unwrap_err();

        assert_eq!(vec!["Query root type must be provided."], messages(&errors));
    }

    #[test]
    fn reserved_names_are_rejected() {
        let errors = assemble(
            &user(indoc! {r#"
                directive @__hidden on FIELD_DEFINITION

                type Query {
                  a(__b: Int): Int
                  __c: Color
                }

                type __Secret {
                  b: Int
                }

                enum Color {
                  RED
                  __BLUE
                }
            "#}),
            &BuildMode::Local,
        )
        .unwrap_err();

        insta::assert_debug_snapshot!(messages(&errors), @r###"
        [
            "Name \"__hidden\" must not begin with \"__\", which is reserved by GraphQL introspection.",
            "Name \"__b\" must not begin with \"__\", which is reserved by GraphQL introspection.",
            "Name \"__c\" must not begin with \"__\", which is reserved by GraphQL introspection.",
            "Name \"__Secret\" must not begin with \"__\", which is reserved by GraphQL introspection.",
            "Name \"__BLUE\" must not begin with \"__\", which is reserved by GraphQL introspection.",
        ]
        "###);
    }

    #[test]
    fn invalid_fake_arguments() {
        let errors = assemble(
            &user(indoc! {r#"
                type Query {
                  a: String @fake(type: notAGenerator)
                  b: [Int] @listLength(min: 5, max: 1)
                  c: String @examples
                }
            "#}),
            &BuildMode::Local,
        )
        .unwrap_err();

        insta::assert_debug_snapshot!(messages(&errors), @r###"
        [
            "Invalid @fake type notAGenerator on Query.a, expected one of fake__Types.",
            "@listLength on Query.b has a min greater than its max.",
            "Directive \"@examples\" argument \"values\" of type \"[examples__JSON]!\" is required, but it was not provided.",
        ]
        "###);
    }

    #[test]
    fn input_and_output_positions() {
        let errors = assemble(
            &user(indoc! {r#"
                type Query {
                  search(filter: Result): Filter
                }

                input Filter {
                  term: String
                }

                type Result {
                  id: ID
                }
            "#}),
            &BuildMode::Local,
        )
        .unwrap_err();

        insta::assert_debug_snapshot!(messages(&errors), @r###"
        [
            "The type of Query.search must be Output Type but got: Filter.",
            "The type of Query.search(filter:) must be Input Type but got: Result.",
        ]
        "###);
    }

    #[test]
    fn interfaces_and_unions() {
        let errors = assemble(
            &user(indoc! {r#"
                type Query {
                  node: Node
                  result: SearchResult
                }

                interface Node {
                  id: ID!
                }

                type User implements Node {
                  name: String
                }

                union SearchResult = User | Node
            "#}),
            &BuildMode::Local,
        )
        .unwrap_err();

        insta::assert_debug_snapshot!(messages(&errors), @r###"
        [
            "Interface field Node.id expected but User does not provide it.",
            "Union type SearchResult can only include Object types, it cannot include interface Node.",
        ]
        "###);
    }
}
