#![allow(unused_crate_dependencies)]

use std::{sync::Arc, time::Duration};

use async_graphql::PathSegment;
use cynic::QueryBuilder;
use cynic_introspection::IntrospectionQuery;
use faker_server::{assemble, introspect, BuildMode, Overlay, ReloadError, SdlDocument, Session, Upstream};
use indoc::indoc;
use serde_json::{json, Value};
use url::Url;
use wiremock::{
    matchers::{body_string_contains, header, method},
    Mock, MockServer, ResponseTemplate,
};

const REMOTE_SDL: &str = indoc! {r#"
    type Query {
      user(id: ID!): User
      hello: String
    }

    type User {
      id: ID!
      name: String
    }
"#};

const EXTENSION_SDL: &str = indoc! {r#"
    extend type User {
      nickname: String @examples(values: ["ace"])
    }

    extend type Query {
      banner: String @examples(values: ["hi"])
    }
"#};

fn user(text: &str) -> SdlDocument {
    SdlDocument::new(text, "schema_extension.faker.graphql", "user SDL")
}

/// The introspection response a server running `sdl` would send.
async fn introspection_response(sdl: &str) -> Value {
    let document = SdlDocument::new(sdl, "upstream.graphql", "upstream SDL");
    let schema = assemble(&document, &BuildMode::Local).unwrap();

    let operation = IntrospectionQuery::build(());
    let response = schema.execute(operation.query.as_str()).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);

    serde_json::to_value(response).unwrap()
}

async fn upstream_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer token"))
        .and(body_string_contains("__schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(introspection_response(REMOTE_SDL).await))
        .mount(&server)
        .await;

    server
}

fn upstream(server: &MockServer) -> Upstream {
    let url = Url::parse(&server.uri()).unwrap();
    Upstream::new(url, [("Authorization", "Bearer token")]).unwrap()
}

async fn overlay(server: &MockServer) -> BuildMode {
    let upstream = upstream(server);
    let remote = introspect(&upstream).await.unwrap();

    BuildMode::Overlay(Overlay { remote, upstream })
}

#[tokio::test]
async fn introspection_produces_the_remote_sdl() {
    let server = upstream_server().await;
    let upstream = upstream(&server);

    let remote = introspect(&upstream).await.unwrap();

    assert_eq!(format!("Introspection from \"{}\"", upstream.url()), remote.name());
    assert_eq!("remote SDL", remote.description());
    assert!(remote.text().contains("type User"), "{}", remote.text());
    assert!(remote.text().contains("user(id: ID!): User"), "{}", remote.text());
}

#[tokio::test]
async fn introspection_fails_on_an_unreachable_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = introspect(&upstream(&server)).await.unwrap_err();

    assert!(error.to_string().starts_with("could not reach"), "{error}");
}

#[tokio::test]
async fn remote_fields_are_proxied_and_overlay_fields_faked() {
    let server = upstream_server().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer token"))
        .and(body_string_contains("user(id:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "user": { "id": "1", "name": "Ada" } }
        })).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let schema = assemble(&user(EXTENSION_SDL), &overlay(&server).await).unwrap();
    let response = schema.execute(r#"{ user(id: "1") { id name nickname } banner }"#).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);

    insta::assert_json_snapshot!(response.data.into_json().unwrap(), @r###"
    {
      "user": {
        "id": "1",
        "name": "Ada",
        "nickname": "ace"
      },
      "banner": "hi"
    }
    "###);

    let proxied: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|request| request.body_json::<Value>().ok())
        .filter_map(|body| body["query"].as_str().map(str::to_owned))
        .filter(|query| query.starts_with("query { user"))
        .collect();

    assert_eq!(vec![r#"query { user(id: "1") { id name } }"#.to_owned()], proxied);
}

#[tokio::test]
async fn upstream_errors_become_field_errors() {
    let server = upstream_server().await;

    Mock::given(method("POST"))
        .and(body_string_contains("hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "upstream is sleeping" }]
        })))
        .mount(&server)
        .await;

    let schema = assemble(&user(EXTENSION_SDL), &overlay(&server).await).unwrap();
    let response = schema.execute("{ hello banner }").await;

    assert_eq!(1, response.errors.len());
    assert_eq!("upstream is sleeping", response.errors[0].message);
    assert_eq!(vec![PathSegment::Field("hello".to_owned())], response.errors[0].path);
    assert_eq!(json!({"hello": null, "banner": "hi"}), response.data.into_json().unwrap());
}

#[tokio::test]
async fn remote_definitions_cannot_be_redefined() {
    let server = upstream_server().await;

    let document = user(indoc! {r#"
        type User {
          id: ID!
        }

        extend type User {
          name: String
        }

        extend type Account {
          id: ID!
        }
    "#});

    let errors = assemble(&document, &overlay(&server).await).unwrap_err();
    let messages: Vec<_> = errors.iter().map(|error| error.message()).collect();

    insta::assert_debug_snapshot!(messages, @r###"
    [
        "Type \"User\" already exists in the schema. It cannot also be defined in this type definition.",
        "Field \"User.name\" already exists in the schema. It cannot also be defined in this type extension.",
        "Cannot extend type \"Account\" because it is not defined.",
    ]
    "###);
}

async fn overlay_session(server: &MockServer, dir: &tempfile::TempDir) -> Session {
    let backing_file = dir.path().join("schema_extension.faker.graphql");
    let document = SdlDocument::new(EXTENSION_SDL, backing_file.display().to_string(), "user SDL");

    Session::start(overlay(server).await, document, backing_file).await.unwrap()
}

#[tokio::test]
async fn overlay_snapshot_carries_the_remote_sdl() {
    let server = upstream_server().await;
    let dir = tempfile::tempdir().unwrap();
    let session = overlay_session(&server, &dir).await;

    let remote = session.mode().remote().unwrap().text().to_owned();
    let snapshot = serde_json::to_value(session.sdl_snapshot()).unwrap();

    assert!(remote.contains("type User"), "{remote}");
    assert_eq!(json!({"userSDL": EXTENSION_SDL, "remoteSDL": remote}), snapshot);
}

#[tokio::test]
async fn overlay_reload_adds_a_field() {
    let server = upstream_server().await;
    let dir = tempfile::tempdir().unwrap();
    let session = overlay_session(&server, &dir).await;
    let remote = session.sdl_snapshot().remote_sdl;

    let replacement = indoc! {r#"
        extend type Query {
          banner: String @examples(values: ["hi"])
          motd: String @examples(values: ["welcome"])
        }
    "#};

    let before = session.handle_query("{ motd }".into()).await;
    assert_eq!(1, before.errors.len());

    session.replace_user_sdl(replacement).await.unwrap();

    let response = session.handle_query("{ banner motd }".into()).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(json!({"banner": "hi", "motd": "welcome"}), response.data.into_json().unwrap());
    assert_eq!(replacement, session.sdl_snapshot().user_sdl);
    assert_eq!(remote, session.sdl_snapshot().remote_sdl);
    assert_eq!(replacement, std::fs::read_to_string(session.backing_file()).unwrap());
}

#[tokio::test]
async fn overlay_reload_rejects_a_redefined_remote_field() {
    let server = upstream_server().await;
    let dir = tempfile::tempdir().unwrap();
    let session = overlay_session(&server, &dir).await;

    let before = session.current();
    let snapshot = serde_json::to_value(session.sdl_snapshot()).unwrap();

    let error = session
        .replace_user_sdl("extend type User { name: String }")
        .await
        .unwrap_err();

    let ReloadError::Validation(errors) = &error else {
        unreachable!("expected a validation error, got {error:?}");
    };

    assert_eq!(
        "Field \"User.name\" already exists in the schema. It cannot also be defined in this type extension.",
        errors.errors()[0].message()
    );
    assert!(Arc::ptr_eq(&before, &session.current()));
    assert_eq!(snapshot, serde_json::to_value(session.sdl_snapshot()).unwrap());
    assert_eq!(EXTENSION_SDL, std::fs::read_to_string(session.backing_file()).unwrap());

    let response = session.handle_query("{ banner }".into()).await;
    assert_eq!(json!({"banner": "hi"}), response.data.into_json().unwrap());
}
