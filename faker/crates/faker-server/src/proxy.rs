//! Forwarding of remote root fields to the upstream service.

use std::fmt::Write as _;

use async_graphql::SelectionField;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::assembly::registry::{named_type, Origin, Registry};

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid upstream header name '{0}'")]
    HeaderName(String),
    #[error("invalid value for upstream header '{0}'")]
    HeaderValue(String),
    #[error("could not reach the upstream service: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream service responded with status {0}")]
    Status(http::StatusCode),
    #[error("{0}")]
    Upstream(String),
}

/// The live GraphQL service an overlay schema extends.
#[derive(Debug, Clone)]
pub struct Upstream {
    url: Url,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl Upstream {
    /// Creates an upstream sending `headers` with every request, introspection included.
    pub fn new<'a>(url: Url, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, ProxyError> {
        let mut header_map = HeaderMap::new();

        for (name, value) in headers {
            let header_name =
                HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| ProxyError::HeaderName(name.to_owned()))?;
            let header_value =
                HeaderValue::from_str(value.trim()).map_err(|_| ProxyError::HeaderValue(name.to_owned()))?;

            header_map.append(header_name, header_value);
        }

        Ok(Self {
            url,
            headers: header_map,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub(crate) fn request(&self) -> reqwest::RequestBuilder {
        self.client.post(self.url.clone()).headers(self.headers.clone())
    }

    /// Runs a document upstream and returns its `data` object.
    pub(crate) async fn execute(&self, document: &str) -> Result<Map<String, Value>, ProxyError> {
        tracing::debug!(url = %self.url, "proxying: {document}");

        let response = self
            .request()
            .json(&serde_json::json!({ "query": document }))
            .send()
            .await?;

        let status = response.status();
        let body: UpstreamResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(ProxyError::Status(status)),
            Err(error) => return Err(error.into()),
        };

        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|error| error.message).collect();
            return Err(ProxyError::Upstream(messages.join("\n")));
        }

        Ok(body.data.unwrap_or_default())
    }
}

#[derive(Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Vec<UpstreamError>,
}

#[derive(Deserialize)]
struct UpstreamError {
    message: String,
}

/// Prints a root field selection as a standalone upstream operation.
///
/// Fields added by the user SDL are left out since the upstream does not know
/// them. Abstract selections always carry `__typename` so the response can be
/// mapped back onto a concrete type.
pub(crate) fn print_operation(
    registry: &Registry,
    operation: &str,
    root_type: &str,
    field: &SelectionField<'_>,
) -> async_graphql::Result<String> {
    let mut document = String::from(operation);
    document.push_str(" {");

    print_field(registry, root_type, field, &mut document)?;

    document.push_str(" }");
    Ok(document)
}

fn print_field(
    registry: &Registry,
    parent_type: &str,
    field: &SelectionField<'_>,
    out: &mut String,
) -> async_graphql::Result<()> {
    out.push(' ');

    if let Some(alias) = field.alias() {
        let _ = write!(out, "{alias}: ");
    }

    out.push_str(field.name());

    let arguments = field.arguments()?;

    if !arguments.is_empty() {
        out.push('(');

        for (i, (name, value)) in arguments.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }

            let _ = write!(out, "{name}: {value}");
        }

        out.push(')');
    }

    let Some(definition) = registry
        .types
        .get(parent_type)
        .and_then(|ty| ty.field(field.name()))
    else {
        return Ok(());
    };

    let field_type = named_type(&definition.ty.node);

    match registry.types.get(field_type) {
        Some(ty) if !ty.kind.is_leaf() => {
            out.push_str(" {");
            print_selection_set(registry, field_type, ty.kind.is_abstract(), field, out)?;
            out.push_str(" }");
        }
        _ => (),
    }

    Ok(())
}

fn print_selection_set(
    registry: &Registry,
    type_name: &str,
    is_abstract: bool,
    field: &SelectionField<'_>,
    out: &mut String,
) -> async_graphql::Result<()> {
    if is_abstract {
        out.push_str(" __typename");
    }

    for selection in field.selection_set() {
        if selection.name() == "__typename" {
            if !is_abstract {
                print_field(registry, type_name, &selection, out)?;
            }
            continue;
        }

        let owner = registry.types.get(type_name).and_then(|ty| ty.field(selection.name()));

        match owner {
            Some(definition) if definition.origin == Origin::User => (),
            Some(_) => print_field(registry, type_name, &selection, out)?,
            // Selected through a fragment on one of the possible types.
            None if is_abstract => {
                for member in registry.possible_types(type_name) {
                    let remote = registry
                        .types
                        .get(member)
                        .and_then(|ty| ty.field(selection.name()))
                        .is_some_and(|definition| definition.origin != Origin::User);

                    if remote {
                        let _ = write!(out, " ... on {member} {{");
                        print_field(registry, member, &selection, out)?;
                        out.push_str(" }");
                    }
                }
            }
            None => (),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_validated() {
        let url = Url::parse("http://localhost:4000/graphql").unwrap();

        let upstream = Upstream::new(url.clone(), [("Authorization", " Bearer x ")]).unwrap();
        assert_eq!("Bearer x", upstream.headers["authorization"].to_str().unwrap());

        let error = Upstream::new(url, [("Bad Header", "x")]).unwrap_err();
        assert_eq!("invalid upstream header name 'Bad Header'", error.to_string());
    }
}
