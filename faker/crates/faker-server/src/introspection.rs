use cynic::{GraphQlResponse, QueryBuilder};
use cynic_introspection::{IntrospectionQuery, SchemaError};

use crate::{proxy::Upstream, sdl::SdlDocument};

#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("could not reach {url}: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("introspection of {url} failed: {message}")]
    Response { url: String, message: String },
    #[error("introspection of {url} returned an invalid schema: {source}")]
    Schema { url: String, source: SchemaError },
}

/// Fetches the upstream schema with the standard introspection query and prints it as SDL.
pub async fn introspect(upstream: &Upstream) -> Result<SdlDocument, IntrospectionError> {
    let url = upstream.url().to_string();
    let operation = IntrospectionQuery::build(());

    tracing::debug!("introspecting {url}");

    let request = |source| IntrospectionError::Request {
        url: url.clone(),
        source,
    };

    let response = upstream
        .request()
        .json(&operation)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(request)?;

    let response: GraphQlResponse<IntrospectionQuery> = response.json().await.map_err(request)?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let message = errors
            .into_iter()
            .map(|error| error.message)
            .collect::<Vec<_>>()
            .join(", ");

        return Err(IntrospectionError::Response { url, message });
    }

    let Some(data) = response.data else {
        return Err(IntrospectionError::Response {
            url,
            message: "the response carried no data".to_owned(),
        });
    };

    let schema = data.into_schema().map_err(|source| IntrospectionError::Schema {
        url: url.clone(),
        source,
    })?;

    tracing::info!("loaded the remote schema from {url}");

    Ok(SdlDocument::new(
        schema.to_sdl(),
        format!("Introspection from \"{url}\""),
        "remote SDL",
    ))
}
