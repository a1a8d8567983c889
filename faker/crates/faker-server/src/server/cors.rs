use http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use url::Url;

/// Allows the configured origin, or echoes back whatever origin the request comes from.
pub(super) fn generate(origin: Option<&Url>, allow_credentials: bool) -> crate::Result<CorsLayer> {
    let allow_origin = match origin {
        Some(url) => {
            let origin = url.as_str();
            let origin = origin.strip_suffix('/').unwrap_or(origin);

            let value = HeaderValue::from_str(origin).map_err(|_| crate::Error::CorsOrigin(origin.to_owned()))?;

            AllowOrigin::exact(value)
        }
        None => AllowOrigin::mirror_request(),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request()))
}
