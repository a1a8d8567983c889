use url::Url;

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// The value of `Access-Control-Allow-Origin`. If not defined, the origin
    /// of the request is mirrored back.
    #[serde(default)]
    pub origin: Option<Url>,
    /// If true (or not defined), credentials are allowed in requests
    #[serde(default = "allow_credentials_default")]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: None,
            allow_credentials: allow_credentials_default(),
        }
    }
}

fn allow_credentials_default() -> bool {
    true
}
