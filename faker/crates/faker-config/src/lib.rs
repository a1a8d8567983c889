//! Configuration for the GraphQL faker server, loaded from an optional TOML file.
//!
//! Every key is optional. Values given on the command line take precedence over
//! the values in this file.

pub mod cors;

use std::{
    collections::BTreeMap,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

pub use cors::*;
use url::Url;

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Configuration struct for the faker server.
pub struct Config {
    /// Server bind settings
    pub network: NetworkConfig,
    /// Where features and editor assets live on disk
    pub paths: PathsConfig,
    /// Cross-origin resource sharing settings
    pub cors: Option<CorsConfig>,
    /// The upstream GraphQL service to extend, if any
    pub upstream: Option<UpstreamConfig>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub listen_address: Option<SocketAddr>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root directory holding one directory per feature.
    pub features: Option<PathBuf>,
    /// Directory with the static SDL editor assets.
    pub editor: Option<PathBuf>,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// The GraphQL endpoint to introspect and proxy to.
    pub url: Url,
    /// Headers sent with every upstream request, introspection included.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Loads the configuration from `path`, or the defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(None, config.network.listen_address);
        assert_eq!(None, config.paths.features);
        assert_eq!(None, config.paths.editor);
        assert!(config.cors.is_none());
        assert!(config.upstream.is_none());
    }

    #[test]
    fn network_ipv4() {
        let input = indoc! {r#"
            [network]
            listen_address = "0.0.0.0:9002"
        "#};

        let config: Config = toml::from_str(input).unwrap();
        let expected = Some(SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 9002));

        assert_eq!(expected, config.network.listen_address);
    }

    #[test]
    fn network_ipv6() {
        let input = indoc! {r#"
            [network]
            listen_address = "[::1]:9002"
        "#};

        let config: Config = toml::from_str(input).unwrap();

        let expected = Some(SocketAddr::new(
            std::net::IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1)),
            9002,
        ));

        assert_eq!(expected, config.network.listen_address);
    }

    #[test]
    fn paths() {
        let input = indoc! {r#"
            [paths]
            features = "./tests/features"
            editor = "/srv/editor"
        "#};

        let config: Config = toml::from_str(input).unwrap();

        assert_eq!(Some(PathBuf::from("./tests/features")), config.paths.features);
        assert_eq!(Some(PathBuf::from("/srv/editor")), config.paths.editor);
    }

    #[test]
    fn upstream_with_headers() {
        let input = indoc! {r#"
            [upstream]
            url = "https://countries.trevorblades.com/"
            headers = { Authorization = "Bearer secret", "X-Trace" = "1" }
        "#};

        let config: Config = toml::from_str(input).unwrap();
        let upstream = config.upstream.unwrap();

        assert_eq!("https://countries.trevorblades.com/", upstream.url.as_str());
        assert_eq!(Some("Bearer secret"), upstream.headers.get("Authorization").map(String::as_str));
        assert_eq!(Some("1"), upstream.headers.get("X-Trace").map(String::as_str));
    }

    #[test]
    fn upstream_requires_url() {
        let input = indoc! {r#"
            [upstream]
            headers = { Authorization = "Bearer secret" }
        "#};

        let error = toml::from_str::<Config>(input).unwrap_err();

        assert!(error.to_string().contains("missing field `url`"), "{error}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let input = indoc! {r#"
            [network]
            port = 4000
        "#};

        assert!(toml::from_str::<Config>(input).is_err());
    }

    #[test]
    fn load_without_path_gives_defaults() {
        let config = Config::load(None).unwrap();

        assert!(config.upstream.is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faker.toml");

        fs::write(&path, "[cors]\norigin = \"http://localhost:3000\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        let origin = config.cors.and_then(|cors| cors.origin).unwrap();

        assert_eq!("http://localhost:3000/", origin.as_str());
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let error = Config::load(Some(&path)).unwrap_err();

        assert!(matches!(error, ConfigError::Read { .. }));
    }

    #[test]
    fn load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faker.toml");

        fs::write(&path, "[network\n").unwrap();

        let error = Config::load(Some(&path)).unwrap_err();

        assert!(matches!(error, ConfigError::Parse { .. }));
    }
}
