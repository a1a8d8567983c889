use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use clap::Parser;
use faker_config::Config;
use faker_server::{proxy::ProxyError, ServerConfig, Upstream};
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt as _, registry::LookupSpan, util::SubscriberInitExt as _, EnvFilter, Layer};
use url::Url;

mod log;

use self::log::{LogLevel, LogStyle};

const DEFAULT_PORT: u16 = 9002;
const DEFAULT_SDL_FILE: &str = "./schema.faker.graphql";
const DEFAULT_EXTENSION_SDL_FILE: &str = "./schema_extension.faker.graphql";
const DEFAULT_FEATURES_DIR: &str = "./features";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

#[derive(Debug, Parser)]
#[command(name = "graphql-faker", version)]
/// Serves a fake GraphQL API from an SDL template and the fixtures of a test case
pub(crate) struct Args {
    /// Path to the file with the user SDL. It is written at startup, and every time the editor saves.
    /// Defaults to ./schema.faker.graphql, or ./schema_extension.faker.graphql when extending.
    #[arg(value_name = "SDL_FILE")]
    sdl_file: Option<PathBuf>,
    /// HTTP port. Defaults to 9002.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
    /// IP address on which the server listens. Defaults to 127.0.0.1.
    #[arg(long)]
    listen_address: Option<IpAddr>,
    /// Open the SDL editor in a browser
    #[arg(short, long)]
    open: bool,
    /// The value of the Access-Control-Allow-Origin header. By default the `Origin` header of the request is sent back.
    #[arg(long, visible_alias = "co", value_name = "ORIGIN")]
    cors_origin: Option<Url>,
    /// URL of an existing GraphQL server to extend
    #[arg(short, long, value_name = "URL")]
    extend: Option<Url>,
    /// A header sent to the extended server, written as `Name: value`. Can be repeated.
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    headers: Vec<(String, String)>,
    /// The feature whose main.graphql is served
    #[arg(long)]
    feature: Option<String>,
    /// The test case whose fixtures are substituted into the feature SDL
    #[arg(long, default_value = "1")]
    test_case: String,
    /// Directory holding one directory per feature. Defaults to ./features.
    #[arg(long, env = "FAKER_FEATURES_DIR")]
    features_dir: Option<PathBuf>,
    /// Directory with the static files of the SDL editor, served under /editor
    #[arg(long)]
    editor_dir: Option<PathBuf>,
    /// Path to the TOML configuration file
    #[arg(short, long, env = "FAKER_CONFIG_PATH")]
    config: Option<PathBuf>,
    /// Set the logging level
    #[arg(long = "log", env = "FAKER_LOG", value_enum, default_value = "info")]
    log_level: LogLevel,
    /// Set the style of log output
    #[arg(long, env = "FAKER_LOG_STYLE", value_enum, default_value = "text")]
    log_style: LogStyle,
}

pub(crate) fn parse() -> Args {
    Args::parse()
}

fn parse_header(header: &str) -> Result<(String, String), String> {
    match header.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_owned(), value.trim().to_owned())),
        _ => Err(format!("expected `Name: value`, got `{header}`")),
    }
}

impl Args {
    pub(crate) fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    /// Empty when no feature was given, which the fixture loader rejects.
    pub(crate) fn feature(&self) -> &str {
        self.feature.as_deref().unwrap_or_default()
    }

    pub(crate) fn test_case(&self) -> &str {
        &self.test_case
    }

    pub(crate) fn open_browser(&self) -> bool {
        self.open
    }

    /// The backing file of the user SDL, and whether it is the default one.
    pub(crate) fn sdl_file(&self, extending: bool) -> (PathBuf, bool) {
        match &self.sdl_file {
            Some(path) => (path.clone(), false),
            None if extending => (PathBuf::from(DEFAULT_EXTENSION_SDL_FILE), true),
            None => (PathBuf::from(DEFAULT_SDL_FILE), true),
        }
    }

    pub(crate) fn features_dir(&self, config: &Config) -> PathBuf {
        self.features_dir
            .clone()
            .or_else(|| config.paths.features.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FEATURES_DIR))
    }

    /// The upstream to extend. Headers from the configuration go first, the
    /// ones from the command line are appended.
    pub(crate) fn upstream(&self, config: &Config) -> Result<Option<Upstream>, ProxyError> {
        let url = self
            .extend
            .clone()
            .or_else(|| config.upstream.as_ref().map(|upstream| upstream.url.clone()));

        let Some(url) = url else {
            return Ok(None);
        };

        let configured = config
            .upstream
            .iter()
            .flat_map(|upstream| upstream.headers.iter())
            .map(|(name, value)| (name.as_str(), value.as_str()));

        let given = self.headers.iter().map(|(name, value)| (name.as_str(), value.as_str()));

        Upstream::new(url, configured.chain(given)).map(Some)
    }

    /// Flags win over the configuration file. A port or an address on the
    /// command line replaces the configured socket address as a whole.
    pub(crate) fn listen_address(&self, config: &Config) -> SocketAddr {
        if self.port.is_none() && self.listen_address.is_none() {
            if let Some(address) = config.network.listen_address {
                return address;
            }
        }

        SocketAddr::new(
            self.listen_address.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    pub(crate) fn server_config(&self, config: &Config) -> ServerConfig {
        let cors = config.cors.clone().unwrap_or_default();

        ServerConfig {
            listen_address: self.listen_address(config),
            cors_origin: self.cors_origin.clone().or(cors.origin),
            cors_allow_credentials: cors.allow_credentials,
            editor_dir: self.editor_dir.clone().or_else(|| config.paths.editor.clone()),
        }
    }

    pub(crate) fn log_format<S>(&self) -> BoxedLayer<S>
    where
        S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        let layer = tracing_subscriber::fmt::layer();

        match self.log_style {
            // for interactive terminals we provide colored output
            LogStyle::Text if atty::is(atty::Stream::Stdout) => layer.with_ansi(true).boxed(),
            // for server logs, colors are off
            LogStyle::Text => layer.with_ansi(false).boxed(),
            LogStyle::Json => layer.json().boxed(),
        }
    }

    pub(crate) fn init_logging(&self) {
        let filter = EnvFilter::new(self.log_level.as_filter_string());

        tracing_subscriber::registry().with(self.log_format()).with(filter).init();
    }
}
