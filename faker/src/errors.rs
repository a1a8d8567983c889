use std::io;

use faker_config::ConfigError;
use faker_server::{
    introspection::IntrospectionError, proxy::ProxyError, FixtureError, ReloadError, ToExitCode, ValidationErrors,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum FakerError {
    /// the configuration file could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// returned if the tokio runtime cannot be built
    #[error("could not start the runtime: {0}")]
    Runtime(#[source] io::Error),
    /// wraps an error originating in the server crate
    #[error(transparent)]
    Server(#[from] faker_server::Error),
}

impl From<FixtureError> for FakerError {
    fn from(error: FixtureError) -> Self {
        Self::Server(error.into())
    }
}

impl From<IntrospectionError> for FakerError {
    fn from(error: IntrospectionError) -> Self {
        Self::Server(error.into())
    }
}

impl From<ProxyError> for FakerError {
    fn from(error: ProxyError) -> Self {
        Self::Server(error.into())
    }
}

impl From<ReloadError> for FakerError {
    fn from(error: ReloadError) -> Self {
        Self::Server(error.into())
    }
}

impl ToExitCode for FakerError {
    fn to_exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exitcode::CONFIG,
            Self::Runtime(_) => exitcode::OSERR,
            Self::Server(inner) => inner.to_exit_code(),
        }
    }
}

impl FakerError {
    /// The schema problems, when the error is that the initial SDL does not assemble.
    pub(crate) fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Server(faker_server::Error::Validation(errors)) => Some(errors),
            _ => None,
        }
    }

    /// returns the appropriate hint for a [`FakerError`]
    pub(crate) fn to_hint(&self) -> Option<String> {
        match self {
            Self::Server(faker_server::Error::Fixture(FixtureError::MissingFeature)) => {
                Some("pass --feature with the name of a directory below the features directory".to_owned())
            }
            Self::Server(faker_server::Error::Fixture(FixtureError::Read { .. })) => {
                Some("check the --features-dir, --feature and --test-case arguments".to_owned())
            }
            Self::Server(faker_server::Error::Introspection(_)) => {
                Some("make sure the server given with --extend is running and accepts introspection".to_owned())
            }
            Self::Server(faker_server::Error::Bind { .. }) => {
                Some("try a different --port, or stop the process already listening on it".to_owned())
            }
            _ => None,
        }
    }
}
