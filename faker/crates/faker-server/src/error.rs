use std::{io, net::SocketAddr, path::PathBuf};

use crate::{
    assembly::ValidationErrors, fixtures::FixtureError, introspection::IntrospectionError, proxy::ProxyError,
    session::ReloadError,
};

/// Errors that stop the server from starting or keep it from serving.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The template or fixtures of the selected feature could not be loaded
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    /// The upstream schema could not be fetched
    #[error(transparent)]
    Introspection(#[from] IntrospectionError),
    /// The upstream settings are unusable
    #[error(transparent)]
    Upstream(#[from] ProxyError),
    /// The initial SDL does not assemble into a schema
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    /// The initial SDL could not be written to its backing file
    #[error("could not write the schema to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid CORS origin '{0}'")]
    CorsOrigin(String),
    /// Cannot listen on the requested address
    #[error("binding to {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// The HTTP server stopped with an error
    #[error("serving requests: {0}")]
    Server(#[source] io::Error),
}

impl From<ReloadError> for Error {
    fn from(error: ReloadError) -> Self {
        match error {
            ReloadError::Validation(errors) => Self::Validation(errors),
            ReloadError::Persist { path, source } => Self::Persist { path, source },
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Maps an error to the process exit code it should end the process with.
pub trait ToExitCode {
    fn to_exit_code(&self) -> i32;
}

impl ToExitCode for Error {
    fn to_exit_code(&self) -> i32 {
        match self {
            Self::Fixture(error) if error.is_missing_input() => exitcode::NOINPUT,
            Self::Fixture(_) | Self::Validation(_) => exitcode::DATAERR,
            Self::Introspection(_) => exitcode::UNAVAILABLE,
            Self::Upstream(_) | Self::CorsOrigin(_) => exitcode::CONFIG,
            Self::Persist { .. } => exitcode::CANTCREAT,
            Self::Bind { .. } | Self::Server(_) => exitcode::OSERR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::ValidationError;

    #[test]
    fn exit_codes() {
        let missing = Error::from(FixtureError::MissingFeature);
        assert_eq!(exitcode::NOINPUT, missing.to_exit_code());

        let not_an_object = Error::from(FixtureError::NotAnObject { path: "1.json".into() });
        assert_eq!(exitcode::DATAERR, not_an_object.to_exit_code());

        let invalid = Error::from(ValidationErrors::from(ValidationError::new("Unknown type \"Foo\".")));
        assert_eq!(exitcode::DATAERR, invalid.to_exit_code());

        let persist = Error::from(ReloadError::Persist {
            path: "schema.faker.graphql".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        });
        assert_eq!(exitcode::CANTCREAT, persist.to_exit_code());
    }
}
