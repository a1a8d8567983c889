//! Serves a fake GraphQL API built from an SDL template and test case fixtures,
//! either standalone or layered over a live upstream service.

#![cfg_attr(test, allow(unused_crate_dependencies))]
#![deny(clippy::future_not_send)]

pub mod assembly;
mod error;
mod fake;
pub mod fixtures;
pub mod introspection;
pub mod proxy;
pub mod report;
pub mod sdl;
pub mod server;
pub mod session;
pub mod template;

pub use assembly::{assemble, AssembledSchema, BuildMode, Overlay, ValidationError, ValidationErrors};
pub use error::{Error, Result, ToExitCode};
pub use fixtures::{FixtureError, FixtureMap, FixtureSource};
pub use introspection::introspect;
pub use proxy::Upstream;
pub use report::{report, ReportMode};
pub use sdl::SdlDocument;
pub use server::{Server, ServerConfig};
pub use session::{LiveSchema, ReloadError, SdlSnapshot, Session};
pub use template::substitute;
