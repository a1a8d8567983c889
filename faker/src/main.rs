#![cfg_attr(test, allow(unused_crate_dependencies))]

use std::{process, sync::Arc};

use args::Args;
use errors::FakerError;
use faker_config::Config;
use faker_server::{
    introspect, template::substitute_document, BuildMode, FixtureSource, Overlay, Server, Session, ToExitCode,
};
use mimalloc::MiMalloc;
use output::report;
use tokio::runtime;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod args;
mod errors;
mod output;

const THREAD_NAME: &str = "graphql-faker";

fn main() {
    let args = args::parse();

    let exit_code = match try_main(args) {
        Ok(()) => exitcode::OK,
        Err(error) => {
            report::error(&error);
            error.to_exit_code()
        }
    };

    process::exit(exit_code);
}

fn try_main(args: Args) -> Result<(), FakerError> {
    args.init_logging();

    let config = Config::load(args.config_path())?;

    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name(THREAD_NAME)
        .build()
        .map_err(FakerError::Runtime)?;

    runtime.block_on(serve(args, config))
}

async fn serve(args: Args, config: Config) -> Result<(), FakerError> {
    let feature = args.feature();
    report::feature(feature, args.test_case());

    let upstream = args.upstream(&config)?;
    let (sdl_file, is_default) = args.sdl_file(upstream.is_some());

    if is_default {
        report::default_sdl_file(&sdl_file);
    }

    let fixtures = FixtureSource::new(args.features_dir(&config));
    let template = fixtures.load_template(feature)?;
    let values = fixtures.load_fixtures(feature, args.test_case())?;

    let user_sdl = substitute_document(&template, &values, &sdl_file.display().to_string());
    report::substituted_sdl(user_sdl.text());

    let mode = match upstream {
        Some(upstream) => {
            let remote = introspect(&upstream).await?;
            BuildMode::Overlay(Overlay { remote, upstream })
        }
        None => BuildMode::Local,
    };

    let session = Session::start(mode, user_sdl, sdl_file).await?;

    let server_config = args.server_config(&config);
    let has_editor = server_config.editor_dir.is_some();

    let server = Server::bind(server_config, Arc::new(session)).await?;
    let address = server.local_addr()?;

    report::ready(address, has_editor);

    if args.open_browser() {
        let url = if has_editor {
            format!("http://{address}/editor")
        } else {
            format!("http://{address}/graphql")
        };

        if let Err(error) = webbrowser::open(&url) {
            tracing::warn!("could not open {url} in a browser: {error}");
        }
    }

    server.run().await?;

    Ok(())
}
