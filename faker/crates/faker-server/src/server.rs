mod cors;
mod state;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::{DefaultBodyLimit, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use state::ServerState;
use tokio::{net::TcpListener, signal};
use tower_http::{services::ServeDir, trace::TraceLayer};
use url::Url;

use crate::{
    report::{report, ReportMode},
    session::{ReloadError, Session},
};

const GRAPHQL_PATH: &str = "/graphql";
const USER_SDL_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Start parameters for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to listen on.
    pub listen_address: SocketAddr,
    /// The only origin allowed by CORS. Without one, the request origin is allowed.
    pub cors_origin: Option<Url>,
    pub cors_allow_credentials: bool,
    /// Static files of the SDL editor, served below `/editor`.
    pub editor_dir: Option<PathBuf>,
}

/// A bound server, ready to serve the session.
pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    /// Binds the listen address and prepares the routes.
    pub async fn bind(config: ServerConfig, session: Arc<Session>) -> crate::Result<Self> {
        let router = router(&config, session)?;

        let listener = TcpListener::bind(config.listen_address)
            .await
            .map_err(|source| crate::Error::Bind {
                address: config.listen_address,
                source,
            })?;

        Ok(Self { listener, router })
    }

    pub fn local_addr(&self) -> crate::Result<SocketAddr> {
        self.listener.local_addr().map_err(crate::Error::Server)
    }

    /// Serves requests until Ctrl-C or SIGTERM.
    pub async fn run(self) -> crate::Result<()> {
        if let Ok(address) = self.listener.local_addr() {
            tracing::info!("GraphQL endpoint exposed at http://{address}{GRAPHQL_PATH}");
        }

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(graceful_shutdown())
            .await
            .map_err(crate::Error::Server)
    }
}

/// All routes of the server.
pub fn router(config: &ServerConfig, session: Arc<Session>) -> crate::Result<Router> {
    let cors = cors::generate(config.cors_origin.as_ref(), config.cors_allow_credentials)?;

    let mut router = Router::new()
        .route(GRAPHQL_PATH, get(graphiql_or_execute).post(execute))
        .route(
            "/user-sdl",
            get(user_sdl)
                .post(replace_user_sdl)
                .layer(DefaultBodyLimit::max(USER_SDL_BODY_LIMIT)),
        );

    if let Some(editor_dir) = &config.editor_dir {
        router = router.nest_service("/editor", ServeDir::new(editor_dir));
    }

    Ok(router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState::new(session)))
}

async fn execute(State(state): State<ServerState>, request: GraphQLRequest) -> GraphQLResponse {
    state.session().handle_query(request.into_inner()).await.into()
}

/// Browsers get GraphiQL. A query in the query string is executed instead.
async fn graphiql_or_execute(State(state): State<ServerState>, RawQuery(query): RawQuery) -> Response {
    let Some(query) = query.filter(|query| !query.is_empty()) else {
        return Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish()).into_response();
    };

    match async_graphql::http::parse_query_string(&query) {
        Ok(request) => GraphQLResponse::from(state.session().handle_query(request).await).into_response(),
        Err(error) => (StatusCode::BAD_REQUEST, error.to_string()).into_response(),
    }
}

async fn user_sdl(State(state): State<ServerState>) -> impl IntoResponse {
    Json(state.session().sdl_snapshot())
}

async fn replace_user_sdl(State(state): State<ServerState>, body: String) -> Response {
    match state.session().replace_user_sdl(body).await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(ReloadError::Validation(errors)) => {
            tracing::warn!("rejected new schema with {} validation error(s)", errors.len());
            (StatusCode::INTERNAL_SERVER_ERROR, report(&errors, ReportMode::Recoverable)).into_response()
        }
        Err(error @ ReloadError::Persist { .. }) => {
            tracing::error!("{error}");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}

async fn graceful_shutdown() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down gracefully...");
}
