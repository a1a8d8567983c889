//! The schema being served, and its replacement when the editor saves new SDL.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::{
    assembly::{assemble, AssembledSchema, BuildMode, ValidationErrors},
    sdl::SdlDocument,
};

/// A schema together with the user SDL it was built from. The two are only
/// ever replaced together.
#[derive(Debug)]
pub struct LiveSchema {
    schema: AssembledSchema,
    user_sdl: SdlDocument,
}

impl LiveSchema {
    pub fn schema(&self) -> &AssembledSchema {
        &self.schema
    }

    pub fn user_sdl(&self) -> &SdlDocument {
        &self.user_sdl
    }
}

/// What the editor loads: the SDL it edits, and the remote SDL it extends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdlSnapshot {
    #[serde(rename = "userSDL")]
    pub user_sdl: String,
    #[serde(rename = "remoteSDL", skip_serializing_if = "Option::is_none")]
    pub remote_sdl: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("could not write the schema to {path}: {source}")]
    Persist { path: PathBuf, source: io::Error },
}

pub struct Session {
    mode: BuildMode,
    backing_file: PathBuf,
    current: watch::Sender<Arc<LiveSchema>>,
    reload: Mutex<()>,
}

impl Session {
    /// Assembles the initial schema and writes its SDL to the backing file.
    pub async fn start(mode: BuildMode, user_sdl: SdlDocument, backing_file: PathBuf) -> Result<Self, ReloadError> {
        let schema = assemble(&user_sdl, &mode)?;
        persist(&backing_file, &user_sdl).await?;

        Ok(Self {
            mode,
            backing_file,
            current: watch::Sender::new(Arc::new(LiveSchema { schema, user_sdl })),
            reload: Mutex::new(()),
        })
    }

    pub fn mode(&self) -> &BuildMode {
        &self.mode
    }

    pub fn backing_file(&self) -> &Path {
        &self.backing_file
    }

    /// The schema and SDL in use right now.
    pub fn current(&self) -> Arc<LiveSchema> {
        self.current.borrow().clone()
    }

    /// Notified after every successful reload.
    pub fn subscribe(&self) -> watch::Receiver<Arc<LiveSchema>> {
        self.current.subscribe()
    }

    /// Executes a request. The request sees one schema from start to finish,
    /// even if a reload lands while it runs.
    pub async fn handle_query(&self, request: async_graphql::Request) -> async_graphql::Response {
        let live = self.current();
        live.schema.execute(request).await
    }

    pub fn sdl_snapshot(&self) -> SdlSnapshot {
        SdlSnapshot {
            user_sdl: self.current().user_sdl.text().to_owned(),
            remote_sdl: self.mode.remote().map(|remote| remote.text().to_owned()),
        }
    }

    /// Replaces the user SDL. The new schema is assembled and written to the
    /// backing file before it is swapped in. If either step fails, the current
    /// schema and SDL stay as they are.
    pub async fn replace_user_sdl(&self, text: impl Into<Arc<str>>) -> Result<(), ReloadError> {
        let _reload = self.reload.lock().await;

        let user_sdl = self.current().user_sdl.with_text(text);
        let schema = assemble(&user_sdl, &self.mode)?;

        persist(&self.backing_file, &user_sdl).await?;

        self.current.send_replace(Arc::new(LiveSchema { schema, user_sdl }));

        tracing::info!("schema saved to {}", self.backing_file.display());

        Ok(())
    }
}

async fn persist(path: &Path, document: &SdlDocument) -> Result<(), ReloadError> {
    tokio::fs::write(path, document.text())
        .await
        .map_err(|source| ReloadError::Persist {
            path: path.to_owned(),
            source,
        })
}
