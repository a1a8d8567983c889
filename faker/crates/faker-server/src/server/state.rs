use std::sync::Arc;

use crate::session::Session;

#[derive(Clone)]
pub(super) struct ServerState {
    session: Arc<Session>,
}

impl ServerState {
    pub(super) fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub(super) fn session(&self) -> &Session {
        &self.session
    }
}
