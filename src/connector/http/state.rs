use std::sync::Arc;
use std::time::Instant;

use crate::application::SessionStore;
use crate::connector::api::Container;

/// Shared by every handler of one server. Each server owns its own sessions.
#[derive(Clone)]
pub struct AppState {
    pub container: Arc<Container>,
    pub sessions: Arc<SessionStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(container: Arc<Container>) -> Self {
        let sessions = Arc::new(container.session_store());
        Self {
            container,
            sessions,
            started_at: Instant::now(),
        }
    }

    /// Unix seconds from the container's clock.
    pub fn now(&self) -> i64 {
        self.container.clock().now()
    }
}
