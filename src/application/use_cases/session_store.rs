use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ClientFactory, InferenceClient};
use crate::application::Clock;
use crate::domain::Session;

/// Optional bounds on the session map. Both default to unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionLimits {
    /// Sessions idle for longer than this many seconds are dropped.
    pub max_idle_secs: Option<i64>,
    /// When exceeded, the least recently active sessions are dropped.
    pub max_sessions: Option<usize>,
}

/// A session's metadata together with the client that holds its history.
#[derive(Clone)]
pub struct SessionHandle {
    pub session: Session,
    pub client: Arc<InferenceClient>,
}

struct SessionEntry {
    session: Session,
    client: Arc<InferenceClient>,
}

impl SessionEntry {
    fn handle(&self) -> SessionHandle {
        SessionHandle {
            session: self.session.clone(),
            client: Arc::clone(&self.client),
        }
    }
}

/// Token-addressed map of inference clients, one per conversation.
///
/// Every access sweeps sessions that violate [`SessionLimits`] before doing
/// its own work, so no background task is needed.
pub struct SessionStore {
    factory: ClientFactory,
    clock: Arc<dyn Clock>,
    limits: SessionLimits,
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(factory: ClientFactory, clock: Arc<dyn Clock>, limits: SessionLimits) -> Self {
        Self {
            factory,
            clock,
            limits,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 32 lowercase hex characters from a random v4 UUID.
    pub fn generate_token() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn factory(&self) -> &ClientFactory {
        &self.factory
    }

    /// Start a brand-new session under a fresh token.
    pub async fn create(&self) -> SessionHandle {
        self.get_or_create(None).await
    }

    /// Resolve `token` to its session, creating one on first use. A missing or
    /// blank token always yields a new session with a generated token.
    pub async fn get_or_create(&self, token: Option<&str>) -> SessionHandle {
        let now = self.clock.now();
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(Self::generate_token);

        let mut entries = self.entries.lock().await;
        self.evict(&mut entries, now, Some(&token));

        let entry = entries.entry(token.clone()).or_insert_with(|| {
            info!("Created session {}", token);
            SessionEntry {
                session: Session::new(token.clone(), now),
                client: Arc::new(self.factory.build()),
            }
        });
        entry.session.touch(now);
        let handle = entry.handle();

        self.evict(&mut entries, now, Some(&token));
        handle
    }

    /// Look up an existing session and mark it active.
    pub async fn get(&self, token: &str) -> Option<SessionHandle> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        self.evict(&mut entries, now, None);

        let entry = entries.get_mut(token)?;
        entry.session.touch(now);
        Some(entry.handle())
    }

    /// Remove a session. Returns whether it existed.
    pub async fn delete(&self, token: &str) -> bool {
        let removed = self.entries.lock().await.remove(token).is_some();
        if removed {
            info!("Deleted session {}", token);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        self.evict(&mut entries, now, None);
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired sessions, then the least recently active ones until the
    /// count limit holds. `keep` is never dropped.
    fn evict(&self, entries: &mut HashMap<String, SessionEntry>, now: i64, keep: Option<&str>) {
        if let Some(max_idle) = self.limits.max_idle_secs {
            entries.retain(|token, entry| {
                let keep_it =
                    keep == Some(token.as_str()) || entry.session.idle_seconds(now) <= max_idle;
                if !keep_it {
                    debug!("Evicting idle session {}", token);
                }
                keep_it
            });
        }

        if let Some(max_sessions) = self.limits.max_sessions {
            while entries.len() > max_sessions {
                let oldest = entries
                    .iter()
                    .filter(|(token, _)| keep != Some(token.as_str()))
                    .min_by_key(|(_, entry)| {
                        (entry.session.last_active(), entry.session.created_at())
                    })
                    .map(|(token, _)| token.clone());

                match oldest {
                    Some(token) => {
                        debug!("Evicting least recently used session {}", token);
                        entries.remove(&token);
                    }
                    None => break,
                }
            }
        }
    }
}
