use serde::{Deserialize, Serialize};

/// Metadata of one server-held, token-addressed conversation.
///
/// Timestamps are Unix seconds as reported by the store's clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: String,
    created_at: i64,
    last_active: i64,
}

impl Session {
    pub fn new(id: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn last_active(&self) -> i64 {
        self.last_active
    }

    pub fn touch(&mut self, now: i64) {
        self.last_active = self.last_active.max(now);
    }

    pub fn idle_seconds(&self, now: i64) -> i64 {
        now.saturating_sub(self.last_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_never_moves_backwards() {
        let mut session = Session::new("abc", 100);
        session.touch(150);
        assert_eq!(session.last_active(), 150);
        session.touch(120);
        assert_eq!(session.last_active(), 150);
        assert_eq!(session.created_at(), 100);
    }

    #[test]
    fn idle_seconds_since_last_activity() {
        let mut session = Session::new("abc", 100);
        session.touch(130);
        assert_eq!(session.idle_seconds(200), 70);
    }
}
