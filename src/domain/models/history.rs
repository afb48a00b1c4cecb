use serde::{Deserialize, Serialize};

use super::ChatMessage;
use crate::domain::DomainError;

/// How much of the stored history is resent to the model on a
/// history-enabled call.
///
/// `Unbounded` resends everything every turn, so request size and cost grow
/// with the conversation. `LastMessages(n)` sends only the trailing `n`
/// messages. Neither variant ever removes entries from the stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    #[default]
    Unbounded,
    LastMessages(usize),
}

impl HistoryWindow {
    pub fn from_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(n) => HistoryWindow::LastMessages(n),
            None => HistoryWindow::Unbounded,
        }
    }
}

/// Ordered record of prior turns owned by a single inference client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Record one completed exchange.
    pub fn push_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(assistant));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The slice of history that `window` allows to be resent.
    pub fn window(&self, window: HistoryWindow) -> &[ChatMessage] {
        match window {
            HistoryWindow::Unbounded => &self.messages,
            HistoryWindow::LastMessages(n) => {
                let start = self.messages.len().saturating_sub(n);
                &self.messages[start..]
            }
        }
    }

    /// Pretty JSON array of `{role, content}` objects, 2-space indented.
    pub fn to_json_pretty(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string_pretty(&self.messages)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let messages: Vec<ChatMessage> = serde_json::from_str(json)?;
        Ok(Self { messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn history_with_turns(turns: usize) -> ConversationHistory {
        let mut history = ConversationHistory::new();
        for i in 0..turns {
            history.push_turn(format!("q{i}"), format!("a{i}"));
        }
        history
    }

    #[test]
    fn push_turn_appends_user_then_assistant() {
        let history = history_with_turns(1);
        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].role, Role::User);
        assert_eq!(history.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn unbounded_window_returns_everything() {
        let history = history_with_turns(3);
        assert_eq!(history.window(HistoryWindow::Unbounded).len(), 6);
    }

    #[test]
    fn last_messages_window_keeps_the_tail() {
        let history = history_with_turns(3);
        let window = history.window(HistoryWindow::LastMessages(2));
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "q2");
        assert_eq!(window[1].content, "a2");
    }

    #[test]
    fn window_larger_than_history_is_clamped() {
        let history = history_with_turns(1);
        assert_eq!(history.window(HistoryWindow::LastMessages(50)).len(), 2);
    }

    #[test]
    fn json_is_a_plain_array() {
        let history = history_with_turns(1);
        let json = history.to_json_pretty().unwrap();
        assert!(json.trim_start().starts_with('['));
        assert!(json.contains("\n  {"));

        let parsed = ConversationHistory::from_json(&json).unwrap();
        assert_eq!(parsed, history);
    }

    #[test]
    fn non_ascii_content_is_written_verbatim() {
        let mut history = ConversationHistory::new();
        history.push_turn("Tên tôi là Minh", "Xin chào Minh");
        let json = history.to_json_pretty().unwrap();
        assert!(json.contains("Tên tôi là Minh"));
    }
}
