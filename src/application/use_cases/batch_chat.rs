use std::time::Instant;

use tracing::{info, warn};

use super::ClientFactory;
use crate::domain::{BatchItem, BatchReport, ChatOptions};

/// Answers a list of messages one after another on a single fresh client.
///
/// Items are independent: history is always off, and a failing item is
/// recorded and skipped rather than aborting the run.
pub struct BatchChatUseCase {
    factory: ClientFactory,
}

impl BatchChatUseCase {
    pub fn new(factory: ClientFactory) -> Self {
        Self { factory }
    }

    pub async fn execute(&self, messages: &[String], options: &ChatOptions) -> BatchReport {
        self.execute_with_progress(messages, options, |_| {}).await
    }

    /// Like [`execute`](Self::execute), calling `on_item` after each message.
    pub async fn execute_with_progress<F>(
        &self,
        messages: &[String],
        options: &ChatOptions,
        mut on_item: F,
    ) -> BatchReport
    where
        F: FnMut(&BatchItem),
    {
        let client = self.factory.build();
        let options = options.clone().with_history(false);
        let start = Instant::now();
        let mut items = Vec::with_capacity(messages.len());

        for (index, message) in messages.iter().enumerate() {
            let item = match client.chat(message, &options).await {
                Ok(reply) => BatchItem::succeeded(index, message.as_str(), reply.content),
                Err(e) => {
                    warn!("Batch item {} failed: {}", index, e);
                    BatchItem::failed(index, message.as_str(), e.to_string())
                }
            };
            on_item(&item);
            items.push(item);
        }

        let report = BatchReport::new(items, start.elapsed().as_secs_f64());
        info!(
            "Batch finished: {} successful, {} failed in {:.2}s",
            report.successful(),
            report.failed(),
            report.elapsed_secs
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::ClientSettings;
    use crate::connector::{InMemoryScenarioRepository, MockBackend};

    fn use_case(backend: Arc<MockBackend>) -> BatchChatUseCase {
        BatchChatUseCase::new(ClientFactory::new(
            backend,
            Arc::new(InMemoryScenarioRepository::with_builtins()),
            ClientSettings::default(),
        ))
    }

    #[tokio::test]
    async fn failing_middle_item_is_isolated() {
        let backend = Arc::new(MockBackend::new().failing_on("explode"));
        let messages = vec![
            "first".to_string(),
            "please explode".to_string(),
            "third".to_string(),
        ];

        let report = use_case(backend)
            .execute(&messages, &ChatOptions::new())
            .await;

        assert_eq!(report.total(), 3);
        assert_eq!(report.successful(), 2);
        assert_eq!(report.failed(), 1);
        assert!(report.items[0].success);
        assert!(!report.items[1].success);
        assert!(report.items[2].success);
        assert_eq!(report.items[1].index, 1);
        assert!(report.items[1].error.is_some());
    }

    #[tokio::test]
    async fn items_never_see_each_other() {
        let backend = Arc::new(MockBackend::new());
        let messages = vec!["a".to_string(), "b".to_string()];

        use_case(backend.clone())
            .execute(&messages, &ChatOptions::new().with_history(true))
            .await;

        for request in backend.requests() {
            assert_eq!(request.messages.len(), 2);
        }
    }

    #[tokio::test]
    async fn blank_item_is_still_sent() {
        let backend = Arc::new(MockBackend::new());
        let messages = vec!["hi".to_string(), String::new(), "there".to_string()];

        let report = use_case(backend.clone())
            .execute(&messages, &ChatOptions::new())
            .await;

        assert_eq!(report.successful(), 3);
        assert_eq!(report.failed(), 0);
        assert_eq!(backend.requests().len(), 3);
        assert_eq!(backend.requests()[1].messages[1].content, "");
    }

    #[tokio::test]
    async fn progress_callback_sees_every_item_in_order() {
        let backend = Arc::new(MockBackend::new());
        let messages = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut seen = Vec::new();

        use_case(backend)
            .execute_with_progress(&messages, &ChatOptions::new(), |item| seen.push(item.index))
            .await;

        assert_eq!(seen, vec![0, 1, 2]);
    }
}
