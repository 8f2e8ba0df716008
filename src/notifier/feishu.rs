//! Feishu (Lark) custom bot webhook.

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{build_http_client, post_json, Notifier, NotifyError};

/// Sends plain-text messages to a Feishu bot webhook.
#[derive(Debug, Clone)]
pub struct FeishuNotifier {
    client: Client,
    webhook: Url,
}

impl FeishuNotifier {
    /// Create a notifier for the given webhook URL.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidWebhook`] if the URL cannot be parsed.
    pub fn new(webhook: &str) -> Result<Self, NotifyError> {
        let webhook =
            Url::parse(webhook).map_err(|e| NotifyError::InvalidWebhook(format!("{webhook}: {e}")))?;
        Ok(Self {
            client: build_http_client(),
            webhook,
        })
    }
}

#[async_trait]
impl Notifier for FeishuNotifier {
    fn name(&self) -> &str {
        "feishu"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "msg_type": "text",
            "content": { "text": message }
        });
        post_json(&self.client, self.webhook.clone(), &payload).await
    }
}
