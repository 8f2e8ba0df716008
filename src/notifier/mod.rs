//! Alert delivery channels.
//!
//! Every channel implements [`Notifier`]; the engine only ever calls
//! [`Notifier::send`] and logs failures.

mod dingtalk;
mod error;
mod feishu;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{NotifierConfig, NotifierKind};

pub use dingtalk::DingtalkNotifier;
pub use error::NotifyError;
pub use feishu::FeishuNotifier;

/// Connection timeout for webhook requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for webhook requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A destination for alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Deliver one message.
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Build an HTTP client with proper timeout configuration.
fn build_http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            Client::new()
        })
}

/// POST a JSON payload and require a 2xx response.
async fn post_json(
    client: &Client,
    url: reqwest::Url,
    payload: &serde_json::Value,
) -> Result<(), NotifyError> {
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(payload)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                NotifyError::Timeout
            } else {
                NotifyError::RequestFailed(e.to_string())
            }
        })?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(NotifyError::Status(status.as_u16()))
}

/// Create notifiers for every enabled entry.
///
/// Entries with an unparseable webhook are logged and skipped.
#[must_use]
pub fn create_notifiers(configs: &[NotifierConfig]) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    for config in configs.iter().filter(|c| c.enabled) {
        let result: Result<Arc<dyn Notifier>, NotifyError> = match config.kind {
            NotifierKind::Feishu => {
                FeishuNotifier::new(&config.webhook).map(|n| Arc::new(n) as Arc<dyn Notifier>)
            }
            NotifierKind::Dingtalk => DingtalkNotifier::new(&config.webhook, config.secret.clone())
                .map(|n| Arc::new(n) as Arc<dyn Notifier>),
        };

        match result {
            Ok(notifier) => notifiers.push(notifier),
            Err(e) => tracing::warn!(kind = ?config.kind, error = %e, "Skipping notifier"),
        }
    }

    notifiers
}
