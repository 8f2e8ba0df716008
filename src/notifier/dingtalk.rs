//! DingTalk custom robot webhook with optional signing.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use sha2::Sha256;

use super::{build_http_client, post_json, Notifier, NotifyError};

type HmacSha256 = Hmac<Sha256>;

/// Sends plain-text messages to a DingTalk robot webhook.
///
/// When a secret is configured, each request carries `timestamp` and `sign`
/// query parameters as required by robots with signature verification.
#[derive(Debug, Clone)]
pub struct DingtalkNotifier {
    client: Client,
    webhook: Url,
    secret: Option<String>,
}

impl DingtalkNotifier {
    /// Create a notifier for the given webhook URL and optional secret.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidWebhook`] if the URL cannot be parsed.
    pub fn new(webhook: &str, secret: Option<String>) -> Result<Self, NotifyError> {
        let webhook =
            Url::parse(webhook).map_err(|e| NotifyError::InvalidWebhook(format!("{webhook}: {e}")))?;
        Ok(Self {
            client: build_http_client(),
            webhook,
            secret: secret.filter(|s| !s.is_empty()),
        })
    }

    /// Webhook URL for a request made at `timestamp_ms`.
    fn request_url(&self, timestamp_ms: i64) -> Url {
        let mut url = self.webhook.clone();
        if let Some(secret) = &self.secret {
            url.query_pairs_mut()
                .append_pair("timestamp", &timestamp_ms.to_string())
                .append_pair("sign", &sign(secret, timestamp_ms));
        }
        url
    }
}

/// `base64(hmac_sha256(secret, "<timestamp>\n<secret>"))`.
fn sign(secret: &str, timestamp_ms: i64) -> String {
    let string_to_sign = format!("{timestamp_ms}\n{secret}");
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC key of any size is valid"));
    mac.update(string_to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

#[async_trait]
impl Notifier for DingtalkNotifier {
    fn name(&self) -> &str {
        "dingtalk"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "msgtype": "text",
            "text": { "content": message }
        });
        let url = self.request_url(chrono::Utc::now().timestamp_millis());
        post_json(&self.client, url, &payload).await
    }
}
