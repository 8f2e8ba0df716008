//! Notifier error types.

/// Errors from delivering an alert.
#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("Invalid webhook URL: {0}")]
    InvalidWebhook(String),

    #[error("Webhook request failed: {0}")]
    RequestFailed(String),

    #[error("Webhook returned HTTP {0}")]
    Status(u16),

    #[error("Webhook request timed out")]
    Timeout,
}
