//! Fire-and-forget delivery of alerts.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::notifier::Notifier;

use super::Alert;

/// Fans one alert out to every notifier.
///
/// Each notifier is attempted independently on its own task; a failure is
/// logged and never affects the others. Nothing is retried.
#[derive(Clone, Default)]
pub struct Dispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "notifiers",
                &self.notifiers.iter().map(|n| n.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher for the given notifiers.
    #[must_use]
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Number of notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Whether there are no notifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Spawn one delivery task per notifier.
    ///
    /// Must be called from within a tokio runtime. The returned handles may
    /// be dropped; delivery continues in the background.
    pub fn dispatch(&self, alert: &Alert) -> Vec<JoinHandle<()>> {
        let message: Arc<str> = Arc::from(alert.message());
        let path = alert.path.clone();

        self.notifiers
            .iter()
            .map(|notifier| {
                let notifier = Arc::clone(notifier);
                let message = Arc::clone(&message);
                let path = path.clone();
                tokio::spawn(async move {
                    match notifier.send(&message).await {
                        Ok(()) => tracing::debug!(
                            notifier = notifier.name(),
                            path = %path.display(),
                            "Alert delivered"
                        ),
                        Err(e) => tracing::error!(
                            notifier = notifier.name(),
                            path = %path.display(),
                            error = %e,
                            "Failed to send alert"
                        ),
                    }
                })
            })
            .collect()
    }
}
