//! Push notifier — outbound HTTP delivery of terminal task state.
//!
//! Mirrors Python SDK's `PushNotificationSender` from
//! `a2a.server.tasks.push_notification_sender`, built on the same `reqwest`
//! stack the client transport ([`crate::client::JsonRpcTransport`]) already
//! uses for outbound HTTP.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::A2AResult;
use crate::types::{PushNotificationConfig, Task};

use super::push_notification_store::PushNotificationConfigStore;

/// Delivers a task's JSON representation to a single configured push endpoint.
///
/// Mirrors Python SDK's `PushNotificationSender.send_notification`.
#[async_trait]
pub trait PushNotificationSender: Send + Sync {
    /// POST the task to `config.url`. Failures are logged by the caller and
    /// do not fail the triggering RPC — per the core's error handling design,
    /// push delivery has no retry and is best-effort.
    async fn send(&self, task: &Task, config: &PushNotificationConfig) -> A2AResult<()>;
}

/// `reqwest`-backed [`PushNotificationSender`].
pub struct HttpPushNotificationSender {
    client: reqwest::Client,
}

impl HttpPushNotificationSender {
    /// Create a sender with a default `reqwest::Client`.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a sender with a caller-supplied `reqwest::Client`, e.g. to share
    /// a connection pool with the rest of the process.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpPushNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushNotificationSender for HttpPushNotificationSender {
    async fn send(&self, task: &Task, config: &PushNotificationConfig) -> A2AResult<()> {
        let mut request = self.client.post(&config.url).json(task);

        if let Some(auth) = &config.authentication {
            if let Some(credentials) = &auth.credentials {
                if auth.schemes.iter().any(|s| s.eq_ignore_ascii_case("bearer")) {
                    request = request.bearer_auth(credentials);
                } else if auth.schemes.iter().any(|s| s.eq_ignore_ascii_case("basic")) {
                    request = request.header("Authorization", format!("Basic {}", credentials));
                }
            }
        }
        if let Some(token) = &config.token {
            request = request.header("X-A2A-Notification-Token", token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(task_id = %task.id, url = %config.url, "Push notification delivered");
                Ok(())
            }
            Ok(response) => {
                warn!(
                    task_id = %task.id,
                    url = %config.url,
                    status = %response.status(),
                    "Push notification endpoint returned a non-success status"
                );
                Ok(())
            }
            Err(e) => {
                warn!(task_id = %task.id, url = %config.url, error = %e, "Push notification delivery failed");
                Ok(())
            }
        }
    }
}

/// Combines a [`PushNotificationConfigStore`] with a [`PushNotificationSender`]
/// to notify every registered endpoint for a task on terminal state.
pub struct PushNotifier {
    config_store: std::sync::Arc<dyn PushNotificationConfigStore>,
    sender: std::sync::Arc<dyn PushNotificationSender>,
}

impl PushNotifier {
    /// Create a notifier over the given config store and sender.
    pub fn new(
        config_store: std::sync::Arc<dyn PushNotificationConfigStore>,
        sender: std::sync::Arc<dyn PushNotificationSender>,
    ) -> Self {
        Self {
            config_store,
            sender,
        }
    }

    /// Notify every push config registered for `task.id`.
    ///
    /// Per §9's resolution of the multi-config Open Question, all registered
    /// configs for the task are notified, not just the first.
    pub async fn notify(&self, task: &Task) -> A2AResult<()> {
        let configs = self.config_store.list(&task.id).await?;
        if configs.is_empty() {
            return Ok(());
        }

        for entry in &configs {
            self.sender.send(task, &entry.push_notification_config).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::push_notification_store::InMemoryPushNotificationConfigStore;
    use crate::types::{TaskState, TaskStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSender {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PushNotificationSender for CountingSender {
        async fn send(&self, _task: &Task, _config: &PushNotificationConfig) -> A2AResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn sample_task() -> Task {
        Task {
            id: "t1".to_string(),
            context_id: "c1".to_string(),
            kind: "task".to_string(),
            status: TaskStatus {
                state: TaskState::Completed,
                message: None,
                timestamp: None,
            },
            artifacts: None,
            history: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn notify_skips_tasks_with_no_configured_endpoint() {
        let store = Arc::new(InMemoryPushNotificationConfigStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let sender = Arc::new(CountingSender {
            calls: calls.clone(),
        });
        let notifier = PushNotifier::new(store, sender);

        notifier.notify(&sample_task()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn notify_sends_to_every_registered_config() {
        let store = Arc::new(InMemoryPushNotificationConfigStore::new());
        store
            .save(
                "t1",
                PushNotificationConfig {
                    id: None,
                    url: "https://a.example.com".to_string(),
                    token: None,
                    authentication: None,
                },
            )
            .await
            .unwrap();
        store
            .save(
                "t1",
                PushNotificationConfig {
                    id: None,
                    url: "https://b.example.com".to_string(),
                    token: None,
                    authentication: None,
                },
            )
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let sender = Arc::new(CountingSender {
            calls: calls.clone(),
        });
        let notifier = PushNotifier::new(store, sender);

        notifier.notify(&sample_task()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
