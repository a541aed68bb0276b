//! Push notification config store — KV persistence for per-task push configs.
//!
//! Mirrors Python SDK's `PushNotificationConfigStore` from
//! `a2a.server.tasks.push_notification_config_store`, generalized to this
//! crate's `(taskId, configId)` keying so that multiple configs can be
//! registered for a single task.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::A2AResult;
use crate::types::{PushNotificationConfig, TaskPushNotificationConfig};

/// Interface for persisting push notification configs keyed by task id.
///
/// Constructor-injected into [`super::request_handler::DefaultRequestHandler`],
/// the same way [`super::task_store::TaskStore`] is — a deployment can swap in
/// a persistent store without touching the request handler.
#[async_trait]
pub trait PushNotificationConfigStore: Send + Sync {
    /// Save (insert or replace) a config for a task. If `config.id` is `None`,
    /// a new id is generated and returned in the stored config.
    async fn save(&self, task_id: &str, config: PushNotificationConfig) -> A2AResult<TaskPushNotificationConfig>;

    /// Get a single config for a task, by config id. If `config_id` is `None`
    /// and exactly one config is registered, that config is returned.
    async fn get(
        &self,
        task_id: &str,
        config_id: Option<&str>,
    ) -> A2AResult<Option<TaskPushNotificationConfig>>;

    /// List every config registered for a task.
    async fn list(&self, task_id: &str) -> A2AResult<Vec<TaskPushNotificationConfig>>;

    /// Delete a single config for a task, by config id.
    async fn delete(&self, task_id: &str, config_id: &str) -> A2AResult<()>;
}

/// In-memory implementation of [`PushNotificationConfigStore`].
///
/// Suitable for single-instance deployments, matching the in-memory reference
/// status of [`super::task_store::InMemoryTaskStore`] and
/// [`super::event_queue::InMemoryQueueManager`].
#[derive(Default)]
pub struct InMemoryPushNotificationConfigStore {
    configs: Mutex<HashMap<String, Vec<TaskPushNotificationConfig>>>,
}

impl InMemoryPushNotificationConfigStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PushNotificationConfigStore for InMemoryPushNotificationConfigStore {
    async fn save(
        &self,
        task_id: &str,
        mut config: PushNotificationConfig,
    ) -> A2AResult<TaskPushNotificationConfig> {
        let config_id = config
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        config.id = Some(config_id.clone());

        let mut configs = self.configs.lock().await;
        let entries = configs.entry(task_id.to_string()).or_default();
        entries.retain(|c| c.push_notification_config.id.as_deref() != Some(config_id.as_str()));

        let entry = TaskPushNotificationConfig {
            id: Some(config_id),
            task_id: task_id.to_string(),
            push_notification_config: config,
            tenant: None,
        };
        entries.push(entry.clone());

        Ok(entry)
    }

    async fn get(
        &self,
        task_id: &str,
        config_id: Option<&str>,
    ) -> A2AResult<Option<TaskPushNotificationConfig>> {
        let configs = self.configs.lock().await;
        let Some(entries) = configs.get(task_id) else {
            return Ok(None);
        };

        match config_id {
            Some(id) => Ok(entries
                .iter()
                .find(|c| c.push_notification_config.id.as_deref() == Some(id))
                .cloned()),
            None => Ok(entries.first().cloned()),
        }
    }

    async fn list(&self, task_id: &str) -> A2AResult<Vec<TaskPushNotificationConfig>> {
        let configs = self.configs.lock().await;
        Ok(configs.get(task_id).cloned().unwrap_or_default())
    }

    async fn delete(&self, task_id: &str, config_id: &str) -> A2AResult<()> {
        let mut configs = self.configs.lock().await;
        if let Some(entries) = configs.get_mut(task_id) {
            entries.retain(|c| c.push_notification_config.id.as_deref() != Some(config_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> PushNotificationConfig {
        PushNotificationConfig {
            id: None,
            url: url.to_string(),
            token: None,
            authentication: None,
        }
    }

    #[tokio::test]
    async fn save_generates_id_when_absent() {
        let store = InMemoryPushNotificationConfigStore::new();
        let saved = store.save("t1", config("https://example.com/hook")).await.unwrap();
        assert!(saved.push_notification_config.id.is_some());
        assert_eq!(saved.task_id, "t1");
    }

    #[tokio::test]
    async fn multiple_configs_per_task_are_all_listed() {
        let store = InMemoryPushNotificationConfigStore::new();
        store.save("t1", config("https://a.example.com")).await.unwrap();
        store.save("t1", config("https://b.example.com")).await.unwrap();

        let all = store.list("t1").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn save_with_same_id_replaces() {
        let store = InMemoryPushNotificationConfigStore::new();
        let mut first = config("https://a.example.com");
        first.id = Some("fixed".to_string());
        store.save("t1", first).await.unwrap();

        let mut second = config("https://b.example.com");
        second.id = Some("fixed".to_string());
        store.save("t1", second).await.unwrap();

        let all = store.list("t1").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].push_notification_config.url, "https://b.example.com");
    }

    #[tokio::test]
    async fn delete_removes_only_matching_config() {
        let store = InMemoryPushNotificationConfigStore::new();
        let a = store.save("t1", config("https://a.example.com")).await.unwrap();
        store.save("t1", config("https://b.example.com")).await.unwrap();

        store
            .delete("t1", a.push_notification_config.id.as_ref().unwrap())
            .await
            .unwrap();

        let remaining = store.list("t1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].push_notification_config.url, "https://b.example.com");
    }

    #[tokio::test]
    async fn get_without_config_id_returns_first() {
        let store = InMemoryPushNotificationConfigStore::new();
        store.save("t1", config("https://a.example.com")).await.unwrap();

        let got = store.get("t1", None).await.unwrap();
        assert!(got.is_some());
    }

    #[tokio::test]
    async fn get_for_unknown_task_returns_none() {
        let store = InMemoryPushNotificationConfigStore::new();
        assert!(store.get("nope", None).await.unwrap().is_none());
    }
}
