/// Cache-aside storage for task reads
///
/// Two kinds of entries, both JSON with a TTL:
///
/// ```text
/// tasks:user:{user_id}   full task list of one user (newest first)
/// tasks:item:{task_id}   one task
/// ```
///
/// Every write path deletes the owner's list key and the item key; nothing
/// is ever updated in place. Callers treat any error from this module as a
/// cache miss.

use uuid::Uuid;

use super::client::{RedisClient, RedisClientError};
use crate::models::task::Task;

/// Default entry lifetime in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600;

pub fn user_tasks_key(user_id: Uuid) -> String {
    format!("tasks:user:{}", user_id)
}

pub fn task_key(task_id: Uuid) -> String {
    format!("tasks:item:{}", task_id)
}

/// Task read cache
#[derive(Clone)]
pub struct TaskCache {
    client: RedisClient,
    ttl_secs: u64,
}

impl TaskCache {
    pub fn new(client: RedisClient, ttl_secs: u64) -> Self {
        Self {
            client,
            ttl_secs: ttl_secs.max(1),
        }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, RedisClientError> {
        let raw: Option<String> = self.client.query(redis::cmd("GET").arg(key)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: serde::Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), RedisClientError> {
        let json = serde_json::to_string(value)?;
        let _: () = self
            .client
            .query(redis::cmd("SET").arg(key).arg(json).arg("EX").arg(self.ttl_secs))
            .await?;
        Ok(())
    }

    /// Cached task list of `user_id`, if present
    pub async fn user_tasks(&self, user_id: Uuid) -> Result<Option<Vec<Task>>, RedisClientError> {
        let tasks = self.get_json(&user_tasks_key(user_id)).await?;
        tracing::debug!(%user_id, hit = tasks.is_some(), "Task list cache lookup");
        Ok(tasks)
    }

    pub async fn store_user_tasks(
        &self,
        user_id: Uuid,
        tasks: &[Task],
    ) -> Result<(), RedisClientError> {
        self.set_json(&user_tasks_key(user_id), tasks).await
    }

    /// Cached task, if present
    pub async fn task(&self, task_id: Uuid) -> Result<Option<Task>, RedisClientError> {
        let task = self.get_json(&task_key(task_id)).await?;
        tracing::debug!(%task_id, hit = task.is_some(), "Task cache lookup");
        Ok(task)
    }

    pub async fn store_task(&self, task: &Task) -> Result<(), RedisClientError> {
        self.set_json(&task_key(task.id), task).await
    }

    /// Drops the owner's list and, when given, the item entry
    pub async fn invalidate(
        &self,
        user_id: Uuid,
        task_id: Option<Uuid>,
    ) -> Result<(), RedisClientError> {
        let mut keys = vec![user_tasks_key(user_id)];
        if let Some(task_id) = task_id {
            keys.push(task_key(task_id));
        }

        let removed: i64 = self.client.query(redis::cmd("DEL").arg(&keys)).await?;
        tracing::debug!(%user_id, task_id = ?task_id, removed, "Task cache invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use crate::redis::client::RedisConfig;
    use chrono::Utc;

    #[test]
    fn test_keys() {
        let id = Uuid::parse_str("6f1c7f9a-4a53-4b9a-9a57-2d6c1b0f3e11").unwrap();
        assert_eq!(user_tasks_key(id), "tasks:user:6f1c7f9a-4a53-4b9a-9a57-2d6c1b0f3e11");
        assert_eq!(task_key(id), "tasks:item:6f1c7f9a-4a53-4b9a-9a57-2d6c1b0f3e11");
    }

    fn sample_task(user_id: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id,
            title: "Cached".to_string(),
            description: "from redis".to_string(),
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            due_date: chrono::NaiveDate::from_ymd_opt(2025, 2, 1),
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn local_cache() -> TaskCache {
        let client = RedisClient::new(RedisConfig::new("redis://localhost:6379"))
            .await
            .unwrap();
        TaskCache::new(client, 60)
    }

    #[test]
    fn test_cached_task_json_round_trip() {
        let task = sample_task(Uuid::new_v4());

        let json = serde_json::to_string(&vec![task.clone()]).unwrap();
        let back: Vec<Task> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![task]);
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_store_read_invalidate() {
        let cache = local_cache().await;
        let user_id = Uuid::new_v4();

        assert!(cache.user_tasks(user_id).await.unwrap().is_none());

        cache.store_user_tasks(user_id, &[]).await.unwrap();
        assert_eq!(cache.user_tasks(user_id).await.unwrap(), Some(vec![]));

        cache.invalidate(user_id, None).await.unwrap();
        assert!(cache.user_tasks(user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_invalidate_drops_list_and_item() {
        let cache = local_cache().await;
        let user_id = Uuid::new_v4();
        let task = sample_task(user_id);
        let other = sample_task(user_id);

        cache.store_user_tasks(user_id, &[task.clone(), other.clone()]).await.unwrap();
        cache.store_task(&task).await.unwrap();
        cache.store_task(&other).await.unwrap();

        cache.invalidate(user_id, Some(task.id)).await.unwrap();

        let exists: i64 = cache
            .client()
            .query(
                redis::cmd("EXISTS")
                    .arg(user_tasks_key(user_id))
                    .arg(task_key(task.id)),
            )
            .await
            .unwrap();
        assert_eq!(exists, 0);
        assert!(cache.user_tasks(user_id).await.unwrap().is_none());
        assert!(cache.task(task.id).await.unwrap().is_none());

        // Only the written item is dropped
        assert_eq!(cache.task(other.id).await.unwrap(), Some(other.clone()));
        cache.invalidate(user_id, Some(other.id)).await.unwrap();
    }
}
