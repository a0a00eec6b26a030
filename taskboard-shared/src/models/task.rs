/// Task model and database operations
///
/// Tasks belong to exactly one user and move freely between the five board
/// columns. The only lifecycle rule is the completion timestamp:
///
/// ```text
/// any → done        completed_at = now
/// done → not done   completed_at = NULL
/// otherwise         completed_at unchanged
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'inProgress', 'blocked', 'review', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL CHECK (length(title) > 0),
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date DATE,
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{Task, CreateTask, TaskPriority, TaskStatus};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     user_id: Uuid::new_v4(),
///     title: "Write release notes".to_string(),
///     description: String::new(),
///     status: TaskStatus::Todo,
///     priority: TaskPriority::High,
///     due_date: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Board column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Blocked,
    Review,
    Done,
}

impl TaskStatus {
    /// All statuses in board order
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    /// Converts status to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    /// Column heading shown on the board
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
        }
    }

    /// Position in board order (0 = To Do)
    pub fn board_position(&self) -> usize {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Blocked => 2,
            TaskStatus::Review => 3,
            TaskStatus::Done => 4,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Numeric weight, higher is more urgent
    pub fn weight(&self) -> u8 {
        match self {
            TaskPriority::Low => 1,
            TaskPriority::Medium => 2,
            TaskPriority::High => 3,
        }
    }
}

/// What a status change does to `completed_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChange {
    /// Stamp the completion time
    Set,
    /// Clear the completion time
    Clear,
    /// Leave it as it is
    Keep,
}

impl CompletionChange {
    /// Decides the completion change for a status transition
    ///
    /// `from` is None when the task is being created.
    pub fn for_transition(from: Option<TaskStatus>, to: TaskStatus) -> Self {
        match (from.map(|s| s.is_done()), to.is_done()) {
            (None, true) | (Some(false), true) => CompletionChange::Set,
            (Some(true), false) => CompletionChange::Clear,
            _ => CompletionChange::Keep,
        }
    }

    /// Value to write into `completed_at`, or None to leave the column alone
    pub fn apply(self, now: DateTime<Utc>) -> Option<Option<DateTime<Utc>>> {
        match self {
            CompletionChange::Set => Some(Some(now)),
            CompletionChange::Clear => Some(None),
            CompletionChange::Keep => None,
        }
    }
}

/// Task owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    pub title: String,

    /// Free text, may be empty
    pub description: String,

    pub status: TaskStatus,
    pub priority: TaskPriority,

    /// Calendar day the task is due (no time component)
    pub due_date: Option<NaiveDate>,

    /// When the task last entered the done column
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
}

/// Input for updating a task
///
/// Only `Some` fields are written. `due_date: Some(None)` clears the due
/// date and `completed_at` is normally filled from [`CompletionChange::apply`].
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

const TASK_COLUMNS: &str = "id, user_id, title, description, status, priority, due_date, \
                            completed_at, created_at, updated_at";

impl Task {
    /// Creates a new task
    ///
    /// A task created directly in `done` gets `completed_at = NOW()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner doesn't exist (foreign key violation)
    /// or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let completed_at = CompletionChange::for_transition(None, data.status)
            .apply(Utc::now())
            .flatten();

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, status, priority, due_date, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(completed_at)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID regardless of owner
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, only if it belongs to `user_id`
    pub async fn find_by_id_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists all of a user's tasks, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task owned by `user_id`
    ///
    /// Only `Some` fields in `data` are written; `updated_at` is always
    /// refreshed. Returns None if the task doesn't exist or has another owner.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.completed_at.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed_at = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(completed_at) = data.completed_at {
            q = q.bind(completed_at);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task owned by `user_id`, returning the deleted row
    pub async fn delete_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists open tasks due strictly before `before`, across all users
    ///
    /// Open means `completed_at IS NULL` and status is not `done`. Used by
    /// the reminder job with `before = tomorrow`.
    pub async fn list_due_before(
        pool: &PgPool,
        before: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE due_date < $1
              AND completed_at IS NULL
              AND status <> 'done'
            ORDER BY user_id, due_date ASC, created_at ASC
            "#
        ))
        .bind(before)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Day the task counts as completed for timing purposes
    ///
    /// Falls back to `updated_at` for done tasks that predate the
    /// completion timestamp.
    pub fn completion_instant(&self) -> Option<DateTime<Utc>> {
        if !self.status.is_done() {
            return None;
        }
        Some(self.completed_at.unwrap_or(self.updated_at))
    }
}
