/// Task endpoints
///
/// Every route is authenticated and scoped to the caller: a task owned by
/// someone else answers 404 exactly like a missing one.
///
/// Reads go through the optional Redis cache (cache-aside); every write
/// invalidates the owner's list entry and the task's own entry. A cache
/// failure is logged and the request continues against PostgreSQL.
///
/// Calendar-dependent answers (due badges, past due-date check, statistics,
/// reminders) use the `utc_offset_minutes` query parameter when present and
/// the configured default otherwise.
///
/// # Endpoints
///
/// - `GET    /api/tasks` - List with search, filters and sort
/// - `POST   /api/tasks` - Create
/// - `GET    /api/tasks/board` - Kanban columns
/// - `GET    /api/tasks/stats` - Analytics report
/// - `GET    /api/tasks/reminders` - In-app reminder candidates
/// - `GET    /api/tasks/:id` - Details
/// - `PUT    /api/tasks/:id` - Partial update
/// - `DELETE /api/tasks/:id` - Delete

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Path, Query},
    routes::ApiResponse,
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use taskboard_shared::{
    analytics::{self, TaskStats},
    auth::middleware::AuthContext,
    board::{build_board, BoardColumn},
    calendar,
    models::task::{CompletionChange, CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
    query::{TaskQuery, TaskSort},
    reminders::{due_status, upcoming_alerts, DueStatus, ReminderAlert},
};
use uuid::Uuid;
use validator::Validate;

/// Calendar query parameter accepted by every task route
#[derive(Debug, Default, Deserialize)]
pub struct OffsetParams {
    /// Minutes east of UTC for the caller's calendar
    pub utc_offset_minutes: Option<i32>,
}

/// Listing query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub sort: TaskSort,
    pub utc_offset_minutes: Option<i32>,
}

impl ListParams {
    fn query(&self) -> TaskQuery {
        TaskQuery {
            search: self.search.clone(),
            priority: self.priority,
            status: self.status,
            sort: self.sort,
        }
    }
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Title is required (at most 255 characters)"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub priority: Option<TaskPriority>,

    #[serde(default, alias = "dueDate")]
    pub due_date: Option<NaiveDate>,
}

/// Partial update request
///
/// Absent fields are left unchanged; `"due_date": null` clears the due date.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty (at most 255 characters)"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default, alias = "dueDate", deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<NaiveDate>>,
}

/// Maps a present field (including `null`) to `Some`
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A task with its due-date badge
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_status: Option<DueStatus>,
}

impl TaskView {
    pub fn new(task: Task, today: NaiveDate) -> Self {
        let due_status = due_status(task.due_date, task.status, today);
        Self { task, due_status }
    }
}

fn views(tasks: Vec<Task>, today: NaiveDate) -> Vec<TaskView> {
    tasks.into_iter().map(|task| TaskView::new(task, today)).collect()
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Offset for this request; validated before any database access
pub fn resolve_offset(state: &AppState, minutes: Option<i32>) -> ApiResult<FixedOffset> {
    match minutes {
        None => Ok(state.config.schedule.utc_offset),
        Some(minutes) => calendar::offset_from_minutes(minutes).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "utc_offset_minutes must be between {} and {}",
                calendar::MIN_OFFSET_MINUTES,
                calendar::MAX_OFFSET_MINUTES
            ))
        }),
    }
}

/// The caller's task list, newest first, via the cache when available
async fn load_user_tasks(state: &AppState, user_id: Uuid) -> ApiResult<Vec<Task>> {
    if let Some(cache) = &state.cache {
        match cache.user_tasks(user_id).await {
            Ok(Some(tasks)) => return Ok(tasks),
            Ok(None) => {}
            Err(e) => tracing::warn!(%user_id, error = %e, "Task list cache read failed"),
        }
    }

    let tasks = Task::list_by_user(&state.db, user_id).await?;

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.store_user_tasks(user_id, &tasks).await {
            tracing::warn!(%user_id, error = %e, "Task list cache write failed");
        }
    }

    Ok(tasks)
}

/// One of the caller's tasks, via the cache when available
async fn load_task(state: &AppState, user_id: Uuid, task_id: Uuid) -> ApiResult<Task> {
    if let Some(cache) = &state.cache {
        match cache.task(task_id).await {
            Ok(Some(task)) if task.user_id == user_id => return Ok(task),
            Ok(_) => {}
            Err(e) => tracing::warn!(%task_id, error = %e, "Task cache read failed"),
        }
    }

    let task = Task::find_by_id_for_user(&state.db, task_id, user_id)
        .await?
        .ok_or_else(task_not_found)?;

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.store_task(&task).await {
            tracing::warn!(%task_id, error = %e, "Task cache write failed");
        }
    }

    Ok(task)
}

async fn invalidate(state: &AppState, user_id: Uuid, task_id: Option<Uuid>) {
    if let Some(cache) = &state.cache {
        if let Err(e) = cache.invalidate(user_id, task_id).await {
            tracing::warn!(%user_id, task_id = ?task_id, error = %e, "Task cache invalidation failed");
        }
    }
}

/// List the caller's tasks
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks?search=report&priority=high&status=todo&sort=dueDate&utc_offset_minutes=120
/// ```
///
/// `sort` is one of `newest` (default), `priorityHigh`, `priorityLow`,
/// `dueDate`, `status`.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Total 2 tasks",
///   "data": [{ "id": "uuid", "title": "...", "due_status": { "kind": "today" }, ... }]
/// }
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<Vec<TaskView>>>> {
    let offset = resolve_offset(&state, params.utc_offset_minutes)?;
    let today = calendar::today(offset);

    let tasks = params.query().apply(load_user_tasks(&state, auth.user_id).await?);
    let count = tasks.len();

    tracing::debug!(user_id = %auth.user_id, count, "Listed tasks");

    Ok(Json(ApiResponse::with_message(
        format!("Total {} {}", count, if count == 1 { "task" } else { "tasks" }),
        views(tasks, today),
    )))
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Content-Type: application/json
///
/// {
///   "title": "Write report",
///   "description": "Quarterly numbers",
///   "status": "todo",
///   "priority": "high",
///   "due_date": "2025-05-12"
/// }
/// ```
///
/// `status` defaults to `todo`, `priority` to `medium`.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing or too long title
/// - `400 Bad Request`: Due date before the caller's today
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<OffsetParams>,
    Json(mut req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TaskView>>)> {
    let offset = resolve_offset(&state, params.utc_offset_minutes)?;
    let today = calendar::today(offset);

    req.title = req.title.trim().to_string();
    req.validate()?;

    if matches!(req.due_date, Some(due) if due < today) {
        return Err(ApiError::BadRequest(
            "Due date cannot be in the past".to_string(),
        ));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: auth.user_id,
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or(TaskStatus::Todo),
            priority: req.priority.unwrap_or(TaskPriority::Medium),
            due_date: req.due_date,
        },
    )
    .await?;

    invalidate(&state, auth.user_id, None).await;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, "Task created");

    let message = format!("New task \"{}\" created successfully", task.title);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(message, TaskView::new(task, today))),
    ))
}

/// Task details
///
/// # Errors
///
/// - `404 Not Found`: Missing or owned by someone else
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Query(params): Query<OffsetParams>,
) -> ApiResult<Json<ApiResponse<TaskView>>> {
    let offset = resolve_offset(&state, params.utc_offset_minutes)?;
    let task = load_task(&state, auth.user_id, task_id).await?;

    Ok(Json(ApiResponse::data(TaskView::new(
        task,
        calendar::today(offset),
    ))))
}

/// Partial update
///
/// Moving a task into `done` stamps `completed_at`; moving it out clears
/// it. Past due dates are allowed here.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Empty or too long title
/// - `404 Not Found`: Missing or owned by someone else
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Query(params): Query<OffsetParams>,
    Json(mut req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<TaskView>>> {
    let offset = resolve_offset(&state, params.utc_offset_minutes)?;

    req.title = req.title.map(|title| title.trim().to_string());
    req.validate()?;

    // Read from the database, not the cache: the transition depends on the stored status
    let existing = Task::find_by_id_for_user(&state.db, task_id, auth.user_id)
        .await?
        .ok_or_else(task_not_found)?;

    let completed_at = req
        .status
        .map(|to| CompletionChange::for_transition(Some(existing.status), to))
        .and_then(|change| change.apply(Utc::now()));

    let task = Task::update(
        &state.db,
        task_id,
        auth.user_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            completed_at,
        },
    )
    .await?
    .ok_or_else(task_not_found)?;

    invalidate(&state, auth.user_id, Some(task_id)).await;

    tracing::info!(
        user_id = %auth.user_id,
        task_id = %task_id,
        from = existing.status.as_str(),
        to = task.status.as_str(),
        "Task updated"
    );

    Ok(Json(ApiResponse::with_message(
        "Task updated successfully",
        TaskView::new(task, calendar::today(offset)),
    )))
}

/// Delete a task
///
/// # Response
///
/// ```json
/// { "success": true, "message": "Task Write report deleted successfully", "data": { ... } }
/// ```
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let task = Task::delete_for_user(&state.db, task_id, auth.user_id)
        .await?
        .ok_or_else(task_not_found)?;

    invalidate(&state, auth.user_id, Some(task_id)).await;

    tracing::info!(user_id = %auth.user_id, task_id = %task_id, "Task deleted");

    let message = format!("Task {} deleted successfully", task.title);
    Ok(Json(ApiResponse::with_message(message, task)))
}

/// Kanban board
///
/// Five columns in order To Do, In Progress, Blocked, Review, Done. The
/// listing parameters narrow and order the cards within each column.
pub async fn task_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<Vec<BoardColumn<TaskView>>>>> {
    let offset = resolve_offset(&state, params.utc_offset_minutes)?;
    let tasks = params.query().apply(load_user_tasks(&state, auth.user_id).await?);

    let columns = build_board(views(tasks, calendar::today(offset)), |view| {
        view.task.status
    });

    Ok(Json(ApiResponse::data(columns)))
}

/// Analytics report
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "total": 8,
///     "by_status": { "todo": 2, "in_progress": 1, "blocked": 0, "review": 1, "done": 4 },
///     "timing": { "early": 2, "on_time": 1, "late": 1 },
///     "percentages": { "completion": 50, "early": 50, "on_time": 25, "late": 25 },
///     "streaks": { "current": 2, "longest": 3 },
///     "last_seven_days": [{ "date": "2025-05-04", "label": "Sun", "count": 0 }, ...],
///     "this_month": [{ "week": 2, "label": "Week 2", "count": 3 }]
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: `utc_offset_minutes` out of range
pub async fn task_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<OffsetParams>,
) -> ApiResult<Json<ApiResponse<TaskStats>>> {
    let offset = resolve_offset(&state, params.utc_offset_minutes)?;
    let tasks = load_user_tasks(&state, auth.user_id).await?;

    let stats = analytics::compute(&tasks, calendar::today(offset), offset);

    Ok(Json(ApiResponse::data(stats)))
}

/// In-app reminders
///
/// Open tasks due today, due tomorrow, or overdue by one or two days.
pub async fn task_reminders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<OffsetParams>,
) -> ApiResult<Json<ApiResponse<Vec<ReminderAlert>>>> {
    let offset = resolve_offset(&state, params.utc_offset_minutes)?;
    let tasks = load_user_tasks(&state, auth.user_id).await?;

    let alerts = upcoming_alerts(&tasks, calendar::today(offset));

    Ok(Json(ApiResponse::with_message(
        format!("{} reminder(s)", alerts.len()),
        alerts,
    )))
}
