/// End-to-end API flows against a real database
///
/// These tests require a running PostgreSQL database (and Redis for the
/// cache flow) and are ignored by default. Run with: cargo test --test task_flow_tests -- --ignored --test-threads=1

mod common;

use axum::http::{header, Method, StatusCode};
use chrono::{Duration, Utc};
use common::{app, cached_db_state, db_state, request, send, RecordingMailer};
use serde_json::{json, Value};
use taskboard_shared::models::user::User;
use taskboard_shared::redis::cache::{task_key, user_tasks_key};
use uuid::Uuid;

/// Registers a fresh user and returns (user id, Authorization header value)
async fn register(app: &axum::Router, name: &str) -> (Uuid, String) {
    let (status, headers, body) = send(
        app,
        request(
            Method::POST,
            "/api/user/register",
            None,
            Some(json!({
                "name": name,
                "email": format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                "password": "secret1"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(body["data"]["user"].get("password_hash").is_none());

    let user_id = body["data"]["user"]["id"].as_str().unwrap().parse().unwrap();
    let token = body["data"]["token"].as_str().unwrap();
    (user_id, format!("Bearer {}", token))
}

async fn create(app: &axum::Router, auth: &str, body: Value) -> Value {
    let (status, _, body) = send(
        app,
        request(Method::POST, "/api/tasks", Some(auth), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_register_login_and_current_user() {
    let state = db_state().await;
    let db = state.db.clone();
    let app = app(state);
    let email = format!("grace-{}@example.com", Uuid::new_v4());

    let (status, _, _) = send(
        &app,
        request(
            Method::POST,
            "/api/user/register",
            None,
            Some(json!({"name": "Grace", "email": email, "password": "secret1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(
        &app,
        request(
            Method::POST,
            "/api/user/register",
            None,
            Some(json!({"name": "Grace", "email": email.to_uppercase(), "password": "secret1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    let (status, _, body) = send(
        &app,
        request(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": email, "password": "wrong-password"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _, body) = send(
        &app,
        request(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": email, "password": "secret1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User Grace logged in successfully");

    let (status, _, _) = send(
        &app,
        request(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": email.to_uppercase(), "password": "secret1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let auth = format!("Bearer {}", body["data"]["token"].as_str().unwrap());
    let (status, _, body) = send(
        &app,
        request(Method::POST, "/api/user/auth", Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Grace");

    let user_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();
    User::delete(&db, user_id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_task_crud_lifecycle() {
    let state = db_state().await;
    let db = state.db.clone();
    let app = app(state);
    let (user_id, auth) = register(&app, "Crud").await;
    let today = Utc::now().date_naive();

    let first = create(
        &app,
        &auth,
        json!({"title": "Write report", "priority": "high", "due_date": today}),
    )
    .await;
    assert_eq!(first["status"], "todo");
    assert_eq!(first["due_status"], json!({"kind": "today"}));

    create(&app, &auth, json!({"title": "Plan trip", "description": "Book a report slot"})).await;
    create(&app, &auth, json!({"title": "Groceries", "priority": "low"})).await;

    let (status, _, body) = send(&app, request(Method::GET, "/api/tasks", Some(&auth), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Total 3 tasks");
    assert_eq!(body["data"][0]["title"], "Groceries");

    let (_, _, body) = send(
        &app,
        request(Method::GET, "/api/tasks?search=REPORT&sort=priorityHigh", Some(&auth), None),
    )
    .await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Write report", "Plan trip"]);

    let id = first["id"].as_str().unwrap();
    let (status, _, body) = send(
        &app,
        request(Method::GET, &format!("/api/tasks/{}", id), Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Write report");

    let (status, _, body) = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/tasks/{}", id),
            Some(&auth),
            Some(json!({"title": "Write final report", "due_date": null})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Write final report");
    assert!(body["data"]["due_date"].is_null());
    assert!(body["data"].get("due_status").is_none());

    let (status, _, body) = send(
        &app,
        request(Method::DELETE, &format!("/api/tasks/{}", id), Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task Write final report deleted successfully");

    let (status, _, _) = send(
        &app,
        request(Method::GET, &format!("/api/tasks/{}", id), Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    User::delete(&db, user_id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_completion_timestamp_and_stats() {
    let state = db_state().await;
    let db = state.db.clone();
    let app = app(state);
    let (user_id, auth) = register(&app, "Stats").await;

    let task = create(&app, &auth, json!({"title": "Ship it"})).await;
    assert!(task["completed_at"].is_null());
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (_, _, body) = send(
        &app,
        request(Method::PUT, &uri, Some(&auth), Some(json!({"status": "done"}))),
    )
    .await;
    assert!(body["data"]["completed_at"].is_string());

    let (_, _, body) = send(&app, request(Method::GET, "/api/tasks/stats", Some(&auth), None)).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["by_status"]["done"], 1);
    assert_eq!(body["data"]["percentages"]["completion"], 100);
    assert_eq!(body["data"]["streaks"]["current"], 1);
    assert_eq!(body["data"]["last_seven_days"].as_array().unwrap().len(), 7);

    let (_, _, body) = send(
        &app,
        request(Method::PUT, &uri, Some(&auth), Some(json!({"status": "review"}))),
    )
    .await;
    assert!(body["data"]["completed_at"].is_null());

    let (_, _, body) = send(&app, request(Method::GET, "/api/tasks/board", Some(&auth), None)).await;
    let columns = body["data"].as_array().unwrap();
    assert_eq!(columns.len(), 5);
    assert_eq!(columns[3]["label"], "Review");
    assert_eq!(columns[3]["tasks"][0]["title"], "Ship it");

    User::delete(&db, user_id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_tasks_are_scoped_to_owner() {
    let state = db_state().await;
    let db = state.db.clone();
    let app = app(state);
    let (owner_id, owner) = register(&app, "Owner").await;
    let (other_id, other) = register(&app, "Other").await;

    let task = create(&app, &owner, json!({"title": "Private"})).await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    for method in [Method::GET, Method::DELETE] {
        let (status, _, _) = send(&app, request(method, &uri, Some(&other), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    let (status, _, _) = send(
        &app,
        request(Method::PUT, &uri, Some(&other), Some(json!({"title": "Mine now"}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, body) = send(&app, request(Method::GET, "/api/tasks", Some(&other), None)).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    User::delete(&db, owner_id).await.unwrap();
    User::delete(&db, other_id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_reminders_and_manual_trigger() {
    let mailer = RecordingMailer::shared();
    let state = db_state().await.with_mailer(mailer.clone());
    let db = state.db.clone();
    let app = app(state);
    let (user_id, auth) = register(&app, "Reminded").await;
    let today = Utc::now().date_naive();

    create(&app, &auth, json!({"title": "Due today", "due_date": today})).await;
    create(
        &app,
        &auth,
        json!({"title": "Due tomorrow", "due_date": today + Duration::days(1)}),
    )
    .await;

    let (_, _, body) = send(&app, request(Method::GET, "/api/tasks/reminders", Some(&auth), None)).await;
    let kinds: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&"due_today"));
    assert!(kinds.contains(&"due_tomorrow"));

    let (status, _, body) = send(
        &app,
        request(Method::POST, "/api/notifications/trigger-reminders", Some(&auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["sent"].as_u64().unwrap() >= 1);

    let user = User::find_by_id(&db, user_id).await.unwrap().unwrap();
    let mine: Vec<_> = mailer.sent().into_iter().filter(|m| m.to == user.email).collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].subject, "Task Reminder: 1 Due Today");

    User::delete(&db, user_id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_cached_reads_see_writes() {
    let state = cached_db_state().await;
    let db = state.db.clone();
    let cache = state.cache.clone().unwrap();
    let app = app(state);
    let (user_id, auth) = register(&app, "Cached").await;

    let task = create(&app, &auth, json!({"title": "Draft"})).await;
    let task_id: Uuid = task["id"].as_str().unwrap().parse().unwrap();
    let uri = format!("/api/tasks/{}", task_id);

    // Prime both entries
    let (_, _, body) = send(&app, request(Method::GET, "/api/tasks", Some(&auth), None)).await;
    assert_eq!(body["data"][0]["title"], "Draft");
    let (_, _, body) = send(&app, request(Method::GET, &uri, Some(&auth), None)).await;
    assert_eq!(body["data"]["title"], "Draft");
    assert!(cache.task(task_id).await.unwrap().is_some());
    assert!(cache.user_tasks(user_id).await.unwrap().is_some());

    let (status, _, _) = send(
        &app,
        request(Method::PUT, &uri, Some(&auth), Some(json!({"title": "Final"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let exists: i64 = cache
        .client()
        .query(
            redis::cmd("EXISTS")
                .arg(user_tasks_key(user_id))
                .arg(task_key(task_id)),
        )
        .await
        .unwrap();
    assert_eq!(exists, 0);

    let (_, _, body) = send(&app, request(Method::GET, "/api/tasks", Some(&auth), None)).await;
    assert_eq!(body["data"][0]["title"], "Final");
    let (_, _, body) = send(&app, request(Method::GET, &uri, Some(&auth), None)).await;
    assert_eq!(body["data"]["title"], "Final");

    let (status, _, _) = send(&app, request(Method::DELETE, &uri, Some(&auth), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, request(Method::GET, &uri, Some(&auth), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, _, body) = send(&app, request(Method::GET, "/api/tasks", Some(&auth), None)).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    User::delete(&db, user_id).await.unwrap();
}
