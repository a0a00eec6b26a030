/// Notification endpoints
///
/// # Endpoints
///
/// - `POST /api/notifications/send-test` - Send the test email to an address
/// - `POST /api/notifications/trigger-reminders` - Run the reminder job now

use crate::{
    app::AppState,
    error::ApiResult,
    routes::ApiResponse,
};
use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    email::DeliveryReceipt,
    reminders::{format::test_message, ReminderRunSummary},
};
use validator::Validate;

/// Test email request
#[derive(Debug, Deserialize, Validate)]
pub struct SendTestRequest {
    #[serde(default)]
    #[validate(email(message = "Email is required"))]
    pub email: String,
}

/// Send the test email
///
/// # Endpoint
///
/// ```text
/// POST /api/notifications/send-test
/// Content-Type: application/json
///
/// { "email": "ada@example.com" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Email sent successfully",
///   "data": { "status_code": 202, "message_id": "abc123" }
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing or malformed email
/// - `503 Service Unavailable`: Email delivery is not configured
/// - `502 Bad Gateway`: The provider rejected the message or could not be reached
pub async fn send_test(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(mut req): Json<SendTestRequest>,
) -> ApiResult<Json<ApiResponse<DeliveryReceipt>>> {
    req.email = req.email.trim().to_string();
    req.validate()?;

    let receipt = state.mailer.send(&test_message(&req.email)).await?;

    tracing::info!(
        user_id = %auth.user_id,
        status_code = receipt.status_code,
        message_id = ?receipt.message_id,
        "Test email sent"
    );

    Ok(Json(ApiResponse::with_message(
        "Email sent successfully",
        receipt,
    )))
}

/// Run the reminder job immediately
///
/// Scans every user's open tasks, not only the caller's, exactly like the
/// scheduled run.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Task reminder notifications triggered successfully",
///   "data": { "users": 3, "sent": 2, "failed": 0, "skipped": 1 }
/// }
/// ```
pub async fn trigger_reminders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<ReminderRunSummary>>> {
    tracing::info!(user_id = %auth.user_id, "Reminder run triggered manually");

    let summary = state.reminder_job().run().await?;

    Ok(Json(ApiResponse::with_message(
        "Task reminder notifications triggered successfully",
        summary,
    )))
}
