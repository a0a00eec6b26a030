/// Extractors whose rejections use the API error body
///
/// axum's own `Path` and `Query` answer a bad id or an unknown enum value
/// with a plain-text 400. These wrappers route the rejection through
/// [`ApiError`] so every client error carries `{error, message}`.
///
/// ```no_run
/// use taskboard_api::extract::Path;
/// use uuid::Uuid;
///
/// async fn handler(Path(task_id): Path<Uuid>) -> String {
///     task_id.to_string()
/// }
/// ```

use axum::extract::FromRequestParts;

use crate::error::ApiError;

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);
