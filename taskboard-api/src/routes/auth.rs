/// Account endpoints
///
/// Sessions are HS256 tokens delivered both as the `token` cookie and in the
/// response body, so browser and non-browser clients can authenticate.
///
/// # Endpoints
///
/// - `POST /api/user/register` - Create an email/password account
/// - `POST /api/user/login` - Log in with email and password
/// - `POST /api/user/logout` - Clear the session cookie
/// - `POST /api/user/google-oauth` - Sign in with a Google ID token
/// - `POST /api/user/auth` - Return the authenticated user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        jwt,
        middleware::{session_cookie, session_cookie_removal, AuthContext},
        password,
    },
    models::user::{CreateGoogleUser, CreateUser, User},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Google sign-in request
#[derive(Debug, Deserialize, Validate)]
pub struct GoogleSignInRequest {
    /// Google ID token from the browser sign-in flow
    #[serde(default)]
    #[validate(length(min = 1, message = "Credential is required"))]
    pub credential: String,
}

/// Session payload returned by register, login and Google sign-in
#[derive(Debug, Serialize)]
pub struct SessionData {
    pub user: User,

    /// Same value as the `token` cookie
    pub token: String,
}

/// Issues a token and sets it as the session cookie
fn start_session(state: &AppState, jar: CookieJar, user: &User) -> ApiResult<(CookieJar, String)> {
    let token = jwt::issue_session(user.id, state.jwt_secret())?;
    let jar = jar.add(session_cookie(token.clone(), state.config.api.production));
    Ok((jar, token))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/user/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the `token` cookie set:
///
/// ```json
/// {
///   "success": true,
///   "message": "New user registered successfully",
///   "data": { "user": { "id": "uuid", "name": "Ada Lovelace", ... }, "token": "eyJ..." }
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already exists
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieJar, Json<ApiResponse<SessionData>>)> {
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_string();
    req.validate()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User email already exists, please use a different email".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    // A concurrent registration can still hit the unique index; that maps to 409 as well
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let (jar, token) = start_session(&state, jar, &user)?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(ApiResponse::with_message(
            "New user registered successfully",
            SessionData { user, token },
        )),
    ))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /api/user/login
/// Content-Type: application/json
///
/// { "email": "ada@example.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `401 Unauthorized`: Unknown email, wrong password, or a Google-only account
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<SessionData>>)> {
    req.email = req.email.trim().to_string();
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    let valid = password::verify_account_password(&req.password, user.password_hash.as_deref())?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Password check failed");
        return Err(invalid());
    }

    let (jar, token) = start_session(&state, jar, &user)?;
    let message = format!("User {} logged in successfully", user.name);

    Ok((
        jar,
        Json(ApiResponse::with_message(message, SessionData { user, token })),
    ))
}

/// Logout
///
/// Always succeeds; the session cookie is replaced by an expired one.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    (
        jar.add(session_cookie_removal()),
        Json(ApiResponse::message("User logged out successfully")),
    )
}

/// Sign in with Google
///
/// Resolves the account by Google id, then by email (linking the Google id
/// to an existing email account), and otherwise creates a new account.
///
/// # Endpoint
///
/// ```text
/// POST /api/user/google-oauth
/// Content-Type: application/json
///
/// { "credential": "<google id token>" }
/// ```
///
/// # Errors
///
/// - `503 Service Unavailable`: `GOOGLE_CLIENT_ID` is not configured
/// - `422 Unprocessable Entity`: Missing credential
/// - `401 Unauthorized`: Google rejected the token or it targets another client
/// - `403 Forbidden`: The Google account email is not verified
/// - `502 Bad Gateway`: Google could not be reached
pub async fn google_oauth(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<GoogleSignInRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<SessionData>>)> {
    let verifier = state
        .google
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("Google sign-in is not configured".to_string()))?;

    req.validate()?;

    let identity = verifier.verify(&req.credential).await?;

    let user = match User::find_by_google_id(&state.db, &identity.google_id).await? {
        Some(user) => user,
        None => match User::find_by_email(&state.db, &identity.email).await? {
            Some(existing) => {
                tracing::info!(user_id = %existing.id, "Linking Google account to existing user");
                User::link_google(&state.db, existing.id, &identity.google_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?
            }
            None => {
                let user = User::create_google(
                    &state.db,
                    CreateGoogleUser {
                        name: identity.name,
                        email: identity.email,
                        google_id: identity.google_id,
                    },
                )
                .await?;
                tracing::info!(user_id = %user.id, "User registered with Google");
                user
            }
        },
    };

    let (jar, token) = start_session(&state, jar, &user)?;
    let message = format!("User {} logged in successfully", user.name);

    Ok((
        jar,
        Json(ApiResponse::with_message(message, SessionData { user, token })),
    ))
}

/// Current user
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid session, or the account was deleted
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(ApiResponse::with_message("Authenticated user", user)))
}
