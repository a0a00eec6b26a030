/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::{google::GoogleVerifier, middleware::authenticate};
use taskboard_shared::email::{sendgrid::SendGridMailer, Mailer};
use taskboard_shared::redis::cache::TaskCache;
use taskboard_shared::reminders::ReminderJob;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Task read cache; None when Redis is not configured
    pub cache: Option<TaskCache>,

    /// Outgoing email
    pub mailer: Arc<dyn Mailer>,

    /// Google ID token verifier; None when sign-in is disabled
    pub google: Option<Arc<GoogleVerifier>>,
}

impl AppState {
    /// Creates state with a SendGrid mailer and no cache
    pub fn new(db: PgPool, config: Config) -> Self {
        let mailer: Arc<dyn Mailer> = Arc::new(SendGridMailer::new(config.email.clone()));
        let google = config
            .google_client_id
            .as_deref()
            .map(|client_id| Arc::new(GoogleVerifier::new(client_id)));

        Self {
            db,
            config: Arc::new(config),
            cache: None,
            mailer,
            google,
        }
    }

    pub fn with_cache(mut self, cache: TaskCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_google(mut self, verifier: GoogleVerifier) -> Self {
        self.google = Some(Arc::new(verifier));
        self
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Reminder job wired to this state's pool and mailer
    pub fn reminder_job(&self) -> ReminderJob {
        ReminderJob::new(
            self.db.clone(),
            self.mailer.clone(),
            self.config.schedule.utc_offset,
        )
        .with_max_in_flight(self.config.schedule.max_in_flight)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                          # Health check (public)
/// └── /api
///     ├── GET /                            # Route marker
///     ├── /user
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /logout
///     │   ├── POST /google-oauth
///     │   └── POST /auth                   # Current user (authenticated)
///     ├── /tasks                           # Authenticated
///     │   ├── GET    /                     # List (search/filter/sort)
///     │   ├── POST   /                     # Create
///     │   ├── GET    /board
///     │   ├── GET    /stats
///     │   ├── GET    /reminders
///     │   ├── GET    /:id
///     │   ├── PUT    /:id
///     │   └── DELETE /:id
///     └── /notifications                   # Authenticated
///         ├── POST /send-test
///         └── POST /trigger-reminders
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. Response compression
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
/// 5. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let user_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/google-oauth", post(routes::auth::google_oauth))
        .merge(
            Router::new()
                .route("/auth", post(routes::auth::current_user))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    jwt_auth_layer,
                )),
        );

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/board", get(routes::tasks::task_board))
        .route("/stats", get(routes::tasks::task_stats))
        .route("/reminders", get(routes::tasks::task_reminders))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let notification_routes = Router::new()
        .route("/send-test", post(routes::notifications::send_test))
        .route(
            "/trigger-reminders",
            post(routes::notifications::trigger_reminders),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/user", user_routes)
        .nest("/tasks", task_routes)
        .nest("/notifications", notification_routes);

    Router::new()
        .merge(health_routes)
        .route("/api", get(routes::health::api_root))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.api.cors_origins))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS for the browser client
///
/// `*` in the origin list mirrors any origin, since credentialed requests
/// cannot use a literal wildcard.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Reads the session token from the `token` cookie or a Bearer header,
/// validates it, then injects AuthContext into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret()).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Rejected unauthenticated request");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
