/// User model and database operations
///
/// A user signs in either with an email and password or with a Google
/// account. Email/password users carry an Argon2id hash; Google users carry
/// the Google subject identifier. An email/password account is linked to
/// Google the first time its owner signs in with a Google account that has
/// the same verified email.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE auth_provider AS ENUM ('email', 'google');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255),
///     google_id VARCHAR(255) UNIQUE,
///     auth_provider auth_provider NOT NULL DEFAULT 'email',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (password_hash IS NOT NULL OR google_id IS NOT NULL)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "JANE@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// How an account was originally created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Email,
    Google,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (case-insensitive via CITEXT)
    pub email: String,

    /// Argon2id password hash, absent for Google-only accounts
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,

    /// Google subject identifier once the account is linked
    #[serde(skip_serializing, default)]
    pub google_id: Option<String>,

    /// Provider the account was created with
    pub auth_provider: AuthProvider,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an email/password user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,

    /// Email address (uniqueness is case-insensitive)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Input for creating a user from a verified Google identity
#[derive(Debug, Clone)]
pub struct CreateGoogleUser {
    pub name: String,
    pub email: String,
    pub google_id: String,
}

impl User {
    /// Creates an email/password user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint
    /// violation) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, auth_provider)
            VALUES ($1, $2, $3, 'email')
            RETURNING id, name, email, password_hash, google_id, auth_provider,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Creates a Google-only user (no password)
    pub async fn create_google(
        pool: &PgPool,
        data: CreateGoogleUser,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, google_id, auth_provider)
            VALUES ($1, $2, $3, 'google')
            RETURNING id, name, email, password_hash, google_id, auth_provider,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.google_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, google_id, auth_provider,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Email lookup is case-insensitive. The parameter is cast to CITEXT;
    /// a bare text parameter would compare as `text = text`.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, google_id, auth_provider,
                   created_at, updated_at
            FROM users
            WHERE email = $1::citext
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by Google subject identifier
    pub async fn find_by_google_id(
        pool: &PgPool,
        google_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, google_id, auth_provider,
                   created_at, updated_at
            FROM users
            WHERE google_id = $1
            "#,
        )
        .bind(google_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Attaches a Google identity to an existing account
    ///
    /// Returns None if the user doesn't exist.
    pub async fn link_google(
        pool: &PgPool,
        id: Uuid,
        google_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET google_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, password_hash, google_id, auth_provider,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(google_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user and, through the foreign key cascade, their tasks
    ///
    /// Returns true if the user was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether this account can sign in with a password
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: Some("$argon2id$v=19$...".to_string()),
            google_id: Some("1234567890".to_string()),
            auth_provider: AuthProvider::Email,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_serialization_hides_credentials() {
        let json = serde_json::to_value(sample_user()).unwrap();

        assert!(json.get("password_hash").is_none());
        assert!(json.get("google_id").is_none());
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["auth_provider"], "email");
    }

    #[test]
    fn test_has_password() {
        let mut user = sample_user();
        assert!(user.has_password());

        user.password_hash = None;
        assert!(!user.has_password());
    }

    #[test]
    fn test_auth_provider_serde() {
        assert_eq!(
            serde_json::to_string(&AuthProvider::Google).unwrap(),
            "\"google\""
        );
        let parsed: AuthProvider = serde_json::from_str("\"email\"").unwrap();
        assert_eq!(parsed, AuthProvider::Email);
    }
}
