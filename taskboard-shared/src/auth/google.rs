/// Google Sign-In ID token verification
///
/// The browser obtains an ID token ("credential") from Google Identity
/// Services and posts it to the API. The token is checked against Google's
/// tokeninfo endpoint, which validates the signature and expiry; this module
/// then checks the audience and that the email is verified.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Google's tokeninfo endpoint
pub const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from Google ID token verification
#[derive(Debug, thiserror::Error)]
pub enum GoogleAuthError {
    /// Google refused the token (bad signature, expired, malformed)
    #[error("Google rejected the credential")]
    Rejected,

    #[error("Credential was issued for another application")]
    AudienceMismatch,

    #[error("Google account email is missing or unverified")]
    EmailUnverified,

    #[error("Google tokeninfo request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Claims returned by tokeninfo that we use
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub aud: String,
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Google sends `"true"`/`"false"` strings; booleans are accepted too
    #[serde(default)]
    pub email_verified: Option<JsonValue>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Verified Google identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    /// Stable Google subject id
    pub google_id: String,
    pub email: String,
    pub name: String,
}

fn is_verified(value: Option<&JsonValue>) -> bool {
    match value {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Checks tokeninfo claims against `client_id`
pub fn identity_from_claims(
    info: TokenInfo,
    client_id: &str,
) -> Result<GoogleIdentity, GoogleAuthError> {
    if info.aud != client_id {
        return Err(GoogleAuthError::AudienceMismatch);
    }

    let email = match info.email {
        Some(email) if !email.is_empty() && is_verified(info.email_verified.as_ref()) => email,
        _ => return Err(GoogleAuthError::EmailUnverified),
    };

    let name = info
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Ok(GoogleIdentity {
        google_id: info.sub,
        email,
        name,
    })
}

/// Verifies Google ID tokens for one OAuth client
#[derive(Debug, Clone)]
pub struct GoogleVerifier {
    client_id: String,
    http: reqwest::Client,
    endpoint: String,
}

impl GoogleVerifier {
    pub fn new(client_id: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client_id: client_id.into(),
            http,
            endpoint: TOKENINFO_URL.to_string(),
        }
    }

    /// Uses another tokeninfo-compatible endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Verifies `id_token` and returns the identity it asserts
    pub async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, GoogleAuthError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "Google tokeninfo rejected credential");
            return Err(GoogleAuthError::Rejected);
        }

        let info: TokenInfo = response.json().await?;
        identity_from_claims(info, &self.client_id)
    }
}
