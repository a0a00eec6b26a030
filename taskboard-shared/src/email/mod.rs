/// Outgoing email
///
/// Everything that sends mail goes through the [`Mailer`] trait so the
/// reminder job and the API can be exercised without a provider. The
/// production implementation is [`sendgrid::SendGridMailer`].
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::email::{EmailConfig, EmailMessage, Mailer};
/// use taskboard_shared::email::sendgrid::SendGridMailer;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = SendGridMailer::new(EmailConfig::from_env());
/// let receipt = mailer.send(&EmailMessage {
///     to: "user@example.com".to_string(),
///     subject: "Hello".to_string(),
///     html: "<p>Hi</p>".to_string(),
/// }).await?;
/// println!("accepted with status {}", receipt.status_code);
/// # Ok(())
/// # }
/// ```

pub mod sendgrid;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sender used when `SENDER_EMAIL` is unset
pub const DEFAULT_SENDER: &str = "notifications@smarttaskmanager.com";

/// Email provider settings
#[derive(Clone, Default)]
pub struct EmailConfig {
    /// SendGrid API key; None means mail is not configured
    pub api_key: Option<String>,

    /// From address
    pub sender: String,
}

impl EmailConfig {
    /// Reads `SENDGRID_API_KEY` and `SENDER_EMAIL`
    ///
    /// An empty API key counts as unset.
    pub fn from_env() -> Self {
        let api_key = std::env::var("SENDGRID_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let sender = std::env::var("SENDER_EMAIL")
            .ok()
            .filter(|sender| !sender.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());

        Self { api_key, sender }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("sender", &self.sender)
            .finish()
    }
}

/// A single HTML email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    /// HTTP status returned by the provider
    pub status_code: u16,

    /// Provider message id, when returned
    pub message_id: Option<String>,
}

/// Mail errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email delivery is not configured")]
    NotConfigured,

    #[error("Email provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Something that can deliver an [`EmailMessage`]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError>;
}
