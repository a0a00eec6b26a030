/// SendGrid v3 mail client

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use super::{DeliveryReceipt, EmailConfig, EmailMessage, MailError, Mailer};

/// SendGrid mail send endpoint
pub const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// [`Mailer`] backed by the SendGrid HTTP API
#[derive(Debug, Clone)]
pub struct SendGridMailer {
    config: EmailConfig,
    http: reqwest::Client,
    endpoint: String,
}

impl SendGridMailer {
    pub fn new(config: EmailConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            config,
            http,
            endpoint: SENDGRID_SEND_URL.to_string(),
        }
    }

    /// Points the client at another endpoint (sandbox or local stub)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn sender(&self) -> &str {
        &self.config.sender
    }
}

/// Request body for one HTML message
pub fn sendgrid_payload(sender: &str, message: &EmailMessage) -> JsonValue {
    json!({
        "personalizations": [{ "to": [{ "email": message.to }] }],
        "from": { "email": sender },
        "subject": message.subject,
        "content": [{ "type": "text/html", "value": message.html }],
    })
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        let api_key = self.config.api_key.as_ref().ok_or(MailError::NotConfigured)?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&sendgrid_payload(&self.config.sender, message))
            .send()
            .await?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                to = %message.to,
                "SendGrid rejected message"
            );
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            status = status.as_u16(),
            message_id = ?message_id,
            to = %message.to,
            "Email accepted"
        );

        Ok(DeliveryReceipt {
            status_code: status.as_u16(),
            message_id,
        })
    }
}
