//! Outbound email delivery through an HTTP mail API.

use serde::Serialize;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The mail API refused the message.
    #[error("mail API rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Thin client over the transactional mail API.
#[derive(Clone)]
pub struct Mailer {
    endpoint: Url,
    api_key: String,
    from: String,
    http_client: reqwest::Client,
}

impl Mailer {
    pub fn new(endpoint: Url, api_key: String, from: String) -> Self {
        Self {
            endpoint,
            api_key,
            from,
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Send one message. One attempt; the dispatcher owns retries.
    pub async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let payload = OutboundMessage {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MailerError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
