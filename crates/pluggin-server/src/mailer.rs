//! Outbound email. Delivery is an external collaborator: the store rows a
//! send depends on are durable before any mail leaves the process, and
//! newsletter welcomes are fire-and-forget.

use async_trait::async_trait;
use serde_json::json;
use std::fmt::{Display, Formatter};
use tokio::sync::Mutex;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailError(pub String);

impl Display for MailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MailError {}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// Resend REST client, the delivery service the shop runs against.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    #[must_use]
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| MailError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(MailError(format!(
                "mail delivery rejected with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Swallows every send. Default when no delivery key is configured.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<(), MailError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Captures sends for tests, the same seam the store's fake backend covers.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        self.sent.lock().await.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

#[must_use]
pub(crate) fn login_code_email(code: &str) -> (String, String) {
    let subject = "Your PLUGG'IN Login Code".to_string();
    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
           <h1>PLUGG'IN</h1>\
           <p>Your login verification code:</p>\
           <h2 style=\"letter-spacing: 5px; font-family: monospace;\">{code}</h2>\
           <p>This code will expire in 10 minutes.</p>\
           <p style=\"color: #999;\">If you didn't request this code, please ignore this email.</p>\
         </div>"
    );
    (subject, html)
}

#[must_use]
pub(crate) fn welcome_email() -> (String, String) {
    let subject = "Welcome to PLUGG'IN Newsletter!".to_string();
    let html = "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
                  <h1>Welcome to PLUGG'IN!</h1>\
                  <p>Thank you for subscribing. You'll be the first to know about new drops,\
                     exclusive discounts and limited edition collections.</p>\
                  <p style=\"color: #999;\">You can unsubscribe at any time.</p>\
                </div>"
        .to_string();
    (subject, html)
}
