//! Transactional email
//!
//! [`Mailer::Brevo`] posts to the Brevo v3 SMTP API. [`Mailer::Outbox`]
//! keeps messages in memory and is used in development and tests.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;

const BREVO_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

/// A single message to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
}

impl OutgoingMail {
    pub fn new(to_email: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to_email: to_email.into(),
            to_name: None,
            subject: subject.into(),
            html: None,
            text: None,
        }
    }

    pub fn to_name(mut self, name: impl Into<String>) -> Self {
        self.to_name = Some(name.into());
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Build `{base}{path}?k=v&...` with percent-encoded values, for links
/// embedded in emails
pub fn link_with_params(base: &str, path: &str, params: &[(&str, &str)]) -> Option<String> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    reqwest::Url::parse_with_params(&joined, params)
        .ok()
        .map(String::from)
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Mail provider rejected message (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

// ============================================================================
// Brevo
// ============================================================================

#[derive(Debug, Clone)]
pub struct BrevoConfig {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub endpoint: String,
}

impl BrevoConfig {
    pub fn new(api_key: impl Into<String>, sender_email: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            sender_email: sender_email.into(),
            sender_name: None,
            endpoint: BREVO_ENDPOINT.to_string(),
        }
    }
}

#[derive(Serialize)]
struct BrevoAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoBody<'a> {
    sender: BrevoAddress<'a>,
    to: [BrevoAddress<'a>; 1],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct BrevoClient {
    http: reqwest::Client,
    config: BrevoConfig,
}

impl BrevoClient {
    pub fn new(http: reqwest::Client, config: BrevoConfig) -> Self {
        Self { http, config }
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let body = BrevoBody {
            sender: BrevoAddress {
                email: &self.config.sender_email,
                name: self.config.sender_name.as_deref(),
            },
            to: [BrevoAddress {
                email: &mail.to_email,
                name: mail.to_name.as_deref(),
            }],
            subject: &mail.subject,
            html_content: mail.html.as_deref(),
            text_content: mail.text.as_deref(),
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

// ============================================================================
// Outbox
// ============================================================================

/// In-memory sink. Clones share the same message list.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, mail: OutgoingMail) {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mail);
    }

    /// Snapshot of everything sent so far
    pub fn messages(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_to(&self, email: &str) -> Option<OutgoingMail> {
        self.messages()
            .into_iter()
            .rev()
            .find(|mail| mail.to_email == email)
    }

    pub fn len(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Mailer
// ============================================================================

#[derive(Debug, Clone)]
pub enum Mailer {
    Brevo(BrevoClient),
    Outbox(Outbox),
}

impl Mailer {
    pub async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        match self {
            Mailer::Brevo(client) => {
                client.send(&mail).await?;
                tracing::info!(subject = %mail.subject, "Email sent via Brevo");
            }
            Mailer::Outbox(outbox) => {
                tracing::info!(
                    to = %mail.to_email,
                    subject = %mail.subject,
                    "Email captured in outbox"
                );
                outbox.push(mail);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbox_records_messages() {
        let outbox = Outbox::new();
        let mailer = Mailer::Outbox(outbox.clone());

        mailer
            .send(OutgoingMail::new("a@example.com", "First").text("one"))
            .await
            .unwrap();
        mailer
            .send(OutgoingMail::new("b@example.com", "Second").html("<p>two</p>"))
            .await
            .unwrap();

        assert_eq!(outbox.len(), 2);
        let last = outbox.last_to("a@example.com").unwrap();
        assert_eq!(last.subject, "First");
        assert_eq!(last.text.as_deref(), Some("one"));
        assert!(outbox.last_to("c@example.com").is_none());
    }

    #[test]
    fn test_link_with_params_encodes_values() {
        let link = link_with_params(
            "https://blog.example.com/",
            "/reset-password",
            &[("token", "abc"), ("email", "a+b@example.com")],
        )
        .unwrap();
        assert_eq!(
            link,
            "https://blog.example.com/reset-password?token=abc&email=a%2Bb%40example.com"
        );
        assert!(link_with_params("not a url", "/x", &[]).is_none());
    }

    #[test]
    fn test_brevo_body_shape() {
        let body = BrevoBody {
            sender: BrevoAddress {
                email: "noreply@blog.dev",
                name: Some("Blog"),
            },
            to: [BrevoAddress {
                email: "reader@example.com",
                name: None,
            }],
            subject: "Hello",
            html_content: Some("<b>hi</b>"),
            text_content: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["sender"]["name"], "Blog");
        assert_eq!(json["to"][0]["email"], "reader@example.com");
        assert!(json["to"][0].get("name").is_none());
        assert_eq!(json["htmlContent"], "<b>hi</b>");
        assert!(json.get("textContent").is_none());
    }
}
