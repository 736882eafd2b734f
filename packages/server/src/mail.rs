use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Outgoing mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        if recipient.is_empty() || !recipient.contains('@') {
            return Err(MailError::InvalidRecipient(recipient.to_string()));
        }
        info!(
            from = %self.sender,
            to = %recipient,
            subject = %subject,
            body_len = html_body.len(),
            "Outgoing mail"
        );
        Ok(())
    }
}

fn verification_message(code: &str) -> (String, String) {
    let subject = format!("Your Game Orbit verification code - {code}");
    let body = format!(
        "<p>Welcome to Game Orbit!</p>\
         <p>Your verification code is <strong>{code}</strong>.</p>\
         <p>The code is valid for 30 minutes.</p>"
    );
    (subject, body)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Contact-form submission as it arrives from the site.
pub struct Feedback<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub user_email: &'a str,
    pub message: &'a str,
    pub category: &'a str,
}

/// Subject is `"{category} - {phone}"`; user input is escaped in the body.
pub fn feedback_message(feedback: &Feedback<'_>) -> (String, String) {
    let subject = format!("{} - {}", feedback.category, feedback.phone);
    let body = format!(
        "<p><strong>Name:</strong> {}</p>\
         <p><strong>Phone:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p>{}</p>",
        escape_html(feedback.name),
        escape_html(feedback.phone),
        escape_html(feedback.user_email),
        escape_html(feedback.message).replace('\n', "<br>"),
    );
    (subject, body)
}

/// Send a verification code without blocking the request; failures are logged.
pub fn spawn_verification_mail(mailer: Arc<dyn Mailer>, recipient: String, code: String) {
    tokio::spawn(async move {
        let (subject, body) = verification_message(&code);
        if let Err(e) = mailer.send(&recipient, &subject, &body).await {
            warn!(to = %recipient, error = %e, "Failed to send verification mail");
        }
    });
}
