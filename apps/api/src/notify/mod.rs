//! Outbound notifications. The reset flow only needs "deliver this link to
//! this person"; how it is delivered is behind `Notifier`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::MailConfig;
use crate::errors::AppError;

const RESET_SUBJECT: &str = "Reset your password";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reset_link(&self, to_email: &str, to_name: &str, link: &str)
        -> Result<(), AppError>;
}

/// Picks the HTTP mailer when an API key is configured, otherwise logs links.
pub fn from_config(config: &MailConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.api_key {
        Some(key) => {
            info!("Mail delivery via {}", config.api_url);
            Ok(Arc::new(HttpMailer::new(
                config.api_url.clone(),
                key.clone(),
                config.sender.clone(),
            )?))
        }
        None => {
            info!("MAIL_API_KEY not set; reset links will be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Development notifier: writes the link to the log instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reset_link(
        &self,
        to_email: &str,
        _to_name: &str,
        link: &str,
    ) -> Result<(), AppError> {
        info!(to = %to_email, %link, "Password reset link (not sent, no mail API configured)");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionalEmail<'a> {
    sender: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    html_content: String,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Sends mail through a JSON transactional-email API (Brevo-compatible).
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, sender: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(15)).build()?,
            api_url,
            api_key,
            sender,
        })
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    #[instrument(skip(self, to_name, link))]
    async fn send_reset_link(
        &self,
        to_email: &str,
        to_name: &str,
        link: &str,
    ) -> Result<(), AppError> {
        let body = TransactionalEmail {
            sender: Address {
                email: &self.sender,
                name: None,
            },
            to: vec![Address {
                email: to_email,
                name: Some(to_name),
            }],
            subject: RESET_SUBJECT,
            html_content: reset_email_html(to_name, link),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Notification(format!(
                "mail API returned {status}: {detail}"
            )));
        }

        debug!("Reset email accepted by mail API");
        Ok(())
    }
}

/// HTML body of the reset email.
pub fn reset_email_html(name: &str, link: &str) -> String {
    format!(
        "<p>Hi {name},</p>\
         <p>We received a request to reset your password. \
         The link below works once.</p>\
         <p><a href=\"{link}\">Reset password</a></p>\
         <p>If you did not ask for this, you can ignore this email.</p>",
        name = html_escape(name),
        link = html_escape(link),
    )
}

pub(crate) fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_email_contains_link() {
        let html = reset_email_html("Asha", "http://localhost/password/resetpassword/abc");
        assert!(html.contains("href=\"http://localhost/password/resetpassword/abc\""));
        assert!(html.contains("Hi Asha"));
    }

    #[test]
    fn test_reset_email_escapes_name() {
        let html = reset_email_html("<script>", "http://x");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_payload_uses_camel_case() {
        let body = TransactionalEmail {
            sender: Address {
                email: "noreply@x",
                name: None,
            },
            to: vec![],
            subject: RESET_SUBJECT,
            html_content: String::new(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("htmlContent").is_some());
        assert!(value["sender"].get("name").is_none());
    }

    #[test]
    fn test_from_config_without_key_logs() {
        let config = MailConfig {
            api_url: "http://mail.invalid".to_string(),
            api_key: None,
            sender: "noreply@x".to_string(),
        };
        assert!(from_config(&config).is_ok());
    }
}
