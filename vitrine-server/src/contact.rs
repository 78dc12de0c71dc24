//! Contact form intake.
//!
//! Validates the submission, then relays it through a [`Mailer`]. When
//! no email API key is configured the submission is logged instead of
//! sent, so the form still works in local development.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::config::EmailConfig;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub topic: String,
    pub message: String,
}

impl ContactRequest {
    /// Name, email, topic and message are required; email must look
    /// like an address. Returns the field name at fault.
    pub fn validate(self) -> Result<ContactMessage, &'static str> {
        let name = non_blank(self.name).ok_or("name")?;
        let email = non_blank(self.email).ok_or("email")?;
        if !EMAIL.is_match(&email) {
            return Err("email");
        }
        let topic = non_blank(self.topic).ok_or("topic")?;
        let message = non_blank(self.message).ok_or("message")?;
        Ok(ContactMessage {
            name,
            email,
            company: non_blank(self.company),
            topic,
            message,
        })
    }
}

fn non_blank(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, message: &ContactMessage) -> anyhow::Result<()>;
}

/// Posts to a Resend-compatible email API.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    to: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &EmailConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key,
            to: config.to.clone(),
            from: config.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn deliver(&self, message: &ContactMessage) -> anyhow::Result<()> {
        let mut text = format!("Name: {}\nEmail: {}\n", message.name, message.email);
        if let Some(company) = &message.company {
            text.push_str(&format!("Company: {company}\n"));
        }
        text.push_str(&format!("\n{}\n", message.message));

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [self.to],
                "reply_to": message.email,
                "subject": format!("[{}] Contact form submission from {}", message.topic, message.name),
                "text": text,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("email provider returned {}", response.status());
        }
        Ok(())
    }
}

/// Fallback when no API key is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, message: &ContactMessage) -> anyhow::Result<()> {
        info!(
            from = %message.email,
            name = %message.name,
            topic = %message.topic,
            "contact submission (no email provider configured)"
        );
        Ok(())
    }
}

pub async fn submit(
    mailer: &dyn Mailer,
    request: ContactRequest,
) -> (StatusCode, Json<serde_json::Value>) {
    let message = match request.validate() {
        Ok(message) => message,
        Err(field) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid or missing field: {field}") })),
            );
        }
    };

    match mailer.deliver(&message).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Thank you for your message. We'll get back to you within 24 hours.",
            })),
        ),
        Err(err) => {
            error!("contact delivery failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to send message. Please try again later." })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            company: None,
            topic: Some("New project".into()),
            message: Some(message.into()),
        }
    }

    #[test]
    fn valid_submission_passes() {
        let message = request("Jo", "jo@example.com", "hello").validate().unwrap();
        assert_eq!(message.email, "jo@example.com");
        assert_eq!(message.topic, "New project");
        assert_eq!(message.message, "hello");
        assert_eq!(message.company, None);
    }

    #[test]
    fn missing_message_names_the_field() {
        let mut req = request("Jo", "jo@example.com", "hello");
        req.message = None;
        assert_eq!(req.validate().unwrap_err(), "message");
    }

    #[test]
    fn missing_topic_names_the_field() {
        let mut req = request("Jo", "jo@example.com", "hello");
        req.topic = None;
        assert_eq!(req.validate().unwrap_err(), "topic");
    }

    #[test]
    fn blank_name_is_missing() {
        assert_eq!(
            request("   ", "jo@example.com", "hello").validate().unwrap_err(),
            "name"
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["jo", "jo@", "@example.com", "jo@example", "jo bo@example.com"] {
            assert_eq!(request("Jo", bad, "hello").validate().unwrap_err(), "email");
        }
    }

    #[tokio::test]
    async fn delivery_failure_maps_to_500() {
        struct FailingMailer;
        #[async_trait]
        impl Mailer for FailingMailer {
            async fn deliver(&self, _message: &ContactMessage) -> anyhow::Result<()> {
                anyhow::bail!("provider down")
            }
        }

        let (status, body) = submit(&FailingMailer, request("Jo", "jo@example.com", "hi")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.0["error"].is_string());
    }

    #[tokio::test]
    async fn log_mailer_accepts_everything() {
        let (status, body) = submit(&LogMailer, request("Jo", "jo@example.com", "hi")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.0["success"], true);
    }
}
