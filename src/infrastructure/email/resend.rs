//! Resend HTTP API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info};

use super::{EmailMessage, EmailService};
use crate::shared::error::AppError;

/// Body of `POST /emails`.
#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Clone)]
pub struct ResendEmailService {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl ResendEmailService {
    pub fn new(api_key: &str, base_url: &str, from: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            from,
        })
    }
}

#[async_trait]
impl EmailService for ResendEmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        let payload = ResendRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html_body,
            text: message.text_body.as_deref(),
        };

        debug!(to = %message.to, subject = %message.subject, "Sending email via Resend");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Resend request failed");
                AppError::Internal("Email delivery failed".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Resend API returned an error");
            return Err(AppError::Internal("Email delivery failed".to_string()));
        }

        info!(to = %message.to, "Email sent via Resend");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let service =
            ResendEmailService::new("re_key", "https://api.resend.com/", "N <n@x.io>".into())
                .unwrap();
        assert_eq!(service.endpoint, "https://api.resend.com/emails");
    }

    #[test]
    fn test_payload_shape() {
        let payload = ResendRequest {
            from: "App <noreply@example.com>",
            to: ["ada@example.com"],
            subject: "Hi",
            html: "<p>Hi</p>",
            text: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"], serde_json::json!(["ada@example.com"]));
        assert!(json.get("text").is_none());
    }
}
