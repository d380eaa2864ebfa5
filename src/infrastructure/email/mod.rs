//! Transactional email.
//!
//! [`EmailService`] is the seam the application layer sends through.
//! Resend is used when an API key is configured; otherwise messages are
//! only logged.

mod layout;
mod resend;
pub mod templates;

pub use layout::EmailLayout;
pub use resend::ResendEmailService;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::EmailSettings;
use crate::shared::error::AppError;

/// A rendered message ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError>;
}

/// Logs messages instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct NoopEmailService;

#[async_trait]
impl EmailService for NoopEmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Email delivery disabled, message not sent"
        );
        Ok(())
    }
}

/// Pick the delivery backend for the configured settings.
pub fn create_email_service(settings: &EmailSettings) -> Result<Arc<dyn EmailService>, AppError> {
    match settings.resend.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(api_key) => Ok(Arc::new(ResendEmailService::new(
            api_key,
            &settings.resend.base_url,
            settings.from_header(),
        )?)),
        None => Ok(Arc::new(NoopEmailService)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_service_accepts_messages() {
        let service = NoopEmailService;
        let message = EmailMessage {
            to: "ada@example.com".into(),
            subject: "Hello".into(),
            html_body: "<p>Hi</p>".into(),
            text_body: None,
        };
        assert!(service.send(message).await.is_ok());
    }
}
