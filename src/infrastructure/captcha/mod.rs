//! CAPTCHA verification against Cloudflare Turnstile.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, warn};

use crate::config::CaptchaSettings;
use crate::shared::error::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptchaService: Send + Sync {
    /// Whether the client token verifies. Never errors; failures read as
    /// `false`.
    async fn validate(&self, token: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct TurnstileResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Clone)]
pub struct TurnstileCaptchaService {
    client: reqwest::Client,
    secret_key: String,
    verify_url: String,
}

impl TurnstileCaptchaService {
    pub fn new(settings: &CaptchaSettings) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            secret_key: settings.secret_key.clone(),
            verify_url: settings.verify_url.clone(),
        })
    }
}

#[async_trait]
impl CaptchaService for TurnstileCaptchaService {
    async fn validate(&self, token: &str) -> bool {
        let form = [("secret", self.secret_key.as_str()), ("response", token)];

        let response = match self.client.post(&self.verify_url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Turnstile verification failed");
                return false;
            }
        };

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Turnstile verification returned an error status");
            return false;
        }

        match response.json::<TurnstileResponse>().await {
            Ok(body) => body.success,
            Err(e) => {
                error!(error = %e, "Turnstile response could not be parsed");
                false
            }
        }
    }
}
