//! Twilio WhatsApp client.
//!
//! Thin wrapper over the Messages endpoint of the Twilio REST API. One
//! message per call; media is attached by public URL.

use crate::config::DeliveryConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// How much of an error response body is kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("message rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

pub struct WhatsAppClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
    messages_url: String,
}

impl WhatsAppClient {
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("failed to build http client")?;

        let api_base = config.api_base_url.trim_end_matches('/');
        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            api_base, config.account_sid
        );

        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.from.clone(),
            to: config.to.clone(),
            messages_url,
        })
    }

    /// Send one WhatsApp message, optionally with media attachments.
    /// Returns the message SID assigned by Twilio.
    pub async fn send(&self, body: &str, media_urls: &[String]) -> Result<String, SendError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("From", self.from.as_str()),
            ("To", self.to.as_str()),
            ("Body", body),
        ];
        for url in media_urls {
            form.push(("MediaUrl", url.as_str()));
        }

        debug!(url = %self.messages_url, media = media_urls.len(), "sending message");

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            message.truncate(ERROR_BODY_LIMIT);
            return Err(SendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        let sid = payload
            .get("sid")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(sid)
    }
}
