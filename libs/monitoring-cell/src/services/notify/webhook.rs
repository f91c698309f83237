use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use futures::future::join_all;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::config::{Channel, WebhookChannel};
use crate::error::NotifyError;

use super::{Notification, Notifier};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Base64 HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String, NotifyError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| NotifyError::Webhook(format!("Invalid signing key: {}", e)))?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

pub struct WebhookNotifier {
    client: Client,
    settings: WebhookChannel,
}

impl WebhookNotifier {
    pub fn new(settings: WebhookChannel) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, settings }
    }

    async fn post(&self, url: &str, body: &[u8], signature: Option<&str>) -> Result<(), String> {
        let mut request = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(body.to_vec());
        for (name, value) in &self.settings.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.send().await.map_err(|e| format!("{}: {}", url, e))?;
        if !response.status().is_success() {
            return Err(format!("{}: status {}", url, response.status()));
        }
        debug!("Webhook delivered to {}", url);
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel(&self) -> Channel {
        Channel::Webhook
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled && !self.settings.urls.is_empty()
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = if notification.payload.is_null() {
            serde_json::to_vec(notification)
        } else {
            serde_json::to_vec(&notification.payload)
        }
        .map_err(|e| NotifyError::Webhook(e.to_string()))?;

        let signature = match self.settings.secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => Some(sign_payload(secret, &body)?),
            None => None,
        };

        let results = join_all(
            self.settings
                .urls
                .iter()
                .map(|url| self.post(url, &body, signature.as_deref())),
        )
        .await;

        let failures: Vec<String> = results.into_iter().filter_map(Result::err).collect();
        if failures.is_empty() {
            Ok(())
        } else {
            for failure in &failures {
                warn!("Webhook delivery failed: {}", failure);
            }
            Err(NotifyError::Webhook(failures.join("; ")))
        }
    }
}
