// =====================================================================================
// NOTIFICATION DISPATCH
// =====================================================================================

mod email;
mod sms;
mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::config::{Channel, NotificationSettings, Severity};
use crate::error::NotifyError;
use crate::models::{AlertEvent, AlertEventKind};

pub use email::{EmailNotifier, Mailer};
pub use sms::SmsNotifier;
pub use webhook::{sign_payload, WebhookNotifier};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    /// Body posted to webhooks.
    pub payload: Value,
    /// Overrides the email channel's configured recipients when non-empty.
    #[serde(skip)]
    pub recipients: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            payload: Value::Null,
            recipients: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    pub fn from_event(event: &AlertEvent) -> Self {
        let title = match event.kind {
            AlertEventKind::Triggered => event.alert.name.clone(),
            AlertEventKind::Recovered => format!("Recovered: {}", event.alert.name),
        };
        let mut payload = serde_json::to_value(&event.alert).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut payload {
            map.insert("message".to_string(), Value::String(event.message.clone()));
        }

        Self::new(title, event.message.clone(), event.severity).with_payload(payload)
    }

    pub fn text_body(&self) -> String {
        format!(
            "Name: {}\nSeverity: {}\nMessage: {}\nTime: {}",
            self.title,
            self.severity.as_str(),
            self.message,
            self.timestamp.to_rfc3339()
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;

    /// Enabled in config and has somewhere to deliver to.
    fn is_enabled(&self) -> bool;

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

pub struct NotificationDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    mailer: Option<Arc<Mailer>>,
}

impl NotificationDispatcher {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers, mailer: None }
    }

    pub fn from_config(config: &AppConfig, settings: &NotificationSettings) -> Self {
        let mailer = Mailer::from_config(config).map(Arc::new);
        if mailer.is_none() {
            debug!("SMTP is not configured, email notifications are off");
        }

        let notifiers: Vec<Arc<dyn Notifier>> = vec![
            Arc::new(EmailNotifier::new(mailer.clone(), settings.email.clone())),
            Arc::new(SmsNotifier::new(settings.sms.clone())),
            Arc::new(WebhookNotifier::new(settings.webhook.clone())),
        ];

        Self { notifiers, mailer }
    }

    /// Direct SMTP access for one-off messages outside the alert channels.
    pub fn mailer(&self) -> Option<&Mailer> {
        self.mailer.as_deref()
    }

    /// Sends over every requested channel concurrently. Failures are logged
    /// and counted out; the number of successful deliveries is returned.
    pub async fn dispatch(&self, notification: &Notification, channels: &[Channel]) -> usize {
        let sends = self
            .notifiers
            .iter()
            .filter(|n| channels.contains(&n.channel()))
            .filter(|n| {
                let enabled = n.is_enabled();
                if !enabled {
                    debug!("{} notifications are disabled, skipping", n.channel().as_str());
                }
                enabled
            })
            .map(|n| async move { (n.channel(), n.send(notification).await) });

        let mut delivered = 0;
        for (channel, result) in join_all(sends).await {
            match result {
                Ok(()) => {
                    delivered += 1;
                    info!("{} notification sent: {}", channel.as_str(), notification.title);
                }
                Err(e) => error!("{} notification failed: {}", channel.as_str(), e),
            }
        }
        delivered
    }
}
