use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use shared_config::{AppConfig, SmtpConfig};

use crate::config::{Channel, EmailChannel};
use crate::error::NotifyError;

use super::{Notification, Notifier};

/// SMTP sender built from the `SMTP_*` settings.
pub struct Mailer {
    smtp: SmtpConfig,
}

impl Mailer {
    pub fn new(smtp: SmtpConfig) -> Self {
        Self { smtp }
    }

    pub fn from_config(config: &AppConfig) -> Option<Self> {
        config.smtp.clone().map(Self::new)
    }

    pub async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), NotifyError> {
        if to.is_empty() {
            return Err(NotifyError::NotConfigured("email recipients"));
        }

        let mut builder = Message::builder()
            .from(self.smtp.from_address.parse::<Mailbox>()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in to {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }
        let email = builder
            .body(body.to_string())
            .map_err(|e| NotifyError::EmailBuild(e.to_string()))?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)?
            .port(self.smtp.port);
        if let (Some(user), Some(pass)) = (&self.smtp.username, &self.smtp.password) {
            transport = transport.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport.build().send(email).await?;
        info!(recipients = to.len(), "Email sent: {}", subject);
        Ok(())
    }
}

pub struct EmailNotifier {
    mailer: Option<Arc<Mailer>>,
    settings: EmailChannel,
}

impl EmailNotifier {
    pub fn new(mailer: Option<Arc<Mailer>>, settings: EmailChannel) -> Self {
        Self { mailer, settings }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled && self.mailer.is_some()
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or(NotifyError::NotConfigured("smtp"))?;

        let recipients = if notification.recipients.is_empty() {
            &self.settings.recipients
        } else {
            &notification.recipients
        };
        let subject = format!("{} {}", self.settings.subject_prefix, notification.title);

        mailer
            .send(recipients, subject.trim(), &notification.text_body())
            .await
    }
}
