use async_trait::async_trait;
use tracing::info;

use crate::config::{Channel, SmsChannel};
use crate::error::NotifyError;

use super::{Notification, Notifier};

/// No SMS provider is wired in; messages are written to the log.
pub struct SmsNotifier {
    settings: SmsChannel,
}

impl SmsNotifier {
    pub fn new(settings: SmsChannel) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled && !self.settings.numbers.is_empty()
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        for number in &self.settings.numbers {
            info!(to = %number, "SMS notification: [{}] {}", notification.severity.as_str(), notification.message);
        }
        Ok(())
    }
}
