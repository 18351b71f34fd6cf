use tracing::{info, warn};

use crate::config::RunConfig;

mod email;
mod telegram;

pub use email::EmailNotifier;
pub use telegram::TelegramNotifier;

/// Delivers the end-of-run report. Every channel is best-effort.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    email: Option<EmailNotifier>,
    telegram: Option<TelegramNotifier>,
}

impl Notifier {
    pub fn new(email: Option<EmailNotifier>, telegram: Option<TelegramNotifier>) -> Self {
        Self { email, telegram }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.email.as_ref().map(EmailNotifier::new),
            config.telegram.as_ref().map(TelegramNotifier::new),
        )
    }

    /// Returns how many channels accepted the message. Failures are logged.
    pub async fn send(&self, message: &str) -> usize {
        let mut delivered = 0;

        if let Some(email) = &self.email {
            match email.send(message).await {
                Ok(()) => {
                    info!("Email notification sent via smtp relay {}", email.relay());
                    delivered += 1;
                }
                Err(e) => warn!("Email notification failed: {e}"),
            }
        }

        if let Some(telegram) = &self.telegram {
            match telegram.send(message).await {
                Ok(()) => {
                    info!("Telegram notification sent to chat {}", telegram.chat_id());
                    delivered += 1;
                }
                Err(e) => warn!("Telegram notification failed: {e}"),
            }
        }

        delivered
    }
}
