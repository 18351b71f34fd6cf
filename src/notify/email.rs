use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailSettings;
use crate::error::NotifyError;

pub const SUBJECT: &str = "📑 [mongodump] status report";
pub const SENDER: &str = "mongodump@localhost";
const SMTP_PORT: u16 = 25;

/// Plain SMTP through a relay that accepts mail without TLS or auth.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    to: String,
    host: String,
    port: u16,
}

impl EmailNotifier {
    /// `relay` is `host` or `host:port`.
    pub fn new(settings: &EmailSettings) -> Self {
        let (host, port) = match settings.relay.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (settings.relay.clone(), SMTP_PORT),
            },
            None => (settings.relay.clone(), SMTP_PORT),
        };

        Self {
            to: settings.to.clone(),
            host,
            port,
        }
    }

    pub fn relay(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn build_message(&self, body: &str) -> Result<Message, NotifyError> {
        let parse = |address: &str| {
            address
                .parse::<Mailbox>()
                .map_err(|source| NotifyError::Address {
                    address: address.to_string(),
                    source,
                })
        };

        Ok(Message::builder()
            .from(parse(SENDER)?)
            .to(parse(&self.to)?)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?)
    }

    pub async fn send(&self, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(body)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
            .port(self.port)
            .build();

        transport
            .send(message)
            .await
            .map_err(|source| NotifyError::Smtp {
                relay: self.relay(),
                source,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(to: &str, relay: &str) -> EmailSettings {
        EmailSettings {
            to: to.to_string(),
            relay: relay.to_string(),
        }
    }

    #[test]
    fn test_relay_default_port() {
        let notifier = EmailNotifier::new(&settings("ops@example.com", "localhost"));
        assert_eq!(notifier.relay(), "localhost:25");
    }

    #[test]
    fn test_relay_explicit_port() {
        let notifier = EmailNotifier::new(&settings("ops@example.com", "mail.example.com:2525"));
        assert_eq!(notifier.relay(), "mail.example.com:2525");
    }

    #[test]
    fn test_build_message_headers() {
        let notifier = EmailNotifier::new(&settings("ops@example.com", "localhost"));
        let message = notifier.build_message("dump finished").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("From: mongodump@localhost"));
        assert!(raw.contains("dump finished"));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let notifier = EmailNotifier::new(&settings("not-an-address", "localhost"));
        assert!(matches!(
            notifier.build_message("x").unwrap_err(),
            NotifyError::Address { .. }
        ));
    }

    #[tokio::test]
    async fn test_send_to_closed_relay_fails() {
        let port = crate::testing::closed_port().await;
        let notifier =
            EmailNotifier::new(&settings("ops@example.com", &format!("127.0.0.1:{port}")));
        assert!(matches!(
            notifier.send("x").await.unwrap_err(),
            NotifyError::Smtp { .. }
        ));
    }
}
