use serde::{Deserialize, Serialize};

use crate::config::TelegramSettings;
use crate::error::NotifyError;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts a message through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(settings: &TelegramSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: TELEGRAM_API.to_string(),
            token: settings.token.clone(),
            chat_id: settings.chat_id.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);

        // The token is part of the URL, keep it out of error messages.
        let response: ApiResponse = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?
            .json()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        if response.ok {
            Ok(())
        } else {
            Err(NotifyError::Telegram(
                response
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closed_port, serve_once};

    fn notifier(api_base: &str) -> TelegramNotifier {
        TelegramNotifier::new(&TelegramSettings {
            token: "123:abc".to_string(),
            chat_id: "-1001".to_string(),
        })
        .with_api_base(api_base)
    }

    #[tokio::test]
    async fn test_send_posts_chat_and_text() {
        let (base, server) = serve_once("200 OK", r#"{"ok":true,"result":{}}"#).await;

        notifier(&base).send("dump finished").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /bot123:abc/sendMessage "));
        assert!(request.contains(r#""chat_id":"-1001""#));
        assert!(request.contains(r#""text":"dump finished""#));
    }

    #[tokio::test]
    async fn test_send_reports_api_rejection() {
        let (base, server) = serve_once(
            "400 Bad Request",
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .await;

        let err = notifier(&base).send("x").await.unwrap_err();
        server.await.unwrap();
        match err {
            NotifyError::Telegram(description) => {
                assert_eq!(description, "Bad Request: chat not found")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_error_hides_token() {
        let port = closed_port().await;

        let err = notifier(&format!("http://127.0.0.1:{port}"))
            .send("x")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));
        assert!(!err.to_string().contains("123:abc"));
    }

    #[test]
    fn test_debug_hides_token() {
        let rendered = format!("{:?}", notifier(TELEGRAM_API));
        assert!(!rendered.contains("123:abc"));
        assert!(rendered.contains("-1001"));
    }
}
