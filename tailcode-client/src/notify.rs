//! Push notifications through ntfy, Pushover or Telegram.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tailcode_shared::config::NotificationConfig;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_TITLE: &str = "Tailcode";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";
const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("unknown notification provider: {0}")]
    UnknownProvider(String),
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("notification rejected with status {0}")]
    Rejected(StatusCode),
}

#[async_trait]
pub trait Notify: Send + Sync {
    async fn send(&self, message: &str, title: Option<&str>) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    Ntfy { server: String, topic: String },
    Pushover { app_token: String, user_key: String },
    Telegram { bot_token: String, chat_id: String },
}

#[derive(Debug, Clone)]
pub struct Notifier {
    provider: Provider,
    client: Client,
}

impl Notifier {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotifyError> {
        let provider = match config.provider.as_str() {
            "ntfy" => Provider::Ntfy {
                server: config.ntfy.server.trim_end_matches('/').to_string(),
                topic: config.ntfy.topic.clone(),
            },
            "pushover" => Provider::Pushover {
                app_token: config.pushover.app_token.clone(),
                user_key: config.pushover.user_key.clone(),
            },
            "telegram" => Provider::Telegram {
                bot_token: config.telegram.bot_token.clone(),
                chat_id: config.telegram.chat_id.clone(),
            },
            other => return Err(NotifyError::UnknownProvider(other.to_string())),
        };
        Ok(Self::new(provider))
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

#[async_trait]
impl Notify for Notifier {
    async fn send(&self, message: &str, title: Option<&str>) -> Result<(), NotifyError> {
        let request = match &self.provider {
            Provider::Ntfy { server, topic } => {
                let mut request = self
                    .client
                    .post(format!("{server}/{topic}"))
                    .body(message.to_string());
                if let Some(title) = title {
                    request = request.header("Title", title);
                }
                request
            }
            Provider::Pushover {
                app_token,
                user_key,
            } => {
                let mut form = vec![
                    ("token", app_token.as_str()),
                    ("user", user_key.as_str()),
                    ("message", message),
                ];
                if let Some(title) = title {
                    form.push(("title", title));
                }
                self.client.post(PUSHOVER_URL).form(&form)
            }
            Provider::Telegram { bot_token, chat_id } => {
                let text = match title {
                    Some(title) => format!("*{title}*\n{message}"),
                    None => message.to_string(),
                };
                self.client
                    .post(format!("{TELEGRAM_API}/bot{bot_token}/sendMessage"))
                    .form(&[
                        ("chat_id", chat_id.as_str()),
                        ("text", text.as_str()),
                        ("parse_mode", "Markdown"),
                    ])
            }
        };

        let response = request.timeout(SEND_TIMEOUT).send().await?;
        if response.status() != StatusCode::OK {
            return Err(NotifyError::Rejected(response.status()));
        }
        Ok(())
    }
}

/// Fire-and-forget wrapper: logs failures and reports them as `false`.
pub async fn notify(notifier: &dyn Notify, message: &str, title: Option<&str>) -> bool {
    match notifier.send(message, title).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Notification failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Bytes, http::HeaderMap, routing::post};
    use std::sync::{Arc, Mutex};
    use tailcode_shared::config::NtfyConfig;
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<(String, Option<String>, String)>>>;

    /// Local ntfy lookalike answering with `status` and recording
    /// `(path, Title header, body)`.
    async fn fake_ntfy(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();
        let app = Router::new().route(
            "/{topic}",
            post(move |uri: axum::http::Uri, headers: HeaderMap, body: Bytes| {
                let recorder = recorder.clone();
                async move {
                    let title = headers
                        .get("Title")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((
                        uri.path().to_string(),
                        title,
                        String::from_utf8_lossy(&body).into_owned(),
                    ));
                    status
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn ntfy_config(server: &str) -> NotificationConfig {
        NotificationConfig {
            provider: "ntfy".to_string(),
            ntfy: NtfyConfig {
                server: format!("{server}/"),
                topic: "alerts".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_providers() {
        let notifier = Notifier::from_config(&NotificationConfig::default()).unwrap();
        assert_eq!(
            notifier.provider(),
            &Provider::Ntfy {
                server: "https://ntfy.sh".to_string(),
                topic: "tailcode-alerts".to_string(),
            }
        );

        let mut config = NotificationConfig::default();
        config.provider = "telegram".to_string();
        config.telegram.chat_id = "42".to_string();
        assert!(matches!(
            Notifier::from_config(&config).unwrap().provider(),
            Provider::Telegram { chat_id, .. } if chat_id == "42"
        ));

        config.provider = "carrier-pigeon".to_string();
        assert!(matches!(
            Notifier::from_config(&config),
            Err(NotifyError::UnknownProvider(p)) if p == "carrier-pigeon"
        ));
    }

    #[tokio::test]
    async fn test_ntfy_posts_message_with_title() {
        let (server, seen) = fake_ntfy(StatusCode::OK).await;
        let notifier = Notifier::from_config(&ntfy_config(&server)).unwrap();

        notifier.send("Waking nas", Some("Tailcode")).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "/alerts");
        assert_eq!(seen[0].1.as_deref(), Some("Tailcode"));
        assert_eq!(seen[0].2, "Waking nas");
    }

    #[tokio::test]
    async fn test_non_200_is_failure() {
        let (server, _seen) = fake_ntfy(StatusCode::TOO_MANY_REQUESTS).await;
        let notifier = Notifier::from_config(&ntfy_config(&server)).unwrap();

        let err = notifier.send("hi", None).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(StatusCode::TOO_MANY_REQUESTS)));
        assert!(!notify(&notifier, "hi", None).await);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_failure() {
        let notifier = Notifier::new(Provider::Ntfy {
            server: "http://127.0.0.1:1".to_string(),
            topic: "alerts".to_string(),
        });
        assert!(matches!(
            notifier.send("hi", None).await,
            Err(NotifyError::Request(_))
        ));
    }
}
