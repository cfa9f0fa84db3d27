use async_trait::async_trait;
use serde::Serialize;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, message: &str) -> Result<(), String>;
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// Posts to a Slack incoming webhook. One attempt, no retry.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(client: reqwest::Client, webhook_url: &str) -> Self {
        Self {
            client,
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post(&self, message: &str) -> Result<(), String> {
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookMessage { text: message })
            .send()
            .await
            .map_err(|e| format!("Slack webhook request failed: {}", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("Slack webhook returned HTTP {}", status.as_u16()));
        }
        Ok(())
    }
}

/// Prints messages instead of sending them (`--dry-run`).
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn post(&self, message: &str) -> Result<(), String> {
        println!("{}\n", message);
        Ok(())
    }
}
