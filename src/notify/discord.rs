//! Discord webhook channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::WebhookTarget;
use crate::notify::Channel;

/// Discord caps message content at 2000 characters; stay under it to leave
/// room for transport framing.
const MAX_CONTENT_LEN: usize = 1990;

/// Webhook abuse policy requires spacing successive posts.
const SEND_DELAY: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts chunks to a Discord webhook.
pub struct DiscordChannel {
    name: String,
    url: String,
    critical: bool,
    client: reqwest::Client,
}

impl DiscordChannel {
    pub fn new(name: String, target: &WebhookTarget, client: reqwest::Client) -> Self {
        Self {
            name,
            url: target.url.clone(),
            critical: target.critical,
            client,
        }
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn max_chunk_len(&self) -> usize {
        MAX_CONTENT_LEN
    }

    fn rate_limit(&self) -> Duration {
        SEND_DELAY
    }

    async fn post(&self, chunk: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: chunk })
            .send()
            .await
            .map_err(|e| AppError::delivery(&self.name, e))?;

        // Discord returns 204 No Content on success
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::delivery(
                &self.name,
                format!("webhook returned {status}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_cap_leaves_margin_below_discord_limit() {
        let channel = DiscordChannel::new(
            "discord".into(),
            &WebhookTarget {
                url: "https://discordapp.com/api/webhooks/1/abc".into(),
                critical: false,
            },
            reqwest::Client::new(),
        );
        assert!(channel.max_chunk_len() < 2000);
        assert!(channel.max_chunk_len() >= 1990);
        assert_eq!(channel.rate_limit(), Duration::from_secs(2));
    }

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload { content: "hello" };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "hello" }));
    }
}
