//! Slack incoming-webhook channel.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::WebhookTarget;
use crate::notify::Channel;

// Slack truncates messages past roughly 40000 characters.
const MAX_TEXT_LEN: usize = 40_000;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts chunks to a Slack incoming webhook.
pub struct SlackChannel {
    name: String,
    url: String,
    critical: bool,
    client: reqwest::Client,
}

impl SlackChannel {
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
impl Channel for SlackChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn max_chunk_len(&self) -> usize {
        MAX_TEXT_LEN
    }

    async fn post(&self, chunk: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text: chunk })
            .send()
            .await
            .map_err(|e| AppError::delivery(&self.name, e))?;

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
    fn test_payload_shape() {
        let payload = WebhookPayload { text: "alert body" };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "alert body" }));
    }
}
