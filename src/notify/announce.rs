//! Mailing-list announce API channel.
//!
//! Posts the report body to a hosted announcement list through its HTTP API,
//! form-encoded.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::AnnounceConfig;
use crate::notify::{Channel, expand_subject};

/// Posts the report to an announcement list API.
pub struct AnnounceChannel {
    url: String,
    api_key: String,
    list_domain: String,
    list_name: String,
    subject: String,
    critical: bool,
    client: reqwest::Client,
}

impl AnnounceChannel {
    pub fn new(config: &AnnounceConfig, client: reqwest::Client) -> Self {
        Self {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            list_domain: config.list_domain.clone(),
            list_name: config.list_name.clone(),
            subject: config.subject.clone(),
            critical: config.critical,
            client,
        }
    }
}

#[async_trait]
impl Channel for AnnounceChannel {
    fn name(&self) -> &str {
        "announce"
    }

    fn critical(&self) -> bool {
        self.critical
    }

    async fn post(&self, chunk: &str) -> Result<()> {
        let subject = expand_subject(&self.subject);
        let params = [
            ("key", self.api_key.as_str()),
            ("cmd", "announcement_list-post_announcement"),
            ("listname", self.list_name.as_str()),
            ("domain", self.list_domain.as_str()),
            ("subject", subject.as_str()),
            ("message", chunk),
            ("charset", "utf-8"),
            ("type", "text"),
            ("duplicate_ok", "1"),
        ];

        let response = self
            .client
            .post(&self.url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::delivery("announce", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::delivery(
                "announce",
                format!("list API returned {status}"),
            ));
        }
        Ok(())
    }
}
