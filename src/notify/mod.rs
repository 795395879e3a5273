//! Notification channels.
//!
//! Channels receive pre-rendered text chunks; everything about a channel's
//! transport stays behind the [`Channel`] trait. Delivery is one attempt per
//! chunk per run, sequential, with a mandatory pause between chunks where a
//! channel's abuse policy demands one.

mod admin;
mod announce;
mod discord;
mod email;
mod slack;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;

pub use admin::AdminNotifier;
pub use announce::AnnounceChannel;
pub use discord::DiscordChannel;
pub use email::EmailChannel;
pub use slack::SlackChannel;

use crate::error::Result;
use crate::models::{ChannelOutcome, ChannelsConfig};
use crate::pipeline::Chunker;

/// Effectively-unchunked limit for transports without a hard message cap.
pub const UNCHUNKED: usize = usize::MAX;

/// One outbound notification channel.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name used in logs and delivery reports.
    fn name(&self) -> &str;

    /// Failure of a critical channel rolls the whole run back.
    fn critical(&self) -> bool;

    /// Hard per-message size cap of the transport, in characters.
    fn max_chunk_len(&self) -> usize {
        UNCHUNKED
    }

    /// Mandatory pause between successive chunk sends.
    fn rate_limit(&self) -> Duration {
        Duration::ZERO
    }

    /// Post a single chunk. One attempt; any non-success is a delivery
    /// failure for this chunk and channel.
    async fn post(&self, chunk: &str) -> Result<()>;
}

/// Deliver a report body to every channel in turn.
///
/// A failed chunk stops that channel's remaining chunks but never the other
/// channels. Failures are collected, not propagated; the run wrapper decides
/// what a critical failure means.
pub async fn dispatch(channels: &[Box<dyn Channel>], body: &str) -> Vec<ChannelOutcome> {
    let mut outcomes = Vec::with_capacity(channels.len());

    for channel in channels {
        let chunker = Chunker::new(channel.max_chunk_len());
        let chunks: Vec<&str> = chunker
            .chunks(body)
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();

        let total = chunks.len();
        let mut sent = 0;
        let mut error = None;

        for (i, chunk) in chunks.iter().enumerate() {
            match channel.post(chunk).await {
                Ok(()) => {
                    sent += 1;
                    log::debug!("{}: sent chunk {}/{}", channel.name(), i + 1, total);
                }
                Err(e) => {
                    log::warn!("{}: delivery failed: {}", channel.name(), e);
                    error = Some(e.to_string());
                    break;
                }
            }

            let pause = channel.rate_limit();
            if i + 1 < total && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        outcomes.push(ChannelOutcome {
            channel: channel.name().to_string(),
            critical: channel.critical(),
            chunks_sent: sent,
            error,
        });
    }

    outcomes
}

/// Build the configured channels, webhooks first, in config order.
pub fn build_channels(
    config: &ChannelsConfig,
    client: &reqwest::Client,
) -> Result<Vec<Box<dyn Channel>>> {
    let mut channels: Vec<Box<dyn Channel>> = Vec::new();

    for (i, target) in config.discord.iter().enumerate() {
        channels.push(Box::new(DiscordChannel::new(
            numbered("discord", i, config.discord.len()),
            target,
            client.clone(),
        )));
    }
    for (i, target) in config.slack.iter().enumerate() {
        channels.push(Box::new(SlackChannel::new(
            numbered("slack", i, config.slack.len()),
            target,
            client.clone(),
        )));
    }
    if let Some(email) = &config.email {
        channels.push(Box::new(EmailChannel::from_config(email)?));
    }
    if let Some(announce) = &config.announce {
        channels.push(Box::new(AnnounceChannel::new(announce, client.clone())));
    }

    Ok(channels)
}

fn numbered(base: &str, index: usize, total: usize) -> String {
    if total > 1 {
        format!("{}#{}", base, index + 1)
    } else {
        base.to_string()
    }
}

/// Expand the `{date_time}` placeholder in a subject template.
pub(crate) fn expand_subject(template: &str) -> String {
    let stamp = Local::now().format("%d/%m/%Y %H:%M:%S").to_string();
    template.replace("{date_time}", &stamp)
}
