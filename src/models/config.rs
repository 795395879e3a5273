//! Application configuration structures.
//!
//! All runtime behavior is driven by an explicit [`Config`] value handed to
//! the run wrapper; there is no process-wide mutable state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SourceId;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// History database location; created on first use
    #[serde(default = "defaults::database")]
    pub database: PathBuf,

    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Per-run policy switches
    #[serde(default)]
    pub run: RunConfig,

    /// Tracked sources
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// User-facing notification channels
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Operator-facing alert channel
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.database.as_os_str().is_empty() {
            return Err(AppError::validation("database path is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }
        for source in &self.sources {
            source.validate()?;
        }
        self.channels.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: defaults::database(),
            fetch: FetchConfig::default(),
            run: RunConfig::default(),
            sources: Vec::new(),
            channels: ChannelsConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds; past it a fetch counts as failed
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Per-run policy switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Abort the whole run when any source fails to fetch. When false,
    /// failed sources are skipped and the rest of the run proceeds.
    #[serde(default = "defaults::fail_fast")]
    pub fail_fast: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fail_fast: defaults::fail_fast(),
        }
    }
}

/// Which extraction strategy a source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Selector-driven HTML table
    #[default]
    Table,
    /// Published spreadsheet, CSV export
    Sheet,
}

/// One tracked source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Which schema this source feeds
    pub id: SourceId,

    /// Page or export URL
    pub url: String,

    #[serde(default)]
    pub adapter: AdapterKind,

    /// CSS selector matching one data row (table adapter)
    #[serde(default)]
    pub row_selector: String,

    /// CSS selector matching the header cells (table adapter)
    #[serde(default)]
    pub header_selector: String,

    /// Expected header texts, in column order; any difference is a schema
    /// mismatch and fails the fetch
    #[serde(default)]
    pub expected_headers: Vec<String>,

    /// Schema field fed by each extracted column, in order; empty string
    /// skips the column
    #[serde(default)]
    pub columns: Vec<String>,

    /// Keep only rows whose column matches a value (sheet adapter)
    #[serde(default)]
    pub filter: Option<RowFilter>,

    /// Whether mutable-field-only changes produce a user alert
    #[serde(default)]
    pub notify_on_update: bool,
}

impl SourceConfig {
    fn validate(&self) -> Result<()> {
        let name = self.id.name();
        if self.url.trim().is_empty() {
            return Err(AppError::validation(format!("source {name}: url is empty")));
        }
        if self.columns.is_empty() {
            return Err(AppError::validation(format!(
                "source {name}: no columns mapped"
            )));
        }
        let schema = self.id.schema();
        for column in self.columns.iter().filter(|c| !c.is_empty()) {
            if schema.field(column).is_none() {
                return Err(AppError::validation(format!(
                    "source {name}: column '{column}' is not a schema field"
                )));
            }
        }
        if self.adapter == AdapterKind::Table {
            if self.row_selector.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "source {name}: row_selector is empty"
                )));
            }
            if !self.expected_headers.is_empty() && self.header_selector.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "source {name}: expected_headers set without header_selector"
                )));
            }
        }
        Ok(())
    }
}

/// Row filter for spreadsheet sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFilter {
    /// Zero-based CSV column index
    pub column: usize,
    /// Required cell value
    pub equals: String,
}

/// User-facing notification channels.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub discord: Vec<WebhookTarget>,

    #[serde(default)]
    pub slack: Vec<WebhookTarget>,

    #[serde(default)]
    pub email: Option<EmailConfig>,

    #[serde(default)]
    pub announce: Option<AnnounceConfig>,
}

impl ChannelsConfig {
    fn validate(&self) -> Result<()> {
        for target in self.discord.iter().chain(&self.slack) {
            if target.url.trim().is_empty() {
                return Err(AppError::validation("webhook url is empty"));
            }
        }
        if let Some(email) = &self.email {
            if email.recipients.is_empty() {
                return Err(AppError::validation("email channel has no recipients"));
            }
            if email.server.trim().is_empty() {
                return Err(AppError::validation("email channel has no server"));
            }
        }
        if let Some(announce) = &self.announce {
            if announce.api_key.trim().is_empty() {
                return Err(AppError::validation("announce channel has no api_key"));
            }
        }
        Ok(())
    }

    /// Whether any channel is configured at all.
    pub fn is_empty(&self) -> bool {
        self.discord.is_empty()
            && self.slack.is_empty()
            && self.email.is_none()
            && self.announce.is_none()
    }
}

/// A single webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookTarget {
    pub url: String,

    /// Failure of a critical channel rolls the run back
    #[serde(default)]
    pub critical: bool,
}

/// SMTP alert mail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub server: String,

    #[serde(default = "defaults::smtp_port")]
    pub port: u16,

    pub from: String,

    #[serde(default)]
    pub reply_to: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    pub recipients: Vec<String>,

    /// Subject line; `{date_time}` expands to the run's local time
    #[serde(default = "defaults::subject")]
    pub subject: String,

    #[serde(default)]
    pub critical: bool,
}

/// Mailing-list announce API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnounceConfig {
    #[serde(default = "defaults::announce_url")]
    pub url: String,

    pub api_key: String,

    pub list_domain: String,

    pub list_name: String,

    /// Subject line; `{date_time}` expands to the run's local time
    #[serde(default = "defaults::subject")]
    pub subject: String,

    #[serde(default)]
    pub critical: bool,
}

/// Operator-facing alert channel. Best-effort only: its own failures are
/// logged and never fail the run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// SMTP delivery for operator alerts; alerts are only logged when unset
    #[serde(default)]
    pub email: Option<AdminEmailConfig>,
}

/// SMTP settings for the operator alert channel, separate from the
/// user-facing email channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminEmailConfig {
    pub server: String,

    #[serde(default = "defaults::admin_smtp_port")]
    pub port: u16,

    pub from: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    pub recipients: Vec<String>,

    /// Subject line; `{date_time}` expands to the run's local time
    #[serde(default = "defaults::admin_subject")]
    pub subject: String,
}

mod defaults {
    use std::path::PathBuf;

    pub fn database() -> PathBuf {
        PathBuf::from("exposures.db")
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; exposure-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn fail_fast() -> bool {
        true
    }
    pub fn smtp_port() -> u16 {
        465
    }
    pub fn admin_smtp_port() -> u16 {
        587
    }
    pub fn announce_url() -> String {
        "https://api.dreamhost.com/".into()
    }
    pub fn subject() -> String {
        "Alert: Updated WA covid-19 exposure sites ({date_time})".into()
    }
    pub fn admin_subject() -> String {
        "Alert: exposure-watch run failed ({date_time})".into()
    }
}
