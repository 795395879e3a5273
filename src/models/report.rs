//! Run summary structures.

use crate::models::{Classification, SourceId};

/// Delta counts for one source in one run.
#[derive(Debug, Clone, Default)]
pub struct SourceStats {
    pub total: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl SourceStats {
    pub fn record(&mut self, classification: Classification) {
        self.total += 1;
        match classification {
            Classification::New => self.new += 1,
            Classification::Updated => self.updated += 1,
            Classification::Unchanged => self.unchanged += 1,
        }
    }
}

/// Outcome of dispatching to one channel.
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    pub channel: String,
    pub critical: bool,
    pub chunks_sent: usize,
    /// First error encountered; delivery to this channel stopped there
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one complete run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Unix timestamp the run used for first/last-seen stamping
    pub run_timestamp: i64,
    pub stats: Vec<(SourceId, SourceStats)>,
    /// Sources skipped under best-effort fetch policy
    pub skipped_sources: Vec<SourceId>,
    /// Records that produced an alert
    pub notified: usize,
    /// Rendered body length in bytes; zero when nothing to notify
    pub body_len: usize,
    pub outcomes: Vec<ChannelOutcome>,
    pub dry_run: bool,
}

impl RunReport {
    /// Whether a channel marked critical failed, forcing rollback.
    pub fn critical_delivery_failed(&self) -> bool {
        self.outcomes.iter().any(|o| o.critical && !o.succeeded())
    }

    /// Log-friendly key/value summary lines.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (source, stats) in &self.stats {
            lines.push(format!(
                "{}: {} records ({} new, {} updated, {} unchanged)",
                source, stats.total, stats.new, stats.updated, stats.unchanged
            ));
        }
        for source in &self.skipped_sources {
            lines.push(format!("{source}: skipped (fetch failed)"));
        }
        for outcome in &self.outcomes {
            match &outcome.error {
                None => lines.push(format!(
                    "{}: {} chunk(s) delivered",
                    outcome.channel, outcome.chunks_sent
                )),
                Some(error) => lines.push(format!(
                    "{}: failed after {} chunk(s): {}",
                    outcome.channel, outcome.chunks_sent, error
                )),
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counts_by_classification() {
        let mut stats = SourceStats::default();
        stats.record(Classification::New);
        stats.record(Classification::New);
        stats.record(Classification::Unchanged);
        stats.record(Classification::Updated);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.new, 2);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.unchanged, 1);
    }

    #[test]
    fn test_critical_delivery_failure_detection() {
        let mut report = RunReport::default();
        report.outcomes.push(ChannelOutcome {
            channel: "discord".into(),
            critical: false,
            chunks_sent: 1,
            error: Some("503".into()),
        });
        assert!(!report.critical_delivery_failed());

        report.outcomes.push(ChannelOutcome {
            channel: "announce".into(),
            critical: true,
            chunks_sent: 0,
            error: Some("timeout".into()),
        });
        assert!(report.critical_delivery_failed());
    }
}
