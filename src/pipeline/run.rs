// src/pipeline/run.rs

//! Full run orchestration.
//!
//! One invocation = one run: fetch every source, classify against history,
//! render and deliver, then commit or roll back. Fetching happens strictly
//! before the first store mutation, so a fetch failure can always abort with
//! nothing to undo. Channel delivery happens after mutation; a failed
//! critical channel restores the pre-run snapshot so the next run re-alerts
//! the same records.

use chrono::Utc;

use crate::adapter::{self, SourceAdapter};
use crate::error::{AppError, Result};
use crate::models::{Config, RawRecord, RunReport, SourceId};
use crate::normalize::normalize_batch;
use crate::notify::{self, AdminNotifier, Channel};
use crate::pipeline::delta::{DeltaEngine, tally};
use crate::pipeline::render;
use crate::store::{HistoryStore, Snapshot};
use crate::utils::http;

/// Execute a complete run from configuration.
///
/// With `no_send`, deltas are computed and persisted as usual but the
/// rendered report is logged instead of dispatched.
pub async fn run(config: &Config, no_send: bool) -> Result<RunReport> {
    let client = http::create_client(&config.fetch)?;
    let adapters = adapter::build_adapters(config)?;
    let channels = notify::build_channels(&config.channels, &client)?;
    let admin = AdminNotifier::from_config(&config.admin)?;

    let report = run_with(config, &client, &adapters, &channels, &admin, no_send).await?;

    for line in report.summary_lines() {
        log::info!("{line}");
    }
    Ok(report)
}

/// Run with explicit collaborators. Seam for exercising the orchestration
/// against fake adapters and channels.
pub async fn run_with(
    config: &Config,
    client: &reqwest::Client,
    adapters: &[Box<dyn SourceAdapter>],
    channels: &[Box<dyn Channel>],
    admin: &AdminNotifier,
    no_send: bool,
) -> Result<RunReport> {
    let run_timestamp = Utc::now().timestamp();

    // Fetch phase: no store mutation may happen until every source that will
    // participate in this run has been fetched.
    let mut batches: Vec<(SourceId, Vec<RawRecord>)> = Vec::new();
    let mut skipped_sources = Vec::new();

    for adapter in adapters {
        let source = adapter.source();
        match adapter.fetch(client).await {
            Ok(raws) => {
                log::info!("{source}: fetched {} raw records", raws.len());
                batches.push((source, raws));
            }
            Err(e) if config.run.fail_fast => {
                admin
                    .alert(&format!("Unable to fetch data, please investigate: {e}"))
                    .await;
                return Err(e);
            }
            Err(e) => {
                log::warn!("{source}: fetch failed, skipping this run: {e}");
                skipped_sources.push(source);
            }
        }
    }

    // Everything from here on may mutate the store; snapshot first.
    let snapshot = Snapshot::create(&config.database)?;

    let result = mutate_and_deliver(
        config,
        channels,
        batches,
        skipped_sources,
        run_timestamp,
        no_send,
    )
    .await;

    match result {
        Ok(report) if report.critical_delivery_failed() => {
            snapshot.restore()?;
            let failed: Vec<&str> = report
                .outcomes
                .iter()
                .filter(|o| o.critical && !o.succeeded())
                .map(|o| o.channel.as_str())
                .collect();
            admin
                .alert(&format!(
                    "Unable to send alerts, please investigate: {}",
                    failed.join(", ")
                ))
                .await;
            Err(AppError::delivery(
                failed.join(", "),
                "critical channel failed, history rolled back",
            ))
        }
        Ok(report) => {
            snapshot.commit()?;
            Ok(report)
        }
        Err(e) => {
            snapshot.restore()?;
            Err(e)
        }
    }
}

/// Mutating half of the run. The store handle is dropped before returning
/// so the caller can restore the snapshot file underneath it.
async fn mutate_and_deliver(
    config: &Config,
    channels: &[Box<dyn Channel>],
    batches: Vec<(SourceId, Vec<RawRecord>)>,
    skipped_sources: Vec<SourceId>,
    run_timestamp: i64,
    no_send: bool,
) -> Result<RunReport> {
    let store = HistoryStore::open(&config.database)?;

    let mut report = RunReport {
        run_timestamp,
        skipped_sources,
        dry_run: no_send,
        ..RunReport::default()
    };
    let mut sections = Vec::new();

    for (source, raws) in batches {
        let engine = DeltaEngine::new(notify_on_update(config, source));
        let records = normalize_batch(source, &raws);
        let classified = engine.classify_batch(&store, records, run_timestamp)?;

        let notifiable = engine.notifiable(&classified);
        report.notified += notifiable.len();
        report.stats.push((source, tally(&classified)));
        sections.push((source, render::render_alerts(&notifiable)?));
    }

    let body = render::render_report(&sections);
    report.body_len = body.len();

    if body.is_empty() {
        log::info!("nothing new to report");
    } else if no_send {
        log::info!("send suppressed; report follows\n{body}");
    } else {
        report.outcomes = notify::dispatch(channels, &body).await;
    }

    Ok(report)
}

fn notify_on_update(config: &Config, source: SourceId) -> bool {
    config
        .sources
        .iter()
        .find(|s| s.id == source)
        .map(|s| s.notify_on_update)
        .unwrap_or(false)
}
