// src/ingest/scheduler.rs
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::info;

use crate::ingest::config::SourceConfig;
use crate::ingest::providers::build_adapters;
use crate::ingest::types::IngestContext;

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval_secs: u64,
}

impl Default for IngestSchedulerCfg {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

/// Spawn the background loop that runs a full ingestion cycle on every tick.
/// The first tick fires immediately; ticks missed while a run is still in
/// flight are skipped rather than bursted.
pub fn spawn_ingest_scheduler(
    cfg: IngestSchedulerCfg,
    sources: Vec<SourceConfig>,
    ctx: IngestContext,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let adapters = build_adapters(&sources);
            let report = crate::ingest::run_ingestion(&adapters, &ctx).await;

            counter!("ingest_runs_total").increment(1);
            info!(
                target: "ingest",
                imported = report.imported,
                skipped = report.skipped,
                errors = report.errors.len(),
                "scheduled ingest tick"
            );
        }
    })
}
