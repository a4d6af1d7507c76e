//! The sequential transformation runner.
//!
//! ## Why strictly sequential?
//!
//! One file at a time keeps progress legible and the shared record
//! collection simple — there is never more than one in-flight record, so
//! the only interleaving to reason about is user-triggered removal, which
//! every update tolerates. The transforms themselves have no inter-file
//! dependency; a future release could process images concurrently without
//! changing the workspace contract.
//!
//! The runner owns all status transitions: `Idle`/`Failed` records move to
//! `Running`, then to `Done` or `Failed`. `Done` records are skipped, so
//! repeated runs converge; failed records are re-attempted on the next run.
//! A strategy failure is caught at the per-record boundary and recorded on
//! the record — one bad file never blocks the batch.

use crate::config::CompressionConfig;
use crate::record::FileStatus;
use crate::workspace::Workspace;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome counts for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Records that were eligible when the run started.
    pub eligible: usize,
    /// Records that reached `Done`.
    pub succeeded: usize,
    /// Records that reached `Failed`.
    pub failed: usize,
    /// Records removed mid-run; their updates were dropped.
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Clears the workspace's running flag on every exit path.
struct RunGuard<'a>(&'a Workspace);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.end_run();
    }
}

/// Drive every eligible record through the workspace's strategy, one at a
/// time, in collection order.
///
/// No-ops (returning an empty report) when the workspace is empty or a run
/// is already in progress — re-entrant calls are ignored, not queued.
pub async fn run(workspace: &Workspace, config: &CompressionConfig) -> RunReport {
    let started = Instant::now();
    let mut report = RunReport::default();

    if workspace.is_empty() {
        return report;
    }
    if !workspace.try_begin_run() {
        debug!("run already in progress; ignoring re-entrant call");
        return report;
    }
    let _guard = RunGuard(workspace);

    // Snapshot the eligible ids up front. Records added after this point
    // wait for the next run; records removed after this point are skipped
    // at their turn.
    let eligible: Vec<_> = workspace
        .ids()
        .into_iter()
        .filter(|id| workspace.status_of(*id) != Some(FileStatus::Done))
        .collect();
    let total = eligible.len();
    report.eligible = total;
    if total == 0 {
        return report;
    }

    let strategy = workspace.strategy().clone();
    info!("run started: {total} file(s) via {}", strategy.name());
    if let Some(cb) = &config.progress_callback {
        cb.on_batch_start(total);
    }

    for (index, id) in eligible.iter().enumerate() {
        let file_num = index + 1;

        let Some(source) = workspace.begin_record(*id) else {
            debug!("record {id} removed before its turn");
            report.skipped += 1;
            continue;
        };
        let name = source.name().to_string();
        if let Some(cb) = &config.progress_callback {
            cb.on_file_start(file_num, total, &name);
        }

        let progress_sink = |percent: u8| {
            workspace.set_progress(*id, percent);
            if let Some(cb) = &config.progress_callback {
                cb.on_file_progress(file_num, total, percent);
            }
        };

        match strategy.compress(&source, config, &progress_sink).await {
            Ok(output) => match workspace.complete_record(*id, &output) {
                Ok(Some(result_size)) => {
                    debug!("'{name}': {} → {} bytes", source.len(), result_size);
                    report.succeeded += 1;
                    if let Some(cb) = &config.progress_callback {
                        cb.on_file_complete(file_num, total, result_size);
                    }
                }
                Ok(None) => {
                    report.skipped += 1;
                }
                Err(e) => {
                    // Staging the result failed (disk full, tmpdir gone).
                    // That is a per-record failure, not a batch abort.
                    let message = e.to_string();
                    if workspace.fail_record(*id, &message) {
                        report.failed += 1;
                        if let Some(cb) = &config.progress_callback {
                            cb.on_file_error(file_num, total, &message);
                        }
                    } else {
                        report.skipped += 1;
                    }
                }
            },
            Err(e) => {
                let message = e.to_string();
                if workspace.fail_record(*id, &message) {
                    debug!("'{name}' failed: {message}");
                    report.failed += 1;
                    if let Some(cb) = &config.progress_callback {
                        cb.on_file_error(file_num, total, &message);
                    }
                } else {
                    report.skipped += 1;
                }
            }
        }

        // Pause between records, not after the last one.
        if file_num < total && config.inter_file_pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.inter_file_pause_ms)).await;
        }
    }

    report.duration_ms = started.elapsed().as_millis() as u64;
    info!(
        "run finished: {}/{} succeeded, {} failed, {} skipped in {}ms",
        report.succeeded, total, report.failed, report.skipped, report.duration_ms
    );
    if let Some(cb) = &config.progress_callback {
        cb.on_batch_complete(total, report.succeeded);
    }

    report
}
