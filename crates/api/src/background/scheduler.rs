//! Periodic scheduler loop: runs every job kind on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use crewline_events::{JobKind, NotificationScheduler};
use tokio_util::sync::CancellationToken;

/// Run every scheduler job each `interval` until `cancel` is triggered.
///
/// A failing job is logged and does not stop the others.
pub async fn run(scheduler: Arc<NotificationScheduler>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Scheduler loop started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Scheduler loop stopping");
                break;
            }
            _ = ticker.tick() => {
                for job in JobKind::ALL {
                    match scheduler.run(job).await {
                        Ok(report) => tracing::debug!(
                            %job,
                            candidates = report.candidates,
                            created = report.created,
                            "Scheduler job completed"
                        ),
                        Err(e) => tracing::error!(%job, error = %e, "Scheduler job failed"),
                    }
                }
            }
        }
    }
}
