//! Dispatch loop: delivers scheduled notifications once they fall due.

use std::sync::Arc;
use std::time::Duration;

use crewline_events::DeliveryWorker;
use tokio_util::sync::CancellationToken;

/// Sweep due notifications every `poll`, delivering at most `batch_size`
/// per sweep, until `cancel` is triggered.
pub async fn run(
    worker: Arc<DeliveryWorker>,
    poll: Duration,
    batch_size: i64,
    cancel: CancellationToken,
) {
    tracing::info!(poll_secs = poll.as_secs(), batch_size, "Dispatch loop started");

    let mut ticker = tokio::time::interval(poll);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Dispatch loop stopping");
                break;
            }
            _ = ticker.tick() => {
                match worker.deliver_due(batch_size).await {
                    Ok(0) => tracing::debug!("Dispatch: nothing due"),
                    Ok(delivered) => tracing::info!(delivered, "Dispatch: delivered due notifications"),
                    Err(e) => tracing::error!(error = %e, "Dispatch: failed to list due notifications"),
                }
            }
        }
    }
}
