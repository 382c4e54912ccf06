//! Periodic refresh driver

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::reconciler::Discovery;
use super::target::TargetGroup;
use crate::error::{Error, Result};

/// Refresh `discovery` every `interval` and forward each batch to `sink`.
///
/// The first cycle runs immediately. Cycles never overlap: a slow cycle
/// pushes the next tick back. A failed cycle is logged and nothing is sent
/// for it. Returns `Ok` once `shutdown` is cancelled, which is checked
/// between cycles and while waiting for room in `sink`, or
/// [`Error::SinkClosed`] if the receiver went away.
pub async fn run(
    mut discovery: Discovery,
    interval: Duration,
    sink: mpsc::Sender<Vec<TargetGroup>>,
    shutdown: CancellationToken,
) -> Result<()> {
    info!("Starting discovery loop with refresh interval {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Discovery loop cancelled");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        match discovery.refresh().await {
            Ok(groups) => {
                tokio::select! {
                    sent = sink.send(groups) => {
                        if sent.is_err() {
                            warn!("Target group receiver dropped, stopping discovery loop");
                            return Err(Error::SinkClosed);
                        }
                    }
                    _ = shutdown.cancelled() => {
                        info!("Discovery loop cancelled while waiting on the sink");
                        return Ok(());
                    }
                }
            }
            Err(e) => error!("Error in refresh loop: {}", e),
        }
    }
}
