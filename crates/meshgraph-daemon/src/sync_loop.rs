// crates/meshgraph-daemon/src/sync_loop.rs
//
// Background sync loop: re-syncs the metagraph on a fixed interval and,
// when configured, publishes a uniform weight vector after each pass.

use std::time::Duration;

use meshgraph_engine::{Metagraph, SyncReport};

use crate::state::{NodeState, NodeStateMachine};

/// Run sync passes every `interval_secs` until Ctrl-C.
///
/// A failed pass is logged and the loop carries on with the next tick.
pub async fn run_sync_loop(
    metagraph: &Metagraph,
    state: &mut NodeStateMachine,
    interval_secs: u64,
    emit_uniform: bool,
) -> Result<(), String> {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Sync loop received shutdown signal");
                break;
            }
            _ = interval.tick() => {
                state.transition(NodeState::Syncing)?;
                sync_once(metagraph, emit_uniform).await;
                state.transition(NodeState::Ready)?;
            }
        }
    }

    Ok(())
}

/// Perform a single sync pass, then optionally publish uniform weights.
pub async fn sync_once(metagraph: &Metagraph, emit_uniform: bool) -> Option<SyncReport> {
    let report = match metagraph.sync().await {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("Sync loop error: {}", e);
            return None;
        }
    };

    tracing::debug!(
        "Synced block {}: {} scheduled, {} updated, {} new, {} failed",
        report.block,
        report.scheduled,
        report.updated,
        report.added,
        report.failed
    );

    if emit_uniform {
        let n = metagraph.snapshot().await.n;
        let weights = uniform_weights(n);
        match metagraph.emit(&weights).await {
            Ok(true) => tracing::info!("Uniform weights over {} peers confirmed", n),
            Ok(false) => tracing::warn!("Uniform weights over {} peers not confirmed", n),
            Err(e) => tracing::warn!("Failed to emit uniform weights: {}", e),
        }
    }

    Some(report)
}

pub fn uniform_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}
