// crates/meshgraph-engine/src/publish.rs
//
// Weight publication: encode -> submit -> wait for the chain to reflect the
// submitted values.
//
// Submission is fire-and-forget (no wait for inclusion); confirmation is a
// bounded poll of what the chain records for this node. Neither step retries
// on its own. Callers decide whether to publish again.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use meshgraph_core::{ChainClient, MeshgraphError, PublicKey};

/// Final state of one publication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The chain records exactly the submitted weights.
    Confirmed,
    /// The submission itself was rejected.
    SubmissionFailed,
    /// Submitted, but the chain did not reflect it before the deadline.
    TimedOut,
}

impl PublishOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PublishOutcome::Confirmed)
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Confirmed => write!(f, "Confirmed"),
            PublishOutcome::SubmissionFailed => write!(f, "SubmissionFailed"),
            PublishOutcome::TimedOut => write!(f, "TimedOut"),
        }
    }
}

/// Order-independent, exact comparison of submitted and on-chain weights.
///
/// Any missing key, extra key, duplicate key, or differing value makes the
/// sets unequal.
pub fn weights_match(
    submitted: &[(PublicKey, u32)],
    chain_keys: &[PublicKey],
    chain_values: &[u32],
) -> bool {
    if chain_keys.len() != chain_values.len() || chain_keys.len() != submitted.len() {
        return false;
    }
    let local: HashMap<&PublicKey, u32> = submitted.iter().map(|(k, v)| (k, *v)).collect();
    let remote: HashMap<&PublicKey, u32> = chain_keys
        .iter()
        .zip(chain_values.iter().copied())
        .collect();
    local.len() == submitted.len() && local == remote
}

/// Submits weights on behalf of one public key and waits for confirmation.
#[derive(Debug, Clone)]
pub struct WeightPublisher {
    own_key: PublicKey,
    poll_interval: Duration,
    timeout: Duration,
}

impl WeightPublisher {
    pub fn new(own_key: PublicKey, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            own_key,
            poll_interval,
            timeout,
        }
    }

    /// Submit already-encoded weights and wait for them to land.
    pub async fn publish(
        &self,
        chain: &dyn ChainClient,
        encoded: Vec<(PublicKey, u32)>,
    ) -> PublishOutcome {
        let (keys, values): (Vec<PublicKey>, Vec<u32>) = encoded.iter().cloned().unzip();

        tracing::debug!("Publishing {} weights", keys.len());
        if let Err(e) = chain.set_weights(keys, values, false).await {
            tracing::warn!("Failed to emit weights: {}", e);
            return PublishOutcome::SubmissionFailed;
        }

        self.wait_for_inclusion(chain, &encoded).await
    }

    async fn wait_for_inclusion(
        &self,
        chain: &dyn ChainClient,
        submitted: &[(PublicKey, u32)],
    ) -> PublishOutcome {
        // No deadline if the timeout overflows the clock.
        let deadline = Instant::now().checked_add(self.timeout);

        loop {
            match self.fetch_own_weights(chain).await {
                Ok((keys, values)) if weights_match(submitted, &keys, &values) => {
                    tracing::info!("Weights confirmed on chain ({} entries)", keys.len());
                    return PublishOutcome::Confirmed;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Weight confirmation poll failed: {}", e);
                }
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::warn!(
                            "Timeout after {:?} while waiting for weights inclusion",
                            self.timeout
                        );
                        return PublishOutcome::TimedOut;
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            tokio::time::sleep(pause).await;
        }
    }

    async fn fetch_own_weights(
        &self,
        chain: &dyn ChainClient,
    ) -> Result<(Vec<PublicKey>, Vec<u32>), MeshgraphError> {
        let keys = chain.weight_keys(&self.own_key).await?;
        let values = chain.weight_values(&self.own_key).await?;
        Ok((keys, values))
    }
}
