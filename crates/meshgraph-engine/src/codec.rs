// crates/meshgraph-engine/src/codec.rs
//
// Fixed-point weight codec.
//
// On chain a weight is a u32 where u32::MAX stands for 1.0. Encoding drops
// every position at or below EPSILON so payloads only carry meaningful
// entries. Decoding happens per row: values are divided by the row's integer
// sum.

use meshgraph_core::{MeshgraphError, PublicKey};

/// Fixed-point value representing a weight of 1.0.
pub const MAX_WEIGHT: u32 = u32::MAX;

/// Weights at or below this value are not published.
pub const EPSILON: f64 = 0.0001;

/// Encode a dense weight vector as sparse `(public key, fixed-point)` pairs.
///
/// `pubkeys[i]` names the peer at dense index `i`. Output order follows the
/// dense index. Values above 1.0 saturate at [`MAX_WEIGHT`]; NaN entries are
/// dropped with the near-zero ones.
pub fn encode(
    weights: &[f64],
    pubkeys: &[PublicKey],
) -> Result<Vec<(PublicKey, u32)>, MeshgraphError> {
    if weights.len() != pubkeys.len() {
        return Err(MeshgraphError::LengthMismatch {
            expected: pubkeys.len(),
            actual: weights.len(),
        });
    }

    Ok(weights
        .iter()
        .zip(pubkeys)
        .filter(|(w, _)| **w > EPSILON)
        .map(|(w, key)| (key.clone(), to_fixed(*w)))
        .collect())
}

fn to_fixed(weight: f64) -> u32 {
    let scaled = (weight * MAX_WEIGHT as f64).round();
    if scaled >= MAX_WEIGHT as f64 {
        MAX_WEIGHT
    } else {
        scaled as u32
    }
}

/// Turn fixed-point entries `(column, value)` into a row of length `n`.
///
/// Each value is divided by the sum of all values, so a non-empty row sums
/// to 1.0. A row whose values sum to zero stays all-zero. Repeated columns
/// accumulate.
///
/// # Panics
/// If a column is `>= n`.
pub fn normalize_row(n: usize, entries: impl IntoIterator<Item = (usize, u32)>) -> Vec<f64> {
    let entries: Vec<(usize, u32)> = entries.into_iter().collect();
    let mut row = vec![0.0; n];
    let total: u64 = entries.iter().map(|(_, v)| *v as u64).sum();
    if total == 0 {
        return row;
    }
    for (j, value) in entries {
        row[j] += value as f64 / total as f64;
    }
    row
}
