// crates/meshgraph-engine/src/weights.rs
//
// Dense, square weight matrix for a metagraph snapshot.
//
// W[i][j] is the fraction of peer i's outgoing weight assigned to peer j.

use serde::{Deserialize, Serialize};

/// A dense n×n weight matrix indexed by dense peer index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightMatrix {
    /// Row-major entries: weights[from][to].
    weights: Vec<Vec<f64>>,
}

impl WeightMatrix {
    /// Create an n×n zero matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            weights: vec![vec![0.0; n]; n],
        }
    }

    /// Build a matrix from rows. Every row must have one entry per row.
    ///
    /// # Panics
    /// If the rows do not form a square matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let n = rows.len();
        assert!(
            rows.iter().all(|r| r.len() == n),
            "weight matrix must be square ({} rows)",
            n
        );
        Self { weights: rows }
    }

    /// Number of rows (and columns).
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Get the weight from peer `i` to peer `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.weights[i][j]
    }

    /// Outgoing weights of peer `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.weights[i]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.weights.iter().map(|r| r.as_slice())
    }

    /// Sum of row `i`. Either 0.0 (peer assigns nothing) or 1.0 within
    /// floating tolerance.
    pub fn row_sum(&self, i: usize) -> f64 {
        self.weights[i].iter().sum()
    }
}
