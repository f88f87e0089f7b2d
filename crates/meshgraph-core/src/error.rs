use thiserror::Error;

/// Error types shared by every Meshgraph crate.
#[derive(Debug, Error)]
pub enum MeshgraphError {
    /// Chain transport error (connection, RPC call, malformed response).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Weight or subscription submission was rejected by the chain client.
    #[error("Submission error: {0}")]
    Submission(String),

    /// Unknown public key, uid, or dense index.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A vector did not match the current network size.
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Invalid state transition or lifecycle misuse.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cryptographic error (key parsing, key generation).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for MeshgraphError {
    fn from(e: serde_json::Error) -> Self {
        MeshgraphError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for MeshgraphError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        MeshgraphError::Crypto(e.to_string())
    }
}
