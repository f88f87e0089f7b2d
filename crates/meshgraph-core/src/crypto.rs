// crates/meshgraph-core/src/crypto.rs

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::MeshgraphError;
use crate::identity::PublicKey;

/// The node's ed25519 keypair. Only the public half is used by the engine;
/// signing belongs to the chain client.
pub struct Keypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Rebuild a keypair from its 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(secret))
    }

    /// Parse a hex-encoded 32-byte secret, as stored in key files.
    pub fn from_secret_hex(hex_str: &str) -> Result<Self, MeshgraphError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| MeshgraphError::Crypto(format!("Invalid secret key hex: {}", e)))?;
        let secret: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| {
                MeshgraphError::Crypto("Secret key must be exactly 32 bytes".to_string())
            })?;
        Ok(Self::from_secret_bytes(&secret))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// The public key as the engine sees it.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(self.verifying_key.to_bytes())
    }

    /// Hex encoding of the secret, suitable for a key file.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}
