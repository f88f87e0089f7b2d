// crates/meshgraph-core/src/neuron.rs

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::identity::PublicKey;

/// Endpoint description of a single peer on the network.
///
/// Descriptors are never edited in place. A sync that observes new endpoint
/// data builds a fresh descriptor and swaps it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronDescriptor {
    /// Identity of the peer.
    pub public_key: PublicKey,
    /// Advertised network address.
    pub address: IpAddr,
    /// Advertised port.
    pub port: u16,
    /// Protocol version string.
    pub version: String,
}

impl NeuronDescriptor {
    pub fn new(
        public_key: PublicKey,
        address: IpAddr,
        port: u16,
        version: impl Into<String>,
    ) -> Self {
        Self {
            public_key,
            address,
            port,
            version: version.into(),
        }
    }

    /// Build a descriptor from what the chain reports for `public_key`.
    pub fn from_info(public_key: PublicKey, info: NeuronInfo) -> Self {
        Self {
            public_key,
            address: info.address,
            port: info.port,
            version: info.version,
        }
    }
}

/// Endpoint data the chain records for a subscribed peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronInfo {
    pub address: IpAddr,
    pub port: u16,
    pub version: String,
}
