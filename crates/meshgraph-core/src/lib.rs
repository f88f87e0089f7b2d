// crates/meshgraph-core/src/lib.rs
//
// meshgraph-core: Core types, chain capabilities, and crypto primitives for
// the Meshgraph metagraph engine.
//
// This is the leaf crate that the engine and the daemon depend on. It defines
// peer identities, neuron descriptors, the error type, and the trait
// interfaces through which the engine talks to the chain and to metrics.

pub mod crypto;
pub mod error;
pub mod identity;
pub mod mock;
pub mod net;
pub mod neuron;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use meshgraph_core::PublicKey;`

// Identity types
pub use identity::{PublicKey, Uid};

// Neuron types
pub use neuron::{NeuronDescriptor, NeuronInfo};

// Error type
pub use error::MeshgraphError;

// Traits
pub use traits::{ChainClient, MetricsSink, NoopMetrics};
