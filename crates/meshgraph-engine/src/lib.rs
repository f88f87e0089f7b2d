// crates/meshgraph-engine/src/lib.rs
//
// meshgraph-engine: keeps a local, consistent view of the metagraph.
//
// Polls the chain through a `ChainClient`, reconciles what it sees into a
// peer cache with a stable uid/public-key/dense-index mapping, rebuilds an
// immutable snapshot with a row-normalized weight matrix after every sync,
// and publishes this node's weights back to the chain in fixed point.

pub mod blocking;
pub mod cache;
pub mod codec;
pub mod config;
pub mod index;
pub mod metagraph;
pub mod publish;
pub mod snapshot;
pub mod sync;
pub mod weights;

pub use blocking::BlockingMetagraph;
pub use config::MetagraphConfig;
pub use metagraph::Metagraph;
pub use publish::PublishOutcome;
pub use snapshot::NetworkSnapshot;
pub use sync::SyncReport;
