// crates/meshgraph-daemon/src/main.rs
//
// Binary entrypoint for the Meshgraph daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, loads the
// node key, connects to the chain, subscribes this node's endpoint, and keeps
// the metagraph in sync until Ctrl-C.

mod config;
mod metrics;
mod rpc_client;
mod state;
mod sync_loop;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::DaemonConfig;
use metrics::TracingMetrics;
use rpc_client::JsonRpcChainClient;
use state::{NodeState, NodeStateMachine};

use meshgraph_core::crypto::Keypair;
use meshgraph_core::{MeshgraphError, NeuronDescriptor};
use meshgraph_engine::Metagraph;

/// Meshgraph daemon: keeps a local metagraph in sync with the chain.
#[derive(Parser, Debug)]
#[command(name = "meshgraph-daemon", version, about = "Meshgraph metagraph sync daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.meshgraph/config.toml")]
    config: String,

    /// Chain JSON-RPC endpoint; overrides the config file value.
    #[arg(long)]
    chain_endpoint: Option<String>,

    /// Run a single sync pass, print a summary, and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config is read before tracing so `log_level` can seed the filter.
    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    if let Some(endpoint) = args.chain_endpoint {
        daemon_config.chain_endpoint = endpoint;
    }

    tracing::info!("Meshgraph Daemon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Chain endpoint: {}", daemon_config.chain_endpoint);
    tracing::info!(
        "Endpoint: {}:{}",
        daemon_config.axon_ip,
        daemon_config.axon_port
    );

    let mut state_machine = NodeStateMachine::new();

    let keypair = load_keypair(&daemon_config);
    let address: IpAddr = daemon_config.axon_ip.parse().map_err(|e| {
        MeshgraphError::Config(format!("Invalid axon_ip '{}': {}", daemon_config.axon_ip, e))
    })?;
    let neuron = NeuronDescriptor::new(
        keypair.public_key(),
        address,
        daemon_config.axon_port,
        env!("CARGO_PKG_VERSION"),
    );
    tracing::info!("Hotkey: {}", neuron.public_key);

    let chain = Arc::new(JsonRpcChainClient::new(
        &daemon_config.chain_endpoint,
        keypair,
        Duration::from_secs(daemon_config.request_timeout_secs),
    )?);
    let metagraph = Metagraph::new(
        chain,
        Arc::new(TracingMetrics::new()),
        neuron,
        daemon_config.metagraph.clone(),
    );

    state_machine.transition(NodeState::Connecting)?;
    if !metagraph.connect().await {
        state_machine.transition(NodeState::ShuttingDown)?;
        return Err(format!(
            "Could not connect to chain at {}",
            daemon_config.chain_endpoint
        )
        .into());
    }

    if args.once {
        state_machine.transition(NodeState::Syncing)?;
        let report = metagraph.sync().await?;
        let snapshot = metagraph.snapshot().await;
        println!(
            "block {}: {} peers ({} updated, {} new, {} failed)",
            snapshot.block, snapshot.n, report.updated, report.added, report.failed
        );
        for i in 0..snapshot.n {
            println!(
                "  uid {:>4}  {}  stake {:>12}  last {:>8}  {}:{}",
                snapshot.uids[i],
                snapshot.pubkeys[i],
                snapshot.stake[i],
                snapshot.last_emission[i],
                snapshot.neurons[i].address,
                snapshot.neurons[i].port
            );
        }
        state_machine.transition(NodeState::ShuttingDown)?;
        return Ok(());
    }

    let subscribe_timeout = Duration::from_secs(daemon_config.subscribe_timeout_secs);
    state_machine.transition(NodeState::Subscribing)?;
    if !metagraph.subscribe(subscribe_timeout).await {
        state_machine.transition(NodeState::ShuttingDown)?;
        return Err("Subscription did not appear on chain in time".into());
    }

    sync_loop::run_sync_loop(
        &metagraph,
        &mut state_machine,
        daemon_config.sync_interval_secs,
        daemon_config.emit_uniform,
    )
    .await?;

    state_machine.transition(NodeState::ShuttingDown)?;
    metagraph.unsubscribe(subscribe_timeout).await;
    tracing::info!("Meshgraph daemon shut down gracefully");

    Ok(())
}

/// Load the node keypair from the hex secret at `key_path`.
///
/// Falls back to a freshly generated keypair if the file is missing or
/// invalid; that identity is lost on exit.
fn load_keypair(config: &DaemonConfig) -> Keypair {
    let key_path = expand_tilde(&config.key_path);
    match std::fs::read_to_string(&key_path) {
        Ok(hex_str) => match Keypair::from_secret_hex(&hex_str) {
            Ok(keypair) => return keypair,
            Err(e) => tracing::warn!("Invalid secret key at {}: {}", key_path, e),
        },
        Err(_) => tracing::debug!("Secret key not found at {}", key_path),
    }
    tracing::warn!("Running with an ephemeral keypair; no usable key file at {}", key_path);
    Keypair::generate()
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
