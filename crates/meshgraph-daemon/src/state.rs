// crates/meshgraph-daemon/src/state.rs
//
// Node state machine for the Meshgraph daemon.
//
// Valid transitions:
//   Initializing -> Connecting -> Subscribing -> Syncing -> Ready -> Syncing
//   Connecting -> Syncing (single-pass mode, no subscription)
//   Any state -> ShuttingDown

use std::fmt;

/// Lifecycle states of the daemon node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Node is starting up and loading configuration.
    Initializing,
    /// Node is opening its chain connection.
    Connecting,
    /// Node has announced its endpoint and waits for it to appear on chain.
    Subscribing,
    /// A sync pass is running.
    Syncing,
    /// Snapshot is current; waiting for the next pass.
    Ready,
    /// Node is shutting down gracefully.
    ShuttingDown,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Connecting => write!(f, "Connecting"),
            NodeState::Subscribing => write!(f, "Subscribing"),
            NodeState::Syncing => write!(f, "Syncing"),
            NodeState::Ready => write!(f, "Ready"),
            NodeState::ShuttingDown => write!(f, "ShuttingDown"),
        }
    }
}

/// State machine for managing node lifecycle transitions.
pub struct NodeStateMachine {
    pub current: NodeState,
}

impl NodeStateMachine {
    pub fn new() -> Self {
        Self {
            current: NodeState::Initializing,
        }
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns an error if the transition is not valid.
    pub fn transition(&mut self, new_state: NodeState) -> Result<(), String> {
        let valid = match (&self.current, &new_state) {
            (_, NodeState::ShuttingDown) => true,
            (NodeState::Initializing, NodeState::Connecting) => true,
            (NodeState::Connecting, NodeState::Subscribing) => true,
            (NodeState::Connecting, NodeState::Syncing) => true,
            (NodeState::Subscribing, NodeState::Syncing) => true,
            (NodeState::Syncing, NodeState::Ready) => true,
            (NodeState::Ready, NodeState::Syncing) => true,
            _ => false,
        };

        if valid {
            tracing::trace!("State transition: {} -> {}", self.current, new_state);
            self.current = new_state;
            Ok(())
        } else {
            Err(format!(
                "Invalid state transition: {} -> {}",
                self.current, new_state
            ))
        }
    }
}

impl Default for NodeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
