//! Circuit Configuration
//!
//! Capacities that bound circuit assembly and propagation. The defaults
//! mirror small embedded limits: eight wires per node, eight nodes per
//! component and a visited-set of 128 wires.

use serde::{Deserialize, Serialize};

/// Default number of wires that may attach to a single node.
pub const DEFAULT_MAX_NODE_CONNECTIONS: usize = 8;

/// Default number of nodes a single component may own.
pub const DEFAULT_MAX_COMPONENT_NODES: usize = 8;

/// Default capacity of a bounded visited-set.
pub const DEFAULT_MAX_VISITED_WIRES: usize = 128;

/// How the propagation engine records visited wires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum VisitedStrategy {
    /// At most `capacity` wires per run. Visiting more fails the run.
    Bounded { capacity: usize },
    /// No limit on the number of wires per run.
    Unbounded,
}

impl VisitedStrategy {
    /// The capacity limit, if any.
    pub fn limit(&self) -> Option<usize> {
        match self {
            VisitedStrategy::Bounded { capacity } => Some(*capacity),
            VisitedStrategy::Unbounded => None,
        }
    }
}

impl Default for VisitedStrategy {
    fn default() -> Self {
        VisitedStrategy::Bounded {
            capacity: DEFAULT_MAX_VISITED_WIRES,
        }
    }
}

/// Limits applied while assembling and propagating a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Maximum wires attached to one node.
    pub max_node_connections: usize,

    /// Maximum nodes owned by one component.
    pub max_component_nodes: usize,

    /// Visited-set strategy used by propagators built from this config.
    pub visited: VisitedStrategy,
}

impl CircuitConfig {
    /// A config with no limit on the visited-set.
    ///
    /// Node and component capacities keep their defaults.
    pub fn unbounded() -> Self {
        Self {
            visited: VisitedStrategy::Unbounded,
            ..Self::default()
        }
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            max_node_connections: DEFAULT_MAX_NODE_CONNECTIONS,
            max_component_nodes: DEFAULT_MAX_COMPONENT_NODES,
            visited: VisitedStrategy::default(),
        }
    }
}
