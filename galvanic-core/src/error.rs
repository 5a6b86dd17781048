//! Error types for galvanic-core.
//!
//! Every variant describes a malformed graph or a misuse of the assembly
//! API. A well-formed circuit never produces an error during propagation.

use thiserror::Error;

use crate::component::ComponentId;
use crate::graph::{NodeId, WireId};

/// What kind of fixed-size list overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Wires attached to a single node.
    NodeConnections,
    /// Nodes owned by a single component.
    ComponentNodes,
    /// Wires recorded in a bounded visited-set.
    VisitedWires,
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capacity::NodeConnections => write!(f, "node connections"),
            Capacity::ComponentNodes => write!(f, "component nodes"),
            Capacity::VisitedWires => write!(f, "visited wires"),
        }
    }
}

/// A graph element named in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Component(ComponentId),
    Wire(WireId),
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Component(id) => write!(f, "{id}"),
            Element::Wire(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("capacity exceeded: {what} is limited to {limit}")]
    CapacityExceeded { what: Capacity, limit: usize },

    #[error("{target} updated by {caller}, which is not attached to it")]
    InvalidCaller { target: Element, caller: NodeId },

    #[error("{0} has no behavior bound")]
    UnconfiguredComponent(ComponentId),

    #[error("{0} is not a source")]
    NotASource(ComponentId),

    #[error("unknown component: {0}")]
    UnknownComponent(ComponentId),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("unknown wire: {0}")]
    UnknownWire(WireId),

    #[error("{component} has {count} nodes, index {index} is out of range")]
    NodeIndexOutOfRange {
        component: ComponentId,
        index: usize,
        count: usize,
    },

    #[error("unknown component name: {0}")]
    UnknownComponentName(String),

    #[error("duplicate component name: {0}")]
    DuplicateComponentName(String),

    #[error("invalid circuit description: {0}")]
    Description(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CircuitError>;
