//! Graph Nodes
//!
//! This module defines the junctions that live in the circuit graph. A node
//! always belongs to exactly one component and carries a voltage/current
//! pair plus the ordered list of wires attached to it.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::component::ComponentId;
use crate::config::DEFAULT_MAX_NODE_CONNECTIONS;
use crate::error::{Capacity, CircuitError, Result};
use super::wire::WireId;

/// Identifier of a node within its circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// An electrical value: voltage and current at one point of the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Level {
    pub voltage: f64,
    pub current: f64,
}

impl Level {
    /// 0V, 0A.
    pub const ZERO: Level = Level {
        voltage: 0.0,
        current: 0.0,
    };

    pub fn new(voltage: f64, current: f64) -> Self {
        Self { voltage, current }
    }
}

impl Add for Level {
    type Output = Level;

    fn add(self, rhs: Level) -> Level {
        Level::new(self.voltage + rhs.voltage, self.current + rhs.current)
    }
}

impl AddAssign for Level {
    fn add_assign(&mut self, rhs: Level) {
        self.voltage += rhs.voltage;
        self.current += rhs.current;
    }
}

/// Who asked a node to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// The owning component changed the node. The node fans out to its wires.
    FromComponent,

    /// A wire delivered a value. The node notifies its owning component.
    FromWire,
}

/// A junction in the circuit graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// The component that owns this node. Fixed at creation.
    owner: ComponentId,

    /// Position of this node within its owner's node list.
    slot: usize,

    /// Current electrical value.
    level: Level,

    /// Attached wires, in the order they were connected.
    connections: SmallVec<[WireId; DEFAULT_MAX_NODE_CONNECTIONS]>,
}

impl Node {
    /// Create a node at rest owned by `owner`.
    pub fn new(id: NodeId, owner: ComponentId, slot: usize) -> Self {
        Self {
            id,
            owner,
            slot,
            level: Level::ZERO,
            connections: SmallVec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn voltage(&self) -> f64 {
        self.level.voltage
    }

    pub fn current(&self) -> f64 {
        self.level.current
    }

    /// Attached wires in insertion order.
    pub fn connections(&self) -> &[WireId] {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Attach a wire to this node.
    ///
    /// Fails with `CapacityExceeded` once `limit` wires are attached.
    pub fn add_connection(&mut self, wire: WireId, limit: usize) -> Result<()> {
        if self.connections.len() >= limit {
            return Err(CircuitError::CapacityExceeded {
                what: Capacity::NodeConnections,
                limit,
            });
        }
        self.connections.push(wire);
        Ok(())
    }

    /// Overwrite the node's value.
    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    /// Add a contribution to the node's value (fan-in).
    pub fn accumulate(&mut self, level: Level) {
        self.level += level;
    }

    /// Return the node to 0V, 0A.
    pub fn reset(&mut self) {
        self.level = Level::ZERO;
    }
}
