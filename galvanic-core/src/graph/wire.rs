//! Wires
//!
//! A wire is an edge joining exactly two nodes. It never owns its endpoints;
//! the circuit that created it does.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CircuitError, Element, Result};
use super::node::{Level, NodeId};

/// Identifier of a wire within its circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireId(usize);

impl WireId {
    /// Get the raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for WireId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire#{}", self.0)
    }
}

/// An edge between two nodes.
#[derive(Debug, Clone)]
pub struct Wire {
    id: WireId,

    /// Endpoints `a` and `b`. Fixed at creation.
    ends: (NodeId, NodeId),

    /// Value carried during the last propagation that reached this wire.
    level: Level,
}

impl Wire {
    pub fn new(id: WireId, a: NodeId, b: NodeId) -> Self {
        Self {
            id,
            ends: (a, b),
            level: Level::ZERO,
        }
    }

    pub fn id(&self) -> WireId {
        self.id
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        self.ends
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The endpoint opposite `caller`.
    pub fn other_end(&self, caller: NodeId) -> Result<NodeId> {
        let (a, b) = self.ends;
        if caller == a {
            Ok(b)
        } else if caller == b {
            Ok(a)
        } else {
            Err(CircuitError::InvalidCaller {
                target: Element::Wire(self.id),
                caller,
            })
        }
    }

    /// Take on the caller's value and return what reaches the far end.
    ///
    /// Voltage is copied. Current is split evenly across the `fan_out`
    /// wires attached to the caller.
    pub fn carry(&mut self, caller: NodeId, from: Level, fan_out: usize) -> Result<(NodeId, Level)> {
        let other = self.other_end(caller)?;
        self.level = Level::new(from.voltage, from.current / fan_out.max(1) as f64);
        Ok((other, self.level))
    }

    pub fn reset(&mut self) {
        self.level = Level::ZERO;
    }
}
