//! Circuit Graph
//!
//! This module implements the graph that signals propagate through.
//!
//! # Overview
//!
//! The graph has three kinds of elements:
//!
//! - Components own a small, fixed set of nodes and carry behavior
//! - Nodes are junctions holding a voltage/current pair
//! - Wires are edges joining exactly two nodes
//!
//! A node may have several wires attached (fan-out) and several wires may
//! deliver into the same node (fan-in). Cycles are allowed; the propagation
//! engine guarantees each wire fires at most once per run.
//!
//! # Design Decisions
//!
//! 1. Everything lives in a single arena, [`Circuit`], and refers to
//!    everything else by index. A node's owner and a wire's endpoints are
//!    therefore non-owning by construction.
//!
//! 2. Connection lists are inline small vectors sized for the default
//!    capacity, so the common case never allocates.

mod circuit;
mod node;
mod wire;

pub use circuit::Circuit;
pub use node::{Caller, Level, Node, NodeId};
pub use wire::{Wire, WireId};
