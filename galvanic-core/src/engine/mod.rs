//! Propagation Engine
//!
//! This module settles a circuit by walking it from a source component.
//!
//! # Algorithm
//!
//! A run proceeds as follows:
//!
//! 1. Clear the visited-wire record
//! 2. Invoke the source's behavior with no notifier
//! 3. Process the pending steps until none remain:
//!    - a node updated by a component fans out to its wires in order
//!    - a wire fires unless already visited, accumulating into its far node
//!    - a node updated by a wire notifies its owning component
//! 4. Clear the visited-wire record again
//!
//! Each wire fires at most once per run, so a run is bounded by the number
//! of wires even when the circuit contains loops.
//!
//! # State
//!
//! The visited record is owned by a [`Propagator`]. It is never shared
//! between propagators, so independent circuits can be settled in the same
//! process without interfering.

mod propagator;
mod visited;

pub use propagator::{EngineState, PropagationReport, Propagator};
pub use visited::VisitedSet;
