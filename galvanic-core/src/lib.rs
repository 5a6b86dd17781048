//! Galvanic Core
//!
//! This crate provides the core engine of the Galvanic DC circuit simulator.
//! It settles voltages and currents by propagating signals through a graph
//! of components, nodes and wires, using only local update rules. There is
//! no matrix assembly and no equation solving.
//!
//! It implements:
//!
//! - The circuit graph (components own nodes, wires join nodes)
//! - The component behavior contract and the built-in kinds
//! - A cycle-safe, depth-first propagation engine
//! - A JSON circuit description format and an iteration driver
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Nodes, wires and the circuit arena that owns them
//! - `component`: Behaviors and the source/sink/resistor/voltmeter kinds
//! - `engine`: The propagator and its visited-wire record
//! - `simulation`: Iteration driver and snapshots
//! - `description`: JSON circuit descriptions
//!
//! # Example
//!
//! ```rust
//! use galvanic_core::{Circuit, Propagator};
//!
//! // Source 5V 0.1A -> 25 ohm resistor -> sink, voltmeter across the resistor
//! let mut circuit = Circuit::new();
//! let source = circuit.add_source(5.0, 0.1)?;
//! let resistor = circuit.add_resistor(25.0)?;
//! let sink = circuit.add_sink()?;
//! let meter = circuit.add_voltmeter()?;
//!
//! circuit.connect(source, 0, resistor, 0)?;
//! circuit.connect(resistor, 1, sink, 0)?;
//! circuit.connect(resistor, 0, meter, 0)?;
//! circuit.connect(resistor, 1, meter, 1)?;
//!
//! let mut propagator = Propagator::for_circuit(&circuit);
//! circuit.reset();
//! propagator.propagate(&mut circuit, source)?;
//!
//! let reading = circuit.operands(meter)?.primary;
//! assert!((reading - 2.5).abs() < 1e-9);
//! # Ok::<(), galvanic_core::CircuitError>(())
//! ```

pub mod component;
pub mod config;
pub mod description;
pub mod engine;
pub mod error;
pub mod graph;
pub mod simulation;

pub use component::{Behavior, ComponentContext, ComponentId, ComponentKind, Operands};
pub use config::{CircuitConfig, VisitedStrategy};
pub use description::{CircuitDescription, DescribedCircuit};
pub use engine::{EngineState, PropagationReport, Propagator};
pub use error::{CircuitError, Result};
pub use graph::{Caller, Circuit, Level, NodeId, WireId};
pub use simulation::{CircuitSnapshot, Simulation};
