//! Simulation Driver
//!
//! Repeats the propagation cycle over a circuit. Every iteration:
//!
//! 1. Zero every node and wire
//! 2. Propagate from each source, in component creation order
//!
//! Nodes are zeroed once per iteration, not once per source, so the
//! contributions of several sources add up at shared nodes.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::component::{ComponentId, Operands};
use crate::description::{CircuitDescription, DescribedCircuit};
use crate::engine::{PropagationReport, Propagator};
use crate::error::{CircuitError, Result};
use crate::graph::{Circuit, Level, NodeId, WireId};

/// A circuit together with the engine that settles it.
#[derive(Debug)]
pub struct Simulation {
    circuit: Circuit,
    propagator: Propagator,
    names: IndexMap<String, ComponentId>,
    iterations: u64,
}

impl Simulation {
    /// Simulate an anonymous circuit.
    pub fn new(circuit: Circuit) -> Self {
        Self::with_names(circuit, IndexMap::new())
    }

    /// Build and simulate a described circuit.
    pub fn from_description(description: &CircuitDescription) -> Result<Self> {
        Ok(description.build()?.into())
    }

    fn with_names(circuit: Circuit, names: IndexMap<String, ComponentId>) -> Self {
        Self {
            propagator: Propagator::for_circuit(&circuit),
            circuit,
            names,
            iterations: 0,
        }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    /// Completed iterations.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// The component called `name`.
    pub fn component(&self, name: &str) -> Result<ComponentId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| CircuitError::UnknownComponentName(name.to_string()))
    }

    /// Run one iteration. Returns one report per source.
    pub fn step(&mut self) -> Result<Vec<PropagationReport>> {
        self.circuit.reset();

        let sources = self.circuit.sources();
        if sources.is_empty() {
            debug!(iteration = self.iterations, "no sources to propagate from");
        }

        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            reports.push(self.propagator.propagate(&mut self.circuit, source)?);
        }

        self.iterations += 1;
        trace!(iteration = self.iterations, sources = reports.len(), "iteration complete");
        Ok(reports)
    }

    /// Run `iterations` iterations.
    pub fn run(&mut self, iterations: usize) -> Result<()> {
        for _ in 0..iterations {
            self.step()?;
        }
        debug!(iterations = self.iterations, "simulation run finished");
        Ok(())
    }

    /// Capture every component's operands and node levels, and every wire.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let names: HashMap<ComponentId, &str> = self
            .names
            .iter()
            .map(|(name, &id)| (id, name.as_str()))
            .collect();

        let components = self
            .circuit
            .components()
            .map(|component| ComponentSnapshot {
                id: component.id(),
                name: names.get(&component.id()).map(|name| name.to_string()),
                kind: component.kind_name().to_string(),
                operands: component.operands(),
                nodes: component
                    .nodes()
                    .iter()
                    .filter_map(|&node| self.circuit.node(node).ok())
                    .map(|node| node.level())
                    .collect(),
            })
            .collect();

        let wires = self
            .circuit
            .wires()
            .map(|wire| WireSnapshot {
                id: wire.id(),
                ends: wire.endpoints(),
                level: wire.level(),
            })
            .collect();

        CircuitSnapshot {
            iterations: self.iterations,
            components,
            wires,
        }
    }
}

impl From<Circuit> for Simulation {
    fn from(circuit: Circuit) -> Self {
        Self::new(circuit)
    }
}

impl From<DescribedCircuit> for Simulation {
    fn from(described: DescribedCircuit) -> Self {
        let (circuit, names) = described.into_parts();
        Self::with_names(circuit, names)
    }
}

/// Settled values of a whole circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub iterations: u64,
    pub components: Vec<ComponentSnapshot>,
    pub wires: Vec<WireSnapshot>,
}

impl CircuitSnapshot {
    /// The snapshot of the component called `name`.
    pub fn component(&self, name: &str) -> Option<&ComponentSnapshot> {
        self.components
            .iter()
            .find(|c| c.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub id: ComponentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: String,
    pub operands: Operands,
    pub nodes: Vec<Level>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSnapshot {
    pub id: WireId,
    pub ends: (NodeId, NodeId),
    pub level: Level,
}
