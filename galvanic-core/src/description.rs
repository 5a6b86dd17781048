//! Circuit Descriptions
//!
//! A JSON format for assembling circuits without writing code:
//!
//! ```json
//! {
//!   "components": [
//!     { "name": "source", "kind": "source", "voltage": 5.0, "current": 0.1 },
//!     { "name": "r1", "kind": "resistor", "resistance": 25.0 },
//!     { "name": "sink", "kind": "sink" }
//!   ],
//!   "wires": [
//!     { "from": ["source", 0], "to": ["r1", 0] },
//!     { "from": ["r1", 1], "to": ["sink", 0] }
//!   ]
//! }
//! ```
//!
//! Wires are connected in the order listed, which fixes the fan-out order
//! of every node.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::{ComponentId, ComponentKind, Operands};
use crate::config::CircuitConfig;
use crate::error::{CircuitError, Result};
use crate::graph::Circuit;

/// A whole circuit: capacities, named components and wires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDescription {
    #[serde(default)]
    pub config: CircuitConfig,
    pub components: Vec<ComponentDescription>,
    #[serde(default)]
    pub wires: Vec<WireDescription>,
}

/// One named component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescription {
    pub name: String,
    #[serde(flatten)]
    pub part: Part,
}

/// A built-in component kind with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Source { voltage: f64, current: f64 },
    Sink,
    Resistor { resistance: f64 },
    Voltmeter,
}

impl Part {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Part::Source { .. } => ComponentKind::Source,
            Part::Sink => ComponentKind::Sink,
            Part::Resistor { .. } => ComponentKind::Resistor,
            Part::Voltmeter => ComponentKind::Voltmeter,
        }
    }

    /// Initial operands for a component of this part.
    pub fn operands(&self) -> Operands {
        match *self {
            Part::Source { voltage, current } => Operands::new(voltage, current),
            Part::Resistor { resistance } => Operands::new(resistance, 0.0),
            Part::Sink | Part::Voltmeter => Operands::default(),
        }
    }
}

/// A `[component name, node index]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal(pub String, pub usize);

/// A wire between two terminals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDescription {
    pub from: Terminal,
    pub to: Terminal,
}

impl CircuitDescription {
    /// Parse a description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Assemble the described circuit.
    pub fn build(&self) -> Result<DescribedCircuit> {
        let mut circuit = Circuit::with_config(self.config);
        let mut names = IndexMap::with_capacity(self.components.len());

        for component in &self.components {
            if names.contains_key(&component.name) {
                return Err(CircuitError::DuplicateComponentName(component.name.clone()));
            }
            let id = circuit.add_component(component.part.kind())?;
            *circuit.component_mut(id)?.operands_mut() = component.part.operands();
            names.insert(component.name.clone(), id);
        }

        for wire in &self.wires {
            let a = lookup(&names, &wire.from.0)?;
            let b = lookup(&names, &wire.to.0)?;
            circuit.connect(a, wire.from.1, b, wire.to.1)?;
        }

        debug!(
            components = circuit.component_count(),
            nodes = circuit.node_count(),
            wires = circuit.wire_count(),
            "circuit assembled"
        );
        Ok(DescribedCircuit { circuit, names })
    }
}

fn lookup(names: &IndexMap<String, ComponentId>, name: &str) -> Result<ComponentId> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| CircuitError::UnknownComponentName(name.to_string()))
}

/// A circuit built from a description, with its component names.
#[derive(Debug)]
pub struct DescribedCircuit {
    circuit: Circuit,
    names: IndexMap<String, ComponentId>,
}

impl DescribedCircuit {
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    /// The component called `name`.
    pub fn id(&self, name: &str) -> Result<ComponentId> {
        lookup(&self.names, name)
    }

    /// The name given to `id`, if any.
    pub fn name_of(&self, id: ComponentId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, &candidate)| candidate == id)
            .map(|(name, _)| name.as_str())
    }

    /// Names in declaration order.
    pub fn names(&self) -> &IndexMap<String, ComponentId> {
        &self.names
    }

    pub fn into_parts(self) -> (Circuit, IndexMap<String, ComponentId>) {
        (self.circuit, self.names)
    }
}
