//! Circuit Assembly
//!
//! The circuit is the arena that owns every component, node and wire. All
//! cross references between them are plain indices into this arena, so a
//! node's back-reference to its component and a wire's references to its
//! endpoints never own anything.

use smallvec::SmallVec;

use crate::component::{Behavior, Component, ComponentId, ComponentKind, Operands};
use crate::config::CircuitConfig;
use crate::error::{Capacity, CircuitError, Result};
use super::node::{Level, Node, NodeId};
use super::wire::{Wire, WireId};

/// A DC circuit: components, their nodes and the wires between them.
#[derive(Debug, Default)]
pub struct Circuit {
    config: CircuitConfig,
    components: Vec<Component>,
    nodes: Vec<Node>,
    wires: Vec<Wire>,
}

impl Circuit {
    /// Create an empty circuit with default capacities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty circuit with the given capacities.
    pub fn with_config(config: CircuitConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Assembly
    // ------------------------------------------------------------------

    /// Add a built-in component with zeroed operands.
    pub fn add_component(&mut self, kind: ComponentKind) -> Result<ComponentId> {
        self.add_with_behavior(kind.behavior(), kind.node_count())
    }

    /// Add a component driven by a custom behavior.
    pub fn add_with_behavior(
        &mut self,
        behavior: Box<dyn Behavior>,
        node_count: usize,
    ) -> Result<ComponentId> {
        self.insert_component(Some(behavior), node_count)
    }

    /// Add a component whose behavior will be bound later.
    ///
    /// Updating it before [`Circuit::bind`] fails with
    /// `UnconfiguredComponent`.
    pub fn add_unbound(&mut self, node_count: usize) -> Result<ComponentId> {
        self.insert_component(None, node_count)
    }

    /// Bind a behavior to an existing component.
    pub fn bind(&mut self, id: ComponentId, behavior: Box<dyn Behavior>) -> Result<()> {
        self.component_mut(id)?.bind(behavior);
        Ok(())
    }

    /// Add a source driving `voltage` volts and `current` amps.
    pub fn add_source(&mut self, voltage: f64, current: f64) -> Result<ComponentId> {
        let id = self.add_component(ComponentKind::Source)?;
        *self.component_mut(id)?.operands_mut() = Operands::new(voltage, current);
        Ok(id)
    }

    pub fn add_sink(&mut self) -> Result<ComponentId> {
        self.add_component(ComponentKind::Sink)
    }

    pub fn add_resistor(&mut self, resistance: f64) -> Result<ComponentId> {
        let id = self.add_component(ComponentKind::Resistor)?;
        self.component_mut(id)?.operands_mut().primary = resistance;
        Ok(id)
    }

    pub fn add_voltmeter(&mut self) -> Result<ComponentId> {
        self.add_component(ComponentKind::Voltmeter)
    }

    fn insert_component(
        &mut self,
        behavior: Option<Box<dyn Behavior>>,
        node_count: usize,
    ) -> Result<ComponentId> {
        let limit = self.config.max_component_nodes;
        if node_count > limit {
            return Err(CircuitError::CapacityExceeded {
                what: Capacity::ComponentNodes,
                limit,
            });
        }

        let id = ComponentId::from(self.components.len());
        let mut owned = SmallVec::new();
        for slot in 0..node_count {
            let node_id = NodeId::from(self.nodes.len());
            self.nodes.push(Node::new(node_id, id, slot));
            owned.push(node_id);
        }
        self.components.push(Component::new(id, owned, behavior));
        Ok(id)
    }

    /// Join node `a_index` of `a` to node `b_index` of `b` with a new wire.
    ///
    /// The wire is appended to both endpoints' connection lists. Nothing is
    /// modified if either endpoint is already full.
    pub fn connect(
        &mut self,
        a: ComponentId,
        a_index: usize,
        b: ComponentId,
        b_index: usize,
    ) -> Result<WireId> {
        let node_a = self.node_of(a, a_index)?;
        let node_b = self.node_of(b, b_index)?;

        let limit = self.config.max_node_connections;
        let needed_on_a = if node_a == node_b { 2 } else { 1 };
        for (node, needed) in [(node_a, needed_on_a), (node_b, 1)] {
            if self.node(node)?.connection_count() + needed > limit {
                return Err(CircuitError::CapacityExceeded {
                    what: Capacity::NodeConnections,
                    limit,
                });
            }
        }

        let id = WireId::from(self.wires.len());
        self.wires.push(Wire::new(id, node_a, node_b));
        self.node_mut(node_a)?.add_connection(id, limit)?;
        self.node_mut(node_b)?.add_connection(id, limit)?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Zero the nodes of one component.
    pub fn reset_component(&mut self, id: ComponentId) -> Result<()> {
        let Circuit {
            components, nodes, ..
        } = self;
        let component = components
            .get(id.index())
            .ok_or(CircuitError::UnknownComponent(id))?;
        for node_id in component.nodes() {
            nodes
                .get_mut(node_id.index())
                .ok_or(CircuitError::UnknownNode(*node_id))?
                .reset();
        }
        Ok(())
    }

    /// Zero every node and wire in the circuit.
    pub fn reset(&mut self) {
        self.nodes.iter_mut().for_each(Node::reset);
        self.wires.iter_mut().for_each(Wire::reset);
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn component(&self, id: ComponentId) -> Result<&Component> {
        self.components
            .get(id.index())
            .ok_or(CircuitError::UnknownComponent(id))
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component> {
        self.components
            .get_mut(id.index())
            .ok_or(CircuitError::UnknownComponent(id))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(CircuitError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or(CircuitError::UnknownNode(id))
    }

    pub fn wire(&self, id: WireId) -> Result<&Wire> {
        self.wires.get(id.index()).ok_or(CircuitError::UnknownWire(id))
    }

    pub fn wire_mut(&mut self, id: WireId) -> Result<&mut Wire> {
        self.wires
            .get_mut(id.index())
            .ok_or(CircuitError::UnknownWire(id))
    }

    /// The node at position `index` of `component`.
    pub fn node_of(&self, component: ComponentId, index: usize) -> Result<NodeId> {
        self.component(component)?.node(index)
    }

    /// Level of node `index` of `component`.
    pub fn level(&self, component: ComponentId, index: usize) -> Result<Level> {
        Ok(self.node(self.node_of(component, index)?)?.level())
    }

    /// Operands of a component, e.g. a voltmeter's reading.
    pub fn operands(&self, id: ComponentId) -> Result<Operands> {
        Ok(self.component(id)?.operands())
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.iter()
    }

    /// Components propagation may start from, in creation order.
    pub fn sources(&self) -> Vec<ComponentId> {
        self.components
            .iter()
            .filter(|c| c.is_source())
            .map(Component::id)
            .collect()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Run a component's behavior against the node arena.
    pub(crate) fn run_component(
        &mut self,
        id: ComponentId,
        notifier: Option<usize>,
        broadcasts: &mut Vec<NodeId>,
    ) -> Result<()> {
        let Circuit {
            components, nodes, ..
        } = self;
        components
            .get_mut(id.index())
            .ok_or(CircuitError::UnknownComponent(id))?
            .run(nodes, notifier, broadcasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_own_fresh_nodes() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(5.0, 0.1).unwrap();
        let resistor = circuit.add_resistor(25.0).unwrap();

        assert_eq!(circuit.component_count(), 2);
        assert_eq!(circuit.node_count(), 3);

        let r = circuit.component(resistor).unwrap();
        assert_eq!(r.node_count(), 2);
        for (slot, node_id) in r.nodes().iter().enumerate() {
            let node = circuit.node(*node_id).unwrap();
            assert_eq!(node.owner(), resistor);
            assert_eq!(node.slot(), slot);
        }

        assert_eq!(circuit.operands(source).unwrap(), Operands::new(5.0, 0.1));
        assert_eq!(circuit.operands(resistor).unwrap().primary, 25.0);
    }

    #[test]
    fn connect_registers_wire_on_both_ends() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(5.0, 0.1).unwrap();
        let sink = circuit.add_sink().unwrap();

        let wire = circuit.connect(source, 0, sink, 0).unwrap();
        let a = circuit.node_of(source, 0).unwrap();
        let b = circuit.node_of(sink, 0).unwrap();

        assert_eq!(circuit.wire(wire).unwrap().endpoints(), (a, b));
        assert_eq!(circuit.node(a).unwrap().connections(), &[wire]);
        assert_eq!(circuit.node(b).unwrap().connections(), &[wire]);
    }

    #[test]
    fn connect_rejects_bad_node_index() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(1.0, 1.0).unwrap();
        let sink = circuit.add_sink().unwrap();

        let err = circuit.connect(source, 1, sink, 0).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::NodeIndexOutOfRange { index: 1, count: 1, .. }
        ));
        assert_eq!(circuit.wire_count(), 0);
    }

    #[test]
    fn connect_is_atomic_on_capacity_overflow() {
        let config = CircuitConfig {
            max_node_connections: 1,
            ..CircuitConfig::default()
        };
        let mut circuit = Circuit::with_config(config);
        let source = circuit.add_source(1.0, 1.0).unwrap();
        let sink_a = circuit.add_sink().unwrap();
        let sink_b = circuit.add_sink().unwrap();

        circuit.connect(source, 0, sink_a, 0).unwrap();
        let err = circuit.connect(sink_b, 0, source, 0).unwrap_err();

        assert!(matches!(
            err,
            CircuitError::CapacityExceeded {
                what: Capacity::NodeConnections,
                limit: 1
            }
        ));
        assert_eq!(circuit.wire_count(), 1);
        let b = circuit.node_of(sink_b, 0).unwrap();
        assert_eq!(circuit.node(b).unwrap().connection_count(), 0);
    }

    #[test]
    fn component_node_limit_is_enforced() {
        let mut circuit = Circuit::new();
        let err = circuit.add_unbound(9).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::CapacityExceeded {
                what: Capacity::ComponentNodes,
                limit: 8
            }
        ));
        assert_eq!(circuit.add_unbound(8).unwrap(), ComponentId::from(0));
    }

    #[test]
    fn reset_component_only_touches_its_nodes() {
        let mut circuit = Circuit::new();
        let a = circuit.add_sink().unwrap();
        let b = circuit.add_sink().unwrap();
        let node_a = circuit.node_of(a, 0).unwrap();
        let node_b = circuit.node_of(b, 0).unwrap();
        circuit.node_mut(node_a).unwrap().set_level(Level::new(1.0, 1.0));
        circuit.node_mut(node_b).unwrap().set_level(Level::new(2.0, 2.0));

        circuit.reset_component(a).unwrap();
        assert_eq!(circuit.level(a, 0).unwrap(), Level::ZERO);
        assert_eq!(circuit.level(b, 0).unwrap(), Level::new(2.0, 2.0));

        circuit.reset();
        assert_eq!(circuit.level(b, 0).unwrap(), Level::ZERO);
    }

    #[test]
    fn sources_are_listed_in_creation_order() {
        let mut circuit = Circuit::new();
        let first = circuit.add_source(1.0, 0.1).unwrap();
        circuit.add_resistor(10.0).unwrap();
        let second = circuit.add_source(2.0, 0.2).unwrap();
        let unbound = circuit.add_unbound(1).unwrap();

        assert_eq!(circuit.sources(), vec![first, second]);

        circuit.bind(unbound, ComponentKind::Source.behavior()).unwrap();
        assert_eq!(circuit.sources(), vec![first, second, unbound]);
    }
}
