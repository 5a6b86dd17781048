//! Propagator
//!
//! Drives one depth-first settle of a circuit from a source component.
//!
//! Each step of the walk is one of three local rules:
//!
//! - a node updated by its component pushes its level onto every attached wire
//! - a wire takes the caller's level, splits the current evenly across the
//!   caller's wires, adds the result into the far node and updates that node
//! - a node updated by a wire notifies its owning component
//!
//! Pending steps live on an explicit LIFO stack instead of the call stack.
//! Follow-up steps are pushed in reverse so that the first one is popped
//! first, which reproduces the order of a recursive walk exactly: every
//! step finishes its own work before any of its follow-ups run, and each
//! follow-up settles completely before the next one starts.

use tracing::{debug, trace, warn};

use crate::component::ComponentId;
use crate::config::VisitedStrategy;
use crate::error::{CircuitError, Element, Result};
use crate::graph::{Caller, Circuit, NodeId, WireId};
use super::visited::VisitedSet;

/// Whether a propagation run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Propagating,
}

/// A deferred step of the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Node { node: NodeId, caller: Caller },
    Wire { wire: WireId, caller: NodeId },
}

/// Counters collected while a run is in progress.
#[derive(Debug, Clone, Copy, Default)]
struct RunStats {
    component_updates: usize,
    revisits_skipped: usize,
    max_pending: usize,
}

/// Summary of one completed propagation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationReport {
    /// The component the run started from.
    pub source: ComponentId,

    /// Wires that fired, in firing order.
    pub wires_visited: Vec<WireId>,

    /// Wire updates ignored because the wire had already fired.
    pub revisits_skipped: usize,

    /// Behavior invocations, including the source itself.
    pub component_updates: usize,

    /// Deepest the pending-step stack grew.
    pub max_pending: usize,
}

/// The propagation engine.
///
/// Owns the visited-wire record. Reuse one propagator across runs and
/// circuits; every run starts and ends with an empty record.
#[derive(Debug)]
pub struct Propagator {
    visited: VisitedSet,
    pending: Vec<Task>,
    broadcasts: Vec<NodeId>,
    stats: RunStats,
    state: EngineState,
}

impl Propagator {
    /// Create a propagator recording visits with the given strategy.
    pub fn new(strategy: VisitedStrategy) -> Self {
        Self {
            visited: VisitedSet::new(strategy),
            pending: Vec::new(),
            broadcasts: Vec::new(),
            stats: RunStats::default(),
            state: EngineState::Idle,
        }
    }

    /// Create a propagator using the circuit's configured strategy.
    pub fn for_circuit(circuit: &Circuit) -> Self {
        Self::new(circuit.config().visited)
    }

    /// The engine's state between calls.
    ///
    /// Every public entry point returns the engine to `Idle`, including on
    /// error, so this reads `Propagating` only if a run was interrupted by a
    /// panic in a behavior.
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Forget which wires have fired.
    pub fn reset_visited(&mut self) {
        self.visited.reset();
    }

    /// Settle the circuit from `source`.
    ///
    /// Node levels are not reset here; callers zero the circuit once per
    /// iteration so that several sources superpose.
    pub fn propagate(&mut self, circuit: &mut Circuit, source: ComponentId) -> Result<PropagationReport> {
        let component = circuit.component(source)?;
        if !component.is_bound() {
            return Err(CircuitError::UnconfiguredComponent(source));
        }
        if !component.is_source() {
            return Err(CircuitError::NotASource(source));
        }
        self.dispatch(circuit, source)
    }

    /// Settle the circuit from any component, invoked with no notifier.
    pub fn dispatch(&mut self, circuit: &mut Circuit, component: ComponentId) -> Result<PropagationReport> {
        self.reset_visited();
        self.stats = RunStats::default();

        let outcome = self.update_component(circuit, component, None);
        let wires_visited: Vec<WireId> = self.visited.iter().collect();
        self.reset_visited();

        match outcome {
            Ok(()) => {
                let report = PropagationReport {
                    source: component,
                    wires_visited,
                    revisits_skipped: self.stats.revisits_skipped,
                    component_updates: self.stats.component_updates,
                    max_pending: self.stats.max_pending,
                };
                debug!(
                    source = %component,
                    wires = report.wires_visited.len(),
                    components = report.component_updates,
                    skipped = report.revisits_skipped,
                    "propagation settled"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(source = %component, error = %err, "propagation aborted");
                Err(err)
            }
        }
    }

    /// Update a node and settle everything it triggers.
    ///
    /// Visits are recorded against the current visited set, which is not
    /// reset first.
    pub fn update_node(&mut self, circuit: &mut Circuit, node: NodeId, caller: Caller) -> Result<()> {
        self.drive(circuit, Task::Node { node, caller })
    }

    /// Update a wire from one of its endpoints and settle everything it
    /// triggers.
    pub fn update_wire(&mut self, circuit: &mut Circuit, wire: WireId, caller: NodeId) -> Result<()> {
        self.drive(circuit, Task::Wire { wire, caller })
    }

    /// Invoke a component's behavior and settle everything it triggers.
    ///
    /// `notifier` must be one of the component's own nodes.
    pub fn update_component(
        &mut self,
        circuit: &mut Circuit,
        component: ComponentId,
        notifier: Option<NodeId>,
    ) -> Result<()> {
        self.enter();
        let outcome = self
            .run_component(circuit, component, notifier)
            .and_then(|()| self.drain(circuit));
        self.leave();
        outcome
    }

    fn drive(&mut self, circuit: &mut Circuit, task: Task) -> Result<()> {
        self.enter();
        self.pending.push(task);
        let outcome = self.drain(circuit);
        self.leave();
        outcome
    }

    fn enter(&mut self) {
        self.pending.clear();
        self.state = EngineState::Propagating;
    }

    fn leave(&mut self) {
        self.pending.clear();
        self.state = EngineState::Idle;
    }

    fn drain(&mut self, circuit: &mut Circuit) -> Result<()> {
        while let Some(task) = self.pending.pop() {
            match task {
                Task::Node { node, caller } => self.step_node(circuit, node, caller)?,
                Task::Wire { wire, caller } => self.step_wire(circuit, wire, caller)?,
            }
            self.stats.max_pending = self.stats.max_pending.max(self.pending.len());
        }
        Ok(())
    }

    fn step_node(&mut self, circuit: &mut Circuit, node_id: NodeId, caller: Caller) -> Result<()> {
        match caller {
            Caller::FromWire => {
                let owner = circuit.node(node_id)?.owner();
                self.run_component(circuit, owner, Some(node_id))
            }
            Caller::FromComponent => {
                let node = circuit.node(node_id)?;
                self.pending.extend(
                    node.connections()
                        .iter()
                        .rev()
                        .map(|&wire| Task::Wire { wire, caller: node_id }),
                );
                Ok(())
            }
        }
    }

    fn step_wire(&mut self, circuit: &mut Circuit, wire_id: WireId, caller: NodeId) -> Result<()> {
        let (from, fan_out) = {
            let node = circuit.node(caller)?;
            (node.level(), node.connection_count())
        };

        let wire = circuit.wire_mut(wire_id)?;
        wire.other_end(caller)?;
        if !self.visited.insert(wire_id)? {
            self.stats.revisits_skipped += 1;
            trace!(wire = %wire_id, "already visited");
            return Ok(());
        }

        let (other, carried) = wire.carry(caller, from, fan_out)?;
        circuit.node_mut(other)?.accumulate(carried);
        trace!(
            wire = %wire_id,
            from = %caller,
            to = %other,
            voltage = carried.voltage,
            current = carried.current,
            "wire fired"
        );

        self.pending.push(Task::Node {
            node: other,
            caller: Caller::FromWire,
        });
        Ok(())
    }

    fn run_component(
        &mut self,
        circuit: &mut Circuit,
        component: ComponentId,
        notifier: Option<NodeId>,
    ) -> Result<()> {
        let slot = match notifier {
            Some(node_id) => {
                let node = circuit.node(node_id)?;
                if node.owner() != component {
                    return Err(CircuitError::InvalidCaller {
                        target: Element::Component(component),
                        caller: node_id,
                    });
                }
                Some(node.slot())
            }
            None => None,
        };

        self.broadcasts.clear();
        circuit.run_component(component, slot, &mut self.broadcasts)?;
        self.stats.component_updates += 1;
        trace!(
            component = %component,
            notifier = ?slot,
            broadcasts = self.broadcasts.len(),
            "component updated"
        );

        self.pending.extend(self.broadcasts.drain(..).rev().map(|node| Task::Node {
            node,
            caller: Caller::FromComponent,
        }));
        Ok(())
    }
}

impl Default for Propagator {
    fn default() -> Self {
        Self::new(VisitedStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Behavior, ComponentContext};
    use crate::error::Capacity;
    use crate::graph::Level;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Counts its updates and records the notifier of each.
    #[derive(Debug, Default)]
    struct Probe {
        notifiers: Vec<Option<usize>>,
    }

    impl Behavior for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
            self.notifiers.push(ctx.notifier());
            ctx.operands_mut().primary += 1.0;
            Ok(())
        }
    }

    #[test]
    fn fan_out_splits_current_evenly() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(6.0, 0.3).unwrap();
        let sinks: Vec<_> = (0..3).map(|_| circuit.add_sink().unwrap()).collect();
        for &sink in &sinks {
            circuit.connect(source, 0, sink, 0).unwrap();
        }

        let mut propagator = Propagator::default();
        let report = propagator.propagate(&mut circuit, source).unwrap();

        assert_eq!(report.wires_visited.len(), 3);
        for &sink in &sinks {
            let level = circuit.level(sink, 0).unwrap();
            assert_eq!(level.voltage, 6.0);
            assert!(close(level.current, 0.1));
        }
        for wire in circuit.wires() {
            assert!(close(wire.level().current, 0.1));
        }
    }

    #[test]
    fn fan_in_accumulates_across_runs() {
        // Two sources feed the same sink node in separate runs.
        let mut circuit = Circuit::new();
        let a = circuit.add_source(5.0, 0.1).unwrap();
        let b = circuit.add_source(2.0, 0.3).unwrap();
        let sink = circuit.add_sink().unwrap();
        circuit.connect(a, 0, sink, 0).unwrap();
        circuit.connect(b, 0, sink, 0).unwrap();

        let mut propagator = Propagator::default();
        propagator.propagate(&mut circuit, a).unwrap();
        propagator.propagate(&mut circuit, b).unwrap();

        let level = circuit.level(sink, 0).unwrap();
        assert!(close(level.voltage, 7.0));
        assert!(close(level.current, 0.4));
    }

    #[test]
    fn every_wire_fires_at_most_once() {
        // Two resistors in parallel between a source and a sink: many paths
        // reach each wire.
        let mut circuit = Circuit::new();
        let source = circuit.add_source(5.0, 0.2).unwrap();
        let r1 = circuit.add_resistor(10.0).unwrap();
        let r2 = circuit.add_resistor(20.0).unwrap();
        let sink = circuit.add_sink().unwrap();
        circuit.connect(source, 0, r1, 0).unwrap();
        circuit.connect(source, 0, r2, 0).unwrap();
        circuit.connect(r1, 1, sink, 0).unwrap();
        circuit.connect(r2, 1, sink, 0).unwrap();
        circuit.connect(r1, 0, r2, 0).unwrap();
        circuit.connect(r1, 1, r2, 1).unwrap();

        let mut propagator = Propagator::default();
        let report = propagator.propagate(&mut circuit, source).unwrap();

        let mut fired = report.wires_visited.clone();
        fired.sort();
        fired.dedup();
        assert_eq!(fired.len(), report.wires_visited.len());
        assert_eq!(report.wires_visited.len(), circuit.wire_count());
        assert!(report.revisits_skipped > 0);
    }

    #[test]
    fn loop_back_to_source_terminates() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(5.0, 0.1).unwrap();
        let r = circuit.add_resistor(25.0).unwrap();
        circuit.connect(source, 0, r, 0).unwrap();
        circuit.connect(r, 1, source, 0).unwrap();

        let mut propagator = Propagator::default();
        let report = propagator.propagate(&mut circuit, source).unwrap();

        assert_eq!(report.wires_visited.len(), 2);
        assert_eq!(propagator.state(), EngineState::Idle);
        assert!(propagator.visited().is_empty());
    }

    #[test]
    fn nothing_downstream_of_a_sink_fires() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(5.0, 0.1).unwrap();
        let sink = circuit.add_sink().unwrap();
        let probe = circuit.add_with_behavior(Box::new(Probe::default()), 1).unwrap();
        circuit.connect(source, 0, sink, 0).unwrap();
        let downstream = circuit.connect(sink, 0, probe, 0).unwrap();

        let mut propagator = Propagator::default();
        let report = propagator.propagate(&mut circuit, source).unwrap();

        assert!(!report.wires_visited.contains(&downstream));
        assert_eq!(report.component_updates, 2);
        assert_eq!(circuit.operands(probe).unwrap().primary, 0.0);
        assert_eq!(circuit.level(probe, 0).unwrap(), Level::ZERO);
    }

    #[test]
    fn notifier_is_the_receiving_node_position() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(1.0, 1.0).unwrap();
        let probe = circuit.add_with_behavior(Box::new(Probe::default()), 3).unwrap();
        circuit.connect(source, 0, probe, 2).unwrap();
        circuit.connect(source, 0, probe, 0).unwrap();

        let mut propagator = Propagator::default();
        let report = propagator.propagate(&mut circuit, source).unwrap();

        assert_eq!(report.component_updates, 3);
        assert_eq!(circuit.operands(probe).unwrap().primary, 2.0);
        assert!(format!("{:?}", circuit.component(probe).unwrap())
            .contains("notifiers: [Some(2), Some(0)]"));
    }

    #[test]
    fn propagate_requires_a_source() {
        let mut circuit = Circuit::new();
        let r = circuit.add_resistor(1.0).unwrap();
        let unbound = circuit.add_unbound(1).unwrap();

        let mut propagator = Propagator::default();
        assert!(matches!(
            propagator.propagate(&mut circuit, r),
            Err(CircuitError::NotASource(id)) if id == r
        ));
        assert!(matches!(
            propagator.propagate(&mut circuit, unbound),
            Err(CircuitError::UnconfiguredComponent(id)) if id == unbound
        ));
        assert!(matches!(
            propagator.propagate(&mut circuit, ComponentId::from(42)),
            Err(CircuitError::UnknownComponent(_))
        ));
    }

    #[test]
    fn unbound_component_aborts_the_run() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(1.0, 1.0).unwrap();
        let unbound = circuit.add_unbound(1).unwrap();
        circuit.connect(source, 0, unbound, 0).unwrap();

        let mut propagator = Propagator::default();
        let err = propagator.propagate(&mut circuit, source).unwrap_err();

        assert!(matches!(err, CircuitError::UnconfiguredComponent(id) if id == unbound));
        assert_eq!(propagator.state(), EngineState::Idle);
        assert!(propagator.visited().is_empty());
    }

    #[test]
    fn wire_update_from_a_stranger_is_rejected() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(1.0, 1.0).unwrap();
        let sink = circuit.add_sink().unwrap();
        let stranger = circuit.add_sink().unwrap();
        let wire = circuit.connect(source, 0, sink, 0).unwrap();
        let outsider = circuit.node_of(stranger, 0).unwrap();

        let mut propagator = Propagator::default();
        let err = propagator.update_wire(&mut circuit, wire, outsider).unwrap_err();

        assert!(matches!(
            err,
            CircuitError::InvalidCaller { target: Element::Wire(w), caller }
                if w == wire && caller == outsider
        ));
        assert!(propagator.visited().is_empty());
    }

    #[test]
    fn manual_wire_updates_respect_the_visited_set() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(1.0, 1.0).unwrap();
        let sink = circuit.add_sink().unwrap();
        let wire = circuit.connect(source, 0, sink, 0).unwrap();
        let from = circuit.node_of(source, 0).unwrap();
        circuit.node_mut(from).unwrap().set_level(Level::new(3.0, 0.5));

        let mut propagator = Propagator::default();
        propagator.update_wire(&mut circuit, wire, from).unwrap();
        propagator.update_wire(&mut circuit, wire, from).unwrap();
        assert_eq!(circuit.level(sink, 0).unwrap(), Level::new(3.0, 0.5));

        propagator.reset_visited();
        propagator.update_node(&mut circuit, from, Caller::FromComponent).unwrap();
        assert_eq!(circuit.level(sink, 0).unwrap(), Level::new(6.0, 1.0));
    }

    #[test]
    fn bounded_visited_set_overflow_aborts() {
        let mut circuit = Circuit::new();
        let source = circuit.add_source(1.0, 1.0).unwrap();
        for _ in 0..3 {
            let sink = circuit.add_sink().unwrap();
            circuit.connect(source, 0, sink, 0).unwrap();
        }

        let mut propagator = Propagator::new(VisitedStrategy::Bounded { capacity: 2 });
        let err = propagator.propagate(&mut circuit, source).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::CapacityExceeded {
                what: Capacity::VisitedWires,
                limit: 2
            }
        ));

        let mut propagator = Propagator::new(VisitedStrategy::Unbounded);
        assert_eq!(
            propagator.propagate(&mut circuit, source).unwrap().wires_visited.len(),
            3
        );
    }
}
