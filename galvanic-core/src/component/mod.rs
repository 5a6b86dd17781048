//! Components
//!
//! A component owns a small, fixed set of nodes and a behavior that runs
//! whenever one of those nodes receives a value from a wire.
//!
//! # The Behavior Contract
//!
//! A behavior sees its component through a [`ComponentContext`]. From there
//! it may read and write the levels of its own nodes, read and write the
//! component's two operands, and ask for a node to be broadcast: the engine
//! then pushes that node's level out across all of its wires.
//!
//! Broadcasts requested during one update are delivered in the order they
//! were requested, each one settling completely before the next begins.
//!
//! New component kinds implement [`Behavior`]; nothing else is required.

mod builtin;

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::DEFAULT_MAX_COMPONENT_NODES;
use crate::error::{CircuitError, Result};
use crate::graph::{Level, Node, NodeId};

pub use builtin::{ComponentKind, Resistor, Sink, Source, Voltmeter};

/// Identifier of a component within its circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(usize);

impl ComponentId {
    /// Get the raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for ComponentId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// The two generic scalars every component carries.
///
/// Their meaning depends on the kind: a source keeps its target voltage
/// and current here, a resistor its resistance, a voltmeter its reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Operands {
    pub primary: f64,
    pub secondary: f64,
}

impl Operands {
    pub fn new(primary: f64, secondary: f64) -> Self {
        Self { primary, secondary }
    }
}

/// The update rule of a component kind.
pub trait Behavior: fmt::Debug {
    /// Short kind name used in logs and snapshots.
    fn name(&self) -> &'static str;

    /// Whether propagation may start from this component.
    fn is_source(&self) -> bool {
        false
    }

    /// React to a change on one of the component's nodes.
    ///
    /// `ctx.notifier()` is `None` when the engine invokes the component
    /// directly, as it does for the source of a propagation run.
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()>;
}

/// A behavior's view of its own component during an update.
pub struct ComponentContext<'a> {
    component: ComponentId,
    owned: &'a [NodeId],
    nodes: &'a mut [Node],
    operands: &'a mut Operands,
    notifier: Option<usize>,
    broadcasts: &'a mut Vec<NodeId>,
}

impl<'a> ComponentContext<'a> {
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Index of the node that triggered this update, if any.
    pub fn notifier(&self) -> Option<usize> {
        self.notifier
    }

    pub fn node_count(&self) -> usize {
        self.owned.len()
    }

    pub fn operands(&self) -> Operands {
        *self.operands
    }

    pub fn operands_mut(&mut self) -> &mut Operands {
        self.operands
    }

    pub fn level(&self, index: usize) -> Result<Level> {
        let id = self.resolve(index)?;
        self.nodes
            .get(id.index())
            .map(Node::level)
            .ok_or(CircuitError::UnknownNode(id))
    }

    pub fn set_level(&mut self, index: usize, level: Level) -> Result<()> {
        let id = self.resolve(index)?;
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(CircuitError::UnknownNode(id))?;
        node.set_level(level);
        Ok(())
    }

    /// Push node `index` out across its wires once this update returns.
    pub fn broadcast(&mut self, index: usize) -> Result<()> {
        let id = self.resolve(index)?;
        self.broadcasts.push(id);
        Ok(())
    }

    fn resolve(&self, index: usize) -> Result<NodeId> {
        self.owned
            .get(index)
            .copied()
            .ok_or(CircuitError::NodeIndexOutOfRange {
                component: self.component,
                index,
                count: self.owned.len(),
            })
    }
}

/// A device in the circuit.
#[derive(Debug)]
pub struct Component {
    id: ComponentId,

    /// Owned nodes, by position.
    nodes: SmallVec<[NodeId; DEFAULT_MAX_COMPONENT_NODES]>,

    /// `None` until a behavior is bound.
    behavior: Option<Box<dyn Behavior>>,

    operands: Operands,
}

impl Component {
    pub(crate) fn new(
        id: ComponentId,
        nodes: SmallVec<[NodeId; DEFAULT_MAX_COMPONENT_NODES]>,
        behavior: Option<Box<dyn Behavior>>,
    ) -> Self {
        Self {
            id,
            nodes,
            behavior,
            operands: Operands::default(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Owned nodes in position order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node at `index`.
    pub fn node(&self, index: usize) -> Result<NodeId> {
        self.nodes
            .get(index)
            .copied()
            .ok_or(CircuitError::NodeIndexOutOfRange {
                component: self.id,
                index,
                count: self.nodes.len(),
            })
    }

    pub fn operands(&self) -> Operands {
        self.operands
    }

    pub fn operands_mut(&mut self) -> &mut Operands {
        &mut self.operands
    }

    /// Kind name of the bound behavior, or `"unbound"`.
    pub fn kind_name(&self) -> &'static str {
        self.behavior.as_ref().map_or("unbound", |b| b.name())
    }

    pub fn is_bound(&self) -> bool {
        self.behavior.is_some()
    }

    pub fn is_source(&self) -> bool {
        self.behavior.as_ref().is_some_and(|b| b.is_source())
    }

    /// Replace the component's behavior.
    pub fn bind(&mut self, behavior: Box<dyn Behavior>) {
        self.behavior = Some(behavior);
    }

    /// Run the bound behavior.
    ///
    /// Nodes the behavior asks to broadcast are appended to `broadcasts`.
    pub(crate) fn run(
        &mut self,
        nodes: &mut [Node],
        notifier: Option<usize>,
        broadcasts: &mut Vec<NodeId>,
    ) -> Result<()> {
        let Component {
            id,
            nodes: owned,
            behavior,
            operands,
        } = self;

        let behavior = behavior
            .as_mut()
            .ok_or(CircuitError::UnconfiguredComponent(*id))?;

        let mut ctx = ComponentContext {
            component: *id,
            owned: owned.as_slice(),
            nodes,
            operands,
            notifier,
            broadcasts,
        };
        behavior.update(&mut ctx)
    }
}
