//! Built-in component kinds: source, sink, resistor and voltmeter.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::Level;
use super::{Behavior, ComponentContext};

/// The component kinds that ship with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Source,
    Sink,
    Resistor,
    Voltmeter,
}

impl ComponentKind {
    /// Number of nodes a component of this kind owns.
    pub fn node_count(&self) -> usize {
        match self {
            ComponentKind::Source | ComponentKind::Sink => 1,
            ComponentKind::Resistor | ComponentKind::Voltmeter => 2,
        }
    }

    /// A fresh behavior for this kind.
    pub fn behavior(&self) -> Box<dyn Behavior> {
        match self {
            ComponentKind::Source => Box::new(Source),
            ComponentKind::Sink => Box::new(Sink),
            ComponentKind::Resistor => Box::new(Resistor),
            ComponentKind::Voltmeter => Box::new(Voltmeter),
        }
    }
}

/// Drives its single node to (primary, secondary) = (voltage, current).
#[derive(Debug, Clone, Copy, Default)]
pub struct Source;

impl Behavior for Source {
    fn name(&self) -> &'static str {
        "source"
    }

    fn is_source(&self) -> bool {
        true
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        let operands = ctx.operands();
        ctx.set_level(0, Level::new(operands.primary, operands.secondary))?;
        ctx.broadcast(0)
    }
}

/// Terminal consumer. Absorbs whatever reaches it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sink;

impl Behavior for Sink {
    fn name(&self) -> &'static str {
        "sink"
    }

    fn update(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Derives one terminal from the other: V = I * R, current passes through.
///
/// Resistance is the primary operand. Both terminals are broadcast after
/// every update so that anything wired in parallel sees the new
/// differential.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resistor;

impl Behavior for Resistor {
    fn name(&self) -> &'static str {
        "resistor"
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        let resistance = ctx.operands().primary;

        // A direct call has no notifier and is treated like node 1.
        let (from, to) = match ctx.notifier() {
            Some(0) => (0, 1),
            _ => (1, 0),
        };

        let input = ctx.level(from)?;
        ctx.set_level(to, Level::new(input.current * resistance, input.current))?;

        ctx.broadcast(0)?;
        ctx.broadcast(1)
    }
}

/// Records `node0.voltage - node1.voltage` in its primary operand.
///
/// Never broadcasts; measuring must not inject anything into the circuit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Voltmeter;

impl Behavior for Voltmeter {
    fn name(&self) -> &'static str {
        "voltmeter"
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        let reading = ctx.level(0)?.voltage - ctx.level(1)?.voltage;
        ctx.operands_mut().primary = reading;
        Ok(())
    }
}
