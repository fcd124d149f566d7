use crate::Operator;
use linked_hash_map::LinkedHashMap;
use takt_utils::{Error, GetName, Id, TaktResult};

/// Index of a signal in its owning [DataflowGraph].
pub type SignalIdx = usize;

/// A reference to one port of one operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PortRef {
    pub operator: Id,
    pub port: usize,
}

impl PortRef {
    pub fn new(operator: impl Into<Id>, port: usize) -> Self {
        PortRef {
            operator: operator.into(),
            port,
        }
    }
}

/// A data dependency from one operator's output port to another operator's
/// input port. Every input port has at most one driving signal; output
/// ports may fan out to any number of signals.
#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct Signal {
    pub source: PortRef,
    pub destination: PortRef,
}

/// The read-only topology the synthesis pipeline operates on: operators in
/// declaration order plus the signals connecting them.
#[derive(Clone, Debug, Default)]
pub struct DataflowGraph {
    operators: LinkedHashMap<Id, Operator>,
    signals: Vec<Signal>,
}

impl DataflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operator to the graph. Names must be unique.
    pub fn add_operator(&mut self, op: Operator) -> TaktResult<()> {
        if self.operators.contains_key(&op.name()) {
            return Err(Error::malformed_structure(format!(
                "duplicate operator name `{}'",
                op.name()
            )));
        }
        self.operators.insert(op.name(), op);
        Ok(())
    }

    /// Connect `source` (an output port) to `destination` (an input port).
    pub fn connect(
        &mut self,
        source: PortRef,
        destination: PortRef,
    ) -> TaktResult<SignalIdx> {
        self.check_port(source, false)?;
        self.check_port(destination, true)?;
        if self.driver_of(destination).is_some() {
            return Err(Error::malformed_structure(format!(
                "input port {}[{}] is already driven",
                destination.operator, destination.port
            )));
        }
        self.signals.push(Signal {
            source,
            destination,
        });
        Ok(self.signals.len() - 1)
    }

    fn check_port(&self, port: PortRef, input: bool) -> TaktResult<()> {
        let op = self.get(port.operator).ok_or_else(|| {
            Error::malformed_structure(format!(
                "unknown operator `{}'",
                port.operator
            ))
        })?;
        let count = if input {
            op.num_inputs()
        } else {
            op.num_outputs()
        };
        if port.port >= count {
            return Err(Error::malformed_structure(format!(
                "operator `{}' has no {} port {}",
                port.operator,
                if input { "input" } else { "output" },
                port.port
            )));
        }
        Ok(())
    }

    pub fn get(&self, name: impl Into<Id>) -> Option<&Operator> {
        self.operators.get(&name.into())
    }

    /// Operators in declaration order.
    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values()
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn signal(&self, idx: SignalIdx) -> &Signal {
        &self.signals[idx]
    }

    /// The signal driving the given input port, if any.
    pub fn driver_of(&self, destination: PortRef) -> Option<SignalIdx> {
        self.signals.iter().position(|s| s.destination == destination)
    }

    /// Signals fanning out from the given output port.
    pub fn sinks_of(
        &self,
        source: PortRef,
    ) -> impl Iterator<Item = SignalIdx> + '_ {
        self.signals
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.source == source)
            .map(|(i, _)| i)
    }

    /// Signals arriving at any input port of `name`.
    pub fn inputs_of(
        &self,
        name: Id,
    ) -> impl Iterator<Item = SignalIdx> + '_ {
        self.signals
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.destination.operator == name)
            .map(|(i, _)| i)
    }

    /// Signals leaving any output port of `name`.
    pub fn outputs_of(
        &self,
        name: Id,
    ) -> impl Iterator<Item = SignalIdx> + '_ {
        self.signals
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.source.operator == name)
            .map(|(i, _)| i)
    }
}
