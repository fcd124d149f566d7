use crate::{DataflowGraph, Operator, PortRef, DELAY_TYPE};
use takt_utils::{Id, TaktResult};

/// Convenience builder for [DataflowGraph]s.
///
/// Wraps the raw `add_operator`/`connect` interface with shorthands for the
/// common operator shapes (sources, sinks, unary and binary operators,
/// delay elements). Primarily used by tests and the JSON front-end.
pub struct Builder {
    graph: DataflowGraph,
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            graph: DataflowGraph::new(),
        }
    }

    /// A graph input: no input ports, one output available at offset 0.
    pub fn input(&mut self, name: impl Into<Id>) -> TaktResult<()> {
        self.graph.add_operator(Operator::new(
            name,
            "input",
            vec![],
            vec![Some(0)],
            Some(0),
        ))
    }

    /// A graph output: one input port read at offset 0, no output ports.
    pub fn output(
        &mut self,
        name: impl Into<Id>,
        source: PortRef,
    ) -> TaktResult<()> {
        let name = name.into();
        self.graph.add_operator(Operator::new(
            name,
            "output",
            vec![Some(0)],
            vec![],
            Some(0),
        ))?;
        self.graph.connect(source, PortRef::new(name, 0))?;
        Ok(())
    }

    /// A delay element fed by `source`.
    pub fn delay(
        &mut self,
        name: impl Into<Id>,
        source: PortRef,
    ) -> TaktResult<()> {
        let name = name.into();
        self.graph.add_operator(Operator::new(
            name,
            DELAY_TYPE,
            vec![Some(0)],
            vec![Some(0)],
            Some(0),
        ))?;
        self.graph.connect(source, PortRef::new(name, 0))?;
        Ok(())
    }

    /// A unary operator reading its input at offset 0 and producing its
    /// output at offset `latency`.
    pub fn unary(
        &mut self,
        name: impl Into<Id>,
        type_name: impl Into<Id>,
        latency: u64,
        execution_time: u64,
        source: PortRef,
    ) -> TaktResult<()> {
        let name = name.into();
        self.graph.add_operator(Operator::new(
            name,
            type_name,
            vec![Some(0)],
            vec![Some(latency)],
            Some(execution_time),
        ))?;
        self.graph.connect(source, PortRef::new(name, 0))?;
        Ok(())
    }

    /// A binary operator reading both inputs at offset 0 and producing its
    /// output at offset `latency`.
    pub fn binary(
        &mut self,
        name: impl Into<Id>,
        type_name: impl Into<Id>,
        latency: u64,
        execution_time: u64,
        left: PortRef,
        right: PortRef,
    ) -> TaktResult<()> {
        let name = name.into();
        self.graph.add_operator(Operator::new(
            name,
            type_name,
            vec![Some(0), Some(0)],
            vec![Some(latency)],
            Some(execution_time),
        ))?;
        self.graph.connect(left, PortRef::new(name, 0))?;
        self.graph.connect(right, PortRef::new(name, 1))?;
        Ok(())
    }

    /// Add a fully general operator without connecting it.
    pub fn operator(&mut self, op: Operator) -> TaktResult<()> {
        self.graph.add_operator(op)
    }

    /// Connect an output port to an input port.
    pub fn connect(
        &mut self,
        source: PortRef,
        destination: PortRef,
    ) -> TaktResult<()> {
        self.graph.connect(source, destination)?;
        Ok(())
    }

    pub fn finish(self) -> DataflowGraph {
        self.graph
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
