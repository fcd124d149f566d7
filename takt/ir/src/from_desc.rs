//! JSON-friendly description of a dataflow graph.
//!
//! Mirrors the in-memory model closely; the only work done during
//! conversion is connectivity validation.

use crate::{DataflowGraph, Operator, PortRef};
use takt_utils::TaktResult;

#[derive(Clone, Debug, serde::Deserialize)]
pub struct OperatorDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub inputs: Vec<Option<u64>>,
    #[serde(default)]
    pub outputs: Vec<Option<u64>>,
    #[serde(default)]
    pub execution_time: Option<u64>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct SignalDesc {
    pub from: (String, usize),
    pub to: (String, usize),
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct GraphDesc {
    pub operators: Vec<OperatorDesc>,
    pub signals: Vec<SignalDesc>,
}

impl GraphDesc {
    pub fn into_graph(self) -> TaktResult<DataflowGraph> {
        let mut graph = DataflowGraph::new();
        for op in self.operators {
            graph.add_operator(Operator::new(
                op.name,
                op.type_name,
                op.inputs,
                op.outputs,
                op.execution_time,
            ))?;
        }
        for sig in self.signals {
            graph.connect(
                PortRef::new(sig.from.0, sig.from.1),
                PortRef::new(sig.to.0, sig.to.1),
            )?;
        }
        Ok(graph)
    }
}
