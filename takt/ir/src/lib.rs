//! Dataflow-graph model consumed by the takt scheduling core.
//!
//! The model is deliberately thin: an operator exposes its type name,
//! per-port latency offsets, an optional execution time, and its port
//! connectivity. Delay elements mark iteration boundaries in cyclic graphs.
//! Everything the synthesis pipeline needs is derivable from this topology;
//! numeric semantics of the operators are out of scope.

mod builder;
mod from_desc;
mod graph;
mod operator;

pub use builder::Builder;
pub use from_desc::{GraphDesc, OperatorDesc, SignalDesc};
pub use graph::{DataflowGraph, PortRef, Signal, SignalIdx};
pub use operator::{Operator, DELAY_TYPE};
