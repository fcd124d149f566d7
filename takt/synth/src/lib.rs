//! Resource binding and storage allocation for the takt synthesis core.
//!
//! The pipeline implemented here takes the processes produced by a finished
//! schedule, derives conflict (exclusion) graphs from their cyclic
//! execution intervals, colors the graphs jointly with a MILP to minimize
//! the number of physical resources, and finally allocates concrete
//! register or memory-bank structures for the bound storage values.

mod architecture;
mod binder;
mod coloring;
mod collection;
mod exclusion;
mod ilp;
mod process;
mod storage;

pub use architecture::{
    is_valid_entity_name, Architecture, Memory, ProcessingElement,
    StorageAllocation,
};
pub use binder::{bind, GraphBinding};
pub use coloring::GraphColoring;
pub use collection::ProcessCollection;
pub use exclusion::{
    create_exclusion_graph_from_execution_time,
    create_exclusion_graph_from_ports, cyclic_overlap, ExclusionGraph,
    PortBudget,
};
pub use ilp::{
    ConstraintSense, GoodLpSolver, IlpConstraint, IlpProblem, IlpSolution,
    IlpSolver,
};
pub use process::{
    MemoryVariable, OperatorProcess, Process, ProcessKind, ReadAccess,
};
pub use storage::{ForwardBackwardTable, MemoryStorage, TableEntry};
