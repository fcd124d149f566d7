//! Cyclic ASAP scheduling for takt dataflow graphs.
//!
//! A [Schedule] assigns every operator a start time under precedence,
//! latency and (optionally) cyclic wraparound constraints, answers slack
//! queries, and converts the finished schedule into the process
//! collections the binder consumes.

mod schedule;

pub use schedule::{Schedule, UNBOUNDED};
