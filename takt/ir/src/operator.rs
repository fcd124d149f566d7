use takt_utils::{GetName, Id};

/// Type name reserved for delay elements. Delays are not scheduled; they
/// mark where a value crosses into the next iteration of a cyclic schedule.
pub const DELAY_TYPE: &str = "delay";

/// A single arithmetic operator in the dataflow graph.
///
/// Latency offsets are per port: an input port's offset is the number of
/// cycles after the operator's start time at which the port consumes its
/// value, and an output port's offset is the number of cycles after the
/// start time at which the result becomes available. Offsets may be left
/// unspecified (`None`); scheduling refuses to run until every reachable
/// operator is fully specified.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Operator {
    name: Id,
    type_name: Id,
    input_offsets: Vec<Option<u64>>,
    output_offsets: Vec<Option<u64>>,
    execution_time: Option<u64>,
}

impl Operator {
    pub fn new(
        name: impl Into<Id>,
        type_name: impl Into<Id>,
        input_offsets: Vec<Option<u64>>,
        output_offsets: Vec<Option<u64>>,
        execution_time: Option<u64>,
    ) -> Self {
        Operator {
            name: name.into(),
            type_name: type_name.into(),
            input_offsets,
            output_offsets,
            execution_time,
        }
    }

    pub fn type_name(&self) -> Id {
        self.type_name
    }

    pub fn is_delay(&self) -> bool {
        self.type_name == DELAY_TYPE
    }

    pub fn num_inputs(&self) -> usize {
        self.input_offsets.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.output_offsets.len()
    }

    /// Latency offset of input port `port`, if specified.
    pub fn input_offset(&self, port: usize) -> Option<u64> {
        self.input_offsets.get(port).copied().flatten()
    }

    /// Latency offset of output port `port`, if specified.
    pub fn output_offset(&self, port: usize) -> Option<u64> {
        self.output_offsets.get(port).copied().flatten()
    }

    /// The operator's latency: the largest output offset.
    pub fn latency(&self) -> Option<u64> {
        self.output_offsets.iter().copied().flatten().max()
    }

    /// Number of cycles during which the operator occupies its physical
    /// resource, if specified.
    pub fn execution_time(&self) -> Option<u64> {
        self.execution_time
    }

    /// True iff every input and output port has a latency offset.
    pub fn latency_offsets_set(&self) -> bool {
        self.input_offsets.iter().all(Option::is_some)
            && self.output_offsets.iter().all(Option::is_some)
    }
}

impl GetName for Operator {
    fn name(&self) -> Id {
        self.name
    }
}
