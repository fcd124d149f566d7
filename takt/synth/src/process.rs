use takt_utils::{GetName, Id};

/// The closed set of process kinds the binder distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum ProcessKind {
    Operator,
    MemoryVariable,
    PlainMemoryVariable,
}

impl std::fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessKind::Operator => write!(f, "operator process"),
            ProcessKind::MemoryVariable => write!(f, "memory variable"),
            ProcessKind::PlainMemoryVariable => {
                write!(f, "plain memory variable")
            }
        }
    }
}

/// One scheduled invocation of a logical operator.
///
/// Carries the operator's type name so that binding can enforce "same
/// physical unit implies same operator type", and the logical operator's
/// name for traceability in the bound architecture.
#[derive(Clone, Debug, serde::Serialize)]
pub struct OperatorProcess {
    pub name: Id,
    pub start_time: u64,
    pub execution_time: u64,
    /// Name of the logical operator this execution belongs to.
    pub operator: Id,
    pub type_name: Id,
}

/// One read event of a stored value, `offset` cycles after the write.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ReadAccess {
    /// The input port consuming the value.
    pub target: Id,
    /// Read time relative to the write.
    pub offset: u64,
}

/// A value produced at one time and consumed at one or more later times,
/// possibly wrapping past the schedule period.
///
/// The lifetime (and hence the resource occupancy) is the largest read
/// offset. A variable not tied to a live operator signal — externally
/// supplied traffic — is carried as [Process::Plain] with the same shape.
#[derive(Clone, Debug, serde::Serialize)]
pub struct MemoryVariable {
    pub name: Id,
    /// Cycle at which the value is written.
    pub write_time: u64,
    /// Read events, keyed by consuming port, as offsets from the write.
    pub reads: Vec<ReadAccess>,
}

impl MemoryVariable {
    /// Total lifetime of the value: the largest read offset.
    pub fn lifetime(&self) -> u64 {
        self.reads.iter().map(|r| r.offset).max().unwrap_or(0)
    }
}

/// Abstract unit of resource contention: something with a start time and a
/// duration on the cyclic timeline of its owning collection.
///
/// Two processes are the same entity iff they have the same name within the
/// same collection; no structural equality is defined.
#[derive(Clone, Debug, serde::Serialize)]
pub enum Process {
    Operator(OperatorProcess),
    Variable(MemoryVariable),
    Plain(MemoryVariable),
}

impl Process {
    pub fn kind(&self) -> ProcessKind {
        match self {
            Process::Operator(_) => ProcessKind::Operator,
            Process::Variable(_) => ProcessKind::MemoryVariable,
            Process::Plain(_) => ProcessKind::PlainMemoryVariable,
        }
    }

    /// Cycle at which the process starts occupying its resource.
    pub fn start_time(&self) -> u64 {
        match self {
            Process::Operator(op) => op.start_time,
            Process::Variable(v) | Process::Plain(v) => v.write_time,
        }
    }

    /// Number of cycles during which the process occupies its resource.
    pub fn execution_time(&self) -> u64 {
        match self {
            Process::Operator(op) => op.execution_time,
            Process::Variable(v) | Process::Plain(v) => v.lifetime(),
        }
    }

    /// The operator type name for operator processes.
    pub fn type_name(&self) -> Option<Id> {
        match self {
            Process::Operator(op) => Some(op.type_name),
            Process::Variable(_) | Process::Plain(_) => None,
        }
    }

    /// The memory variable payload, for the two storage kinds.
    pub fn as_variable(&self) -> Option<&MemoryVariable> {
        match self {
            Process::Operator(_) => None,
            Process::Variable(v) | Process::Plain(v) => Some(v),
        }
    }

    /// Number of read accesses this process performs per period.
    pub fn read_count(&self) -> usize {
        self.as_variable().map(|v| v.reads.len()).unwrap_or(0)
    }
}

impl GetName for Process {
    fn name(&self) -> Id {
        match self {
            Process::Operator(op) => op.name,
            Process::Variable(v) | Process::Plain(v) => v.name,
        }
    }
}
