use crate::{GraphColoring, Process, ProcessCollection};
use itertools::Itertools;
use std::collections::BTreeMap;
use takt_utils::{Error, GetName, Id, TaktResult};

/// Do two half-open intervals overlap on the cyclic timeline of length
/// `period`? Start times are normalized modulo the period; a length of zero
/// never overlaps anything, and a length of a full period overlaps
/// everything of nonzero length.
pub fn cyclic_overlap(
    a_start: u64,
    a_len: u64,
    b_start: u64,
    b_len: u64,
    period: u64,
) -> bool {
    if a_len == 0 || b_len == 0 {
        return false;
    }
    if a_len >= period || b_len >= period {
        return true;
    }
    let a_start = a_start % period;
    let b_start = b_start % period;
    // Unroll each interval into at most two linear segments.
    let segments = |start: u64, len: u64| -> Vec<(u64, u64)> {
        let end = start + len;
        if end <= period {
            vec![(start, end)]
        } else {
            vec![(start, period), (0, end - period)]
        }
    };
    segments(a_start, a_len)
        .into_iter()
        .cartesian_product(segments(b_start, b_len))
        .any(|((s0, e0), (s1, e1))| s0 < e1 && s1 < e0)
}

/// Per-memory port budget used when building port exclusion graphs.
/// Either a total port count, or both a read and a write port count, must
/// be supplied.
#[derive(Clone, Copy, Debug)]
pub struct PortBudget {
    pub read_ports: Option<usize>,
    pub write_ports: Option<usize>,
    pub total_ports: Option<usize>,
}

impl PortBudget {
    pub fn new(
        read_ports: Option<usize>,
        write_ports: Option<usize>,
        total_ports: Option<usize>,
    ) -> TaktResult<Self> {
        if total_ports.is_none()
            && (read_ports.is_none() || write_ports.is_none())
        {
            return Err(Error::malformed_structure(
                "a port budget needs total_ports, or both read_ports and \
                 write_ports",
            ));
        }
        Ok(PortBudget {
            read_ports,
            write_ports,
            total_ports,
        })
    }
}

/// Conflict graph over the processes of one [ProcessCollection]: an edge
/// connects two processes that cannot share a physical resource.
///
/// Always built fresh from a collection by one of the `create_*` builders;
/// the builders never mutate their input.
pub struct ExclusionGraph {
    graph: GraphColoring<Id>,
    collection: ProcessCollection,
}

impl ExclusionGraph {
    fn build(
        collection: &ProcessCollection,
        conflict: impl Fn(&Process, &Process) -> bool,
    ) -> Self {
        let mut graph =
            GraphColoring::from(collection.iter().map(|p| p.name()));
        for (a, b) in collection.iter().tuple_combinations() {
            if conflict(a, b) {
                graph.insert_conflict(&a.name(), &b.name());
            }
        }
        ExclusionGraph {
            graph,
            collection: collection.clone(),
        }
    }

    pub fn collection(&self) -> &ProcessCollection {
        &self.collection
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Nodes in deterministic order.
    pub fn nodes(&self) -> Vec<Id> {
        self.graph.nodes()
    }

    pub fn has_edge(&self, a: Id, b: Id) -> bool {
        self.graph.has_conflict(&a, &b)
    }

    /// Greedy proper coloring of the graph (heuristic resource bound).
    pub fn color_greedy(&self) -> BTreeMap<Id, usize> {
        self.graph.color_greedy()
    }

    /// Number of colors the greedy heuristic uses.
    pub fn color_bound(&self) -> usize {
        self.graph.color_bound()
    }

    /// A maximal clique of mutually conflicting processes.
    pub fn max_clique(&self) -> Vec<Id> {
        self.graph.max_clique()
    }
}

impl std::fmt::Display for ExclusionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.graph, f)
    }
}

/// Build the exclusion graph for resource sharing over time: two processes
/// conflict iff their execution intervals overlap on the cyclic timeline.
pub fn create_exclusion_graph_from_execution_time(
    collection: &ProcessCollection,
) -> ExclusionGraph {
    let period = collection.schedule_time();
    ExclusionGraph::build(collection, |a, b| {
        cyclic_overlap(
            a.start_time(),
            a.execution_time(),
            b.start_time(),
            b.execution_time(),
            period,
        )
    })
}

/// Number of reads and writes a process performs during cycle `t`.
fn accesses_at(p: &Process, t: u64, period: u64) -> (usize, usize) {
    let Some(v) = p.as_variable() else {
        return (0, 0);
    };
    let writes = usize::from(v.write_time % period == t);
    let reads = v
        .reads
        .iter()
        .filter(|r| (v.write_time + r.offset) % period == t)
        .count();
    (reads, writes)
}

/// Build the exclusion graph for memory binding under a port budget: two
/// memory variables conflict iff there is a cycle at which their combined
/// read, write, or total accesses exceed the available ports.
pub fn create_exclusion_graph_from_ports(
    collection: &ProcessCollection,
    budget: PortBudget,
) -> TaktResult<ExclusionGraph> {
    // Re-validate so graphs built without going through PortBudget::new
    // cannot smuggle in an empty budget.
    let budget = PortBudget::new(
        budget.read_ports,
        budget.write_ports,
        budget.total_ports,
    )?;
    let period = collection.schedule_time();
    let exceeds = |used: usize, cap: Option<usize>| {
        cap.is_some_and(|cap| used > cap)
    };
    Ok(ExclusionGraph::build(collection, |a, b| {
        (0..period).any(|t| {
            let (ra, wa) = accesses_at(a, t, period);
            let (rb, wb) = accesses_at(b, t, period);
            if ra + wa == 0 || rb + wb == 0 {
                return false;
            }
            exceeds(ra + rb, budget.read_ports)
                || exceeds(wa + wb, budget.write_ports)
                || exceeds(ra + rb + wa + wb, budget.total_ports)
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::{
        create_exclusion_graph_from_execution_time,
        create_exclusion_graph_from_ports, cyclic_overlap, PortBudget,
    };
    use crate::{MemoryVariable, OperatorProcess, Process,
        ProcessCollection, ReadAccess};
    use takt_utils::Id;

    fn op(name: &str, start: u64, exec: u64) -> Process {
        Process::Operator(OperatorProcess {
            name: Id::from(name),
            start_time: start,
            execution_time: exec,
            operator: Id::from(name),
            type_name: Id::from("add"),
        })
    }

    fn var(name: &str, write: u64, offsets: &[u64]) -> Process {
        Process::Plain(MemoryVariable {
            name: Id::from(name),
            write_time: write,
            reads: offsets
                .iter()
                .enumerate()
                .map(|(i, &offset)| ReadAccess {
                    target: Id::from(format!("r{i}")),
                    offset,
                })
                .collect(),
        })
    }

    #[test]
    fn overlap_basic() {
        assert!(cyclic_overlap(0, 2, 1, 2, 5));
        assert!(!cyclic_overlap(0, 2, 2, 2, 5));
        // zero-length intervals never overlap
        assert!(!cyclic_overlap(0, 0, 0, 3, 5));
    }

    #[test]
    fn overlap_wraparound() {
        // [4, 6) wraps to [4,5) u [0,1)
        assert!(cyclic_overlap(4, 2, 0, 1, 5));
        assert!(!cyclic_overlap(4, 2, 1, 2, 5));
        // a full-period interval overlaps everything
        assert!(cyclic_overlap(0, 5, 3, 1, 5));
    }

    #[test]
    fn execution_time_graph_edges() {
        let c = ProcessCollection::from_processes(
            [op("a", 0, 2), op("b", 1, 2), op("c", 3, 1)],
            5,
        )
        .unwrap();
        let g = create_exclusion_graph_from_execution_time(&c);
        assert!(g.has_edge(Id::from("a"), Id::from("b")));
        assert!(!g.has_edge(Id::from("a"), Id::from("c")));
        assert!(!g.has_edge(Id::from("b"), Id::from("c")));
    }

    #[test]
    fn execution_time_graph_wraparound_edge() {
        // b occupies [3,5) u [0,1); a occupies [0,2)
        let c =
            ProcessCollection::from_processes([op("a", 0, 2), op("b", 3, 3)], 5)
                .unwrap();
        let g = create_exclusion_graph_from_execution_time(&c);
        assert!(g.has_edge(Id::from("a"), Id::from("b")));
    }

    #[test]
    fn port_graph_conflicts_on_simultaneous_writes() {
        // both written at cycle 0: with one write port they conflict
        let c = ProcessCollection::from_processes(
            [var("v0", 0, &[1]), var("v1", 0, &[2]), var("v2", 1, &[1])],
            4,
        )
        .unwrap();
        let budget = PortBudget::new(Some(1), Some(1), None).unwrap();
        let g = create_exclusion_graph_from_ports(&c, budget).unwrap();
        assert!(g.has_edge(Id::from("v0"), Id::from("v1")));
        assert!(!g.has_edge(Id::from("v0"), Id::from("v2")));
    }

    #[test]
    fn port_graph_total_budget() {
        // v0 is read at cycle 2, v1 is written at cycle 2: a single shared
        // port cannot do both
        let c = ProcessCollection::from_processes(
            [var("v0", 0, &[2]), var("v1", 2, &[1])],
            4,
        )
        .unwrap();
        let budget = PortBudget::new(None, None, Some(1)).unwrap();
        let g = create_exclusion_graph_from_ports(&c, budget).unwrap();
        assert!(g.has_edge(Id::from("v0"), Id::from("v1")));
        let budget = PortBudget::new(None, None, Some(2)).unwrap();
        let g = create_exclusion_graph_from_ports(&c, budget).unwrap();
        assert!(!g.has_edge(Id::from("v0"), Id::from("v1")));
    }
}
