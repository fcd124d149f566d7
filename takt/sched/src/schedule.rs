use itertools::Itertools;
use linked_hash_map::LinkedHashMap;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;
use takt_ir::{DataflowGraph, PortRef, Signal, SignalIdx};
use takt_synth::{
    MemoryVariable, OperatorProcess, Process, ProcessCollection, ReadAccess,
};
use takt_utils::{Error, GetName, Id, TaktResult};

/// Sentinel slack value meaning "no constraining neighbor in this
/// direction".
pub const UNBOUNDED: u64 = u64::MAX;

/// Start-time assignment for every operator of a dataflow graph.
///
/// Constructed by ASAP scheduling and then refined by slack-bounded moves
/// and rotations. All derived structures (slacks, laps, the process
/// collections handed to binding) are recomputed from `start_times` on
/// demand; nothing here caches across mutations.
#[derive(Clone, Debug)]
pub struct Schedule {
    graph: DataflowGraph,
    start_times: LinkedHashMap<Id, u64>,
    schedule_time: u64,
    cyclic: bool,
}

impl Schedule {
    /// Schedule `graph` as soon as possible.
    ///
    /// Operators are visited in topological order over the delay-free
    /// precedence relation; each start time is the maximum over the
    /// operator's driven inputs of the producer's availability time minus
    /// this input's latency offset, clipped to zero. Delay elements are
    /// not scheduled and contribute no precedence constraint.
    ///
    /// When `schedule_time` is `None` the period defaults to the makespan
    /// of the ASAP solution (at least 1). An explicit period below the
    /// makespan is a constraint violation.
    pub fn asap(
        graph: DataflowGraph,
        schedule_time: Option<u64>,
        cyclic: bool,
    ) -> TaktResult<Self> {
        if let Some(op) = graph
            .operators()
            .find(|op| !op.is_delay() && !op.latency_offsets_set())
        {
            return Err(Error::latency_not_set(op.name()));
        }

        // Precedence DAG over non-delay operators. Edges through a delay
        // are cut: the delayed value comes from the previous iteration.
        let mut order: HashMap<Id, usize> = HashMap::new();
        for (idx, op) in graph.operators().enumerate() {
            order.insert(op.name(), idx);
        }
        let mut precedence: DiGraphMap<usize, ()> = DiGraphMap::new();
        for op in graph.operators().filter(|op| !op.is_delay()) {
            precedence.add_node(order[&op.name()]);
        }
        for signal in graph.signals() {
            let src = graph.get(signal.source.operator).unwrap();
            let dst = graph.get(signal.destination.operator).unwrap();
            if !src.is_delay() && !dst.is_delay() {
                precedence.add_edge(order[&src.name()], order[&dst.name()], ());
            }
        }
        let topo = toposort(&precedence, None).map_err(|cycle| {
            let name = graph
                .operators()
                .nth(cycle.node_id())
                .map(|op| op.name().to_string())
                .unwrap_or_default();
            Error::malformed_structure(format!(
                "delay-free cycle through operator `{name}'"
            ))
        })?;

        let mut start_times: LinkedHashMap<Id, u64> = LinkedHashMap::new();
        // Fixed order: delays first at time zero, then scheduled operators
        // in declaration order so the map iterates deterministically.
        for op in graph.operators() {
            start_times.insert(op.name(), 0);
        }
        for idx in topo {
            let op = graph.operators().nth(idx).unwrap();
            let mut start: i64 = 0;
            for sig_idx in graph.inputs_of(op.name()) {
                let signal = graph.signal(sig_idx);
                let producer = graph.get(signal.source.operator).unwrap();
                if producer.is_delay() {
                    continue;
                }
                let avail = start_times[&producer.name()] as i64
                    + producer.output_offset(signal.source.port).unwrap()
                        as i64;
                let in_off =
                    op.input_offset(signal.destination.port).unwrap() as i64;
                start = start.max(avail - in_off);
            }
            // In-place update keeps declaration order; `insert` would
            // move the key to the back.
            *start_times.get_mut(&op.name()).unwrap() = start.max(0) as u64;
        }

        let makespan = graph
            .operators()
            .filter(|op| !op.is_delay())
            .map(|op| start_times[&op.name()] + op.latency().unwrap_or(0))
            .max()
            .unwrap_or(0);
        let schedule_time = match schedule_time {
            Some(t) if t < makespan => {
                return Err(Error::constraint(format!(
                    "schedule time {t} is below the makespan {makespan}"
                )));
            }
            Some(t) => t,
            None => makespan.max(1),
        };

        log::info!(
            "asap: {} operators, makespan {makespan}, period {schedule_time}",
            start_times.len()
        );
        Ok(Schedule {
            graph,
            start_times,
            schedule_time,
            cyclic,
        })
    }

    pub fn graph(&self) -> &DataflowGraph {
        &self.graph
    }

    pub fn schedule_time(&self) -> u64 {
        self.schedule_time
    }

    pub fn cyclic(&self) -> bool {
        self.cyclic
    }

    pub fn start_time(&self, name: impl Into<Id>) -> Option<u64> {
        self.start_times.get(&name.into()).copied()
    }

    /// Start times in declaration order.
    pub fn start_times(&self) -> impl Iterator<Item = (Id, u64)> + '_ {
        self.start_times.iter().map(|(name, time)| (*name, *time))
    }

    fn checked_op(&self, name: Id) -> TaktResult<&takt_ir::Operator> {
        self.graph.get(name).ok_or_else(|| {
            Error::constraint(format!("unknown operator `{name}'"))
        })
    }

    /// Gap in cycles from a value becoming available to it being read.
    /// In a cyclic schedule the gap wraps at the period boundary.
    fn dependency_gap(&self, avail: i64, read: i64) -> u64 {
        if self.cyclic {
            (read - avail).rem_euclid(self.schedule_time as i64) as u64
        } else {
            debug_assert!(read >= avail);
            (read - avail) as u64
        }
    }

    /// How far `name` can move earlier and later without violating any
    /// neighbor, as `(backward, forward)`. A direction with no
    /// constraining neighbor reports [UNBOUNDED]; in a non-cyclic
    /// schedule the period boundaries constrain both directions.
    pub fn slacks(&self, name: impl Into<Id>) -> TaktResult<(u64, u64)> {
        let name = name.into();
        let op = self.checked_op(name)?;
        let start = self.start_times[&name] as i64;
        let mut backward = UNBOUNDED;
        let mut forward = UNBOUNDED;

        for sig_idx in self.graph.inputs_of(name) {
            let signal = self.graph.signal(sig_idx);
            let producer = self.graph.get(signal.source.operator).unwrap();
            if producer.is_delay() {
                continue;
            }
            let avail = self.start_times[&producer.name()] as i64
                + producer.output_offset(signal.source.port).unwrap() as i64;
            let read = start
                + op.input_offset(signal.destination.port).unwrap() as i64;
            backward = backward.min(self.dependency_gap(avail, read));
        }
        for sig_idx in self.graph.outputs_of(name) {
            let signal = self.graph.signal(sig_idx);
            let consumer =
                self.graph.get(signal.destination.operator).unwrap();
            if consumer.is_delay() {
                continue;
            }
            let avail =
                start + op.output_offset(signal.source.port).unwrap() as i64;
            let read = self.start_times[&consumer.name()] as i64
                + consumer.input_offset(signal.destination.port).unwrap()
                    as i64;
            forward = forward.min(self.dependency_gap(avail, read));
        }

        if !self.cyclic {
            backward = backward.min(start as u64);
            let end = start as u64 + op.latency().unwrap_or(0);
            forward = forward.min(self.schedule_time - end);
        }
        Ok((backward, forward))
    }

    /// Move `name` by `delta` cycles. Fails with a constraint error when
    /// the move falls outside the slack window reported by [Self::slacks].
    pub fn move_operation(
        &mut self,
        name: impl Into<Id>,
        delta: i64,
    ) -> TaktResult<()> {
        let name = name.into();
        let (backward, forward) = self.slacks(name)?;
        let in_range = if delta >= 0 {
            forward == UNBOUNDED || delta as u64 <= forward
        } else {
            backward == UNBOUNDED || delta.unsigned_abs() <= backward
        };
        if !in_range {
            return Err(Error::constraint(format!(
                "moving `{name}' by {delta} is outside its slack window \
                 (backward {backward}, forward {forward})"
            )));
        }
        let moved = self.start_times[&name] as i64 + delta;
        let moved = if self.cyclic {
            moved.rem_euclid(self.schedule_time as i64) as u64
        } else {
            moved as u64
        };
        *self.start_times.get_mut(&name).unwrap() = moved;
        Ok(())
    }

    /// Largest completion time over all scheduled operators.
    pub fn max_end_time(&self) -> u64 {
        self.graph
            .operators()
            .filter(|op| !op.is_delay())
            .map(|op| self.start_times[&op.name()] + op.latency().unwrap_or(0))
            .max()
            .unwrap_or(0)
    }

    /// Change the period. Every operator's completion must still fit.
    pub fn set_schedule_time(&mut self, new_time: u64) -> TaktResult<()> {
        let end = self.max_end_time();
        if new_time < end {
            return Err(Error::constraint(format!(
                "schedule time {new_time} is below the maximum operator \
                 end time {end}"
            )));
        }
        self.schedule_time = new_time;
        Ok(())
    }

    /// Shift every start time one cycle later, modulo the period.
    pub fn rotate_forward(&mut self) -> TaktResult<()> {
        self.rotate(1)
    }

    /// Shift every start time one cycle earlier, modulo the period.
    pub fn rotate_backward(&mut self) -> TaktResult<()> {
        self.rotate(-1)
    }

    fn rotate(&mut self, delta: i64) -> TaktResult<()> {
        if !self.cyclic {
            return Err(Error::constraint(
                "rotation requires a cyclic schedule",
            ));
        }
        let period = self.schedule_time as i64;
        for (_, time) in self.start_times.iter_mut() {
            *time = (*time as i64 + delta).rem_euclid(period) as u64;
        }
        Ok(())
    }

    /// Longest latency-weighted path through the delay-free precedence
    /// graph, independent of the current start times and period.
    pub fn critical_path_time(&self) -> u64 {
        // ASAP over the same graph yields the critical path as its
        // makespan; the construction already validated the offsets.
        let mut earliest: HashMap<Id, i64> = HashMap::new();
        let mut longest = 0;
        // Declaration order is not topological in general, so iterate to
        // a fixed point; the graph is a DAG so |ops| passes suffice.
        for _ in 0..self.graph.operators().count() {
            let mut changed = false;
            for op in self.graph.operators().filter(|op| !op.is_delay()) {
                let mut start: i64 = 0;
                for sig_idx in self.graph.inputs_of(op.name()) {
                    let signal = self.graph.signal(sig_idx);
                    let producer =
                        self.graph.get(signal.source.operator).unwrap();
                    if producer.is_delay() {
                        continue;
                    }
                    let avail = earliest
                        .get(&producer.name())
                        .copied()
                        .unwrap_or(0)
                        + producer.output_offset(signal.source.port).unwrap()
                            as i64;
                    let in_off = op
                        .input_offset(signal.destination.port)
                        .unwrap() as i64;
                    start = start.max(avail - in_off);
                }
                if earliest.get(&op.name()).copied().unwrap_or(-1) != start {
                    earliest.insert(op.name(), start);
                    changed = true;
                }
                longest =
                    longest.max(start as u64 + op.latency().unwrap_or(0));
            }
            if !changed {
                break;
            }
        }
        longest
    }

    /// Lower bound on the achievable period: the maximum over all
    /// feedback loops of the loop latency divided by its delay count,
    /// rounded up. Returns `Ok(None)` when the graph has no feedback
    /// loop at all.
    pub fn iteration_period_bound(&self) -> TaktResult<Option<u64>> {
        iteration_period_bound(&self.graph)
    }

    /// Per-signal lap counts: how many period boundaries the value on
    /// each signal crosses between write and read. Each delay on the
    /// value's path contributes one lap; in a cyclic schedule a read that
    /// falls before its write within the period contributes one more.
    pub fn laps(&self) -> HashMap<SignalIdx, u64> {
        let mut laps = HashMap::new();
        for (idx, signal) in self.graph.signals().iter().enumerate() {
            let producer = self.graph.get(signal.source.operator).unwrap();
            let consumer =
                self.graph.get(signal.destination.operator).unwrap();
            let lap = if producer.is_delay() {
                1
            } else if consumer.is_delay() {
                0
            } else {
                let avail = self.start_times[&producer.name()] as i64
                    + producer.output_offset(signal.source.port).unwrap()
                        as i64;
                let read = self.start_times[&consumer.name()] as i64
                    + consumer
                        .input_offset(signal.destination.port)
                        .unwrap() as i64;
                u64::from(self.cyclic && read < avail)
            };
            laps.insert(idx, lap);
        }
        laps
    }

    /// Wrap operator executions into a process collection for binding.
    /// Every scheduled operator must have an execution time.
    pub fn operator_processes(&self) -> TaktResult<ProcessCollection> {
        let mut processes = Vec::new();
        for op in self.graph.operators().filter(|op| !op.is_delay()) {
            let execution_time = op.execution_time().ok_or_else(|| {
                Error::malformed_structure(format!(
                    "execution time not specified for operator `{}'",
                    op.name()
                ))
            })?;
            processes.push(Process::Operator(OperatorProcess {
                name: op.name(),
                start_time: self.start_times[&op.name()] % self.normalizer(),
                execution_time,
                operator: op.name(),
                type_name: op.type_name(),
            }));
        }
        ProcessCollection::from_processes(processes, self.schedule_time)
    }

    fn normalizer(&self) -> u64 {
        if self.cyclic {
            self.schedule_time
        } else {
            u64::MAX
        }
    }

    /// Wrap every produced value into a memory variable: one process per
    /// driven output port, with one read access per transitive consumer.
    /// Consumers reached through delays read the value whole periods
    /// later; cyclic wraparound adds one period to the raw offset.
    pub fn memory_variables(&self) -> TaktResult<ProcessCollection> {
        let mut processes = Vec::new();
        for op in self.graph.operators().filter(|op| !op.is_delay()) {
            for port in 0..op.num_outputs() {
                let source = PortRef::new(op.name(), port);
                let write = self.start_times[&op.name()] as i64
                    + op.output_offset(port).unwrap() as i64;
                let mut reads = Vec::new();
                for sig_idx in self.graph.sinks_of(source) {
                    self.collect_reads(
                        self.graph.signal(sig_idx),
                        write,
                        0,
                        &mut reads,
                    )?;
                }
                if reads.is_empty() {
                    continue;
                }
                processes.push(Process::Variable(MemoryVariable {
                    name: format!("{}.out{port}", op.name()).into(),
                    write_time: (write as u64) % self.normalizer(),
                    reads,
                }));
            }
        }
        ProcessCollection::from_processes(processes, self.schedule_time)
    }

    /// Follow one signal to its reader, descending through delay chains.
    /// `depth` counts the delays crossed so far; each one shifts the read
    /// a full period later.
    fn collect_reads(
        &self,
        signal: &Signal,
        write: i64,
        depth: u64,
        reads: &mut Vec<ReadAccess>,
    ) -> TaktResult<()> {
        let consumer = self.graph.get(signal.destination.operator).unwrap();
        if consumer.is_delay() {
            for port in 0..consumer.num_outputs() {
                let source = PortRef::new(consumer.name(), port);
                for sig_idx in self.graph.sinks_of(source) {
                    self.collect_reads(
                        self.graph.signal(sig_idx),
                        write,
                        depth + 1,
                        reads,
                    )?;
                }
            }
            return Ok(());
        }
        let read = self.start_times[&consumer.name()] as i64
            + consumer.input_offset(signal.destination.port).unwrap() as i64;
        let mut offset = read - write;
        if self.cyclic && offset < 0 {
            offset = offset.rem_euclid(self.schedule_time as i64);
        }
        offset += (depth * self.schedule_time) as i64;
        if offset < 0 {
            return Err(Error::internal(format!(
                "value `{}.out{}' read {} cycles before it is written",
                signal.source.operator, signal.source.port, -offset
            )));
        }
        reads.push(ReadAccess {
            target: format!(
                "{}.in{}",
                consumer.name(),
                signal.destination.port
            )
            .into(),
            offset: offset as u64,
        });
        Ok(())
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "schedule (period {}, {}):",
            self.schedule_time,
            if self.cyclic { "cyclic" } else { "non-cyclic" }
        )?;
        for (name, time) in &self.start_times {
            writeln!(f, "  {name}: {time}")?;
        }
        Ok(())
    }
}

/// Enumerate simple cycles of the graph (delays included) and take the
/// maximum of `ceil(loop latency / loop delays)`.
fn iteration_period_bound(graph: &DataflowGraph) -> TaktResult<Option<u64>> {
    let names: Vec<Id> = graph.operators().map(|op| op.name()).collect();
    let index: HashMap<Id, usize> =
        names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let successors: Vec<Vec<usize>> = names
        .iter()
        .map(|name| {
            graph
                .outputs_of(*name)
                .map(|idx| index[&graph.signal(idx).destination.operator])
                .sorted()
                .dedup()
                .collect()
        })
        .collect();

    let mut bound: Option<u64> = None;
    // Anchor each cycle at its smallest operator index so every simple
    // cycle is found exactly once.
    let mut stack = Vec::new();
    let mut on_stack = vec![false; names.len()];
    for anchor in 0..names.len() {
        stack.push((anchor, 0usize));
        on_stack[anchor] = true;
        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            match successors[node].get(*next) {
                Some(&succ) => {
                    *next += 1;
                    if succ == anchor {
                        let cycle: Vec<usize> =
                            stack.iter().map(|(n, _)| *n).collect();
                        bound = Some(
                            bound
                                .unwrap_or(0)
                                .max(cycle_bound(graph, &names, &cycle)?),
                        );
                    } else if succ > anchor && !on_stack[succ] {
                        stack.push((succ, 0));
                        on_stack[succ] = true;
                    }
                }
                None => {
                    on_stack[node] = false;
                    stack.pop();
                }
            }
        }
    }
    Ok(bound)
}

fn cycle_bound(
    graph: &DataflowGraph,
    names: &[Id],
    cycle: &[usize],
) -> TaktResult<u64> {
    let mut latency = 0u64;
    let mut delays = 0u64;
    for &idx in cycle {
        let op = graph.get(names[idx]).unwrap();
        if op.is_delay() {
            delays += 1;
        } else {
            latency += op.latency().ok_or_else(|| {
                Error::latency_not_set(op.name())
            })?;
        }
    }
    if delays == 0 {
        return Err(Error::malformed_structure(format!(
            "delay-free cycle through operator `{}'",
            names[cycle[0]]
        )));
    }
    Ok(latency.div_ceil(delays))
}

#[cfg(test)]
mod tests {
    use super::*;
    use takt_ir::Builder;

    /// `in -> cmul -> add -> out`, with a delay off the input feeding the
    /// adder's second port.
    fn fir() -> DataflowGraph {
        let mut b = Builder::new();
        b.input("in").unwrap();
        b.unary("cmul", "cmul", 1, 1, PortRef::new("in", 0)).unwrap();
        b.delay("t", PortRef::new("in", 0)).unwrap();
        b.binary(
            "add",
            "add",
            1,
            1,
            PortRef::new("cmul", 0),
            PortRef::new("t", 0),
        )
        .unwrap();
        b.output("out", PortRef::new("add", 0)).unwrap();
        b.finish()
    }

    fn chain() -> DataflowGraph {
        let mut b = Builder::new();
        b.input("in").unwrap();
        b.unary("a", "add", 1, 1, PortRef::new("in", 0)).unwrap();
        b.unary("b", "mul", 2, 2, PortRef::new("a", 0)).unwrap();
        b.output("out", PortRef::new("b", 0)).unwrap();
        b.finish()
    }

    #[test]
    fn asap_fir_start_times() {
        let sched = Schedule::asap(fir(), Some(4), true).unwrap();
        assert_eq!(sched.start_time("in"), Some(0));
        assert_eq!(sched.start_time("cmul"), Some(0));
        assert_eq!(sched.start_time("t"), Some(0));
        assert_eq!(sched.start_time("add"), Some(1));
        assert_eq!(sched.start_time("out"), Some(2));
    }

    #[test]
    fn move_outside_slack_fails() {
        let mut sched = Schedule::asap(fir(), Some(4), true).unwrap();
        // add's output feeds out at the next cycle: no forward slack.
        let (backward, forward) = sched.slacks("add").unwrap();
        assert_eq!((backward, forward), (0, 0));
        assert!(sched.move_operation("add", 1).is_err());
        assert!(sched.move_operation("add", -1).is_err());
        assert!(sched.move_operation("add", 0).is_ok());
    }

    #[test]
    fn slack_window_is_exact() {
        let mut sched = Schedule::asap(chain(), Some(5), false).unwrap();
        // out is free to slide within [end of b, period].
        sched.move_operation("out", 2).unwrap();
        let (backward, forward) = sched.slacks("out").unwrap();
        assert_eq!((backward, forward), (2, 0));
        for delta in [-2, -1, 0] {
            let mut s = sched.clone();
            assert!(s.move_operation("out", delta).is_ok());
        }
        for delta in [-3, 1] {
            let mut s = sched.clone();
            assert!(s.move_operation("out", delta).is_err());
        }
    }

    #[test]
    fn set_schedule_time_checks_end_times() {
        let mut sched = Schedule::asap(chain(), Some(5), true).unwrap();
        assert_eq!(sched.max_end_time(), 3);
        assert!(sched.set_schedule_time(3).is_ok());
        assert!(sched.set_schedule_time(2).is_err());
    }

    #[test]
    fn rotation_wraps_start_times() {
        let mut sched = Schedule::asap(chain(), Some(3), true).unwrap();
        sched.rotate_forward().unwrap();
        assert_eq!(sched.start_time("in"), Some(1));
        assert_eq!(sched.start_time("b"), Some(2));
        sched.rotate_backward().unwrap();
        sched.rotate_backward().unwrap();
        assert_eq!(sched.start_time("in"), Some(2));

        let mut flat = Schedule::asap(chain(), Some(5), false).unwrap();
        assert!(flat.rotate_forward().is_err());
    }

    #[test]
    fn critical_path_of_chain() {
        let sched = Schedule::asap(chain(), Some(10), false).unwrap();
        assert_eq!(sched.critical_path_time(), 3);
    }

    #[test]
    fn iteration_period_bound_of_loop() {
        // acc -> t(delay) -> acc: one delay, loop latency 2.
        let mut b = Builder::new();
        b.input("in").unwrap();
        let acc = takt_ir::Operator::new(
            "acc",
            "add",
            vec![Some(0), Some(0)],
            vec![Some(2)],
            Some(1),
        );
        b.operator(acc).unwrap();
        b.connect(PortRef::new("in", 0), PortRef::new("acc", 0)).unwrap();
        b.delay("t", PortRef::new("acc", 0)).unwrap();
        b.connect(PortRef::new("t", 0), PortRef::new("acc", 1)).unwrap();
        b.output("out", PortRef::new("acc", 0)).unwrap();
        let sched = Schedule::asap(b.finish(), Some(4), true).unwrap();
        assert_eq!(sched.iteration_period_bound().unwrap(), Some(2));

        let flat = Schedule::asap(chain(), Some(5), false).unwrap();
        assert_eq!(flat.iteration_period_bound().unwrap(), None);
    }

    #[test]
    fn unset_latency_is_an_error() {
        let mut b = Builder::new();
        b.input("in").unwrap();
        b.operator(takt_ir::Operator::new(
            "a",
            "add",
            vec![Some(0)],
            vec![None],
            Some(1),
        ))
        .unwrap();
        b.connect(PortRef::new("in", 0), PortRef::new("a", 0)).unwrap();
        let err = Schedule::asap(b.finish(), None, false).unwrap_err();
        assert!(err.to_string().contains("latencies not set"));
    }

    #[test]
    fn operator_processes_carry_types() {
        let sched = Schedule::asap(fir(), Some(4), true).unwrap();
        let collection = sched.operator_processes().unwrap();
        assert_eq!(collection.len(), 4);
        let add = collection.get("add").unwrap();
        assert_eq!(add.start_time(), 1);
        assert_eq!(add.type_name(), Some("add".into()));
    }

    #[test]
    fn memory_variables_follow_delay_chains() {
        let sched = Schedule::asap(fir(), Some(4), true).unwrap();
        let vars = sched.memory_variables().unwrap();
        // in.out0 is read directly by cmul and, one period later,
        // through the delay by add.
        let input = vars.get("in.out0").unwrap().as_variable().unwrap();
        assert_eq!(input.write_time, 0);
        let mut offsets: Vec<(String, u64)> = input
            .reads
            .iter()
            .map(|r| (r.target.to_string(), r.offset))
            .collect();
        offsets.sort();
        assert_eq!(
            offsets,
            vec![
                ("add.in1".to_string(), 5),
                ("cmul.in0".to_string(), 0)
            ]
        );
        // cmul.out0 is available at cycle 1 and read by add at cycle 1.
        let cmul = vars.get("cmul.out0").unwrap().as_variable().unwrap();
        assert_eq!(cmul.write_time, 1);
        assert_eq!(cmul.reads.len(), 1);
        assert_eq!(cmul.reads[0].offset, 0);
    }

    #[test]
    fn reads_before_the_write_wrap_into_the_period() {
        let mut sched = Schedule::asap(chain(), Some(5), true).unwrap();
        // b completes at cycle 3; sliding out past the boundary makes
        // its read land at cycle 1, before the write.
        sched.move_operation("out", 3).unwrap();
        assert_eq!(sched.start_time("out"), Some(1));
        let vars = sched.memory_variables().unwrap();
        let b = vars.get("b.out0").unwrap().as_variable().unwrap();
        assert_eq!(b.write_time, 3);
        assert_eq!(b.reads.len(), 1);
        assert_eq!(b.reads[0].target, Id::from("out.in0"));
        assert_eq!(b.reads[0].offset, 3);
    }

    #[test]
    fn laps_count_wraparound_and_delays() {
        let mut sched = Schedule::asap(fir(), Some(3), true).unwrap();
        let laps = sched.laps();
        // No move yet: only the delay's fanout carries a lap.
        let total: u64 = laps.values().sum();
        assert_eq!(total, 1);
        // Rotating pushes add's completion to the period boundary, so
        // its value to out now wraps as well.
        sched.rotate_forward().unwrap();
        assert_eq!(sched.laps().values().sum::<u64>(), 2);
    }
}
