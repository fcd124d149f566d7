use crate::{
    create_exclusion_graph_from_execution_time,
    create_exclusion_graph_from_ports, PortBudget, Process, ProcessKind,
};
use linked_hash_map::LinkedHashMap;
use std::collections::BTreeMap;
use takt_utils::{Error, GetName, Id, TaktResult};

/// A set of [Process]es sharing one schedule period.
///
/// The period is collection-wide: every process interval is interpreted
/// modulo `schedule_time`. The collection's process kind is fixed lazily by
/// the first insertion; inserting a process of a different kind afterwards
/// is a configuration error.
///
/// All `split_*` operations are pure: they return fresh collections and
/// never mutate the source. Together the parts of any split form a
/// partition of the source collection.
#[derive(Clone, Debug)]
pub struct ProcessCollection {
    processes: LinkedHashMap<Id, Process>,
    schedule_time: u64,
    kind: Option<ProcessKind>,
}

impl ProcessCollection {
    pub fn new(schedule_time: u64) -> Self {
        ProcessCollection {
            processes: LinkedHashMap::new(),
            schedule_time,
            kind: None,
        }
    }

    pub fn from_processes(
        processes: impl IntoIterator<Item = Process>,
        schedule_time: u64,
    ) -> TaktResult<Self> {
        let mut collection = Self::new(schedule_time);
        for p in processes {
            collection.add_process(p)?;
        }
        Ok(collection)
    }

    pub fn schedule_time(&self) -> u64 {
        self.schedule_time
    }

    /// The kind of the processes in this collection, if any have been added.
    pub fn kind(&self) -> Option<ProcessKind> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> + Clone {
        self.processes.values()
    }

    pub fn get(&self, name: impl Into<Id>) -> Option<&Process> {
        self.processes.get(&name.into())
    }

    pub fn contains(&self, name: impl Into<Id>) -> bool {
        self.processes.contains_key(&name.into())
    }

    /// Add a process. The first insertion fixes the collection's kind.
    pub fn add_process(&mut self, process: Process) -> TaktResult<()> {
        match self.kind {
            None => self.kind = Some(process.kind()),
            Some(kind) if kind != process.kind() => {
                return Err(Error::malformed_structure(format!(
                    "process `{}' not of expected type: collection holds \
                     {kind}s, got a {}",
                    process.name(),
                    process.kind()
                )));
            }
            Some(_) => (),
        }
        if self.processes.contains_key(&process.name()) {
            return Err(Error::malformed_structure(format!(
                "duplicate process name `{}'",
                process.name()
            )));
        }
        self.processes.insert(process.name(), process);
        Ok(())
    }

    /// Remove the process named `name` and return it.
    pub fn remove_process(&mut self, name: Id) -> TaktResult<Process> {
        self.processes.remove(&name).ok_or_else(|| {
            Error::malformed_structure(format!(
                "no process named `{name}' in collection"
            ))
        })
    }

    /// Partition by operator type name. Processes without a type name
    /// (memory variables) are grouped under their kind.
    pub fn split_on_type_name(&self) -> BTreeMap<Id, ProcessCollection> {
        let mut out: BTreeMap<Id, ProcessCollection> = BTreeMap::new();
        for p in self.iter() {
            let key = p
                .type_name()
                .unwrap_or_else(|| Id::new(p.kind().to_string()));
            out.entry(key)
                .or_insert_with(|| ProcessCollection::new(self.schedule_time))
                .add_process(p.clone())
                .expect("grouped processes share a kind");
        }
        out
    }

    /// Partition into collections whose members never overlap in time:
    /// color the execution-time exclusion graph and emit one collection per
    /// color.
    pub fn split_on_execution_time(&self) -> Vec<ProcessCollection> {
        let graph = create_exclusion_graph_from_execution_time(self);
        self.split_by_coloring(graph.color_greedy())
    }

    /// Partition into (total lifetime <= `threshold`, rest). With a
    /// threshold of 0 this isolates same-cycle transfers, which need a
    /// direct interconnect rather than storage.
    pub fn split_on_length(
        &self,
        threshold: u64,
    ) -> (ProcessCollection, ProcessCollection) {
        let mut short = ProcessCollection::new(self.schedule_time);
        let mut long = ProcessCollection::new(self.schedule_time);
        for p in self.iter() {
            let target = if p.execution_time() <= threshold {
                &mut short
            } else {
                &mut long
            };
            target
                .add_process(p.clone())
                .expect("partition preserves the source kind");
        }
        (short, long)
    }

    /// Partition into collections that each fit the given memory port
    /// budget: color the port exclusion graph and emit one collection per
    /// color. Either `total_ports` or both `read_ports` and `write_ports`
    /// must be given.
    pub fn split_on_ports(
        &self,
        read_ports: Option<usize>,
        write_ports: Option<usize>,
        total_ports: Option<usize>,
    ) -> TaktResult<Vec<ProcessCollection>> {
        let budget = PortBudget::new(read_ports, write_ports, total_ports)?;
        let graph = create_exclusion_graph_from_ports(self, budget)?;
        Ok(self.split_by_coloring(graph.color_greedy()))
    }

    fn split_by_coloring(
        &self,
        coloring: BTreeMap<Id, usize>,
    ) -> Vec<ProcessCollection> {
        let colors = coloring.values().copied().max().map_or(0, |c| c + 1);
        let mut parts =
            vec![ProcessCollection::new(self.schedule_time); colors];
        for p in self.iter() {
            parts[coloring[&p.name()]]
                .add_process(p.clone())
                .expect("partition preserves the source kind");
        }
        parts
    }
}

impl serde::Serialize for ProcessCollection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ProcessCollection", 2)?;
        s.serialize_field("schedule_time", &self.schedule_time)?;
        s.serialize_field(
            "processes",
            &self.processes.values().collect::<Vec<_>>(),
        )?;
        s.end()
    }
}

impl std::fmt::Display for ProcessCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "collection (T={}) {{", self.schedule_time)?;
        for p in self.iter() {
            write!(
                f,
                " {}@[{}, {}+{})",
                p.name(),
                p.start_time(),
                p.start_time(),
                p.execution_time()
            )?;
        }
        write!(f, " }}")
    }
}
