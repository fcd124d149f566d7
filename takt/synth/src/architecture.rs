use crate::{
    ForwardBackwardTable, MemoryStorage, Process, ProcessCollection,
    ProcessKind,
};
use takt_utils::{Error, GetName, Id, TaktResult};

/// Is `name` usable as a hardware entity name? The rule is the VHDL basic
/// identifier: an ASCII letter followed by letters, digits or underscores,
/// with no doubled and no trailing underscore.
pub fn is_valid_entity_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    if name.ends_with('_') || name.contains("__") {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn checked_entity_name(name: Id) -> TaktResult<Id> {
    if is_valid_entity_name(name.as_str()) {
        Ok(name)
    } else {
        Err(Error::invalid_name(name))
    }
}

/// A physical arithmetic unit executing one [ProcessCollection] of
/// operator processes, all of the same operator type.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ProcessingElement {
    entity_name: Id,
    type_name: Id,
    collection: ProcessCollection,
}

impl ProcessingElement {
    pub fn new(
        entity_name: impl Into<Id>,
        collection: ProcessCollection,
    ) -> TaktResult<Self> {
        if collection.is_empty() {
            return Err(Error::malformed_structure(
                "a processing element needs a non-empty process collection",
            ));
        }
        if collection.kind() != Some(ProcessKind::Operator) {
            return Err(Error::malformed_structure(
                "a processing element binds operator processes only",
            ));
        }
        let type_name = {
            let mut types = collection.iter().filter_map(|p| p.type_name());
            let first = types.next().expect("collection is non-empty");
            if types.any(|t| t != first) {
                return Err(Error::malformed_structure(
                    "a processing element binds a single operator type",
                ));
            }
            first
        };
        Ok(ProcessingElement {
            entity_name: checked_entity_name(entity_name.into())?,
            type_name,
            collection,
        })
    }

    pub fn entity_name(&self) -> Id {
        self.entity_name
    }

    /// Rename the entity. Fails on names that are not valid identifiers.
    pub fn set_entity_name(&mut self, name: impl Into<Id>) -> TaktResult<()> {
        self.entity_name = checked_entity_name(name.into())?;
        Ok(())
    }

    pub fn type_name(&self) -> Id {
        self.type_name
    }

    pub fn collection(&self) -> &ProcessCollection {
        &self.collection
    }

    pub fn schedule_time(&self) -> u64 {
        self.collection.schedule_time()
    }
}

/// Storage realization chosen for a [Memory].
#[derive(Clone, Debug, serde::Serialize)]
pub enum StorageAllocation {
    /// Register file with a forward-backward allocation table.
    Registers(ForwardBackwardTable),
    /// Banked memory with per-cycle address generation.
    Banked(MemoryStorage),
}

/// A physical storage resource holding one [ProcessCollection] of memory
/// variables.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Memory {
    entity_name: Id,
    collection: ProcessCollection,
    storage: Option<StorageAllocation>,
}

impl Memory {
    pub fn new(
        entity_name: impl Into<Id>,
        collection: ProcessCollection,
    ) -> TaktResult<Self> {
        if collection.is_empty() {
            return Err(Error::malformed_structure(
                "a memory needs a non-empty process collection",
            ));
        }
        match collection.kind() {
            Some(ProcessKind::MemoryVariable)
            | Some(ProcessKind::PlainMemoryVariable) => (),
            _ => {
                return Err(Error::malformed_structure(
                    "a memory binds memory variables only",
                ));
            }
        }
        Ok(Memory {
            entity_name: checked_entity_name(entity_name.into())?,
            collection,
            storage: None,
        })
    }

    pub fn entity_name(&self) -> Id {
        self.entity_name
    }

    /// Rename the entity. Fails on names that are not valid identifiers.
    pub fn set_entity_name(&mut self, name: impl Into<Id>) -> TaktResult<()> {
        self.entity_name = checked_entity_name(name.into())?;
        Ok(())
    }

    pub fn collection(&self) -> &ProcessCollection {
        &self.collection
    }

    pub fn schedule_time(&self) -> u64 {
        self.collection.schedule_time()
    }

    /// The storage structure allocated for this memory, if any yet.
    pub fn storage(&self) -> Option<&StorageAllocation> {
        self.storage.as_ref()
    }

    /// Realize this memory as a register file: build the forward-backward
    /// allocation table for its variables.
    pub fn allocate_registers(&mut self) -> TaktResult<&ForwardBackwardTable> {
        let table = ForwardBackwardTable::from_collection(&self.collection)?;
        self.storage = Some(StorageAllocation::Registers(table));
        match self.storage.as_ref() {
            Some(StorageAllocation::Registers(t)) => Ok(t),
            _ => unreachable!("just assigned"),
        }
    }

    /// Realize this memory as a banked RAM with per-cycle address
    /// generation.
    pub fn allocate_banked(
        &mut self,
        adr_mux_size: usize,
        adr_pipe_depth: u32,
        registered_input: bool,
    ) -> TaktResult<&MemoryStorage> {
        let storage = MemoryStorage::new(
            &self.collection,
            adr_mux_size,
            adr_pipe_depth,
            registered_input,
        )?;
        self.storage = Some(StorageAllocation::Banked(storage));
        match self.storage.as_ref() {
            Some(StorageAllocation::Banked(s)) => Ok(s),
            _ => unreachable!("just assigned"),
        }
    }
}

/// The complete binding result: disjoint sets of processing elements and
/// memories over one schedule period. Every process is owned by exactly
/// one resource.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Architecture {
    processing_elements: Vec<ProcessingElement>,
    memories: Vec<Memory>,
    schedule_time: u64,
}

impl Architecture {
    pub fn new(
        processing_elements: Vec<ProcessingElement>,
        memories: Vec<Memory>,
        schedule_time: u64,
    ) -> TaktResult<Self> {
        let mut seen = std::collections::HashSet::new();
        let processes = processing_elements
            .iter()
            .flat_map(|pe| pe.collection().iter())
            .chain(memories.iter().flat_map(|m| m.collection().iter()));
        for p in processes {
            if !seen.insert(p.name()) {
                return Err(Error::malformed_structure(format!(
                    "process `{}' is bound to more than one resource",
                    p.name()
                )));
            }
        }
        let mut entities = std::collections::HashSet::new();
        for name in processing_elements
            .iter()
            .map(|pe| pe.entity_name())
            .chain(memories.iter().map(|m| m.entity_name()))
        {
            if !entities.insert(name) {
                return Err(Error::malformed_structure(format!(
                    "duplicate entity name `{name}'"
                )));
            }
        }
        if let Some(bad) = processing_elements
            .iter()
            .map(|pe| pe.schedule_time())
            .chain(memories.iter().map(|m| m.schedule_time()))
            .find(|t| *t != schedule_time)
        {
            return Err(Error::malformed_structure(format!(
                "resource scheduled with period {bad}, architecture period \
                 is {schedule_time}"
            )));
        }
        Ok(Architecture {
            processing_elements,
            memories,
            schedule_time,
        })
    }

    pub fn schedule_time(&self) -> u64 {
        self.schedule_time
    }

    pub fn processing_elements(&self) -> &[ProcessingElement] {
        &self.processing_elements
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    fn pe_index(&self, entity: Id) -> Option<usize> {
        self.processing_elements
            .iter()
            .position(|pe| pe.entity_name() == entity)
    }

    fn memory_index(&self, entity: Id) -> Option<usize> {
        self.memories
            .iter()
            .position(|m| m.entity_name() == entity)
    }

    /// Reassign the process named `name` from resource `from` to resource
    /// `to`. Both resources must be of the same kind, the process must be
    /// present in `from`, and the destination's invariants must hold.
    pub fn move_process(
        &mut self,
        name: Id,
        from: Id,
        to: Id,
    ) -> TaktResult<()> {
        match (self.pe_index(from), self.memory_index(from)) {
            (Some(src), None) => {
                let Some(dst) = self.pe_index(to) else {
                    return Err(Error::constraint(format!(
                        "cannot move `{name}': `{from}' and `{to}' are not \
                         the same resource kind"
                    )));
                };
                if src == dst {
                    return Ok(());
                }
                let process = self.take_process(name, from, src, true)?;
                if Some(self.processing_elements[dst].type_name())
                    != process.type_name()
                {
                    // put it back before failing
                    self.processing_elements[src]
                        .collection
                        .add_process(process)?;
                    return Err(Error::constraint(format!(
                        "cannot move `{name}' to `{to}': operator type \
                         mismatch"
                    )));
                }
                self.processing_elements[dst].collection.add_process(process)
            }
            (None, Some(src)) => {
                let Some(dst) = self.memory_index(to) else {
                    return Err(Error::constraint(format!(
                        "cannot move `{name}': `{from}' and `{to}' are not \
                         the same resource kind"
                    )));
                };
                if src == dst {
                    return Ok(());
                }
                let process = self.take_process(name, from, src, false)?;
                self.memories[dst].collection.add_process(process)
            }
            _ => Err(Error::constraint(format!(
                "no resource named `{from}'"
            ))),
        }
    }

    fn take_process(
        &mut self,
        name: Id,
        from: Id,
        index: usize,
        is_pe: bool,
    ) -> TaktResult<Process> {
        let collection = if is_pe {
            &mut self.processing_elements[index].collection
        } else {
            &mut self.memories[index].collection
        };
        if !collection.contains(name) {
            return Err(Error::constraint(format!(
                "no process named `{name}' in resource `{from}'"
            )));
        }
        collection.remove_process(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_entity_name, Architecture, Memory,
        ProcessingElement};
    use crate::{MemoryVariable, OperatorProcess, Process,
        ProcessCollection, ReadAccess};
    use takt_utils::Id;

    fn op(name: &str, type_name: &str, start: u64) -> Process {
        Process::Operator(OperatorProcess {
            name: Id::from(name),
            start_time: start,
            execution_time: 1,
            operator: Id::from(name),
            type_name: Id::from(type_name),
        })
    }

    fn var(name: &str, write: u64, offset: u64) -> Process {
        Process::Variable(MemoryVariable {
            name: Id::from(name),
            write_time: write,
            reads: vec![ReadAccess {
                target: Id::from("t0"),
                offset,
            }],
        })
    }

    fn pe(entity: &str, type_name: &str, ops: &[(&str, u64)]) -> ProcessingElement {
        let collection = ProcessCollection::from_processes(
            ops.iter().map(|(n, s)| op(n, type_name, *s)),
            4,
        )
        .unwrap();
        ProcessingElement::new(entity, collection).unwrap()
    }

    #[test]
    fn entity_name_rules() {
        assert!(is_valid_entity_name("adder0"));
        assert!(is_valid_entity_name("mem_bank_2"));
        assert!(!is_valid_entity_name(""));
        assert!(!is_valid_entity_name("0adder"));
        assert!(!is_valid_entity_name("mem__bank"));
        assert!(!is_valid_entity_name("mem_"));
        assert!(!is_valid_entity_name("mem bank"));
    }

    #[test]
    fn pe_rejects_mixed_types() {
        let collection = ProcessCollection::from_processes(
            [op("a", "add", 0), op("m", "mul", 1)],
            4,
        )
        .unwrap();
        assert!(ProcessingElement::new("pe0", collection).is_err());
    }

    #[test]
    fn pe_rejects_invalid_entity_name() {
        let collection =
            ProcessCollection::from_processes([op("a", "add", 0)], 4)
                .unwrap();
        assert!(ProcessingElement::new("2pe", collection).is_err());
    }

    #[test]
    fn memory_rejects_operator_processes() {
        let collection =
            ProcessCollection::from_processes([op("a", "add", 0)], 4)
                .unwrap();
        assert!(Memory::new("memory0", collection).is_err());
    }

    #[test]
    fn move_process_between_pes() {
        let arch = Architecture::new(
            vec![
                pe("pe0", "add", &[("a0", 0), ("a1", 2)]),
                pe("pe1", "add", &[("a2", 1)]),
            ],
            vec![],
            4,
        );
        let mut arch = arch.unwrap();
        arch.move_process(Id::from("a1"), Id::from("pe0"), Id::from("pe1"))
            .unwrap();
        assert_eq!(arch.processing_elements()[0].collection().len(), 1);
        assert_eq!(arch.processing_elements()[1].collection().len(), 2);
    }

    #[test]
    fn move_process_kind_mismatch() {
        let mem = Memory::new(
            "memory0",
            ProcessCollection::from_processes([var("v0", 0, 2)], 4).unwrap(),
        )
        .unwrap();
        let mut arch = Architecture::new(
            vec![pe("pe0", "add", &[("a0", 0)])],
            vec![mem],
            4,
        )
        .unwrap();
        assert!(arch
            .move_process(Id::from("a0"), Id::from("pe0"), Id::from("memory0"))
            .is_err());
    }

    #[test]
    fn move_process_unknown_name() {
        let mut arch = Architecture::new(
            vec![
                pe("pe0", "add", &[("a0", 0)]),
                pe("pe1", "add", &[("a1", 1)]),
            ],
            vec![],
            4,
        )
        .unwrap();
        assert!(arch
            .move_process(Id::from("zz"), Id::from("pe0"), Id::from("pe1"))
            .is_err());
    }

    #[test]
    fn rejects_double_bound_process() {
        let arch = Architecture::new(
            vec![
                pe("pe0", "add", &[("a0", 0)]),
                pe("pe1", "add", &[("a0", 0)]),
            ],
            vec![],
            4,
        );
        assert!(arch.is_err());
    }
}
