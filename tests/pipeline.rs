//! End-to-end runs of the synthesis pipeline: JSON description in,
//! scheduled and bound architecture out.

use takt_ir::{GraphDesc, PortRef};
use takt_sched::Schedule;
use takt_synth::{
    bind, create_exclusion_graph_from_execution_time,
    create_exclusion_graph_from_ports, Architecture, GoodLpSolver,
    GraphBinding, OperatorProcess, PortBudget, Process, ProcessCollection,
    StorageAllocation,
};

fn fir_desc() -> GraphDesc {
    serde_json::from_str(
        r#"{
          "operators": [
            {"name": "in", "type": "input", "outputs": [0], "execution_time": 0},
            {"name": "cmul", "type": "cmul", "inputs": [0], "outputs": [1], "execution_time": 1},
            {"name": "t", "type": "delay", "inputs": [0], "outputs": [0], "execution_time": 0},
            {"name": "add", "type": "add", "inputs": [0, 0], "outputs": [1], "execution_time": 1},
            {"name": "out", "type": "output", "inputs": [0], "execution_time": 0}
          ],
          "signals": [
            {"from": ["in", 0], "to": ["cmul", 0]},
            {"from": ["in", 0], "to": ["t", 0]},
            {"from": ["cmul", 0], "to": ["add", 0]},
            {"from": ["t", 0], "to": ["add", 1]},
            {"from": ["add", 0], "to": ["out", 0]}
          ]
        }"#,
    )
    .unwrap()
}

#[test]
fn fir_asap_start_times_and_slack() {
    let graph = fir_desc().into_graph().unwrap();
    let mut schedule = Schedule::asap(graph, Some(4), true).unwrap();
    assert_eq!(schedule.start_time("in"), Some(0));
    assert_eq!(schedule.start_time("cmul"), Some(0));
    assert_eq!(schedule.start_time("t"), Some(0));
    assert_eq!(schedule.start_time("add"), Some(1));
    assert_eq!(schedule.start_time("out"), Some(2));
    // add's completion feeds out's fixed start directly.
    assert!(schedule.move_operation("add", 1).is_err());
}

fn cmul_pair(starts: [u64; 2], execution_time: u64) -> ProcessCollection {
    let processes = starts.iter().enumerate().map(|(i, &start)| {
        Process::Operator(OperatorProcess {
            name: format!("cmul{i}").into(),
            start_time: start,
            execution_time,
            operator: format!("cmul{i}").into(),
            type_name: "cmul".into(),
        })
    });
    ProcessCollection::from_processes(processes, 2).unwrap()
}

#[test]
fn disjoint_intervals_share_one_pe() {
    let collection = cmul_pair([0, 1], 1);
    let graph = create_exclusion_graph_from_execution_time(&collection);
    let (pes, memories) =
        bind(vec![GraphBinding::new(graph)], None, &GoodLpSolver).unwrap();
    assert!(memories.is_empty());
    assert_eq!(pes.len(), 1);
    assert_eq!(pes[0].entity_name(), "cmul_pe0");
    assert_eq!(pes[0].collection().len(), 2);
}

#[test]
fn overlapping_intervals_need_two_pes() {
    let collection = cmul_pair([0, 0], 2);
    let graph = create_exclusion_graph_from_execution_time(&collection);
    let (pes, _) =
        bind(vec![GraphBinding::new(graph)], None, &GoodLpSolver).unwrap();
    assert_eq!(pes.len(), 2);
}

/// Full pipeline over a delay-free chain: schedule, retime one operator
/// to create a stored value, bind operators and memories jointly, and
/// allocate a register table.
#[test]
fn chain_to_architecture() {
    let mut b = takt_ir::Builder::new();
    b.input("in").unwrap();
    b.unary("a", "add", 1, 1, PortRef::new("in", 0)).unwrap();
    b.unary("b", "add", 1, 1, PortRef::new("a", 0)).unwrap();
    b.output("out", PortRef::new("b", 0)).unwrap();
    let mut schedule =
        Schedule::asap(b.finish(), Some(5), false).unwrap();
    schedule.move_operation("out", 2).unwrap();

    let operators = schedule.operator_processes().unwrap();
    let mut operator_graphs = Vec::new();
    for (_, collection) in operators.split_on_type_name() {
        operator_graphs.push(GraphBinding::new(
            create_exclusion_graph_from_execution_time(&collection),
        ));
    }

    let (wires, stored) =
        schedule.memory_variables().unwrap().split_on_length(0);
    // Only b's output outlives its cycle after the retiming.
    assert_eq!(stored.len(), 1);
    assert!(stored.contains("b.out0"));
    assert_eq!(wires.len() + stored.len(), 3);

    let budget = PortBudget::new(None, None, Some(1)).unwrap();
    let memory_graph = GraphBinding::new(
        create_exclusion_graph_from_ports(&stored, budget).unwrap(),
    );
    let (pes, mut memories) =
        bind(operator_graphs, Some(memory_graph), &GoodLpSolver).unwrap();

    // The two adders run in cycles [0,1) and [1,2): one shared unit.
    let adders: Vec<_> = pes
        .iter()
        .filter(|pe| pe.type_name() == "add")
        .collect();
    assert_eq!(adders.len(), 1);
    assert_eq!(adders[0].collection().len(), 2);

    assert_eq!(memories.len(), 1);
    let table = memories[0].allocate_registers().unwrap().clone();
    assert_eq!(table.len(), 5);
    assert_eq!(table.register_count(), 1);

    let architecture =
        Architecture::new(pes, memories, schedule.schedule_time()).unwrap();
    assert_eq!(architecture.schedule_time(), 5);
    let memory = &architecture.memories()[0];
    assert!(matches!(
        memory.storage(),
        Some(StorageAllocation::Registers(_))
    ));
    // Plain data: the result round-trips through serde.
    serde_json::to_string(&architecture).unwrap();
}

#[test]
fn binding_is_deterministic_across_runs() {
    let graph = fir_desc().into_graph().unwrap();
    let schedule = Schedule::asap(graph, Some(4), true).unwrap();
    let run = || {
        let operators = schedule.operator_processes().unwrap();
        let mut graphs = Vec::new();
        for (_, collection) in operators.split_on_type_name() {
            graphs.push(GraphBinding::new(
                create_exclusion_graph_from_execution_time(&collection),
            ));
        }
        let (pes, memories) = bind(graphs, None, &GoodLpSolver).unwrap();
        let mut sizes: Vec<(String, usize)> = pes
            .iter()
            .map(|pe| (pe.entity_name().to_string(), pe.collection().len()))
            .collect();
        sizes.sort();
        (sizes, memories.len())
    };
    assert_eq!(run(), run());
}

#[test]
fn lifetime_past_the_period_is_infeasible() {
    let graph = fir_desc().into_graph().unwrap();
    let schedule = Schedule::asap(graph, Some(4), true).unwrap();
    let (_, stored) =
        schedule.memory_variables().unwrap().split_on_length(0);
    // The delayed tap lives a full period past its write.
    let tap = stored.get("in.out0").unwrap();
    assert!(tap.execution_time() > 4);
    let budget = PortBudget::new(None, None, Some(2)).unwrap();
    let memory_graph = GraphBinding::new(
        create_exclusion_graph_from_ports(&stored, budget).unwrap(),
    );
    let err =
        bind(vec![], Some(memory_graph), &GoodLpSolver).unwrap_err();
    assert!(err.to_string().contains("schedule time"));
}
