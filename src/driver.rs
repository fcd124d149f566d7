//! Driver for the takt synthesis pipeline.
use crate::cmdline::Opts;
use std::io::{BufReader, Write};
use takt_ir::GraphDesc;
use takt_sched::Schedule;
use takt_synth::{
    bind, create_exclusion_graph_from_execution_time,
    create_exclusion_graph_from_ports, Architecture, GoodLpSolver,
    GraphBinding, PortBudget,
};
use takt_utils::{Error, TaktResult};

/// Run the synthesis pipeline from the command line.
pub fn run_pipeline() -> TaktResult<()> {
    let opts: Opts = argh::from_env();

    // enable tracing
    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(opts.log_level)
        .target(env_logger::Target::Stderr)
        .init();

    let file = std::fs::File::open(&opts.file).map_err(|err| {
        Error::invalid_file(format!(
            "cannot open {}: {err}",
            opts.file.display()
        ))
    })?;
    let desc: GraphDesc = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| {
            Error::parse_error(format!(
                "{}: {err}",
                opts.file.display()
            ))
        })?;
    let graph = desc.into_graph()?;

    let schedule =
        Schedule::asap(graph, opts.schedule_time, !opts.non_cyclic)?;
    log::info!(
        "scheduled with period {} (critical path {})",
        schedule.schedule_time(),
        schedule.critical_path_time()
    );

    // One exclusion graph per operator type; the binder colors them
    // jointly so the resource total is minimized across types.
    let operators = schedule.operator_processes()?;
    let mut operator_graphs = Vec::new();
    for (type_name, collection) in operators.split_on_type_name() {
        log::debug!(
            "operator type `{type_name}': {} executions",
            collection.len()
        );
        let graph = create_exclusion_graph_from_execution_time(&collection);
        operator_graphs.push(match opts.pe_cap {
            Some(cap) => GraphBinding::with_cap(graph, cap),
            None => GraphBinding::new(graph),
        });
    }

    let variables = schedule.memory_variables()?;
    let (wires, stored) = variables.split_on_length(opts.wire_threshold);
    if !wires.is_empty() {
        log::info!("{} values stay wires", wires.len());
    }
    let memory_graph = if stored.is_empty() {
        None
    } else {
        let budget = if opts.read_ports.is_none()
            && opts.write_ports.is_none()
            && opts.total_ports.is_none()
        {
            PortBudget::new(None, None, Some(1))?
        } else {
            PortBudget::new(
                opts.read_ports,
                opts.write_ports,
                opts.total_ports,
            )?
        };
        let graph = create_exclusion_graph_from_ports(&stored, budget)?;
        Some(match opts.memory_cap {
            Some(cap) => GraphBinding::with_cap(graph, cap),
            None => GraphBinding::new(graph),
        })
    };

    let (processing_elements, mut memories) =
        bind(operator_graphs, memory_graph, &GoodLpSolver)?;
    for memory in &mut memories {
        if opts.banked {
            memory.allocate_banked(
                opts.adr_mux_size,
                opts.adr_pipe_depth,
                opts.registered_input,
            )?;
        } else {
            memory.allocate_registers()?;
        }
    }

    let architecture = Architecture::new(
        processing_elements,
        memories,
        schedule.schedule_time(),
    )?;
    let rendered = serde_json::to_string_pretty(&architecture)
        .map_err(|err| Error::internal(err.to_string()))?;
    match &opts.output {
        Some(path) => {
            let mut out = std::fs::File::create(path)?;
            writeln!(out, "{rendered}")?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
