//! MILP-based resource binding: joint minimum coloring of exclusion graphs.

use crate::{
    ExclusionGraph, IlpConstraint, IlpProblem, IlpSolver, Memory, Process,
    ProcessCollection, ProcessingElement,
};
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};
use takt_utils::{Error, GetName, Id, NameGenerator, TaktResult};

/// One exclusion graph to color, with an optional cap on the number of
/// physical resources available for it.
pub struct GraphBinding {
    pub graph: ExclusionGraph,
    pub cap: Option<u64>,
}

impl GraphBinding {
    pub fn new(graph: ExclusionGraph) -> Self {
        GraphBinding { graph, cap: None }
    }

    pub fn with_cap(graph: ExclusionGraph, cap: u64) -> Self {
        GraphBinding {
            graph,
            cap: Some(cap),
        }
    }
}

/// A graph prepared for the joint formulation: deterministic node order,
/// edge list, color budget and variable offsets.
struct PreparedGraph {
    nodes: Vec<Id>,
    edges: Vec<(usize, usize)>,
    clique: Vec<usize>,
    /// Color budget: the caller's cap when one was supplied, the greedy
    /// heuristic bound otherwise.
    colors: usize,
    /// Variable index of `x[node 0][color 0]`; `x[i][k]` lives at
    /// `x_offset + i * colors + k`.
    x_offset: usize,
    /// Variable index of `c[color 0]`.
    c_offset: usize,
}

impl PreparedGraph {
    fn x(&self, node: usize, color: usize) -> usize {
        self.x_offset + node * self.colors + color
    }

    fn c(&self, color: usize) -> usize {
        self.c_offset + color
    }
}

fn prepare(
    binding: &GraphBinding,
    next_var: &mut usize,
) -> TaktResult<PreparedGraph> {
    let graph = &binding.graph;
    if graph.node_count() == 0 {
        return Err(Error::malformed_structure(
            "cannot bind an empty process collection",
        ));
    }
    let nodes = graph.nodes();
    let index_of: BTreeMap<Id, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (*n, i))
        .collect();
    let edges = nodes
        .iter()
        .enumerate()
        .tuple_combinations()
        .filter(|((_, a), (_, b))| graph.has_edge(**a, **b))
        .map(|((i, _), (j, _))| (i, j))
        .collect_vec();
    // Cap if the caller supplied one, heuristic bound otherwise. Never more
    // colors than nodes.
    let colors = binding
        .cap
        .map(|c| c as usize)
        .unwrap_or_else(|| graph.color_bound())
        .clamp(1, nodes.len());
    let clique = graph
        .max_clique()
        .into_iter()
        .map(|n| index_of[&n])
        .take(colors)
        .collect_vec();
    let x_offset = *next_var;
    let c_offset = x_offset + nodes.len() * colors;
    *next_var = c_offset + colors;
    Ok(PreparedGraph {
        nodes,
        edges,
        clique,
        colors,
        x_offset,
        c_offset,
    })
}

/// Build the joint coloring MILP over all prepared graphs as plain data.
fn formulate(graphs: &[PreparedGraph], num_vars: usize) -> IlpProblem {
    let mut problem = IlpProblem::new(num_vars);
    for g in graphs {
        // minimize the total number of colors used
        for k in 0..g.colors {
            problem.objective[g.c(k)] = 1.0;
        }
        // every node gets exactly one color
        for i in 0..g.nodes.len() {
            let terms =
                (0..g.colors).map(|k| (g.x(i, k), 1.0)).collect_vec();
            problem.constraints.push(IlpConstraint::eq(terms, 1.0));
        }
        // adjacent nodes never share a color
        for &(i, j) in &g.edges {
            for k in 0..g.colors {
                problem.constraints.push(IlpConstraint::less_eq(
                    vec![(g.x(i, k), 1.0), (g.x(j, k), 1.0)],
                    1.0,
                ));
            }
        }
        // a color is used as soon as any node has it
        for i in 0..g.nodes.len() {
            for k in 0..g.colors {
                problem.constraints.push(IlpConstraint::less_eq(
                    vec![(g.x(i, k), 1.0), (g.c(k), -1.0)],
                    0.0,
                ));
            }
        }
        // colors are used in index order (symmetry breaking)
        for k in 0..g.colors.saturating_sub(1) {
            problem.constraints.push(IlpConstraint::less_eq(
                vec![(g.c(k + 1), 1.0), (g.c(k), -1.0)],
                0.0,
            ));
        }
        // pin one maximal clique to distinct colors (valid lower bound,
        // kills permutation symmetry among its members)
        for (k, &i) in g.clique.iter().enumerate() {
            problem
                .constraints
                .push(IlpConstraint::eq(vec![(g.x(i, k), 1.0)], 1.0));
            problem
                .constraints
                .push(IlpConstraint::eq(vec![(g.c(k), 1.0)], 1.0));
        }
    }
    problem
}

/// Split a graph's collection along the solved coloring, with colors
/// renumbered densely in index order.
fn collections_per_color(
    g: &PreparedGraph,
    collection: &ProcessCollection,
    values: &[bool],
) -> TaktResult<Vec<ProcessCollection>> {
    let mut color_of: BTreeMap<Id, usize> = BTreeMap::new();
    for (i, node) in g.nodes.iter().enumerate() {
        let color = (0..g.colors)
            .find(|&k| values[g.x(i, k)])
            .ok_or_else(|| {
                Error::internal(format!(
                    "solver assigned no color to process `{node}'"
                ))
            })?;
        color_of.insert(*node, color);
    }
    let used: Vec<usize> =
        color_of.values().copied().unique().sorted().collect();
    let mut out = Vec::with_capacity(used.len());
    for color in used {
        let processes: Vec<Process> = collection
            .iter()
            .filter(|p| color_of[&p.name()] == color)
            .cloned()
            .collect();
        out.push(ProcessCollection::from_processes(
            processes,
            collection.schedule_time(),
        )?);
    }
    Ok(out)
}

fn check_execution_times(collection: &ProcessCollection) -> TaktResult<()> {
    for p in collection.iter() {
        if p.execution_time() > collection.schedule_time() {
            return Err(Error::infeasible(format!(
                "execution time greater than the schedule time for \
                 process `{}' ({} > {})",
                p.name(),
                p.execution_time(),
                collection.schedule_time()
            )));
        }
    }
    Ok(())
}

/// Jointly bind operator processes to processing elements and memory
/// variables to memories, minimizing the total resource count.
///
/// Each operator-type graph yields one [ProcessingElement] per color; the
/// memory graph yields one [Memory] per color. Caps are respected when
/// supplied; the solver's failure to prove optimality is surfaced as an
/// infeasibility error without retrying.
pub fn bind(
    operator_graphs: Vec<GraphBinding>,
    memory_graph: Option<GraphBinding>,
    solver: &dyn IlpSolver,
) -> TaktResult<(Vec<ProcessingElement>, Vec<Memory>)> {
    // Pre-flight: intervals must fit the period, and each operator graph
    // must be homogeneous in operator type.
    for binding in &operator_graphs {
        let collection = binding.graph.collection();
        check_execution_times(collection)?;
        let types: HashSet<Option<Id>> =
            collection.iter().map(|p| p.type_name()).collect();
        if types.len() > 1 {
            return Err(Error::malformed_structure(
                "an operator exclusion graph must hold a single operator \
                 type",
            ));
        }
    }
    if let Some(binding) = &memory_graph {
        check_execution_times(binding.graph.collection())?;
    }

    let mut next_var = 0;
    let prepared: Vec<PreparedGraph> = operator_graphs
        .iter()
        .chain(memory_graph.iter())
        .map(|b| prepare(b, &mut next_var))
        .collect::<TaktResult<_>>()?;

    let problem = formulate(&prepared, next_var);
    log::info!(
        "binding MILP: {} graphs, {} variables, {} constraints",
        prepared.len(),
        problem.num_vars,
        problem.constraints.len()
    );
    let solution = solver.solve(&problem)?;

    let mut namegen = NameGenerator::default();
    let mut pes = Vec::new();
    let mut memories = Vec::new();
    let (op_prepared, mem_prepared) = prepared.split_at(operator_graphs.len());
    for (binding, g) in operator_graphs.iter().zip(op_prepared) {
        let parts = collections_per_color(
            g,
            binding.graph.collection(),
            &solution.values,
        )?;
        for part in parts {
            let type_name = part
                .iter()
                .next()
                .and_then(|p| p.type_name())
                .map(|t| format!("{t}_pe"))
                .unwrap_or_else(|| "pe".to_string());
            let name = namegen.gen_name(type_name);
            pes.push(ProcessingElement::new(name, part)?);
        }
    }
    if let (Some(binding), [g]) = (&memory_graph, mem_prepared) {
        let parts = collections_per_color(
            g,
            binding.graph.collection(),
            &solution.values,
        )?;
        for part in parts {
            let name = namegen.gen_name("memory");
            memories.push(Memory::new(name, part)?);
        }
    }
    log::info!(
        "binding result: {} processing elements, {} memories",
        pes.len(),
        memories.len()
    );
    Ok((pes, memories))
}
