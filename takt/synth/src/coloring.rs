use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::hash::Hash;
use takt_utils::WeightGraph;

/// Greedy graph-coloring over a conflict graph.
///
/// The heuristic is saturation-ordered (DSATUR): repeatedly color the node
/// whose colored neighborhood uses the most distinct colors, breaking ties
/// by degree and then by node order, and give it the smallest color not
/// used by a neighbor. The result is a proper coloring and a valid upper
/// bound on the chromatic number; the MILP binder uses it to bound its
/// search space, the split operations use it directly.
pub struct GraphColoring<T> {
    graph: WeightGraph<T>,
}

impl<T, C> From<C> for GraphColoring<T>
where
    T: Hash + Eq + Ord,
    C: Iterator<Item = T>,
{
    fn from(nodes: C) -> Self {
        let graph = WeightGraph::from(nodes);
        GraphColoring { graph }
    }
}

impl<T> GraphColoring<T>
where
    T: Hash + Eq + Ord + Clone,
{
    /// Add a conflict edge between `a` and `b`.
    #[inline(always)]
    pub fn insert_conflict(&mut self, a: &T, b: &T) {
        self.graph.add_edge(a, b);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn has_conflict(&self, a: &T, b: &T) -> bool {
        self.graph.has_edge(a, b)
    }

    pub fn degree(&self, node: &T) -> usize {
        self.graph.degree(node)
    }

    /// Nodes in deterministic (sorted) order.
    pub fn nodes(&self) -> Vec<T> {
        self.graph.nodes().cloned().sorted().collect()
    }

    /// Color the graph greedily. Returns a proper coloring with colors
    /// numbered densely from 0.
    pub fn color_greedy(&self) -> BTreeMap<T, usize> {
        let nodes = self.nodes();
        let mut coloring: BTreeMap<T, usize> = BTreeMap::new();
        while coloring.len() < nodes.len() {
            // most saturated uncolored node, ties broken by degree then order
            let next = nodes
                .iter()
                .filter(|n| !coloring.contains_key(*n))
                .max_by_key(|n| {
                    let saturation = nodes
                        .iter()
                        .filter(|m| {
                            *m != *n
                                && self.has_conflict(n, m)
                                && coloring.contains_key(*m)
                        })
                        .map(|m| coloring[m])
                        .unique()
                        .count();
                    (saturation, self.degree(n), std::cmp::Reverse(*n))
                })
                .expect("uncolored node exists")
                .clone();
            let neighbor_colors: Vec<usize> = nodes
                .iter()
                .filter(|m| **m != next && self.has_conflict(&next, m))
                .filter_map(|m| coloring.get(m).copied())
                .collect();
            let color = (0..)
                .find(|c| !neighbor_colors.contains(c))
                .expect("some color is free");
            coloring.insert(next, color);
        }
        coloring
    }

    /// Number of colors a greedy coloring uses: an upper bound on the
    /// number of resources needed for this graph.
    pub fn color_bound(&self) -> usize {
        self.color_greedy()
            .values()
            .copied()
            .max()
            .map_or(0, |c| c + 1)
    }

    /// A maximal clique, grown greedily from the highest-degree node.
    /// Its size is a lower bound on the number of resources needed.
    pub fn max_clique(&self) -> Vec<T> {
        let order = self
            .nodes()
            .into_iter()
            .sorted_by_key(|n| std::cmp::Reverse(self.degree(n)))
            .collect::<Vec<_>>();
        let mut clique: Vec<T> = Vec::new();
        for node in order {
            if clique.iter().all(|m| self.has_conflict(&node, m)) {
                clique.push(node);
            }
        }
        clique
    }
}

impl<T: Hash + Eq + Ord + Clone + Display> Display for GraphColoring<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.graph.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::GraphColoring;
    use itertools::Itertools;

    fn coloring_is_proper(g: &GraphColoring<u32>) {
        let colors = g.color_greedy();
        for (a, b) in g.nodes().into_iter().tuple_combinations() {
            if g.has_conflict(&a, &b) {
                assert_ne!(colors[&a], colors[&b]);
            }
        }
    }

    #[test]
    fn triangle_needs_three_colors() {
        let mut g = GraphColoring::from(0u32..3);
        g.insert_conflict(&0, &1);
        g.insert_conflict(&1, &2);
        g.insert_conflict(&0, &2);
        coloring_is_proper(&g);
        assert_eq!(g.color_bound(), 3);
        assert_eq!(g.max_clique().len(), 3);
    }

    #[test]
    fn path_needs_two_colors() {
        let mut g = GraphColoring::from(0u32..4);
        g.insert_conflict(&0, &1);
        g.insert_conflict(&1, &2);
        g.insert_conflict(&2, &3);
        coloring_is_proper(&g);
        assert_eq!(g.color_bound(), 2);
    }

    #[test]
    fn edgeless_graph_uses_one_color() {
        let g = GraphColoring::from(0u32..5);
        assert_eq!(g.color_bound(), 1);
    }
}
