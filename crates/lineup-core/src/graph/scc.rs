//! Strongly connected components via Tarjan's low-link algorithm.
//!
//! # Overview
//!
//! A single depth-first pass assigns every vertex a discovery index and a
//! low-link value (the smallest discovery index reachable from it through its
//! DFS subtree plus one edge back into the active stack). A vertex whose
//! low-link equals its own index roots a component; popping the active stack
//! down to that vertex yields the component's members.
//!
//! # Emission Order
//!
//! Components are returned in completion order. If `a → b` crosses two
//! components, `b`'s component always completes (and is returned) first, so
//! the raw output is already "targets before sources".
//!
//! # Stack Depth
//!
//! Recursion is simulated with an explicit frame stack. Each frame holds the
//! vertex and the position of the next outgoing edge to examine, so long
//! dependency chains cost heap, not thread stack.
//!
//! # Complexity
//!
//! O(V + E) time and space.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};

/// Adjacency map: vertex → set of vertices it points at.
///
/// A vertex that appears only as an edge target is treated as having no
/// outgoing edges. Only keys are used as DFS roots.
pub type AdjacencyMap<N> = BTreeMap<N, BTreeSet<N>>;

/// String-keyed adjacency map used by the dependency sorter.
pub type Graph = AdjacencyMap<String>;

/// Compute the strongly connected components of `graph`.
///
/// Every key of `graph`, and every vertex reachable from a key, appears in
/// exactly one returned component. Members within a component are listed in
/// stack-pop order; callers should treat them as a set.
#[must_use]
pub fn strongly_connected_components<N>(graph: &AdjacencyMap<N>) -> Vec<Vec<N>>
where
    N: Ord + Clone,
{
    let dense = DenseGraph::from_map(graph);
    Tarjan::new(dense.successors.len())
        .run(&dense.successors, graph.len())
        .into_iter()
        .map(|component| {
            component
                .into_iter()
                .map(|v| dense.vertices[v].clone())
                .collect()
        })
        .collect()
}

/// Returns `true` if `vertex` has an edge to itself.
#[must_use]
pub fn has_self_loop<N: Ord>(graph: &AdjacencyMap<N>, vertex: &N) -> bool {
    graph.get(vertex).is_some_and(|edges| edges.contains(vertex))
}

/// Returns `true` if `component` describes a cycle: more than one member, or
/// a single member pointing at itself.
#[must_use]
pub fn is_cyclic<N: Ord>(graph: &AdjacencyMap<N>, component: &[N]) -> bool {
    match component {
        [] => false,
        [only] => has_self_loop(graph, only),
        _ => true,
    }
}

// ---------------------------------------------------------------------------
// Dense representation
// ---------------------------------------------------------------------------

/// The input graph relabelled onto `0..V`.
///
/// Keys take indices `0..graph.len()` in map order; vertices reached only as
/// edge targets are appended after them.
struct DenseGraph<'g, N> {
    vertices: Vec<&'g N>,
    successors: Vec<Vec<usize>>,
}

impl<'g, N: Ord> DenseGraph<'g, N> {
    fn from_map(graph: &'g AdjacencyMap<N>) -> Self {
        let mut vertices: Vec<&'g N> = graph.keys().collect();
        let mut lookup: BTreeMap<&'g N, usize> = vertices
            .iter()
            .enumerate()
            .map(|(idx, v)| (*v, idx))
            .collect();

        let mut successors = Vec::with_capacity(vertices.len());
        for edges in graph.values() {
            let mut out = Vec::with_capacity(edges.len());
            for target in edges {
                let idx = *lookup.entry(target).or_insert_with(|| {
                    vertices.push(target);
                    vertices.len() - 1
                });
                out.push(idx);
            }
            successors.push(out);
        }
        // Dangling targets have no outgoing edges.
        successors.resize_with(vertices.len(), Vec::new);

        Self {
            vertices,
            successors,
        }
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// One simulated call of `strongconnect(vertex)`.
#[derive(Debug, Clone, Copy)]
struct Frame {
    vertex: usize,
    next_edge: usize,
}

struct Tarjan {
    /// Discovery index per vertex; `None` until visited.
    index: Vec<Option<usize>>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl Tarjan {
    fn new(vertex_count: usize) -> Self {
        Self {
            index: vec![None; vertex_count],
            low_link: vec![0; vertex_count],
            on_stack: vec![false; vertex_count],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        }
    }

    /// Run the traversal, using vertices `0..root_count` as DFS roots.
    fn run(mut self, successors: &[Vec<usize>], root_count: usize) -> Vec<Vec<usize>> {
        let mut calls: Vec<Frame> = Vec::new();

        for root in 0..root_count {
            if self.index[root].is_some() {
                continue;
            }

            self.enter(root);
            calls.push(Frame {
                vertex: root,
                next_edge: 0,
            });

            while let Some(frame) = calls.last_mut() {
                let v = frame.vertex;

                if let Some(&w) = successors[v].get(frame.next_edge) {
                    frame.next_edge += 1;
                    match self.index[w] {
                        None => {
                            self.enter(w);
                            calls.push(Frame {
                                vertex: w,
                                next_edge: 0,
                            });
                        }
                        Some(w_index) if self.on_stack[w] => {
                            // Back or cross edge into the active component.
                            self.low_link[v] = self.low_link[v].min(w_index);
                        }
                        Some(_) => {}
                    }
                    continue;
                }

                // All edges of `v` examined: return from its call.
                calls.pop();
                if Some(self.low_link[v]) == self.index[v] {
                    self.close_component(v);
                }
                if let Some(parent) = calls.last() {
                    let p = parent.vertex;
                    self.low_link[p] = self.low_link[p].min(self.low_link[v]);
                }
            }
        }

        self.components
    }

    fn enter(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.low_link[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }

    fn close_component(&mut self, root: usize) {
        let mut component = Vec::new();
        while let Some(w) = self.stack.pop() {
            self.on_stack[w] = false;
            component.push(w);
            if w == root {
                break;
            }
        }
        self.components.push(component);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&'static str, &[&'static str])]) -> AdjacencyMap<&'static str> {
        edges
            .iter()
            .map(|(from, to)| (*from, to.iter().copied().collect()))
            .collect()
    }

    fn as_sets(components: &[Vec<&'static str>]) -> Vec<BTreeSet<&'static str>> {
        components
            .iter()
            .map(|c| c.iter().copied().collect())
            .collect()
    }

    fn position_of(components: &[Vec<&'static str>], vertex: &str) -> usize {
        components
            .iter()
            .position(|c| c.contains(&vertex))
            .expect("vertex present in some component")
    }

    #[test]
    fn empty_graph_has_no_components() {
        let g: AdjacencyMap<&str> = AdjacencyMap::new();
        assert!(strongly_connected_components(&g).is_empty());
    }

    #[test]
    fn isolated_vertices_are_singletons() {
        let g = graph(&[("a", &[]), ("b", &[]), ("c", &[])]);
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs.len(), 3);
        assert!(sccs.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn chain_emits_targets_first() {
        let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs, vec![vec!["c"], vec!["b"], vec!["a"]]);
    }

    #[test]
    fn three_cycle_is_one_component() {
        let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs.len(), 1);
        assert_eq!(as_sets(&sccs)[0], BTreeSet::from(["a", "b", "c"]));
    }

    #[test]
    fn self_loop_is_singleton_but_cyclic() {
        let g = graph(&[("a", &["a"]), ("b", &[])]);
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs.len(), 2);
        assert!(has_self_loop(&g, &"a"));
        assert!(is_cyclic(&g, &["a"]));
        assert!(!is_cyclic(&g, &["b"]));
    }

    #[test]
    fn dangling_target_is_visited_as_singleton() {
        let g = graph(&[("a", &["ghost"])]);
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs, vec![vec!["ghost"], vec!["a"]]);
    }

    #[test]
    fn downstream_component_precedes_upstream_component() {
        // {a,b} cycle depends on {c,d} cycle.
        let g = graph(&[
            ("a", &["b"]),
            ("b", &["a", "c"]),
            ("c", &["d"]),
            ("d", &["c"]),
        ]);
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs.len(), 2);
        assert!(position_of(&sccs, "c") < position_of(&sccs, "a"));
        assert_eq!(
            as_sets(&sccs),
            vec![BTreeSet::from(["c", "d"]), BTreeSet::from(["a", "b"])]
        );
    }

    #[test]
    fn cross_edge_to_finished_component_does_not_merge() {
        // a → b, a → c, c → b. b finishes before c is entered.
        let g = graph(&[("a", &["b", "c"]), ("b", &[]), ("c", &["b"])]);
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs.len(), 3);
        assert!(position_of(&sccs, "b") < position_of(&sccs, "c"));
        assert!(position_of(&sccs, "c") < position_of(&sccs, "a"));
    }

    #[test]
    fn nested_cycles_collapse_together() {
        // a → b → c → a plus c → d → c.
        let g = graph(&[
            ("a", &["b"]),
            ("b", &["c"]),
            ("c", &["a", "d"]),
            ("d", &["c"]),
        ]);
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 4);
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let n = 200_000_usize;
        let g: AdjacencyMap<usize> = (0..n)
            .map(|i| {
                let edges = if i + 1 < n {
                    BTreeSet::from([i + 1])
                } else {
                    BTreeSet::new()
                };
                (i, edges)
            })
            .collect();
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs.len(), n);
        assert_eq!(sccs.first(), Some(&vec![n - 1]));
        assert_eq!(sccs.last(), Some(&vec![0]));
    }

    #[test]
    fn long_ring_is_single_component() {
        let n = 50_000_usize;
        let g: AdjacencyMap<usize> = (0..n).map(|i| (i, BTreeSet::from([(i + 1) % n]))).collect();
        let sccs = strongly_connected_components(&g);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), n);
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let g = graph(&[
            ("a", &["b", "x"]),
            ("b", &["a"]),
            ("c", &["d"]),
            ("d", &[]),
            ("x", &["x"]),
        ]);
        assert_eq!(
            strongly_connected_components(&g),
            strongly_connected_components(&g)
        );
    }
}
