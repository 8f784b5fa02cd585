//! Dependency-ordered sorting of [`Dependent`] entities.
//!
//! # Overview
//!
//! Entities are turned into a directed graph where an edge `a → b` means
//! "`a` depends on `b`". The SCC engine partitions that graph; because it
//! emits components targets-first, the acyclic singletons come out in an
//! order where every dependency precedes its dependents.
//!
//! ## Pipeline
//!
//! ```text
//! entities (impl Dependent)
//!        ↓  DependencyGraph::build()
//! Graph (vertex id → dependency ids) + vertex id → ObjectRef table
//!        ↓  scc::strongly_connected_components()
//! SCCs, targets first
//!        ↓  DependencyGraph::order()
//! SortedOrder  |  CycleError (every cycle, outermost first)
//! ```
//!
//! ## Dangling References
//!
//! A dependency naming an entity that was never declared still becomes an
//! edge, and its target still takes part in the SCC pass, but it never
//! produces an output entry. In [`SortOptions::strict`] mode such references
//! are rejected up front instead.
//!
//! ## Typical Usage
//!
//! ```rust
//! use lineup_core::model::{DependencyRef, Resource};
//! use lineup_core::sort::sort;
//!
//! let entities = vec![
//!     Resource::new("apps", "web").depends_on(DependencyRef::local("db")),
//!     Resource::new("apps", "db"),
//! ];
//! let order = sort(&entities).expect("acyclic");
//! let names: Vec<_> = order.iter().map(|r| r.name.as_str()).collect();
//! assert_eq!(names, ["db", "web"]);
//! ```

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{CycleError, SortError, UnresolvedReference};
use crate::graph::scc::{Graph, is_cyclic, strongly_connected_components};
use crate::model::{DEFAULT_SEPARATOR, Dependent, ObjectRef};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs for graph construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptions {
    /// Placed between namespace and name in vertex identifiers.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Reject dangling references and duplicate identities instead of
    /// ignoring or merging them.
    #[serde(default)]
    pub strict: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            strict: false,
        }
    }
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// The "depends on" graph built from one set of entities.
///
/// Built fresh for every sort; nothing is shared between runs.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: Graph,
    /// Vertex id → declared identity. Dangling targets have no entry.
    origins: BTreeMap<String, ObjectRef>,
    separator: String,
    content_hash: String,
}

impl DependencyGraph {
    /// Build the graph for `entities`.
    ///
    /// Every entity contributes a vertex, even one with no dependencies.
    /// Unqualified references resolve to the declaring entity's namespace.
    ///
    /// # Errors
    ///
    /// Only in strict mode: [`SortError::DuplicateEntity`] for the first
    /// identity declared twice, or [`SortError::UnresolvedReferences`]
    /// listing every reference to an undeclared entity.
    #[instrument(skip_all, fields(strict = options.strict))]
    pub fn build<I>(entities: I, options: &SortOptions) -> Result<Self, SortError>
    where
        I: IntoIterator,
        I::Item: Dependent,
    {
        let separator = options.separator.as_str();
        let mut graph = Graph::new();
        let mut origins: BTreeMap<String, ObjectRef> = BTreeMap::new();
        let mut references: Vec<(ObjectRef, ObjectRef, String)> = Vec::new();

        for entity in entities {
            let identity = entity.object_ref();
            let vertex = identity.vertex_id(separator);

            if origins.contains_key(&vertex) {
                if options.strict {
                    return Err(SortError::DuplicateEntity {
                        entity: identity,
                        vertex,
                    });
                }
                debug!(%vertex, "duplicate declaration; merging dependencies");
            }

            let edges = graph.entry(vertex.clone()).or_default();
            for dependency in entity.dependencies() {
                let target = dependency.resolve_with(&identity.namespace, separator);
                let target_id = target.vertex_id(separator);
                edges.insert(target_id.clone());
                references.push((identity.clone(), target, target_id));
            }

            origins.insert(vertex, identity);
        }

        let unresolved: Vec<UnresolvedReference> = references
            .into_iter()
            .filter(|(_, _, target_id)| !origins.contains_key(target_id))
            .map(|(from, missing, _)| UnresolvedReference::new(from, missing, separator))
            .collect();

        if !unresolved.is_empty() {
            if options.strict {
                return Err(SortError::UnresolvedReferences(unresolved));
            }
            for reference in &unresolved {
                warn!(from = %reference.from_id, missing = %reference.missing_id, "ignoring dependency on undeclared entity");
            }
        }

        let content_hash = compute_graph_hash(&graph);
        debug!(
            vertices = graph.len(),
            edges = graph.values().map(BTreeSet::len).sum::<usize>(),
            "built dependency graph"
        );

        Ok(Self {
            graph,
            origins,
            separator: options.separator.clone(),
            content_hash,
        })
    }

    /// Compute the dependency order, or every cycle that prevents one.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError`] carrying all cycle groups when any exist. No
    /// partial order is returned alongside it.
    #[instrument(skip_all)]
    pub fn order(&self) -> Result<SortedOrder, CycleError> {
        let (sorted, cycles) = self.partition();
        if cycles.is_empty() {
            Ok(SortedOrder { entries: sorted })
        } else {
            Err(CycleError { cycles })
        }
    }

    /// All cycle groups, outermost first. Empty when the graph is acyclic.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.partition().1
    }

    fn partition(&self) -> (Vec<ObjectRef>, Vec<Vec<String>>) {
        let components = strongly_connected_components(&self.graph);
        debug!(components = components.len(), "computed strongly connected components");

        let mut sorted = Vec::with_capacity(self.origins.len());
        let mut cycles = Vec::new();

        for component in components {
            if is_cyclic(&self.graph, &component) {
                cycles.push(component);
            } else if let [vertex] = component.as_slice() {
                if let Some(origin) = self.origins.get(vertex) {
                    sorted.push(origin.clone());
                }
            }
        }

        // Completion order finds the innermost cycle first; report the
        // outermost first.
        cycles.reverse();
        (sorted, cycles)
    }

    /// The raw adjacency map.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Declared identity for a vertex id, if one was declared.
    #[must_use]
    pub fn origin(&self, vertex_id: &str) -> Option<&ObjectRef> {
        self.origins.get(vertex_id)
    }

    /// Vertex id for an identity under this graph's separator.
    #[must_use]
    pub fn vertex_id(&self, identity: &ObjectRef) -> String {
        identity.vertex_id(&self.separator)
    }

    /// Vertex ids that `vertex_id` depends on, including dangling ones.
    pub fn dependencies_of<'a>(&'a self, vertex_id: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.graph
            .get(vertex_id)
            .into_iter()
            .flat_map(|edges| edges.iter().map(String::as_str))
    }

    /// Number of declared entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.origins.len()
    }

    /// Number of vertices, including dangling dependency targets.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let dangling: BTreeSet<&String> = self
            .graph
            .values()
            .flatten()
            .filter(|target| !self.graph.contains_key(*target))
            .collect();
        self.graph.len() + dangling.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.values().map(BTreeSet::len).sum()
    }

    /// BLAKE3 hash of the vertex and edge set (`blake3:<hex>`).
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

/// Hash every vertex with its sorted edge set.
///
/// `Graph` is ordered, so identical graphs hash identically regardless of
/// the order entities were supplied in.
fn compute_graph_hash(graph: &Graph) -> String {
    let mut hasher = blake3::Hasher::new();
    for (vertex, edges) in graph {
        hasher.update(vertex.as_bytes());
        hasher.update(b"\x00");
        for target in edges {
            hasher.update(target.as_bytes());
            hasher.update(b"\x00");
        }
        hasher.update(b"\x01");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// SortedOrder
// ---------------------------------------------------------------------------

/// A complete dependency order: each entry appears after everything it
/// depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct SortedOrder {
    entries: Vec<ObjectRef>,
}

impl SortedOrder {
    pub fn iter(&self) -> std::slice::Iter<'_, ObjectRef> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of `identity` in the order.
    #[must_use]
    pub fn position(&self, identity: &ObjectRef) -> Option<usize> {
        self.entries.iter().position(|entry| entry == identity)
    }

    /// The reverse order: dependents before their dependencies, as needed
    /// when tearing things down.
    #[must_use]
    pub fn teardown(&self) -> Self {
        Self {
            entries: self.entries.iter().rev().cloned().collect(),
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ObjectRef] {
        &self.entries
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ObjectRef> {
        self.entries
    }
}

impl IntoIterator for SortedOrder {
    type Item = ObjectRef;
    type IntoIter = std::vec::IntoIter<ObjectRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a SortedOrder {
    type Item = &'a ObjectRef;
    type IntoIter = std::slice::Iter<'a, ObjectRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Sort `entities` with default options.
///
/// # Errors
///
/// Returns [`SortError::Cycle`] if any dependency cycle exists.
pub fn sort<I>(entities: I) -> Result<SortedOrder, SortError>
where
    I: IntoIterator,
    I::Item: Dependent,
{
    sort_with(entities, &SortOptions::default())
}

/// Sort `entities` with explicit options.
///
/// # Errors
///
/// Returns [`SortError::Cycle`] if any dependency cycle exists, or a strict
/// mode violation when [`SortOptions::strict`] is set.
pub fn sort_with<I>(entities: I, options: &SortOptions) -> Result<SortedOrder, SortError>
where
    I: IntoIterator,
    I::Item: Dependent,
{
    let graph = DependencyGraph::build(entities, options)?;
    Ok(graph.order()?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
