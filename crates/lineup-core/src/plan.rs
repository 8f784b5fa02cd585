//! Layered view of a dependency order.
//!
//! Layer 0 holds entities with no declared dependencies; every other entity
//! sits one layer above the deepest entity it depends on. Everything in one
//! layer is independent of everything else in that layer, so a caller may
//! process a layer's members in any order once earlier layers are done.
//!
//! Dangling dependencies do not raise an entity's layer.

use std::collections::HashMap;

use tracing::instrument;

use crate::error::SortError;
use crate::model::{Dependent, ObjectRef};
use crate::sort::{DependencyGraph, SortOptions, SortedOrder};

/// Group `order` (which must come from `graph`) into layers.
///
/// Members keep their relative position from `order`.
#[must_use]
pub fn layers_of(graph: &DependencyGraph, order: &SortedOrder) -> Vec<Vec<ObjectRef>> {
    let mut depth: HashMap<String, usize> = HashMap::with_capacity(order.len());
    let mut layers: Vec<Vec<ObjectRef>> = Vec::new();

    for entry in order {
        let vertex = graph.vertex_id(entry);
        // Dependencies precede `entry` in `order`, so their depth is known.
        let level = graph
            .dependencies_of(&vertex)
            .filter_map(|dep| depth.get(dep))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);

        if layers.len() <= level {
            layers.resize_with(level + 1, Vec::new);
        }
        layers[level].push(entry.clone());
        depth.insert(vertex, level);
    }

    layers
}

/// Sort `entities` and group the result into layers.
///
/// # Errors
///
/// Fails exactly when [`crate::sort::sort_with`] would.
#[instrument(skip_all)]
pub fn layers<I>(entities: I, options: &SortOptions) -> Result<Vec<Vec<ObjectRef>>, SortError>
where
    I: IntoIterator,
    I::Item: Dependent,
{
    let graph = DependencyGraph::build(entities, options)?;
    let order = graph.order()?;
    Ok(layers_of(&graph, &order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyRef, Resource};

    fn res(name: &str, deps: &[&str]) -> Resource {
        deps.iter().fold(Resource::new("", name), |r, d| {
            r.depends_on(DependencyRef::local(*d))
        })
    }

    fn layer_names(layers: &[Vec<ObjectRef>]) -> Vec<Vec<&str>> {
        layers
            .iter()
            .map(|layer| layer.iter().map(|r| r.name.as_str()).collect())
            .collect()
    }

    #[test]
    fn diamond_has_three_layers() {
        let entities = [
            res("app", &["api", "worker"]),
            res("api", &["db"]),
            res("worker", &["db"]),
            res("db", &[]),
        ];
        let layers = layers(&entities, &SortOptions::default()).expect("acyclic");
        assert_eq!(
            layer_names(&layers),
            vec![vec!["db"], vec!["api", "worker"], vec!["app"]]
        );
    }

    #[test]
    fn independent_entities_share_layer_zero() {
        let layers = layers(&[res("a", &[]), res("b", &[])], &SortOptions::default())
            .expect("acyclic");
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].len(), 2);
    }

    #[test]
    fn dangling_dependency_does_not_raise_layer() {
        let layers = layers(&[res("a", &["ghost"])], &SortOptions::default()).expect("acyclic");
        assert_eq!(layer_names(&layers), vec![vec!["a"]]);
    }

    #[test]
    fn uneven_branches_take_the_deepest_path() {
        // top → mid → base, top → base
        let entities = [res("top", &["mid", "base"]), res("mid", &["base"]), res("base", &[])];
        let layers = layers(&entities, &SortOptions::default()).expect("acyclic");
        assert_eq!(layer_names(&layers), vec![vec!["base"], vec!["mid"], vec!["top"]]);
    }

    #[test]
    fn cycles_propagate_as_errors() {
        let err = layers(&[res("a", &["b"]), res("b", &["a"])], &SortOptions::default())
            .expect_err("cyclic");
        assert!(err.as_cycles().is_some());
    }

    #[test]
    fn empty_input_has_no_layers() {
        let layers = layers(Vec::<Resource>::new(), &SortOptions::default()).expect("acyclic");
        assert!(layers.is_empty());
    }
}
