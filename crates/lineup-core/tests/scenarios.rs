//! Known-topology regression tests for the sorter.
//!
//! Each test uses a hand-written entity set whose valid orders (or cycles)
//! are known in advance. Where several orders are valid, the assertions
//! accept all of them.

use std::collections::BTreeSet;

use lineup_core::plan::layers;
use lineup_core::{
    DependencyGraph, DependencyRef, Dependent, ObjectRef, SortError, SortOptions, sort, sort_with,
};

// ---------------------------------------------------------------------------
// A caller-owned entity type
// ---------------------------------------------------------------------------

/// Stand-in for a caller's own object type: only the trait is required.
#[derive(Debug)]
struct Service {
    namespace: &'static str,
    name: &'static str,
    needs: Vec<DependencyRef>,
}

impl Service {
    fn new(namespace: &'static str, name: &'static str) -> Self {
        Self {
            namespace,
            name,
            needs: Vec::new(),
        }
    }

    fn needs(mut self, name: &str) -> Self {
        self.needs.push(match name.split_once('/') {
            Some((ns, n)) => DependencyRef::qualified(ns, n),
            None => DependencyRef::local(name),
        });
        self
    }
}

impl Dependent for Service {
    fn namespace(&self) -> &str {
        self.namespace
    }

    fn name(&self) -> &str {
        self.name
    }

    fn dependencies(&self) -> &[DependencyRef] {
        &self.needs
    }
}

fn obj(namespace: &str, name: &str) -> ObjectRef {
    ObjectRef::new(namespace, name)
}

fn member_set(group: &[String]) -> BTreeSet<&str> {
    group.iter().map(String::as_str).collect()
}

// ===========================================================================
// Topology 1: single entity
// ===========================================================================

#[test]
fn lone_entity_sorts_to_itself() {
    let order = sort(&[Service::new("", "A")]).expect("acyclic");
    assert_eq!(order.into_vec(), vec![obj("", "A")]);
}

// ===========================================================================
// Topology 2: three-cycle A → B → C → A
// ===========================================================================

#[test]
fn three_cycle_yields_one_group_of_three() {
    let entities = [
        Service::new("", "A").needs("B"),
        Service::new("", "B").needs("C"),
        Service::new("", "C").needs("A"),
    ];
    let err = sort(&entities).expect_err("cyclic");
    let SortError::Cycle(report) = err else {
        panic!("expected a cycle error");
    };
    assert_eq!(report.cycles.len(), 1);
    assert_eq!(member_set(&report.cycles[0]), BTreeSet::from(["A", "B", "C"]));
}

// ===========================================================================
// Topology 3: fan-in A → B ← C
//
// Valid orders: [B, A, C] and [B, C, A].
// ===========================================================================

#[test]
fn fan_in_accepts_either_sibling_order() {
    let entities = [
        Service::new("", "A").needs("B"),
        Service::new("", "C").needs("B"),
        Service::new("", "B"),
    ];
    let order: Vec<String> = sort(&entities)
        .expect("acyclic")
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert!(
        order == ["B", "A", "C"] || order == ["B", "C", "A"],
        "unexpected order: {order:?}"
    );
}

// ===========================================================================
// Topology 4: self reference
// ===========================================================================

#[test]
fn self_reference_yields_singleton_group() {
    let err = sort(&[Service::new("", "A").needs("A")]).expect_err("cyclic");
    let report = err.as_cycles().expect("cycle error");
    assert_eq!(report.cycles, vec![vec!["A".to_string()]]);
}

// ===========================================================================
// Topology 5: same name in two namespaces
//
//   team-a/web → db        (unqualified: binds to team-a/db)
//   team-b/db  → team-a/web
//
// If the unqualified `db` bound to team-b/db this would be a cycle.
// ===========================================================================

#[test]
fn unqualified_reference_binds_to_local_sibling() {
    let entities = [
        Service::new("team-a", "web").needs("db"),
        Service::new("team-a", "db"),
        Service::new("team-b", "db").needs("team-a/web"),
    ];
    let order = sort(&entities).expect("acyclic");
    let pos = |o: &ObjectRef| order.position(o).expect("present");
    assert!(pos(&obj("team-a", "db")) < pos(&obj("team-a", "web")));
    assert!(pos(&obj("team-a", "web")) < pos(&obj("team-b", "db")));
}

#[test]
fn cross_namespace_reference_must_be_qualified() {
    // `web` in team-a asking for `db` must not pick up team-b/db.
    let entities = [
        Service::new("team-a", "web").needs("db"),
        Service::new("team-b", "db"),
    ];
    let strict = SortOptions {
        strict: true,
        ..SortOptions::default()
    };
    let err = sort_with(&entities, &strict).expect_err("team-a/db is undeclared");
    let SortError::UnresolvedReferences(missing) = err else {
        panic!("expected unresolved references");
    };
    assert_eq!(missing[0].missing, obj("team-a", "db"));
}

// ===========================================================================
// Topology 6: two disjoint cycles plus a clean entity
// ===========================================================================

#[test]
fn every_cycle_is_reported_in_one_error() {
    let entities = [
        Service::new("", "clean"),
        Service::new("", "x").needs("y"),
        Service::new("", "y").needs("x"),
        Service::new("", "p").needs("q"),
        Service::new("", "q").needs("r"),
        Service::new("", "r").needs("p"),
    ];
    let err = sort(&entities).expect_err("cyclic");
    let report = err.as_cycles().expect("cycle error");
    let groups: BTreeSet<BTreeSet<&str>> = report.cycles.iter().map(|g| member_set(g)).collect();
    assert_eq!(
        groups,
        BTreeSet::from([BTreeSet::from(["x", "y"]), BTreeSet::from(["p", "q", "r"])])
    );
    assert!(!report.contains("clean"));
}

// ===========================================================================
// Topology 7: a clean prefix feeding into a cycle
// ===========================================================================

#[test]
fn cycle_downstream_of_clean_entities_still_fails_whole_sort() {
    let entities = [
        Service::new("", "base"),
        Service::new("", "a").needs("base").needs("b"),
        Service::new("", "b").needs("a"),
    ];
    let err = sort(&entities).expect_err("cyclic");
    assert_eq!(err.error_code().code(), "E2001");
    let report = err.as_cycles().expect("cycle error");
    assert_eq!(report.len(), 1);
    assert_eq!(member_set(&report.cycles[0]), BTreeSet::from(["a", "b"]));
}

// ===========================================================================
// Topology 8: dangling dependency
// ===========================================================================

#[test]
fn dangling_dependency_is_silently_dropped() {
    let entities = [Service::new("ns", "app").needs("typo-db"), Service::new("ns", "db")];
    let order = sort(&entities).expect("permissive");
    assert_eq!(order.len(), 2);
    assert!(order.iter().all(|r| r.name != "typo-db"));
}

// ===========================================================================
// Topology 9: layered stack
// ===========================================================================

#[test]
fn layers_group_independent_entities() {
    let entities = [
        Service::new("infra", "network"),
        Service::new("infra", "db").needs("network"),
        Service::new("infra", "cache").needs("network"),
        Service::new("apps", "api").needs("infra/db").needs("infra/cache"),
    ];
    let layers = layers(&entities, &SortOptions::default()).expect("acyclic");
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0], vec![obj("infra", "network")]);
    let middle: BTreeSet<&str> = layers[1].iter().map(|r| r.name.as_str()).collect();
    assert_eq!(middle, BTreeSet::from(["cache", "db"]));
    assert_eq!(layers[2], vec![obj("apps", "api")]);
}

#[test]
fn teardown_order_puts_dependents_first() {
    let entities = [
        Service::new("infra", "db"),
        Service::new("apps", "api").needs("infra/db"),
    ];
    let graph = DependencyGraph::build(&entities, &SortOptions::default()).expect("build");
    let teardown = graph.order().expect("acyclic").teardown();
    assert_eq!(
        teardown.into_vec(),
        vec![obj("apps", "api"), obj("infra", "db")]
    );
}
