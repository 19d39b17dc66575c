#![no_main]

//! Fuzz target for dependency graph resolution
//!
//! Builds an arbitrary graph over a fixed set of services, possibly with
//! missing nodes and cycles, and checks every resolve against a model of
//! the resolver: missing services and cycles are reported, never looped on.

use arbitrary::Arbitrary;
use idiocy::{Container, DiError, Lifetime};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const NODES: usize = 4;

struct Node<const I: usize>;

#[derive(Debug, Arbitrary)]
struct NodeSpec {
    singleton: bool,
    edges: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct Graph {
    nodes: [Option<NodeSpec>; NODES],
    queries: Vec<u8>,
}

#[derive(Debug, PartialEq)]
enum Failure {
    NotRegistered,
    Cycle,
}

fn resolve_node(container: &Container, node: usize) -> idiocy::Result<()> {
    match node {
        0 => container.resolve::<Node<0>>().map(drop),
        1 => container.resolve::<Node<1>>().map(drop),
        2 => container.resolve::<Node<2>>().map(drop),
        _ => container.resolve::<Node<3>>().map(drop),
    }
}

fn register_node<const I: usize>(container: &Container, spec: &NodeSpec) {
    let lifetime = if spec.singleton {
        Lifetime::Singleton
    } else {
        Lifetime::Transient
    };
    let edges = edges(spec);

    container
        .register_factory::<Node<I>, _>(lifetime, move |c| {
            for &edge in &edges {
                resolve_node(c, edge)?;
            }
            Ok(Arc::new(Node::<I>))
        })
        .unwrap();
}

fn edges(spec: &NodeSpec) -> Vec<usize> {
    spec.edges.iter().take(8).map(|e| *e as usize % NODES).collect()
}

/// Mirror of the resolver: lookup, cycle check, dependencies in order
fn model(
    graph: &Graph,
    cached: &mut [bool; NODES],
    stack: &mut Vec<usize>,
    node: usize,
) -> Result<(), Failure> {
    let Some(spec) = &graph.nodes[node] else {
        return Err(Failure::NotRegistered);
    };
    if stack.contains(&node) {
        return Err(Failure::Cycle);
    }
    if cached[node] {
        return Ok(());
    }

    stack.push(node);
    let result = edges(spec)
        .into_iter()
        .try_for_each(|edge| model(graph, cached, stack, edge));
    stack.pop();

    if result.is_ok() && spec.singleton {
        cached[node] = true;
    }
    result
}

fuzz_target!(|graph: Graph| {
    let container = Container::new();

    if let Some(spec) = &graph.nodes[0] {
        register_node::<0>(&container, spec);
    }
    if let Some(spec) = &graph.nodes[1] {
        register_node::<1>(&container, spec);
    }
    if let Some(spec) = &graph.nodes[2] {
        register_node::<2>(&container, spec);
    }
    if let Some(spec) = &graph.nodes[3] {
        register_node::<3>(&container, spec);
    }

    let mut cached = [false; NODES];

    for query in graph.queries.iter().take(16) {
        let node = *query as usize % NODES;
        let expected = model(&graph, &mut cached, &mut Vec::new(), node);

        let actual = resolve_node(&container, node).map_err(|err| match err {
            DiError::NotRegistered { .. } => Failure::NotRegistered,
            DiError::CircularDependency { .. } => Failure::Cycle,
            other => panic!("unexpected error: {other}"),
        });

        assert_eq!(actual, expected);
    }
});
