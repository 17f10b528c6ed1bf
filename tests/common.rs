//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use trellis::graph::node::NodeKind;
use trellis::graph::{NodeId, WorkflowGraph};
use trellis::schema::{Schema, SemanticType, TableRef};
use trellis::backend::StaticRegistry;

pub fn orders() -> TableRef {
    TableRef::new("shop", "orders")
}

pub fn customers() -> TableRef {
    TableRef::new("shop", "customers")
}

pub fn athletes() -> TableRef {
    TableRef::new("sports", "athletes")
}

pub fn orders_schema() -> Schema {
    Schema::from_pairs([
        ("id", SemanticType::Integer),
        ("customer", SemanticType::Text),
        ("total", SemanticType::Float),
        ("placed_at", SemanticType::Date),
    ])
}

pub fn customers_schema() -> Schema {
    Schema::from_pairs([
        ("id", SemanticType::Integer),
        ("name", SemanticType::Text),
        ("tier", SemanticType::Text),
    ])
}

pub fn athletes_schema() -> Schema {
    Schema::from_pairs([
        ("athlete", SemanticType::Text),
        ("sport", SemanticType::Text),
        ("score", SemanticType::Integer),
    ])
}

/// A registry holding every fixture table.
pub fn registry() -> StaticRegistry {
    let mut registry = StaticRegistry::new();
    registry.add_table(orders(), orders_schema(), 1_000);
    registry.add_table(customers(), customers_schema(), 200);
    registry.add_table(athletes(), athletes_schema(), 500);
    registry
}

/// A fresh graph containing a single INPUT node reading `table`.
pub fn input_graph(table: TableRef) -> (WorkflowGraph, NodeId) {
    let mut graph = WorkflowGraph::new();
    let input = graph.add_node(NodeKind::Input(trellis::graph::node::InputConfig { table }));
    (graph, input)
}

/// Adds a node and wires `parent` into its slot 0.
pub fn chain(graph: &mut WorkflowGraph, parent: NodeId, kind: NodeKind) -> NodeId {
    let child = graph.add_node(kind);
    graph
        .connect(parent, child, 0)
        .expect("fixture edge should not close a cycle");
    child
}
