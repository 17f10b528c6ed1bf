//! Graph editing invariants: cycle rejection, dirty propagation, and the
//! schema memo.

mod common;

use std::cell::Cell;

use common::*;
use trellis::backend::{SchemaRegistry, StaticRegistry};
use trellis::error::{CompileError, GraphError};
use trellis::graph::node::*;
use trellis::graph::WorkflowGraph;
use trellis::schema::{Schema, TableRef};

/// Counts schema lookups, to observe whether a compile actually ran.
struct CountingRegistry {
    inner: StaticRegistry,
    lookups: Cell<usize>,
}

impl CountingRegistry {
    fn new() -> Self {
        Self {
            inner: registry(),
            lookups: Cell::new(0),
        }
    }
}

impl SchemaRegistry for CountingRegistry {
    fn get_schema(&self, table: &TableRef) -> Option<Schema> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.get_schema(table)
    }

    fn get_row_count(&self, table: &TableRef) -> Option<u64> {
        self.inner.get_row_count(table)
    }
}

fn select_all() -> NodeKind {
    NodeKind::Select(SelectConfig {
        mode: SelectMode::Exclude,
        columns: vec![],
    })
}

#[test]
fn connect_rejects_cycles_without_mutating() {
    let (mut graph, input) = input_graph(orders());
    let select = chain(&mut graph, input, select_all());
    let edges_before = graph.edges().to_vec();

    let err = graph.connect(select, input, 0).unwrap_err();
    assert!(matches!(err, GraphError::Cycle(_)));
    assert_eq!(graph.edges(), edges_before.as_slice());
    assert!(graph.validate_acyclic().is_ok());
}

#[test]
fn self_edges_are_cycles() {
    let (mut graph, input) = input_graph(orders());
    assert!(matches!(
        graph.connect(input, input, 0).unwrap_err(),
        GraphError::Cycle(_)
    ));
}

#[test]
fn an_input_slot_holds_one_parent() {
    let (mut graph, first) = input_graph(orders());
    let second = graph.add_node(NodeKind::Input(InputConfig { table: customers() }));
    let select = graph.add_node(select_all());
    graph.connect(first, select, 0).unwrap();

    let err = graph.connect(second, select, 0).unwrap_err();
    assert_eq!(
        err,
        GraphError::PositionTaken {
            child: select.0,
            position: 0
        }
    );
}

#[test]
fn parents_are_ordered_by_slot_not_insertion() {
    let mut graph = WorkflowGraph::new();
    let union = graph.add_node(NodeKind::Union(UnionConfig { distinct: false }));
    let a = graph.add_node(NodeKind::Input(InputConfig { table: orders() }));
    let b = graph.add_node(NodeKind::Input(InputConfig { table: orders() }));
    graph.connect(b, union, 1).unwrap();
    graph.connect(a, union, 0).unwrap();
    assert_eq!(graph.parents(union), vec![a, b]);
}

#[test]
fn removing_a_node_cascades_its_edges() {
    let (mut graph, input) = input_graph(orders());
    let select = chain(&mut graph, input, select_all());
    let limit = chain(
        &mut graph,
        select,
        NodeKind::Limit(LimitConfig {
            limit: 10,
            offset: None,
        }),
    );

    graph.remove_node(select).unwrap();
    assert!(graph.node(select).is_none());
    assert!(graph.edges().is_empty());
    assert!(graph.parents(limit).is_empty());
}

#[test]
fn topological_order_puts_parents_first() {
    let (mut graph, input) = input_graph(orders());
    let select = chain(&mut graph, input, select_all());
    let limit = chain(
        &mut graph,
        select,
        NodeKind::Limit(LimitConfig {
            limit: 10,
            offset: None,
        }),
    );

    let order = graph.validate_acyclic().unwrap();
    let index = |id| order.iter().position(|n| *n == id).unwrap();
    assert!(index(input) < index(select));
    assert!(index(select) < index(limit));
}

#[test]
fn schema_queries_are_memoized_until_an_edit() {
    let registry = CountingRegistry::new();
    let (mut graph, input) = input_graph(orders());
    let select = chain(&mut graph, input, select_all());

    graph.schema_of(select, &registry).unwrap();
    let after_first = registry.lookups.get();
    assert!(after_first > 0);

    // Repeat queries are served from the memo.
    graph.schema_of(select, &registry).unwrap();
    graph.schema_of(select, &registry).unwrap();
    assert_eq!(registry.lookups.get(), after_first);

    // An upstream config edit invalidates the whole downstream chain.
    graph
        .set_kind(input, NodeKind::Input(InputConfig { table: customers() }))
        .unwrap();
    let schema = graph.schema_of(select, &registry).unwrap();
    assert!(registry.lookups.get() > after_first);
    assert_eq!(schema, customers_schema());
}

#[test]
fn cosmetic_edits_do_not_invalidate_the_memo() {
    let registry = CountingRegistry::new();
    let (mut graph, input) = input_graph(orders());
    let select = chain(&mut graph, input, select_all());

    graph.schema_of(select, &registry).unwrap();
    let after_first = registry.lookups.get();

    graph.set_position(input, 40.0, 80.0).unwrap();
    graph.set_label(select, Some("keep everything".into())).unwrap();
    graph.schema_of(select, &registry).unwrap();
    assert_eq!(registry.lookups.get(), after_first);
}

#[test]
fn edits_bump_data_updated_downstream_only() {
    let (mut graph, input) = input_graph(orders());
    let select = chain(&mut graph, input, select_all());
    let sibling = graph.add_node(NodeKind::Input(InputConfig { table: customers() }));

    let select_before = graph.node(select).unwrap().data_updated;
    let sibling_before = graph.node(sibling).unwrap().data_updated;

    graph
        .set_kind(input, NodeKind::Input(InputConfig { table: athletes() }))
        .unwrap();
    assert!(graph.node(select).unwrap().data_updated >= select_before);
    assert_eq!(graph.node(sibling).unwrap().data_updated, sibling_before);
}

#[test]
fn compile_errors_are_recorded_and_cleared_per_node() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let select = chain(
        &mut graph,
        input,
        NodeKind::Select(SelectConfig {
            mode: SelectMode::Include,
            columns: vec!["missing".into()],
        }),
    );

    let err = graph.compile_node(select, &registry).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownColumn {
            column: "missing".into()
        }
    );
    assert!(graph.last_error(select).is_some());

    graph
        .set_kind(
            select,
            NodeKind::Select(SelectConfig {
                mode: SelectMode::Include,
                columns: vec!["id".into()],
            }),
        )
        .unwrap();
    graph.compile_node(select, &registry).unwrap();
    assert_eq!(graph.last_error(select), None);
}

#[test]
fn node_kinds_serialize_with_a_kind_tag() {
    let kind = NodeKind::Input(InputConfig { table: orders() });
    let json = serde_json::to_string(&kind).unwrap();
    assert!(json.contains(r#""kind":"input""#), "{}", json);
    let back: NodeKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, kind);
}
