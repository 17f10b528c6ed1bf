//! SQL rendering of compiled pipelines.

mod common;

use common::*;
use trellis::compiler::Compiler;
use trellis::graph::node::*;
use trellis::rel::{AggFunc, CmpOp, JoinHow, Literal, SortKey};

fn sql_for(graph: &trellis::graph::WorkflowGraph, node: trellis::graph::NodeId) -> String {
    let registry = registry();
    Compiler::new(graph, &registry)
        .compile(node)
        .unwrap()
        .compile_to_sql()
}

#[test]
fn scan_renders_a_qualified_table() {
    let (graph, input) = input_graph(orders());
    assert_eq!(sql_for(&graph, input), r#"SELECT * FROM "shop"."orders""#);
}

#[test]
fn select_renders_quoted_columns_over_a_subquery() {
    let (mut graph, input) = input_graph(orders());
    let select = chain(
        &mut graph,
        input,
        NodeKind::Select(SelectConfig {
            mode: SelectMode::Include,
            columns: vec!["customer".into(), "total".into()],
        }),
    );
    assert_eq!(
        sql_for(&graph, select),
        r#"SELECT "customer", "total" FROM (SELECT * FROM "shop"."orders") AS t0"#
    );
}

#[test]
fn filter_renders_a_where_clause() {
    let (mut graph, input) = input_graph(orders());
    let filter = chain(
        &mut graph,
        input,
        NodeKind::Filter(FilterConfig {
            predicate: FilterPredicate::Compare {
                column: "total".into(),
                op: CmpOp::Gt,
                value: Literal::Float(100.0),
            },
        }),
    );
    assert_eq!(
        sql_for(&graph, filter),
        r#"SELECT * FROM (SELECT * FROM "shop"."orders") AS t0 WHERE ("total" > 100)"#
    );
}

#[test]
fn text_predicates_render_as_like_patterns() {
    let (mut graph, input) = input_graph(orders());
    let filter = chain(
        &mut graph,
        input,
        NodeKind::Filter(FilterConfig {
            predicate: FilterPredicate::StartsWith {
                column: "customer".into(),
                value: "Acme".into(),
            },
        }),
    );
    let sql = sql_for(&graph, filter);
    assert!(sql.contains(r#"("customer" LIKE 'Acme' || '%')"#), "{}", sql);
}

#[test]
fn join_renders_side_scoped_aliases() {
    let mut graph = trellis::graph::WorkflowGraph::new();
    let left = graph.add_node(NodeKind::Input(InputConfig { table: orders() }));
    let right = graph.add_node(NodeKind::Input(InputConfig { table: customers() }));
    let join = graph.add_node(NodeKind::Join(JoinConfig {
        how: JoinHow::Inner,
        left_on: Some("id".into()),
        right_on: Some("id".into()),
    }));
    graph.connect(left, join, 0).unwrap();
    graph.connect(right, join, 1).unwrap();

    let sql = sql_for(&graph, join);
    assert!(sql.contains("INNER JOIN"), "{}", sql);
    assert!(sql.contains(r#"ON l0."id" = r0."id_right""#), "{}", sql);
    assert!(sql.contains(r#"l0."total""#), "{}", sql);
    assert!(sql.contains(r#"r0."name""#), "{}", sql);
}

#[test]
fn edit_renders_the_capability_template_in_place() {
    let (mut graph, input) = input_graph(orders());
    let edit = chain(
        &mut graph,
        input,
        NodeKind::Edit(EditConfig {
            column: "customer".into(),
            function: "upper".into(),
            args: vec![],
        }),
    );
    assert_eq!(
        sql_for(&graph, edit),
        r#"SELECT "id", UPPER("customer") AS "customer", "total", "placed_at" FROM (SELECT * FROM "shop"."orders") AS t0"#
    );
}

#[test]
fn aggregate_renders_group_by() {
    let (mut graph, input) = input_graph(orders());
    let agg = chain(
        &mut graph,
        input,
        NodeKind::Aggregation(AggregationConfig {
            group_by: vec!["customer".into()],
            aggregations: vec![AggSpec {
                column: "total".into(),
                function: AggFunc::Mean,
            }],
        }),
    );
    assert_eq!(
        sql_for(&graph, agg),
        r#"SELECT "customer", AVG("total") AS "mean_total" FROM (SELECT * FROM "shop"."orders") AS t0 GROUP BY "customer""#
    );
}

#[test]
fn union_all_connects_the_branches() {
    let mut graph = trellis::graph::WorkflowGraph::new();
    let union = graph.add_node(NodeKind::Union(UnionConfig { distinct: false }));
    for position in 0..2 {
        let input = graph.add_node(NodeKind::Input(InputConfig { table: orders() }));
        graph.connect(input, union, position).unwrap();
    }
    let sql = sql_for(&graph, union);
    assert_eq!(sql.matches(" UNION ALL ").count(), 1, "{}", sql);
}

#[test]
fn distinct_subset_renders_distinct_on() {
    let (mut graph, input) = input_graph(orders());
    let distinct = chain(
        &mut graph,
        input,
        NodeKind::Distinct(DistinctConfig {
            columns: Some(vec!["customer".into()]),
        }),
    );
    let sql = sql_for(&graph, distinct);
    assert!(sql.starts_with(r#"SELECT DISTINCT ON ("customer") *"#), "{}", sql);
    assert!(sql.ends_with(r#"ORDER BY "customer""#), "{}", sql);
}

#[test]
fn limit_and_offset_render_in_order() {
    let (mut graph, input) = input_graph(orders());
    let limit = chain(
        &mut graph,
        input,
        NodeKind::Limit(LimitConfig {
            limit: 10,
            offset: Some(5),
        }),
    );
    let sql = sql_for(&graph, limit);
    assert!(sql.ends_with("LIMIT 10 OFFSET 5"), "{}", sql);
}

#[test]
fn window_renders_an_over_clause() {
    let (mut graph, input) = input_graph(orders());
    let window = chain(
        &mut graph,
        input,
        NodeKind::Window(WindowConfig {
            column: "total".into(),
            function: AggFunc::Sum,
            partition_by: vec!["customer".into()],
            order_by: vec![SortKey::asc("placed_at")],
            label: "running_total".into(),
        }),
    );
    let sql = sql_for(&graph, window);
    assert!(
        sql.contains(r#"SUM("total") OVER (PARTITION BY "customer" ORDER BY "placed_at" ASC) AS "running_total""#),
        "{}",
        sql
    );
}

#[test]
fn pivot_renders_filtered_aggregates() {
    let (mut graph, input) = input_graph(athletes());
    let pivot = chain(
        &mut graph,
        input,
        NodeKind::Pivot(PivotConfig {
            index: vec!["athlete".into()],
            column: "sport".into(),
            values: vec!["judo".into()],
            value: "score".into(),
            function: AggFunc::Max,
        }),
    );
    let sql = sql_for(&graph, pivot);
    assert!(
        sql.contains(r#"MAX(CASE WHEN "sport" = 'judo' THEN "score" END) AS "judo""#),
        "{}",
        sql
    );
    assert!(sql.ends_with(r#"GROUP BY "athlete""#), "{}", sql);
}

#[test]
fn unpivot_renders_one_branch_per_melted_column() {
    let (mut graph, input) = input_graph(customers());
    let unpivot = chain(
        &mut graph,
        input,
        NodeKind::Unpivot(UnpivotConfig {
            columns: vec!["name".into(), "tier".into()],
            name_label: "field".into(),
            value_label: "value".into(),
        }),
    );
    let sql = sql_for(&graph, unpivot);
    assert_eq!(sql.matches(" UNION ALL ").count(), 1, "{}", sql);
    assert!(sql.contains(r#"'name' AS "field""#), "{}", sql);
    assert!(sql.contains(r#""tier" AS "value""#), "{}", sql);
}

#[test]
fn text_literals_are_escaped() {
    let (mut graph, input) = input_graph(orders());
    let filter = chain(
        &mut graph,
        input,
        NodeKind::Filter(FilterConfig {
            predicate: FilterPredicate::Compare {
                column: "customer".into(),
                op: CmpOp::Eq,
                value: Literal::Text("O'Hare".into()),
            },
        }),
    );
    let sql = sql_for(&graph, filter);
    assert!(sql.contains("'O''Hare'"), "{}", sql);
}
