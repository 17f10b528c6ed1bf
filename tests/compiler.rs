//! Node-by-node compilation behavior: schema propagation and the error
//! surface of every kind.

mod common;

use common::*;
use trellis::compiler::Compiler;
use trellis::error::CompileError;
use trellis::graph::node::*;
use trellis::rel::{AggFunc, CmpOp, JoinHow, Literal, RelOp, SortKey};
use trellis::schema::{SemanticType, TableRef};

fn include(columns: &[&str]) -> NodeKind {
    NodeKind::Select(SelectConfig {
        mode: SelectMode::Include,
        columns: columns.iter().map(|c| c.to_string()).collect(),
    })
}

#[test]
fn input_resolves_schema_from_registry() {
    let (graph, input) = input_graph(orders());
    let registry = registry();
    let expr = Compiler::new(&graph, &registry).compile(input).unwrap();
    assert_eq!(*expr.schema(), orders_schema());
}

#[test]
fn input_reports_missing_table() {
    let (graph, input) = input_graph(TableRef::new("shop", "refunds"));
    let registry = registry();
    let err = Compiler::new(&graph, &registry).compile(input).unwrap_err();
    assert_eq!(
        err,
        CompileError::TableUnavailable {
            table: "shop.refunds".into()
        }
    );
}

#[test]
fn select_include_keeps_input_column_order() {
    let (mut graph, input) = input_graph(orders());
    // Listed out of order; the output follows the input schema order.
    let select = chain(&mut graph, input, include(&["total", "id"]));
    let registry = registry();
    let expr = Compiler::new(&graph, &registry).compile(select).unwrap();
    let names: Vec<&str> = expr.schema().names().collect();
    assert_eq!(names, vec!["id", "total"]);
}

#[test]
fn select_exclude_drops_listed_columns() {
    let (mut graph, input) = input_graph(orders());
    let select = chain(
        &mut graph,
        input,
        NodeKind::Select(SelectConfig {
            mode: SelectMode::Exclude,
            columns: vec!["customer".into()],
        }),
    );
    let registry = registry();
    let expr = Compiler::new(&graph, &registry).compile(select).unwrap();
    let names: Vec<&str> = expr.schema().names().collect();
    assert_eq!(names, vec!["id", "total", "placed_at"]);
}

#[test]
fn select_rejects_unknown_column() {
    let (mut graph, input) = input_graph(orders());
    let select = chain(&mut graph, input, include(&["id", "missing"]));
    let registry = registry();
    let err = Compiler::new(&graph, &registry).compile(select).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownColumn {
            column: "missing".into()
        }
    );
}

#[test]
fn select_rejects_empty_projection() {
    let (mut graph, input) = input_graph(orders());
    let select = chain(
        &mut graph,
        input,
        NodeKind::Select(SelectConfig {
            mode: SelectMode::Exclude,
            columns: vec![
                "id".into(),
                "customer".into(),
                "total".into(),
                "placed_at".into(),
            ],
        }),
    );
    let registry = registry();
    let err = Compiler::new(&graph, &registry).compile(select).unwrap_err();
    assert_eq!(err, CompileError::EmptySelection);
}

#[test]
fn join_requires_both_parents() {
    let registry = registry();
    let (mut graph, left) = input_graph(orders());
    let join = graph.add_node(NodeKind::Join(JoinConfig {
        how: JoinHow::Inner,
        left_on: Some("id".into()),
        right_on: Some("id".into()),
    }));
    graph.connect(left, join, 0).unwrap();

    let err = Compiler::new(&graph, &registry).compile(join).unwrap_err();
    assert_eq!(
        err,
        CompileError::NeedsMoreParents {
            kind: "JOIN",
            required: 2,
            connected: 1
        }
    );

    // Wiring the second parent resolves the same node without other edits.
    let right = graph.add_node(NodeKind::Input(InputConfig { table: customers() }));
    graph.connect(right, join, 1).unwrap();
    assert!(Compiler::new(&graph, &registry).compile(join).is_ok());
}

#[test]
fn join_suffixes_right_side_collisions() {
    let registry = registry();
    let (mut graph, left) = input_graph(orders());
    let right = graph.add_node(NodeKind::Input(InputConfig { table: customers() }));
    let join = graph.add_node(NodeKind::Join(JoinConfig {
        how: JoinHow::Left,
        left_on: Some("id".into()),
        right_on: Some("id".into()),
    }));
    graph.connect(left, join, 0).unwrap();
    graph.connect(right, join, 1).unwrap();

    let expr = Compiler::new(&graph, &registry).compile(join).unwrap();
    let names: Vec<&str> = expr.schema().names().collect();
    assert_eq!(
        names,
        vec!["id", "customer", "total", "placed_at", "id_right", "name", "tier"]
    );
    // The join key follows the rename.
    match expr.op() {
        RelOp::Join {
            left_on, right_on, ..
        } => {
            assert_eq!(left_on, "id");
            assert_eq!(right_on, "id_right");
        }
        other => panic!("expected a join, got {:?}", other),
    }
}

#[test]
fn join_without_keys_is_a_config_error() {
    let registry = registry();
    let (mut graph, left) = input_graph(orders());
    let right = graph.add_node(NodeKind::Input(InputConfig { table: customers() }));
    let join = graph.add_node(NodeKind::Join(JoinConfig {
        how: JoinHow::Inner,
        left_on: None,
        right_on: None,
    }));
    graph.connect(left, join, 0).unwrap();
    graph.connect(right, join, 1).unwrap();

    let err = Compiler::new(&graph, &registry).compile(join).unwrap_err();
    assert!(matches!(err, CompileError::BadConfig(_)));
}

#[test]
fn aggregation_derives_names_and_types() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let agg = chain(
        &mut graph,
        input,
        NodeKind::Aggregation(AggregationConfig {
            group_by: vec!["customer".into()],
            aggregations: vec![
                AggSpec {
                    column: "total".into(),
                    function: AggFunc::Sum,
                },
                AggSpec {
                    column: "id".into(),
                    function: AggFunc::Count,
                },
                AggSpec {
                    column: "total".into(),
                    function: AggFunc::Mean,
                },
            ],
        }),
    );
    let expr = Compiler::new(&graph, &registry).compile(agg).unwrap();
    let columns: Vec<(&str, SemanticType)> = expr
        .schema()
        .iter()
        .map(|c| (c.name.as_str(), c.ty))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("customer", SemanticType::Text),
            ("sum_total", SemanticType::Float),
            ("count_id", SemanticType::Integer),
            ("mean_total", SemanticType::Float),
        ]
    );
}

#[test]
fn aggregation_rejects_sum_over_text() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let agg = chain(
        &mut graph,
        input,
        NodeKind::Aggregation(AggregationConfig {
            group_by: vec![],
            aggregations: vec![AggSpec {
                column: "customer".into(),
                function: AggFunc::Sum,
            }],
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(agg).unwrap_err();
    assert_eq!(
        err,
        CompileError::TypeMismatch {
            column: "customer".into(),
            expected: "numeric".into(),
            found: "text".into()
        }
    );
}

#[test]
fn aggregation_requires_at_least_one_function() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let agg = chain(
        &mut graph,
        input,
        NodeKind::Aggregation(AggregationConfig {
            group_by: vec!["customer".into()],
            aggregations: vec![],
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(agg).unwrap_err();
    assert!(matches!(err, CompileError::BadConfig(_)));
}

#[test]
fn union_matches_schemas_positionally() {
    let registry = registry();
    let (mut graph, orders_in) = input_graph(orders());
    let customers_in = graph.add_node(NodeKind::Input(InputConfig { table: customers() }));
    let union = graph.add_node(NodeKind::Union(UnionConfig { distinct: false }));
    graph.connect(orders_in, union, 0).unwrap();
    graph.connect(customers_in, union, 1).unwrap();

    // Position 2: orders.total (float) vs customers.tier (text).
    let err = Compiler::new(&graph, &registry).compile(union).unwrap_err();
    assert_eq!(
        err,
        CompileError::SchemaMismatch {
            column: "total".into(),
            left: "float".into(),
            right: "text".into()
        }
    );
}

#[test]
fn union_accepts_any_number_of_matching_parents() {
    let registry = registry();
    let mut graph = trellis::graph::WorkflowGraph::new();
    let union = graph.add_node(NodeKind::Union(UnionConfig { distinct: true }));
    for position in 0..3 {
        let input = graph.add_node(NodeKind::Input(InputConfig { table: orders() }));
        graph.connect(input, union, position).unwrap();
    }
    let expr = Compiler::new(&graph, &registry).compile(union).unwrap();
    assert_eq!(*expr.schema(), orders_schema());
}

#[test]
fn except_takes_exactly_two_parents() {
    let registry = registry();
    let mut graph = trellis::graph::WorkflowGraph::new();
    let except = graph.add_node(NodeKind::Except);
    for position in 0..3 {
        let input = graph.add_node(NodeKind::Input(InputConfig { table: orders() }));
        graph.connect(input, except, position).unwrap();
    }
    let err = Compiler::new(&graph, &registry).compile(except).unwrap_err();
    assert_eq!(
        err,
        CompileError::TooManyParents {
            kind: "EXCEPT",
            allowed: 2,
            connected: 3
        }
    );
}

#[test]
fn sort_requires_at_least_one_key() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let sort = chain(&mut graph, input, NodeKind::Sort(SortConfig { keys: vec![] }));
    let err = Compiler::new(&graph, &registry).compile(sort).unwrap_err();
    assert!(matches!(err, CompileError::BadConfig(_)));
}

#[test]
fn sort_and_limit_pass_the_schema_through() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let sort = chain(
        &mut graph,
        input,
        NodeKind::Sort(SortConfig {
            keys: vec![SortKey::desc("total"), SortKey::asc("id")],
        }),
    );
    let limit = chain(
        &mut graph,
        sort,
        NodeKind::Limit(LimitConfig {
            limit: 10,
            offset: Some(5),
        }),
    );
    let expr = Compiler::new(&graph, &registry).compile(limit).unwrap();
    assert_eq!(*expr.schema(), orders_schema());
}

#[test]
fn filter_rejects_mismatched_comparison_literal() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let filter = chain(
        &mut graph,
        input,
        NodeKind::Filter(FilterConfig {
            predicate: FilterPredicate::Compare {
                column: "total".into(),
                op: CmpOp::Gt,
                value: Literal::Text("high".into()),
            },
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(filter).unwrap_err();
    assert_eq!(
        err,
        CompileError::TypeMismatch {
            column: "total".into(),
            expected: "float".into(),
            found: "text".into()
        }
    );
}

#[test]
fn filter_rejects_null_comparison_literal() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let filter = chain(
        &mut graph,
        input,
        NodeKind::Filter(FilterConfig {
            predicate: FilterPredicate::Compare {
                column: "total".into(),
                op: CmpOp::Eq,
                value: Literal::Null,
            },
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(filter).unwrap_err();
    assert!(matches!(err, CompileError::BadConfig(_)));
}

#[test]
fn filter_contains_requires_a_text_column() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let filter = chain(
        &mut graph,
        input,
        NodeKind::Filter(FilterConfig {
            predicate: FilterPredicate::Contains {
                column: "total".into(),
                value: "9".into(),
            },
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(filter).unwrap_err();
    assert!(matches!(err, CompileError::TypeMismatch { .. }));
}

#[test]
fn filter_rejects_empty_predicate_group() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let filter = chain(
        &mut graph,
        input,
        NodeKind::Filter(FilterConfig {
            predicate: FilterPredicate::All(vec![]),
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(filter).unwrap_err();
    assert!(matches!(err, CompileError::BadConfig(_)));
}

#[test]
fn edit_replaces_the_column_type_in_place() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let edit = chain(
        &mut graph,
        input,
        NodeKind::Edit(EditConfig {
            column: "customer".into(),
            function: "length".into(),
            args: vec![],
        }),
    );
    let expr = Compiler::new(&graph, &registry).compile(edit).unwrap();
    let names: Vec<&str> = expr.schema().names().collect();
    assert_eq!(names, vec!["id", "customer", "total", "placed_at"]);
    assert_eq!(
        expr.schema().get("customer").unwrap().ty,
        SemanticType::Integer
    );
}

#[test]
fn edit_rejects_a_function_from_another_type_class() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let edit = chain(
        &mut graph,
        input,
        NodeKind::Edit(EditConfig {
            column: "total".into(),
            function: "upper".into(),
            args: vec![],
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(edit).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownFunction {
            ty: "float".into(),
            function: "upper".into()
        }
    );
}

#[test]
fn edit_checks_argument_count() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let edit = chain(
        &mut graph,
        input,
        NodeKind::Edit(EditConfig {
            column: "customer".into(),
            function: "replace".into(),
            args: vec![Literal::Text("a".into())],
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(edit).unwrap_err();
    assert_eq!(
        err,
        CompileError::WrongArity {
            function: "replace".into(),
            expected: 3,
            found: 2
        }
    );
}

#[test]
fn add_appends_a_labeled_column() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let add = chain(
        &mut graph,
        input,
        NodeKind::Add(AddConfig {
            column: "total".into(),
            function: "round".into(),
            args: vec![],
            label: "total_rounded".into(),
        }),
    );
    let expr = Compiler::new(&graph, &registry).compile(add).unwrap();
    let last = expr.schema().iter().last().unwrap();
    assert_eq!(last.name, "total_rounded");
    assert_eq!(last.ty, SemanticType::Integer);
}

#[test]
fn add_rejects_existing_and_invalid_labels() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let duplicate = chain(
        &mut graph,
        input,
        NodeKind::Add(AddConfig {
            column: "total".into(),
            function: "round".into(),
            args: vec![],
            label: "customer".into(),
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(duplicate).unwrap_err();
    assert_eq!(
        err,
        CompileError::DuplicateColumn {
            name: "customer".into()
        }
    );

    graph
        .set_kind(
            duplicate,
            NodeKind::Add(AddConfig {
                column: "total".into(),
                function: "round".into(),
                args: vec![],
                label: "1st".into(),
            }),
        )
        .unwrap();
    let err = Compiler::new(&graph, &registry).compile(duplicate).unwrap_err();
    assert_eq!(err, CompileError::InvalidIdentifier { name: "1st".into() });
}

#[test]
fn rename_rejects_colliding_targets() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let rename = chain(
        &mut graph,
        input,
        NodeKind::Rename(RenameConfig {
            mapping: vec![("customer".into(), "id".into())],
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(rename).unwrap_err();
    assert_eq!(err, CompileError::DuplicateColumn { name: "id".into() });
}

#[test]
fn convert_retypes_without_reordering() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let convert = chain(
        &mut graph,
        input,
        NodeKind::Convert(ConvertConfig {
            column: "id".into(),
            to: SemanticType::Text,
        }),
    );
    let expr = Compiler::new(&graph, &registry).compile(convert).unwrap();
    let names: Vec<&str> = expr.schema().names().collect();
    assert_eq!(names, vec!["id", "customer", "total", "placed_at"]);
    assert_eq!(expr.schema().get("id").unwrap().ty, SemanticType::Text);
}

#[test]
fn window_appends_the_labeled_column() {
    let registry = registry();
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
    let expr = Compiler::new(&graph, &registry).compile(window).unwrap();
    let last = expr.schema().iter().last().unwrap();
    assert_eq!(last.name, "running_total");
    assert_eq!(last.ty, SemanticType::Float);
    assert_eq!(expr.schema().len(), 5);
}

#[test]
fn pivot_produces_a_static_schema_from_configured_values() {
    let registry = registry();
    let (mut graph, input) = input_graph(athletes());
    let pivot = chain(
        &mut graph,
        input,
        NodeKind::Pivot(PivotConfig {
            index: vec!["athlete".into()],
            column: "sport".into(),
            values: vec!["judo".into(), "fencing".into()],
            value: "score".into(),
            function: AggFunc::Max,
        }),
    );
    let expr = Compiler::new(&graph, &registry).compile(pivot).unwrap();
    let columns: Vec<(&str, SemanticType)> = expr
        .schema()
        .iter()
        .map(|c| (c.name.as_str(), c.ty))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("athlete", SemanticType::Text),
            ("judo", SemanticType::Integer),
            ("fencing", SemanticType::Integer),
        ]
    );
}

#[test]
fn pivot_requires_a_text_spread_column() {
    let registry = registry();
    let (mut graph, input) = input_graph(athletes());
    let pivot = chain(
        &mut graph,
        input,
        NodeKind::Pivot(PivotConfig {
            index: vec!["athlete".into()],
            column: "score".into(),
            values: vec!["10".into()],
            value: "score".into(),
            function: AggFunc::Sum,
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(pivot).unwrap_err();
    assert!(matches!(err, CompileError::TypeMismatch { .. }));
}

#[test]
fn pivot_requires_configured_values() {
    let registry = registry();
    let (mut graph, input) = input_graph(athletes());
    let pivot = chain(
        &mut graph,
        input,
        NodeKind::Pivot(PivotConfig {
            index: vec!["athlete".into()],
            column: "sport".into(),
            values: vec![],
            value: "score".into(),
            function: AggFunc::Sum,
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(pivot).unwrap_err();
    assert!(matches!(err, CompileError::BadConfig(_)));
}

#[test]
fn unpivot_melts_into_name_value_pairs() {
    let registry = registry();
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
    let expr = Compiler::new(&graph, &registry).compile(unpivot).unwrap();
    let columns: Vec<(&str, SemanticType)> = expr
        .schema()
        .iter()
        .map(|c| (c.name.as_str(), c.ty))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("id", SemanticType::Integer),
            ("field", SemanticType::Text),
            ("value", SemanticType::Text),
        ]
    );
}

#[test]
fn unpivot_rejects_mixed_value_types() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let unpivot = chain(
        &mut graph,
        input,
        NodeKind::Unpivot(UnpivotConfig {
            columns: vec!["customer".into(), "total".into()],
            name_label: "field".into(),
            value_label: "value".into(),
        }),
    );
    let err = Compiler::new(&graph, &registry).compile(unpivot).unwrap_err();
    assert_eq!(
        err,
        CompileError::SchemaMismatch {
            column: "total".into(),
            left: "text".into(),
            right: "float".into()
        }
    );
}

#[test]
fn output_passes_its_parent_through() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let output = chain(&mut graph, input, NodeKind::Output(OutputConfig::default()));
    let compiler = Compiler::new(&graph, &registry);
    assert_eq!(
        compiler.compile(output).unwrap(),
        compiler.compile(input).unwrap()
    );
}

#[test]
fn errors_do_not_poison_sibling_branches() {
    let registry = registry();
    let (mut graph, input) = input_graph(orders());
    let broken = chain(&mut graph, input, include(&["missing"]));
    let fine = chain(&mut graph, input, include(&["id"]));
    let compiler = Compiler::new(&graph, &registry);
    assert!(compiler.compile(broken).is_err());
    assert!(compiler.compile(fine).is_ok());
}
