//! The node-graph → query compiler.
//!
//! One pure function per node kind, dispatched through a single exhaustive
//! match on [`NodeKind`]. Each kind consumes its parents' already-compiled
//! [`RelExpr`]s plus its own configuration and produces a new expression
//! with a propagated output schema, or a recoverable [`CompileError`].
//! Errors never abort sibling branches: each node compiles independently.

use crate::backend::SchemaRegistry;
use crate::daterange;
use crate::error::CompileError;
use crate::graph::{
    AddConfig, AggregationConfig, ConvertConfig, DistinctConfig, EditConfig, FilterConfig,
    FilterPredicate, FormulaConfig, InputConfig, JoinConfig, LimitConfig, NodeId, NodeKind,
    PivotConfig, RenameConfig, SelectConfig, SelectMode, SortConfig, UnionConfig, UnpivotConfig,
    WindowConfig, WorkflowGraph,
};
use crate::rel::{Agg, Literal, RelExpr, RelOp, ScalarExpr, SetOpKind};
use crate::schema::{validate_identifier, Column, Schema, SemanticType};
use chrono::{NaiveDate, Utc};
use itertools::Itertools;
use tracing::debug;

pub mod ops;

/// Compiles nodes of one workflow graph against a schema registry.
///
/// The anchor date fixes "today" for relative date windows, which keeps
/// compilation a pure function of its inputs.
pub struct Compiler<'a> {
    graph: &'a WorkflowGraph,
    registry: &'a dyn SchemaRegistry,
    anchor: NaiveDate,
}

impl<'a> Compiler<'a> {
    pub fn new(graph: &'a WorkflowGraph, registry: &'a dyn SchemaRegistry) -> Self {
        Self {
            graph,
            registry,
            anchor: Utc::now().date_naive(),
        }
    }

    /// Pins the anchor date used to resolve relative date windows.
    pub fn with_anchor(mut self, anchor: NaiveDate) -> Self {
        self.anchor = anchor;
        self
    }

    /// Compiles `id` bottom-up into a relational expression.
    pub fn compile(&self, id: NodeId) -> Result<RelExpr, CompileError> {
        let node = self
            .graph
            .node(id)
            .ok_or(CompileError::NodeNotFound { node_id: id.0 })?;
        let kind = &node.kind;

        let parent_ids = self.graph.parents(id);
        let required = kind.min_parents();
        if parent_ids.len() < required {
            return Err(CompileError::NeedsMoreParents {
                kind: kind.name(),
                required,
                connected: parent_ids.len(),
            });
        }
        if let Some(allowed) = kind.max_parents() {
            if parent_ids.len() > allowed {
                return Err(CompileError::TooManyParents {
                    kind: kind.name(),
                    allowed,
                    connected: parent_ids.len(),
                });
            }
        }

        debug!(node = %id, kind = kind.name(), "compiling node");

        let mut parents = parent_ids
            .iter()
            .map(|parent| self.compile(*parent))
            .collect::<Result<Vec<_>, _>>()?;

        match kind {
            NodeKind::Input(cfg) => self.compile_input(cfg),
            NodeKind::Output(_) => Ok(parents.remove(0)),
            NodeKind::Select(cfg) => compile_select(cfg, parents.remove(0)),
            NodeKind::Join(cfg) => compile_join(cfg, parents),
            NodeKind::Aggregation(cfg) => compile_aggregation(cfg, parents.remove(0)),
            NodeKind::Union(cfg) => compile_set_op(SetOpKind::Union, cfg, parents),
            NodeKind::Except => {
                compile_set_op(SetOpKind::Except, &UnionConfig { distinct: false }, parents)
            }
            NodeKind::Intersect => {
                compile_set_op(SetOpKind::Intersect, &UnionConfig { distinct: false }, parents)
            }
            NodeKind::Sort(cfg) => compile_sort(cfg, parents.remove(0)),
            NodeKind::Limit(cfg) => compile_limit(cfg, parents.remove(0)),
            NodeKind::Filter(cfg) => self.compile_filter(cfg, parents.remove(0)),
            NodeKind::Edit(cfg) => compile_edit(cfg, parents.remove(0)),
            NodeKind::Add(cfg) => compile_add(cfg, parents.remove(0)),
            NodeKind::Rename(cfg) => compile_rename(cfg, parents.remove(0)),
            NodeKind::Formula(cfg) => compile_formula(cfg, parents.remove(0)),
            NodeKind::Distinct(cfg) => compile_distinct(cfg, parents.remove(0)),
            NodeKind::Window(cfg) => compile_window(cfg, parents.remove(0)),
            NodeKind::Convert(cfg) => compile_convert(cfg, parents.remove(0)),
            NodeKind::Pivot(cfg) => compile_pivot(cfg, parents.remove(0)),
            NodeKind::Unpivot(cfg) => compile_unpivot(cfg, parents.remove(0)),
        }
    }

    fn compile_input(&self, cfg: &InputConfig) -> Result<RelExpr, CompileError> {
        let schema =
            self.registry
                .get_schema(&cfg.table)
                .ok_or_else(|| CompileError::TableUnavailable {
                    table: cfg.table.to_string(),
                })?;
        Ok(RelExpr::new(
            schema,
            RelOp::Scan {
                table: cfg.table.clone(),
            },
        ))
    }

    fn compile_filter(&self, cfg: &FilterConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
        let predicate = self.lower_predicate(&cfg.predicate, parent.schema())?;
        let schema = parent.schema().clone();
        Ok(RelExpr::new(
            schema,
            RelOp::Filter {
                input: Box::new(parent),
                predicate,
            },
        ))
    }

    fn lower_predicate(
        &self,
        predicate: &FilterPredicate,
        schema: &Schema,
    ) -> Result<ScalarExpr, CompileError> {
        match predicate {
            FilterPredicate::All(children) => children
                .iter()
                .map(|child| self.lower_predicate(child, schema))
                .process_results(|mut lowered| lowered.next().map(|first| lowered.fold(first, ScalarExpr::and)))?
                .ok_or_else(|| CompileError::BadConfig("empty predicate group".into())),
            FilterPredicate::Any(children) => children
                .iter()
                .map(|child| self.lower_predicate(child, schema))
                .process_results(|mut lowered| {
                    lowered.next().map(|first| {
                        lowered.fold(first, |acc, p| ScalarExpr::Or(Box::new(acc), Box::new(p)))
                    })
                })?
                .ok_or_else(|| CompileError::BadConfig("empty predicate group".into())),
            FilterPredicate::Compare { column, op, value } => {
                let col_ty = schema.ty_of(column)?;
                check_literal(column, col_ty, value)?;
                Ok(ScalarExpr::cmp(
                    *op,
                    ScalarExpr::column(column),
                    ScalarExpr::literal(value.clone()),
                ))
            }
            FilterPredicate::Contains { column, value } => {
                text_match(schema, column, "contains", value)
            }
            FilterPredicate::StartsWith { column, value } => {
                text_match(schema, column, "startswith", value)
            }
            FilterPredicate::EndsWith { column, value } => {
                text_match(schema, column, "endswith", value)
            }
            FilterPredicate::IsNull { column } => {
                schema.ty_of(column)?;
                Ok(ScalarExpr::IsNull(Box::new(ScalarExpr::column(column))))
            }
            FilterPredicate::NotNull { column } => {
                schema.ty_of(column)?;
                Ok(ScalarExpr::NotNull(Box::new(ScalarExpr::column(column))))
            }
            FilterPredicate::DateRange {
                column,
                range,
                previous,
            } => {
                let col_ty = schema.ty_of(column)?;
                if !matches!(col_ty, SemanticType::Date | SemanticType::Timestamp) {
                    return Err(CompileError::TypeMismatch {
                        column: column.clone(),
                        expected: "date or timestamp".into(),
                        found: col_ty.to_string(),
                    });
                }
                daterange::slice(range, column, self.anchor, *previous)
            }
        }
    }
}

/// A comparison literal must be compatible with the column's type class.
fn check_literal(column: &str, col_ty: SemanticType, value: &Literal) -> Result<(), CompileError> {
    let lit_ty = match value.ty() {
        Some(ty) => ty,
        None => {
            return Err(CompileError::BadConfig(
                "comparisons against null are not allowed; use an is-null predicate".into(),
            ))
        }
    };
    let compatible = match col_ty {
        SemanticType::Integer | SemanticType::Float => lit_ty.is_numeric(),
        SemanticType::Text => lit_ty == SemanticType::Text,
        SemanticType::Boolean => lit_ty == SemanticType::Boolean,
        SemanticType::Date => lit_ty == SemanticType::Date,
        SemanticType::Time => lit_ty == SemanticType::Time,
        SemanticType::Timestamp => {
            lit_ty == SemanticType::Timestamp || lit_ty == SemanticType::Date
        }
    };
    if compatible {
        Ok(())
    } else {
        Err(CompileError::TypeMismatch {
            column: column.to_string(),
            expected: col_ty.to_string(),
            found: lit_ty.to_string(),
        })
    }
}

fn text_match(
    schema: &Schema,
    column: &str,
    function: &str,
    value: &str,
) -> Result<ScalarExpr, CompileError> {
    let col_ty = schema.ty_of(column)?;
    if col_ty != SemanticType::Text {
        return Err(CompileError::TypeMismatch {
            column: column.to_string(),
            expected: "text".into(),
            found: col_ty.to_string(),
        });
    }
    Ok(ScalarExpr::Call {
        function: function.to_string(),
        receiver_ty: SemanticType::Text,
        args: vec![
            ScalarExpr::column(column),
            ScalarExpr::literal(Literal::Text(value.to_string())),
        ],
    })
}

fn compile_select(cfg: &SelectConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    for column in &cfg.columns {
        parent.schema().ty_of(column)?;
    }
    let kept: Vec<Column> = parent
        .schema()
        .iter()
        .filter(|col| {
            let listed = cfg.columns.iter().any(|c| c == &col.name);
            match cfg.mode {
                SelectMode::Include => listed,
                SelectMode::Exclude => !listed,
            }
        })
        .cloned()
        .collect();
    if kept.is_empty() {
        return Err(CompileError::EmptySelection);
    }
    let columns = kept.iter().map(|c| c.name.clone()).collect();
    Ok(RelExpr::new(
        Schema::new(kept),
        RelOp::Select {
            input: Box::new(parent),
            columns,
        },
    ))
}

fn compile_join(cfg: &JoinConfig, mut parents: Vec<RelExpr>) -> Result<RelExpr, CompileError> {
    let right = parents.remove(1);
    let left = parents.remove(0);

    let (left_on, right_on) = match (&cfg.left_on, &cfg.right_on) {
        (Some(l), Some(r)) => (l.clone(), r.clone()),
        _ => {
            return Err(CompileError::BadConfig(
                "join keys are not configured".into(),
            ))
        }
    };
    left.schema().ty_of(&left_on)?;
    right.schema().ty_of(&right_on)?;

    // Disambiguate right-side collisions by source before joining.
    let mut mapping = Vec::new();
    let mut right_columns = Vec::new();
    for col in right.schema().iter() {
        if left.schema().contains(&col.name) {
            let mut renamed = format!("{}_right", col.name);
            while left.schema().contains(&renamed)
                || right_columns.iter().any(|c: &Column| c.name == renamed)
            {
                renamed.push_str("_right");
            }
            mapping.push((col.name.clone(), renamed.clone()));
            right_columns.push(Column {
                name: renamed,
                ty: col.ty,
            });
        } else {
            right_columns.push(col.clone());
        }
    }

    let (right, right_on) = if mapping.is_empty() {
        (right, right_on)
    } else {
        let right_on = mapping
            .iter()
            .find(|(old, _)| old == &right_on)
            .map(|(_, new)| new.clone())
            .unwrap_or(right_on);
        let renamed = RelExpr::new(
            Schema::new(right_columns.clone()),
            RelOp::Rename {
                input: Box::new(right),
                mapping,
            },
        );
        (renamed, right_on)
    };

    let mut columns: Vec<Column> = left.schema().iter().cloned().collect();
    columns.extend(right_columns);

    Ok(RelExpr::new(
        Schema::new(columns),
        RelOp::Join {
            left: Box::new(left),
            right: Box::new(right),
            how: cfg.how,
            left_on,
            right_on,
        },
    ))
}

fn compile_aggregation(
    cfg: &AggregationConfig,
    parent: RelExpr,
) -> Result<RelExpr, CompileError> {
    let schema = parent.schema();
    let mut columns = Vec::new();
    for group in &cfg.group_by {
        columns.push(Column {
            name: group.clone(),
            ty: schema.ty_of(group)?,
        });
    }
    if cfg.aggregations.is_empty() {
        return Err(CompileError::BadConfig(
            "aggregation requires at least one (column, function) pair".into(),
        ));
    }
    let mut aggs = Vec::new();
    for spec in &cfg.aggregations {
        let input_ty = schema.ty_of(&spec.column)?;
        if spec.function.requires_numeric() && !input_ty.is_numeric() {
            return Err(CompileError::TypeMismatch {
                column: spec.column.clone(),
                expected: "numeric".into(),
                found: input_ty.to_string(),
            });
        }
        let name = format!("{}_{}", spec.function.name(), spec.column);
        if columns.iter().any(|c| c.name == name) {
            return Err(CompileError::DuplicateColumn { name });
        }
        columns.push(Column {
            name: name.clone(),
            ty: spec.function.result_ty(input_ty),
        });
        aggs.push(Agg {
            name,
            column: spec.column.clone(),
            function: spec.function,
        });
    }
    Ok(RelExpr::new(
        Schema::new(columns),
        RelOp::Aggregate {
            input: Box::new(parent),
            group_by: cfg.group_by.clone(),
            aggs,
        },
    ))
}

fn compile_set_op(
    kind: SetOpKind,
    cfg: &UnionConfig,
    parents: Vec<RelExpr>,
) -> Result<RelExpr, CompileError> {
    let first = &parents[0];
    for other in &parents[1..] {
        // Positional match: names may differ, types may not.
        let longest = first.schema().len().max(other.schema().len());
        for position in 0..longest {
            let a = first.schema().iter().nth(position);
            let b = other.schema().iter().nth(position);
            match (a, b) {
                (Some(a), Some(b)) if a.ty == b.ty => {}
                (Some(a), Some(b)) => {
                    return Err(CompileError::SchemaMismatch {
                        column: a.name.clone(),
                        left: a.ty.to_string(),
                        right: b.ty.to_string(),
                    });
                }
                (Some(a), None) => {
                    return Err(CompileError::SchemaMismatch {
                        column: a.name.clone(),
                        left: a.ty.to_string(),
                        right: "missing".into(),
                    });
                }
                (None, Some(b)) => {
                    return Err(CompileError::SchemaMismatch {
                        column: b.name.clone(),
                        left: "missing".into(),
                        right: b.ty.to_string(),
                    });
                }
                (None, None) => {}
            }
        }
    }
    let schema = first.schema().clone();
    Ok(RelExpr::new(
        schema,
        RelOp::SetOp {
            kind,
            inputs: parents,
            distinct: cfg.distinct,
        },
    ))
}

fn compile_sort(cfg: &SortConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    if cfg.keys.is_empty() {
        return Err(CompileError::BadConfig(
            "sort requires at least one key".into(),
        ));
    }
    for key in &cfg.keys {
        parent.schema().ty_of(&key.column)?;
    }
    let schema = parent.schema().clone();
    Ok(RelExpr::new(
        schema,
        RelOp::Sort {
            input: Box::new(parent),
            keys: cfg.keys.clone(),
        },
    ))
}

fn compile_limit(cfg: &LimitConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    let schema = parent.schema().clone();
    Ok(RelExpr::new(
        schema,
        RelOp::Limit {
            input: Box::new(parent),
            limit: cfg.limit,
            offset: cfg.offset,
        },
    ))
}

fn compile_edit(cfg: &EditConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    let input_ty = parent.schema().ty_of(&cfg.column)?;
    let (_, result_ty) = ops::resolve(input_ty, &cfg.function, cfg.args.len() + 1)?;
    let expr = op_call(&cfg.function, input_ty, &cfg.column, &cfg.args);
    let columns = parent
        .schema()
        .iter()
        .map(|col| {
            if col.name == cfg.column {
                Column {
                    name: col.name.clone(),
                    ty: result_ty,
                }
            } else {
                col.clone()
            }
        })
        .collect();
    Ok(RelExpr::new(
        Schema::new(columns),
        RelOp::Derive {
            input: Box::new(parent),
            column: cfg.column.clone(),
            expr,
        },
    ))
}

fn compile_add(cfg: &AddConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    validate_identifier(&cfg.label)?;
    if parent.schema().contains(&cfg.label) {
        return Err(CompileError::DuplicateColumn {
            name: cfg.label.clone(),
        });
    }
    let input_ty = parent.schema().ty_of(&cfg.column)?;
    let (_, result_ty) = ops::resolve(input_ty, &cfg.function, cfg.args.len() + 1)?;
    let expr = op_call(&cfg.function, input_ty, &cfg.column, &cfg.args);
    let mut schema = parent.schema().clone();
    schema.push(Column {
        name: cfg.label.clone(),
        ty: result_ty,
    });
    Ok(RelExpr::new(
        schema,
        RelOp::Derive {
            input: Box::new(parent),
            column: cfg.label.clone(),
            expr,
        },
    ))
}

fn op_call(function: &str, receiver_ty: SemanticType, column: &str, args: &[Literal]) -> ScalarExpr {
    let mut call_args = vec![ScalarExpr::column(column)];
    call_args.extend(args.iter().cloned().map(ScalarExpr::Literal));
    ScalarExpr::Call {
        function: function.to_string(),
        receiver_ty,
        args: call_args,
    }
}

fn compile_rename(cfg: &RenameConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    for (old, new) in &cfg.mapping {
        parent.schema().ty_of(old)?;
        validate_identifier(new)?;
    }
    let columns: Vec<Column> = parent
        .schema()
        .iter()
        .map(|col| {
            let name = cfg
                .mapping
                .iter()
                .find(|(old, _)| old == &col.name)
                .map(|(_, new)| new.clone())
                .unwrap_or_else(|| col.name.clone());
            Column { name, ty: col.ty }
        })
        .collect();
    if let Some(dup) = columns.iter().map(|c| &c.name).duplicates().next() {
        return Err(CompileError::DuplicateColumn { name: dup.clone() });
    }
    Ok(RelExpr::new(
        Schema::new(columns),
        RelOp::Rename {
            input: Box::new(parent),
            mapping: cfg.mapping.clone(),
        },
    ))
}

fn compile_formula(cfg: &FormulaConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    validate_identifier(&cfg.label)?;
    if parent.schema().contains(&cfg.label) {
        return Err(CompileError::DuplicateColumn {
            name: cfg.label.clone(),
        });
    }
    let (expr, result_ty) = crate::formula::compile(&cfg.formula, parent.schema())?;
    let mut schema = parent.schema().clone();
    schema.push(Column {
        name: cfg.label.clone(),
        ty: result_ty,
    });
    Ok(RelExpr::new(
        schema,
        RelOp::Derive {
            input: Box::new(parent),
            column: cfg.label.clone(),
            expr,
        },
    ))
}

fn compile_distinct(cfg: &DistinctConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    if let Some(columns) = &cfg.columns {
        for column in columns {
            parent.schema().ty_of(column)?;
        }
    }
    let schema = parent.schema().clone();
    Ok(RelExpr::new(
        schema,
        RelOp::Distinct {
            input: Box::new(parent),
            subset: cfg.columns.clone(),
        },
    ))
}

fn compile_window(cfg: &WindowConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    validate_identifier(&cfg.label)?;
    if parent.schema().contains(&cfg.label) {
        return Err(CompileError::DuplicateColumn {
            name: cfg.label.clone(),
        });
    }
    let input_ty = parent.schema().ty_of(&cfg.column)?;
    if cfg.function.requires_numeric() && !input_ty.is_numeric() {
        return Err(CompileError::TypeMismatch {
            column: cfg.column.clone(),
            expected: "numeric".into(),
            found: input_ty.to_string(),
        });
    }
    for column in &cfg.partition_by {
        parent.schema().ty_of(column)?;
    }
    for key in &cfg.order_by {
        parent.schema().ty_of(&key.column)?;
    }
    let mut schema = parent.schema().clone();
    schema.push(Column {
        name: cfg.label.clone(),
        ty: cfg.function.result_ty(input_ty),
    });
    Ok(RelExpr::new(
        schema,
        RelOp::Window {
            input: Box::new(parent),
            label: cfg.label.clone(),
            function: cfg.function,
            column: cfg.column.clone(),
            partition_by: cfg.partition_by.clone(),
            order_by: cfg.order_by.clone(),
        },
    ))
}

fn compile_convert(cfg: &ConvertConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    // The cast itself is always accepted here; non-parseable data surfaces
    // as a runtime error in the warehouse, not a compile error.
    parent.schema().ty_of(&cfg.column)?;
    let columns = parent
        .schema()
        .iter()
        .map(|col| {
            if col.name == cfg.column {
                Column {
                    name: col.name.clone(),
                    ty: cfg.to,
                }
            } else {
                col.clone()
            }
        })
        .collect();
    Ok(RelExpr::new(
        Schema::new(columns),
        RelOp::Derive {
            input: Box::new(parent),
            column: cfg.column.clone(),
            expr: ScalarExpr::Cast {
                expr: Box::new(ScalarExpr::column(&cfg.column)),
                to: cfg.to,
            },
        },
    ))
}

fn compile_pivot(cfg: &PivotConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    if cfg.values.is_empty() {
        return Err(CompileError::BadConfig(
            "pivot requires at least one value to spread".into(),
        ));
    }
    let schema = parent.schema();
    let spread_ty = schema.ty_of(&cfg.column)?;
    if spread_ty != SemanticType::Text {
        return Err(CompileError::TypeMismatch {
            column: cfg.column.clone(),
            expected: "text".into(),
            found: spread_ty.to_string(),
        });
    }
    let value_ty = schema.ty_of(&cfg.value)?;
    if cfg.function.requires_numeric() && !value_ty.is_numeric() {
        return Err(CompileError::TypeMismatch {
            column: cfg.value.clone(),
            expected: "numeric".into(),
            found: value_ty.to_string(),
        });
    }
    let mut columns = Vec::new();
    for index in &cfg.index {
        columns.push(Column {
            name: index.clone(),
            ty: schema.ty_of(index)?,
        });
    }
    let cell_ty = cfg.function.result_ty(value_ty);
    for value in &cfg.values {
        if columns.iter().any(|c| &c.name == value) {
            return Err(CompileError::DuplicateColumn {
                name: value.clone(),
            });
        }
        columns.push(Column {
            name: value.clone(),
            ty: cell_ty,
        });
    }
    Ok(RelExpr::new(
        Schema::new(columns),
        RelOp::Pivot {
            input: Box::new(parent),
            index: cfg.index.clone(),
            column: cfg.column.clone(),
            values: cfg.values.clone(),
            value: cfg.value.clone(),
            function: cfg.function,
        },
    ))
}

fn compile_unpivot(cfg: &UnpivotConfig, parent: RelExpr) -> Result<RelExpr, CompileError> {
    if cfg.columns.is_empty() {
        return Err(CompileError::BadConfig(
            "unpivot requires at least one column to melt".into(),
        ));
    }
    validate_identifier(&cfg.name_label)?;
    validate_identifier(&cfg.value_label)?;
    if cfg.name_label == cfg.value_label {
        return Err(CompileError::DuplicateColumn {
            name: cfg.value_label.clone(),
        });
    }
    let schema = parent.schema();
    let common_ty = schema.ty_of(&cfg.columns[0])?;
    for column in &cfg.columns[1..] {
        let ty = schema.ty_of(column)?;
        if ty != common_ty {
            return Err(CompileError::SchemaMismatch {
                column: column.clone(),
                left: common_ty.to_string(),
                right: ty.to_string(),
            });
        }
    }
    let mut columns: Vec<Column> = schema
        .iter()
        .filter(|col| !cfg.columns.iter().any(|c| c == &col.name))
        .cloned()
        .collect();
    for label in [&cfg.name_label, &cfg.value_label] {
        if columns.iter().any(|c| &c.name == label) {
            return Err(CompileError::DuplicateColumn {
                name: label.clone(),
            });
        }
    }
    columns.push(Column {
        name: cfg.name_label.clone(),
        ty: SemanticType::Text,
    });
    columns.push(Column {
        name: cfg.value_label.clone(),
        ty: common_ty,
    });
    Ok(RelExpr::new(
        Schema::new(columns),
        RelOp::Unpivot {
            input: Box::new(parent),
            columns: cfg.columns.clone(),
            name_label: cfg.name_label.clone(),
            value_label: cfg.value_label.clone(),
        },
    ))
}
