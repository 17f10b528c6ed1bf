//! Renders a [`RelExpr`] tree as one nested-SELECT SQL statement.
//!
//! The output is ANSI-leaning SQL; the warehouse collaborator owns any
//! dialect quirks beyond what the capability table's templates encode.

use super::{AggFunc, ArithOp, JoinHow, Literal, RelExpr, RelOp, ScalarExpr, SetOpKind};
use crate::compiler::ops;
use crate::schema::{SemanticType, TableRef};

pub fn render(expr: &RelExpr) -> String {
    render_rel(expr, 0)
}

/// Quotes an identifier for SQL.
fn q(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualified(table: &TableRef) -> String {
    format!("{}.{}", q(&table.namespace), q(&table.name))
}

fn escape_text(value: &str) -> String {
    value.replace('\'', "''")
}

fn sql_type(ty: SemanticType) -> &'static str {
    match ty {
        SemanticType::Integer => "BIGINT",
        SemanticType::Float => "DOUBLE PRECISION",
        SemanticType::Text => "VARCHAR",
        SemanticType::Boolean => "BOOLEAN",
        SemanticType::Date => "DATE",
        SemanticType::Time => "TIME",
        SemanticType::Timestamp => "TIMESTAMP",
    }
}

fn literal(value: &Literal) -> String {
    match value {
        Literal::Int(v) => v.to_string(),
        Literal::Float(v) => v.to_string(),
        Literal::Text(v) => format!("'{}'", escape_text(v)),
        Literal::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        Literal::Date(v) => format!("DATE '{}'", v),
        Literal::Time(v) => format!("TIME '{}'", v),
        Literal::Timestamp(v) => format!("TIMESTAMP '{}'", v.format("%Y-%m-%d %H:%M:%S")),
        Literal::Null => "NULL".to_string(),
    }
}

fn scalar(expr: &ScalarExpr) -> String {
    match expr {
        ScalarExpr::Column(name) => q(name),
        ScalarExpr::Literal(v) => literal(v),
        ScalarExpr::Neg(inner) => format!("(-{})", scalar(inner)),
        ScalarExpr::Arith { op, left, right } => {
            let sym = match op {
                ArithOp::Add => "+",
                ArithOp::Sub => "-",
                ArithOp::Mul => "*",
                ArithOp::Div => "/",
            };
            format!("({} {} {})", scalar(left), sym, scalar(right))
        }
        ScalarExpr::Cmp { op, left, right } => {
            format!("({} {} {})", scalar(left), op, scalar(right))
        }
        ScalarExpr::And(l, r) => format!("({} AND {})", scalar(l), scalar(r)),
        ScalarExpr::Or(l, r) => format!("({} OR {})", scalar(l), scalar(r)),
        ScalarExpr::Not(inner) => format!("(NOT {})", scalar(inner)),
        ScalarExpr::IsNull(inner) => format!("({} IS NULL)", scalar(inner)),
        ScalarExpr::NotNull(inner) => format!("({} IS NOT NULL)", scalar(inner)),
        ScalarExpr::Call {
            function,
            receiver_ty,
            args,
        } => {
            let rendered: Vec<String> = args.iter().map(scalar).collect();
            match ops::lookup(*receiver_ty, function) {
                Some(spec) => {
                    let mut out = spec.sql.to_string();
                    for (i, arg) in rendered.iter().enumerate() {
                        out = out.replace(&format!("{{{}}}", i), arg);
                    }
                    out
                }
                // Post-compile expressions always resolve; kept as a readable
                // fallback for hand-built trees.
                None => format!("{}({})", function.to_uppercase(), rendered.join(", ")),
            }
        }
        ScalarExpr::Cast { expr, to } => format!("CAST({} AS {})", scalar(expr), sql_type(*to)),
    }
}

fn agg_sql(function: AggFunc, column: &str) -> String {
    let col = q(column);
    match function {
        AggFunc::Sum => format!("SUM({})", col),
        AggFunc::Count => format!("COUNT({})", col),
        AggFunc::Mean => format!("AVG({})", col),
        AggFunc::Max => format!("MAX({})", col),
        AggFunc::Min => format!("MIN({})", col),
        AggFunc::Std => format!("STDDEV({})", col),
    }
}

/// Renders `input` as a parenthesized FROM item with a depth-scoped alias.
fn from_item(input: &RelExpr, depth: usize) -> String {
    format!("({}) AS t{}", render_rel(input, depth + 1), depth)
}

fn render_rel(expr: &RelExpr, depth: usize) -> String {
    match expr.op() {
        RelOp::Scan { table } => format!("SELECT * FROM {}", qualified(table)),

        RelOp::Select { input, columns } => {
            let cols: Vec<String> = columns.iter().map(|c| q(c)).collect();
            format!("SELECT {} FROM {}", cols.join(", "), from_item(input, depth))
        }

        RelOp::Derive {
            input,
            column,
            expr: derived,
        } => {
            // The output schema holds the final column list; the derived
            // column is emitted in place (replace) or at the end (append).
            let cols: Vec<String> = expr
                .schema()
                .iter()
                .map(|c| {
                    if c.name == *column {
                        format!("{} AS {}", scalar(derived), q(&c.name))
                    } else {
                        q(&c.name)
                    }
                })
                .collect();
            format!("SELECT {} FROM {}", cols.join(", "), from_item(input, depth))
        }

        RelOp::Filter { input, predicate } => format!(
            "SELECT * FROM {} WHERE {}",
            from_item(input, depth),
            scalar(predicate)
        ),

        RelOp::Join {
            left,
            right,
            how,
            left_on,
            right_on,
        } => {
            let keyword = match how {
                JoinHow::Inner => "INNER JOIN",
                JoinHow::Outer => "FULL OUTER JOIN",
                JoinHow::Left => "LEFT JOIN",
                JoinHow::Right => "RIGHT JOIN",
            };
            let left_alias = format!("l{}", depth);
            let right_alias = format!("r{}", depth);
            let mut cols = Vec::with_capacity(expr.schema().len());
            for col in left.schema().iter() {
                cols.push(format!("{}.{}", left_alias, q(&col.name)));
            }
            for col in right.schema().iter() {
                cols.push(format!("{}.{}", right_alias, q(&col.name)));
            }
            format!(
                "SELECT {} FROM ({}) AS {} {} ({}) AS {} ON {}.{} = {}.{}",
                cols.join(", "),
                render_rel(left, depth + 1),
                left_alias,
                keyword,
                render_rel(right, depth + 1),
                right_alias,
                left_alias,
                q(left_on),
                right_alias,
                q(right_on),
            )
        }

        RelOp::Aggregate {
            input,
            group_by,
            aggs,
        } => {
            let mut cols: Vec<String> = group_by.iter().map(|c| q(c)).collect();
            for agg in aggs {
                cols.push(format!("{} AS {}", agg_sql(agg.function, &agg.column), q(&agg.name)));
            }
            let mut sql = format!("SELECT {} FROM {}", cols.join(", "), from_item(input, depth));
            if !group_by.is_empty() {
                let keys: Vec<String> = group_by.iter().map(|c| q(c)).collect();
                sql.push_str(&format!(" GROUP BY {}", keys.join(", ")));
            }
            sql
        }

        RelOp::SetOp {
            kind,
            inputs,
            distinct,
        } => {
            let connector = match (kind, distinct) {
                (SetOpKind::Union, false) => " UNION ALL ",
                (SetOpKind::Union, true) => " UNION ",
                (SetOpKind::Except, _) => " EXCEPT ",
                (SetOpKind::Intersect, _) => " INTERSECT ",
            };
            inputs
                .iter()
                .enumerate()
                .map(|(i, input)| {
                    format!("SELECT * FROM ({}) AS u{}", render_rel(input, depth + 1), i)
                })
                .collect::<Vec<_>>()
                .join(connector)
        }

        RelOp::Sort { input, keys } => {
            let order: Vec<String> = keys
                .iter()
                .map(|k| {
                    format!("{} {}", q(&k.column), if k.ascending { "ASC" } else { "DESC" })
                })
                .collect();
            format!(
                "SELECT * FROM {} ORDER BY {}",
                from_item(input, depth),
                order.join(", ")
            )
        }

        RelOp::Limit {
            input,
            limit,
            offset,
        } => {
            let mut sql = format!("SELECT * FROM {} LIMIT {}", from_item(input, depth), limit);
            if let Some(offset) = offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
            sql
        }

        RelOp::Distinct { input, subset } => match subset {
            None => format!("SELECT DISTINCT * FROM {}", from_item(input, depth)),
            Some(columns) => {
                let keys: Vec<String> = columns.iter().map(|c| q(c)).collect();
                format!(
                    "SELECT DISTINCT ON ({}) * FROM {} ORDER BY {}",
                    keys.join(", "),
                    from_item(input, depth),
                    keys.join(", ")
                )
            }
        },

        RelOp::Window {
            input,
            label,
            function,
            column,
            partition_by,
            order_by,
        } => {
            let mut over = Vec::new();
            if !partition_by.is_empty() {
                let keys: Vec<String> = partition_by.iter().map(|c| q(c)).collect();
                over.push(format!("PARTITION BY {}", keys.join(", ")));
            }
            if !order_by.is_empty() {
                let keys: Vec<String> = order_by
                    .iter()
                    .map(|k| {
                        format!("{} {}", q(&k.column), if k.ascending { "ASC" } else { "DESC" })
                    })
                    .collect();
                over.push(format!("ORDER BY {}", keys.join(", ")));
            }
            format!(
                "SELECT *, {} OVER ({}) AS {} FROM {}",
                agg_sql(*function, column),
                over.join(" "),
                q(label),
                from_item(input, depth)
            )
        }

        RelOp::Pivot {
            input,
            index,
            column,
            values,
            value,
            function,
        } => {
            let mut cols: Vec<String> = index.iter().map(|c| q(c)).collect();
            for v in values {
                let case = format!(
                    "CASE WHEN {} = '{}' THEN {} END",
                    q(column),
                    escape_text(v),
                    q(value)
                );
                let agg = match function {
                    AggFunc::Sum => format!("SUM({})", case),
                    AggFunc::Count => format!("COUNT({})", case),
                    AggFunc::Mean => format!("AVG({})", case),
                    AggFunc::Max => format!("MAX({})", case),
                    AggFunc::Min => format!("MIN({})", case),
                    AggFunc::Std => format!("STDDEV({})", case),
                };
                cols.push(format!("{} AS {}", agg, q(v)));
            }
            let keys: Vec<String> = index.iter().map(|c| q(c)).collect();
            format!(
                "SELECT {} FROM {} GROUP BY {}",
                cols.join(", "),
                from_item(input, depth),
                keys.join(", ")
            )
        }

        RelOp::Unpivot {
            input,
            columns,
            name_label,
            value_label,
        } => {
            let kept: Vec<String> = input
                .schema()
                .names()
                .filter(|n| !columns.iter().any(|c| c == n))
                .map(q)
                .collect();
            columns
                .iter()
                .enumerate()
                .map(|(i, melted)| {
                    let mut cols = kept.clone();
                    cols.push(format!("'{}' AS {}", escape_text(melted), q(name_label)));
                    cols.push(format!("{} AS {}", q(melted), q(value_label)));
                    format!(
                        "SELECT {} FROM ({}) AS m{}",
                        cols.join(", "),
                        render_rel(input, depth + 1),
                        i
                    )
                })
                .collect::<Vec<_>>()
                .join(" UNION ALL ")
        }

        RelOp::Rename { input, mapping } => {
            let cols: Vec<String> = input
                .schema()
                .names()
                .map(|name| match mapping.iter().find(|(old, _)| old == name) {
                    Some((_, new)) => format!("{} AS {}", q(name), q(new)),
                    None => q(name),
                })
                .collect();
            format!("SELECT {} FROM {}", cols.join(", "), from_item(input, depth))
        }
    }
}
