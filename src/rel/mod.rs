//! The backend-neutral relational IR.
//!
//! Node kinds and formulas are two front-ends producing the same expression
//! types: [`ScalarExpr`] for column-level computation and [`RelExpr`] for
//! table-level operators. A [`RelExpr`] carries its propagated output schema
//! and can be rendered to a single SQL statement via
//! [`RelExpr::compile_to_sql`].

use crate::schema::{Schema, SemanticType, TableRef};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod sql;

/// A typed literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Null,
}

impl Literal {
    /// The semantic type of the literal, if it has one (`Null` does not).
    pub fn ty(&self) -> Option<SemanticType> {
        match self {
            Literal::Int(_) => Some(SemanticType::Integer),
            Literal::Float(_) => Some(SemanticType::Float),
            Literal::Text(_) => Some(SemanticType::Text),
            Literal::Bool(_) => Some(SemanticType::Boolean),
            Literal::Date(_) => Some(SemanticType::Date),
            Literal::Time(_) => Some(SemanticType::Time),
            Literal::Timestamp(_) => Some(SemanticType::Timestamp),
            Literal::Null => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Text(v) => write!(f, "'{}'", v),
            Literal::Bool(v) => write!(f, "{}", v),
            Literal::Date(v) => write!(f, "{}", v),
            Literal::Time(v) => write!(f, "{}", v),
            Literal::Timestamp(v) => write!(f, "{}", v),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        write!(f, "{}", sym)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        write!(f, "{}", sym)
    }
}

/// A column-level expression: the shared predicate/value IR.
///
/// FILTER trees, EDIT/ADD operations, formulas and date-range slices all
/// lower to this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarExpr {
    Column(String),
    Literal(Literal),
    Neg(Box<ScalarExpr>),
    Arith {
        op: ArithOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    Cmp {
        op: CmpOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    And(Box<ScalarExpr>, Box<ScalarExpr>),
    Or(Box<ScalarExpr>, Box<ScalarExpr>),
    Not(Box<ScalarExpr>),
    IsNull(Box<ScalarExpr>),
    NotNull(Box<ScalarExpr>),
    /// A call resolved against the per-type capability table at compile time.
    /// `receiver_ty` records the semantic type the function was resolved for;
    /// the receiver is the first argument.
    Call {
        function: String,
        receiver_ty: SemanticType,
        args: Vec<ScalarExpr>,
    },
    Cast {
        expr: Box<ScalarExpr>,
        to: SemanticType,
    },
}

impl ScalarExpr {
    pub fn column(name: impl Into<String>) -> Self {
        ScalarExpr::Column(name.into())
    }

    pub fn literal(value: Literal) -> Self {
        ScalarExpr::Literal(value)
    }

    pub fn cmp(op: CmpOp, left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Cmp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::And(Box::new(left), Box::new(right))
    }
}

/// A boolean-valued [`ScalarExpr`].
pub type Predicate = ScalarExpr;

/// Aggregation functions available to AGGREGATION, WINDOW and PIVOT nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFunc {
    Sum,
    Count,
    Mean,
    Max,
    Min,
    Std,
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Count => "count",
            AggFunc::Mean => "mean",
            AggFunc::Max => "max",
            AggFunc::Min => "min",
            AggFunc::Std => "std",
        }
    }

    /// Whether the function only accepts numeric inputs.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, AggFunc::Sum | AggFunc::Mean | AggFunc::Std)
    }

    /// Output type for an input of type `input`.
    pub fn result_ty(&self, input: SemanticType) -> SemanticType {
        match self {
            AggFunc::Count => SemanticType::Integer,
            AggFunc::Mean | AggFunc::Std => SemanticType::Float,
            AggFunc::Sum | AggFunc::Max | AggFunc::Min => input,
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Join strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinHow {
    Inner,
    Outer,
    Left,
    Right,
}

/// One sort criterion; criteria are applied left-to-right as a tie-break
/// chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// One aggregation: `function` applied to `column`, emitted as `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agg {
    pub name: String,
    pub column: String,
    pub function: AggFunc,
}

/// Set-operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOpKind {
    Union,
    Except,
    Intersect,
}

/// A relational operator tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelOp {
    /// Scan of a materialized warehouse table.
    Scan { table: TableRef },
    /// Projection to a named column subset, in the given order.
    Select {
        input: Box<RelExpr>,
        columns: Vec<String>,
    },
    /// Adds or replaces a single computed column. If `column` already exists
    /// in the input it is replaced in place, otherwise appended.
    Derive {
        input: Box<RelExpr>,
        column: String,
        expr: ScalarExpr,
    },
    Filter {
        input: Box<RelExpr>,
        predicate: Predicate,
    },
    Join {
        left: Box<RelExpr>,
        right: Box<RelExpr>,
        how: JoinHow,
        left_on: String,
        right_on: String,
    },
    Aggregate {
        input: Box<RelExpr>,
        group_by: Vec<String>,
        aggs: Vec<Agg>,
    },
    /// Positional set operation over two or more inputs.
    SetOp {
        kind: SetOpKind,
        inputs: Vec<RelExpr>,
        distinct: bool,
    },
    Sort {
        input: Box<RelExpr>,
        keys: Vec<SortKey>,
    },
    Limit {
        input: Box<RelExpr>,
        limit: u64,
        offset: Option<u64>,
    },
    /// Deduplication over a column subset, or over all columns if unset.
    Distinct {
        input: Box<RelExpr>,
        subset: Option<Vec<String>>,
    },
    /// Windowed aggregation appended as a new column.
    Window {
        input: Box<RelExpr>,
        label: String,
        function: AggFunc,
        column: String,
        partition_by: Vec<String>,
        order_by: Vec<SortKey>,
    },
    /// Wide reshape: one output column per configured pivot value.
    Pivot {
        input: Box<RelExpr>,
        index: Vec<String>,
        column: String,
        values: Vec<String>,
        value: String,
        function: AggFunc,
    },
    /// Long reshape: melts `columns` into name/value pairs.
    Unpivot {
        input: Box<RelExpr>,
        columns: Vec<String>,
        name_label: String,
        value_label: String,
    },
    Rename {
        input: Box<RelExpr>,
        mapping: Vec<(String, String)>,
    },
}

/// A compiled relational expression: an operator tree plus the output schema
/// the compiler propagated for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelExpr {
    schema: Schema,
    op: RelOp,
}

impl RelExpr {
    pub fn new(schema: Schema, op: RelOp) -> Self {
        Self { schema, op }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn op(&self) -> &RelOp {
        &self.op
    }

    /// Renders the expression tree as one nested-SELECT SQL statement.
    pub fn compile_to_sql(&self) -> String {
        sql::render(self)
    }
}
