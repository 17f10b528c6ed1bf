//! Node kinds and their kind-specific configuration.
//!
//! `NodeKind` is a closed sum type: adding a kind forces every consumer
//! (arity table, compiler match, serde surface) to be updated.

use crate::daterange::DateRange;
use crate::rel::{AggFunc, CmpOp, JoinHow, Literal, SortKey};
use crate::schema::{SemanticType, TableRef};
use serde::{Deserialize, Serialize};

/// Column list interpretation for SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub table: TableRef,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Materialized table name; generated from the workflow and node when
    /// unset.
    pub table_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectConfig {
    pub mode: SelectMode,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinConfig {
    pub how: JoinHow,
    /// Key columns stay optional while the user is still wiring parents.
    pub left_on: Option<String>,
    pub right_on: Option<String>,
}

/// One aggregation: `function` applied to `column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggSpec {
    pub column: String,
    pub function: AggFunc,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub group_by: Vec<String>,
    pub aggregations: Vec<AggSpec>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnionConfig {
    pub distinct: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    pub keys: Vec<SortKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitConfig {
    pub limit: u64,
    pub offset: Option<u64>,
}

/// A column-typed predicate tree built by the filter form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPredicate {
    /// Conjunction of all children.
    All(Vec<FilterPredicate>),
    /// Disjunction of any child.
    Any(Vec<FilterPredicate>),
    Compare {
        column: String,
        op: CmpOp,
        value: Literal,
    },
    Contains {
        column: String,
        value: String,
    },
    StartsWith {
        column: String,
        value: String,
    },
    EndsWith {
        column: String,
        value: String,
    },
    IsNull {
        column: String,
    },
    NotNull {
        column: String,
    },
    /// A relative date window over a date/datetime column, resolved against
    /// the compiler's anchor instant.
    DateRange {
        column: String,
        range: DateRange,
        #[serde(default)]
        previous: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub predicate: FilterPredicate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditConfig {
    pub column: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddConfig {
    pub column: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<Literal>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenameConfig {
    /// `(current name, new name)` pairs.
    pub mapping: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaConfig {
    pub formula: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DistinctConfig {
    /// Dedupe key; all columns when unset.
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub column: String,
    pub function: AggFunc,
    #[serde(default)]
    pub partition_by: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<SortKey>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    pub column: String,
    pub to: SemanticType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    pub index: Vec<String>,
    /// Column whose values spread into new columns.
    pub column: String,
    /// The spread values, collected up front so the output schema is static.
    pub values: Vec<String>,
    /// Column aggregated into the spread cells.
    pub value: String,
    pub function: AggFunc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnpivotConfig {
    pub columns: Vec<String>,
    pub name_label: String,
    pub value_label: String,
}

/// A node's operation tag with its kind-specific configuration embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Input(InputConfig),
    Output(OutputConfig),
    Select(SelectConfig),
    Join(JoinConfig),
    Aggregation(AggregationConfig),
    Union(UnionConfig),
    Except,
    Intersect,
    Sort(SortConfig),
    Limit(LimitConfig),
    Filter(FilterConfig),
    Edit(EditConfig),
    Add(AddConfig),
    Rename(RenameConfig),
    Formula(FormulaConfig),
    Distinct(DistinctConfig),
    Window(WindowConfig),
    Convert(ConvertConfig),
    Pivot(PivotConfig),
    Unpivot(UnpivotConfig),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Input(_) => "INPUT",
            NodeKind::Output(_) => "OUTPUT",
            NodeKind::Select(_) => "SELECT",
            NodeKind::Join(_) => "JOIN",
            NodeKind::Aggregation(_) => "AGGREGATION",
            NodeKind::Union(_) => "UNION",
            NodeKind::Except => "EXCEPT",
            NodeKind::Intersect => "INTERSECT",
            NodeKind::Sort(_) => "SORT",
            NodeKind::Limit(_) => "LIMIT",
            NodeKind::Filter(_) => "FILTER",
            NodeKind::Edit(_) => "EDIT",
            NodeKind::Add(_) => "ADD",
            NodeKind::Rename(_) => "RENAME",
            NodeKind::Formula(_) => "FORMULA",
            NodeKind::Distinct(_) => "DISTINCT",
            NodeKind::Window(_) => "WINDOW",
            NodeKind::Convert(_) => "CONVERT",
            NodeKind::Pivot(_) => "PIVOT",
            NodeKind::Unpivot(_) => "UNPIVOT",
        }
    }

    /// Minimum number of connected parents this kind compiles with.
    pub fn min_parents(&self) -> usize {
        match self {
            NodeKind::Input(_) => 0,
            NodeKind::Join(_) | NodeKind::Union(_) | NodeKind::Except | NodeKind::Intersect => 2,
            _ => 1,
        }
    }

    /// Maximum number of parents, or `None` for unbounded (UNION).
    pub fn max_parents(&self) -> Option<usize> {
        match self {
            NodeKind::Input(_) => Some(0),
            NodeKind::Union(_) => None,
            NodeKind::Join(_) | NodeKind::Except | NodeKind::Intersect => Some(2),
            _ => Some(1),
        }
    }

    /// Whether parent edge order carries meaning (join sides, stack order).
    pub fn order_sensitive(&self) -> bool {
        matches!(
            self,
            NodeKind::Join(_) | NodeKind::Union(_) | NodeKind::Except | NodeKind::Intersect
        )
    }
}
