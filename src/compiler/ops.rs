//! The closed capability table for column operations.
//!
//! EDIT/ADD nodes and formula method calls resolve `(semantic type, function
//! name)` pairs against this table at compile time. Unknown pairs are a
//! [`CompileError::UnknownFunction`], never a runtime lookup failure.

use crate::error::CompileError;
use crate::schema::SemanticType;

/// Groups of semantic types that share one operation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Numeric,
    Text,
    Date,
    Time,
    Timestamp,
}

/// The result type of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpResult {
    /// Same type as the receiver.
    Same,
    Fixed(SemanticType),
}

/// One entry in the capability table. `arity` counts the receiver; `sql` is
/// a template with `{0}` (receiver), `{1}`, `{2}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct OpSpec {
    pub class: TypeClass,
    pub name: &'static str,
    pub arity: usize,
    pub result: OpResult,
    pub sql: &'static str,
}

use OpResult::{Fixed, Same};
use SemanticType::{Boolean, Date, Float, Integer, Text, Time};
use TypeClass as C;

static OPS: &[OpSpec] = &[
    // Numeric
    OpSpec { class: C::Numeric, name: "abs", arity: 1, result: Same, sql: "ABS({0})" },
    OpSpec { class: C::Numeric, name: "ceil", arity: 1, result: Fixed(Integer), sql: "CEIL({0})" },
    OpSpec { class: C::Numeric, name: "floor", arity: 1, result: Fixed(Integer), sql: "FLOOR({0})" },
    OpSpec { class: C::Numeric, name: "round", arity: 1, result: Fixed(Integer), sql: "ROUND({0})" },
    OpSpec { class: C::Numeric, name: "sqrt", arity: 1, result: Fixed(Float), sql: "SQRT({0})" },
    OpSpec { class: C::Numeric, name: "ln", arity: 1, result: Fixed(Float), sql: "LN({0})" },
    OpSpec { class: C::Numeric, name: "exp", arity: 1, result: Fixed(Float), sql: "EXP({0})" },
    OpSpec { class: C::Numeric, name: "power", arity: 2, result: Fixed(Float), sql: "POWER({0}, {1})" },
    // Text
    OpSpec { class: C::Text, name: "upper", arity: 1, result: Same, sql: "UPPER({0})" },
    OpSpec { class: C::Text, name: "lower", arity: 1, result: Same, sql: "LOWER({0})" },
    OpSpec { class: C::Text, name: "trim", arity: 1, result: Same, sql: "TRIM({0})" },
    OpSpec { class: C::Text, name: "capitalize", arity: 1, result: Same, sql: "INITCAP({0})" },
    OpSpec { class: C::Text, name: "reverse", arity: 1, result: Same, sql: "REVERSE({0})" },
    OpSpec { class: C::Text, name: "length", arity: 1, result: Fixed(Integer), sql: "LENGTH({0})" },
    OpSpec { class: C::Text, name: "concat", arity: 2, result: Same, sql: "({0} || {1})" },
    OpSpec { class: C::Text, name: "replace", arity: 3, result: Same, sql: "REPLACE({0}, {1}, {2})" },
    OpSpec { class: C::Text, name: "contains", arity: 2, result: Fixed(Boolean), sql: "({0} LIKE '%' || {1} || '%')" },
    OpSpec { class: C::Text, name: "startswith", arity: 2, result: Fixed(Boolean), sql: "({0} LIKE {1} || '%')" },
    OpSpec { class: C::Text, name: "endswith", arity: 2, result: Fixed(Boolean), sql: "({0} LIKE '%' || {1})" },
    // Date
    OpSpec { class: C::Date, name: "year", arity: 1, result: Fixed(Integer), sql: "EXTRACT(YEAR FROM {0})" },
    OpSpec { class: C::Date, name: "month", arity: 1, result: Fixed(Integer), sql: "EXTRACT(MONTH FROM {0})" },
    OpSpec { class: C::Date, name: "day", arity: 1, result: Fixed(Integer), sql: "EXTRACT(DAY FROM {0})" },
    OpSpec { class: C::Date, name: "quarter", arity: 1, result: Fixed(Integer), sql: "EXTRACT(QUARTER FROM {0})" },
    OpSpec { class: C::Date, name: "week", arity: 1, result: Fixed(Integer), sql: "EXTRACT(WEEK FROM {0})" },
    OpSpec { class: C::Date, name: "weekday", arity: 1, result: Fixed(Integer), sql: "EXTRACT(DOW FROM {0})" },
    OpSpec { class: C::Date, name: "add_days", arity: 2, result: Same, sql: "({0} + {1})" },
    // Time
    OpSpec { class: C::Time, name: "hour", arity: 1, result: Fixed(Integer), sql: "EXTRACT(HOUR FROM {0})" },
    OpSpec { class: C::Time, name: "minute", arity: 1, result: Fixed(Integer), sql: "EXTRACT(MINUTE FROM {0})" },
    OpSpec { class: C::Time, name: "second", arity: 1, result: Fixed(Integer), sql: "EXTRACT(SECOND FROM {0})" },
    // Timestamp
    OpSpec { class: C::Timestamp, name: "year", arity: 1, result: Fixed(Integer), sql: "EXTRACT(YEAR FROM {0})" },
    OpSpec { class: C::Timestamp, name: "month", arity: 1, result: Fixed(Integer), sql: "EXTRACT(MONTH FROM {0})" },
    OpSpec { class: C::Timestamp, name: "day", arity: 1, result: Fixed(Integer), sql: "EXTRACT(DAY FROM {0})" },
    OpSpec { class: C::Timestamp, name: "hour", arity: 1, result: Fixed(Integer), sql: "EXTRACT(HOUR FROM {0})" },
    OpSpec { class: C::Timestamp, name: "minute", arity: 1, result: Fixed(Integer), sql: "EXTRACT(MINUTE FROM {0})" },
    OpSpec { class: C::Timestamp, name: "second", arity: 1, result: Fixed(Integer), sql: "EXTRACT(SECOND FROM {0})" },
    OpSpec { class: C::Timestamp, name: "date", arity: 1, result: Fixed(Date), sql: "CAST({0} AS DATE)" },
    OpSpec { class: C::Timestamp, name: "time", arity: 1, result: Fixed(Time), sql: "CAST({0} AS TIME)" },
];

/// Maps a semantic type onto its operation class. Booleans have no
/// column operations.
pub fn class_of(ty: SemanticType) -> Option<TypeClass> {
    match ty {
        SemanticType::Integer | SemanticType::Float => Some(C::Numeric),
        SemanticType::Text => Some(C::Text),
        SemanticType::Date => Some(C::Date),
        SemanticType::Time => Some(C::Time),
        SemanticType::Timestamp => Some(C::Timestamp),
        SemanticType::Boolean => None,
    }
}

/// Looks up an operation for a receiver of type `ty`.
pub fn lookup(ty: SemanticType, name: &str) -> Option<&'static OpSpec> {
    let class = class_of(ty)?;
    OPS.iter().find(|op| op.class == class && op.name == name)
}

/// Resolves a call, checking existence and arity, and returns the spec
/// together with the call's result type.
pub fn resolve(
    ty: SemanticType,
    name: &str,
    arg_count: usize,
) -> Result<(&'static OpSpec, SemanticType), CompileError> {
    let spec = lookup(ty, name).ok_or_else(|| CompileError::UnknownFunction {
        ty: ty.to_string(),
        function: name.to_string(),
    })?;
    if arg_count != spec.arity {
        return Err(CompileError::WrongArity {
            function: name.to_string(),
            expected: spec.arity,
            found: arg_count,
        });
    }
    let result = match spec.result {
        OpResult::Same => ty,
        OpResult::Fixed(t) => t,
    };
    Ok((spec, result))
}
