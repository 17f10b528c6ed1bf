//! The formula mini-language front-end.
//!
//! Formulas and built-in node kinds are two front-ends to one backend: a
//! formula string is parsed, resolved against the current schema and the
//! per-type capability table, and lowered to the same [`ScalarExpr`] IR the
//! compiler produces for EDIT/ADD operations. `upper(athlete)` therefore
//! compiles to exactly the expression an EDIT `upper` on `athlete` would.

use crate::compiler::ops;
use crate::error::CompileError;
use crate::rel::{ArithOp, Literal, ScalarExpr};
use crate::schema::{Schema, SemanticType};

mod lexer;
mod parser;

use parser::Ast;

/// Compiles a formula string against `schema`, returning the lowered
/// expression and its inferred semantic type.
pub fn compile(formula: &str, schema: &Schema) -> Result<(ScalarExpr, SemanticType), CompileError> {
    let tokens = lexer::lex(formula)?;
    if tokens.is_empty() {
        return Err(CompileError::FormulaSyntax {
            message: "empty formula".into(),
            position: 0,
        });
    }
    let ast = parser::parse(&tokens, formula.len())?;
    lower(&ast, schema)
}

fn lower(ast: &Ast, schema: &Schema) -> Result<(ScalarExpr, SemanticType), CompileError> {
    match ast {
        Ast::Int(v) => Ok((
            ScalarExpr::literal(Literal::Int(*v)),
            SemanticType::Integer,
        )),
        Ast::Float(v) => Ok((
            ScalarExpr::literal(Literal::Float(*v)),
            SemanticType::Float,
        )),
        Ast::Str(v) => Ok((
            ScalarExpr::literal(Literal::Text(v.clone())),
            SemanticType::Text,
        )),
        Ast::Date(v) => Ok((ScalarExpr::literal(Literal::Date(*v)), SemanticType::Date)),
        Ast::Time(v) => Ok((ScalarExpr::literal(Literal::Time(*v)), SemanticType::Time)),
        Ast::Timestamp(v) => Ok((
            ScalarExpr::literal(Literal::Timestamp(*v)),
            SemanticType::Timestamp,
        )),
        Ast::Column { name, .. } => {
            let ty = schema.ty_of(name)?;
            Ok((ScalarExpr::column(name), ty))
        }
        Ast::Neg(inner) => {
            let (expr, ty) = lower(inner, schema)?;
            if !ty.is_numeric() {
                return Err(CompileError::BadConfig(format!(
                    "cannot negate a {} value",
                    ty
                )));
            }
            Ok((ScalarExpr::Neg(Box::new(expr)), ty))
        }
        Ast::Arith { op, left, right } => {
            let (left_expr, left_ty) = lower(left, schema)?;
            let (right_expr, right_ty) = lower(right, schema)?;
            if !left_ty.is_numeric() || !right_ty.is_numeric() {
                return Err(CompileError::BadConfig(format!(
                    "operator '{}' requires numeric operands, found {} and {}",
                    op, left_ty, right_ty
                )));
            }
            let result = if *op == ArithOp::Div
                || left_ty == SemanticType::Float
                || right_ty == SemanticType::Float
            {
                SemanticType::Float
            } else {
                SemanticType::Integer
            };
            Ok((
                ScalarExpr::Arith {
                    op: *op,
                    left: Box::new(left_expr),
                    right: Box::new(right_expr),
                },
                result,
            ))
        }
        Ast::Cmp { op, left, right } => {
            let (left_expr, left_ty) = lower(left, schema)?;
            let (right_expr, right_ty) = lower(right, schema)?;
            if !comparable(left_ty, right_ty) {
                return Err(CompileError::BadConfig(format!(
                    "cannot compare {} with {}",
                    left_ty, right_ty
                )));
            }
            Ok((
                ScalarExpr::cmp(*op, left_expr, right_expr),
                SemanticType::Boolean,
            ))
        }
        Ast::Call {
            function,
            receiver,
            args,
            ..
        } => {
            let (receiver_expr, receiver_ty) = lower(receiver, schema)?;
            let (_, result_ty) = ops::resolve(receiver_ty, function, args.len() + 1)?;
            let mut call_args = vec![receiver_expr];
            for arg in args {
                let (expr, _) = lower(arg, schema)?;
                call_args.push(expr);
            }
            Ok((
                ScalarExpr::Call {
                    function: function.clone(),
                    receiver_ty,
                    args: call_args,
                },
                result_ty,
            ))
        }
    }
}

fn comparable(left: SemanticType, right: SemanticType) -> bool {
    if left == right {
        return true;
    }
    if left.is_numeric() && right.is_numeric() {
        return true;
    }
    matches!(
        (left, right),
        (SemanticType::Date, SemanticType::Timestamp) | (SemanticType::Timestamp, SemanticType::Date)
    )
}
