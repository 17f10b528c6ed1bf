//! Recursive-descent parser producing the untyped formula AST.
//!
//! Grammar, loosest first:
//!
//! ```text
//! expr    := add ( cmp-op add )*
//! add     := mul ( ('+' | '-') mul )*
//! mul     := unary ( ('*' | '/') unary )*
//! unary   := '-' unary | postfix
//! postfix := primary ( '.' ident '(' args ')' )*
//! primary := literal | ident | ident '(' args ')' | '(' expr ')'
//! ```
//!
//! `ident(args…)` is sugar for `args[0].ident(args[1:]…)`.

use super::lexer::{SpannedToken, Token};
use crate::error::CompileError;
use crate::rel::{ArithOp, CmpOp};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Column {
        name: String,
        position: usize,
    },
    Neg(Box<Ast>),
    Arith {
        op: ArithOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    Cmp {
        op: CmpOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    Call {
        function: String,
        receiver: Box<Ast>,
        args: Vec<Ast>,
        position: usize,
    },
}

pub fn parse(tokens: &[SpannedToken], source_len: usize) -> Result<Ast, CompileError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        source_len,
    };
    let ast = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(syntax_error(
            format!("unexpected trailing input near '{:?}'", extra.token),
            extra.position,
        ));
    }
    Ok(ast)
}

fn syntax_error(message: impl Into<String>, position: usize) -> CompileError {
    CompileError::FormulaSyntax {
        message: message.into(),
        position,
    }
}

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    source_len: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn end_position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.position)
            .unwrap_or(self.source_len)
    }

    fn expect(&mut self, expected: &Token, describe: &str) -> Result<(), CompileError> {
        match self.peek() {
            Some(spanned) if &spanned.token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(spanned) => Err(syntax_error(
                format!("expected {}", describe),
                spanned.position,
            )),
            None => Err(syntax_error(
                format!("expected {}, found end of formula", describe),
                self.source_len,
            )),
        }
    }

    fn expr(&mut self) -> Result<Ast, CompileError> {
        let mut left = self.add()?;
        while let Some(op) = self.peek().and_then(|t| cmp_op(&t.token)) {
            self.pos += 1;
            let right = self.add()?;
            left = Ast::Cmp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn add(&mut self) -> Result<Ast, CompileError> {
        let mut left = self.mul()?;
        loop {
            let op = match self.peek().map(|t| &t.token) {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.mul()?;
            left = Ast::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn mul(&mut self) -> Result<Ast, CompileError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().map(|t| &t.token) {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Ast::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Ast, CompileError> {
        if matches!(self.peek().map(|t| &t.token), Some(Token::Minus)) {
            self.pos += 1;
            let inner = self.unary()?;
            return Ok(Ast::Neg(Box::new(inner)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Ast, CompileError> {
        let mut value = self.primary()?;
        while matches!(self.peek().map(|t| &t.token), Some(Token::Dot)) {
            let dot_position = self.end_position();
            self.pos += 1;
            let (function, position) = match self.advance() {
                Some(SpannedToken {
                    token: Token::Ident(name),
                    position,
                }) => (name.clone(), *position),
                _ => return Err(syntax_error("expected function name after '.'", dot_position)),
            };
            self.expect(&Token::LParen, "'(' after function name")?;
            let args = self.args()?;
            value = Ast::Call {
                function,
                receiver: Box::new(value),
                args,
                position,
            };
        }
        Ok(value)
    }

    fn args(&mut self) -> Result<Vec<Ast>, CompileError> {
        let mut args = Vec::new();
        if matches!(self.peek().map(|t| &t.token), Some(Token::RParen)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.peek().map(|t| &t.token) {
                Some(Token::Comma) => {
                    self.pos += 1;
                }
                Some(Token::RParen) => {
                    self.pos += 1;
                    return Ok(args);
                }
                _ => {
                    let position = self.end_position();
                    return Err(syntax_error("expected ',' or ')' in argument list", position));
                }
            }
        }
    }

    fn primary(&mut self) -> Result<Ast, CompileError> {
        let position = self.end_position();
        let spanned = match self.advance() {
            Some(spanned) => spanned.clone(),
            None => {
                return Err(syntax_error(
                    "unexpected end of formula",
                    self.source_len,
                ))
            }
        };
        match spanned.token {
            Token::Int(v) => Ok(Ast::Int(v)),
            Token::Float(v) => Ok(Ast::Float(v)),
            Token::Str(v) => Ok(Ast::Str(v)),
            Token::Date(v) => Ok(Ast::Date(v)),
            Token::Time(v) => Ok(Ast::Time(v)),
            Token::Timestamp(v) => Ok(Ast::Timestamp(v)),
            Token::Ident(name) => {
                // A call written `func(x, …)` dispatches on its first
                // argument: sugar for `x.func(…)`.
                if matches!(self.peek().map(|t| &t.token), Some(Token::LParen)) {
                    self.pos += 1;
                    let mut args = self.args()?;
                    if args.is_empty() {
                        return Err(syntax_error(
                            format!("function '{}' requires at least one argument", name),
                            spanned.position,
                        ));
                    }
                    let receiver = args.remove(0);
                    Ok(Ast::Call {
                        function: name,
                        receiver: Box::new(receiver),
                        args,
                        position: spanned.position,
                    })
                } else {
                    Ok(Ast::Column {
                        name,
                        position: spanned.position,
                    })
                }
            }
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(syntax_error(
                format!("unexpected token '{:?}'", other),
                position,
            )),
        }
    }
}

fn cmp_op(token: &Token) -> Option<CmpOp> {
    match token {
        Token::Lt => Some(CmpOp::Lt),
        Token::Le => Some(CmpOp::Le),
        Token::Gt => Some(CmpOp::Gt),
        Token::Ge => Some(CmpOp::Ge),
        Token::EqEq => Some(CmpOp::Eq),
        Token::NotEq => Some(CmpOp::Ne),
        _ => None,
    }
}
