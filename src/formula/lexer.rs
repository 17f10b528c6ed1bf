//! Tokenizer for the formula mini-language.

use crate::error::CompileError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    LParen,
    RParen,
    Comma,
    Dot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub position: usize,
}

fn syntax_error(message: impl Into<String>, position: usize) -> CompileError {
    CompileError::FormulaSyntax {
        message: message.into(),
        position,
    }
}

pub fn lex(input: &str) -> Result<Vec<SpannedToken>, CompileError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let start = pos;
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let token = match c {
            '+' => {
                pos += 1;
                Token::Plus
            }
            '-' => {
                pos += 1;
                Token::Minus
            }
            '*' => {
                pos += 1;
                Token::Star
            }
            '/' => {
                pos += 1;
                Token::Slash
            }
            '(' => {
                pos += 1;
                Token::LParen
            }
            ')' => {
                pos += 1;
                Token::RParen
            }
            ',' => {
                pos += 1;
                Token::Comma
            }
            '.' => {
                pos += 1;
                Token::Dot
            }
            '<' => {
                pos += 1;
                if chars.get(pos) == Some(&'=') {
                    pos += 1;
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                pos += 1;
                if chars.get(pos) == Some(&'=') {
                    pos += 1;
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '=' => {
                pos += 1;
                if chars.get(pos) == Some(&'=') {
                    pos += 1;
                    Token::EqEq
                } else {
                    return Err(syntax_error("expected '==' for equality", start));
                }
            }
            '!' => {
                pos += 1;
                if chars.get(pos) == Some(&'=') {
                    pos += 1;
                    Token::NotEq
                } else {
                    return Err(syntax_error("expected '!=' for inequality", start));
                }
            }
            '\'' | '"' => {
                let quote = c;
                pos += 1;
                let mut value = String::new();
                loop {
                    match chars.get(pos) {
                        Some(&ch) if ch == quote => {
                            pos += 1;
                            break;
                        }
                        Some(&ch) => {
                            value.push(ch);
                            pos += 1;
                        }
                        None => return Err(syntax_error("unterminated string literal", start)),
                    }
                }
                Token::Str(value)
            }
            '@' => {
                pos += 1;
                let mut raw = String::new();
                while let Some(&ch) = chars.get(pos) {
                    if ch.is_ascii_digit() || ch == '-' || ch == ':' || ch == 'T' {
                        raw.push(ch);
                        pos += 1;
                    } else {
                        break;
                    }
                }
                lex_temporal(&raw, start)?
            }
            _ if c.is_ascii_digit() => {
                let mut raw = String::new();
                let mut is_float = false;
                while let Some(&ch) = chars.get(pos) {
                    if ch.is_ascii_digit() {
                        raw.push(ch);
                        pos += 1;
                    } else if ch == '.' && !is_float && matches!(chars.get(pos + 1), Some(d) if d.is_ascii_digit()) {
                        is_float = true;
                        raw.push(ch);
                        pos += 1;
                    } else {
                        break;
                    }
                }
                if is_float {
                    let value = raw
                        .parse::<f64>()
                        .map_err(|_| syntax_error(format!("invalid number '{}'", raw), start))?;
                    Token::Float(value)
                } else {
                    let value = raw
                        .parse::<i64>()
                        .map_err(|_| syntax_error(format!("invalid number '{}'", raw), start))?;
                    Token::Int(value)
                }
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&ch) = chars.get(pos) {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        name.push(ch);
                        pos += 1;
                    } else {
                        break;
                    }
                }
                Token::Ident(name)
            }
            other => return Err(syntax_error(format!("unexpected character '{}'", other), start)),
        };

        tokens.push(SpannedToken {
            token,
            position: start,
        });
    }

    Ok(tokens)
}

/// `@`-prefixed temporal literals: `@2024-01-31`, `@10:30:00`, or
/// `@2024-01-31T10:30:00`.
fn lex_temporal(raw: &str, position: usize) -> Result<Token, CompileError> {
    if let Ok(value) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Token::Timestamp(value));
    }
    if let Ok(value) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Token::Date(value));
    }
    if let Ok(value) = NaiveTime::parse_from_str(raw, "%H:%M:%S") {
        return Ok(Token::Time(value));
    }
    Err(syntax_error(
        format!("invalid date/time literal '@{}'", raw),
        position,
    ))
}
