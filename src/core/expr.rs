//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Conditional lists: `item`, `flag? ( items... )`, and `!flag? ( items... )`.

use crate::core::flags::Flags;
use std::fmt::Display;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Item(String),
    Cond {
        negate: bool,
        flag: String,
        body: Vec<Expr>,
    },
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Open,
    Close,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<Chars> = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            c if c.is_whitespace() => (),
            c => {
                let mut word = String::from(c);
                while let Some(n) = chars.peek() {
                    if n.is_whitespace() || *n == '(' || *n == ')' {
                        break;
                    }
                    word.push(*n);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    tokens
}

fn parse_terms<I>(tokens: &mut Peekable<I>, depth: usize) -> Result<Vec<Expr>, ExprError>
where
    I: Iterator<Item = Token>,
{
    let mut exprs = Vec::new();
    while let Some(tk) = tokens.next() {
        match tk {
            Token::Close => {
                if depth == 0 {
                    return Err(ExprError::UnexpectedClose);
                }
                return Ok(exprs);
            }
            Token::Open => return Err(ExprError::UnexpectedOpen),
            Token::Word(w) => match w.strip_suffix('?') {
                Some(cond) => {
                    let (negate, flag) = match cond.strip_prefix('!') {
                        Some(f) => (true, f),
                        None => (false, cond),
                    };
                    if flag.is_empty() == true {
                        return Err(ExprError::EmptyFlag);
                    }
                    if tokens.next() != Some(Token::Open) {
                        return Err(ExprError::MissingOpen(flag.to_string()));
                    }
                    let body = parse_terms(tokens, depth + 1)?;
                    exprs.push(Expr::Cond {
                        negate: negate,
                        flag: flag.to_string(),
                        body: body,
                    });
                }
                None => exprs.push(Expr::Item(w)),
            },
        }
    }
    match depth {
        0 => Ok(exprs),
        _ => Err(ExprError::Unclosed),
    }
}

/// Parses a single list entry, which may hold several items.
pub fn parse(text: &str) -> Result<Vec<Expr>, ExprError> {
    let mut tokens = tokenize(text).into_iter().peekable();
    parse_terms(&mut tokens, 0)
}

/// Parses every entry of `list` into one sequence of expressions.
pub fn parse_list(list: &[String]) -> Result<Vec<Expr>, ExprError> {
    let mut exprs = Vec::new();
    for entry in list {
        exprs.append(&mut parse(entry)?);
    }
    Ok(exprs)
}

/// Selects the items active under `flags`, in declaration order.
pub fn evaluate(exprs: &[Expr], flags: &Flags) -> Vec<String> {
    let mut items = Vec::new();
    for e in exprs {
        match e {
            Expr::Item(s) => items.push(s.clone()),
            Expr::Cond { negate, flag, body } => {
                if flags.is_set(flag) != *negate {
                    items.append(&mut evaluate(body, flags));
                }
            }
        }
    }
    items
}

/// Collects every item from every branch, regardless of conditions.
pub fn flatten(exprs: &[Expr]) -> Vec<String> {
    let mut items = Vec::new();
    for e in exprs {
        match e {
            Expr::Item(s) => items.push(s.clone()),
            Expr::Cond { body, .. } => items.append(&mut flatten(body)),
        }
    }
    items
}

#[derive(Debug, PartialEq)]
pub enum ExprError {
    UnexpectedClose,
    UnexpectedOpen,
    Unclosed,
    EmptyFlag,
    MissingOpen(String),
}

impl std::error::Error for ExprError {}

impl Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedClose => write!(f, "unexpected ')'"),
            Self::UnexpectedOpen => write!(f, "'(' must follow a condition"),
            Self::Unclosed => write!(f, "missing closing ')'"),
            Self::EmptyFlag => write!(f, "condition is missing a flag name"),
            Self::MissingOpen(flag) => write!(f, "condition {:?} must be followed by '('", flag),
        }
    }
}
