//! Arithmetic Expressions
//!
//! Recursive-descent evaluator for a deliberately small grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | '(' expr ')'
//! number  := digits ['.' digits] [('e' | 'E') ['+' | '-'] digits]
//! ```
//!
//! Anything outside the grammar is rejected, so model-supplied input can
//! never reach a general-purpose evaluator.

use crate::error::{Result, ToolsError};

const MAX_LENGTH: usize = 1024;
const MAX_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Evaluate an arithmetic expression
pub fn evaluate(expr: &str) -> Result<f64> {
    if expr.len() > MAX_LENGTH {
        return Err(ToolsError::Expression(format!(
            "expression longer than {MAX_LENGTH} characters"
        )));
    }

    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(ToolsError::Expression("expression is empty".into()));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr(0)?;
    if let Some(token) = parser.peek() {
        return Err(ToolsError::Expression(format!(
            "unexpected {token:?} after complete expression"
        )));
    }

    if value.is_finite() {
        Ok(value)
    } else {
        Err(ToolsError::Expression("result is not a finite number".into()))
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                i += exponent_len(&chars[i..]);
                let literal: String = chars[start..i].iter().collect();
                let number = literal.parse::<f64>().map_err(|_| {
                    ToolsError::Expression(format!("invalid number '{literal}'"))
                })?;
                tokens.push(Token::Number(number));
                continue;
            }
            other => {
                return Err(ToolsError::Expression(format!(
                    "unexpected character '{other}' at position {i}"
                )));
            }
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

/// Length of an `e[+-]digits` suffix at the start of `rest`, or 0
fn exponent_len(rest: &[char]) -> usize {
    let Some('e' | 'E') = rest.first() else {
        return 0;
    };
    let sign = usize::from(matches!(rest.get(1), Some('+' | '-')));
    let digits = rest[1 + sign..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits == 0 { 0 } else { 1 + sign + digits }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self, depth: usize) -> Result<f64> {
        let mut value = self.term(depth)?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term(depth)?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self, depth: usize) -> Result<f64> {
        let mut value = self.unary(depth)?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary(depth)?;
            value = if op == Token::Star {
                value * rhs
            } else if rhs == 0.0 {
                return Err(ToolsError::DivisionByZero);
            } else {
                value / rhs
            };
        }
        Ok(value)
    }

    fn unary(&mut self, depth: usize) -> Result<f64> {
        if depth > MAX_DEPTH {
            return Err(ToolsError::Expression("expression nested too deeply".into()));
        }
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary(depth + 1)?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary(depth + 1)
            }
            _ => self.primary(depth),
        }
    }

    fn primary(&mut self, depth: usize) -> Result<f64> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr(depth + 1)?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(ToolsError::Expression("missing closing parenthesis".into())),
                }
            }
            Some(token) => Err(ToolsError::Expression(format!("unexpected {token:?}"))),
            None => Err(ToolsError::Expression("unexpected end of expression".into())),
        }
    }
}
