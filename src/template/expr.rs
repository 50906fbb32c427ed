//! Safe evaluation of computed-field expressions.
//!
//! Template builders can attach small expressions to computed fields, e.g.
//! `marks.obtained / marks.total * 100` or `firstName + ' ' + lastName`.
//! These used to be evaluated as live script; here they go through a
//! whitelisted grammar instead, so caller-supplied text is parsed, never
//! executed:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := number | 'string' | identifier | '(' expr ')' | '-' factor
//! ```
//!
//! Values are numbers or strings. `+` concatenates when either operand is a
//! string; every other operator requires two numbers. Identifiers resolve
//! dot-paths against the data record and must exist: computed expressions
//! are authored alongside the template, so a missing variable is a template
//! bug worth surfacing, unlike merge placeholders which degrade to "".

use serde_json::Value;
use thiserror::Error;

use super::merge::resolve_path;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("variable '{0}' is not a number or string")]
    NonScalar(String),
    #[error("operator '{0}' requires numeric operands")]
    TypeMismatch(char),
    #[error("division by zero")]
    DivisionByZero,
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Number(f64),
    Text(String),
}

impl ExprValue {
    /// Render the value the way a computed field is painted.
    pub fn into_display(self) -> String {
        match self {
            // Integral results print without a trailing ".0".
            ExprValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                format!("{}", n as i64)
            }
            ExprValue::Number(n) => n.to_string(),
            ExprValue::Text(s) => s,
        }
    }
}

/// Evaluate an expression against a data record.
pub fn evaluate(expression: &str, data: &Value) -> Result<ExprValue, ExprError> {
    let tokens = lex(expression)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        data,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(ExprError::UnexpectedToken(token.describe())),
    }
}

/// Evaluate and render, for callers that only need the painted text.
pub fn evaluate_to_string(expression: &str, data: &Value) -> Result<String, ExprError> {
    evaluate(expression, data).map(ExprValue::into_display)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Text(s) => format!("'{s}'"),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn lex(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '\'' {
                    end += 1;
                }
                if end == chars.len() {
                    return Err(ExprError::UnterminatedString);
                }
                tokens.push(Token::Text(chars[start..end].iter().collect()));
                i = end + 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::UnexpectedToken(literal.clone()))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(ExprError::UnexpectedChar(other, i)),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    data: &'a Value,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<ExprValue, ExprError> {
        let mut left = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let right = self.term()?;
                    left = add(left, right)?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    let right = self.term()?;
                    left = numeric(left, right, '-', |a, b| Ok(a - b))?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<ExprValue, ExprError> {
        let mut left = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let right = self.factor()?;
                    left = numeric(left, right, '*', |a, b| Ok(a * b))?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let right = self.factor()?;
                    left = numeric(left, right, '/', |a, b| {
                        if b == 0.0 {
                            Err(ExprError::DivisionByZero)
                        } else {
                            Ok(a / b)
                        }
                    })?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn factor(&mut self) -> Result<ExprValue, ExprError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(ExprValue::Number(n)),
            Some(Token::Text(s)) => Ok(ExprValue::Text(s)),
            Some(Token::Ident(name)) => self.lookup(&name),
            Some(Token::Minus) => match self.factor()? {
                ExprValue::Number(n) => Ok(ExprValue::Number(-n)),
                ExprValue::Text(_) => Err(ExprError::TypeMismatch('-')),
            },
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(ExprError::UnexpectedToken(token.describe())),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(token) => Err(ExprError::UnexpectedToken(token.describe())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn lookup(&self, name: &str) -> Result<ExprValue, ExprError> {
        let value =
            resolve_path(self.data, name).ok_or_else(|| ExprError::UnknownVariable(name.into()))?;
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(ExprValue::Number)
                .ok_or_else(|| ExprError::NonScalar(name.into())),
            Value::String(s) => Ok(ExprValue::Text(s.clone())),
            _ => Err(ExprError::NonScalar(name.into())),
        }
    }
}

fn add(left: ExprValue, right: ExprValue) -> Result<ExprValue, ExprError> {
    match (left, right) {
        (ExprValue::Number(a), ExprValue::Number(b)) => Ok(ExprValue::Number(a + b)),
        // String concatenation mirrors the expression language templates
        // were authored in.
        (a, b) => Ok(ExprValue::Text(format!(
            "{}{}",
            a.into_display(),
            b.into_display()
        ))),
    }
}

fn numeric(
    left: ExprValue,
    right: ExprValue,
    op: char,
    apply: impl Fn(f64, f64) -> Result<f64, ExprError>,
) -> Result<ExprValue, ExprError> {
    match (left, right) {
        (ExprValue::Number(a), ExprValue::Number(b)) => apply(a, b).map(ExprValue::Number),
        _ => Err(ExprError::TypeMismatch(op)),
    }
}
