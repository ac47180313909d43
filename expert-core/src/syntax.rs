//! Source syntax shared by constructs and fact literals.
//!
//! The engine speaks a small s-expression dialect: templates and rules
//! are declared as `(deftemplate ...)` / `(defrule ...)` lists, and
//! facts are asserted as `(template (slot value) ...)` literals. This
//! module owns the tokenizer, the parsed expression form, and the
//! canonical rendering back to text.

use std::fmt;
use thiserror::Error;

/// Errors from parsing source syntax.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("unexpected character '{found}' at byte {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: usize },

    #[error("trailing input after expression at byte {offset}")]
    TrailingInput { offset: usize },
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    Symbol(String),
    Str(String),
    Int(i64),
    Float(f64),
    /// A `?name` pattern variable. Only meaningful inside rules.
    Variable(String),
    List(Vec<Sexp>),
}

impl Sexp {
    /// The symbol text, if this expression is a bare symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexp::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Symbol(s) => f.write_str(s),
            Sexp::Str(s) => f.write_str(&quote(s)),
            Sexp::Int(i) => write!(f, "{i}"),
            Sexp::Float(x) => write!(f, "{x}"),
            Sexp::Variable(name) => write!(f, "?{name}"),
            Sexp::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Render text as a quoted string literal, escaping `"` and `\`.
///
/// Round-trips through [`parse`]: any input text survives embedding in
/// a fact literal unchanged.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Parse a single expression covering the whole input.
pub fn parse(input: &str) -> Result<Sexp, SyntaxError> {
    let mut parser = Parser::new(input);
    let expr = parser.parse_expr()?;
    parser.skip_ws();
    if parser.peek().is_some() {
        return Err(SyntaxError::TrailingInput { offset: parser.pos });
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn parse_expr(&mut self) -> Result<Sexp, SyntaxError> {
        self.skip_ws();
        match self.peek() {
            None => Err(SyntaxError::UnexpectedEof { offset: self.pos }),
            Some('(') => self.parse_list(),
            Some(')') => Err(SyntaxError::UnexpectedChar {
                found: ')',
                offset: self.pos,
            }),
            Some('"') => self.parse_string(),
            Some(_) => Ok(self.parse_atom()),
        }
    }

    fn parse_list(&mut self) -> Result<Sexp, SyntaxError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(SyntaxError::UnexpectedEof { offset: self.pos }),
                Some(')') => {
                    self.bump();
                    return Ok(Sexp::List(items));
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Sexp, SyntaxError> {
        let start = self.pos;
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::UnterminatedString { offset: start }),
                Some('"') => return Ok(Sexp::Str(text)),
                Some('\\') => match self.bump() {
                    None => return Err(SyntaxError::UnterminatedString { offset: start }),
                    Some(escaped) => text.push(escaped),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn parse_atom(&mut self) -> Sexp {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                break;
            }
            self.bump();
        }
        classify_atom(&self.input[start..self.pos])
    }
}

fn classify_atom(text: &str) -> Sexp {
    if let Some(rest) = text.strip_prefix('?') {
        if !rest.is_empty()
            && rest
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Sexp::Variable(rest.to_string());
        }
    }

    if looks_numeric(text) {
        if let Ok(i) = text.parse::<i64>() {
            return Sexp::Int(i);
        }
        if let Ok(x) = text.parse::<f64>() {
            return Sexp::Float(x);
        }
    }

    Sexp::Symbol(text.to_string())
}

fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+') | Some('-') | Some('.') => {
            chars.next().is_some_and(|c| c.is_ascii_digit() || c == '.')
        }
        _ => false,
    }
}
