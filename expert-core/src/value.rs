//! Slot values held by facts in working memory.

use std::fmt;

use serde::Serialize;

use crate::syntax::{self, Sexp};

/// A value stored in a fact slot.
///
/// `Multi` holds the contents of a multislot; the other variants are
/// the scalar types of the source syntax.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SlotValue {
    Symbol(String),
    Str(String),
    Int(i64),
    Float(f64),
    Multi(Vec<SlotValue>),
}

impl SlotValue {
    /// The `nil` symbol, the default for an unsupplied single slot.
    pub fn nil() -> Self {
        SlotValue::Symbol("nil".to_string())
    }

    /// Bare text content: strings unquoted, multifields space-joined.
    ///
    /// This is the form result extraction hands back to callers.
    pub fn as_text(&self) -> String {
        match self {
            SlotValue::Symbol(s) | SlotValue::Str(s) => s.clone(),
            SlotValue::Int(i) => i.to_string(),
            SlotValue::Float(x) => x.to_string(),
            SlotValue::Multi(values) => values
                .iter()
                .map(SlotValue::as_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Convert a parsed atom into a value. Lists and pattern variables
    /// have no value form and yield `None`.
    pub fn from_sexp(sexp: &Sexp) -> Option<SlotValue> {
        match sexp {
            Sexp::Symbol(s) => Some(SlotValue::Symbol(s.clone())),
            Sexp::Str(s) => Some(SlotValue::Str(s.clone())),
            Sexp::Int(i) => Some(SlotValue::Int(*i)),
            Sexp::Float(x) => Some(SlotValue::Float(*x)),
            Sexp::Variable(_) | Sexp::List(_) => None,
        }
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Symbol(s) => f.write_str(s),
            SlotValue::Str(s) => f.write_str(&syntax::quote(s)),
            SlotValue::Int(i) => write!(f, "{i}"),
            SlotValue::Float(x) => write!(f, "{x}"),
            SlotValue::Multi(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_text_unquotes_strings() {
        assert_eq!(SlotValue::Str("Alice".to_string()).as_text(), "Alice");
        assert_eq!(SlotValue::Symbol("nil".to_string()).as_text(), "nil");
    }

    #[test]
    fn test_as_text_joins_multifields() {
        let multi = SlotValue::Multi(vec![
            SlotValue::Str("a".to_string()),
            SlotValue::Int(2),
            SlotValue::Symbol("c".to_string()),
        ]);
        assert_eq!(multi.as_text(), "a 2 c");
    }

    #[test]
    fn test_display_quotes_strings() {
        let value = SlotValue::Str(r#"say "hi""#.to_string());
        assert_eq!(value.to_string(), r#""say \"hi\"""#);
    }

    #[test]
    fn test_from_sexp_rejects_variables() {
        assert_eq!(SlotValue::from_sexp(&Sexp::Variable("n".to_string())), None);
    }
}
