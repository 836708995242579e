//! Error types for parsing and evaluation.

use thiserror::Error;

use crate::ast::Op;

/// Parse failure. Offsets are byte positions into the original input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("unmatched `(` opened at byte {0}")]
    UnclosedParen(usize),

    #[error("unmatched `)` at byte {0}")]
    UnopenedParen(usize),

    #[error("`(` not allowed at byte {0}")]
    MisplacedOpen(usize),

    #[error("comma outside a group at byte {0}")]
    StrayComma(usize),

    #[error("empty field at byte {0}")]
    EmptyField(usize),

    #[error("text after a closed group at byte {0}")]
    TrailingText(usize),

    #[error("more than one expression, next field at byte {0}")]
    TrailingField(usize),

    #[error("unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),

    #[error("unrecognized token `{text}` at byte {at}")]
    BadToken { text: String, at: usize },

    #[error("expected an operator after `(`, found `{text}` at byte {at}")]
    ExpectedOperator { text: String, at: usize },

    #[error("operator `{op}` in literal position at byte {at}")]
    MisplacedOperator { op: Op, at: usize },

    #[error("operator `{op}` expects {expected} children, found {found}")]
    Arity {
        op: Op,
        expected: &'static str,
        found: usize,
    },

    #[error("date out of range: `{text}` at byte {at}")]
    DateOutOfRange { text: String, at: usize },

    #[error("number does not fit a 64-bit float: `{text}` at byte {at}")]
    NumberOverflow { text: String, at: usize },
}

/// Evaluation failure. The walk stops at the first error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("key `{0}` is not in the dictionary")]
    UnknownKey(String),

    #[error("expected TRUE or FALSE, found a {0} literal")]
    NotBoolean(&'static str),

    #[error("comparison requires NUMBER operands, found {0}")]
    NotNumber(&'static str),

    #[error("operand of `{0}` must be a literal")]
    NotALiteral(Op),
}
