//! Parser, evaluator, and printer for a small prefix boolean
//! expression language.
//!
//! Expressions are parenthesized, comma-separated prefix trees:
//!
//! ```text
//! (&,e1,e2,...)     - true when every child is true
//! (|,e1,e2,...)     - true when any child is true
//! (!,e)             - negation
//! (=,e1,e2,...)     - all children equal, by kind and value
//! (!=,e1,e2)        - the two children differ
//! (<,n1,n2)         - numeric comparison (also <=, >, >=)
//! (?,[k])           - the key k resolves in the dictionary
//! ```
//!
//! Leaves are typed literals:
//!
//! ```text
//! TRUE, FALSE       - booleans
//! 12.5, -3e2        - 64-bit float numbers
//! 'text'            - strings, \' for an embedded quote
//! 2024-01-31        - dates
//! [key]             - free variables, resolved at evaluation time
//! ```
//!
//! Parsing builds an immutable tree. Evaluation resolves every key
//! through a caller-supplied [`Dictionary`], then walks the tree to a
//! single boolean with short-circuiting `&`/`|`. Rendering prints the
//! canonical text back out.
//!
//! ```
//! use pbg::{Expression, Literal};
//!
//! let expr = Expression::parse("(&,(=,[role],'admin'),(>=,[level],3))").unwrap();
//! let dict = |key: &str| match key {
//!     "role" => Literal::Str("admin".into()),
//!     "level" => Literal::Number(5.0),
//!     _ => Literal::Unknown,
//! };
//! assert!(expr.evaluate(dict).unwrap());
//! assert_eq!(expr.to_string(), "(&,(=,[role],'admin'),(>=,[level],3))");
//! ```

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod render;

pub use ast::{Date, Expression, Literal, Op};
pub use error::{EvalError, ParseError};
pub use eval::Dictionary;
