//! Expression tree types.

use std::fmt;

/// A date literal, held as plain year/month/day fields.
///
/// Dates compare structurally; there is no calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Literal node kinds.
///
/// `Key` only ever lives in the dynamic arena of an [`Expression`];
/// `Unknown` only ever comes out of a dictionary lookup that found
/// nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    True,
    False,
    /// 64-bit float, e.g. `-2.5e3`.
    Number(f64),
    /// The bytes between the single quotes, escapes kept as written.
    Str(String),
    /// `YYYY-MM-DD`.
    Date(Date),
    /// The name between the square brackets, resolved at evaluation time.
    Key(String),
    /// Sentinel for a key the dictionary could not resolve.
    Unknown,
}

impl Literal {
    /// Kind name used in error messages and the debug dump.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::True => "TRUE",
            Literal::False => "FALSE",
            Literal::Number(_) => "NUMBER",
            Literal::Str(_) => "STRING",
            Literal::Date(_) => "DATE",
            Literal::Key(_) => "KEY",
            Literal::Unknown => "UNKNOWN",
        }
    }
}

/// Operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Not,  // !
    And,  // &
    Or,   // |
    Eq,   // =
    Neq,  // !=
    Lt,   // <
    Lte,  // <=
    Gt,   // >
    Gte,  // >=
    Exst, // ?
}

impl Op {
    /// The wire token for this operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Not => "!",
            Op::And => "&",
            Op::Or => "|",
            Op::Eq => "=",
            Op::Neq => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Exst => "?",
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Op::Not => "NOT",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Eq => "EQ",
            Op::Neq => "NEQ",
            Op::Lt => "LT",
            Op::Lte => "LTE",
            Op::Gt => "GT",
            Op::Gte => "GTE",
            Op::Exst => "EXST",
        }
    }

    /// Inclusive lower and upper bounds on the child count.
    pub(crate) fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Op::Not | Op::Exst => (1, Some(1)),
            Op::Neq | Op::Lt | Op::Lte | Op::Gt | Op::Gte => (2, Some(2)),
            Op::Eq => (2, None),
            Op::And | Op::Or => (1, None),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Reference from a child list into one of the two arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildRef {
    /// Operators and non-key literals.
    Static(usize),
    /// Key literals, by position in the dynamic arena.
    Dynamic(usize),
}

/// One slot in the static arena.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Literal(Literal),
    Operator { op: Op, children: Vec<ChildRef> },
}

/// Borrowed view of whatever a [`ChildRef`] points at.
pub(crate) enum NodeView<'e> {
    Literal(&'e Literal),
    Key(&'e str),
    Operator(Op, &'e [ChildRef]),
}

/// A parsed expression.
///
/// The static arena holds every operator and every literal that appears
/// textually in the source; the dynamic arena holds exactly the key
/// names. Keys are segregated so evaluation can resolve them into a
/// parallel arena of the same shape without touching the tree.
///
/// The tree is immutable once parsed, and evaluation never mutates it,
/// so a shared expression may be evaluated from several threads at once
/// as long as the dictionaries themselves are safe.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub(crate) statics: Vec<Node>,
    pub(crate) keys: Vec<String>,
    pub(crate) root: ChildRef,
}

impl Expression {
    /// Key names the expression mentions, in dynamic-arena order.
    ///
    /// A key that appears textually more than once is listed once per
    /// occurrence.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub(crate) fn view(&self, child: ChildRef) -> NodeView<'_> {
        match child {
            ChildRef::Static(index) => match &self.statics[index] {
                Node::Literal(lit) => NodeView::Literal(lit),
                Node::Operator { op, children } => NodeView::Operator(*op, children),
            },
            ChildRef::Dynamic(index) => NodeView::Key(&self.keys[index]),
        }
    }
}
