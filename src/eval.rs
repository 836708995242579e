//! Evaluator.

use std::collections::HashMap;

use crate::ast::{ChildRef, Expression, Literal, Node, Op};
use crate::error::EvalError;

/// Resolves key names to literals at evaluation time.
///
/// A lookup that finds nothing returns [`Literal::Unknown`].
/// Implemented for plain closures and for `HashMap<String, Literal>`.
pub trait Dictionary {
    fn resolve(&self, key: &str) -> Literal;
}

impl<F> Dictionary for F
where
    F: Fn(&str) -> Literal,
{
    fn resolve(&self, key: &str) -> Literal {
        self(key)
    }
}

impl Dictionary for HashMap<String, Literal> {
    fn resolve(&self, key: &str) -> Literal {
        self.get(key).cloned().unwrap_or(Literal::Unknown)
    }
}

impl Dictionary for &HashMap<String, Literal> {
    fn resolve(&self, key: &str) -> Literal {
        (**self).resolve(key)
    }
}

impl Expression {
    /// Evaluate against a dictionary.
    ///
    /// Every key is resolved through `dict` up front, whether or not
    /// the walk will reach it; `&` and `|` short-circuit during the
    /// walk only. The expression itself is never mutated.
    pub fn evaluate(&self, dict: impl Dictionary) -> Result<bool, EvalError> {
        let resolved: Vec<Literal> = self.keys.iter().map(|key| dict.resolve(key)).collect();
        tracing::trace!("resolved {} key(s)", resolved.len());
        Walk {
            expr: self,
            resolved,
        }
        .truth(self.root)
    }
}

/// One evaluation pass: the tree plus the resolved key arena, so a
/// dynamic reference dereferences to its resolved value.
struct Walk<'e> {
    expr: &'e Expression,
    resolved: Vec<Literal>,
}

enum Slot<'e> {
    Operator(Op, &'e [ChildRef]),
    Literal(&'e Literal),
    /// Key name and what the dictionary made of it.
    Key(&'e str, &'e Literal),
}

impl Walk<'_> {
    fn slot(&self, child: ChildRef) -> Slot<'_> {
        match child {
            ChildRef::Static(index) => match &self.expr.statics[index] {
                Node::Operator { op, children } => Slot::Operator(*op, children),
                Node::Literal(lit) => Slot::Literal(lit),
            },
            ChildRef::Dynamic(index) => {
                Slot::Key(&self.expr.keys[index], &self.resolved[index])
            }
        }
    }

    /// Truth value of a subtree.
    fn truth(&self, child: ChildRef) -> Result<bool, EvalError> {
        let lit = match self.slot(child) {
            Slot::Operator(op, children) => return self.apply(op, children),
            Slot::Literal(lit) => lit,
            Slot::Key(name, Literal::Unknown) => {
                return Err(EvalError::UnknownKey(name.to_string()));
            }
            Slot::Key(_, resolved) => resolved,
        };
        match lit {
            Literal::True => Ok(true),
            Literal::False => Ok(false),
            other => Err(EvalError::NotBoolean(other.kind())),
        }
    }

    /// Operand for `=`/`!=`/`?`, where an unresolved key is an ordinary
    /// value (a kind that matches nothing but itself).
    fn operand(&self, op: Op, child: ChildRef) -> Result<&Literal, EvalError> {
        match self.slot(child) {
            Slot::Operator(..) => Err(EvalError::NotALiteral(op)),
            Slot::Literal(lit) => Ok(lit),
            Slot::Key(_, resolved) => Ok(resolved),
        }
    }

    /// Operand for the numeric comparisons, which need a real value.
    fn number(&self, op: Op, child: ChildRef) -> Result<f64, EvalError> {
        match self.slot(child) {
            Slot::Operator(..) => Err(EvalError::NotALiteral(op)),
            Slot::Key(name, Literal::Unknown) => Err(EvalError::UnknownKey(name.to_string())),
            Slot::Literal(lit) | Slot::Key(_, lit) => match lit {
                Literal::Number(value) => Ok(*value),
                other => Err(EvalError::NotNumber(other.kind())),
            },
        }
    }

    fn apply(&self, op: Op, children: &[ChildRef]) -> Result<bool, EvalError> {
        match op {
            Op::Not => Ok(!self.truth(children[0])?),
            Op::And => {
                for &child in children {
                    if !self.truth(child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Op::Or => {
                for &child in children {
                    if self.truth(child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Op::Eq => {
                let first = self.operand(op, children[0])?;
                for &child in &children[1..] {
                    if self.operand(op, child)? != first {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Op::Neq => {
                let lhs = self.operand(op, children[0])?;
                let rhs = self.operand(op, children[1])?;
                Ok(lhs != rhs)
            }
            Op::Lt => Ok(self.number(op, children[0])? < self.number(op, children[1])?),
            Op::Lte => Ok(self.number(op, children[0])? <= self.number(op, children[1])?),
            Op::Gt => Ok(self.number(op, children[0])? > self.number(op, children[1])?),
            Op::Gte => Ok(self.number(op, children[0])? >= self.number(op, children[1])?),
            Op::Exst => Ok(!matches!(
                self.operand(op, children[0])?,
                Literal::Unknown
            )),
        }
    }
}
