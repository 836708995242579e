//! Two-phase parser.
//!
//! Grammar (in rough EBNF):
//!
//! expr    = literal | "(" op "," expr ("," expr)* ")"
//! op      = "!" | "&" | "|" | "=" | "<" | ">" | "?" | "!=" | "<=" | ">="
//! literal = "TRUE" | "FALSE" | number | "'" text "'" | "[" name "]" | date
//!
//! Phase one walks the bytes once, collecting the span of every field
//! and the offset of every closing parenthesis while tracking string
//! context, and counts fields/keys/groups so both arenas can be sized
//! up front. Phase two descends the field list recursively, carrying a
//! field cursor and a closing cursor: an operator keeps consuming child
//! expressions while the next field starts before the current scope's
//! closing offset, then hands the next closing to its parent.
//!
//! Field boundaries are `(`, `,`, and `)` outside string literals.
//! Inside a string, a quote closes only when preceded by an even number
//! of backslashes. ASCII whitespace around a field is not part of it.

use std::str::FromStr;

use crate::ast::{ChildRef, Expression, Literal, Node, Op};
use crate::error::ParseError;
use crate::lexer::{classify, Token};

impl Expression {
    /// Parse the textual form of an expression.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let scan = scan(input)?;
        tracing::trace!(
            "scan: {} fields, {} keys, {} groups",
            scan.fields.len(),
            scan.keys,
            scan.closings.len()
        );

        let statics_len = scan.fields.len().saturating_sub(scan.keys);
        let mut builder = Builder {
            src: input,
            fields: scan.fields,
            closings: scan.closings,
            field: 0,
            closing: 0,
            statics: Vec::with_capacity(statics_len),
            keys: Vec::with_capacity(scan.keys),
        };
        let root = builder.build()?;
        if let Some(span) = builder.fields.get(builder.field) {
            return Err(ParseError::TrailingField(span.start));
        }
        debug_assert_eq!(builder.closing, builder.closings.len());

        Ok(Expression {
            statics: builder.statics,
            keys: builder.keys,
            root,
        })
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Expression::parse(input)
    }
}

/// One field located by the scan, trimmed of surrounding whitespace.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    /// The field directly follows `(`, i.e. sits in operator position.
    opening: bool,
}

/// Everything phase one learns about the input.
#[derive(Debug)]
struct Scan {
    fields: Vec<Span>,
    closings: Vec<usize>,
    keys: usize,
}

fn scan(src: &str) -> Result<Scan, ParseError> {
    let mut fields = Vec::new();
    let mut closings = Vec::new();
    let mut keys = 0usize;

    let mut in_string = false;
    let mut string_open = 0usize;
    let mut backslashes = 0usize;
    let mut opens: Vec<usize> = Vec::new();
    let mut run_start = 0usize;
    let mut prev: Option<u8> = None;

    for (i, &b) in src.as_bytes().iter().enumerate() {
        if in_string {
            if b == b'\'' && backslashes % 2 == 0 {
                in_string = false;
            }
            backslashes = if b == b'\\' { backslashes + 1 } else { 0 };
            continue;
        }
        match b {
            b'\'' => {
                in_string = true;
                string_open = i;
            }
            b'[' => keys += 1,
            b'(' => {
                let (start, end) = trimmed(src, run_start, i);
                if start != end || !matches!(prev, None | Some(b',')) {
                    return Err(ParseError::MisplacedOpen(i));
                }
                opens.push(i);
                prev = Some(b'(');
                run_start = i + 1;
            }
            b',' => {
                if opens.is_empty() {
                    return Err(ParseError::StrayComma(i));
                }
                let (start, end) = trimmed(src, run_start, i);
                if prev == Some(b')') {
                    if start != end {
                        return Err(ParseError::TrailingText(start));
                    }
                } else if start == end {
                    return Err(ParseError::EmptyField(i));
                } else {
                    fields.push(Span {
                        start,
                        end,
                        opening: prev == Some(b'('),
                    });
                }
                prev = Some(b',');
                run_start = i + 1;
            }
            b')' => {
                if opens.pop().is_none() {
                    return Err(ParseError::UnopenedParen(i));
                }
                let (start, end) = trimmed(src, run_start, i);
                if prev == Some(b')') {
                    if start != end {
                        return Err(ParseError::TrailingText(start));
                    }
                } else if start == end {
                    return Err(ParseError::EmptyField(i));
                } else {
                    fields.push(Span {
                        start,
                        end,
                        opening: prev == Some(b'('),
                    });
                }
                closings.push(i);
                prev = Some(b')');
                run_start = i + 1;
            }
            _ => {}
        }
        backslashes = if b == b'\\' { backslashes + 1 } else { 0 };
    }

    if in_string {
        return Err(ParseError::UnterminatedString(string_open));
    }
    if let Some(&open) = opens.last() {
        return Err(ParseError::UnclosedParen(open));
    }
    let (start, end) = trimmed(src, run_start, src.len());
    if prev == Some(b')') {
        if start != end {
            return Err(ParseError::TrailingText(start));
        }
    } else if start != end {
        fields.push(Span {
            start,
            end,
            opening: false,
        });
    }
    if fields.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok(Scan {
        fields,
        closings,
        keys,
    })
}

/// Trim ASCII whitespace off both ends of `src[start..end]`.
fn trimmed(src: &str, start: usize, end: usize) -> (usize, usize) {
    let run = &src[start..end];
    let lead = run.len() - run.trim_start().len();
    let tail = run.len() - run.trim_end().len();
    (start + lead, (end - tail).max(start + lead))
}

/// Phase two: recursive descent over the field list.
struct Builder<'s> {
    src: &'s str,
    fields: Vec<Span>,
    closings: Vec<usize>,
    field: usize,
    closing: usize,
    statics: Vec<Node>,
    keys: Vec<String>,
}

impl Builder<'_> {
    fn build(&mut self) -> Result<ChildRef, ParseError> {
        let span = self.fields[self.field];
        let text = &self.src[span.start..span.end];
        match classify(text, span.start)? {
            Token::Operator(op) if span.opening => self.operator(op, span),
            Token::Operator(op) => Err(ParseError::MisplacedOperator {
                op,
                at: span.start,
            }),
            Token::Literal(_) if span.opening => Err(ParseError::ExpectedOperator {
                text: text.to_string(),
                at: span.start,
            }),
            Token::Literal(Literal::Key(name)) => {
                self.field += 1;
                self.keys.push(name);
                Ok(ChildRef::Dynamic(self.keys.len() - 1))
            }
            Token::Literal(lit) => {
                self.field += 1;
                self.statics.push(Node::Literal(lit));
                Ok(ChildRef::Static(self.statics.len() - 1))
            }
        }
    }

    /// Build the subtree rooted at an operator. Allocates the node
    /// before its children so a static root always lands at slot 0.
    fn operator(&mut self, op: Op, span: Span) -> Result<ChildRef, ParseError> {
        let index = self.statics.len();
        self.statics.push(Node::Operator {
            op,
            children: Vec::new(),
        });
        self.field += 1;

        let mut children = Vec::new();
        loop {
            // Re-read each turn: recursion below advances the cursor.
            let Some(&scope_end) = self.closings.get(self.closing) else {
                return Err(ParseError::UnclosedParen(span.start));
            };
            match self.fields.get(self.field) {
                Some(next) if next.start < scope_end => children.push(self.build()?),
                _ => break,
            }
        }
        self.closing += 1;

        let (min, max) = op.arity();
        if children.len() < min || max.is_some_and(|m| children.len() > m) {
            return Err(ParseError::Arity {
                op,
                expected: expected_children(min, max),
                found: children.len(),
            });
        }
        self.statics[index] = Node::Operator { op, children };
        Ok(ChildRef::Static(index))
    }
}

fn expected_children(min: usize, max: Option<usize>) -> &'static str {
    match (min, max) {
        (1, Some(1)) => "exactly 1",
        (2, Some(2)) => "exactly 2",
        (1, None) => "at least 1",
        _ => "at least 2",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Date;

    fn statics(expr: &Expression) -> &[Node] {
        &expr.statics
    }

    #[test]
    fn test_bare_literal() {
        let expr = Expression::parse("TRUE").unwrap();
        assert_eq!(expr.root, ChildRef::Static(0));
        assert_eq!(statics(&expr), &[Node::Literal(Literal::True)]);
    }

    #[test]
    fn test_bare_key() {
        let expr = Expression::parse("[flag]").unwrap();
        assert_eq!(expr.root, ChildRef::Dynamic(0));
        assert!(expr.statics.is_empty());
        assert_eq!(expr.keys().collect::<Vec<_>>(), ["flag"]);
    }

    #[test]
    fn test_flat_operator() {
        let expr = Expression::parse("(&,TRUE,FALSE)").unwrap();
        assert_eq!(expr.root, ChildRef::Static(0));
        assert_eq!(
            statics(&expr)[0],
            Node::Operator {
                op: Op::And,
                children: vec![ChildRef::Static(1), ChildRef::Static(2)],
            }
        );
    }

    #[test]
    fn test_nested_groups_and_whitespace() {
        let expr = Expression::parse("(|, (=, [a], 1), (=, [b], 2))").unwrap();
        assert_eq!(expr.keys().collect::<Vec<_>>(), ["a", "b"]);
        let Node::Operator { op, children } = &expr.statics[0] else {
            panic!("root is not an operator");
        };
        assert_eq!(*op, Op::Or);
        assert_eq!(children.len(), 2);
        // Both disjuncts are EQ nodes over a key and a number.
        for &child in children {
            let ChildRef::Static(index) = child else {
                panic!("disjunct in the key arena");
            };
            let Node::Operator { op, children } = &expr.statics[index] else {
                panic!("disjunct is not an operator");
            };
            assert_eq!(*op, Op::Eq);
            assert!(matches!(children[0], ChildRef::Dynamic(_)));
            assert!(matches!(children[1], ChildRef::Static(_)));
        }
    }

    #[test]
    fn test_all_literal_kinds() {
        let expr = Expression::parse("(=,TRUE,FALSE,1.5,'hi',2020-02-29,[k])").unwrap();
        let kinds: Vec<_> = expr
            .statics
            .iter()
            .skip(1)
            .map(|node| match node {
                Node::Literal(lit) => lit.clone(),
                Node::Operator { .. } => panic!("unexpected operator"),
            })
            .collect();
        assert_eq!(
            kinds,
            [
                Literal::True,
                Literal::False,
                Literal::Number(1.5),
                Literal::Str("hi".into()),
                Literal::Date(Date {
                    year: 2020,
                    month: 2,
                    day: 29,
                }),
            ]
        );
        assert_eq!(expr.keys().collect::<Vec<_>>(), ["k"]);
    }

    #[test]
    fn test_structural_bytes_inside_strings() {
        let expr = Expression::parse("(=,'a,b)c','a,b)c')").unwrap();
        let Node::Operator { children, .. } = &expr.statics[0] else {
            panic!("root is not an operator");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(
            expr.statics[1],
            Node::Literal(Literal::Str("a,b)c".into()))
        );
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        let expr = Expression::parse(r"(=,'it\'s','x')").unwrap();
        assert_eq!(
            expr.statics[1],
            Node::Literal(Literal::Str(r"it\'s".into()))
        );
    }

    #[test]
    fn test_escaped_backslash_closes_string() {
        // Two backslashes, then the quote: the quote closes.
        let expr = Expression::parse(r"(=,'a\\','b')").unwrap();
        assert_eq!(
            expr.statics[1],
            Node::Literal(Literal::Str(r"a\\".into()))
        );
    }

    #[test]
    fn test_duplicate_keys_get_their_own_slots() {
        let expr = Expression::parse("(&,(?,[k]),(?,[k]))").unwrap();
        assert_eq!(expr.keys().collect::<Vec<_>>(), ["k", "k"]);
    }

    #[test]
    fn test_syntax_errors() {
        use ParseError::*;
        assert_eq!(Expression::parse(""), Err(Empty));
        assert_eq!(Expression::parse("   "), Err(Empty));
        assert_eq!(Expression::parse("(&,TRUE"), Err(UnclosedParen(0)));
        assert_eq!(Expression::parse(")"), Err(UnopenedParen(0)));
        assert_eq!(Expression::parse("(&,TRUE))"), Err(UnopenedParen(8)));
        assert_eq!(Expression::parse("TRUE,FALSE"), Err(StrayComma(4)));
        assert_eq!(Expression::parse("(&,,TRUE)"), Err(EmptyField(3)));
        assert_eq!(Expression::parse("()"), Err(EmptyField(1)));
        assert_eq!(Expression::parse("(&,TRUE,)"), Err(EmptyField(8)));
        assert_eq!(Expression::parse("x(!,TRUE)"), Err(MisplacedOpen(1)));
        assert_eq!(Expression::parse("((!,TRUE))"), Err(MisplacedOpen(1)));
        assert_eq!(Expression::parse("(!,TRUE)x"), Err(TrailingText(8)));
        assert_eq!(Expression::parse("(=,'abc"), Err(UnterminatedString(3)));
        assert!(matches!(
            Expression::parse("(=,abc,1)"),
            Err(BadToken { at: 3, .. })
        ));
        assert!(matches!(
            Expression::parse("(TRUE,FALSE)"),
            Err(ExpectedOperator { at: 1, .. })
        ));
        assert!(matches!(
            Expression::parse("(&,TRUE,=,1,1)"),
            Err(MisplacedOperator { op: Op::Eq, at: 8 })
        ));
        assert!(matches!(Expression::parse("!"), Err(MisplacedOperator { .. })));
    }

    #[test]
    fn test_arity_enforced() {
        for input in [
            "(!,TRUE,TRUE)",
            "(=,1)",
            "(<,1)",
            "(<,1,2,3)",
            "(!=,1,2,3)",
            "(?,[a],[b])",
        ] {
            assert!(
                matches!(Expression::parse(input), Err(ParseError::Arity { .. })),
                "{input}"
            );
        }
    }

    #[test]
    fn test_from_str() {
        let expr: Expression = "(!,FALSE)".parse().unwrap();
        assert_eq!(expr.root, ChildRef::Static(0));
    }
}
