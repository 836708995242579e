//! Canonical text output and the indented debug dump.

use std::fmt::{self, Write};

use crate::ast::{ChildRef, Expression, Literal, NodeView};

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_ref(f, self.root)
    }
}

impl Expression {
    /// Canonical textual form. Re-parsing it yields an isomorphic tree;
    /// numbers come back out in their shortest round-trip spelling, so
    /// `2.50` renders as `2.5`.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Indented, one-node-per-line pretty print for debugging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.dump_to(&mut out);
        out
    }

    /// Write the debug dump into any [`fmt::Write`] sink.
    pub fn dump_to<W: Write>(&self, out: &mut W) -> fmt::Result {
        self.dump_ref(out, self.root, 0)
    }

    fn write_ref<W: Write>(&self, out: &mut W, child: ChildRef) -> fmt::Result {
        match self.view(child) {
            NodeView::Literal(lit) => write_literal(out, lit),
            NodeView::Key(name) => write!(out, "[{name}]"),
            NodeView::Operator(op, children) => {
                write!(out, "({op}")?;
                for &child in children {
                    out.write_char(',')?;
                    self.write_ref(out, child)?;
                }
                out.write_char(')')
            }
        }
    }

    fn dump_ref<W: Write>(&self, out: &mut W, child: ChildRef, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            out.write_str("  ")?;
        }
        match self.view(child) {
            NodeView::Literal(lit @ (Literal::True | Literal::False)) => {
                writeln!(out, "{}", lit.kind())
            }
            NodeView::Literal(lit) => {
                write!(out, "{} ", lit.kind())?;
                write_literal(out, lit)?;
                out.write_char('\n')
            }
            NodeView::Key(name) => writeln!(out, "KEY [{name}]"),
            NodeView::Operator(op, children) => {
                writeln!(out, "{} {}", op.name(), op.symbol())?;
                for &child in children {
                    self.dump_ref(out, child, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

fn write_literal<W: Write>(out: &mut W, lit: &Literal) -> fmt::Result {
    match lit {
        Literal::True => out.write_str("TRUE"),
        Literal::False => out.write_str("FALSE"),
        Literal::Number(value) => write!(out, "{value}"),
        Literal::Str(payload) => write!(out, "'{payload}'"),
        Literal::Date(date) => write!(
            out,
            "{:04}-{:02}-{:02}",
            date.year, date.month, date.day
        ),
        Literal::Key(name) => write!(out, "[{name}]"),
        Literal::Unknown => out.write_str("UNKNOWN"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(input: &str) -> String {
        Expression::parse(input).unwrap().to_string()
    }

    #[test]
    fn test_canonical_form_drops_whitespace() {
        assert_eq!(
            canonical("(|, (=, [a], 1), (=, [b], 2))"),
            "(|,(=,[a],1),(=,[b],2))"
        );
    }

    #[test]
    fn test_render_matches_display() {
        let expr = Expression::parse("(&,TRUE,[k])").unwrap();
        assert_eq!(expr.render(), expr.to_string());
        assert_eq!(expr.render(), "(&,TRUE,[k])");
    }

    #[test]
    fn test_literal_forms() {
        assert_eq!(canonical("TRUE"), "TRUE");
        assert_eq!(canonical("[k]"), "[k]");
        assert_eq!(canonical("'a,b)c'"), "'a,b)c'");
        assert_eq!(canonical("(=,2018-01-02,0007-12-31)"), "(=,2018-01-02,0007-12-31)");
    }

    #[test]
    fn test_numbers_render_shortest() {
        assert_eq!(canonical("2.50"), "2.5");
        assert_eq!(canonical("1.0"), "1");
        assert_eq!(canonical("-0.125"), "-0.125");
        assert_eq!(canonical("5e-1"), "0.5");
    }

    #[test]
    fn test_escapes_survive() {
        assert_eq!(canonical(r"'it\'s'"), r"'it\'s'");
    }

    #[test]
    fn test_round_trip_is_structural() {
        for input in [
            "TRUE",
            "[k]",
            "(!,FALSE)",
            "(&,TRUE,(|,FALSE,[x]),(=,[y],'z'))",
            "(>=,[age],21)",
            "(=,1,1.0,5e-1,2020-02-29,'s')",
            r"(=,'it\'s','a,b)c')",
        ] {
            let expr = Expression::parse(input).unwrap();
            let rendered = expr.to_string();
            let reparsed = Expression::parse(&rendered).unwrap();
            assert_eq!(reparsed, expr, "{input} -> {rendered}");
            // Canonical text is a fixed point.
            assert_eq!(reparsed.to_string(), rendered);
        }
    }

    #[test]
    fn test_dump_shape() {
        let expr = Expression::parse("(&,TRUE,(=,[a],1.5))").unwrap();
        let expected = "\
AND &
  TRUE
  EQ =
    KEY [a]
    NUMBER 1.5
";
        assert_eq!(expr.dump(), expected);
    }
}
