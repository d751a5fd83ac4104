//! Expression tree produced by the parser. The main enum, [`Expr`], covers
//! the three expression forms of the language: number literals, operator
//! symbols, and applications. Number literals keep their source text so the
//! tree stays faithful to the input; conversion to a numeric value happens
//! during evaluation. Helper functions [`num`], [`op`], and [`app`] are
//! provided for convenient tree construction in tests. Display logic renders
//! an expression back to parseable source form.

/// Type alias for number values in the interpreter
pub(crate) type NumberType = f64;

/// The operator symbols recognized by the grammar
pub(crate) const OPERATOR_CHARS: &str = "+-*/";

/// A program is the ordered sequence of top-level expressions of one parse.
pub type Program = Vec<Expr>;

/// Core AST type in the interpreter
///
/// An application holds its operator as the first element of its sequence,
/// so `(+ 3 (* 2 2) 4)` becomes
/// `Application([Operator("+"), Number("3"), Application([...]), Number("4")])`.
/// Nesting is structural: a sub-application is exactly one element of its
/// parent's sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number literals, stored as source text (e.g. `"3"`, `"-34.4"`)
    Number(String),
    /// Operator symbols, one of `+ - * /`
    Operator(String),
    /// Applications: an operator followed by zero or more operand expressions
    Application(Vec<Expr>),
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(literal) => write!(f, "{literal}"),
            Expr::Operator(symbol) => write!(f, "{symbol}"),
            Expr::Application(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Helper function for creating number literals from their source text
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn num<S: AsRef<str>>(literal: S) -> Expr {
    Expr::Number(literal.as_ref().to_owned())
}

/// Helper function for creating operator symbols
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn op<S: AsRef<str>>(symbol: S) -> Expr {
    Expr::Operator(symbol.as_ref().to_owned())
}

/// Helper function for creating applications - works great nested
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn app(elements: Vec<Expr>) -> Expr {
    Expr::Application(elements)
}

#[cfg(test)]
mod display_tests {
    use super::*;

    #[test]
    fn test_display_round_trippable_forms() {
        // Test cases as (Expr, rendered source) tuples
        let test_cases = vec![
            (num("42"), "42"),
            (num("-34.4"), "-34.4"),
            (num("+7"), "+7"),
            (op("+"), "+"),
            (op("/"), "/"),
            (app(vec![op("+"), num("1"), num("3")]), "(+ 1 3)"),
            (
                app(vec![
                    op("+"),
                    num("3"),
                    app(vec![op("*"), num("2"), num("2")]),
                    num("4"),
                ]),
                "(+ 3 (* 2 2) 4)",
            ),
            (app(vec![op("-")]), "(-)"),
        ];

        for (i, (expr, expected)) in test_cases.iter().enumerate() {
            assert_eq!(
                format!("{expr}"),
                *expected,
                "Display test {} failed",
                i + 1
            );
        }
    }

    #[test]
    fn test_helper_functions() {
        assert_eq!(num("3"), Expr::Number("3".to_owned()));
        assert_eq!(num(String::from("-34.4")), Expr::Number("-34.4".to_owned()));
        assert_eq!(op("*"), Expr::Operator("*".to_owned()));
        assert_eq!(app(vec![]), Expr::Application(vec![]));
    }
}
