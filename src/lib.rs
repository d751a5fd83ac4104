//! arithxp - Minimal S-expression arithmetic interpreter
//!
//! This crate parses a parenthesized prefix-notation arithmetic language into
//! an abstract syntax tree and evaluates it against an environment of
//! variadic arithmetic procedures:
//!
//! ```text
//! (+ 3 (* 2 2) 4)   ; => 11
//! (- 5)             ; => -5   (single operand folds against the seed 0)
//! (/ 5)             ; => 0.2  (single operand folds against the seed 1)
//! ```
//!
//! Parsing is a backtracking recursive-descent grammar built from `nom`
//! combinators: each rule either fully succeeds, or fails without consuming
//! input so the caller's alternation can try the next rule. Once a rule has
//! committed (an opening `(` has been seen, or the digits of a number
//! literal), a missing token is a hard [`ParseError`] rather than a
//! backtrack.
//!
//! Evaluation walks the tree with an explicit [`evaluator::Environment`]
//! owned by the caller. The four built-in operators are variadic left folds:
//! a single operand folds against the operator's fixed seed, while two or
//! more operands fold starting from the first operand.
//!
//! ```
//! use arithxp::evaluator::{self, Value};
//! use arithxp::sexpr::parse_program;
//!
//! let env = evaluator::create_global_env();
//! let program = parse_program("(+ 3 (* 2 2) 4)").unwrap().unwrap();
//! assert_eq!(evaluator::eval_program(&program, &env).unwrap(), Value::Number(11.0));
//! ```
//!
//! ## Modules
//!
//! - `sexpr`: S-expression parsing from text
//! - `ast`: expression tree produced by the parser
//! - `evaluator`: tree-walking evaluation engine and environment
//! - `builtinops`: built-in arithmetic operations

use std::fmt;

/// Maximum parsing depth to prevent stack overflow from deeply nested input
pub const MAX_PARSE_DEPTH: usize = 32;

/// Maximum evaluation depth to prevent stack overflow in recursive evaluation
/// Set higher than parse depth to allow for hand-built expression trees
pub const MAX_EVAL_DEPTH: usize = 64;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the expression was complete (unclosed parens, dangling dot)
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
    /// Extra input found after a complete, valid expression
    TrailingContent,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    /// Create a ParseError with all fields
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a simple ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context extracted from input at a given offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        Self::with_context_and_found(kind, message, input, error_offset, None)
    }

    /// Create a ParseError with context and found token
    pub fn with_context_and_found(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
        found: Option<String>,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        // Show some context before the error position as well
        let context_start = error_offset.saturating_sub(20);

        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.len() < input.len() {
            display_context.push_str("[...]");
        }

        // Replace newlines with visible markers for better error display
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        Self::new(kind, message, Some(display_context), found)
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ParseError(ParseError),
    EvalError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(e) => {
                write!(f, "ParseError: {}", e.message)?;
                if let Some(found) = &e.found {
                    write!(f, "\nFound: {found}")?;
                }
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
            Error::EvalError(msg) => write!(f, "EvaluationError: {msg}"),
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod sexpr;
