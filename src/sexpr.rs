use nom::{
    IResult, Parser,
    branch::alt,
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{cut, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::preceded,
};

use crate::MAX_PARSE_DEPTH;
use crate::ast::{Expr, OPERATOR_CHARS, Program};
use crate::{Error, ParseError, ParseErrorKind};

/// Convert nom parsing errors to a structured ParseError
///
/// Only committed (hard) failures reach this point: backtracking signals are
/// consumed by alternation and repetition inside the grammar.
fn parse_error_from_nom(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            let found: Option<String> = e.input.chars().next().map(|c| c.to_string());
            match e.code {
                ErrorKind::TooLarge => ParseError::with_context(
                    ParseErrorKind::TooDeeplyNested,
                    format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                    input,
                    position,
                ),
                ErrorKind::Digit => ParseError::with_context_and_found(
                    ParseErrorKind::InvalidSyntax,
                    "malformed numeric literal: expected digits after the decimal point",
                    input,
                    position,
                    found,
                ),
                ErrorKind::OneOf => ParseError::with_context_and_found(
                    ParseErrorKind::InvalidSyntax,
                    "expected an operator symbol after `(`",
                    input,
                    position,
                    found,
                ),
                _ if position >= input.len() => ParseError::with_context(
                    ParseErrorKind::Incomplete,
                    "unexpected end of input",
                    input,
                    position,
                ),
                ErrorKind::Char => ParseError::with_context_and_found(
                    ParseErrorKind::InvalidSyntax,
                    "expected `)` to close the application",
                    input,
                    position,
                    found,
                ),
                _ => ParseError::with_context_and_found(
                    ParseErrorKind::InvalidSyntax,
                    "invalid syntax",
                    input,
                    position,
                    found,
                ),
            }
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "incomplete input")
        }
    }
}

/// Parse a signed decimal literal (integer, or decimal with a fractional part)
///
/// The sign participates in the committal guard: a bare `+` or `-` with no
/// following digit fails here without consuming input and falls through to
/// the operator rule. Once digits have been seen, a decimal point must be
/// followed by more digits.
fn parse_number(input: &str) -> IResult<&str, Expr> {
    let (input, literal) = recognize((
        opt(one_of("+-")),
        digit1,
        opt(preceded(char('.'), cut(digit1))),
    ))
    .parse(input)?;

    Ok((input, Expr::Number(literal.to_owned())))
}

/// Parse a single operator symbol
fn parse_operator(input: &str) -> IResult<&str, Expr> {
    let (input, symbol) = one_of(OPERATOR_CHARS).parse(input)?;
    Ok((input, Expr::Operator(symbol.to_string())))
}

/// Parse an application: `"(" operator expression* ")"`
///
/// Seeing `(` commits to this rule: from that point on a missing operator
/// token or closing parenthesis is a hard failure, not a backtrack.
fn parse_application(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;

    let (input, operator) = cut(parse_operator).parse(input)?;

    let (input, parameters) = many0(|input| parse_expression(input, depth + 1)).parse(input)?;

    let (input, _) = multispace0.parse(input)?;
    let (input, _) = cut(char(')')).parse(input)?;

    let mut elements = Vec::with_capacity(parameters.len() + 1);
    elements.push(operator);
    elements.extend(parameters);
    Ok((input, Expr::Application(elements)))
}

/// Parse one expression: ordered alternation over the three forms
///
/// The order resolves the only tie-break in the grammar: a sign immediately
/// followed by a digit is a number, a lone sign is an operator.
fn parse_expression(input: &str, depth: usize) -> IResult<&str, Expr> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        multispace0,
        alt((
            |input| parse_application(input, depth),
            parse_number,
            parse_operator,
        )),
    )
    .parse(input)
}

/// Parse a complete program: zero or more expressions.
///
/// Returns `Ok(None)` for empty or all-whitespace input. Anything left over
/// after the last well-formed expression is a [`ParseError`].
pub fn parse_program(input: &str) -> Result<Option<Program>, Error> {
    let input = input.trim();

    match many0(|input| parse_expression(input, 0)).parse(input) {
        Ok((remaining, expressions)) => {
            if !remaining.is_empty() {
                let position = input.len() - remaining.len();
                let kind = if expressions.is_empty() {
                    ParseErrorKind::InvalidSyntax
                } else {
                    ParseErrorKind::TrailingContent
                };
                let found = remaining.chars().next().map(|c| c.to_string());
                return Err(Error::ParseError(ParseError::with_context_and_found(
                    kind,
                    "unexpected input where an expression was expected",
                    input,
                    position,
                    found,
                )));
            }
            if expressions.is_empty() {
                Ok(None)
            } else {
                Ok(Some(expressions))
            }
        }
        Err(e) => Err(Error::ParseError(parse_error_from_nom(input, e))),
    }
}
