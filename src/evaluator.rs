use std::collections::HashMap;
use std::sync::Arc;

use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::{Expr, NumberType};
use crate::builtinops::get_builtin_ops;

/// Canonical erased procedure type stored in the environment.
///
/// Procedures receive the already-evaluated operands as a variadic argument
/// list and may reject them with an [`Error`].
pub type ProcedureFn = dyn Fn(&[NumberType]) -> Result<NumberType, Error> + Send + Sync;

/// A named variadic procedure bound in an environment.
///
/// Uses the id string for equality and debug output instead of the function
/// pointer.
#[derive(Clone)]
pub struct Procedure {
    id: String,
    func: Arc<ProcedureFn>,
}

impl Procedure {
    pub(crate) fn new(id: impl Into<String>, func: Arc<ProcedureFn>) -> Self {
        Procedure {
            id: id.into(),
            func,
        }
    }

    /// The symbol this procedure was registered under
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Invoke the procedure with evaluated operands
    pub fn apply(&self, operands: &[NumberType]) -> Result<NumberType, Error> {
        (self.func)(operands)
    }
}

impl std::fmt::Debug for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Procedure({})", self.id)
    }
}

impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        // Compare procedures by id string, not function pointer
        self.id == other.id
    }
}

/// The result of evaluating an expression: a number, or a procedure when a
/// bare operator symbol is evaluated on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(NumberType),
    Procedure(Procedure),
}

impl Value {
    /// The numeric payload, if this value is a number
    pub fn as_number(&self) -> Option<NumberType> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Procedure(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Procedure(procedure) => write!(f, "#<procedure:{}>", procedure.id),
        }
    }
}

/// Environment mapping operator symbols to procedures.
///
/// The environment is a plain value owned by the caller: create one with
/// [`create_global_env`], thread it through evaluation explicitly, and
/// mutate it only through [`Environment::define`] or the registration
/// helpers. Evaluation itself never mutates the environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Procedure>,
}

impl Environment {
    pub(crate) fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
        }
    }

    /// Register or overwrite a binding. Lookup is exact-string match only.
    pub fn define(&mut self, name: impl Into<String>, procedure: Procedure) {
        self.bindings.insert(name.into(), procedure);
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Procedure> {
        self.bindings.get(name)
    }

    /// Register a plain Rust function as a procedure.
    ///
    /// This is the low-level registration API: it accepts a function that
    /// works on the already-evaluated operand slice and returns a
    /// `Result<f64, Error>`. Overwriting a built-in operator is allowed.
    ///
    /// # Example
    /// ```
    /// use arithxp::Error;
    /// use arithxp::evaluator::{self, Value, create_global_env};
    /// use arithxp::sexpr::parse_program;
    ///
    /// fn checked_div(operands: &[f64]) -> Result<f64, Error> {
    ///     let Some((first, rest)) = operands.split_first() else {
    ///         return Ok(1.0);
    ///     };
    ///     if rest.contains(&0.0) {
    ///         return Err(Error::EvalError("division by zero".to_owned()));
    ///     }
    ///     Ok(rest.iter().fold(*first, |acc, divisor| acc / divisor))
    /// }
    ///
    /// let mut env = create_global_env();
    /// env.register_procedure("/", checked_div);
    ///
    /// let program = parse_program("(/ 8 2)").unwrap().unwrap();
    /// assert_eq!(evaluator::eval_program(&program, &env).unwrap(), Value::Number(4.0));
    ///
    /// let program = parse_program("(/ 8 0)").unwrap().unwrap();
    /// assert!(evaluator::eval_program(&program, &env).is_err());
    /// ```
    pub fn register_procedure(
        &mut self,
        name: &str,
        func: fn(&[NumberType]) -> Result<NumberType, Error>,
    ) {
        let f = func;
        let wrapped: Arc<ProcedureFn> = Arc::new(move |operands: &[NumberType]| f(operands));
        self.define(name, Procedure::new(name, wrapped));
    }

    /// All bound symbols, sorted by name
    pub fn defined_symbols(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Evaluate an expression (public API)
pub fn eval(expr: &Expr, env: &Environment) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, env, 0)
}

/// Evaluate a whole program, returning the value of its last expression
pub fn eval_program(program: &[Expr], env: &Environment) -> Result<Value, Error> {
    let mut last = None;
    for expr in program {
        last = Some(eval(expr, env)?);
    }
    last.ok_or_else(|| Error::EvalError("cannot evaluate an empty program".to_owned()))
}

/// Evaluate an expression with depth tracking to prevent stack overflow
fn eval_with_depth_tracking(expr: &Expr, env: &Environment, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::EvalError(format!(
            "evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        )));
    }
    match expr {
        // Number literals keep their source text; conversion happens here
        Expr::Number(literal) => literal
            .parse::<NumberType>()
            .map(Value::Number)
            .map_err(|_| Error::EvalError(format!("malformed numeric literal: {literal}"))),

        // Operator lookup is exact-string match in the environment
        Expr::Operator(symbol) => match env.get(symbol) {
            Some(procedure) => Ok(Value::Procedure(procedure.clone())),
            None => Err(Error::EvalError(format!("unknown operator: {symbol}"))),
        },

        Expr::Application(elements) => {
            eval_application(elements, env, depth).map_err(|err| add_context(err, expr))
        }
    }
}

/// Helper function to add expression context to evaluation errors
fn add_context(error: Error, expr: &Expr) -> Error {
    match error {
        Error::EvalError(msg) => {
            Error::EvalError(format!("{msg}\n  Context: while evaluating: {expr}"))
        }
        other => other,
    }
}

/// Evaluate an application: the first element resolves to the operator
/// procedure, the remaining elements evaluate left-to-right to its operands
fn eval_application(elements: &[Expr], env: &Environment, depth: usize) -> Result<Value, Error> {
    match elements {
        [] => Err(Error::EvalError(
            "cannot evaluate an empty application".to_owned(),
        )),

        [operator_expr, operand_exprs @ ..] => {
            let operator = eval_with_depth_tracking(operator_expr, env, depth + 1)?;
            let Value::Procedure(procedure) = operator else {
                return Err(Error::EvalError(format!(
                    "cannot apply non-procedure: {operator}"
                )));
            };

            let operands = eval_operands(operand_exprs, env, depth)?;
            procedure.apply(&operands).map(Value::Number)
        }
    }
}

/// Helper function to evaluate operand expressions down to numbers
fn eval_operands(
    operands: &[Expr],
    env: &Environment,
    depth: usize,
) -> Result<Vec<NumberType>, Error> {
    operands
        .iter()
        .map(
            |operand| match eval_with_depth_tracking(operand, env, depth + 1)? {
                Value::Number(n) => Ok(n),
                value @ Value::Procedure(_) => {
                    Err(Error::EvalError(format!("operand is not a number: {value}")))
                }
            },
        )
        .collect()
}

/// Create a global environment with the built-in arithmetic procedures
pub fn create_global_env() -> Environment {
    let mut env = Environment::new();

    for builtin_op in get_builtin_ops() {
        env.define(builtin_op.symbol, builtin_op.procedure());
    }

    env
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{app, num, op};
    use crate::sexpr::parse_program;

    /// Test result variants for comprehensive testing
    #[derive(Debug)]
    enum TestResult {
        EvalResult(Value),           // Evaluation should succeed with this value
        SpecificError(&'static str), // Evaluation should fail with error containing this string
        Error,                       // Evaluation should fail (any error)
    }
    use TestResult::*;

    /// Micro-helper for numeric success cases
    fn success(n: NumberType) -> TestResult {
        EvalResult(Value::Number(n))
    }

    /// Execute a single parse-then-evaluate test case with detailed reporting
    fn execute_test_case(input: &str, expected: &TestResult, env: &Environment, test_id: &str) {
        let program = match parse_program(input) {
            Ok(Some(program)) => program,
            Ok(None) => panic!("{test_id}: unexpected empty parse for '{input}'"),
            Err(parse_err) => {
                panic!("{test_id}: unexpected parse error for '{input}': {parse_err:?}")
            }
        };

        match (eval_program(&program, env), expected) {
            (Ok(actual), EvalResult(expected_val)) => {
                assert_eq!(actual, *expected_val, "{test_id}: value mismatch");
            }

            (Err(_), Error) => {} // Expected generic error
            (Err(e), SpecificError(expected_text)) => {
                let error_msg = format!("{e}");
                assert!(
                    error_msg.contains(expected_text),
                    "{test_id}: error should contain '{expected_text}', got: {error_msg}"
                );
            }
            (Ok(actual), Error | SpecificError(_)) => {
                panic!("{test_id}: expected error, got {actual:?}");
            }
            (Err(err), EvalResult(expected_val)) => {
                panic!("{test_id}: expected {expected_val:?}, got error {err:?}");
            }
        }
    }

    /// Simplified test runner evaluating each case in a fresh global environment
    fn run_comprehensive_tests(test_cases: Vec<(&str, TestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let env = create_global_env();
            let test_id = format!("#{}", i + 1);
            execute_test_case(input, expected, &env, &test_id);
        }
    }

    #[test]
    fn test_comprehensive_evaluation_data_driven() {
        let test_cases = vec![
            // === NUMBER LITERALS ===
            ("42", success(42.0)),
            ("-271", success(-271.0)),
            ("+7", success(7.0)),
            ("0", success(0.0)),
            ("-34.4", success(-34.4)),
            ("3.25", success(3.25)),
            ("007", success(7.0)),
            // === BASIC APPLICATIONS ===
            ("(+ 1 3)", success(4.0)),
            ("(* 2 2)", success(4.0)),
            ("(/ 4 2)", success(2.0)),
            ("(- 7 2)", success(5.0)),
            // === NESTED APPLICATIONS ===
            ("(+ (+ 1 4) (- 7 2))", success(10.0)),
            ("(+ 1 (* 2 (- 8 3)))", success(11.0)),
            ("(* (+ 1 2) (- 5 2))", success(9.0)),
            // === TOKEN ADJACENCY ===
            ("(+3 (*2 2) 4)", success(11.0)),
            // === SINGLE OPERAND FOLDS AGAINST THE SEED ===
            ("(- 5)", success(-5.0)),
            ("(/ 5)", success(0.2)),
            ("(+ 5)", success(5.0)),
            ("(* 7)", success(7.0)),
            ("(- -5)", success(5.0)),
            // === MULTIPLE OPERANDS FOLD FROM THE FIRST OPERAND ===
            ("(- 10 3 2)", success(5.0)),
            ("(/ 100 5 2)", success(10.0)),
            ("(+ 1 2 3 4)", success(10.0)),
            ("(* 2 3 4)", success(24.0)),
            // === NO OPERANDS YIELD THE SEED ===
            ("(+)", success(0.0)),
            ("(-)", success(0.0)),
            ("(*)", success(1.0)),
            ("(/)", success(1.0)),
            // === FRACTIONAL ARITHMETIC ===
            ("(+ 1.5 2.25)", success(3.75)),
            ("(/ 1 4)", success(0.25)),
            ("(- 0.5 2)", success(-1.5)),
            // Division by zero follows IEEE semantics
            ("(/ 1 0)", success(f64::INFINITY)),
            ("(/ -1 0)", success(f64::NEG_INFINITY)),
            // === PROGRAM SEQUENCES: LAST VALUE WINS ===
            ("1 2 3", success(3.0)),
            ("(+ 1 2) (* 3 4)", success(12.0)),
            // === ERROR CASES ===
            // A procedure in operand position is not a number
            ("(+ - 1)", SpecificError("operand is not a number")),
            ("(* (+) /)", SpecificError("operand is not a number")),
            // A number in operator position cannot be applied
            ("(+ 1 (+3))", success(4.0)), // `(+3)` is `(+ 3)`: operator then parameter
        ];

        run_comprehensive_tests(test_cases);
    }

    #[test]
    fn test_eval_hand_built_trees() {
        // The AST is also the accepted evaluable form: a harness may build
        // expression trees directly and hand them to the evaluator
        let env = create_global_env();

        let test_cases = vec![
            (app(vec![op("+"), num("1"), num("3")]), 4.0),
            (
                app(vec![
                    op("+"),
                    app(vec![op("+"), num("1"), num("4")]),
                    app(vec![op("-"), num("7"), num("2")]),
                ]),
                10.0,
            ),
            (app(vec![op("*"), num("2"), num("2")]), 4.0),
            (app(vec![op("/"), num("4"), num("2")]), 2.0),
            (num("-34.4"), -34.4),
        ];

        for (i, (expr, expected)) in test_cases.iter().enumerate() {
            let result = eval(expr, &env).unwrap_or_else(|e| {
                panic!("Hand-built test {} failed to evaluate: {e}", i + 1)
            });
            assert_eq!(
                result,
                Value::Number(*expected),
                "Hand-built test {} value mismatch",
                i + 1
            );
        }
    }

    #[test]
    fn test_eval_error_cases_hand_built() {
        let env = create_global_env();

        // Empty applications cannot be produced by the grammar but can be
        // hand-built; they are evaluation errors
        let err = eval(&Expr::Application(vec![]), &env).unwrap_err();
        assert!(format!("{err}").contains("empty application"));

        // A number in operator position cannot be applied
        let err = eval(&app(vec![num("3"), num("4")]), &env).unwrap_err();
        assert!(format!("{err}").contains("cannot apply non-procedure"));

        // Literal text that does not parse as a number
        let err = eval(&num("abc"), &env).unwrap_err();
        assert!(format!("{err}").contains("malformed numeric literal"));

        // Unknown symbols are evaluation errors, with exact-string lookup
        let err = eval(&op("%"), &env).unwrap_err();
        assert!(format!("{err}").contains("unknown operator"));
        let err = eval(&op("+ "), &env).unwrap_err();
        assert!(format!("{err}").contains("unknown operator"));

        // An empty environment knows no operators at all
        let err = eval(&op("+"), &Environment::default()).unwrap_err();
        assert!(format!("{err}").contains("unknown operator"));
    }

    #[test]
    fn test_bare_operator_resolves_to_procedure() {
        let env = create_global_env();

        match eval(&op("+"), &env).unwrap() {
            Value::Procedure(procedure) => assert_eq!(procedure.id(), "+"),
            other => panic!("expected a procedure, got {other:?}"),
        }

        // Display of a resolved procedure names its binding
        let value = eval(&op("/"), &env).unwrap();
        assert_eq!(format!("{value}"), "#<procedure:/>");
    }

    #[test]
    fn test_define_overwrites_binding() {
        fn always_forty_two(_operands: &[NumberType]) -> Result<NumberType, crate::Error> {
            Ok(42.0)
        }

        let mut env = create_global_env();
        env.register_procedure("+", always_forty_two);

        let program = parse_program("(+ 1 2 3)").unwrap().unwrap();
        assert_eq!(eval_program(&program, &env).unwrap(), Value::Number(42.0));

        // Other bindings are untouched
        let program = parse_program("(* 2 3)").unwrap().unwrap();
        assert_eq!(eval_program(&program, &env).unwrap(), Value::Number(6.0));
    }

    #[test]
    fn test_register_procedure_new_symbol() {
        fn largest(operands: &[NumberType]) -> Result<NumberType, crate::Error> {
            operands
                .iter()
                .copied()
                .reduce(NumberType::max)
                .ok_or_else(|| crate::Error::EvalError("largest of no operands".to_owned()))
        }

        let mut env = create_global_env();
        env.register_procedure("largest", largest);

        // The grammar never produces symbols beyond the four operators, but
        // hand-built trees can reach any registered binding
        let expr = app(vec![op("largest"), num("3"), num("9"), num("7")]);
        assert_eq!(eval(&expr, &env).unwrap(), Value::Number(9.0));

        let expr = app(vec![op("largest")]);
        let err = eval(&expr, &env).unwrap_err();
        assert!(format!("{err}").contains("largest of no operands"));
    }

    #[test]
    fn test_defined_symbols_listing() {
        let env = create_global_env();
        assert_eq!(env.defined_symbols(), vec!["*", "+", "-", "/"]);

        let mut env = env;
        env.register_procedure("avg", |operands| {
            Ok(operands.iter().sum::<NumberType>() / operands.len() as NumberType)
        });
        assert_eq!(env.defined_symbols(), vec!["*", "+", "-", "/", "avg"]);
    }

    #[test]
    fn test_evaluation_is_deterministic_and_side_effect_free() {
        let env = create_global_env();
        let program = parse_program("(+ 3 (* 2 2) 4)").unwrap().unwrap();

        let first = eval_program(&program, &env).unwrap();
        let second = eval_program(&program, &env).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Value::Number(11.0));

        // Evaluation never mutates the environment
        assert_eq!(env.defined_symbols(), vec!["*", "+", "-", "/"]);
    }

    #[test]
    fn test_evaluation_depth_limit() {
        // Nesting this deep cannot come from the parser (the parse depth
        // limit is lower), but hand-built trees have no such bound
        let mut expr = num("1");
        for _ in 0..MAX_EVAL_DEPTH {
            expr = app(vec![op("+"), expr]);
        }

        let env = create_global_env();
        let err = eval(&expr, &env).unwrap_err();
        assert!(format!("{err}").contains("depth"));
    }
}
