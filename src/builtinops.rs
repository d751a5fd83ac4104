//! Built-in arithmetic operations registry.
//!
//! Every built-in operator is the same machine applied to a different binary
//! function: a left fold over the evaluated operands. The registry pins down
//! each operator's symbol, its binary combine function, and its seed: the
//! left operand used when the operator is applied to a single operand.
//!
//! ```text
//! (- 10 3 2)  ; (10 - 3) - 2 = 5, the first operand is the accumulator
//! (- 5)       ; 0 - 5 = -5, the seed is the accumulator
//! (/ 5)       ; 1 / 5 = 0.2
//! ```
//!
//! The asymmetry between the single-operand and multi-operand paths is what
//! makes `-` negate and `/` invert.

use std::sync::Arc;

use crate::ast::NumberType;
use crate::evaluator::{Procedure, ProcedureFn};

/// Definition of a built-in operation
#[derive(Debug, Clone, Copy)]
pub struct BuiltinOp {
    /// The operator symbol this operation is bound to
    pub symbol: &'static str,
    /// Left operand used when the operation is applied to a single operand
    pub seed: NumberType,
    /// Binary function folded over the operands
    pub combine: fn(NumberType, NumberType) -> NumberType,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        // Compare operations by their symbol, which uniquely identifies them
        self.symbol == other.symbol
    }
}

impl BuiltinOp {
    /// Wrap this operation as an environment procedure
    pub(crate) fn procedure(&self) -> Procedure {
        let BuiltinOp {
            symbol,
            seed,
            combine,
        } = *self;
        let func: Arc<ProcedureFn> =
            Arc::new(move |operands: &[NumberType]| Ok(fold(operands, combine, seed)));
        Procedure::new(symbol, func)
    }
}

/// Left fold of `combine` over `operands`
///
/// Exactly one operand folds against `seed`; with two or more operands the
/// first operand is the initial accumulator and `seed` is unused. An empty
/// operand list yields `seed`.
pub(crate) fn fold(
    operands: &[NumberType],
    combine: fn(NumberType, NumberType) -> NumberType,
    seed: NumberType,
) -> NumberType {
    match operands {
        [] => seed,
        [only] => combine(seed, *only),
        [first, rest @ ..] => rest
            .iter()
            .fold(*first, |accumulator, operand| combine(accumulator, *operand)),
    }
}

fn combine_add(left: NumberType, right: NumberType) -> NumberType {
    left + right
}

fn combine_sub(left: NumberType, right: NumberType) -> NumberType {
    left - right
}

fn combine_mul(left: NumberType, right: NumberType) -> NumberType {
    left * right
}

fn combine_div(left: NumberType, right: NumberType) -> NumberType {
    left / right
}

/// Global registry of all built-in operations, in the order they are bound
/// in the default environment
static BUILTIN_OPS: [BuiltinOp; 4] = [
    BuiltinOp {
        symbol: "+",
        seed: 0.0,
        combine: combine_add,
    },
    BuiltinOp {
        symbol: "-",
        seed: 0.0,
        combine: combine_sub,
    },
    BuiltinOp {
        symbol: "*",
        seed: 1.0,
        combine: combine_mul,
    },
    BuiltinOp {
        symbol: "/",
        seed: 1.0,
        combine: combine_div,
    },
];

/// Get all builtin operations (for use by the default environment)
pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    &BUILTIN_OPS
}

/// Find a builtin operation by its operator symbol
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn find_op(symbol: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_OPS.iter().find(|op| op.symbol == symbol)
}
