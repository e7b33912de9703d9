//! Compiled, reusable programs.

use std::sync::Arc;

use cel_filter_parser::SpannedExpr;

use super::evaluator::Evaluator;
use super::{Activation, FunctionRegistry, Value};
use crate::types::CelType;

/// A checked expression bound to the functions it was checked against.
///
/// Programs hold no per-evaluation state; one program can be evaluated
/// concurrently against any number of activations.
#[derive(Debug, Clone)]
pub struct Program {
    expr: Arc<SpannedExpr>,
    functions: Arc<FunctionRegistry>,
    result_type: CelType,
}

impl Program {
    /// A program from a checked expression and the functions it was checked against.
    pub(crate) fn new(expr: SpannedExpr, functions: Arc<FunctionRegistry>, result_type: CelType) -> Self {
        Self {
            expr: Arc::new(expr),
            functions,
            result_type,
        }
    }

    /// Evaluates against `activation`.
    ///
    /// Never panics on bad input: failures come back as [`Value::Error`].
    pub fn eval(&self, activation: &dyn Activation) -> Value {
        Evaluator::new(&self.functions).eval(&self.expr, activation)
    }

    /// Static type inferred by the checker.
    pub fn result_type(&self) -> &CelType {
        &self.result_type
    }

    /// The checked expression tree.
    pub fn expr(&self) -> &SpannedExpr {
        &self.expr
    }
}
