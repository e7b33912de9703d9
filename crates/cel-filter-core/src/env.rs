//! Compilation environment: declared variables plus declared functions.

use std::collections::HashMap;
use std::sync::Arc;

use cel_filter_parser::{ParseError, SpannedExpr};

use crate::checker::{check, CheckError, CheckResult, Checker};
use crate::decls::FunctionDecl;
use crate::eval::{FunctionRegistry, Program};
use crate::stdlib::STANDARD_LIBRARY;
use crate::types::CelType;

/// Why an expression failed to compile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{}", join_messages(.0))]
    Check(Vec<CheckError>),
}

fn join_messages(errors: &[CheckError]) -> String {
    errors
        .iter()
        .map(|e| format!("{e} at {}..{}", e.span.start, e.span.end))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Declarations expressions are compiled against.
///
/// An `Env` is built once and then only read; compiled [`Program`]s share
/// its function registry.
///
/// ```
/// use cel_filter_core::{CelType, Env};
///
/// let env = Env::with_standard_library().with_variable("x", CelType::Int);
/// assert!(env.compile("x + 1").is_ok());
/// assert!(env.compile("x + 'a'").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Env {
    variables: HashMap<String, CelType>,
    functions: Arc<FunctionRegistry>,
    homogeneous_aggregates: bool,
}

impl Env {
    /// An environment with no variables or functions, not even operators.
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment declaring the operators and built-in functions of
    /// [`STANDARD_LIBRARY`], with no variables.
    pub fn with_standard_library() -> Self {
        Self {
            functions: Arc::new(STANDARD_LIBRARY.iter().cloned().collect()),
            ..Self::default()
        }
    }

    /// Declares `name` with `cel_type`, replacing an earlier declaration.
    pub fn with_variable(mut self, name: impl Into<String>, cel_type: CelType) -> Self {
        self.add_variable(name, cel_type);
        self
    }

    /// In-place form of [`Env::with_variable`].
    pub fn add_variable(&mut self, name: impl Into<String>, cel_type: CelType) {
        self.variables.insert(name.into(), cel_type);
    }

    /// Adds `decl`, merging its overloads into any function of the same name.
    pub fn with_function(mut self, decl: FunctionDecl) -> Self {
        self.add_function(decl);
        self
    }

    /// In-place form of [`Env::with_function`]. Programs compiled earlier
    /// keep the registry they were compiled with.
    pub fn add_function(&mut self, decl: FunctionDecl) {
        Arc::make_mut(&mut self.functions).register(decl);
    }

    /// When enabled, list and map literals whose elements share no common
    /// type fail to check with `HeterogeneousAggregate`. Off by default,
    /// where such literals are typed with `dyn` elements.
    pub fn with_homogeneous_aggregates(mut self, enabled: bool) -> Self {
        self.homogeneous_aggregates = enabled;
        self
    }

    /// Declared variables and their types.
    pub fn variables(&self) -> &HashMap<String, CelType> {
        &self.variables
    }

    /// Declared functions, including operators.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Type checks an already parsed expression.
    pub fn check(&self, expr: &SpannedExpr) -> CheckResult {
        if !self.homogeneous_aggregates {
            return check(expr, &self.variables, &self.functions);
        }
        let mut checker =
            Checker::new(&self.variables, &self.functions).with_homogeneous_aggregates(true);
        let result_type = checker.check_expr(expr);
        CheckResult {
            result_type,
            errors: checker.into_errors(),
        }
    }

    /// Parses and checks `source`.
    pub fn compile(&self, source: &str) -> Result<Program, CompileError> {
        let expr = cel_filter_parser::parse(source)?;
        let checked = self.check(&expr);
        if !checked.is_ok() {
            return Err(CompileError::Check(checked.errors));
        }
        Ok(Program::new(
            expr,
            Arc::clone(&self.functions),
            checked.result_type,
        ))
    }
}
