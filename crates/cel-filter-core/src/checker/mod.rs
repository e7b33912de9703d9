//! Static type checking.
//!
//! The checker walks a parsed expression once, infers a type for every node
//! and collects every error it finds rather than stopping at the first. A
//! node that fails to check gets the `Error` type, which unifies with
//! anything so one mistake is reported once.

mod errors;
mod overload;
mod scope;

use std::collections::HashMap;

use cel_filter_parser::{Comprehension, Expr, Span, SpannedExpr};

pub use errors::{CheckError, CheckErrorKind};

use crate::eval::FunctionRegistry;
use crate::types::CelType;
use overload::resolve_overload;
use scope::ScopeStack;

/// Prefix of identifiers user expressions may not bind or reference.
const RESERVED_PREFIX: &str = "__";

/// Outcome of checking one expression.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Type of the whole expression; `Error` if it failed to check.
    pub result_type: CelType,
    pub errors: Vec<CheckError>,
}

impl CheckResult {
    /// True when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks `expr` against the declared `variables` and `functions`.
pub fn check(
    expr: &SpannedExpr,
    variables: &HashMap<String, CelType>,
    functions: &FunctionRegistry,
) -> CheckResult {
    let mut checker = Checker::new(variables, functions);
    let result_type = checker.check_expr(expr);
    CheckResult {
        result_type,
        errors: checker.errors,
    }
}

/// Type checker for one expression.
///
/// Most callers want [`check`] or [`Env::check`](crate::Env::check); the
/// struct is public for options such as
/// [`with_homogeneous_aggregates`](Checker::with_homogeneous_aggregates).
pub struct Checker<'a> {
    variables: &'a HashMap<String, CelType>,
    functions: &'a FunctionRegistry,
    scopes: ScopeStack,
    errors: Vec<CheckError>,
    homogeneous_aggregates: bool,
}

impl<'a> Checker<'a> {
    /// A checker over the given declarations, with an empty scope.
    pub fn new(variables: &'a HashMap<String, CelType>, functions: &'a FunctionRegistry) -> Self {
        Self {
            variables,
            functions,
            scopes: ScopeStack::new(),
            errors: Vec::new(),
            homogeneous_aggregates: false,
        }
    }

    /// Reject list and map literals whose elements have no common type
    /// instead of typing them as `dyn`.
    pub fn with_homogeneous_aggregates(mut self, enabled: bool) -> Self {
        self.homogeneous_aggregates = enabled;
        self
    }

    /// Consumes the checker, returning the collected errors.
    pub fn into_errors(self) -> Vec<CheckError> {
        self.errors
    }

    fn report(&mut self, err: CheckError) -> CelType {
        self.errors.push(err);
        CelType::Error
    }

    /// Infers the type of `expr`, recording errors as it goes.
    ///
    /// Returns `Error` for a node that failed to check.
    pub fn check_expr(&mut self, expr: &SpannedExpr) -> CelType {
        let span = expr.span.clone();
        let id = expr.id;
        match &expr.node {
            Expr::Null => CelType::Null,
            Expr::Bool(_) => CelType::Bool,
            Expr::Int(_) => CelType::Int,
            Expr::UInt(_) => CelType::UInt,
            Expr::Double(_) => CelType::Double,
            Expr::String(_) => CelType::String,
            Expr::Ident(name) => self.check_ident(name, span, id),
            Expr::List(items) => {
                let types: Vec<CelType> = items.iter().map(|item| self.check_expr(item)).collect();
                let elem = self.join_all(types, span, id);
                CelType::list(elem)
            }
            Expr::Map(entries) => {
                let (keys, values): (Vec<CelType>, Vec<CelType>) = entries
                    .iter()
                    .map(|(k, v)| (self.check_expr(k), self.check_expr(v)))
                    .unzip();
                let key = self.join_all(keys, span.clone(), id);
                let value = self.join_all(values, span, id);
                CelType::map(key, value)
            }
            Expr::Unary { op, operand } => {
                let arg = self.check_expr(operand);
                self.check_call(op.function_name(), None, vec![arg], span, id)
            }
            Expr::Binary { op, left, right } => {
                let args = vec![self.check_expr(left), self.check_expr(right)];
                self.check_call(op.function_name(), None, args, span, id)
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let cond_type = self.check_expr(cond);
                let then_type = self.check_expr(then_expr);
                let else_type = self.check_expr(else_expr);
                if !CelType::Bool.is_assignable_from(&cond_type) {
                    self.report(CheckError::no_matching_overload(
                        "_?_:_",
                        vec![cond_type, then_type.clone(), else_type.clone()],
                        span,
                        id,
                    ));
                }
                then_type.join(&else_type).unwrap_or(CelType::Dyn)
            }
            Expr::Select {
                operand,
                field,
                test_only,
            } => {
                let operand_type = self.check_expr(operand);
                self.check_select(&operand_type, field, *test_only, span, id)
            }
            Expr::Index { operand, index } => {
                let args = vec![self.check_expr(operand), self.check_expr(index)];
                self.check_call("_[_]", None, args, span, id)
            }
            Expr::Call {
                target,
                function,
                args,
            } => {
                let target_type = target.as_deref().map(|t| self.check_expr(t));
                let arg_types = args.iter().map(|a| self.check_expr(a)).collect();
                self.check_call(function, target_type, arg_types, span, id)
            }
            Expr::Comprehension(comp) => self.check_comprehension(comp, span, id),
        }
    }

    fn check_ident(&mut self, name: &str, span: Span, id: i64) -> CelType {
        if name.starts_with(RESERVED_PREFIX) {
            return self.report(CheckError::new(
                CheckErrorKind::ReservedIdentifier {
                    name: name.to_string(),
                },
                span,
                id,
            ));
        }
        if let Some(ty) = self.scopes.lookup(name).or_else(|| self.variables.get(name)) {
            return ty.clone();
        }
        self.report(CheckError::undeclared_reference(name, span, id))
    }

    /// Common type of aggregate elements.
    ///
    /// An empty aggregate is `dyn`, and so are elements with no common type
    /// unless homogeneous aggregates were requested.
    fn join_all(&mut self, types: Vec<CelType>, span: Span, id: i64) -> CelType {
        let mut iter = types.iter();
        let Some(first) = iter.next() else {
            return CelType::Dyn;
        };
        match iter.try_fold(first.clone(), |acc, ty| acc.join(ty)) {
            Some(joined) => joined,
            None if self.homogeneous_aggregates => self.report(CheckError::new(
                CheckErrorKind::HeterogeneousAggregate { types },
                span,
                id,
            )),
            None => CelType::Dyn,
        }
    }

    fn check_select(
        &mut self,
        operand: &CelType,
        field: &str,
        test_only: bool,
        span: Span,
        id: i64,
    ) -> CelType {
        let field_type = match operand {
            CelType::Dyn | CelType::Error => CelType::Dyn,
            CelType::Map(key, value) if key.is_assignable_from(&CelType::String) => {
                value.as_ref().clone()
            }
            other => return self.report(CheckError::undefined_field(other, field, span, id)),
        };
        if test_only {
            CelType::Bool
        } else {
            field_type
        }
    }

    fn check_call(
        &mut self,
        function: &str,
        target: Option<CelType>,
        args: Vec<CelType>,
        span: Span,
        id: i64,
    ) -> CelType {
        let Some(decl) = self.functions.get(function) else {
            return self.report(CheckError::undeclared_reference(function, span, id));
        };
        if let Some(result) = resolve_overload(decl, target.as_ref(), &args) {
            return result;
        }
        let arg_types: Vec<CelType> = target.into_iter().chain(args).collect();
        if arg_types.contains(&CelType::Error) {
            return CelType::Error;
        }
        self.report(CheckError::no_matching_overload(function, arg_types, span, id))
    }

    fn check_comprehension(&mut self, comp: &Comprehension, span: Span, id: i64) -> CelType {
        let range = self.check_expr(&comp.iter_range);
        let iter_type = match &range {
            CelType::List(elem) => elem.as_ref().clone(),
            CelType::Map(key, _) => key.as_ref().clone(),
            CelType::Dyn | CelType::Error => CelType::Dyn,
            other => self.report(CheckError::new(
                CheckErrorKind::NotIterable { ty: other.clone() },
                span.clone(),
                id,
            )),
        };
        if comp.iter_var.starts_with(RESERVED_PREFIX) {
            self.report(CheckError::new(
                CheckErrorKind::ReservedIdentifier {
                    name: comp.iter_var.clone(),
                },
                span,
                id,
            ));
        }
        let accu_type = self.check_expr(&comp.accu_init);

        self.scopes.enter();
        self.scopes.declare(&comp.accu_var, accu_type.clone());

        self.scopes.enter();
        self.scopes.declare(&comp.iter_var, iter_type);
        self.check_expr(&comp.loop_condition);
        let step_type = self.check_expr(&comp.loop_step);
        self.scopes.exit();

        // The result sees the accumulator as widened by the step.
        let accu_type = accu_type.join(&step_type).unwrap_or(CelType::Dyn);
        self.scopes.declare(&comp.accu_var, accu_type);
        let result = self.check_expr(&comp.result);
        self.scopes.exit();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::STANDARD_LIBRARY;

    fn declarations() -> (HashMap<String, CelType>, FunctionRegistry) {
        let variables = HashMap::from([
            ("body".to_string(), CelType::Dyn),
            (
                "header".to_string(),
                CelType::map(CelType::String, CelType::list(CelType::String)),
            ),
        ]);
        (variables, STANDARD_LIBRARY.iter().cloned().collect())
    }

    fn check_source(source: &str) -> CheckResult {
        let expr = cel_filter_parser::parse(source).unwrap();
        let (variables, functions) = declarations();
        check(&expr, &variables, &functions)
    }

    fn check_type(source: &str) -> CelType {
        let result = check_source(source);
        assert!(result.is_ok(), "{source}: {:?}", result.errors);
        result.result_type
    }

    fn first_error(source: &str) -> CheckErrorKind {
        let result = check_source(source);
        assert!(!result.is_ok(), "{source} should not check");
        result.errors[0].kind.clone()
    }

    #[test]
    fn header_access_is_typed() {
        assert_eq!(
            check_type("header['X-Test']"),
            CelType::list(CelType::String)
        );
        assert_eq!(check_type("header['X-Test'][0]"), CelType::String);
        assert_eq!(check_type("header['X-Test'][0] == 'x'"), CelType::Bool);
        assert_eq!(check_type("'X-Test' in header"), CelType::Bool);
    }

    #[test]
    fn body_is_dynamic() {
        assert_eq!(check_type("body.value"), CelType::Dyn);
        assert_eq!(check_type("body.value == 'testing'"), CelType::Bool);
        assert_eq!(check_type("has(body.value)"), CelType::Bool);
        assert_eq!(check_type("body.count > 1 && body.count < 10"), CelType::Bool);
    }

    #[test]
    fn macros_check() {
        assert_eq!(check_type("[1, 2, 3].all(x, x > 0)"), CelType::Bool);
        assert_eq!(check_type("[1, 2].exists_one(x, x == 2)"), CelType::Bool);
        assert_eq!(
            check_type("[1, 2].map(x, x * 2)"),
            CelType::list(CelType::Dyn)
        );
        assert_eq!(check_type("body.items.filter(i, i.ok)"), CelType::list(CelType::Dyn));
        assert_eq!(check_type("header.exists(k, k.startsWith('X-'))"), CelType::Bool);
    }

    #[test]
    fn iteration_variable_is_scoped() {
        assert!(matches!(
            first_error("[1].all(x, x > 0) && x > 0"),
            CheckErrorKind::UndeclaredReference { name } if name == "x"
        ));
    }

    #[test]
    fn undeclared_identifier() {
        assert_eq!(
            first_error("headers['X']"),
            CheckErrorKind::UndeclaredReference {
                name: "headers".to_string()
            }
        );
    }

    #[test]
    fn undeclared_function() {
        assert_eq!(
            first_error("body.value.shout()"),
            CheckErrorKind::UndeclaredReference {
                name: "shout".to_string()
            }
        );
    }

    #[test]
    fn no_matching_overload() {
        assert!(matches!(
            first_error("header['X-Test'][0] + 1"),
            CheckErrorKind::NoMatchingOverload { function, .. } if function == "_+_"
        ));
        assert!(matches!(
            first_error("1 ? 2 : 3"),
            CheckErrorKind::NoMatchingOverload { function, .. } if function == "_?_:_"
        ));
    }

    #[test]
    fn field_on_a_string() {
        assert!(matches!(
            first_error("header['X-Test'][0].value"),
            CheckErrorKind::UndefinedField { field, .. } if field == "value"
        ));
    }

    #[test]
    fn mixed_aggregates_widen_to_dyn() {
        assert_eq!(check_type("[1, 'a']"), CelType::list(CelType::Dyn));
        assert_eq!(check_type("[1, body.x]"), CelType::list(CelType::Dyn));
        assert_eq!(
            check_type("{'a': 1, 'b': 'x'}"),
            CelType::map(CelType::String, CelType::Dyn)
        );
        assert_eq!(check_type("body.x in [1, 2.0]"), CelType::Bool);
        assert_eq!(check_type("{'a': 1, 'b': 'x'}.a == 1"), CelType::Bool);
        assert_eq!(check_type("[[1], ['a']]"), CelType::list(CelType::Dyn));
    }

    #[test]
    fn homogeneous_aggregates_on_request() {
        let (variables, functions) = declarations();
        let expr = cel_filter_parser::parse("[1, 'a']").unwrap();
        let mut checker = Checker::new(&variables, &functions).with_homogeneous_aggregates(true);
        checker.check_expr(&expr);
        let errors = checker.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0].kind,
            CheckErrorKind::HeterogeneousAggregate { types } if types == &[CelType::Int, CelType::String]
        ));
    }

    #[test]
    fn reserved_identifier() {
        assert!(matches!(
            first_error("__internal == 1"),
            CheckErrorKind::ReservedIdentifier { .. }
        ));
    }

    #[test]
    fn errors_are_reported_once_and_all_collected() {
        let result = check_source("missing.x + other");
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn non_iterable_range() {
        assert!(matches!(
            first_error("1.all(x, x)"),
            CheckErrorKind::NotIterable { ty } if ty == CelType::Int
        ));
    }
}
