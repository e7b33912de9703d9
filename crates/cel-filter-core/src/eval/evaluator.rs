//! Tree-walking evaluator.
//!
//! Evaluation always produces a [`Value`]; failures are `Value::Error` and
//! flow through the tree like any other value. Logical operators and the
//! conditional absorb an error when the other operand decides the result.

use std::sync::Arc;

use cel_filter_parser::{BinaryOp, Comprehension, Expr, SpannedExpr, UnaryOp};

use super::activation::ScopedActivation;
use super::{Activation, EvalError, FunctionRegistry, MapKey, Value, ValueMap};

pub(crate) struct Evaluator<'a> {
    functions: &'a FunctionRegistry,
}

/// Returns early with the first error among already-evaluated values.
macro_rules! propagate {
    ($($value:expr),+) => {
        $(
            if $value.is_error() {
                return $value;
            }
        )+
    };
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(functions: &'a FunctionRegistry) -> Self {
        Self { functions }
    }

    pub(crate) fn eval(&self, expr: &SpannedExpr, activation: &dyn Activation) -> Value {
        match &expr.node {
            Expr::Null => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(i) => Value::Int(*i),
            Expr::UInt(u) => Value::UInt(*u),
            Expr::Double(d) => Value::Double(*d),
            Expr::String(s) => Value::from(s.as_str()),
            Expr::Ident(name) => activation
                .resolve(name)
                .unwrap_or_else(|| Value::error(EvalError::unknown_identifier(name))),
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.eval(item, activation);
                    propagate!(value);
                    values.push(value);
                }
                Value::from(values)
            }
            Expr::Map(entries) => self.eval_map(entries, activation),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, activation);
                propagate!(value);
                unary(*op, &value)
            }
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => self.logical(false, left, right, activation),
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => self.logical(true, left, right, activation),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, activation);
                propagate!(left);
                let right = self.eval(right, activation);
                propagate!(right);
                binary(*op, &left, &right)
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => match self.eval(cond, activation) {
                Value::Bool(true) => self.eval(then_expr, activation),
                Value::Bool(false) => self.eval(else_expr, activation),
                err @ Value::Error(_) => err,
                other => mismatch("_?_:_", &[&other]),
            },
            Expr::Select {
                operand,
                field,
                test_only,
            } => {
                let operand = self.eval(operand, activation);
                propagate!(operand);
                select(&operand, field, *test_only)
            }
            Expr::Index { operand, index } => {
                let operand = self.eval(operand, activation);
                propagate!(operand);
                let index = self.eval(index, activation);
                propagate!(index);
                self::index(&operand, &index)
            }
            Expr::Call {
                target,
                function,
                args,
            } => {
                let mut values = Vec::with_capacity(args.len() + 1);
                for arg in target.iter().map(|t| t.as_ref()).chain(args) {
                    let value = self.eval(arg, activation);
                    propagate!(value);
                    values.push(value);
                }
                self.functions
                    .dispatch(function, target.is_some(), &values)
            }
            Expr::Comprehension(comp) => self.eval_comprehension(comp, activation),
        }
    }

    fn eval_map(&self, entries: &[(SpannedExpr, SpannedExpr)], activation: &dyn Activation) -> Value {
        let mut map = ValueMap::new();
        for (key_expr, value_expr) in entries {
            let key = self.eval(key_expr, activation);
            propagate!(key);
            let Some(key) = MapKey::from_value(&key) else {
                return Value::error(EvalError::invalid_argument(format!(
                    "unsupported map key type: {}",
                    key.type_name()
                )));
            };
            let value = self.eval(value_expr, activation);
            propagate!(value);
            if map.insert(key.clone(), value).is_some() {
                return Value::error(EvalError::invalid_argument(format!(
                    "repeated key in map literal: {key}"
                )));
            }
        }
        Value::Map(Arc::new(map))
    }

    /// `&&` when `short_circuit` is false, `||` when it is true.
    ///
    /// The right side is evaluated even if the left side is an error, so
    /// `error || true` is `true`.
    fn logical(
        &self,
        short_circuit: bool,
        left: &SpannedExpr,
        right: &SpannedExpr,
        activation: &dyn Activation,
    ) -> Value {
        let op = if short_circuit { "_||_" } else { "_&&_" };
        let left = self.eval(left, activation);
        if left.as_bool() == Some(short_circuit) {
            return left;
        }
        let right = self.eval(right, activation);
        if right.as_bool() == Some(short_circuit) {
            return right;
        }
        match (&left, &right) {
            (Value::Error(_), _) => left,
            (_, Value::Error(_)) => right,
            (Value::Bool(_), Value::Bool(_)) => Value::Bool(!short_circuit),
            _ => mismatch(op, &[&left, &right]),
        }
    }

    fn eval_comprehension(&self, comp: &Comprehension, activation: &dyn Activation) -> Value {
        let range = self.eval(&comp.iter_range, activation);
        let items: Vec<Value> = match &range {
            Value::List(items) => items.to_vec(),
            Value::Map(map) => map.keys().map(MapKey::to_value).collect(),
            Value::Error(_) => return range,
            other => return mismatch("@range", &[other]),
        };

        if let Some(append) = Append::recognize(comp) {
            return self.eval_append(comp, &append, items, activation);
        }

        let mut scope = ScopedActivation::new(activation);
        let init = self.eval(&comp.accu_init, activation);
        scope.set(&comp.accu_var, init);
        for item in items {
            scope.set(&comp.iter_var, item);
            // Only a definite `false` stops the loop; an error keeps going so
            // a later element can still decide the result.
            if let Value::Bool(false) = self.eval(&comp.loop_condition, &scope) {
                break;
            }
            let step = self.eval(&comp.loop_step, &scope);
            scope.set(&comp.accu_var, step);
        }
        scope.unset(&comp.iter_var);
        self.eval(&comp.result, &scope)
    }

    /// Runs a list-building comprehension by pushing onto one owned vector,
    /// with the same results and errors as evaluating the step each time.
    fn eval_append(
        &self,
        comp: &Comprehension,
        append: &Append<'_>,
        items: Vec<Value>,
        activation: &dyn Activation,
    ) -> Value {
        let mut scope = ScopedActivation::new(activation);
        let mut accu: Result<Vec<Value>, Value> = Ok(Vec::new());
        for item in items {
            scope.set(&comp.iter_var, item);
            if let Value::Bool(false) = self.eval(&comp.loop_condition, &scope) {
                break;
            }
            let include = match append.guard {
                Some(guard) => self.eval(guard, &scope),
                None => Value::Bool(true),
            };
            accu = match (accu, include) {
                (Ok(mut values), Value::Bool(true)) => {
                    let value = self.eval(append.item, &scope);
                    if value.is_error() {
                        Err(value)
                    } else {
                        values.push(value);
                        Ok(values)
                    }
                }
                (accu, Value::Bool(false)) | (accu @ Err(_), Value::Bool(true)) => accu,
                (_, err @ Value::Error(_)) => Err(err),
                (_, other) => Err(mismatch("_?_:_", &[&other])),
            };
        }
        scope.unset(&comp.iter_var);
        scope.set(&comp.accu_var, accu.map_or_else(|err| err, Value::from));
        self.eval(&comp.result, &scope)
    }
}

/// Step of the form `accu + [item]` or `guard ? accu + [item] : accu`,
/// folded from an empty list, as produced by `map` and `filter`.
struct Append<'e> {
    guard: Option<&'e SpannedExpr>,
    item: &'e SpannedExpr,
}

impl<'e> Append<'e> {
    fn recognize(comp: &'e Comprehension) -> Option<Self> {
        if !matches!(&comp.accu_init.node, Expr::List(items) if items.is_empty()) {
            return None;
        }
        let accu = comp.accu_var.as_str();
        let (guard, push) = match &comp.loop_step.node {
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } if is_ident(else_expr, accu) => (Some(cond.as_ref()), then_expr.as_ref()),
            _ => (None, &comp.loop_step),
        };
        let Expr::Binary {
            op: BinaryOp::Add,
            left,
            right,
        } = &push.node
        else {
            return None;
        };
        let Expr::List(single) = &right.node else {
            return None;
        };
        let [item] = single.as_slice() else {
            return None;
        };
        // The accumulator is never bound while appending, so nothing else
        // may read it.
        let free = |expr: &SpannedExpr| !mentions(expr, accu);
        let independent = is_ident(left, accu)
            && free(item)
            && free(&comp.loop_condition)
            && guard.map_or(true, |g| free(g));
        independent.then_some(Self { guard, item })
    }
}

fn is_ident(expr: &SpannedExpr, name: &str) -> bool {
    matches!(&expr.node, Expr::Ident(n) if n == name)
}

/// Whether `name` is read as a free variable anywhere in `expr`.
fn mentions(expr: &SpannedExpr, name: &str) -> bool {
    let mut pending = vec![expr];
    while let Some(expr) = pending.pop() {
        match &expr.node {
            Expr::Ident(n) if n == name => return true,
            Expr::Comprehension(c) if c.accu_var == name || c.iter_var == name => {
                pending.extend([&c.iter_range, &c.accu_init]);
                if c.accu_var != name {
                    pending.push(&c.result);
                }
            }
            node => pending.extend(node.children()),
        }
    }
    false
}

fn mismatch(function: &str, args: &[&Value]) -> Value {
    let kinds: Vec<&str> = args.iter().map(|v| v.type_name()).collect();
    Value::error(EvalError::no_matching_overload(function, &kinds))
}

fn overflow(operation: &str) -> Value {
    Value::error(EvalError::overflow(operation))
}

fn checked<T>(result: Option<T>, operation: &str) -> Value
where
    T: Into<Value>,
{
    result.map_or_else(|| overflow(operation), Into::into)
}

fn unary(op: UnaryOp, value: &Value) -> Value {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        (UnaryOp::Neg, Value::Int(i)) => checked(i.checked_neg(), "negation"),
        (UnaryOp::Neg, Value::Double(d)) => Value::Double(-d),
        _ => mismatch(op.function_name(), &[value]),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    use super::Value::{Double, Int, UInt};

    match (op, left, right) {
        (BinaryOp::Eq, l, r) => Value::Bool(l == r),
        (BinaryOp::Ne, l, r) => Value::Bool(l != r),

        (BinaryOp::Add, Int(a), Int(b)) => checked(a.checked_add(*b), "addition"),
        (BinaryOp::Add, UInt(a), UInt(b)) => checked(a.checked_add(*b), "addition"),
        (BinaryOp::Add, Double(a), Double(b)) => Double(a + b),
        (BinaryOp::Add, Value::String(a), Value::String(b)) => Value::from(format!("{a}{b}")),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Value::List(a.iter().chain(b.iter()).cloned().collect())
        }

        (BinaryOp::Sub, Int(a), Int(b)) => checked(a.checked_sub(*b), "subtraction"),
        (BinaryOp::Sub, UInt(a), UInt(b)) => checked(a.checked_sub(*b), "subtraction"),
        (BinaryOp::Sub, Double(a), Double(b)) => Double(a - b),

        (BinaryOp::Mul, Int(a), Int(b)) => checked(a.checked_mul(*b), "multiplication"),
        (BinaryOp::Mul, UInt(a), UInt(b)) => checked(a.checked_mul(*b), "multiplication"),
        (BinaryOp::Mul, Double(a), Double(b)) => Double(a * b),

        (BinaryOp::Div, Int(_) | UInt(_), Int(0) | UInt(0)) => {
            Value::error(EvalError::division_by_zero())
        }
        (BinaryOp::Div, Int(a), Int(b)) => checked(a.checked_div(*b), "division"),
        (BinaryOp::Div, UInt(a), UInt(b)) => checked(a.checked_div(*b), "division"),
        (BinaryOp::Div, Double(a), Double(b)) => Double(a / b),

        (BinaryOp::Mod, Int(_) | UInt(_), Int(0) | UInt(0)) => {
            Value::error(EvalError::modulo_by_zero())
        }
        (BinaryOp::Mod, Int(a), Int(b)) => checked(a.checked_rem(*b), "modulus"),
        (BinaryOp::Mod, UInt(a), UInt(b)) => checked(a.checked_rem(*b), "modulus"),

        (BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge, l, r) => compare(op, l, r),

        (BinaryOp::In, needle, Value::List(items)) => {
            Value::Bool(items.iter().any(|item| item == needle))
        }
        (BinaryOp::In, key, Value::Map(map)) => Value::Bool(map.lookup(key).is_some()),

        _ => mismatch(op.function_name(), &[left, right]),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Value {
    use std::cmp::Ordering::{Equal, Greater, Less};

    let Some(ordering) = left.compare(right) else {
        let numeric = |v: &Value| matches!(v, Value::Int(_) | Value::UInt(_) | Value::Double(_));
        // NaN is unordered against every number.
        if numeric(left) && numeric(right) {
            return Value::Bool(false);
        }
        return mismatch(op.function_name(), &[left, right]);
    };
    Value::Bool(match op {
        BinaryOp::Lt => ordering == Less,
        BinaryOp::Le => ordering != Greater,
        BinaryOp::Gt => ordering == Greater,
        BinaryOp::Ge => ordering != Less,
        _ => ordering == Equal,
    })
}

fn select(operand: &Value, field: &str, test_only: bool) -> Value {
    match (operand, test_only) {
        (Value::Map(map), true) => Value::Bool(map.get(&MapKey::from(field)).is_some()),
        (Value::Map(map), false) => map
            .get(&MapKey::from(field))
            .cloned()
            .unwrap_or_else(|| Value::error(EvalError::key_not_found(field))),
        (other, _) => Value::error(EvalError::invalid_argument(format!(
            "type '{}' does not support field selection",
            other.type_name()
        ))),
    }
}

fn index(operand: &Value, index: &Value) -> Value {
    match (operand, index) {
        (Value::List(items), Value::Int(_) | Value::UInt(_) | Value::Double(_)) => {
            let position = match index {
                Value::Int(i) => usize::try_from(*i).ok(),
                Value::UInt(u) => usize::try_from(*u).ok(),
                Value::Double(d) if d.fract() == 0.0 && *d >= 0.0 => Some(*d as usize),
                _ => None,
            };
            position
                .and_then(|p| items.get(p))
                .cloned()
                .unwrap_or_else(|| Value::error(EvalError::index_out_of_bounds(index, items.len())))
        }
        (Value::Map(map), key) => map.lookup(key).cloned().unwrap_or_else(|| {
            let shown = MapKey::from_value(key).map_or_else(|| key.to_string(), |k| k.to_string());
            Value::error(EvalError::key_not_found(shown))
        }),
        _ => mismatch("_[_]", &[operand, index]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalErrorKind, MapActivation};
    use crate::stdlib::STANDARD_LIBRARY;

    fn eval_in(source: &str, activation: &MapActivation) -> Value {
        let expr = cel_filter_parser::parse(source).unwrap();
        let functions: FunctionRegistry = STANDARD_LIBRARY.iter().cloned().collect();
        Evaluator::new(&functions).eval(&expr, activation)
    }

    fn eval(source: &str) -> Value {
        eval_in(source, &MapActivation::new())
    }

    fn error_kind(source: &str) -> EvalErrorKind {
        match eval(source) {
            Value::Error(err) => err.kind,
            other => panic!("{source} evaluated to {other}"),
        }
    }

    fn headers() -> MapActivation {
        MapActivation::new().with(
            "header",
            Value::map([(
                MapKey::from("X-Test"),
                Value::from(vec![Value::from("test-value")]),
            )]),
        )
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
        assert_eq!(eval("7 / 2"), Value::Int(3));
        assert_eq!(eval("-7 % 3"), Value::Int(-1));
        assert_eq!(eval("2u + 3u"), Value::UInt(5));
        assert_eq!(eval("1.5 * 2.0"), Value::Double(3.0));
        assert_eq!(eval("'ab' + 'cd'"), Value::from("abcd"));
        assert_eq!(
            eval("[1] + [2]"),
            Value::from(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn arithmetic_errors() {
        assert_eq!(error_kind("1 / 0"), EvalErrorKind::DivisionByZero);
        assert_eq!(error_kind("1 % 0"), EvalErrorKind::ModuloByZero);
        assert_eq!(error_kind("9223372036854775807 + 1"), EvalErrorKind::Overflow);
        assert_eq!(error_kind("0u - 1u"), EvalErrorKind::Overflow);
        assert_eq!(error_kind("1 + 1u"), EvalErrorKind::NoMatchingOverload);
    }

    #[test]
    fn logical_operators_absorb_errors() {
        assert_eq!(eval("false && 1 / 0 == 1"), Value::Bool(false));
        assert_eq!(eval("1 / 0 == 1 && false"), Value::Bool(false));
        assert_eq!(eval("1 / 0 == 1 || true"), Value::Bool(true));
        assert_eq!(error_kind("1 / 0 == 1 || false"), EvalErrorKind::DivisionByZero);
        assert_eq!(error_kind("true && 'x'"), EvalErrorKind::NoMatchingOverload);
    }

    #[test]
    fn conditional_evaluates_one_branch() {
        assert_eq!(eval("true ? 1 : 1 / 0"), Value::Int(1));
        assert_eq!(error_kind("'x' ? 1 : 2"), EvalErrorKind::NoMatchingOverload);
    }

    #[test]
    fn comparisons_cross_numeric_kinds() {
        assert_eq!(eval("1 == 1.0"), Value::Bool(true));
        assert_eq!(eval("2u > 1"), Value::Bool(true));
        assert_eq!(eval("'a' < 'b'"), Value::Bool(true));
        assert_eq!(eval("1 == 'a'"), Value::Bool(false));
        assert_eq!(error_kind("1 < 'a'"), EvalErrorKind::NoMatchingOverload);
    }

    #[test]
    fn header_lookup() {
        let activation = headers();
        assert_eq!(
            eval_in("header['X-Test'][0]", &activation),
            Value::from("test-value")
        );
        assert_eq!(eval_in("'X-Test' in header", &activation), Value::Bool(true));
        assert_eq!(eval_in("has(header.missing)", &activation), Value::Bool(false));

        let missing = eval_in("header['X-Other']", &activation);
        let err = missing.as_error().unwrap();
        assert_eq!(err.kind, EvalErrorKind::KeyNotFound);
        assert_eq!(err.message, "no such key: X-Other");

        let out_of_range = eval_in("header['X-Test'][1]", &activation);
        assert_eq!(out_of_range.as_error().unwrap().kind, EvalErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn unknown_identifier() {
        assert_eq!(error_kind("nope"), EvalErrorKind::UnknownIdentifier);
    }

    #[test]
    fn map_literals() {
        assert_eq!(eval("{'a': 1}.a"), Value::Int(1));
        assert_eq!(eval("{1: 'x'}[1u]"), Value::from("x"));
        assert_eq!(error_kind("{'a': 1, 'a': 2}"), EvalErrorKind::InvalidArgument);
        assert_eq!(error_kind("{[1]: 2}"), EvalErrorKind::InvalidArgument);
    }

    #[test]
    fn comprehensions() {
        assert_eq!(eval("[1, 2, 3].all(x, x > 0)"), Value::Bool(true));
        assert_eq!(eval("[1, 2, 3].exists(x, x == 2)"), Value::Bool(true));
        assert_eq!(eval("[1, 2, 2].exists_one(x, x == 2)"), Value::Bool(false));
        assert_eq!(
            eval("[1, 2, 3].map(x, x * 10)"),
            Value::from(vec![Value::Int(10), Value::Int(20), Value::Int(30)])
        );
        assert_eq!(
            eval("[1, 2, 3].map(x, x > 1, x)"),
            Value::from(vec![Value::Int(2), Value::Int(3)])
        );
        assert_eq!(
            eval("[1, 2, 3].filter(x, x != 2)"),
            Value::from(vec![Value::Int(1), Value::Int(3)])
        );
        assert_eq!(eval("{'a': 1, 'b': 2}.exists(k, k == 'b')"), Value::Bool(true));
    }

    #[test]
    fn comprehension_errors_are_absorbed_when_decided() {
        assert_eq!(eval("[0, 1].exists(x, 1 / x == 1)"), Value::Bool(true));
        assert_eq!(error_kind("[0, 1].all(x, 1 / x == 1)"), EvalErrorKind::DivisionByZero);
        assert_eq!(error_kind("1.all(x, true)"), EvalErrorKind::NoMatchingOverload);
    }

    /// Evaluates `source` with its outermost comprehension forced through the
    /// general fold, by replacing `[]` as the initial accumulator with `[] + []`.
    fn eval_folded(source: &str) -> Value {
        let mut expr = cel_filter_parser::parse(source).unwrap();
        let Expr::Comprehension(comp) = &mut expr.node else {
            panic!("{source} is not a comprehension");
        };
        let init = comp.accu_init.clone();
        comp.accu_init.node = Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(init.clone()),
            right: Box::new(init),
        };
        assert!(Append::recognize(comp).is_none());
        let functions: FunctionRegistry = STANDARD_LIBRARY.iter().cloned().collect();
        Evaluator::new(&functions).eval(&expr, &MapActivation::new())
    }

    #[test]
    fn appending_matches_the_general_fold() {
        for source in [
            "[1, 2, 3].map(x, x * 2)",
            "[1, 2, 3].filter(x, x != 2)",
            "[1, 2, 3].map(x, x > 1, x + 1)",
            "[0, 1, 2].map(x, 1 / x)",
            "[0, 1, 2].filter(x, 1 / x > 0)",
            "[1, 0, 2].map(x, 2 / x > 0, x)",
            "[1, 0, 'a'].filter(x, x > 0)",
            "[1, 2].map(x, x, x)",
            "[[1], [2, 3]].map(l, l.map(y, y + 1))",
            "{'a': 1, 'b': 2}.map(k, k + '!')",
            "[].map(x, x)",
        ] {
            let expected = eval_folded(source);
            let actual = eval(source);
            match (expected.as_error(), actual.as_error()) {
                (Some(want), Some(got)) => assert_eq!(want, got, "{source}"),
                _ => assert_eq!(expected, actual, "{source}"),
            }
        }
    }

    #[test]
    fn append_needs_an_unread_accumulator() {
        let expr = cel_filter_parser::parse("[1, 2].map(x, [x].map(y, y))").unwrap();
        let Expr::Comprehension(outer) = &expr.node else {
            panic!("expected comprehension");
        };
        assert!(Append::recognize(outer).is_some());

        let mut reads_accu = (**outer).clone();
        reads_accu.loop_condition.node = Expr::Ident(reads_accu.accu_var.clone());
        assert!(Append::recognize(&reads_accu).is_none());

        let expr = cel_filter_parser::parse("[1, 2].all(x, x > 0)").unwrap();
        let Expr::Comprehension(all) = &expr.node else {
            panic!("expected comprehension");
        };
        assert!(Append::recognize(all).is_none());
    }

    #[test]
    fn large_lists_map_in_linear_time() {
        let items: Vec<Value> = (0..100_000i64).map(Value::Int).collect();
        let activation = MapActivation::new().with("items", items);
        let start = std::time::Instant::now();
        assert_eq!(
            eval_in("size(items.map(x, x * 2)) == 100000", &activation),
            Value::Bool(true)
        );
        assert_eq!(
            eval_in("size(items.filter(x, x % 2 == 0)) == 50000", &activation),
            Value::Bool(true)
        );
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn calls_propagate_argument_errors() {
        assert_eq!(error_kind("size(1 / 0)"), EvalErrorKind::DivisionByZero);
        assert_eq!(eval("'hello'.startsWith('he')"), Value::Bool(true));
        assert_eq!(eval("size([1, 2])"), Value::Int(2));
    }
}
