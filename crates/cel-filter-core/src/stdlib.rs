//! Standard library: operator signatures plus the built-in functions.
//!
//! Operator overloads carry no implementation; the evaluator computes them
//! directly. Every other overload is self-contained and pure.

use std::sync::LazyLock;

use crate::decls::{FunctionDecl, OverloadDecl};
use crate::eval::{EvalError, Value};
use crate::types::CelType;

/// Operators and built-in functions every [`Env::with_standard_library`](crate::Env::with_standard_library)
/// starts from.
pub static STANDARD_LIBRARY: LazyLock<Vec<FunctionDecl>> = LazyLock::new(build);

/// Regex programs larger than this are rejected rather than compiled.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

fn build() -> Vec<FunctionDecl> {
    let mut lib = operators();
    lib.extend(sizes());
    lib.extend(strings());
    lib.extend(conversions());
    lib
}

fn a() -> CelType {
    CelType::param("A")
}

fn list_a() -> CelType {
    CelType::list(a())
}

fn map_kv() -> CelType {
    CelType::map(CelType::param("K"), CelType::param("V"))
}

/// One overload per listed type, each `(t, t) -> result`.
fn homogeneous(name: &str, prefix: &str, types: &[CelType], result: Option<CelType>) -> FunctionDecl {
    types.iter().fold(FunctionDecl::new(name), |decl, t| {
        decl.with_overload(OverloadDecl::function(
            format!("{prefix}_{t}"),
            vec![t.clone(), t.clone()],
            result.clone().unwrap_or_else(|| t.clone()),
        ))
    })
}

fn operators() -> Vec<FunctionDecl> {
    let numeric = [CelType::Int, CelType::UInt, CelType::Double];
    let ordered = [
        CelType::Bool,
        CelType::Int,
        CelType::UInt,
        CelType::Double,
        CelType::String,
    ];

    let add = homogeneous(
        "_+_",
        "add",
        &[CelType::Int, CelType::UInt, CelType::Double, CelType::String],
        None,
    )
    .with_overload(
        OverloadDecl::function("add_list", vec![list_a(), list_a()], list_a()).with_type_params(&["A"]),
    );

    let mut ops = vec![
        add,
        homogeneous("_-_", "subtract", &numeric, None),
        homogeneous("_*_", "multiply", &numeric, None),
        homogeneous("_/_", "divide", &numeric, None),
        homogeneous("_%_", "modulo", &[CelType::Int, CelType::UInt], None),
        FunctionDecl::new("-_")
            .with_overload(OverloadDecl::function("negate_int", vec![CelType::Int], CelType::Int))
            .with_overload(OverloadDecl::function("negate_double", vec![CelType::Double], CelType::Double)),
        FunctionDecl::new("!_")
            .with_overload(OverloadDecl::function("logical_not", vec![CelType::Bool], CelType::Bool)),
        homogeneous("_&&_", "logical_and", &[CelType::Bool], None),
        homogeneous("_||_", "logical_or", &[CelType::Bool], None),
        FunctionDecl::new("_==_").with_overload(
            OverloadDecl::function("equals", vec![a(), a()], CelType::Bool).with_type_params(&["A"]),
        ),
        FunctionDecl::new("_!=_").with_overload(
            OverloadDecl::function("not_equals", vec![a(), a()], CelType::Bool).with_type_params(&["A"]),
        ),
        FunctionDecl::new("@in")
            .with_overload(
                OverloadDecl::function("in_list", vec![a(), list_a()], CelType::Bool).with_type_params(&["A"]),
            )
            .with_overload(
                OverloadDecl::function("in_map", vec![CelType::param("K"), map_kv()], CelType::Bool)
                    .with_type_params(&["K", "V"]),
            ),
        FunctionDecl::new("_[_]")
            .with_overload(
                OverloadDecl::function("index_list", vec![list_a(), CelType::Int], a()).with_type_params(&["A"]),
            )
            .with_overload(
                OverloadDecl::function("index_map", vec![map_kv(), CelType::param("K")], CelType::param("V"))
                    .with_type_params(&["K", "V"]),
            ),
    ];

    for (name, prefix) in [
        ("_<_", "less"),
        ("_<=_", "less_equals"),
        ("_>_", "greater"),
        ("_>=_", "greater_equals"),
    ] {
        let mut decl = homogeneous(name, prefix, &ordered, Some(CelType::Bool));
        for lhs in &numeric {
            for rhs in numeric.iter().filter(|rhs| *rhs != lhs) {
                decl = decl.with_overload(OverloadDecl::function(
                    format!("{prefix}_{lhs}_{rhs}"),
                    vec![lhs.clone(), rhs.clone()],
                    CelType::Bool,
                ));
            }
        }
        ops.push(decl);
    }
    ops
}

fn size_of(args: &[Value]) -> Value {
    let len = match args {
        [Value::String(s)] => s.chars().count(),
        [Value::List(items)] => items.len(),
        [Value::Map(map)] => map.len(),
        _ => return mismatch("size", args),
    };
    i64::try_from(len).map_or_else(|_| Value::error(EvalError::overflow("size")), Value::Int)
}

fn sizes() -> Vec<FunctionDecl> {
    let mut size = FunctionDecl::new("size");
    for (suffix, ty, type_params) in [
        ("string", CelType::String, &[][..]),
        ("list", list_a(), &["A"][..]),
        ("map", map_kv(), &["K", "V"][..]),
    ] {
        size = size
            .with_overload(
                OverloadDecl::function(format!("size_{suffix}"), vec![ty.clone()], CelType::Int)
                    .with_type_params(type_params)
                    .with_impl(size_of),
            )
            .with_overload(
                OverloadDecl::method(format!("{suffix}_size"), vec![ty], CelType::Int)
                    .with_type_params(type_params)
                    .with_impl(size_of),
            );
    }
    vec![size]
}

fn mismatch(function: &str, args: &[Value]) -> Value {
    let kinds: Vec<&str> = args.iter().map(Value::type_name).collect();
    Value::error(EvalError::no_matching_overload(function, &kinds))
}

/// `string.name(string) -> bool`
fn string_test(name: &'static str, id: &str, test: fn(&str, &str) -> bool) -> FunctionDecl {
    FunctionDecl::new(name).with_overload(
        OverloadDecl::method(id, vec![CelType::String, CelType::String], CelType::Bool).with_impl(
            move |args| match args {
                [Value::String(s), Value::String(arg)] => Value::Bool(test(s, arg)),
                _ => mismatch(name, args),
            },
        ),
    )
}

/// `string.name() -> string`
fn string_map(name: &'static str, id: &str, map: fn(&str) -> String) -> FunctionDecl {
    FunctionDecl::new(name).with_overload(
        OverloadDecl::method(id, vec![CelType::String], CelType::String).with_impl(move |args| {
            match args {
                [Value::String(s)] => Value::from(map(s)),
                _ => mismatch(name, args),
            }
        }),
    )
}

fn regex_matches(args: &[Value]) -> Value {
    let [Value::String(text), Value::String(pattern)] = args else {
        return mismatch("matches", args);
    };
    match regex::RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
    {
        Ok(re) => Value::Bool(re.is_match(text)),
        Err(err) => Value::error(EvalError::invalid_argument(format!(
            "invalid regular expression '{pattern}': {err}"
        ))),
    }
}

fn strings() -> Vec<FunctionDecl> {
    let pair = vec![CelType::String, CelType::String];
    vec![
        string_test("contains", "contains_string", |s, sub| s.contains(sub)),
        string_test("startsWith", "starts_with_string", |s, prefix| s.starts_with(prefix)),
        string_test("endsWith", "ends_with_string", |s, suffix| s.ends_with(suffix)),
        string_map("lowerAscii", "string_lower_ascii", str::to_ascii_lowercase),
        string_map("upperAscii", "string_upper_ascii", str::to_ascii_uppercase),
        FunctionDecl::new("matches")
            .with_overload(
                OverloadDecl::function("matches", pair.clone(), CelType::Bool).with_impl(regex_matches),
            )
            .with_overload(
                OverloadDecl::method("matches_string", pair, CelType::Bool).with_impl(regex_matches),
            ),
    ]
}

/// Exclusive upper bound of doubles that convert to `int` / `uint`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn to_int(args: &[Value]) -> Value {
    let converted = match args {
        [Value::Int(i)] => Some(*i),
        [Value::UInt(u)] => i64::try_from(*u).ok(),
        [Value::Double(d)] if d.is_finite() && *d >= -TWO_POW_63 && *d < TWO_POW_63 => {
            Some(d.trunc() as i64)
        }
        [Value::Double(_)] => None,
        [Value::String(s)] => {
            return s.parse().map_or_else(
                |_| Value::error(EvalError::invalid_conversion("string", "int")),
                Value::Int,
            )
        }
        _ => return mismatch("int", args),
    };
    converted.map_or_else(|| Value::error(EvalError::overflow("int conversion")), Value::Int)
}

fn to_uint(args: &[Value]) -> Value {
    let converted = match args {
        [Value::UInt(u)] => Some(*u),
        [Value::Int(i)] => u64::try_from(*i).ok(),
        [Value::Double(d)] if d.is_finite() && *d > -1.0 && *d < TWO_POW_64 => Some(d.trunc() as u64),
        [Value::Double(_)] => None,
        [Value::String(s)] => {
            return s.parse().map_or_else(
                |_| Value::error(EvalError::invalid_conversion("string", "uint")),
                Value::UInt,
            )
        }
        _ => return mismatch("uint", args),
    };
    converted.map_or_else(|| Value::error(EvalError::overflow("uint conversion")), Value::UInt)
}

fn to_double(args: &[Value]) -> Value {
    match args {
        [Value::Double(d)] => Value::Double(*d),
        [Value::Int(i)] => Value::Double(*i as f64),
        [Value::UInt(u)] => Value::Double(*u as f64),
        [Value::String(s)] => s.parse().map_or_else(
            |_| Value::error(EvalError::invalid_conversion("string", "double")),
            Value::Double,
        ),
        _ => mismatch("double", args),
    }
}

fn to_string(args: &[Value]) -> Value {
    match args {
        [Value::String(s)] => Value::String(s.clone()),
        [Value::Bool(b)] => Value::from(b.to_string()),
        [Value::Int(i)] => Value::from(i.to_string()),
        [Value::UInt(u)] => Value::from(u.to_string()),
        [Value::Double(d)] => Value::from(d.to_string()),
        _ => mismatch("string", args),
    }
}

fn to_bool(args: &[Value]) -> Value {
    match args {
        [Value::Bool(b)] => Value::Bool(*b),
        [Value::String(s)] => match s.as_ref() {
            "true" | "TRUE" | "True" | "t" | "1" => Value::Bool(true),
            "false" | "FALSE" | "False" | "f" | "0" => Value::Bool(false),
            _ => Value::error(EvalError::invalid_conversion("string", "bool")),
        },
        _ => mismatch("bool", args),
    }
}

fn conversions() -> Vec<FunctionDecl> {
    let conversion = |name: &str, result: CelType, from: &[CelType], f: fn(&[Value]) -> Value| {
        from.iter().fold(FunctionDecl::new(name), |decl, source| {
            decl.with_overload(
                OverloadDecl::function(format!("{source}_to_{name}"), vec![source.clone()], result.clone())
                    .with_impl(f),
            )
        })
    };
    let numbers_and_string = [CelType::Int, CelType::UInt, CelType::Double, CelType::String];

    vec![
        conversion("int", CelType::Int, &numbers_and_string, to_int),
        conversion("uint", CelType::UInt, &numbers_and_string, to_uint),
        conversion("double", CelType::Double, &numbers_and_string, to_double),
        conversion(
            "string",
            CelType::String,
            &[CelType::Bool, CelType::Int, CelType::UInt, CelType::Double, CelType::String],
            to_string,
        ),
        conversion("bool", CelType::Bool, &[CelType::Bool, CelType::String], to_bool),
        FunctionDecl::new("dyn").with_overload(
            OverloadDecl::function("to_dyn", vec![a()], CelType::Dyn)
                .with_type_params(&["A"])
                .with_impl(|args| match args {
                    [value] => value.clone(),
                    _ => mismatch("dyn", args),
                }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalErrorKind, FunctionRegistry};

    fn call(name: &str, is_member: bool, args: &[Value]) -> Value {
        let registry: FunctionRegistry = STANDARD_LIBRARY.iter().cloned().collect();
        registry.dispatch(name, is_member, args)
    }

    #[test]
    fn size_counts_code_points() {
        assert_eq!(call("size", false, &[Value::from("héllo")]), Value::Int(5));
        assert_eq!(call("size", true, &[Value::from(vec![Value::Null])]), Value::Int(1));
    }

    #[test]
    fn string_predicates() {
        let s = Value::from("refs/heads/main");
        assert_eq!(call("startsWith", true, &[s.clone(), Value::from("refs/")]), Value::Bool(true));
        assert_eq!(call("endsWith", true, &[s.clone(), Value::from("dev")]), Value::Bool(false));
        assert_eq!(call("contains", true, &[s, Value::from("heads")]), Value::Bool(true));
        assert_eq!(call("lowerAscii", true, &[Value::from("X-Test")]), Value::from("x-test"));
    }

    #[test]
    fn matches_uses_regex() {
        assert_eq!(
            call("matches", true, &[Value::from("v1.2.3"), Value::from(r"^v\d+\.\d+\.\d+$")]),
            Value::Bool(true)
        );
        let bad = call("matches", false, &[Value::from("x"), Value::from("(")]);
        assert_eq!(bad.as_error().unwrap().kind, EvalErrorKind::InvalidArgument);
    }

    #[test]
    fn conversions_check_range() {
        assert_eq!(call("int", false, &[Value::from("42")]), Value::Int(42));
        assert_eq!(call("int", false, &[Value::Double(-3.9)]), Value::Int(-3));
        assert_eq!(
            call("int", false, &[Value::UInt(u64::MAX)]).as_error().unwrap().kind,
            EvalErrorKind::Overflow
        );
        assert_eq!(
            call("uint", false, &[Value::Int(-1)]).as_error().unwrap().kind,
            EvalErrorKind::Overflow
        );
        assert_eq!(call("double", false, &[Value::Int(2)]), Value::Double(2.0));
        assert_eq!(call("string", false, &[Value::UInt(3)]), Value::from("3"));
        assert_eq!(call("bool", false, &[Value::from("true")]), Value::Bool(true));
        assert_eq!(
            call("int", false, &[Value::from("x")]).as_error().unwrap().kind,
            EvalErrorKind::InvalidConversion
        );
    }

    #[test]
    fn operators_have_no_runtime_body() {
        let registry: FunctionRegistry = STANDARD_LIBRARY.iter().cloned().collect();
        let add = registry.get("_+_").unwrap();
        assert!(add.overloads.iter().all(|o| o.implementation.is_none()));
        assert!(add.overloads.iter().any(|o| o.id == "add_list"));
    }
}
