//! Parse-time macros.
//!
//! A macro is a call shape (`has(a.b)`, `list.all(x, p)`, ...) that the parser
//! rewrites into a different node instead of emitting a `Call`. The iteration
//! macros all lower to a single [`Comprehension`], so the evaluator only needs
//! one bounded looping construct.

use std::collections::HashMap;

use crate::ast::{BinaryOp, Comprehension, Expr, Span, Spanned, SpannedExpr, UnaryOp};

/// Accumulator name used by every lowered comprehension. Not a valid
/// identifier in source text, so it cannot collide with user variables.
pub const ACCUMULATOR: &str = "@result";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroStyle {
    /// `name(args...)`
    Global,
    /// `receiver.name(args...)`
    Receiver,
}

/// Hands out node ids while a macro builds synthetic nodes.
pub struct MacroContext<'a> {
    next_id: &'a mut i64,
}

impl<'a> MacroContext<'a> {
    /// Shares the parser's id counter so expanded nodes get unique ids.
    pub fn new(next_id: &'a mut i64) -> Self {
        Self { next_id }
    }

    /// Allocates the next node id.
    pub fn next_id(&mut self) -> i64 {
        let id = *self.next_id;
        *self.next_id += 1;
        id
    }

    fn node(&mut self, node: Expr, span: &Span) -> SpannedExpr {
        Spanned::new(self.next_id(), node, span.clone())
    }

    fn accumulator(&mut self, span: &Span) -> SpannedExpr {
        self.node(Expr::Ident(ACCUMULATOR.to_string()), span)
    }
}

/// Expansion function; `Err` carries a message reported at the call span.
pub type MacroExpander = fn(
    ctx: &mut MacroContext,
    span: Span,
    receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<SpannedExpr, String>;

#[derive(Clone)]
pub struct Macro {
    pub name: &'static str,
    pub style: MacroStyle,
    pub arg_count: usize,
    pub expander: MacroExpander,
}

impl Macro {
    pub const fn new(
        name: &'static str,
        style: MacroStyle,
        arg_count: usize,
        expander: MacroExpander,
    ) -> Self {
        Self {
            name,
            style,
            arg_count,
            expander,
        }
    }
}

impl std::fmt::Debug for Macro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Macro")
            .field("name", &self.name)
            .field("style", &self.style)
            .field("arg_count", &self.arg_count)
            .finish_non_exhaustive()
    }
}

/// Macros keyed by name, argument count and call style.
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    macros: HashMap<(String, usize, MacroStyle), Macro>,
}

impl MacroRegistry {
    /// A registry with no macros; calls parse as plain calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `has`, `all`, `exists`, `exists_one`, `map` and `filter`.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for m in STANDARD_MACROS {
            registry.register(m.clone());
        }
        registry
    }

    /// Adds `m`, replacing a macro with the same name, arity and style.
    pub fn register(&mut self, m: Macro) {
        self.macros.insert((m.name.to_string(), m.arg_count, m.style), m);
    }

    /// The macro for a call shape, if any.
    pub fn lookup(&self, name: &str, arg_count: usize, style: MacroStyle) -> Option<&Macro> {
        self.macros.get(&(name.to_string(), arg_count, style))
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

/// Macros enabled by [`MacroRegistry::standard`].
pub static STANDARD_MACROS: &[Macro] = &[
    Macro::new("has", MacroStyle::Global, 1, expand_has),
    Macro::new("all", MacroStyle::Receiver, 2, expand_all),
    Macro::new("exists", MacroStyle::Receiver, 2, expand_exists),
    Macro::new("exists_one", MacroStyle::Receiver, 2, expand_exists_one),
    Macro::new("map", MacroStyle::Receiver, 2, expand_map),
    Macro::new("map", MacroStyle::Receiver, 3, expand_filter_map),
    Macro::new("filter", MacroStyle::Receiver, 2, expand_filter),
];

/// `has(a.f)` becomes a presence test on `a`.
fn expand_has(
    ctx: &mut MacroContext,
    span: Span,
    _receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<SpannedExpr, String> {
    match args.into_iter().next().map(|arg| arg.node) {
        Some(Expr::Select {
            operand,
            field,
            test_only: false,
        }) => Ok(ctx.node(
            Expr::Select {
                operand,
                field,
                test_only: true,
            },
            &span,
        )),
        _ => Err("invalid argument to has() macro".to_string()),
    }
}

/// Pulls the receiver and iteration variable out of a receiver-style call.
fn split_iteration(
    name: &str,
    receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<(SpannedExpr, String, Vec<SpannedExpr>), String> {
    let range = receiver.ok_or_else(|| format!("{name}() requires a receiver"))?;
    let mut args = args.into_iter();
    let iter_var = match args.next().map(|arg| arg.node) {
        Some(Expr::Ident(var)) => var,
        _ => return Err(format!("{name}() iteration variable must be a simple name")),
    };
    Ok((range, iter_var, args.collect()))
}

fn comprehension(
    ctx: &mut MacroContext,
    span: Span,
    iter_var: String,
    iter_range: SpannedExpr,
    accu_init: SpannedExpr,
    loop_condition: SpannedExpr,
    loop_step: SpannedExpr,
) -> SpannedExpr {
    let result = ctx.accumulator(&span);
    comprehension_with_result(
        ctx,
        span,
        iter_var,
        iter_range,
        accu_init,
        loop_condition,
        loop_step,
        result,
    )
}

#[allow(clippy::too_many_arguments)]
fn comprehension_with_result(
    ctx: &mut MacroContext,
    span: Span,
    iter_var: String,
    iter_range: SpannedExpr,
    accu_init: SpannedExpr,
    loop_condition: SpannedExpr,
    loop_step: SpannedExpr,
    result: SpannedExpr,
) -> SpannedExpr {
    ctx.node(
        Expr::Comprehension(Box::new(Comprehension {
            iter_var,
            iter_range,
            accu_var: ACCUMULATOR.to_string(),
            accu_init,
            loop_condition,
            loop_step,
            result,
        })),
        &span,
    )
}

fn binary(ctx: &mut MacroContext, op: BinaryOp, left: SpannedExpr, right: SpannedExpr, span: &Span) -> SpannedExpr {
    ctx.node(
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn ternary(
    ctx: &mut MacroContext,
    cond: SpannedExpr,
    then_expr: SpannedExpr,
    else_expr: SpannedExpr,
    span: &Span,
) -> SpannedExpr {
    ctx.node(
        Expr::Ternary {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        },
        span,
    )
}

/// `accu + [item]`
fn append(ctx: &mut MacroContext, item: SpannedExpr, span: &Span) -> SpannedExpr {
    let accu = ctx.accumulator(span);
    let single = ctx.node(Expr::List(vec![item]), span);
    binary(ctx, BinaryOp::Add, accu, single, span)
}

/// `range.all(x, p)`: stops at the first `false`.
fn expand_all(
    ctx: &mut MacroContext,
    span: Span,
    receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<SpannedExpr, String> {
    let (range, var, mut rest) = split_iteration("all", receiver, args)?;
    let predicate = rest.remove(0);

    let init = ctx.node(Expr::Bool(true), &span);
    let condition = ctx.accumulator(&span);
    let accu = ctx.accumulator(&span);
    let step = binary(ctx, BinaryOp::And, accu, predicate, &span);
    Ok(comprehension(ctx, span, var, range, init, condition, step))
}

/// `range.exists(x, p)`: stops at the first `true`.
fn expand_exists(
    ctx: &mut MacroContext,
    span: Span,
    receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<SpannedExpr, String> {
    let (range, var, mut rest) = split_iteration("exists", receiver, args)?;
    let predicate = rest.remove(0);

    let init = ctx.node(Expr::Bool(false), &span);
    let accu = ctx.accumulator(&span);
    let condition = ctx.node(
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(accu),
        },
        &span,
    );
    let accu = ctx.accumulator(&span);
    let step = binary(ctx, BinaryOp::Or, accu, predicate, &span);
    Ok(comprehension(ctx, span, var, range, init, condition, step))
}

/// `range.exists_one(x, p)`: counts matches, true when exactly one.
fn expand_exists_one(
    ctx: &mut MacroContext,
    span: Span,
    receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<SpannedExpr, String> {
    let (range, var, mut rest) = split_iteration("exists_one", receiver, args)?;
    let predicate = rest.remove(0);

    let init = ctx.node(Expr::Int(0), &span);
    let condition = ctx.node(Expr::Bool(true), &span);
    let accu = ctx.accumulator(&span);
    let one = ctx.node(Expr::Int(1), &span);
    let bumped = binary(ctx, BinaryOp::Add, accu, one, &span);
    let unchanged = ctx.accumulator(&span);
    let step = ternary(ctx, predicate, bumped, unchanged, &span);

    let accu = ctx.accumulator(&span);
    let one = ctx.node(Expr::Int(1), &span);
    let result = binary(ctx, BinaryOp::Eq, accu, one, &span);
    Ok(comprehension_with_result(
        ctx, span, var, range, init, condition, step, result,
    ))
}

/// `range.map(x, f)`
fn expand_map(
    ctx: &mut MacroContext,
    span: Span,
    receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<SpannedExpr, String> {
    let (range, var, mut rest) = split_iteration("map", receiver, args)?;
    let transform = rest.remove(0);

    let init = ctx.node(Expr::List(Vec::new()), &span);
    let condition = ctx.node(Expr::Bool(true), &span);
    let step = append(ctx, transform, &span);
    Ok(comprehension(ctx, span, var, range, init, condition, step))
}

/// `range.map(x, p, f)`: transforms only the elements matching `p`.
fn expand_filter_map(
    ctx: &mut MacroContext,
    span: Span,
    receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<SpannedExpr, String> {
    let (range, var, mut rest) = split_iteration("map", receiver, args)?;
    let transform = rest.remove(1);
    let predicate = rest.remove(0);

    let init = ctx.node(Expr::List(Vec::new()), &span);
    let condition = ctx.node(Expr::Bool(true), &span);
    let appended = append(ctx, transform, &span);
    let unchanged = ctx.accumulator(&span);
    let step = ternary(ctx, predicate, appended, unchanged, &span);
    Ok(comprehension(ctx, span, var, range, init, condition, step))
}

/// `range.filter(x, p)`
fn expand_filter(
    ctx: &mut MacroContext,
    span: Span,
    receiver: Option<SpannedExpr>,
    args: Vec<SpannedExpr>,
) -> Result<SpannedExpr, String> {
    let (range, var, mut rest) = split_iteration("filter", receiver, args)?;
    let predicate = rest.remove(0);

    let init = ctx.node(Expr::List(Vec::new()), &span);
    let condition = ctx.node(Expr::Bool(true), &span);
    let element = ctx.node(Expr::Ident(var.clone()), &span);
    let appended = append(ctx, element, &span);
    let unchanged = ctx.accumulator(&span);
    let step = ternary(ctx, predicate, appended, unchanged, &span);
    Ok(comprehension(ctx, span, var, range, init, condition, step))
}
