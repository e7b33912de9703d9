//! Expression tree produced by the parser.

/// Byte offsets into the source text.
pub type Span = std::ops::Range<usize>;

/// A node paired with its id and source location.
///
/// Ids are unique within one parse and start at 1; the checker keys its
/// type map by them.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub id: i64,
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(id: i64, node: T, span: Span) -> Self {
        Self { id, node, span }
    }
}

/// An expression node with its id and span.
pub type SpannedExpr = Spanned<Expr>;

impl SpannedExpr {
    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((expr, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            pending.extend(expr.node.children().into_iter().map(|c| (c, depth + 1)));
        }
        deepest
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),

    Ident(String),

    List(Vec<SpannedExpr>),
    Map(Vec<(SpannedExpr, SpannedExpr)>),

    Unary {
        op: UnaryOp,
        operand: Box<SpannedExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<SpannedExpr>,
        right: Box<SpannedExpr>,
    },
    Ternary {
        cond: Box<SpannedExpr>,
        then_expr: Box<SpannedExpr>,
        else_expr: Box<SpannedExpr>,
    },

    /// `operand.field`, or `has(operand.field)` when `test_only` is set.
    Select {
        operand: Box<SpannedExpr>,
        field: String,
        test_only: bool,
    },
    Index {
        operand: Box<SpannedExpr>,
        index: Box<SpannedExpr>,
    },
    /// `function(args)` or, with a target, `target.function(args)`.
    Call {
        target: Option<Box<SpannedExpr>>,
        function: String,
        args: Vec<SpannedExpr>,
    },

    /// Lowered form of the iteration macros.
    Comprehension(Box<Comprehension>),
}

/// A fold over `iter_range`.
///
/// `accu_var` starts as `accu_init`; for every element (list item or map key)
/// bound to `iter_var`, `loop_step` replaces the accumulator while
/// `loop_condition` does not evaluate to `false`. The value of the node is
/// `result`, evaluated with only the accumulator in scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub iter_var: String,
    pub iter_range: SpannedExpr,
    pub accu_var: String,
    pub accu_init: SpannedExpr,
    pub loop_condition: SpannedExpr,
    pub loop_step: SpannedExpr,
    pub result: SpannedExpr,
}

impl Expr {
    /// Direct subexpressions, in evaluation order.
    pub fn children(&self) -> Vec<&SpannedExpr> {
        match self {
            Expr::List(items) => items.iter().collect(),
            Expr::Map(entries) => entries.iter().flat_map(|(k, v)| [k, v]).collect(),
            Expr::Unary { operand, .. } | Expr::Select { operand, .. } => vec![operand.as_ref()],
            Expr::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => vec![cond.as_ref(), then_expr.as_ref(), else_expr.as_ref()],
            Expr::Index { operand, index } => vec![operand.as_ref(), index.as_ref()],
            Expr::Call { target, args, .. } => target.iter().map(|t| &**t).chain(args).collect(),
            Expr::Comprehension(c) => vec![
                &c.iter_range,
                &c.accu_init,
                &c.loop_condition,
                &c.loop_step,
                &c.result,
            ],
            Expr::Null
            | Expr::Bool(_)
            | Expr::Int(_)
            | Expr::UInt(_)
            | Expr::Double(_)
            | Expr::String(_)
            | Expr::Ident(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    And,
    Or,
}

impl UnaryOp {
    /// Name the operator is declared under in the function environment.
    pub fn function_name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-_",
            UnaryOp::Not => "!_",
        }
    }
}

impl BinaryOp {
    /// Name the operator is declared under in the function environment.
    pub fn function_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "_+_",
            BinaryOp::Sub => "_-_",
            BinaryOp::Mul => "_*_",
            BinaryOp::Div => "_/_",
            BinaryOp::Mod => "_%_",
            BinaryOp::Eq => "_==_",
            BinaryOp::Ne => "_!=_",
            BinaryOp::Lt => "_<_",
            BinaryOp::Le => "_<=_",
            BinaryOp::Gt => "_>_",
            BinaryOp::Ge => "_>=_",
            BinaryOp::In => "@in",
            BinaryOp::And => "_&&_",
            BinaryOp::Or => "_||_",
        }
    }

    /// Operator as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}
