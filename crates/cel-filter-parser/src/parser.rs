//! Recursive-descent parser with inline macro expansion.

use crate::ast::{BinaryOp, Expr, Span, Spanned, SpannedExpr, UnaryOp};
use crate::lexer::{SpannedToken, Token};
use crate::macros::{MacroContext, MacroRegistry, MacroStyle};
use crate::ParseError;

/// Maximum height of a parsed expression tree. Checking, evaluation and
/// dropping all recurse over the tree, so this bounds their stack use too.
///
/// The height of every node is known when it is built, and a node that
/// would exceed the limit is never created.
pub const MAX_DEPTH: usize = 250;

/// Parser state over one token stream.
pub struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    next_id: i64,
    /// Current recursion depth of the descent itself.
    depth: usize,
    /// Tree height of each node built so far, indexed by node id.
    heights: Vec<usize>,
    macros: &'a MacroRegistry,
}

impl<'a> Parser<'a> {
    /// A parser at the start of `tokens`, expanding `macros` at call sites.
    pub fn new(tokens: &'a [SpannedToken], macros: &'a MacroRegistry) -> Self {
        Self {
            tokens,
            pos: 0,
            next_id: 1,
            depth: 0,
            heights: Vec::new(),
            macros,
        }
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Wraps `node` with a fresh id, failing if it would make the tree
    /// taller than [`MAX_DEPTH`].
    fn node(&mut self, node: Expr, span: Span) -> Result<SpannedExpr, ParseError> {
        let height = 1 + node
            .children()
            .into_iter()
            .map(|child| self.height_of(child))
            .max()
            .unwrap_or(0);
        if height > MAX_DEPTH {
            return Err(too_deep(span));
        }
        let expr = Spanned::new(self.next_id(), node, span);
        self.record_height(expr.id, height);
        Ok(expr)
    }

    fn height_of(&self, expr: &SpannedExpr) -> usize {
        usize::try_from(expr.id)
            .ok()
            .and_then(|id| self.heights.get(id).copied())
            .filter(|height| *height > 0)
            .unwrap_or_else(|| expr.height())
    }

    fn record_height(&mut self, id: i64, height: usize) {
        let Ok(id) = usize::try_from(id) else {
            return;
        };
        if self.heights.len() <= id {
            self.heights.resize(id + 1, 0);
        }
        self.heights[id] = height;
    }

    // --- token cursor ---

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.clone())
            .unwrap_or_else(|| self.eof_span())
    }

    fn eof_span(&self) -> Span {
        let end = self.tokens.last().map_or(0, |(_, span)| span.end);
        end..end
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        let matched = self.check(token);
        if matched {
            self.pos += 1;
        }
        matched
    }

    fn expect(&mut self, token: &Token) -> Result<Span, ParseError> {
        if self.check(token) {
            let span = self.peek_span();
            self.pos += 1;
            return Ok(span);
        }
        let found = match self.peek() {
            Some(t) => format!("'{t}'"),
            None => "end of input".to_string(),
        };
        Err(ParseError::new(
            format!("expected '{token}', found {found}"),
            self.peek_span(),
        ))
    }

    /// True once every token has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // --- grammar ---

    /// Parses one expression, the lowest precedence level.
    pub fn parse_expr(&mut self) -> Result<SpannedExpr, ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(too_deep(self.peek_span()));
        }
        let expr = self.parse_ternary();
        self.depth -= 1;
        expr
    }

    fn parse_ternary(&mut self) -> Result<SpannedExpr, ParseError> {
        let cond = self.parse_or()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then_expr = self.parse_or()?;
        self.expect(&Token::Colon)?;
        let else_expr = self.parse_expr()?;
        let span = cond.span.start..else_expr.span.end;
        self.node(
            Expr::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        )
    }

    /// Left-associative chain of one precedence level. Each operator folds
    /// the chain one level deeper, so a long flat chain hits the height
    /// limit like explicit nesting does.
    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> Result<SpannedExpr, ParseError>,
        operator: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<SpannedExpr, ParseError> {
        let mut left = operand(self)?;
        while let Some(op) = self.peek().and_then(operator) {
            self.pos += 1;
            let right = operand(self)?;
            let span = left.span.start..right.span.end;
            left = self.node(
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            )?;
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<SpannedExpr, ParseError> {
        self.binary_level(Self::parse_and, |t| {
            matches!(t, Token::Or).then_some(BinaryOp::Or)
        })
    }

    fn parse_and(&mut self) -> Result<SpannedExpr, ParseError> {
        self.binary_level(Self::parse_relation, |t| {
            matches!(t, Token::And).then_some(BinaryOp::And)
        })
    }

    fn parse_relation(&mut self) -> Result<SpannedExpr, ParseError> {
        self.binary_level(Self::parse_addition, |t| match t {
            Token::EqEq => Some(BinaryOp::Eq),
            Token::Ne => Some(BinaryOp::Ne),
            Token::Lt => Some(BinaryOp::Lt),
            Token::Le => Some(BinaryOp::Le),
            Token::Gt => Some(BinaryOp::Gt),
            Token::Ge => Some(BinaryOp::Ge),
            Token::In => Some(BinaryOp::In),
            _ => None,
        })
    }

    fn parse_addition(&mut self) -> Result<SpannedExpr, ParseError> {
        self.binary_level(Self::parse_multiplication, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplication(&mut self) -> Result<SpannedExpr, ParseError> {
        self.binary_level(Self::parse_unary, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> Result<SpannedExpr, ParseError> {
        let start = self.peek_span().start;
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Not) => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.pos += 1;

        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(too_deep(start..start + 1));
        }
        let operand = self.parse_unary();
        self.depth -= 1;
        let operand = operand?;
        let span = start..operand.span.end;
        self.node(
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    fn parse_postfix(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => expr = self.parse_select(expr)?,
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_expr()?;
                    let end = self.expect(&Token::RBracket)?;
                    let span = expr.span.start..end.end;
                    expr = self.node(
                        Expr::Index {
                            operand: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    )?;
                }
                _ => return Ok(expr),
            }
        }
    }

    /// `.field` or `.method(args)` after an operand.
    fn parse_select(&mut self, operand: SpannedExpr) -> Result<SpannedExpr, ParseError> {
        self.expect(&Token::Dot)?;
        let (field, field_span) = match self.advance() {
            Some((Token::Ident(name), span)) => (name, span),
            Some((Token::Reserved(word), span)) => return Err(reserved_word(&word, span)),
            Some((token, span)) => {
                return Err(ParseError::new(
                    format!("expected field name after '.', found '{token}'"),
                    span,
                ))
            }
            None => {
                return Err(ParseError::new(
                    "expected field name after '.'",
                    self.eof_span(),
                ))
            }
        };

        if self.check(&Token::LParen) {
            let (args, end) = self.parse_args()?;
            let span = operand.span.start..end;
            return self.call(Some(operand), field, args, span);
        }

        let span = operand.span.start..field_span.end;
        self.node(
            Expr::Select {
                operand: Box::new(operand),
                field,
                test_only: false,
            },
            span,
        )
    }

    /// `( args )`, returning the arguments and the end offset of `)`.
    fn parse_args(&mut self) -> Result<(Vec<SpannedExpr>, usize), ParseError> {
        self.expect(&Token::LParen)?;
        let args = self.parse_sequence(&Token::RParen, Self::parse_expr)?;
        let end = self.expect(&Token::RParen)?;
        Ok((args, end.end))
    }

    /// Comma-separated items up to (not including) `close`; trailing comma allowed.
    fn parse_sequence<T>(
        &mut self,
        close: &Token,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(item(self)?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn call(
        &mut self,
        target: Option<SpannedExpr>,
        function: String,
        args: Vec<SpannedExpr>,
        span: Span,
    ) -> Result<SpannedExpr, ParseError> {
        let style = if target.is_some() {
            MacroStyle::Receiver
        } else {
            MacroStyle::Global
        };
        let macros = self.macros;
        if let Some(m) = macros.lookup(&function, args.len(), style) {
            let mut ctx = MacroContext::new(&mut self.next_id);
            let expanded = (m.expander)(&mut ctx, span.clone(), target, args)
                .map_err(|message| ParseError::new(message, span.clone()))?;
            // Expansion adds a few levels above arguments that are already
            // within the limit.
            let height = expanded.height();
            if height > MAX_DEPTH {
                return Err(too_deep(span));
            }
            self.record_height(expanded.id, height);
            return Ok(expanded);
        }
        self.node(
            Expr::Call {
                target: target.map(Box::new),
                function,
                args,
            },
            span,
        )
    }

    fn parse_primary(&mut self) -> Result<SpannedExpr, ParseError> {
        let Some((token, span)) = self.advance() else {
            return Err(ParseError::new("unexpected end of input", self.eof_span()));
        };

        let literal = match token {
            Token::Null => Expr::Null,
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Int(n) => Expr::Int(n),
            Token::UInt(n) => Expr::UInt(n),
            Token::Float(n) => Expr::Double(n),
            Token::String(s) => Expr::String(s),
            Token::Ident(name) => {
                if self.check(&Token::LParen) {
                    let (args, end) = self.parse_args()?;
                    return self.call(None, name, args, span.start..end);
                }
                Expr::Ident(name)
            }
            Token::Reserved(word) => return Err(reserved_word(&word, span)),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            Token::LBracket => {
                let items = self.parse_sequence(&Token::RBracket, Self::parse_expr)?;
                let end = self.expect(&Token::RBracket)?;
                return self.node(Expr::List(items), span.start..end.end);
            }
            Token::LBrace => {
                let entries = self.parse_sequence(&Token::RBrace, |p| {
                    let key = p.parse_expr()?;
                    p.expect(&Token::Colon)?;
                    Ok((key, p.parse_expr()?))
                })?;
                let end = self.expect(&Token::RBrace)?;
                return self.node(Expr::Map(entries), span.start..end.end);
            }
            other => {
                return Err(ParseError::new(
                    format!("unexpected token '{other}'"),
                    span,
                ))
            }
        };
        self.node(literal, span)
    }
}

fn reserved_word(word: &str, span: Span) -> ParseError {
    ParseError::new(format!("reserved identifier '{word}'"), span)
}

fn too_deep(span: Span) -> ParseError {
    ParseError::new("expression nested too deeply", span)
}

/// Parse a full token stream; every token must be consumed.
pub fn parse_tokens(
    tokens: &[SpannedToken],
    macros: &MacroRegistry,
) -> Result<SpannedExpr, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::new("empty expression", 0..0));
    }
    let mut parser = Parser::new(tokens, macros);
    let expr = parser.parse_expr()?;
    if !parser.at_end() {
        let span = parser.peek_span();
        let found = parser.peek().map(ToString::to_string).unwrap_or_default();
        return Err(ParseError::new(
            format!("unexpected token '{found}' after expression"),
            span,
        ));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse(input: &str) -> SpannedExpr {
        let tokens = lex(input).unwrap();
        parse_tokens(&tokens, &MacroRegistry::standard()).unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        let tokens = lex(input).unwrap();
        parse_tokens(&tokens, &MacroRegistry::standard()).unwrap_err()
    }

    fn collect_ids(expr: &SpannedExpr, ids: &mut Vec<i64>) {
        ids.push(expr.id);
        for child in expr.node.children() {
            collect_ids(child, ids);
        }
    }

    #[test]
    fn literals() {
        assert_eq!(parse("null").node, Expr::Null);
        assert_eq!(parse("3u").node, Expr::UInt(3));
        assert_eq!(parse("1.5").node, Expr::Double(1.5));
        assert_eq!(parse("'x'").node, Expr::String("x".into()));
        assert!(matches!(parse("-5").node, Expr::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn precedence_and_associativity() {
        let Expr::Binary { op: BinaryOp::Or, left, .. } = parse("a && b || c").node else {
            panic!("|| should bind loosest");
        };
        assert!(matches!(left.node, Expr::Binary { op: BinaryOp::And, .. }));

        let Expr::Binary { op: BinaryOp::Sub, left, .. } = parse("a - b - c").node else {
            panic!("expected subtraction");
        };
        assert!(matches!(left.node, Expr::Binary { op: BinaryOp::Sub, .. }));

        let Expr::Binary { op: BinaryOp::Add, right, .. } = parse("1 + 2 * 3").node else {
            panic!("expected addition at the root");
        };
        assert!(matches!(right.node, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn ternary_is_right_associative() {
        let Expr::Ternary { else_expr, .. } = parse("a ? 1 : b ? 2 : 3").node else {
            panic!("expected ternary");
        };
        assert!(matches!(else_expr.node, Expr::Ternary { .. }));
    }

    #[test]
    fn select_index_and_member_call() {
        let expr = parse("header['X-Test'][0]");
        let Expr::Index { operand, index } = expr.node else {
            panic!("expected index");
        };
        assert_eq!(index.node, Expr::Int(0));
        assert!(matches!(operand.node, Expr::Index { .. }));

        let Expr::Call { target, function, args } = parse("header.match('x-test', 'v')").node else {
            panic!("expected call");
        };
        assert_eq!(function, "match");
        assert_eq!(args.len(), 2);
        assert_eq!(target.unwrap().node, Expr::Ident("header".into()));

        let Expr::Select { field, test_only, .. } = parse("body.value").node else {
            panic!("expected select");
        };
        assert_eq!(field, "value");
        assert!(!test_only);
    }

    #[test]
    fn global_call_and_literals() {
        let Expr::Call { target: None, function, .. } = parse("size([1, 2,])").node else {
            panic!("expected global call");
        };
        assert_eq!(function, "size");
        assert!(matches!(parse("{'a': 1, 'b': 2}").node, Expr::Map(ref e) if e.len() == 2));
    }

    #[test]
    fn macros_expand() {
        assert!(matches!(
            parse("has(body.value)").node,
            Expr::Select { test_only: true, .. }
        ));
        assert!(matches!(
            parse("[1, 2].exists(x, x > 1)").node,
            Expr::Comprehension(_)
        ));
        assert!(matches!(
            parse("[1, 2].map(x, x > 1, x * 2)").node,
            Expr::Comprehension(_)
        ));
    }

    #[test]
    fn macro_errors_are_parse_errors() {
        let err = parse_err("has(body)");
        assert_eq!(err.message, "invalid argument to has() macro");
        assert_eq!(err.span, 0..9);
    }

    #[test]
    fn ids_are_unique_and_start_at_one() {
        let expr = parse("body.items.filter(i, i.ok).size() > 0 && header.match('a', 'b')");
        let mut ids = Vec::new();
        collect_ids(&expr, &mut ids);
        assert_eq!(ids.iter().min(), Some(&1));
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn structural_errors() {
        assert_eq!(parse_err("a +").message, "unexpected end of input");
        assert!(parse_err("(a").message.starts_with("expected ')'"));
        assert!(parse_err("a b").message.contains("after expression"));
        assert!(parse_err("if").message.contains("reserved"));
        assert!(parse_err("a.1").message.contains("field name"));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let input = format!("{}1{}", "(".repeat(MAX_DEPTH + 5), ")".repeat(MAX_DEPTH + 5));
        assert!(parse_err(&input).message.contains("nested too deeply"));

        let long_chain = vec!["x"; MAX_DEPTH + 2].join(" + ");
        assert!(parse_err(&long_chain).message.contains("nested too deeply"));
        assert!(parse_err(&"!".repeat(MAX_DEPTH + 2)).message.contains("nested too deeply"));
    }
}
