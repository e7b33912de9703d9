//! Parser for the filter expression language, a side-effect-free subset of
//! CEL (Common Expression Language).
//!
//! ```
//! use cel_filter_parser::{parse, Expr};
//!
//! let expr = parse("body.value == 'testing'").unwrap();
//! assert!(matches!(expr.node, Expr::Binary { .. }));
//! ```

pub mod ast;
pub mod lexer;
pub mod macros;
mod parser;

pub use ast::{BinaryOp, Comprehension, Expr, Span, Spanned, SpannedExpr, UnaryOp};
pub use lexer::LexError;
pub use macros::{MacroRegistry, ACCUMULATOR};
pub use parser::MAX_DEPTH;

/// A syntax error with the byte range it was found at.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at {}..{}", .span.start, .span.end)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    /// An error with `message` at `span`.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self::new(err.message, err.span)
    }
}

/// Parse `input` with the standard macros.
pub fn parse(input: &str) -> Result<SpannedExpr, ParseError> {
    parse_with_macros(input, &MacroRegistry::standard())
}

/// Parse `input`, expanding only the macros in `macros`.
pub fn parse_with_macros(input: &str, macros: &MacroRegistry) -> Result<SpannedExpr, ParseError> {
    let tokens = lexer::lex(input)?;
    parser::parse_tokens(&tokens, macros)
}
