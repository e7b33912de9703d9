//! Helpers shared by the parser integration tests.

use cel_filter_parser::{parse, ParseError, SpannedExpr};

#[allow(dead_code)]
pub fn assert_parses(input: &str) -> SpannedExpr {
    match parse(input) {
        Ok(expr) => expr,
        Err(err) => panic!("failed to parse '{input}': {err}"),
    }
}

#[allow(dead_code)]
pub fn assert_parse_error(input: &str) -> ParseError {
    match parse(input) {
        Ok(expr) => panic!("expected parse error for '{input}', got {:?}", expr.node),
        Err(err) => err,
    }
}
